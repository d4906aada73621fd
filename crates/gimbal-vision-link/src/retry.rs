use std::fmt::Display;
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::RetryError;

/// Connection lifecycle of a device driven by a [`Supervisor`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkState {
    #[default]
    Closed,
    Opening,
    Open,
    /// Retry budget exhausted. Terminal.
    Faulted,
}

/// Bounded reopen policy with a fixed pause between attempts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    #[serde(with = "millis")]
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts,
            backoff,
        }
    }
}

/// Drives open attempts under a [`RetryPolicy`].
///
/// `Closed -> Opening -> Open` on success; a failed attempt goes back to
/// `Closed`, and once the budget is spent the supervisor is `Faulted` and
/// refuses further attempts. [`Supervisor::fault`] reports an I/O failure
/// on an open device. `max_attempts` consecutive faults with no
/// [`Supervisor::recovered`] in between also fault the supervisor, so a
/// device that opens but never works still runs out of budget.
#[derive(Debug)]
pub struct Supervisor {
    what: String,
    policy: RetryPolicy,
    state: LinkState,
    faults: u32,
}

impl Supervisor {
    pub fn new(what: impl Into<String>, policy: RetryPolicy) -> Self {
        Self {
            what: what.into(),
            policy,
            state: LinkState::Closed,
            faults: 0,
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `open` until it succeeds or the budget runs out, sleeping the
    /// policy backoff between attempts.
    pub fn connect<T, E: Display>(
        &mut self,
        open: impl FnMut() -> Result<T, E>,
    ) -> Result<T, RetryError> {
        let backoff = self.policy.backoff;
        self.connect_with(open, |_| thread::sleep(backoff))
    }

    /// [`Supervisor::connect`] with an injected pause.
    pub fn connect_with<T, E: Display>(
        &mut self,
        mut open: impl FnMut() -> Result<T, E>,
        mut pause: impl FnMut(u32),
    ) -> Result<T, RetryError> {
        if self.state == LinkState::Faulted {
            return Err(self.exhausted());
        }

        for attempt in 1..=self.policy.max_attempts {
            self.state = LinkState::Opening;
            match open() {
                Ok(device) => {
                    if attempt > 1 {
                        log::info!("{} open after {attempt} attempts", self.what);
                    }
                    self.state = LinkState::Open;
                    return Ok(device);
                }
                Err(err) => {
                    self.state = LinkState::Closed;
                    log::warn!(
                        "{} open attempt {attempt}/{} failed: {err}",
                        self.what,
                        self.policy.max_attempts
                    );
                    if attempt < self.policy.max_attempts {
                        pause(attempt);
                    }
                }
            }
        }

        self.state = LinkState::Faulted;
        let err = self.exhausted();
        log::error!("{err}");
        Err(err)
    }

    /// The open device failed; it must be closed and reopened.
    pub fn fault(&mut self, err: &dyn Display) {
        if self.state != LinkState::Open {
            return;
        }
        self.faults += 1;
        if self.faults >= self.policy.max_attempts {
            log::error!(
                "{} failed {} times without a good cycle: {err}",
                self.what,
                self.faults
            );
            self.state = LinkState::Faulted;
        } else {
            log::warn!("{} failed: {err}; reopening", self.what);
            self.state = LinkState::Closed;
        }
    }

    /// The open device completed a cycle; clears the fault streak.
    pub fn recovered(&mut self) {
        self.faults = 0;
    }

    /// Faults since the last good cycle.
    pub fn fault_streak(&self) -> u32 {
        self.faults
    }

    fn exhausted(&self) -> RetryError {
        RetryError::Exhausted {
            what: self.what.clone(),
            attempts: self.policy.max_attempts,
        }
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick(attempts: u32) -> Supervisor {
        Supervisor::new("serial", RetryPolicy::new(attempts, Duration::ZERO))
    }

    #[test]
    fn succeeds_after_transient_failures() {
        let mut sup = quick(5);
        let mut calls = 0;
        let mut pauses = Vec::new();
        let out = sup.connect_with(
            || {
                calls += 1;
                if calls < 3 {
                    Err("busy")
                } else {
                    Ok(calls)
                }
            },
            |attempt| pauses.push(attempt),
        );
        assert_eq!(out, Ok(3));
        assert_eq!(pauses, vec![1, 2]);
        assert_eq!(sup.state(), LinkState::Open);
    }

    #[test]
    fn exhaustion_faults_for_good() {
        let mut sup = quick(3);
        let mut calls = 0;
        let out: Result<(), _> = sup.connect_with(
            || {
                calls += 1;
                Err("no device")
            },
            |_| {},
        );
        assert_eq!(
            out,
            Err(RetryError::Exhausted {
                what: "serial".into(),
                attempts: 3
            })
        );
        assert_eq!(calls, 3);
        assert_eq!(sup.state(), LinkState::Faulted);

        let again: Result<(), RetryError> = sup.connect(|| Ok::<_, &str>(()));
        assert!(again.is_err());
    }

    #[test]
    fn fault_reopens_with_a_fresh_budget() {
        let mut sup = quick(2);
        sup.connect(|| Ok::<_, &str>(())).expect("open");
        sup.fault(&"read error");
        assert_eq!(sup.state(), LinkState::Closed);
        let mut calls = 0;
        let out = sup.connect(|| {
            calls += 1;
            if calls == 2 {
                Ok(())
            } else {
                Err("flaky")
            }
        });
        assert!(out.is_ok());
        assert_eq!(sup.state(), LinkState::Open);
    }

    #[test]
    fn repeated_faults_without_progress_exhaust() {
        let mut sup = quick(3);
        for _ in 0..2 {
            sup.connect(|| Ok::<_, &str>(())).expect("open");
            sup.fault(&"grab failed");
        }
        assert_eq!(sup.fault_streak(), 2);
        sup.connect(|| Ok::<_, &str>(())).expect("open");
        sup.fault(&"grab failed");
        assert_eq!(sup.state(), LinkState::Faulted);

        let mut calls = 0;
        let out = sup.connect(|| {
            calls += 1;
            Ok::<_, &str>(())
        });
        assert!(matches!(out, Err(RetryError::Exhausted { .. })));
        assert_eq!(calls, 0);
    }

    #[test]
    fn good_cycles_clear_the_fault_streak() {
        let mut sup = quick(2);
        for _ in 0..5 {
            sup.connect(|| Ok::<_, &str>(())).expect("open");
            sup.recovered();
            sup.fault(&"transient");
            assert_eq!(sup.state(), LinkState::Closed);
        }
        assert_eq!(sup.fault_streak(), 1);
    }

    #[test]
    fn policy_backoff_is_milliseconds_in_json() {
        let policy: RetryPolicy =
            serde_json::from_str(r#"{"max_attempts": 7, "backoff": 250}"#).expect("parse");
        assert_eq!(policy.max_attempts, 7);
        assert_eq!(policy.backoff, Duration::from_millis(250));
    }
}
