//! Process logging.
//!
//! The default sink is a stderr logger whose lines carry the pipeline
//! stage (the emitting thread: `acquire`, `process`, `comm`, or `main`) and
//! the component that logged, with the crate prefix stripped:
//!
//! ```text
//! [  1.234s  WARN acquire link::retry] camera open attempt 1/5 failed: ...
//! ```
//!
//! With the `tracing` feature, `log` records are forwarded into a
//! `tracing` fmt subscriber instead.

use std::io::Write;
use std::sync::OnceLock;
use std::time::Instant;

use log::{LevelFilter, Log, Metadata, Record};

#[cfg(feature = "tracing")]
use tracing_log::LogTracer;
#[cfg(feature = "tracing")]
use tracing_subscriber::{fmt, fmt::format::FmtSpan, util::SubscriberInitExt, EnvFilter};

struct StageLogger {
    level: LevelFilter,
    started: Instant,
}

impl Log for StageLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let thread = std::thread::current();
        let line = format_line(
            self.started.elapsed().as_secs_f64(),
            record.level(),
            thread.name().unwrap_or("-"),
            record.target(),
            &record.args().to_string(),
        );
        let _ = writeln!(std::io::stderr().lock(), "{line}");
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static LOGGER: OnceLock<StageLogger> = OnceLock::new();

/// `gimbal_vision_link::retry` -> `link::retry`, `gimbal_vision::pipeline`
/// -> `pipeline`. Foreign targets pass through.
fn component(target: &str) -> &str {
    target
        .strip_prefix("gimbal_vision_")
        .or_else(|| target.strip_prefix("gimbal_vision::"))
        .unwrap_or(target)
}

fn format_line(elapsed: f64, level: log::Level, stage: &str, target: &str, msg: &str) -> String {
    format!(
        "[{elapsed:7.3}s {level:>5} {stage} {}] {msg}",
        component(target)
    )
}

/// Install the stage-tagged stderr logger. Repeated calls keep the first
/// installation.
pub fn init_stderr(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    if LOGGER.get().is_none() {
        let logger = LOGGER.get_or_init(|| StageLogger {
            level,
            started: Instant::now(),
        });
        log::set_logger(logger)?;
        log::set_max_level(level);
    }
    Ok(())
}

/// Install process logging.
///
/// With the `tracing` feature, `RUST_LOG` overrides `level` and `json`
/// selects JSON lines. Otherwise the stderr logger is used and `json` is
/// ignored.
pub fn init_logging(level: LevelFilter, json: bool) {
    #[cfg(feature = "tracing")]
    {
        let _ = LogTracer::init_with_filter(level);
        init_tracing(level, json);
    }
    #[cfg(not(feature = "tracing"))]
    {
        let _ = json;
        let _ = init_stderr(level);
    }
}

#[cfg(feature = "tracing")]
fn init_tracing(level: LevelFilter, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_string().to_ascii_lowercase()));
    let builder = fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_thread_names(true);
    let _ = if json {
        builder.json().flatten_event(true).finish().try_init()
    } else {
        builder
            .with_timer(fmt::time::Uptime::default())
            .finish()
            .try_init()
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn components_drop_the_crate_prefix() {
        assert_eq!(component("gimbal_vision_link::retry"), "link::retry");
        assert_eq!(component("gimbal_vision::pipeline"), "pipeline");
        assert_eq!(component("gimbal_vision_armor"), "armor");
        assert_eq!(component("hyper::client"), "hyper::client");
    }

    #[test]
    fn lines_carry_stage_and_component() {
        let line = format_line(
            1.5,
            log::Level::Warn,
            "acquire",
            "gimbal_vision_link::retry",
            "camera failed",
        );
        assert_eq!(line, "[  1.500s  WARN acquire link::retry] camera failed");
    }
}
