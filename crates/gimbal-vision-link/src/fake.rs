//! In-memory devices for simulation and tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use image::RgbImage;

use crate::camera::{Camera, CameraSettings};
use crate::device::LinkDevice;
use crate::error::{CameraError, LinkError};
use crate::protocol::FRAME_LEN;

#[derive(Debug, Default)]
struct LoopbackShared {
    inbound: VecDeque<u8>,
    sent: Vec<[u8; FRAME_LEN]>,
    open: bool,
    failing_opens: u32,
    failing_writes: u32,
    opens: u32,
}

/// Link whose far end is a [`LoopbackPeer`] in the same process.
#[derive(Debug, Clone)]
pub struct LoopbackLink {
    shared: Arc<Mutex<LoopbackShared>>,
}

/// Controller side of a [`LoopbackLink`].
#[derive(Debug, Clone)]
pub struct LoopbackPeer {
    shared: Arc<Mutex<LoopbackShared>>,
}

impl LoopbackLink {
    pub fn pair() -> (LoopbackLink, LoopbackPeer) {
        let shared = Arc::new(Mutex::new(LoopbackShared::default()));
        (
            LoopbackLink {
                shared: Arc::clone(&shared),
            },
            LoopbackPeer { shared },
        )
    }

    fn lock(&self) -> MutexGuard<'_, LoopbackShared> {
        lock(&self.shared)
    }
}

impl LoopbackPeer {
    /// Queue raw bytes for the vision side to read.
    pub fn feed(&self, bytes: &[u8]) {
        lock(&self.shared).inbound.extend(bytes);
    }

    /// Frames written by the vision side so far.
    pub fn sent(&self) -> Vec<[u8; FRAME_LEN]> {
        lock(&self.shared).sent.clone()
    }

    /// Make the next `n` open attempts fail.
    pub fn fail_opens(&self, n: u32) {
        lock(&self.shared).failing_opens = n;
    }

    /// Make the next `n` writes fail.
    pub fn fail_writes(&self, n: u32) {
        lock(&self.shared).failing_writes = n;
    }

    /// Successful opens so far.
    pub fn opens(&self) -> u32 {
        lock(&self.shared).opens
    }
}

impl LinkDevice for LoopbackLink {
    fn open(&mut self) -> Result<(), LinkError> {
        let mut s = self.lock();
        if s.failing_opens > 0 {
            s.failing_opens -= 1;
            return Err(LinkError::Open {
                tried: vec!["loopback".into()],
            });
        }
        s.open = true;
        s.opens += 1;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.lock().open
    }

    fn write_frame(&mut self, frame: &[u8; FRAME_LEN]) -> Result<(), LinkError> {
        let mut s = self.lock();
        if !s.open {
            return Err(LinkError::NotOpen);
        }
        if s.failing_writes > 0 {
            s.failing_writes -= 1;
            return Err(LinkError::Write {
                written: 0,
                expected: FRAME_LEN,
            });
        }
        s.sent.push(*frame);
        Ok(())
    }

    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, LinkError> {
        let mut s = self.lock();
        if !s.open {
            return Err(LinkError::NotOpen);
        }
        let n = buf.len().min(s.inbound.len());
        for (dst, src) in buf.iter_mut().zip(s.inbound.drain(..n)) {
            *dst = src;
        }
        Ok(n)
    }

    fn close(&mut self) {
        self.lock().open = false;
    }

    fn describe(&self) -> String {
        "loopback".to_owned()
    }
}

fn lock(shared: &Mutex<LoopbackShared>) -> MutexGuard<'_, LoopbackShared> {
    // the shared state stays consistent even if a holder panicked
    shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Camera serving a fixed list of frames.
#[derive(Debug, Default)]
pub struct ScriptedCamera {
    frames: VecDeque<RgbImage>,
    open: bool,
    failing_opens: u32,
    failing_grabs: u32,
}

impl ScriptedCamera {
    pub fn new(frames: impl IntoIterator<Item = RgbImage>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Make the first `n` open attempts fail.
    pub fn with_failing_opens(mut self, n: u32) -> Self {
        self.failing_opens = n;
        self
    }

    /// Make the next `n` grabs on an open camera fail without consuming a
    /// frame.
    pub fn with_failing_grabs(mut self, n: u32) -> Self {
        self.failing_grabs = n;
        self
    }
}

impl Camera for ScriptedCamera {
    fn open(&mut self, _settings: &CameraSettings) -> Result<(), CameraError> {
        if self.failing_opens > 0 {
            self.failing_opens -= 1;
            return Err(CameraError::Open("scripted failure".into()));
        }
        self.open = true;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn grab(&mut self) -> Result<RgbImage, CameraError> {
        if !self.open {
            return Err(CameraError::NotOpen);
        }
        if self.failing_grabs > 0 {
            self.failing_grabs -= 1;
            return Err(CameraError::Grab("scripted failure".into()));
        }
        self.frames.pop_front().ok_or(CameraError::Exhausted)
    }

    fn close(&mut self) {
        self.open = false;
    }
}
