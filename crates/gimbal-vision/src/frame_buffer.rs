use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use gimbal_vision_core::Frame;
use serde::{Deserialize, Serialize};

/// What a full [`FrameBuffer`] does with a new frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Keep what is queued and discard the new frame.
    #[default]
    DropNewest,
    /// Evict the oldest frame so the newest is always available.
    ReplaceOldest,
}

/// Bounded hand-off between acquisition and processing.
///
/// Acquisition pushes; processing takes the newest frame and discards the
/// rest. The lock is held only for the push or the swap, never while a
/// frame is processed.
#[derive(Debug)]
pub struct FrameBuffer {
    frames: Mutex<VecDeque<Frame>>,
    capacity: usize,
    policy: OverflowPolicy,
}

impl FrameBuffer {
    pub fn new(capacity: usize, policy: OverflowPolicy) -> Self {
        let capacity = capacity.max(1);
        Self {
            frames: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            policy,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn policy(&self) -> OverflowPolicy {
        self.policy
    }

    /// Returns `false` when the frame was dropped.
    pub fn push(&self, frame: Frame) -> bool {
        let mut frames = self.lock();
        if frames.len() < self.capacity {
            frames.push_back(frame);
            return true;
        }
        match self.policy {
            OverflowPolicy::ReplaceOldest => {
                frames.pop_front();
                frames.push_back(frame);
                true
            }
            OverflowPolicy::DropNewest => false,
        }
    }

    /// Newest frame, clearing the buffer.
    pub fn take_latest(&self) -> Option<Frame> {
        let mut frames = self.lock();
        let latest = frames.pop_back();
        frames.clear();
        latest
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Frame>> {
        self.frames
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn frame(seq: u64) -> Frame {
        Frame::new(RgbImage::new(2, 2), seq)
    }

    #[test]
    fn take_returns_newest_and_clears() {
        let buf = FrameBuffer::new(4, OverflowPolicy::ReplaceOldest);
        assert!(buf.take_latest().is_none());
        for i in 0..3 {
            assert!(buf.push(frame(i)));
        }
        assert_eq!(buf.take_latest().map(|f| f.sequence), Some(2));
        assert!(buf.is_empty());
    }

    #[test]
    fn replace_oldest_keeps_the_latest_frames() {
        let buf = FrameBuffer::new(2, OverflowPolicy::ReplaceOldest);
        for i in 0..5 {
            assert!(buf.push(frame(i)));
        }
        assert_eq!(buf.len(), 2);
        assert_eq!(buf.take_latest().map(|f| f.sequence), Some(4));
    }

    #[test]
    fn default_policy_drops_incoming_frames() {
        assert_eq!(OverflowPolicy::default(), OverflowPolicy::DropNewest);
        let buf = FrameBuffer::new(1, OverflowPolicy::default());
        assert!(buf.push(frame(0)));
        assert!(!buf.push(frame(1)));
        assert_eq!(buf.take_latest().map(|f| f.sequence), Some(0));
    }

    #[test]
    fn drop_newest_refuses_when_full() {
        let buf = FrameBuffer::new(2, OverflowPolicy::DropNewest);
        assert!(buf.push(frame(0)));
        assert!(buf.push(frame(1)));
        assert!(!buf.push(frame(2)));
        assert_eq!(buf.take_latest().map(|f| f.sequence), Some(1));
    }
}
