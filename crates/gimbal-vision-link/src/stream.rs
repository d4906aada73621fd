use std::collections::VecDeque;

use crate::error::DecodeError;
use crate::protocol::{is_head_byte, TelemetryPacket, FRAME_LEN};

/// Reassembles inbound frames from an unaligned byte stream.
///
/// Bytes are shifted out one at a time until a known head byte sits at the
/// front; eight bytes from there form a candidate frame. A candidate that
/// fails its checksum is dropped together with its head byte so the search
/// restarts one byte later.
#[derive(Debug, Default)]
pub struct StreamDecoder {
    pending: VecDeque<u8>,
    rejected: u64,
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, bytes: &[u8]) {
        self.pending.extend(bytes);
    }

    /// Next valid packet, or `None` once the buffer holds no complete frame.
    pub fn next_packet(&mut self) -> Option<TelemetryPacket> {
        loop {
            while let Some(&b) = self.pending.front() {
                if is_head_byte(b) {
                    break;
                }
                self.pending.pop_front();
            }
            if self.pending.len() < FRAME_LEN {
                return None;
            }

            let mut frame = [0u8; FRAME_LEN];
            for (dst, src) in frame.iter_mut().zip(self.pending.iter()) {
                *dst = *src;
            }
            match TelemetryPacket::decode(&frame) {
                Ok(packet) => {
                    self.pending.drain(..FRAME_LEN);
                    return Some(packet);
                }
                Err(err) => {
                    self.reject(err);
                    self.pending.pop_front();
                }
            }
        }
    }

    /// Frames dropped so far for a bad checksum.
    pub fn rejected(&self) -> u64 {
        self.rejected
    }

    /// Bytes waiting for a complete frame.
    pub fn buffered(&self) -> usize {
        self.pending.len()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    fn reject(&mut self, err: DecodeError) {
        self.rejected += 1;
        log::debug!("dropping inbound frame: {err}");
    }
}
