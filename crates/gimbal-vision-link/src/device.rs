#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::error::LinkError;
use crate::protocol::{CommandPacket, TelemetryPacket, FRAME_LEN};
use crate::stream::StreamDecoder;

/// Byte transport to the turret controller.
pub trait LinkDevice: Send {
    fn open(&mut self) -> Result<(), LinkError>;

    fn is_open(&self) -> bool;

    /// Write one whole frame.
    fn write_frame(&mut self, frame: &[u8; FRAME_LEN]) -> Result<(), LinkError>;

    /// Read whatever is available, waiting at most a short device timeout.
    /// `Ok(0)` means nothing arrived in time.
    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, LinkError>;

    fn close(&mut self);

    /// Human-readable device name for logs.
    fn describe(&self) -> String;
}

impl<D: LinkDevice + ?Sized> LinkDevice for Box<D> {
    fn open(&mut self) -> Result<(), LinkError> {
        (**self).open()
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }

    fn write_frame(&mut self, frame: &[u8; FRAME_LEN]) -> Result<(), LinkError> {
        (**self).write_frame(frame)
    }

    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, LinkError> {
        (**self).read_available(buf)
    }

    fn close(&mut self) {
        (**self).close()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Packet-level endpoint over a [`LinkDevice`].
pub struct Link<D> {
    device: D,
    decoder: StreamDecoder,
}

impl<D: LinkDevice> Link<D> {
    pub fn new(device: D) -> Self {
        Self {
            device,
            decoder: StreamDecoder::new(),
        }
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn open(&mut self) -> Result<(), LinkError> {
        self.decoder.clear();
        self.device.open()
    }

    pub fn is_open(&self) -> bool {
        self.device.is_open()
    }

    pub fn close(&mut self) {
        self.device.close();
    }

    pub fn send(&mut self, packet: &CommandPacket) -> Result<(), LinkError> {
        let frame = packet.encode();
        log::trace!("send {frame:02x?}");
        self.device.write_frame(&frame)
    }

    /// Latest valid telemetry available now; older complete frames in the
    /// same read are superseded.
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn receive(&mut self) -> Result<Option<TelemetryPacket>, LinkError> {
        let mut buf = [0u8; 64];
        let n = self.device.read_available(&mut buf)?;
        self.decoder.push(&buf[..n]);

        let mut latest = None;
        while let Some(packet) = self.decoder.next_packet() {
            latest = Some(packet);
        }
        Ok(latest)
    }

    pub fn rejected_frames(&self) -> u64 {
        self.decoder.rejected()
    }
}
