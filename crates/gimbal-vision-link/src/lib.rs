//! Device side of the gimbal-vision pipeline.
//!
//! - [`protocol`]: the eight-byte command and telemetry frames,
//! - [`StreamDecoder`]: frame reassembly with byte-wise resynchronization,
//! - [`LinkDevice`] / [`Camera`]: capability traits for the serial link and
//!   the frame source, with [`SerialLink`] and [`ImageSequenceCamera`] as
//!   concrete devices and loopback fakes for tests,
//! - [`Supervisor`]: bounded reopen policy shared by every device.

mod camera;
mod device;
mod error;
mod fake;
pub mod protocol;
mod retry;
mod sequence;
#[cfg(unix)]
mod serial;
mod stream;

pub use camera::{Camera, CameraSettings};
pub use device::{Link, LinkDevice};
pub use error::{CameraError, DecodeError, LinkError, RetryError};
pub use fake::{LoopbackLink, LoopbackPeer, ScriptedCamera};
pub use protocol::{CommandPacket, TelemetryPacket, FRAME_LEN};
pub use retry::{LinkState, RetryPolicy, Supervisor};
pub use sequence::ImageSequenceCamera;
#[cfg(unix)]
pub use serial::{SerialConfig, SerialLink};
pub use stream::StreamDecoder;
