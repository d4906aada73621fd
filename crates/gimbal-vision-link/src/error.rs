use std::path::PathBuf;

/// Serial (or other byte-link) failure.
#[derive(thiserror::Error, Debug)]
pub enum LinkError {
    #[error("no port could be opened (tried {tried:?})")]
    Open { tried: Vec<String> },
    #[error("link is not open")]
    NotOpen,
    #[error("link closed by peer")]
    Closed,
    #[error("short write: {written} of {expected} bytes")]
    Write { written: usize, expected: usize },
    #[error("unsupported baud rate {0}")]
    BaudRate(u32),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Frame source failure.
#[derive(thiserror::Error, Debug)]
pub enum CameraError {
    #[error("camera open failed: {0}")]
    Open(String),
    #[error("camera is not open")]
    NotOpen,
    #[error("frame grab failed: {0}")]
    Grab(String),
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("image sequence exhausted")]
    Exhausted,
}

/// Rejected wire frame. Callers drop these.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    #[error("unknown frame head {0:#04x}")]
    UnknownHead(u8),
    #[error("checksum mismatch: expected {expected:#04x}, got {actual:#04x}")]
    Checksum { expected: u8, actual: u8 },
}

/// Retry budget spent without reaching an open device.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RetryError {
    #[error("{what} still failing after {attempts} attempts")]
    Exhausted { what: String, attempts: u32 },
}
