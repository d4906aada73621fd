//! POSIX serial port: raw 8N1, no flow control, short read timeout.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::AsRawFd;

use nix::fcntl::OFlag;
use nix::sys::termios::{self, BaudRate, ControlFlags, InputFlags, SetArg, SpecialCharacterIndices};
use serde::{Deserialize, Serialize};

use crate::device::LinkDevice;
use crate::error::LinkError;
use crate::protocol::FRAME_LEN;

/// Serial port selection and line speed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Tried in order; the first that opens wins.
    pub ports: Vec<String>,
    pub baud_rate: u32,
    /// Read timeout in tenths of a second (termios `VTIME`).
    pub read_timeout_ds: u8,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            ports: (0..3).map(|i| format!("/dev/ttyUSB{i}")).collect(),
            baud_rate: 115_200,
            read_timeout_ds: 1,
        }
    }
}

pub struct SerialLink {
    config: SerialConfig,
    port: Option<(String, File)>,
}

impl SerialLink {
    pub fn new(config: SerialConfig) -> Self {
        Self { config, port: None }
    }

    pub fn config(&self) -> &SerialConfig {
        &self.config
    }

    /// Name of the open port, if any.
    pub fn port_name(&self) -> Option<&str> {
        self.port.as_ref().map(|(name, _)| name.as_str())
    }

    fn open_port(&self, name: &str) -> Result<File, LinkError> {
        let baud = baud_rate(self.config.baud_rate)?;
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(OFlag::O_NOCTTY.bits())
            .open(name)?;
        configure(&file, baud, self.config.read_timeout_ds)?;
        Ok(file)
    }
}

impl LinkDevice for SerialLink {
    fn open(&mut self) -> Result<(), LinkError> {
        self.close();
        for name in &self.config.ports {
            match self.open_port(name) {
                Ok(file) => {
                    log::info!("serial open on {name} at {} baud", self.config.baud_rate);
                    self.port = Some((name.clone(), file));
                    return Ok(());
                }
                Err(LinkError::BaudRate(b)) => return Err(LinkError::BaudRate(b)),
                Err(err) => log::debug!("serial probe {name}: {err}"),
            }
        }
        Err(LinkError::Open {
            tried: self.config.ports.clone(),
        })
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn write_frame(&mut self, frame: &[u8; FRAME_LEN]) -> Result<(), LinkError> {
        let (_, file) = self.port.as_mut().ok_or(LinkError::NotOpen)?;
        let written = file.write(frame)?;
        if written != FRAME_LEN {
            return Err(LinkError::Write {
                written,
                expected: FRAME_LEN,
            });
        }
        Ok(())
    }

    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, LinkError> {
        let (_, file) = self.port.as_mut().ok_or(LinkError::NotOpen)?;
        match file.read(buf) {
            Ok(n) => Ok(n),
            Err(err)
                if matches!(
                    err.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
                ) =>
            {
                Ok(0)
            }
            Err(err) => Err(err.into()),
        }
    }

    fn close(&mut self) {
        if let Some((name, _)) = self.port.take() {
            log::debug!("serial {name} closed");
        }
    }

    fn describe(&self) -> String {
        match self.port_name() {
            Some(name) => name.to_owned(),
            None => format!("serial {:?}", self.config.ports),
        }
    }
}

fn configure(file: &File, baud: BaudRate, timeout_ds: u8) -> Result<(), LinkError> {
    let fd = file.as_raw_fd();
    let mut tio = termios::tcgetattr(fd).map_err(io::Error::from)?;
    termios::cfmakeraw(&mut tio);
    tio.control_flags |= ControlFlags::CLOCAL | ControlFlags::CREAD | ControlFlags::CS8;
    tio.control_flags &= !(ControlFlags::PARENB | ControlFlags::CSTOPB | ControlFlags::CRTSCTS);
    tio.input_flags &= !(InputFlags::IXON | InputFlags::IXOFF | InputFlags::IXANY);
    // return whatever arrived, or nothing after the timeout
    tio.control_chars[SpecialCharacterIndices::VMIN as usize] = 0;
    tio.control_chars[SpecialCharacterIndices::VTIME as usize] = timeout_ds;
    termios::cfsetspeed(&mut tio, baud).map_err(io::Error::from)?;
    termios::tcsetattr(fd, SetArg::TCSANOW, &tio).map_err(io::Error::from)?;
    Ok(())
}

fn baud_rate(rate: u32) -> Result<BaudRate, LinkError> {
    Ok(match rate {
        9600 => BaudRate::B9600,
        19200 => BaudRate::B19200,
        38400 => BaudRate::B38400,
        57600 => BaudRate::B57600,
        115_200 => BaudRate::B115200,
        230_400 => BaudRate::B230400,
        460_800 => BaudRate::B460800,
        921_600 => BaudRate::B921600,
        other => return Err(LinkError::BaudRate(other)),
    })
}
