//! Onboard vision for an auto-aiming turret.
//!
//! This crate provides:
//! - re-exports of the detector, solver and device crates,
//! - the JSON configuration document ([`PipelineConfig`]),
//! - [`FrameProcessor`], one detection-to-command cycle usable on its own,
//! - [`Pipeline`], the three-thread runtime that connects a frame source,
//!   the processor and the turret controller link.
//!
//! ## Quickstart
//!
//! ```no_run
//! use gimbal_vision::{Pipeline, PipelineConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut config = PipelineConfig::default();
//! config.workspace.video_path = "frames".into();
//! let summary = Pipeline::new(config)?.run()?;
//! println!("processed {} frames", summary.frames_processed);
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `gimbal_vision::core`: geometry, camera model, ballistics, shared enums.
//! - `gimbal_vision::armor`: lightbar segmentation, pairing and selection.
//! - `gimbal_vision::rune`: energy rune search and hub calibration.
//! - `gimbal_vision::solver`: plate pose and ballistic angles.
//! - `gimbal_vision::link`: wire protocol, serial link, frame sources.

pub use gimbal_vision_armor as armor;
pub use gimbal_vision_core as core;
pub use gimbal_vision_link as link;
pub use gimbal_vision_rune as rune;
pub use gimbal_vision_solver as solver;

mod config;
mod frame_buffer;
mod logging;
mod packets;
mod pipeline;
mod processor;
mod recorder;

pub use config::{
    ColorSetting, ConfigError, LinkKind, ModeSetting, PipelineConfig, WorkspaceConfig,
};
pub use frame_buffer::{FrameBuffer, OverflowPolicy};
pub use logging::{init_logging, init_stderr};
pub use packets::{SharedCommand, SharedTelemetry};
pub use pipeline::{Pipeline, PipelineError, RunSummary, StopHandle};
pub use processor::FrameProcessor;
pub use recorder::FrameRecorder;

pub use gimbal_vision_core::{EnemyColor, GimbalAttitude, WorkMode};
pub use gimbal_vision_link::{CommandPacket, TelemetryPacket};
