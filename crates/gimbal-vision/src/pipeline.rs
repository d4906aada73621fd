//! Three-stage runtime: acquisition, processing and the controller link.
//!
//! ```text
//! acquire --FrameBuffer--> process --SharedCommand--> comm --> controller
//!                             ^------SharedTelemetry-----'
//! ```
//!
//! Acquisition and the link block only on device I/O and recover from
//! faults through a [`Supervisor`]; an exhausted retry budget, or too many
//! faults in a row with no good frame or packet, stops the whole pipeline
//! with an error. Undecodable frames from the source are skipped.
//! Processing never blocks: with nothing buffered it yields and tries
//! again.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use gimbal_vision_armor::NumberClassifier;
use gimbal_vision_core::Frame;
use gimbal_vision_link::{
    Camera, CameraError, CameraSettings, ImageSequenceCamera, Link, LinkDevice, LinkError,
    RetryError, RetryPolicy, Supervisor,
};
use gimbal_vision_solver::Pose;

use crate::config::{ConfigError, LinkKind, PipelineConfig};
use crate::frame_buffer::FrameBuffer;
use crate::packets::{SharedCommand, SharedTelemetry};
use crate::processor::FrameProcessor;
use crate::recorder::FrameRecorder;

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("use_camera is set but no camera driver was provided")]
    NoCamera,
    #[error(transparent)]
    Camera(#[from] CameraError),
    #[error(transparent)]
    Link(#[from] LinkError),
    #[error(transparent)]
    Retry(#[from] RetryError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("{0} thread panicked")]
    Panicked(&'static str),
}

/// Counters reported when the pipeline stops.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunSummary {
    pub frames_acquired: u64,
    pub frames_dropped: u64,
    /// Frames the source delivered but could not decode.
    pub frames_skipped: u64,
    pub frames_recorded: u64,
    pub frames_processed: u64,
    pub commands_sent: u64,
    pub telemetry_received: u64,
    /// Rune hub position captured at calibration.
    pub marker_pose: Option<Pose>,
}

/// Requests a running pipeline to stop after the frame in flight.
#[derive(Clone, Debug)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::Release);
    }
}

pub struct Pipeline {
    config: PipelineConfig,
    camera: Option<Box<dyn Camera>>,
    link: Option<Box<dyn LinkDevice>>,
    classifier: Option<Box<dyn NumberClassifier>>,
    shutdown: Arc<AtomicBool>,
}

impl Pipeline {
    /// Validate `config` and pick the default devices it names: the image
    /// sequence under `video_path` unless `use_camera`, and the serial link
    /// when `link` is `serial`.
    pub fn new(config: PipelineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let ws = &config.workspace;

        let camera: Option<Box<dyn Camera>> = if ws.use_camera {
            None
        } else {
            Some(Box::new(ImageSequenceCamera::new(&ws.video_path)))
        };
        let link = default_link(&config)?;

        Ok(Self {
            config,
            camera,
            link,
            classifier: None,
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn with_camera(mut self, camera: Box<dyn Camera>) -> Self {
        self.camera = Some(camera);
        self
    }

    pub fn with_link(mut self, link: Box<dyn LinkDevice>) -> Self {
        self.link = Some(link);
        self
    }

    pub fn without_link(mut self) -> Self {
        self.link = None;
        self
    }

    pub fn with_classifier(mut self, classifier: Box<dyn NumberClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle(Arc::clone(&self.shutdown))
    }

    /// Run until the frame source is exhausted, a stop is requested, or a
    /// device runs out of retries.
    pub fn run(self) -> Result<RunSummary, PipelineError> {
        let Pipeline {
            config,
            camera,
            link,
            classifier,
            shutdown,
        } = self;
        let mut camera = camera.ok_or(PipelineError::NoCamera)?;
        let ws = &config.workspace;

        let recorder = if ws.save_video {
            Some(FrameRecorder::create(&ws.video_saved_path)?)
        } else {
            None
        };
        let mut processor = FrameProcessor::new(&config);
        if let Some(classifier) = classifier {
            processor = processor.with_classifier(classifier);
        }

        let shared = Shared {
            buffer: FrameBuffer::new(ws.buffer_capacity, ws.overflow),
            command: SharedCommand::new(),
            telemetry: SharedTelemetry::new(),
            shutdown,
            acquiring: AtomicBool::new(true),
            processing: AtomicBool::new(true),
        };
        let acquisition = Acquisition {
            settings: config.camera_settings(),
            policy: ws.retry.clone(),
            recorder,
            running_time: ws.running_time,
        };
        let processing = Processing {
            processor,
            debug_info: ws.debug_info,
            running_time: ws.running_time,
        };
        let policy = ws.retry.clone();
        log::info!(
            "pipeline starting: mode {:?}, color {:?}, link {:?}",
            ws.mode,
            ws.enemy_color,
            if link.is_some() { ws.link } else { LinkKind::None }
        );

        let shared = &shared;
        thread::scope(|s| {
            let acquire = thread::Builder::new()
                .name("acquire".into())
                .spawn_scoped(s, move || {
                    let out = acquisition.run(camera.as_mut(), shared);
                    shared.finish(&shared.acquiring, out.is_err());
                    out
                });
            let process = thread::Builder::new()
                .name("process".into())
                .spawn_scoped(s, move || {
                    let out = processing.run(shared);
                    shared.finish(&shared.processing, false);
                    out
                });
            let (acquire, process) = match (acquire, process) {
                (Ok(a), Ok(p)) => (a, p),
                (Err(err), _) | (_, Err(err)) => {
                    shared.halt();
                    return Err(PipelineError::Io(err));
                }
            };

            let comm = match link {
                Some(device) => {
                    let spawned = thread::Builder::new()
                        .name("comm".into())
                        .spawn_scoped(s, move || {
                            let out = communicate(device, policy, shared);
                            if out.is_err() {
                                shared.shutdown.store(true, Ordering::Release);
                            }
                            out
                        });
                    if spawned.is_err() {
                        shared.shutdown.store(true, Ordering::Release);
                    }
                    Some(spawned)
                }
                None => None,
            };

            let mut summary = RunSummary::default();
            let acquired = acquire
                .join()
                .map_err(|_| PipelineError::Panicked("acquire"));
            let processed = process
                .join()
                .map_err(|_| PipelineError::Panicked("process"));
            let linked = match comm {
                Some(Ok(handle)) => Some(handle.join().map_err(|_| PipelineError::Panicked("comm"))),
                Some(Err(err)) => Some(Err(PipelineError::Io(err))),
                None => None,
            };

            let stats = acquired??;
            summary.frames_acquired = stats.acquired;
            summary.frames_dropped = stats.dropped;
            summary.frames_skipped = stats.skipped;
            summary.frames_recorded = stats.recorded;

            let (processed, marker_pose) = processed??;
            summary.frames_processed = processed;
            summary.marker_pose = marker_pose;

            if let Some(linked) = linked {
                let stats = linked??;
                summary.commands_sent = stats.sent;
                summary.telemetry_received = stats.received;
            }
            log::info!("pipeline stopped: {summary:?}");
            Ok(summary)
        })
    }
}

#[cfg(unix)]
fn default_link(config: &PipelineConfig) -> Result<Option<Box<dyn LinkDevice>>, ConfigError> {
    use gimbal_vision_link::SerialLink;
    Ok(match config.workspace.link {
        LinkKind::None => None,
        LinkKind::Serial => Some(Box::new(SerialLink::new(config.workspace.serial_config()))),
    })
}

#[cfg(not(unix))]
fn default_link(config: &PipelineConfig) -> Result<Option<Box<dyn LinkDevice>>, ConfigError> {
    match config.workspace.link {
        LinkKind::None => Ok(None),
        LinkKind::Serial => Err(ConfigError::Invalid("serial link needs a unix host".into())),
    }
}

/// State shared by the three stages.
struct Shared {
    buffer: FrameBuffer,
    command: SharedCommand,
    telemetry: SharedTelemetry,
    /// Set by a stop request or a fatal stage error.
    shutdown: Arc<AtomicBool>,
    acquiring: AtomicBool,
    processing: AtomicBool,
}

impl Shared {
    fn finish(&self, stage: &AtomicBool, failed: bool) {
        if failed {
            self.shutdown.store(true, Ordering::Release);
        }
        stage.store(false, Ordering::Release);
    }

    /// Stop every stage without waiting for the frame source.
    fn halt(&self) {
        self.shutdown.store(true, Ordering::Release);
        self.acquiring.store(false, Ordering::Release);
        self.processing.store(false, Ordering::Release);
    }

    fn stopping(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }
}

#[derive(Debug, Default)]
struct AcquisitionStats {
    acquired: u64,
    dropped: u64,
    skipped: u64,
    recorded: u64,
}

struct Acquisition {
    settings: CameraSettings,
    policy: RetryPolicy,
    recorder: Option<FrameRecorder>,
    running_time: bool,
}

impl Acquisition {
    fn run(
        mut self,
        camera: &mut dyn Camera,
        shared: &Shared,
    ) -> Result<AcquisitionStats, PipelineError> {
        let mut supervisor = Supervisor::new("camera", self.policy.clone());
        supervisor.connect(|| camera.open(&self.settings))?;

        let mut stats = AcquisitionStats::default();
        while !shared.stopping() {
            let started = Instant::now();
            let image = match camera.grab() {
                Ok(image) => image,
                Err(CameraError::Exhausted) => {
                    log::info!("frame source exhausted after {} frames", stats.acquired);
                    break;
                }
                Err(err @ CameraError::Decode { .. }) => {
                    log::warn!("skipping frame: {err}");
                    stats.skipped += 1;
                    continue;
                }
                Err(err) => {
                    supervisor.fault(&err);
                    camera.close();
                    supervisor.connect(|| camera.open(&self.settings))?;
                    continue;
                }
            };
            supervisor.recovered();

            if let Some(recorder) = self.recorder.as_mut() {
                match recorder.record(&image) {
                    Ok(_) => stats.recorded += 1,
                    Err(err) => log::error!("recording frame {}: {err}", stats.acquired),
                }
            }
            if !shared.buffer.push(Frame::new(image, stats.acquired)) {
                stats.dropped += 1;
            }
            stats.acquired += 1;

            if self.running_time {
                log::debug!("acquire {:.2} ms", started.elapsed().as_secs_f64() * 1e3);
            }
        }
        camera.close();
        Ok(stats)
    }
}

struct Processing {
    processor: FrameProcessor,
    debug_info: bool,
    running_time: bool,
}

impl Processing {
    fn run(mut self, shared: &Shared) -> Result<(u64, Option<Pose>), PipelineError> {
        let mut processed = 0u64;
        loop {
            let frame = match shared.buffer.take_latest() {
                Some(frame) => frame,
                None if shared.acquiring.load(Ordering::Acquire) => {
                    thread::yield_now();
                    continue;
                }
                // acquisition is over; one last look for a frame pushed
                // just before it stopped
                None => match shared.buffer.take_latest() {
                    Some(frame) => frame,
                    None => break,
                },
            };

            let telemetry = self.processor.resolve(shared.telemetry.load());

            let command = self.processor.process(&frame.image, &telemetry);
            shared.command.publish(&command);
            processed += 1;

            if self.debug_info {
                log::debug!("frame {}: {telemetry:?} -> {command:?}", frame.sequence);
            }
            if self.running_time {
                log::debug!(
                    "frame {} processed in {:.2} ms ({:.2} ms since capture)",
                    frame.sequence,
                    command.time_delay,
                    frame.timestamp.elapsed().as_secs_f64() * 1e3
                );
            }
        }
        Ok((processed, self.processor.marker_pose()))
    }
}

#[derive(Debug, Default)]
struct LinkStats {
    sent: u64,
    received: u64,
}

fn communicate(
    device: Box<dyn LinkDevice>,
    policy: RetryPolicy,
    shared: &Shared,
) -> Result<LinkStats, PipelineError> {
    let mut link = Link::new(device);
    let mut supervisor = Supervisor::new(link.device().describe(), policy);
    supervisor.connect(|| link.open())?;

    let mut stats = LinkStats::default();
    let mut sent_generation = 0;
    loop {
        // read before sending so the final command always goes out
        let finishing = !shared.processing.load(Ordering::Acquire);
        let mut idle = true;

        let generation = shared.command.generation();
        if generation != sent_generation {
            match link.send(&shared.command.load()) {
                Ok(()) => {
                    supervisor.recovered();
                    sent_generation = generation;
                    stats.sent += 1;
                    idle = false;
                }
                Err(err) => {
                    reconnect(&mut supervisor, &mut link, &err)?;
                    continue;
                }
            }
        }
        if finishing {
            break;
        }

        match link.receive() {
            Ok(Some(packet)) => {
                supervisor.recovered();
                shared.telemetry.store(&packet);
                stats.received += 1;
                idle = false;
            }
            Ok(None) => {}
            Err(err) => reconnect(&mut supervisor, &mut link, &err)?,
        }
        if idle {
            thread::yield_now();
        }
    }
    if link.rejected_frames() > 0 {
        log::debug!("{} inbound frames rejected", link.rejected_frames());
    }
    link.close();
    Ok(stats)
}

fn reconnect<D: LinkDevice>(
    supervisor: &mut Supervisor,
    link: &mut Link<D>,
    err: &LinkError,
) -> Result<(), RetryError> {
    supervisor.fault(err);
    link.close();
    supervisor.connect(|| link.open())
}
