//! The interactive host loop and its collaborators.
//!
//! The pipeline itself never touches a window, a file, or a clock tick.
//! A host pulls frames from a [`FrameSource`], runs the [`Manager`] once
//! per tick, hands the preview and help text to a [`FrameSink`], and
//! drains an [`InputSource`] for key and mouse events. Keys go to the
//! pipeline first; only keys it leaves unconsumed fall through to the
//! [`HOST_KEYMAP`](crate::keymap::HOST_KEYMAP) defaults.

use std::collections::VecDeque;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::diagnostics::TickDiagnostics;
use crate::keymap::{HostAction, InputEvent, host_action};
use crate::manager::{Manager, Selection};
use crate::types::{Frame, Payload, PipelineError};

/// Errors from reading frames.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// A frame file could not be read.
    #[error("failed to read frame {path}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// A frame could not be decoded.
    #[error("failed to decode frame {path}: {source}")]
    Decode {
        /// File that failed.
        path: PathBuf,
        /// Underlying decoder error.
        source: image::ImageError,
    },
    /// Seek past the end of a finite source.
    #[error("cannot seek to frame {index}: source has {len} frames")]
    SeekOutOfRange {
        /// Requested position.
        index: usize,
        /// Number of frames available.
        len: usize,
    },
}

/// Errors from presenting frames.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Image encoding failed.
    #[error("failed to encode frame: {0}")]
    Encode(#[from] image::ImageError),
}

/// Errors that stop the host loop.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// The frame source failed.
    #[error(transparent)]
    Source(#[from] SourceError),
    /// The frame sink failed.
    #[error(transparent)]
    Sink(#[from] SinkError),
    /// The pipeline hit a configuration error.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

/// Where frames come from: a camera, a video, an image sequence.
pub trait FrameSource {
    /// Read the frame at the current position and advance.
    ///
    /// Returns `Ok(None)` at end of stream.
    ///
    /// # Errors
    ///
    /// Returns a [`SourceError`] if the frame cannot be produced.
    fn read_next(&mut self) -> Result<Option<Frame>, SourceError>;

    /// Move so that the next [`read_next`](Self::read_next) returns frame `index`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::SeekOutOfRange`] past the end.
    fn seek(&mut self, index: usize) -> Result<(), SourceError>;

    /// Index of the frame the next read returns.
    fn position(&self) -> usize;

    /// Number of frames, if finite and known.
    fn len(&self) -> Option<usize>;

    /// Returns `true` if the source is known to hold no frames.
    fn is_empty(&self) -> bool {
        self.len() == Some(0)
    }
}

/// Where previews go: a window, a directory of images.
pub trait FrameSink {
    /// Present one tick's preview with optional help text.
    ///
    /// # Errors
    ///
    /// Returns a [`SinkError`] if presenting fails.
    fn draw(&mut self, frame: &Frame, help: Option<&str>) -> Result<(), SinkError>;

    /// Persist a frame the user asked to keep.
    ///
    /// # Errors
    ///
    /// Returns a [`SinkError`] if saving fails.
    fn snapshot(&mut self, frame: &Frame, label: &str) -> Result<(), SinkError>;
}

/// Where key and mouse events come from.
pub trait InputSource {
    /// Next pending event, or `None` when this tick's input is drained.
    fn poll(&mut self) -> Option<InputEvent>;

    /// Returns `true` once no further input will ever arrive.
    fn is_exhausted(&self) -> bool;
}

/// Input replayed from a fixed script, one batch of events per tick.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    ticks: VecDeque<VecDeque<InputEvent>>,
}

impl ScriptedInput {
    /// Build from per-tick event batches. An empty batch is a tick with
    /// no input.
    #[must_use]
    pub fn from_ticks(ticks: Vec<Vec<InputEvent>>) -> Self {
        Self {
            ticks: ticks.into_iter().map(VecDeque::from).collect(),
        }
    }
}

impl InputSource for ScriptedInput {
    fn poll(&mut self) -> Option<InputEvent> {
        let batch = self.ticks.front_mut()?;
        let event = batch.pop_front();
        if event.is_none() {
            self.ticks.pop_front();
        }
        event
    }

    fn is_exhausted(&self) -> bool {
        self.ticks.is_empty()
    }
}

/// Host loop configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Start with playback paused on the first frame.
    pub start_paused: bool,
    /// Rewind to the first frame at end of stream.
    pub loop_playback: bool,
    /// Stop after this many ticks.
    pub max_ticks: Option<u64>,
    /// Pass help text to the sink.
    pub show_help: bool,
}

impl HostConfig {
    /// Default for [`start_paused`](Self::start_paused).
    pub const DEFAULT_START_PAUSED: bool = false;
    /// Default for [`loop_playback`](Self::loop_playback).
    pub const DEFAULT_LOOP_PLAYBACK: bool = false;
    /// Default for [`max_ticks`](Self::max_ticks).
    pub const DEFAULT_MAX_TICKS: Option<u64> = None;
    /// Default for [`show_help`](Self::show_help).
    pub const DEFAULT_SHOW_HELP: bool = true;
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            start_paused: Self::DEFAULT_START_PAUSED,
            loop_playback: Self::DEFAULT_LOOP_PLAYBACK,
            max_ticks: Self::DEFAULT_MAX_TICKS,
            show_help: Self::DEFAULT_SHOW_HELP,
        }
    }
}

/// Why the host loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The user pressed a quit key.
    Quit,
    /// The source ran out of frames.
    EndOfStream,
    /// The configured tick limit was reached.
    MaxTicks,
    /// Playback was paused and no more input will arrive.
    InputExhausted,
}

/// What a host loop run did.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostSummary {
    /// Pipeline runs.
    pub ticks: u64,
    /// Frames pulled from the source.
    pub frames_read: u64,
    /// Snapshots saved.
    pub snapshots: u64,
    /// Why the loop ended.
    pub stop: StopReason,
    /// Diagnostics of every tick in order.
    pub diagnostics: Vec<TickDiagnostics>,
}

/// Drives a [`Manager`] from a frame source and an input source.
#[derive(Debug, Clone)]
pub struct HostLoop {
    config: HostConfig,
    paused: bool,
    show_help: bool,
}

/// Pending change to the playback position requested by input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    None,
    Forward,
}

impl HostLoop {
    /// Create a host loop from its configuration.
    #[must_use]
    pub const fn new(config: HostConfig) -> Self {
        Self {
            paused: config.start_paused,
            show_help: config.show_help,
            config,
        }
    }

    /// Returns `true` while playback is paused.
    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    /// Returns `true` while help text is passed to the sink.
    #[must_use]
    pub const fn shows_help(&self) -> bool {
        self.show_help
    }

    /// Run until quit, end of stream, the tick limit, or exhausted input
    /// while paused.
    ///
    /// Paused ticks re-run the current frame so parameter edits show up
    /// immediately. Input that changed the preview always gets one more
    /// tick, even when it was the last input.
    ///
    /// # Errors
    ///
    /// Returns [`HostError`] on a source or sink failure, or on a
    /// pipeline configuration error.
    pub fn run<S, K, I>(
        &mut self,
        manager: &mut Manager,
        source: &mut S,
        sink: &mut K,
        input: &mut I,
    ) -> Result<HostSummary, HostError>
    where
        S: FrameSource + ?Sized,
        K: FrameSink + ?Sized,
        I: InputSource + ?Sized,
    {
        let mut ticks = 0_u64;
        let mut frames_read = 0_u64;
        let mut snapshots = 0_u64;
        let mut diagnostics = Vec::new();
        let mut current: Option<Frame> = None;
        let mut step = Step::Forward;

        let stop = loop {
            if self.config.max_ticks.is_some_and(|max| ticks >= max) {
                break StopReason::MaxTicks;
            }

            if !self.paused || current.is_none() || step == Step::Forward {
                let next = match source.read_next()? {
                    Some(frame) => Some(frame),
                    None if self.config.loop_playback && !input.is_exhausted() => {
                        debug!("end of stream, rewinding");
                        source.seek(0)?;
                        source.read_next()?
                    }
                    None => None,
                };
                match next {
                    Some(frame) => {
                        current = Some(frame);
                        frames_read += 1;
                    }
                    None if current.is_some() && self.paused => {}
                    None => break StopReason::EndOfStream,
                }
                step = Step::None;
            }
            let Some(frame) = current.as_ref() else {
                break StopReason::EndOfStream;
            };

            manager.run(frame, &Payload::Empty)?;
            let help = self.show_help.then(|| manager.help());
            sink.draw(manager.preview().unwrap_or(frame), help.as_deref())?;
            diagnostics.push(manager.diagnostics());
            ticks += 1;

            let mut quit = false;
            // Set when input changed what the next draw would show.
            let mut changed = false;
            while let Some(event) = input.poll() {
                let action = match event {
                    InputEvent::Key(code) if manager.on_keydown(code) => {
                        changed = true;
                        None
                    }
                    InputEvent::Key(code) => host_action(code),
                    InputEvent::Mouse(event) => {
                        changed |= manager.on_mouse(event);
                        None
                    }
                };
                let Some(action) = action else {
                    continue;
                };
                debug!(?action, "host action");
                match action {
                    HostAction::NextStage => {
                        manager.next();
                        changed = true;
                    }
                    HostAction::PrevStage => {
                        manager.prev();
                        changed = true;
                    }
                    HostAction::SelectLast => {
                        manager.select_last();
                        changed = true;
                    }
                    HostAction::SelectStage(i) => {
                        manager.select(Selection::Stage(i));
                        changed = true;
                    }
                    HostAction::TogglePause => self.paused = !self.paused,
                    HostAction::StepForward => step = Step::Forward,
                    HostAction::StepBack => {
                        let position = source.position();
                        if position >= 2 {
                            source.seek(position - 2)?;
                            step = Step::Forward;
                        }
                    }
                    HostAction::Snapshot => {
                        let label = format!("tick{ticks:05}-{}", selection_label(manager));
                        sink.snapshot(manager.preview().unwrap_or(frame), &label)?;
                        snapshots += 1;
                    }
                    HostAction::ToggleHelp => {
                        self.show_help = !self.show_help;
                        changed = true;
                    }
                    HostAction::Quit => {
                        quit = true;
                        break;
                    }
                }
            }
            if quit {
                break StopReason::Quit;
            }
            if self.paused && step == Step::None && !changed && input.is_exhausted() {
                break StopReason::InputExhausted;
            }
        };

        info!(ticks, frames_read, snapshots, ?stop, "host loop stopped");
        Ok(HostSummary {
            ticks,
            frames_read,
            snapshots,
            stop,
            diagnostics,
        })
    }
}

fn selection_label(manager: &Manager) -> String {
    manager
        .selected_stage()
        .map_or_else(|| "output".to_string(), |stage| stage.name().to_string())
}
