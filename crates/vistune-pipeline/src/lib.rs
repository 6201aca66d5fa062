//! vistune-pipeline: a live-tunable, fault-isolating image pipeline
//! engine (sans-IO).
//!
//! A [`Manager`] owns an ordered list of named [`Stage`]s. Each tick it
//! threads a frame and an auxiliary [`Payload`] through the stages; a
//! stage that fails is recorded and every stage after it is skipped, so
//! one broken step never takes the whole pipeline down. Stages declare
//! typed [`Parameter`]s that the user tunes from the keyboard and mouse
//! while frames keep flowing.
//!
//! Each tick runs: source frame -> stage 0 -> stage 1 -> ... ->
//! stage N-1 -> output, with key and mouse input routed to the selected
//! stage between ticks.
//!
//! The crate has **no I/O dependencies** -- frames come from a
//! [`FrameSource`], previews go to a [`FrameSink`], and input comes
//! from an [`InputSource`], all supplied by the host binary.

pub mod diagnostics;
pub mod host;
pub mod keymap;
pub mod manager;
pub mod ops;
pub mod param;
pub mod stage;
pub mod types;

pub use diagnostics::{
    DiagnosticsSummary, StageDiagnostics, StageStatus, StageSummary, TickDiagnostics, summarize,
};
pub use host::{
    FrameSink, FrameSource, HostConfig, HostError, HostLoop, HostSummary, InputSource,
    ScriptedInput, SinkError, SourceError, StopReason,
};
pub use keymap::{
    HOST_KEYMAP, HostAction, InputEvent, KeyCode, MouseEvent, MouseFlags, MouseKind,
    STAGE_KEYMAP, StageAction, host_action, stage_action,
};
pub use manager::{Manager, Selection, TickOutput};
pub use param::{ParamConfig, ParamEnum, ParamKind, ParamSpec, Parameter, Value};
pub use stage::{Stage, StageBody, StageRun, StageScope};
pub use types::{Frame, ParamError, Payload, PipelineError, Point, Polyline, Roi, StageError};
