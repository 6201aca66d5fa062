//! Ordered stage container with selection, fault isolation, and event
//! routing.
//!
//! Stages live in an arena in registration order; the stage before
//! `stages[k]` is simply `stages[k - 1]`, so no stage holds a reference
//! to another. A run threads each stage's output into the next one and
//! bypasses every stage downstream of a failure.

use std::time::Duration;

use tracing::{debug, error, warn};

use crate::diagnostics::{StageDiagnostics, TickDiagnostics};
use crate::keymap::{KeyCode, MouseEvent};
use crate::stage::{Stage, StageBody, StageScope};
use crate::types::{Frame, ParamError, Payload, PipelineError, Roi};

/// Which part of the pipeline the user is looking at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection {
    /// A stage by position.
    Stage(usize),
    /// The pipeline's final output.
    #[default]
    Last,
}

impl std::fmt::Display for Selection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stage(i) => write!(f, "stage {i}"),
            Self::Last => f.write_str("output"),
        }
    }
}

/// Result of one tick, borrowed from the manager or from the input.
#[derive(Debug, Clone, Copy)]
pub struct TickOutput<'a> {
    /// Frame of the last stage that ran successfully.
    pub frame: &'a Frame,
    /// Payload of that stage.
    pub data: &'a Payload,
    /// Index of that stage, or `None` when the input passed through.
    pub source: Option<usize>,
}

/// The pipeline: stages in order plus the user's selection and ROI.
#[derive(Debug, Default)]
pub struct Manager {
    stages: Vec<Stage>,
    selection: Selection,
    roi: Option<Roi>,
    output: Option<usize>,
    ticks: u64,
}

impl Manager {
    /// Create an empty pipeline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a closure stage and return its index.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::DuplicateStage`] if the name is taken.
    pub fn push(
        &mut self,
        name: impl Into<String>,
        body: impl FnMut(&mut StageScope<'_>) -> anyhow::Result<()> + 'static,
    ) -> Result<usize, PipelineError> {
        self.push_body(name, body)
    }

    /// Append a stage with any [`StageBody`] and return its index.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::DuplicateStage`] if the name is taken.
    pub fn push_body(
        &mut self,
        name: impl Into<String>,
        body: impl StageBody + 'static,
    ) -> Result<usize, PipelineError> {
        let name = name.into();
        if self.index_of(&name).is_some() {
            return Err(PipelineError::DuplicateStage { name });
        }
        self.stages.push(Stage::from_body(name, body));
        Ok(self.stages.len() - 1)
    }

    /// Chaining form of [`push`](Self::push).
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::DuplicateStage`] if the name is taken.
    pub fn with_stage(
        mut self,
        name: impl Into<String>,
        body: impl FnMut(&mut StageScope<'_>) -> anyhow::Result<()> + 'static,
    ) -> Result<Self, PipelineError> {
        self.push(name, body)?;
        Ok(self)
    }

    /// Position of the stage with this name.
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.stages.iter().position(|s| s.name() == name)
    }

    /// Stage by position.
    #[must_use]
    pub fn stage(&self, index: usize) -> Option<&Stage> {
        self.stages.get(index)
    }

    /// Stage by name.
    #[must_use]
    pub fn stage_by_name(&self, name: &str) -> Option<&Stage> {
        self.stages.iter().find(|s| s.name() == name)
    }

    /// Stage by position, for direct tuning.
    pub fn stage_mut(&mut self, index: usize) -> Option<&mut Stage> {
        self.stages.get_mut(index)
    }

    /// Number of stages.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.stages.len()
    }

    /// Returns `true` if no stage is registered.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// All stages in order.
    #[must_use]
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Number of completed runs.
    #[must_use]
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Current selection.
    #[must_use]
    pub const fn selection(&self) -> Selection {
        self.selection
    }

    /// The selected stage, or `None` when the output is selected.
    #[must_use]
    pub fn selected_stage(&self) -> Option<&Stage> {
        match self.selection {
            Selection::Stage(i) => self.stages.get(i),
            Selection::Last => None,
        }
    }

    /// Select a stage or the output.
    ///
    /// `Stage(len)` means the output; larger indices clamp to the last
    /// stage. An empty pipeline always selects the output.
    pub fn select(&mut self, selection: Selection) {
        let n = self.stages.len();
        let next = match selection {
            Selection::Stage(_) if n == 0 => Selection::Last,
            Selection::Stage(i) if i == n => Selection::Last,
            Selection::Stage(i) => Selection::Stage(i.min(n - 1)),
            Selection::Last => Selection::Last,
        };
        if next != self.selection {
            debug!(from = %self.selection, to = %next, "selection changed");
        }
        self.selection = next;
    }

    /// Select the pipeline output.
    pub fn select_last(&mut self) {
        self.select(Selection::Last);
    }

    /// Select the stage by name. Returns `false` if there is none.
    pub fn select_name(&mut self, name: &str) -> bool {
        match self.index_of(name) {
            Some(index) => {
                self.select(Selection::Stage(index));
                true
            }
            None => false,
        }
    }

    /// Step forward: stage `i` to `i + 1`, the last stage to the output,
    /// and the output back to the first stage.
    pub fn next(&mut self) {
        let next = match self.selection {
            Selection::Stage(i) if i + 1 < self.stages.len() => Selection::Stage(i + 1),
            Selection::Stage(_) => Selection::Last,
            Selection::Last if self.stages.is_empty() => Selection::Last,
            Selection::Last => Selection::Stage(0),
        };
        self.select(next);
    }

    /// Step backward: the first stage to the output, and the output to
    /// the last stage.
    pub fn prev(&mut self) {
        let next = match self.selection {
            Selection::Stage(0) => Selection::Last,
            Selection::Stage(i) => Selection::Stage(i - 1),
            Selection::Last => match self.stages.len() {
                0 => Selection::Last,
                n => Selection::Stage(n - 1),
            },
        };
        self.select(next);
    }

    /// Region of interest shared with every stage body.
    #[must_use]
    pub const fn roi(&self) -> Option<Roi> {
        self.roi
    }

    /// Set the region of interest for subsequent runs.
    pub fn set_roi(&mut self, roi: Roi) {
        debug!(%roi, "roi set");
        self.roi = Some(roi);
    }

    /// Clear the region of interest.
    pub fn clear_roi(&mut self) {
        self.roi = None;
    }

    /// Process one frame through every stage.
    ///
    /// A stage runs only if the stage before it succeeded; otherwise it
    /// is skipped. Returns the output of the last stage that ran
    /// successfully, or the input itself if none did.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Config`] if a stage body misused a
    /// parameter. Stages after it are reset to not run for this tick.
    #[tracing::instrument(skip_all, fields(tick = self.ticks, stages = self.stages.len()))]
    pub fn run<'a>(
        &'a mut self,
        input: &'a Frame,
        input_data: &'a Payload,
    ) -> Result<TickOutput<'a>, PipelineError> {
        let roi = self.roi;
        self.output = None;
        self.ticks += 1;

        for index in 0..self.stages.len() {
            let (done, rest) = self.stages.split_at_mut(index);
            let Some(stage) = rest.first_mut() else {
                break;
            };

            let upstream = match done.last() {
                None => Some((input, input_data)),
                Some(prev) if prev.error().is_some() => None,
                Some(prev) => prev.frame().map(|frame| (frame, prev.data())),
            };
            let Some((frame, data)) = upstream else {
                stage.skip();
                debug!(stage = stage.name(), "skipped");
                continue;
            };

            let failure = stage
                .run(frame, data, roi)
                .err()
                .map(|e| (e.as_config().cloned(), e.to_string()));
            match failure {
                None => self.output = Some(index),
                Some((Some(config), _)) => {
                    let error = config_error(stage.name(), config);
                    for later in rest.iter_mut().skip(1) {
                        later.reset();
                    }
                    return Err(error);
                }
                Some((None, message)) => {
                    warn!(stage = stage.name(), error = %message, "stage failed");
                }
            }
        }

        let this: &'a Self = self;
        Ok(this.output_or(input, input_data))
    }

    fn output_or<'a>(&'a self, input: &'a Frame, input_data: &'a Payload) -> TickOutput<'a> {
        self.output
            .and_then(|index| {
                let stage = self.stages.get(index)?;
                Some(TickOutput {
                    frame: stage.frame()?,
                    data: stage.data(),
                    source: Some(index),
                })
            })
            .unwrap_or(TickOutput {
                frame: input,
                data: input_data,
                source: None,
            })
    }

    /// Route a key press to the selected stage.
    ///
    /// Returns whether it was consumed; never consumed while the output
    /// is selected.
    pub fn on_keydown(&mut self, code: KeyCode) -> bool {
        match self.selection {
            Selection::Stage(i) => self
                .stages
                .get_mut(i)
                .is_some_and(|stage| stage.on_keydown(code)),
            Selection::Last => false,
        }
    }

    /// Route a mouse event to the selected stage.
    ///
    /// Returns whether it was consumed; never consumed while the output
    /// is selected.
    pub fn on_mouse(&mut self, event: MouseEvent) -> bool {
        match self.selection {
            Selection::Stage(i) => self
                .stages
                .get_mut(i)
                .is_some_and(|stage| stage.on_mouse(event)),
            Selection::Last => false,
        }
    }

    /// Frame to display for the current selection.
    ///
    /// For a stage, its own frame, or the nearest upstream frame when it
    /// produced none. For the output, the last successful frame. `None`
    /// means nothing upstream produced a frame: show the input.
    #[must_use]
    pub fn preview(&self) -> Option<&Frame> {
        match self.selection {
            Selection::Stage(i) => self
                .stages
                .get(..=i)?
                .iter()
                .rev()
                .find_map(Stage::frame),
            Selection::Last => self
                .output
                .and_then(|index| self.stages.get(index))
                .and_then(Stage::frame),
        }
    }

    /// Help text for the current selection.
    ///
    /// A stage renders its parameter dump; the output renders a one-line
    /// status per stage.
    #[must_use]
    pub fn help(&self) -> String {
        if let Some(stage) = self.selected_stage() {
            return stage.as_help();
        }

        let mut lines = Vec::with_capacity(self.stages.len() + 2);
        let source = self
            .output
            .and_then(|index| self.stages.get(index))
            .map_or("input", Stage::name);
        lines.push(format!("[output] from {source}"));
        if let Some(roi) = self.roi {
            lines.push(format!("  roi: {roi}"));
        }
        for (i, stage) in self.stages.iter().enumerate() {
            let ms = stage.duration().as_secs_f64() * 1000.0;
            lines.push(format!(
                "  {i} {}: {} ({ms:.3}ms)",
                stage.name(),
                stage.status().label()
            ));
        }
        lines.join("\n")
    }

    /// Snapshot of every stage after the most recent run.
    #[must_use]
    pub fn diagnostics(&self) -> TickDiagnostics {
        let stages: Vec<StageDiagnostics> = self
            .stages
            .iter()
            .map(|stage| StageDiagnostics {
                name: stage.name().to_string(),
                duration: stage.duration(),
                status: stage.status(),
                output_size: stage.frame().map(|f| (f.width(), f.height())),
                data: stage.data().summary(),
                params: stage
                    .params()
                    .map(|p| (p.name().to_string(), p.format()))
                    .collect(),
            })
            .collect();
        let total_duration = stages.iter().map(|s| s.duration).sum::<Duration>();
        TickDiagnostics {
            tick: self.ticks.saturating_sub(1),
            roi: self.roi,
            stages,
            total_duration,
        }
    }
}

fn config_error(stage: &str, source: ParamError) -> PipelineError {
    error!(stage, error = %source, "configuration error in stage body");
    PipelineError::Config {
        stage: stage.to_string(),
        source,
    }
}
