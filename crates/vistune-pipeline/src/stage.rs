//! A single named pipeline step and its scoped run bracket.
//!
//! A [`Stage`] owns its output frame and payload, its parameters in
//! declaration order, a parameter cursor, and the outcome of its last
//! run. The processing itself is an opaque [`StageBody`] that sees the
//! previous stage's output through a [`StageScope`].
//!
//! Every run goes through a [`StageRun`] guard: entering it clears the
//! previous outcome and starts the clock, [`StageRun::finish`] applies
//! the mandatory-output check and records the body's error, and the
//! guard's `Drop` stamps the duration on any path that never reaches
//! `finish` (unwinding included).

use std::time::Duration;

use tracing::debug;
use web_time::Instant;

use crate::diagnostics::StageStatus;
use crate::keymap::{KeyCode, MouseEvent, StageAction, stage_action};
use crate::param::{ParamEnum, ParamKind, ParamSpec, Parameter};
use crate::types::{Frame, ParamError, Payload, Point, Roi, StageError};

/// The processing a stage performs each tick.
///
/// Implemented for every `FnMut(&mut StageScope<'_>) -> anyhow::Result<()>`
/// closure. A body must call [`StageScope::set_output`] (or
/// [`StageScope::forward_input`]) before returning `Ok`.
pub trait StageBody {
    /// Process one frame.
    ///
    /// # Errors
    ///
    /// Any error is recorded as the stage's terminal state for this tick.
    /// A [`ParamError`] is a programmer error and aborts the whole tick.
    fn run(&mut self, scope: &mut StageScope<'_>) -> anyhow::Result<()>;
}

impl<F> StageBody for F
where
    F: FnMut(&mut StageScope<'_>) -> anyhow::Result<()>,
{
    fn run(&mut self, scope: &mut StageScope<'_>) -> anyhow::Result<()> {
        self(scope)
    }
}

/// Mutable per-run state of a stage, borrowed by the scope during a run.
#[derive(Debug, Default)]
struct StageState {
    frame: Option<Frame>,
    data: Payload,
    params: Vec<Parameter>,
    cursor: usize,
    error: Option<StageError>,
    duration: Duration,
    ran: bool,
}

impl StageState {
    fn position(&self, name: &str) -> Option<usize> {
        self.params.iter().position(|p| p.name() == name)
    }

    fn param_or_insert(&mut self, name: &str) -> &mut Parameter {
        let index = match self.position(name) {
            Some(index) => index,
            None => {
                self.params.push(Parameter::new(name));
                self.params.len() - 1
            }
        };
        &mut self.params[index]
    }
}

/// One step of the pipeline.
pub struct Stage {
    name: String,
    state: StageState,
    body: Box<dyn StageBody>,
}

impl std::fmt::Debug for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stage")
            .field("name", &self.name)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Stage {
    /// Create a stage that has not run yet.
    pub fn new(
        name: impl Into<String>,
        body: impl FnMut(&mut StageScope<'_>) -> anyhow::Result<()> + 'static,
    ) -> Self {
        Self::from_body(name, body)
    }

    /// Create a stage from any [`StageBody`] implementation.
    pub fn from_body(name: impl Into<String>, body: impl StageBody + 'static) -> Self {
        Self {
            name: name.into(),
            state: StageState::default(),
            body: Box::new(body),
        }
    }

    /// Stage name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Output frame of the last run, if it produced one.
    #[must_use]
    pub const fn frame(&self) -> Option<&Frame> {
        self.state.frame.as_ref()
    }

    /// Output payload of the last run.
    #[must_use]
    pub const fn data(&self) -> &Payload {
        &self.state.data
    }

    /// Error of the last run, or the skip sentinel.
    #[must_use]
    pub const fn error(&self) -> Option<&StageError> {
        self.state.error.as_ref()
    }

    /// Wall-clock duration of the last run (zero when skipped).
    #[must_use]
    pub const fn duration(&self) -> Duration {
        self.state.duration
    }

    /// Outcome of the last tick.
    #[must_use]
    pub fn status(&self) -> StageStatus {
        match &self.state.error {
            _ if !self.state.ran => StageStatus::Pending,
            None => StageStatus::Ok,
            Some(StageError::Skipped) => StageStatus::Skipped,
            Some(e) => StageStatus::Failed {
                message: e.to_string(),
            },
        }
    }

    /// Parameters in declaration order.
    pub fn params(&self) -> impl Iterator<Item = &Parameter> {
        self.state.params.iter()
    }

    /// Number of declared parameters.
    #[must_use]
    pub fn param_count(&self) -> usize {
        self.state.params.len()
    }

    /// Look up a parameter by name.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&Parameter> {
        self.state.params.iter().find(|p| p.name() == name)
    }

    /// Look up a parameter by name for direct tuning.
    pub fn param_mut(&mut self, name: &str) -> Option<&mut Parameter> {
        self.state.params.iter_mut().find(|p| p.name() == name)
    }

    /// Run the body on the previous stage's output.
    ///
    /// # Errors
    ///
    /// Returns the recorded error when the body failed or did not
    /// produce a frame. The error stays available through
    /// [`error`](Self::error).
    pub fn run(
        &mut self,
        input: &Frame,
        input_data: &Payload,
        roi: Option<Roi>,
    ) -> Result<(), &StageError> {
        let Self { name, state, body } = &mut *self;
        {
            let mut run = StageRun::begin(name, state, input, input_data, roi);
            let outcome = body.run(run.scope());
            run.finish(outcome);
        }
        match &self.state.error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Mark the stage as bypassed without running its body.
    pub fn skip(&mut self) {
        let state = &mut self.state;
        state.frame = None;
        state.data = Payload::Empty;
        state.error = Some(StageError::Skipped);
        state.duration = Duration::ZERO;
        state.ran = true;
    }

    /// Forget the last outcome so the stage reports as not yet run.
    ///
    /// Parameters and the cursor are kept.
    pub fn reset(&mut self) {
        let state = &mut self.state;
        state.frame = None;
        state.data = Payload::Empty;
        state.error = None;
        state.duration = Duration::ZERO;
        state.ran = false;
    }

    /// Index of the parameter under the cursor.
    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.state.cursor
    }

    /// The parameter under the cursor, if any are declared.
    #[must_use]
    pub fn current_param(&self) -> Option<&Parameter> {
        self.state.params.get(self.state.cursor)
    }

    fn current_param_mut(&mut self) -> Option<&mut Parameter> {
        self.state.params.get_mut(self.state.cursor)
    }

    /// Move the cursor to the previous parameter, stopping at the first.
    pub const fn prev_cursor(&mut self) {
        self.state.cursor = self.state.cursor.saturating_sub(1);
    }

    /// Move the cursor to the next parameter, stopping at the last.
    pub fn next_cursor(&mut self) {
        let last = self.state.params.len().saturating_sub(1);
        if self.state.cursor < last {
            self.state.cursor += 1;
        }
    }

    /// Step the parameter under the cursor up.
    ///
    /// Returns whether its value changed.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError::NotReady`] if the parameter was declared but
    /// never built.
    pub fn increase_at_cursor(&mut self) -> Result<bool, ParamError> {
        self.current_param_mut().map_or(Ok(false), Parameter::increase)
    }

    /// Step the parameter under the cursor down.
    ///
    /// Returns whether its value changed.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError::NotReady`] if the parameter was declared but
    /// never built.
    pub fn decrease_at_cursor(&mut self) -> Result<bool, ParamError> {
        self.current_param_mut().map_or(Ok(false), Parameter::decrease)
    }

    /// Handle a key press. Returns whether the stage consumed it.
    ///
    /// Cursor movement always applies. A keycode recorder under the
    /// cursor swallows every other key; otherwise the tuning keys step
    /// the parameter under the cursor.
    pub fn on_keydown(&mut self, code: KeyCode) -> bool {
        if self.state.params.is_empty() {
            return false;
        }
        let action = stage_action(code);
        match action {
            Some(StageAction::CursorPrev) => {
                self.prev_cursor();
                return true;
            }
            Some(StageAction::CursorNext) => {
                self.next_cursor();
                return true;
            }
            Some(StageAction::Decrease | StageAction::Increase) | None => {}
        }

        let Some(param) = self.current_param_mut() else {
            return false;
        };
        if param.kind() == Some(ParamKind::Keycode) {
            return param.on_keydown(code).unwrap_or(false);
        }
        let stepped = match action {
            Some(StageAction::Increase) => param.increase(),
            Some(StageAction::Decrease) => param.decrease(),
            _ => return false,
        };
        match stepped {
            Ok(_) => true,
            Err(error) => {
                debug!(stage = %self.name, %error, "key not applied");
                false
            }
        }
    }

    /// Forward a mouse event to the parameter under the cursor.
    ///
    /// Returns whether it was consumed (only pickers consume mouse input).
    pub fn on_mouse(&mut self, event: MouseEvent) -> bool {
        self.current_param_mut()
            .is_some_and(|param| param.on_mouse(event).unwrap_or(false))
    }

    /// Human-readable dump: name, outcome, every parameter with the cursor
    /// marked, the payload, and the last error.
    #[must_use]
    pub fn as_help(&self) -> String {
        let mut lines = Vec::with_capacity(self.state.params.len() + 3);
        let ms = self.state.duration.as_secs_f64() * 1000.0;
        let status = match self.status() {
            StageStatus::Pending => "pending".to_string(),
            StageStatus::Ok => "ok".to_string(),
            StageStatus::Skipped => "skipped".to_string(),
            StageStatus::Failed { .. } => "failed".to_string(),
        };
        lines.push(format!("[{}] {status} ({ms:.3}ms)", self.name));

        for (i, param) in self.state.params.iter().enumerate() {
            let marker = if i == self.state.cursor { '>' } else { ' ' };
            lines.push(format!("{marker} {}: {}", param.name(), param.format()));
        }

        if !self.state.data.is_empty() {
            lines.push(format!("  data: {}", self.state.data.summary()));
        }
        if let Some(error) = &self.state.error {
            lines.push(format!("  error: {error}"));
        }
        lines.join("\n")
    }
}

/// What a body sees while it runs: the previous stage's output, the
/// pipeline ROI, and its own parameters and outputs.
pub struct StageScope<'a> {
    name: &'a str,
    state: &'a mut StageState,
    input: &'a Frame,
    input_data: &'a Payload,
    roi: Option<Roi>,
}

impl<'a> StageScope<'a> {
    /// Name of the running stage.
    #[must_use]
    pub const fn name(&self) -> &'a str {
        self.name
    }

    /// The previous stage's frame (the pipeline input for the first stage).
    #[must_use]
    pub const fn input(&self) -> &'a Frame {
        self.input
    }

    /// The previous stage's payload.
    #[must_use]
    pub const fn input_data(&self) -> &'a Payload {
        self.input_data
    }

    /// The pipeline's active region of interest.
    #[must_use]
    pub const fn roi(&self) -> Option<Roi> {
        self.roi
    }

    /// Assign the output frame.
    pub fn set_output(&mut self, frame: Frame) {
        self.state.frame = Some(frame);
    }

    /// Assign the output payload.
    pub fn set_data(&mut self, data: Payload) {
        self.state.data = data;
    }

    /// Pass the input frame and payload through unchanged.
    pub fn forward_input(&mut self) {
        self.state.frame = Some(self.input.clone());
        self.state.data = self.input_data.clone();
    }

    /// The named parameter, created empty on first reference.
    pub fn param(&mut self, name: &str) -> &mut Parameter {
        self.state.param_or_insert(name)
    }

    /// Declare a parameter from a full spec (e.g. one with a cacher).
    ///
    /// # Errors
    ///
    /// See [`Parameter::build`].
    pub fn build(&mut self, name: &str, spec: ParamSpec) -> Result<&mut Parameter, ParamError> {
        self.param(name).build(spec)
    }

    /// Declare an on/off toggle and read it.
    ///
    /// # Errors
    ///
    /// See [`Parameter::build`].
    pub fn bool(&mut self, name: &str, value: bool) -> Result<bool, ParamError> {
        self.param(name).build_bool(value)?.as_bool()
    }

    /// Declare a bounded integer and read it.
    ///
    /// # Errors
    ///
    /// See [`Parameter::build`].
    pub fn int(
        &mut self,
        name: &str,
        value: i64,
        min: i64,
        max: i64,
        step: i64,
    ) -> Result<i64, ParamError> {
        self.param(name).build_int(value, min, max, step)?.as_int()
    }

    /// Declare a non-negative integer `>= min` and read it.
    ///
    /// # Errors
    ///
    /// See [`Parameter::build`].
    pub fn uint(&mut self, name: &str, value: i64, min: i64) -> Result<i64, ParamError> {
        self.param(name).build_uint(value, min)?.as_int()
    }

    /// Declare a bounded float and read it.
    ///
    /// # Errors
    ///
    /// See [`Parameter::build`].
    pub fn float(
        &mut self,
        name: &str,
        value: f64,
        min: f64,
        max: f64,
        step: f64,
    ) -> Result<f64, ParamError> {
        self.param(name)
            .build_float(value, min, max, step)?
            .as_float()
    }

    /// Declare an enum-backed choice and read the selected variant.
    ///
    /// # Errors
    ///
    /// See [`Parameter::build`].
    pub fn choice<T: ParamEnum>(&mut self, name: &str, value: T) -> Result<T, ParamError> {
        self.param(name).build_enum(value)?.get_enum()
    }

    /// Declare a list-backed choice and read the selected label.
    ///
    /// # Errors
    ///
    /// See [`Parameter::build_list`].
    pub fn list<T: ToString>(
        &mut self,
        name: &str,
        candidates: &[T],
        initial: &T,
    ) -> Result<String, ParamError> {
        Ok(self
            .param(name)
            .build_list(candidates, initial)?
            .selected_label()?
            .to_string())
    }

    /// Declare a read-only display and update its text.
    ///
    /// # Errors
    ///
    /// See [`Parameter::build`].
    pub fn show(&mut self, name: &str, text: impl Into<String>) -> Result<(), ParamError> {
        let text = text.into();
        self.param(name).build_readonly(text.clone())?.set_text(text)?;
        Ok(())
    }

    /// Declare a point picker and read the picked points.
    ///
    /// # Errors
    ///
    /// See [`Parameter::build`].
    pub fn points(&mut self, name: &str, limit: Option<usize>) -> Result<Vec<Point>, ParamError> {
        Ok(self.param(name).build_points(limit)?.points()?.to_vec())
    }

    /// Declare a rectangle picker and read the drawn rectangle.
    ///
    /// # Errors
    ///
    /// See [`Parameter::build`].
    pub fn roi_picker(&mut self, name: &str) -> Result<Option<Roi>, ParamError> {
        self.param(name).build_roi()?.roi()
    }

    /// Declare a keycode recorder and read the last key.
    ///
    /// # Errors
    ///
    /// See [`Parameter::build`].
    pub fn keycode(&mut self, name: &str) -> Result<Option<KeyCode>, ParamError> {
        self.param(name).build_keycode()?.keycode()
    }
}

/// Scoped bracket around one run of a stage body.
///
/// Created by [`StageRun::begin`], which resets the stage's outcome and
/// starts the clock. Consumed by [`StageRun::finish`]. If dropped without
/// finishing, only the duration is recorded.
#[must_use = "a run must be finished to apply the output check"]
pub struct StageRun<'a> {
    scope: StageScope<'a>,
    started: Instant,
    finished: bool,
}

impl<'a> StageRun<'a> {
    fn begin(
        name: &'a str,
        state: &'a mut StageState,
        input: &'a Frame,
        input_data: &'a Payload,
        roi: Option<Roi>,
    ) -> Self {
        state.error = None;
        state.frame = None;
        state.data = Payload::Empty;
        state.ran = true;
        Self {
            scope: StageScope {
                name,
                state,
                input,
                input_data,
                roi,
            },
            started: Instant::now(),
            finished: false,
        }
    }

    /// The scope handed to the body.
    pub const fn scope(&mut self) -> &mut StageScope<'a> {
        &mut self.scope
    }

    /// Close the bracket with the body's outcome.
    ///
    /// A body error becomes the stage error; a successful body that left
    /// no output frame becomes [`StageError::InvalidFrame`].
    pub fn finish(mut self, outcome: anyhow::Result<()>) {
        let state = &mut *self.scope.state;
        state.error = match outcome {
            Err(e) => Some(StageError::Failed(e)),
            Ok(()) if state.frame.is_none() => Some(StageError::InvalidFrame {
                stage: self.scope.name.to_string(),
            }),
            Ok(()) => None,
        };
        state.duration = self.started.elapsed();
        self.finished = true;
    }
}

impl Drop for StageRun<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.scope.state.duration = self.started.elapsed();
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::keymap::{MouseFlags, MouseKind};

    fn frame() -> Frame {
        Frame::new_luma8(4, 4)
    }

    fn tuned_stage() -> Stage {
        Stage::new("tune", |scope: &mut StageScope<'_>| {
            let t = scope.int("threshold", 10, 0, 20, 5)?;
            scope.bool("invert", false)?;
            scope.float("gain", 1.0, 0.0, 2.0, 0.5)?;
            scope.forward_input();
            scope.set_data(Payload::Scalar(f64::from(i32::try_from(t)?)));
            Ok(())
        })
    }

    #[test]
    fn run_success_records_output() {
        let mut stage = tuned_stage();
        assert_eq!(stage.status(), StageStatus::Pending);
        assert!(stage.run(&frame(), &Payload::Empty, None).is_ok());
        assert!(stage.frame().is_some());
        assert_eq!(stage.data(), &Payload::Scalar(10.0));
        assert!(stage.error().is_none());
        assert_eq!(stage.status(), StageStatus::Ok);
        assert_eq!(stage.param_count(), 3);
    }

    #[test]
    fn run_without_output_is_invalid_frame() {
        let mut stage = Stage::new("lazy", |_: &mut StageScope<'_>| Ok(()));
        let err = stage.run(&frame(), &Payload::Empty, None).unwrap_err();
        assert!(matches!(err, StageError::InvalidFrame { stage } if stage == "lazy"));
    }

    #[test]
    fn run_error_is_recorded_and_returned() {
        let mut stage = Stage::new("bad", |_: &mut StageScope<'_>| {
            anyhow::bail!("kernel size must be odd")
        });
        let err = stage.run(&frame(), &Payload::Empty, None).unwrap_err();
        assert_eq!(err.to_string(), "kernel size must be odd");
        assert!(stage.frame().is_none());
        assert!(stage.as_help().contains("error: kernel size must be odd"));
    }

    #[test]
    fn run_clears_previous_outcome() {
        let mut fail = true;
        let mut stage = Stage::new("flaky", move |scope: &mut StageScope<'_>| {
            if std::mem::replace(&mut fail, false) {
                anyhow::bail!("first tick fails");
            }
            scope.forward_input();
            Ok(())
        });
        assert!(stage.run(&frame(), &Payload::Empty, None).is_err());
        assert!(stage.run(&frame(), &Payload::Empty, None).is_ok());
        assert!(stage.error().is_none());
    }

    #[test]
    fn output_does_not_leak_across_runs() {
        let mut produce = true;
        let mut stage = Stage::new("once", move |scope: &mut StageScope<'_>| {
            if std::mem::replace(&mut produce, false) {
                scope.forward_input();
            }
            Ok(())
        });
        assert!(stage.run(&frame(), &Payload::Empty, None).is_ok());
        assert!(matches!(
            stage.run(&frame(), &Payload::Empty, None),
            Err(StageError::InvalidFrame { .. })
        ));
        assert!(stage.frame().is_none());
    }

    #[test]
    fn skip_marks_sentinel() {
        let mut stage = tuned_stage();
        stage.run(&frame(), &Payload::Empty, None).unwrap();
        stage.skip();
        assert!(stage.error().is_some_and(StageError::is_skip));
        assert_eq!(stage.duration(), Duration::ZERO);
        assert!(stage.frame().is_none());
        assert_eq!(stage.status(), StageStatus::Skipped);
    }

    #[test]
    fn reset_returns_to_pending_and_keeps_params() {
        let mut stage = tuned_stage();
        stage.run(&frame(), &Payload::Empty, None).unwrap();
        stage.increase_at_cursor().unwrap();
        stage.reset();
        assert_eq!(stage.status(), StageStatus::Pending);
        assert!(stage.frame().is_none());
        assert_eq!(stage.data(), &Payload::Empty);
        assert_eq!(stage.param("threshold").map(|p| p.as_int().unwrap()), Some(15));
    }

    #[test]
    fn parameters_survive_across_runs() {
        let mut stage = tuned_stage();
        stage.run(&frame(), &Payload::Empty, None).unwrap();
        stage.increase_at_cursor().unwrap();
        stage.run(&frame(), &Payload::Empty, None).unwrap();
        assert_eq!(stage.data(), &Payload::Scalar(15.0));
    }

    #[test]
    fn cursor_is_clamped() {
        let mut stage = tuned_stage();
        stage.run(&frame(), &Payload::Empty, None).unwrap();
        stage.prev_cursor();
        assert_eq!(stage.cursor(), 0);
        for _ in 0..5 {
            stage.next_cursor();
        }
        assert_eq!(stage.cursor(), 2);
        assert_eq!(stage.current_param().map(Parameter::name), Some("gain"));
    }

    #[test]
    fn cursor_operations_on_empty_stage() {
        let mut stage = Stage::new("empty", |scope: &mut StageScope<'_>| {
            scope.forward_input();
            Ok(())
        });
        stage.next_cursor();
        assert_eq!(stage.cursor(), 0);
        assert!(!stage.increase_at_cursor().unwrap());
        assert!(!stage.on_keydown(KeyCode::RIGHT));
    }

    #[test]
    fn keys_tune_parameter_under_cursor() {
        let mut stage = tuned_stage();
        stage.run(&frame(), &Payload::Empty, None).unwrap();
        assert!(stage.on_keydown(KeyCode::DOWN));
        assert!(stage.on_keydown(KeyCode::RIGHT));
        assert_eq!(stage.param("invert").map(|p| p.as_bool().unwrap()), Some(true));
        assert!(stage.on_keydown(KeyCode::UP));
        assert!(stage.on_keydown(KeyCode::LEFT));
        assert_eq!(stage.param("threshold").map(|p| p.as_int().unwrap()), Some(5));
        assert!(!stage.on_keydown(KeyCode::from_char('n')));
    }

    #[test]
    fn keys_on_unbuilt_parameter_are_unconsumed() {
        let mut stage = Stage::new("lazy", |scope: &mut StageScope<'_>| {
            scope.param("later");
            scope.forward_input();
            Ok(())
        });
        stage.run(&frame(), &Payload::Empty, None).unwrap();
        assert_eq!(stage.param_count(), 1);
        assert!(!stage.on_keydown(KeyCode::RIGHT));
        assert!(!stage.on_keydown(KeyCode::LEFT));
        assert!(stage.on_keydown(KeyCode::DOWN), "navigation still applies");
    }

    #[test]
    fn keycode_recorder_swallows_keys_but_not_navigation() {
        let mut stage = Stage::new("keys", |scope: &mut StageScope<'_>| {
            scope.int("level", 0, 0, 3, 1)?;
            scope.keycode("last key")?;
            scope.forward_input();
            Ok(())
        });
        stage.run(&frame(), &Payload::Empty, None).unwrap();
        stage.next_cursor();
        assert!(stage.on_keydown(KeyCode::from_char('n')));
        assert!(stage.on_keydown(KeyCode::RIGHT));
        assert_eq!(
            stage.param("last key").map(|p| p.keycode().unwrap()),
            Some(Some(KeyCode::RIGHT))
        );
        assert!(stage.on_keydown(KeyCode::UP));
        assert_eq!(stage.cursor(), 0);
    }

    #[test]
    fn mouse_goes_to_picker_under_cursor() {
        let mut stage = Stage::new("pick", |scope: &mut StageScope<'_>| {
            let points = scope.points("seeds", None)?;
            scope.forward_input();
            scope.set_data(Payload::Points(points));
            Ok(())
        });
        stage.run(&frame(), &Payload::Empty, None).unwrap();
        let click = MouseEvent::new(MouseKind::LeftDown, 2, 3, MouseFlags::LEFT);
        assert!(stage.on_mouse(click));
        stage.run(&frame(), &Payload::Empty, None).unwrap();
        assert_eq!(
            stage.data(),
            &Payload::Points(vec![Point::new(2.0, 3.0)])
        );
    }

    #[test]
    fn help_marks_cursor_and_status() {
        let mut stage = tuned_stage();
        stage.run(&frame(), &Payload::Empty, None).unwrap();
        stage.next_cursor();
        let help = stage.as_help();
        let lines: Vec<&str> = help.lines().collect();
        assert!(lines[0].starts_with("[tune] ok"));
        assert_eq!(lines[1], "  threshold: 10");
        assert_eq!(lines[2], "> invert: off");
        assert_eq!(lines[3], "  gain: 1.0");
        assert_eq!(lines[4], "  data: 10.000");
    }

    #[test]
    fn param_error_surfaces_through_body() {
        let mut stage = Stage::new("misuse", |scope: &mut StageScope<'_>| {
            scope.int("k", 1, 0, 5, 1)?;
            scope.bool("k", true)?;
            scope.forward_input();
            Ok(())
        });
        let err = stage.run(&frame(), &Payload::Empty, None).unwrap_err();
        assert!(matches!(
            err.as_config(),
            Some(ParamError::AlreadyFrozen { .. })
        ));
    }

    #[test]
    fn show_updates_readonly_each_run() {
        let mut count = 0;
        let mut stage = Stage::new("count", move |scope: &mut StageScope<'_>| {
            count += 1;
            scope.show("runs", count.to_string())?;
            scope.forward_input();
            Ok(())
        });
        stage.run(&frame(), &Payload::Empty, None).unwrap();
        stage.run(&frame(), &Payload::Empty, None).unwrap();
        assert_eq!(stage.param("runs").map(|p| p.text().unwrap()), Some("2"));
    }
}
