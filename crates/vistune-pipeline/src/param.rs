//! Live-tunable stage parameters.
//!
//! A [`Parameter`] starts out empty when a stage body first names it and
//! is configured exactly once by a `build*` call. Configuring produces an
//! immutable [`ParamConfig`] (bounds, step, candidates, cacher, formatter)
//! alongside a separate mutable value cell; a parameter is "frozen"
//! precisely when that configuration exists. Stage bodies call the same
//! `build*` every tick, so a rebuild of the same kind is a silent no-op
//! and the value tuned by the user survives.
//!
//! # Indexed parameters
//!
//! Enum- and list-backed parameters store an index into a snapshot of
//! their candidate labels. Stepping walks `index ± 1` whatever the
//! element type, and the bounds are `[0, len - 1]`. Callers read and
//! write elements through [`Parameter::get_enum`], [`Parameter::set_enum`],
//! [`Parameter::selected_label`], and [`Parameter::set_label`].
//!
//! # Cache
//!
//! A parameter may carry a cacher that derives an expensive object from
//! its value (a convolution kernel, a structuring element). The cacher
//! runs once at build time and then only when the raw value actually
//! changes, never on a no-op set.

use std::any::Any;
use std::fmt;

use crate::keymap::{KeyCode, MouseEvent, MouseKind};
use crate::types::{ParamError, Point, Roi};

/// The kind of a parameter, fixed by its `build*` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    /// On/off toggle.
    Bool,
    /// Bounded integer.
    Int,
    /// Bounded float.
    Float,
    /// Index into an enum's variants or a list of candidates.
    Choice,
    /// Display-only text updated by the stage body.
    ReadOnly,
    /// Points collected by mouse clicks.
    Points,
    /// Rectangle drawn by a mouse drag.
    Roi,
    /// Last raw keycode pressed while selected.
    Keycode,
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Choice => "choice",
            Self::ReadOnly => "read-only",
            Self::Points => "points",
            Self::Roi => "roi",
            Self::Keycode => "keycode",
        })
    }
}

/// The raw value held by a parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// [`ParamKind::Bool`] value.
    Bool(bool),
    /// [`ParamKind::Int`] value.
    Int(i64),
    /// [`ParamKind::Float`] value.
    Float(f64),
    /// [`ParamKind::Choice`] value: an index into the candidates.
    Index(usize),
    /// [`ParamKind::ReadOnly`] value.
    Text(String),
    /// [`ParamKind::Points`] value.
    Points(Vec<Point>),
    /// [`ParamKind::Roi`] value; `None` until a non-empty drag completes.
    Roi(Option<Roi>),
    /// [`ParamKind::Keycode`] value; `None` until a key is recorded.
    Key(Option<KeyCode>),
}

impl Value {
    /// The boolean, if this is a [`Value::Bool`].
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// The integer, if this is a [`Value::Int`].
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// The float, if this is a [`Value::Float`].
    #[must_use]
    pub const fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// The candidate index, if this is a [`Value::Index`].
    #[must_use]
    pub const fn as_index(&self) -> Option<usize> {
        match self {
            Self::Index(v) => Some(*v),
            _ => None,
        }
    }

    const fn kind(&self) -> ParamKind {
        match self {
            Self::Bool(_) => ParamKind::Bool,
            Self::Int(_) => ParamKind::Int,
            Self::Float(_) => ParamKind::Float,
            Self::Index(_) => ParamKind::Choice,
            Self::Text(_) => ParamKind::ReadOnly,
            Self::Points(_) => ParamKind::Points,
            Self::Roi(_) => ParamKind::Roi,
            Self::Key(_) => ParamKind::Keycode,
        }
    }
}

/// An enum whose variants can back a [`ParamKind::Choice`] parameter.
///
/// Labels must be unique across `ALL`.
pub trait ParamEnum: Copy + PartialEq + 'static {
    /// Every variant, in stepping order.
    const ALL: &'static [Self];

    /// Display label of a variant.
    fn label(self) -> &'static str;
}

/// Immutable configuration of a built parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamConfig {
    /// On/off toggle; both step directions flip it.
    Bool,
    /// Integer in `[min, max]` stepped by `step`.
    Int {
        /// Lower bound.
        min: i64,
        /// Upper bound.
        max: i64,
        /// Step size (> 0).
        step: i64,
    },
    /// Float in `[min, max]` stepped by `step`.
    Float {
        /// Lower bound.
        min: f64,
        /// Upper bound.
        max: f64,
        /// Step size (> 0).
        step: f64,
    },
    /// Index into a snapshot of candidate labels.
    Choice {
        /// Candidate labels (non-empty).
        candidates: Vec<String>,
    },
    /// Display-only text.
    ReadOnly,
    /// Click-collected points, keeping at most `limit` when set.
    Points {
        /// Maximum number of points kept.
        limit: Option<usize>,
    },
    /// Drag-drawn rectangle.
    Roi,
    /// Last raw keycode.
    Keycode,
}

impl ParamConfig {
    /// The kind this configuration belongs to.
    #[must_use]
    pub const fn kind(&self) -> ParamKind {
        match self {
            Self::Bool => ParamKind::Bool,
            Self::Int { .. } => ParamKind::Int,
            Self::Float { .. } => ParamKind::Float,
            Self::Choice { .. } => ParamKind::Choice,
            Self::ReadOnly => ParamKind::ReadOnly,
            Self::Points { .. } => ParamKind::Points,
            Self::Roi => ParamKind::Roi,
            Self::Keycode => ParamKind::Keycode,
        }
    }

    /// Inclusive `(min, max)` bounds, for kinds that have them.
    #[must_use]
    pub fn bounds(&self) -> Option<(Value, Value)> {
        match self {
            Self::Int { min, max, .. } => Some((Value::Int(*min), Value::Int(*max))),
            Self::Float { min, max, .. } => Some((Value::Float(*min), Value::Float(*max))),
            Self::Choice { candidates } => Some((
                Value::Index(0),
                Value::Index(candidates.len().saturating_sub(1)),
            )),
            Self::Bool | Self::ReadOnly | Self::Points { .. } | Self::Roi | Self::Keycode => None,
        }
    }

    fn clamp(&self, value: Value) -> Value {
        match (self, value) {
            (Self::Int { min, max, .. }, Value::Int(v)) => Value::Int(v.clamp(*min, *max)),
            (Self::Float { min, max, .. }, Value::Float(v)) => {
                let v = if v.is_nan() { *min } else { v };
                Value::Float(v.clamp(*min, *max))
            }
            (Self::Choice { candidates }, Value::Index(i)) => {
                Value::Index(i.min(candidates.len().saturating_sub(1)))
            }
            (Self::Points { limit: Some(limit) }, Value::Points(mut points)) => {
                let excess = points.len().saturating_sub(*limit);
                points.drain(..excess);
                Value::Points(points)
            }
            (_, value) => value,
        }
    }

    /// The value one step below `value`, before clamping.
    fn step_down(&self, value: &Value) -> Option<Value> {
        match (self, value) {
            (Self::Bool, Value::Bool(v)) => Some(Value::Bool(!v)),
            (Self::Int { step, .. }, Value::Int(v)) => Some(Value::Int(v.saturating_sub(*step))),
            (Self::Float { step, .. }, Value::Float(v)) => Some(Value::Float(v - step)),
            (Self::Choice { .. }, Value::Index(i)) => Some(Value::Index(i.saturating_sub(1))),
            _ => None,
        }
    }

    /// The value one step above `value`, before clamping.
    fn step_up(&self, value: &Value) -> Option<Value> {
        match (self, value) {
            (Self::Bool, Value::Bool(v)) => Some(Value::Bool(!v)),
            (Self::Int { step, .. }, Value::Int(v)) => Some(Value::Int(v.saturating_add(*step))),
            (Self::Float { step, .. }, Value::Float(v)) => Some(Value::Float(v + step)),
            (Self::Choice { .. }, Value::Index(i)) => Some(Value::Index(i.saturating_add(1))),
            _ => None,
        }
    }

    fn format(&self, value: &Value) -> String {
        match (self, value) {
            (_, Value::Bool(v)) => (if *v { "on" } else { "off" }).to_string(),
            (_, Value::Int(v)) => v.to_string(),
            (Self::Float { step, .. }, Value::Float(v)) => {
                format!("{v:.prec$}", prec = decimals(*step))
            }
            (_, Value::Float(v)) => v.to_string(),
            (Self::Choice { candidates }, Value::Index(i)) => {
                candidates.get(*i).cloned().unwrap_or_default()
            }
            (_, Value::Index(i)) => format!("#{i}"),
            (_, Value::Text(text)) => text.clone(),
            (_, Value::Points(points)) => format!("{} pts", points.len()),
            (_, Value::Roi(roi)) => roi.map_or_else(|| "none".to_string(), |r| r.to_string()),
            (_, Value::Key(key)) => key.map_or_else(|| "none".to_string(), |k| k.to_string()),
        }
    }

    fn validate(&self, name: &str) -> Result<(), ParamError> {
        let invalid = |reason: String| ParamError::InvalidSpec {
            name: name.to_string(),
            reason,
        };
        match self {
            Self::Int { min, max, step } => {
                if min > max {
                    return Err(invalid(format!("min {min} exceeds max {max}")));
                }
                if *step <= 0 {
                    return Err(invalid(format!("step {step} must be positive")));
                }
            }
            Self::Float { min, max, step } => {
                if !(min.is_finite() && max.is_finite() && step.is_finite()) {
                    return Err(invalid("bounds and step must be finite".to_string()));
                }
                if min > max {
                    return Err(invalid(format!("min {min} exceeds max {max}")));
                }
                if *step <= 0.0 {
                    return Err(invalid(format!("step {step} must be positive")));
                }
            }
            Self::Choice { candidates } => {
                if candidates.is_empty() {
                    return Err(invalid("no candidates".to_string()));
                }
            }
            Self::Points { limit: Some(0) } => {
                return Err(invalid("point limit must be at least 1".to_string()));
            }
            Self::Bool | Self::ReadOnly | Self::Points { .. } | Self::Roi | Self::Keycode => {}
        }
        Ok(())
    }
}

/// Number of decimals needed to show values stepped by `step`: the
/// fractional digits of its shortest decimal form, at most six.
fn decimals(step: f64) -> usize {
    step.to_string()
        .split_once('.')
        .map_or(0, |(_, fraction)| fraction.len().min(6))
}

type Cacher = Box<dyn Fn(Option<&Value>, &Value) -> Box<dyn Any>>;
type Formatter = Box<dyn Fn(&Value) -> String>;

/// Initial value of a spec, resolved against the configuration at build.
enum Initial {
    Value(Value),
    Label(String),
}

/// Everything one `build*` call configures.
///
/// Constructed with one of the kind constructors, optionally extended
/// with [`cached`](Self::cached) and [`formatted`](Self::formatted), and
/// handed to [`Parameter::build`].
#[must_use = "a spec does nothing until passed to Parameter::build"]
pub struct ParamSpec {
    config: ParamConfig,
    initial: Initial,
    cacher: Option<Cacher>,
    formatter: Option<Formatter>,
}

impl ParamSpec {
    fn new(config: ParamConfig, initial: Initial) -> Self {
        Self {
            config,
            initial,
            cacher: None,
            formatter: None,
        }
    }

    /// On/off toggle.
    pub fn bool(value: bool) -> Self {
        Self::new(ParamConfig::Bool, Initial::Value(Value::Bool(value)))
    }

    /// Integer in `[min, max]` stepped by `step`.
    pub fn int(value: i64, min: i64, max: i64, step: i64) -> Self {
        Self::new(
            ParamConfig::Int { min, max, step },
            Initial::Value(Value::Int(value)),
        )
    }

    /// Non-negative integer with a lower bound and no practical upper one.
    pub fn uint(value: i64, min: i64) -> Self {
        Self::int(value, min.max(0), i64::MAX, 1)
    }

    /// Float in `[min, max]` stepped by `step`.
    pub fn float(value: f64, min: f64, max: f64, step: f64) -> Self {
        Self::new(
            ParamConfig::Float { min, max, step },
            Initial::Value(Value::Float(value)),
        )
    }

    /// Choice among the variants of `T`, starting at `value`.
    pub fn enumeration<T: ParamEnum>(value: T) -> Self {
        let candidates = T::ALL.iter().map(|v| v.label().to_string()).collect();
        Self::new(
            ParamConfig::Choice { candidates },
            Initial::Label(value.label().to_string()),
        )
    }

    /// Choice among a snapshot of `candidates`, starting at `initial`.
    pub fn list<T: ToString>(candidates: &[T], initial: &T) -> Self {
        let candidates = candidates.iter().map(ToString::to_string).collect();
        Self::new(
            ParamConfig::Choice { candidates },
            Initial::Label(initial.to_string()),
        )
    }

    /// Display-only text.
    pub fn readonly(text: impl Into<String>) -> Self {
        Self::new(ParamConfig::ReadOnly, Initial::Value(Value::Text(text.into())))
    }

    /// Point picker keeping at most `limit` points when set.
    pub fn points(limit: Option<usize>) -> Self {
        Self::new(
            ParamConfig::Points { limit },
            Initial::Value(Value::Points(Vec::new())),
        )
    }

    /// Rectangle picker.
    pub fn roi() -> Self {
        Self::new(ParamConfig::Roi, Initial::Value(Value::Roi(None)))
    }

    /// Raw keycode recorder.
    pub fn keycode() -> Self {
        Self::new(ParamConfig::Keycode, Initial::Value(Value::Key(None)))
    }

    /// Derive a cached object from the value whenever it changes.
    ///
    /// `cacher` receives the previous raw value (`None` at build time)
    /// and the new one.
    pub fn cached<T: Any>(mut self, cacher: impl Fn(Option<&Value>, &Value) -> T + 'static) -> Self {
        self.cacher = Some(Box::new(
            move |old: Option<&Value>, new: &Value| -> Box<dyn Any> { Box::new(cacher(old, new)) },
        ));
        self
    }

    /// Replace the default value formatting used in help text.
    pub fn formatted(mut self, formatter: impl Fn(&Value) -> String + 'static) -> Self {
        self.formatter = Some(Box::new(formatter));
        self
    }

    /// The kind this spec builds.
    #[must_use]
    pub const fn kind(&self) -> ParamKind {
        self.config.kind()
    }
}

/// Frozen configuration. Only ever handed out by shared reference.
struct Frozen {
    config: ParamConfig,
    cacher: Option<Cacher>,
    formatter: Option<Formatter>,
}

/// Mutable state of a built parameter.
struct Cell {
    value: Value,
    cache: Option<Box<dyn Any>>,
    /// Fixed corner of an in-progress ROI drag.
    anchor: Option<(i32, i32)>,
}

/// A single tunable value owned by a stage.
pub struct Parameter {
    name: String,
    built: Option<(Frozen, Cell)>,
}

impl fmt::Debug for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parameter")
            .field("name", &self.name)
            .field("config", &self.config())
            .field("value", &self.built.as_ref().map(|(_, cell)| &cell.value))
            .finish_non_exhaustive()
    }
}

impl Parameter {
    /// Create an empty, unbuilt parameter.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            built: None,
        }
    }

    /// Parameter name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether a `build*` call has configured this parameter.
    #[must_use]
    pub const fn is_frozen(&self) -> bool {
        self.built.is_some()
    }

    /// The kind, once built.
    #[must_use]
    pub fn kind(&self) -> Option<ParamKind> {
        self.config().map(ParamConfig::kind)
    }

    /// The frozen configuration, once built.
    #[must_use]
    pub fn config(&self) -> Option<&ParamConfig> {
        self.built.as_ref().map(|(frozen, _)| &frozen.config)
    }

    /// Configure the parameter and freeze it.
    ///
    /// On an already-built parameter of the same kind this does nothing:
    /// value, bounds, and cache from the first build are kept.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError::AlreadyFrozen`] if the parameter was built
    /// with a different kind, and [`ParamError::InvalidSpec`] if the spec
    /// is inconsistent.
    pub fn build(&mut self, spec: ParamSpec) -> Result<&mut Self, ParamError> {
        if let Some((frozen, _)) = &self.built {
            let existing = frozen.config.kind();
            if existing == spec.kind() {
                return Ok(self);
            }
            return Err(ParamError::AlreadyFrozen {
                name: self.name.clone(),
                existing,
                requested: spec.kind(),
            });
        }

        let ParamSpec {
            config,
            initial,
            cacher,
            formatter,
        } = spec;
        config.validate(&self.name)?;

        let value = match initial {
            Initial::Value(value) => config.clamp(value),
            Initial::Label(label) => Value::Index(self.resolve_label(&config, &label)?),
        };
        let cache = cacher.as_ref().map(|cacher| cacher(None, &value));

        self.built = Some((
            Frozen {
                config,
                cacher,
                formatter,
            },
            Cell {
                value,
                cache,
                anchor: None,
            },
        ));
        Ok(self)
    }

    /// Build as an on/off toggle. See [`build`](Self::build).
    ///
    /// # Errors
    ///
    /// See [`build`](Self::build).
    pub fn build_bool(&mut self, value: bool) -> Result<&mut Self, ParamError> {
        self.build(ParamSpec::bool(value))
    }

    /// Build as an integer in `[min, max]`. See [`build`](Self::build).
    ///
    /// # Errors
    ///
    /// See [`build`](Self::build).
    pub fn build_int(
        &mut self,
        value: i64,
        min: i64,
        max: i64,
        step: i64,
    ) -> Result<&mut Self, ParamError> {
        self.build(ParamSpec::int(value, min, max, step))
    }

    /// Build as a non-negative integer `>= min`. See [`build`](Self::build).
    ///
    /// # Errors
    ///
    /// See [`build`](Self::build).
    pub fn build_uint(&mut self, value: i64, min: i64) -> Result<&mut Self, ParamError> {
        self.build(ParamSpec::uint(value, min))
    }

    /// Build as a float in `[min, max]`. See [`build`](Self::build).
    ///
    /// # Errors
    ///
    /// See [`build`](Self::build).
    pub fn build_float(
        &mut self,
        value: f64,
        min: f64,
        max: f64,
        step: f64,
    ) -> Result<&mut Self, ParamError> {
        self.build(ParamSpec::float(value, min, max, step))
    }

    /// Build as a choice among the variants of `T`. See [`build`](Self::build).
    ///
    /// # Errors
    ///
    /// See [`build`](Self::build).
    pub fn build_enum<T: ParamEnum>(&mut self, value: T) -> Result<&mut Self, ParamError> {
        self.build(ParamSpec::enumeration(value))
    }

    /// Build as a choice among `candidates`. See [`build`](Self::build).
    ///
    /// # Errors
    ///
    /// Returns [`ParamError::UnknownLabel`] if `initial` is not one of
    /// `candidates`; otherwise see [`build`](Self::build).
    pub fn build_list<T: ToString>(
        &mut self,
        candidates: &[T],
        initial: &T,
    ) -> Result<&mut Self, ParamError> {
        self.build(ParamSpec::list(candidates, initial))
    }

    /// Build as display-only text. See [`build`](Self::build).
    ///
    /// # Errors
    ///
    /// See [`build`](Self::build).
    pub fn build_readonly(&mut self, text: impl Into<String>) -> Result<&mut Self, ParamError> {
        self.build(ParamSpec::readonly(text))
    }

    /// Build as a click-driven point picker. See [`build`](Self::build).
    ///
    /// # Errors
    ///
    /// See [`build`](Self::build).
    pub fn build_points(&mut self, limit: Option<usize>) -> Result<&mut Self, ParamError> {
        self.build(ParamSpec::points(limit))
    }

    /// Build as a drag-driven rectangle picker. See [`build`](Self::build).
    ///
    /// # Errors
    ///
    /// See [`build`](Self::build).
    pub fn build_roi(&mut self) -> Result<&mut Self, ParamError> {
        self.build(ParamSpec::roi())
    }

    /// Build as a raw keycode recorder. See [`build`](Self::build).
    ///
    /// # Errors
    ///
    /// See [`build`](Self::build).
    pub fn build_keycode(&mut self) -> Result<&mut Self, ParamError> {
        self.build(ParamSpec::keycode())
    }

    /// The raw value.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError::NotReady`] before the parameter is built.
    pub fn value(&self) -> Result<&Value, ParamError> {
        Ok(&self.ready()?.1.value)
    }

    /// The bounds of the built configuration, for kinds that have them.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError::NotReady`] before the parameter is built.
    pub fn bounds(&self) -> Result<Option<(Value, Value)>, ParamError> {
        Ok(self.ready()?.0.config.bounds())
    }

    /// The toggle state.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError::NotReady`] or [`ParamError::TypeMismatch`].
    pub fn as_bool(&self) -> Result<bool, ParamError> {
        let value = self.expect_kind(ParamKind::Bool)?;
        Ok(value.as_bool().unwrap_or_default())
    }

    /// The integer value.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError::NotReady`] or [`ParamError::TypeMismatch`].
    pub fn as_int(&self) -> Result<i64, ParamError> {
        let value = self.expect_kind(ParamKind::Int)?;
        Ok(value.as_int().unwrap_or_default())
    }

    /// The float value.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError::NotReady`] or [`ParamError::TypeMismatch`].
    pub fn as_float(&self) -> Result<f64, ParamError> {
        let value = self.expect_kind(ParamKind::Float)?;
        Ok(value.as_float().unwrap_or_default())
    }

    /// The raw candidate index of a choice parameter.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError::NotReady`] or [`ParamError::TypeMismatch`].
    pub fn index(&self) -> Result<usize, ParamError> {
        let value = self.expect_kind(ParamKind::Choice)?;
        Ok(value.as_index().unwrap_or_default())
    }

    /// The label of the selected candidate.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError::NotReady`] or [`ParamError::TypeMismatch`].
    pub fn selected_label(&self) -> Result<&str, ParamError> {
        let index = self.index()?;
        match self.config() {
            Some(ParamConfig::Choice { candidates }) => {
                Ok(candidates.get(index).map_or("", String::as_str))
            }
            _ => Err(self.mismatch(ParamKind::Choice)),
        }
    }

    /// The selected variant of an enum-backed parameter.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError::UnknownLabel`] if the selected label is not
    /// a variant of `T` (the parameter was built from another type), or
    /// [`ParamError::NotReady`] / [`ParamError::TypeMismatch`].
    pub fn get_enum<T: ParamEnum>(&self) -> Result<T, ParamError> {
        let label = self.selected_label()?;
        T::ALL
            .iter()
            .copied()
            .find(|v| v.label() == label)
            .ok_or_else(|| ParamError::UnknownLabel {
                name: self.name.clone(),
                label: label.to_string(),
            })
    }

    /// The text of a read-only parameter.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError::NotReady`] or [`ParamError::TypeMismatch`].
    pub fn text(&self) -> Result<&str, ParamError> {
        match self.expect_kind(ParamKind::ReadOnly)? {
            Value::Text(text) => Ok(text),
            _ => Err(self.mismatch(ParamKind::ReadOnly)),
        }
    }

    /// The points collected so far.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError::NotReady`] or [`ParamError::TypeMismatch`].
    pub fn points(&self) -> Result<&[Point], ParamError> {
        match self.expect_kind(ParamKind::Points)? {
            Value::Points(points) => Ok(points),
            _ => Err(self.mismatch(ParamKind::Points)),
        }
    }

    /// The drawn rectangle, if a non-empty drag has completed.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError::NotReady`] or [`ParamError::TypeMismatch`].
    pub fn roi(&self) -> Result<Option<Roi>, ParamError> {
        match self.expect_kind(ParamKind::Roi)? {
            Value::Roi(roi) => Ok(*roi),
            _ => Err(self.mismatch(ParamKind::Roi)),
        }
    }

    /// The last recorded keycode.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError::NotReady`] or [`ParamError::TypeMismatch`].
    pub fn keycode(&self) -> Result<Option<KeyCode>, ParamError> {
        match self.expect_kind(ParamKind::Keycode)? {
            Value::Key(key) => Ok(*key),
            _ => Err(self.mismatch(ParamKind::Keycode)),
        }
    }

    /// The cached derived object, if a cacher of type `T` is installed.
    #[must_use]
    pub fn cache<T: Any>(&self) -> Option<&T> {
        self.built
            .as_ref()
            .and_then(|(_, cell)| cell.cache.as_ref())
            .and_then(|cache| cache.downcast_ref::<T>())
    }

    /// Human-readable value for help text.
    #[must_use]
    pub fn format(&self) -> String {
        match &self.built {
            None => "<unbuilt>".to_string(),
            Some((frozen, cell)) => frozen.formatter.as_ref().map_or_else(
                || frozen.config.format(&cell.value),
                |formatter| formatter(&cell.value),
            ),
        }
    }

    /// Step the value down, clamped. Bool parameters toggle.
    ///
    /// Returns whether the raw value changed. Kinds without stepping
    /// (read-only, pickers, keycode) are left alone.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError::NotReady`] before the parameter is built.
    pub fn decrease(&mut self) -> Result<bool, ParamError> {
        let (frozen, cell) = self.ready()?;
        match frozen.config.step_down(&cell.value) {
            Some(next) => self.assign(next),
            None => Ok(false),
        }
    }

    /// Step the value up, clamped. Bool parameters toggle.
    ///
    /// Returns whether the raw value changed.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError::NotReady`] before the parameter is built.
    pub fn increase(&mut self) -> Result<bool, ParamError> {
        let (frozen, cell) = self.ready()?;
        match frozen.config.step_up(&cell.value) {
            Some(next) => self.assign(next),
            None => Ok(false),
        }
    }

    /// Set a toggle. Returns whether the value changed.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError::NotReady`] or [`ParamError::TypeMismatch`].
    pub fn set_bool(&mut self, value: bool) -> Result<bool, ParamError> {
        self.assign(Value::Bool(value))
    }

    /// Set an integer, clamped to its bounds. Returns whether it changed.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError::NotReady`] or [`ParamError::TypeMismatch`].
    pub fn set_int(&mut self, value: i64) -> Result<bool, ParamError> {
        self.assign(Value::Int(value))
    }

    /// Set a float, clamped to its bounds. Returns whether it changed.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError::NotReady`] or [`ParamError::TypeMismatch`].
    pub fn set_float(&mut self, value: f64) -> Result<bool, ParamError> {
        self.assign(Value::Float(value))
    }

    /// Select a candidate by raw index, clamped. Returns whether it changed.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError::NotReady`] or [`ParamError::TypeMismatch`].
    pub fn set_index(&mut self, index: usize) -> Result<bool, ParamError> {
        self.assign(Value::Index(index))
    }

    /// Select a candidate by label. Returns whether the selection changed.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError::UnknownLabel`] if no candidate has this
    /// label, or [`ParamError::NotReady`] / [`ParamError::TypeMismatch`].
    pub fn set_label(&mut self, label: &str) -> Result<bool, ParamError> {
        let (frozen, _) = self.ready()?;
        let index = self.resolve_label(&frozen.config, label)?;
        self.assign(Value::Index(index))
    }

    /// Select an enum variant. Returns whether the selection changed.
    ///
    /// # Errors
    ///
    /// See [`set_label`](Self::set_label).
    pub fn set_enum<T: ParamEnum>(&mut self, value: T) -> Result<bool, ParamError> {
        self.set_label(value.label())
    }

    /// Replace the text of a read-only parameter.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError::NotReady`] or [`ParamError::TypeMismatch`].
    pub fn set_text(&mut self, text: impl Into<String>) -> Result<bool, ParamError> {
        self.assign(Value::Text(text.into()))
    }

    /// Forget all picked points.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError::NotReady`] or [`ParamError::TypeMismatch`].
    pub fn clear_points(&mut self) -> Result<bool, ParamError> {
        self.assign(Value::Points(Vec::new()))
    }

    /// Forget the drawn rectangle.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError::NotReady`] or [`ParamError::TypeMismatch`].
    pub fn clear_roi(&mut self) -> Result<bool, ParamError> {
        if let Some((_, cell)) = &mut self.built {
            cell.anchor = None;
        }
        self.assign(Value::Roi(None))
    }

    /// Deliver a key press. Returns whether the parameter consumed it.
    ///
    /// Only keycode recorders consume keys.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError::NotReady`] before the parameter is built.
    pub fn on_keydown(&mut self, code: KeyCode) -> Result<bool, ParamError> {
        let (frozen, _) = self.ready()?;
        if frozen.config.kind() != ParamKind::Keycode {
            return Ok(false);
        }
        self.assign(Value::Key(Some(code)))?;
        Ok(true)
    }

    /// Deliver a mouse event. Returns whether the parameter consumed it.
    ///
    /// Point pickers append on left click and pop on middle click. ROI
    /// pickers anchor on left press, follow the pointer while dragging,
    /// and finalize on release; a zero-sized drag leaves no rectangle.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError::NotReady`] before the parameter is built.
    pub fn on_mouse(&mut self, event: MouseEvent) -> Result<bool, ParamError> {
        let (frozen, cell) = self.ready()?;
        let here = (event.x, event.y);
        match (frozen.config.kind(), event.kind) {
            (ParamKind::Points, MouseKind::LeftDown) => {
                let mut points = match &cell.value {
                    Value::Points(points) => points.clone(),
                    _ => Vec::new(),
                };
                points.push(Point::new(f64::from(event.x), f64::from(event.y)));
                self.assign(Value::Points(points))?;
                Ok(true)
            }
            (ParamKind::Points, MouseKind::MiddleDown) => {
                let mut points = match &cell.value {
                    Value::Points(points) => points.clone(),
                    _ => Vec::new(),
                };
                points.pop();
                self.assign(Value::Points(points))?;
                Ok(true)
            }
            (ParamKind::Roi, MouseKind::LeftDown) => {
                self.set_anchor(Some(here));
                self.assign(Value::Roi(None))?;
                Ok(true)
            }
            (ParamKind::Roi, MouseKind::Move) => match cell.anchor {
                Some(anchor) => {
                    self.assign(Value::Roi(Roi::from_corners(anchor, here)))?;
                    Ok(true)
                }
                None => Ok(false),
            },
            (ParamKind::Roi, MouseKind::LeftUp) => match cell.anchor {
                Some(anchor) => {
                    self.set_anchor(None);
                    self.assign(Value::Roi(Roi::from_corners(anchor, here)))?;
                    Ok(true)
                }
                None => Ok(false),
            },
            _ => Ok(false),
        }
    }

    fn ready(&self) -> Result<(&Frozen, &Cell), ParamError> {
        self.built
            .as_ref()
            .map(|(frozen, cell)| (frozen, cell))
            .ok_or_else(|| ParamError::NotReady {
                name: self.name.clone(),
            })
    }

    fn expect_kind(&self, expected: ParamKind) -> Result<&Value, ParamError> {
        let (frozen, cell) = self.ready()?;
        if frozen.config.kind() == expected {
            Ok(&cell.value)
        } else {
            Err(self.mismatch(expected))
        }
    }

    fn mismatch(&self, expected: ParamKind) -> ParamError {
        ParamError::TypeMismatch {
            name: self.name.clone(),
            expected,
            actual: self.kind().unwrap_or(expected),
        }
    }

    fn resolve_label(&self, config: &ParamConfig, label: &str) -> Result<usize, ParamError> {
        let ParamConfig::Choice { candidates } = config else {
            return Err(self.mismatch(ParamKind::Choice));
        };
        candidates
            .iter()
            .position(|c| c == label)
            .ok_or_else(|| ParamError::UnknownLabel {
                name: self.name.clone(),
                label: label.to_string(),
            })
    }

    fn set_anchor(&mut self, anchor: Option<(i32, i32)>) {
        if let Some((_, cell)) = &mut self.built {
            cell.anchor = anchor;
        }
    }

    /// Clamp and store a new raw value, re-deriving the cache on change.
    fn assign(&mut self, value: Value) -> Result<bool, ParamError> {
        let expected = value.kind();
        let name = &self.name;
        let Some((frozen, cell)) = &mut self.built else {
            return Err(ParamError::NotReady { name: name.clone() });
        };
        if frozen.config.kind() != expected {
            return Err(ParamError::TypeMismatch {
                name: name.clone(),
                expected,
                actual: frozen.config.kind(),
            });
        }

        let value = frozen.config.clamp(value);
        if value == cell.value {
            return Ok(false);
        }
        let old = std::mem::replace(&mut cell.value, value);
        if let Some(cacher) = &frozen.cacher {
            cell.cache = Some(cacher(Some(&old), &cell.value));
        }
        Ok(true)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::cell::Cell as Counter;
    use std::rc::Rc;

    use super::*;
    use crate::keymap::MouseFlags;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Shape {
        Rect,
        Cross,
        Ellipse,
    }

    impl ParamEnum for Shape {
        const ALL: &'static [Self] = &[Self::Rect, Self::Cross, Self::Ellipse];

        fn label(self) -> &'static str {
            match self {
                Self::Rect => "rect",
                Self::Cross => "cross",
                Self::Ellipse => "ellipse",
            }
        }
    }

    fn mouse(kind: MouseKind, x: i32, y: i32) -> MouseEvent {
        MouseEvent::new(kind, x, y, MouseFlags::NONE)
    }

    // --- lifecycle ---

    #[test]
    fn unbuilt_parameter_is_not_ready() {
        let mut p = Parameter::new("k");
        assert!(!p.is_frozen());
        assert!(matches!(p.increase(), Err(ParamError::NotReady { .. })));
        assert!(matches!(p.set_int(3), Err(ParamError::NotReady { .. })));
        assert!(matches!(p.as_int(), Err(ParamError::NotReady { .. })));
        assert_eq!(p.format(), "<unbuilt>");
    }

    #[test]
    fn second_build_of_same_kind_is_a_no_op() {
        let mut p = Parameter::new("k");
        p.build_int(5, 0, 10, 1).unwrap();
        p.build_int(8, -5, 20, 2).unwrap();
        assert_eq!(p.as_int().unwrap(), 5);
        assert_eq!(
            p.bounds().unwrap(),
            Some((Value::Int(0), Value::Int(10)))
        );
        p.increase().unwrap();
        assert_eq!(p.as_int().unwrap(), 6, "step from the first build");
    }

    #[test]
    fn rebuild_keeps_tuned_value() {
        let mut p = Parameter::new("sigma");
        p.build_float(1.0, 0.0, 5.0, 0.5).unwrap();
        p.increase().unwrap();
        p.build_float(1.0, 0.0, 5.0, 0.5).unwrap();
        assert!((p.as_float().unwrap() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn rebuild_with_other_kind_is_rejected() {
        let mut p = Parameter::new("k");
        p.build_int(5, 0, 10, 1).unwrap();
        let err = p.build_bool(true).unwrap_err();
        assert_eq!(
            err,
            ParamError::AlreadyFrozen {
                name: "k".to_string(),
                existing: ParamKind::Int,
                requested: ParamKind::Bool,
            }
        );
    }

    #[test]
    fn invalid_specs_are_rejected() {
        assert!(matches!(
            Parameter::new("a").build_int(0, 5, 1, 1),
            Err(ParamError::InvalidSpec { .. })
        ));
        assert!(matches!(
            Parameter::new("b").build_int(0, 0, 1, 0),
            Err(ParamError::InvalidSpec { .. })
        ));
        assert!(matches!(
            Parameter::new("c").build_float(0.0, 0.0, f64::INFINITY, 0.1),
            Err(ParamError::InvalidSpec { .. })
        ));
        let empty: [&str; 0] = [];
        assert!(matches!(
            Parameter::new("d").build_list(&empty, &"x"),
            Err(ParamError::InvalidSpec { .. })
        ));
        assert!(matches!(
            Parameter::new("e").build_list(&["x", "y"], &"z"),
            Err(ParamError::UnknownLabel { .. })
        ));
        assert!(Parameter::new("f").build_points(Some(0)).is_err());
    }

    #[test]
    fn typed_access_checks_kind() {
        let mut p = Parameter::new("flag");
        p.build_bool(true).unwrap();
        assert!(p.as_bool().unwrap());
        assert!(matches!(
            p.as_float(),
            Err(ParamError::TypeMismatch {
                expected: ParamKind::Float,
                actual: ParamKind::Bool,
                ..
            })
        ));
        assert!(matches!(p.set_int(1), Err(ParamError::TypeMismatch { .. })));
    }

    // --- clamping ---

    #[test]
    fn initial_value_is_clamped() {
        let mut p = Parameter::new("k");
        p.build_int(50, 0, 10, 1).unwrap();
        assert_eq!(p.as_int().unwrap(), 10);
    }

    #[test]
    fn uint_decrease_saturates_at_min() {
        let mut p = Parameter::new("ksize");
        p.build_uint(5, 1).unwrap();
        let seen: Vec<i64> = (0..8)
            .map(|_| {
                p.decrease().unwrap();
                p.as_int().unwrap()
            })
            .collect();
        assert_eq!(seen, vec![4, 3, 2, 1, 1, 1, 1, 1]);
    }

    #[test]
    fn uint_increase_never_overflows() {
        let mut p = Parameter::new("n");
        p.build_uint(0, 0).unwrap();
        p.set_int(i64::MAX).unwrap();
        assert!(!p.increase().unwrap());
        assert_eq!(p.as_int().unwrap(), i64::MAX);
    }

    #[test]
    fn float_steps_stay_in_bounds() {
        let mut p = Parameter::new("alpha");
        p.build_float(0.5, 0.0, 1.0, 0.3).unwrap();
        for _ in 0..10 {
            p.increase().unwrap();
            let v = p.as_float().unwrap();
            assert!((0.0..=1.0).contains(&v));
        }
        assert!((p.as_float().unwrap() - 1.0).abs() < f64::EPSILON);
        for _ in 0..10 {
            p.decrease().unwrap();
            let v = p.as_float().unwrap();
            assert!((0.0..=1.0).contains(&v));
        }
        assert!(p.as_float().unwrap().abs() < f64::EPSILON);
    }

    #[test]
    fn direct_set_is_clamped() {
        let mut p = Parameter::new("t");
        p.build_int(5, 0, 255, 1).unwrap();
        p.set_int(-20).unwrap();
        assert_eq!(p.as_int().unwrap(), 0);
        p.set_int(999).unwrap();
        assert_eq!(p.as_int().unwrap(), 255);
    }

    #[test]
    fn bool_steps_toggle() {
        let mut p = Parameter::new("invert");
        p.build_bool(false).unwrap();
        assert!(p.increase().unwrap());
        assert!(p.as_bool().unwrap());
        assert!(p.decrease().unwrap());
        assert!(!p.as_bool().unwrap());
    }

    // --- indexed parameters ---

    #[test]
    fn enum_round_trip() {
        let mut p = Parameter::new("shape");
        p.build_enum(Shape::Cross).unwrap();
        assert_eq!(p.get_enum::<Shape>().unwrap(), Shape::Cross);
        assert_eq!(p.index().unwrap(), 1);
        for shape in Shape::ALL {
            p.set_enum(*shape).unwrap();
            assert_eq!(p.get_enum::<Shape>().unwrap(), *shape);
        }
    }

    #[test]
    fn enum_step_has_no_drift() {
        let mut p = Parameter::new("shape");
        p.build_enum(Shape::Cross).unwrap();
        p.increase().unwrap();
        assert_eq!(p.get_enum::<Shape>().unwrap(), Shape::Ellipse);
        p.decrease().unwrap();
        assert_eq!(p.get_enum::<Shape>().unwrap(), Shape::Cross);
    }

    #[test]
    fn enum_saturates_at_ends() {
        let mut p = Parameter::new("shape");
        p.build_enum(Shape::Rect).unwrap();
        assert!(!p.decrease().unwrap());
        assert_eq!(p.get_enum::<Shape>().unwrap(), Shape::Rect);
        p.set_enum(Shape::Ellipse).unwrap();
        assert!(!p.increase().unwrap());
        assert_eq!(
            p.bounds().unwrap(),
            Some((Value::Index(0), Value::Index(2)))
        );
    }

    #[test]
    fn list_uses_labels() {
        let mut p = Parameter::new("model");
        p.build_list(&["small", "medium", "large"], &"medium").unwrap();
        assert_eq!(p.selected_label().unwrap(), "medium");
        p.increase().unwrap();
        assert_eq!(p.selected_label().unwrap(), "large");
        assert!(matches!(
            p.set_label("huge"),
            Err(ParamError::UnknownLabel { .. })
        ));
        p.set_index(40).unwrap();
        assert_eq!(p.selected_label().unwrap(), "large");
        assert_eq!(p.format(), "large");
    }

    #[test]
    fn list_snapshot_ignores_later_candidates() {
        let mut p = Parameter::new("model");
        p.build_list(&["a", "b"], &"a").unwrap();
        p.build_list(&["x", "y", "z"], &"z").unwrap();
        assert_eq!(p.selected_label().unwrap(), "a");
        assert_eq!(
            p.config(),
            Some(&ParamConfig::Choice {
                candidates: vec!["a".to_string(), "b".to_string()]
            })
        );
    }

    // --- cache ---

    #[test]
    fn cacher_runs_once_per_distinct_change() {
        let calls = Rc::new(Counter::new(0_usize));
        let counter = Rc::clone(&calls);
        let mut p = Parameter::new("ksize");
        p.build(ParamSpec::int(3, 1, 9, 2).cached(move |_, new| {
            counter.set(counter.get() + 1);
            new.as_int().unwrap_or(0) * 10
        }))
        .unwrap();
        assert_eq!(calls.get(), 1, "initial derivation at build");
        assert_eq!(p.cache::<i64>(), Some(&30));

        assert!(!p.set_int(3).unwrap());
        assert_eq!(calls.get(), 1, "same value must not re-derive");

        p.increase().unwrap();
        assert_eq!(calls.get(), 2);
        assert_eq!(p.cache::<i64>(), Some(&50));

        p.set_int(9).unwrap();
        p.increase().unwrap(); // saturated at 9
        assert_eq!(calls.get(), 3);
        assert_eq!(p.cache::<i64>(), Some(&90));

        p.build_int(1, 1, 9, 2).unwrap();
        assert_eq!(calls.get(), 3, "no-op rebuild must not re-derive");
    }

    #[test]
    fn cacher_sees_old_and_new() {
        let mut p = Parameter::new("k");
        p.build(ParamSpec::int(1, 0, 10, 1).cached(|old, new| {
            (old.and_then(Value::as_int), new.as_int().unwrap_or(0))
        }))
        .unwrap();
        assert_eq!(p.cache::<(Option<i64>, i64)>(), Some(&(None, 1)));
        p.increase().unwrap();
        assert_eq!(p.cache::<(Option<i64>, i64)>(), Some(&(Some(1), 2)));
        assert_eq!(p.cache::<String>(), None, "wrong type downcasts to None");
    }

    // --- formatting ---

    #[test]
    fn default_formatting() {
        let mut f = Parameter::new("sigma");
        f.build_float(1.4, 0.0, 10.0, 0.1).unwrap();
        assert_eq!(f.format(), "1.4");
        let mut b = Parameter::new("on");
        b.build_bool(true).unwrap();
        assert_eq!(b.format(), "on");
        let mut r = Parameter::new("roi");
        r.build_roi().unwrap();
        assert_eq!(r.format(), "none");
    }

    #[test]
    fn float_precision_follows_step_digits() {
        let cases = [
            (0.75, 0.25, "0.75"),
            (0.35, 0.05, "0.35"),
            (2.5, 2.5, "2.5"),
            (3.0, 1.0, "3"),
            (0.5, 0.000_000_1, "0.500000"),
        ];
        for (value, step, shown) in cases {
            let mut p = Parameter::new("gain");
            p.build_float(value, 0.0, 10.0, step).unwrap();
            assert_eq!(p.format(), shown, "step {step}");
        }
    }

    #[test]
    fn stepped_float_shows_its_exact_value() {
        let mut p = Parameter::new("mix");
        p.build_float(0.5, 0.0, 1.0, 0.25).unwrap();
        p.increase().unwrap();
        assert_eq!(p.format(), "0.75");
    }

    #[test]
    fn custom_formatter() {
        let mut p = Parameter::new("t");
        p.build(
            ParamSpec::int(128, 0, 255, 1)
                .formatted(|v| format!("{}/255", v.as_int().unwrap_or(0))),
        )
        .unwrap();
        assert_eq!(p.format(), "128/255");
    }

    #[test]
    fn readonly_ignores_stepping() {
        let mut p = Parameter::new("count");
        p.build_readonly("0").unwrap();
        assert!(!p.increase().unwrap());
        p.set_text("12").unwrap();
        assert_eq!(p.text().unwrap(), "12");
    }

    // --- input hooks ---

    #[test]
    fn point_picker_appends_and_pops() {
        let mut p = Parameter::new("pts");
        p.build_points(None).unwrap();
        assert!(p.on_mouse(mouse(MouseKind::LeftDown, 1, 2)).unwrap());
        assert!(p.on_mouse(mouse(MouseKind::LeftDown, 3, 4)).unwrap());
        assert!(!p.on_mouse(mouse(MouseKind::Move, 9, 9)).unwrap());
        assert_eq!(p.points().unwrap(), &[Point::new(1.0, 2.0), Point::new(3.0, 4.0)]);
        assert!(p.on_mouse(mouse(MouseKind::MiddleDown, 0, 0)).unwrap());
        assert_eq!(p.points().unwrap(), &[Point::new(1.0, 2.0)]);
        assert_eq!(p.format(), "1 pts");
    }

    #[test]
    fn point_picker_limit_drops_oldest() {
        let mut p = Parameter::new("pts");
        p.build_points(Some(2)).unwrap();
        for x in 0..4 {
            p.on_mouse(mouse(MouseKind::LeftDown, x, 0)).unwrap();
        }
        assert_eq!(p.points().unwrap(), &[Point::new(2.0, 0.0), Point::new(3.0, 0.0)]);
    }

    #[test]
    fn roi_picker_tracks_drag() {
        let mut p = Parameter::new("roi");
        p.build_roi().unwrap();
        assert!(!p.on_mouse(mouse(MouseKind::Move, 5, 5)).unwrap());
        p.on_mouse(mouse(MouseKind::LeftDown, 10, 10)).unwrap();
        p.on_mouse(mouse(MouseKind::Move, 20, 15)).unwrap();
        assert_eq!(p.roi().unwrap(), Roi::new(10, 10, 10, 5));
        p.on_mouse(mouse(MouseKind::LeftUp, 30, 40)).unwrap();
        assert_eq!(p.roi().unwrap(), Roi::new(10, 10, 20, 30));
        assert!(!p.on_mouse(mouse(MouseKind::Move, 50, 50)).unwrap());
        assert_eq!(p.roi().unwrap(), Roi::new(10, 10, 20, 30));
    }

    #[test]
    fn roi_picker_zero_drag_resets() {
        let mut p = Parameter::new("roi");
        p.build_roi().unwrap();
        p.on_mouse(mouse(MouseKind::LeftDown, 0, 0)).unwrap();
        p.on_mouse(mouse(MouseKind::LeftUp, 8, 8)).unwrap();
        assert!(p.roi().unwrap().is_some());
        p.on_mouse(mouse(MouseKind::LeftDown, 4, 4)).unwrap();
        p.on_mouse(mouse(MouseKind::LeftUp, 4, 9)).unwrap();
        assert_eq!(p.roi().unwrap(), None);
    }

    #[test]
    fn keycode_recorder() {
        let mut p = Parameter::new("key");
        p.build_keycode().unwrap();
        assert_eq!(p.keycode().unwrap(), None);
        assert!(p.on_keydown(KeyCode::from_char('x')).unwrap());
        assert_eq!(p.keycode().unwrap(), Some(KeyCode::from_char('x')));
        assert_eq!(p.format(), "120 ('x')");

        let mut other = Parameter::new("k");
        other.build_int(0, 0, 1, 1).unwrap();
        assert!(!other.on_keydown(KeyCode::from_char('x')).unwrap());
    }
}
