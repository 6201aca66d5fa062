//! Shared types for the vistune pipeline engine.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Re-export `DynamicImage` so downstream crates can hold frames
/// without depending on `image` directly.
pub use image::DynamicImage;

/// Re-export `GrayImage` for single-channel intermediates.
pub use image::GrayImage;

/// Re-export `RgbaImage` for color intermediates and overlays.
pub use image::RgbaImage;

/// A frame flowing through the pipeline.
///
/// Stages are free to change the pixel format: a grayscale stage may
/// receive RGBA and emit `Luma8`.
pub type Frame = DynamicImage;

/// A 2D point in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position (pixels from left edge).
    pub x: f64,
    /// Vertical position (pixels from top edge).
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another point.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.mul_add(dx, dy * dy)
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }
}

/// A sequence of connected points, e.g. one traced contour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline(Vec<Point>);

impl Polyline {
    /// Create a new polyline from a vector of points.
    #[must_use]
    pub const fn new(points: Vec<Point>) -> Self {
        Self(points)
    }

    /// Returns `true` if the polyline has no points.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of points in the polyline.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns a slice of all points.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.0
    }
}

/// An axis-aligned rectangular region of interest in pixel coordinates.
///
/// Always non-empty: constructors return `None` for zero-sized regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Roi {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width in pixels (> 0).
    pub width: u32,
    /// Height in pixels (> 0).
    pub height: u32,
}

impl Roi {
    /// Create a region, or `None` if either side is zero.
    #[must_use]
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Option<Self> {
        if width == 0 || height == 0 {
            None
        } else {
            Some(Self {
                x,
                y,
                width,
                height,
            })
        }
    }

    /// Build the region spanned by two opposite corners.
    ///
    /// Corners may be given in any order and may lie outside the image
    /// (negative coordinates are clipped to zero). Returns `None` when
    /// the clipped drag has zero width or height.
    #[must_use]
    pub fn from_corners(a: (i32, i32), b: (i32, i32)) -> Option<Self> {
        let clip = |v: i32| u32::try_from(v.max(0)).unwrap_or(0);
        let (x0, x1) = (clip(a.0.min(b.0)), clip(a.0.max(b.0)));
        let (y0, y1) = (clip(a.1.min(b.1)), clip(a.1.max(b.1)));
        Self::new(x0, y0, x1 - x0, y1 - y0)
    }

    /// Restrict the region to an image of the given size.
    ///
    /// Returns `None` if nothing of the region remains inside the image.
    #[must_use]
    pub fn clamp_to(self, width: u32, height: u32) -> Option<Self> {
        if self.x >= width || self.y >= height {
            return None;
        }
        let w = self.width.min(width - self.x);
        let h = self.height.min(height - self.y);
        Self::new(self.x, self.y, w, h)
    }

    /// Returns `true` if the pixel lies inside the region.
    #[must_use]
    pub const fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && y >= self.y && x - self.x < self.width && y - self.y < self.height
    }
}

impl fmt::Display for Roi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{} {}x{}", self.x, self.y, self.width, self.height)
    }
}

/// Auxiliary data a stage hands to the next stage alongside its frame.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum Payload {
    /// No data.
    #[default]
    Empty,
    /// Picked or detected points.
    Points(Vec<Point>),
    /// Rectangular regions (detections, crops).
    Regions(Vec<Roi>),
    /// Traced contours.
    Contours(Vec<Polyline>),
    /// A single measurement.
    Scalar(f64),
    /// Free-form text.
    Text(String),
}

impl Payload {
    /// Returns `true` for [`Payload::Empty`].
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Short one-line summary used in help text and reports.
    #[must_use]
    pub fn summary(&self) -> String {
        match self {
            Self::Empty => "empty".to_string(),
            Self::Points(points) => format!("{} points", points.len()),
            Self::Regions(regions) => format!("{} regions", regions.len()),
            Self::Contours(contours) => format!("{} contours", contours.len()),
            Self::Scalar(v) => format!("{v:.3}"),
            Self::Text(text) => text.clone(),
        }
    }
}

/// Programmer errors from using a parameter outside its build-then-use
/// lifecycle.
///
/// These are never caught by the pipeline: a body that propagates one
/// aborts the whole tick with [`PipelineError::Config`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParamError {
    /// The parameter was used before any `build*` call.
    #[error("parameter `{name}` is not ready: build it before use")]
    NotReady {
        /// Parameter name.
        name: String,
    },
    /// A `build*` of a different kind was attempted on a built parameter.
    #[error("parameter `{name}` is already built as {existing}, cannot rebuild as {requested}")]
    AlreadyFrozen {
        /// Parameter name.
        name: String,
        /// Kind the parameter was built with.
        existing: crate::param::ParamKind,
        /// Kind of the rejected build.
        requested: crate::param::ParamKind,
    },
    /// A typed accessor or setter was used on a parameter of another kind.
    #[error("parameter `{name}` is {actual}, not {expected}")]
    TypeMismatch {
        /// Parameter name.
        name: String,
        /// Kind the caller asked for.
        expected: crate::param::ParamKind,
        /// Kind the parameter was built with.
        actual: crate::param::ParamKind,
    },
    /// The builder arguments are inconsistent.
    #[error("invalid specification for parameter `{name}`: {reason}")]
    InvalidSpec {
        /// Parameter name.
        name: String,
        /// What is wrong.
        reason: String,
    },
    /// A label that is not among the snapshotted candidates.
    #[error("parameter `{name}` has no candidate `{label}`")]
    UnknownLabel {
        /// Parameter name.
        name: String,
        /// Rejected label.
        label: String,
    },
}

/// Terminal state of a stage that did not complete successfully.
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    /// The body returned normally without assigning an output frame.
    #[error("stage `{stage}` finished without producing an output frame")]
    InvalidFrame {
        /// Stage name.
        stage: String,
    },
    /// The stage was bypassed because an upstream stage failed.
    ///
    /// Only ever assigned by the pipeline, never raised by a body.
    #[error("skipped because an upstream stage failed")]
    Skipped,
    /// The body returned an error.
    #[error("{0:#}")]
    Failed(#[from] anyhow::Error),
}

impl StageError {
    /// Returns `true` for the [`StageError::Skipped`] sentinel.
    #[must_use]
    pub const fn is_skip(&self) -> bool {
        matches!(self, Self::Skipped)
    }

    /// The configuration error inside a body failure, if that is what it is.
    #[must_use]
    pub fn as_config(&self) -> Option<&ParamError> {
        match self {
            Self::Failed(e) => e.downcast_ref::<ParamError>(),
            Self::InvalidFrame { .. } | Self::Skipped => None,
        }
    }
}

/// Errors that abort a pipeline operation as a whole.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A stage with this name is already registered.
    #[error("a stage named `{name}` already exists")]
    DuplicateStage {
        /// Rejected name.
        name: String,
    },
    /// A stage body misused a parameter.
    #[error("configuration error in stage `{stage}`: {source}")]
    Config {
        /// Stage whose body raised the error.
        stage: String,
        /// The underlying parameter error.
        #[source]
        source: ParamError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    // --- Point tests ---

    #[test]
    fn point_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert!((a.distance(b) - 5.0).abs() < f64::EPSILON);
        assert!((a.distance_squared(b) - 25.0).abs() < f64::EPSILON);
    }

    // --- Roi tests ---

    #[test]
    fn roi_zero_sized_is_none() {
        assert_eq!(Roi::new(1, 1, 0, 5), None);
        assert_eq!(Roi::new(1, 1, 5, 0), None);
    }

    #[test]
    fn roi_from_corners_any_order() {
        let a = Roi::from_corners((10, 20), (4, 2));
        let b = Roi::from_corners((4, 2), (10, 20));
        assert_eq!(a, b);
        assert_eq!(a, Roi::new(4, 2, 6, 18));
    }

    #[test]
    fn roi_from_corners_clips_negative() {
        let roi = Roi::from_corners((-5, -5), (3, 4));
        assert_eq!(roi, Roi::new(0, 0, 3, 4));
        assert_eq!(Roi::from_corners((-5, 2), (-1, 9)), None);
    }

    #[test]
    fn roi_clamp_to_image() {
        let roi = Roi::new(8, 8, 10, 10).and_then(|r| r.clamp_to(12, 20));
        assert_eq!(roi, Roi::new(8, 8, 4, 10));
        let outside = Roi::new(30, 0, 2, 2).and_then(|r| r.clamp_to(12, 20));
        assert_eq!(outside, None);
    }

    #[test]
    fn roi_contains() {
        let Some(roi) = Roi::new(2, 2, 3, 3) else {
            return;
        };
        assert!(roi.contains(2, 2));
        assert!(roi.contains(4, 4));
        assert!(!roi.contains(5, 4));
        assert!(!roi.contains(1, 3));
    }

    #[test]
    fn roi_display() {
        let roi = Roi::new(1, 2, 30, 40);
        assert_eq!(roi.map(|r| r.to_string()).as_deref(), Some("1,2 30x40"));
    }

    // --- Payload tests ---

    #[test]
    fn payload_default_is_empty() {
        assert!(Payload::default().is_empty());
        assert_eq!(Payload::default().summary(), "empty");
    }

    #[test]
    fn payload_summary() {
        let points = Payload::Points(vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)]);
        assert_eq!(points.summary(), "2 points");
        assert_eq!(Payload::Scalar(0.5).summary(), "0.500");
    }

    // --- Error tests ---

    #[test]
    fn stage_error_skip_sentinel() {
        assert!(StageError::Skipped.is_skip());
        let failed = StageError::from(anyhow::anyhow!("boom"));
        assert!(!failed.is_skip());
        assert_eq!(failed.to_string(), "boom");
    }

    #[test]
    fn stage_error_recovers_config_error() {
        let param = ParamError::NotReady {
            name: "sigma".to_string(),
        };
        let failed = StageError::from(anyhow::Error::new(param.clone()));
        assert_eq!(failed.as_config(), Some(&param));
        assert_eq!(StageError::Skipped.as_config(), None);
    }

    #[test]
    fn invalid_frame_display() {
        let err = StageError::InvalidFrame {
            stage: "blur".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "stage `blur` finished without producing an output frame"
        );
    }
}
