//! Downscaling to a working resolution.
//!
//! Reduces the frame so the longest axis is at most `max size` pixels,
//! so the expensive stages downstream operate on a smaller pixel grid.
//! Frames already at or below the target are passed through unchanged.

use std::fmt;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::param::ParamEnum;
use crate::stage::StageScope;

/// Resampling filter used when downsampling.
///
/// Ordered from fastest/lowest-quality to slowest/highest-quality,
/// with a `None` variant to skip downsampling entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ResizeFilter {
    /// Disabled: skip downsampling regardless of frame size.
    None,
    /// Nearest-neighbor: fastest, blocky artifacts.
    Nearest,
    /// Bilinear interpolation: fast, decent quality.
    #[default]
    Triangle,
    /// Bicubic (Catmull-Rom): moderate speed, good quality.
    CatmullRom,
    /// Gaussian: moderate speed, smooth output.
    Gaussian,
    /// Lanczos with 3 lobes: slowest, sharpest.
    Lanczos3,
}

impl ResizeFilter {
    /// Convert to the `image` crate's `FilterType`.
    ///
    /// Returns `Option::None` for [`ResizeFilter::None`] since there is
    /// no corresponding resampling filter.
    const fn to_image_filter(self) -> Option<image::imageops::FilterType> {
        match self {
            Self::None => Option::None,
            Self::Nearest => Some(image::imageops::FilterType::Nearest),
            Self::Triangle => Some(image::imageops::FilterType::Triangle),
            Self::CatmullRom => Some(image::imageops::FilterType::CatmullRom),
            Self::Gaussian => Some(image::imageops::FilterType::Gaussian),
            Self::Lanczos3 => Some(image::imageops::FilterType::Lanczos3),
        }
    }
}

impl ParamEnum for ResizeFilter {
    const ALL: &'static [Self] = &[
        Self::None,
        Self::Nearest,
        Self::Triangle,
        Self::CatmullRom,
        Self::Gaussian,
        Self::Lanczos3,
    ];

    fn label(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Nearest => "Nearest",
            Self::Triangle => "Triangle",
            Self::CatmullRom => "CatmullRom",
            Self::Gaussian => "Gaussian",
            Self::Lanczos3 => "Lanczos3",
        }
    }
}

impl fmt::Display for ResizeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Default longest-axis size for [`stage`].
pub const DEFAULT_MAX_SIZE: i64 = 512;

/// Downsample so the longest axis is at most `max_dimension` pixels.
///
/// Returns the (possibly unchanged) image and whether downsampling was
/// actually applied.
#[must_use]
pub fn downsample(
    image: &DynamicImage,
    max_dimension: u32,
    filter: ResizeFilter,
) -> (DynamicImage, bool) {
    let Some(image_filter) = filter.to_image_filter() else {
        return (image.clone(), false);
    };

    let long_axis = image.width().max(image.height());
    if long_axis <= max_dimension {
        return (image.clone(), false);
    }

    let resized = image.resize(max_dimension, max_dimension, image_filter);
    (resized, true)
}

/// Stage body: downsample with a tunable filter and target size.
///
/// # Errors
///
/// Fails only on parameter misuse.
pub fn stage(scope: &mut StageScope<'_>) -> anyhow::Result<()> {
    let filter = scope.choice("filter", ResizeFilter::default())?;
    let max_size = scope.int("max size", DEFAULT_MAX_SIZE, 16, 4096, 16)?;
    let max_size = u32::try_from(max_size)?;

    let (resized, applied) = downsample(scope.input(), max_size, filter);
    let note = if applied {
        format!("{}x{}", resized.width(), resized.height())
    } else {
        "unchanged".to_string()
    };
    scope.show("output", note)?;
    scope.set_output(resized);
    scope.set_data(scope.input_data().clone());
    Ok(())
}
