//! Intensity thresholding with an optional Otsu level.

use image::GrayImage;
use imageproc::contrast::ThresholdType;

use crate::param::ParamEnum;
use crate::stage::StageScope;
use crate::types::Frame;

/// How pixels relate to the threshold level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThresholdMode {
    /// Above the level becomes 255, the rest 0.
    #[default]
    Binary,
    /// Above the level becomes 0, the rest 255.
    BinaryInverted,
    /// Above the level is clamped to the level.
    Truncate,
    /// At or below the level becomes 0.
    ToZero,
    /// Above the level becomes 0.
    ToZeroInverted,
}

impl ThresholdMode {
    const fn to_imageproc(self) -> ThresholdType {
        match self {
            Self::Binary => ThresholdType::Binary,
            Self::BinaryInverted => ThresholdType::BinaryInverted,
            Self::Truncate => ThresholdType::Truncate,
            Self::ToZero => ThresholdType::ToZero,
            Self::ToZeroInverted => ThresholdType::ToZeroInverted,
        }
    }
}

impl ParamEnum for ThresholdMode {
    const ALL: &'static [Self] = &[
        Self::Binary,
        Self::BinaryInverted,
        Self::Truncate,
        Self::ToZero,
        Self::ToZeroInverted,
    ];

    fn label(self) -> &'static str {
        match self {
            Self::Binary => "binary",
            Self::BinaryInverted => "binary inverted",
            Self::Truncate => "truncate",
            Self::ToZero => "to zero",
            Self::ToZeroInverted => "to zero inverted",
        }
    }
}

/// Apply a threshold at `level`.
#[must_use = "returns the thresholded image"]
pub fn threshold(image: &GrayImage, level: u8, mode: ThresholdMode) -> GrayImage {
    imageproc::contrast::threshold(image, level, mode.to_imageproc())
}

/// Stage body: threshold at a tunable level, or at Otsu's level when
/// `otsu` is on.
///
/// # Errors
///
/// Fails only on parameter misuse.
pub fn stage(scope: &mut StageScope<'_>) -> anyhow::Result<()> {
    let mode = scope.choice("mode", ThresholdMode::default())?;
    let otsu = scope.bool("otsu", false)?;
    let level = scope.int("level", 128, 0, 255, 5)?;

    let gray = super::luma8(scope.input());
    let level = if otsu {
        imageproc::contrast::otsu_level(&gray)
    } else {
        u8::try_from(level)?
    };
    scope.show("applied level", level.to_string())?;
    scope.set_output(Frame::ImageLuma8(threshold(&gray, level, mode)));
    scope.set_data(scope.input_data().clone());
    Ok(())
}
