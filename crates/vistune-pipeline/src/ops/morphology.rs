//! Grayscale morphology with a cached disk structuring element.

use image::GrayImage;
use imageproc::morphology::Mask;

use crate::param::{ParamEnum, ParamSpec, Value};
use crate::stage::StageScope;
use crate::types::Frame;

/// Largest disk radius the stage allows.
pub const MAX_RADIUS: i64 = 20;

/// Which morphological operation to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MorphOp {
    /// Grow bright regions.
    Dilate,
    /// Shrink bright regions.
    Erode,
    /// Erode then dilate: removes small bright specks.
    #[default]
    Open,
    /// Dilate then erode: fills small dark holes.
    Close,
}

impl ParamEnum for MorphOp {
    const ALL: &'static [Self] = &[Self::Dilate, Self::Erode, Self::Open, Self::Close];

    fn label(self) -> &'static str {
        match self {
            Self::Dilate => "dilate",
            Self::Erode => "erode",
            Self::Open => "open",
            Self::Close => "close",
        }
    }
}

/// Disk-shaped structuring element of the given radius.
#[must_use]
pub fn disk(radius: u8) -> Mask {
    Mask::disk(radius)
}

/// Apply `op` with `mask`.
#[must_use = "returns the filtered image"]
pub fn apply(image: &GrayImage, op: MorphOp, mask: &Mask) -> GrayImage {
    match op {
        MorphOp::Dilate => imageproc::morphology::grayscale_dilate(image, mask),
        MorphOp::Erode => imageproc::morphology::grayscale_erode(image, mask),
        MorphOp::Open => imageproc::morphology::grayscale_open(image, mask),
        MorphOp::Close => imageproc::morphology::grayscale_close(image, mask),
    }
}

fn mask_for(_old: Option<&Value>, new: &Value) -> Mask {
    let radius = new.as_int().unwrap_or(0).clamp(0, i64::from(u8::MAX));
    disk(u8::try_from(radius).unwrap_or(u8::MAX))
}

/// Stage body: morphology with a tunable operation and disk radius.
///
/// # Errors
///
/// Fails only on parameter misuse.
pub fn stage(scope: &mut StageScope<'_>) -> anyhow::Result<()> {
    let input = scope.input();
    let op = scope.choice("op", MorphOp::default())?;
    let radius = scope.build(
        "radius",
        ParamSpec::int(1, 0, MAX_RADIUS, 1).cached(mask_for),
    )?;
    let gray = super::luma8(input);
    let out = match radius.cache::<Mask>() {
        Some(mask) => apply(&gray, op, mask),
        None => gray.into_owned(),
    };
    scope.set_output(Frame::ImageLuma8(out));
    scope.set_data(scope.input_data().clone());
    Ok(())
}
