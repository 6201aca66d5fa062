//! Grayscale conversion and intensity inversion.
//!
//! The standard luminance formula is used for RGB-to-gray conversion:
//! `0.299*R + 0.587*G + 0.114*B`.

use image::GrayImage;

use crate::stage::StageScope;
use crate::types::Frame;

/// Convert any frame to single-channel 8-bit grayscale.
#[must_use = "returns the grayscale image"]
pub fn to_gray(frame: &Frame) -> GrayImage {
    frame.to_luma8()
}

/// Invert a grayscale image (bitwise NOT).
///
/// On a binary map this swaps foreground (255) and background (0).
#[must_use = "returns the inverted image"]
pub fn invert(image: &GrayImage) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        image::Luma([!image.get_pixel(x, y).0[0]])
    })
}

/// Stage body: grayscale with an optional inversion toggle.
///
/// Passes the input payload through.
///
/// # Errors
///
/// Fails only on parameter misuse.
pub fn stage(scope: &mut StageScope<'_>) -> anyhow::Result<()> {
    let inverted = scope.bool("invert", false)?;
    let gray = to_gray(scope.input());
    let gray = if inverted { invert(&gray) } else { gray };
    scope.set_output(Frame::ImageLuma8(gray));
    scope.set_data(scope.input_data().clone());
    Ok(())
}
