//! Gaussian blur for noise reduction before edge detection.
//!
//! The stage caches the 1-D Gaussian kernel on its `sigma` parameter, so
//! the kernel is rebuilt only when the user actually changes sigma. The
//! kernel is applied separably with [`imageproc::filter::filter_clamped`].
//! [`gaussian_blur`] is the uncached one-shot variant.

use image::GrayImage;
use imageproc::kernel::Kernel;

use crate::param::{ParamSpec, Value};
use crate::stage::StageScope;
use crate::types::Frame;

/// Default sigma for [`stage`].
pub const DEFAULT_SIGMA: f64 = 1.4;

/// Largest sigma the stage allows.
pub const MAX_SIGMA: f64 = 10.0;

/// Normalized 1-D Gaussian weights covering `±ceil(3 sigma)`.
///
/// Non-positive sigma yields the identity kernel `[1.0]`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
pub fn gaussian_kernel(sigma: f32) -> Vec<f32> {
    if sigma <= 0.0 || !sigma.is_finite() {
        return vec![1.0];
    }
    let radius = (3.0 * sigma).ceil() as usize;
    let denom = 2.0 * sigma * sigma;
    let mut weights: Vec<f32> = (0..=2 * radius)
        .map(|i| {
            let x = i as f32 - radius as f32;
            (-(x * x) / denom).exp()
        })
        .collect();
    let sum: f32 = weights.iter().sum();
    for w in &mut weights {
        *w /= sum;
    }
    weights
}

/// Convolve with a 1-D kernel horizontally, then vertically.
#[must_use = "returns the blurred image"]
pub fn blur_with_kernel(image: &GrayImage, kernel: &[f32]) -> GrayImage {
    let Ok(len) = u32::try_from(kernel.len()) else {
        return image.clone();
    };
    if len <= 1 {
        return image.clone();
    }
    let horizontal: GrayImage =
        imageproc::filter::filter_clamped(image, Kernel::new(kernel, len, 1));
    imageproc::filter::filter_clamped(&horizontal, Kernel::new(kernel, 1, len))
}

/// Apply Gaussian blur to a grayscale image.
///
/// Non-positive sigma returns the image unchanged, since `imageproc`'s
/// underlying function panics on `sigma <= 0.0`.
#[must_use = "returns the blurred image"]
pub fn gaussian_blur(image: &GrayImage, sigma: f32) -> GrayImage {
    if sigma <= 0.0 {
        return image.clone();
    }
    imageproc::filter::gaussian_blur_f32(image, sigma)
}

#[allow(clippy::cast_possible_truncation)]
fn kernel_for(_old: Option<&Value>, new: &Value) -> Vec<f32> {
    gaussian_kernel(new.as_float().unwrap_or(0.0) as f32)
}

/// Stage body: cached-kernel Gaussian blur on the grayscale input.
///
/// # Errors
///
/// Fails only on parameter misuse.
pub fn stage(scope: &mut StageScope<'_>) -> anyhow::Result<()> {
    let input = scope.input();
    let sigma = scope.build(
        "sigma",
        ParamSpec::float(DEFAULT_SIGMA, 0.0, MAX_SIGMA, 0.2).cached(kernel_for),
    )?;
    let blurred = match sigma.cache::<Vec<f32>>() {
        Some(kernel) => blur_with_kernel(&super::luma8(input), kernel),
        None => super::luma8(input).into_owned(),
    };
    scope.set_output(Frame::ImageLuma8(blurred));
    scope.set_data(scope.input_data().clone());
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::stage::Stage;
    use crate::types::Payload;

    /// Create a test image with a sharp black-to-white boundary at x=5.
    fn sharp_edge_image() -> GrayImage {
        GrayImage::from_fn(10, 10, |x, _y| {
            if x < 5 {
                image::Luma([0])
            } else {
                image::Luma([255])
            }
        })
    }

    #[test]
    fn kernel_is_normalized_and_symmetric() {
        let k = gaussian_kernel(1.4);
        assert_eq!(k.len(), 11);
        let sum: f32 = k.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        assert!((k[0] - k[10]).abs() < 1e-7);
        assert!(k[5] > k[4]);
    }

    #[test]
    fn zero_sigma_kernel_is_identity() {
        assert_eq!(gaussian_kernel(0.0), vec![1.0]);
        assert_eq!(gaussian_kernel(-1.0), vec![1.0]);
        let img = sharp_edge_image();
        assert_eq!(blur_with_kernel(&img, &[1.0]), img);
    }

    #[test]
    fn zero_sigma_returns_identical_image() {
        let img = sharp_edge_image();
        assert_eq!(gaussian_blur(&img, 0.0), img);
    }

    #[test]
    fn blur_smooths_sharp_edge() {
        let img = sharp_edge_image();
        let blurred = blur_with_kernel(&img, &gaussian_kernel(2.0));
        let left_of_edge = blurred.get_pixel(4, 5).0[0];
        let right_of_edge = blurred.get_pixel(5, 5).0[0];
        assert!(left_of_edge > 0, "got {left_of_edge}");
        assert!(right_of_edge < 255, "got {right_of_edge}");
    }

    #[test]
    fn uniform_image_unchanged_by_blur() {
        let img = GrayImage::from_fn(10, 10, |_, _| image::Luma([128]));
        let blurred = blur_with_kernel(&img, &gaussian_kernel(1.4));
        for pixel in blurred.pixels() {
            let diff = i16::from(pixel.0[0]) - 128;
            assert!(diff.abs() <= 1, "got {}", pixel.0[0]);
        }
    }

    #[test]
    fn output_dimensions_preserved() {
        let img = GrayImage::new(17, 31);
        let blurred = blur_with_kernel(&img, &gaussian_kernel(1.4));
        assert_eq!((blurred.width(), blurred.height()), (17, 31));
    }

    #[test]
    fn stage_rebuilds_kernel_only_on_change() {
        let mut stage = Stage::new("blur", stage);
        let input = Frame::ImageLuma8(sharp_edge_image());
        stage.run(&input, &Payload::Empty, None).unwrap();
        let before = stage.param("sigma").unwrap().cache::<Vec<f32>>().unwrap().len();
        assert_eq!(before, 11);

        stage.decrease_at_cursor().unwrap();
        stage.run(&input, &Payload::Empty, None).unwrap();
        let after = stage.param("sigma").unwrap().cache::<Vec<f32>>().unwrap().len();
        assert_eq!(after, 9, "sigma 1.2 covers ±4");
    }
}
