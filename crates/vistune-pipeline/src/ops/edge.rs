//! Canny edge detection.
//!
//! Wraps [`imageproc::edges::canny`]. Returns a binary image where white
//! pixels (255) are edges and black pixels (0) are background. The stage
//! reports the edge pixel count as its payload.

use image::GrayImage;

use crate::stage::StageScope;
use crate::types::{Frame, Payload};

/// Minimum allowed Canny threshold.
///
/// A low threshold of zero treats every pixel with any gradient as a
/// potential edge, producing an extremely dense edge map.
pub const MIN_THRESHOLD: f32 = 1.0;
const _: () = assert!(MIN_THRESHOLD > 0.0);

/// Default hysteresis thresholds for [`stage`].
pub const DEFAULT_LOW: f64 = 50.0;
/// See [`DEFAULT_LOW`].
pub const DEFAULT_HIGH: f64 = 150.0;

/// Detect edges using the Canny algorithm.
///
/// Both thresholds are clamped to a minimum of [`MIN_THRESHOLD`] and
/// `low_threshold` is clamped to be at most `high_threshold`.
#[must_use = "returns the binary edge map"]
pub fn canny(image: &GrayImage, low_threshold: f32, high_threshold: f32) -> GrayImage {
    let high = high_threshold.max(MIN_THRESHOLD);
    let low = low_threshold.max(MIN_THRESHOLD).min(high);
    imageproc::edges::canny(image, low, high)
}

/// Number of edge pixels (value 255) in a binary map.
#[must_use]
pub fn count_edge_pixels(image: &GrayImage) -> u64 {
    image.pixels().map(|p| u64::from(p.0[0] == 255)).sum()
}

/// Stage body: Canny with tunable low/high thresholds.
///
/// # Errors
///
/// Fails only on parameter misuse.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn stage(scope: &mut StageScope<'_>) -> anyhow::Result<()> {
    let low = scope.float("low", DEFAULT_LOW, 0.0, 1000.0, 5.0)?;
    let high = scope.float("high", DEFAULT_HIGH, 0.0, 1000.0, 5.0)?;

    let edges = canny(&super::luma8(scope.input()), low as f32, high as f32);
    let count = count_edge_pixels(&edges);
    scope.set_output(Frame::ImageLuma8(edges));
    scope.set_data(Payload::Scalar(count as f64));
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::stage::Stage;

    /// 20x20 image with a sharp vertical boundary at x = 10.
    fn sharp_edge_image() -> GrayImage {
        GrayImage::from_fn(20, 20, |x, _y| {
            if x < 10 {
                image::Luma([0])
            } else {
                image::Luma([255])
            }
        })
    }

    #[test]
    fn blank_image_produces_no_edges() {
        let img = GrayImage::from_fn(20, 20, |_, _| image::Luma([128]));
        let edges = canny(&img, 50.0, 150.0);
        assert_eq!(count_edge_pixels(&edges), 0);
    }

    #[test]
    fn sharp_edge_detected() {
        let edges = canny(&sharp_edge_image(), 50.0, 150.0);
        assert!(count_edge_pixels(&edges) > 0);
    }

    #[test]
    fn zero_low_threshold_is_clamped_to_min() {
        let img = sharp_edge_image();
        assert_eq!(canny(&img, 0.0, 150.0), canny(&img, MIN_THRESHOLD, 150.0));
    }

    #[test]
    fn inverted_thresholds_are_clamped() {
        let img = sharp_edge_image();
        assert_eq!(canny(&img, 200.0, 100.0), canny(&img, 100.0, 100.0));
    }

    #[test]
    fn stage_reports_edge_count() {
        let mut stage = Stage::new("edge", stage);
        let input = Frame::ImageLuma8(sharp_edge_image());
        stage.run(&input, &Payload::Empty, None).unwrap();
        assert!(matches!(stage.data(), Payload::Scalar(count) if *count > 0.0));
        assert_eq!(stage.params().count(), 2);
    }
}
