//! Contour tracing on a binary map.
//!
//! Suzuki-Abe border following via [`imageproc::contours::find_contours`].
//! The stage passes its input frame through and publishes the traced
//! contours as its payload for downstream stages such as the overlay.

use image::GrayImage;

use crate::stage::StageScope;
use crate::types::{Payload, Point, Polyline};

/// Default minimum point count for [`stage`].
pub const DEFAULT_MIN_POINTS: i64 = 8;

/// Trace the borders of non-zero regions.
///
/// Contours shorter than `min_points` are dropped; at least two points
/// are always required.
#[must_use]
pub fn trace(binary: &GrayImage, min_points: usize) -> Vec<Polyline> {
    let contours: Vec<imageproc::contours::Contour<u32>> =
        imageproc::contours::find_contours(binary);

    contours
        .into_iter()
        .filter(|c| c.points.len() >= min_points.max(2))
        .map(|c| {
            let points = c
                .points
                .into_iter()
                .map(|p| Point::new(f64::from(p.x), f64::from(p.y)))
                .collect();
            Polyline::new(points)
        })
        .collect()
}

/// Stage body: trace contours and report how many survive the filter.
///
/// # Errors
///
/// Fails only on parameter misuse.
pub fn stage(scope: &mut StageScope<'_>) -> anyhow::Result<()> {
    let min_points = scope.uint("min points", DEFAULT_MIN_POINTS, 2)?;
    let min_points = usize::try_from(min_points)?;

    let contours = trace(&super::luma8(scope.input()), min_points);
    scope.show("count", contours.len().to_string())?;
    scope.forward_input();
    scope.set_data(Payload::Contours(contours));
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::stage::Stage;
    use crate::types::Frame;

    fn square(size: u32) -> GrayImage {
        let mut img = GrayImage::new(20, 20);
        for y in 5..5 + size {
            for x in 5..5 + size {
                img.put_pixel(x, y, image::Luma([255]));
            }
        }
        img
    }

    #[test]
    fn empty_image_produces_no_contours() {
        assert!(trace(&GrayImage::new(10, 10), 2).is_empty());
    }

    #[test]
    fn rectangle_produces_contours() {
        let result = trace(&square(10), 2);
        assert!(!result.is_empty());
        for polyline in &result {
            assert!(polyline.len() >= 2);
        }
    }

    #[test]
    fn min_points_filters_small_contours() {
        assert!(trace(&square(2), 100).is_empty());
    }

    #[test]
    fn stage_publishes_contours_and_forwards_frame() {
        let mut stage = Stage::new("contours", stage);
        let input = Frame::ImageLuma8(square(10));
        stage.run(&input, &Payload::Empty, None).unwrap();
        assert!(matches!(stage.data(), Payload::Contours(c) if !c.is_empty()));
        assert_eq!(stage.frame().unwrap(), &input);
        assert_ne!(stage.param("count").unwrap().text().unwrap(), "0");
    }
}
