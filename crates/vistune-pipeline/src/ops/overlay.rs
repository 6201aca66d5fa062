//! Draw upstream payloads and user marks on top of the frame.
//!
//! Points become filled dots, regions hollow rectangles, and contours
//! closed polylines. The stage also carries its own point picker so the
//! user can drop marks with the mouse while the overlay is selected.

use image::{Rgba, RgbaImage};
use imageproc::drawing::{
    draw_cross_mut, draw_filled_circle_mut, draw_hollow_rect_mut, draw_line_segment_mut,
};
use imageproc::rect::Rect;

use crate::param::ParamEnum;
use crate::stage::StageScope;
use crate::types::{Frame, Payload, Point};

/// Drawing color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlayColor {
    /// Pure red.
    #[default]
    Red,
    /// Pure green.
    Green,
    /// Pure blue.
    Blue,
    /// Yellow.
    Yellow,
}

impl OverlayColor {
    /// RGBA value of the color.
    #[must_use]
    pub const fn rgba(self) -> Rgba<u8> {
        match self {
            Self::Red => Rgba([255, 0, 0, 255]),
            Self::Green => Rgba([0, 255, 0, 255]),
            Self::Blue => Rgba([0, 0, 255, 255]),
            Self::Yellow => Rgba([255, 255, 0, 255]),
        }
    }
}

impl ParamEnum for OverlayColor {
    const ALL: &'static [Self] = &[Self::Red, Self::Green, Self::Blue, Self::Yellow];

    fn label(self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Green => "green",
            Self::Blue => "blue",
            Self::Yellow => "yellow",
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn pixel(p: Point) -> (i32, i32) {
    (p.x.round() as i32, p.y.round() as i32)
}

#[allow(clippy::cast_possible_truncation)]
fn pixel_f32(p: Point) -> (f32, f32) {
    (p.x as f32, p.y as f32)
}

/// Draw a payload onto an RGBA canvas.
pub fn draw_payload(canvas: &mut RgbaImage, payload: &Payload, color: Rgba<u8>) {
    match payload {
        Payload::Points(points) => {
            for &p in points {
                draw_filled_circle_mut(canvas, pixel(p), 2, color);
            }
        }
        Payload::Regions(regions) => {
            for roi in regions {
                let (Ok(x), Ok(y)) = (i32::try_from(roi.x), i32::try_from(roi.y)) else {
                    continue;
                };
                draw_hollow_rect_mut(canvas, Rect::at(x, y).of_size(roi.width, roi.height), color);
            }
        }
        Payload::Contours(contours) => {
            for contour in contours {
                let points = contour.points();
                let closing = points.last().zip(points.first());
                for (&a, &b) in points.iter().zip(points.iter().skip(1)).chain(closing) {
                    draw_line_segment_mut(canvas, pixel_f32(a), pixel_f32(b), color);
                }
            }
        }
        Payload::Empty | Payload::Scalar(_) | Payload::Text(_) => {}
    }
}

/// Stage body: draw the input payload and the user's marks.
///
/// Passes the input payload through.
///
/// # Errors
///
/// Fails only on parameter misuse.
pub fn stage(scope: &mut StageScope<'_>) -> anyhow::Result<()> {
    let color = scope.choice("color", OverlayColor::default())?.rgba();
    let show_data = scope.bool("show data", true)?;
    let marks = scope.points("marks", None)?;

    let mut canvas = scope.input().to_rgba8();
    if show_data {
        draw_payload(&mut canvas, scope.input_data(), color);
    }
    for mark in marks {
        let (x, y) = pixel(mark);
        draw_cross_mut(&mut canvas, color, x, y);
    }
    scope.set_output(Frame::ImageRgba8(canvas));
    scope.set_data(scope.input_data().clone());
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::keymap::{MouseEvent, MouseFlags, MouseKind};
    use crate::stage::Stage;
    use crate::types::{Polyline, Roi};

    const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

    fn canvas() -> RgbaImage {
        RgbaImage::from_pixel(20, 20, BLACK)
    }

    #[test]
    fn regions_draw_outline_only() {
        let mut c = canvas();
        let red = OverlayColor::Red.rgba();
        draw_payload(&mut c, &Payload::Regions(vec![Roi::new(2, 2, 10, 10).unwrap()]), red);
        assert_eq!(*c.get_pixel(2, 2), red);
        assert_eq!(*c.get_pixel(11, 5), red);
        assert_eq!(*c.get_pixel(6, 6), BLACK);
    }

    #[test]
    fn contours_are_closed() {
        let mut c = canvas();
        let green = OverlayColor::Green.rgba();
        let triangle = Polyline::new(vec![
            Point::new(1.0, 1.0),
            Point::new(10.0, 1.0),
            Point::new(1.0, 10.0),
        ]);
        draw_payload(&mut c, &Payload::Contours(vec![triangle]), green);
        assert_eq!(*c.get_pixel(5, 1), green);
        assert_eq!(*c.get_pixel(1, 5), green, "closing segment drawn");
    }

    #[test]
    fn scalar_payload_draws_nothing() {
        let mut c = canvas();
        draw_payload(&mut c, &Payload::Scalar(3.0), OverlayColor::Blue.rgba());
        assert_eq!(c, canvas());
    }

    #[test]
    fn stage_draws_marks_from_mouse() {
        let mut stage = Stage::new("overlay", stage);
        let input = Frame::ImageRgba8(canvas());
        stage.run(&input, &Payload::Empty, None).unwrap();

        stage.next_cursor();
        stage.next_cursor();
        let click = MouseEvent::new(MouseKind::LeftDown, 10, 10, MouseFlags::LEFT);
        assert!(stage.on_mouse(click));
        stage.run(&input, &Payload::Empty, None).unwrap();

        let out = stage.frame().unwrap().to_rgba8();
        assert_eq!(*out.get_pixel(10, 10), OverlayColor::Red.rgba());
        assert_eq!(*out.get_pixel(0, 0), BLACK);
    }
}
