//! Ready-made stage bodies for common image processing steps.
//!
//! Each submodule exposes the pure image operation (usable without a
//! pipeline) plus a `stage` function that can be pushed onto a
//! [`Manager`](crate::Manager) directly. Stage functions declare their
//! tunable parameters on every call; only the first call configures them.
//!
//! Operations that work on intensity accept any frame and convert to
//! 8-bit grayscale first.

pub mod blur;
pub mod contours;
pub mod crop;
pub mod edge;
pub mod grayscale;
pub mod morphology;
pub mod overlay;
pub mod resize;
pub mod threshold;

use image::GrayImage;

use crate::types::Frame;

/// Borrow a frame as 8-bit grayscale, converting only when needed.
pub(crate) fn luma8(frame: &Frame) -> std::borrow::Cow<'_, GrayImage> {
    match frame {
        Frame::ImageLuma8(gray) => std::borrow::Cow::Borrowed(gray),
        other => std::borrow::Cow::Owned(other.to_luma8()),
    }
}
