//! Crop to a region of interest.
//!
//! The region is the stage's own drawn rectangle when one exists, and
//! otherwise the pipeline-wide ROI. With neither, the frame passes
//! through. The applied region is reported as the payload.

use crate::stage::StageScope;
use crate::types::{Frame, Payload, Roi};

/// Crop `frame` to `roi`, clipped to the frame bounds.
///
/// Returns `None` when the region lies entirely outside the frame.
#[must_use]
pub fn crop(frame: &Frame, roi: Roi) -> Option<(Frame, Roi)> {
    let roi = roi.clamp_to(frame.width(), frame.height())?;
    Some((frame.crop_imm(roi.x, roi.y, roi.width, roi.height), roi))
}

/// Stage body: crop to the drawn rectangle or the pipeline ROI.
///
/// # Errors
///
/// Fails when the region lies outside the frame, or on parameter
/// misuse.
pub fn stage(scope: &mut StageScope<'_>) -> anyhow::Result<()> {
    let drawn = scope.roi_picker("region")?;
    let Some(roi) = drawn.or(scope.roi()) else {
        scope.forward_input();
        return Ok(());
    };
    let input = scope.input();
    let (cropped, applied) = crop(input, roi).ok_or_else(|| {
        anyhow::anyhow!(
            "region {roi} lies outside the {}x{} frame",
            input.width(),
            input.height()
        )
    })?;
    scope.set_output(cropped);
    scope.set_data(Payload::Regions(vec![applied]));
    Ok(())
}
