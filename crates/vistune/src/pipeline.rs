//! Demo pipelines assembled from the bundled stage bodies.

use clap::ValueEnum;
use vistune_pipeline::{Manager, PipelineError, ops};

/// Which demo pipeline to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum PipelineKind {
    /// Threshold + morphology: outlines bright or dark regions.
    #[default]
    Regions,
    /// Canny edges: outlines intensity changes.
    Edges,
}

/// Build the chosen demo pipeline.
///
/// Both variants share the front (`resize`, `crop`, `gray`, `blur`) and
/// the back (`contours`, `overlay`); only the binarization differs.
///
/// # Errors
///
/// Returns [`PipelineError::DuplicateStage`] only if stage names collide,
/// which the fixed names here never do.
pub fn build(kind: PipelineKind) -> Result<Manager, PipelineError> {
    let front = Manager::new()
        .with_stage("resize", ops::resize::stage)?
        .with_stage("crop", ops::crop::stage)?
        .with_stage("gray", ops::grayscale::stage)?
        .with_stage("blur", ops::blur::stage)?;

    let middle = match kind {
        PipelineKind::Regions => front
            .with_stage("threshold", ops::threshold::stage)?
            .with_stage("morphology", ops::morphology::stage)?,
        PipelineKind::Edges => front.with_stage("edges", ops::edge::stage)?,
    };

    middle
        .with_stage("contours", ops::contours::stage)?
        .with_stage("overlay", ops::overlay::stage)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use vistune_pipeline::{Frame, Payload};

    fn bright_square() -> Frame {
        let mut canvas = image::RgbImage::new(48, 48);
        for y in 12..36 {
            for x in 12..36 {
                canvas.put_pixel(x, y, image::Rgb([240, 240, 240]));
            }
        }
        Frame::ImageRgb8(canvas)
    }

    #[test]
    fn stage_order() {
        let names = |m: &Manager| {
            m.stages()
                .iter()
                .map(|s| s.name().to_string())
                .collect::<Vec<_>>()
        };
        assert_eq!(
            names(&build(PipelineKind::Regions).unwrap()),
            ["resize", "crop", "gray", "blur", "threshold", "morphology", "contours", "overlay"]
        );
        assert_eq!(
            names(&build(PipelineKind::Edges).unwrap()),
            ["resize", "crop", "gray", "blur", "edges", "contours", "overlay"]
        );
    }

    #[test]
    fn every_variant_runs_clean() {
        let input = bright_square();
        for kind in [PipelineKind::Regions, PipelineKind::Edges] {
            let mut manager = build(kind).unwrap();
            let last = manager.len() - 1;
            let out = manager.run(&input, &Payload::Empty).unwrap();
            assert_eq!(out.source, Some(last));
            let diag = manager.diagnostics();
            assert!(diag.is_clean(), "{kind:?}:\n{}", diag.report());
        }
    }
}
