//! Headless frame sink.
//!
//! Stands in for a preview window: it remembers the latest preview and
//! help text, writes snapshots as PNG files, and can save the final
//! preview when the run ends.

use std::path::{Path, PathBuf};

use tracing::{debug, info};
use vistune_pipeline::{Frame, FrameSink, SinkError};

/// File name of the preview written by [`DirectorySink::finish`].
pub const FINAL_PREVIEW: &str = "final.png";

/// Keeps the latest preview in memory and writes images into a directory.
#[derive(Debug, Default)]
pub struct DirectorySink {
    dir: Option<PathBuf>,
    last: Option<Frame>,
    help: Option<String>,
    draws: u64,
    written: Vec<PathBuf>,
}

impl DirectorySink {
    /// Write snapshots into `dir`, or keep nothing on disk when `None`.
    #[must_use]
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self {
            dir,
            ..Self::default()
        }
    }

    /// The most recent preview.
    #[must_use]
    pub const fn last_frame(&self) -> Option<&Frame> {
        self.last.as_ref()
    }

    /// Help text drawn with the most recent preview.
    #[must_use]
    pub fn last_help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    /// Number of previews drawn.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.draws
    }

    /// Files written so far.
    #[must_use]
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    /// Save the latest preview as [`FINAL_PREVIEW`].
    ///
    /// Returns the written path, or `None` without an output directory
    /// or a drawn frame.
    ///
    /// # Errors
    ///
    /// Returns a [`SinkError`] if the file cannot be written.
    pub fn finish(&mut self) -> Result<Option<PathBuf>, SinkError> {
        let (Some(dir), Some(frame)) = (self.dir.clone(), self.last.take()) else {
            return Ok(None);
        };
        let path = self.save(&dir, &frame, FINAL_PREVIEW)?;
        self.last = Some(frame);
        Ok(Some(path))
    }

    fn save(&mut self, dir: &Path, frame: &Frame, file_name: &str) -> Result<PathBuf, SinkError> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(file_name);
        frame.save_with_format(&path, image::ImageFormat::Png)?;
        info!(path = %path.display(), "wrote image");
        self.written.push(path.clone());
        Ok(path)
    }
}

impl FrameSink for DirectorySink {
    fn draw(&mut self, frame: &Frame, help: Option<&str>) -> Result<(), SinkError> {
        self.draws += 1;
        self.last = Some(frame.clone());
        self.help = help.map(str::to_string);
        debug!(draws = self.draws, width = frame.width(), height = frame.height(), "preview");
        Ok(())
    }

    fn snapshot(&mut self, frame: &Frame, label: &str) -> Result<(), SinkError> {
        let Some(dir) = self.dir.clone() else {
            debug!(label, "snapshot requested without an output directory");
            return Ok(());
        };
        self.save(&dir, frame, &format!("{label}.png"))?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn draw_keeps_latest_preview_and_help() {
        let mut sink = DirectorySink::new(None);
        sink.draw(&Frame::new_luma8(2, 2), Some("first")).unwrap();
        sink.draw(&Frame::new_luma8(5, 3), None).unwrap();
        assert_eq!(sink.draws(), 2);
        assert_eq!(sink.last_frame().unwrap().width(), 5);
        assert!(sink.last_help().is_none());
    }

    #[test]
    fn snapshots_and_final_preview_are_written() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let mut sink = DirectorySink::new(Some(out.clone()));

        sink.snapshot(&Frame::new_rgb8(3, 3), "tick00001-blur").unwrap();
        sink.draw(&Frame::new_rgb8(4, 2), None).unwrap();
        let final_path = sink.finish().unwrap().unwrap();

        assert_eq!(final_path, out.join(FINAL_PREVIEW));
        assert_eq!(sink.written().len(), 2);
        assert_eq!(image::open(out.join("tick00001-blur.png")).unwrap().width(), 3);
        assert_eq!(image::open(final_path).unwrap().width(), 4);
    }

    #[test]
    fn without_directory_nothing_is_written() {
        let mut sink = DirectorySink::new(None);
        sink.draw(&Frame::new_luma8(1, 1), None).unwrap();
        sink.snapshot(&Frame::new_luma8(1, 1), "x").unwrap();
        assert!(sink.finish().unwrap().is_none());
        assert!(sink.written().is_empty());
    }
}
