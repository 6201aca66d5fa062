//! Image-sequence frame source.
//!
//! Frames are decoded lazily, one file per [`read_next`](FrameSource::read_next),
//! so long sequences never sit in memory at once.

use std::path::{Path, PathBuf};

use tracing::debug;
use vistune_pipeline::{Frame, FrameSource, SourceError};

/// File extensions picked up when a directory is given.
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "webp"];

/// A finite, seekable sequence of image files.
#[derive(Debug, Clone)]
pub struct ImageSequence {
    paths: Vec<PathBuf>,
    position: usize,
}

impl ImageSequence {
    /// Play the given files in order.
    #[must_use]
    pub const fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths, position: 0 }
    }

    /// Build a sequence from command-line arguments.
    ///
    /// A single directory expands to its image files sorted by name;
    /// anything else is taken as a list of files.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Io`] if the directory cannot be listed.
    pub fn from_args(args: &[PathBuf]) -> Result<Self, SourceError> {
        match args {
            [dir] if dir.is_dir() => Self::from_dir(dir),
            _ => Ok(Self::new(args.to_vec())),
        }
    }

    /// All image files in `dir`, sorted by file name.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Io`] if the directory cannot be listed.
    pub fn from_dir(dir: &Path) -> Result<Self, SourceError> {
        let io = |source| SourceError::Io {
            path: dir.to_path_buf(),
            source,
        };
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(io)? {
            let path = entry.map_err(io)?.path();
            if path.is_file() && is_image(&path) {
                paths.push(path);
            }
        }
        paths.sort();
        debug!(dir = %dir.display(), frames = paths.len(), "listed image directory");
        Ok(Self::new(paths))
    }

    /// The files in playback order.
    #[must_use]
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

impl FrameSource for ImageSequence {
    fn read_next(&mut self) -> Result<Option<Frame>, SourceError> {
        let Some(path) = self.paths.get(self.position) else {
            return Ok(None);
        };
        let frame = image::open(path).map_err(|source| match source {
            image::ImageError::IoError(source) => SourceError::Io {
                path: path.clone(),
                source,
            },
            source => SourceError::Decode {
                path: path.clone(),
                source,
            },
        })?;
        debug!(path = %path.display(), width = frame.width(), height = frame.height(), "decoded frame");
        self.position += 1;
        Ok(Some(frame))
    }

    fn seek(&mut self, index: usize) -> Result<(), SourceError> {
        if index > self.paths.len() {
            return Err(SourceError::SeekOutOfRange {
                index,
                len: self.paths.len(),
            });
        }
        self.position = index;
        Ok(())
    }

    fn position(&self) -> usize {
        self.position
    }

    fn len(&self) -> Option<usize> {
        Some(self.paths.len())
    }
}
