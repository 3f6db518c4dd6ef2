//! Camera stand-in that replays image files as frames
//!
//! Lets a terminal session (or a test) drive the camera path: each image in
//! a directory, in file-name order, is handed out as one frame. The stream
//! ends after the last image.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::domain::result::{Error, Result};
use crate::domain::Frame;
use crate::ports::{CaptureStream, MediaCaptureSource};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Load one image file as an RGBA frame
pub fn load_frame(path: &Path) -> Result<Frame> {
    let rgba = image::open(path)
        .map_err(|e| Error::DecodeFailure(format!("{}: {}", path.display(), e)))?
        .to_rgba8();
    Ok(Frame::new(rgba.width(), rgba.height(), rgba.into_raw()))
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

#[derive(Debug, Clone)]
pub struct FrameDirectorySource {
    dir: PathBuf,
}

impl FrameDirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn frame_paths(&self) -> Result<Vec<PathBuf>> {
        let entries = std::fs::read_dir(&self.dir).map_err(|e| {
            Error::CaptureUnavailable(format!("{}: {}", self.dir.display(), e))
        })?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && is_image(path))
            .collect();
        paths.sort();
        Ok(paths)
    }
}

#[async_trait]
impl MediaCaptureSource for FrameDirectorySource {
    async fn start(&self) -> Result<Box<dyn CaptureStream>> {
        let paths = self.frame_paths()?;
        if paths.is_empty() {
            return Err(Error::CaptureUnavailable(format!(
                "no images in {}",
                self.dir.display()
            )));
        }
        Ok(Box::new(FrameFileStream {
            paths: paths.into_iter(),
            active: true,
        }))
    }
}

struct FrameFileStream {
    paths: std::vec::IntoIter<PathBuf>,
    active: bool,
}

impl CaptureStream for FrameFileStream {
    fn next_frame(&mut self) -> Option<Frame> {
        if !self.active {
            return None;
        }
        let Some(path) = self.paths.next() else {
            self.active = false;
            return None;
        };
        // An unreadable file is a dropped frame, not the end of the stream
        load_frame(&path).ok()
    }

    fn stop(&mut self) {
        self.active = false;
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::qr::fixtures::{png_bytes, qr_image};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_directory_is_capture_unavailable() {
        let source = FrameDirectorySource::new("/definitely/not/here");
        let err = source.start().await.err().unwrap();
        assert!(matches!(err, Error::CaptureUnavailable(_)));
    }

    #[tokio::test]
    async fn test_directory_without_images_is_capture_unavailable() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "hello").unwrap();

        let err = FrameDirectorySource::new(dir.path()).start().await.err().unwrap();
        assert!(matches!(err, Error::CaptureUnavailable(_)));
    }

    #[tokio::test]
    async fn test_frames_replay_in_name_order_then_end() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("b.png"), png_bytes(&qr_image("SECOND"))).unwrap();
        std::fs::write(dir.path().join("a.png"), png_bytes(&qr_image("FIRST"))).unwrap();
        std::fs::write(dir.path().join("c.png"), b"broken").unwrap();

        let mut stream = FrameDirectorySource::new(dir.path()).start().await.unwrap();

        let first = stream.next_frame().unwrap();
        assert_eq!(crate::services::qr::decode_frame(&first).as_deref(), Some("FIRST"));
        assert!(stream.next_frame().is_some());
        // Broken file is skipped as a dropped frame
        assert!(stream.next_frame().is_none());
        assert!(stream.is_active());
        assert!(stream.next_frame().is_none());
        assert!(!stream.is_active());
    }

    #[tokio::test]
    async fn test_stop_ends_stream() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.png"), png_bytes(&qr_image("X"))).unwrap();

        let mut stream = FrameDirectorySource::new(dir.path()).start().await.unwrap();
        stream.stop();
        stream.stop();
        assert!(!stream.is_active());
        assert!(stream.next_frame().is_none());
    }
}
