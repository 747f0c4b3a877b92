//! Background clip decoding via OpenCV `VideoCapture`.

use crate::mat;
use opencv::core::Mat;
use opencv::prelude::*;
use opencv::videoio::{self, VideoCapture};
use rollcall_core::{ClipDecoder, Frame, FrameError};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VideoError {
    #[error("video file not found: {0}")]
    NotFound(String),
    #[error("could not open video {path}: {reason}")]
    OpenFailed { path: String, reason: String },
}

/// A video file decoded frame by frame. Wrap it in
/// [`rollcall_core::LoopingClip`] for endless playback.
pub struct VideoFile {
    capture: VideoCapture,
    path: String,
    sequence: u64,
}

impl VideoFile {
    pub fn open(path: &str) -> Result<Self, VideoError> {
        if !Path::new(path).exists() {
            return Err(VideoError::NotFound(path.to_string()));
        }

        let open_failed = |reason: String| VideoError::OpenFailed {
            path: path.to_string(),
            reason,
        };
        let capture =
            VideoCapture::from_file(path, videoio::CAP_ANY).map_err(|e| open_failed(e.to_string()))?;
        if !capture.is_opened().map_err(|e| open_failed(e.to_string()))? {
            return Err(open_failed("no decoder accepted the file".into()));
        }

        let frames = capture.get(videoio::CAP_PROP_FRAME_COUNT).unwrap_or(0.0);
        let fps = capture.get(videoio::CAP_PROP_FPS).unwrap_or(0.0);
        tracing::info!(path, frames, fps, "background clip opened");

        Ok(Self {
            capture,
            path: path.to_string(),
            sequence: 0,
        })
    }
}

impl ClipDecoder for VideoFile {
    fn read(&mut self) -> Result<Option<Frame>, FrameError> {
        let mut bgr = Mat::default();
        let ok = self
            .capture
            .read(&mut bgr)
            .map_err(|e| FrameError::Decode(e.to_string()))?;
        if !ok {
            return Ok(None);
        }

        let image = mat::bgr_mat_to_rgb(&bgr)
            .map_err(|e| FrameError::Decode(e.to_string()))?
            .ok_or(FrameError::Empty)?;
        self.sequence += 1;
        Ok(Some(Frame::new(image, self.sequence)))
    }

    fn rewind(&mut self) -> Result<(), FrameError> {
        let seeked = self
            .capture
            .set(videoio::CAP_PROP_POS_FRAMES, 0.0)
            .map_err(|e| FrameError::Decode(e.to_string()))?;
        if !seeked {
            return Err(FrameError::Decode(format!("{}: seek to start not supported", self.path)));
        }
        Ok(())
    }
}

impl Drop for VideoFile {
    fn drop(&mut self) {
        if let Err(e) = self.capture.release() {
            tracing::warn!(path = %self.path, error = %e, "failed to release background clip");
        } else {
            tracing::info!(path = %self.path, "background clip released");
        }
    }
}
