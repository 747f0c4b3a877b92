//! Haar cascade face detector via OpenCV.

use crate::mat;
use image::GrayImage;
use opencv::core::{Rect, Size, Vector};
use opencv::objdetect::CascadeClassifier;
use opencv::prelude::*;
use rollcall_core::{BoundingBox, DetectorError, FaceDetector};
use std::path::Path;

pub const DEFAULT_SCALE_FACTOR: f64 = 1.3;
pub const DEFAULT_MIN_NEIGHBORS: i32 = 5;

/// Multi-scale detection parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CascadeParams {
    pub scale_factor: f64,
    pub min_neighbors: i32,
}

impl Default for CascadeParams {
    fn default() -> Self {
        Self {
            scale_factor: DEFAULT_SCALE_FACTOR,
            min_neighbors: DEFAULT_MIN_NEIGHBORS,
        }
    }
}

pub struct CascadeDetector {
    classifier: CascadeClassifier,
    params: CascadeParams,
}

impl CascadeDetector {
    /// Load a cascade XML (e.g. `haarcascade_frontalface_default.xml`).
    pub fn load(path: &str, params: CascadeParams) -> Result<Self, DetectorError> {
        if !Path::new(path).exists() {
            return Err(DetectorError::CascadeNotFound(path.to_string()));
        }
        let classifier = CascadeClassifier::new(path)
            .map_err(|e| DetectorError::DetectionFailed(format!("loading {path}: {e}")))?;

        tracing::info!(
            path,
            scale_factor = params.scale_factor,
            min_neighbors = params.min_neighbors,
            "cascade loaded"
        );
        Ok(Self { classifier, params })
    }
}

impl FaceDetector for CascadeDetector {
    fn detect(&mut self, gray: &GrayImage) -> Result<Vec<BoundingBox>, DetectorError> {
        let input = mat::gray_to_mat(gray).map_err(|e| DetectorError::DetectionFailed(e.to_string()))?;
        let mut faces = Vector::<Rect>::new();
        self.classifier
            .detect_multi_scale(
                &input,
                &mut faces,
                self.params.scale_factor,
                self.params.min_neighbors,
                0,
                Size::new(0, 0),
                Size::new(0, 0),
            )
            .map_err(|e| DetectorError::DetectionFailed(e.to_string()))?;

        Ok(faces
            .iter()
            .map(|r| BoundingBox::new(r.x, r.y, r.width, r.height))
            .collect())
    }
}
