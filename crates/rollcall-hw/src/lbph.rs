//! LBPH face classifier via OpenCV's `face` module.
//!
//! The model is trained offline and loaded once. Prediction returns the
//! label and LBPH histogram distance, where lower means a closer match.

use crate::mat;
use image::GrayImage;
use opencv::core::Ptr;
use opencv::face::{FaceRecognizerTrait, FaceRecognizerTraitConst, LBPHFaceRecognizer};
use rollcall_core::{IdentityGuess, IdentityResolver, ResolverError};
use std::path::Path;

pub struct LbphResolver {
    model: Ptr<LBPHFaceRecognizer>,
}

impl LbphResolver {
    /// Load a trained LBPH model (e.g. `Trainer.yml`).
    pub fn load(path: &str) -> Result<Self, ResolverError> {
        if !Path::new(path).exists() {
            return Err(ResolverError::ModelNotFound(path.to_string()));
        }
        let mut model = LBPHFaceRecognizer::create_def()
            .map_err(|e| ResolverError::PredictionFailed(format!("creating LBPH: {e}")))?;
        FaceRecognizerTrait::read(&mut model, path)
            .map_err(|e| ResolverError::PredictionFailed(format!("reading {path}: {e}")))?;

        tracing::info!(path, "LBPH model loaded");
        Ok(Self { model })
    }
}

impl IdentityResolver for LbphResolver {
    fn predict(&mut self, face: &GrayImage) -> Result<IdentityGuess, ResolverError> {
        if face.width() == 0 || face.height() == 0 {
            return Err(ResolverError::EmptyCrop);
        }
        let input = mat::gray_to_mat(face).map_err(|e| ResolverError::PredictionFailed(e.to_string()))?;

        let mut index = -1;
        let mut confidence = f64::MAX;
        FaceRecognizerTraitConst::predict(&self.model, &input, &mut index, &mut confidence)
            .map_err(|e| ResolverError::PredictionFailed(e.to_string()))?;

        Ok(IdentityGuess { index, confidence })
    }
}
