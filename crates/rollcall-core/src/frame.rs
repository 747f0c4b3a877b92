//! Frame type shared by both video sources, plus grayscale and crop helpers.

use crate::types::BoundingBox;
use image::{GrayImage, Luma, RgbImage};

// BT.601 luma in 14-bit fixed point, as OpenCV's RGB2GRAY computes it.
const LUMA_R: u32 = 4899;
const LUMA_G: u32 = 9617;
const LUMA_B: u32 = 1868;
const LUMA_SHIFT: u32 = 14;

/// A decoded RGB video frame.
#[derive(Clone)]
pub struct Frame {
    pub image: RgbImage,
    /// Monotonic per-source counter (or the driver sequence for cameras).
    pub sequence: u64,
}

impl Frame {
    pub fn new(image: RgbImage, sequence: u64) -> Self {
        Self { image, sequence }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// True for zero-size frames, which must never reach the compositor.
    pub fn is_empty(&self) -> bool {
        self.image.width() == 0 || self.image.height() == 0
    }

    pub fn to_grayscale(&self) -> GrayImage {
        GrayImage::from_fn(self.width(), self.height(), |x, y| {
            let [r, g, b] = self.image.get_pixel(x, y).0;
            let sum = LUMA_R * r as u32 + LUMA_G * g as u32 + LUMA_B * b as u32;
            Luma([((sum + (1 << (LUMA_SHIFT - 1))) >> LUMA_SHIFT) as u8])
        })
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("sequence", &self.sequence)
            .finish()
    }
}

/// Copy the face region out of a grayscale frame.
///
/// The box is clipped to the frame first; a crop with zero area returns
/// `None` and must not be handed to the classifier.
pub fn crop_face(gray: &GrayImage, face: &BoundingBox) -> Option<GrayImage> {
    let clipped = face.clip_to(gray.width(), gray.height())?;
    let view = image::imageops::crop_imm(
        gray,
        clipped.x as u32,
        clipped.y as u32,
        clipped.width as u32,
        clipped.height as u32,
    );
    Some(view.to_image())
}

/// Per-tick acquisition failure. Never fatal: the loop logs it and moves on.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("empty frame")]
    Empty,
    #[error("end of stream")]
    EndOfStream,
    #[error("capture failed: {0}")]
    Capture(String),
    #[error("decode failed: {0}")]
    Decode(String),
}

/// Anything that hands out one frame per tick.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Frame, FrameError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_empty_frame() {
        assert!(Frame::new(RgbImage::new(0, 10), 0).is_empty());
        assert!(Frame::new(RgbImage::new(10, 0), 0).is_empty());
        assert!(!Frame::new(RgbImage::new(1, 1), 0).is_empty());
    }

    #[test]
    fn test_grayscale_uses_bt601_weights() {
        let gray_of = |c: [u8; 3]| {
            Frame::new(RgbImage::from_pixel(1, 1, Rgb(c)), 0).to_grayscale().get_pixel(0, 0)[0]
        };
        assert_eq!(gray_of([255, 0, 0]), 76);
        assert_eq!(gray_of([0, 255, 0]), 150);
        assert_eq!(gray_of([0, 0, 255]), 29);
        assert_eq!(gray_of([255, 255, 255]), 255);
        assert_eq!(gray_of([0, 0, 0]), 0);
    }

    #[test]
    fn test_crop_face_copies_region() {
        let gray = GrayImage::from_fn(8, 8, |x, y| Luma([(y * 8 + x) as u8]));
        let crop = crop_face(&gray, &BoundingBox::new(2, 3, 2, 2)).unwrap();
        assert_eq!(crop.dimensions(), (2, 2));
        assert_eq!(crop.get_pixel(0, 0)[0], 26);
        assert_eq!(crop.get_pixel(1, 1)[0], 35);
    }

    #[test]
    fn test_crop_face_rejects_zero_area() {
        let gray = GrayImage::new(8, 8);
        assert!(crop_face(&gray, &BoundingBox::new(2, 2, 0, 4)).is_none());
        assert!(crop_face(&gray, &BoundingBox::new(9, 9, 4, 4)).is_none());
    }

    #[test]
    fn test_crop_face_clips_overhang() {
        let gray = GrayImage::new(8, 8);
        let crop = crop_face(&gray, &BoundingBox::new(6, 6, 4, 4)).unwrap();
        assert_eq!(crop.dimensions(), (2, 2));
    }
}
