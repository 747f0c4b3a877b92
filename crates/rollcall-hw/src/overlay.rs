//! Face box and label drawing on RGB frames.

use ab_glyph::{FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use rollcall_core::{BoundingBox, LabelPlacement, Overlay};
use std::path::Path;
use thiserror::Error;

const LABEL_FONT_SIZE: f32 = 16.0;
const BOX_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);
const BOX_THICKNESS: i32 = 2;

#[derive(Error, Debug)]
pub enum OverlayError {
    #[error("failed to read font {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid font file: {0}")]
    InvalidFont(String),
}

/// Draws a red face box and a filled red label with white text.
pub struct TextOverlay {
    font: FontVec,
    scale: PxScale,
}

impl TextOverlay {
    pub fn load(path: &Path) -> Result<Self, OverlayError> {
        let bytes = std::fs::read(path).map_err(|source| OverlayError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let font = FontVec::try_from_vec(bytes)
            .map_err(|e| OverlayError::InvalidFont(format!("{}: {e}", path.display())))?;
        tracing::info!(path = %path.display(), "overlay font loaded");
        Ok(Self {
            font,
            scale: PxScale::from(LABEL_FONT_SIZE),
        })
    }
}

/// Rect spanning two corners, or `None` if it has no area.
fn rect_between((x0, y0): (i32, i32), (x1, y1): (i32, i32)) -> Option<Rect> {
    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    Some(Rect::at(x0, y0).of_size((x1 - x0) as u32, (y1 - y0) as u32))
}

impl Overlay for TextOverlay {
    fn text_size(&self, text: &str) -> (u32, u32) {
        text_size(self.scale, &self.font, text)
    }

    fn draw(&self, image: &mut RgbImage, face: &BoundingBox, label: &str, placement: &LabelPlacement) {
        for inset in 0..BOX_THICKNESS {
            let corners = (
                (face.x + inset, face.y + inset),
                (face.right() - inset, face.bottom() - inset),
            );
            if let Some(rect) = rect_between(corners.0, corners.1) {
                draw_hollow_rect_mut(image, rect, BOX_COLOR);
            }
        }

        if let Some(rect) = rect_between(placement.top_left, placement.bottom_right) {
            draw_filled_rect_mut(image, rect, BOX_COLOR);
        }

        // imageproc positions text by its top-left corner, the placement by
        // its baseline.
        let (_, th) = self.text_size(label);
        let (tx, ty) = placement.origin;
        draw_text_mut(image, TEXT_COLOR, tx, ty - th as i32, self.scale, &self.font, label);
    }
}
