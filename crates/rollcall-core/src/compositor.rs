//! Picture-in-picture compositing of the live feed onto the background.

use crate::frame::Frame;
use image::imageops::{self, FilterType};
use thiserror::Error;

/// Size the live feed is scaled to before pasting.
pub const INSET_SIZE: (u32, u32) = (480, 360);
/// Paste position of the inset's top-left corner, as (column, row).
pub const INSET_OFFSET: (u32, u32) = (55, 162);
/// Fallback canvas size when no display resolution is configured.
pub const DEFAULT_DISPLAY_SIZE: (u32, u32) = (1920, 1080);

#[derive(Error, Debug)]
pub enum CompositeError {
    #[error("live frame is empty")]
    EmptyLive,
    #[error("background frame is empty")]
    EmptyBackground,
}

/// Fixed-geometry compositor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Compositor {
    /// (width, height) of the pasted live feed.
    pub inset_size: (u32, u32),
    /// (column, row) of the pasted live feed.
    pub offset: (u32, u32),
    /// (width, height) the background is scaled to.
    pub display_size: (u32, u32),
}

impl Default for Compositor {
    fn default() -> Self {
        Self {
            inset_size: INSET_SIZE,
            offset: INSET_OFFSET,
            display_size: DEFAULT_DISPLAY_SIZE,
        }
    }
}

impl Compositor {
    pub fn with_display_size(display_size: (u32, u32)) -> Self {
        Self {
            display_size,
            ..Self::default()
        }
    }

    /// Canvas dimensions: the display size, grown where needed so the inset
    /// always fits at its offset.
    pub fn canvas_size(&self) -> (u32, u32) {
        let need_w = self.offset.0 + self.inset_size.0;
        let need_h = self.offset.1 + self.inset_size.1;
        (self.display_size.0.max(need_w), self.display_size.1.max(need_h))
    }

    /// Scale `background` to the canvas, scale `live` to the inset size and
    /// overwrite the inset rectangle with it.
    pub fn composite(&self, live: &Frame, background: &Frame) -> Result<Frame, CompositeError> {
        if live.is_empty() {
            return Err(CompositeError::EmptyLive);
        }
        if background.is_empty() {
            return Err(CompositeError::EmptyBackground);
        }

        let (cw, ch) = self.canvas_size();
        let mut canvas = resize_to(&background.image, cw, ch);
        let inset = resize_to(&live.image, self.inset_size.0, self.inset_size.1);
        imageops::replace(&mut canvas, &inset, self.offset.0 as i64, self.offset.1 as i64);

        Ok(Frame::new(canvas, background.sequence))
    }
}

fn resize_to(image: &image::RgbImage, width: u32, height: u32) -> image::RgbImage {
    if image.dimensions() == (width, height) {
        return image.clone();
    }
    imageops::resize(image, width, height, FilterType::Triangle)
}
