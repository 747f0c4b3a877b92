//! OpenCV HighGUI display window, key polling and monitor size lookup.

use crate::mat;
use display_info::DisplayInfo;
use opencv::highgui;
use rollcall_core::{Frame, Screen, ScreenError};
use std::time::Duration;

/// A titled window. Destroyed on drop.
pub struct Window {
    title: String,
}

impl Window {
    pub fn open(title: &str) -> Result<Self, ScreenError> {
        highgui::named_window(title, highgui::WINDOW_AUTOSIZE)
            .map_err(|e| ScreenError::Display(format!("creating window {title:?}: {e}")))?;
        tracing::info!(title, "display window opened");
        Ok(Self {
            title: title.to_string(),
        })
    }
}

/// Resolution of the primary monitor, or `None` when no display can be queried.
pub fn primary_display_size() -> Option<(u32, u32)> {
    let displays = match DisplayInfo::all() {
        Ok(displays) => displays,
        Err(e) => {
            tracing::warn!(error = %e, "could not enumerate displays");
            return None;
        }
    };
    let size = pick_primary(displays.iter().map(|d| (d.is_primary, d.width, d.height)));
    if let Some((width, height)) = size {
        tracing::info!(width, height, "primary display detected");
    }
    size
}

/// The primary display's size, else the first one listed. Zero-sized
/// entries are ignored.
fn pick_primary(displays: impl Iterator<Item = (bool, u32, u32)>) -> Option<(u32, u32)> {
    let usable: Vec<_> = displays.filter(|&(_, w, h)| w > 0 && h > 0).collect();
    usable
        .iter()
        .find(|(primary, _, _)| *primary)
        .or_else(|| usable.first())
        .map(|&(_, w, h)| (w, h))
}

/// Map a HighGUI key code to a character. Negative means no key.
fn key_to_char(code: i32) -> Option<char> {
    if code < 0 {
        return None;
    }
    char::from_u32((code & 0xff) as u32)
}

impl Screen for Window {
    fn show(&mut self, frame: &Frame) -> Result<(), ScreenError> {
        let bgr = mat::rgb_to_bgr_mat(&frame.image).map_err(|e| ScreenError::Display(e.to_string()))?;
        highgui::imshow(&self.title, &bgr).map_err(|e| ScreenError::Display(e.to_string()))
    }

    fn poll_key(&mut self, wait: Duration) -> Result<Option<char>, ScreenError> {
        // wait_key(0) blocks forever, so never pass less than 1 ms.
        let ms = wait.as_millis().clamp(1, i32::MAX as u128) as i32;
        let code = highgui::wait_key(ms).map_err(|e| ScreenError::Display(e.to_string()))?;
        Ok(key_to_char(code))
    }
}

impl Drop for Window {
    fn drop(&mut self) {
        match highgui::destroy_window(&self.title) {
            Ok(()) => tracing::info!(title = %self.title, "display window destroyed"),
            Err(e) => tracing::warn!(title = %self.title, error = %e, "failed to destroy window"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_to_char() {
        assert_eq!(key_to_char(-1), None);
        assert_eq!(key_to_char('q' as i32), Some('q'));
        assert_eq!(key_to_char(0x100000 | 'o' as i32), Some('o'));
    }

    #[test]
    fn test_pick_primary_display() {
        let displays = [(false, 1280, 1024), (true, 1366, 768), (false, 3840, 2160)];
        assert_eq!(pick_primary(displays.into_iter()), Some((1366, 768)));
    }

    #[test]
    fn test_pick_first_display_without_primary() {
        let displays = [(false, 0, 0), (false, 1600, 900), (false, 1920, 1080)];
        assert_eq!(pick_primary(displays.into_iter()), Some((1600, 900)));
        assert_eq!(pick_primary(std::iter::empty()), None);
    }
}
