//! rollcall-hw: hardware and native-library backends.
//!
//! V4L2 camera capture via `v4l`, background clip decoding, Haar cascade
//! detection, LBPH classification and the display window via OpenCV, and
//! label drawing via `imageproc`/`ab_glyph`.

pub mod camera;
pub mod cascade;
pub mod frame;
pub mod lbph;
pub mod mat;
pub mod overlay;
pub mod video;
pub mod window;

pub use camera::{Camera, CameraError, DeviceInfo, PixelFormat};
pub use cascade::{CascadeDetector, CascadeParams};
pub use lbph::LbphResolver;
pub use overlay::{OverlayError, TextOverlay};
pub use video::{VideoError, VideoFile};
pub use window::{primary_display_size, Window};
