//! rollcall-core: per-frame attendance pipeline.
//!
//! Holds everything that does not touch hardware: label layout, live-feed
//! compositing, the identity threshold policy, the looping clip wrapper,
//! the daily attendance log and the `Session` main loop. Capture, decode,
//! detection, classification, drawing and display are traits implemented
//! by `rollcall-hw`.

pub mod attendance;
pub mod clip;
pub mod compositor;
pub mod frame;
pub mod identity;
pub mod layout;
pub mod session;
pub mod types;

pub use attendance::{AttendanceError, AttendanceLog};
pub use clip::{ClipDecoder, LoopingClip};
pub use compositor::{CompositeError, Compositor};
pub use frame::{Frame, FrameError, FrameSource};
pub use identity::{IdentityResolver, IdentityTable, RecognitionPolicy, ResolverError, RosterError};
pub use layout::LabelPlacement;
pub use session::{
    Control, DetectorError, Devices, FaceDetector, Overlay, RunSummary, Screen, ScreenError,
    Session, SessionError, SessionSettings,
};
pub use types::{AttendanceRow, BoundingBox, Identity, IdentityGuess, RecognitionCache};
