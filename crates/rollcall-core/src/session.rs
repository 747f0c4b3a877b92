//! The per-frame main loop.
//!
//! A `Session` is built once at startup from its capabilities and owns all
//! of them. `run` consumes it, so the camera, the clip decoder and the
//! display window are dropped, and therefore released, on every exit path:
//! quit key, propagated error or panic.

use crate::attendance::{AttendanceError, AttendanceLog};
use crate::compositor::Compositor;
use crate::frame::{crop_face, Frame, FrameSource};
use crate::identity::{IdentityResolver, IdentityTable, RecognitionPolicy};
use crate::layout::{place_label, LabelPlacement};
use crate::types::{AttendanceRow, BoundingBox, RecognitionCache};
use chrono::{Local, NaiveDateTime};
use image::{GrayImage, RgbImage};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Default wait for key input each tick. Also paces the loop.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Error, Debug)]
pub enum DetectorError {
    #[error("cascade file not found: {0}")]
    CascadeNotFound(String),
    #[error("detection failed: {0}")]
    DetectionFailed(String),
}

#[derive(Error, Debug)]
pub enum ScreenError {
    #[error("display failed: {0}")]
    Display(String),
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("attendance: {0}")]
    Attendance(#[from] AttendanceError),
    #[error("screen: {0}")]
    Screen(#[from] ScreenError),
}

/// Face detection capability over a grayscale frame.
pub trait FaceDetector {
    fn detect(&mut self, gray: &GrayImage) -> Result<Vec<BoundingBox>, DetectorError>;
}

/// Rendering primitives for the face box and its label.
pub trait Overlay {
    /// Rendered (width, height) of `text` in the overlay font.
    fn text_size(&self, text: &str) -> (u32, u32);

    fn draw(&self, image: &mut RgbImage, face: &BoundingBox, label: &str, placement: &LabelPlacement);
}

/// The titled output surface and its keyboard.
pub trait Screen {
    fn show(&mut self, frame: &Frame) -> Result<(), ScreenError>;

    /// Wait at most `wait` for a key press.
    fn poll_key(&mut self, wait: Duration) -> Result<Option<char>, ScreenError>;
}

/// Keys the loop reacts to. Everything else is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// Persist the last recognition (`o`).
    Capture,
    /// Stop the loop (`q`).
    Quit,
}

impl Control {
    pub fn from_key(key: char) -> Option<Control> {
        match key {
            'o' => Some(Control::Capture),
            'q' => Some(Control::Quit),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Running,
    Stopped,
}

/// Hardware-facing collaborators, boxed so the session has a single type.
pub struct Devices {
    pub live: Box<dyn FrameSource>,
    pub background: Box<dyn FrameSource>,
    pub detector: Box<dyn FaceDetector>,
    pub resolver: Box<dyn IdentityResolver>,
    pub overlay: Box<dyn Overlay>,
    pub screen: Box<dyn Screen>,
}

/// Tunables that are not capabilities.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub policy: RecognitionPolicy,
    pub compositor: Compositor,
    pub attendance: AttendanceLog,
    pub poll_interval: Duration,
}

/// Counters reported when the loop stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks: u64,
    pub skipped: u64,
    pub recognitions: u64,
    pub captures: u64,
    pub rejected_captures: u64,
}

pub struct Session {
    devices: Devices,
    identities: IdentityTable,
    settings: SessionSettings,
    cache: RecognitionCache,
    state: State,
    clock: fn() -> NaiveDateTime,
    summary: RunSummary,
}

fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

impl Session {
    pub fn new(devices: Devices, identities: IdentityTable, settings: SessionSettings) -> Self {
        Self {
            devices,
            identities,
            settings,
            cache: RecognitionCache::default(),
            state: State::Running,
            clock: local_now,
            summary: RunSummary::default(),
        }
    }

    /// Replace the wall clock used for attendance dates and times.
    pub fn with_clock(mut self, clock: fn() -> NaiveDateTime) -> Self {
        self.clock = clock;
        self
    }

    /// Loop until the quit key. Consumes the session so every device is
    /// released when this returns, successfully or not.
    pub fn run(mut self) -> Result<RunSummary, SessionError> {
        tracing::info!(
            poll_ms = self.settings.poll_interval.as_millis() as u64,
            threshold = self.settings.policy.threshold,
            "session running"
        );
        while self.state == State::Running {
            self.tick()?;
        }
        tracing::info!(summary = ?self.summary, "session stopped");
        Ok(self.summary)
    }

    /// One iteration: acquire, annotate, composite, show, poll.
    fn tick(&mut self) -> Result<(), SessionError> {
        self.summary.ticks += 1;

        if let Some(canvas) = self.render() {
            self.devices.screen.show(&canvas)?;
        } else {
            self.summary.skipped += 1;
        }

        let key = self.devices.screen.poll_key(self.settings.poll_interval)?;
        match key.and_then(Control::from_key) {
            Some(Control::Capture) => {
                self.capture()?;
            }
            Some(Control::Quit) => {
                tracing::info!("quit requested");
                self.state = State::Stopped;
            }
            None => {}
        }
        Ok(())
    }

    /// Build this tick's canvas, or `None` when the tick must be skipped.
    fn render(&mut self) -> Option<Frame> {
        let background = match self.devices.background.next_frame() {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(error = %e, "background frame unavailable; skipping tick");
                return None;
            }
        };
        let mut live = match self.devices.live.next_frame() {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(error = %e, "camera frame unavailable; skipping tick");
                return None;
            }
        };

        self.annotate(&mut live);

        match self.settings.compositor.composite(&live, &background) {
            Ok(canvas) => Some(canvas),
            Err(e) => {
                tracing::warn!(error = %e, "composite skipped");
                None
            }
        }
    }

    /// Detect, classify and label every face in `live`.
    fn annotate(&mut self, live: &mut Frame) {
        let gray = live.to_grayscale();
        let faces = match self.devices.detector.detect(&gray) {
            Ok(faces) => faces,
            Err(e) => {
                tracing::warn!(error = %e, "face detection failed");
                return;
            }
        };
        tracing::debug!(seq = live.sequence, faces = faces.len(), "detected");

        let frame_size = (live.width(), live.height());
        for face in &faces {
            let Some(crop) = crop_face(&gray, face) else {
                tracing::warn!(?face, "empty face crop; skipping face");
                continue;
            };
            let guess = match self.devices.resolver.predict(&crop) {
                Ok(guess) => guess,
                Err(e) => {
                    tracing::warn!(error = %e, ?face, "classification failed");
                    continue;
                }
            };

            let identity = self.settings.policy.resolve(guess, &self.identities);
            tracing::debug!(
                index = guess.index,
                confidence = guess.confidence,
                name = %identity.name,
                "face resolved"
            );

            self.cache
                .record(AttendanceRow::new(&identity, (self.clock)().time()));
            self.summary.recognitions += 1;

            let label = identity.label();
            let text_size = self.devices.overlay.text_size(&label);
            let placement = place_label(face, text_size, frame_size);
            self.devices
                .overlay
                .draw(&mut live.image, face, &label, &placement);
        }
    }

    /// Persist the cached row to today's file. A capture before anything was
    /// recognized is refused rather than writing an undefined row.
    fn capture(&mut self) -> Result<Option<PathBuf>, SessionError> {
        let Some(row) = self.cache.latest() else {
            tracing::warn!("capture ignored: no face recognized yet");
            self.summary.rejected_captures += 1;
            return Ok(None);
        };
        let today = (self.clock)().date();
        let path = self.settings.attendance.append(row, today)?;
        self.summary.captures += 1;
        Ok(Some(path))
    }
}
