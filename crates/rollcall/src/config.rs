use rollcall_core::compositor::DEFAULT_DISPLAY_SIZE;
use rollcall_core::identity::DEFAULT_CONFIDENCE_THRESHOLD;
use rollcall_core::session::DEFAULT_POLL_INTERVAL;
use rollcall_hw::cascade::{DEFAULT_MIN_NEIGHBORS, DEFAULT_SCALE_FACTOR};
use std::path::PathBuf;
use std::time::Duration;

/// Runtime configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Capture device index; maps to `/dev/video<index>`.
    pub camera_index: u32,
    /// Background video that loops behind the live feed.
    pub background_path: String,
    /// Haar cascade XML for face detection.
    pub cascade_path: String,
    /// Trained LBPH model.
    pub model_path: String,
    /// TOML roster mapping classifier indices to people.
    pub roster_path: PathBuf,
    /// Directory holding the daily attendance CSVs.
    pub attendance_dir: PathBuf,
    /// TrueType font used for labels.
    pub font_path: PathBuf,
    pub window_title: String,
    /// Canvas size overrides. Unset axes follow the primary monitor.
    pub display_width: Option<u32>,
    pub display_height: Option<u32>,
    /// Largest accepted LBPH distance.
    pub confidence_threshold: f64,
    /// Per-tick key wait; also paces the loop.
    pub poll_interval: Duration,
    pub scale_factor: f64,
    pub min_neighbors: i32,
}

impl Config {
    /// Load configuration from `ROLLCALL_*` environment variables with defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        let string = |key: &str, default: &str| var(key).unwrap_or_else(|| default.to_string());
        let path = |key: &str, default: &str| PathBuf::from(string(key, default));

        Self {
            camera_index: parse(&var, "ROLLCALL_CAMERA_INDEX", 0),
            background_path: string("ROLLCALL_BACKGROUND", "elder.mp4"),
            cascade_path: string("ROLLCALL_CASCADE", "haarcascade_frontalface_default.xml"),
            model_path: string("ROLLCALL_MODEL", "Trainer.yml"),
            roster_path: path("ROLLCALL_ROSTER", "roster.toml"),
            attendance_dir: path("ROLLCALL_ATTENDANCE_DIR", rollcall_core::attendance::DEFAULT_DIR),
            font_path: path(
                "ROLLCALL_FONT",
                "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
            ),
            window_title: string("ROLLCALL_WINDOW_TITLE", "Frame"),
            display_width: var("ROLLCALL_DISPLAY_WIDTH").and_then(|v| v.parse().ok()),
            display_height: var("ROLLCALL_DISPLAY_HEIGHT").and_then(|v| v.parse().ok()),
            confidence_threshold: parse(&var, "ROLLCALL_CONFIDENCE_THRESHOLD", DEFAULT_CONFIDENCE_THRESHOLD),
            poll_interval: Duration::from_millis(parse(
                &var,
                "ROLLCALL_POLL_MS",
                DEFAULT_POLL_INTERVAL.as_millis() as u64,
            )),
            scale_factor: parse(&var, "ROLLCALL_SCALE_FACTOR", DEFAULT_SCALE_FACTOR),
            min_neighbors: parse(&var, "ROLLCALL_MIN_NEIGHBORS", DEFAULT_MIN_NEIGHBORS),
        }
    }

    /// Canvas size: per-axis override, else the detected monitor, else
    /// [`DEFAULT_DISPLAY_SIZE`]. `detect` only runs when an axis is unset.
    pub fn display_size(&self, detect: impl FnOnce() -> Option<(u32, u32)>) -> (u32, u32) {
        if let (Some(w), Some(h)) = (self.display_width, self.display_height) {
            return (w, h);
        }
        let (dw, dh) = detect().unwrap_or(DEFAULT_DISPLAY_SIZE);
        (self.display_width.unwrap_or(dw), self.display_height.unwrap_or(dh))
    }
}

fn parse<T: std::str::FromStr>(var: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    var(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}
