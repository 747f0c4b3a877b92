use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// Axis-aligned face box in pixel coordinates of a single frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl BoundingBox {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    /// Intersect with a `width` x `height` frame. Returns `None` when nothing
    /// of the box lies inside the frame.
    pub fn clip_to(&self, width: u32, height: u32) -> Option<BoundingBox> {
        let x0 = self.x.max(0);
        let y0 = self.y.max(0);
        let x1 = self.right().min(width as i32);
        let y1 = self.bottom().min(height as i32);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(BoundingBox::new(x0, y0, x1 - x0, y1 - y0))
    }
}

/// Raw classifier output for one face crop.
///
/// `confidence` is a distance: lower means a closer match.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IdentityGuess {
    pub index: i32,
    pub confidence: f64,
}

/// An enrolled person, or the `Unknown` placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    pub class: String,
    pub branch: String,
}

impl Identity {
    pub const UNKNOWN: &'static str = "Unknown";

    pub fn unknown() -> Self {
        Self {
            name: Self::UNKNOWN.to_string(),
            class: Self::UNKNOWN.to_string(),
            branch: Self::UNKNOWN.to_string(),
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.name == Self::UNKNOWN && self.class == Self::UNKNOWN && self.branch == Self::UNKNOWN
    }

    /// Text drawn next to the face box.
    pub fn label(&self) -> String {
        format!("{}, {}, {}", self.name, self.class, self.branch)
    }
}

/// One attendance record, as persisted to the daily CSV.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceRow {
    pub name: String,
    pub class: String,
    pub branch: String,
    /// Time of day, `HH:MM:SS`.
    pub time: String,
}

impl AttendanceRow {
    pub fn new(identity: &Identity, time: NaiveTime) -> Self {
        Self {
            name: identity.name.clone(),
            class: identity.class.clone(),
            branch: identity.branch.clone(),
            time: time.format("%H:%M:%S").to_string(),
        }
    }

    pub fn as_record(&self) -> [&str; 4] {
        [&self.name, &self.class, &self.branch, &self.time]
    }
}

/// Last successful recognition, kept across ticks until overwritten.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RecognitionCache {
    /// Nothing recognized yet in this session.
    #[default]
    Empty,
    Recognized(AttendanceRow),
}

impl RecognitionCache {
    pub fn record(&mut self, row: AttendanceRow) {
        *self = RecognitionCache::Recognized(row);
    }

    pub fn latest(&self) -> Option<&AttendanceRow> {
        match self {
            RecognitionCache::Empty => None,
            RecognitionCache::Recognized(row) => Some(row),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_to_inside() {
        let b = BoundingBox::new(10, 10, 20, 20);
        assert_eq!(b.clip_to(100, 100), Some(b));
    }

    #[test]
    fn test_clip_to_partial_overhang() {
        let b = BoundingBox::new(-5, 90, 20, 20);
        assert_eq!(b.clip_to(100, 100), Some(BoundingBox::new(0, 90, 15, 10)));
    }

    #[test]
    fn test_clip_to_outside() {
        assert_eq!(BoundingBox::new(200, 0, 10, 10).clip_to(100, 100), None);
        assert_eq!(BoundingBox::new(10, 10, 0, 10).clip_to(100, 100), None);
    }

    #[test]
    fn test_unknown_identity() {
        let id = Identity::unknown();
        assert!(id.is_unknown());
        assert_eq!(id.label(), "Unknown, Unknown, Unknown");
    }

    #[test]
    fn test_attendance_row_time_format() {
        let id = Identity {
            name: "ada".into(),
            class: "Class B".into(),
            branch: "Branch Y".into(),
        };
        let time = NaiveTime::from_hms_opt(9, 5, 3).unwrap();
        let row = AttendanceRow::new(&id, time);
        assert_eq!(row.as_record(), ["ada", "Class B", "Branch Y", "09:05:03"]);
    }

    #[test]
    fn test_recognition_cache_starts_empty() {
        let mut cache = RecognitionCache::default();
        assert!(cache.latest().is_none());

        let row = AttendanceRow::new(&Identity::unknown(), NaiveTime::from_hms_opt(0, 0, 0).unwrap());
        cache.record(row.clone());
        assert_eq!(cache.latest(), Some(&row));
    }
}
