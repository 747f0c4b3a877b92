//! Identity table, roster loading and the confidence threshold policy.
//!
//! The classifier returns a bare index; this module owns the mapping from
//! that index to a person and the rule deciding when a guess is trusted.

use crate::types::{Identity, IdentityGuess};
use image::GrayImage;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Default LBPH distance threshold. Guesses above it are `Unknown`.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 50.0;

#[derive(Error, Debug)]
pub enum ResolverError {
    #[error("model file not found: {0}")]
    ModelNotFound(String),
    #[error("empty face crop")]
    EmptyCrop,
    #[error("prediction failed: {0}")]
    PredictionFailed(String),
}

/// Classifier capability: grayscale face crop to (index, distance).
pub trait IdentityResolver {
    fn predict(&mut self, face: &GrayImage) -> Result<IdentityGuess, ResolverError>;
}

#[derive(Error, Debug)]
pub enum RosterError {
    #[error("failed to read roster {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("bad roster TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("roster has no identities")]
    Empty,
    #[error("identity #{index} has an empty {field}")]
    BlankField { index: usize, field: &'static str },
}

/// Roster file layout: an ordered list of `[[identity]]` tables.
/// The first entry is classifier index 1.
#[derive(Debug, Deserialize)]
struct RosterFile {
    identity: Vec<Identity>,
}

/// Classifier index → enrolled person.
///
/// Index 0 is reserved by the training convention and never resolves.
#[derive(Debug, Clone)]
pub struct IdentityTable {
    enrolled: Vec<Identity>,
}

impl IdentityTable {
    /// Build from records in classifier order, starting at index 1.
    pub fn new(enrolled: Vec<Identity>) -> Result<Self, RosterError> {
        if enrolled.is_empty() {
            return Err(RosterError::Empty);
        }
        for (i, id) in enrolled.iter().enumerate() {
            let index = i + 1;
            for (field, value) in [("name", &id.name), ("class", &id.class), ("branch", &id.branch)] {
                if value.trim().is_empty() {
                    return Err(RosterError::BlankField { index, field });
                }
            }
        }
        Ok(Self { enrolled })
    }

    pub fn from_toml(src: &str) -> Result<Self, RosterError> {
        let file: RosterFile = toml::from_str(src)?;
        Self::new(file.identity)
    }

    pub fn load(path: &Path) -> Result<Self, RosterError> {
        let src = std::fs::read_to_string(path).map_err(|source| RosterError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let table = Self::from_toml(&src)?;
        tracing::info!(path = %path.display(), enrolled = table.enrolled.len(), "roster loaded");
        Ok(table)
    }

    /// Number of classifier slots, including the reserved index 0.
    pub fn len(&self) -> usize {
        self.enrolled.len() + 1
    }

    pub fn is_empty(&self) -> bool {
        self.enrolled.is_empty()
    }

    pub fn get(&self, index: i32) -> Option<&Identity> {
        if index < 1 {
            return None;
        }
        self.enrolled.get(index as usize - 1)
    }

    /// Enrolled identities with their classifier index.
    pub fn iter(&self) -> impl Iterator<Item = (i32, &Identity)> {
        self.enrolled.iter().enumerate().map(|(i, id)| (i as i32 + 1, id))
    }
}

/// Accept/reject rule applied to every classifier guess.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecognitionPolicy {
    /// Largest accepted distance.
    pub threshold: f64,
}

impl Default for RecognitionPolicy {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_CONFIDENCE_THRESHOLD,
        }
    }
}

impl RecognitionPolicy {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// Map a guess to an identity, falling back to `Unknown` when the
    /// distance exceeds the threshold or the index is not enrolled.
    pub fn resolve(&self, guess: IdentityGuess, table: &IdentityTable) -> Identity {
        if guess.confidence.is_nan() || guess.confidence > self.threshold {
            return Identity::unknown();
        }
        table.get(guess.index).cloned().unwrap_or_else(Identity::unknown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROSTER: &str = r#"
[[identity]]
name = "ada"
class = "Class B"
branch = "Branch Y"

[[identity]]
name = "grace"
class = "Class C"
branch = "Branch Z"

[[identity]]
name = "alan"
class = "Class A"
branch = "Branch S"
"#;

    fn table() -> IdentityTable {
        IdentityTable::from_toml(ROSTER).unwrap()
    }

    fn guess(index: i32, confidence: f64) -> IdentityGuess {
        IdentityGuess { index, confidence }
    }

    #[test]
    fn test_roster_order_is_index_order() {
        let t = table();
        assert_eq!(t.len(), 4);
        assert_eq!(t.get(1).unwrap().name, "ada");
        assert_eq!(t.get(3).unwrap().branch, "Branch S");
        assert!(t.get(0).is_none());
        assert!(t.get(4).is_none());
        assert!(t.get(-1).is_none());
    }

    #[test]
    fn test_threshold_accepts_just_below() {
        let policy = RecognitionPolicy::default();
        for eps in [0.001, 1.0, 25.0] {
            let id = policy.resolve(guess(2, DEFAULT_CONFIDENCE_THRESHOLD - eps), &table());
            assert_eq!(id.name, "grace");
            assert_eq!(id.class, "Class C");
            assert_eq!(id.branch, "Branch Z");
        }
    }

    #[test]
    fn test_threshold_rejects_just_above() {
        let policy = RecognitionPolicy::default();
        for eps in [0.001, 1.0, 1000.0] {
            let id = policy.resolve(guess(2, DEFAULT_CONFIDENCE_THRESHOLD + eps), &table());
            assert!(id.is_unknown());
        }
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let id = RecognitionPolicy::new(50.0).resolve(guess(1, 50.0), &table());
        assert_eq!(id.name, "ada");
    }

    #[test]
    fn test_out_of_range_index_is_unknown() {
        let policy = RecognitionPolicy::default();
        let t = table();
        for index in [t.len() as i32, t.len() as i32 + 7, 0, -3] {
            assert!(policy.resolve(guess(index, 0.0), &t).is_unknown());
        }
    }

    #[test]
    fn test_nan_confidence_is_unknown() {
        let id = RecognitionPolicy::default().resolve(guess(1, f64::NAN), &table());
        assert!(id.is_unknown());
    }

    #[test]
    fn test_empty_roster_rejected() {
        let err = IdentityTable::from_toml("identity = []").unwrap_err();
        assert!(matches!(err, RosterError::Empty));
    }

    #[test]
    fn test_blank_field_rejected() {
        let src = "[[identity]]\nname = \"a\"\nclass = \" \"\nbranch = \"b\"\n";
        let err = IdentityTable::from_toml(src).unwrap_err();
        assert!(matches!(err, RosterError::BlankField { index: 1, field: "class" }));
    }

    #[test]
    fn test_missing_field_is_parse_error() {
        let src = "[[identity]]\nname = \"a\"\nclass = \"c\"\n";
        assert!(matches!(IdentityTable::from_toml(src), Err(RosterError::Parse(_))));
    }
}
