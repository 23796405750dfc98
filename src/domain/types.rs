use serde::{Deserialize, Serialize};

pub const MIN_SCORE: u8 = 1;
pub const MAX_SCORE: u8 = 10;

/// Score assigned to a fingerprint. `note` is empty when there is no finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub score: u8,
    #[serde(default)]
    pub note: String,
}

impl ClassificationResult {
    pub fn new(score: i64, note: impl Into<String>) -> Self {
        Self {
            score: score.clamp(MIN_SCORE as i64, MAX_SCORE as i64) as u8,
            note: note.into(),
        }
    }

    /// Stand-in for items the service left without a verdict.
    pub fn fallback() -> Self {
        Self::new(MIN_SCORE as i64, "")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    High,
    Medium,
    Low,
}

impl Tier {
    pub const HIGH_THRESHOLD: u8 = 8;
    pub const MEDIUM_THRESHOLD: u8 = 5;

    pub fn from_score(score: u8) -> Self {
        if score >= Self::HIGH_THRESHOLD {
            Tier::High
        } else if score >= Self::MEDIUM_THRESHOLD {
            Tier::Medium
        } else {
            Tier::Low
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Tier::High => "#ff4d4d",
            Tier::Medium => "#ffa500",
            Tier::Low => "#4caf50",
        }
    }
}

/// Presentation applied to an annotated node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub tier: Tier,
    pub border: String,
    pub label: String,
}

/// Values read from the settings store before every tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub credential: Option<String>,
    pub paused: bool,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueSnapshot {
    pub pending: usize,
}
