//! Level progression: maps a cumulative score onto a level and rank.
//!
//! A [`LevelTable`] is an ordered list of contiguous `[min_score, max_score)`
//! ranges starting at zero. The last range's `max_score` is the global score
//! cap. Tables are validated once at construction; after that, lookups never
//! fail and absorb out-of-range scores by clamping.

use serde::{Deserialize, Serialize};

use crate::error::{ReputationError, Result};

/// One band of the level table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelThreshold {
    pub level: u32,
    pub rank: String,
    pub min_score: u64,
    pub max_score: u64,
}

impl LevelThreshold {
    pub fn new(level: u32, rank: &str, min_score: u64, max_score: u64) -> Self {
        Self {
            level,
            rank: rank.to_string(),
            min_score,
            max_score,
        }
    }
}

/// Where a score sits in the level table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelInfo {
    pub level: u32,
    pub rank: String,
    /// The score after clamping to `[0, cap]`.
    pub score: u64,
    pub progress_percent: u8,
    pub points_to_next: u64,
}

/// Validated, ordered level thresholds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<LevelThreshold>", into = "Vec<LevelThreshold>")]
pub struct LevelTable {
    thresholds: Vec<LevelThreshold>,
}

impl TryFrom<Vec<LevelThreshold>> for LevelTable {
    type Error = ReputationError;

    fn try_from(thresholds: Vec<LevelThreshold>) -> Result<Self> {
        Self::new(thresholds)
    }
}

impl From<LevelTable> for Vec<LevelThreshold> {
    fn from(table: LevelTable) -> Self {
        table.thresholds
    }
}

impl Default for LevelTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl LevelTable {
    /// Build a table, rejecting gaps, overlaps, empty bands, and tables that
    /// do not start at zero.
    pub fn new(thresholds: Vec<LevelThreshold>) -> Result<Self> {
        let Some(first) = thresholds.first() else {
            return Err(ReputationError::InvalidConfig(
                "level table must contain at least one threshold".to_string(),
            ));
        };
        if first.min_score != 0 {
            return Err(ReputationError::InvalidConfig(format!(
                "level table must start at 0, starts at {}",
                first.min_score
            )));
        }

        for t in &thresholds {
            if t.min_score >= t.max_score {
                return Err(ReputationError::InvalidConfig(format!(
                    "level {} has empty range [{}, {})",
                    t.level, t.min_score, t.max_score
                )));
            }
        }

        for pair in thresholds.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            if next.min_score != prev.max_score {
                return Err(ReputationError::InvalidConfig(format!(
                    "level {} starts at {} but level {} ends at {}",
                    next.level, next.min_score, prev.level, prev.max_score
                )));
            }
            if next.level <= prev.level {
                return Err(ReputationError::InvalidConfig(format!(
                    "levels must increase: {} follows {}",
                    next.level, prev.level
                )));
            }
        }

        Ok(Self { thresholds })
    }

    /// Seven levels up to a 10,000 point cap.
    pub fn standard() -> Self {
        Self {
            thresholds: vec![
                LevelThreshold::new(1, "Newcomer", 0, 500),
                LevelThreshold::new(2, "Explorer", 500, 1_500),
                LevelThreshold::new(3, "Contributor", 1_500, 3_000),
                LevelThreshold::new(4, "Trusted", 3_000, 5_000),
                LevelThreshold::new(5, "Guardian", 5_000, 7_500),
                LevelThreshold::new(6, "Ambassador", 7_500, 9_000),
                LevelThreshold::new(7, "Legend", 9_000, 10_000),
            ],
        }
    }

    pub fn thresholds(&self) -> &[LevelThreshold] {
        &self.thresholds
    }

    /// The global score cap.
    pub fn cap(&self) -> u64 {
        self.thresholds.last().map(|t| t.max_score).unwrap_or(0)
    }

    /// Clamp a signed score into `[0, cap]`.
    pub fn clamp(&self, score: i64) -> u64 {
        (score.max(0) as u64).min(self.cap())
    }

    /// Compute level, rank, and progress for `score`.
    pub fn level_for(&self, score: i64) -> LevelInfo {
        let score = self.clamp(score);
        let last = self.thresholds.len() - 1;

        if score >= self.cap() {
            let top = &self.thresholds[last];
            return LevelInfo {
                level: top.level,
                rank: top.rank.clone(),
                score,
                progress_percent: 100,
                points_to_next: 0,
            };
        }

        let idx = self
            .thresholds
            .iter()
            .position(|t| score >= t.min_score && score < t.max_score)
            .unwrap_or(last);
        let band = &self.thresholds[idx];

        let span = (band.max_score - band.min_score) as f64;
        let into = score.saturating_sub(band.min_score) as f64;
        let progress_percent = (100.0 * into / span).round().clamp(0.0, 100.0) as u8;

        let points_to_next = self
            .thresholds
            .get(idx + 1)
            .map(|next| next.min_score.saturating_sub(score))
            .unwrap_or(0);

        LevelInfo {
            level: band.level,
            rank: band.rank.clone(),
            score,
            progress_percent,
            points_to_next,
        }
    }
}
