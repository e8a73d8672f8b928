//! Display helpers for scores and addresses

use crate::normalize::ValidationRecord;
use serde::{Deserialize, Serialize};

/// Score at or above which a result is excellent
pub const EXCELLENT_SCORE: u8 = 90;
/// Score at or above which a failing result is still fair
pub const FAIR_SCORE: u8 = 50;

/// Qualitative band for a score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    Excellent,
    Good,
    Fair,
    NeedsImprovement,
}

impl ScoreBand {
    pub fn classify(score: u8, passing_score: u8) -> Self {
        if score >= EXCELLENT_SCORE {
            ScoreBand::Excellent
        } else if score >= passing_score {
            ScoreBand::Good
        } else if score >= FAIR_SCORE {
            ScoreBand::Fair
        } else {
            ScoreBand::NeedsImprovement
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ScoreBand::Excellent => "Excellent",
            ScoreBand::Good => "Good",
            ScoreBand::Fair => "Fair",
            ScoreBand::NeedsImprovement => "Needs Improvement",
        }
    }
}

impl std::fmt::Display for ScoreBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl ValidationRecord {
    pub fn band(&self, passing_score: u8) -> ScoreBand {
        ScoreBand::classify(self.score, passing_score)
    }
}

/// `0x1234...abcd` form of an address
pub fn short_address(address: &str) -> String {
    if address.chars().count() <= 10 {
        return address.to_string();
    }
    let head: String = address.chars().take(6).collect();
    let tail: String = address
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("{head}...{tail}")
}
