use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Identifier of a sellable product as the backend knows it, e.g. `SD_WAN`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub String);

impl ProductId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Fallback display name when the catalog has no entry for this id:
    /// separator underscores become spaces (`DARK_FIBER` -> `DARK FIBER`).
    pub fn humanized(&self) -> String {
        self.0.replace('_', " ")
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ProductId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Budget band enumeration the backend matrix is keyed by. Serialized as the
/// capitalized word, matching the backend contract verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BudgetBand {
    Low,
    Medium,
    High,
}

impl BudgetBand {
    pub const ALL: [BudgetBand; 3] = [BudgetBand::Low, BudgetBand::Medium, BudgetBand::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            BudgetBand::Low => "Low",
            BudgetBand::Medium => "Medium",
            BudgetBand::High => "High",
        }
    }
}

impl fmt::Display for BudgetBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown budget band: {0}")]
pub struct UnknownBudgetBand(pub String);

impl FromStr for BudgetBand {
    type Err = UnknownBudgetBand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            s if s.eq_ignore_ascii_case("low") => Ok(BudgetBand::Low),
            s if s.eq_ignore_ascii_case("medium") => Ok(BudgetBand::Medium),
            s if s.eq_ignore_ascii_case("high") => Ok(BudgetBand::High),
            other => Err(UnknownBudgetBand(other.to_string())),
        }
    }
}
