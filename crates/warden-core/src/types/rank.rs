//! Actor ranks.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

/// Trust tier assigned to an actor by the host.
///
/// Ranks are ordered: `Rank1` is the most trusted tier and `Rank4` the
/// least. A rule declared for rank N applies to actors of rank N or any
/// less trusted (numerically higher) rank.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
)]
#[serde(try_from = "u8", into = "u8")]
pub enum Rank {
    #[strum(serialize = "1")]
    Rank1,
    #[strum(serialize = "2")]
    Rank2,
    #[strum(serialize = "3")]
    Rank3,
    #[strum(serialize = "4")]
    Rank4,
}

impl Rank {
    /// Resolve a rank from its numeric level (1-4).
    pub fn from_level(level: i64) -> Option<Self> {
        match level {
            1 => Some(Rank::Rank1),
            2 => Some(Rank::Rank2),
            3 => Some(Rank::Rank3),
            4 => Some(Rank::Rank4),
            _ => None,
        }
    }

    /// Numeric level of this rank.
    pub fn level(self) -> u8 {
        match self {
            Rank::Rank1 => 1,
            Rank::Rank2 => 2,
            Rank::Rank3 => 3,
            Rank::Rank4 => 4,
        }
    }
}

impl TryFrom<u8> for Rank {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Rank::from_level(value as i64).ok_or_else(|| format!("invalid rank {value}"))
    }
}

impl From<Rank> for u8 {
    fn from(rank: Rank) -> Self {
        rank.level()
    }
}
