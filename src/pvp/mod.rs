// Competitive (PVP) viability: level multipliers, the stat model, IV spread
// search, ranking lookups, per-record annotation and team synthesis.

pub mod annotate;
pub mod bracket;
pub mod identifiers;
pub mod levels;
pub mod rankings;
pub mod spreads;
pub mod stats;
pub mod teams;

pub use annotate::{MatchAnnotator, MatchOptions};
pub use bracket::Bracket;
pub use levels::LevelMultiplierTable;
pub use rankings::{RankedEntry, RankingEntry, RankingIndex};
pub use spreads::{IvSpread, SpreadCache};
pub use stats::{BaseStats, Ivs};
pub use teams::{Team, TeamSynthesizer};

use thiserror::Error;

/// Ranking category that always exists; unknown categories resolve to it.
pub const DEFAULT_CATEGORY: &str = "overall";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PvpError {
    /// The multiplier table is empty or has no value for the requested level.
    /// Callers treat this as "PVP features disabled", never as a fatal error.
    #[error("cp multipliers unavailable")]
    MultipliersUnavailable,
    #[error("unknown league bracket: {0}")]
    UnknownBracket(String),
}
