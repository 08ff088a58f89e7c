// Player valuation records consumed from the external valuation engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Fantasy football positions used for roster slots and allocation planning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    Quarterback,
    RunningBack,
    WideReceiver,
    TightEnd,
    Kicker,
    Defense,
    Flex,
    Bench,
}

impl Position {
    /// Parse a position string into a Position enum.
    ///
    /// Handles the common abbreviations:
    /// - "QB" -> Quarterback, "RB" -> RunningBack, "WR" -> WideReceiver
    /// - "DST"/"D/ST"/"DEF" -> Defense
    /// - "FLEX"/"W/R/T" -> Flex, "BE"/"BN" -> Bench
    pub fn from_str_pos(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "QB" => Some(Position::Quarterback),
            "RB" => Some(Position::RunningBack),
            "WR" => Some(Position::WideReceiver),
            "TE" => Some(Position::TightEnd),
            "K" => Some(Position::Kicker),
            "DST" | "D/ST" | "DEF" => Some(Position::Defense),
            "FLEX" | "W/R/T" => Some(Position::Flex),
            "BE" | "BN" => Some(Position::Bench),
            _ => None,
        }
    }

    /// Return the display string for this position.
    pub fn display_str(&self) -> &'static str {
        match self {
            Position::Quarterback => "QB",
            Position::RunningBack => "RB",
            Position::WideReceiver => "WR",
            Position::TightEnd => "TE",
            Position::Kicker => "K",
            Position::Defense => "DST",
            Position::Flex => "FLEX",
            Position::Bench => "BE",
        }
    }

    /// Whether this position can fill a FLEX slot (RB/WR/TE).
    pub fn is_flex_eligible(&self) -> bool {
        matches!(
            self,
            Position::RunningBack | Position::WideReceiver | Position::TightEnd
        )
    }

    /// Deterministic ordering index for roster slot display.
    pub fn sort_order(&self) -> u8 {
        match self {
            Position::Quarterback => 0,
            Position::RunningBack => 1,
            Position::WideReceiver => 2,
            Position::TightEnd => 3,
            Position::Flex => 4,
            Position::Kicker => 5,
            Position::Defense => 6,
            Position::Bench => 7,
        }
    }

    /// The concrete positions tracked by the allocation planner.
    pub const TRACKED: [Position; 6] = [
        Position::Quarterback,
        Position::RunningBack,
        Position::WideReceiver,
        Position::TightEnd,
        Position::Kicker,
        Position::Defense,
    ];
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_str())
    }
}

/// A player valuation record as supplied by the valuation engine.
///
/// The auction engine never computes these values; it only consumes them.
/// `market_price` is the expected auction cost, `intrinsic_value` the
/// model-derived worth (absent for players the model doesn't cover).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    /// Stable player identifier (unique across the pool).
    pub id: String,
    /// Display name of the player.
    pub name: String,
    /// Primary position.
    pub position: Position,
    /// NFL team abbreviation (e.g. "KC").
    pub team: String,
    /// Expected auction price in dollars.
    pub market_price: u32,
    /// Model-derived value in dollars, if available.
    #[serde(default)]
    pub intrinsic_value: Option<f64>,
}

impl Player {
    /// Normalized edge: `(intrinsic - market) / market`.
    ///
    /// Returns `None` when the player has no intrinsic value or a zero
    /// market price (edge would be undefined).
    pub fn edge(&self) -> Option<f64> {
        let intrinsic = self.intrinsic_value?;
        if self.market_price == 0 {
            return None;
        }
        let market = self.market_price as f64;
        Some((intrinsic - market) / market)
    }
}
