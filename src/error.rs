//! Error taxonomy
//!
//! Construction and parse failures are always typed and recoverable. Mutating
//! the world out of bounds is not an error (it is a no-op), so there is no
//! variant for it here.

use thiserror::Error;

/// Building a [`LevelIdentifier`](crate::generation::LevelIdentifier) from
/// explicit values failed.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstructionError {
    #[error("epoch {0} is out of range (0-9)")]
    EpochOutOfRange(u8),

    #[error("difficulty {0} is out of range (0-3)")]
    DifficultyOutOfRange(u8),
}

/// A level code or challenge string could not be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("code is empty")]
    Empty,

    #[error("code must be 10 characters (E-XXXXXXXX), found {found}")]
    WrongLength { found: usize },

    #[error("code must have '-' after the epoch digit")]
    MissingSeparator,

    #[error("'{0}' is not an epoch digit (0-9)")]
    InvalidEpoch(char),

    #[error("'{symbol}' at position {position} is not a valid code symbol")]
    InvalidSymbol { symbol: char, position: usize },

    #[error("'{0}' is not a valid target score")]
    InvalidScore(String),
}

/// Generation tuning could not be loaded or is not usable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TuningError {
    #[error("tuning JSON is malformed: {0}")]
    Json(String),

    #[error("tuning field `{field}` is invalid: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

impl From<serde_json::Error> for TuningError {
    fn from(err: serde_json::Error) -> Self {
        TuningError::Json(err.to_string())
    }
}

/// A grid invariant that a [`LevelLayout`](crate::generation::LevelLayout)
/// must uphold was found broken.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("grid arrays do not all have width*height entries")]
    LengthMismatch,

    #[error("collision at cell {index} does not match its tile kind")]
    CollisionMismatch { index: usize },

    #[error("cell {index} carries a destructible record but is not destructible")]
    StrayRecord { index: usize },

    #[error("cell {index} carries a record for a different material than its tile")]
    MaterialMismatch { index: usize },

    #[error("cell {index} has more hit points than its maximum")]
    HitPointsExceedMax { index: usize },
}
