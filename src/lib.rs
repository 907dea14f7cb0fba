//! Epoch Breaker - deterministic level generation and destructible world
//!
//! Core modules:
//! - `generation`: Seeded level generation (stream, level codes, layout)
//! - `world`: Runtime destructible grid and hazard cascades
//! - `challenge`: Challenge strings and share text
//! - `tuning`: Data-driven generation knobs
//! - `error`: Typed construction and parse failures

pub mod challenge;
pub mod error;
pub mod generation;
pub mod tuning;
pub mod world;

pub use challenge::ChallengeCode;
pub use error::{ConstructionError, InvariantViolation, ParseError, TuningError};
pub use generation::{LevelGenerator, LevelIdentifier, LevelLayout, generate};
pub use tuning::{DifficultyProfile, GenerationTuning};
pub use world::{DestructibleWorldState, HazardPropagator};

/// Fixed constants that are not tuning knobs
pub mod consts {
    /// Smallest grid any tuning can produce
    pub const MIN_GRID_WIDTH: i32 = 48;
    pub const MIN_GRID_HEIGHT: i32 = 12;
    /// Largest grid any tuning can produce
    pub const MAX_GRID_WIDTH: i32 = 2048;
    pub const MAX_GRID_HEIGHT: i32 = 128;

    /// Hit points given to an indestructible cell the generator left unset
    pub const DEFAULT_INDESTRUCTIBLE_HP: u8 = 50;
    /// Damage a single weapon projectile deals to an indestructible cell
    pub const INDESTRUCTIBLE_STRIKE_DAMAGE: u32 = 2;

    /// Added to the level's generation seed for hazard collapse rolls
    pub const CASCADE_SEED_OFFSET: u64 = 99_999;
}
