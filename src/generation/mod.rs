//! Deterministic level generation
//!
//! All randomness flows from one [`DeterministicStream`] seeded by a
//! [`LevelIdentifier`]; the same identifier yields the same [`LevelLayout`]
//! on every machine.

pub mod generator;
pub mod layout;
pub mod level_id;
pub mod stream;
pub mod tiles;
pub mod validate;

pub use generator::{LevelGenerator, generate};
pub use layout::{
    Checkpoint, CheckpointKind, EnemyBehavior, EnemyPlacement, EnemyTier, LevelLayout,
    LevelMetadata, RewardDrop, RewardKind, TileCoord, WeaponDrop, Zone, ZoneKind,
};
pub use level_id::LevelIdentifier;
pub use stream::DeterministicStream;
pub use tiles::{
    CollisionClass, DestructibleRecord, HazardKind, HiddenContentKind, MaterialClass, TileKind,
    WeaponTier,
};
pub use validate::{ValidationReport, difficulty_score, validate};
