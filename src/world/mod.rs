//! Runtime destructible world
//!
//! Wraps a generated layout as the single mutable grid for one level attempt.

pub mod hazard;
pub mod state;

pub use hazard::{CascadeReport, HazardEffect, HazardPropagator};
pub use state::{DamageOutcome, DestroyedTile, DestructibleWorldState, StrikeOutcome};
