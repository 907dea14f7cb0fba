//! Hazard cascades
//!
//! Applies the grid effect of a hazard reported by
//! [`DestructibleWorldState::destroy_tile`]. Every cell a cascade clears goes
//! through [`DestructibleWorldState::destroy_tile_raw`], which never reports
//! hazards, so one destroyed tile can trigger at most one cascade.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::Serialize;

use super::state::{DestroyedTile, DestructibleWorldState};
use crate::consts::CASCADE_SEED_OFFSET;
use crate::generation::{HazardKind, LevelIdentifier, MaterialClass, TileCoord};

/// Effect left for gameplay systems outside the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HazardEffect {
    GasCloud { at: TileCoord },
    FireBurst { at: TileCoord },
    Spikes { at: TileCoord },
    CoverLost { at: TileCoord },
}

/// What one propagation did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CascadeReport {
    /// Cells cleared by the cascade, in clearing order
    pub cleared: Vec<TileCoord>,
    pub effect: Option<HazardEffect>,
}

/// Hazard propagation for one level attempt.
///
/// Random collapse rolls come from a PCG stream seeded from the level, so a
/// replay with the same inputs collapses the same cells.
#[derive(Debug, Clone)]
pub struct HazardPropagator {
    rng: Pcg32,
}

impl HazardPropagator {
    pub fn new(level: &LevelIdentifier) -> Self {
        Self::from_seed(level.generation_seed())
    }

    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed.wrapping_add(CASCADE_SEED_OFFSET)),
        }
    }

    /// Apply the hazard carried by a destroyed tile, if any
    pub fn propagate(
        &mut self,
        world: &mut DestructibleWorldState,
        destroyed: &DestroyedTile,
    ) -> CascadeReport {
        let Some(hazard) = destroyed.triggered_hazard else {
            return CascadeReport::default();
        };
        let at = TileCoord::new(destroyed.x, destroyed.y);
        let report = match hazard {
            HazardKind::FallingDebris | HazardKind::UnstableFloor => CascadeReport {
                cleared: drop_column_above(world, destroyed.x, destroyed.y),
                effect: None,
            },
            HazardKind::GasRelease => effect_only(HazardEffect::GasCloud { at }),
            HazardKind::FireRelease => effect_only(HazardEffect::FireBurst { at }),
            HazardKind::SpikeTrap => effect_only(HazardEffect::Spikes { at }),
            HazardKind::CoverWall => effect_only(HazardEffect::CoverLost { at }),
        };
        log::trace!(
            "{:?} at ({}, {}) cleared {} cells",
            hazard,
            destroyed.x,
            destroyed.y,
            report.cleared.len()
        );
        report
    }

    /// Blast collapse over the block stack resting on `(x, y)`: each
    /// breakable block falls with 40% chance. The walk stops at the first
    /// cell without material, so detached blocks higher up are untouched.
    /// Indestructible blocks and blocks carrying their own hazard stay.
    pub fn collapse_above(
        &mut self,
        world: &mut DestructibleWorldState,
        x: i32,
        y: i32,
    ) -> Vec<TileCoord> {
        let mut cleared = Vec::new();
        for cy in (0..y).rev() {
            let Some(material) = world.tile_at(x, cy).material() else {
                break;
            };
            let armed = world.destructible_at(x, cy).hazard.is_some();
            if material == MaterialClass::Indestructible || armed {
                continue;
            }
            if self.rng.random_ratio(2, 5) && world.destroy_tile_raw(x, cy) {
                cleared.push(TileCoord::new(x, cy));
            }
        }
        cleared
    }
}

fn effect_only(effect: HazardEffect) -> CascadeReport {
    CascadeReport {
        cleared: Vec::new(),
        effect: Some(effect),
    }
}

/// Breakable block that can fall
fn is_loose(world: &DestructibleWorldState, x: i32, y: i32) -> bool {
    matches!(
        world.tile_at(x, y).material(),
        Some(MaterialClass::Soft | MaterialClass::Medium | MaterialClass::Hard | MaterialClass::Reinforced)
    )
}

/// Clear the unbroken stack of breakable blocks directly above `(x, y)`
fn drop_column_above(world: &mut DestructibleWorldState, x: i32, y: i32) -> Vec<TileCoord> {
    let mut cleared = Vec::new();
    let mut cy = y - 1;
    while cy >= 0 && is_loose(world, x, cy) {
        if world.destroy_tile_raw(x, cy) {
            cleared.push(TileCoord::new(x, cy));
        }
        cy -= 1;
    }
    cleared
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::{DestructibleRecord, LevelLayout, TileKind};

    /// 4 wide, 8 tall; column 1 is a stack of soft blocks from row 2 down to
    /// row 6, each carrying `hazard`
    fn stacked(hazard: Option<HazardKind>) -> DestructibleWorldState {
        let mut layout = LevelLayout::empty(4, 8);
        for x in 0..4 {
            let i = layout.index(x, 7).unwrap();
            layout.tiles[i] = TileKind::GroundTop;
        }
        for y in 2..7 {
            let i = layout.index(1, y).unwrap();
            layout.tiles[i] = TileKind::DestructibleSoft;
            layout.destructibles[i] = DestructibleRecord {
                hazard,
                ..DestructibleRecord::new(MaterialClass::Soft, 50)
            };
        }
        layout.derive_collision();
        DestructibleWorldState::new(layout)
    }

    #[test]
    fn test_falling_debris_drops_column_once() {
        let mut world = stacked(Some(HazardKind::FallingDebris));
        let mut hazards = HazardPropagator::from_seed(7);

        let destroyed = world.destroy_tile(1, 6).unwrap();
        let report = hazards.propagate(&mut world, &destroyed);
        assert_eq!(report.cleared.len(), 4);
        assert!(report.effect.is_none());
        for y in 2..7 {
            assert_eq!(world.tile_at(1, y), TileKind::Empty);
        }
        // Cleared cells carried hazards too, but none of them cascaded
        assert!(world.layout().check_invariants().is_ok());
    }

    #[test]
    fn test_debris_stops_at_gap() {
        let mut world = stacked(Some(HazardKind::UnstableFloor));
        world.destroy_tile_raw(1, 4);
        let destroyed = world.destroy_tile(1, 6).unwrap();
        let report = HazardPropagator::from_seed(1).propagate(&mut world, &destroyed);
        assert_eq!(report.cleared, vec![TileCoord::new(1, 5)]);
        assert_eq!(world.tile_at(1, 3), TileKind::DestructibleSoft);
    }

    #[test]
    fn test_effect_hazards_leave_grid_alone() {
        let mut world = stacked(Some(HazardKind::GasRelease));
        let destroyed = world.destroy_tile(1, 6).unwrap();
        let report = HazardPropagator::from_seed(1).propagate(&mut world, &destroyed);
        assert!(report.cleared.is_empty());
        assert_eq!(
            report.effect,
            Some(HazardEffect::GasCloud {
                at: TileCoord::new(1, 6)
            })
        );
        assert_eq!(world.tile_at(1, 5), TileKind::DestructibleSoft);
    }

    #[test]
    fn test_no_hazard_no_cascade() {
        let mut world = stacked(None);
        let destroyed = world.destroy_tile(1, 6).unwrap();
        let report = HazardPropagator::from_seed(1).propagate(&mut world, &destroyed);
        assert_eq!(report, CascadeReport::default());
    }

    #[test]
    fn test_collapse_is_seeded() {
        let run = |seed| {
            let mut world = stacked(None);
            let cleared = HazardPropagator::from_seed(seed).collapse_above(&mut world, 1, 7);
            (cleared, world.into_layout())
        };
        let (cleared_a, layout_a) = run(42);
        let (cleared_b, layout_b) = run(42);
        assert_eq!(cleared_a, cleared_b);
        assert_eq!(layout_a, layout_b);
        assert!(cleared_a.len() <= 5);
        for pos in &cleared_a {
            assert_eq!(layout_a.tile_at(pos.x, pos.y), TileKind::Empty);
        }
    }

    #[test]
    fn test_collapse_stops_at_gap() {
        for seed in 0..50 {
            let mut world = stacked(None);
            world.destroy_tile_raw(1, 4);
            let cleared = HazardPropagator::from_seed(seed).collapse_above(&mut world, 1, 7);
            assert!(cleared.iter().all(|p| p.y > 4), "seed {seed}: {cleared:?}");
            assert_eq!(world.tile_at(1, 3), TileKind::DestructibleSoft);
            assert_eq!(world.tile_at(1, 2), TileKind::DestructibleSoft);
        }
    }

    #[test]
    fn test_collapse_skips_hazard_blocks() {
        for seed in 0..20 {
            let mut world = stacked(Some(HazardKind::GasRelease));
            let cleared = HazardPropagator::from_seed(seed).collapse_above(&mut world, 1, 7);
            assert!(cleared.is_empty());
        }
    }

    #[test]
    fn test_collapse_passes_over_indestructible() {
        let mut layout = stacked(None).into_layout();
        let i = layout.index(1, 5).unwrap();
        layout.tiles[i] = TileKind::Indestructible;
        layout.destructibles[i] = DestructibleRecord::new(MaterialClass::Indestructible, 50);
        layout.derive_collision();
        let world = DestructibleWorldState::new(layout);
        let mut any_above = false;
        for seed in 0..50 {
            let mut w = world.clone();
            let cleared = HazardPropagator::from_seed(seed).collapse_above(&mut w, 1, 7);
            assert_eq!(w.tile_at(1, 5), TileKind::Indestructible);
            any_above |= cleared.iter().any(|p| p.y < 5);
        }
        assert!(any_above);
    }

    #[test]
    fn test_propagator_from_level() {
        let level = LevelIdentifier::try_parse("3-K7XM2P9A").unwrap();
        let mut a = HazardPropagator::new(&level);
        let mut b = HazardPropagator::from_seed(level.generation_seed());
        let mut wa = stacked(None);
        let mut wb = stacked(None);
        assert_eq!(a.collapse_above(&mut wa, 1, 7), b.collapse_above(&mut wb, 1, 7));
    }
}
