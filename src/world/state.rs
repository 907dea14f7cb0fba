//! Mutable runtime grid
//!
//! [`DestructibleWorldState`] owns the level's [`LevelLayout`] and is its only
//! writer. Every mutation clears `tiles`, `collision` and `destructibles`
//! together, so the three arrays cannot drift apart.

use serde::Serialize;

use crate::consts::{DEFAULT_INDESTRUCTIBLE_HP, INDESTRUCTIBLE_STRIKE_DAMAGE};
use crate::generation::{
    CollisionClass, DestructibleRecord, HazardKind, HiddenContentKind, LevelLayout, MaterialClass,
    TileKind, WeaponTier,
};

/// What a cleared cell held, for the caller's hazard and scoring systems
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DestroyedTile {
    pub x: i32,
    pub y: i32,
    pub previous: TileKind,
    pub was_relic: bool,
    pub hidden_content: Option<HiddenContentKind>,
    pub triggered_hazard: Option<HazardKind>,
}

/// Result of damaging an indestructible cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Not an indestructible cell; nothing changed
    Ignored,
    Damaged { remaining: u8 },
    Destroyed(DestroyedTile),
}

/// Result of a weapon hitting a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrikeOutcome {
    /// Nothing breakable there
    Ignored,
    /// The weapon tier cannot break this material
    Deflected,
    Damaged { remaining: u8 },
    Destroyed(DestroyedTile),
}

impl From<DamageOutcome> for StrikeOutcome {
    fn from(outcome: DamageOutcome) -> Self {
        match outcome {
            DamageOutcome::Ignored => StrikeOutcome::Ignored,
            DamageOutcome::Damaged { remaining } => StrikeOutcome::Damaged { remaining },
            DamageOutcome::Destroyed(tile) => StrikeOutcome::Destroyed(tile),
        }
    }
}

/// Runtime world for one level attempt
#[derive(Debug, Clone)]
pub struct DestructibleWorldState {
    layout: LevelLayout,
    geometry_dirty: bool,
}

impl DestructibleWorldState {
    pub fn new(layout: LevelLayout) -> Self {
        Self {
            layout,
            geometry_dirty: false,
        }
    }

    /// Read-only view of the current grid and placements
    pub fn layout(&self) -> &LevelLayout {
        &self.layout
    }

    pub fn into_layout(self) -> LevelLayout {
        self.layout
    }

    pub fn width(&self) -> i32 {
        self.layout.width()
    }

    pub fn height(&self) -> i32 {
        self.layout.height()
    }

    pub fn tile_at(&self, x: i32, y: i32) -> TileKind {
        self.layout.tile_at(x, y)
    }

    /// Collision class at a tile coordinate; `None` outside the grid
    pub fn collision_at(&self, x: i32, y: i32) -> CollisionClass {
        self.layout.collision_at(x, y)
    }

    /// Collision class at a world position (y up, one unit per tile,
    /// origin at the bottom-left corner)
    pub fn collision_at_world(&self, wx: f32, wy: f32) -> CollisionClass {
        if !wx.is_finite() || !wy.is_finite() {
            return CollisionClass::None;
        }
        let tx = wx.floor() as i32;
        let row_from_bottom = wy.floor() as i32;
        self.collision_at(tx, self.height() - 1 - row_from_bottom)
    }

    /// Destructible record; the zero record outside the grid
    pub fn destructible_at(&self, x: i32, y: i32) -> DestructibleRecord {
        self.layout.destructible_at(x, y)
    }

    pub fn is_geometry_dirty(&self) -> bool {
        self.geometry_dirty
    }

    /// Return and clear the dirty flag
    pub fn consume_geometry_dirty(&mut self) -> bool {
        std::mem::take(&mut self.geometry_dirty)
    }

    /// Relic cells still standing
    pub fn relics_remaining(&self) -> usize {
        self.layout
            .destructibles
            .iter()
            .filter(|r| r.is_relic)
            .count()
    }

    /// Clear a cell and report what it held.
    ///
    /// Out-of-bounds and already-empty cells are no-ops returning `None`.
    /// Hazards are reported, never propagated from here.
    pub fn destroy_tile(&mut self, x: i32, y: i32) -> Option<DestroyedTile> {
        let i = self.layout.index(x, y)?;
        let previous = self.layout.tiles[i];
        if previous == TileKind::Empty {
            return None;
        }
        let record = self.layout.destructibles[i];
        self.clear(i);
        log::trace!("destroyed {:?} at ({}, {})", previous, x, y);

        Some(DestroyedTile {
            x,
            y,
            previous,
            was_relic: record.is_relic,
            hidden_content: record.hidden_content,
            triggered_hazard: record.hazard,
        })
    }

    /// Clear a cell without reading its hazard. Returns whether anything was
    /// cleared. This is the only entry point a cascade may use.
    pub fn destroy_tile_raw(&mut self, x: i32, y: i32) -> bool {
        let Some(i) = self.layout.index(x, y) else {
            return false;
        };
        if self.layout.tiles[i] == TileKind::Empty {
            return false;
        }
        self.clear(i);
        true
    }

    /// Wear down an indestructible cell, destroying it at zero hit points
    pub fn damage_indestructible(&mut self, x: i32, y: i32, amount: u32) -> DamageOutcome {
        let Some(i) = self.layout.index(x, y) else {
            return DamageOutcome::Ignored;
        };
        if self.layout.tiles[i] != TileKind::Indestructible {
            return DamageOutcome::Ignored;
        }

        let record = &mut self.layout.destructibles[i];
        if record.max_hit_points == 0 {
            record.material = Some(MaterialClass::Indestructible);
            record.max_hit_points = DEFAULT_INDESTRUCTIBLE_HP;
            record.hit_points = DEFAULT_INDESTRUCTIBLE_HP;
        }
        record.hit_points = u32::from(record.hit_points).saturating_sub(amount) as u8;
        let remaining = record.hit_points;
        debug_assert!(self.layout.check_invariants().is_ok());

        if remaining > 0 {
            return DamageOutcome::Damaged { remaining };
        }
        match self.destroy_tile(x, y) {
            Some(tile) => DamageOutcome::Destroyed(tile),
            None => DamageOutcome::Ignored,
        }
    }

    /// Boolean form of [`damage_indestructible`](Self::damage_indestructible):
    /// `true` only when this call destroyed the cell.
    pub fn damage_indestructible_tile(&mut self, x: i32, y: i32, amount: u32) -> bool {
        matches!(
            self.damage_indestructible(x, y, amount),
            DamageOutcome::Destroyed(_)
        )
    }

    /// Hit a cell with a weapon of the given tier
    pub fn strike_tile(&mut self, x: i32, y: i32, tier: WeaponTier) -> StrikeOutcome {
        let Some(i) = self.layout.index(x, y) else {
            return StrikeOutcome::Ignored;
        };
        let Some(material) = self.layout.tiles[i].material() else {
            return StrikeOutcome::Ignored;
        };
        if material == MaterialClass::Indestructible {
            return self
                .damage_indestructible(x, y, INDESTRUCTIBLE_STRIKE_DAMAGE)
                .into();
        }
        let Some(hits) = tier.hits_to_break(material) else {
            return StrikeOutcome::Deflected;
        };

        let record = &mut self.layout.destructibles[i];
        let max = record.max_hit_points.max(1);
        let damage = max.div_ceil(hits.max(1));
        record.hit_points = record.hit_points.saturating_sub(damage);
        let remaining = record.hit_points;
        debug_assert!(self.layout.check_invariants().is_ok());

        if remaining > 0 {
            return StrikeOutcome::Damaged { remaining };
        }
        match self.destroy_tile(x, y) {
            Some(tile) => StrikeOutcome::Destroyed(tile),
            None => StrikeOutcome::Ignored,
        }
    }

    fn clear(&mut self, i: usize) {
        self.layout.tiles[i] = TileKind::Empty;
        self.layout.collision[i] = CollisionClass::None;
        self.layout.destructibles[i] = DestructibleRecord::default();
        self.geometry_dirty = true;
        debug_assert!(self.layout.check_invariants().is_ok());
    }
}
