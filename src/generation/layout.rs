//! Generated level layout: the grid and its placement lists

use serde::{Deserialize, Serialize};

use super::tiles::{CollisionClass, DestructibleRecord, TileKind, WeaponTier};
use crate::error::InvariantViolation;

/// Tile coordinate, `y = 0` is the top row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TileCoord {
    pub x: i32,
    pub y: i32,
}

impl TileCoord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Role of a horizontal slice of the level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ZoneKind {
    Intro,
    Traversal,
    Destruction,
    Combat,
    BossArena,
    Buffer,
}

/// Column range `[start_x, end_x)` assigned to one zone kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    pub kind: ZoneKind,
    pub start_x: i32,
    pub end_x: i32,
}

impl Zone {
    pub fn contains_x(&self, x: i32) -> bool {
        x >= self.start_x && x < self.end_x
    }

    pub fn width(&self) -> i32 {
        self.end_x - self.start_x
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyTier {
    Basic,
    Elite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyBehavior {
    Patrol,
    Chase,
    Stationary,
    Flying,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnemyPlacement {
    pub pos: TileCoord,
    pub tier: EnemyTier,
    pub behavior: EnemyBehavior,
    pub patrol_min_x: i32,
    pub patrol_max_x: i32,
    /// Spawns when the player comes close rather than at level start
    pub ambush: bool,
    /// Placed beside a destructible wall it can hide behind
    pub uses_cover: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeaponDrop {
    pub pos: TileCoord,
    pub tier: WeaponTier,
    pub on_primary_path: bool,
    pub hidden: bool,
}

impl EnemyPlacement {
    /// Contribution to the level's difficulty score
    pub fn difficulty_weight(&self) -> f32 {
        let tier = match self.tier {
            EnemyTier::Basic => 0.5,
            EnemyTier::Elite => 1.0,
        };
        let behavior = match self.behavior {
            EnemyBehavior::Stationary => 0.0,
            EnemyBehavior::Patrol => 0.1,
            EnemyBehavior::Chase | EnemyBehavior::Flying => 0.2,
        };
        tier + behavior + if self.ambush { 0.2 } else { 0.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RewardKind {
    HealthSmall,
    HealthLarge,
    AttackBoost,
    SpeedBoost,
    Shield,
    Coin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardDrop {
    pub pos: TileCoord,
    pub kind: RewardKind,
    pub value: u16,
    pub hidden: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CheckpointKind {
    LevelStart,
    MidLevel,
    PreBoss,
    BossArena,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub pos: TileCoord,
    pub kind: CheckpointKind,
}

/// Totals reported alongside a generated level
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LevelMetadata {
    pub difficulty_score: f32,
    pub total_destructible_tiles: usize,
    pub total_relics: usize,
    pub total_enemies: usize,
    pub total_weapon_drops: usize,
    pub total_rewards: usize,
    pub total_checkpoints: usize,
}

/// Immutable output of generation.
///
/// The three grid arrays are row-major with `width * height` entries each.
/// Only [`DestructibleWorldState`](crate::world::DestructibleWorldState)
/// mutates them after generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LevelLayout {
    pub(crate) width: i32,
    pub(crate) height: i32,
    pub(crate) tiles: Vec<TileKind>,
    pub(crate) collision: Vec<CollisionClass>,
    pub(crate) destructibles: Vec<DestructibleRecord>,
    pub(crate) start: TileCoord,
    pub(crate) goal: TileCoord,
    pub(crate) zones: Vec<Zone>,
    pub(crate) enemies: Vec<EnemyPlacement>,
    pub(crate) weapon_drops: Vec<WeaponDrop>,
    pub(crate) rewards: Vec<RewardDrop>,
    pub(crate) checkpoints: Vec<Checkpoint>,
}

impl LevelLayout {
    /// Blank layout, every cell empty
    pub(crate) fn empty(width: i32, height: i32) -> Self {
        let len = cell_count(width, height);
        Self {
            width,
            height,
            tiles: vec![TileKind::Empty; len],
            collision: vec![CollisionClass::None; len],
            destructibles: vec![DestructibleRecord::default(); len],
            start: TileCoord::default(),
            goal: TileCoord::default(),
            zones: Vec::new(),
            enemies: Vec::new(),
            weapon_drops: Vec::new(),
            rewards: Vec::new(),
            checkpoints: Vec::new(),
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    /// Row-major index, `None` when out of bounds
    #[inline]
    pub fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return None;
        }
        Some((y * self.width + x) as usize)
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        self.index(x, y).is_some()
    }

    /// Tile kind, `Empty` out of bounds
    pub fn tile_at(&self, x: i32, y: i32) -> TileKind {
        self.index(x, y).map_or(TileKind::Empty, |i| self.tiles[i])
    }

    /// Collision class, `None` out of bounds
    pub fn collision_at(&self, x: i32, y: i32) -> CollisionClass {
        self.index(x, y)
            .map_or(CollisionClass::None, |i| self.collision[i])
    }

    /// Destructible record, the zero record out of bounds
    pub fn destructible_at(&self, x: i32, y: i32) -> DestructibleRecord {
        self.index(x, y)
            .map_or_else(DestructibleRecord::default, |i| self.destructibles[i])
    }

    pub fn tiles(&self) -> &[TileKind] {
        &self.tiles
    }

    pub fn collision(&self) -> &[CollisionClass] {
        &self.collision
    }

    pub fn destructibles(&self) -> &[DestructibleRecord] {
        &self.destructibles
    }

    pub fn start(&self) -> TileCoord {
        self.start
    }

    pub fn goal(&self) -> TileCoord {
        self.goal
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    pub fn zone_at(&self, x: i32) -> Option<&Zone> {
        self.zones.iter().find(|z| z.contains_x(x))
    }

    pub fn enemies(&self) -> &[EnemyPlacement] {
        &self.enemies
    }

    pub fn weapon_drops(&self) -> &[WeaponDrop] {
        &self.weapon_drops
    }

    pub fn rewards(&self) -> &[RewardDrop] {
        &self.rewards
    }

    pub fn checkpoints(&self) -> &[Checkpoint] {
        &self.checkpoints
    }

    /// Number of cells holding a destructible or indestructible tile
    pub fn destructible_count(&self) -> usize {
        self.tiles.iter().filter(|t| t.is_destructible()).count()
    }

    /// Summary counts plus the composite difficulty score
    pub fn metadata(&self) -> LevelMetadata {
        LevelMetadata {
            difficulty_score: super::validate::difficulty_score(self),
            total_destructible_tiles: self.destructible_count(),
            total_relics: self.destructibles.iter().filter(|r| r.is_relic).count(),
            total_enemies: self.enemies.len(),
            total_weapon_drops: self.weapon_drops.len(),
            total_rewards: self.rewards.len(),
            total_checkpoints: self.checkpoints.len(),
        }
    }

    /// Rewrite the collision array from the tile array
    pub(crate) fn derive_collision(&mut self) {
        self.collision = self.tiles.iter().map(|t| t.collision()).collect();
    }

    /// Verify the grid invariants every consumer relies on
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let len = cell_count(self.width, self.height);
        if self.tiles.len() != len || self.collision.len() != len || self.destructibles.len() != len
        {
            return Err(InvariantViolation::LengthMismatch);
        }
        for (index, ((tile, collision), record)) in self
            .tiles
            .iter()
            .zip(&self.collision)
            .zip(&self.destructibles)
            .enumerate()
        {
            if tile.collision() != *collision {
                return Err(InvariantViolation::CollisionMismatch { index });
            }
            if !tile.is_destructible() && !record.is_zero() {
                return Err(InvariantViolation::StrayRecord { index });
            }
            // A zero record on a destructible cell is unset, not mismatched
            if record.material.is_some() && record.material != tile.material() {
                return Err(InvariantViolation::MaterialMismatch { index });
            }
            if record.hit_points > record.max_hit_points {
                return Err(InvariantViolation::HitPointsExceedMax { index });
            }
        }
        Ok(())
    }

    /// FNV-1a digest over the grid and every placement list
    pub fn content_hash(&self) -> u64 {
        let mut hasher = Fnv1a::new();
        hasher.write_i32(self.width);
        hasher.write_i32(self.height);
        for t in &self.tiles {
            hasher.write_u8(*t as u8);
        }
        for c in &self.collision {
            hasher.write_u8(*c as u8);
        }
        for r in &self.destructibles {
            hasher.write_u8(r.material.map_or(0xFF, |m| m as u8));
            hasher.write_u8(r.hit_points);
            hasher.write_u8(r.max_hit_points);
            hasher.write_u8(r.hazard.map_or(0xFF, |h| h as u8));
            hasher.write_u8(u8::from(r.is_relic));
            hasher.write_u8(r.hidden_content.map_or(0xFF, |h| h as u8));
        }
        hasher.write_coord(self.start);
        hasher.write_coord(self.goal);
        for z in &self.zones {
            hasher.write_u8(z.kind as u8);
            hasher.write_i32(z.start_x);
            hasher.write_i32(z.end_x);
        }
        for e in &self.enemies {
            hasher.write_coord(e.pos);
            hasher.write_u8(e.tier as u8);
            hasher.write_u8(e.behavior as u8);
            hasher.write_i32(e.patrol_min_x);
            hasher.write_i32(e.patrol_max_x);
            hasher.write_u8(u8::from(e.ambush));
            hasher.write_u8(u8::from(e.uses_cover));
        }
        for w in &self.weapon_drops {
            hasher.write_coord(w.pos);
            hasher.write_u8(w.tier as u8);
            hasher.write_u8(u8::from(w.on_primary_path));
            hasher.write_u8(u8::from(w.hidden));
        }
        for r in &self.rewards {
            hasher.write_coord(r.pos);
            hasher.write_u8(r.kind as u8);
            hasher.write_i32(i32::from(r.value));
            hasher.write_u8(u8::from(r.hidden));
        }
        for c in &self.checkpoints {
            hasher.write_coord(c.pos);
            hasher.write_u8(c.kind as u8);
        }
        hasher.finish()
    }

    /// ASCII rendering, one line per row
    pub fn to_ascii(&self) -> String {
        let mut out = String::with_capacity(((self.width + 1) * self.height) as usize);
        for y in 0..self.height {
            for x in 0..self.width {
                let pos = TileCoord::new(x, y);
                let c = if pos == self.start {
                    'S'
                } else if pos == self.goal {
                    'G'
                } else {
                    self.tile_at(x, y).glyph()
                };
                out.push(c);
            }
            out.push('\n');
        }
        out
    }
}

/// `width * height` in `usize`, zero for negative sizes
fn cell_count(width: i32, height: i32) -> usize {
    let w = usize::try_from(width).unwrap_or(0);
    let h = usize::try_from(height).unwrap_or(0);
    w.saturating_mul(h)
}

struct Fnv1a(u64);

impl Fnv1a {
    const OFFSET: u64 = 0xCBF2_9CE4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01B3;

    fn new() -> Self {
        Self(Self::OFFSET)
    }

    fn write_u8(&mut self, b: u8) {
        self.0 ^= u64::from(b);
        self.0 = self.0.wrapping_mul(Self::PRIME);
    }

    fn write_i32(&mut self, v: i32) {
        for b in v.to_le_bytes() {
            self.write_u8(b);
        }
    }

    fn write_coord(&mut self, c: TileCoord) {
        self.write_i32(c.x);
        self.write_i32(c.y);
    }

    fn finish(&self) -> u64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::tiles::MaterialClass;

    #[test]
    fn test_empty_layout_is_consistent() {
        let layout = LevelLayout::empty(10, 4);
        assert_eq!(layout.tiles().len(), 40);
        assert!(layout.check_invariants().is_ok());
        assert_eq!(layout.destructible_count(), 0);
    }

    #[test]
    fn test_out_of_bounds_lookups_default() {
        let layout = LevelLayout::empty(4, 4);
        assert_eq!(layout.index(-1, 0), None);
        assert_eq!(layout.index(4, 0), None);
        assert_eq!(layout.index(0, 4), None);
        assert_eq!(layout.tile_at(-3, 99), TileKind::Empty);
        assert_eq!(layout.collision_at(100, 0), CollisionClass::None);
        assert!(layout.destructible_at(0, -1).is_zero());
    }

    #[test]
    fn test_invariant_detection() {
        let mut layout = LevelLayout::empty(4, 4);
        layout.tiles[5] = TileKind::Ground;
        assert_eq!(
            layout.check_invariants(),
            Err(InvariantViolation::CollisionMismatch { index: 5 })
        );
        layout.derive_collision();
        assert!(layout.check_invariants().is_ok());

        layout.destructibles[2] = DestructibleRecord::new(MaterialClass::Soft, 50);
        assert_eq!(
            layout.check_invariants(),
            Err(InvariantViolation::StrayRecord { index: 2 })
        );

        layout.tiles[2] = TileKind::DestructibleSoft;
        layout.derive_collision();
        layout.destructibles[2].hit_points = 9;
        assert_eq!(
            layout.check_invariants(),
            Err(InvariantViolation::HitPointsExceedMax { index: 2 })
        );

        layout.destructibles.pop();
        assert_eq!(layout.check_invariants(), Err(InvariantViolation::LengthMismatch));
    }

    #[test]
    fn test_invariants_catch_wrong_material() {
        let mut layout = LevelLayout::empty(4, 4);
        layout.tiles[6] = TileKind::DestructibleSoft;
        layout.derive_collision();
        layout.destructibles[6] = DestructibleRecord::new(MaterialClass::Hard, 50);
        layout.destructibles[6].hit_points = 1;
        assert_eq!(
            layout.check_invariants(),
            Err(InvariantViolation::MaterialMismatch { index: 6 })
        );

        layout.destructibles[6] = DestructibleRecord::new(MaterialClass::Soft, 50);
        assert!(layout.check_invariants().is_ok());

        // Unset record on an indestructible cell is tolerated
        layout.tiles[7] = TileKind::Indestructible;
        layout.derive_collision();
        assert!(layout.check_invariants().is_ok());
    }

    #[test]
    fn test_negative_size_is_empty() {
        let layout = LevelLayout::empty(-5, 10);
        assert!(layout.tiles().is_empty());
        assert!(layout.check_invariants().is_ok());
    }

    #[test]
    fn test_metadata_counts() {
        let mut layout = LevelLayout::empty(10, 4);
        layout.tiles[12] = TileKind::DestructibleMedium;
        layout.destructibles[12] = DestructibleRecord {
            is_relic: true,
            ..DestructibleRecord::new(MaterialClass::Medium, 50)
        };
        layout.tiles[13] = TileKind::Indestructible;
        layout.destructibles[13] = DestructibleRecord::new(MaterialClass::Indestructible, 50);
        layout.derive_collision();
        layout.checkpoints.push(Checkpoint {
            pos: TileCoord::new(1, 2),
            kind: CheckpointKind::LevelStart,
        });

        let meta = layout.metadata();
        assert_eq!(meta.total_destructible_tiles, 2);
        assert_eq!(meta.total_relics, 1);
        assert_eq!(meta.total_checkpoints, 1);
        assert_eq!(meta.total_enemies, 0);
        assert!(meta.difficulty_score > 0.0);
    }

    #[test]
    fn test_elite_ambusher_weighs_more() {
        let basic = EnemyPlacement {
            pos: TileCoord::new(0, 0),
            tier: EnemyTier::Basic,
            behavior: EnemyBehavior::Stationary,
            patrol_min_x: 0,
            patrol_max_x: 0,
            ambush: false,
            uses_cover: false,
        };
        let elite = EnemyPlacement {
            tier: EnemyTier::Elite,
            behavior: EnemyBehavior::Chase,
            ambush: true,
            ..basic
        };
        assert!((basic.difficulty_weight() - 0.5).abs() < 1e-6);
        assert!((elite.difficulty_weight() - 1.4).abs() < 1e-6);
    }

    #[test]
    fn test_content_hash_tracks_changes() {
        let a = LevelLayout::empty(8, 8);
        let mut b = a.clone();
        assert_eq!(a.content_hash(), b.content_hash());
        b.tiles[0] = TileKind::Platform;
        assert_ne!(a.content_hash(), b.content_hash());
    }
}
