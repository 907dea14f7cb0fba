//! Staged level generation
//!
//! One [`DeterministicStream`] seeded from the identifier drives every
//! decision. Stages run in a fixed order and each consumes the stream in a
//! fixed pattern, so equal identifiers (and equal tuning) give equal layouts.
//!
//! Traversal guarantee: every column keeps a 4-tall corridor above its ground
//! surface that holds only passable cells, and neighbouring surfaces differ by
//! at most [`MAX_STEP`] rows. Hazard strips are at most two columns wide on
//! level ground, and arena pillars are at most three tall.

use super::layout::{
    Checkpoint, CheckpointKind, EnemyBehavior, EnemyPlacement, EnemyTier, LevelLayout, RewardDrop,
    RewardKind, TileCoord, WeaponDrop, Zone, ZoneKind,
};
use super::level_id::LevelIdentifier;
use super::stream::DeterministicStream;
use super::tiles::{
    CollisionClass, DestructibleRecord, HazardKind, HiddenContentKind, MaterialClass, TileKind,
    WeaponTier,
};
use super::validate;
use crate::tuning::{DifficultyProfile, GenerationTuning};

/// Columns between ground height anchors
const ANCHOR_SPACING: i32 = 8;
/// Largest height difference between neighbouring ground columns
pub const MAX_STEP: i32 = 3;
/// Passable rows kept above every ground column
pub const CORRIDOR_HEIGHT: i32 = 4;
/// Rows above ground that destructible fill may occupy
const FILL_HEIGHT: i32 = 6;
/// Columns at each end kept clear for spawn and goal
const SPAWN_CLEARANCE: i32 = 5;
/// No hazard strips this close to either end
const HAZARD_MARGIN: i32 = 8;

/// Zone order with base proportions in per-mille
const ZONE_SEQUENCE: [(ZoneKind, i32); 7] = [
    (ZoneKind::Intro, 100),
    (ZoneKind::Traversal, 200),
    (ZoneKind::Buffer, 50),
    (ZoneKind::Destruction, 250),
    (ZoneKind::Combat, 200),
    (ZoneKind::Buffer, 50),
    (ZoneKind::BossArena, 150),
];

const MATERIALS: [MaterialClass; 5] = [
    MaterialClass::Soft,
    MaterialClass::Medium,
    MaterialClass::Hard,
    MaterialClass::Reinforced,
    MaterialClass::Indestructible,
];

const HIDDEN_CONTENT: [(HiddenContentKind, u32); 4] = [
    (HiddenContentKind::Pathway, 3),
    (HiddenContentKind::Bridge, 2),
    (HiddenContentKind::Stairs, 2),
    (HiddenContentKind::Secret, 1),
];

const SECRET_REWARDS: [(RewardKind, u32); 4] = [
    (RewardKind::Coin, 4),
    (RewardKind::AttackBoost, 2),
    (RewardKind::SpeedBoost, 2),
    (RewardKind::Shield, 1),
];

/// Material weights `[Soft, Medium, Hard, Reinforced, Indestructible]`.
/// Later epochs and higher difficulties shift weight toward harder blocks.
fn material_weights(epoch: u8, difficulty: u8) -> [u32; 5] {
    let e = u32::from(epoch);
    let d = u32::from(difficulty);
    [
        (50 - 4 * e).saturating_sub(5 * d).max(10),
        30,
        10 + 3 * e + 3 * d,
        2 + 2 * e + d,
        3 + 2 * d,
    ]
}

/// Level generator with its tuning
#[derive(Debug, Clone, Default)]
pub struct LevelGenerator {
    tuning: GenerationTuning,
}

impl LevelGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tuning(tuning: GenerationTuning) -> Self {
        Self { tuning }
    }

    pub fn tuning(&self) -> &GenerationTuning {
        &self.tuning
    }

    /// Build the layout for an identifier. Total over valid identifiers.
    pub fn generate(&self, id: &LevelIdentifier) -> LevelLayout {
        let (width, height) = self.tuning.dimensions(id.epoch(), id.difficulty());
        let mut build = Build::new(id, &self.tuning, width, height);

        build.zones();
        build.ground_profile();
        build.ground_fill();
        build.destructible_fill();
        build.primary_corridor();
        build.branch_paths();
        build.platforms();
        build.hazard_strips();
        build.boss_arena();
        build.decorations();
        build.clear_spawn_and_goal();
        build.edge_tiles();
        build.cell_traits();
        build.layout.derive_collision();
        log::debug!(
            "{}: terrain done, {} destructible cells",
            id,
            build.layout.destructible_count()
        );

        build.ensure_reachable();
        build.checkpoints();
        build.weapon_drops();
        build.enemies();
        build.rewards();

        let layout = build.layout;
        debug_assert!(layout.check_invariants().is_ok());
        log::info!(
            "Generated {} ({} / {}): {}x{}, {} enemies, {} weapons, {} rewards, {} checkpoints",
            id,
            id.epoch_name(),
            id.difficulty_name(),
            layout.width(),
            layout.height(),
            layout.enemies().len(),
            layout.weapon_drops().len(),
            layout.rewards().len(),
            layout.checkpoints().len()
        );
        layout
    }
}

/// Generate with default tuning
pub fn generate(id: &LevelIdentifier) -> LevelLayout {
    LevelGenerator::new().generate(id)
}

/// Working state for one generation run
struct Build<'a> {
    id: &'a LevelIdentifier,
    tuning: &'a GenerationTuning,
    stream: DeterministicStream,
    layout: LevelLayout,
    /// Row of the ground surface per column
    surface: Vec<i32>,
    max_surface: i32,
    boss_start: i32,
    /// Reward spots at the far end of gated branches
    branch_ends: Vec<TileCoord>,
}

impl<'a> Build<'a> {
    fn new(id: &'a LevelIdentifier, tuning: &'a GenerationTuning, width: i32, height: i32) -> Self {
        Self {
            id,
            tuning,
            stream: DeterministicStream::new(id.generation_seed()),
            layout: LevelLayout::empty(width, height),
            surface: Vec::new(),
            max_surface: 0,
            boss_start: width,
            branch_ends: Vec::new(),
        }
    }

    fn width(&self) -> i32 {
        self.layout.width
    }

    fn height(&self) -> i32 {
        self.layout.height
    }

    fn tile(&self, x: i32, y: i32) -> TileKind {
        self.layout.tile_at(x, y)
    }

    fn set(&mut self, x: i32, y: i32, kind: TileKind) {
        if let Some(i) = self.layout.index(x, y) {
            self.layout.tiles[i] = kind;
        }
    }

    fn surface_at(&self, x: i32) -> i32 {
        let clamped = x.clamp(0, self.width() - 1);
        self.surface[clamped as usize]
    }

    /// Standing cell on top of the ground in column `x`
    fn stand(&self, x: i32) -> TileCoord {
        TileCoord::new(x, self.surface_at(x) - 1)
    }

    fn zone_kind(&self, x: i32) -> Option<ZoneKind> {
        self.layout.zone_at(x).map(|z| z.kind)
    }

    fn is_hazard_column(&self, x: i32) -> bool {
        self.tile(x, self.surface_at(x)) == TileKind::Hazard
    }

    /// Nearest column at or right of `x` whose ground is not a hazard
    fn safe_column(&self, x: i32) -> i32 {
        (x..x + 4)
            .find(|&cx| !self.is_hazard_column(cx))
            .unwrap_or(x)
            .min(self.width() - 1)
    }

    fn zones(&mut self) {
        let width = self.width();
        let weights: Vec<i32> = ZONE_SEQUENCE
            .iter()
            .map(|&(kind, base)| match kind {
                ZoneKind::Buffer => base,
                _ => base + self.stream.range_i32(-20, 21),
            })
            .collect();
        let total: i32 = weights.iter().sum();
        let last = ZONE_SEQUENCE.len() - 1;

        let mut x = 0;
        for (i, (&(kind, _), &weight)) in ZONE_SEQUENCE.iter().zip(&weights).enumerate() {
            let end = if i == last {
                width
            } else {
                let remaining = (last - i) as i32 * 2;
                (x + (width * weight / total).max(2)).min(width - remaining)
            };
            self.layout.zones.push(Zone {
                kind,
                start_x: x,
                end_x: end,
            });
            x = end;
        }
        self.boss_start = self.layout.zones[last].start_x;
        log::debug!("{}: zones {:?}", self.id, self.layout.zones);
    }

    fn ground_profile(&mut self) {
        let (width, height) = (self.width(), self.height());
        let depth = self.tuning.ground_depth.clamp(1, height / 3);
        let max_surface = height - 1 - depth;
        let min_surface = (max_surface - 5).max(5);
        self.max_surface = max_surface;

        let anchor_count = (width / ANCHOR_SPACING + 2) as usize;
        let anchors: Vec<i32> = (0..anchor_count)
            .map(|_| self.stream.range_i32(min_surface, max_surface + 1))
            .collect();

        let mut surface: Vec<i32> = (0..width)
            .map(|x| {
                let a = (x / ANCHOR_SPACING) as usize;
                let t = x % ANCHOR_SPACING;
                let (y0, y1) = (anchors[a], anchors[a + 1]);
                y0 + (y1 - y0) * t / ANCHOR_SPACING
            })
            .collect();

        // Flat boss floor, then ramp the approach so no step exceeds MAX_STEP
        for y in surface.iter_mut().skip(self.boss_start as usize) {
            *y = max_surface;
        }
        for x in (0..surface.len().saturating_sub(1)).rev() {
            let next = surface[x + 1];
            surface[x] = surface[x].clamp(next - MAX_STEP, next + MAX_STEP);
        }
        self.surface = surface;
    }

    fn ground_fill(&mut self) {
        for x in 0..self.width() {
            let top = self.surface_at(x);
            self.set(x, top, TileKind::GroundTop);
            for y in top + 1..self.height() {
                self.set(x, y, TileKind::Ground);
            }
        }
    }

    fn destructible_fill(&mut self) {
        let density = self.tuning.density(self.id.difficulty());
        let weights = material_weights(self.id.epoch(), self.id.difficulty());
        let width = self.width();

        for zone in self.layout.zones.clone() {
            let zone_density = match zone.kind {
                ZoneKind::Destruction => density,
                ZoneKind::Combat => density * 0.5,
                ZoneKind::Traversal => density * 0.3,
                ZoneKind::Intro | ZoneKind::Buffer | ZoneKind::BossArena => continue,
            };
            let lo = zone.start_x.max(SPAWN_CLEARANCE);
            let hi = zone.end_x.min(width - SPAWN_CLEARANCE);
            for x in lo..hi {
                let ground = self.surface_at(x);
                for y in (ground - FILL_HEIGHT).max(1)..ground {
                    if self.stream.chance(zone_density) {
                        let material = MATERIALS[self.stream.weighted_index(&weights)];
                        self.set(x, y, TileKind::from_material(material));
                    }
                }
            }
        }
    }

    /// Soften anything the starting weapon cannot break inside the corridor
    fn primary_corridor(&mut self) {
        for x in 0..self.width() {
            let ground = self.surface_at(x);
            for y in (ground - CORRIDOR_HEIGHT).max(0)..ground {
                let breakable = matches!(
                    self.tile(x, y).material(),
                    None | Some(MaterialClass::Soft) | Some(MaterialClass::Medium)
                );
                if !breakable {
                    let kind = if self.stream.chance(0.6) {
                        TileKind::DestructibleSoft
                    } else {
                        TileKind::DestructibleMedium
                    };
                    self.set(x, y, kind);
                }
            }
        }
    }

    /// Elevated platform runs above the corridor with a hard gate at the far end
    fn branch_paths(&mut self) {
        let difficulty = u32::from(self.id.difficulty());
        for zone in self.layout.zones.clone() {
            if !matches!(zone.kind, ZoneKind::Traversal | ZoneKind::Destruction) || zone.width() < 14 {
                continue;
            }
            let len = self.stream.range_i32(6, 11);
            let start = self.stream.range_i32(zone.start_x + 2, zone.end_x - len - 1);
            let min_ground = (start..start + len)
                .map(|x| self.surface_at(x))
                .min()
                .unwrap_or(self.max_surface);
            let row = min_ground - CORRIDOR_HEIGHT - 1;
            if row < 3 {
                continue;
            }

            for x in start..start + len {
                self.set(x, row, TileKind::Platform);
                self.set(x, row - 1, TileKind::Empty);
                self.set(x, row - 2, TileKind::Empty);
            }
            // Step up onto the branch from the corridor
            let step_x = start - 1;
            if row + 2 < self.surface_at(step_x) {
                self.set(step_x, row + 2, TileKind::Platform);
            }

            let gate_x = start + len - 2;
            let gate = if self.stream.weighted_index(&[3, 1 + difficulty]) == 0 {
                TileKind::DestructibleHard
            } else {
                TileKind::DestructibleReinforced
            };
            self.set(gate_x, row - 1, gate);
            self.set(gate_x, row - 2, gate);
            self.branch_ends.push(TileCoord::new(start + len - 1, row - 1));
        }
    }

    fn platforms(&mut self) {
        let mut x = SPAWN_CLEARANCE + 2;
        while x < self.boss_start - 2 {
            let candidate = matches!(
                self.zone_kind(x),
                Some(ZoneKind::Traversal | ZoneKind::Combat)
            );
            if candidate && self.stream.chance(self.tuning.platform_chance) {
                let len = self.stream.range_i32(3, 6);
                let row = self.surface_at(x) - CORRIDOR_HEIGHT - 1 - self.stream.range_i32(0, 2);
                let fits = row >= 2
                    && x + len < self.boss_start
                    && (x..x + len).all(|px| self.tile(px, row) == TileKind::Empty);
                if fits {
                    for px in x..x + len {
                        self.set(px, row, TileKind::Platform);
                    }
                }
                x += len + 2;
            } else {
                x += 1;
            }
        }
    }

    /// Damaging strips of one or two columns on level ground
    fn hazard_strips(&mut self) {
        let difficulty = i32::from(self.id.difficulty());
        let width = self.width();
        for zone in self.layout.zones.clone() {
            if !matches!(
                zone.kind,
                ZoneKind::Traversal | ZoneKind::Destruction | ZoneKind::Combat
            ) {
                continue;
            }
            let count = self.stream.range_i32(0, 2 + difficulty);
            for _ in 0..count {
                let len = self.stream.range_i32(1, 3);
                let x0 = self.stream.range_i32(zone.start_x + 1, zone.end_x - len - 1);
                let (before, after) = (x0 - 1, x0 + len);
                if before < HAZARD_MARGIN || after >= width - HAZARD_MARGIN || after >= self.boss_start {
                    continue;
                }
                let ground = self.surface_at(before);
                let level = (before..=after).all(|x| self.surface_at(x) == ground);
                let clear = (before..=after).all(|x| self.tile(x, ground) == TileKind::GroundTop);
                if level && clear {
                    for x in x0..after {
                        self.set(x, ground, TileKind::Hazard);
                    }
                }
            }
        }
    }

    /// Pillars and platforms for the final fight
    fn boss_arena(&mut self) {
        let difficulty = i32::from(self.id.difficulty());
        let floor = self.max_surface;
        let lo = self.boss_start + 3;
        let hi = self.width() - SPAWN_CLEARANCE - 1;

        let pillars = 2 + difficulty;
        let spacing = (hi - lo) / (pillars + 1);
        if spacing >= 2 {
            for k in 1..=pillars {
                let x = lo + spacing * k;
                let height = self.stream.range_i32(1, 4);
                let material = MATERIALS[1 + self.stream.weighted_index(&[2, 2, 1, 1])];
                for y in floor - height..floor {
                    self.set(x, y, TileKind::from_material(material));
                }
            }
        }

        for _ in 0..3 + difficulty {
            let len = 3;
            if hi - lo <= len {
                break;
            }
            let x = self.stream.range_i32(lo, hi - len);
            let row = floor - CORRIDOR_HEIGHT - 1 - self.stream.range_i32(0, 3);
            if row < 2 {
                continue;
            }
            for px in x..x + len {
                if self.tile(px, row) == TileKind::Empty {
                    self.set(px, row, TileKind::Platform);
                }
            }
        }
    }

    fn decorations(&mut self) {
        let chance = self.tuning.decoration_chance;
        for x in 0..self.width() {
            for y in 1..self.surface_at(x) {
                let rests_on_solid = self.tile(x, y + 1).collision() == CollisionClass::Solid;
                if self.tile(x, y) == TileKind::Empty && rests_on_solid && self.stream.chance(chance) {
                    self.set(x, y, TileKind::Decorative);
                }
            }
        }
    }

    fn clear_spawn_and_goal(&mut self) {
        let width = self.width();
        let columns = (0..SPAWN_CLEARANCE).chain(width - SPAWN_CLEARANCE..width);
        for x in columns {
            for y in 0..self.surface_at(x) {
                self.set(x, y, TileKind::Empty);
            }
        }
        self.layout.start = self.stand(2);
        self.layout.goal = self.stand(width - 3);
    }

    /// Ground cells exposed on one side become left or right edges
    fn edge_tiles(&mut self) {
        let exposed = |kind: TileKind| !kind.is_ground() && kind != TileKind::Hazard;
        for y in 0..self.height() {
            for x in 0..self.width() {
                if self.tile(x, y) != TileKind::Ground {
                    continue;
                }
                let left_open = x > 0 && exposed(self.tile(x - 1, y));
                let right_open = x < self.width() - 1 && exposed(self.tile(x + 1, y));
                if left_open {
                    self.set(x, y, TileKind::GroundLeft);
                } else if right_open {
                    self.set(x, y, TileKind::GroundRight);
                }
            }
        }
    }

    /// Destructible records plus relic, hidden content and hazard rolls
    fn cell_traits(&mut self) {
        let tuning = self.tuning;
        let hidden_weights: Vec<u32> = HIDDEN_CONTENT.iter().map(|&(_, w)| w).collect();
        for y in 0..self.height() {
            for x in 0..self.width() {
                let Some(i) = self.layout.index(x, y) else {
                    continue;
                };
                let Some(material) = self.layout.tiles[i].material() else {
                    continue;
                };
                let mut record = DestructibleRecord::new(material, tuning.indestructible_hp);
                if material != MaterialClass::Indestructible {
                    record.is_relic = self.stream.chance(tuning.relic_chance);

                    let open = [(x - 1, y), (x + 1, y), (x, y - 1), (x, y + 1)]
                        .iter()
                        .any(|&(nx, ny)| {
                            self.layout.in_bounds(nx, ny) && self.tile(nx, ny) == TileKind::Empty
                        });
                    let hidden_chance = match self.zone_kind(x) {
                        Some(ZoneKind::Destruction) => tuning.hidden_content_chance * 2.0,
                        _ => tuning.hidden_content_chance,
                    };
                    if open && self.stream.chance(hidden_chance) {
                        let pick = self.stream.weighted_index(&hidden_weights);
                        record.hidden_content = Some(HIDDEN_CONTENT[pick].0);
                    }
                    if self.stream.chance(tuning.hazard_chance) {
                        record.hazard = Some(HazardKind::ALL[self.stream.index(HazardKind::ALL.len())]);
                    }
                }
                self.layout.destructibles[i] = record;
            }
        }
    }

    /// Fall back to a plain corridor if the start cannot reach the goal
    fn ensure_reachable(&mut self) {
        let (start, goal) = (self.layout.start, self.layout.goal);
        if validate::is_reachable(&self.layout, start, goal) {
            return;
        }
        log::warn!("{}: start cannot reach goal, carving repair corridor", self.id);

        for x in 0..self.width() {
            let ground = self.surface_at(x);
            if self.tile(x, ground) == TileKind::Hazard {
                self.set(x, ground, TileKind::GroundTop);
            }
            for y in (ground - CORRIDOR_HEIGHT).max(0)..ground {
                if !validate::is_passable(&self.layout, x, y) {
                    if let Some(i) = self.layout.index(x, y) {
                        self.layout.tiles[i] = TileKind::Empty;
                        self.layout.destructibles[i] = DestructibleRecord::default();
                    }
                }
            }
        }
        self.layout.derive_collision();
    }

    fn checkpoints(&mut self) {
        let interval = self.tuning.checkpoint_interval.max(1);
        let mut points = vec![Checkpoint {
            pos: self.layout.start,
            kind: CheckpointKind::LevelStart,
        }];

        let mut x = interval;
        while x < self.boss_start - 8 {
            points.push(Checkpoint {
                pos: self.stand(self.safe_column(x)),
                kind: CheckpointKind::MidLevel,
            });
            x += interval;
        }
        points.push(Checkpoint {
            pos: self.stand(self.safe_column((self.boss_start - 3).max(SPAWN_CLEARANCE))),
            kind: CheckpointKind::PreBoss,
        });
        points.push(Checkpoint {
            pos: self.stand((self.boss_start + 1).min(self.width() - 1)),
            kind: CheckpointKind::BossArena,
        });
        self.layout.checkpoints = points;
    }

    fn weapon_drops(&mut self) {
        let mut current = WeaponTier::Starting;
        for x in SPAWN_CLEARANCE..self.boss_start {
            let needed = (0..self.height())
                .filter_map(|y| self.tile(x, y).material())
                .filter_map(WeaponTier::required_for)
                .max();
            if let Some(tier) = needed {
                if tier > current {
                    let drop_x = self.safe_column((x - 3).max(SPAWN_CLEARANCE));
                    self.layout.weapon_drops.push(WeaponDrop {
                        pos: self.stand(drop_x),
                        tier,
                        on_primary_path: true,
                        hidden: false,
                    });
                    current = tier;
                }
            }
        }

        // Bonus drops buried in breakable blocks above the corridor
        let bonus_tier = if self.id.difficulty() >= 2 {
            WeaponTier::Heavy
        } else {
            WeaponTier::Medium
        };
        for zone in self.layout.zones.clone() {
            if !matches!(zone.kind, ZoneKind::Destruction | ZoneKind::Combat) {
                continue;
            }
            if !self.stream.chance(0.3) {
                continue;
            }
            let spots: Vec<TileCoord> = (zone.start_x..zone.end_x)
                .flat_map(|x| {
                    let top = self.surface_at(x) - CORRIDOR_HEIGHT;
                    (0..top).map(move |y| TileCoord::new(x, y))
                })
                .filter(|p| {
                    matches!(
                        self.tile(p.x, p.y).material(),
                        Some(MaterialClass::Soft | MaterialClass::Medium | MaterialClass::Hard)
                    )
                })
                .collect();
            if spots.is_empty() {
                continue;
            }
            let pos = spots[self.stream.index(spots.len())];
            self.layout.weapon_drops.push(WeaponDrop {
                pos,
                tier: bonus_tier,
                on_primary_path: false,
                hidden: true,
            });
        }
    }

    fn enemies(&mut self) {
        let difficulty = self.id.difficulty();
        let profile = DifficultyProfile::for_epoch(self.id.epoch());
        let base = self.tuning.enemy_count(difficulty);
        let count = ((base as f32 * profile.enemy_count_multiplier).round() as usize)
            .min(self.width() as usize);

        let candidates: Vec<Zone> = self
            .layout
            .zones
            .iter()
            .copied()
            .filter(|z| {
                matches!(
                    z.kind,
                    ZoneKind::Traversal | ZoneKind::Destruction | ZoneKind::Combat
                ) && z.width() > 2
            })
            .collect();
        if candidates.is_empty() {
            return;
        }
        let weights: Vec<u32> = candidates
            .iter()
            .map(|z| match z.kind {
                ZoneKind::Combat => 4,
                _ => 2,
            })
            .collect();
        let elite_chance = 0.05 + 0.05 * f32::from(difficulty) + 0.01 * f32::from(self.id.epoch());

        for _ in 0..count {
            let zone = candidates[self.stream.weighted_index(&weights)];
            let x = self.stream.range_i32(zone.start_x + 1, zone.end_x - 1);
            let stand = self.stand(x);
            if x < SPAWN_CLEARANCE * 2
                || self.is_hazard_column(x)
                || self.tile(stand.x, stand.y) != TileKind::Empty
            {
                continue;
            }

            let tier = if self.stream.chance(elite_chance) {
                EnemyTier::Elite
            } else {
                EnemyTier::Basic
            };
            let (behavior, pos) = if self.stream.chance(0.15) {
                let y = (stand.y - CORRIDOR_HEIGHT + 1).max(1);
                (EnemyBehavior::Flying, TileCoord::new(x, y))
            } else {
                let behavior = match self.stream.weighted_index(&[5, 3, 2]) {
                    0 => EnemyBehavior::Patrol,
                    1 => EnemyBehavior::Chase,
                    _ => EnemyBehavior::Stationary,
                };
                (behavior, stand)
            };
            let (patrol_min_x, patrol_max_x) = self.patrol_bounds(x);
            let ambush = zone.kind == ZoneKind::Combat && self.stream.chance(0.15);
            let uses_cover = self.tile(x - 1, stand.y).is_destructible()
                || self.tile(x + 1, stand.y).is_destructible();

            self.layout.enemies.push(EnemyPlacement {
                pos,
                tier,
                behavior,
                patrol_min_x,
                patrol_max_x,
                ambush,
                uses_cover,
            });
        }
    }

    /// Walkable span around `x` on the same ground height, at most 6 each way
    fn patrol_bounds(&self, x: i32) -> (i32, i32) {
        let ground = self.surface_at(x);
        let walkable = |cx: i32| {
            cx >= 0
                && cx < self.width()
                && self.surface_at(cx) == ground
                && !self.is_hazard_column(cx)
        };
        let mut lo = x;
        while lo > x - 6 && walkable(lo - 1) {
            lo -= 1;
        }
        let mut hi = x;
        while hi < x + 6 && walkable(hi + 1) {
            hi += 1;
        }
        (lo, hi)
    }

    fn rewards(&mut self) {
        let interval = self.tuning.reward_interval.max(1);
        let mut rewards = Vec::new();

        let mut x = interval;
        let mut n = 0;
        while x < self.boss_start {
            let cx = self.safe_column(x);
            let pos = self.stand(cx);
            if matches!(self.tile(pos.x, pos.y), TileKind::Empty | TileKind::Decorative) {
                let (kind, value) = if n % 3 == 2 {
                    (RewardKind::HealthLarge, 3)
                } else {
                    (RewardKind::HealthSmall, 1)
                };
                rewards.push(RewardDrop {
                    pos,
                    kind,
                    value,
                    hidden: false,
                });
                n += 1;
            }
            x += interval;
        }

        for zone in self.layout.zones.iter().filter(|z| z.kind == ZoneKind::Combat) {
            rewards.push(RewardDrop {
                pos: self.stand(self.safe_column(zone.end_x - 1)),
                kind: RewardKind::HealthLarge,
                value: 3,
                hidden: false,
            });
        }

        for &pos in &self.branch_ends {
            rewards.push(RewardDrop {
                pos,
                kind: RewardKind::AttackBoost,
                value: 1,
                hidden: false,
            });
        }

        let secret_weights: Vec<u32> = SECRET_REWARDS.iter().map(|&(_, w)| w).collect();
        for y in 0..self.height() {
            for x in 0..self.width() {
                let record = self.layout.destructible_at(x, y);
                if record.hidden_content != Some(HiddenContentKind::Secret) {
                    continue;
                }
                let kind = SECRET_REWARDS[self.stream.weighted_index(&secret_weights)].0;
                let value = if kind == RewardKind::Coin { 100 } else { 1 };
                rewards.push(RewardDrop {
                    pos: TileCoord::new(x, y),
                    kind,
                    value,
                    hidden: true,
                });
            }
        }
        self.layout.rewards = rewards;
    }
}
