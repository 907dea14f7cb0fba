//! Playability checks over a generated layout
//!
//! Movement model: a standing cell is a passable cell resting on solid or
//! one-way support. From one standing cell the player reaches any other
//! within [`HORIZONTAL_REACH`] columns and at most [`CLIMB_HEIGHT`] rows
//! higher, provided the columns crossed are open at the higher of the two
//! rows; falls are unlimited. Soft and Medium blocks count as passable since
//! the starting weapon breaks them.

use std::collections::VecDeque;

use serde::Serialize;

use super::layout::{LevelLayout, TileCoord};
use super::tiles::{CollisionClass, MaterialClass, TileKind, WeaponTier};

pub const HORIZONTAL_REACH: i32 = 5;
pub const CLIMB_HEIGHT: i32 = 4;

/// Whether the player can occupy this cell
pub fn is_passable(layout: &LevelLayout, x: i32, y: i32) -> bool {
    if !layout.in_bounds(x, y) {
        return false;
    }
    match layout.tile_at(x, y) {
        TileKind::Empty
        | TileKind::Decorative
        | TileKind::Platform
        | TileKind::DestructibleSoft
        | TileKind::DestructibleMedium => true,
        TileKind::Ground
        | TileKind::GroundTop
        | TileKind::GroundLeft
        | TileKind::GroundRight
        | TileKind::Hazard
        | TileKind::DestructibleHard
        | TileKind::DestructibleReinforced
        | TileKind::Indestructible => false,
    }
}

/// Passable cell with solid or one-way support directly below
pub fn is_standable(layout: &LevelLayout, x: i32, y: i32) -> bool {
    if !is_passable(layout, x, y) {
        return false;
    }
    matches!(
        layout.collision_at(x, y + 1),
        CollisionClass::Solid | CollisionClass::OneWayPlatform
    )
}

/// Breadth-first search over standing cells
pub fn is_reachable(layout: &LevelLayout, from: TileCoord, to: TileCoord) -> bool {
    if !is_standable(layout, from.x, from.y) || !is_standable(layout, to.x, to.y) {
        return false;
    }
    let width = layout.width();
    let height = layout.height();

    // Standing cells grouped by column keep each expansion to a few lookups
    let columns: Vec<Vec<i32>> = (0..width)
        .map(|x| (0..height).filter(|&y| is_standable(layout, x, y)).collect())
        .collect();

    let mut visited = vec![false; (width * height) as usize];
    let mut queue = VecDeque::new();
    if let Some(i) = layout.index(from.x, from.y) {
        visited[i] = true;
    }
    queue.push_back(from);

    while let Some(cur) = queue.pop_front() {
        if cur == to {
            return true;
        }
        let lo = (cur.x - HORIZONTAL_REACH).max(0);
        let hi = (cur.x + HORIZONTAL_REACH).min(width - 1);
        for nx in lo..=hi {
            for &ny in &columns[nx as usize] {
                if ny < cur.y - CLIMB_HEIGHT || !is_open_between(layout, cur.x, nx, cur.y.min(ny)) {
                    continue;
                }
                let Some(i) = layout.index(nx, ny) else {
                    continue;
                };
                if !visited[i] {
                    visited[i] = true;
                    queue.push_back(TileCoord::new(nx, ny));
                }
            }
        }
    }
    false
}

/// Columns after `from_x` up to and including `to_x` are passable at `row`
fn is_open_between(layout: &LevelLayout, from_x: i32, to_x: i32, row: i32) -> bool {
    let step = if to_x >= from_x { 1 } else { -1 };
    let mut x = from_x;
    while x != to_x {
        x += step;
        if !is_passable(layout, x, row) {
            return false;
        }
    }
    true
}

/// Solid or one-way support
fn is_surface(collision: CollisionClass) -> bool {
    matches!(
        collision,
        CollisionClass::Solid | CollisionClass::OneWayPlatform
    )
}

/// Whether any row in column `x` gives something to stand on
fn column_has_surface(layout: &LevelLayout, x: i32) -> bool {
    (0..layout.height()).any(|y| is_surface(layout.collision_at(x, y)))
}

/// Whether some row other than `y` in column `x` is an open cell with
/// support below, so the block at `(x, y)` can be bypassed
fn has_bypass(layout: &LevelLayout, x: i32, y: i32) -> bool {
    (0..layout.height() - 1).filter(|&row| row != y).any(|row| {
        let open = matches!(
            layout.collision_at(x, row),
            CollisionClass::None | CollisionClass::OneWayPlatform
        );
        open && is_surface(layout.collision_at(x, row + 1))
    })
}

/// Walk the level left to right picking up primary-path weapon drops, and
/// check that every block the player cannot bypass is breakable with the
/// tier held by then.
pub fn weapon_progression(layout: &LevelLayout) -> bool {
    let mut drops: Vec<(i32, WeaponTier)> = layout
        .weapon_drops()
        .iter()
        .filter(|w| w.on_primary_path)
        .map(|w| (w.pos.x, w.tier))
        .collect();
    drops.sort_by_key(|&(x, _)| x);

    let mut held = WeaponTier::Starting;
    let mut next = drops.iter().peekable();
    for x in 0..layout.width() {
        while let Some(&(_, tier)) = next.next_if(|&&(dx, _)| dx <= x) {
            held = held.max(tier);
        }
        for y in 0..layout.height() {
            let Some(material) = layout.tile_at(x, y).material() else {
                continue;
            };
            if has_bypass(layout, x, y) {
                continue;
            }
            let breakable = WeaponTier::required_for(material).is_some_and(|needed| needed <= held);
            if !breakable {
                log::debug!("({}, {}): {:?} blocks the path with {:?}", x, y, material, held);
                return false;
            }
        }
    }
    true
}

/// A run of columns with nothing to stand on wider than [`HORIZONTAL_REACH`]
pub fn has_impossible_gap(layout: &LevelLayout) -> bool {
    let mut run = 0;
    for x in 0..layout.width() {
        if column_has_surface(layout, x) {
            run = 0;
        } else {
            run += 1;
            if run > HORIZONTAL_REACH {
                return true;
            }
        }
    }
    false
}

/// Composite difficulty: enemies, gaps, hazard density, reward scarcity and
/// block hardness, each scaled to the level size.
pub fn difficulty_score(layout: &LevelLayout) -> f32 {
    let width = layout.width().max(1) as f32;
    let cells = (layout.tiles().len() as f32).max(1.0);

    let enemy_weight: f32 = layout.enemies().iter().map(|e| e.difficulty_weight()).sum();
    let enemies = enemy_weight / (width / 256.0).max(1.0);

    // Closed gaps only; a run reaching the right edge is not counted
    let mut gaps = 0.0;
    let mut run = 0;
    for x in 0..layout.width() {
        if column_has_surface(layout, x) {
            gaps += (run * run) as f32 * 0.1;
            run = 0;
        } else {
            run += 1;
        }
    }
    let gaps = gaps / (width / 100.0);

    let hazard_cells = layout
        .collision()
        .iter()
        .filter(|&&c| c == CollisionClass::Damaging)
        .count();
    let hazards = hazard_cells as f32 / cells * 1000.0;

    let rewards = layout.rewards().len();
    let scarcity = if rewards > 0 {
        layout.enemies().len() as f32 / rewards as f32
    } else {
        10.0
    };

    let hardness: f32 = layout
        .destructibles()
        .iter()
        .filter_map(|r| r.material)
        .map(|m| match m {
            MaterialClass::Soft => 0.5,
            MaterialClass::Medium => 1.0,
            MaterialClass::Hard => 2.0,
            MaterialClass::Reinforced => 3.0,
            MaterialClass::Indestructible => 4.0,
        })
        .sum();
    let blocks = hardness / cells * 100.0;

    enemies * 0.35 + gaps * 0.20 + hazards * 0.10 + (scarcity * 0.3).min(3.0) * 0.15 + blocks * 0.20
}

/// Outcome of [`validate`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub start_accessible: bool,
    pub goal_accessible: bool,
    pub reachable: bool,
    pub entities_in_bounds: bool,
    /// Weapon drops arrive before the blocks that need them
    pub weapon_progression: bool,
    /// Some gap is wider than the player can jump
    pub impossible_gaps: bool,
    pub checkpoint_count: usize,
}

impl ValidationReport {
    pub fn passed(&self) -> bool {
        self.start_accessible
            && self.goal_accessible
            && self.reachable
            && self.entities_in_bounds
            && self.weapon_progression
            && !self.impossible_gaps
    }
}

/// Full playability check
pub fn validate(layout: &LevelLayout) -> ValidationReport {
    let start = layout.start();
    let goal = layout.goal();
    let in_bounds = |p: TileCoord| layout.in_bounds(p.x, p.y);

    let entities_in_bounds = layout.enemies().iter().all(|e| in_bounds(e.pos))
        && layout.weapon_drops().iter().all(|w| in_bounds(w.pos))
        && layout.rewards().iter().all(|r| in_bounds(r.pos))
        && layout.checkpoints().iter().all(|c| in_bounds(c.pos));

    ValidationReport {
        start_accessible: is_standable(layout, start.x, start.y),
        goal_accessible: is_standable(layout, goal.x, goal.y),
        reachable: is_reachable(layout, start, goal),
        entities_in_bounds,
        weapon_progression: weapon_progression(layout),
        impossible_gaps: has_impossible_gap(layout),
        checkpoint_count: layout.checkpoints().len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::layout::WeaponDrop;

    /// Flat floor on the bottom row of a `w x h` grid
    fn floor(w: i32, h: i32) -> LevelLayout {
        let mut layout = LevelLayout::empty(w, h);
        for x in 0..w {
            let i = layout.index(x, h - 1).unwrap();
            layout.tiles[i] = TileKind::GroundTop;
        }
        layout.derive_collision();
        layout
    }

    fn set(layout: &mut LevelLayout, x: i32, y: i32, kind: TileKind) {
        let i = layout.index(x, y).unwrap();
        layout.tiles[i] = kind;
        layout.derive_collision();
    }

    #[test]
    fn test_standable_needs_support() {
        let layout = floor(8, 6);
        assert!(is_standable(&layout, 3, 4));
        assert!(!is_standable(&layout, 3, 3));
        assert!(!is_standable(&layout, 3, 5));
        assert!(!is_standable(&layout, -1, 4));
    }

    #[test]
    fn test_reachable_on_flat_floor() {
        let layout = floor(20, 6);
        assert!(is_reachable(&layout, TileCoord::new(1, 4), TileCoord::new(18, 4)));
    }

    #[test]
    fn test_wide_hazard_gap_blocks() {
        let mut layout = floor(20, 6);
        for x in 5..12 {
            set(&mut layout, x, 5, TileKind::Hazard);
        }
        assert!(!is_reachable(&layout, TileCoord::new(1, 4), TileCoord::new(18, 4)));
    }

    #[test]
    fn test_narrow_hazard_gap_is_jumpable() {
        let mut layout = floor(20, 6);
        set(&mut layout, 8, 5, TileKind::Hazard);
        set(&mut layout, 9, 5, TileKind::Hazard);
        assert!(is_reachable(&layout, TileCoord::new(1, 4), TileCoord::new(18, 4)));
    }

    #[test]
    fn test_tall_wall_blocks_but_soft_blocks_pass() {
        let mut layout = floor(20, 10);
        for y in 0..9 {
            set(&mut layout, 10, y, TileKind::DestructibleHard);
        }
        assert!(!is_reachable(&layout, TileCoord::new(1, 8), TileCoord::new(18, 8)));

        for y in 0..9 {
            set(&mut layout, 10, y, TileKind::DestructibleSoft);
        }
        assert!(is_reachable(&layout, TileCoord::new(1, 8), TileCoord::new(18, 8)));
    }

    #[test]
    fn test_report_flags_bad_start() {
        let mut layout = floor(10, 6);
        layout.start = TileCoord::new(1, 1);
        layout.goal = TileCoord::new(8, 4);
        let report = validate(&layout);
        assert!(!report.start_accessible);
        assert!(report.goal_accessible);
        assert!(!report.passed());
    }

    /// Column 6 walled from the top row down to the floor
    fn walled(kind: TileKind) -> LevelLayout {
        let mut layout = floor(12, 6);
        for y in 0..5 {
            set(&mut layout, 6, y, kind);
        }
        layout
    }

    fn primary_drop(x: i32, tier: WeaponTier) -> WeaponDrop {
        WeaponDrop {
            pos: TileCoord::new(x, 4),
            tier,
            on_primary_path: true,
            hidden: false,
        }
    }

    #[test]
    fn test_weapon_progression_needs_drop_before_wall() {
        let mut layout = walled(TileKind::DestructibleHard);
        assert!(!weapon_progression(&layout));

        layout.weapon_drops.push(primary_drop(2, WeaponTier::Medium));
        assert!(weapon_progression(&layout));

        // Dropped past the wall is too late
        layout.weapon_drops[0] = primary_drop(9, WeaponTier::Medium);
        assert!(!weapon_progression(&layout));

        // Hidden bonus drops do not count toward progression
        layout.weapon_drops[0] = WeaponDrop {
            on_primary_path: false,
            ..primary_drop(2, WeaponTier::Heavy)
        };
        assert!(!weapon_progression(&layout));
    }

    #[test]
    fn test_weapon_progression_ignores_bypassable_blocks() {
        let mut layout = floor(12, 6);
        set(&mut layout, 6, 4, TileKind::DestructibleReinforced);
        assert!(weapon_progression(&layout));
        assert!(!weapon_progression(&walled(TileKind::Indestructible)));
        assert!(weapon_progression(&walled(TileKind::DestructibleMedium)));
    }

    #[test]
    fn test_impossible_gap_detection() {
        let mut layout = floor(20, 6);
        for x in 5..10 {
            set(&mut layout, x, 5, TileKind::Empty);
        }
        assert!(!has_impossible_gap(&layout));
        set(&mut layout, 10, 5, TileKind::Empty);
        assert!(has_impossible_gap(&layout));
        assert!(validate(&layout).impossible_gaps);

        // A platform anywhere in the column breaks the run
        set(&mut layout, 7, 1, TileKind::Platform);
        assert!(!has_impossible_gap(&layout));
    }

    #[test]
    fn test_difficulty_score_grows_with_hazards_and_gaps() {
        let flat = floor(40, 8);
        let base = difficulty_score(&flat);

        let mut hazardous = flat.clone();
        for x in 10..14 {
            set(&mut hazardous, x, 7, TileKind::Hazard);
        }
        assert!(difficulty_score(&hazardous) > base);

        let mut gappy = flat.clone();
        for x in 10..14 {
            set(&mut gappy, x, 7, TileKind::Empty);
        }
        assert!(difficulty_score(&gappy) > base);
    }

    #[test]
    fn test_generated_levels_pass_extra_checks() {
        for code in ["0-AAAAAAAA", "5-K7XM2P9A", "9-ZZZZZZZZ"] {
            let id = crate::generation::LevelIdentifier::try_parse(code).unwrap();
            let layout = crate::generation::generate(&id);
            let report = validate(&layout);
            assert!(report.weapon_progression, "{code}");
            assert!(!report.impossible_gaps, "{code}");
            assert!(difficulty_score(&layout) > 0.0);
        }
    }
}
