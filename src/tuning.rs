//! Data-driven generation tuning
//!
//! Everything here shapes how a level looks, never whether it is valid.
//! Loaded from JSON; unknown or missing fields fall back to defaults.

use serde::{Deserialize, Serialize};

use crate::consts::{MAX_GRID_HEIGHT, MAX_GRID_WIDTH, MIN_GRID_HEIGHT, MIN_GRID_WIDTH};
use crate::error::TuningError;
use crate::generation::level_id::{MAX_DIFFICULTY, MAX_EPOCH};

/// Most enemies a tuning may ask for before epoch scaling
const MAX_ENEMY_COUNT: u32 = 1000;

/// Generation knobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationTuning {
    // === Grid size ===
    /// Level width at epoch 0, difficulty 0
    pub base_width: i32,
    /// Extra columns per difficulty step
    pub width_per_difficulty: i32,
    /// Extra columns per epoch
    pub width_per_epoch: i32,
    /// Level height in tiles
    pub height: i32,
    /// Solid rows kept below the lowest ground surface
    pub ground_depth: i32,

    // === Fill ===
    /// Chance a cell above ground in a destruction zone gets a block
    pub destructible_density: f32,
    /// Added to the density per difficulty step
    pub density_per_difficulty: f32,
    /// Chance a platform run starts at a candidate column
    pub platform_chance: f32,
    /// Chance an empty air cell gets decorative dressing
    pub decoration_chance: f32,

    // === Cell traits ===
    pub relic_chance: f32,
    pub hazard_chance: f32,
    pub hidden_content_chance: f32,
    /// Hit points of an indestructible block
    pub indestructible_hp: u8,

    // === Placements ===
    pub enemy_base_count: u32,
    pub enemies_per_difficulty: u32,
    /// Columns between periodic health pickups
    pub reward_interval: i32,
    /// Columns between mid-level checkpoints
    pub checkpoint_interval: i32,
}

impl Default for GenerationTuning {
    fn default() -> Self {
        Self {
            base_width: 256,
            width_per_difficulty: 16,
            width_per_epoch: 4,
            height: 16,
            ground_depth: 3,

            destructible_density: 0.35,
            density_per_difficulty: 0.05,
            platform_chance: 0.18,
            decoration_chance: 0.04,

            relic_chance: 0.06,
            hazard_chance: 0.08,
            hidden_content_chance: 0.05,
            indestructible_hp: 50,

            enemy_base_count: 6,
            enemies_per_difficulty: 3,
            reward_interval: 32,
            checkpoint_interval: 64,
        }
    }
}

impl GenerationTuning {
    /// Parse and validate tuning JSON
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Self = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn to_json(&self) -> Result<String, TuningError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values generation cannot work with
    pub fn validate(&self) -> Result<(), TuningError> {
        let probabilities = [
            ("destructible_density", self.destructible_density),
            ("density_per_difficulty", self.density_per_difficulty),
            ("platform_chance", self.platform_chance),
            ("decoration_chance", self.decoration_chance),
            ("relic_chance", self.relic_chance),
            ("hazard_chance", self.hazard_chance),
            ("hidden_content_chance", self.hidden_content_chance),
        ];
        for (field, p) in probabilities {
            if !(0.0..=1.0).contains(&p) {
                return Err(TuningError::Invalid {
                    field,
                    reason: "must be within [0, 1]",
                });
            }
        }
        if self.indestructible_hp == 0 {
            return Err(TuningError::Invalid {
                field: "indestructible_hp",
                reason: "must be at least 1",
            });
        }
        if self.reward_interval <= 0 {
            return Err(TuningError::Invalid {
                field: "reward_interval",
                reason: "must be positive",
            });
        }
        if self.checkpoint_interval <= 0 {
            return Err(TuningError::Invalid {
                field: "checkpoint_interval",
                reason: "must be positive",
            });
        }
        if self.ground_depth < 1 {
            return Err(TuningError::Invalid {
                field: "ground_depth",
                reason: "must be at least 1",
            });
        }
        if self.height > MAX_GRID_HEIGHT {
            return Err(TuningError::Invalid {
                field: "height",
                reason: "exceeds the maximum grid height",
            });
        }
        let too_wide = (0..=MAX_EPOCH).any(|epoch| {
            (0..=MAX_DIFFICULTY)
                .any(|difficulty| self.raw_width(epoch, difficulty) > MAX_GRID_WIDTH)
        });
        if too_wide {
            return Err(TuningError::Invalid {
                field: "base_width",
                reason: "grid width exceeds the maximum for some epoch or difficulty",
            });
        }
        if self.enemy_count(MAX_DIFFICULTY) > MAX_ENEMY_COUNT {
            return Err(TuningError::Invalid {
                field: "enemy_base_count",
                reason: "too many enemies",
            });
        }
        Ok(())
    }

    fn raw_width(&self, epoch: u8, difficulty: u8) -> i32 {
        self.base_width
            .saturating_add(self.width_per_difficulty.saturating_mul(i32::from(difficulty)))
            .saturating_add(self.width_per_epoch.saturating_mul(i32::from(epoch)))
    }

    /// Grid size for a level, clamped to the supported range so generation
    /// stays total even for tuning that skipped [`validate`](Self::validate).
    /// Pure; never touches the level's stream.
    pub fn dimensions(&self, epoch: u8, difficulty: u8) -> (i32, i32) {
        (
            self.raw_width(epoch, difficulty).clamp(MIN_GRID_WIDTH, MAX_GRID_WIDTH),
            self.height.clamp(MIN_GRID_HEIGHT, MAX_GRID_HEIGHT),
        )
    }

    /// Enemy count before epoch scaling
    pub fn enemy_count(&self, difficulty: u8) -> u32 {
        self.enemy_base_count
            .saturating_add(self.enemies_per_difficulty.saturating_mul(u32::from(difficulty)))
    }

    /// Block density for a difficulty, capped below full
    pub fn density(&self, difficulty: u8) -> f32 {
        (self.destructible_density + self.density_per_difficulty * f32::from(difficulty)).min(0.9)
    }
}

/// Per-epoch enemy and boss scaling
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyProfile {
    pub enemy_count_multiplier: f32,
    pub enemy_hp_multiplier: f32,
    pub enemy_speed_multiplier: f32,
    /// Share of enemies that shoot
    pub shooter_share: f32,
    pub boss_hp: u32,
}

/// (epoch, count, hp, speed, shooters, boss hp)
const PROFILE_POINTS: [(f32, f32, f32, f32, f32, f32); 4] = [
    (0.0, 0.50, 0.70, 0.80, 0.40, 100.0),
    (3.0, 0.80, 1.00, 0.95, 0.60, 160.0),
    (6.0, 0.95, 1.20, 1.05, 0.70, 220.0),
    (9.0, 1.00, 1.50, 1.20, 0.85, 280.0),
];

impl DifficultyProfile {
    /// Linear interpolation between epoch control points
    pub fn for_epoch(epoch: u8) -> Self {
        let e = f32::from(epoch.min(9));
        let lower = PROFILE_POINTS
            .iter()
            .rposition(|p| p.0 <= e)
            .unwrap_or(0);
        let upper = (lower + 1).min(PROFILE_POINTS.len() - 1);
        let (a, b) = (PROFILE_POINTS[lower], PROFILE_POINTS[upper]);
        let t = if b.0 > a.0 { (e - a.0) / (b.0 - a.0) } else { 0.0 };
        let lerp = |x: f32, y: f32| x + (y - x) * t;

        Self {
            enemy_count_multiplier: lerp(a.1, b.1),
            enemy_hp_multiplier: lerp(a.2, b.2),
            enemy_speed_multiplier: lerp(a.3, b.3),
            shooter_share: lerp(a.4, b.4),
            boss_hp: lerp(a.5, b.5) as u32,
        }
    }
}
