//! Closed tile, collision, material and hazard vocabularies
//!
//! Every consumer matches on these exhaustively, so adding a variant forces
//! each mapping below to be revisited.

use serde::{Deserialize, Serialize};

/// Structural kind of one grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TileKind {
    #[default]
    Empty,
    Ground,
    GroundTop,
    GroundLeft,
    GroundRight,
    Platform,
    Hazard,
    Decorative,
    DestructibleSoft,
    DestructibleMedium,
    DestructibleHard,
    DestructibleReinforced,
    Indestructible,
}

/// Collision class derived from a tile kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CollisionClass {
    #[default]
    None,
    Solid,
    OneWayPlatform,
    Damaging,
}

impl TileKind {
    /// Fixed tile to collision mapping. Never randomized.
    pub fn collision(self) -> CollisionClass {
        match self {
            TileKind::Empty | TileKind::Decorative => CollisionClass::None,
            TileKind::Platform => CollisionClass::OneWayPlatform,
            TileKind::Hazard => CollisionClass::Damaging,
            TileKind::Ground
            | TileKind::GroundTop
            | TileKind::GroundLeft
            | TileKind::GroundRight
            | TileKind::DestructibleSoft
            | TileKind::DestructibleMedium
            | TileKind::DestructibleHard
            | TileKind::DestructibleReinforced
            | TileKind::Indestructible => CollisionClass::Solid,
        }
    }

    /// True for the destructible kinds and `Indestructible`, the cells that
    /// carry a destructible record.
    pub fn is_destructible(self) -> bool {
        self.material().is_some()
    }

    pub fn is_ground(self) -> bool {
        matches!(
            self,
            TileKind::Ground | TileKind::GroundTop | TileKind::GroundLeft | TileKind::GroundRight
        )
    }

    pub fn material(self) -> Option<MaterialClass> {
        match self {
            TileKind::DestructibleSoft => Some(MaterialClass::Soft),
            TileKind::DestructibleMedium => Some(MaterialClass::Medium),
            TileKind::DestructibleHard => Some(MaterialClass::Hard),
            TileKind::DestructibleReinforced => Some(MaterialClass::Reinforced),
            TileKind::Indestructible => Some(MaterialClass::Indestructible),
            TileKind::Empty
            | TileKind::Ground
            | TileKind::GroundTop
            | TileKind::GroundLeft
            | TileKind::GroundRight
            | TileKind::Platform
            | TileKind::Hazard
            | TileKind::Decorative => None,
        }
    }

    pub fn from_material(material: MaterialClass) -> TileKind {
        match material {
            MaterialClass::Soft => TileKind::DestructibleSoft,
            MaterialClass::Medium => TileKind::DestructibleMedium,
            MaterialClass::Hard => TileKind::DestructibleHard,
            MaterialClass::Reinforced => TileKind::DestructibleReinforced,
            MaterialClass::Indestructible => TileKind::Indestructible,
        }
    }

    /// Single-character map symbol
    pub fn glyph(self) -> char {
        match self {
            TileKind::Empty => ' ',
            TileKind::Ground => '#',
            TileKind::GroundTop => '=',
            TileKind::GroundLeft => '[',
            TileKind::GroundRight => ']',
            TileKind::Platform => '-',
            TileKind::Hazard => '^',
            TileKind::Decorative => '.',
            TileKind::DestructibleSoft => 's',
            TileKind::DestructibleMedium => 'm',
            TileKind::DestructibleHard => 'h',
            TileKind::DestructibleReinforced => 'r',
            TileKind::Indestructible => 'X',
        }
    }

    pub const ALL: [TileKind; 13] = [
        TileKind::Empty,
        TileKind::Ground,
        TileKind::GroundTop,
        TileKind::GroundLeft,
        TileKind::GroundRight,
        TileKind::Platform,
        TileKind::Hazard,
        TileKind::Decorative,
        TileKind::DestructibleSoft,
        TileKind::DestructibleMedium,
        TileKind::DestructibleHard,
        TileKind::DestructibleReinforced,
        TileKind::Indestructible,
    ];
}

/// Hardness tier of a destructible cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MaterialClass {
    Soft,
    Medium,
    Hard,
    Reinforced,
    Indestructible,
}

impl MaterialClass {
    /// Starting hit points. `Indestructible` takes its value from tuning.
    /// The others divide evenly by every [`WeaponTier::hits_to_break`] count.
    pub fn base_hit_points(self, indestructible_hp: u8) -> u8 {
        match self {
            MaterialClass::Soft => 1,
            MaterialClass::Medium => 3,
            MaterialClass::Hard => 6,
            MaterialClass::Reinforced => 9,
            MaterialClass::Indestructible => indestructible_hp,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MaterialClass::Soft => "Soft",
            MaterialClass::Medium => "Medium",
            MaterialClass::Hard => "Hard",
            MaterialClass::Reinforced => "Reinforced",
            MaterialClass::Indestructible => "Indestructible",
        }
    }
}

/// Effect triggered when a cell carrying it is destroyed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HazardKind {
    /// Destructible cells stacked above fall away
    FallingDebris,
    /// Poison cloud at the cell
    GasRelease,
    /// Fire burst at the cell
    FireRelease,
    /// Spikes spring from the cell
    SpikeTrap,
    /// Floor column above gives way
    UnstableFloor,
    /// Cover the player was using is gone
    CoverWall,
}

impl HazardKind {
    pub const ALL: [HazardKind; 6] = [
        HazardKind::FallingDebris,
        HazardKind::GasRelease,
        HazardKind::FireRelease,
        HazardKind::SpikeTrap,
        HazardKind::UnstableFloor,
        HazardKind::CoverWall,
    ];
}

/// Reward concealed inside a cell, revealed when it breaks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HiddenContentKind {
    Pathway,
    Bridge,
    Stairs,
    Secret,
}

/// Player weapon power level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WeaponTier {
    Starting,
    Medium,
    Heavy,
}

impl WeaponTier {
    /// Hits needed to break a cell of this material, or `None` when the
    /// tier cannot break it at all.
    pub fn hits_to_break(self, material: MaterialClass) -> Option<u8> {
        use MaterialClass as M;
        match (self, material) {
            (_, M::Indestructible) => None,
            (_, M::Soft) => Some(1),
            (WeaponTier::Starting, M::Medium) => Some(3),
            (WeaponTier::Starting, _) => None,
            (WeaponTier::Medium, M::Medium) => Some(1),
            (WeaponTier::Medium, M::Hard) => Some(3),
            (WeaponTier::Medium, M::Reinforced) => None,
            (WeaponTier::Heavy, M::Reinforced) => Some(3),
            (WeaponTier::Heavy, _) => Some(1),
        }
    }

    /// Lowest tier that can break the material
    pub fn required_for(material: MaterialClass) -> Option<WeaponTier> {
        [WeaponTier::Starting, WeaponTier::Medium, WeaponTier::Heavy]
            .into_iter()
            .find(|tier| tier.hits_to_break(material).is_some())
    }
}

/// Per-cell destructible metadata. The default value is the zero record,
/// required on every cell that is not destructible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct DestructibleRecord {
    pub material: Option<MaterialClass>,
    pub hit_points: u8,
    pub max_hit_points: u8,
    pub hazard: Option<HazardKind>,
    pub is_relic: bool,
    pub hidden_content: Option<HiddenContentKind>,
}

impl DestructibleRecord {
    /// Fresh record at full health
    pub fn new(material: MaterialClass, indestructible_hp: u8) -> Self {
        let hp = material.base_hit_points(indestructible_hp);
        Self {
            material: Some(material),
            hit_points: hp,
            max_hit_points: hp,
            ..Default::default()
        }
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}
