//! Level identifier and the shareable level code
//!
//! A level is named by `{epoch, difficulty, seed}`. The code form is
//! `E-XXXXXXXX`: the epoch digit, a dash, then 8 symbols carrying 40 bits
//! (difficulty in the top 2 bits, the low 38 bits of the seed below it),
//! big-endian at 5 bits per symbol.
//!
//! Only the 38 seed bits survive a code, so generation derives its working
//! seed from the encoded form ([`LevelIdentifier::generation_seed`]).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ConstructionError, ParseError};

/// Highest epoch index
pub const MAX_EPOCH: u8 = 9;
/// Highest difficulty index
pub const MAX_DIFFICULTY: u8 = 3;

/// Code symbols: uppercase letters and digits without 0, 1, I and O
pub const CODE_ALPHABET: &[u8; 32] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Seed bits carried by a code
pub const SEED_BITS: u32 = 38;
const SEED_MASK: u64 = (1 << SEED_BITS) - 1;

const PAYLOAD_SYMBOLS: usize = 8;
const CODE_LEN: usize = PAYLOAD_SYMBOLS + 2;

const EPOCH_NAMES: [&str; 10] = [
    "Stone Age",
    "Bronze Age",
    "Classical",
    "Medieval",
    "Renaissance",
    "Industrial",
    "Modern",
    "Digital",
    "Spacefaring",
    "Transcendent",
];

const DIFFICULTY_NAMES: [&str; 4] = ["Easy", "Normal", "Hard", "Extreme"];

/// Immutable name of one level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "IdentifierRepr", into = "IdentifierRepr")]
pub struct LevelIdentifier {
    epoch: u8,
    difficulty: u8,
    seed: u64,
}

/// Unvalidated serde form; converted through [`LevelIdentifier::new`]
#[derive(Serialize, Deserialize)]
struct IdentifierRepr {
    epoch: u8,
    difficulty: u8,
    seed: u64,
}

impl TryFrom<IdentifierRepr> for LevelIdentifier {
    type Error = ConstructionError;

    fn try_from(repr: IdentifierRepr) -> Result<Self, Self::Error> {
        LevelIdentifier::new(repr.epoch, repr.difficulty, repr.seed)
    }
}

impl From<LevelIdentifier> for IdentifierRepr {
    fn from(id: LevelIdentifier) -> Self {
        IdentifierRepr {
            epoch: id.epoch,
            difficulty: id.difficulty,
            seed: id.seed,
        }
    }
}

impl LevelIdentifier {
    /// Build an identifier from explicit values. Out-of-range indices are
    /// rejected, never clamped.
    pub fn new(epoch: u8, difficulty: u8, seed: u64) -> Result<Self, ConstructionError> {
        if epoch > MAX_EPOCH {
            return Err(ConstructionError::EpochOutOfRange(epoch));
        }
        if difficulty > MAX_DIFFICULTY {
            return Err(ConstructionError::DifficultyOutOfRange(difficulty));
        }
        Ok(Self {
            epoch,
            difficulty,
            seed,
        })
    }

    /// Originate a new level with a fresh seed from the process RNG.
    ///
    /// This is the one non-reproducible call in the crate.
    pub fn generate_new(epoch: u8, difficulty: u8) -> Result<Self, ConstructionError> {
        Self::new(epoch, difficulty, rand::random::<u64>())
    }

    pub fn epoch(&self) -> u8 {
        self.epoch
    }

    pub fn difficulty(&self) -> u8 {
        self.difficulty
    }

    /// Raw seed as constructed (may hold bits a code cannot carry)
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Seed bits that survive a code round-trip
    pub fn payload_seed(&self) -> u64 {
        self.seed & SEED_MASK
    }

    /// Working seed for generation, mixed from the encoded fields only
    pub fn generation_seed(&self) -> u64 {
        let mut mixed = self.payload_seed() ^ 0x9E37_79B9_7F4A_7C15;
        mixed ^= u64::from(self.epoch).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        mixed ^= u64::from(self.difficulty).wrapping_mul(0x94D0_49BB_1331_11EB);
        mixed ^= mixed >> 30;
        mixed = mixed.wrapping_mul(0xBF58_476D_1CE4_E5B9);
        mixed ^= mixed >> 27;
        mixed = mixed.wrapping_mul(0x94D0_49BB_1331_11EB);
        mixed ^ (mixed >> 31)
    }

    pub fn epoch_name(&self) -> &'static str {
        EPOCH_NAMES[usize::from(self.epoch)]
    }

    pub fn difficulty_name(&self) -> &'static str {
        DIFFICULTY_NAMES[usize::from(self.difficulty)]
    }

    /// Canonical uppercase code, e.g. `3-K7XM2P9A`
    pub fn to_code(&self) -> String {
        let payload = (u64::from(self.difficulty) << SEED_BITS) | self.payload_seed();
        let mut code = String::with_capacity(CODE_LEN);
        code.push(char::from(b'0' + self.epoch));
        code.push('-');
        for i in 0..PAYLOAD_SYMBOLS {
            let shift = 5 * (PAYLOAD_SYMBOLS - 1 - i);
            let symbol = ((payload >> shift) & 0x1F) as usize;
            code.push(char::from(CODE_ALPHABET[symbol]));
        }
        code
    }

    /// Parse a level code. Surrounding whitespace is ignored and symbols are
    /// matched case-insensitively.
    pub fn try_parse(code: &str) -> Result<Self, ParseError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(ParseError::Empty);
        }
        let chars: Vec<char> = code.chars().collect();
        if chars.len() != CODE_LEN {
            return Err(ParseError::WrongLength { found: chars.len() });
        }
        let epoch = match chars[0].to_digit(10) {
            Some(d) => d as u8,
            None => return Err(ParseError::InvalidEpoch(chars[0])),
        };
        if chars[1] != '-' {
            return Err(ParseError::MissingSeparator);
        }

        let mut payload: u64 = 0;
        for (offset, &c) in chars[2..].iter().enumerate() {
            let value = symbol_value(c).ok_or(ParseError::InvalidSymbol {
                symbol: c,
                position: offset + 2,
            })?;
            payload = (payload << 5) | u64::from(value);
        }

        let difficulty = (payload >> SEED_BITS) as u8;
        let seed = payload & SEED_MASK;
        // Both indices are in range by construction: one digit, two bits
        Ok(Self {
            epoch,
            difficulty,
            seed,
        })
    }
}

fn symbol_value(c: char) -> Option<u8> {
    let upper = c.to_ascii_uppercase();
    if !upper.is_ascii() {
        return None;
    }
    CODE_ALPHABET
        .iter()
        .position(|&s| s == upper as u8)
        .map(|i| i as u8)
}

impl fmt::Display for LevelIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_code())
    }
}

impl FromStr for LevelIdentifier {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_scenario_code_round_trip() {
        let parsed = LevelIdentifier::try_parse("3-K7XM2P9A").unwrap();
        assert_eq!(parsed.epoch(), 3);
        assert_eq!(parsed.difficulty(), 1);

        let id = LevelIdentifier::new(3, 1, parsed.seed()).unwrap();
        assert_eq!(id.to_code(), "3-K7XM2P9A");
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        let lower = LevelIdentifier::try_parse("3-k7xm2p9a").unwrap();
        let upper = LevelIdentifier::try_parse("3-K7XM2P9A").unwrap();
        assert_eq!(lower, upper);
        assert_eq!(lower.to_code(), "3-K7XM2P9A");
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let id = LevelIdentifier::try_parse("  3-K7XM2P9A\n").unwrap();
        assert_eq!(id.to_code(), "3-K7XM2P9A");
    }

    #[test]
    fn test_construction_rejects_out_of_range() {
        assert_eq!(
            LevelIdentifier::new(10, 0, 1),
            Err(ConstructionError::EpochOutOfRange(10))
        );
        assert_eq!(
            LevelIdentifier::new(0, 4, 1),
            Err(ConstructionError::DifficultyOutOfRange(4))
        );
        assert!(LevelIdentifier::generate_new(11, 0).is_err());
    }

    #[test]
    fn test_parse_rejects_malformed_codes() {
        assert_eq!(LevelIdentifier::try_parse(""), Err(ParseError::Empty));
        assert_eq!(LevelIdentifier::try_parse("   "), Err(ParseError::Empty));
        assert_eq!(
            LevelIdentifier::try_parse("3-ABC"),
            Err(ParseError::WrongLength { found: 5 })
        );
        assert_eq!(
            LevelIdentifier::try_parse("A-23456789"),
            Err(ParseError::InvalidEpoch('A'))
        );
        assert_eq!(
            LevelIdentifier::try_parse("3_K7XM2P9A"),
            Err(ParseError::MissingSeparator)
        );
        assert_eq!(
            LevelIdentifier::try_parse("3-IIIIIIII"),
            Err(ParseError::InvalidSymbol {
                symbol: 'I',
                position: 2
            })
        );
        assert_eq!(
            LevelIdentifier::try_parse("3-K7XM2P90"),
            Err(ParseError::InvalidSymbol {
                symbol: '0',
                position: 9
            })
        );
        assert!(LevelIdentifier::try_parse("3-K7XM2P9É").is_err());
    }

    #[test]
    fn test_code_drops_high_seed_bits() {
        let full = LevelIdentifier::new(5, 2, u64::MAX).unwrap();
        let parsed = LevelIdentifier::try_parse(&full.to_code()).unwrap();
        assert_ne!(parsed.seed(), full.seed());
        assert_eq!(parsed.payload_seed(), full.payload_seed());
        assert_eq!(parsed.generation_seed(), full.generation_seed());
    }

    #[test]
    fn test_generation_seed_depends_on_every_field() {
        let base = LevelIdentifier::new(3, 1, 42).unwrap();
        let other_epoch = LevelIdentifier::new(4, 1, 42).unwrap();
        let other_difficulty = LevelIdentifier::new(3, 2, 42).unwrap();
        let other_seed = LevelIdentifier::new(3, 1, 43).unwrap();
        assert_ne!(base.generation_seed(), other_epoch.generation_seed());
        assert_ne!(base.generation_seed(), other_difficulty.generation_seed());
        assert_ne!(base.generation_seed(), other_seed.generation_seed());
    }

    #[test]
    fn test_names() {
        let id = LevelIdentifier::new(0, 0, 1).unwrap();
        assert_eq!(id.epoch_name(), "Stone Age");
        assert_eq!(id.difficulty_name(), "Easy");
        let id = LevelIdentifier::new(9, 3, 1).unwrap();
        assert_eq!(id.epoch_name(), "Transcendent");
        assert_eq!(id.difficulty_name(), "Extreme");
    }

    #[test]
    fn test_display_and_from_str() {
        let id: LevelIdentifier = "7-ABCDEFGH".parse().unwrap();
        assert_eq!(id.to_string(), "7-ABCDEFGH");
    }

    #[test]
    fn test_serde_rejects_invalid_identifier() {
        let id = LevelIdentifier::new(2, 3, 99).unwrap();
        let json = serde_json::to_string(&id).unwrap();
        let back: LevelIdentifier = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);

        let bad = r#"{"epoch":12,"difficulty":0,"seed":1}"#;
        assert!(serde_json::from_str::<LevelIdentifier>(bad).is_err());
    }

    proptest! {
        #[test]
        fn code_preserves_encoded_fields(epoch in 0u8..=9, difficulty in 0u8..=3, seed in any::<u64>()) {
            let id = LevelIdentifier::new(epoch, difficulty, seed).unwrap();
            let code = id.to_code();
            prop_assert_eq!(code.len(), 10);
            let parsed = LevelIdentifier::try_parse(&code).unwrap();
            prop_assert_eq!(parsed.epoch(), epoch);
            prop_assert_eq!(parsed.difficulty(), difficulty);
            prop_assert_eq!(parsed.payload_seed(), id.payload_seed());
            prop_assert_eq!(parsed.to_code(), code);
        }

        #[test]
        fn parse_never_panics(text in ".{0,16}") {
            let _ = LevelIdentifier::try_parse(&text);
        }
    }
}
