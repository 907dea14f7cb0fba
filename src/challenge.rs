//! Challenge strings and share text
//!
//! A challenge is a level code with an optional target score:
//! `3-K7XM2P9A:12450`. A bare level code is a challenge with target 0.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;
use crate::generation::LevelIdentifier;

/// Parsed challenge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChallengeCode {
    pub level: LevelIdentifier,
    pub target_score: u32,
}

impl ChallengeCode {
    pub fn new(level: LevelIdentifier, target_score: u32) -> Self {
        Self {
            level,
            target_score,
        }
    }

    /// Canonical level code of the challenged level
    pub fn level_code(&self) -> String {
        self.level.to_code()
    }

    /// `"<level code>:<score>"`
    pub fn encode(level_code: &str, target_score: u32) -> String {
        format!("{}:{}", level_code, target_score)
    }

    /// Parse a challenge or bare level code. Whitespace around either half
    /// is ignored; the code half is case-insensitive.
    pub fn try_parse(text: &str) -> Result<Self, ParseError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ParseError::Empty);
        }
        let Some((code, score)) = text.split_once(':') else {
            return Ok(Self::new(LevelIdentifier::try_parse(text)?, 0));
        };
        let level = LevelIdentifier::try_parse(code)?;
        let score = score.trim();
        let target_score = score
            .parse::<u32>()
            .map_err(|_| ParseError::InvalidScore(score.to_string()))?;
        Ok(Self::new(level, target_score))
    }
}

impl fmt::Display for ChallengeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.level, self.target_score)
    }
}

impl FromStr for ChallengeCode {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_parse(s)
    }
}

/// `1234567` -> `1,234,567`
pub fn format_thousands(value: u32) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// `[**-]` style rating, clamped to three stars
fn star_bar(stars: u8) -> String {
    let filled = usize::from(stars.min(3));
    format!("[{}{}]", "*".repeat(filled), "-".repeat(3 - filled))
}

/// Post-level brag text
pub fn share_text(score: u32, stars: u8, level_code: &str) -> String {
    format!(
        "I scored {} on Epoch Breaker level {}! {}\nCan you beat it?",
        format_thousands(score),
        level_code,
        star_bar(stars)
    )
}

/// Brag text carrying a challenge string for friends to paste
pub fn challenge_share_text(score: u32, stars: u8, level_code: &str) -> String {
    format!(
        "I scored {} on Epoch Breaker! {}\nChallenge me: {}",
        format_thousands(score),
        star_bar(stars),
        ChallengeCode::encode(level_code, score)
    )
}
