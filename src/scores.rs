//! Simulated evaluation scores.
//!
//! None of these numbers come from looking at the image. They are drawn
//! uniformly at random inside fixed bounds so the result card has something
//! to show, and must be presented as simulated.

use crate::category::Category;
use rand::Rng;
use std::ops::RangeInclusive;

pub const HEALTH_RANGE: RangeInclusive<u8> = 85..=99;
pub const BODY_STRUCTURE_RANGE: RangeInclusive<u8> = 80..=99;
pub const DAIRY_POTENTIAL_RANGE: RangeInclusive<u8> = 75..=99;

/// Source of uniformly distributed integers for score generation.
pub trait ScoreSource {
    /// Returns a value in `range`, both ends included.
    fn score_in(&mut self, range: RangeInclusive<u8>) -> u8;
}

impl<R: Rng> ScoreSource for R {
    fn score_in(&mut self, range: RangeInclusive<u8>) -> u8 {
        self.gen_range(range)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulatedScores {
    pub health: u8,
    pub body_structure: Option<u8>,
    pub dairy_potential: Option<u8>,
}

impl SimulatedScores {
    /// Health is generated for every result; body structure and dairy
    /// potential only for cattle.
    pub fn generate(category: Option<Category>, source: &mut impl ScoreSource) -> Self {
        let dairy = category == Some(Category::Cow);
        let body_structure = dairy.then(|| source.score_in(BODY_STRUCTURE_RANGE));
        let dairy_potential = dairy.then(|| source.score_in(DAIRY_POTENTIAL_RANGE));
        let health = source.score_in(HEALTH_RANGE);
        Self {
            health,
            body_structure,
            dairy_potential,
        }
    }
}
