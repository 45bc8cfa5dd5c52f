//! Opposed melee checks for a percentile tabletop ruleset.
//!
//! An attack flows through three persisted records: the [`combat::Initiator`]
//! rolls first, a [`combat::Target`] picks a reaction and rolls back, and a
//! [`combat::Resolution`] compares both success levels to pick a winner.

pub mod api;
pub mod checks;
pub mod combat;
pub mod content;
pub mod error;
pub mod payload;
pub mod table;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub use checks::{CheckResult, SuccessLevel};
pub use combat::{Initiator, Modifier, Reaction, ReactionKind, Resolution, Target};
pub use error::{ErrorKind, MeleeError, MeleeResult};
pub use payload::{Field, Payload, Record, RecordId};
pub use table::{
    Actor, ActorKey, Directory, ItemId, MemoryDirectory, MemoryRecords, RecordStore, Session,
    Skill, SkillId, Token, Weapon,
};

/// Source of percentile rolls.
///
/// `dice_modifier` counts bonus dice when positive and penalty dice when
/// negative. Implementations return a value in `1..=100`.
pub trait Roller {
    fn percentile(&mut self, dice_modifier: i32) -> u32;
}

impl<F: FnMut(i32) -> u32> Roller for F {
    fn percentile(&mut self, dice_modifier: i32) -> u32 {
        self(dice_modifier)
    }
}

/// Bonus or penalty dice beyond this are ignored.
pub const MAX_EXTRA_DICE: i32 = 3;

pub struct Dice {
    rng: ChaCha8Rng,
}

impl Dice {
    pub fn from_seed(seed: u64) -> Self {
        Self { rng: ChaCha8Rng::seed_from_u64(seed) }
    }

    /// One d10 read as 0..=9.
    fn d10(&mut self) -> u32 {
        self.rng.gen_range(0..=9)
    }

    /// Roll d100 with `|dice_modifier|` extra tens dice, at most
    /// [`MAX_EXTRA_DICE`].
    pub fn d100(&mut self, dice_modifier: i32) -> u32 {
        let dice_modifier = dice_modifier.clamp(-MAX_EXTRA_DICE, MAX_EXTRA_DICE);
        let units = self.d10();
        // Each tens die is read together with the shared units die.
        let first = percentile_value(self.d10(), units);
        (0..dice_modifier.unsigned_abs()).fold(first, |kept, _| {
            let value = percentile_value(self.d10(), units);
            if dice_modifier >= 0 { kept.min(value) } else { kept.max(value) }
        })
    }
}

impl Roller for Dice {
    fn percentile(&mut self, dice_modifier: i32) -> u32 {
        self.d100(dice_modifier)
    }
}

/// Combine a tens die and a units die; "00" + "0" reads as 100.
pub fn percentile_value(tens: u32, units: u32) -> u32 {
    match tens * 10 + units {
        0 => 100,
        v => v,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn double_zero_is_one_hundred() {
        assert_eq!(percentile_value(0, 0), 100);
        assert_eq!(percentile_value(0, 1), 1);
        assert_eq!(percentile_value(9, 9), 99);
    }

    #[test]
    fn seeded_rolls_stay_in_range() {
        let mut dice = Dice::from_seed(7);
        for modifier in -2..=2 {
            for _ in 0..200 {
                let v = dice.d100(modifier);
                assert!((1..=100).contains(&v), "{v} out of range");
            }
        }
    }

    #[test]
    fn extra_dice_are_capped() {
        let mut capped = Dice::from_seed(31);
        let mut huge = Dice::from_seed(31);
        let xs: Vec<u32> = (0..20).map(|_| capped.d100(-MAX_EXTRA_DICE)).collect();
        let ys: Vec<u32> = (0..20).map(|_| huge.d100(i32::MIN)).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn same_seed_same_sequence() {
        let mut a = Dice::from_seed(99);
        let mut b = Dice::from_seed(99);
        let xs: Vec<u32> = (0..20).map(|_| a.d100(1)).collect();
        let ys: Vec<u32> = (0..20).map(|_| b.d100(1)).collect();
        assert_eq!(xs, ys);
    }
}
