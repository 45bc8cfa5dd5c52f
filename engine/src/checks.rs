use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{MeleeError, MeleeResult};
use crate::payload::Payload;
use crate::Roller;

/// Outcome of a percentile check, ordered from worst to best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuccessLevel {
    Fumble,
    Failure,
    Regular,
    Hard,
    Extreme,
    Critical,
}

impl SuccessLevel {
    pub const ALL: [SuccessLevel; 6] = [
        SuccessLevel::Fumble,
        SuccessLevel::Failure,
        SuccessLevel::Regular,
        SuccessLevel::Hard,
        SuccessLevel::Extreme,
        SuccessLevel::Critical,
    ];

    /// Integer scale used for comparisons: anything `<= 0` failed.
    pub fn as_i32(self) -> i32 {
        match self {
            Self::Fumble => -1,
            Self::Failure => 0,
            Self::Regular => 1,
            Self::Hard => 2,
            Self::Extreme => 3,
            Self::Critical => 4,
        }
    }

    /// Inverse of [`as_i32`](Self::as_i32). Values below -1 read as a fumble.
    pub fn from_i32(level: i32) -> Option<Self> {
        match level {
            i32::MIN..=-1 => Some(Self::Fumble),
            0 => Some(Self::Failure),
            1 => Some(Self::Regular),
            2 => Some(Self::Hard),
            3 => Some(Self::Extreme),
            4 => Some(Self::Critical),
            _ => None,
        }
    }

    pub fn is_success(self) -> bool {
        self >= Self::Regular
    }

    pub fn label_key(self) -> &'static str {
        match self {
            Self::Fumble => "check.fumble",
            Self::Failure => "check.failure",
            Self::Regular => "check.regular_success",
            Self::Hard => "check.hard_success",
            Self::Extreme => "check.extreme_success",
            Self::Critical => "check.critical_success",
        }
    }
}

impl fmt::Display for SuccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Fumble => "fumble",
            Self::Failure => "failure",
            Self::Regular => "regular success",
            Self::Hard => "hard success",
            Self::Extreme => "extreme success",
            Self::Critical => "critical success",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for SuccessLevel {
    type Err = MeleeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fumble" => Ok(Self::Fumble),
            "failure" => Ok(Self::Failure),
            "regular" => Ok(Self::Regular),
            "hard" => Ok(Self::Hard),
            "extreme" => Ok(Self::Extreme),
            "critical" => Ok(Self::Critical),
            other => other
                .parse::<i32>()
                .ok()
                .and_then(Self::from_i32)
                .ok_or_else(|| {
                    MeleeError::payload("success_level", format!("unknown level '{s}'"))
                }),
        }
    }
}

/// Classify a raw d100 value against a skill value.
pub fn classify(value: u32, skill_value: u32) -> SuccessLevel {
    if value == 1 {
        SuccessLevel::Critical
    } else if value >= 100 || (skill_value < 50 && value >= 96) {
        SuccessLevel::Fumble
    } else if value <= skill_value / 5 {
        SuccessLevel::Extreme
    } else if value <= skill_value / 2 {
        SuccessLevel::Hard
    } else if value <= skill_value {
        SuccessLevel::Regular
    } else {
        SuccessLevel::Failure
    }
}

/// Highest roll that still reaches `level` (regular, hard or extreme).
fn threshold(level: SuccessLevel, skill_value: u32) -> Option<u32> {
    match level {
        SuccessLevel::Regular => Some(skill_value),
        SuccessLevel::Hard => Some(skill_value / 2),
        SuccessLevel::Extreme => Some(skill_value / 5),
        _ => None,
    }
}

/// One side's rolled check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    /// Raw d100 value; cleared once luck rewrote the outcome.
    pub value: Option<u32>,
    pub skill_value: u32,
    pub dice_modifier: i32,
    pub level: SuccessLevel,
    pub luck_spent: bool,
    /// Set when an auto-success override lifted the raw outcome.
    pub forced_pass: bool,
}

impl CheckResult {
    pub fn from_value(value: u32, skill_value: u32, dice_modifier: i32) -> Self {
        Self {
            value: Some(value),
            skill_value,
            dice_modifier,
            level: classify(value, skill_value),
            luck_spent: false,
            forced_pass: false,
        }
    }

    pub fn roll(roller: &mut dyn Roller, skill_value: u32, dice_modifier: i32) -> Self {
        let value = roller.percentile(dice_modifier).clamp(1, 100);
        Self::from_value(value, skill_value, dice_modifier)
    }

    pub fn success_level(&self) -> i32 {
        self.level.as_i32()
    }

    pub fn is_critical(&self) -> bool {
        self.level == SuccessLevel::Critical
    }

    pub fn is_fumble(&self) -> bool {
        self.level == SuccessLevel::Fumble
    }

    pub fn is_success(&self) -> bool {
        self.level.is_success()
    }

    pub fn critical_damage(&self) -> bool {
        self.level >= SuccessLevel::Extreme
    }

    /// Lift a non-fumble below regular to a regular success.
    pub fn force_pass(&mut self) {
        if !self.is_fumble() && !self.is_success() {
            self.level = SuccessLevel::Regular;
            self.forced_pass = true;
        }
    }

    /// Luck points needed to turn the raw roll into `level`.
    pub fn luck_cost_to(&self, level: SuccessLevel) -> Option<u32> {
        if self.is_fumble() || self.level >= level {
            return None;
        }
        let value = self.value?;
        let limit = threshold(level, self.skill_value)?;
        Some(value.saturating_sub(limit))
    }

    /// Validate a luck upgrade without applying it.
    pub fn check_upgrade(&self, level: SuccessLevel) -> MeleeResult<()> {
        if !level.is_success() {
            return Err(MeleeError::InvalidUpgradeLevel(level));
        }
        if self.is_fumble() {
            return Err(MeleeError::FumbleIsFinal);
        }
        if level < self.level {
            return Err(MeleeError::UpgradeBelowCurrent {
                current: self.level,
                requested: level,
            });
        }
        Ok(())
    }

    /// Overwrite the outcome after luck was paid. Never lowers the level.
    pub fn apply_upgrade(&mut self, level: SuccessLevel) -> MeleeResult<()> {
        self.check_upgrade(level)?;
        self.level = level;
        self.value = None;
        self.luck_spent = true;
        Ok(())
    }

    pub(crate) fn write_to(&self, p: &mut Payload) {
        match self.value {
            Some(v) => p.set_int("dice_value", i64::from(v)),
            None => p.remove("dice_value"),
        }
        p.set_int("skill_value", i64::from(self.skill_value));
        p.set_int("dice_modifier", i64::from(self.dice_modifier));
        p.set_int("success_level", i64::from(self.success_level()));
        p.set_bool("critical", self.is_critical());
        p.set_bool("fumble", self.is_fumble());
        p.set_bool("success", self.is_success());
        p.set_bool("critical_damage", self.critical_damage());
        p.set_bool("luck_spent", self.luck_spent);
        p.set_bool("forced_pass", self.forced_pass);
    }

    /// Reads the check back; `None` when the payload carries no roll.
    pub(crate) fn read_from(p: &Payload) -> MeleeResult<Option<Self>> {
        let Some(level) = p.opt_int("success_level")? else {
            return Ok(None);
        };
        let level = i32::try_from(level)
            .ok()
            .and_then(SuccessLevel::from_i32)
            .ok_or_else(|| {
                MeleeError::payload("success_level", format!("out of range: {level}"))
            })?;
        Ok(Some(Self {
            value: p.opt_u32("dice_value")?,
            skill_value: p.opt_u32("skill_value")?.unwrap_or(0),
            dice_modifier: i32::try_from(p.int_or("dice_modifier", 0)?)
                .map_err(|_| MeleeError::payload("dice_modifier", "out of range"))?,
            level,
            luck_spent: p.bool_or("luck_spent", false)?,
            forced_pass: p.bool_or("forced_pass", false)?,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_bands() {
        assert_eq!(classify(1, 60), SuccessLevel::Critical);
        assert_eq!(classify(12, 60), SuccessLevel::Extreme);
        assert_eq!(classify(13, 60), SuccessLevel::Hard);
        assert_eq!(classify(30, 60), SuccessLevel::Hard);
        assert_eq!(classify(31, 60), SuccessLevel::Regular);
        assert_eq!(classify(60, 60), SuccessLevel::Regular);
        assert_eq!(classify(61, 60), SuccessLevel::Failure);
        assert_eq!(classify(99, 60), SuccessLevel::Failure);
        assert_eq!(classify(100, 60), SuccessLevel::Fumble);
    }

    #[test]
    fn low_skill_fumbles_from_96() {
        assert_eq!(classify(95, 40), SuccessLevel::Failure);
        assert_eq!(classify(96, 40), SuccessLevel::Fumble);
        assert_eq!(classify(96, 50), SuccessLevel::Failure);
    }

    #[test]
    fn ordering_matches_integer_scale() {
        for pair in SuccessLevel::ALL.windows(2) {
            assert!(pair[0] < pair[1]);
            assert!(pair[0].as_i32() < pair[1].as_i32());
        }
        for level in SuccessLevel::ALL {
            assert_eq!(SuccessLevel::from_i32(level.as_i32()), Some(level));
        }
    }

    #[test]
    fn luck_cost_is_distance_to_threshold() {
        let check = CheckResult::from_value(65, 60, 0);
        assert_eq!(check.luck_cost_to(SuccessLevel::Regular), Some(5));
        assert_eq!(check.luck_cost_to(SuccessLevel::Hard), Some(35));
        assert_eq!(check.luck_cost_to(SuccessLevel::Extreme), Some(53));
        assert_eq!(check.luck_cost_to(SuccessLevel::Critical), None);
    }

    #[test]
    fn fumbles_cannot_be_bought_off() {
        let mut check = CheckResult::from_value(100, 60, 0);
        assert_eq!(check.luck_cost_to(SuccessLevel::Regular), None);
        assert!(matches!(
            check.apply_upgrade(SuccessLevel::Regular),
            Err(MeleeError::FumbleIsFinal)
        ));
        assert_eq!(check.level, SuccessLevel::Fumble);
        assert_eq!(check.value, Some(100));
        assert!(!check.luck_spent);
    }

    #[test]
    fn oversized_dice_modifier_is_rejected_on_load() {
        let mut p = Payload::new();
        CheckResult::from_value(40, 60, 1).write_to(&mut p);
        p.set_int("dice_modifier", i64::from(i32::MAX) + 1);
        assert!(matches!(
            CheckResult::read_from(&p),
            Err(MeleeError::Payload { ref key, .. }) if key == "dice_modifier"
        ));
    }

    #[test]
    fn force_pass_never_overrides_fumble() {
        let mut miss = CheckResult::from_value(80, 60, 0);
        miss.force_pass();
        assert_eq!(miss.level, SuccessLevel::Regular);
        assert!(miss.forced_pass);

        let mut fumble = CheckResult::from_value(100, 60, 0);
        fumble.force_pass();
        assert_eq!(fumble.level, SuccessLevel::Fumble);

        let mut hard = CheckResult::from_value(20, 60, 0);
        hard.force_pass();
        assert_eq!(hard.level, SuccessLevel::Hard);
        assert!(!hard.forced_pass);
    }

    #[test]
    fn upgrades_only_go_up() {
        let mut check = CheckResult::from_value(25, 60, 0);
        assert!(matches!(
            check.apply_upgrade(SuccessLevel::Regular),
            Err(MeleeError::UpgradeBelowCurrent { .. })
        ));
        assert!(matches!(
            check.apply_upgrade(SuccessLevel::Failure),
            Err(MeleeError::InvalidUpgradeLevel(_))
        ));
        assert_eq!(check.value, Some(25));
        check.apply_upgrade(SuccessLevel::Extreme).unwrap();
        assert_eq!(check.level, SuccessLevel::Extreme);
        assert_eq!(check.value, None);
        assert!(check.luck_spent);
    }
}
