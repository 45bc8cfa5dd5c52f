//! Presentation tier of a published roll. The host turns these into
//! colours, titles and icons.

use serde::{Deserialize, Serialize};

use crate::checks::{CheckResult, SuccessLevel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollTier {
    Critical,
    Fumble,
    Success,
    Failure,
}

impl RollTier {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Fumble => "fumble",
            Self::Success => "success",
            Self::Failure => "failure",
        }
    }

    pub fn label_key(self) -> &'static str {
        match self {
            Self::Critical => "roll.tier.critical",
            Self::Fumble => "roll.tier.fumble",
            Self::Success => "roll.tier.success",
            Self::Failure => "roll.tier.failure",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Icon {
    Medal,
    Spider,
    Star,
    Skull,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollBadge {
    pub tier: RollTier,
    pub level: SuccessLevel,
    pub icon: Icon,
    pub icons: u8,
}

impl RollBadge {
    /// Critical beats fumble beats success beats failure.
    pub fn of(check: &CheckResult) -> Self {
        let level = check.level;
        let (tier, icon, icons) = if check.is_critical() {
            (RollTier::Critical, Icon::Medal, 4)
        } else if check.is_fumble() {
            (RollTier::Fumble, Icon::Spider, 4)
        } else if check.is_success() {
            (RollTier::Success, Icon::Star, level.as_i32() as u8)
        } else {
            (RollTier::Failure, Icon::Skull, 1)
        };
        Self {
            tier,
            level,
            icon,
            icons,
        }
    }

    /// Title shown on the card: the level for successes, the tier otherwise.
    pub fn title_key(&self) -> &'static str {
        match self.tier {
            RollTier::Success => self.level.label_key(),
            tier => tier.label_key(),
        }
    }
}
