//! The opposed melee workflow: initiator, target and resolution records.

pub mod badge;
pub mod initiator;
pub mod modifiers;
pub mod reaction;
pub mod resolution;
pub mod target;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use badge::{Icon, RollBadge, RollTier};
pub use initiator::Initiator;
pub use modifiers::{Modifier, Modifiers};
pub use reaction::{Reaction, ReactionKind};
pub use resolution::{decide, Decision, OfferedAction, Outcome, Resolution};
pub use target::Target;

use crate::error::{MeleeError, MeleeResult};
use crate::table::{ActorKey, ItemId};

/// Which side of the exchange a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Initiator,
    Target,
}

impl Side {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Initiator => "initiator",
            Self::Target => "target",
        }
    }

    pub(crate) fn parse(key: &str, s: &str) -> MeleeResult<Self> {
        match s {
            "initiator" => Ok(Self::Initiator),
            "target" => Ok(Self::Target),
            other => Err(MeleeError::payload(key, format!("unknown side '{other}'"))),
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A damage roll the host should offer after the exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageRoll {
    pub side: Side,
    pub actor: ActorKey,
    pub item: ItemId,
    /// Extreme or better: the host rolls maximum/impaling damage.
    pub critical: bool,
}
