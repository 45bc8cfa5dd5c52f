//! Error types for melee operations.

use crate::checks::SuccessLevel;
use crate::combat::Side;

/// Broad class of a [`MeleeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The operation was invoked in a state that does not allow it.
    Precondition,
    /// The actor lacks a spendable resource. Shown to the user, never fatal.
    Resource,
    /// A persisted payload could not be read back.
    Data,
}

#[derive(Debug, thiserror::Error)]
pub enum MeleeError {
    #[error("unknown actor: {0}")]
    UnknownActor(String),

    #[error("actor '{actor}' has no item '{item}'")]
    UnknownItem { actor: String, item: String },

    #[error("actor '{actor}' has no skill '{skill}'")]
    UnknownSkill { actor: String, skill: String },

    #[error("skill '{skill}' cannot be used with weapon '{item}'")]
    SkillNotUsable { skill: String, item: String },

    #[error("unknown modifier: {0}")]
    UnknownModifier(String),

    #[error("modifier '{0}' does not apply to the defending side")]
    ModifierNotApplicable(&'static str),

    #[error("no reaction selected")]
    NoReaction,

    #[error("fighting back requires a weapon")]
    MissingWeapon,

    #[error("{0} has already rolled")]
    AlreadyRolled(Side),

    #[error("{0} has not rolled yet")]
    NotRolled(Side),

    #[error("record {0} not found")]
    MissingRecord(String),

    #[error("cannot lower a check from {current} to {requested}")]
    UpgradeBelowCurrent {
        current: SuccessLevel,
        requested: SuccessLevel,
    },

    #[error("a fumble cannot be bought off with luck")]
    FumbleIsFinal,

    #[error("the attack was resolved unopposed in record {0}")]
    AlreadyResolved(String),

    #[error("luck can only buy a success, not {0}")]
    InvalidUpgradeLevel(SuccessLevel),

    #[error("{actor} didn't have enough luck ({available} of {needed})")]
    InsufficientLuck {
        actor: String,
        needed: u32,
        available: u32,
    },

    #[error("payload field '{key}': {reason}")]
    Payload { key: String, reason: String },

    #[error("expected a {expected} record, found '{found}'")]
    RecordKind {
        expected: &'static str,
        found: String,
    },
}

impl MeleeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InsufficientLuck { .. } => ErrorKind::Resource,
            Self::Payload { .. } | Self::RecordKind { .. } => ErrorKind::Data,
            _ => ErrorKind::Precondition,
        }
    }

    /// Errors the host should surface as a notification rather than a failure.
    pub fn is_user_notice(&self) -> bool {
        self.kind() == ErrorKind::Resource
    }

    pub(crate) fn payload(key: &str, reason: impl Into<String>) -> Self {
        Self::Payload {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

pub type MeleeResult<T> = Result<T, MeleeError>;
