use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{MeleeError, MeleeResult};
use crate::payload::Payload;
use crate::table::{ItemId, SkillId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReactionKind {
    Dodge,
    FightBack,
    Maneuver,
}

impl ReactionKind {
    pub const ALL: [ReactionKind; 3] = [
        ReactionKind::Dodge,
        ReactionKind::FightBack,
        ReactionKind::Maneuver,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dodge => "dodge",
            Self::FightBack => "fightBack",
            Self::Maneuver => "maneuver",
        }
    }

    pub fn label_key(self) -> &'static str {
        match self {
            Self::Dodge => "melee.reaction.dodge",
            Self::FightBack => "melee.reaction.fight_back",
            Self::Maneuver => "melee.reaction.maneuver",
        }
    }

    /// Legacy per-reaction flag name written next to `reaction`.
    fn flag(self) -> &'static str {
        match self {
            Self::Dodge => "dodging",
            Self::FightBack => "fighting_back",
            Self::Maneuver => "maneuvering",
        }
    }
}

impl fmt::Display for ReactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReactionKind {
    type Err = MeleeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded: String = s
            .chars()
            .filter(|c| !matches!(c, '-' | '_'))
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match folded.as_str() {
            "dodge" => Ok(Self::Dodge),
            "fightback" => Ok(Self::FightBack),
            "maneuver" | "manoeuvre" => Ok(Self::Maneuver),
            _ => Err(MeleeError::payload("reaction", format!("unknown reaction '{s}'"))),
        }
    }
}

/// The defender's chosen response. Exactly one is active at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Reaction {
    Dodge { skill: SkillId },
    /// The weapon is what the defender rolls damage with on a win.
    FightBack { skill: SkillId, weapon: ItemId },
    Maneuver { skill: SkillId },
}

impl Reaction {
    /// Build from loose host input. Dodge and maneuver drop any weapon.
    pub fn new(kind: ReactionKind, skill: SkillId, weapon: Option<ItemId>) -> MeleeResult<Self> {
        Ok(match kind {
            ReactionKind::Dodge => Self::Dodge { skill },
            ReactionKind::Maneuver => Self::Maneuver { skill },
            ReactionKind::FightBack => Self::FightBack {
                skill,
                weapon: weapon.ok_or(MeleeError::MissingWeapon)?,
            },
        })
    }

    pub fn kind(&self) -> ReactionKind {
        match self {
            Self::Dodge { .. } => ReactionKind::Dodge,
            Self::FightBack { .. } => ReactionKind::FightBack,
            Self::Maneuver { .. } => ReactionKind::Maneuver,
        }
    }

    pub fn skill(&self) -> &SkillId {
        match self {
            Self::Dodge { skill } | Self::FightBack { skill, .. } | Self::Maneuver { skill } => {
                skill
            }
        }
    }

    pub(crate) fn set_skill(&mut self, id: SkillId) {
        match self {
            Self::Dodge { skill } | Self::FightBack { skill, .. } | Self::Maneuver { skill } => {
                *skill = id
            }
        }
    }

    pub fn weapon(&self) -> Option<&ItemId> {
        match self {
            Self::FightBack { weapon, .. } => Some(weapon),
            _ => None,
        }
    }

    pub(crate) fn write_to(reaction: Option<&Self>, p: &mut Payload) {
        let kind = reaction.map(Self::kind);
        p.set_opt_text("reaction", kind.map(ReactionKind::as_str));
        for k in ReactionKind::ALL {
            p.set_bool(k.flag(), kind == Some(k));
        }
        p.set_opt_text("skill_id", reaction.map(Self::skill));
        p.set_opt_text("item_id", reaction.and_then(Self::weapon));
    }

    pub(crate) fn read_from(p: &Payload) -> MeleeResult<Option<Self>> {
        let kind = match p.opt_text("reaction")? {
            Some(s) => Some(s.parse::<ReactionKind>()?),
            // Older payloads only carried the three flags.
            None => {
                let mut found = None;
                for k in ReactionKind::ALL {
                    if p.bool_or(k.flag(), false)? {
                        found = Some(k);
                        break;
                    }
                }
                found
            }
        };
        let Some(kind) = kind else {
            return Ok(None);
        };
        let skill = SkillId::new(p.text("skill_id")?);
        let weapon = p.opt_text("item_id")?.map(ItemId::new);
        Self::new(kind, skill, weapon).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fight_back_needs_a_weapon() {
        let err = Reaction::new(ReactionKind::FightBack, "brawl".into(), None).unwrap_err();
        assert!(matches!(err, MeleeError::MissingWeapon));
    }

    #[test]
    fn dodge_discards_weapon() {
        let r = Reaction::new(ReactionKind::Dodge, "dodge".into(), Some("knife".into())).unwrap();
        assert_eq!(r.weapon(), None);
        assert_eq!(r.kind(), ReactionKind::Dodge);
    }

    #[test]
    fn exactly_one_flag_is_written() {
        let r = Reaction::new(ReactionKind::Maneuver, "fighting".into(), None).unwrap();
        let mut p = Payload::new();
        Reaction::write_to(Some(&r), &mut p);
        assert!(p.bool_or("maneuvering", false).unwrap());
        assert!(!p.bool_or("dodging", false).unwrap());
        assert!(!p.bool_or("fighting_back", false).unwrap());
        assert_eq!(Reaction::read_from(&p).unwrap(), Some(r));
    }

    #[test]
    fn legacy_flags_are_read() {
        let mut p = Payload::new();
        p.set_bool("fighting_back", true);
        p.set_text("skill_id", "brawl");
        p.set_text("item_id", "club");
        assert_eq!(
            Reaction::read_from(&p).unwrap(),
            Some(Reaction::FightBack {
                skill: "brawl".into(),
                weapon: "club".into()
            })
        );
    }
}
