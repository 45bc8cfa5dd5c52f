//! Comparing both sides of an exchange.
//!
//! [`decide`] is the whole rule table; [`Resolution`] loads the two records,
//! applies it once and keeps the verdict so later luck spends do not rewrite
//! the narrative unless the host asks for [`Resolution::re_resolve`].

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::checks::SuccessLevel;
use crate::combat::initiator::Initiator;
use crate::combat::reaction::ReactionKind;
use crate::combat::target::Target;
use crate::combat::{DamageRoll, Side};
use crate::error::{MeleeError, MeleeResult};
use crate::payload::{Payload, Record, RecordId};
use crate::table::{ActorKey, ItemId, RecordStore, Session};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Neither side succeeded.
    BothFailed,
    InitiatorWon,
    /// Unopposed attack that did not succeed.
    Missed,
    Dodged,
    /// The defender fought back and won.
    TargetWon,
    ManeuverSucceeded,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BothFailed => "both_failed",
            Self::InitiatorWon => "initiator_won",
            Self::Missed => "missed",
            Self::Dodged => "dodged",
            Self::TargetWon => "target_won",
            Self::ManeuverSucceeded => "maneuver_succeeded",
        }
    }

    fn parse(s: &str) -> MeleeResult<Self> {
        [
            Self::BothFailed,
            Self::InitiatorWon,
            Self::Missed,
            Self::Dodged,
            Self::TargetWon,
            Self::ManeuverSucceeded,
        ]
        .into_iter()
        .find(|o| o.as_str() == s)
        .ok_or_else(|| MeleeError::payload("outcome", format!("unknown outcome '{s}'")))
    }

    pub fn label_key(self) -> &'static str {
        match self {
            Self::BothFailed => "melee.result.both_failed",
            Self::InitiatorWon => "melee.result.initiator_won",
            Self::Missed => "melee.result.missed",
            Self::Dodged => "melee.result.dodged",
            Self::TargetWon => "melee.result.target_won",
            Self::ManeuverSucceeded => "melee.result.maneuver_succeeded",
        }
    }
}

/// Verdict of one exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub outcome: Outcome,
    pub winner: Option<Side>,
    pub loser: Option<Side>,
    pub roll_damage: bool,
    /// Winner reached extreme or better.
    pub critical_damage: bool,
}

/// Follow-up the resolution card offers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum OfferedAction {
    RollMeleeDamage(DamageRoll),
    Dodge,
}

impl OfferedAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RollMeleeDamage(_) => "roll-melee-damage",
            Self::Dodge => "dodge",
        }
    }

    pub fn label_key(&self) -> &'static str {
        match self {
            Self::RollMeleeDamage(_) => "melee.action.roll_damage",
            Self::Dodge => "melee.action.dodge",
        }
    }
}

/// Apply the melee rule table.
///
/// `target` is `None` for an unopposed attack. Ties go to the attacker when
/// fighting back or maneuvering and to the defender when dodging. When both
/// sides failed nobody wins whatever the reaction.
pub fn decide(initiator: SuccessLevel, target: Option<(SuccessLevel, ReactionKind)>) -> Decision {
    let i = initiator.as_i32();
    let (outcome, winner, loser, roll_damage) = match target {
        None if i > 0 => (Outcome::InitiatorWon, Some(Side::Initiator), None, true),
        None => (Outcome::Missed, None, None, false),
        Some((t, _)) if i <= 0 && t.as_i32() <= 0 => (Outcome::BothFailed, None, None, false),
        Some((t, kind)) => {
            let t = t.as_i32();
            match kind {
                ReactionKind::Dodge if i > t => {
                    (Outcome::InitiatorWon, Some(Side::Initiator), None, true)
                }
                ReactionKind::Dodge => (Outcome::Dodged, Some(Side::Target), None, false),
                ReactionKind::FightBack if i >= t => {
                    (Outcome::InitiatorWon, Some(Side::Initiator), Some(Side::Target), true)
                }
                ReactionKind::FightBack => {
                    (Outcome::TargetWon, Some(Side::Target), Some(Side::Initiator), true)
                }
                ReactionKind::Maneuver if i >= t => {
                    (Outcome::InitiatorWon, Some(Side::Initiator), Some(Side::Target), true)
                }
                ReactionKind::Maneuver => {
                    (Outcome::ManeuverSucceeded, Some(Side::Target), None, false)
                }
            }
        }
    };
    let winning_level = match winner {
        Some(Side::Initiator) => Some(initiator),
        Some(Side::Target) => target.map(|(t, _)| t),
        None => None,
    };
    Decision {
        outcome,
        winner,
        loser,
        roll_damage,
        critical_damage: winning_level.is_some_and(|l| l >= SuccessLevel::Extreme),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub id: RecordId,
    pub initiator_record: RecordId,
    pub target_record: Option<RecordId>,
    pub decision: Option<Decision>,
    pub action: Option<OfferedAction>,
}

impl Resolution {
    /// Persist an unresolved card. Nothing is compared yet.
    pub fn create(
        records: &mut dyn RecordStore,
        initiator_record: RecordId,
        target_record: Option<RecordId>,
    ) -> Self {
        let mut resolution = Self {
            id: RecordId::new(""),
            initiator_record,
            target_record,
            decision: None,
            action: None,
        };
        resolution.id = records.create_record(resolution.to_payload());
        tracing::debug!(record = %resolution.id, "resolution card created");
        resolution
    }

    pub fn load(records: &dyn RecordStore, id: &RecordId) -> MeleeResult<Option<Self>> {
        records
            .get_record(id)
            .map(|p| Self::from_payload(id.clone(), &p))
            .transpose()
    }

    pub fn save(&self, records: &mut dyn RecordStore) -> MeleeResult<()> {
        records.update_record(&self.id, self.to_payload())
    }

    pub fn is_resolved(&self) -> bool {
        self.decision.is_some()
    }

    /// Resolve once. A stored verdict is returned as is.
    pub fn resolve(&mut self, session: &mut Session<'_>) -> MeleeResult<Decision> {
        match self.decision {
            Some(decision) => Ok(decision),
            None => self.re_resolve(session),
        }
    }

    /// Recompute from the current state of both records and store the result.
    pub fn re_resolve(&mut self, session: &mut Session<'_>) -> MeleeResult<Decision> {
        let initiator = Initiator::load(session.records, &self.initiator_record)?
            .ok_or_else(|| MeleeError::MissingRecord(self.initiator_record.to_string()))?;
        let attack = initiator
            .check
            .as_ref()
            .ok_or(MeleeError::NotRolled(Side::Initiator))?;

        let target = match &self.target_record {
            Some(id) => Some(
                Target::load(session.records, id)?
                    .ok_or_else(|| MeleeError::MissingRecord(id.to_string()))?,
            ),
            None => None,
        };
        let defence = match &target {
            Some(t) => {
                let check = t.check.as_ref().ok_or(MeleeError::NotRolled(Side::Target))?;
                let kind = t.reaction_kind().ok_or(MeleeError::NoReaction)?;
                Some((check.level, kind))
            }
            None => None,
        };

        let decision = decide(attack.level, defence);
        let action = offered_action(&decision, &initiator, target.as_ref());
        info!(
            record = %self.id,
            outcome = decision.outcome.as_str(),
            winner = ?decision.winner,
            roll_damage = decision.roll_damage,
            critical = decision.critical_damage,
            "melee resolved"
        );

        self.decision = Some(decision);
        self.action = action;
        self.save(session.records)?;
        Ok(decision)
    }

    /// Damage roll to offer, if any.
    pub fn damage_roll(&self) -> Option<&DamageRoll> {
        match &self.action {
            Some(OfferedAction::RollMeleeDamage(roll)) => Some(roll),
            _ => None,
        }
    }
}

fn offered_action(
    decision: &Decision,
    initiator: &Initiator,
    target: Option<&Target>,
) -> Option<OfferedAction> {
    if decision.roll_damage {
        let (actor, item) = match decision.winner? {
            Side::Initiator => (initiator.actor_key.clone(), initiator.item_id.clone()),
            Side::Target => {
                let target = target?;
                let weapon = target.reaction.as_ref()?.weapon()?;
                (target.actor_key.clone(), weapon.clone())
            }
        };
        Some(OfferedAction::RollMeleeDamage(DamageRoll {
            side: decision.winner?,
            actor,
            item,
            critical: decision.critical_damage,
        }))
    } else if decision.outcome == Outcome::Dodged {
        Some(OfferedAction::Dodge)
    } else {
        None
    }
}

impl Record for Resolution {
    const KIND: &'static str = "resolution";

    fn to_payload(&self) -> Payload {
        let mut p = Payload::kind(Self::KIND);
        p.set_text("initiator_record", self.initiator_record.as_str());
        p.set_opt_text("target_record", self.target_record.as_ref().map(RecordId::as_str));
        p.set_bool("resolved", self.is_resolved());
        if let Some(d) = &self.decision {
            p.set_text("outcome", d.outcome.as_str());
            p.set_opt_text("winner", d.winner.map(Side::as_str));
            p.set_opt_text("loser", d.loser.map(Side::as_str));
            p.set_bool("roll_damage", d.roll_damage);
            p.set_bool("critical_damage", d.critical_damage);
        }
        p.set_opt_text("action", self.action.as_ref().map(OfferedAction::as_str));
        if let Some(roll) = self.damage_roll() {
            p.set_text("damage_side", roll.side.as_str());
            p.set_text("damage_actor", roll.actor.as_str());
            p.set_text("damage_item", roll.item.as_str());
        }
        p
    }

    fn from_payload(id: RecordId, p: &Payload) -> MeleeResult<Self> {
        p.expect_kind(Self::KIND)?;
        let decision = if p.bool_or("resolved", false)? {
            Some(Decision {
                outcome: Outcome::parse(p.text("outcome")?)?,
                winner: p.opt_text("winner")?.map(|s| Side::parse("winner", s)).transpose()?,
                loser: p.opt_text("loser")?.map(|s| Side::parse("loser", s)).transpose()?,
                roll_damage: p.bool_or("roll_damage", false)?,
                critical_damage: p.bool_or("critical_damage", false)?,
            })
        } else {
            None
        };
        let action = match p.opt_text("action")? {
            None => None,
            Some("dodge") => Some(OfferedAction::Dodge),
            Some("roll-melee-damage") => Some(OfferedAction::RollMeleeDamage(DamageRoll {
                side: Side::parse("damage_side", p.text("damage_side")?)?,
                actor: ActorKey::new(p.text("damage_actor")?),
                item: ItemId::new(p.text("damage_item")?),
                critical: p.bool_or("critical_damage", false)?,
            })),
            Some(other) => {
                return Err(MeleeError::payload("action", format!("unknown action '{other}'")));
            }
        };
        Ok(Self {
            id,
            initiator_record: RecordId::new(p.text("initiator_record")?),
            target_record: p.opt_text("target_record")?.map(RecordId::new),
            decision,
            action,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use SuccessLevel::*;

    #[test]
    fn dodge_wins_ties() {
        let d = decide(Extreme, Some((Extreme, ReactionKind::Dodge)));
        assert_eq!(d.outcome, Outcome::Dodged);
        assert_eq!(d.winner, Some(Side::Target));
        assert!(!d.roll_damage);
    }

    #[test]
    fn attacker_wins_fight_back_ties() {
        let d = decide(Hard, Some((Hard, ReactionKind::FightBack)));
        assert_eq!((d.winner, d.loser), (Some(Side::Initiator), Some(Side::Target)));
        assert!(d.roll_damage);
        assert!(!d.critical_damage);
    }

    #[test]
    fn fumble_against_failure_is_both_failed() {
        let d = decide(Fumble, Some((Failure, ReactionKind::Maneuver)));
        assert_eq!(d.outcome, Outcome::BothFailed);
        assert_eq!(d.winner, None);
    }

    #[test]
    fn failed_defence_loses_to_any_success() {
        let d = decide(Regular, Some((Fumble, ReactionKind::Dodge)));
        assert_eq!(d.winner, Some(Side::Initiator));
        assert!(d.roll_damage);
    }
}
