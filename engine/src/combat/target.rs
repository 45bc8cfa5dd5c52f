//! The defending side: reacts to an attack and rolls back.

use tracing::{debug, info};

use crate::checks::{CheckResult, SuccessLevel};
use crate::combat::badge::RollBadge;
use crate::combat::modifiers::{Modifier, Modifiers};
use crate::combat::reaction::{Reaction, ReactionKind};
use crate::combat::resolution::Resolution;
use crate::combat::Side;
use crate::error::{MeleeError, MeleeResult};
use crate::payload::{Payload, Record, RecordId};
use crate::table::{ActorKey, ItemId, RecordStore, Session, SkillId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub id: RecordId,
    pub actor_key: ActorKey,
    /// Record of the attack this card answers.
    pub parent: RecordId,
    pub initiator_key: ActorKey,
    pub modifiers: Modifiers,
    pub reaction: Option<Reaction>,
    pub resolved: bool,
    pub rolled: bool,
    pub check: Option<CheckResult>,
    pub resolution_record: Option<RecordId>,
    pub published: bool,
}

impl Target {
    /// Create the defence card linked to the attack record `parent`.
    pub fn spawn(
        records: &mut dyn RecordStore,
        actor_key: ActorKey,
        parent: RecordId,
        initiator_key: ActorKey,
    ) -> Self {
        let mut target = Self {
            id: RecordId::new(""),
            actor_key,
            parent,
            initiator_key,
            modifiers: Modifiers::default(),
            reaction: None,
            resolved: false,
            rolled: false,
            check: None,
            resolution_record: None,
            published: false,
        };
        target.id = records.create_record(target.to_payload());
        debug!(
            record = %target.id,
            parent = %target.parent,
            actor = %target.actor_key,
            "defence card created"
        );
        target
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

    pub fn toggle_modifier(
        &mut self,
        session: &mut Session<'_>,
        modifier: Modifier,
        broadcast: bool,
    ) -> MeleeResult<bool> {
        if modifier.initiator_only() {
            return Err(MeleeError::ModifierNotApplicable(modifier.key()));
        }
        if self.rolled {
            return Err(MeleeError::AlreadyRolled(Side::Target));
        }
        self.ensure_open(session.records)?;
        let on = self.modifiers.toggle(modifier);
        debug!(record = %self.id, %modifier, on, "target modifier toggled");
        if broadcast {
            self.save(session.records)?;
        }
        Ok(on)
    }

    pub fn toggle_flag(
        &mut self,
        session: &mut Session<'_>,
        name: &str,
        broadcast: bool,
    ) -> MeleeResult<bool> {
        let modifier: Modifier = name.parse()?;
        self.toggle_modifier(session, modifier, broadcast)
    }

    pub fn reaction_kind(&self) -> Option<ReactionKind> {
        self.reaction.as_ref().map(Reaction::kind)
    }

    /// True once the attack was resolved unopposed before this card rolled.
    pub fn is_closed(&self) -> bool {
        !self.rolled && self.resolution_record.is_some()
    }

    /// Close an unrolled card because the attack went ahead without it.
    pub(crate) fn close(
        &mut self,
        records: &mut dyn RecordStore,
        resolution: RecordId,
    ) -> MeleeResult<()> {
        if self.rolled {
            return Err(MeleeError::AlreadyRolled(Side::Target));
        }
        debug!(record = %self.id, resolution = %resolution, "defence card closed");
        self.resolution_record = Some(resolution);
        self.save(records)
    }

    /// The stored record wins: another handle may have closed the card.
    fn ensure_open(&mut self, records: &dyn RecordStore) -> MeleeResult<()> {
        if self.rolled {
            return Ok(());
        }
        if self.resolution_record.is_none() {
            if let Some(stored) = Self::load(records, &self.id)? {
                self.resolution_record = stored.resolution_record;
            }
        }
        match &self.resolution_record {
            Some(id) => Err(MeleeError::AlreadyResolved(id.to_string())),
            None => Ok(()),
        }
    }

    /// Choose how to answer the attack, replacing any earlier choice.
    pub fn select_reaction(
        &mut self,
        session: &mut Session<'_>,
        reaction: Reaction,
    ) -> MeleeResult<()> {
        if self.rolled {
            return Err(MeleeError::AlreadyRolled(Side::Target));
        }
        self.ensure_open(session.records)?;
        debug!(
            record = %self.id,
            reaction = %reaction.kind(),
            skill = %reaction.skill(),
            "reaction selected"
        );
        self.reaction = Some(reaction);
        self.save(session.records)
    }

    /// [`select_reaction`](Self::select_reaction) from loose host input.
    pub fn select(
        &mut self,
        session: &mut Session<'_>,
        kind: ReactionKind,
        skill_id: SkillId,
        weapon_id: Option<ItemId>,
    ) -> MeleeResult<()> {
        let reaction = Reaction::new(kind, skill_id, weapon_id)?;
        self.select_reaction(session, reaction)
    }

    /// Roll the defence. `skill_id` overrides the skill picked with the
    /// reaction; `None` rolls the reaction's own skill.
    pub fn perform_check(
        &mut self,
        session: &mut Session<'_>,
        skill_id: Option<&SkillId>,
    ) -> MeleeResult<CheckResult> {
        if self.rolled {
            return Err(MeleeError::AlreadyRolled(Side::Target));
        }
        self.ensure_open(session.records)?;
        let reaction = self.reaction.as_ref().ok_or(MeleeError::NoReaction)?;
        let skill_id = skill_id.unwrap_or(reaction.skill()).clone();
        let actor = session.actor(&self.actor_key)?;
        let skill = actor.skill(&skill_id)?;
        if let Some(item) = reaction.weapon() {
            if !actor.weapon(item)?.skills.contains(&skill_id) {
                return Err(MeleeError::SkillNotUsable {
                    skill: skill_id.to_string(),
                    item: item.to_string(),
                });
            }
        }

        let dice = self.modifiers.defence_dice();
        let check = CheckResult::roll(session.roller, skill.value, dice);
        info!(
            actor = %actor.name,
            reaction = %reaction.kind(),
            skill = %skill.name,
            value = ?check.value,
            dice,
            level = %check.level,
            "defence rolled"
        );

        if let Some(reaction) = self.reaction.as_mut() {
            reaction.set_skill(skill_id);
        }
        self.check = Some(check.clone());
        self.rolled = true;
        self.resolved = true;
        self.save(session.records)?;
        Ok(check)
    }

    /// Publish the defence. A rolled defence always gets a resolution record.
    pub fn publish_result(&mut self, session: &mut Session<'_>) -> MeleeResult<RollBadge> {
        self.ensure_open(session.records)?;
        let check = self.check.as_ref().ok_or(MeleeError::NotRolled(Side::Target))?;
        let badge = RollBadge::of(check);
        if self.resolution_record.is_none() {
            let resolution =
                Resolution::create(session.records, self.parent.clone(), Some(self.id.clone()));
            self.resolution_record = Some(resolution.id);
        }
        self.published = true;
        self.save(session.records)?;
        debug!(record = %self.id, tier = badge.tier.as_str(), "target published");
        Ok(badge)
    }

    pub fn upgrade_check(
        &mut self,
        session: &mut Session<'_>,
        luck_cost: u32,
        level: SuccessLevel,
    ) -> MeleeResult<()> {
        let check = self.check.as_mut().ok_or(MeleeError::NotRolled(Side::Target))?;
        check.check_upgrade(level)?;
        session.pay_luck(&self.actor_key, luck_cost)?;
        check.apply_upgrade(level)?;
        info!(record = %self.id, luck_cost, %level, "defence upgraded with luck");
        self.save(session.records)
    }

    pub fn badge(&self) -> Option<RollBadge> {
        self.check.as_ref().map(RollBadge::of)
    }
}

impl Record for Target {
    const KIND: &'static str = "target";

    fn to_payload(&self) -> Payload {
        let mut p = Payload::kind(Self::KIND);
        p.set_text("actor_key", self.actor_key.as_str());
        p.set_text("parent_record", self.parent.as_str());
        p.set_text("initiator_key", self.initiator_key.as_str());
        self.modifiers.write_to(&mut p);
        Reaction::write_to(self.reaction.as_ref(), &mut p);
        p.set_bool("resolved", self.resolved);
        p.set_bool("rolled", self.rolled);
        if let Some(check) = &self.check {
            check.write_to(&mut p);
        }
        p.set_opt_text(
            "resolution_record",
            self.resolution_record.as_ref().map(RecordId::as_str),
        );
        p.set_bool("published", self.published);
        if self.published {
            p.set_opt_text("tier", self.badge().map(|b| b.tier.as_str()));
        }
        p
    }

    fn from_payload(id: RecordId, p: &Payload) -> MeleeResult<Self> {
        p.expect_kind(Self::KIND)?;
        Ok(Self {
            id,
            actor_key: ActorKey::new(p.text("actor_key")?),
            parent: RecordId::new(p.text("parent_record")?),
            initiator_key: ActorKey::new(p.text("initiator_key")?),
            modifiers: Modifiers::read_from(p)?,
            reaction: Reaction::read_from(p)?,
            resolved: p.bool_or("resolved", false)?,
            rolled: p.bool_or("rolled", false)?,
            check: CheckResult::read_from(p)?,
            resolution_record: p.opt_text("resolution_record")?.map(RecordId::new),
            published: p.bool_or("published", false)?,
        })
    }
}
