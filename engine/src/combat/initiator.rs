//! The attacking side of a melee exchange.

use tracing::{debug, info};

use crate::checks::{CheckResult, SuccessLevel};
use crate::combat::badge::RollBadge;
use crate::combat::modifiers::{Modifier, Modifiers};
use crate::combat::resolution::Resolution;
use crate::combat::target::Target;
use crate::combat::{DamageRoll, Side};
use crate::error::{MeleeError, MeleeResult};
use crate::payload::{Payload, Record, RecordId};
use crate::table::{ActorKey, ItemId, RecordStore, Session, SkillId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Initiator {
    pub id: RecordId,
    pub actor_key: ActorKey,
    pub item_id: ItemId,
    /// The token being attacked, if one was targeted.
    pub target_key: Option<ActorKey>,
    pub modifiers: Modifiers,
    pub resolved: bool,
    pub rolled: bool,
    pub skill_id: Option<SkillId>,
    pub check: Option<CheckResult>,
    pub target_record: Option<RecordId>,
    pub resolution_record: Option<RecordId>,
    pub published: bool,
}

impl Initiator {
    /// Open a new attack card and persist it.
    pub fn start(
        records: &mut dyn RecordStore,
        actor_key: ActorKey,
        item_id: ItemId,
        target_key: Option<ActorKey>,
    ) -> Self {
        let mut initiator = Self {
            id: RecordId::new(""),
            actor_key,
            item_id,
            target_key,
            modifiers: Modifiers::default(),
            resolved: false,
            rolled: false,
            skill_id: None,
            check: None,
            target_record: None,
            resolution_record: None,
            published: false,
        };
        initiator.id = records.create_record(initiator.to_payload());
        debug!(record = %initiator.id, actor = %initiator.actor_key, "melee attack started");
        initiator
    }

    /// `Ok(None)` when no record has that id.
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
        if self.rolled {
            return Err(MeleeError::AlreadyRolled(Side::Initiator));
        }
        let on = self.modifiers.toggle(modifier);
        debug!(record = %self.id, %modifier, on, "initiator modifier toggled");
        if broadcast {
            self.save(session.records)?;
        }
        Ok(on)
    }

    /// [`toggle_modifier`](Self::toggle_modifier) by host flag name.
    pub fn toggle_flag(
        &mut self,
        session: &mut Session<'_>,
        name: &str,
        broadcast: bool,
    ) -> MeleeResult<bool> {
        let modifier: Modifier = name.parse()?;
        self.toggle_modifier(session, modifier, broadcast)
    }

    /// Roll the attack. A roll is final; only luck can change it afterwards.
    pub fn perform_check(
        &mut self,
        session: &mut Session<'_>,
        skill_id: &SkillId,
    ) -> MeleeResult<CheckResult> {
        if self.rolled {
            return Err(MeleeError::AlreadyRolled(Side::Initiator));
        }
        let actor = session.actor(&self.actor_key)?;
        let weapon = actor.weapon(&self.item_id)?;
        let skill = actor.skill(skill_id)?;
        if !weapon.skills.contains(skill_id) {
            return Err(MeleeError::SkillNotUsable {
                skill: skill_id.to_string(),
                item: self.item_id.to_string(),
            });
        }

        // Automatic hits never reach the defender.
        let defender = match &self.target_key {
            Some(key) if !self.modifiers.auto_success => Some(session.token(key)?),
            _ => None,
        };

        let dice = self.modifiers.attack_dice();
        let mut check = CheckResult::roll(session.roller, skill.value, dice);
        info!(
            actor = %actor.name,
            weapon = %weapon.name,
            skill = %skill.name,
            value = ?check.value,
            dice,
            level = %check.level,
            "attack rolled"
        );

        if let Some(token) = defender {
            let target = Target::spawn(
                session.records,
                token.key,
                self.id.clone(),
                self.actor_key.clone(),
            );
            debug!(defender = %token.name, record = %target.id, "defender asked to react");
            self.target_record = Some(target.id);
        }
        if self.modifiers.auto_success {
            check.force_pass();
        }

        self.skill_id = Some(skill_id.clone());
        self.check = Some(check.clone());
        self.rolled = true;
        self.resolved = true;
        self.save(session.records)?;
        Ok(check)
    }

    /// Publish the rolled attack. Unopposed, non-automatic attacks get their
    /// resolution record here; the call can be repeated without re-rolling.
    pub fn publish_result(&mut self, session: &mut Session<'_>) -> MeleeResult<RollBadge> {
        let check = self.check.as_ref().ok_or(MeleeError::NotRolled(Side::Initiator))?;
        let badge = RollBadge::of(check);
        if self.target_record.is_none()
            && !self.modifiers.auto_success
            && self.resolution_record.is_none()
        {
            let resolution = Resolution::create(session.records, self.id.clone(), None);
            self.resolution_record = Some(resolution.id);
        }
        self.published = true;
        self.save(session.records)?;
        debug!(record = %self.id, tier = badge.tier.as_str(), "initiator published");
        Ok(badge)
    }

    /// Resolve from this side alone when the defender never answered.
    pub fn proceed_unopposed(&mut self, session: &mut Session<'_>) -> MeleeResult<Resolution> {
        if !self.rolled {
            return Err(MeleeError::NotRolled(Side::Initiator));
        }
        if let Some(id) = &self.resolution_record {
            if let Some(existing) = Resolution::load(session.records, id)? {
                return Ok(existing);
            }
        }
        let spawned = match &self.target_record {
            Some(id) => Target::load(session.records, id)?,
            None => None,
        };
        if spawned.as_ref().is_some_and(|t| t.rolled) {
            return Err(MeleeError::AlreadyRolled(Side::Target));
        }

        let resolution = Resolution::create(session.records, self.id.clone(), None);
        if let Some(mut target) = spawned {
            target.close(session.records, resolution.id.clone())?;
        }
        self.resolution_record = Some(resolution.id.clone());
        self.save(session.records)?;
        Ok(resolution)
    }

    /// Spend `luck_cost` luck to raise the stored outcome to `level`.
    pub fn upgrade_check(
        &mut self,
        session: &mut Session<'_>,
        luck_cost: u32,
        level: SuccessLevel,
    ) -> MeleeResult<()> {
        let check = self.check.as_mut().ok_or(MeleeError::NotRolled(Side::Initiator))?;
        check.check_upgrade(level)?;
        session.pay_luck(&self.actor_key, luck_cost)?;
        check.apply_upgrade(level)?;
        info!(record = %self.id, luck_cost, %level, "attack upgraded with luck");
        self.save(session.records)
    }

    pub fn badge(&self) -> Option<RollBadge> {
        self.check.as_ref().map(RollBadge::of)
    }

    /// Damage offered straight from the attack card: only automatic hits
    /// skip the opposed exchange.
    pub fn damage_offer(&self) -> Option<DamageRoll> {
        let check = self.check.as_ref()?;
        if !self.modifiers.auto_success || !check.is_success() {
            return None;
        }
        Some(DamageRoll {
            side: Side::Initiator,
            actor: self.actor_key.clone(),
            item: self.item_id.clone(),
            critical: check.critical_damage(),
        })
    }
}

impl Record for Initiator {
    const KIND: &'static str = "initiator";

    fn to_payload(&self) -> Payload {
        let mut p = Payload::kind(Self::KIND);
        p.set_text("actor_key", self.actor_key.as_str());
        p.set_text("item_id", self.item_id.as_str());
        p.set_opt_text("target_key", self.target_key.as_ref());
        self.modifiers.write_to(&mut p);
        p.set_bool("resolved", self.resolved);
        p.set_bool("rolled", self.rolled);
        p.set_opt_text("skill_id", self.skill_id.as_ref());
        if let Some(check) = &self.check {
            check.write_to(&mut p);
        }
        p.set_opt_text("target_record", self.target_record.as_ref().map(RecordId::as_str));
        p.set_opt_text("resolution_record", self.resolution_record.as_ref().map(RecordId::as_str));
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
            item_id: ItemId::new(p.text("item_id")?),
            target_key: p.opt_text("target_key")?.map(ActorKey::new),
            modifiers: Modifiers::read_from(p)?,
            resolved: p.bool_or("resolved", false)?,
            rolled: p.bool_or("rolled", false)?,
            skill_id: p.opt_text("skill_id")?.map(SkillId::new),
            check: CheckResult::read_from(p)?,
            target_record: p.opt_text("target_record")?.map(RecordId::new),
            resolution_record: p.opt_text("resolution_record")?.map(RecordId::new),
            published: p.bool_or("published", false)?,
        })
    }
}
