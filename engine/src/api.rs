use std::{fs, path::Path};

use anyhow::{Context, Result, anyhow};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::checks::{CheckResult, SuccessLevel};
use crate::combat::{
    DamageRoll, Initiator, Outcome, Reaction, ReactionKind, Resolution, Side, Target,
};
use crate::error::MeleeError;
use crate::table::{
    Actor, ActorKey, ItemId, MemoryDirectory, MemoryRecords, Session, Skill, SkillId,
    Weapon,
};
use crate::Dice;

const SCENE: &str = "scene";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeaponSpec {
    #[serde(default)]
    pub name: Option<String>,
    pub skills: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorSpec {
    pub name: String,
    #[serde(default)]
    pub luck: u32,
    /// Skill id → percentile value.
    #[serde(default)]
    pub skills: IndexMap<String, u32>,
    #[serde(default)]
    pub weapons: IndexMap<String, WeaponSpec>,
}

impl ActorSpec {
    fn into_actor(self, key: ActorKey) -> Actor {
        Actor {
            key,
            name: self.name,
            luck: self.luck,
            skills: self
                .skills
                .into_iter()
                .map(|(id, value)| (SkillId::new(id.clone()), Skill { name: id, value }))
                .collect(),
            weapons: self
                .weapons
                .into_iter()
                .map(|(id, w)| {
                    let weapon = Weapon {
                        name: w.name.unwrap_or_else(|| id.clone()),
                        skills: w.skills.into_iter().map(SkillId::new).collect(),
                    };
                    (ItemId::new(id), weapon)
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactionSpec {
    pub kind: ReactionKind,
    pub skill: String,
    #[serde(default)]
    pub weapon: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct MeleeConfig {
    pub attacker: ActorSpec,
    #[serde(default)]
    pub defender: Option<ActorSpec>,
    pub weapon: String,
    pub skill: String,
    #[serde(default)]
    pub modifiers: Vec<String>,
    /// Without a reaction the defender never answers and the attack is
    /// resolved unopposed.
    #[serde(default)]
    pub reaction: Option<ReactionSpec>,
    #[serde(default)]
    pub defender_modifiers: Vec<String>,
    #[serde(default)]
    pub seed: u64,
    /// Level the attacker tries to buy with luck when the roll falls short.
    #[serde(default)]
    pub attacker_luck_to: Option<SuccessLevel>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct MeleeReport {
    pub outcome: Option<Outcome>,
    pub winner: Option<Side>,
    pub loser: Option<Side>,
    pub roll_damage: bool,
    pub critical_damage: bool,
    pub initiator_level: SuccessLevel,
    pub target_level: Option<SuccessLevel>,
    pub damage: Option<DamageRoll>,
    pub log: Vec<String>,
    pub records: MemoryRecords,
}

/// Run one full exchange against in-memory collaborators.
pub fn simulate_melee(cfg: MeleeConfig) -> Result<MeleeReport> {
    let mut logs = Vec::new();
    let mut directory = MemoryDirectory::new();
    let mut records = MemoryRecords::new();
    let mut dice = Dice::from_seed(cfg.seed);

    let attacker_key = ActorKey::for_token(SCENE, "attacker");
    let defender_key = cfg
        .defender
        .as_ref()
        .map(|_| ActorKey::for_token(SCENE, "defender"));
    directory.insert(cfg.attacker.clone().into_actor(attacker_key.clone()));
    if let (Some(spec), Some(key)) = (cfg.defender.clone(), defender_key.clone()) {
        directory.insert(spec.into_actor(key));
    }
    let attacker_name = cfg.attacker.name.clone();
    let defender_name = cfg
        .defender
        .as_ref()
        .map(|d| d.name.clone())
        .unwrap_or_default();

    let mut session = Session::new(&mut directory, &mut records, &mut dice);

    let mut initiator = Initiator::start(
        session.records,
        attacker_key.clone(),
        ItemId::new(&cfg.weapon),
        defender_key,
    );
    logs.push(format!(
        "[START] {} attacks {} with {}",
        attacker_name,
        if defender_name.is_empty() { "nobody" } else { defender_name.as_str() },
        cfg.weapon
    ));
    for name in &cfg.modifiers {
        initiator.toggle_flag(&mut session, name, true)?;
        logs.push(format!("[MOD][{}] {}", attacker_name, name));
    }

    let attack = initiator.perform_check(&mut session, &SkillId::new(&cfg.skill))?;
    log_check(&mut logs, "ATTACK", &attacker_name, &cfg.skill, &attack);

    if let Some(goal) = cfg.attacker_luck_to {
        try_luck(&mut logs, &mut session, &mut initiator, &attacker_name, &attack, goal)?;
    }
    let badge = initiator.publish_result(&mut session)?;
    logs.push(format!("[CARD][{}] {}", attacker_name, badge.tier.as_str()));

    let mut target_level = None;
    let resolution_id = match initiator.target_record.clone() {
        Some(target_id) => {
            let mut target = Target::load(session.records, &target_id)?
                .ok_or_else(|| anyhow!("target record {target_id} vanished"))?;
            match &cfg.reaction {
                Some(spec) => {
                    for name in &cfg.defender_modifiers {
                        target.toggle_flag(&mut session, name, true)?;
                        logs.push(format!("[MOD][{}] {}", defender_name, name));
                    }
                    let reaction = Reaction::new(
                        spec.kind,
                        SkillId::new(&spec.skill),
                        spec.weapon.as_deref().map(ItemId::new),
                    )?;
                    target.select_reaction(&mut session, reaction)?;
                    let defence = target.perform_check(&mut session, None)?;
                    log_check(&mut logs, "DEFEND", &defender_name, &spec.skill, &defence);
                    target.publish_result(&mut session)?;
                    target_level = Some(defence.level);
                    target.resolution_record.clone()
                }
                None => {
                    logs.push(format!("[DEFEND] {} does not react", defender_name));
                    Some(initiator.proceed_unopposed(&mut session)?.id)
                }
            }
        }
        None => initiator.resolution_record.clone(),
    };

    let initiator_level = initiator
        .check
        .as_ref()
        .map(|c| c.level)
        .unwrap_or(attack.level);

    let Some(resolution_id) = resolution_id else {
        // Automatic hit: the attack card offers damage itself.
        let damage = initiator.damage_offer();
        logs.push(format!(
            "[RESOLVE] automatic hit by {} (critical={})",
            attacker_name,
            damage.as_ref().is_some_and(|d| d.critical)
        ));
        drop(session);
        return Ok(MeleeReport {
            outcome: None,
            winner: damage.as_ref().map(|d| d.side),
            loser: None,
            roll_damage: damage.is_some(),
            critical_damage: damage.as_ref().is_some_and(|d| d.critical),
            initiator_level,
            target_level: None,
            damage,
            log: logs,
            records,
        });
    };

    let mut resolution = Resolution::load(session.records, &resolution_id)?
        .ok_or_else(|| anyhow!("resolution record {resolution_id} vanished"))?;
    let decision = resolution.resolve(&mut session)?;
    let damage = resolution.damage_roll().cloned();
    logs.push(format!(
        "[RESOLVE] {} winner={} damage={}{}",
        decision.outcome.as_str(),
        decision.winner.map(Side::as_str).unwrap_or("none"),
        decision.roll_damage,
        if decision.critical_damage { " (critical)" } else { "" }
    ));
    drop(session);

    Ok(MeleeReport {
        outcome: Some(decision.outcome),
        winner: decision.winner,
        loser: decision.loser,
        roll_damage: decision.roll_damage,
        critical_damage: decision.critical_damage,
        initiator_level,
        target_level,
        damage,
        log: logs,
        records,
    })
}

fn try_luck(
    logs: &mut Vec<String>,
    session: &mut Session<'_>,
    initiator: &mut Initiator,
    name: &str,
    attack: &CheckResult,
    goal: SuccessLevel,
) -> Result<()> {
    let Some(cost) = attack.luck_cost_to(goal) else {
        return Ok(());
    };
    match initiator.upgrade_check(session, cost, goal) {
        Ok(()) => {
            logs.push(format!("[LUCK][{}] spends {} luck → {}", name, cost, goal));
            Ok(())
        }
        Err(e @ MeleeError::InsufficientLuck { .. }) => {
            logs.push(format!("[LUCK][{}] {}", name, e));
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn log_check(logs: &mut Vec<String>, tag: &str, name: &str, skill: &str, check: &CheckResult) {
    let value = check
        .value
        .map(|v| v.to_string())
        .unwrap_or_else(|| "--".to_string());
    logs.push(format!(
        "[{}][{}] {} d100={} vs {} ({:+} dice) → {}{}",
        tag,
        name,
        skill,
        value,
        check.skill_value,
        check.dice_modifier,
        check.level,
        if check.forced_pass { " (automatic)" } else { "" }
    ));
}

/// Load a scenario; `.yaml`/`.yml` files are read as YAML, anything else as JSON.
pub fn load_config(path: &Path) -> Result<MeleeConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read scenario: {}", path.display()))?;
    let yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml" | "yml")
    );
    if yaml {
        serde_yaml::from_str(&text)
            .with_context(|| format!("failed to parse scenario YAML: {}", path.display()))
    } else {
        serde_json::from_str(&text)
            .with_context(|| format!("failed to parse scenario JSON: {}", path.display()))
    }
}

pub fn builtin_config(id: &str) -> Result<MeleeConfig> {
    let text = crate::content::builtin_scenarios()
        .get(id)
        .copied()
        .ok_or_else(|| anyhow!("unknown builtin scenario '{id}'"))?;
    serde_json::from_str(text).with_context(|| format!("builtin scenario '{id}' is malformed"))
}
