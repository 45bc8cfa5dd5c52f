use std::{fs, path::PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use engine::api::{
    builtin_config, load_config, simulate_melee, ActorSpec, MeleeConfig, MeleeReport,
    ReactionSpec, WeaponSpec,
};
use engine::checks::CheckResult;
use engine::combat::{decide, RollBadge};
use engine::{Dice, ReactionKind, SuccessLevel};
use indexmap::IndexMap;
use tracing::Level;

const BRAWL: &str = "fighting_brawl";
const FISTS: &str = "unarmed";

#[derive(Subcommand)]
enum Cmd {
    /// Run one opposed melee exchange
    Melee {
        /// Scenario file (.json, .yaml or .yml)
        #[arg(long, conflicts_with = "builtin")]
        scenario: Option<PathBuf>,
        /// Built-in scenario id
        #[arg(long)]
        builtin: Option<String>,
        /// Attacker brawl skill (flag mode)
        #[arg(long, default_value_t = 50)]
        attacker_skill: u32,
        /// Attacker luck pool (flag mode)
        #[arg(long, default_value_t = 0)]
        attacker_luck: u32,
        /// Defender brawl skill; omit for an unopposed swing
        #[arg(long)]
        defender_skill: Option<u32>,
        /// Defender dodge skill (flag mode)
        #[arg(long, default_value_t = 30)]
        defender_dodge: u32,
        /// Defender reaction: dodge | fightBack | maneuver
        #[arg(long)]
        reaction: Option<ReactionKind>,
        /// Attacker modifier, repeatable (outnumbered, surprised, advantage, ...)
        #[arg(long = "modifier")]
        modifiers: Vec<String>,
        /// Defender modifier, repeatable (advantage, disadvantage)
        #[arg(long = "defender-modifier")]
        defender_modifiers: Vec<String>,
        /// Level the attacker tries to buy with luck after a failed roll
        #[arg(long)]
        luck_to: Option<SuccessLevel>,
        /// RNG seed for determinism
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
        /// Write every record the exchange produced to this file
        #[arg(long)]
        records: Option<PathBuf>,
    },
    /// Apply the melee table to two success levels
    Resolve {
        /// Attacker success level (name or -1..=4)
        #[arg(long, allow_hyphen_values = true)]
        initiator: SuccessLevel,
        /// Defender success level; omit for an unopposed attack
        #[arg(long, allow_hyphen_values = true, requires = "reaction")]
        target: Option<SuccessLevel>,
        /// Defender reaction
        #[arg(long)]
        reaction: Option<ReactionKind>,
        /// Print the decision as JSON
        #[arg(long)]
        json: bool,
    },
    /// Roll a single percentile check
    Check {
        /// Skill value to roll under
        #[arg(long)]
        skill: u32,
        /// Bonus (positive) or penalty (negative) dice, up to three
        #[arg(
            long,
            default_value_t = 0,
            allow_hyphen_values = true,
            value_parser = clap::value_parser!(i32).range(-3..=3)
        )]
        dice: i32,
        /// RNG seed for determinism
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
}

#[derive(Parser)]
#[command(name = "melee-cli")]
#[command(about = "Opposed melee checks harness")]
struct Cli {
    /// Log engine events down to debug level
    #[arg(long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    cmd: Cmd,
}

fn brawler(name: &str, brawl: u32, dodge: u32, luck: u32) -> ActorSpec {
    ActorSpec {
        name: name.to_string(),
        luck,
        skills: IndexMap::from([(BRAWL.to_string(), brawl), ("dodge".to_string(), dodge)]),
        weapons: IndexMap::from([(
            FISTS.to_string(),
            WeaponSpec {
                name: Some("Unarmed".to_string()),
                skills: vec![BRAWL.to_string()],
            },
        )]),
    }
}

fn print_report(report: &MeleeReport) {
    for line in &report.log {
        println!("{line}");
    }
    match report.outcome {
        Some(outcome) => println!(
            "outcome={} winner={} loser={} damage={}{}",
            outcome.as_str(),
            report.winner.map(|s| s.as_str()).unwrap_or("none"),
            report.loser.map(|s| s.as_str()).unwrap_or("none"),
            report.roll_damage,
            if report.critical_damage { " (critical)" } else { "" }
        ),
        None => println!(
            "outcome=automatic damage={}{}",
            report.roll_damage,
            if report.critical_damage { " (critical)" } else { "" }
        ),
    }
    if let Some(roll) = &report.damage {
        println!("roll damage: {} with {}", roll.actor, roll.item);
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .with_writer(std::io::stderr)
        .init();

    match cli.cmd {
        Cmd::Melee {
            scenario,
            builtin,
            attacker_skill,
            attacker_luck,
            defender_skill,
            defender_dodge,
            reaction,
            modifiers,
            defender_modifiers,
            luck_to,
            seed,
            json,
            records,
        } => {
            let cfg = if let Some(path) = scenario {
                load_config(&path)?
            } else if let Some(id) = builtin {
                builtin_config(&id)?
            } else {
                if reaction.is_some() && defender_skill.is_none() {
                    bail!("--reaction needs a --defender-skill");
                }
                let reaction = reaction.map(|kind| ReactionSpec {
                    kind,
                    skill: if kind == ReactionKind::Dodge { "dodge" } else { BRAWL }.to_string(),
                    weapon: (kind == ReactionKind::FightBack).then(|| FISTS.to_string()),
                });
                MeleeConfig {
                    attacker: brawler("Attacker", attacker_skill, 30, attacker_luck),
                    defender: defender_skill.map(|s| brawler("Defender", s, defender_dodge, 0)),
                    weapon: FISTS.to_string(),
                    skill: BRAWL.to_string(),
                    modifiers,
                    reaction,
                    defender_modifiers,
                    seed,
                    attacker_luck_to: luck_to,
                }
            };
            let report = simulate_melee(cfg)?;
            if let Some(path) = records {
                let text = serde_json::to_string_pretty(&report.records)?;
                fs::write(&path, text)
                    .with_context(|| format!("failed to write records: {}", path.display()))?;
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
        }
        Cmd::Resolve {
            initiator,
            target,
            reaction,
            json,
        } => {
            let defence = match (target, reaction) {
                (Some(level), Some(kind)) => Some((level, kind)),
                (None, Some(_)) => bail!("--reaction needs a --target level"),
                _ => None,
            };
            let decision = decide(initiator, defence);
            if json {
                println!("{}", serde_json::to_string_pretty(&decision)?);
            } else {
                println!(
                    "{} winner={} loser={} damage={} critical={}",
                    decision.outcome.as_str(),
                    decision.winner.map(|s| s.as_str()).unwrap_or("none"),
                    decision.loser.map(|s| s.as_str()).unwrap_or("none"),
                    decision.roll_damage,
                    decision.critical_damage
                );
            }
        }
        Cmd::Check { skill, dice, seed } => {
            let mut roller = Dice::from_seed(seed);
            let check = CheckResult::roll(&mut roller, skill, dice);
            let badge = RollBadge::of(&check);
            println!(
                "d100={} vs {} ({:+} dice) => {} [{}]",
                check.value.unwrap_or(0),
                skill,
                dice,
                check.level,
                badge.tier.as_str()
            );
            for level in SuccessLevel::ALL {
                if let Some(cost) = check.luck_cost_to(level) {
                    println!("  luck to {level}: {cost}");
                }
            }
        }
    }
    Ok(())
}
