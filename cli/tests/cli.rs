use assert_cmd::Command;
use predicates::prelude::*;

fn cli() -> Command {
    Command::cargo_bin("melee-cli").unwrap()
}

#[test]
fn resolve_applies_the_table() {
    cli()
        .args(["resolve", "--initiator", "hard", "--target", "hard", "--reaction", "dodge"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("dodged winner=target loser=none damage=false"));

    cli()
        .args([
            "resolve",
            "--initiator",
            "regular",
            "--target",
            "extreme",
            "--reaction",
            "fightBack",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "target_won winner=target loser=initiator damage=true critical=true",
        ));
}

#[test]
fn resolve_accepts_numeric_levels() {
    cli()
        .args(["resolve", "--initiator", "-1", "--target", "0", "--reaction", "maneuver"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("both_failed winner=none"));
}

#[test]
fn resolve_rejects_unknown_reactions() {
    cli()
        .args(["resolve", "--initiator", "hard", "--target", "hard", "--reaction", "parry"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("parry"));
}

#[test]
fn builtin_scenario_prints_a_tagged_log() {
    cli()
        .args(["melee", "--builtin", "alley_brawl"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[START] Harvey Walters attacks Dock Thug with unarmed"))
        .stdout(predicate::str::contains("[RESOLVE]"))
        .stdout(predicate::str::contains("outcome="));
}

#[test]
fn flag_mode_json_report() {
    cli()
        .args([
            "melee",
            "--attacker-skill",
            "70",
            "--defender-skill",
            "40",
            "--reaction",
            "maneuver",
            "--modifier",
            "outnumbered",
            "--seed",
            "5",
            "--json",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"initiator_level\""))
        .stdout(predicate::str::contains("\"records\""));
}

#[test]
fn records_are_written_to_file() {
    let path = std::env::temp_dir().join(format!("melee-records-{}.json", std::process::id()));
    cli()
        .args(["melee", "--builtin", "lone_swing", "--records"])
        .arg(&path)
        .assert()
        .success();
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("\"initiator\""));
    assert!(text.contains("\"resolution\""));
    std::fs::remove_file(&path).ok();
}

#[test]
fn unknown_builtin_fails() {
    cli()
        .args(["melee", "--builtin", "tavern_riot"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("tavern_riot"));
}

#[test]
fn check_reports_luck_costs() {
    cli()
        .args(["check", "--skill", "1", "--seed", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("vs 1 (+0 dice)"));
}

#[test]
fn check_rejects_out_of_range_dice() {
    cli()
        .args(["check", "--skill", "50", "--dice", "2000000000"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("2000000000"));

    cli()
        .args(["check", "--skill", "50", "--dice", "-3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(-3 dice)"));
}
