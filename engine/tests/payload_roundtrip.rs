mod common;

use common::*;
use engine::combat::Modifier;
use engine::{
    Initiator, ItemId, MeleeError, MemoryRecords, Payload, ReactionKind, Record, RecordId,
    RecordStore, Resolution, Session, SkillId, Target,
};

#[test]
fn fresh_attack_card_keys() {
    let mut records = MemoryRecords::new();
    let attack = Initiator::start(
        &mut records,
        attacker_key(),
        ItemId::new("unarmed"),
        Some(defender_key()),
    );
    let payload = records.get_record(&attack.id).unwrap();
    let keys: Vec<&str> = payload.keys().collect();
    insta::assert_debug_snapshot!(keys, @r###"
    [
        "kind",
        "actor_key",
        "item_id",
        "target_key",
        "outnumbered",
        "surprised",
        "advantage",
        "disadvantage",
        "auto_success",
        "resolved",
        "rolled",
        "published",
    ]
    "###);
}

#[test]
fn all_three_cards_survive_the_store() {
    let mut dir = directory();
    let mut records = MemoryRecords::new();
    let mut roll = rolls(&[45, 20]);
    let mut session = Session::new(&mut dir, &mut records, &mut roll);

    let mut attack = Initiator::start(
        session.records,
        attacker_key(),
        ItemId::new("unarmed"),
        Some(defender_key()),
    );
    attack.toggle_modifier(&mut session, Modifier::Surprised, true).unwrap();
    attack.perform_check(&mut session, &SkillId::new("fighting_brawl")).unwrap();
    attack.publish_result(&mut session).unwrap();

    let mut target = Target::load(session.records, attack.target_record.as_ref().unwrap())
        .unwrap()
        .unwrap();
    target.toggle_flag(&mut session, "advantage", true).unwrap();
    target
        .select(
            &mut session,
            ReactionKind::FightBack,
            SkillId::new("fighting_brawl"),
            Some(ItemId::new("cosh")),
        )
        .unwrap();
    target.perform_check(&mut session, None).unwrap();
    target.publish_result(&mut session).unwrap();

    let resolution_id = target.resolution_record.clone().unwrap();
    let mut resolution = Resolution::load(session.records, &resolution_id).unwrap().unwrap();
    resolution.resolve(&mut session).unwrap();

    assert_eq!(
        Initiator::load(session.records, &attack.id).unwrap(),
        Some(attack.clone())
    );
    assert_eq!(
        Target::load(session.records, &target.id).unwrap(),
        Some(target.clone())
    );
    assert_eq!(
        Resolution::load(session.records, &resolution.id).unwrap(),
        Some(resolution.clone())
    );

    let published = session.records.get_record(&target.id).unwrap();
    assert_eq!(published.opt_text("tier").unwrap(), Some("success"));
    assert_eq!(published.opt_text("reaction").unwrap(), Some("fightBack"));
    assert_eq!(published.opt_text("item_id").unwrap(), Some("cosh"));

    let verdict = session.records.get_record(&resolution.id).unwrap();
    assert_eq!(verdict.opt_text("outcome").unwrap(), Some("target_won"));
    assert_eq!(verdict.opt_text("action").unwrap(), Some("roll-melee-damage"));
    assert_eq!(verdict.opt_text("damage_item").unwrap(), Some("cosh"));
}

#[test]
fn loading_the_wrong_kind_is_rejected() {
    let attack = Initiator {
        id: RecordId::new("rec-0001"),
        actor_key: attacker_key(),
        item_id: ItemId::new("unarmed"),
        target_key: None,
        modifiers: Default::default(),
        resolved: false,
        rolled: false,
        skill_id: None,
        check: None,
        target_record: None,
        resolution_record: None,
        published: false,
    };
    let err = Target::from_payload(attack.id.clone(), &attack.to_payload()).unwrap_err();
    assert!(matches!(
        err,
        MeleeError::RecordKind { ref expected, ref found }
            if *expected == "target" && found == "initiator"
    ));
}

#[test]
fn legacy_reaction_flags_still_load() {
    let mut p = Payload::kind("target");
    p.set_text("actor_key", defender_key().as_str());
    p.set_text("parent_record", "rec-0001");
    p.set_text("initiator_key", attacker_key().as_str());
    p.set_bool("dodging", true);
    p.set_text("skill_id", "dodge");

    let target = Target::from_payload(RecordId::new("rec-0002"), &p).unwrap();
    assert_eq!(target.reaction_kind(), Some(ReactionKind::Dodge));
    assert!(!target.rolled);
    assert!(target.check.is_none());
}

#[test]
fn malformed_fields_name_the_key() {
    let mut p = Payload::kind("initiator");
    p.set_text("actor_key", attacker_key().as_str());
    p.set_text("item_id", "unarmed");
    p.set_text("rolled", "sometimes");

    let err = Initiator::from_payload(RecordId::new("rec-0003"), &p).unwrap_err();
    assert!(matches!(err, MeleeError::Payload { ref key, .. } if key == "rolled"));
}
