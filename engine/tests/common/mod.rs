#![allow(dead_code)]

use engine::{Actor, ActorKey, ItemId, MemoryDirectory, Skill, SkillId, Weapon};
use indexmap::IndexMap;

/// Scripted percentile rolls, cycling when exhausted.
pub fn rolls(seq: &[u32]) -> impl FnMut(i32) -> u32 {
    let mut i = 0usize;
    let values = seq.to_vec();
    move |_| {
        let result = values[i % values.len()];
        i += 1;
        result
    }
}

pub fn attacker_key() -> ActorKey {
    ActorKey::for_token("scene", "harvey")
}

pub fn defender_key() -> ActorKey {
    ActorKey::for_token("scene", "thug")
}

fn actor(
    key: ActorKey,
    name: &str,
    luck: u32,
    skills: &[(&str, u32)],
    weapons: &[(&str, &[&str])],
) -> Actor {
    Actor {
        key,
        name: name.to_string(),
        luck,
        skills: skills
            .iter()
            .map(|(id, value)| {
                (
                    SkillId::new(*id),
                    Skill {
                        name: id.to_string(),
                        value: *value,
                    },
                )
            })
            .collect::<IndexMap<_, _>>(),
        weapons: weapons
            .iter()
            .map(|(id, skills)| {
                (
                    ItemId::new(*id),
                    Weapon {
                        name: id.to_string(),
                        skills: skills.iter().map(|s| SkillId::new(*s)).collect(),
                    },
                )
            })
            .collect::<IndexMap<_, _>>(),
    }
}

/// Brawl 60: 1 crit, <=12 extreme, <=30 hard, <=60 regular, 100 fumble.
pub fn harvey() -> Actor {
    actor(
        attacker_key(),
        "Harvey",
        50,
        &[("fighting_brawl", 60), ("dodge", 40)],
        &[("unarmed", &["fighting_brawl"]), ("axe", &["fighting_axe"])],
    )
}

/// Brawl 50: <=10 extreme, <=25 hard. Dodge 30: <=6 extreme, <=15 hard, >=96 fumble.
pub fn thug() -> Actor {
    actor(
        defender_key(),
        "Thug",
        10,
        &[("fighting_brawl", 50), ("dodge", 30)],
        &[("cosh", &["fighting_brawl"])],
    )
}

pub fn directory() -> MemoryDirectory {
    let mut dir = MemoryDirectory::new();
    dir.insert(harvey());
    dir.insert(thug());
    dir
}
