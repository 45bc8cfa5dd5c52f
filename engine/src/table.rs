//! Collaborators the melee workflow talks to: who the actors are, where the
//! records live, and where the dice come from.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{MeleeError, MeleeResult};
use crate::payload::{Payload, RecordId};
use crate::Roller;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

string_id!(
    /// Opaque `scene.token` key naming an actor placed in a scene.
    ActorKey
);
string_id!(SkillId);
string_id!(ItemId);

impl ActorKey {
    pub fn for_token(scene: &str, token: &str) -> Self {
        Self(format!("{scene}.{token}"))
    }

    /// Split into `(scene, token)`; keys without a scene part return `None`.
    pub fn parts(&self) -> Option<(&str, &str)> {
        self.0.split_once('.')
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    pub name: String,
    /// Percentile value, 0..=100 in practice.
    pub value: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Weapon {
    pub name: String,
    /// Skills that can be rolled when attacking or fighting back with it.
    #[serde(default)]
    pub skills: Vec<SkillId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub key: ActorKey,
    pub name: String,
    #[serde(default)]
    pub luck: u32,
    #[serde(default)]
    pub skills: IndexMap<SkillId, Skill>,
    #[serde(default)]
    pub weapons: IndexMap<ItemId, Weapon>,
}

impl Actor {
    pub fn skill(&self, id: &SkillId) -> MeleeResult<&Skill> {
        self.skills.get(id).ok_or_else(|| MeleeError::UnknownSkill {
            actor: self.name.clone(),
            skill: id.to_string(),
        })
    }

    pub fn weapon(&self, id: &ItemId) -> MeleeResult<&Weapon> {
        self.weapons.get(id).ok_or_else(|| MeleeError::UnknownItem {
            actor: self.name.clone(),
            item: id.to_string(),
        })
    }

    /// Skills usable with `item`, in the order the weapon lists them.
    pub fn weapon_skills(&self, item: &ItemId) -> MeleeResult<Vec<(&SkillId, &Skill)>> {
        let weapon = self.weapon(item)?;
        Ok(weapon
            .skills
            .iter()
            .filter_map(|id| self.skills.get_key_value(id))
            .collect())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub key: ActorKey,
    pub name: String,
}

/// Identity resolution and the actor-owned luck pool.
pub trait Directory {
    fn actor(&self, key: &ActorKey) -> Option<Actor>;
    fn token(&self, key: &ActorKey) -> Option<Token>;
    /// Deduct `amount` luck. Returns false, leaving the pool untouched, when
    /// the actor cannot pay.
    fn spend_luck(&mut self, key: &ActorKey, amount: u32) -> bool;
}

/// Persistence and rendering of records. Each write re-renders the record.
pub trait RecordStore {
    fn create_record(&mut self, payload: Payload) -> RecordId;
    fn update_record(&mut self, id: &RecordId, payload: Payload) -> MeleeResult<()>;
    fn get_record(&self, id: &RecordId) -> Option<Payload>;
}

/// Everything one melee operation needs, passed in by the caller.
pub struct Session<'a> {
    pub directory: &'a mut dyn Directory,
    pub records: &'a mut dyn RecordStore,
    pub roller: &'a mut dyn Roller,
}

impl<'a> Session<'a> {
    pub fn new(
        directory: &'a mut dyn Directory,
        records: &'a mut dyn RecordStore,
        roller: &'a mut dyn Roller,
    ) -> Self {
        Self {
            directory,
            records,
            roller,
        }
    }

    pub(crate) fn actor(&self, key: &ActorKey) -> MeleeResult<Actor> {
        self.directory
            .actor(key)
            .ok_or_else(|| MeleeError::UnknownActor(key.to_string()))
    }

    pub(crate) fn token(&self, key: &ActorKey) -> MeleeResult<Token> {
        self.directory
            .token(key)
            .ok_or_else(|| MeleeError::UnknownActor(key.to_string()))
    }

    /// Check the pool, then pay. Nothing is deducted on failure.
    pub(crate) fn pay_luck(&mut self, key: &ActorKey, amount: u32) -> MeleeResult<()> {
        let actor = self.actor(key)?;
        if actor.luck < amount || !self.directory.spend_luck(key, amount) {
            tracing::warn!(
                actor = %actor.name,
                needed = amount,
                available = actor.luck,
                "not enough luck"
            );
            return Err(MeleeError::InsufficientLuck {
                actor: actor.name,
                needed: amount,
                available: actor.luck,
            });
        }
        tracing::debug!(actor = %actor.name, spent = amount, "luck spent");
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryDirectory {
    actors: IndexMap<ActorKey, Actor>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, actor: Actor) {
        self.actors.insert(actor.key.clone(), actor);
    }

    pub fn luck_of(&self, key: &ActorKey) -> Option<u32> {
        self.actors.get(key).map(|a| a.luck)
    }
}

impl Directory for MemoryDirectory {
    fn actor(&self, key: &ActorKey) -> Option<Actor> {
        self.actors.get(key).cloned()
    }

    fn token(&self, key: &ActorKey) -> Option<Token> {
        self.actors.get(key).map(|a| Token {
            key: a.key.clone(),
            name: a.name.clone(),
        })
    }

    fn spend_luck(&mut self, key: &ActorKey, amount: u32) -> bool {
        match self.actors.get_mut(key) {
            Some(actor) if actor.luck >= amount => {
                actor.luck -= amount;
                true
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryRecords {
    next: u64,
    records: IndexMap<RecordId, Payload>,
}

impl MemoryRecords {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RecordId, &Payload)> {
        self.records.iter()
    }

    /// Ids of every record whose `kind` field equals `kind`, oldest first.
    pub fn ids_of_kind(&self, kind: &str) -> Vec<RecordId> {
        self.records
            .iter()
            .filter(|(_, p)| p.opt_text("kind").ok().flatten() == Some(kind))
            .map(|(id, _)| id.clone())
            .collect()
    }
}

impl RecordStore for MemoryRecords {
    fn create_record(&mut self, payload: Payload) -> RecordId {
        self.next += 1;
        let id = RecordId::new(format!("rec-{:04}", self.next));
        self.records.insert(id.clone(), payload);
        id
    }

    fn update_record(&mut self, id: &RecordId, payload: Payload) -> MeleeResult<()> {
        match self.records.get_mut(id) {
            Some(slot) => {
                *slot = payload;
                Ok(())
            }
            None => Err(MeleeError::MissingRecord(id.to_string())),
        }
    }

    fn get_record(&self, id: &RecordId) -> Option<Payload> {
        self.records.get(id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actor_key_splits_scene_and_token() {
        let key = ActorKey::for_token("scene1", "tok9");
        assert_eq!(key.as_str(), "scene1.tok9");
        assert_eq!(key.parts(), Some(("scene1", "tok9")));
        assert_eq!(ActorKey::new("loose").parts(), None);
    }

    #[test]
    fn luck_is_not_spent_past_zero() {
        let mut dir = MemoryDirectory::new();
        let key = ActorKey::new("s.a");
        dir.insert(Actor {
            key: key.clone(),
            name: "Ada".into(),
            luck: 5,
            skills: IndexMap::new(),
            weapons: IndexMap::new(),
        });
        assert!(!dir.spend_luck(&key, 6));
        assert_eq!(dir.luck_of(&key), Some(5));
        assert!(dir.spend_luck(&key, 5));
        assert_eq!(dir.luck_of(&key), Some(0));
    }

    #[test]
    fn updating_unknown_record_fails() {
        let mut records = MemoryRecords::new();
        let err = records
            .update_record(&RecordId::new("nope"), Payload::new())
            .unwrap_err();
        assert!(matches!(err, MeleeError::MissingRecord(_)));
        assert!(records.get_record(&RecordId::new("nope")).is_none());
    }
}
