//! Flat key/value payloads exchanged with the record store.
//!
//! Records are written as a single level of primitive fields. A missing key
//! means "default" (false, zero or absent), which keeps older payloads
//! readable when new optional fields appear.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{MeleeError, MeleeResult};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Field {
    Bool(bool),
    Int(i64),
    Text(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload(IndexMap<String, Field>);

impl Payload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kind(kind: &str) -> Self {
        let mut p = Self::new();
        p.set_text("kind", kind);
        p
    }

    pub fn get(&self, key: &str) -> Option<&Field> {
        self.0.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn set(&mut self, key: &str, value: Field) {
        self.0.insert(key.to_string(), value);
    }

    pub fn set_bool(&mut self, key: &str, value: bool) {
        self.set(key, Field::Bool(value));
    }

    pub fn set_int(&mut self, key: &str, value: i64) {
        self.set(key, Field::Int(value));
    }

    pub fn set_text(&mut self, key: &str, value: impl Into<String>) {
        self.set(key, Field::Text(value.into()));
    }

    pub fn set_opt_text<S: AsRef<str>>(&mut self, key: &str, value: Option<S>) {
        match value {
            Some(v) => self.set_text(key, v.as_ref()),
            None => self.remove(key),
        }
    }

    pub fn remove(&mut self, key: &str) {
        self.0.shift_remove(key);
    }

    /// Copy every field of `other` into `self`, overwriting on collision.
    pub fn merge(&mut self, other: Payload) {
        self.0.extend(other.0);
    }

    pub fn bool_or(&self, key: &str, default: bool) -> MeleeResult<bool> {
        match self.0.get(key) {
            None => Ok(default),
            Some(Field::Bool(b)) => Ok(*b),
            // Hosts that stringify attributes hand back "true"/"false".
            Some(Field::Text(s)) if s == "true" => Ok(true),
            Some(Field::Text(s)) if s == "false" => Ok(false),
            Some(_) => Err(MeleeError::payload(key, "expected a boolean")),
        }
    }

    pub fn opt_int(&self, key: &str) -> MeleeResult<Option<i64>> {
        match self.0.get(key) {
            None => Ok(None),
            Some(Field::Int(i)) => Ok(Some(*i)),
            Some(Field::Text(s)) => s
                .parse()
                .map(Some)
                .map_err(|_| MeleeError::payload(key, "expected an integer")),
            Some(Field::Bool(_)) => Err(MeleeError::payload(key, "expected an integer")),
        }
    }

    pub fn int_or(&self, key: &str, default: i64) -> MeleeResult<i64> {
        Ok(self.opt_int(key)?.unwrap_or(default))
    }

    pub fn opt_u32(&self, key: &str) -> MeleeResult<Option<u32>> {
        self.opt_int(key)?
            .map(|i| u32::try_from(i).map_err(|_| MeleeError::payload(key, "out of range")))
            .transpose()
    }

    pub fn opt_text(&self, key: &str) -> MeleeResult<Option<&str>> {
        match self.0.get(key) {
            None => Ok(None),
            Some(Field::Text(s)) => Ok(Some(s.as_str())),
            Some(_) => Err(MeleeError::payload(key, "expected text")),
        }
    }

    pub fn text(&self, key: &str) -> MeleeResult<&str> {
        self.opt_text(key)?
            .ok_or_else(|| MeleeError::payload(key, "missing"))
    }

    /// Fail unless the payload was written by a record of `expected` kind.
    pub fn expect_kind(&self, expected: &'static str) -> MeleeResult<()> {
        let found = self.opt_text("kind")?.unwrap_or_default();
        if found == expected {
            Ok(())
        } else {
            Err(MeleeError::RecordKind {
                expected,
                found: found.to_string(),
            })
        }
    }
}

/// A state record that can be flattened into a [`Payload`] and rebuilt.
pub trait Record: Sized {
    const KIND: &'static str;

    fn to_payload(&self) -> Payload;

    /// Rebuild from a payload that was given `id` by the store.
    fn from_payload(id: RecordId, payload: &Payload) -> MeleeResult<Self>;
}
