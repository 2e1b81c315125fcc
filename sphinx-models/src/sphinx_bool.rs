//! Lenient boolean used by relay payloads.
//!
//! Relay serializes SQLite booleans as `0`/`1` in some responses and as
//! `true`/`false` in others.

use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SphinxBool(pub bool);

impl SphinxBool {
    pub fn value(self) -> bool {
        self.0
    }
}

impl From<bool> for SphinxBool {
    fn from(value: bool) -> Self {
        Self(value)
    }
}

impl Serialize for SphinxBool {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bool(self.0)
    }
}

struct SphinxBoolVisitor;

impl<'de> Visitor<'de> for SphinxBoolVisitor {
    type Value = SphinxBool;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a boolean, 0/1, or \"true\"/\"false\"")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
        Ok(SphinxBool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(SphinxBool(v != 0))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(SphinxBool(v != 0))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        match v {
            "true" | "1" => Ok(SphinxBool(true)),
            "false" | "0" => Ok(SphinxBool(false)),
            other => Err(E::invalid_value(de::Unexpected::Str(other), &self)),
        }
    }
}

impl<'de> Deserialize<'de> for SphinxBool {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(SphinxBoolVisitor)
    }
}
