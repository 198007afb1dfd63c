//! Typed facts accumulated over a conversation.
//!
//! A fact is a named value pulled out of free text (age, family history,
//! yes/no answers). Facts live in a [`Facts`] map keyed by name; merging is
//! last-write-wins per key.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single extracted value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FactValue {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    List(Vec<String>),
}

impl FactValue {
    /// Numeric view of the value, parsing text when it holds a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FactValue::Integer(v) => Some(*v as f64),
            FactValue::Float(v) => Some(*v),
            FactValue::Text(s) => s.trim().parse::<f64>().ok(),
            FactValue::Boolean(_) | FactValue::List(_) => None,
        }
    }

    /// Boolean view of the value, accepting common textual spellings.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FactValue::Boolean(b) => Some(*b),
            FactValue::Text(s) => match s.trim().to_lowercase().as_str() {
                "true" | "yes" | "y" => Some(true),
                "false" | "no" | "n" => Some(false),
                _ => None,
            },
            FactValue::Integer(1) => Some(true),
            FactValue::Integer(0) => Some(false),
            _ => None,
        }
    }

    /// Text values as a one-element list, lists as-is.
    pub fn as_items(&self) -> Option<Vec<&str>> {
        match self {
            FactValue::Text(s) => Some(vec![s.as_str()]),
            FactValue::List(items) => Some(items.iter().map(String::as_str).collect()),
            _ => None,
        }
    }

    /// Short name of the variant, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            FactValue::Boolean(_) => "boolean",
            FactValue::Integer(_) => "integer",
            FactValue::Float(_) => "float",
            FactValue::Text(_) => "text",
            FactValue::List(_) => "list",
        }
    }
}

impl fmt::Display for FactValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FactValue::Boolean(b) => write!(f, "{}", if *b { "yes" } else { "no" }),
            FactValue::Integer(v) => write!(f, "{}", v),
            FactValue::Float(v) => write!(f, "{}", v),
            FactValue::Text(s) => write!(f, "{}", s),
            FactValue::List(items) => write!(f, "{}", items.join(", ")),
        }
    }
}

impl From<bool> for FactValue {
    fn from(v: bool) -> Self {
        FactValue::Boolean(v)
    }
}

impl From<i64> for FactValue {
    fn from(v: i64) -> Self {
        FactValue::Integer(v)
    }
}

impl From<f64> for FactValue {
    fn from(v: f64) -> Self {
        FactValue::Float(v)
    }
}

impl From<&str> for FactValue {
    fn from(v: &str) -> Self {
        FactValue::Text(v.to_string())
    }
}

impl From<String> for FactValue {
    fn from(v: String) -> Self {
        FactValue::Text(v)
    }
}

impl From<Vec<String>> for FactValue {
    fn from(v: Vec<String>) -> Self {
        FactValue::List(v)
    }
}

/// Name → value map of facts, ordered by name for deterministic output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Facts(BTreeMap<String, FactValue>);

impl Facts {
    /// Creates an empty fact map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value for a fact name.
    pub fn get(&self, name: &str) -> Option<&FactValue> {
        self.0.get(name)
    }

    /// Returns true if a fact with this name is present.
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Inserts or replaces a fact, returning the previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FactValue>) -> Option<FactValue> {
        self.0.insert(name.into(), value.into())
    }

    /// Inserts a fact only if the name is not taken yet. Returns true if inserted.
    pub fn insert_if_absent(&mut self, name: impl Into<String>, value: impl Into<FactValue>) -> bool {
        let name = name.into();
        if self.0.contains_key(&name) {
            return false;
        }
        self.0.insert(name, value.into());
        true
    }

    /// Merges `other` into self, last write wins. Returns the names whose value changed.
    pub fn merge(&mut self, other: &Facts) -> Vec<String> {
        let mut changed = Vec::new();
        for (name, value) in &other.0 {
            if self.0.get(name) != Some(value) {
                self.0.insert(name.clone(), value.clone());
                changed.push(name.clone());
            }
        }
        changed
    }

    /// Number of facts.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no facts.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates facts in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &FactValue)> {
        self.0.iter()
    }

    /// Fact names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl FromIterator<(String, FactValue)> for Facts {
    fn from_iter<T: IntoIterator<Item = (String, FactValue)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
