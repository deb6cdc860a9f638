//! Dynamic records fetched from a store
//!
//! A [`Record`] is the attribute-bearing unit every fetch strategy returns:
//! an ordered map of scalar attributes, an optional level of pre-loaded
//! relations, and a plain-data field map populated by attribute exposure so
//! GraphQL can read values directly instead of going through an accessor.

use async_graphql::Value;
use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// A relation already present on a record (e.g. pre-fetched by a batching
/// layer). Passed through exposure untouched, never recursively exposed.
#[derive(Debug, Clone)]
pub enum Related {
    One(Box<Record>),
    Many(Vec<Record>),
}

/// One database-backed row, detached from any table schema.
#[derive(Debug, Clone, Default)]
pub struct Record {
    attributes: IndexMap<String, Value>,
    relations: IndexMap<String, Related>,
    exposed: IndexMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style attribute setter.
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value.into());
        self
    }

    /// Set an attribute value.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.attributes.insert(name.into(), value);
    }

    /// Accessor read of an attribute.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Direct plain-data read. Empty until [`Record::expose`] has run.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.exposed.get(name)
    }

    pub fn attributes(&self) -> &IndexMap<String, Value> {
        &self.attributes
    }

    /// Attach an already-fetched relation under the given name.
    pub fn set_relation(&mut self, name: impl Into<String>, related: Related) {
        self.relations.insert(name.into(), related);
    }

    pub fn relation(&self, name: &str) -> Option<&Related> {
        self.relations.get(name)
    }

    /// Snapshot the record's scalar attributes. Relations are excluded; this
    /// never traverses or fetches.
    pub fn serialize_shallow(&self) -> IndexMap<String, Value> {
        self.attributes.clone()
    }

    /// Merge the shallow snapshot onto the record's plain field map, so that
    /// direct field access returns the same values the accessor returns. The
    /// record keeps its identity and its accessors; exposure only augments.
    pub fn expose(&mut self) {
        for (name, value) in self.serialize_shallow() {
            self.exposed.insert(name, value);
        }
    }
}

/// Wire shape: exposed fields when exposure has run, raw attributes
/// otherwise, then one level of relations.
impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let fields = if self.exposed.is_empty() {
            &self.attributes
        } else {
            &self.exposed
        };

        let mut map = serializer.serialize_map(Some(fields.len() + self.relations.len()))?;
        for (name, value) in fields {
            map.serialize_entry(name, value)?;
        }
        for (name, related) in &self.relations {
            match related {
                Related::One(record) => map.serialize_entry(name, record)?,
                Related::Many(records) => map.serialize_entry(name, records)?,
            }
        }
        map.end()
    }
}
