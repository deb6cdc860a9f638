//! Attribute exposure
//!
//! The last step of every resolution: reshape an already-fetched value so
//! GraphQL can read attributes as plain fields. Exposure never fetches and
//! never descends into relations.

use serde::Serialize;

use crate::pagination::Connection;
use crate::record::Record;

/// The normalized result of one field resolution.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Resolved {
    Null,
    Record(Record),
    Collection(Vec<Record>),
    Connection(Connection),
}

impl Resolved {
    pub fn is_null(&self) -> bool {
        matches!(self, Resolved::Null)
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Resolved::Record(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_collection(&self) -> Option<&[Record]> {
        match self {
            Resolved::Collection(records) => Some(records),
            _ => None,
        }
    }

    pub fn as_connection(&self) -> Option<&Connection> {
        match self {
            Resolved::Connection(connection) => Some(connection),
            _ => None,
        }
    }
}

/// Expose attributes on a resolved value.
///
/// Connections have every edge's node merged in place, edge count and order
/// unchanged. Collections have every element merged independently, length and
/// order preserved. A single record is merged onto itself. Null passes
/// through. Exposure is shallow: relations already present on a record are
/// left as-is.
pub fn expose_attributes(value: Resolved) -> Resolved {
    match value {
        Resolved::Null => Resolved::Null,
        Resolved::Connection(mut connection) => {
            for edge in &mut connection.edges {
                edge.node.expose();
            }
            Resolved::Connection(connection)
        }
        Resolved::Collection(mut records) => {
            for record in &mut records {
                record.expose();
            }
            Resolved::Collection(records)
        }
        Resolved::Record(mut record) => {
            record.expose();
            Resolved::Record(record)
        }
    }
}
