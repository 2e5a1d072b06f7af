//! # List/Filter Adapter
//!
//! Backs list data sources: fetch the whole collection, keep the entries whose
//! name fully matches a pattern, sort them by identifier, and derive a view
//! identifier from the content of the *unfiltered* collection.
//!
//! The view identifier is the CRC-32 (IEEE) of the collection's JSON encoding,
//! rendered in decimal. It only changes when the remote collection changes,
//! whatever pattern is applied.

use crate::client::RemoteClient;
use crate::error::{Operation, ReconcileError};
use crate::kind::ResourceKind;
use crate::normalize::check;
use crate::record::{Fields, Value};
use regex::Regex;
use tracing::{debug, instrument, warn};

/// A name filter that must match the whole name.
#[derive(Debug, Clone)]
pub struct NamePattern(Regex);

impl NamePattern {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(&format!("^(?:{pattern})$")).map(Self)
    }

    pub fn is_match(&self, name: &str) -> bool {
        self.0.is_match(name)
    }
}

/// Field validator for pattern-typed configuration values.
pub fn validate_pattern(value: &Value) -> Result<(), String> {
    match value.as_str() {
        Some(pattern) => NamePattern::new(pattern).map(drop).map_err(|e| e.to_string()),
        None => Err("expected a string".to_string()),
    }
}

/// Filtered entries plus the view identifier. An absent view (no identifier)
/// means the collection could not be fetched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListView {
    pub entries: Vec<Fields>,
    pub view_id: Option<String>,
}

impl ListView {
    pub fn is_absent(&self) -> bool {
        self.view_id.is_none()
    }
}

/// Fetches, filters and sorts a collection.
///
/// A failed fetch yields an absent view, not an error.
#[instrument(name = "list", skip_all, fields(kind = K::KIND))]
pub async fn list<K, C>(client: &C, pattern: Option<&NamePattern>) -> Result<ListView, ReconcileError>
where
    K: ResourceKind,
    C: RemoteClient<K>,
{
    let objects = match check(client.find().await) {
        Ok(objects) => objects.unwrap_or_default(),
        Err(err) => {
            warn!(
                status = ?err.status_code,
                code = ?err.remote_code,
                message = ?err.remote_message,
                error = %err,
                "Could not fetch collection"
            );
            return Ok(ListView::default());
        }
    };

    let encoded = serde_json::to_vec(&objects).map_err(|source| ReconcileError::Serialization {
        kind: K::KIND,
        operation: Operation::List,
        source,
    })?;
    let view_id = crc32fast::hash(&encoded).to_string();

    let mut retained: Vec<&K::Object> = objects
        .iter()
        .filter(|o| pattern.map_or(true, |p| p.is_match(K::object_name(o).unwrap_or_default())))
        .collect();
    retained.sort_by(|a, b| {
        K::object_id(a)
            .unwrap_or_default()
            .cmp(K::object_id(b).unwrap_or_default())
    });
    debug!(fetched = objects.len(), retained = retained.len(), %view_id, "Listed");

    Ok(ListView {
        entries: retained.into_iter().map(K::list_entry).collect(),
        view_id: Some(view_id),
    })
}
