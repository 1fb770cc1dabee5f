//! Domain DTOs for the Olog API.
//!
//! # Design
//! These types mirror the mock-server's schema but are defined independently;
//! integration tests catch schema drift. Entities pass through the client
//! unmodified (no caching, no local mutation), so every field is plain
//! owned data with serde derives matching the wire names (`createTime`,
//! `fileMetadataDescription`).

use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::time::{ensure_time, Timestamp};

/// A named category for log entries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Logbook {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    pub state: String,
}

/// A metadata label attachable to log entries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tag {
    pub name: String,
    pub state: String,
}

/// One key/value slot of a [`Property`]. `value` is serialized even when
/// absent — the service stores explicit nulls for unfilled attributes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: Option<String>,
    pub state: String,
}

/// A structured metadata label carrying named attributes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Property {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    pub state: String,
    pub attributes: Vec<Attribute>,
}

impl Property {
    /// Copy with attributes sorted by name. Attribute order is not
    /// significant, and the server is free to return a different order than
    /// it was sent, so echo comparison normalizes both sides through this.
    pub fn normalized(&self) -> Property {
        let mut normalized = self.clone();
        normalized.attributes.sort_by(|a, b| a.name.cmp(&b.name));
        normalized
    }
}

/// A timestamped record attached to one or more logbooks. Read-only from the
/// client's point of view; entries are created by other means.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogEntry {
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    pub description: String,
    #[serde(rename = "createTime", skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,
    #[serde(default)]
    pub logbooks: Vec<Logbook>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub properties: Vec<Property>,
}

/// A file to upload alongside a log entry.
///
/// Travels as `multipart/form-data` with parts `file` (the blob, under
/// `filename`), `filename`, and optionally `fileMetadataDescription`.
/// The part names are fixed by the service.
#[derive(Debug, Clone)]
pub struct NewAttachment {
    pub filename: String,
    pub data: Vec<u8>,
    pub metadata_description: Option<String>,
}

/// Search parameters for `get_logs`. Every field is optional; unset fields
/// are omitted from the query string entirely.
#[derive(Debug, Clone, Default)]
pub struct LogsQuery {
    /// Keyword present in the entry description.
    pub desc: Option<String>,
    /// Allow fuzzy matching on the textual parameters.
    pub fuzzy: Option<String>,
    /// Exact word or words in the entry description.
    pub phrase: Option<String>,
    /// Entries created by this owner.
    pub owner: Option<String>,
    /// Entries created at or after this instant; any [`Timestamp`] shape.
    pub start: Option<Timestamp>,
    /// Entries created at or before this instant; any [`Timestamp`] shape.
    pub end: Option<Timestamp>,
    /// Include log event times in the results.
    pub includeevents: Option<bool>,
    /// Entries belonging to the named logbook.
    pub logbooks: Option<String>,
    /// Entries carrying the named tag.
    pub tags: Option<String>,
    /// Entries carrying the named property.
    pub properties: Option<String>,
}

impl LogsQuery {
    /// Marshal set fields into query parameters. `start`/`end` are
    /// normalized to the canonical timestamp here, so a malformed time
    /// fails before the request exists.
    pub fn to_params(&self) -> Result<Vec<(&'static str, String)>, ApiError> {
        let mut params = Vec::new();
        if let Some(desc) = &self.desc {
            params.push(("desc", desc.clone()));
        }
        if let Some(fuzzy) = &self.fuzzy {
            params.push(("fuzzy", fuzzy.clone()));
        }
        if let Some(phrase) = &self.phrase {
            params.push(("phrase", phrase.clone()));
        }
        if let Some(owner) = &self.owner {
            params.push(("owner", owner.clone()));
        }
        if let Some(start) = &self.start {
            params.push(("start", ensure_time(start.clone())?));
        }
        if let Some(end) = &self.end {
            params.push(("end", ensure_time(end.clone())?));
        }
        if let Some(includeevents) = self.includeevents {
            params.push(("includeevents", includeevents.to_string()));
        }
        if let Some(logbooks) = &self.logbooks {
            params.push(("logbooks", logbooks.clone()));
        }
        if let Some(tags) = &self.tags {
            params.push(("tags", tags.clone()));
        }
        if let Some(properties) = &self.properties {
            params.push(("properties", properties.clone()));
        }
        Ok(params)
    }
}
