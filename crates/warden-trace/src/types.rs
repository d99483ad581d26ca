//! Trace entry schema for the agent ledger

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use warden_core::{MutationClass, WardenError};

static CONTENT_HASH_RE: OnceLock<Regex> = OnceLock::new();

/// One row of the append-only agent ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEntry {
    /// Random 128-bit id as 32 lowercase hex chars.
    pub id: String,
    /// UTC capture time, millisecond precision on the wire.
    #[serde(with = "ts_millis")]
    pub timestamp: DateTime<Utc>,
    pub vcs: VcsInfo,
    pub files: Vec<FileTrace>,
    pub mutation_class: MutationClass,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VcsInfo {
    /// Current revision id, or the literal `"unknown"`.
    pub revision_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileTrace {
    pub relative_path: String,
    pub conversations: Vec<Conversation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub url: String,
    pub contributor: Contributor,
    pub ranges: Vec<LineRange>,
    pub related: Vec<Related>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contributor {
    pub entity_type: EntityType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_identifier: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityType {
    #[serde(rename = "AI")]
    Ai,
    #[serde(rename = "HUMAN")]
    Human,
}

/// Inclusive 1-based line range with its content digest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineRange {
    pub start_line: u32,
    pub end_line: u32,
    /// `sha256:` followed by 64 lowercase hex chars.
    pub content_hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Related {
    #[serde(rename = "type")]
    pub kind: RelatedType,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelatedType {
    Specification,
    Requirement,
    Issue,
    Task,
}

impl TraceEntry {
    /// Validate the schema invariants the ledger enforces on append.
    pub fn validate(&self) -> Result<(), WardenError> {
        if self.files.is_empty() {
            return Err(invalid("files must not be empty"));
        }

        let hash_re = CONTENT_HASH_RE.get_or_init(|| {
            Regex::new(r"^sha256:[0-9a-f]{64}$").expect("content hash pattern is valid")
        });

        for file in &self.files {
            if file.relative_path.trim().is_empty() {
                return Err(invalid("relative_path must not be empty"));
            }
            for conversation in &file.conversations {
                if conversation.url.trim().is_empty() {
                    return Err(invalid("conversation url must not be empty"));
                }
                for range in &conversation.ranges {
                    if range.start_line < 1 {
                        return Err(invalid("start_line must be >= 1"));
                    }
                    if range.end_line < range.start_line {
                        return Err(invalid("end_line must be >= start_line"));
                    }
                    if !hash_re.is_match(&range.content_hash) {
                        return Err(invalid(&format!(
                            "content_hash '{}' must be sha256: plus 64 lowercase hex chars",
                            range.content_hash
                        )));
                    }
                }
            }
        }

        Ok(())
    }
}

fn invalid(reason: &str) -> WardenError {
    WardenError::InvalidEntry {
        reason: reason.to_string(),
    }
}

/// RFC-3339 serialisation pinned to millisecond precision.
mod ts_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
