//! Record data model.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{GatewayError, GatewayResult};

/// Lowest valid chapter number.
pub const MIN_CHAPTER: u16 = 1;
/// Highest valid chapter number.
pub const MAX_CHAPTER: u16 = 114;

/// A chapter number known to be within `MIN_CHAPTER..=MAX_CHAPTER`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ChapterId(u16);

impl ChapterId {
    pub fn new(raw: i64) -> GatewayResult<Self> {
        if (i64::from(MIN_CHAPTER)..=i64::from(MAX_CHAPTER)).contains(&raw) {
            Ok(Self(raw as u16))
        } else {
            Err(GatewayError::OutOfRangeId {
                raw: raw.to_string(),
            })
        }
    }

    /// Parse a path or JSON-key segment. Non-numeric input counts as out of range.
    pub fn parse(raw: &str) -> GatewayResult<Self> {
        raw.trim()
            .parse::<i64>()
            .map_err(|_| GatewayError::OutOfRangeId {
                raw: raw.to_string(),
            })
            .and_then(Self::new)
    }

    pub fn get(self) -> u16 {
        self.0
    }

    /// Storage key of this chapter's record.
    pub fn key(self) -> String {
        format!("chapter:{}", self.0)
    }
}

impl From<ChapterId> for i64 {
    fn from(id: ChapterId) -> Self {
        i64::from(id.0)
    }
}

impl fmt::Display for ChapterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Producer-supplied description of a record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_verses: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapter_name: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub languages: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A structured document for one chapter.
///
/// `verses` maps `"chapter:verse"` keys to opaque verse payloads. Any
/// top-level fields the producer adds are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapter: Option<u16>,

    /// Kept in producer order; verse keys do not sort as strings.
    pub verses: Map<String, Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<RecordMetadata>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "millis::serialize_opt"
    )]
    pub stored_at: Option<DateTime<Utc>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record {
    /// Decode a request body.
    pub fn from_json(body: &[u8]) -> GatewayResult<Self> {
        serde_json::from_slice(body).map_err(|e| {
            GatewayError::validation(
                "Invalid chapter data",
                format!("Chapter data must include verses object ({})", e),
            )
        })
    }

    pub fn verse_count(&self) -> usize {
        self.verses.len()
    }
}

/// Acknowledgment of a stored record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PutAck {
    pub success: bool,
    pub chapter: u16,
    pub verse_count: usize,
    pub message: String,
    #[serde(serialize_with = "millis::serialize")]
    pub stored_at: DateTime<Utc>,
}

/// Outcome of a bulk write.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BulkReport {
    pub success: usize,
    pub failed: usize,
    /// Per-id status: `"success"` or the failure reason.
    pub chapters: BTreeMap<String, String>,
}

/// Availability of one sampled chapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterStatus {
    pub available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verse_count: Option<usize>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "millis::serialize_opt"
    )]
    pub stored_at: Option<DateTime<Utc>>,
}

/// Result of the sampled health probe.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    pub available: usize,
    pub missing: usize,
    pub chapters: BTreeMap<u16, ChapterStatus>,
}

/// Timestamps render with millisecond precision, like every other timestamp the gateway emits.
mod millis {
    use chrono::{DateTime, Utc};
    use serde::Serializer;

    pub fn serialize<S: Serializer>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&crate::to_rfc3339_millis(at))
    }

    pub fn serialize_opt<S: Serializer>(
        at: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match at {
            Some(at) => serialize(at, serializer),
            None => serializer.serialize_none(),
        }
    }
}
