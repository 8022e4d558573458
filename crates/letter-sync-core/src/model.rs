//! Wire and domain types for the letters API.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{Result, SyncError};

/// Name given to letters (and Drive files) that have no title.
pub const UNTITLED_LETTER: &str = "Untitled Letter";

/// Opaque numeric identity assigned by the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(pub i64);

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for DocumentId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// A letter as owned by the remote store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: DocumentId,
    pub title: String,
    /// Rich-text payload (Draft raw state), possibly JSON-encoded as a string.
    #[serde(default)]
    pub content: Option<Value>,
    #[serde(default)]
    pub category: Option<String>,
    pub modified_time: DateTime<Utc>,
}

/// Body of `POST /api/documents`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewDocument {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<Value>,
}

impl NewDocument {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: None,
        }
    }

    pub fn with_content(mut self, content: Value) -> Self {
        self.content = Some(content);
        self
    }
}

/// Partial update of a letter's mutable fields.
///
/// Absent fields are not serialized, so the remote leaves them unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl UpdateDocument {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.category.is_none()
    }

    /// Apply the present fields to `doc`, leaving the others untouched.
    pub fn apply(&self, doc: &mut Document) {
        if let Some(title) = &self.title {
            doc.title = title.clone();
        }
        if let Some(content) = &self.content {
            doc.content = Some(content.clone());
        }
        if let Some(category) = &self.category {
            doc.category = Some(category.clone());
        }
    }
}

/// Drive listing item exactly as the provider returns it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawDriveDocument {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    web_view_link: String,
    #[serde(default)]
    modified_time: Option<String>,
}

/// A file in the user's Google Drive. Read-only; refreshed by re-listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveDocument {
    pub id: String,
    pub name: String,
    pub web_view_link: String,
    pub modified_time: DateTime<Utc>,
}

impl DriveDocument {
    /// Backfill a missing or empty name and modification time.
    pub(crate) fn from_raw(raw: RawDriveDocument, now: DateTime<Utc>) -> Self {
        let name = raw
            .name
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| UNTITLED_LETTER.to_string());

        let modified_time = match raw.modified_time.as_deref().filter(|t| !t.is_empty()) {
            Some(t) => match DateTime::parse_from_rfc3339(t) {
                Ok(dt) => dt.with_timezone(&Utc),
                Err(e) => {
                    debug!("Unparseable modifiedTime {:?} on Drive file {}: {}", t, raw.id, e);
                    now
                }
            },
            None => now,
        };

        Self {
            id: raw.id,
            name,
            web_view_link: raw.web_view_link,
            modified_time,
        }
    }
}

/// Input of a single export-to-Drive operation. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRequest {
    pub id: DocumentId,
    pub title: String,
    pub category: Option<String>,
    /// Plain text supplied by the caller. When absent or empty the letter is
    /// fetched and its rich content normalized.
    pub content: Option<String>,
    pub permission: Option<String>,
}

impl ExportRequest {
    pub fn new(id: impl Into<DocumentId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            category: None,
            content: None,
            permission: None,
        }
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn permission(mut self, permission: impl Into<String>) -> Self {
        self.permission = Some(permission.into());
        self
    }

    /// The trimmed title, or a validation error if nothing is left.
    pub fn validated_title(&self) -> Result<String> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(SyncError::Validation("Title is required".to_string()));
        }
        Ok(title.to_string())
    }

    /// Caller-supplied plain text, if it short-circuits the fetch.
    pub(crate) fn supplied_content(&self) -> Option<&str> {
        self.content.as_deref().filter(|c| !c.is_empty())
    }
}

/// Body of `POST /api/documents/{id}/save-to-drive`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ExportBody {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plain_text_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permission: Option<String>,
}

/// Whatever the provider reports back after an export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExportResult(pub Value);

impl ExportResult {
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(Value::as_str)
    }

    /// Link to the exported file, when the provider returns one.
    pub fn web_view_link(&self) -> Option<&str> {
        self.get_str("webViewLink")
    }
}

/// Error body returned by the API on non-success statuses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorPayload {
    /// Parse an error body; an unparseable body yields an empty payload.
    pub fn parse(body: &[u8]) -> Self {
        serde_json::from_slice(body).unwrap_or_default()
    }
}
