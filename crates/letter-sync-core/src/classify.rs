//! Maps non-success responses onto the client's error kinds.

use tracing::warn;

use crate::error::SyncError;
use crate::model::ErrorPayload;

/// `error` marker sent with a 401 when the Google session is no longer valid.
pub const AUTH_ERROR_MARKER: &str = "google_auth_error";

/// `error` marker sent with a 429 when the Drive quota is exhausted.
pub const QUOTA_ERROR_MARKER: &str = "google_quota_error";

/// Fallback message for plain document requests.
pub const DEFAULT_FAILURE: &str = "Something went wrong";

/// Fallback message for the Drive listing.
pub const DRIVE_LIST_FAILURE: &str = "Failed to fetch documents from Google Drive";

/// Fallback message for an export to Drive.
pub const DRIVE_EXPORT_FAILURE: &str = "Failed to save to Google Drive";

/// Classify a non-success `status` and its parsed error `payload`.
///
/// Markers only count together with their status: a 401 without
/// `google_auth_error` stays a generic remote error.
pub fn classify(status: u16, payload: &ErrorPayload, fallback: &str) -> SyncError {
    let marker = payload.error.as_deref();

    let err = match (status, marker) {
        (401, Some(AUTH_ERROR_MARKER)) => SyncError::Auth,
        (429, Some(QUOTA_ERROR_MARKER)) => SyncError::RateLimit,
        _ => SyncError::Remote {
            status,
            message: payload
                .message
                .clone()
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| fallback.to_string()),
        },
    };

    warn!(status, marker, "Remote request failed: {}", err);
    err
}
