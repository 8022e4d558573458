//! Error taxonomy for the letters client.

/// Errors surfaced by the letters client.
///
/// `Auth`, `RateLimit` and `Remote` are produced by the classifier from a
/// non-success response; `Transport` means no status was obtained at all.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SyncError {
    #[error("{0}")]
    Validation(String),

    #[error("Google authentication error. Please sign in again.")]
    Auth,

    #[error("Google Drive API rate limit exceeded. Please try again later.")]
    RateLimit,

    #[error("{message}")]
    Remote { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid response body: {0}")]
    Decode(String),
}

impl SyncError {
    /// Whether the caller should prompt the user to sign in again.
    pub fn is_auth(&self) -> bool {
        matches!(self, SyncError::Auth)
    }

    /// Whether the caller should back off before retrying.
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, SyncError::RateLimit)
    }

    /// HTTP status attached to the failure, if one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            SyncError::Auth => Some(401),
            SyncError::RateLimit => Some(429),
            SyncError::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(e: reqwest::Error) -> Self {
        SyncError::Transport(e.to_string())
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(e: serde_json::Error) -> Self {
        SyncError::Decode(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classified_messages_are_distinct() {
        let auth = SyncError::Auth.to_string();
        let quota = SyncError::RateLimit.to_string();
        let remote = SyncError::Remote {
            status: 500,
            message: "boom".to_string(),
        }
        .to_string();

        assert!(auth.contains("sign in again"));
        assert!(quota.contains("try again later"));
        assert_eq!(remote, "boom");
        assert_ne!(auth, quota);
    }

    #[test]
    fn test_status_helper() {
        assert_eq!(SyncError::Auth.status(), Some(401));
        assert_eq!(SyncError::RateLimit.status(), Some(429));
        assert_eq!(SyncError::Transport("refused".into()).status(), None);
        assert_eq!(SyncError::Validation("Title is required".into()).status(), None);
    }
}
