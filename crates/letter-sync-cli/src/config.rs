use std::time::Duration;

use clap::{Parser, Subcommand};
use letter_sync_core::{ClientConfig, Credentials};

/// Configuration for the letter-sync client.
#[derive(Parser, Debug, Clone)]
#[command(name = "letter-sync")]
#[command(about = "Manage letters and export them to Google Drive", version)]
pub struct Config {
    /// Origin of the letters API
    #[arg(long, default_value = "http://localhost:5000", env = "LETTER_API_URL")]
    pub api_url: String,

    /// Bearer token sent with every request
    #[arg(long, env = "LETTER_API_TOKEN", conflicts_with = "session_cookie")]
    pub api_token: Option<String>,

    /// Session cookie sent with every request (e.g. "connect.sid=...")
    #[arg(long, env = "LETTER_SESSION_COOKIE")]
    pub session_cookie: Option<String>,

    /// Request timeout in seconds (HTTP client default when unset)
    #[arg(long, env = "LETTER_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List all letters
    List,

    /// Show one letter
    Get { id: i64 },

    /// Create a letter
    Create {
        /// Title (defaults to "Untitled Letter")
        title: Option<String>,

        /// Initial content (Draft raw JSON or plain text)
        #[arg(long)]
        content: Option<String>,
    },

    /// Update fields of a letter; omitted fields are left unchanged
    Update {
        id: i64,

        #[arg(long)]
        title: Option<String>,

        /// New content (Draft raw JSON or plain text)
        #[arg(long)]
        content: Option<String>,

        #[arg(long)]
        category: Option<String>,
    },

    /// Delete a letter
    Delete { id: i64 },

    /// Export a letter to Google Drive
    Export {
        id: i64,

        /// Title of the Drive file (defaults to the letter's title)
        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        category: Option<String>,

        /// Plain text to export instead of the letter's stored content
        #[arg(long)]
        content: Option<String>,

        /// Sharing level requested for the Drive file
        #[arg(long)]
        permission: Option<String>,
    },

    /// List letters stored in Google Drive
    Drive,
}

impl Config {
    pub fn client_config(&self) -> ClientConfig {
        let credentials = match (&self.api_token, &self.session_cookie) {
            (Some(token), _) => Credentials::Bearer(token.clone()),
            (None, Some(cookie)) => Credentials::Cookie(cookie.clone()),
            (None, None) => Credentials::None,
        };

        ClientConfig {
            base_url: self.api_url.clone(),
            credentials,
            timeout: self.timeout_secs.map(Duration::from_secs),
        }
    }
}
