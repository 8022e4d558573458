//! Command-line client for the letters API.
//!
//! Reads and mutations go through `LetterService`, so every command gets
//! the same error classification and cache invalidation as library users.
//! Results are printed as JSON on stdout; logs go to stderr.

mod config;

use std::process::ExitCode;

use clap::Parser;
use letter_sync_core::{
    DocumentId, ExportRequest, LetterService, NewDocument, SyncError, UpdateDocument,
    UNTITLED_LETTER,
};
use serde_json::Value;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use config::{Command, Config};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::parse();
    debug!("Using letters API at {}", config.api_url);

    let service = LetterService::connect(config.client_config())?;

    match run(&service, config.command).await {
        Ok(output) => {
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            if e.is_auth() {
                error!("{} Run the web client's Google sign-in again.", e);
            } else {
                error!("{}", e);
            }
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn run(service: &LetterService, command: Command) -> Result<Value, SyncError> {
    let output = match command {
        Command::List => to_json(service.list_documents().await?)?,
        Command::Get { id } => to_json(service.get_document(DocumentId(id)).await?)?,
        Command::Create { title, content } => {
            let doc = match (title, content) {
                (None, None) => service.create_untitled().await?,
                (title, content) => {
                    let title = title.unwrap_or_else(|| UNTITLED_LETTER.to_string());
                    let mut new = NewDocument::new(title);
                    if let Some(content) = content {
                        new = new.with_content(parse_content(content));
                    }
                    service.create_document(new).await?
                }
            };
            info!("Created letter {}", doc.id);
            to_json(doc)?
        }
        Command::Update {
            id,
            title,
            content,
            category,
        } => {
            let update = UpdateDocument {
                title,
                content: content.map(parse_content),
                category,
            };
            to_json(service.update_document(DocumentId(id), update).await?)?
        }
        Command::Delete { id } => {
            let id = service.delete_document(DocumentId(id)).await?;
            info!("Deleted letter {}", id);
            serde_json::json!({ "id": id })
        }
        Command::Export {
            id,
            title,
            category,
            content,
            permission,
        } => {
            let id = DocumentId(id);
            let result = match title {
                Some(title) => {
                    let mut req = ExportRequest::new(id, title);
                    req.category = category;
                    req.content = content;
                    req.permission = permission;
                    service.export_to_drive(req).await?
                }
                None => {
                    service
                        .export_with_stored_title(id, category, permission)
                        .await?
                }
            };
            if let Some(link) = result.web_view_link() {
                info!("Exported letter {} to {}", id, link);
            }
            result.0
        }
        Command::Drive => to_json(service.list_drive_documents().await?)?,
    };
    Ok(output)
}

/// Draft raw state when `raw` is JSON, otherwise the literal text.
fn parse_content(raw: String) -> Value {
    serde_json::from_str(&raw).unwrap_or(Value::String(raw))
}

fn to_json<T: serde::Serialize>(value: T) -> Result<Value, SyncError> {
    Ok(serde_json::to_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_content() {
        assert_eq!(
            parse_content(r#"{"blocks":[{"text":"hi"}]}"#.to_string()),
            json!({"blocks": [{"text": "hi"}]})
        );
        assert_eq!(parse_content("plain words".to_string()), json!("plain words"));
    }
}
