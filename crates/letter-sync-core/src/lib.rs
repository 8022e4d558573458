//! Client-side synchronisation layer for the letters API.
//!
//! This crate keeps a local view of letters consistent with the remote store:
//! - `ApiClient` / `Transport`: REST calls with classified failures
//! - `QueryCache`: cached reads keyed by resource path, invalidated per mutation
//! - `LetterService`: CRUD mutations and the Google Drive export workflow
//! - `ContentNormalizer`: rich-text to plain-text conversion for export

mod cache;
mod classify;
mod error;
mod model;
mod normalize;
mod service;
mod transport;

#[cfg(test)]
mod testing;

pub use cache::{CacheKey, CachedValue, EntryState, Mutation, QueryCache};
pub use classify::{
    classify, AUTH_ERROR_MARKER, DEFAULT_FAILURE, DRIVE_EXPORT_FAILURE, DRIVE_LIST_FAILURE,
    QUOTA_ERROR_MARKER,
};
pub use error::{Result, SyncError};
pub use model::{
    Document, DocumentId, DriveDocument, ErrorPayload, ExportRequest, ExportResult, NewDocument,
    UpdateDocument, UNTITLED_LETTER,
};
pub use normalize::{to_plain_text, ContentNormalizer, DraftPlainText};
pub use service::LetterService;
pub use transport::{
    ApiClient, ClientConfig, Credentials, HttpTransport, Method, RawResponse, Transport,
};
