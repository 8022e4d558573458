//! Reads and mutations against the letters API.
//!
//! Every mutation runs once (pending -> success | failed) and, on success,
//! invalidates the keys `Mutation::invalidates` declares for it before the
//! result is handed back. Nothing is retried here.

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use crate::cache::{CacheKey, CachedValue, EntryState, Mutation, QueryCache};
use crate::classify::{DEFAULT_FAILURE, DRIVE_EXPORT_FAILURE, DRIVE_LIST_FAILURE};
use crate::error::{Result, SyncError};
use crate::model::{
    Document, DocumentId, DriveDocument, ExportBody, ExportRequest, ExportResult, NewDocument,
    RawDriveDocument, UpdateDocument, UNTITLED_LETTER,
};
use crate::normalize::{ContentNormalizer, DraftPlainText};
use crate::transport::{ApiClient, ClientConfig, HttpTransport};

/// Letters client: cached reads, CRUD mutations and Drive export.
#[derive(Clone)]
pub struct LetterService {
    api: ApiClient,
    cache: Arc<QueryCache>,
    normalizer: Arc<dyn ContentNormalizer>,
}

impl LetterService {
    pub fn new(
        api: ApiClient,
        cache: Arc<QueryCache>,
        normalizer: Arc<dyn ContentNormalizer>,
    ) -> Self {
        Self {
            api,
            cache,
            normalizer,
        }
    }

    /// HTTP transport, a fresh cache and the Draft normalizer.
    pub fn connect(config: ClientConfig) -> Result<Self> {
        let transport = Arc::new(HttpTransport::new(config)?);
        Ok(Self::new(
            ApiClient::new(transport),
            Arc::new(QueryCache::new()),
            Arc::new(DraftPlainText),
        ))
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    /// Whether the letter list or the Drive listing is on its first load.
    ///
    /// A refresh of an already-listed, stale value does not count.
    pub fn is_loading(&self) -> bool {
        [CacheKey::AllDocuments, CacheKey::DriveListing]
            .iter()
            .any(|key| self.cache.state(key) == EntryState::Loading)
    }

    #[instrument(skip(self), level = "debug")]
    pub async fn list_documents(&self) -> Result<Vec<Document>> {
        let key = CacheKey::AllDocuments;
        let value = self
            .cache
            .get_or_fetch(key, move || async move {
                let docs = self.api.get(&key.path(), DEFAULT_FAILURE).await?;
                Ok(CachedValue::Documents(docs))
            })
            .await?;
        value.into_documents().ok_or_else(|| mismatch(key))
    }

    #[instrument(skip(self), level = "debug")]
    pub async fn get_document(&self, id: DocumentId) -> Result<Document> {
        let key = CacheKey::Document(id);
        let value = self
            .cache
            .get_or_fetch(key, move || async move {
                Ok(CachedValue::Document(self.fetch_document(id).await?))
            })
            .await?;
        value.into_document().ok_or_else(|| mismatch(key))
    }

    /// Files in the user's Drive, with missing names and times backfilled.
    #[instrument(skip(self), level = "debug")]
    pub async fn list_drive_documents(&self) -> Result<Vec<DriveDocument>> {
        let key = CacheKey::DriveListing;
        let value = self
            .cache
            .get_or_fetch(key, move || async move {
                let raw: Vec<RawDriveDocument> =
                    self.api.get(&key.path(), DRIVE_LIST_FAILURE).await?;
                let now = Utc::now();
                let docs = raw
                    .into_iter()
                    .map(|r| DriveDocument::from_raw(r, now))
                    .collect::<Vec<_>>();
                debug!("Listed {} Drive documents", docs.len());
                Ok(CachedValue::DriveListing(docs))
            })
            .await?;
        value.into_drive_listing().ok_or_else(|| mismatch(key))
    }

    #[instrument(skip(self, doc), level = "debug", fields(title = %doc.title))]
    pub async fn create_document(&self, doc: NewDocument) -> Result<Document> {
        self.run(Mutation::Create, async move {
            self.api
                .post(&CacheKey::AllDocuments.path(), &doc, DEFAULT_FAILURE)
                .await
        })
        .await
    }

    pub async fn create_untitled(&self) -> Result<Document> {
        self.create_document(NewDocument::new(UNTITLED_LETTER)).await
    }

    #[instrument(skip(self, update), level = "debug")]
    pub async fn update_document(&self, id: DocumentId, update: UpdateDocument) -> Result<Document> {
        self.run(Mutation::Update(id), async move {
            self.api
                .put(&CacheKey::Document(id).path(), &update, DEFAULT_FAILURE)
                .await
        })
        .await
    }

    /// Delete a letter; echoes `id` back.
    #[instrument(skip(self), level = "debug")]
    pub async fn delete_document(&self, id: DocumentId) -> Result<DocumentId> {
        self.run(Mutation::Delete(id), async move {
            self.api
                .delete(&CacheKey::Document(id).path(), DEFAULT_FAILURE)
                .await?;
            Ok(id)
        })
        .await
    }

    /// Export a letter to Google Drive.
    ///
    /// The title is validated before anything is sent. Without caller-supplied
    /// text the letter is fetched and its content normalized first.
    #[instrument(skip(self, req), level = "debug", fields(id = %req.id))]
    pub async fn export_to_drive(&self, req: ExportRequest) -> Result<ExportResult> {
        self.run(Mutation::Export(req.id), async move {
            let title = req.validated_title()?;

            let plain_text = match req.supplied_content() {
                Some(text) => Some(text.to_string()),
                None => {
                    let doc = self.fetch_document(req.id).await?;
                    self.plain_text_of(&doc)
                }
            };

            self.push_export(req.id, title, req.category, plain_text, req.permission)
                .await
        })
        .await
    }

    /// Export a letter under the title it is stored with.
    #[instrument(skip(self), level = "debug")]
    pub async fn export_with_stored_title(
        &self,
        id: DocumentId,
        category: Option<String>,
        permission: Option<String>,
    ) -> Result<ExportResult> {
        self.run(Mutation::Export(id), async move {
            let doc = self.fetch_document(id).await?;
            let title = ExportRequest::new(id, doc.title.as_str()).validated_title()?;
            let plain_text = self.plain_text_of(&doc);

            self.push_export(id, title, category, plain_text, permission)
                .await
        })
        .await
    }

    async fn fetch_document(&self, id: DocumentId) -> Result<Document> {
        self.api
            .get(&CacheKey::Document(id).path(), DEFAULT_FAILURE)
            .await
    }

    fn plain_text_of(&self, doc: &Document) -> Option<String> {
        doc.content
            .as_ref()
            .filter(|c| !c.is_null())
            .map(|c| self.normalizer.to_plain_text(c))
    }

    async fn push_export(
        &self,
        id: DocumentId,
        title: String,
        category: Option<String>,
        plain_text_content: Option<String>,
        permission: Option<String>,
    ) -> Result<ExportResult> {
        let body = ExportBody {
            title,
            category,
            plain_text_content,
            permission,
        };
        self.api
            .post(
                &format!("/api/documents/{}/save-to-drive", id),
                &body,
                DRIVE_EXPORT_FAILURE,
            )
            .await
    }

    /// Drive one mutation to completion and invalidate its keys on success.
    async fn run<T, Fut>(&self, mutation: Mutation, op: Fut) -> Result<T>
    where
        Fut: Future<Output = Result<T>>,
    {
        debug!(mutation = mutation.name(), "Mutation pending");
        match op.await {
            Ok(value) => {
                let keys = self.cache.invalidate_for(mutation);
                info!(
                    mutation = mutation.name(),
                    invalidated = keys.len(),
                    "Mutation succeeded"
                );
                Ok(value)
            }
            Err(e) => {
                warn!(mutation = mutation.name(), "Mutation failed: {}", e);
                Err(e)
            }
        }
    }
}

fn mismatch(key: CacheKey) -> SyncError {
    SyncError::Decode(format!("cached value does not belong to {}", key))
}
