//! Bulk import of posts from an uploaded JSON document.
//!
//! Records are checked one by one; a bad record is counted and skipped, it
//! never aborts the batch. Only two things fail the whole upload: a
//! document that is not a JSON array of records, and a failure of the final
//! batch write.

use crate::data::post_repository::PostRepository;
use crate::data::user_repository::UserRepository;
use crate::domain::import::{CheckedRecord, PostRecord, SkipReason, UploadSummary};
use crate::domain::post::NewPost;
use crate::domain::DomainError;
use std::sync::Arc;
use uuid::Uuid;

/// Outcome of a single record.
#[derive(Debug)]
enum RecordOutcome {
    Accepted(NewPost),
    Skipped(SkipReason),
}

/// Accepted posts and the number of skipped records.
#[derive(Debug, Default)]
struct Batch {
    accepted: Vec<NewPost>,
    failed: usize,
}

impl Batch {
    fn push(&mut self, index: usize, outcome: RecordOutcome) {
        match outcome {
            RecordOutcome::Accepted(post) => self.accepted.push(post),
            RecordOutcome::Skipped(reason) => {
                tracing::debug!("Record #{} skipped: {}", index, reason);
                self.failed += 1;
            }
        }
    }
}

pub struct ImportService {
    post_repo: Arc<dyn PostRepository + Send + Sync>,
    user_repo: Arc<dyn UserRepository + Send + Sync>,
}

impl ImportService {
    pub fn new(
        post_repo: Arc<dyn PostRepository + Send + Sync>,
        user_repo: Arc<dyn UserRepository + Send + Sync>,
    ) -> Self {
        Self {
            post_repo,
            user_repo,
        }
    }

    pub async fn upload_from_json(&self, bytes: &[u8]) -> Result<UploadSummary, DomainError> {
        let import_id = Uuid::new_v4();

        let records: Vec<PostRecord> = serde_json::from_slice(bytes).map_err(|e| {
            tracing::warn!("Import {} rejected, payload is not a post array: {}", import_id, e);
            DomainError::MalformedInput(format!("Invalid JSON file format: {}", e))
        })?;

        tracing::info!("Import {} started with {} records", import_id, records.len());

        let mut batch = Batch::default();
        for (index, record) in records.into_iter().enumerate() {
            let outcome = self.resolve(record).await?;
            batch.push(index, outcome);
        }

        let accepted = batch.accepted.len();
        if accepted > 0 {
            self.post_repo
                .create_all(batch.accepted)
                .await
                .map_err(|e| {
                    tracing::error!("Import {} failed to store {} posts: {}", import_id, accepted, e);
                    DomainError::CreationFailed(format!("Failed to store uploaded posts: {}", e))
                })?;
        }

        tracing::info!(
            "Import {} finished: {} stored, {} failed",
            import_id,
            accepted,
            batch.failed
        );

        Ok(UploadSummary::new(accepted, batch.failed))
    }

    /// Checks a record and looks up its owner. Only store faults are errors.
    async fn resolve(&self, record: PostRecord) -> Result<RecordOutcome, DomainError> {
        let checked = match record.check() {
            Ok(checked) => checked,
            Err(reason) => return Ok(RecordOutcome::Skipped(reason)),
        };

        match self.user_repo.find_by_id(checked.user_id).await {
            Ok(owner) => Ok(RecordOutcome::Accepted(to_new_post(checked, owner.id))),
            Err(DomainError::UserNotFound) => Ok(RecordOutcome::Skipped(
                SkipReason::OwnerNotFound(checked.user_id),
            )),
            Err(e) => Err(e),
        }
    }
}

fn to_new_post(record: CheckedRecord, owner_id: i64) -> NewPost {
    NewPost {
        title: record.title,
        content: record.content,
        country: record.country,
        categories: record.categories,
        created_at: record.created_at,
        rating: record.rating,
        user_id: owner_id,
    }
}
