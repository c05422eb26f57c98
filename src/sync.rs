//! Pushes a captured submission to the user's repository.
//!
//! Two files per problem, `{slug}/README.md` and `{slug}/{slug}.{ext}`, each
//! written with a fresh revision read immediately before the write. The pair
//! is not transactional; a failure on the second file leaves the first one in
//! place for the next capture of the same problem to overwrite.

use crate::error::Result;
use crate::ghapi::{ContentStore, PutContents};
use crate::models::{Difficulty, SubmissionRecord};

pub mod artifacts;

/// What a successful sync wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    /// `None` when the description was left untouched.
    pub description_path: Option<String>,
    pub solution_path: String,
}

/// Upserts the description and solution documents for `record`.
pub async fn sync_record<S>(store: &S, record: &SubmissionRecord) -> Result<SyncReport>
where
    S: ContentStore + ?Sized,
{
    log::info!("[sync_record] Syncing {} ({})", record.slug, record.platform);

    // A later, less informed capture shouldn't clobber a good README.
    let folder_exists = store.folder_exists(&record.slug).await?;
    let description_path = if record.difficulty == Difficulty::Unknown && folder_exists {
        log::info!("[sync_record] Skipping README for {}: difficulty unknown and folder exists",
                   record.slug);
        None
    } else {
        let path = artifacts::description_path(record);
        upsert(store, &path, &artifacts::render_readme(record), artifacts::description_message(record))
            .await?;
        Some(path)
    };

    let solution_path = artifacts::solution_path(record);
    upsert(store, &solution_path, &record.code, artifacts::solution_message(record)).await?;

    log::info!("[sync_record] Sync complete for {}", record.slug);
    Ok(SyncReport { description_path, solution_path })
}

/// Read the current revision, then write conditionally on it.
async fn upsert<S>(store: &S, path: &str, text: &str, message: String) -> Result<()>
where
    S: ContentStore + ?Sized,
{
    let revision = store.revision(path).await?;
    log::debug!(
        "[upsert] {} {path}",
        if revision.is_some() { "Updating" } else { "Creating" }
    );

    store
        .put(path, &PutContents::new(message, text, revision))
        .await
        .inspect_err(|err| log::error!("[upsert] Could not write {path}: {err}"))
}
