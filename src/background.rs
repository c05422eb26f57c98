//! The background context: receives accepted submissions from pages, syncs
//! them to GitHub and starts their review schedule.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::error::{Error, Result};
use crate::ghapi::ContentStore;
use crate::models::{self, Credentials, InboundMessage, SubmissionRecord};
use crate::signal::{Indicator, SyncSignal};
use crate::srs::{self, ReviewRepository};
use crate::sync::{self, SyncReport};

/// Where the stored GitHub credentials come from.
pub trait CredentialSource {
    fn credentials(&self) -> Result<Option<Credentials>>;
}

impl<C: CredentialSource + ?Sized> CredentialSource for &C {
    fn credentials(&self) -> Result<Option<Credentials>> {
        (**self).credentials()
    }
}

/// Builds a remote store for a set of credentials.
pub type Connector = Box<dyn Fn(&Credentials) -> Arc<dyn ContentStore> + Send + Sync>;

pub struct Background<R> {
    store: R,
    connect: Connector,
    indicator: Indicator,
}

impl<R> Background<R>
where
    R: ReviewRepository + CredentialSource,
{
    pub fn new(store: R, connect: Connector, indicator: Indicator) -> Self {
        Self { store, connect, indicator }
    }

    pub fn store(&self) -> &R {
        &self.store
    }

    /// Handles one inbound message to completion.
    ///
    /// Messages without stored credentials are dropped without touching the
    /// remote; the badge is left alone for those.
    pub async fn handle(&self, message: InboundMessage) -> Result<SyncReport> {
        let InboundMessage::SubmissionAccepted(record) = message;
        log::info!("[handle] Received submission:\n{record}");

        let result = self.process(&record).await;
        match &result {
            Ok(_) => self.indicator.flash(SyncSignal::Success),
            Err(Error::CredentialsMissing) => {
                log::warn!("[handle] No GitHub credentials configured; run `connect` first");
            }
            Err(err) => {
                log::error!("[handle] Sync failed for {}: {err}", record.slug);
                self.indicator.flash(SyncSignal::Error);
            }
        }
        result
    }

    /// Drains `inbox`, one message at a time, until every sender is gone.
    pub async fn run(&self, mut inbox: mpsc::UnboundedReceiver<InboundMessage>) {
        while let Some(message) = inbox.recv().await {
            let _ = self.handle(message).await;
        }
        log::debug!("[run] Inbox closed");
    }

    async fn process(&self, record: &SubmissionRecord) -> Result<SyncReport> {
        let credentials = self.store.credentials()?.ok_or(Error::CredentialsMissing)?;
        let remote = (self.connect)(&credentials);

        let report = sync::sync_record(remote.as_ref(), record).await?;

        // Only problems that made it to the repository get scheduled.
        srs::create_if_absent(
            &self.store,
            &record.slug,
            &record.title,
            Some(&record.problem_url),
            models::now_millis(),
        )?;

        Ok(report)
    }
}
