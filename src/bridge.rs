//! Feeds a page into the detector from outside the browser.
//!
//! The page is described by JSON-lines events on a stream; the latest
//! snapshot stands in for the live DOM for both readout probes and the
//! extractor.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use crate::detect::Detector;
use crate::detect::extract::{Extractor, RecordDraft};
use crate::detect::readout::PageView;
use crate::error::{Error, Result};
use crate::models::{Platform, SubmissionRecord};

/// What the page looks like right now.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageSnapshot {
    pub url: String,
    /// Visible text per tag name, in document order.
    pub elements: HashMap<String, Vec<String>>,
    pub draft: RecordDraft,
}

pub struct SnapshotPage {
    platform: Platform,
    snapshot: RwLock<PageSnapshot>,
}

impl SnapshotPage {
    pub fn new(platform: Platform) -> Self {
        Self { platform, snapshot: RwLock::new(PageSnapshot::default()) }
    }

    pub fn replace(&self, snapshot: PageSnapshot) {
        *self.snapshot.write().unwrap_or_else(PoisonError::into_inner) = snapshot;
    }
}

impl PageView for SnapshotPage {
    fn texts(&self, tag: &str) -> Vec<String> {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .elements
            .get(tag)
            .cloned()
            .unwrap_or_default()
    }
}

impl Extractor for SnapshotPage {
    fn extract(&self) -> Result<SubmissionRecord> {
        let (url, mut draft) = {
            let snapshot = self.snapshot.read().unwrap_or_else(PoisonError::into_inner);
            (snapshot.url.clone(), snapshot.draft.clone())
        };
        if draft.url.is_empty() {
            draft.url = url;
        }
        draft.into_record(self.platform)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum PageEvent {
    /// The user clicked submit.
    Submit,
    Mutation { page: PageSnapshot },
    /// Manual sync request.
    Sync,
    Unload,
}

impl std::str::FromStr for PageEvent {
    type Err = Error;

    fn from_str(line: &str) -> Result<Self> {
        serde_json::from_str(line).map_err(|err| Error::InvalidInput(format!("bad page event: {err}")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

/// Applies one page event to the page and its detector.
pub fn dispatch(page: &SnapshotPage, detector: &Detector, event: PageEvent) -> Result<Flow> {
    log::trace!("[dispatch] {event:?}");
    match event {
        PageEvent::Submit => detector.arm(),
        PageEvent::Mutation { page: snapshot } => {
            page.replace(snapshot);
            detector.notify_mutation();
        }
        PageEvent::Sync => detector.trigger_now()?,
        PageEvent::Unload => {
            detector.disarm();
            return Ok(Flow::Stop);
        }
    }
    Ok(Flow::Continue)
}
