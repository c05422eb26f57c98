//! Insertion-ordered in-memory store for tests.

use std::sync::Mutex;

use crate::background::CredentialSource;
use crate::error::Result;
use crate::models::{Credentials, ReviewEntry};

use super::ReviewRepository;

#[derive(Default)]
pub struct MemoryReviews {
    entries: Mutex<Vec<ReviewEntry>>,
    credentials: Mutex<Option<Credentials>>,
}

impl MemoryReviews {
    pub fn with_credentials(self, credentials: Credentials) -> Self {
        *self.credentials.lock().unwrap() = Some(credentials);
        self
    }
}

impl ReviewRepository for MemoryReviews {
    fn get(&self, slug: &str) -> Result<Option<ReviewEntry>> {
        Ok(self.entries.lock().unwrap().iter().find(|entry| entry.slug == slug).cloned())
    }

    fn upsert(&self, entry: &ReviewEntry) -> Result<()> {
        let mut entries = self.entries.lock().unwrap();
        match entries.iter_mut().find(|existing| existing.slug == entry.slug) {
            Some(existing) => *existing = entry.clone(),
            None => entries.push(entry.clone()),
        }
        Ok(())
    }

    fn all(&self) -> Result<Vec<ReviewEntry>> {
        Ok(self.entries.lock().unwrap().clone())
    }
}

impl CredentialSource for MemoryReviews {
    fn credentials(&self) -> Result<Option<Credentials>> {
        Ok(self.credentials.lock().unwrap().clone())
    }
}
