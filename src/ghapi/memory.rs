//! In-memory [`ContentStore`] for tests.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{Error, Result};

use super::{ContentStore, PutContents};

#[derive(Default)]
pub struct MemoryContents {
    /// path -> (text, revision)
    files: Mutex<BTreeMap<String, (String, String)>>,
    puts: Mutex<Vec<(String, PutContents)>>,
    fail_paths: Mutex<Vec<String>>,
    next_revision: Mutex<u64>,
}

impl MemoryContents {
    pub fn with_file(self, path: &str, text: &str) -> Self {
        let revision = self.bump();
        self.files.lock().unwrap().insert(path.to_string(), (text.to_string(), revision));
        self
    }

    /// Every PUT to `path` is answered with an error.
    pub fn failing_on(self, path: &str) -> Self {
        self.fail_paths.lock().unwrap().push(path.to_string());
        self
    }

    pub fn text(&self, path: &str) -> Option<String> {
        self.files.lock().unwrap().get(path).map(|(text, _)| text.clone())
    }

    pub fn current_revision(&self, path: &str) -> Option<String> {
        self.files.lock().unwrap().get(path).map(|(_, revision)| revision.clone())
    }

    pub fn puts(&self) -> Vec<(String, PutContents)> {
        self.puts.lock().unwrap().clone()
    }

    pub fn put_paths(&self) -> Vec<String> {
        self.puts().into_iter().map(|(path, _)| path).collect()
    }

    /// Simulates another writer touching `path`.
    pub fn overwrite_elsewhere(&self, path: &str, text: &str) {
        let revision = self.bump();
        self.files.lock().unwrap().insert(path.to_string(), (text.to_string(), revision));
    }

    fn bump(&self) -> String {
        let mut next = self.next_revision.lock().unwrap();
        *next += 1;
        format!("rev-{next}")
    }
}

#[async_trait]
impl ContentStore for MemoryContents {
    async fn revision(&self, path: &str) -> Result<Option<String>> {
        Ok(self.current_revision(path))
    }

    async fn folder_exists(&self, path: &str) -> Result<bool> {
        let prefix = format!("{path}/");
        Ok(self.files.lock().unwrap().keys().any(|file| file.starts_with(&prefix)))
    }

    async fn put(&self, path: &str, request: &PutContents) -> Result<()> {
        self.puts.lock().unwrap().push((path.to_string(), request.clone()));

        if self.fail_paths.lock().unwrap().iter().any(|failing| failing == path) {
            return Err(Error::SyncFailed(String::from("GitHub API Error (500): Server Error")));
        }

        if self.current_revision(path) != request.revision {
            return Err(Error::SyncFailed(format!("GitHub API Error (409): {path} does not match")));
        }

        let text = request
            .text()
            .ok_or_else(|| Error::SyncFailed(String::from("content is not valid base64")))?;
        let revision = self.bump();
        self.files.lock().unwrap().insert(path.to_string(), (text, revision));
        Ok(())
    }
}
