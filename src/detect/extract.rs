use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::{self, Difficulty, Platform, SubmissionRecord};

/// `scheme://host/problems/slug...`, scheme optional.
static PROBLEM_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[A-Za-z][A-Za-z0-9+.-]*://)?([^/?#]+)/problems/([^/?#]+)")
        .expect("problem url regex")
});

/// The extraction contract: turns the current page into a record, or refuses.
pub trait Extractor: Send + Sync {
    fn extract(&self) -> Result<SubmissionRecord>;
}

/// Raw values read off the page by a site adapter, before validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecordDraft {
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub code: Option<String>,
    pub difficulty: Option<String>,
    pub language: Option<String>,
    pub tags: Vec<String>,
}

impl RecordDraft {
    /// Builds the record, rejecting drafts without a slug, title or code.
    pub fn into_record(self, platform: Platform) -> Result<SubmissionRecord> {
        let (host, slug) = split_problem_url(&self.url).ok_or(Error::ExtractionIncomplete("slug"))?;

        let record = SubmissionRecord {
            problem_url: format!("{host}/problems/{slug}"),
            slug,
            title: self.title.map(|title| title.trim().to_string()).unwrap_or_default(),
            description: self
                .description
                .filter(|description| !description.trim().is_empty())
                .unwrap_or_else(|| String::from("No description found.")),
            code: self.code.unwrap_or_default(),
            difficulty: self.difficulty.as_deref().map(Difficulty::from_label).unwrap_or_default(),
            language: self
                .language
                .map(|language| language.trim().to_string())
                .filter(|language| !language.is_empty())
                .unwrap_or_else(|| String::from("unknown")),
            tags: self.tags,
            platform,
            timestamp: models::now_millis(),
        };

        record.validate()?;
        Ok(record)
    }
}

/// Splits a problem page URL into `(host, slug)`.
pub fn split_problem_url(url: &str) -> Option<(String, String)> {
    let captures = PROBLEM_URL.captures(url.trim())?;
    let host = captures.get(1)?.as_str().to_lowercase();
    let slug = captures.get(2)?.as_str().to_string();
    Some((host, slug))
}

/// The slug of the problem at `url`, e.g. `two-sum`.
pub fn problem_slug(url: &str) -> Option<String> {
    split_problem_url(url).map(|(_, slug)| slug)
}

/// The platform serving `url`, if supported.
pub fn platform_of(url: &str) -> Option<Platform> {
    split_problem_url(url).and_then(|(host, _)| Platform::from_host(&host))
}
