use chrono::DateTime;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Milliseconds in one day; intervals are whole days.
pub const DAY_IN_MILLIS: i64 = 86_400_000;

/// Default ease factor for a freshly scheduled problem.
pub const DEFAULT_EF: f64 = 2.5;

/// Ease factor never drops below this.
pub const MIN_EF: f64 = 1.3;

/// Milliseconds since the Unix epoch.
pub type Timestamp = i64;

pub fn now_millis() -> Timestamp {
    chrono::Utc::now().timestamp_millis()
}

/// Renders a millisecond timestamp for humans.
pub fn display_millis(millis: Timestamp) -> String {
    DateTime::from_timestamp_millis(millis)
        .map(|time| time.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| String::from("N/A"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Difficulty {
    #[serde(alias = "easy", alias = "EASY")]
    Easy,
    #[serde(alias = "medium", alias = "MEDIUM")]
    Medium,
    #[serde(alias = "hard", alias = "HARD")]
    Hard,
    #[default]
    #[serde(other)]
    Unknown,
}

impl Difficulty {
    /// Reads a difficulty out of free-form page text ("Easy", "medium", "Hard ").
    pub fn from_label(label: &str) -> Self {
        let label = label.trim().to_lowercase();
        if label.contains("easy") {
            Difficulty::Easy
        } else if label.contains("medium") {
            Difficulty::Medium
        } else if label.contains("hard") {
            Difficulty::Hard
        } else {
            Difficulty::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
            Difficulty::Unknown => "Unknown",
        }
    }

    /// shields.io colour used for the README badge.
    pub fn badge_color(&self) -> &'static str {
        match self {
            Difficulty::Easy => "brightgreen",
            Difficulty::Medium => "orange",
            Difficulty::Hard => "red",
            Difficulty::Unknown => "grey",
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Platform {
    #[serde(rename = "LeetCode")]
    LeetCode,
    #[serde(rename = "NEETCODE", alias = "NeetCode")]
    NeetCode,
}

impl Platform {
    /// Recognises a supported practice site from a URL host.
    pub fn from_host(host: &str) -> Option<Self> {
        let host = host.to_lowercase();
        if host.ends_with("leetcode.com") || host.ends_with("leetcode.cn") {
            Some(Platform::LeetCode)
        } else if host.ends_with("neetcode.io") {
            Some(Platform::NeetCode)
        } else {
            None
        }
    }

    /// Label used in commit messages and badges.
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::LeetCode => "LeetCode",
            Platform::NeetCode => "NEETCODE",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Platform {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "leetcode" => Ok(Platform::LeetCode),
            "neetcode" => Ok(Platform::NeetCode),
            other => Err(Error::InvalidInput(format!("unsupported platform: {other}"))),
        }
    }
}

/// One successful submission, captured once per detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRecord {
    pub slug: String,
    pub title: String,
    pub description: String,
    pub code: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    pub language: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub problem_url: String,
    pub platform: Platform,
    pub timestamp: Timestamp,
}

impl SubmissionRecord {
    /// Rejects records missing the fields the pipeline cannot do without.
    pub fn validate(&self) -> Result<()> {
        if self.slug.trim().is_empty() {
            return Err(Error::ExtractionIncomplete("slug"));
        }
        if self.title.trim().is_empty() {
            return Err(Error::ExtractionIncomplete("title"));
        }
        if self.code.trim().is_empty() {
            return Err(Error::ExtractionIncomplete("code"));
        }
        Ok(())
    }
}

impl std::fmt::Display for SubmissionRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "**Submission**: {} ({})\n\
            \tPlatform:   {}\n\
            \tDifficulty: {}\n\
            \tLanguage:   `{}`\n\
            \tCaptured:   {}",
            self.title, self.slug,
            self.platform,
            self.difficulty,
            self.language,
            display_millis(self.timestamp)
        )
    }
}

/// Message from the page context to the background context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum InboundMessage {
    #[serde(rename = "SUBMISSION_ACCEPTED")]
    SubmissionAccepted(SubmissionRecord),
}

fn default_ef() -> f64 {
    DEFAULT_EF
}

/// Spaced-repetition state for one problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewEntry {
    #[serde(default)]
    pub slug: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub problem_url: Option<String>,
    pub added_at: Timestamp,
    pub next_review: Timestamp,
    #[serde(default)]
    pub interval: u32,
    #[serde(default)]
    pub repetitions: u32,
    #[serde(default = "default_ef")]
    pub ef: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_reviewed: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_difficulty: Option<Difficulty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rated_at: Option<Timestamp>,
}

impl ReviewEntry {
    pub fn is_due(&self, now: Timestamp) -> bool {
        self.next_review <= now
    }
}

impl std::fmt::Display for ReviewEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "**{}** ({})\n\
             \tURL:         {}\n\
             \tAdded:       {}\n\
             \tNext Review: {}\n\
             \tInterval:    {} day(s)\n\
             \tRepetitions: {}",
            self.title, self.slug,
            self.problem_url.as_deref().unwrap_or("N/A"),
            display_millis(self.added_at),
            display_millis(self.next_review),
            self.interval,
            self.repetitions
        )
    }
}

/// `(passed, total)` as read off a result readout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestTally {
    pub passed: u32,
    pub total: u32,
}

impl TestTally {
    pub fn percentage(&self) -> f64 {
        if self.total > 0 {
            self.passed as f64 / self.total as f64 * 100.0
        } else {
            0.0
        }
    }

    /// 100% with at least one test case.
    pub fn is_full_pass(&self) -> bool {
        self.total > 0 && self.passed == self.total
    }
}

impl std::fmt::Display for TestTally {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{} ({:.1}%)", self.passed, self.total, self.percentage())
    }
}

/// Access to the user's solutions repository.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub token: String,
    /// `owner/repo`
    pub repo: String,
}

impl Credentials {
    pub fn new(token: &str, repo: &str) -> Result<Self> {
        let token = token.trim();
        let repo = repo.trim();
        if token.is_empty() || repo.is_empty() {
            return Err(Error::InvalidInput(String::from("token and repository are both required")));
        }

        let parts = repo.split('/').collect::<Vec<_>>();
        if parts.len() != 2 || parts.iter().any(|part| part.is_empty()) {
            return Err(Error::InvalidInput(format!("expected repository as owner/repo, got {repo}")));
        }

        Ok(Self { token: token.to_string(), repo: repo.to_string() })
    }
}

// Tokens stay out of logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .field("repo", &self.repo)
            .finish()
    }
}
