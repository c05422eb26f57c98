//! SQLite-backed durable state: the review store and the settings the
//! background context reads on every submission.

use std::collections::BTreeMap;
use std::path::Path;

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::background::CredentialSource;
use crate::error::Result;
use crate::models::{Credentials, ReviewEntry, DEFAULT_EF, MIN_EF};
use crate::srs::ReviewRepository;

pub mod reviews;
pub mod schema;
pub mod settings;

pub type DBResult<T> = rusqlite::Result<T>;

pub struct Store {
    connection: Connection,
}

impl Store {
    pub fn open(path: impl AsRef<Path>) -> DBResult<Self> {
        let store = Self { connection: Connection::open(path)? };
        store.initialize()?;
        Ok(store)
    }

    pub fn open_in_memory() -> DBResult<Self> {
        let store = Self { connection: Connection::open_in_memory()? };
        store.initialize()?;
        Ok(store)
    }

    fn initialize(&self) -> DBResult<()> {
        log::debug!("[initialize_db] creating Reviews table...");
        self.connection.execute(schema::REVIEWS_SCHEMA, [])?;

        log::debug!("[initialize_db] creating Settings table...");
        self.connection.execute(schema::SETTINGS_SCHEMA, [])?;

        Ok(())
    }

    pub fn save_credentials(&self, credentials: &Credentials) -> Result<()> {
        settings::save_credentials(&self.connection, credentials)?;
        log::info!("[save_credentials] Connected to {}", credentials.repo);
        Ok(())
    }

    /// The `{githubRepo, reviews}` blob. The token is never exported.
    pub fn export(&self) -> Result<StoreSnapshot> {
        let github_repo = settings::query_setting(&self.connection, settings::GITHUB_REPO)?;
        let reviews = reviews::query_reviews(&self.connection)?
            .into_iter()
            .map(|entry| (entry.slug.clone(), entry))
            .collect();

        Ok(StoreSnapshot { github_repo, reviews })
    }

    /// Adds the snapshot's entries, keeping any that already exist.
    ///
    /// Returns how many entries were added.
    pub fn import(&self, snapshot: StoreSnapshot) -> Result<usize> {
        let mut added = 0;
        for (slug, mut entry) in snapshot.reviews {
            if entry.slug.is_empty() {
                entry.slug = slug;
            }
            // Stored schedules always carry a real interval and a usable ease factor.
            entry.interval = entry.interval.max(1);
            entry.ef = if entry.ef > 0.0 { entry.ef.max(MIN_EF) } else { DEFAULT_EF };
            if reviews::insert_review(&self.connection, &entry)? {
                added += 1;
            }
        }

        log::info!("[import] Imported {added} review entries");
        Ok(added)
    }
}

impl ReviewRepository for Store {
    fn get(&self, slug: &str) -> Result<Option<ReviewEntry>> {
        Ok(reviews::query_review(&self.connection, slug)?)
    }

    fn upsert(&self, entry: &ReviewEntry) -> Result<()> {
        Ok(reviews::upsert_review(&self.connection, entry)?)
    }

    fn all(&self) -> Result<Vec<ReviewEntry>> {
        Ok(reviews::query_reviews(&self.connection)?)
    }
}

impl CredentialSource for Store {
    fn credentials(&self) -> Result<Option<Credentials>> {
        Ok(settings::query_credentials(&self.connection)?)
    }
}

/// Serialized form of the durable configuration store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_repo: Option<String>,
    #[serde(default)]
    pub reviews: BTreeMap<String, ReviewEntry>,
}

/// Maps a primary key conflict (the row is already there) to `Ok(false)`.
///
/// Any other constraint failure is a real error.
pub(crate) fn swallow_constraint_violation(err: rusqlite::Error) -> DBResult<bool> {
    match err {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == rusqlite::ErrorCode::ConstraintViolation
                && failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY => Ok(false),
        err => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::models::{DAY_IN_MILLIS, Difficulty};
    use crate::srs::{self, Quality};

    const NOW: i64 = 1_700_000_000_000;

    #[test]
    fn review_entries_survive_the_round_trip_through_sqlite() {
        let store = Store::open_in_memory().unwrap();
        srs::create_if_absent(&store, "two-sum", "Two Sum", Some("leetcode.com/problems/two-sum"), NOW).unwrap();
        let graded = srs::grade(&store, "two-sum", Quality::GOOD, NOW + DAY_IN_MILLIS).unwrap();

        assert_eq!(store.get("two-sum").unwrap(), Some(graded));
        assert_eq!(store.get("three-sum").unwrap(), None);
    }

    #[test]
    fn upsert_keeps_insertion_order() {
        let store = Store::open_in_memory().unwrap();
        for slug in ["zigzag", "alpha", "middle"] {
            srs::create_if_absent(&store, slug, slug, None, NOW).unwrap();
        }
        srs::grade(&store, "zigzag", Quality::EASY, NOW).unwrap();

        let slugs = store.all().unwrap().into_iter().map(|entry| entry.slug).collect::<Vec<_>>();
        assert_eq!(slugs, vec!["zigzag", "alpha", "middle"]);
    }

    #[test]
    fn credentials_are_absent_until_saved() {
        let store = Store::open_in_memory().unwrap();
        assert_eq!(store.credentials().unwrap(), None);

        let credentials = Credentials::new("ghp_x", "octocat/solutions").unwrap();
        store.save_credentials(&credentials).unwrap();
        assert_eq!(store.credentials().unwrap(), Some(credentials));

        let replaced = Credentials::new("ghp_y", "octocat/other").unwrap();
        store.save_credentials(&replaced).unwrap();
        assert_eq!(store.credentials().unwrap(), Some(replaced));
    }

    #[test]
    fn export_omits_token_and_import_keeps_existing_progress() {
        let store = Store::open_in_memory().unwrap();
        store.save_credentials(&Credentials::new("ghp_secret", "octocat/solutions").unwrap()).unwrap();
        srs::create_if_absent(&store, "two-sum", "Two Sum", None, NOW).unwrap();
        let progressed = srs::grade(&store, "two-sum", Quality::EASY, NOW).unwrap();

        let exported = serde_json::to_string(&store.export().unwrap()).unwrap();
        assert!(!exported.contains("ghp_secret"));
        assert!(exported.contains("\"githubRepo\":\"octocat/solutions\""));

        let blob = serde_json::json!({
            "githubPat": "ignored",
            "reviews": {
                "two-sum": { "slug": "two-sum", "title": "Two Sum", "addedAt": 0, "nextReview": 0 },
                "valid-anagram": { "slug": "valid-anagram", "title": "Valid Anagram", "addedAt": 5, "nextReview": 9 }
            }
        });
        let added = store.import(serde_json::from_value(blob).unwrap()).unwrap();

        assert_eq!(added, 1);
        assert_eq!(store.get("two-sum").unwrap(), Some(progressed));
        let anagram = store.get("valid-anagram").unwrap().unwrap();
        assert_eq!((anagram.interval, anagram.repetitions, anagram.ef), (1, 0, DEFAULT_EF));
    }

    #[test]
    fn import_repairs_out_of_range_ease_factors() {
        let store = Store::open_in_memory().unwrap();
        let blob = serde_json::json!({
            "reviews": {
                "lru-cache": { "title": "LRU Cache", "addedAt": 1, "nextReview": 2,
                               "interval": 3, "repetitions": 2, "ef": 1.2 },
                "3sum": { "title": "3Sum", "addedAt": 1, "nextReview": 2, "ef": 0 }
            }
        });

        assert_eq!(store.import(serde_json::from_value(blob).unwrap()).unwrap(), 2);
        let lru = store.get("lru-cache").unwrap().unwrap();
        assert_eq!((lru.interval, lru.repetitions, lru.ef), (3, 2, MIN_EF));
        assert_eq!(store.get("3sum").unwrap().unwrap().ef, DEFAULT_EF);
    }

    #[test]
    fn rows_breaking_table_checks_are_errors_not_duplicates() {
        let store = Store::open_in_memory().unwrap();
        srs::create_if_absent(&store, "two-sum", "Two Sum", None, NOW).unwrap();
        let mut broken = store.get("two-sum").unwrap().unwrap();
        broken.slug = String::from("lru-cache");
        broken.ef = 1.0;

        assert!(matches!(reviews::insert_review(&store.connection, &broken).map_err(Error::from),
                         Err(Error::Store(_))));
        broken.slug = String::from("two-sum");
        broken.ef = DEFAULT_EF;
        assert!(!reviews::insert_review(&store.connection, &broken).unwrap());
    }

    #[test]
    fn import_reads_lowercase_ratings() {
        let store = Store::open_in_memory().unwrap();
        let blob = serde_json::json!({
            "githubRepo": "octocat/solutions",
            "reviews": {
                "two-sum": { "slug": "two-sum", "title": "Two Sum", "problemUrl": "leetcode.com/problems/two-sum",
                             "addedAt": 1, "nextReview": 2, "interval": 1, "repetitions": 0, "ef": 2.5,
                             "userDifficulty": "easy", "ratedAt": 5 },
                "3sum": { "slug": "3sum", "title": "3Sum", "addedAt": 3, "nextReview": 4,
                          "interval": 1, "repetitions": 0, "ef": 2.5 }
            }
        });

        store.import(serde_json::from_value(blob).unwrap()).unwrap();

        let rated = store.get("two-sum").unwrap().unwrap();
        assert_eq!(rated.user_difficulty, Some(Difficulty::Easy));
        let unrated = srs::unrated(&store).unwrap();
        assert_eq!(unrated.len(), 1);
        assert_eq!(unrated[0].slug, "3sum");
    }
}
