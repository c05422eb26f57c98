//! Spaced-repetition scheduling (SM-2).
//!
//! Every captured problem gets a [`ReviewEntry`] on first capture. Grading a
//! review with a recall quality moves its next review date:
//!
//! - quality >= 3 (recalled): interval goes 1 day, then 6 days, then
//!   `round(interval * ef)`; repetitions counts up.
//! - quality < 3 (forgot): back to a 1 day interval, repetitions reset to 0.
//! - ef moves by `0.1 - (5 - q) * (0.08 + (5 - q) * 0.02)` and never drops
//!   below 1.3.

use std::cmp::Reverse;

use itertools::Itertools;

use crate::error::{Error, Result};
use crate::models::{Difficulty, ReviewEntry, Timestamp, DAY_IN_MILLIS, DEFAULT_EF, MIN_EF};

#[cfg(test)]
pub mod memory;

/// Storage for review entries, keyed by slug.
///
/// `all()` returns entries in insertion order.
pub trait ReviewRepository {
    fn get(&self, slug: &str) -> Result<Option<ReviewEntry>>;
    fn upsert(&self, entry: &ReviewEntry) -> Result<()>;
    fn all(&self) -> Result<Vec<ReviewEntry>>;
}

impl<R: ReviewRepository + ?Sized> ReviewRepository for &R {
    fn get(&self, slug: &str) -> Result<Option<ReviewEntry>> {
        (**self).get(slug)
    }

    fn upsert(&self, entry: &ReviewEntry) -> Result<()> {
        (**self).upsert(entry)
    }

    fn all(&self) -> Result<Vec<ReviewEntry>> {
        (**self).all()
    }
}

/// Recall quality, 0 (blackout) to 5 (perfect).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Quality(u8);

impl Quality {
    pub const FORGOT: Quality = Quality(0);
    pub const HARD: Quality = Quality(3);
    pub const GOOD: Quality = Quality(4);
    pub const EASY: Quality = Quality(5);

    pub fn new(value: u8) -> Result<Self> {
        if value > 5 {
            return Err(Error::InvalidInput(format!("quality must be 0-5, got {value}")));
        }
        Ok(Quality(value))
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    pub fn recalled(&self) -> bool {
        self.0 >= 3
    }
}

impl std::str::FromStr for Quality {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "again" | "forgot" => Ok(Quality::FORGOT),
            "hard" => Ok(Quality::HARD),
            "good" => Ok(Quality::GOOD),
            "easy" => Ok(Quality::EASY),
            other => other
                .parse::<u8>()
                .map_err(|_| Error::InvalidInput(format!("unknown grade: {other}")))
                .and_then(Quality::new),
        }
    }
}

/// Applies one graded review to `existing`, as of `now`.
pub fn schedule(existing: &ReviewEntry, quality: Quality, now: Timestamp) -> ReviewEntry {
    let mut entry = existing.clone();
    let q = quality.value() as f64;

    // Entries that predate scheduling may carry a zero ef.
    let ef = if entry.ef > 0.0 { entry.ef } else { DEFAULT_EF };

    if quality.recalled() {
        entry.interval = match entry.repetitions {
            0 => 1,
            1 => 6,
            _ => ((entry.interval as f64 * ef).round() as u32).max(1),
        };
        entry.repetitions += 1;
    } else {
        entry.repetitions = 0;
        entry.interval = 1;
    }

    entry.ef = (ef + (0.1 - (5.0 - q) * (0.08 + (5.0 - q) * 0.02))).max(MIN_EF);
    entry.next_review = now + entry.interval as i64 * DAY_IN_MILLIS;
    entry.last_reviewed = Some(now);
    entry
}

/// Starts a schedule for `slug` unless one already exists.
///
/// Returns `true` if a new entry was created.
pub fn create_if_absent<R>(
    repo: &R,
    slug: &str,
    title: &str,
    problem_url: Option<&str>,
    now: Timestamp,
) -> Result<bool>
where
    R: ReviewRepository + ?Sized,
{
    if repo.get(slug)?.is_some() {
        log::debug!("[create_if_absent] {slug} already scheduled; leaving it alone");
        return Ok(false);
    }

    repo.upsert(&ReviewEntry {
        slug: slug.to_string(),
        title: title.to_string(),
        problem_url: problem_url.map(str::to_string).filter(|url| !url.is_empty()),
        added_at: now,
        next_review: now + DAY_IN_MILLIS,
        interval: 1,
        repetitions: 0,
        ef: DEFAULT_EF,
        last_reviewed: None,
        user_difficulty: None,
        rated_at: None,
    })?;

    log::info!("[create_if_absent] Added {slug} to review schedule");
    Ok(true)
}

/// Grades the review of `slug` and stores the new schedule.
pub fn grade<R>(repo: &R, slug: &str, quality: Quality, now: Timestamp) -> Result<ReviewEntry>
where
    R: ReviewRepository + ?Sized,
{
    let existing = repo.get(slug)?.ok_or_else(|| Error::UnknownProblem(slug.to_string()))?;
    let updated = schedule(&existing, quality, now);
    repo.upsert(&updated)?;

    log::info!(
        "[grade] {slug} graded {}: next review in {} day(s), ef {:.2}",
        quality.value(), updated.interval, updated.ef
    );
    Ok(updated)
}

/// Entries due at `now` (inclusive), in store order.
pub fn due_entries<R>(repo: &R, now: Timestamp) -> Result<Vec<ReviewEntry>>
where
    R: ReviewRepository + ?Sized,
{
    Ok(repo.all()?.into_iter().filter(|entry| entry.is_due(now)).collect())
}

/// Records how hard the user found `slug`. Leaves the SM-2 fields alone.
///
/// Returns `false` if the problem has no entry.
pub fn rate_difficulty<R>(repo: &R, slug: &str, difficulty: Difficulty, now: Timestamp) -> Result<bool>
where
    R: ReviewRepository + ?Sized,
{
    let Some(mut entry) = repo.get(slug)? else {
        return Ok(false);
    };

    entry.user_difficulty = Some(difficulty);
    entry.rated_at = Some(now);
    repo.upsert(&entry)?;
    Ok(true)
}

/// Entries the user hasn't rated yet, most recently added first.
pub fn unrated<R>(repo: &R) -> Result<Vec<ReviewEntry>>
where
    R: ReviewRepository + ?Sized,
{
    Ok(repo
        .all()?
        .into_iter()
        .filter(|entry| entry.user_difficulty.is_none())
        .sorted_by_key(|entry| Reverse(entry.added_at))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use memory::MemoryReviews;

    const NOW: Timestamp = 1_700_000_000_000;

    fn entry(interval: u32, repetitions: u32, ef: f64) -> ReviewEntry {
        ReviewEntry {
            slug: String::from("two-sum"),
            title: String::from("Two Sum"),
            problem_url: None,
            added_at: 0,
            next_review: 0,
            interval,
            repetitions,
            ef,
            last_reviewed: None,
            user_difficulty: None,
            rated_at: None,
        }
    }

    #[test]
    fn third_recall_multiplies_by_ease() {
        let next = schedule(&entry(6, 1, 2.5), Quality::GOOD, NOW);
        assert_eq!(next.interval, 15);
        assert_eq!(next.repetitions, 2);
        assert!((next.ef - 2.5).abs() < 1e-9);
        assert_eq!(next.next_review, NOW + 15 * DAY_IN_MILLIS);
        assert_eq!(next.last_reviewed, Some(NOW));
    }

    #[test]
    fn first_and_second_recall() {
        let first = schedule(&entry(0, 0, 2.5), Quality::GOOD, NOW);
        assert_eq!((first.interval, first.repetitions), (1, 1));

        let second = schedule(&first, Quality::GOOD, NOW);
        assert_eq!((second.interval, second.repetitions), (6, 2));
    }

    #[test]
    fn forgetting_resets_regardless_of_history() {
        for (interval, repetitions, ef) in [(1, 0, 2.5), (6, 1, 2.5), (40, 7, 1.3), (300, 12, 3.1)] {
            for quality in 0..3 {
                let next = schedule(&entry(interval, repetitions, ef), Quality::new(quality).unwrap(), NOW);
                assert_eq!(next.repetitions, 0);
                assert_eq!(next.interval, 1);
                assert_eq!(next.next_review, NOW + DAY_IN_MILLIS);
            }
        }
    }

    #[test]
    fn ease_never_drops_below_floor() {
        let mut current = entry(1, 0, 1.4);
        for _ in 0..10 {
            current = schedule(&current, Quality::FORGOT, NOW);
            assert!(current.ef >= MIN_EF);
        }
        assert_eq!(current.ef, MIN_EF);

        let hard = schedule(&entry(6, 2, 1.3), Quality::HARD, NOW);
        assert_eq!(hard.ef, MIN_EF);
    }

    #[test]
    fn easy_never_decreases_ease() {
        let mut current = entry(0, 0, 2.5);
        for _ in 0..8 {
            let next = schedule(&current, Quality::EASY, NOW);
            assert!(next.ef >= current.ef);
            assert!(next.interval >= current.interval);
            current = next;
        }
    }

    #[test]
    fn missing_ease_falls_back_to_default() {
        let next = schedule(&entry(0, 0, 0.0), Quality::GOOD, NOW);
        assert!((next.ef - 2.5).abs() < 1e-9);
    }

    #[test]
    fn quality_parsing() {
        assert_eq!("easy".parse::<Quality>().unwrap(), Quality::EASY);
        assert_eq!("Again".parse::<Quality>().unwrap(), Quality::FORGOT);
        assert_eq!("4".parse::<Quality>().unwrap(), Quality::GOOD);
        assert!("6".parse::<Quality>().is_err());
        assert!("meh".parse::<Quality>().is_err());
    }

    #[test]
    fn create_if_absent_is_idempotent() {
        let repo = MemoryReviews::default();
        assert!(create_if_absent(&repo, "two-sum", "Two Sum", Some("leetcode.com/problems/two-sum"), NOW).unwrap());

        let created = repo.get("two-sum").unwrap().unwrap();
        assert_eq!(created.interval, 1);
        assert_eq!(created.repetitions, 0);
        assert_eq!(created.ef, DEFAULT_EF);
        assert_eq!(created.added_at, NOW);
        assert_eq!(created.next_review, NOW + DAY_IN_MILLIS);

        grade(&repo, "two-sum", Quality::EASY, NOW + DAY_IN_MILLIS).unwrap();
        let progressed = repo.get("two-sum").unwrap().unwrap();

        assert!(!create_if_absent(&repo, "two-sum", "Two Sum (again)", None, NOW + 5 * DAY_IN_MILLIS).unwrap());
        assert_eq!(repo.get("two-sum").unwrap().unwrap(), progressed);
        assert_eq!(repo.all().unwrap().len(), 1);
    }

    #[test]
    fn grading_unknown_problem_fails() {
        let repo = MemoryReviews::default();
        assert!(matches!(grade(&repo, "nope", Quality::GOOD, NOW), Err(Error::UnknownProblem(_))));
    }

    #[test]
    fn due_entries_is_inclusive_and_keeps_store_order() {
        let repo = MemoryReviews::default();
        create_if_absent(&repo, "c-problem", "C", None, NOW - DAY_IN_MILLIS).unwrap(); // due at NOW
        create_if_absent(&repo, "a-problem", "A", None, NOW).unwrap(); // due tomorrow
        create_if_absent(&repo, "b-problem", "B", None, NOW - 3 * DAY_IN_MILLIS).unwrap(); // overdue

        let due = due_entries(&repo, NOW).unwrap();
        let slugs = due.iter().map(|entry| entry.slug.as_str()).collect::<Vec<_>>();
        assert_eq!(slugs, vec!["c-problem", "b-problem"]);

        assert_eq!(due_entries(&repo, NOW - 4 * DAY_IN_MILLIS).unwrap(), Vec::new());
        assert_eq!(due_entries(&repo, NOW + DAY_IN_MILLIS).unwrap().len(), 3);
    }

    #[test]
    fn rating_difficulty_leaves_schedule_alone() {
        let repo = MemoryReviews::default();
        create_if_absent(&repo, "two-sum", "Two Sum", None, NOW).unwrap();
        create_if_absent(&repo, "3sum", "3Sum", None, NOW).unwrap();
        let before = repo.get("two-sum").unwrap().unwrap();

        assert!(rate_difficulty(&repo, "two-sum", Difficulty::Hard, NOW + 10).unwrap());
        assert!(!rate_difficulty(&repo, "missing", Difficulty::Easy, NOW).unwrap());

        let after = repo.get("two-sum").unwrap().unwrap();
        assert_eq!(after.user_difficulty, Some(Difficulty::Hard));
        assert_eq!(after.rated_at, Some(NOW + 10));
        assert_eq!((after.interval, after.repetitions, after.ef, after.next_review),
                   (before.interval, before.repetitions, before.ef, before.next_review));

        let unrated = unrated(&repo).unwrap();
        assert_eq!(unrated.len(), 1);
        assert_eq!(unrated[0].slug, "3sum");
    }

    #[test]
    fn unrated_offers_newest_first() {
        let repo = MemoryReviews::default();
        create_if_absent(&repo, "two-sum", "Two Sum", None, NOW).unwrap();
        create_if_absent(&repo, "lru-cache", "LRU Cache", None, NOW + 20).unwrap();
        create_if_absent(&repo, "3sum", "3Sum", None, NOW + 10).unwrap();
        create_if_absent(&repo, "valid-anagram", "Valid Anagram", None, NOW + 10).unwrap();
        rate_difficulty(&repo, "lru-cache", Difficulty::Medium, NOW + 30).unwrap();

        let slugs = unrated(&repo).unwrap().into_iter().map(|entry| entry.slug).collect::<Vec<_>>();
        assert_eq!(slugs, vec!["3sum", "valid-anagram", "two-sum"]);
    }
}
