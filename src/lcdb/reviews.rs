use rusqlite::Connection;

use crate::lcdb::{DBResult, swallow_constraint_violation};
use crate::models::{Difficulty, ReviewEntry};

/////*============== REVIEW QUERIES ==============*/
impl<'a> TryFrom<&'a rusqlite::Row<'a>> for ReviewEntry {
    type Error = rusqlite::Error;

    fn try_from(row: &rusqlite::Row) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            slug: row.get("slug")?,
            title: row.get("title")?,
            problem_url: row.get("problem_url")?,
            added_at: row.get("added_at")?,
            next_review: row.get("next_review")?,
            interval: row.get("interval")?,
            repetitions: row.get("repetitions")?,
            ef: row.get("ef")?,
            last_reviewed: row.get("last_reviewed")?,
            user_difficulty: row
                .get::<_, Option<String>>("user_difficulty")?
                .map(|label| Difficulty::from_label(&label)),
            rated_at: row.get("rated_at")?,
        })
    }
}

/// Returns the review entry for `slug`, if one exists.
pub fn query_review(connection: &Connection, slug: &str) -> DBResult<Option<ReviewEntry>> {
    connection
        .prepare("SELECT * FROM Reviews WHERE slug = :slug")?
        .query(rusqlite::named_params! { ":slug": slug })?
        .next()?
        .map(|row| row.try_into())
        .transpose()
}

/// All review entries, oldest first.
pub fn query_reviews(connection: &Connection) -> DBResult<Vec<ReviewEntry>> {
    log::trace!("[query_reviews] Querying all review entries.");

    let mut stmt = connection.prepare("SELECT * FROM Reviews ORDER BY rowid")?;
    let reviews = stmt
        .query_map([], |row| ReviewEntry::try_from(row))?
        .collect::<Result<Vec<ReviewEntry>, _>>()?;

    Ok(reviews)
}

const INSERT_REVIEW: &str =
    "INSERT INTO Reviews
        (slug, title, problem_url, added_at, next_review, interval,
         repetitions, ef, last_reviewed, user_difficulty, rated_at)
     VALUES
        (:slug, :title, :problem_url, :added_at, :next_review, :interval,
         :repetitions, :ef, :last_reviewed, :user_difficulty, :rated_at)";

const ON_CONFLICT_UPDATE: &str =
    " ON CONFLICT(slug) DO UPDATE SET
        title           = excluded.title,
        problem_url     = excluded.problem_url,
        added_at        = excluded.added_at,
        next_review     = excluded.next_review,
        interval        = excluded.interval,
        repetitions     = excluded.repetitions,
        ef              = excluded.ef,
        last_reviewed   = excluded.last_reviewed,
        user_difficulty = excluded.user_difficulty,
        rated_at        = excluded.rated_at";

/// Runs the review INSERT with `conflict_clause` appended.
fn write_review(connection: &Connection, entry: &ReviewEntry, conflict_clause: &str) -> DBResult<usize> {
    connection.execute(
        &format!("{INSERT_REVIEW}{conflict_clause}"),
        rusqlite::named_params! {
            ":slug": entry.slug,
            ":title": entry.title,
            ":problem_url": entry.problem_url,
            ":added_at": entry.added_at,
            ":next_review": entry.next_review,
            ":interval": entry.interval,
            ":repetitions": entry.repetitions,
            ":ef": entry.ef,
            ":last_reviewed": entry.last_reviewed,
            ":user_difficulty": entry.user_difficulty.map(|difficulty| difficulty.as_str()),
            ":rated_at": entry.rated_at,
        },
    )
}

/// Writes `entry`, replacing the schedule of an existing row in place.
pub fn upsert_review(connection: &Connection, entry: &ReviewEntry) -> DBResult<()> {
    log::trace!("[upsert_review] Upserting review entry {}...", entry.slug);

    write_review(connection, entry, ON_CONFLICT_UPDATE)?;
    Ok(())
}

/// Inserts `entry` unless a row for its slug already exists.
///
/// Returns whether the row was inserted.
pub fn insert_review(connection: &Connection, entry: &ReviewEntry) -> DBResult<bool> {
    log::trace!("[insert_review] Inserting review entry {}...", entry.slug);

    write_review(connection, entry, "").map_or_else(swallow_constraint_violation, |_| Ok(true))
}
