use rusqlite::Connection;

use crate::lcdb::DBResult;
use crate::models::Credentials;

pub const GITHUB_PAT: &str = "githubPat";
pub const GITHUB_REPO: &str = "githubRepo";

/////*============== SETTINGS QUERIES ==============*/
pub fn query_setting(connection: &Connection, key: &str) -> DBResult<Option<String>> {
    connection
        .prepare("SELECT value FROM Settings WHERE key = :key")?
        .query(rusqlite::named_params! { ":key": key })?
        .next()?
        .map(|row| row.get("value"))
        .transpose()
}

pub fn update_setting(connection: &Connection, key: &str, value: &str) -> DBResult<()> {
    log::trace!("[update_setting] Setting {key}...");

    connection.execute(
        "INSERT INTO Settings (key, value) VALUES (:key, :value)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        rusqlite::named_params! { ":key": key, ":value": value },
    )?;

    Ok(())
}

/// Stores both halves of the credentials together.
pub fn save_credentials(connection: &Connection, credentials: &Credentials) -> DBResult<()> {
    let transaction = connection.unchecked_transaction()?;
    update_setting(&transaction, GITHUB_PAT, &credentials.token)?;
    update_setting(&transaction, GITHUB_REPO, &credentials.repo)?;
    transaction.commit()
}

/// Present only when both the token and the repository are stored and valid.
pub fn query_credentials(connection: &Connection) -> DBResult<Option<Credentials>> {
    let token = query_setting(connection, GITHUB_PAT)?;
    let repo = query_setting(connection, GITHUB_REPO)?;

    Ok(token
        .zip(repo)
        .and_then(|(token, repo)| {
            Credentials::new(&token, &repo)
                .inspect_err(|err| log::warn!("[query_credentials] Ignoring stored credentials: {err}"))
                .ok()
        }))
}
