use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::models::Credentials;

use super::{ApiError, ContentStore, FileMetadata, PutContents};

const USER_AGENT: &str = concat!("leetcommit/", env!("CARGO_PKG_VERSION"));

/// GitHub Contents API for one repository.
pub struct GitHubClient {
    http: Client,
    api_url: String,
    credentials: Credentials,
}

impl GitHubClient {
    pub fn new(api_url: &str, credentials: Credentials) -> Self {
        Self {
            http: Client::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            credentials,
        }
    }

    fn contents_url(&self, path: &str) -> String {
        format!("{}/repos/{}/contents/{}", self.api_url, self.credentials.repo, path)
    }

    fn headers(&self) -> Result<HeaderMap> {
        let authorization = HeaderValue::from_str(&format!("token {}", self.credentials.token))
            .map_err(|_| Error::InvalidInput(String::from("GitHub token contains invalid characters")))?;

        Ok(HeaderMap::from_iter([
            (header::AUTHORIZATION, authorization),
            (header::ACCEPT, HeaderValue::from_static("application/vnd.github.v3+json")),
            (header::USER_AGENT, HeaderValue::from_static(USER_AGENT)),
        ]))
    }

    /// `GET /contents/{path}`; `None` for anything but a 200.
    async fn get_contents(&self, path: &str) -> Result<Option<Value>> {
        let url = self.contents_url(path);
        log::trace!("[get_contents] GET {url}");

        let response = match self.http.get(&url).headers(self.headers()?).send().await {
            Ok(response) => response,
            Err(err) => {
                log::warn!("[get_contents] Could not reach {url}: {err}");
                return Ok(None);
            }
        };

        match response.status() {
            StatusCode::OK => Ok(response.json::<Value>().await.ok()),
            StatusCode::NOT_FOUND => Ok(None),
            status => {
                log::warn!("[get_contents] {path} answered {status}; treating as absent");
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl ContentStore for GitHubClient {
    async fn revision(&self, path: &str) -> Result<Option<String>> {
        let revision = self
            .get_contents(path)
            .await?
            .and_then(|value| serde_json::from_value::<FileMetadata>(value).ok())
            .map(|metadata| metadata.sha);

        log::debug!("[revision] {path}: {}", revision.as_deref().unwrap_or("new file"));
        Ok(revision)
    }

    async fn folder_exists(&self, path: &str) -> Result<bool> {
        let exists = self
            .get_contents(path)
            .await?
            .and_then(|value| value.as_array().map(|entries| !entries.is_empty()))
            .unwrap_or(false);

        log::debug!("[folder_exists] {path}: {exists}");
        Ok(exists)
    }

    async fn put(&self, path: &str, request: &PutContents) -> Result<()> {
        let url = self.contents_url(path);
        log::trace!("[put] PUT {url} ({})", request.message);

        let response = self
            .http
            .put(&url)
            .headers(self.headers()?)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            log::info!("[put] Pushed {path} ({status})");
            return Ok(());
        }

        let reason = response
            .json::<ApiError>()
            .await
            .map(|err| err.message)
            .unwrap_or_else(|_| status.to_string());

        log::error!("[put] GitHub rejected {path}: {status} {reason}");
        Err(Error::SyncFailed(format!("GitHub API Error ({status}): {reason}")))
    }
}
