use reqwest::header::{HeaderValue, CONTENT_RANGE};
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Config;
use crate::session::Session;

const REST_PREFIX: &str = "/rest/v1";

/// A client for the hosted backend's REST and object storage interfaces.
pub struct BackendClient {
    base_url: String,
    anon_key: String,
    storage_bucket: String,
    session: Option<Session>,
    http: reqwest::Client,
}

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server error ({status}): {message}")]
    Server {
        status: u16,
        code: Option<String>,
        message: String,
    },
    #[error("unexpected response format: {0}")]
    Parse(String),
    #[error("not signed in")]
    NotSignedIn,
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Error body returned by the REST layer.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    code: Option<String>,
    error: Option<String>,
}

/// Query parameters as (key, raw value) pairs; values are encoded on use.
pub type Params = Vec<(&'static str, String)>;

impl BackendClient {
    pub fn new(base_url: String, anon_key: String, storage_bucket: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key,
            storage_bucket,
            session: None,
            http: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.backend_url.clone(),
            config.anon_key.clone(),
            config.storage_bucket.clone(),
        )
    }

    pub fn with_session(mut self, session: Session) -> Self {
        self.session = Some(session);
        self
    }

    pub fn set_session(&mut self, session: Option<Session>) {
        self.session = session;
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn storage_bucket(&self) -> &str {
        &self.storage_bucket
    }

    pub(crate) fn require_session(&self) -> Result<&Session, BackendError> {
        self.session.as_ref().ok_or(BackendError::NotSignedIn)
    }

    /// Build a REST URL for a table with encoded query parameters.
    pub(crate) fn rest_url(&self, table: &str, params: &[(&str, String)]) -> String {
        let mut url = format!("{}{}/{}", self.base_url, REST_PREFIX, table);
        for (i, (key, value)) in params.iter().enumerate() {
            url.push(if i == 0 { '?' } else { '&' });
            url.push_str(key);
            url.push('=');
            url.push_str(&urlencoding::encode(value));
        }
        url
    }

    /// Attach the API key and the caller's identity (anonymous if signed out).
    pub(crate) fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let token = self
            .session
            .as_ref()
            .map(|s| s.access_token.as_str())
            .unwrap_or(&self.anon_key);
        request.header("apikey", &self.anon_key).bearer_auth(token)
    }

    /// Turn a non-2xx response into `BackendError::Server`.
    pub(crate) async fn check(resp: Response) -> Result<Response, BackendError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        let parsed: Option<ErrorBody> = serde_json::from_str(&body).ok();
        let code = parsed.as_ref().and_then(|b| b.code.clone());
        let message = parsed
            .and_then(|b| b.message.or(b.error))
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| {
                if body.is_empty() {
                    status
                        .canonical_reason()
                        .unwrap_or("Unknown error")
                        .to_string()
                } else {
                    body
                }
            });

        Err(BackendError::Server {
            status: status.as_u16(),
            code,
            message,
        })
    }

    async fn parse_json<T: DeserializeOwned>(resp: Response) -> Result<T, BackendError> {
        let bytes = resp.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| BackendError::Parse(e.to_string()))
    }

    /// GET rows from a table.
    pub(crate) async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        params: &[(&str, String)],
    ) -> Result<Vec<T>, BackendError> {
        let url = self.rest_url(table, params);
        debug!("GET {}", url);
        let resp = self.authorize(self.http.get(&url)).send().await?;
        let resp = Self::check(resp).await?;
        Self::parse_json(resp).await
    }

    /// GET at most one row.
    pub(crate) async fn select_one<T: DeserializeOwned>(
        &self,
        table: &str,
        params: &[(&str, String)],
    ) -> Result<Option<T>, BackendError> {
        let mut params = params.to_vec();
        params.push(("limit", "1".to_string()));
        let rows: Vec<T> = self.select(table, &params).await?;
        Ok(rows.into_iter().next())
    }

    /// Exact row count for a filtered table, read from `Content-Range`.
    pub(crate) async fn count(
        &self,
        table: &str,
        params: &[(&str, String)],
    ) -> Result<u64, BackendError> {
        let mut params = params.to_vec();
        params.push(("select", "id".to_string()));
        params.push(("limit", "1".to_string()));
        let url = self.rest_url(table, &params);
        debug!("COUNT {}", url);

        let resp = self
            .authorize(self.http.get(&url))
            .header("Prefer", "count=exact")
            .send()
            .await?;
        let resp = Self::check(resp).await?;

        resp.headers()
            .get(CONTENT_RANGE)
            .and_then(|v: &HeaderValue| v.to_str().ok())
            .and_then(parse_content_range_total)
            .ok_or_else(|| BackendError::Parse("missing or malformed Content-Range".into()))
    }

    /// Insert a row and return the stored representation.
    pub(crate) async fn insert_returning<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        table: &str,
        params: &[(&str, String)],
        body: &B,
    ) -> Result<T, BackendError> {
        let url = self.rest_url(table, params);
        debug!("POST {}", url);
        let resp = self
            .authorize(self.http.post(&url))
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await?;
        let resp = Self::check(resp).await?;
        let rows: Vec<T> = Self::parse_json(resp).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| BackendError::Parse(format!("insert into {table} returned no rows")))
    }

    /// Insert a row without reading it back.
    pub(crate) async fn insert<B: Serialize + ?Sized>(
        &self,
        table: &str,
        body: &B,
    ) -> Result<(), BackendError> {
        self.write(self.http.post(self.rest_url(table, &[])), "return=minimal", body)
            .await
    }

    /// Insert or merge on primary key.
    pub(crate) async fn upsert<B: Serialize + ?Sized>(
        &self,
        table: &str,
        body: &B,
    ) -> Result<(), BackendError> {
        self.write(
            self.http.post(self.rest_url(table, &[])),
            "resolution=merge-duplicates,return=minimal",
            body,
        )
        .await
    }

    /// PATCH rows matching `filters`.
    pub(crate) async fn update<B: Serialize + ?Sized>(
        &self,
        table: &str,
        filters: &[(&str, String)],
        body: &B,
    ) -> Result<(), BackendError> {
        self.write(
            self.http.patch(self.rest_url(table, filters)),
            "return=minimal",
            body,
        )
        .await
    }

    /// DELETE rows matching `filters`.
    pub(crate) async fn delete(
        &self,
        table: &str,
        filters: &[(&str, String)],
    ) -> Result<(), BackendError> {
        let url = self.rest_url(table, filters);
        debug!("DELETE {}", url);
        let resp = self.authorize(self.http.delete(&url)).send().await?;
        Self::check(resp).await?;
        Ok(())
    }

    async fn write<B: Serialize + ?Sized>(
        &self,
        request: RequestBuilder,
        prefer: &str,
        body: &B,
    ) -> Result<(), BackendError> {
        let resp = self
            .authorize(request)
            .header("Prefer", prefer)
            .json(body)
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }

    /// Upload raw bytes to object storage. Returns the object path.
    pub(crate) async fn upload_object(
        &self,
        path: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> Result<String, BackendError> {
        let url = format!(
            "{}/storage/v1/object/{}/{}",
            self.base_url,
            self.storage_bucket,
            encode_path(path)
        );
        debug!("UPLOAD {} ({} bytes)", url, data.len());
        let resp = self
            .authorize(self.http.post(&url))
            .header("Content-Type", content_type)
            .header("x-upsert", "false")
            .body(data)
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(path.to_string())
    }

    /// Resolve an image reference to a fetchable URL. Does not make a network request.
    ///
    /// Absolute URLs pass through; anything else is treated as a path inside
    /// the configured bucket.
    pub fn public_image_url(&self, image_ref: &str) -> String {
        if image_ref.starts_with("http://") || image_ref.starts_with("https://") {
            return image_ref.to_string();
        }
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url,
            self.storage_bucket,
            encode_path(image_ref.trim_start_matches('/'))
        )
    }
}

/// Percent-encode each path segment, keeping the separators.
fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Total from a `Content-Range` header such as `0-11/57` or `*/0`.
pub(crate) fn parse_content_range_total(value: &str) -> Option<u64> {
    let (_, total) = value.trim().rsplit_once('/')?;
    total.parse().ok()
}
