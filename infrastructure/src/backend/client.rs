//! Shared HTTP client for the chat backend

use super::error::{BackendError, Result};
use reqwest::{Client, IntoUrl, RequestBuilder, Response, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Thin wrapper around [`reqwest::Client`] bound to one backend.
///
/// The request timeout applies to plain JSON calls only; streaming requests
/// run as long as the backend keeps sending.
#[derive(Clone)]
pub struct BackendClient {
    http: Client,
    base_url: String,
    request_timeout: Option<Duration>,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>, request_timeout: Option<Duration>) -> Result<Self> {
        let http = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .user_agent(concat!("nurture-chat/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| BackendError::ClientBuild(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            request_timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for `path` (which starts with `/`).
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Absolute URL for `path` with `segment` appended as one escaped path
    /// segment, so ids cannot change the route or add a query.
    pub fn segment_url(&self, path: &str, segment: &str) -> Result<Url> {
        let mut url = Url::parse(&self.url(path))
            .map_err(|e| BackendError::InvalidRequest(format!("bad URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| BackendError::InvalidRequest(format!("{} cannot take a path", path)))?
            .pop_if_empty()
            .push(segment);
        Ok(url)
    }

    pub fn http(&self) -> &Client {
        &self.http
    }

    fn with_timeout(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.request_timeout {
            Some(timeout) => builder.timeout(timeout),
            None => builder,
        }
    }

    /// Send `builder` and fail on a non-success status.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let response = builder.send().await?;
        Self::check_status(response).await
    }

    /// Turn a non-success response into [`BackendError::HttpStatus`].
    pub async fn check_status(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        debug!("Backend error {}: {}", status, body);
        Err(BackendError::HttpStatus {
            status: status.as_u16(),
            body,
        })
    }

    async fn decode<R: DeserializeOwned>(response: Response) -> Result<R> {
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| BackendError::Decode(e.to_string()))
    }

    pub async fn get_json<R: DeserializeOwned>(&self, path: &str) -> Result<R> {
        self.get_json_at(self.url(path)).await
    }

    /// GET an absolute URL and decode the JSON reply.
    pub async fn get_json_at<R: DeserializeOwned>(&self, url: impl IntoUrl) -> Result<R> {
        let builder = self.with_timeout(self.http.get(url));
        Self::decode(self.send(builder).await?).await
    }

    pub async fn post_json<B: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R> {
        let builder = self.with_timeout(self.http.post(self.url(path)).json(body));
        Self::decode(self.send(builder).await?).await
    }

    /// PUT a JSON body; the response body is ignored.
    pub async fn put_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<()> {
        self.put_json_at(self.url(path), body).await
    }

    /// PUT a JSON body to an absolute URL; the response body is ignored.
    pub async fn put_json_at<B: Serialize + ?Sized>(
        &self,
        url: impl IntoUrl,
        body: &B,
    ) -> Result<()> {
        let builder = self.with_timeout(self.http.put(url).json(body));
        self.send(builder).await?;
        Ok(())
    }

    /// POST a multipart form and decode the JSON reply.
    pub async fn post_multipart<R: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<R> {
        let builder = self.with_timeout(self.http.post(self.url(path)).multipart(form));
        Self::decode(self.send(builder).await?).await
    }
}
