//! Snapshot source backed by plain HTTP fetches.
//!
//! Without a rendering engine there is nothing to scroll, so `advance` is a
//! no-op. `request_more` follows the href of the "show more" anchor found in
//! the last snapshot; the next snapshot then shows the following page and the
//! collector merges the two.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tokio::time::sleep;
use tracing::{debug, warn};
use url::Url;

use super::{Snapshot, SnapshotSource};
use crate::encoding::decode_body;
use crate::error::{Error, Result};
use crate::extractor::find_load_more;

const USER_AGENT: &str = concat!("haraj-digest/", env!("CARGO_PKG_VERSION"));

/// Network settings for [`HttpSnapshotSource`].
#[derive(Debug, Clone)]
pub struct HttpSourceConfig {
    pub user_agent: String,

    /// Per-request timeout.
    ///
    /// Default: `120s`
    pub request_timeout: Duration,

    /// Extra attempts after a failed fetch.
    ///
    /// Default: `2`
    pub max_retries: u32,

    /// Wait before the first retry; doubled for each further one.
    ///
    /// Default: `500ms`
    pub retry_backoff: Duration,
}

impl Default for HttpSourceConfig {
    fn default() -> Self {
        Self {
            user_agent: USER_AGENT.to_string(),
            request_timeout: Duration::from_secs(120),
            max_retries: 2,
            retry_backoff: Duration::from_millis(500),
        }
    }
}

/// Fetches the listing over HTTP.
#[derive(Debug)]
pub struct HttpSnapshotSource {
    client: Client,
    config: HttpSourceConfig,
    current: Url,
    next: Option<Url>,
}

impl HttpSnapshotSource {
    /// Source starting at `start`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Fetch`] when the HTTP client cannot be built.
    pub fn new(start: Url, config: HttpSourceConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(config.request_timeout)
            .cookie_store(true)
            .build()
            .map_err(|source| Error::Fetch {
                url: start.to_string(),
                source,
            })?;

        Ok(Self {
            client,
            config,
            current: start,
            next: None,
        })
    }

    /// URL the next snapshot will be taken from.
    #[must_use]
    pub fn current_url(&self) -> &Url {
        &self.current
    }

    async fn fetch(&self, url: &Url) -> Result<String> {
        let mut attempt = 0u32;
        loop {
            match self.fetch_once(url).await {
                Ok(html) => return Ok(html),
                Err(e) if attempt < self.config.max_retries && is_retryable(&e) => {
                    let backoff = self
                        .config
                        .retry_backoff
                        .saturating_mul(1 << attempt.min(16));
                    attempt += 1;
                    warn!(url = %url, attempt, error = %e, "fetch failed, retrying in {:?}", backoff);
                    sleep(backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn fetch_once(&self, url: &Url) -> Result<String> {
        let fetch_error = |source| Error::Fetch {
            url: url.to_string(),
            source,
        };

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(fetch_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let body = response.bytes().await.map_err(fetch_error)?;
        Ok(decode_body(&body, content_type.as_deref()))
    }
}

#[async_trait]
impl SnapshotSource for HttpSnapshotSource {
    async fn snapshot(&mut self) -> Result<Snapshot> {
        let url = self.current.clone();
        let html = self.fetch(&url).await?;
        debug!(url = %url, bytes = html.len(), "fetched snapshot");

        self.next = next_page(&html, &url);
        Ok(Snapshot::new(url, html))
    }

    async fn request_more(&mut self) -> Result<()> {
        match self.next.take() {
            Some(next) => {
                debug!(url = %next, "following show-more link");
                self.current = next;
            }
            None => debug!("no show-more link on page"),
        }
        Ok(())
    }
}

/// Target of the page's "show more" anchor, when it leads somewhere new.
fn next_page(html: &str, base: &Url) -> Option<Url> {
    let doc = crate::dom::parse(html);
    find_load_more(&doc, base)
        .and_then(|control| control.href)
        .filter(|href| href != base)
}

fn is_retryable(error: &Error) -> bool {
    match error {
        Error::Fetch { .. } => true,
        Error::HttpStatus { status, .. } => *status == 429 || *status >= 500,
        _ => false,
    }
}
