//! HTTP fetcher
//!
//! Issues a single GET with the fixed [`USER_AGENT`], follows redirects up
//! to the configured ceiling and drains the body into memory.

use crate::client::PreviewOptions;
use crate::error::{PreviewError, RedirectLimitExceeded};
use crate::fetchers::{FetchedBody, Fetcher};
use crate::USER_AGENT;
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::redirect::Policy;
use tracing::{debug, warn};
use url::Url;

/// Default HTTP fetcher backed by reqwest
pub struct HttpFetcher;

impl HttpFetcher {
    /// Create a new HTTP fetcher
    pub fn new() -> Self {
        Self
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn fetch(
        &self,
        url: &Url,
        options: &PreviewOptions,
    ) -> Result<FetchedBody, PreviewError> {
        let max_redirects = options.max_redirects;

        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html, application/xhtml+xml, */*;q=0.8"),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(USER_AGENT)
            .redirect(redirect_policy(max_redirects))
            .build()
            .map_err(PreviewError::ClientBuildError)?;

        let response = client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| PreviewError::from_reqwest(e, max_redirects))?;

        let status = response.status();
        if !status.is_success() {
            debug!(url = %url, status = status.as_u16(), "Unexpected status");
            return Err(PreviewError::HttpStatus(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let bytes = read_body(response).await?;
        debug!(url = %url, size = bytes.len(), "Fetched body");

        Ok(FetchedBody {
            bytes,
            content_type,
        })
    }
}

/// Follow a hop while at most `max_redirects` URLs have been requested
///
/// With an endless redirector this aborts on hop `max_redirects + 1` and
/// reports that count.
fn redirect_policy(max_redirects: usize) -> Policy {
    Policy::custom(move |attempt| {
        let hops = attempt.previous().len();
        if hops > max_redirects {
            attempt.error(RedirectLimitExceeded { hops })
        } else {
            attempt.follow()
        }
    })
}

/// Read the whole response body; any chunk error fails the read
async fn read_body(response: reqwest::Response) -> Result<Bytes, PreviewError> {
    let mut body = BytesMut::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        match chunk {
            Ok(bytes) => body.extend_from_slice(&bytes),
            Err(e) => {
                warn!("Error reading body chunk: {}", e);
                return Err(PreviewError::BodyRead(e));
            }
        }
    }

    Ok(body.freeze())
}
