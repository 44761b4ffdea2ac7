//! Fetcher system for retrieving page bodies
//!
//! Design: a fetcher turns the active target URL into raw bytes.
//! [`HttpFetcher`] is the built-in transport; other implementations can be
//! handed to [`ScraperBuilder::fetcher`](crate::ScraperBuilder::fetcher).

mod http;

pub use http::HttpFetcher;

use crate::client::PreviewOptions;
use crate::error::PreviewError;
use async_trait::async_trait;
use bytes::Bytes;
use url::Url;

/// Raw body of a successful response
#[derive(Debug, Clone, Default)]
pub struct FetchedBody {
    /// Entire response body
    pub bytes: Bytes,
    /// Content-Type header value
    pub content_type: Option<String>,
}

/// Trait for page fetchers
///
/// Implementations issue one logical GET for `url`, honour the redirect
/// ceiling in `options`, and read the whole body before returning.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Unique identifier for this fetcher (for logging/debugging)
    fn name(&self) -> &'static str;

    /// Fetch the body at `url`
    async fn fetch(
        &self,
        url: &Url,
        options: &PreviewOptions,
    ) -> Result<FetchedBody, PreviewError>;
}
