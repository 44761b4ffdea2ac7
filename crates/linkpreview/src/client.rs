//! Entry points for LinkPreview
//!
//! A [`Scraper`] resolves its target once (rewriting `#!` URLs), then
//! fetches the active URL and extracts the preview, strictly in sequence.

use crate::error::PreviewError;
use crate::extract::parse_document;
use crate::fetchers::{Fetcher, HttpFetcher};
use crate::normalize::resolve_target;
use crate::types::{Document, Target};
use tracing::debug;
use url::Url;

/// Default redirect ceiling
pub const DEFAULT_MAX_REDIRECTS: usize = 10;

/// Options passed to fetchers
#[derive(Debug, Clone)]
pub struct PreviewOptions {
    /// Maximum number of redirect hops to follow
    pub max_redirects: usize,
}

impl Default for PreviewOptions {
    fn default() -> Self {
        Self {
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }
}

/// Fetch a page and extract its preview
///
/// Shorthand for [`Scraper::new`] followed by [`Scraper::fetch`].
pub async fn fetch_preview(url: &str, max_redirects: usize) -> Result<Document, PreviewError> {
    Scraper::new(url, max_redirects)?.fetch().await
}

/// Builder for configuring a [`Scraper`]
#[derive(Default)]
pub struct ScraperBuilder {
    options: PreviewOptions,
    fetcher: Option<Box<dyn Fetcher>>,
}

impl ScraperBuilder {
    /// Create a builder with default options and the HTTP fetcher
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the redirect ceiling
    pub fn max_redirects(mut self, max_redirects: usize) -> Self {
        self.options.max_redirects = max_redirects;
        self
    }

    /// Use a custom fetcher instead of [`HttpFetcher`]
    pub fn fetcher(mut self, fetcher: Box<dyn Fetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Parse and resolve `url`, then build the scraper
    pub fn build(self, url: &str) -> Result<Scraper, PreviewError> {
        let parsed = Url::parse(url).map_err(PreviewError::InvalidUrl)?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(PreviewError::InvalidUrlScheme);
        }

        let target = resolve_target(parsed)?;

        Ok(Scraper {
            target,
            options: self.options,
            fetcher: self
                .fetcher
                .unwrap_or_else(|| Box::new(HttpFetcher::new())),
        })
    }
}

/// A single link preview request
pub struct Scraper {
    target: Target,
    options: PreviewOptions,
    fetcher: Box<dyn Fetcher>,
}

impl std::fmt::Debug for Scraper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scraper")
            .field("target", &self.target)
            .field("options", &self.options)
            .field("fetcher", &self.fetcher.name())
            .finish()
    }
}

impl Scraper {
    /// Create a scraper for `url` using the HTTP fetcher
    pub fn new(url: &str, max_redirects: usize) -> Result<Self, PreviewError> {
        Self::builder().max_redirects(max_redirects).build(url)
    }

    /// Create a builder
    pub fn builder() -> ScraperBuilder {
        ScraperBuilder::new()
    }

    /// The resolved target
    pub fn target(&self) -> &Target {
        &self.target
    }

    /// The configured redirect ceiling
    pub fn max_redirects(&self) -> usize {
        self.options.max_redirects
    }

    /// Fetch the active URL and extract its preview
    pub async fn fetch(&self) -> Result<Document, PreviewError> {
        let url = self.target.active();
        debug!(fetcher = self.fetcher.name(), url = %url, "Using fetcher");

        let fetched = self.fetcher.fetch(url, &self.options).await?;
        let preview = parse_document(
            &fetched.bytes,
            fetched.content_type.as_deref(),
            url.as_str(),
        )?;

        Ok(Document {
            body: fetched.bytes,
            preview,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetchers::FetchedBody;
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::sync::{Arc, Mutex};

    /// Serves a canned body and records the requested URLs
    struct StaticFetcher {
        body: &'static str,
        requested: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Fetcher for StaticFetcher {
        fn name(&self) -> &'static str {
            "static"
        }

        async fn fetch(
            &self,
            url: &Url,
            _options: &PreviewOptions,
        ) -> Result<FetchedBody, PreviewError> {
            self.requested.lock().unwrap().push(url.to_string());
            Ok(FetchedBody {
                bytes: Bytes::from_static(self.body.as_bytes()),
                content_type: Some("text/html".to_string()),
            })
        }
    }

    #[test]
    fn test_new_scraper() {
        let scraper = Scraper::new("http://example.com", 10).unwrap();
        assert_eq!(scraper.target().original().as_str(), "http://example.com/");
        assert_eq!(scraper.max_redirects(), 10);
        assert!(scraper.target().derived().is_none());
    }

    #[test]
    fn test_options_default() {
        let options = PreviewOptions::default();
        assert_eq!(options.max_redirects, DEFAULT_MAX_REDIRECTS);
    }

    #[test]
    fn test_invalid_url() {
        let result = Scraper::new("not a url", 10);
        assert!(matches!(result, Err(PreviewError::InvalidUrl(_))));
    }

    #[test]
    fn test_invalid_scheme() {
        let result = Scraper::new("ftp://example.com/file", 10);
        assert!(matches!(result, Err(PreviewError::InvalidUrlScheme)));
    }

    #[test]
    fn test_hashbang_resolved_at_build() {
        let scraper = Scraper::new("http://example.com/#!fragment", 3).unwrap();
        assert_eq!(
            scraper.target().active().as_str(),
            "http://example.com/?_escaped_fragment_=fragment"
        );
    }

    #[tokio::test]
    async fn test_fetch_uses_derived_url() {
        let requested = Arc::new(Mutex::new(Vec::new()));
        let scraper = Scraper::builder()
            .fetcher(Box::new(StaticFetcher {
                body: "<title>Static</title><img src='a.png'>",
                requested: requested.clone(),
            }))
            .build("http://example.com/app#!/items/7")
            .unwrap();

        let doc = scraper.fetch().await.unwrap();

        let expected = "http://example.com/app?_escaped_fragment_=/items/7";
        assert_eq!(*requested.lock().unwrap(), vec![expected.to_string()]);
        assert_eq!(doc.preview.link, expected);
        assert_eq!(doc.preview.title, "Static");
        assert_eq!(doc.preview.images, vec!["a.png"]);
        assert_eq!(&doc.body[..], b"<title>Static</title><img src='a.png'>");
    }
}
