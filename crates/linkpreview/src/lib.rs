//! LinkPreview - fetch a web page and extract link preview metadata
//!
//! Given a URL, LinkPreview fetches the page and fills a [`Preview`] with
//! its icon, name, title, description, images and the link actually
//! fetched, ready to render as a preview card.
//!
//! ## Pipeline
//!
//! 1. [`resolve_target`] rewrites `#!` URLs into the `_escaped_fragment_=`
//!    form used by crawlers that cannot run client-side routing.
//! 2. A [`Fetcher`] retrieves the body of the active URL, enforcing a
//!    redirect ceiling. [`HttpFetcher`] is the built-in transport.
//! 3. [`extract_preview`] walks the parsed document once, in document
//!    order. Later elements overwrite earlier ones.
//!
//! ```no_run
//! # async fn run() -> Result<(), linkpreview::PreviewError> {
//! let doc = linkpreview::fetch_preview("https://example.com/#!/about", 10).await?;
//! println!("{} ({})", doc.preview.title, doc.preview.link);
//! # Ok(())
//! # }
//! ```

pub mod client;
mod error;
pub mod extract;
pub mod fetchers;
pub mod normalize;
mod types;

pub use client::{fetch_preview, PreviewOptions, Scraper, ScraperBuilder, DEFAULT_MAX_REDIRECTS};
pub use error::PreviewError;
pub use extract::{extract_preview, parse_document};
pub use fetchers::{FetchedBody, Fetcher, HttpFetcher};
pub use normalize::{escaped_fragment_url, resolve_target, ESCAPED_FRAGMENT};
pub use types::{Document, Preview, Target};

/// User-Agent sent with every request
pub const USER_AGENT: &str = "link-preview-scraper";
