//! Core types for LinkPreview

use bytes::Bytes;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use url::Url;

/// The URL a request resolves to
///
/// Resolved once when a [`Scraper`](crate::Scraper) is built. A derived
/// escaped fragment URL always wins over the original for fetching and
/// for the reported preview link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// No rewrite needed, fetch the URL as given
    Original(Url),
    /// URL rewritten to (or already in) escaped fragment form
    EscapedFragment {
        /// The URL as supplied by the caller
        original: Url,
        /// The `_escaped_fragment_=` form that is actually fetched
        derived: Url,
    },
}

impl Target {
    /// The URL supplied by the caller
    pub fn original(&self) -> &Url {
        match self {
            Target::Original(url) => url,
            Target::EscapedFragment { original, .. } => original,
        }
    }

    /// The derived escaped fragment URL, if any
    pub fn derived(&self) -> Option<&Url> {
        match self {
            Target::Original(_) => None,
            Target::EscapedFragment { derived, .. } => Some(derived),
        }
    }

    /// The URL to fetch
    pub fn active(&self) -> &Url {
        match self {
            Target::Original(url) => url,
            Target::EscapedFragment { derived, .. } => derived,
        }
    }
}

/// Preview metadata extracted from a page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Preview {
    /// Icon URL from `<link rel="icon">` or `<meta name="icon">`
    pub icon: String,

    /// Content of `<meta name="name">`
    pub name: String,

    /// Page title from `<title>` or `<meta name="title">`
    pub title: String,

    /// Content of `<meta name="description">`
    pub description: String,

    /// `src` of every `<img>`, in document order
    pub images: Vec<String>,

    /// The URL actually fetched
    pub link: String,
}

/// A fetched page and the preview extracted from it
#[derive(Debug, Clone)]
pub struct Document {
    /// Raw response body
    pub body: Bytes,

    /// Extracted preview
    pub preview: Preview,
}
