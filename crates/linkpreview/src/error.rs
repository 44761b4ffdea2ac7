//! Error types for LinkPreview

use thiserror::Error;

/// Errors that can occur while building a link preview
///
/// A failed request never yields a partial [`Document`](crate::Document):
/// the caller receives either a fully populated document or one of these.
#[derive(Debug, Error)]
pub enum PreviewError {
    /// Input string does not parse as a URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[source] url::ParseError),

    /// URL parses but cannot be fetched over HTTP
    #[error("Invalid URL: must start with http:// or https://")]
    InvalidUrlScheme,

    /// Percent-decoding the URL during escaped fragment rewriting failed
    #[error("Failed to decode URL fragment: {0}")]
    FragmentDecode(String),

    /// Redirect ceiling was hit; carries the number of hops attempted
    #[error("exceeded max redirects: {hops}")]
    TooManyRedirects { hops: usize },

    /// Failed to build HTTP client
    #[error("Failed to create HTTP client")]
    ClientBuildError(#[source] reqwest::Error),

    /// Network level failure
    #[error("Request failed: {0}")]
    Transport(#[source] reqwest::Error),

    /// Final response status was not a success
    #[error("unexpected status code: {0}")]
    HttpStatus(u16),

    /// I/O failure while draining the response body
    #[error("Failed to read response body: {0}")]
    BodyRead(#[source] reqwest::Error),

    /// Fetched bytes do not form a document
    #[error("Failed to parse document: {0}")]
    Parse(String),
}

/// Raised from the redirect policy and recovered from the reqwest error chain
#[derive(Debug, Error)]
#[error("exceeded max redirects: {hops}")]
pub(crate) struct RedirectLimitExceeded {
    pub(crate) hops: usize,
}

impl PreviewError {
    /// Create an error from a reqwest error
    ///
    /// `max_redirects` is only consulted when a redirect error does not carry
    /// its hop count.
    pub fn from_reqwest(err: reqwest::Error, max_redirects: usize) -> Self {
        if let Some(hops) = redirect_hops(&err) {
            PreviewError::TooManyRedirects { hops }
        } else if err.is_redirect() {
            PreviewError::TooManyRedirects {
                hops: max_redirects + 1,
            }
        } else if err.is_builder() {
            PreviewError::ClientBuildError(err)
        } else {
            PreviewError::Transport(err)
        }
    }
}

fn redirect_hops(err: &reqwest::Error) -> Option<usize> {
    let mut source = std::error::Error::source(err);
    while let Some(inner) = source {
        if let Some(limit) = inner.downcast_ref::<RedirectLimitExceeded>() {
            return Some(limit.hops);
        }
        source = inner.source();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            PreviewError::TooManyRedirects { hops: 4 }.to_string(),
            "exceeded max redirects: 4"
        );
        assert_eq!(
            PreviewError::HttpStatus(404).to_string(),
            "unexpected status code: 404"
        );
        assert_eq!(
            PreviewError::InvalidUrlScheme.to_string(),
            "Invalid URL: must start with http:// or https://"
        );
        assert_eq!(
            PreviewError::Parse("malformed utf-8".to_string()).to_string(),
            "Failed to parse document: malformed utf-8"
        );
    }

    #[test]
    fn test_invalid_url_message() {
        let err = url::Url::parse("not a url").unwrap_err();
        let msg = PreviewError::InvalidUrl(err).to_string();
        assert!(msg.starts_with("Invalid URL: "));
    }

    #[test]
    fn test_redirect_limit_display_matches() {
        let inner = RedirectLimitExceeded { hops: 3 };
        assert_eq!(
            inner.to_string(),
            PreviewError::TooManyRedirects { hops: 3 }.to_string()
        );
    }
}
