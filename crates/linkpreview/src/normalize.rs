//! Escaped fragment URL rewriting
//!
//! Pages routed client-side with `#!` fragments can be crawled through
//! the legacy `_escaped_fragment_=` query convention: the fragment body is
//! moved into the query so the server can render a static equivalent.
//!
//! The encoding is intentionally partial. Only the characters that would
//! break the query (`& ? = # %`) are percent-encoded, whitespace and line
//! breaks are dropped, and everything else is copied verbatim.

use crate::error::PreviewError;
use crate::types::Target;
use percent_encoding::{percent_decode_str, utf8_percent_encode, NON_ALPHANUMERIC};
use tracing::debug;
use url::Url;

/// Query key used both to detect and to build escaped fragment URLs
pub const ESCAPED_FRAGMENT: &str = "_escaped_fragment_=";

/// Marker of an AJAX-style routing fragment
const HASHBANG: &str = "#!";

/// Characters dropped from the fragment body
const AVOID_CHARS: &[char] = &[' ', '\r', '\n'];

/// Characters percent-encoded in the fragment body
const ESCAPE_CHARS: &[char] = &['&', '?', '=', '#', '%'];

/// Decide which URL a request fetches
///
/// URLs that already carry the escaped fragment key are used verbatim.
/// URLs with a `#!` fragment are rewritten. Anything else is fetched as is.
pub fn resolve_target(url: Url) -> Result<Target, PreviewError> {
    if url.as_str().contains(ESCAPED_FRAGMENT) {
        return Ok(Target::EscapedFragment {
            derived: url.clone(),
            original: url,
        });
    }

    if url.as_str().contains(HASHBANG) {
        let derived = escaped_fragment_url(&url)?;
        debug!(original = %url, derived = %derived, "Rewrote hashbang URL");
        return Ok(Target::EscapedFragment {
            original: url,
            derived,
        });
    }

    Ok(Target::Original(url))
}

/// Rewrite the first `#!` fragment of `url` into an `_escaped_fragment_=` query parameter
///
/// The whole URL is percent-decoded first, and everything after the first
/// `#!` (including any later `#` characters) becomes the parameter value.
pub fn escaped_fragment_url(url: &Url) -> Result<Url, PreviewError> {
    let decoded = percent_decode_strict(url.as_str())?;

    let joiner = if url.query().is_some_and(|q| !q.is_empty()) {
        '&'
    } else {
        '?'
    };

    let rewritten = match decoded.find(HASHBANG) {
        Some(start) => {
            let body = &decoded[start + HASHBANG.len()..];
            format!(
                "{}{}{}{}",
                &decoded[..start],
                joiner,
                ESCAPED_FRAGMENT,
                encode_fragment(body)
            )
        }
        None => format!("{decoded}{joiner}{ESCAPED_FRAGMENT}"),
    };

    Url::parse(&rewritten).map_err(PreviewError::InvalidUrl)
}

/// Apply the partial encoding to a fragment body
fn encode_fragment(body: &str) -> String {
    let mut encoded = String::with_capacity(body.len());
    for c in body.chars() {
        if AVOID_CHARS.contains(&c) {
            continue;
        }
        if ESCAPE_CHARS.contains(&c) {
            let mut buf = [0u8; 4];
            encoded.extend(utf8_percent_encode(c.encode_utf8(&mut buf), NON_ALPHANUMERIC));
        } else {
            encoded.push(c);
        }
    }
    encoded
}

/// Percent-decode, rejecting malformed escapes and non UTF-8 results
fn percent_decode_strict(input: &str) -> Result<String, PreviewError> {
    for (pos, _) in input.match_indices('%') {
        let valid = input
            .get(pos + 1..pos + 3)
            .is_some_and(|hex| hex.bytes().all(|b| b.is_ascii_hexdigit()));
        if !valid {
            return Err(PreviewError::FragmentDecode(format!(
                "invalid percent escape at byte {pos}"
            )));
        }
    }

    percent_decode_str(input)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|e| PreviewError::FragmentDecode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rewrite(input: &str) -> Url {
        escaped_fragment_url(&Url::parse(input).unwrap()).unwrap()
    }

    #[test]
    fn test_encodes_only_query_breaking_chars() {
        let derived = rewrite("http://h#!param1=value1&param2=value2");
        assert_eq!(
            derived.query(),
            Some("_escaped_fragment_=param1%3Dvalue1%26param2%3Dvalue2")
        );
        assert!(derived.fragment().is_none());
    }

    #[test]
    fn test_escape_set() {
        assert_eq!(encode_fragment("a&b?c=d#e%f"), "a%26b%3Fc%3Dd%23e%25f");
        assert_eq!(encode_fragment("/path/to-page_1.html"), "/path/to-page_1.html");
    }

    #[test]
    fn test_whitespace_dropped() {
        assert_eq!(encode_fragment("a b\r\nc"), "abc");
    }

    #[test]
    fn test_plus_kept_literally() {
        // Only %XX escapes are decoded; `+` is not a space here
        let derived = rewrite("http://example.com/#!a+b");
        assert_eq!(derived.query(), Some("_escaped_fragment_=a+b"));

        let derived = rewrite("http://example.com/#!a%20b");
        assert_eq!(derived.query(), Some("_escaped_fragment_=ab"));
    }

    #[test]
    fn test_appends_to_existing_query() {
        let derived = rewrite("http://example.com/page?lang=en#!section");
        assert_eq!(
            derived.as_str(),
            "http://example.com/page?lang=en&_escaped_fragment_=section"
        );
    }

    #[test]
    fn test_bare_hashbang() {
        let derived = rewrite("http://example.com/page#!");
        assert!(derived.as_str().ends_with("?_escaped_fragment_="));

        let derived = rewrite("http://example.com/page?a=1#!");
        assert!(derived.as_str().ends_with("&_escaped_fragment_="));
    }

    #[test]
    fn test_fragment_body_captured_past_later_hash() {
        let derived = rewrite("http://example.com/#!path#!more");
        assert_eq!(
            derived.query(),
            Some("_escaped_fragment_=path%23!more")
        );
    }

    #[test]
    fn test_encoded_fragment_is_decoded_first() {
        let derived = rewrite("http://example.com/#!key%3Dvalue");
        assert_eq!(derived.query(), Some("_escaped_fragment_=key%3Dvalue"));

        let derived = rewrite("http://example.com/#!a%23b");
        assert_eq!(derived.query(), Some("_escaped_fragment_=a%23b"));
    }

    #[test]
    fn test_invalid_escape_is_decode_error() {
        let url = Url::parse("http://example.com/%zz#!frag").unwrap();
        let result = escaped_fragment_url(&url);
        assert!(matches!(result, Err(PreviewError::FragmentDecode(_))));

        let url = Url::parse("http://example.com/#!frag%").unwrap();
        assert!(matches!(
            resolve_target(url),
            Err(PreviewError::FragmentDecode(_))
        ));
    }

    #[test]
    fn test_resolve_plain_url() {
        let url = Url::parse("https://example.com/about").unwrap();
        let target = resolve_target(url.clone()).unwrap();
        assert_eq!(target, Target::Original(url));
    }

    #[test]
    fn test_resolve_already_escaped_is_verbatim() {
        let url = Url::parse("http://example.com/?_escaped_fragment_=a%3Db").unwrap();
        let target = resolve_target(url.clone()).unwrap();
        assert_eq!(target.active(), &url);
        assert_eq!(target.derived(), Some(&url));
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let once = resolve_target(Url::parse("http://h#!param1=value1&param2=value2").unwrap())
            .unwrap();
        let twice = resolve_target(once.active().clone()).unwrap();
        assert_eq!(twice.active(), once.active());
    }

    #[test]
    fn test_resolve_hashbang_keeps_original() {
        let url = Url::parse("https://example.com/#!/users/42").unwrap();
        let target = resolve_target(url.clone()).unwrap();
        assert_eq!(target.original(), &url);
        assert_eq!(
            target.active().as_str(),
            "https://example.com/?_escaped_fragment_=/users/42"
        );
    }
}
