//! Preview extraction from fetched HTML

use crate::error::PreviewError;
use crate::types::Preview;
use encoding_rs::{Encoding, UTF_8};
use regex::Regex;
use scraper::{ElementRef, Html};
use std::sync::LazyLock;

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// How much of the body is searched for a `<meta>` charset declaration
const META_PRESCAN_BYTES: usize = 4096;

static META_CHARSET_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)<meta\s+[^>]*?charset\s*=\s*["']?([^"'\s/>;]+)"#).unwrap());

/// What an element contributes to the preview
enum PreviewTag<'a> {
    /// `<meta name=... content=...>`
    Meta { name: &'a str, content: &'a str },
    /// `<link rel=... href=...>`
    Link { rel: &'a str, href: &'a str },
    /// `<img src=...>`; `None` when the image has no `src`
    Img { src: Option<&'a str> },
    /// `<title>` with its text content
    Title(String),
    Other,
}

impl<'a> PreviewTag<'a> {
    fn classify(element: ElementRef<'a>) -> Self {
        let value = element.value();
        // SVG has its own `title` element
        if &*value.name.ns != HTML_NAMESPACE {
            return PreviewTag::Other;
        }
        match value.name() {
            "meta" => PreviewTag::Meta {
                name: value.attr("name").unwrap_or_default(),
                content: value.attr("content").unwrap_or_default(),
            },
            "link" => PreviewTag::Link {
                rel: value.attr("rel").unwrap_or_default(),
                href: value.attr("href").unwrap_or_default(),
            },
            "img" => PreviewTag::Img {
                src: value.attr("src"),
            },
            "title" => PreviewTag::Title(element.text().collect::<String>().trim().to_string()),
            _ => PreviewTag::Other,
        }
    }
}

/// Decode and parse a fetched body, then extract its preview
///
/// `content_type` is the response `Content-Type` header, used to pick the
/// character set. `link` is recorded as the preview link.
pub fn parse_document(
    body: &[u8],
    content_type: Option<&str>,
    link: &str,
) -> Result<Preview, PreviewError> {
    let html = decode_body(body, content_type)?;
    let mut preview = extract_preview(&html);
    preview.link = link.to_string();
    Ok(preview)
}

/// Decode a body to text
///
/// The character set is taken from the BOM, then the `charset` parameter,
/// then a `<meta>` declaration near the start of the body, else UTF-8.
/// Malformed byte sequences mean the body is not a document.
pub fn decode_body(body: &[u8], content_type: Option<&str>) -> Result<String, PreviewError> {
    let encoding = content_type
        .and_then(charset_from_content_type)
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .or_else(|| charset_from_meta(body))
        .unwrap_or(UTF_8);

    let (decoded, used, had_errors) = encoding.decode(body);
    if had_errors {
        return Err(PreviewError::Parse(format!(
            "malformed {} byte sequence",
            used.name()
        )));
    }
    Ok(decoded.into_owned())
}

fn charset_from_content_type(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches(|c| c == '"' || c == '\''))
    })
}

/// Find `<meta charset=...>` or an http-equiv content type in the first bytes
fn charset_from_meta(body: &[u8]) -> Option<&'static Encoding> {
    let head = String::from_utf8_lossy(&body[..body.len().min(META_PRESCAN_BYTES)]);
    let label = META_CHARSET_REGEX.captures(&head)?.get(1)?.as_str();
    // A document cannot declare itself UTF-16 from inside its own bytes
    Encoding::for_label(label.as_bytes()).map(Encoding::output_encoding)
}

/// Walk the parsed tree once, in document order, and fill a preview
///
/// Later elements overwrite earlier ones for single-valued fields.
/// The returned preview has an empty `link`.
pub fn extract_preview(html: &str) -> Preview {
    let document = Html::parse_document(html);
    let mut preview = Preview::default();

    for node in document.tree.root().descendants() {
        let Some(element) = ElementRef::wrap(node) else {
            continue;
        };

        match PreviewTag::classify(element) {
            PreviewTag::Meta { name, content } => {
                let field = match name {
                    "icon" => &mut preview.icon,
                    "name" => &mut preview.name,
                    "title" => &mut preview.title,
                    "description" => &mut preview.description,
                    _ => continue,
                };
                *field = content.to_string();
            }
            PreviewTag::Link { rel: "icon", href } => {
                preview.icon = href.to_string();
            }
            PreviewTag::Img { src: Some(src) } => {
                preview.images.push(src.to_string());
            }
            PreviewTag::Title(text) => {
                preview.title = text;
            }
            PreviewTag::Link { .. } | PreviewTag::Img { src: None } | PreviewTag::Other => {}
        }
    }

    preview
}
