//! Character encoding detection and decoding of fetched pages.
//!
//! Many municipal sites still serve `windows-1250` or `ISO-8859-2`. Pages
//! arrive as bytes; the charset is taken from a byte order mark, then from a
//! `<meta>` declaration in the head, then defaults to UTF-8.

use std::borrow::Cow;

use encoding_rs::{Encoding, UTF_8};

use crate::patterns::META_CHARSET;

/// How far into the document a `<meta>` charset declaration is looked for.
const SNIFF_LIMIT: usize = 2048;

/// Detect the character encoding of an HTML page.
#[must_use]
pub fn detect_encoding(html: &[u8]) -> &'static Encoding {
    if let Some((encoding, _)) = Encoding::for_bom(html) {
        return encoding;
    }

    let head = String::from_utf8_lossy(&html[..html.len().min(SNIFF_LIMIT)]);
    META_CHARSET
        .captures(&head)
        .and_then(|caps| caps.get(1))
        .and_then(|label| Encoding::for_label(label.as_str().as_bytes()))
        .unwrap_or(UTF_8)
}

/// Decode an HTML page to UTF-8.
///
/// Undecodable bytes become U+FFFD instead of failing the page.
///
/// # Examples
///
/// ```
/// use calendar_extract::encoding::decode_html;
///
/// let html = b"<meta charset=\"windows-1250\"><p>Kv\xECten</p>";
/// assert!(decode_html(html).contains("Květen"));
/// ```
#[must_use]
pub fn decode_html(html: &[u8]) -> Cow<'_, str> {
    let encoding = detect_encoding(html);
    let (decoded, used, had_errors) = encoding.decode(html);
    if had_errors {
        tracing::debug!(encoding = used.name(), "page contained undecodable bytes");
    }
    decoded
}
