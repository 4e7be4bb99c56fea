//! Document adapter over `dom_query`.
//!
//! Pages enter the crate as a `Document`; the selector interpreter works on
//! `NodeRef`s of that document.

pub use dom_query::{Document, NodeRef};

use crate::encoding;

/// Parse an HTML string into a document.
#[inline]
#[must_use]
pub fn parse(html: &str) -> Document {
    Document::from(html)
}

/// Parse raw page bytes, detecting the charset first.
#[must_use]
pub fn parse_bytes(html: &[u8]) -> Document {
    Document::from(encoding::decode_html(html).as_ref())
}

/// Lowercase tag name of an element node.
#[must_use]
pub fn tag_name(node: &NodeRef<'_>) -> Option<String> {
    if node.is_element() {
        node.node_name().map(|name| name.to_ascii_lowercase())
    } else {
        None
    }
}
