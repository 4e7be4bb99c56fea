//! Compiled regex patterns shared across the crate.
//!
//! All patterns are compiled once at first use via `LazyLock`.

#![allow(clippy::expect_used)]

use std::sync::LazyLock;

use regex::Regex;

// =============================================================================
// Document decoding
// =============================================================================

/// Charset declared in a `<meta>` tag, either `<meta charset="...">` or the
/// `http-equiv="Content-Type"` form with `content="text/html; charset=..."`.
pub static META_CHARSET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta[^>]*?charset\s*=\s*["']?\s*([a-z0-9_:.\-]+)"#).expect("META_CHARSET regex")
});

// =============================================================================
// Event record finalization
// =============================================================================

/// A `lat,lon` pair in decimal degrees.
pub static GPS_PAIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^-?\d{1,3}(?:\.\d+)?\s*,\s*-?\d{1,3}(?:\.\d+)?$").expect("GPS_PAIR regex")
});

// =============================================================================
// Datetime formats
// =============================================================================

/// `prefix %range{delimiter} suffix`; greedy, so the last macro wins.
pub static RANGE_MACRO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.*)%range\{(.*)\}(.*)$").expect("RANGE_MACRO regex")
});

/// Directives that put a date into a parsed value.
pub static DATE_DIRECTIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"%[dbBmyYx]").expect("DATE_DIRECTIVE regex"));

/// Directives that put a time into a parsed value.
pub static TIME_DIRECTIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"%[HIpMSfX]").expect("TIME_DIRECTIVE regex"));

/// Runs of whitespace.
pub static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("WHITESPACE_RUN regex"));

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gps_pair_shapes() {
        assert!(GPS_PAIR.is_match("50.1,14.2"));
        assert!(GPS_PAIR.is_match("-33.8688, 151.2093"));
        assert!(GPS_PAIR.is_match("50,14"));
        assert!(!GPS_PAIR.is_match("abc,def"));
        assert!(!GPS_PAIR.is_match("50.1;14.2"));
        assert!(!GPS_PAIR.is_match("Náměstí 1, Praha"));
    }

    #[test]
    fn test_range_macro_groups() {
        let caps = RANGE_MACRO.captures("%d.%m.%Y %range{-} %d.%m.%Y").unwrap();
        assert_eq!(&caps[1], "%d.%m.%Y ");
        assert_eq!(&caps[2], "-");
        assert_eq!(&caps[3], " %d.%m.%Y");
        assert!(RANGE_MACRO.captures("%d.%m.%Y").is_none());
    }

    #[test]
    fn test_directive_classes() {
        assert!(DATE_DIRECTIVE.is_match("%d. %B"));
        assert!(!DATE_DIRECTIVE.is_match("%H:%M"));
        assert!(TIME_DIRECTIVE.is_match("%I %p"));
        assert!(!TIME_DIRECTIVE.is_match("%d.%m.%Y"));
    }

    #[test]
    fn test_meta_charset_forms() {
        let plain = META_CHARSET.captures(r#"<meta charset="windows-1250">"#).unwrap();
        assert_eq!(&plain[1], "windows-1250");

        let http_equiv = META_CHARSET
            .captures(r#"<META HTTP-EQUIV="Content-Type" CONTENT="text/html; charset=iso-8859-2">"#)
            .unwrap();
        assert_eq!(&http_equiv[1], "iso-8859-2");
    }
}
