use std::sync::Arc;

use calendar_extract::encoding::{decode_html, detect_encoding};
use calendar_extract::{dom, Parser, Template};

fn title_parser() -> Parser {
    let template = Template::from_json(
        "encoding",
        r#"{ "event": {
            "root": { "xpath": { "selectors": ["//body"] } },
            "title": { "xpath": { "selectors": ["//h1"] } },
            "location": { "xpath": { "selectors": ["//p"] } }
        } }"#,
    )
    .expect("valid template");
    Parser::new(Arc::new(template))
}

/// UTF-8 pages pass through unchanged.
#[test]
fn utf8_page_extracts_czech_text() {
    let html = "<html><head><meta charset=\"utf-8\"></head>\
        <body><h1>Žďárské léto</h1><p>Náměstí Republiky</p></body></html>";

    let mut parser = title_parser();
    parser.set_document(dom::parse_bytes(html.as_bytes()));
    let record = parser.get_event_data().unwrap();

    assert_eq!(record.title.as_deref(), Some("Žďárské léto"));
    assert_eq!(record.location.as_deref(), Some("Náměstí Republiky"));
}

/// windows-1250 is still common on municipal sites.
#[test]
fn windows1250_page_is_decoded() {
    // "Pouť" = P o u 0x9D, "Kostelec" plain ASCII, "Náves" = N 0xE1 v e s
    let html = b"<html><head><meta charset=\"windows-1250\"></head>\
        <body><h1>Pou\x9D</h1><p>N\xE1ves</p></body></html>";

    assert_eq!(detect_encoding(html).name(), "windows-1250");

    let mut parser = title_parser();
    parser.set_document(dom::parse_bytes(html));
    let record = parser.get_event_data().unwrap();

    assert_eq!(record.title.as_deref(), Some("Pouť"));
    assert_eq!(record.location.as_deref(), Some("Náves"));
}

/// ISO-8859-2 declared through http-equiv.
#[test]
fn iso88592_http_equiv_is_decoded() {
    // "Šumperk" = 0xA9 umperk, "Říjen" = 0xD8 0xED jen
    let html = b"<html><head>\
        <meta http-equiv=\"Content-Type\" content=\"text/html; charset=iso-8859-2\">\
        </head><body><h1>\xA9umperk</h1><p>\xD8\xEDjen</p></body></html>";

    let decoded = decode_html(html);
    assert!(decoded.contains("Šumperk"));
    assert!(decoded.contains("Říjen"));
}

/// Without a declaration bytes are read as UTF-8, broken ones replaced.
#[test]
fn undeclared_invalid_bytes_do_not_fail() {
    let html = b"<html><body><h1>Akce \xFF</h1></body></html>";

    let mut parser = title_parser();
    parser.set_document(dom::parse_bytes(html));
    let record = parser.get_event_data().unwrap();

    let title = record.title.unwrap();
    assert!(title.starts_with("Akce"));
    assert!(title.contains('\u{FFFD}'));
}
