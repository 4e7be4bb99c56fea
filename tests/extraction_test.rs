use std::path::PathBuf;
use std::sync::Arc;

use calendar_extract::{dom, Error, Parser, Template};

fn fixture(path: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(path)
}

fn read_fixture(path: &str) -> String {
    std::fs::read_to_string(fixture(path)).expect("fixture should be readable")
}

fn obec_parser() -> Parser {
    let template = Template::from_json("obec", &read_fixture("parsers/obec.json")).expect("valid template");
    Parser::new(Arc::new(template))
}

fn parser_for(event_fields: &str) -> Parser {
    let json = format!(r#"{{ "event": {{ "root": {{ "xpath": {{ "selectors": ["//body"] }} }}, {event_fields} }} }}"#);
    Parser::new(Arc::new(Template::from_json("inline", &json).expect("valid template")))
}

#[test]
fn calendar_page_event_urls() {
    let mut parser = obec_parser();
    parser.set_document(dom::parse(&read_fixture("pages/kalendar.html")));

    let urls = parser.get_event_urls().unwrap();
    assert_eq!(
        urls,
        vec!["/akce/masopust-2023", "akce/vitani-jara", "https://www.sokol-lhota.cz/turnaj"]
    );
    assert!(parser.diagnostics().is_empty());
}

#[test]
fn calendar_page_event_urls_resolved() {
    let mut parser = obec_parser();
    parser.set_document(dom::parse(&read_fixture("pages/kalendar.html")));

    let urls = parser.get_event_urls_resolved("https://www.lhota.cz/kalendar/").unwrap();
    assert_eq!(
        urls,
        vec![
            "https://www.lhota.cz/akce/masopust-2023",
            "https://www.lhota.cz/kalendar/akce/vitani-jara",
            "https://www.sokol-lhota.cz/turnaj",
        ]
    );
}

#[test]
fn calendar_without_matches_reports() {
    let mut parser = obec_parser();
    parser.set_document(dom::parse(r#"<div id="kalendar"><p>Žádné akce</p></div>"#));

    assert!(parser.get_event_urls().unwrap().is_empty());
    assert_eq!(parser.diagnostics().messages(), ["No 'event_url' values found on 'calendar' page"]);
}

#[test]
fn calendar_without_root_reports() {
    let mut parser = obec_parser();
    parser.set_document(dom::parse("<p>Stránka nenalezena</p>"));

    assert!(parser.get_event_urls().unwrap().is_empty());
    assert_eq!(parser.diagnostics().messages(), ["No root element of 'calendar' page found"]);
}

#[test]
fn event_page_record() {
    let mut parser = obec_parser();
    parser.set_document(dom::parse(&read_fixture("pages/akce.html")));

    let record = parser.get_event_data().unwrap();
    assert_eq!(record.title.as_deref(), Some("Masopust"));
    assert_eq!(record.perex.as_deref(), Some("Tradiční masopustní průvod obcí s maskami."));
    assert_eq!(record.datetimes(), vec!["18. únor 2023%;13.30"]);
    assert_eq!(record.location.as_deref(), Some("Náves, Lhota u Kostelce"));
    assert_eq!(record.gps.as_deref(), Some("49.8712,15.2261"));
    assert_eq!(record.organizer.as_deref(), Some("Spolek Lhotáci"));
    assert_eq!(record.type_list(), vec!["tradice", "průvod"]);
    assert!(parser.diagnostics().is_empty(), "{}", parser.diagnostics());
}

#[test]
fn event_record_serializes_in_ordination() {
    let mut parser = obec_parser();
    parser.set_document(dom::parse(&read_fixture("pages/akce.html")));
    let record = parser.get_event_data().unwrap();

    let text = serde_json::to_string(&record).unwrap();
    let positions: Vec<usize> = ["title", "perex", "datetime", "location", "gps", "organizer", "types"]
        .iter()
        .map(|key| text.find(&format!("\"{key}\":")).unwrap())
        .collect();
    assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
}

#[test]
fn first_match_keeps_one_value() {
    let mut parser = parser_for(r#""title": { "xpath": { "selectors": ["//h1"], "match": "FIRST" } }"#);
    parser.set_document(dom::parse("<h1>A</h1><h1>B</h1>"));

    let record = parser.get_event_data().unwrap();
    assert_eq!(record.title.as_deref(), Some("A"));
    assert!(parser.diagnostics().is_empty());
}

#[test]
fn surplus_values_keep_first_and_report() {
    let mut parser = parser_for(r#""title": { "xpath": { "selectors": ["//h1"] } }"#);
    parser.set_document(dom::parse("<h1>X</h1><h1>Y</h1>"));

    let record = parser.get_event_data().unwrap();
    assert_eq!(record.title.as_deref(), Some("X"));
    assert_eq!(parser.diagnostics().messages(), ["title does not expect more than one value"]);
}

#[test]
fn ignored_values_are_dropped() {
    let mut parser = parser_for(r#""location": { "xpath": { "selectors": ["//li"], "ignore": ["TBD"] } }"#);
    parser.set_document(dom::parse("<ul><li>TBD</li><li>Prague</li></ul>"));

    let record = parser.get_event_data().unwrap();
    assert_eq!(record.location.as_deref(), Some("Prague"));
    assert!(parser.diagnostics().is_empty());
}

#[test]
fn gps_accepts_only_coordinate_pairs() {
    let mut parser = parser_for(r#""gps": { "xpath": { "selectors": ["//span[@class='gps']"] } }"#);

    parser.set_document(dom::parse(r#"<span class="gps">50.1,14.2</span>"#));
    assert_eq!(parser.get_event_data().unwrap().gps.as_deref(), Some("50.1,14.2"));

    parser.set_document(dom::parse(r#"<span class="gps">abc,def</span>"#));
    assert_eq!(parser.get_event_data().unwrap().gps, None);
}

#[test]
fn datetime_field_keeps_every_session() {
    let mut parser = parser_for(r#""datetime": { "xpath": { "selectors": ["//li[@class='termin']"] } }"#);
    parser.set_document(dom::parse(
        r#"<ul><li class="termin">1.2.2023 18:00</li><li class="termin">8.2.2023 18:00</li></ul>"#,
    ));

    let record = parser.get_event_data().unwrap();
    assert_eq!(record.datetime.as_deref(), Some(r#"["1.2.2023 18:00", "8.2.2023 18:00"]"#));
    assert!(parser.diagnostics().is_empty());
}

#[test]
fn declared_date_without_value_nulls_datetime() {
    let mut parser = parser_for(
        r#""date": { "xpath": { "selectors": ["//span[@class='datum']"] } },
           "time": { "xpath": { "selectors": ["//span[@class='cas']"] } }"#,
    );
    parser.set_document(dom::parse(r#"<span class="cas">18:00</span>"#));

    let record = parser.get_event_data().unwrap();
    assert_eq!(record.datetime, None);
}

#[test]
fn diagnostics_accumulate_until_drained() {
    let mut parser = parser_for(r#""title": { "xpath": { "selectors": ["//h1"] } }"#);

    parser.set_document(dom::parse("<h1>X</h1><h1>Y</h1>"));
    parser.get_event_data().unwrap();
    parser.set_document(dom::parse("<h1>X</h1><h1>Z</h1>"));
    parser.get_event_data().unwrap();

    // Identical messages are kept once.
    assert_eq!(parser.diagnostics().len(), 1);
    assert_eq!(parser.drain_diagnostics().len(), 1);
    assert!(parser.diagnostics().is_empty());
}

#[test]
fn unknown_page_and_missing_document_are_errors() {
    let mut parser = parser_for(r#""title": { "xpath": { "selectors": ["//h1"] } }"#);
    assert!(matches!(parser.get_event_data(), Err(Error::MissingDocument)));

    parser.set_document(dom::parse("<h1>X</h1>"));
    let err = parser.get_event_urls().unwrap_err();
    assert!(matches!(err, Error::UnknownPage { .. }));
    assert_eq!(err.to_string(), "Page 'calendar' is not defined for 'inline' template");
}

#[test]
fn table_rows_without_tbody_in_template() {
    let mut parser = parser_for(
        r#""title": { "xpath": { "selectors": ["//table[@class='akce']/tr/td[1]/text()"], "match": "FIRST" } },
           "location": { "xpath": { "selectors": ["//table[@class='akce']/tr/td[2]"] } }"#,
    );
    parser.set_document(dom::parse(
        r#"<table class="akce"><tr><td>Pouť</td><td>Náves</td></tr></table>"#,
    ));

    let record = parser.get_event_data().unwrap();
    assert_eq!(record.title.as_deref(), Some("Pouť"));
    assert_eq!(record.location.as_deref(), Some("Náves"));
    assert!(parser.diagnostics().is_empty());
}
