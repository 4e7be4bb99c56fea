//! Runs one site template over a page read from stdin and prints JSON.
//!
//! ```text
//! extract_page <template.json> <calendar|event> [calendar_url] < page.html
//! ```
//!
//! A calendar page prints its event URLs (resolved when `calendar_url` is
//! given); an event page prints the record and its normalized datetimes.
//! Diagnostics go to stderr. Set `RUST_LOG=debug` for engine logs.

use std::io::{self, Read};
use std::path::Path;
use std::process;
use std::sync::Arc;

use calendar_extract::{dom, DatetimeTuple, EventRecord, Page, Parser, Template};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Serialize)]
struct EventOutput {
    record: EventRecord,
    datetimes: Vec<DatetimeTuple>,
}

fn usage() -> ! {
    eprintln!("usage: extract_page <template.json> <calendar|event> [calendar_url] < page.html");
    process::exit(2);
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("error: {message}");
    process::exit(1);
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (template_path, page) = match args.as_slice() {
        [path, page] | [path, page, _] => (Path::new(path), page.as_str()),
        _ => usage(),
    };
    let page: Page = page.parse().unwrap_or_else(|_| usage());

    let name = template_path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("template");
    let json = std::fs::read_to_string(template_path)
        .unwrap_or_else(|err| fail(format!("cannot read {}: {err}", template_path.display())));
    let template = Template::from_json(name, &json).unwrap_or_else(|err| fail(err));

    let mut html = Vec::new();
    if let Err(err) = io::stdin().read_to_end(&mut html) {
        fail(format!("failed to read from stdin: {err}"));
    }

    let mut parser = Parser::new(Arc::new(template));
    parser.set_document(dom::parse_bytes(&html));

    let output = match page {
        Page::Calendar => {
            let urls = match args.get(2) {
                Some(calendar_url) => parser.get_event_urls_resolved(calendar_url),
                None => parser.get_event_urls(),
            };
            urls.map(|urls| serde_json::to_string_pretty(&urls))
        }
        Page::Event => parser.get_event_data().map(|record| {
            let datetimes = parser.process_datetimes(&record.datetimes());
            serde_json::to_string_pretty(&EventOutput { record, datetimes })
        }),
    };

    for diagnostic in parser.drain_diagnostics() {
        eprintln!("warning: {diagnostic}");
    }

    match output {
        Ok(Ok(json)) => println!("{json}"),
        Ok(Err(err)) => fail(err),
        Err(err) => fail(err),
    }
}
