//! Performance benchmarks for calendar-extract.
//!
//! Run with: `cargo bench`
//!
//! Benchmarks include:
//! - Event page extraction with a full site template
//! - Calendar pages of growing size
//! - Datetime normalization of single values and ranges

use std::sync::Arc;

use calendar_extract::{dom, DatetimeNormalizer, Locale, Parser, Template, XPath};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

const TEMPLATE: &str = include_str!("../tests/fixtures/parsers/obec.json");
const EVENT_PAGE: &str = include_str!("../tests/fixtures/pages/akce.html");

fn template() -> Arc<Template> {
    Arc::new(Template::from_json("obec", TEMPLATE).unwrap_or_default())
}

fn calendar_page(events: usize) -> String {
    let items: String = (0..events)
        .map(|i| format!(r#"<div class="akce"><h3><a href="/akce/{i}">Akce {i}</a></h3><p>{i}. 5. 2023</p></div>"#))
        .collect();
    format!(r#"<html><body><div id="kalendar">{items}</div></body></html>"#)
}

fn bench_event_data(c: &mut Criterion) {
    let mut parser = Parser::new(template());

    c.bench_function("event_data", |b| {
        b.iter(|| {
            parser.set_document(dom::parse(black_box(EVENT_PAGE)));
            let record = parser.get_event_data();
            parser.drain_diagnostics();
            record
        });
    });
}

fn bench_event_urls(c: &mut Criterion) {
    let mut group = c.benchmark_group("event_urls");

    for events in [10, 100, 1000] {
        let html = calendar_page(events);
        let document = dom::parse(&html);
        let mut parser = Parser::new(template());
        parser.set_document(document);

        group.throughput(Throughput::Elements(events as u64));
        group.bench_with_input(BenchmarkId::from_parameter(events), &events, |b, _| {
            b.iter(|| parser.get_event_urls());
        });
    }

    group.finish();
}

fn bench_selector_compile(c: &mut Criterion) {
    c.bench_function("selector_compile", |b| {
        b.iter(|| XPath::compile(black_box("//div[contains(@class, 'akce-detail')]//dd[@class='misto']//text()")));
    });
}

fn bench_datetime(c: &mut Criterion) {
    let template = template();
    let locale = Locale::czech();
    let normalizer = DatetimeNormalizer::new(&template, &locale);

    let mut group = c.benchmark_group("datetime");
    for raw in ["18. únor 2023%;13.30", "1. 4. 2023 – 2. 4. 2023%;9.00", "každou středu"] {
        group.bench_with_input(BenchmarkId::from_parameter(raw), &raw, |b, raw| {
            b.iter(|| normalizer.normalize(black_box(raw)));
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_event_data,
    bench_event_urls,
    bench_selector_compile,
    bench_datetime
);
criterion_main!(benches);
