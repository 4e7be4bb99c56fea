//! # calendar-extract
//!
//! Template-driven event extraction for municipal website calendars.
//!
//! Every site gets a JSON [`Template`] saying where its event links and
//! event details are. The [`Parser`] runs that template over a fetched page
//! and returns either the event URLs of a calendar page or an
//! [`EventRecord`] of an event page. Raw dates from the record are then
//! turned into typed [`DatetimeTuple`]s by the datetime normalizer.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use calendar_extract::{dom, Parser, Template};
//!
//! let template = Template::from_json("obec", r#"{
//!     "calendar": {
//!         "root": { "xpath": { "selectors": ["//ul[@class='akce']"] } },
//!         "event_url": { "xpath": { "selectors": [".//a/@href"] } }
//!     },
//!     "event": {
//!         "root": { "xpath": { "selectors": ["//article"] } },
//!         "title": { "xpath": { "selectors": [".//h1"], "match": "FIRST" } },
//!         "datetime": { "xpath": { "selectors": [".//time"] }, "formats": ["%d. %B %Y %H:%M"] }
//!     }
//! }"#)?;
//! let mut parser = Parser::new(Arc::new(template));
//!
//! parser.set_document(dom::parse(r#"<ul class="akce"><li><a href="/akce/7">Pouť</a></li></ul>"#));
//! let urls = parser.get_event_urls_resolved("https://www.obec.cz/kalendar")?;
//! assert_eq!(urls, vec!["https://www.obec.cz/akce/7"]);
//!
//! parser.set_document(dom::parse("<article><h1>Pouť</h1><time>6. červen 2023 14:00</time></article>"));
//! let record = parser.get_event_data()?;
//! let dates = parser.process_datetimes(&record.datetimes());
//! assert_eq!(dates[0].start_date, chrono::NaiveDate::from_ymd_opt(2023, 6, 6));
//! assert!(parser.diagnostics().is_empty());
//! # Ok::<(), calendar_extract::Error>(())
//! ```
//!
//! Problems found on a page never fail a call: they are collected as
//! [`Diagnostics`] for the caller to log or store.

mod error;
mod options;
mod patterns;
mod record;
mod store;

/// Document adapter over `dom_query`.
pub mod dom;

/// Character encoding detection and transcoding.
pub mod encoding;

/// Per-site extraction templates.
pub mod template;

/// XPath selector interpreter.
pub mod xpath;

/// Template-driven extraction engine.
pub mod parser;

/// Datetime normalization of raw event dates.
pub mod datetime;

/// Month and weekday names.
pub mod locale;

/// Non-fatal extraction anomalies.
pub mod diagnostics;

// Public API - re-exports
pub use datetime::{process_datetimes, DatetimeNormalizer, DatetimeTuple, DATE_TIME_DELIMITER};
pub use diagnostics::Diagnostics;
pub use error::{Error, Result};
pub use locale::Locale;
pub use options::Options;
pub use parser::Parser;
pub use record::EventRecord;
pub use store::TemplateStore;
pub use template::{EventField, FieldSpec, MatchPolicy, Page, PageSpec, RegexSpec, SelectorSpec, Template};
pub use xpath::{DocumentIndex, SelectorError, XPath};
