//! Template-driven extraction engine.
//!
//! A [`Parser`] runs one site's [`Template`] over a page:
//!
//! 1. The page's `root` selectors pick the scope elements.
//! 2. For every declared field, in declaration order, each root is searched
//!    with each of the field's selectors.
//! 3. Values are sanitized, formatted (`match`, `join_separator`,
//!    `split_separator`), sanitized again and run through the optional regex.
//! 4. `date` and `time` merge into `datetime`, `gps` is validated, and the
//!    fields collapse into an [`EventRecord`].
//!
//! Unknown pages and a missing document fail the call. Everything else
//! (no root, no match, broken selectors, surplus values) is recorded in
//! [`Parser::diagnostics`] and the call carries on.

mod field;
mod finalize;

use std::sync::Arc;

use dom_query::{Document, NodeRef};
use url::Url;

use crate::datetime::{self, DatetimeTuple};
use crate::diagnostics::Diagnostics;
use crate::dom;
use crate::error::{Error, Result};
use crate::locale::Locale;
use crate::record::EventRecord;
use crate::template::{EventField, MatchPolicy, Page, PageSpec, SelectorSpec, Template, EVENT_URL_FIELD};
use crate::xpath::{DocumentIndex, XPath};

use field::{apply_regex, format_values, sanitize};
use finalize::{finalize, Extracted};

/// Extraction engine for one site. Keep one per worker.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use calendar_extract::{dom, Parser, Template};
///
/// let template = Template::from_json("demo", r#"{
///     "event": {
///         "root": { "xpath": { "selectors": ["//article"] } },
///         "title": { "xpath": { "selectors": [".//h1"], "match": "FIRST" } }
///     }
/// }"#)?;
///
/// let mut parser = Parser::new(Arc::new(template));
/// parser.set_document(dom::parse("<article><h1>Pouť</h1></article>"));
/// let record = parser.get_event_data()?;
/// assert_eq!(record.title.as_deref(), Some("Pouť"));
/// # Ok::<(), calendar_extract::Error>(())
/// ```
pub struct Parser {
    template: Arc<Template>,
    document: Option<Document>,
    locale: Locale,
    diagnostics: Diagnostics,
}

impl Parser {
    /// Engine for `template` with the default locale.
    #[must_use]
    pub fn new(template: Arc<Template>) -> Self {
        Self {
            template,
            document: None,
            locale: Locale::default(),
            diagnostics: Diagnostics::new(),
        }
    }

    /// Use `locale` when normalizing datetimes.
    #[must_use]
    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    #[must_use]
    pub fn template(&self) -> &Template {
        &self.template
    }

    /// Page to extract from; replaces the previous one.
    pub fn set_document(&mut self, document: Document) {
        self.document = Some(document);
    }

    /// Diagnostics recorded so far.
    #[must_use]
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Take the recorded diagnostics, leaving none behind.
    pub fn drain_diagnostics(&mut self) -> Vec<String> {
        self.diagnostics.drain()
    }

    /// Event links of a calendar page, in document order.
    pub fn get_event_urls(&mut self) -> Result<Vec<String>> {
        let page = self.template.page(Page::Calendar)?;
        let document = self.document.as_ref().ok_or(Error::MissingDocument)?;

        let index = DocumentIndex::new(document.root());
        let roots = find_roots(&index, document, Page::Calendar, page, &mut self.diagnostics);
        if roots.is_empty() {
            return Ok(Vec::new());
        }

        let Some(spec) = page.field(EVENT_URL_FIELD) else {
            self.diagnostics
                .push(format!("No '{EVENT_URL_FIELD}' field defined for 'calendar' page"));
            return Ok(Vec::new());
        };

        let urls: Vec<String> = select(&index, &roots, EVENT_URL_FIELD, &spec.xpath, &mut self.diagnostics)
            .iter()
            .map(|url| url.trim())
            .filter(|url| !url.is_empty())
            .map(String::from)
            .collect();

        if urls.is_empty() {
            self.diagnostics
                .push(format!("No '{EVENT_URL_FIELD}' values found on 'calendar' page"));
        }
        tracing::debug!(template = %self.template.name, count = urls.len(), "event urls");
        Ok(urls)
    }

    /// Like [`Parser::get_event_urls`], with every link resolved against the
    /// calendar page address.
    pub fn get_event_urls_resolved(&mut self, calendar_url: &str) -> Result<Vec<String>> {
        let base = Url::parse(calendar_url).map_err(|source| Error::InvalidUrl {
            url: calendar_url.to_string(),
            source,
        })?;

        let urls = self.get_event_urls()?;
        let mut resolved = Vec::with_capacity(urls.len());
        for url in urls {
            match base.join(&url) {
                Ok(joined) => resolved.push(joined.to_string()),
                Err(err) => self
                    .diagnostics
                    .push(format!("could not resolve event url '{url}': {err}")),
            }
        }
        Ok(resolved)
    }

    /// The event record of an event page.
    pub fn get_event_data(&mut self) -> Result<EventRecord> {
        let page = self.template.page(Page::Event)?;
        let document = self.document.as_ref().ok_or(Error::MissingDocument)?;

        let index = DocumentIndex::new(document.root());
        let roots = find_roots(&index, document, Page::Event, page, &mut self.diagnostics);

        let mut extracted = Extracted::new();
        for field in EventField::ALL {
            let Some(spec) = page.field(field.as_str()) else {
                continue;
            };

            let selected = if roots.is_empty() {
                Vec::new()
            } else {
                select(&index, &roots, field.as_str(), &spec.xpath, &mut self.diagnostics)
            };

            let ignore = &spec.xpath.ignore;
            let values = sanitize(selected, ignore);
            let values = sanitize(format_values(values, &spec.xpath), ignore);
            let values = apply_regex(values, spec.regex.as_ref(), field.as_str(), &mut self.diagnostics);

            extracted.insert(field, values);
        }

        Ok(finalize(extracted, &mut self.diagnostics))
    }

    /// Normalize raw datetime values with this template's formats.
    pub fn process_datetimes<S: AsRef<str>>(&mut self, raws: &[S]) -> Vec<DatetimeTuple> {
        datetime::process_datetimes(&self.template, raws, &self.locale, &mut self.diagnostics)
    }
}

/// Compile every selector, reporting the ones that do not compile.
fn compile_selectors(sources: &[String], field: &str, diagnostics: &mut Diagnostics) -> Vec<XPath> {
    sources
        .iter()
        .filter_map(|source| match XPath::compile(source) {
            Ok(xpath) => Some(xpath),
            Err(err) => {
                tracing::debug!(field, selector = %source, %err, "skipping invalid selector");
                diagnostics.push(format!("invalid selector '{source}' for '{field}': {err}"));
                None
            }
        })
        .collect()
}

fn find_roots<'a>(
    index: &DocumentIndex<'a>,
    document: &'a Document,
    page: Page,
    spec: &PageSpec,
    diagnostics: &mut Diagnostics,
) -> Vec<NodeRef<'a>> {
    let selectors = compile_selectors(&spec.root.xpath.selectors, "root", diagnostics);

    let mut roots: Vec<NodeRef<'a>> = selectors
        .iter()
        .flat_map(|xpath| xpath.select_nodes_in(index, document.root()))
        .collect();

    if roots.is_empty() {
        diagnostics.push(format!("No root element of '{page}' page found"));
    } else if spec.root.xpath.match_policy == MatchPolicy::First {
        roots.truncate(1);
    }

    tracing::trace!(
        %page,
        count = roots.len(),
        first = ?roots.first().and_then(dom::tag_name),
        "resolved roots"
    );
    roots
}

/// Every root against every selector, in that order.
fn select<'a>(
    index: &DocumentIndex<'a>,
    roots: &[NodeRef<'a>],
    field: &str,
    spec: &SelectorSpec,
    diagnostics: &mut Diagnostics,
) -> Vec<String> {
    let selectors = compile_selectors(&spec.selectors, field, diagnostics);
    roots
        .iter()
        .flat_map(|root| {
            selectors
                .iter()
                .flat_map(move |xpath| xpath.select_strings_in(index, *root))
        })
        .collect()
}
