//! Per-site extraction templates.
//!
//! A template is one JSON document with a `calendar` page (where event links
//! live) and an `event` page (where event details live). Every page has a
//! `root` selector scoping the search and one entry per extracted field:
//!
//! ```json
//! {
//!   "calendar": {
//!     "root": { "xpath": { "selectors": ["//div[@id='events']"], "match": "FIRST" } },
//!     "event_url": { "xpath": { "selectors": [".//h2/a/@href"] } }
//!   },
//!   "event": {
//!     "root": { "xpath": { "selectors": ["//article"] } },
//!     "title": { "xpath": { "selectors": [".//h1/text()"], "match": "FIRST" } },
//!     "date": { "xpath": { "selectors": [".//span[@class='date']"] }, "formats": ["%d. %B %Y"] },
//!     "types": { "xpath": { "selectors": [".//ul[@class='tags']/li"] } }
//!   }
//! }
//! ```
//!
//! Templates are plain data: nothing is compiled at load time, so a
//! `Template` is `Send + Sync` and shared between workers behind an `Arc`.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::{Error, Result};

/// How many matches a selector list or regex keeps.
///
/// Only the exact value `"FIRST"` selects [`MatchPolicy::First`]; anything
/// else, including values of other JSON types, reads as [`MatchPolicy::All`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "serde_json::Value")]
pub enum MatchPolicy {
    /// Keep every match.
    #[default]
    All,
    /// Keep only the first match.
    First,
}

impl From<serde_json::Value> for MatchPolicy {
    fn from(value: serde_json::Value) -> Self {
        match value.as_str() {
            Some("FIRST") => Self::First,
            Some("ALL") => Self::All,
            _ => {
                tracing::debug!(%value, "unrecognized match policy, keeping all matches");
                Self::All
            }
        }
    }
}

/// Selector part of a field: where to look and how to shape raw values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SelectorSpec {
    /// XPath expressions, evaluated in order against every root element.
    pub selectors: Vec<String>,

    /// Keep all sanitized values or only the first one.
    #[serde(default, rename = "match")]
    pub match_policy: MatchPolicy,

    /// Values dropped during sanitization (exact match after trimming).
    #[serde(default)]
    pub ignore: Vec<String>,

    /// Collapse all values into one, joined by this separator.
    #[serde(default)]
    pub join_separator: Option<String>,

    /// Split every value by this separator. Ignored when `join_separator` is set.
    #[serde(default)]
    pub split_separator: Option<String>,
}

/// Regex post-processing of a field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RegexSpec {
    /// Patterns tried against every value; all of them, not just the first hit.
    pub expressions: Vec<String>,

    /// Capture group index to output key, e.g. `{"1": "Lat", "2": "Lon"}`.
    ///
    /// Keys stay strings: the page map is flattened, and serde cannot read
    /// integer keys through a flattened map.
    #[serde(default)]
    pub group: Option<BTreeMap<String, String>>,

    /// Keep all regex results or only the first one.
    #[serde(default, rename = "match")]
    pub match_policy: MatchPolicy,
}

/// Extraction rule for one field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FieldSpec {
    /// Selection and formatting rules.
    pub xpath: SelectorSpec,

    /// Optional regex applied after formatting.
    #[serde(default)]
    pub regex: Option<RegexSpec>,

    /// Datetime formats, meaningful for `date`, `time` and `datetime`.
    #[serde(default)]
    pub formats: Vec<String>,
}

impl FieldSpec {
    /// Field with the given selectors and default rules.
    #[must_use]
    pub fn with_selectors<I, S>(selectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            xpath: SelectorSpec {
                selectors: selectors.into_iter().map(Into::into).collect(),
                ..SelectorSpec::default()
            },
            ..Self::default()
        }
    }
}

/// Root scope of a page. Only `selectors` and `match` are used.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RootSpec {
    /// Root selectors.
    pub xpath: SelectorSpec,
}

/// One page of a template: a root scope plus named fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PageSpec {
    /// Root element selection.
    pub root: RootSpec,

    /// Field name to extraction rule.
    #[serde(flatten)]
    pub fields: BTreeMap<String, FieldSpec>,
}

impl PageSpec {
    /// Look up a field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.get(name)
    }
}

/// Pages a template can describe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Page {
    /// Calendar listing with links to events.
    Calendar,
    /// Event detail page.
    Event,
}

impl Page {
    /// Page name as used in template files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Calendar => "calendar",
            Self::Event => "event",
        }
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Page {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "calendar" => Ok(Self::Calendar),
            "event" => Ok(Self::Event),
            other => Err(other.to_string()),
        }
    }
}

/// Name of the only field of the calendar page.
pub const EVENT_URL_FIELD: &str = "event_url";

/// Fields of the event page, in the order they are extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventField {
    Title,
    Perex,
    Date,
    Time,
    Datetime,
    Location,
    Gps,
    Organizer,
    Types,
}

impl EventField {
    /// Declaration order; extraction walks fields in this order.
    pub const ALL: [Self; 9] = [
        Self::Title,
        Self::Perex,
        Self::Date,
        Self::Time,
        Self::Datetime,
        Self::Location,
        Self::Gps,
        Self::Organizer,
        Self::Types,
    ];

    /// Key used in template files and diagnostics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Perex => "perex",
            Self::Date => "date",
            Self::Time => "time",
            Self::Datetime => "datetime",
            Self::Location => "location",
            Self::Gps => "gps",
            Self::Organizer => "organizer",
            Self::Types => "types",
        }
    }

    /// Whether the field legitimately carries several values.
    #[must_use]
    pub const fn is_multi_valued(self) -> bool {
        matches!(self, Self::Datetime | Self::Types)
    }

    /// Parse a template key.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.as_str() == key)
    }
}

impl fmt::Display for EventField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A site template: calendar and event page descriptions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Template {
    /// Site name the template was loaded under.
    #[serde(skip)]
    pub name: String,

    /// Calendar page, if the site template describes one.
    #[serde(default)]
    pub calendar: Option<PageSpec>,

    /// Event page, if the site template describes one.
    #[serde(default)]
    pub event: Option<PageSpec>,
}

impl Template {
    /// Parse and validate a template document.
    pub fn from_json(name: &str, json: &str) -> Result<Self> {
        let mut template: Self = serde_json::from_str(json).map_err(|source| Error::TemplateParse {
            name: name.to_string(),
            source,
        })?;
        template.name = name.to_string();
        template.validate()?;
        Ok(template)
    }

    fn validate(&self) -> Result<()> {
        let invalid = |reason: String| Error::TemplateInvalid {
            name: self.name.clone(),
            reason,
        };

        if let Some(calendar) = &self.calendar {
            if let Some(key) = calendar.fields.keys().find(|key| *key != EVENT_URL_FIELD) {
                return Err(invalid(format!("unknown calendar field '{key}'")));
            }
        }

        if let Some(event) = &self.event {
            if let Some(key) = event.fields.keys().find(|key| EventField::from_key(key).is_none()) {
                return Err(invalid(format!("unknown event field '{key}'")));
            }
        }

        Ok(())
    }

    /// Description of the given page.
    pub fn page(&self, page: Page) -> Result<&PageSpec> {
        let spec = match page {
            Page::Calendar => self.calendar.as_ref(),
            Page::Event => self.event.as_ref(),
        };

        spec.ok_or_else(|| Error::UnknownPage {
            page: page.to_string(),
            template: self.name.clone(),
        })
    }

    /// Like [`Template::page`], for a page given by name.
    pub fn page_by_name(&self, page: &str) -> Result<(Page, &PageSpec)> {
        let page: Page = page.parse().map_err(|page| Error::UnknownPage {
            page,
            template: self.name.clone(),
        })?;
        Ok((page, self.page(page)?))
    }

    /// Rule for an event field, if declared.
    #[must_use]
    pub fn event_field(&self, field: EventField) -> Option<&FieldSpec> {
        self.event.as_ref().and_then(|event| event.field(field.as_str()))
    }

    /// Declared `formats` of an event field; empty when the field is absent.
    #[must_use]
    pub fn formats(&self, field: EventField) -> &[String] {
        self.event_field(field).map_or(&[], |spec| spec.formats.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "calendar": {
            "root": { "xpath": { "selectors": ["//div[@id='list']"], "match": "FIRST" } },
            "event_url": { "xpath": { "selectors": [".//a/@href"] } }
        },
        "event": {
            "root": { "xpath": { "selectors": ["//article"] } },
            "title": { "xpath": { "selectors": [".//h1"], "match": "FIRST", "ignore": ["TBD"] } },
            "gps": {
                "xpath": { "selectors": [".//a/@href"] },
                "regex": { "expressions": ["q=([0-9.]+),([0-9.]+)"], "group": { "1": "Lat", "2": "Lon" } }
            },
            "date": { "xpath": { "selectors": [".//time"] }, "formats": ["%d. %B %Y"] }
        }
    }"#;

    #[test]
    fn test_parses_pages_and_fields() {
        let template = Template::from_json("sample", SAMPLE).unwrap();
        assert_eq!(template.name, "sample");

        let calendar = template.page(Page::Calendar).unwrap();
        assert_eq!(calendar.root.xpath.match_policy, MatchPolicy::First);
        assert!(calendar.field(EVENT_URL_FIELD).is_some());

        let title = template.event_field(EventField::Title).unwrap();
        assert_eq!(title.xpath.ignore, vec!["TBD".to_string()]);
        assert_eq!(title.xpath.match_policy, MatchPolicy::First);

        let gps = template.event_field(EventField::Gps).unwrap();
        let groups = gps.regex.as_ref().unwrap().group.as_ref().unwrap();
        assert_eq!(groups.get("1").map(String::as_str), Some("Lat"));
        assert_eq!(groups.get("2").map(String::as_str), Some("Lon"));

        assert_eq!(template.formats(EventField::Date), ["%d. %B %Y".to_string()]);
        assert!(template.formats(EventField::Time).is_empty());
    }

    #[test]
    fn test_match_defaults_to_all() {
        let template = Template::from_json("sample", SAMPLE).unwrap();
        let root = &template.page(Page::Event).unwrap().root;
        assert_eq!(root.xpath.match_policy, MatchPolicy::All);
    }

    #[test]
    fn test_unrecognized_match_reads_as_all() {
        let json = r#"{ "event": {
            "root": { "xpath": { "selectors": ["//body"], "match": "first" } },
            "title": { "xpath": { "selectors": [".//h1"], "match": 1 } },
            "perex": { "xpath": { "selectors": [".//p"], "match": "FIRST" } }
        } }"#;
        let template = Template::from_json("lenient", json).unwrap();
        assert_eq!(template.page(Page::Event).unwrap().root.xpath.match_policy, MatchPolicy::All);
        assert_eq!(template.event_field(EventField::Title).unwrap().xpath.match_policy, MatchPolicy::All);
        assert_eq!(template.event_field(EventField::Perex).unwrap().xpath.match_policy, MatchPolicy::First);
    }

    #[test]
    fn test_unknown_event_field_is_rejected() {
        let json = r#"{ "event": { "root": { "xpath": { "selectors": ["//body"] } },
                        "price": { "xpath": { "selectors": [".//b"] } } } }"#;
        let err = Template::from_json("bad", json).unwrap_err();
        assert!(matches!(err, Error::TemplateInvalid { .. }));
        assert!(err.to_string().contains("price"));
    }

    #[test]
    fn test_malformed_json_is_a_parse_error() {
        let err = Template::from_json("broken", "{ not json").unwrap_err();
        assert!(matches!(err, Error::TemplateParse { .. }));
    }

    #[test]
    fn test_missing_page_is_unknown_page() {
        let json = r#"{ "event": { "root": { "xpath": { "selectors": ["//body"] } } } }"#;
        let template = Template::from_json("events-only", json).unwrap();
        let err = template.page(Page::Calendar).unwrap_err();
        assert!(matches!(err, Error::UnknownPage { .. }));

        let err = template.page_by_name("archive").unwrap_err();
        assert_eq!(err.to_string(), "Page 'archive' is not defined for 'events-only' template");
    }

    #[test]
    fn test_event_fields_in_declaration_order() {
        let keys: Vec<&str> = EventField::ALL.iter().map(|f| f.as_str()).collect();
        assert_eq!(
            keys,
            ["title", "perex", "date", "time", "datetime", "location", "gps", "organizer", "types"]
        );
        assert!(EventField::Types.is_multi_valued());
        assert!(!EventField::Title.is_multi_valued());
    }
}
