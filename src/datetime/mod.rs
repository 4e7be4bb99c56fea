//! Datetime normalization.
//!
//! Event pages print dates as free text: "1. ledna 2023", "01.02.2023 -
//! 03.02.2023", "18:00 - 20:00". The extraction engine hands over those raw
//! strings (date and time joined by [`DATE_TIME_DELIMITER`] when a template
//! extracts them separately) and this module turns each into at most one
//! [`DatetimeTuple`], guided by the `formats` the template declares.

mod format;
mod range;

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;

use crate::diagnostics::Diagnostics;
use crate::locale::Locale;
use crate::patterns::{DATE_DIRECTIVE, TIME_DIRECTIVE};
use crate::template::{EventField, Template};

pub use format::parse as parse_with_format;
pub use range::DATE_TIME_DELIMITER;

use range::{compact, macro_delimiter, reorder, RangeFormat};

/// Fallback for templates that extract date and time as one field.
pub const DEFAULT_DATETIME_FORMAT: &str = "%d.%m.%Y %H:%M";
/// Fallback date format, always tried.
pub const DEFAULT_DATE_FORMAT: &str = "%d.%m.%Y";
/// Fallback time format.
pub const DEFAULT_TIME_FORMAT: &str = "%H:%M";

/// Start and end of an event occurrence. Parts the source did not state are
/// `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct DatetimeTuple {
    pub start_date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_date: Option<NaiveDate>,
    pub end_time: Option<NaiveTime>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Candidate {
    Single(String),
    Range(RangeFormat),
}

impl Candidate {
    fn new(format: String) -> Self {
        RangeFormat::split(&format).map_or(Self::Single(format), Self::Range)
    }

    fn parse(&self, value: &str, locale: &Locale) -> Option<DatetimeTuple> {
        match self {
            Self::Single(format) => {
                let (start_date, start_time) = parse_side(value, format, locale)?;
                Some(DatetimeTuple {
                    start_date,
                    start_time,
                    ..DatetimeTuple::default()
                })
            }
            Self::Range(range) => {
                let (start, end) = value.split_once(range.delimiter.as_str())?;
                let (start_date, start_time) = parse_side(&compact(start), &range.start, locale)?;
                let (end_date, end_time) = parse_side(&compact(end), &range.end, locale)?;

                // "1.2.-3.2.2023 18:00": the one stated time applies to both ends.
                let (start_time, end_time) = match (start_time, end_time) {
                    (Some(time), None) | (None, Some(time)) => (Some(time), Some(time)),
                    times => times,
                };

                Some(DatetimeTuple {
                    start_date,
                    start_time,
                    end_date,
                    end_time,
                })
            }
        }
    }
}

/// Parse one side and keep the halves the format actually mentions.
fn parse_side(value: &str, format: &str, locale: &Locale) -> Option<(Option<NaiveDate>, Option<NaiveTime>)> {
    let (date, time) = format::parse(value, format, locale)?;
    Some((
        DATE_DIRECTIVE.is_match(format).then_some(date),
        TIME_DIRECTIVE.is_match(format).then_some(time),
    ))
}

/// Candidate formats for one template, ready to run over many values.
#[derive(Debug, Clone)]
pub struct DatetimeNormalizer<'a> {
    candidates: Vec<Candidate>,
    range_delimiter: Option<String>,
    locale: &'a Locale,
}

impl<'a> DatetimeNormalizer<'a> {
    /// Build the candidate formats of a template.
    ///
    /// With a `datetime` field the template's combined formats are used, plus
    /// [`DEFAULT_DATETIME_FORMAT`]. Otherwise every `date` format (plus
    /// [`DEFAULT_DATE_FORMAT`]) is tried alone and combined with every `time`
    /// format (plus [`DEFAULT_TIME_FORMAT`]). [`DEFAULT_DATE_FORMAT`] is always
    /// a candidate. Order follows declaration, duplicates dropped.
    #[must_use]
    pub fn new(template: &Template, locale: &'a Locale) -> Self {
        let mut formats: Vec<String> = Vec::new();

        if template.event_field(EventField::Datetime).is_some() {
            formats.extend(template.formats(EventField::Datetime).iter().cloned());
            formats.push(DEFAULT_DATETIME_FORMAT.to_string());
        } else {
            let dates = with_default(template.formats(EventField::Date), DEFAULT_DATE_FORMAT);
            let times = with_default(template.formats(EventField::Time), DEFAULT_TIME_FORMAT);
            for date in &dates {
                formats.push(date.clone());
                for time in &times {
                    formats.push(reorder(&format!("{date}{DATE_TIME_DELIMITER}{time}"), None));
                }
            }
        }
        formats.push(DEFAULT_DATE_FORMAT.to_string());

        let mut candidates: Vec<Candidate> = Vec::with_capacity(formats.len());
        for format in formats {
            let candidate = Candidate::new(compact(&format.replace('–', "-")));
            if !candidates.contains(&candidate) {
                candidates.push(candidate);
            }
        }

        // Values split at the first range delimiter any declared format uses,
        // including time ranges that collapsed while the formats were built.
        let range_delimiter = [EventField::Datetime, EventField::Date, EventField::Time]
            .into_iter()
            .flat_map(|field| template.formats(field))
            .find_map(|format| macro_delimiter(&format.replace('–', "-")));

        tracing::trace!(
            template = %template.name,
            candidates = candidates.len(),
            range_delimiter = ?range_delimiter,
            "prepared datetime formats"
        );

        Self {
            candidates,
            range_delimiter,
            locale,
        }
    }

    /// Normalize one raw value.
    ///
    /// Every candidate is tried; the last one that yields a start date wins.
    #[must_use]
    pub fn normalize(&self, raw: &str) -> Option<DatetimeTuple> {
        let mut value = self.locale.replace_words(raw).replace('–', "-");
        if value.contains(DATE_TIME_DELIMITER) {
            value = reorder(&value, self.range_delimiter.as_deref());
        }
        let value = compact(&value);

        self.candidates
            .iter()
            .rev()
            .filter_map(|candidate| candidate.parse(&value, self.locale))
            .find(|tuple| tuple.start_date.is_some())
    }

    /// Number of candidate formats.
    #[must_use]
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

fn with_default(declared: &[String], default: &str) -> Vec<String> {
    let mut formats = declared.to_vec();
    formats.push(default.to_string());
    formats
}

/// Normalize every raw value of an event.
///
/// Values that yield no start date are left out of the result and reported
/// as "could not normalize datetime '<raw>'".
pub fn process_datetimes<S: AsRef<str>>(
    template: &Template,
    raws: &[S],
    locale: &Locale,
    diagnostics: &mut Diagnostics,
) -> Vec<DatetimeTuple> {
    let normalizer = DatetimeNormalizer::new(template, locale);
    raws.iter()
        .map(AsRef::as_ref)
        .filter_map(|raw| {
            let tuple = normalizer.normalize(raw);
            if tuple.is_none() {
                diagnostics.push(format!("could not normalize datetime '{raw}'"));
            }
            tuple
        })
        .collect()
}
