//! Whitespace compaction and date/time range reordering.
//!
//! Merged event values look like `"1.2.2023 - 3.2.2023%;18:00"`: the date
//! part, the `%;` delimiter, the time part. Formats are assembled the same
//! way from a template's `date` and `time` formats, with `%range{delim}`
//! marking where a range splits. Both are rewritten into a single line with
//! the start before the delimiter and the end after it.

use crate::patterns::{RANGE_MACRO, WHITESPACE_RUN};

/// Separates the date part from the time part of a merged value.
pub const DATE_TIME_DELIMITER: &str = "%;";

/// A format that splits into a start and an end half.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RangeFormat {
    pub start: String,
    pub delimiter: String,
    pub end: String,
}

impl RangeFormat {
    /// Split `prefix %range{delimiter} suffix`, compacting each part.
    pub(crate) fn split(format: &str) -> Option<Self> {
        let caps = RANGE_MACRO.captures(format)?;
        Some(Self {
            start: compact(&caps[1]),
            delimiter: compact(&caps[2]),
            end: compact(&caps[3]),
        })
    }
}

fn strip_around(text: &str, separator: &str) -> String {
    if separator.is_empty() || !text.contains(separator) {
        return text.to_string();
    }
    text.split(separator).map(str::trim).collect::<Vec<_>>().join(separator)
}

/// Collapse whitespace runs and drop whitespace around `.`, `-` and a range
/// delimiter, so "1. 2. 2023 - 3. 2. 2023" and "1.2.2023-3.2.2023" read the
/// same. Inputs and formats go through the same compaction.
pub(crate) fn compact(text: &str) -> String {
    let mut text = WHITESPACE_RUN.replace_all(text.trim(), " ").into_owned();
    text = strip_around(&text, ".");
    text = strip_around(&text, "-");

    let delimiter = RANGE_MACRO.captures(&text).map(|caps| caps[2].trim().to_string());
    if let Some(delimiter) = delimiter {
        text = strip_around(&text, &delimiter);
        text = strip_around(&text, &format!("%range{{{delimiter}}}"));
    }
    text
}

/// The delimiter of a range-bearing format, if `format` has one.
pub(crate) fn macro_delimiter(format: &str) -> Option<String> {
    RANGE_MACRO.captures(format).map(|caps| compact(&caps[2]))
}

/// One side of a value or format split at a range delimiter.
struct Split<'a> {
    start: &'a str,
    joiner: String,
    end: &'a str,
}

fn split_range<'a>(part: &'a str, delimiter: Option<&str>) -> Option<Split<'a>> {
    match delimiter {
        // The last occurrence, as a greedy `(.*)delim(.*)` would split.
        Some(delimiter) if !delimiter.is_empty() => {
            let at = part.rfind(delimiter)?;
            Some(Split {
                start: part[..at].trim(),
                joiner: delimiter.to_string(),
                end: part[at + delimiter.len()..].trim(),
            })
        }
        Some(_) => None,
        None => {
            let caps = RANGE_MACRO.captures(part)?;
            let (start, delimiter, end) = (caps.get(1)?, caps.get(2)?, caps.get(3)?);
            Some(Split {
                start: start.as_str().trim(),
                joiner: format!("%range{{{}}}", delimiter.as_str()),
                end: end.as_str().trim(),
            })
        }
    }
}

/// Rewrite `date%;time` so a range reads start first, end second.
///
/// With `delimiter` set, ranges are found by that literal (values). Without
/// it, by the `%range{...}` macro (formats). A time range under a single
/// date collapses into one `start-end` token.
///
/// ```text
/// "1.2.2023 - 3.2.2023%;18:00"   ->  "1.2.2023 18:00 - 3.2.2023"
/// "1.2.2023%;18:00 - 20:00"      ->  "1.2.2023 18:00-20:00"
/// ```
pub(crate) fn reorder(value: &str, delimiter: Option<&str>) -> String {
    let (date, time) = value.split_once(DATE_TIME_DELIMITER).unwrap_or((value, ""));
    let (date, time) = (date.trim(), time.trim());

    match (split_range(date, delimiter), split_range(time, delimiter)) {
        (Some(dates), Some(times)) => format!(
            "{} {} {} {} {}",
            dates.start, times.start, dates.joiner, dates.end, times.end
        ),
        (Some(dates), None) => format!("{} {} {} {}", dates.start, time, dates.joiner, dates.end),
        (None, Some(times)) => format!("{date} {}-{}", times.start, times.end),
        (None, None) => format!("{date} {time}"),
    }
}
