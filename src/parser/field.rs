//! Per-field value shaping: sanitize, format, regex.

use std::collections::BTreeMap;

use regex::Regex;

use crate::diagnostics::Diagnostics;
use crate::record::encode_json;
use crate::template::{MatchPolicy, RegexSpec, SelectorSpec};

/// A field value after the regex step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum FieldValue {
    /// Selected text or a whole regex match.
    Text(String),
    /// Named capture groups of one regex match.
    Groups(BTreeMap<String, String>),
}

impl FieldValue {
    /// Text form; captured groups render as a JSON object.
    pub(crate) fn into_text(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Groups(groups) => encode_json(&groups).unwrap_or_default(),
        }
    }
}

/// Normalize non-breaking spaces, trim, and drop blanks, ignored values and
/// repeats (first occurrence kept).
pub(crate) fn sanitize(values: Vec<String>, ignore: &[String]) -> Vec<String> {
    let mut sanitized: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        let value = value.replace('\u{a0}', " ");
        let value = value.trim();
        if value.is_empty() || ignore.iter().any(|ignored| ignored == value) {
            continue;
        }
        if !sanitized.iter().any(|seen| seen == value) {
            sanitized.push(value.to_string());
        }
    }
    sanitized
}

/// Apply `match`, then `join_separator` or `split_separator`.
pub(crate) fn format_values(mut values: Vec<String>, spec: &SelectorSpec) -> Vec<String> {
    if values.is_empty() {
        return values;
    }

    if spec.match_policy == MatchPolicy::First {
        values.truncate(1);
    }

    if let Some(separator) = &spec.join_separator {
        return vec![values.join(separator)];
    }

    if let Some(separator) = spec.split_separator.as_deref().filter(|sep| !sep.is_empty()) {
        values = values
            .iter()
            .flat_map(|value| value.split(separator))
            .map(str::to_string)
            .collect();
        // A first-only field stays single-valued after splitting.
        if spec.match_policy == MatchPolicy::First {
            values.truncate(1);
        }
    }

    values
}

/// Run every configured expression over every value.
///
/// Without a `group` map a match yields its whole text; with one, a match
/// yields a single map of the configured group names. Patterns that do not
/// compile and group keys that are not indices are reported and skipped.
pub(crate) fn apply_regex(
    values: Vec<String>,
    spec: Option<&RegexSpec>,
    field: &str,
    diagnostics: &mut Diagnostics,
) -> Vec<FieldValue> {
    let Some(spec) = spec else {
        return values.into_iter().map(FieldValue::Text).collect();
    };
    if values.is_empty() {
        return Vec::new();
    }

    let expressions: Vec<Regex> = spec
        .expressions
        .iter()
        .filter_map(|pattern| match Regex::new(pattern) {
            Ok(re) => Some(re),
            Err(err) => {
                tracing::debug!(field, pattern, %err, "skipping invalid regex");
                diagnostics.push(format!("invalid regex '{pattern}' for '{field}'"));
                None
            }
        })
        .collect();

    let groups: Option<Vec<(usize, &str)>> = spec.group.as_ref().map(|group| {
        group
            .iter()
            .filter_map(|(index, name)| match index.trim().parse::<usize>() {
                Ok(index) => Some((index, name.as_str())),
                Err(_) => {
                    diagnostics.push(format!("regex group '{index}' of '{field}' is not a group index"));
                    None
                }
            })
            .collect()
    });

    let mut results = Vec::new();
    for value in &values {
        for re in &expressions {
            let Some(caps) = re.captures(value) else {
                continue;
            };
            match &groups {
                Some(groups) => {
                    let captured: BTreeMap<String, String> = groups
                        .iter()
                        .filter_map(|(index, name)| {
                            caps.get(*index).map(|m| ((*name).to_string(), m.as_str().to_string()))
                        })
                        .collect();
                    if !captured.is_empty() {
                        results.push(FieldValue::Groups(captured));
                    }
                }
                None => results.push(FieldValue::Text(caps[0].to_string())),
            }
        }
    }

    if spec.match_policy == MatchPolicy::First {
        results.truncate(1);
    }
    results
}
