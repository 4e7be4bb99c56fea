//! Record assembly: composite fields, cardinality, ordination.

use std::collections::HashMap;

use super::field::FieldValue;
use crate::datetime::DATE_TIME_DELIMITER;
use crate::diagnostics::Diagnostics;
use crate::patterns::GPS_PAIR;
use crate::record::{encode_json, EventRecord};
use crate::template::EventField;

/// Values of the declared fields, keyed by field.
pub(crate) type Extracted = HashMap<EventField, Vec<FieldValue>>;

/// Join the first `date` and first `time` value into one `datetime` value.
///
/// Only runs when `date` is declared; the merged value then replaces
/// whatever a `datetime` field produced, and a `date` without values leaves
/// `datetime` empty.
fn merge_datetime(extracted: &mut Extracted) {
    let Some(dates) = extracted.remove(&EventField::Date) else {
        return;
    };
    let times = extracted.remove(&EventField::Time).unwrap_or_default();

    let merged = dates.into_iter().next().map(|date| {
        let mut merged = date.into_text();
        if let Some(time) = times.into_iter().next() {
            merged.push_str(DATE_TIME_DELIMITER);
            merged.push_str(&time.into_text());
        }
        FieldValue::Text(merged)
    });

    extracted.insert(EventField::Datetime, merged.into_iter().collect());
}

/// `{Lat, Lon}` captures become `"lat,lon"`; coordinate pair strings are
/// kept; anything else is dropped.
pub(crate) fn finalize_gps(values: Vec<FieldValue>) -> Vec<String> {
    values
        .into_iter()
        .filter_map(|value| match value {
            FieldValue::Groups(groups) => match (groups.get("Lat"), groups.get("Lon")) {
                (Some(lat), Some(lon)) => Some(format!("{},{}", lat.trim(), lon.trim())),
                _ => None,
            },
            FieldValue::Text(text) => GPS_PAIR.is_match(&text).then_some(text),
        })
        .collect()
}

/// Build the record in ordination order.
///
/// `datetime` and `types` keep every value as a JSON array string. Any other
/// field with several values keeps the first and reports it.
pub(crate) fn finalize(mut extracted: Extracted, diagnostics: &mut Diagnostics) -> EventRecord {
    merge_datetime(&mut extracted);

    let mut record = EventRecord::default();
    for field in EventRecord::ORDINATION {
        let Some(values) = extracted.remove(&field) else {
            continue;
        };

        let mut values: Vec<String> = if field == EventField::Gps {
            finalize_gps(values)
        } else {
            values.into_iter().map(FieldValue::into_text).collect()
        };

        let value = if values.is_empty() {
            None
        } else if field.is_multi_valued() {
            encode_json(&values)
        } else {
            if values.len() > 1 {
                diagnostics.push(format!("{field} does not expect more than one value"));
            }
            Some(values.swap_remove(0))
        };

        if let Some(slot) = record.slot_mut(field) {
            *slot = value;
        }
    }
    record
}
