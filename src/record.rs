//! Event records produced by the extraction engine.

use std::io;

use serde::{Deserialize, Serialize};
use serde_json::ser::Formatter;

use crate::template::EventField;

/// One event as extracted from its detail page.
///
/// Fields appear in a fixed order (the ordination) when serialized. All of
/// them may be missing. `datetime` and `types` can carry several values and
/// hold a JSON array encoded as a string, e.g. `["1.2.2023%;18:00", "8.2.2023"]`;
/// this is the shape the storage layer keeps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Event name.
    pub title: Option<String>,

    /// Short lead text.
    pub perex: Option<String>,

    /// JSON array of raw datetime values; date and time are joined by `%;`
    /// when the template extracts them separately.
    pub datetime: Option<String>,

    /// Venue as printed on the page.
    pub location: Option<String>,

    /// `"lat,lon"` in decimal degrees.
    pub gps: Option<String>,

    /// Organizer name.
    pub organizer: Option<String>,

    /// JSON array of event categories.
    pub types: Option<String>,
}

impl EventRecord {
    /// Key order of a serialized record.
    pub const ORDINATION: [EventField; 7] = [
        EventField::Title,
        EventField::Perex,
        EventField::Datetime,
        EventField::Location,
        EventField::Gps,
        EventField::Organizer,
        EventField::Types,
    ];

    /// Value of a field by key, `None` when missing or not part of a record.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        match EventField::from_key(key)? {
            EventField::Title => self.title.as_deref(),
            EventField::Perex => self.perex.as_deref(),
            EventField::Datetime => self.datetime.as_deref(),
            EventField::Location => self.location.as_deref(),
            EventField::Gps => self.gps.as_deref(),
            EventField::Organizer => self.organizer.as_deref(),
            EventField::Types => self.types.as_deref(),
            EventField::Date | EventField::Time => None,
        }
    }

    pub(crate) fn slot_mut(&mut self, field: EventField) -> Option<&mut Option<String>> {
        match field {
            EventField::Title => Some(&mut self.title),
            EventField::Perex => Some(&mut self.perex),
            EventField::Datetime => Some(&mut self.datetime),
            EventField::Location => Some(&mut self.location),
            EventField::Gps => Some(&mut self.gps),
            EventField::Organizer => Some(&mut self.organizer),
            EventField::Types => Some(&mut self.types),
            EventField::Date | EventField::Time => None,
        }
    }

    /// Raw datetime values, decoded from the `datetime` array.
    ///
    /// A value that is not a JSON array of strings reads as empty.
    #[must_use]
    pub fn datetimes(&self) -> Vec<String> {
        decode_list(self.datetime.as_deref())
    }

    /// Event categories, decoded from the `types` array.
    #[must_use]
    pub fn type_list(&self) -> Vec<String> {
        decode_list(self.types.as_deref())
    }

    /// Whether every field is missing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        Self::ORDINATION.iter().all(|field| self.get(field.as_str()).is_none())
    }
}

/// Compact JSON with `", "` and `": "` separators and raw non-ASCII text,
/// the form stored event rows already use.
struct StoredFormatter;

impl Formatter for StoredFormatter {
    fn begin_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }
}

/// Encode a multi-valued field (or a group map) the way records store it.
pub(crate) fn encode_json<T: Serialize + ?Sized>(value: &T) -> Option<String> {
    let mut out = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, StoredFormatter);
    value.serialize(&mut serializer).ok()?;
    String::from_utf8(out).ok()
}

fn decode_list(encoded: Option<&str>) -> Vec<String> {
    encoded
        .and_then(|json| serde_json::from_str(json).ok())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_in_ordination_order() {
        let record = EventRecord {
            types: Some(r#"["koncert"]"#.to_string()),
            title: Some("Jarní koncert".to_string()),
            ..EventRecord::default()
        };
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(
            json,
            r#"{"title":"Jarní koncert","perex":null,"datetime":null,"location":null,"gps":null,"organizer":null,"types":"[\"koncert\"]"}"#
        );
    }

    #[test]
    fn test_encoded_lists_use_stored_separators() {
        let values = ["koncert", "Žďárské léto"];
        assert_eq!(encode_json(&values).as_deref(), Some(r#"["koncert", "Žďárské léto"]"#));
        assert_eq!(encode_json(&["solo"]).as_deref(), Some(r#"["solo"]"#));

        let record = EventRecord {
            types: encode_json(&values),
            ..EventRecord::default()
        };
        assert_eq!(record.type_list(), values);
    }

    #[test]
    fn test_get_by_key() {
        let record = EventRecord {
            location: Some("Sokolovna".to_string()),
            ..EventRecord::default()
        };
        assert_eq!(record.get("location"), Some("Sokolovna"));
        assert_eq!(record.get("title"), None);
        assert_eq!(record.get("date"), None);
        assert_eq!(record.get("price"), None);
    }

    #[test]
    fn test_decodes_multi_valued_fields() {
        let record = EventRecord {
            datetime: Some(r#"["1.2.2023%;18:00","8.2.2023%;18:00"]"#.to_string()),
            types: Some("not json".to_string()),
            ..EventRecord::default()
        };
        assert_eq!(record.datetimes(), vec!["1.2.2023%;18:00", "8.2.2023%;18:00"]);
        assert!(record.type_list().is_empty());
        assert!(!record.is_empty());
        assert!(EventRecord::default().is_empty());
    }
}
