//! Tri-state fact values.
//!
//! Client templates mix numbers, sentinel strings and blank cells. Every
//! cell is normalized at load time into one of three states so evaluation
//! never has to interpret strings.

use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;
use serde::de::{self, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use tracing::warn;

lazy_static! {
    /// Client explicitly declared the value unknown
    static ref UNKNOWN_MARKER: Regex = Regex::new(r"(?i)^\s*(\?+|unknown|unk|tbd|tbc)\s*$").unwrap();

    /// Field does not apply to this entity
    static ref NOT_APPLICABLE_MARKER: Regex = Regex::new(r"(?i)^\s*(n/?a|none|-)?\s*$").unwrap();

    /// Optional ISO currency code, then a number with optional thousands
    /// separators (comma, space, underscore or apostrophe)
    static ref NUMERIC_TEXT: Regex = Regex::new(
        r"^\s*(?:[A-Za-z]{3}\s+)?(?P<num>[-+]?(?:\d{1,3}(?:[, _']\d{3})+|\d+)(?:\.\d+)?)(?:\s+[A-Za-z]{3})?\s*$"
    ).unwrap();
}

/// Parse numeric text such as "850,000,000" or "EUR 1 200 000".
pub fn parse_number(text: &str) -> Option<f64> {
    let caps = NUMERIC_TEXT.captures(text)?;
    let digits: String = caps["num"]
        .chars()
        .filter(|c| !matches!(c, ',' | ' ' | '_' | '\''))
        .collect();
    digits.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// A single client-supplied fact.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum FactValue {
    Known(f64),
    /// Client marked the value unknown, or it could not be read as a number
    Unknown,
    /// Absent, blank or not applicable
    #[default]
    NotProvided,
}

impl FactValue {
    /// Interpret a text cell.
    pub fn from_text(text: &str) -> Self {
        if UNKNOWN_MARKER.is_match(text) {
            FactValue::Unknown
        } else if NOT_APPLICABLE_MARKER.is_match(text) {
            FactValue::NotProvided
        } else if let Some(n) = parse_number(text) {
            FactValue::Known(n)
        } else {
            warn!(value = text, "Fact is not numeric, treating as unknown");
            FactValue::Unknown
        }
    }

    /// Interpret a numeric cell. Non-finite numbers are unknown.
    pub fn from_number(n: f64) -> Self {
        if n.is_finite() {
            FactValue::Known(n)
        } else {
            FactValue::Unknown
        }
    }

    pub fn known(&self) -> Option<f64> {
        match self {
            FactValue::Known(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, FactValue::Known(_))
    }
}

impl fmt::Display for FactValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FactValue::Known(n) => write!(f, "{}", n),
            FactValue::Unknown => f.write_str("?"),
            FactValue::NotProvided => f.write_str("-"),
        }
    }
}

impl Serialize for FactValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FactValue::Known(n) => serializer.serialize_f64(*n),
            FactValue::Unknown => serializer.serialize_str("?"),
            FactValue::NotProvided => serializer.serialize_none(),
        }
    }
}

struct FactValueVisitor;

impl<'de> Visitor<'de> for FactValueVisitor {
    type Value = FactValue;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a fact cell")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<FactValue, E> {
        warn!(value = v, "Fact is a boolean, treating as unknown");
        Ok(FactValue::Unknown)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<FactValue, A::Error> {
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        warn!("Fact is a list, treating as unknown");
        Ok(FactValue::Unknown)
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<FactValue, A::Error> {
        while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
        warn!("Fact is a map, treating as unknown");
        Ok(FactValue::Unknown)
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<FactValue, E> {
        Ok(FactValue::from_number(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<FactValue, E> {
        Ok(FactValue::Known(v as f64))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<FactValue, E> {
        Ok(FactValue::Known(v as f64))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<FactValue, E> {
        Ok(FactValue::from_text(v))
    }

    fn visit_unit<E: de::Error>(self) -> Result<FactValue, E> {
        Ok(FactValue::NotProvided)
    }

    fn visit_none<E: de::Error>(self) -> Result<FactValue, E> {
        Ok(FactValue::NotProvided)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<FactValue, D::Error> {
        deserializer.deserialize_any(FactValueVisitor)
    }
}

impl<'de> Deserialize<'de> for FactValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(FactValueVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("850000000"), Some(850_000_000.0));
        assert_eq!(parse_number("850,000,000"), Some(850_000_000.0));
        assert_eq!(parse_number("EUR 1 200 000"), Some(1_200_000.0));
        assert_eq!(parse_number("1'000.50 CHF"), Some(1_000.5));
        assert_eq!(parse_number("-42"), Some(-42.0));
        assert_eq!(parse_number("12,34"), None);
        assert_eq!(parse_number("lots"), None);
        assert_eq!(parse_number(""), None);
    }

    #[test]
    fn test_from_text_states() {
        assert_eq!(FactValue::from_text("?"), FactValue::Unknown);
        assert_eq!(FactValue::from_text("Unknown"), FactValue::Unknown);
        assert_eq!(FactValue::from_text("TBD"), FactValue::Unknown);
        assert_eq!(FactValue::from_text(""), FactValue::NotProvided);
        assert_eq!(FactValue::from_text("n/a"), FactValue::NotProvided);
        assert_eq!(FactValue::from_text("N/A"), FactValue::NotProvided);
        assert_eq!(FactValue::from_text("7,000,000"), FactValue::Known(7_000_000.0));
        assert_eq!(FactValue::from_text("about seven million"), FactValue::Unknown);
    }

    #[test]
    fn test_deserialize_from_json() {
        let values: Vec<FactValue> =
            serde_json::from_str(r#"[1, 2.5, "?", null, "n/a", "1,000"]"#).unwrap();
        assert_eq!(
            values,
            vec![
                FactValue::Known(1.0),
                FactValue::Known(2.5),
                FactValue::Unknown,
                FactValue::NotProvided,
                FactValue::NotProvided,
                FactValue::Known(1_000.0),
            ]
        );
    }

    #[test]
    fn test_deserialize_from_yaml() {
        let values: Vec<FactValue> = serde_yaml::from_str("[850000000, '?', ~, .nan]").unwrap();
        assert_eq!(
            values,
            vec![
                FactValue::Known(850_000_000.0),
                FactValue::Unknown,
                FactValue::NotProvided,
                FactValue::Unknown,
            ]
        );
    }

    #[test]
    fn test_non_scalar_cells_are_unknown() {
        let values: Vec<FactValue> =
            serde_json::from_str(r#"[true, [1, 2], {"amount": 5}, 4]"#).unwrap();
        assert_eq!(
            values,
            vec![
                FactValue::Unknown,
                FactValue::Unknown,
                FactValue::Unknown,
                FactValue::Known(4.0),
            ]
        );

        let value: FactValue = serde_json::from_value(serde_json::json!([1, 2])).unwrap();
        assert_eq!(value, FactValue::Unknown);
    }

    #[test]
    fn test_serialize() {
        let json = serde_json::to_string(&vec![
            FactValue::Known(3.0),
            FactValue::Unknown,
            FactValue::NotProvided,
        ])
        .unwrap();
        assert_eq!(json, r#"[3.0,"?",null]"#);
    }
}
