//! Serde helpers writing missing floats as `NA`
//!
//! Use with `#[serde(with = "crate::io::na_float")]`. Reading accepts `NA`,
//! `NaN`, empty cells and JSON `null` as missing.

use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserializer, Serializer};

/// Serialize NaN as `NA`, other values as numbers
pub fn serialize<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    if value.is_nan() {
        serializer.serialize_str("NA")
    } else {
        serializer.serialize_f64(*value)
    }
}

/// Deserialize a float, mapping missing markers to NaN
pub fn deserialize<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(NaFloatVisitor)
}

/// Parse a text cell, mapping missing markers to NaN
pub fn parse_cell(s: &str) -> Option<f64> {
    let s = s.trim();
    if is_missing_marker(s) {
        return Some(f64::NAN);
    }
    s.parse::<f64>().ok()
}

/// Whether a text cell denotes a missing value
pub(crate) fn is_missing_marker(s: &str) -> bool {
    matches!(s, "" | "NA" | "na" | "N/A" | "NaN" | "nan" | "null" | "NULL" | "#N/A")
}

struct NaFloatVisitor;

impl<'de> Visitor<'de> for NaFloatVisitor {
    type Value = f64;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a number or a missing-value marker such as NA")
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<f64, E> {
        Ok(v)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<f64, E> {
        Ok(v as f64)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<f64, E> {
        Ok(v as f64)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<f64, E> {
        parse_cell(v).ok_or_else(|| E::invalid_value(de::Unexpected::Str(v), &self))
    }

    fn visit_unit<E: de::Error>(self) -> Result<f64, E> {
        Ok(f64::NAN)
    }

    fn visit_none<E: de::Error>(self) -> Result<f64, E> {
        Ok(f64::NAN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize)]
    struct Row {
        id: String,
        #[serde(with = "super")]
        value: f64,
    }

    #[test]
    fn test_parse_cell_markers() {
        assert!(parse_cell("NA").unwrap().is_nan());
        assert!(parse_cell(" ").unwrap().is_nan());
        assert_eq!(parse_cell("2.5"), Some(2.5));
        assert!(parse_cell("abc").is_none());
    }

    #[test]
    fn test_csv_round_trip_of_missing_value() {
        let mut writer = csv::Writer::from_writer(vec![]);
        writer
            .serialize(Row {
                id: "g1".to_string(),
                value: f64::NAN,
            })
            .unwrap();
        writer
            .serialize(Row {
                id: "g2".to_string(),
                value: 0.25,
            })
            .unwrap();
        let text = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        assert!(text.contains("g1,NA"));

        let mut reader = csv::Reader::from_reader(text.as_bytes());
        let rows: Vec<Row> = reader.deserialize().collect::<Result<_, _>>().unwrap();
        assert!(rows[0].value.is_nan());
        assert_eq!(rows[1].value, 0.25);
    }
}
