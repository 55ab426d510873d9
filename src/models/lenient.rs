//! Deserializers for free-form store columns.
//!
//! The remote store is loosely typed: weights, heights and lab results are
//! entered by hand and arrive either as JSON numbers or as text
//! ("70,5", "130 mg/dL"). These helpers keep the raw text so the
//! metric calculator can apply its own decimal parsing.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Accept a string, number or boolean column as text. `null` and absent become `None`.
pub fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        Some(other) => Some(other.to_string()),
    })
}

/// Accept an integer column that may arrive as text. Unparseable text becomes `None`.
pub fn integer<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "super::text")]
        value: Option<String>,
        #[serde(default, deserialize_with = "super::integer")]
        days: Option<i64>,
    }

    #[test]
    fn numbers_become_text() {
        let p: Probe = serde_json::from_str(r#"{"value": 130}"#).unwrap();
        assert_eq!(p.value.as_deref(), Some("130"));
    }

    #[test]
    fn text_kept_verbatim() {
        let p: Probe = serde_json::from_str(r#"{"value": "70,5"}"#).unwrap();
        assert_eq!(p.value.as_deref(), Some("70,5"));
    }

    #[test]
    fn null_and_missing_are_none() {
        let p: Probe = serde_json::from_str(r#"{"value": null}"#).unwrap();
        assert!(p.value.is_none());
        let p: Probe = serde_json::from_str("{}").unwrap();
        assert!(p.value.is_none());
        assert!(p.days.is_none());
    }

    #[test]
    fn integer_accepts_text() {
        let p: Probe = serde_json::from_str(r#"{"days": "12"}"#).unwrap();
        assert_eq!(p.days, Some(12));
        let p: Probe = serde_json::from_str(r#"{"days": 3}"#).unwrap();
        assert_eq!(p.days, Some(3));
    }
}
