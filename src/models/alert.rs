use serde::{Deserialize, Serialize};

use super::lenient;

/// Precomputed deadline alert (`v_alertas`), e.g. an evaluation about to expire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeadlineAlert {
    #[serde(rename = "rut", default)]
    pub national_id: Option<String>,
    #[serde(rename = "titulo", default)]
    pub title: Option<String>,
    #[serde(rename = "tipo", default)]
    pub kind: Option<String>,
    #[serde(rename = "dias_restantes", default, deserialize_with = "lenient::integer")]
    pub days_remaining: Option<i64>,
}

impl DeadlineAlert {
    /// Display label: title, else kind, else a generic fallback.
    pub fn label(&self) -> &str {
        self.title
            .as_deref()
            .or(self.kind.as_deref())
            .unwrap_or("Alerta")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_falls_back_to_kind_then_generic() {
        let mut alert = DeadlineAlert {
            kind: Some("Audiometría".into()),
            ..Default::default()
        };
        assert_eq!(alert.label(), "Audiometría");
        alert.title = Some("Examen ocupacional".into());
        assert_eq!(alert.label(), "Examen ocupacional");
        assert_eq!(DeadlineAlert::default().label(), "Alerta");
    }
}
