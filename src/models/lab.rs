use serde::{Deserialize, Serialize};

use super::lenient;

/// One lab result row (`examenes`). Several rows per parameter over time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabResult {
    #[serde(rename = "rut", default)]
    pub national_id: Option<String>,
    #[serde(rename = "tipo", default)]
    pub category: Option<String>,
    #[serde(rename = "parametro", default)]
    pub parameter: Option<String>,
    #[serde(rename = "resultado", default, deserialize_with = "lenient::text")]
    pub result: Option<String>,
    #[serde(rename = "referencia", default, deserialize_with = "lenient::text")]
    pub reference_range: Option<String>,
    #[serde(rename = "interpretacion", default)]
    pub interpretation: Option<String>,
    #[serde(rename = "fecha", default, deserialize_with = "lenient::text")]
    pub date: Option<String>,
}
