use serde::{Deserialize, Serialize};

use super::lenient;

/// Industrial-hygiene exposure measurement (`v_higiene`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HygieneRecord {
    #[serde(rename = "rut", default)]
    pub national_id: Option<String>,
    #[serde(rename = "agente", default)]
    pub agent: Option<String>,
    /// Homogeneous exposure group.
    #[serde(rename = "ges", default)]
    pub exposure_group: Option<String>,
    #[serde(rename = "fecha", default, deserialize_with = "lenient::text")]
    pub date: Option<String>,
    #[serde(rename = "valor", default, deserialize_with = "lenient::text")]
    pub value: Option<String>,
    /// Occupational exposure limit.
    #[serde(rename = "oel", default, deserialize_with = "lenient::text")]
    pub exposure_limit: Option<String>,
    #[serde(rename = "nivel", default)]
    pub level: Option<String>,
}
