use serde::{Deserialize, Serialize};

use super::lenient;

/// Medical appointment summons (`citaciones`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    #[serde(rename = "rut", default)]
    pub national_id: Option<String>,
    #[serde(rename = "fecha", default, deserialize_with = "lenient::text")]
    pub date: Option<String>,
    #[serde(rename = "hora", default, deserialize_with = "lenient::text")]
    pub time: Option<String>,
    #[serde(rename = "tipo", default)]
    pub kind: Option<String>,
    #[serde(rename = "centro", default)]
    pub center: Option<String>,
    #[serde(rename = "direccion", default)]
    pub address: Option<String>,
    #[serde(rename = "estado", default)]
    pub status: Option<String>,
}
