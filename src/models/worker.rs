use serde::{Deserialize, Serialize};

use super::lenient;

/// Worker profile snapshot (`trabajadores`). Biometric columns stay raw text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkerProfile {
    #[serde(rename = "rut", default)]
    pub national_id: Option<String>,
    #[serde(rename = "nombre", default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(rename = "empresa", default)]
    pub employer: Option<String>,
    #[serde(rename = "gerencia", default)]
    pub org_unit: Option<String>,
    #[serde(rename = "peso_kg", default, deserialize_with = "lenient::text")]
    pub weight_kg: Option<String>,
    #[serde(rename = "altura_cm", default, deserialize_with = "lenient::text")]
    pub height_cm: Option<String>,
    #[serde(rename = "fecha_nacimiento", default, deserialize_with = "lenient::text")]
    pub birth_date: Option<String>,
}

/// Login account row (`usuarios`). Carries the raw role field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserAccount {
    #[serde(rename = "rut", default)]
    pub national_id: Option<String>,
    #[serde(rename = "nombre", default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(rename = "rol", default)]
    pub role: Option<String>,
}

/// Worker directory row (`v_usuarios_busqueda`) used by supervisor search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    #[serde(rename = "rut", default)]
    pub national_id: Option<String>,
    #[serde(rename = "nombre", default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Organizational placement looked up by identifier to enrich search hits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrgPlacement {
    #[serde(rename = "rut")]
    pub national_id: String,
    #[serde(rename = "gerencia", default)]
    pub org_unit: Option<String>,
    #[serde(rename = "empresa", default)]
    pub employer: Option<String>,
}
