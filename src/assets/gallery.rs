use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::{BlobStore, UploadOptions};
use crate::authorization::{Affordance, SessionContext};
use crate::config::{DashboardConfig, ASSET_BUCKET, GLOBAL_PDF_KEY, IMAGE_PREFIX};
use crate::dashboard::Section;
use crate::error::DashboardError;

/// Characters kept in a gallery label before truncation.
const LABEL_CHARS: usize = 16;

const PDF_MIME: &str = "application/pdf";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GalleryImage {
    pub name: String,
    pub label: String,
    pub url: String,
    /// Delete button shown (health staff only).
    pub deletable: bool,
}

/// A file picked for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadFile {
    pub name: String,
    /// Declared content type; guessed from the name when absent.
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum UploadOutcome {
    Stored { name: String, key: String },
    Unsupported { name: String },
    Failed { name: String, message: String },
}

impl UploadOutcome {
    pub fn is_stored(&self) -> bool {
        matches!(self, Self::Stored { .. })
    }
}

/// Public URL of the global recommendations PDF.
pub fn global_pdf_url(blobs: &dyn BlobStore) -> String {
    blobs.public_url(ASSET_BUCKET, GLOBAL_PDF_KEY)
}

/// Gallery images, newest first, without dot-files.
pub async fn load_gallery(
    ctx: &SessionContext,
    blobs: &dyn BlobStore,
    config: &DashboardConfig,
) -> Section<Vec<GalleryImage>> {
    let listed = match blobs.list(ASSET_BUCKET, IMAGE_PREFIX, config.gallery_limit).await {
        Ok(listed) => listed,
        Err(e) => {
            tracing::warn!(section = "gallery", error = %e, "Section failed to load");
            return Section::Failed {
                message: e.to_string(),
            };
        }
    };

    let deletable = ctx.permits(Affordance::AssetDelete);
    let images = listed
        .into_iter()
        .filter(|object| !object.name.starts_with('.'))
        .map(|object| GalleryImage {
            label: gallery_label(&object.name),
            url: blobs.public_url(ASSET_BUCKET, &format!("{IMAGE_PREFIX}/{}", object.name)),
            deletable,
            name: object.name,
        })
        .collect();
    Section::Loaded { data: images }
}

/// Upload a selection of files. PDFs replace the global PDF, images are
/// added to the gallery, anything else is reported as unsupported.
///
/// Each file is attempted once; failures are reported per file.
pub async fn upload_assets(
    ctx: &SessionContext,
    blobs: &dyn BlobStore,
    files: Vec<UploadFile>,
    now: DateTime<Utc>,
) -> Result<Vec<UploadOutcome>, DashboardError> {
    if !ctx.permits(Affordance::AssetUpload) {
        tracing::warn!(role = ctx.role().as_str(), "Asset upload refused");
        return Err(DashboardError::PermissionDenied);
    }
    if files.is_empty() {
        return Err(DashboardError::ValidationFailure(
            "Selecciona uno o más archivos.".into(),
        ));
    }

    let mut outcomes = Vec::with_capacity(files.len());
    for file in files {
        let content_type = file.content_type.clone().unwrap_or_else(|| {
            mime_guess::from_path(&file.name)
                .first_or_octet_stream()
                .to_string()
        });

        let (key, overwrite) = if content_type == PDF_MIME {
            (GLOBAL_PDF_KEY.to_string(), true)
        } else if content_type.starts_with("image/") {
            (image_key(&file.name, now), false)
        } else {
            tracing::info!(name = %file.name, content_type = %content_type, "Unsupported asset type");
            outcomes.push(UploadOutcome::Unsupported { name: file.name });
            continue;
        };

        let options = UploadOptions {
            overwrite,
            content_type: Some(content_type),
        };
        let outcome = match blobs.upload(ASSET_BUCKET, &key, file.bytes, &options).await {
            Ok(()) => UploadOutcome::Stored {
                name: file.name,
                key,
            },
            Err(e) => {
                tracing::warn!(name = %file.name, error = %e, "Asset upload failed");
                UploadOutcome::Failed {
                    name: file.name,
                    message: e.to_string(),
                }
            }
        };
        outcomes.push(outcome);
    }

    tracing::info!(
        stored = outcomes.iter().filter(|o| o.is_stored()).count(),
        total = outcomes.len(),
        "Asset upload finished"
    );
    Ok(outcomes)
}

/// Delete one gallery image. `confirmed` is the user's answer to the
/// confirmation prompt.
pub async fn delete_image(
    ctx: &SessionContext,
    blobs: &dyn BlobStore,
    name: &str,
    confirmed: bool,
) -> Result<(), DashboardError> {
    if !ctx.permits(Affordance::AssetDelete) {
        tracing::warn!(role = ctx.role().as_str(), "Asset delete refused");
        return Err(DashboardError::PermissionDenied);
    }
    if !confirmed {
        return Err(DashboardError::ValidationFailure(
            "Eliminación cancelada.".into(),
        ));
    }
    if name.is_empty() || name.contains('/') {
        return Err(DashboardError::ValidationFailure(format!(
            "Nombre de imagen inválido: {name}"
        )));
    }

    blobs
        .remove(ASSET_BUCKET, &[format!("{IMAGE_PREFIX}/{name}")])
        .await?;
    tracing::info!(name, "Gallery image deleted");
    Ok(())
}

/// First 16 characters of the name, with an ellipsis when cut.
fn gallery_label(name: &str) -> String {
    let mut chars = name.chars();
    let head: String = chars.by_ref().take(LABEL_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}…")
    } else {
        head
    }
}

/// `imagenes/<timestamp>_<name>` with a filesystem-safe timestamp.
fn image_key(name: &str, now: DateTime<Utc>) -> String {
    let ts = now
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    format!("{IMAGE_PREFIX}/{ts}_{}", sanitize_name(name))
}

/// Replace every character outside `[A-Za-z0-9._-]` with `_`.
fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
