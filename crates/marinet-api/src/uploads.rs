use std::collections::HashMap;
use std::path::PathBuf;

use axum::extract::Multipart;
use tokio::io::AsyncWriteExt;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::ApiError;

const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif"];

/// Public path prefix under which saved images are served.
pub const PUBLIC_PREFIX: &str = "/static/uploads";

/// Image storage on local disk.
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    /// Save an uploaded image and return its public URL. Files with an empty
    /// name, no bytes or an extension outside png/jpg/jpeg/gif are ignored.
    pub async fn save_image(&self, original_name: &str, bytes: &[u8]) -> Result<Option<String>, ApiError> {
        if original_name.is_empty() || bytes.is_empty() {
            return Ok(None);
        }
        if !is_allowed(original_name) {
            warn!("Ignoring upload '{}' with unsupported extension", original_name);
            return Ok(None);
        }

        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            error!("Failed to create upload directory {}: {}", self.dir.display(), e);
            ApiError::Internal
        })?;

        let file_name = format!("{}_{}", Uuid::new_v4(), sanitize(original_name));
        let path = self.dir.join(&file_name);

        let mut file = tokio::fs::File::create(&path).await.map_err(|e| {
            error!("Failed to create file {}: {}", path.display(), e);
            ApiError::Internal
        })?;
        file.write_all(bytes).await.map_err(|e| {
            error!("Failed to write file {}: {}", path.display(), e);
            ApiError::Internal
        })?;
        file.flush().await.map_err(|e| {
            error!("Failed to flush file {}: {}", path.display(), e);
            ApiError::Internal
        })?;

        info!("Stored upload {} ({} bytes)", file_name, bytes.len());
        Ok(Some(format!("{}/{}", PUBLIC_PREFIX, file_name)))
    }

    /// Remove an image saved by `save_image` whose request was rejected.
    pub async fn discard(&self, url: &str) {
        let Some(file_name) = url
            .strip_prefix(PUBLIC_PREFIX)
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|name| !name.is_empty() && !name.contains(['/', '\\']))
        else {
            warn!("Not discarding '{}': outside the upload directory", url);
            return;
        };

        let path = self.dir.join(file_name);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => info!("Discarded upload {}", file_name),
            Err(e) => warn!("Failed to discard upload {}: {}", path.display(), e),
        }
    }

    /// Keep the result of a store call, or discard `image_url` if it failed.
    pub async fn keep_if_ok<T, E>(&self, image_url: Option<&str>, result: Result<T, E>) -> Result<T, E> {
        if result.is_err() {
            if let Some(url) = image_url {
                self.discard(url).await;
            }
        }
        result
    }
}

/// Text fields of a multipart form plus the stored URL of its image field.
#[derive(Debug, Default)]
pub struct FormData {
    pub fields: HashMap<String, String>,
    pub image_url: Option<String>,
}

impl FormData {
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// Drain a multipart body. The field named `image_field` is saved through
/// `store`; every other field is read as text. A body that fails part way
/// leaves no image behind.
pub async fn read_form(store: &UploadStore, mut multipart: Multipart, image_field: &str) -> Result<FormData, ApiError> {
    let mut form = FormData::default();
    let drained = drain_fields(store, &mut multipart, image_field, &mut form).await;
    store.keep_if_ok(form.image_url.as_deref(), drained).await?;
    Ok(form)
}

async fn drain_fields(
    store: &UploadStore,
    multipart: &mut Multipart,
    image_field: &str,
    form: &mut FormData,
) -> Result<(), ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("Malformed form data: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == image_field {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::Validation(format!("Malformed upload: {}", e)))?;
            if let Some(url) = store.save_image(&file_name, &bytes).await? {
                // Last image wins.
                if let Some(previous) = form.image_url.replace(url) {
                    store.discard(&previous).await;
                }
            }
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| ApiError::Validation(format!("Malformed form field {}: {}", name, e)))?;
            form.fields.insert(name, value);
        }
    }
    Ok(())
}

fn is_allowed(name: &str) -> bool {
    name.rsplit_once('.')
        .map(|(_, ext)| ALLOWED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Keep only characters that are safe in a file name; strips any path.
fn sanitize(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' { c } else { '_' })
        .collect();
    cleaned.trim_start_matches('.').to_string()
}
