//! Helpers shared by the transformation routes
//!
//! Every operation accepts a multipart body with one or more `file` parts
//! and an optional `options` part carrying a JSON payload. Uploads are
//! written into the request workspace so they are cleaned up with
//! everything else.

use std::path::PathBuf;

use axum::extract::Multipart;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use serde::de::DeserializeOwned;

use crate::error::{AppError, Result};
use crate::workspace::Workspace;

/// One uploaded file, saved into the workspace.
pub struct Upload {
    pub path: PathBuf,
    /// Sanitised stem of the original filename, used to name outputs.
    pub stem: String,
}

/// Drain a multipart body: save every `file` part into the workspace and
/// capture the `options` part's text, if present.
pub async fn collect_parts(
    multipart: &mut Multipart,
    workspace: &Workspace,
) -> Result<(Vec<Upload>, Option<String>)> {
    let mut uploads = Vec::new();
    let mut options = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(|n| n.to_string());
        match name.as_deref() {
            Some("file") | Some("files") => {
                let stem = sanitise_stem(field.file_name());
                let data = field.bytes().await?;
                if data.is_empty() {
                    return Err(AppError::BadRequest("Uploaded file is empty".to_string()));
                }

                // Suffix duplicated stems so uploads never overwrite each
                // other inside one request.
                let unique_stem = if uploads
                    .iter()
                    .any(|u: &Upload| u.stem == stem)
                {
                    format!("{}-{}", stem, uploads.len() + 1)
                } else {
                    stem
                };

                let path = workspace.path(&format!("{}.pdf", unique_stem));
                tokio::fs::write(&path, &data).await?;
                tracing::debug!(
                    path = %path.display(),
                    bytes = data.len(),
                    "Saved uploaded file"
                );
                uploads.push(Upload {
                    path,
                    stem: unique_stem,
                });
            }
            Some("options") => {
                options = Some(field.text().await?);
            }
            other => {
                tracing::debug!(field = ?other, "Ignoring unknown multipart field");
            }
        }
    }

    if uploads.is_empty() {
        return Err(AppError::BadRequest(
            "Request contains no file upload".to_string(),
        ));
    }

    Ok((uploads, options))
}

/// Expect exactly one uploaded file.
pub fn single_upload(mut uploads: Vec<Upload>) -> Result<Upload> {
    if uploads.len() != 1 {
        return Err(AppError::BadRequest(format!(
            "Expected exactly one file, got {}",
            uploads.len()
        )));
    }
    Ok(uploads.remove(0))
}

/// Parse the options payload, defaulting when the part is absent.
pub fn parse_options<T>(raw: &Option<String>) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    match raw {
        Some(text) => serde_json::from_str(text)
            .map_err(|e| AppError::BadRequest(format!("Invalid options payload: {}", e))),
        None => Ok(T::default()),
    }
}

/// Parse the options payload; the part must be present.
pub fn parse_required_options<T>(raw: &Option<String>) -> Result<T>
where
    T: DeserializeOwned,
{
    let text = raw
        .as_deref()
        .ok_or_else(|| AppError::BadRequest("Missing options payload".to_string()))?;
    serde_json::from_str(text)
        .map_err(|e| AppError::BadRequest(format!("Invalid options payload: {}", e)))
}

/// Binary download response with content type guessed from the filename.
pub fn download_response(bytes: Vec<u8>, file_name: &str) -> Response {
    let content_type = mime_guess::from_path(file_name)
        .first_or_octet_stream()
        .to_string();

    (
        [
            (header::CONTENT_TYPE, content_type),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        bytes,
    )
        .into_response()
}

/// Reduce an uploaded filename to a safe output stem.
fn sanitise_stem(file_name: Option<&str>) -> String {
    let stem = file_name
        .map(PathBuf::from)
        .and_then(|p| p.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .unwrap_or_default();

    let cleaned: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() || cleaned.chars().all(|c| c == '_') {
        "document".to_string()
    } else {
        cleaned
    }
}

/// Run CPU-bound PDF work off the async executor.
pub async fn run_blocking<T, F>(work: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| AppError::Internal(format!("Task join error: {}", e)))?
}
