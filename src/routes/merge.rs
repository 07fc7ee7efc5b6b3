//! Merge route
//!
//! POST /api/v1/merge - concatenate two or more uploaded PDFs, pages in
//! upload order, returning the merged document.

use axum::{
    extract::{Multipart, State},
    response::Response,
    routing::post,
    Router,
};

use super::shared::{collect_parts, download_response, run_blocking};
use crate::error::{AppError, Result};
use crate::pdfops::{merge_files, PdfFile};
use crate::state::AppState;

/// Create the merge router
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(merge_documents))
}

async fn merge_documents(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response> {
    let workspace = state.workspace()?;
    let (uploads, _options) = collect_parts(&mut multipart, &workspace).await?;

    if uploads.len() < 2 {
        return Err(AppError::BadRequest(format!(
            "Merging requires at least two files, got {}",
            uploads.len()
        )));
    }

    tracing::info!(inputs = uploads.len(), "Merging documents");

    let paths: Vec<_> = uploads.iter().map(|u| u.path.clone()).collect();
    let file_name = format!("{}-merged.pdf", uploads[0].stem);

    let bytes = run_blocking(move || {
        let inputs = paths
            .iter()
            .map(PdfFile::open)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let mut merged = merge_files(&inputs)?;
        Ok(merged.to_bytes()?)
    })
    .await?;

    workspace.release();
    Ok(download_response(bytes, &file_name))
}
