//! Rotate route
//!
//! POST /api/v1/rotate - rotate every page of an uploaded PDF by a
//! quarter-turn multiple. Options: `{"degrees": 90}`.

use axum::{
    extract::{Multipart, State},
    response::Response,
    routing::post,
    Router,
};
use serde::Deserialize;

use super::shared::{
    collect_parts, download_response, parse_required_options, run_blocking, single_upload,
};
use crate::error::Result;
use crate::pdfops::{rotate_all_pages, PdfFile};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct RotateOptions {
    degrees: i32,
}

/// Create the rotate router
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(rotate_document))
}

async fn rotate_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response> {
    let workspace = state.workspace()?;
    let (uploads, options) = collect_parts(&mut multipart, &workspace).await?;
    let upload = single_upload(uploads)?;
    let options: RotateOptions = parse_required_options(&options)?;

    tracing::info!(stem = %upload.stem, degrees = options.degrees, "Rotating document");

    let input = upload.path.clone();
    let bytes = run_blocking(move || {
        let mut pdf = PdfFile::open(&input)?;
        rotate_all_pages(&mut pdf, options.degrees)?;
        Ok(pdf.to_bytes()?)
    })
    .await?;

    let file_name = format!("{}-rotated.pdf", upload.stem);
    workspace.release();
    Ok(download_response(bytes, &file_name))
}
