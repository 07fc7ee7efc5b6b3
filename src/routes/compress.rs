//! Compress route
//!
//! POST /api/v1/compress - re-write an uploaded PDF at a reduced quality
//! preset through the PDF interpreter. Options: `{"preset": "ebook"}`
//! (screen | ebook | printer, default ebook).

use axum::{
    extract::{Multipart, State},
    response::Response,
    routing::post,
    Router,
};
use serde::Deserialize;

use super::shared::{collect_parts, download_response, parse_options, single_upload};
use crate::convert::{CompressionPreset, ConversionTarget, PlanBuilder};
use crate::error::Result;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
struct CompressOptions {
    #[serde(default)]
    preset: CompressionPreset,
}

/// Create the compress router
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(compress_document))
}

async fn compress_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response> {
    let workspace = state.workspace()?;
    let (uploads, options) = collect_parts(&mut multipart, &workspace).await?;
    let upload = single_upload(uploads)?;
    let options: CompressOptions = parse_options(&options)?;

    tracing::info!(stem = %upload.stem, preset = ?options.preset, "Compressing document");

    let availability = state.prober().probe().await;
    let target = ConversionTarget::CompressedPdf {
        preset: options.preset,
    };
    let plan = PlanBuilder::build(&target, &upload.path, workspace.dir(), &availability)?;
    let report = state.executor().execute(&plan).await?;

    let bytes = tokio::fs::read(&report.output).await?;
    let file_name = format!("{}-compressed.pdf", upload.stem);
    workspace.release();
    Ok(download_response(bytes, &file_name))
}
