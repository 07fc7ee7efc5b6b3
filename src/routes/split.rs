//! Split route
//!
//! POST /api/v1/split - partition an uploaded PDF into derived documents
//! according to a selection strategy, returned as a zip archive with a
//! manifest.
//!
//! Options payloads:
//! - `{"mode": "pages", "breakpoints": [3, 7]}`
//! - `{"mode": "ranges", "ranges": [{"start": 1, "end": 5}]}`
//! - `{"mode": "stride", "size": 10}`
//! - `{"mode": "outline"}`

use axum::{
    extract::{Multipart, State},
    response::Response,
    routing::post,
    Router,
};

use super::shared::{
    collect_parts, download_response, parse_required_options, run_blocking, single_upload,
};
use crate::archive::{self, ArchiveManifest};
use crate::error::Result;
use crate::partition::{partition, select, top_level_entries, SelectionStrategy};
use crate::pdfops::PdfFile;
use crate::state::AppState;

/// Create the split router
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(split_document))
}

async fn split_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response> {
    let workspace = state.workspace()?;
    let (uploads, options) = collect_parts(&mut multipart, &workspace).await?;
    let upload = single_upload(uploads)?;
    let strategy: SelectionStrategy = parse_required_options(&options)?;

    tracing::info!(stem = %upload.stem, strategy = ?strategy, "Splitting document");

    let out_dir = workspace.dir().to_path_buf();
    let stem = upload.stem.clone();
    let input = upload.path.clone();

    let (outputs, groups) = run_blocking(move || {
        let pdf = PdfFile::open(&input)?;

        // The outline strategy needs the document's bookmark table; the
        // selector itself never reads the document.
        let outline = match strategy {
            SelectionStrategy::Outline => top_level_entries(&pdf),
            _ => Vec::new(),
        };

        let groups = select(pdf.page_count(), &strategy, &outline)?;
        let outputs = partition(&pdf, &groups, &out_dir, &stem)?;
        Ok((outputs, groups))
    })
    .await?;

    let mut manifest = ArchiveManifest::new("split");
    for (path, group) in outputs.iter().zip(&groups) {
        manifest.add_file(path, Some(group.pages().to_vec()))?;
    }

    let archive_name = format!("{}-parts.zip", upload.stem);
    let archive_path = workspace.path(&archive_name);
    archive::pack(&archive_path, &outputs, &manifest)?;

    let bytes = tokio::fs::read(&archive_path).await?;
    workspace.release();

    Ok(download_response(bytes, &archive_name))
}
