//! Conversion routes
//!
//! - POST /api/v1/convert/word - PDF to docx
//! - POST /api/v1/convert/xlsx - PDF to spreadsheet,
//!   options `{"mode": "grid" | "heuristic"}`
//! - POST /api/v1/convert/image - PDF to page images,
//!   options `{"quality": "low" | "medium" | "high"}`
//!
//! Each handler probes tool availability, builds a fallback plan, and runs
//! it. Image conversion may produce one file per page; multi-page results
//! are packaged as a zip, single pages returned directly.

use std::path::PathBuf;

use axum::{
    extract::{Multipart, State},
    response::Response,
    routing::post,
    Router,
};
use serde::Deserialize;

use super::shared::{
    collect_parts, download_response, parse_options, single_upload, Upload,
};
use crate::archive::{self, ArchiveManifest};
use crate::convert::{Backend, ConversionTarget, ImageQuality, TableMode, PlanBuilder};
use crate::error::Result;
use crate::state::AppState;
use crate::workspace::Workspace;

#[derive(Debug, Default, Deserialize)]
struct XlsxOptions {
    #[serde(default)]
    mode: TableMode,
}

#[derive(Debug, Default, Deserialize)]
struct ImageOptions {
    #[serde(default)]
    quality: ImageQuality,
}

/// Create the convert router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/word", post(convert_to_word))
        .route("/xlsx", post(convert_to_xlsx))
        .route("/image", post(convert_to_image))
}

async fn convert_to_word(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response> {
    let workspace = state.workspace()?;
    let (uploads, _options) = collect_parts(&mut multipart, &workspace).await?;
    let upload = single_upload(uploads)?;

    let response =
        run_single_output(&state, &workspace, &upload, ConversionTarget::Word).await?;
    workspace.release();
    Ok(response)
}

async fn convert_to_xlsx(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response> {
    let workspace = state.workspace()?;
    let (uploads, options) = collect_parts(&mut multipart, &workspace).await?;
    let upload = single_upload(uploads)?;
    let options: XlsxOptions = parse_options(&options)?;

    let response = run_single_output(
        &state,
        &workspace,
        &upload,
        ConversionTarget::Spreadsheet { mode: options.mode },
    )
    .await?;
    workspace.release();
    Ok(response)
}

async fn convert_to_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response> {
    let workspace = state.workspace()?;
    let (uploads, options) = collect_parts(&mut multipart, &workspace).await?;
    let upload = single_upload(uploads)?;
    let options: ImageOptions = parse_options(&options)?;

    let target = ConversionTarget::Image {
        quality: options.quality,
    };
    tracing::info!(stem = %upload.stem, operation = target.operation(), "Converting document");

    let availability = state.prober().probe().await;
    let plan = PlanBuilder::build(&target, &upload.path, workspace.dir(), &availability)?;
    let report = state.executor().execute(&plan).await?;

    // Ghostscript writes one file per page; collect every page it emitted.
    let pages = if report.backend == Backend::Ghostscript {
        page_image_outputs(&workspace, &upload.stem).await?
    } else {
        vec![report.output.clone()]
    };

    if pages.len() > 1 {
        let mut manifest = ArchiveManifest::new("convert-image");
        for page in &pages {
            manifest.add_file(page, None)?;
        }
        let archive_name = format!("{}-pages.zip", upload.stem);
        let archive_path = workspace.path(&archive_name);
        archive::pack(&archive_path, &pages, &manifest)?;

        let bytes = tokio::fs::read(&archive_path).await?;
        workspace.release();
        Ok(download_response(bytes, &archive_name))
    } else {
        let bytes = tokio::fs::read(&pages[0]).await?;
        let file_name = format!("{}.png", upload.stem);
        workspace.release();
        Ok(download_response(bytes, &file_name))
    }
}

/// Probe, plan, execute, and return the single output artifact.
async fn run_single_output(
    state: &AppState,
    workspace: &Workspace,
    upload: &Upload,
    target: ConversionTarget,
) -> Result<Response> {
    tracing::info!(stem = %upload.stem, operation = target.operation(), "Converting document");

    let availability = state.prober().probe().await;
    let plan = PlanBuilder::build(&target, &upload.path, workspace.dir(), &availability)?;
    let report = state.executor().execute(&plan).await?;

    let bytes = tokio::fs::read(&report.output).await?;
    // The winning backend decides the extension (tabula emits csv where
    // camelot emits xlsx).
    let file_name = report
        .output
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| format!("{}.out", upload.stem));

    Ok(download_response(bytes, &file_name))
}

/// Page images emitted by the interpreter, in page order.
async fn page_image_outputs(workspace: &Workspace, stem: &str) -> Result<Vec<PathBuf>> {
    let prefix = format!("{}-page", stem);
    let mut pages = Vec::new();

    let mut entries = tokio::fs::read_dir(workspace.dir()).await?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with(&prefix) && name.ends_with(".png") {
            pages.push(entry.path());
        }
    }

    // %03d numbering makes lexicographic order page order.
    pages.sort();
    Ok(pages)
}
