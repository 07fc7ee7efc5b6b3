//! Low-level PDF page-tree operations
//!
//! Wraps `lopdf` behind a small seam used by the partitioner and the
//! merge/rotate routes:
//!
//! - `doc`: load a document, count pages, copy selected pages into a new
//!   document, save
//! - `merge`: concatenate documents
//! - `rotate`: rewrite the /Rotate attribute of every page
//!
//! Page content is opaque here; objects are cloned wholesale. Nothing in
//! this module inspects text or graphics streams.

pub(crate) mod doc;
mod merge;
mod rotate;

pub use doc::PdfFile;
pub use merge::merge_files;
pub use rotate::rotate_all_pages;

use thiserror::Error;

/// Errors from PDF page-tree manipulation
#[derive(Debug, Error)]
pub enum PdfOpError {
    /// Input bytes are not a readable PDF
    #[error("Failed to parse PDF: {0}")]
    Parse(String),

    /// A referenced page does not exist
    #[error("Page {page} out of range (document has {total} pages)")]
    PageOutOfRange { page: u32, total: u32 },

    /// Rotation angle is not a quarter-turn multiple
    #[error("Invalid rotation {0}: must be a multiple of 90")]
    InvalidRotation(i32),

    /// The page tree is missing required structure
    #[error("Malformed page tree: {0}")]
    PageTree(String),

    /// Serialisation failed
    #[error("Failed to write PDF: {0}")]
    Write(String),
}

/// Result type alias for PDF operations
pub type Result<T> = std::result::Result<T, PdfOpError>;
