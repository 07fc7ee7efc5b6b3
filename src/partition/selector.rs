//! Page selection strategies
//!
//! Maps a (total page count, strategy) pair to an ordered sequence of
//! [`PageGroup`]s, each group describing one output document. Selection is
//! pure and deterministic: identical inputs always produce identical
//! group sequences.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::outline::OutlineEntry;

/// Ordered, non-empty sequence of 1-based page indices for one output
/// document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageGroup(Vec<u32>);

impl PageGroup {
    fn from_range(start: u32, end: u32) -> Self {
        debug_assert!(start >= 1 && start <= end);
        Self((start..=end).collect())
    }

    /// The page indices in emission order.
    pub fn pages(&self) -> &[u32] {
        &self.0
    }

    /// First page of the group.
    pub fn first(&self) -> u32 {
        self.0[0]
    }

    /// Last page of the group.
    pub fn last(&self) -> u32 {
        self.0[self.0.len() - 1]
    }

    /// Number of pages in the group.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Inclusive 1-based page range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRange {
    pub start: u32,
    pub end: u32,
}

/// How to partition a document into page groups.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum SelectionStrategy {
    /// Split immediately after each breakpoint page, with an implicit final
    /// boundary at the document end.
    Pages { breakpoints: Vec<u32> },
    /// One group per supplied range, in input order. Overlapping and
    /// out-of-order ranges are permitted.
    Ranges { ranges: Vec<PageRange> },
    /// Groups of exactly `size` consecutive pages; the last group may be
    /// shorter.
    Stride { size: u32 },
    /// One group per top-level outline entry. The entries are extracted
    /// from the document by the caller and passed to [`select`].
    Outline,
}

/// Invalid selection parameters (the caller's fault, HTTP 400)
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("Document has no pages")]
    EmptyDocument,

    #[error("Page {page} out of range [1, {total}]")]
    PageOutOfBounds { page: u32, total: u32 },

    #[error("Invalid range {start}-{end}: start must not exceed end")]
    InvalidRange { start: u32, end: u32 },

    #[error("Range {start}-{end} exceeds document bounds [1, {total}]")]
    RangeOutOfBounds { start: u32, end: u32, total: u32 },

    #[error("Stride must be at least 1")]
    ZeroStride,
}

/// Compute the ordered page groups for a strategy.
///
/// `outline` is the document's top-level outline table; it is only
/// consulted by [`SelectionStrategy::Outline`] and may be empty otherwise.
pub fn select(
    total_pages: u32,
    strategy: &SelectionStrategy,
    outline: &[OutlineEntry],
) -> Result<Vec<PageGroup>, SelectionError> {
    if total_pages == 0 {
        return Err(SelectionError::EmptyDocument);
    }

    match strategy {
        SelectionStrategy::Pages { breakpoints } => select_breakpoints(total_pages, breakpoints),
        SelectionStrategy::Ranges { ranges } => select_ranges(total_pages, ranges),
        SelectionStrategy::Stride { size } => select_stride(total_pages, *size),
        SelectionStrategy::Outline => Ok(select_outline(total_pages, outline)),
    }
}

fn select_breakpoints(total: u32, breakpoints: &[u32]) -> Result<Vec<PageGroup>, SelectionError> {
    for &page in breakpoints {
        if page < 1 || page > total {
            return Err(SelectionError::PageOutOfBounds { page, total });
        }
    }

    let mut sorted: Vec<u32> = breakpoints.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let mut groups = Vec::with_capacity(sorted.len() + 1);
    let mut previous = 0u32;
    for breakpoint in sorted {
        groups.push(PageGroup::from_range(previous + 1, breakpoint));
        previous = breakpoint;
    }
    // Trailing run up to the document end, unless the last breakpoint
    // already was the final page.
    if previous < total {
        groups.push(PageGroup::from_range(previous + 1, total));
    }

    Ok(groups)
}

fn select_ranges(total: u32, ranges: &[PageRange]) -> Result<Vec<PageGroup>, SelectionError> {
    let mut groups = Vec::with_capacity(ranges.len());
    for range in ranges {
        if range.start > range.end {
            return Err(SelectionError::InvalidRange {
                start: range.start,
                end: range.end,
            });
        }
        if range.start < 1 || range.end > total {
            return Err(SelectionError::RangeOutOfBounds {
                start: range.start,
                end: range.end,
                total,
            });
        }
        groups.push(PageGroup::from_range(range.start, range.end));
    }
    Ok(groups)
}

fn select_stride(total: u32, size: u32) -> Result<Vec<PageGroup>, SelectionError> {
    if size < 1 {
        return Err(SelectionError::ZeroStride);
    }

    let mut groups = Vec::with_capacity(total.div_ceil(size) as usize);
    let mut start = 1u32;
    while start <= total {
        let end = (start + size - 1).min(total);
        groups.push(PageGroup::from_range(start, end));
        start = end + 1;
    }
    Ok(groups)
}

fn select_outline(total: u32, outline: &[OutlineEntry]) -> Vec<PageGroup> {
    // Out-of-range targets come from the document, not the caller, so they
    // are dropped rather than rejected. Sort and dedup by target page for
    // deterministic output regardless of outline order.
    let mut targets: Vec<u32> = outline
        .iter()
        .map(|entry| entry.page)
        .filter(|&page| page >= 1 && page <= total)
        .collect();
    targets.sort_unstable();
    targets.dedup();

    // No usable entries: the whole document as a single group.
    if targets.is_empty() {
        return vec![PageGroup::from_range(1, total)];
    }

    let mut groups = Vec::with_capacity(targets.len());
    for (i, &start) in targets.iter().enumerate() {
        let end = match targets.get(i + 1) {
            Some(&next) => next - 1,
            None => total,
        };
        groups.push(PageGroup::from_range(start, end));
    }
    groups
}
