//! Document partitioner
//!
//! Materialises one derived PDF per page group, in group order. The first
//! group that fails aborts the whole operation; derived documents already
//! written are left in place for the caller's cleanup policy (the HTTP
//! layer points this at a request workspace, so failed requests still
//! clean up).

use std::path::{Path, PathBuf};

use thiserror::Error;

use super::selector::PageGroup;
use crate::pdfops::{PdfFile, PdfOpError};

/// Partition failure, pointing at the group that could not be written
#[derive(Debug, Error)]
pub enum PartitionError {
    #[error("Failed to materialise group {index}: {source}")]
    Group {
        /// Zero-based index into the group sequence.
        index: usize,
        #[source]
        source: PdfOpError,
    },
}

/// Copy each group's pages into a derived document under `out_dir`.
///
/// Output files are named `{stem}-part{NNN}.pdf`, numbered from 1 in group
/// order. Returns the derived paths in the same order as `groups`.
pub fn partition(
    source: &PdfFile,
    groups: &[PageGroup],
    out_dir: &Path,
    stem: &str,
) -> Result<Vec<PathBuf>, PartitionError> {
    let mut outputs = Vec::with_capacity(groups.len());

    for (index, group) in groups.iter().enumerate() {
        let out_path = out_dir.join(format!("{}-part{:03}.pdf", stem, index + 1));

        let mut derived = source
            .copy_pages(group.pages())
            .map_err(|source| PartitionError::Group { index, source })?;
        derived
            .save(&out_path)
            .map_err(|source| PartitionError::Group { index, source })?;

        tracing::debug!(
            index,
            pages = group.len(),
            first = group.first(),
            last = group.last(),
            output = %out_path.display(),
            "Wrote partition group"
        );
        outputs.push(out_path);
    }

    tracing::info!(groups = groups.len(), "Partition complete");
    Ok(outputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition::selector::{select, SelectionStrategy};
    use crate::pdfops::doc::tests::{page_markers, sample_pdf};

    #[test]
    fn stride_partition_reproduces_page_order() {
        let source = sample_pdf(10);
        let groups = select(10, &SelectionStrategy::Stride { size: 3 }, &[]).unwrap();
        let dir = tempfile::tempdir().unwrap();

        let outputs = partition(&source, &groups, dir.path(), "doc").unwrap();
        assert_eq!(outputs.len(), 4);

        let mut counts = Vec::new();
        let mut all_markers = Vec::new();
        for path in &outputs {
            let mut part = PdfFile::open(path).unwrap();
            counts.push(part.page_count());
            all_markers.extend(page_markers(&mut part));
        }

        assert_eq!(counts, vec![3, 3, 3, 1]);
        let expected: Vec<String> = (1..=10).map(|n| format!("page {}", n)).collect();
        assert_eq!(all_markers, expected);
    }

    #[test]
    fn outputs_are_numbered_in_group_order() {
        let source = sample_pdf(4);
        let groups = select(4, &SelectionStrategy::Stride { size: 2 }, &[]).unwrap();
        let dir = tempfile::tempdir().unwrap();

        let outputs = partition(&source, &groups, dir.path(), "report").unwrap();
        let names: Vec<String> = outputs
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["report-part001.pdf", "report-part002.pdf"]);
    }

    #[test]
    fn failing_group_reports_index_and_keeps_earlier_outputs() {
        use crate::partition::selector::PageRange;

        let source = sample_pdf(3);
        // Build groups against a larger fictional document so the second
        // group references a page the source does not have.
        let groups = select(
            5,
            &SelectionStrategy::Ranges {
                ranges: vec![PageRange { start: 1, end: 2 }, PageRange { start: 4, end: 5 }],
            },
            &[],
        )
        .unwrap();
        let dir = tempfile::tempdir().unwrap();

        let err = partition(&source, &groups, dir.path(), "doc").unwrap_err();
        let PartitionError::Group { index, .. } = err;
        assert_eq!(index, 1);

        // The first group's output is not rolled back.
        assert!(dir.path().join("doc-part001.pdf").exists());
        assert!(!dir.path().join("doc-part002.pdf").exists());
    }
}
