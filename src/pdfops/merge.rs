//! PDF concatenation
//!
//! Builds one output document from several inputs by cloning every page,
//! in input order, into a fresh page tree.

use lopdf::{dictionary, Document, Object, ObjectId};

use super::doc::ObjectCloner;
use super::{PdfFile, PdfOpError, Result};

/// Merge documents into one, pages ordered: all of the first input, then
/// all of the second, and so on.
pub fn merge_files(inputs: &[PdfFile]) -> Result<PdfFile> {
    if inputs.is_empty() {
        return Err(PdfOpError::PageTree("no documents to merge".to_string()));
    }

    let mut target = Document::with_version("1.5");
    let pages_node_id = target.new_object_id();
    let mut cloned_ids: Vec<ObjectId> = Vec::new();

    for input in inputs {
        let pages = input.document().get_pages();
        let mut page_numbers: Vec<u32> = pages.keys().copied().collect();
        page_numbers.sort_unstable();

        // One cloner per input: memo tables must not mix documents.
        let mut cloner = ObjectCloner::new(input.document(), &mut target);
        for page_num in page_numbers {
            cloned_ids.push(cloner.clone_ref(pages[&page_num])?);
        }
    }

    for &cloned_id in &cloned_ids {
        if let Ok(Object::Dictionary(page_dict)) = target.get_object_mut(cloned_id) {
            page_dict.set("Parent", Object::Reference(pages_node_id));
        }
    }

    let kids: Vec<Object> = cloned_ids
        .iter()
        .map(|&id| Object::Reference(id))
        .collect();
    let count = kids.len() as i64;
    target.objects.insert(
        pages_node_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );

    let catalog_id = target.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_node_id,
    });
    target.trailer.set("Root", catalog_id);
    target.compress();

    tracing::info!(
        inputs = inputs.len(),
        pages = count,
        "Merged documents"
    );

    Ok(PdfFile::from_document(target))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdfops::doc::tests::{page_markers, sample_pdf};

    #[test]
    fn merge_concatenates_in_input_order() {
        let a = sample_pdf(2);
        let b = sample_pdf(3);

        let mut merged = merge_files(&[a, b]).unwrap();
        assert_eq!(merged.page_count(), 5);
        assert_eq!(
            page_markers(&mut merged),
            vec!["page 1", "page 2", "page 1", "page 2", "page 3"]
        );
    }

    #[test]
    fn merge_single_input_is_a_copy() {
        let a = sample_pdf(4);
        let merged = merge_files(&[a]).unwrap();
        assert_eq!(merged.page_count(), 4);
    }

    #[test]
    fn merge_rejects_empty_input() {
        let err = merge_files(&[]).unwrap_err();
        assert!(matches!(err, PdfOpError::PageTree(_)));
    }
}
