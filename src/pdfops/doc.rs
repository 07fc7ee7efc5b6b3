//! Document seam over `lopdf`
//!
//! [`PdfFile`] is the only type the rest of the server uses to touch PDF
//! bytes: load, count pages, copy pages into a new document, save. Copying
//! deep-clones the page objects and everything they transitively reference,
//! with a per-copy memo table so shared resources (fonts, images) are
//! cloned once and reference cycles (annotation back-references) terminate.

use std::collections::HashMap;
use std::path::Path;

use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

use super::{PdfOpError, Result};

/// A loaded PDF document.
#[derive(Debug)]
pub struct PdfFile {
    document: Document,
}

impl PdfFile {
    /// Open a PDF from the filesystem.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let document = Document::load(path)
            .map_err(|e| PdfOpError::Parse(format!("{}: {}", path.display(), e)))?;

        tracing::debug!(
            path = %path.display(),
            pages = document.get_pages().len(),
            "PDF loaded"
        );

        Ok(Self { document })
    }

    /// Load a PDF from bytes already in memory.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let document =
            Document::load_mem(data).map_err(|e| PdfOpError::Parse(e.to_string()))?;
        Ok(Self { document })
    }

    /// Number of pages in the document.
    pub fn page_count(&self) -> u32 {
        self.document.get_pages().len() as u32
    }

    /// Borrow the underlying `lopdf` document.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Mutable access to the underlying `lopdf` document.
    pub(crate) fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    /// Wrap an already-built `lopdf` document.
    pub(crate) fn from_document(document: Document) -> Self {
        Self { document }
    }

    /// Copy the given pages (1-indexed, in the order listed) into a fresh
    /// standalone document.
    ///
    /// Duplicate page numbers are permitted and produce duplicate pages.
    pub fn copy_pages(&self, page_numbers: &[u32]) -> Result<PdfFile> {
        let pages = self.document.get_pages();
        let total = pages.len() as u32;

        let mut target = Document::with_version("1.5");
        let pages_node_id = target.new_object_id();

        let mut cloned_ids: Vec<ObjectId> = Vec::with_capacity(page_numbers.len());
        {
            let mut cloner = ObjectCloner::new(&self.document, &mut target);
            for &page_num in page_numbers {
                let page_id = *pages.get(&page_num).ok_or(PdfOpError::PageOutOfRange {
                    page: page_num,
                    total,
                })?;
                cloned_ids.push(cloner.clone_ref(page_id)?);
            }
        }

        // The source /Parent was skipped during cloning; point the copies at
        // the new page tree root.
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

        Ok(PdfFile { document: target })
    }

    /// Serialise the document to a file.
    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.document
            .save(path)
            .map_err(|e| PdfOpError::Write(format!("{}: {}", path.display(), e)))?;
        Ok(())
    }

    /// Serialise the document to bytes.
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        self.document
            .save_to(&mut output)
            .map_err(|e| PdfOpError::Write(e.to_string()))?;
        Ok(output)
    }
}

/// Deep-clones objects from one document into another.
///
/// Keeps a source-id to target-id memo so every source object is cloned at
/// most once per target document. The memo also terminates reference cycles:
/// a reference that is mid-clone resolves to its already-reserved target id.
pub(crate) struct ObjectCloner<'a> {
    source: &'a Document,
    target: &'a mut Document,
    cloned: HashMap<ObjectId, ObjectId>,
}

impl<'a> ObjectCloner<'a> {
    pub(crate) fn new(source: &'a Document, target: &'a mut Document) -> Self {
        Self {
            source,
            target,
            cloned: HashMap::new(),
        }
    }

    /// Clone the object behind `source_id` into the target document,
    /// returning its id there.
    pub(crate) fn clone_ref(&mut self, source_id: ObjectId) -> Result<ObjectId> {
        if let Some(&target_id) = self.cloned.get(&source_id) {
            return Ok(target_id);
        }

        // Reserve the target id before descending so cycles resolve to it.
        let target_id = self.target.new_object_id();
        self.cloned.insert(source_id, target_id);

        let object = self.source.get_object(source_id).map_err(|e| {
            PdfOpError::PageTree(format!("cannot read object {:?}: {}", source_id, e))
        })?;
        // Clone the value before recursing; `object` borrows the source map.
        let object = object.clone();
        let cloned = self.clone_object(&object)?;
        self.target.objects.insert(target_id, cloned);

        Ok(target_id)
    }

    fn clone_object(&mut self, object: &Object) -> Result<Object> {
        match object {
            Object::Dictionary(dict) => Ok(Object::Dictionary(self.clone_dict(dict)?)),
            Object::Array(items) => {
                let mut cloned = Vec::with_capacity(items.len());
                for item in items {
                    cloned.push(self.clone_object(item)?);
                }
                Ok(Object::Array(cloned))
            }
            Object::Reference(id) => match self.source.get_object(*id) {
                Ok(_) => Ok(Object::Reference(self.clone_ref(*id)?)),
                Err(e) => {
                    // Dangling references exist in the wild; null them out
                    // rather than failing the whole copy.
                    tracing::warn!(id = ?id, error = %e, "Unresolvable reference, replacing with null");
                    Ok(Object::Null)
                }
            },
            Object::Stream(stream) => {
                let dict = self.clone_dict(&stream.dict)?;
                Ok(Object::Stream(Stream::new(dict, stream.content.clone())))
            }
            other => Ok(other.clone()),
        }
    }

    fn clone_dict(&mut self, dict: &Dictionary) -> Result<Dictionary> {
        let mut cloned = Dictionary::new();
        for (key, value) in dict.iter() {
            // /Parent points back into the source page tree; the caller
            // re-parents copied pages onto the target tree.
            if key == b"Parent" {
                continue;
            }
            cloned.set(key.clone(), self.clone_object(value)?);
        }
        Ok(cloned)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};

    /// Build a minimal n-page document where page k draws the text "page k".
    ///
    /// All pages share one font resource, which exercises the cloner's memo.
    pub(crate) fn sample_pdf(page_count: u32) -> PdfFile {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for page_num in 1..=page_count {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                    Operation::new(
                        "Tj",
                        vec![Object::string_literal(format!("page {}", page_num))],
                    ),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id = doc.add_object(Stream::new(
                dictionary! {},
                content.encode().unwrap(),
            ));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        PdfFile { document: doc }
    }

    /// Extract the "page k" markers from a document, in page order.
    pub(crate) fn page_markers(file: &mut PdfFile) -> Vec<String> {
        let bytes = file.to_bytes().unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        let mut markers = Vec::new();
        for page_num in 1..=doc.get_pages().len() as u32 {
            let text = doc.extract_text(&[page_num]).unwrap_or_default();
            markers.push(text.trim().to_string());
        }
        markers
    }

    #[test]
    fn sample_pdf_round_trips() {
        let mut file = sample_pdf(3);
        assert_eq!(file.page_count(), 3);

        let bytes = file.to_bytes().unwrap();
        let reloaded = PdfFile::from_bytes(&bytes).unwrap();
        assert_eq!(reloaded.page_count(), 3);
    }

    #[test]
    fn copy_pages_preserves_listed_order() {
        let file = sample_pdf(5);
        let mut copied = file.copy_pages(&[4, 5]).unwrap();

        assert_eq!(copied.page_count(), 2);
        assert_eq!(page_markers(&mut copied), vec!["page 4", "page 5"]);
    }

    #[test]
    fn copy_pages_rejects_out_of_range() {
        let file = sample_pdf(2);
        let err = file.copy_pages(&[3]).unwrap_err();
        assert!(matches!(
            err,
            PdfOpError::PageOutOfRange { page: 3, total: 2 }
        ));
    }

    #[test]
    fn copy_pages_allows_duplicates() {
        let file = sample_pdf(2);
        let copied = file.copy_pages(&[1, 1, 2]).unwrap();
        assert_eq!(copied.page_count(), 3);
    }

    #[test]
    fn from_bytes_rejects_garbage() {
        let err = PdfFile::from_bytes(b"not a pdf").unwrap_err();
        assert!(matches!(err, PdfOpError::Parse(_)));
    }
}
