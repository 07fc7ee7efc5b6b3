//! Outline (bookmark) extraction
//!
//! Walks the top level of the document's /Outlines tree and resolves each
//! entry's destination to a 1-based page number. Extraction is best-effort:
//! a missing or malformed outline yields an empty list, which the selector
//! degrades to a single whole-document group. It never fails the request.

use std::collections::HashMap;

use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::pdfops::PdfFile;

/// One top-level outline entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineEntry {
    pub title: String,
    /// 1-based target page.
    pub page: u32,
}

/// Upper bound on sibling traversal, guarding against cyclic /Next chains
/// in corrupt documents.
const MAX_ENTRIES: usize = 10_000;

/// Extract the document's top-level outline entries.
pub fn top_level_entries(file: &PdfFile) -> Vec<OutlineEntry> {
    let doc = file.document();

    // Invert the page map so destinations resolve to page numbers.
    let page_numbers: HashMap<ObjectId, u32> = doc
        .get_pages()
        .into_iter()
        .map(|(number, id)| (id, number))
        .collect();

    let Some(first_id) = first_outline_item(doc) else {
        return Vec::new();
    };

    let mut entries = Vec::new();
    let mut current = Some(first_id);
    while let Some(item_id) = current {
        if entries.len() >= MAX_ENTRIES {
            tracing::warn!("Outline sibling chain exceeds limit, truncating");
            break;
        }

        let Ok(item) = doc.get_dictionary(item_id) else {
            break;
        };

        if let Some(page) = resolve_target_page(doc, item, &page_numbers) {
            entries.push(OutlineEntry {
                title: item_title(item),
                page,
            });
        } else {
            tracing::debug!(item = ?item_id, "Outline entry without resolvable page target, skipping");
        }

        current = item
            .get(b"Next")
            .ok()
            .and_then(|obj| obj.as_reference().ok());
    }

    entries
}

/// Locate the first item of the top-level outline chain.
fn first_outline_item(doc: &Document) -> Option<ObjectId> {
    let catalog = doc.catalog().ok()?;
    let outlines_id = catalog.get(b"Outlines").ok()?.as_reference().ok()?;
    let outlines = doc.get_dictionary(outlines_id).ok()?;
    outlines.get(b"First").ok()?.as_reference().ok()
}

/// Resolve an outline item's destination to a page number.
///
/// Handles direct /Dest arrays and /A GoTo actions. Named destinations are
/// skipped; resolving the name tree is not worth the complexity for page
/// partitioning.
fn resolve_target_page(
    doc: &Document,
    item: &Dictionary,
    page_numbers: &HashMap<ObjectId, u32>,
) -> Option<u32> {
    let dest = if let Ok(dest) = item.get(b"Dest") {
        deref(doc, dest)?
    } else {
        let action = deref(doc, item.get(b"A").ok()?)?;
        let action = action.as_dict().ok()?;
        let is_goto = action
            .get(b"S")
            .ok()
            .and_then(|s| s.as_name().ok())
            .map(|name| name == b"GoTo")
            .unwrap_or(false);
        if !is_goto {
            return None;
        }
        deref(doc, action.get(b"D").ok()?)?
    };

    let array = dest.as_array().ok()?;
    let page_id = array.first()?.as_reference().ok()?;
    page_numbers.get(&page_id).copied()
}

/// Follow a reference one level; pass through direct objects.
fn deref<'a>(doc: &'a Document, object: &'a Object) -> Option<&'a Object> {
    match object {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

/// Decode an outline title, handling the UTF-16BE strings PDF producers
/// commonly emit.
fn item_title(item: &Dictionary) -> String {
    let Ok(Object::String(bytes, _)) = item.get(b"Title") else {
        return String::new();
    };

    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        String::from_utf8_lossy(bytes).into_owned()
    }
}
