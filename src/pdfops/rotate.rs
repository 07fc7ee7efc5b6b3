//! Page rotation
//!
//! Rewrites the /Rotate attribute of every page. The existing per-page
//! rotation is read from the page dictionary (default 0) and the requested
//! angle is added modulo 360, so rotating an already-rotated document
//! composes rather than overwrites.

use lopdf::Object;

use super::{PdfFile, PdfOpError, Result};

/// Rotate every page of the document by `degrees` (a multiple of 90).
pub fn rotate_all_pages(file: &mut PdfFile, degrees: i32) -> Result<()> {
    if degrees % 90 != 0 {
        return Err(PdfOpError::InvalidRotation(degrees));
    }

    let page_ids: Vec<_> = file.document().get_pages().values().copied().collect();
    let doc = file.document_mut();

    for page_id in page_ids {
        let existing = match doc.get_object(page_id) {
            Ok(Object::Dictionary(dict)) => dict
                .get(b"Rotate")
                .ok()
                .and_then(|r| r.as_i64().ok())
                .map(|v| v as i32)
                .unwrap_or(0),
            _ => 0,
        };

        let rotation = (existing + degrees).rem_euclid(360);
        if let Ok(Object::Dictionary(dict)) = doc.get_object_mut(page_id) {
            dict.set("Rotate", Object::Integer(rotation as i64));
        }
    }

    tracing::debug!(degrees, "Rotated all pages");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdfops::doc::tests::sample_pdf;

    fn rotations(file: &PdfFile) -> Vec<i64> {
        let doc = file.document();
        doc.get_pages()
            .values()
            .map(|&id| match doc.get_object(id) {
                Ok(Object::Dictionary(dict)) => dict
                    .get(b"Rotate")
                    .ok()
                    .and_then(|r| r.as_i64().ok())
                    .unwrap_or(0),
                _ => 0,
            })
            .collect()
    }

    #[test]
    fn rotate_sets_all_pages() {
        let mut file = sample_pdf(3);
        rotate_all_pages(&mut file, 90).unwrap();
        assert_eq!(rotations(&file), vec![90, 90, 90]);
    }

    #[test]
    fn rotate_composes_with_existing_rotation() {
        let mut file = sample_pdf(1);
        rotate_all_pages(&mut file, 270).unwrap();
        rotate_all_pages(&mut file, 180).unwrap();
        assert_eq!(rotations(&file), vec![90]);
    }

    #[test]
    fn rotate_rejects_non_quarter_turns() {
        let mut file = sample_pdf(1);
        let err = rotate_all_pages(&mut file, 45).unwrap_err();
        assert!(matches!(err, PdfOpError::InvalidRotation(45)));
    }

    #[test]
    fn negative_rotation_normalises() {
        let mut file = sample_pdf(1);
        rotate_all_pages(&mut file, -90).unwrap();
        assert_eq!(rotations(&file), vec![270]);
    }
}
