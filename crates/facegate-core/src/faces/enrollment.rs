use tracing::debug;

use crate::errors::{AppError, AppResult};
use crate::faces::embedding::encode_embedding;
use crate::faces::extractor::{EmbeddingBackend, EmbeddingExtractor};
use crate::faces::store::IdentityStore;

#[derive(Debug)]
pub struct EnrollmentOutcome {
    pub id: String,
    pub display_name: String,
    pub logs: Vec<String>,
}

pub fn validate_display_name(display_name: &str) -> AppResult<()> {
    if display_name.trim().is_empty() {
        return Err(AppError::InvalidDisplayName {
            name: display_name.to_string(),
            message: "display name cannot be empty".into(),
        });
    }
    Ok(())
}

/// The conflict check runs before extraction, so re-enrolling a taken name
/// reports `DisplayNameConflict` even when the image holds no usable face.
/// The store re-checks under its own guard at insert time.
pub fn run_enrollment_with<S, B>(
    display_name: &str,
    image_bytes: &[u8],
    store: &S,
    extractor: &EmbeddingExtractor<B>,
) -> AppResult<EnrollmentOutcome>
where
    S: IdentityStore + ?Sized,
    B: EmbeddingBackend,
{
    validate_display_name(display_name)?;

    if store.find_by_name(display_name)?.is_some() {
        return Err(AppError::DisplayNameConflict {
            name: display_name.to_string(),
        });
    }

    let mut logs = Vec::new();
    let embedding = extractor.extract(image_bytes)?;
    logs.push(format!(
        "Extracted embedding with {} components",
        embedding.as_slice().len()
    ));

    let encoding = encode_embedding(&embedding)?;
    let record = store.insert(display_name, &encoding)?;
    debug!(identity = %record.display_name, id = %record.id, "enrolled identity");
    logs.push(format!(
        "Enrolled '{}' with id {}",
        record.display_name, record.id
    ));

    Ok(EnrollmentOutcome {
        id: record.id,
        display_name: record.display_name,
        logs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::faces::embedding::{decode_embedding, EMBEDDING_DIM};
    use crate::faces::store::IdentityRecord;
    use image::{Rgb, RgbImage};
    use std::cell::RefCell;
    use std::io::Cursor;

    struct InMemoryStore {
        records: RefCell<Vec<IdentityRecord>>,
    }

    impl InMemoryStore {
        fn new() -> Self {
            Self {
                records: RefCell::new(Vec::new()),
            }
        }
    }

    impl IdentityStore for InMemoryStore {
        fn insert(&self, display_name: &str, encoding: &str) -> AppResult<IdentityRecord> {
            let mut records = self.records.borrow_mut();
            if records.iter().any(|r| r.display_name == display_name) {
                return Err(AppError::DisplayNameConflict {
                    name: display_name.to_string(),
                });
            }
            let record = IdentityRecord {
                id: format!("mem-{}", records.len() + 1),
                display_name: display_name.to_string(),
                encoding: encoding.to_string(),
                created_at: "2025-01-01T00:00:00.000Z".to_string(),
            };
            records.push(record.clone());
            Ok(record)
        }

        fn find_by_name(&self, display_name: &str) -> AppResult<Option<IdentityRecord>> {
            Ok(self
                .records
                .borrow()
                .iter()
                .find(|r| r.display_name == display_name)
                .cloned())
        }

        fn find_by_id(&self, id: &str) -> AppResult<Option<IdentityRecord>> {
            Ok(self.records.borrow().iter().find(|r| r.id == id).cloned())
        }

        fn list_all(&self) -> AppResult<Vec<IdentityRecord>> {
            Ok(self.records.borrow().clone())
        }
    }

    struct StubBackend {
        faces: Vec<Vec<f64>>,
    }

    impl EmbeddingBackend for StubBackend {
        fn extract(&self, _image: &RgbImage, _num_jitters: u32) -> AppResult<Vec<Vec<f64>>> {
            Ok(self.faces.clone())
        }
    }

    fn png_bytes() -> Vec<u8> {
        let rgb = RgbImage::from_pixel(2, 2, Rgb([1, 2, 3]));
        let mut bytes = Vec::new();
        rgb.write_to(
            &mut Cursor::new(&mut bytes),
            image::ImageOutputFormat::Png,
        )
        .unwrap();
        bytes
    }

    fn face(seed: f64) -> Vec<f64> {
        let mut values = vec![0.0; EMBEDDING_DIM];
        values[0] = seed;
        values
    }

    fn stub_extractor(faces: Vec<Vec<f64>>) -> EmbeddingExtractor<StubBackend> {
        EmbeddingExtractor::new(move || Ok(StubBackend { faces: faces.clone() }), 1)
    }

    fn unreachable_extractor() -> EmbeddingExtractor<StubBackend> {
        EmbeddingExtractor::new(|| panic!("extraction should not run"), 1)
    }

    #[test]
    fn enrollment_persists_record_and_returns_id_and_name() {
        let store = InMemoryStore::new();
        let extractor = stub_extractor(vec![face(0.5)]);

        let outcome = run_enrollment_with("alice", &png_bytes(), &store, &extractor).unwrap();
        assert_eq!(outcome.display_name, "alice");
        assert!(!outcome.id.is_empty());

        let stored = store.find_by_name("alice").unwrap().unwrap();
        assert_eq!(stored.id, outcome.id);
        let decoded = decode_embedding(&stored.encoding).unwrap();
        assert_eq!(decoded.as_slice()[0], 0.5);
    }

    #[test]
    fn taken_name_conflicts_before_extraction_runs() {
        let store = InMemoryStore::new();
        let original = store.insert("alice", "[9.0]").unwrap();

        let extractor = unreachable_extractor();
        let err = run_enrollment_with("alice", &png_bytes(), &store, &extractor).unwrap_err();
        match err {
            AppError::DisplayNameConflict { name } => assert_eq!(name, "alice"),
            other => panic!("unexpected error: {:?}", other),
        }

        // the existing record is untouched
        let stored = store.find_by_name("alice").unwrap().unwrap();
        assert_eq!(stored.encoding, original.encoding);
        assert_eq!(store.list_all().unwrap().len(), 1);
    }

    #[test]
    fn blank_display_name_is_invalid() {
        let store = InMemoryStore::new();
        let extractor = unreachable_extractor();

        for name in ["", "   "] {
            let err = run_enrollment_with(name, &png_bytes(), &store, &extractor).unwrap_err();
            match err {
                AppError::InvalidDisplayName { .. } => {}
                other => panic!("unexpected error: {:?}", other),
            }
        }
        assert!(store.list_all().unwrap().is_empty());
    }

    #[test]
    fn no_detected_face_fails_validation_and_persists_nothing() {
        let store = InMemoryStore::new();
        let extractor = stub_extractor(vec![]);

        let err = run_enrollment_with("alice", &png_bytes(), &store, &extractor).unwrap_err();
        match err {
            AppError::FaceNotDetected { faces } => assert_eq!(faces, 0),
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(store.list_all().unwrap().is_empty());
    }

    #[test]
    fn undecodable_image_is_an_extraction_error() {
        let store = InMemoryStore::new();
        let extractor = stub_extractor(vec![face(0.5)]);

        let err = run_enrollment_with("alice", b"not an image", &store, &extractor).unwrap_err();
        match err {
            AppError::ImageDecode { .. } => {}
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(store.list_all().unwrap().is_empty());
    }
}
