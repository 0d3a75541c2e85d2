use std::io::Cursor;
use std::time::Duration;

use facegate_core::errors::AppError;
use facegate_core::faces::embedding::{encode_embedding, Embedding, EMBEDDING_DIM};
use facegate_core::faces::enrollment::run_enrollment_with;
use facegate_core::faces::extractor::{EmbeddingBackend, EmbeddingExtractor};
use facegate_core::faces::store::{
    write_identity_file, FilesystemIdentityStore, IdentityRecord, IdentityStore,
};
use facegate_core::login::run_face_login_with;
use facegate_core::session::{JwtSessionIssuer, SessionClaims};
use image::{Rgb, RgbImage};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use tempfile::TempDir;

const SECRET: &str = "an-integration-secret-of-32-bytes!!";

#[test]
fn integration_enroll_then_login_issues_decodable_token() {
    let tmp = TempDir::new().unwrap();
    let store = FilesystemIdentityStore::new(tmp.path().join("identities.json"));
    let extractor = stub_extractor(vec![face(0.5)]);
    let issuer = JwtSessionIssuer::new(SECRET, Duration::from_secs(3600)).expect("issuer builds");

    let enrolled = run_enrollment_with("alice", &png_bytes(), &store, &extractor)
        .expect("enrollment works");

    let login = run_face_login_with(&png_bytes(), 0.6, &extractor, &store, &issuer)
        .expect("login works");
    assert_eq!(login.display_name, "alice");
    assert_eq!(login.identity_id, enrolled.id);

    let decoded = decode::<SessionClaims>(
        &login.credential.token,
        &DecodingKey::from_secret(SECRET.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .expect("token decodes");
    assert_eq!(decoded.claims.sub, enrolled.id);
    assert_eq!(decoded.claims.name, "alice");
    assert_eq!(decoded.claims.exp, login.credential.expires_at);
    assert_eq!(decoded.claims.exp - decoded.claims.iat, 3600);
}

#[test]
fn integration_login_against_empty_store_is_denied() {
    let tmp = TempDir::new().unwrap();
    let store = FilesystemIdentityStore::new(tmp.path().join("identities.json"));
    let extractor = stub_extractor(vec![face(0.5)]);
    let issuer = JwtSessionIssuer::new(SECRET, Duration::from_secs(3600)).expect("issuer builds");

    let err = run_face_login_with(&png_bytes(), 0.6, &extractor, &store, &issuer).unwrap_err();
    match err {
        AppError::NoEnrolledIdentities => {}
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn integration_unrelated_probe_is_denied() {
    let tmp = TempDir::new().unwrap();
    let store = FilesystemIdentityStore::new(tmp.path().join("identities.json"));
    let enroller = stub_extractor(vec![face(0.5)]);
    run_enrollment_with("alice", &png_bytes(), &store, &enroller).expect("enrollment works");

    // distance 0.5 from alice, similarity 0.5, below the 0.6 threshold
    let prober = stub_extractor(vec![face(1.0)]);
    let issuer = JwtSessionIssuer::new(SECRET, Duration::from_secs(3600)).expect("issuer builds");

    let err = run_face_login_with(&png_bytes(), 0.6, &prober, &store, &issuer).unwrap_err();
    match err {
        AppError::NoMatch { compared, skipped } => {
            assert_eq!(compared, 1);
            assert_eq!(skipped, 0);
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn integration_corrupt_record_is_skipped_and_later_match_wins() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("identities.json");
    let alice = Embedding::new(face(0.5)).unwrap();
    write_identity_file(
        &path,
        &[
            record_with_encoding("mallory", "{broken"),
            record_with_encoding("alice", &encode_embedding(&alice).unwrap()),
        ],
    )
    .expect("seed store");

    let store = FilesystemIdentityStore::new(path);
    let extractor = stub_extractor(vec![face(0.5)]);
    let issuer = JwtSessionIssuer::new(SECRET, Duration::from_secs(3600)).expect("issuer builds");

    let login = run_face_login_with(&png_bytes(), 0.6, &extractor, &store, &issuer)
        .expect("login works");
    assert_eq!(login.display_name, "alice");
    assert!(login
        .logs
        .iter()
        .any(|line| line.contains("Skipped 'mallory'")));
}

#[test]
fn integration_duplicate_enrollment_leaves_store_unchanged() {
    let tmp = TempDir::new().unwrap();
    let store = FilesystemIdentityStore::new(tmp.path().join("identities.json"));

    let first = stub_extractor(vec![face(0.5)]);
    let enrolled = run_enrollment_with("alice", &png_bytes(), &store, &first)
        .expect("enrollment works");

    let second = stub_extractor(vec![face(0.9)]);
    let err = run_enrollment_with("alice", &png_bytes(), &store, &second).unwrap_err();
    match err {
        AppError::DisplayNameConflict { name } => assert_eq!(name, "alice"),
        other => panic!("unexpected error: {:?}", other),
    }

    let records = store.list_all().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, enrolled.id);

    // the surviving embedding still matches the first face
    let issuer = JwtSessionIssuer::new(SECRET, Duration::from_secs(3600)).expect("issuer builds");
    let login = run_face_login_with(&png_bytes(), 0.6, &first, &store, &issuer)
        .expect("login works");
    assert_eq!(login.identity_id, enrolled.id);
}

struct StubBackend {
    faces: Vec<Vec<f64>>,
}

impl EmbeddingBackend for StubBackend {
    fn extract(
        &self,
        _image: &RgbImage,
        _num_jitters: u32,
    ) -> facegate_core::errors::AppResult<Vec<Vec<f64>>> {
        Ok(self.faces.clone())
    }
}

fn stub_extractor(faces: Vec<Vec<f64>>) -> EmbeddingExtractor<StubBackend> {
    EmbeddingExtractor::new(move || Ok(StubBackend { faces: faces.clone() }), 1)
}

fn png_bytes() -> Vec<u8> {
    let rgb = RgbImage::from_pixel(4, 4, Rgb([80, 90, 100]));
    let mut bytes = Vec::new();
    rgb.write_to(&mut Cursor::new(&mut bytes), image::ImageOutputFormat::Png)
        .unwrap();
    bytes
}

fn face(seed: f64) -> Vec<f64> {
    let mut values = vec![0.0; EMBEDDING_DIM];
    values[0] = seed;
    values
}

fn record_with_encoding(name: &str, encoding: &str) -> IdentityRecord {
    IdentityRecord {
        id: format!("id-{name}"),
        display_name: name.to_string(),
        encoding: encoding.to_string(),
        created_at: "2025-01-01T00:00:00.000Z".to_string(),
    }
}
