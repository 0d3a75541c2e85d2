use tracing::info;

use crate::errors::AppResult;
use crate::faces::extractor::{EmbeddingBackend, EmbeddingExtractor};
use crate::faces::matcher::{verify, MatchedIdentity};
use crate::faces::store::IdentityStore;
use crate::session::{SessionCredential, SessionIssuer};

#[derive(Debug)]
pub struct FaceLoginOutcome {
    pub credential: SessionCredential,
    pub identity_id: String,
    pub display_name: String,
    pub logs: Vec<String>,
}

/// Initialize the extractor, extract the probe, scan enrolled records in
/// store order, and issue a session credential for the first match. The
/// stored embeddings never appear in the outcome; the similarity only in
/// its log transcript.
pub fn run_face_login_with<B, S, I>(
    image_bytes: &[u8],
    threshold: f64,
    extractor: &EmbeddingExtractor<B>,
    store: &S,
    issuer: &I,
) -> AppResult<FaceLoginOutcome>
where
    B: EmbeddingBackend,
    S: IdentityStore + ?Sized,
    I: SessionIssuer + ?Sized,
{
    let mut logs = Vec::new();

    extractor.initialize()?;
    logs.push("Embedding backend ready".to_string());

    let probe = extractor.extract(image_bytes)?;
    logs.push("Extracted probe embedding".to_string());

    let candidates = store.list_all()?;
    let scan = verify(&probe, &candidates, threshold)?;
    logs.extend(scan.logs);

    let MatchedIdentity {
        id,
        display_name,
        similarity,
    } = scan.matched;
    info!(identity = %display_name, similarity, "face login matched");

    let credential = issuer.issue(&id, &display_name)?;
    logs.push(format!("Issued session credential for '{display_name}'"));

    Ok(FaceLoginOutcome {
        credential,
        identity_id: id,
        display_name,
        logs,
    })
}
