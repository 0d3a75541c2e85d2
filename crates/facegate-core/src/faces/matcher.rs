use serde::Serialize;
use tracing::{debug, warn};

use crate::errors::{AppError, AppResult};
use crate::faces::embedding::{decode_embedding, similarity_score, Embedding};
use crate::faces::store::IdentityRecord;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchedIdentity {
    pub id: String,
    pub display_name: String,
    pub similarity: f64,
}

#[derive(Debug)]
pub struct VerificationOutcome {
    pub matched: MatchedIdentity,
    pub compared: usize,
    pub skipped: usize,
    pub logs: Vec<String>,
}

pub fn validate_threshold(threshold: f64) -> AppResult<()> {
    if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
        return Err(AppError::InvalidThreshold { value: threshold });
    }
    Ok(())
}

/// First-match scan: candidates are visited in the given order (the store's
/// insertion order) and the first one with similarity >= threshold wins.
/// Later, closer candidates are never looked at. Candidates whose stored
/// encoding will not decode are skipped, never fatal.
pub fn verify(
    probe: &Embedding,
    candidates: &[IdentityRecord],
    threshold: f64,
) -> AppResult<VerificationOutcome> {
    validate_threshold(threshold)?;

    if candidates.is_empty() {
        return Err(AppError::NoEnrolledIdentities);
    }

    let mut logs = Vec::new();
    logs.push(format!("Scanning {} enrolled record(s)", candidates.len()));
    let mut compared = 0usize;
    let mut skipped = 0usize;

    for record in candidates {
        let stored = match decode_embedding(&record.encoding) {
            Ok(embedding) => embedding,
            Err(err) => {
                warn!(
                    identity = %record.display_name,
                    error = %err,
                    "skipping candidate with corrupt embedding"
                );
                logs.push(format!("Skipped '{}': {}", record.display_name, err));
                skipped += 1;
                continue;
            }
        };

        compared += 1;
        let similarity = similarity_score(probe.as_slice(), stored.as_slice());
        debug!(identity = %record.display_name, similarity, "compared candidate");

        if similarity >= threshold {
            logs.push(format!(
                "Matched '{}' (similarity {:.4})",
                record.display_name, similarity
            ));
            return Ok(VerificationOutcome {
                matched: MatchedIdentity {
                    id: record.id.clone(),
                    display_name: record.display_name.clone(),
                    similarity,
                },
                compared,
                skipped,
                logs,
            });
        }
    }

    Err(AppError::NoMatch { compared, skipped })
}
