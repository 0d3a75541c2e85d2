use serde::Serialize;

use crate::errors::{AppError, AppResult};

pub const EMBEDDING_DIM: usize = 128;

/// Fixed-dimension face embedding. Construction enforces the dimension, so
/// two `Embedding`s are always comparable.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Embedding(Vec<f64>);

impl Embedding {
    pub fn new(values: Vec<f64>) -> AppResult<Self> {
        if values.len() != EMBEDDING_DIM {
            return Err(AppError::EmbeddingDimension {
                expected: EMBEDDING_DIM,
                found: values.len(),
            });
        }
        Ok(Self(values))
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

pub fn euclidean_distance(lhs: &[f64], rhs: &[f64]) -> f64 {
    debug_assert_eq!(lhs.len(), rhs.len(), "embedding dimensions must match");
    lhs.iter()
        .zip(rhs.iter())
        .map(|(l, r)| (l - r) * (l - r))
        .sum::<f64>()
        .sqrt()
}

pub fn similarity_score(lhs: &[f64], rhs: &[f64]) -> f64 {
    1.0 - euclidean_distance(lhs, rhs)
}

pub fn encode_embedding(embedding: &Embedding) -> AppResult<String> {
    Ok(serde_json::to_string(embedding.as_slice())?)
}

pub fn decode_embedding(encoded: &str) -> AppResult<Embedding> {
    let values: Vec<f64> =
        serde_json::from_str(encoded).map_err(|err| AppError::EmbeddingDecode {
            message: err.to_string(),
        })?;
    Embedding::new(values)
}
