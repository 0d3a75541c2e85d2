pub mod embedding;
pub mod enrollment;
pub mod extractor;
pub mod matcher;
pub mod store;

pub use embedding::{
    decode_embedding, encode_embedding, euclidean_distance, similarity_score, Embedding,
    EMBEDDING_DIM,
};

pub use enrollment::{run_enrollment_with, validate_display_name, EnrollmentOutcome};

pub use extractor::{
    DlibBackend, EmbeddingBackend, EmbeddingExtractor, ExtractorConfig, FaceModelPaths,
    ENCODER_MODEL_ENV, LANDMARK_MODEL_ENV,
};

pub use matcher::{validate_threshold, verify, MatchedIdentity, VerificationOutcome};

pub use store::{
    resolve_store_path, FilesystemIdentityStore, IdentityRecord, IdentityStore,
    DEFAULT_STORE_PATH, STORE_PATH_ENV,
};
