use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use image::ImageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("input file not found or unreadable: {path}")]
    MissingInput { path: PathBuf },

    #[error("failed to read image {path}: {source}")]
    ImageRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to decode image bytes: {source}")]
    ImageDecode {
        #[source]
        source: ImageError,
    },

    #[error("expected exactly one face in the image, found {faces}")]
    FaceNotDetected { faces: usize },

    #[error("missing {kind} model; provide {flag} or set ${env}")]
    MissingModel {
        kind: &'static str,
        flag: &'static str,
        env: &'static str,
    },

    #[error("failed to load model {path}: {message}")]
    ModelLoad { path: PathBuf, message: String },

    #[error("embedding has {found} components, expected {expected}")]
    EmbeddingDimension { expected: usize, found: usize },

    #[error("stored embedding is unreadable: {message}")]
    EmbeddingDecode { message: String },

    #[error("invalid display name '{name}': {message}")]
    InvalidDisplayName { name: String, message: String },

    #[error("an identity named '{name}' is already enrolled")]
    DisplayNameConflict { name: String },

    #[error("no identities are enrolled")]
    NoEnrolledIdentities,

    #[error("no enrolled identity matched (compared {compared}, skipped {skipped})")]
    NoMatch { compared: usize, skipped: usize },

    #[error("similarity threshold {value} is outside [0, 1]")]
    InvalidThreshold { value: f64 },

    #[error("failed to read identity store {path}: {source}")]
    StoreRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write identity store {path}: {source}")]
    StoreWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("identity store {path} is invalid: {message}")]
    InvalidStoreFile { path: PathBuf, message: String },

    #[error("missing session secret; set ${env} or session_secret in the config file")]
    MissingSessionSecret { env: &'static str },

    #[error("session secret is {length} bytes, need at least {minimum}")]
    WeakSessionSecret { length: usize, minimum: usize },

    #[error("failed to issue session credential: {message}")]
    SessionIssue { message: String },

    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AppError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            AppError::MissingInput { .. } => ExitCode::from(2),
            AppError::ImageRead { .. } => ExitCode::from(2),
            AppError::ImageDecode { .. } => ExitCode::from(2),
            AppError::FaceNotDetected { .. } => ExitCode::from(2),
            AppError::MissingModel { .. } => ExitCode::from(2),
            AppError::ModelLoad { .. } => ExitCode::from(2),
            AppError::InvalidDisplayName { .. } => ExitCode::from(2),
            AppError::InvalidThreshold { .. } => ExitCode::from(2),
            AppError::StoreRead { .. } => ExitCode::from(2),
            AppError::InvalidStoreFile { .. } => ExitCode::from(2),
            AppError::MissingSessionSecret { .. } => ExitCode::from(2),
            AppError::WeakSessionSecret { .. } => ExitCode::from(2),
            AppError::ConfigRead { .. } => ExitCode::from(2),
            AppError::ConfigParse { .. } => ExitCode::from(2),
            AppError::NoEnrolledIdentities => ExitCode::from(3),
            AppError::NoMatch { .. } => ExitCode::from(3),
            AppError::DisplayNameConflict { .. } => ExitCode::from(4),
            _ => ExitCode::from(1),
        }
    }

    pub fn human_message(&self) -> String {
        self.to_string()
    }
}

pub type AppResult<T> = Result<T, AppError>;
