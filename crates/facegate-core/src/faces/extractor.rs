use std::env;
use std::path::PathBuf;

use dlib_face_recognition::{
    FaceDetector, FaceDetectorTrait, FaceEncoderNetwork, FaceEncoderTrait, ImageMatrix,
    LandmarkPredictor, LandmarkPredictorTrait,
};
use image::RgbImage;
use once_cell::sync::OnceCell;
use tracing::debug;

use crate::errors::{AppError, AppResult};
use crate::faces::embedding::Embedding;

pub const LANDMARK_MODEL_ENV: &str = "FACEGATE_LANDMARK_MODEL";
pub const ENCODER_MODEL_ENV: &str = "FACEGATE_ENCODER_MODEL";

#[derive(Debug, Clone, Default)]
pub struct ExtractorConfig {
    pub landmark_model: Option<PathBuf>,
    pub encoder_model: Option<PathBuf>,
    pub jitters: u32,
}

#[derive(Debug, Clone)]
pub struct FaceModelPaths {
    pub landmark: PathBuf,
    pub encoder: PathBuf,
}

impl ExtractorConfig {
    pub fn resolve_models(&self) -> AppResult<FaceModelPaths> {
        let landmark = self
            .landmark_model
            .clone()
            .or_else(|| env::var(LANDMARK_MODEL_ENV).ok().map(PathBuf::from))
            .ok_or(AppError::MissingModel {
                kind: "landmark predictor",
                flag: "--landmark-model",
                env: LANDMARK_MODEL_ENV,
            })?;

        let encoder = self
            .encoder_model
            .clone()
            .or_else(|| env::var(ENCODER_MODEL_ENV).ok().map(PathBuf::from))
            .ok_or(AppError::MissingModel {
                kind: "face encoding network",
                flag: "--encoder-model",
                env: ENCODER_MODEL_ENV,
            })?;

        Ok(FaceModelPaths { landmark, encoder })
    }
}

pub trait EmbeddingBackend {
    /// One descriptor vector per detected face, in detector order.
    fn extract(&self, image: &RgbImage, num_jitters: u32) -> AppResult<Vec<Vec<f64>>>;
}

pub struct DlibBackend {
    detector: FaceDetector,
    predictor: LandmarkPredictor,
    encoder: FaceEncoderNetwork,
}

impl DlibBackend {
    pub fn new(models: &FaceModelPaths) -> AppResult<Self> {
        debug!(path = %models.landmark.display(), "loading landmark model");
        let predictor =
            LandmarkPredictor::open(&models.landmark).map_err(|message| AppError::ModelLoad {
                path: models.landmark.clone(),
                message,
            })?;
        debug!(path = %models.encoder.display(), "loading encoder model");
        let encoder =
            FaceEncoderNetwork::open(&models.encoder).map_err(|message| AppError::ModelLoad {
                path: models.encoder.clone(),
                message,
            })?;
        let detector = FaceDetector::new();

        Ok(Self {
            detector,
            predictor,
            encoder,
        })
    }
}

impl EmbeddingBackend for DlibBackend {
    fn extract(&self, image: &RgbImage, num_jitters: u32) -> AppResult<Vec<Vec<f64>>> {
        let matrix = ImageMatrix::from_image(image);
        let locations = self.detector.face_locations(&matrix);

        let mut landmarks = Vec::with_capacity(locations.len());
        for rect in locations.iter() {
            landmarks.push(self.predictor.face_landmarks(&matrix, rect));
        }

        let encodings = self
            .encoder
            .get_face_encodings(&matrix, &landmarks, num_jitters);

        Ok(encodings
            .iter()
            .map(|encoding| encoding.as_ref().to_vec())
            .collect())
    }
}

/// Adapter in front of an [`EmbeddingBackend`] that loads it on first use.
/// Initialization is single-flight: exactly one load runs no matter how many
/// callers race, and concurrent callers share the result. A failed load
/// leaves the adapter uninitialized so a later call can retry.
pub struct EmbeddingExtractor<B> {
    backend: OnceCell<B>,
    load: Box<dyn Fn() -> AppResult<B> + Send + Sync>,
    num_jitters: u32,
}

impl<B: EmbeddingBackend> EmbeddingExtractor<B> {
    pub fn new<F>(load: F, num_jitters: u32) -> Self
    where
        F: Fn() -> AppResult<B> + Send + Sync + 'static,
    {
        Self {
            backend: OnceCell::new(),
            load: Box::new(load),
            num_jitters,
        }
    }

    pub fn initialize(&self) -> AppResult<&B> {
        self.backend.get_or_try_init(|| (self.load)())
    }

    pub fn is_initialized(&self) -> bool {
        self.backend.get().is_some()
    }

    /// Decodes the image bytes and extracts the embedding of the single face
    /// they contain. Zero or several faces is `FaceNotDetected`; undecodable
    /// bytes are `ImageDecode`, a different failure.
    pub fn extract(&self, image_bytes: &[u8]) -> AppResult<Embedding> {
        let backend = self.initialize()?;

        let image =
            image::load_from_memory(image_bytes).map_err(|source| AppError::ImageDecode { source })?;
        let rgb: RgbImage = image.to_rgb8();
        debug!(
            width = rgb.width(),
            height = rgb.height(),
            "decoded probe image"
        );

        let mut faces = backend.extract(&rgb, self.num_jitters)?;
        debug!(faces = faces.len(), "detected faces");
        if faces.len() != 1 {
            return Err(AppError::FaceNotDetected { faces: faces.len() });
        }
        Embedding::new(faces.remove(0))
    }
}

impl EmbeddingExtractor<DlibBackend> {
    /// Resolves model paths eagerly so misconfiguration fails before first
    /// use; the dlib models themselves load lazily on first extraction.
    pub fn from_config(config: &ExtractorConfig) -> AppResult<Self> {
        let models = config.resolve_models()?;
        Ok(Self::new(move || DlibBackend::new(&models), config.jitters))
    }
}
