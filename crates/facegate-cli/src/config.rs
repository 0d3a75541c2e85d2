use std::env;
use std::path::{Path, PathBuf};

use facegate_config::{ConfigError, ResolvedConfig, ResolvedConfigWithSource};
use facegate_core::faces::extractor::{ExtractorConfig, ENCODER_MODEL_ENV, LANDMARK_MODEL_ENV};
use facegate_core::faces::store::STORE_PATH_ENV;

use crate::errors::{AppError, AppResult};

pub fn load_defaults() -> AppResult<ResolvedConfig> {
    map_loaded(facegate_config::load_resolved_config())
}

pub fn load_defaults_from(paths: &[PathBuf]) -> AppResult<ResolvedConfig> {
    map_loaded(facegate_config::load_resolved_from_paths(paths))
}

fn map_loaded(loaded: Result<ResolvedConfigWithSource, ConfigError>) -> AppResult<ResolvedConfig> {
    let entry = loaded.map_err(map_config_error)?;
    if let Some(source) = &entry.source {
        tracing::debug!(path = %source.display(), "loaded configuration file");
    }
    Ok(entry.resolved)
}

fn map_config_error(err: ConfigError) -> AppError {
    match err {
        ConfigError::Read { path, source } => AppError::ConfigRead { path, source },
        ConfigError::Parse { path, message } => AppError::ConfigParse { path, message },
    }
}

/// Flag wins, then the environment, then the configured (or built-in) path.
pub fn resolve_store_path(cli_value: Option<PathBuf>, defaults: &ResolvedConfig) -> PathBuf {
    if let Some(path) = cli_value {
        return path;
    }
    if let Ok(value) = env::var(STORE_PATH_ENV) {
        return PathBuf::from(value);
    }
    defaults.store_path.clone()
}

pub fn build_extractor_config(
    landmark_model: Option<PathBuf>,
    encoder_model: Option<PathBuf>,
    jitters: Option<u32>,
    defaults: &ResolvedConfig,
) -> ExtractorConfig {
    ExtractorConfig {
        landmark_model: resolve_model_path(
            landmark_model,
            LANDMARK_MODEL_ENV,
            defaults.landmark_model.as_deref(),
        ),
        encoder_model: resolve_model_path(
            encoder_model,
            ENCODER_MODEL_ENV,
            defaults.encoder_model.as_deref(),
        ),
        jitters: jitters.unwrap_or(defaults.jitters),
    }
}

fn resolve_model_path(
    cli_value: Option<PathBuf>,
    env_key: &str,
    configured: Option<&Path>,
) -> Option<PathBuf> {
    cli_value
        .or_else(|| env::var(env_key).ok().map(PathBuf::from))
        .or_else(|| configured.map(Path::to_path_buf))
}
