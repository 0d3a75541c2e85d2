use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "facegate",
    about = "Enroll faces and log in against the local identity store",
    version
)]
pub struct Cli {
    /// Emit structured JSON to stdout instead of human-readable logs
    #[arg(long)]
    pub json: bool,

    /// Increase verbosity (may be used multiple times)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Enroll a new identity from an image with exactly one face
    Enroll(EnrollArgs),
    /// Match a probe image against enrolled identities and issue a session token
    Login(LoginArgs),
    /// List enrolled identities without their stored embeddings
    Identities(IdentitiesArgs),
}

#[derive(Debug, Args)]
pub struct EnrollArgs {
    /// Display name for the new identity
    pub name: String,

    /// Path to the image that contains the face to enroll
    pub image: PathBuf,

    /// Identity store file (falls back to $FACEGATE_IDENTITY_STORE, then config)
    #[arg(long)]
    pub store: Option<PathBuf>,

    /// Path to the dlib landmark predictor model (falls back to $FACEGATE_LANDMARK_MODEL)
    #[arg(long)]
    pub landmark_model: Option<PathBuf>,

    /// Path to the dlib face recognition network (falls back to $FACEGATE_ENCODER_MODEL)
    #[arg(long)]
    pub encoder_model: Option<PathBuf>,

    /// Number of image jitters to run before encoding
    #[arg(long)]
    pub jitters: Option<u32>,
}

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Path to the probe image that contains the face to match
    pub image: PathBuf,

    /// Similarity threshold in [0, 1] (defaults to the configured value)
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Identity store file (falls back to $FACEGATE_IDENTITY_STORE, then config)
    #[arg(long)]
    pub store: Option<PathBuf>,

    /// Path to the dlib landmark predictor model (falls back to $FACEGATE_LANDMARK_MODEL)
    #[arg(long)]
    pub landmark_model: Option<PathBuf>,

    /// Path to the dlib face recognition network (falls back to $FACEGATE_ENCODER_MODEL)
    #[arg(long)]
    pub encoder_model: Option<PathBuf>,

    /// Number of image jitters to run before encoding
    #[arg(long)]
    pub jitters: Option<u32>,

    /// Session lifetime in seconds (defaults to the configured value)
    #[arg(long)]
    pub ttl_secs: Option<u64>,
}

#[derive(Debug, Args)]
pub struct IdentitiesArgs {
    /// Identity store file (falls back to $FACEGATE_IDENTITY_STORE, then config)
    #[arg(long)]
    pub store: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Human,
    Json,
}

impl From<bool> for OutputMode {
    fn from(json: bool) -> Self {
        if json {
            OutputMode::Json
        } else {
            OutputMode::Human
        }
    }
}

impl Cli {
    pub fn output_mode(&self) -> OutputMode {
        OutputMode::from(self.json)
    }
}
