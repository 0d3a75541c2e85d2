use std::any::Any;
use std::process::ExitCode;
use std::time::Duration;

use facegate_core::faces::extractor::EmbeddingExtractor;
use facegate_core::faces::store::FilesystemIdentityStore;
use facegate_core::login::{run_face_login_with, FaceLoginOutcome};
use facegate_core::session::{resolve_session_secret, JwtSessionIssuer};

use crate::cli::{LoginArgs, OutputMode};
use crate::commands::{read_image_bytes, CommandHandler};
use crate::config;
use crate::errors::AppResult;
use crate::output::render_login;

pub fn run_login(args: &LoginArgs) -> AppResult<FaceLoginOutcome> {
    let defaults = config::load_defaults()?;
    let image_bytes = read_image_bytes(&args.image)?;
    let threshold = args.threshold.unwrap_or(defaults.similarity_threshold);
    let store =
        FilesystemIdentityStore::new(config::resolve_store_path(args.store.clone(), &defaults));
    let extractor = EmbeddingExtractor::from_config(&config::build_extractor_config(
        args.landmark_model.clone(),
        args.encoder_model.clone(),
        args.jitters,
        &defaults,
    ))?;

    let secret = resolve_session_secret(defaults.session_secret.clone())?;
    let ttl = args
        .ttl_secs
        .map(Duration::from_secs)
        .unwrap_or(defaults.session_ttl);
    let issuer = JwtSessionIssuer::new(&secret, ttl)?;

    run_face_login_with(&image_bytes, threshold, &extractor, &store, &issuer)
}

pub struct LoginHandler {
    args: LoginArgs,
    run: Box<dyn Fn(&LoginArgs) -> AppResult<FaceLoginOutcome> + Send + Sync>,
    render: Box<dyn Fn(&FaceLoginOutcome, OutputMode, bool) -> AppResult<()> + Send + Sync>,
}

impl LoginHandler {
    pub fn new(args: LoginArgs) -> Self {
        Self::with_dependencies(args, run_login, render_login)
    }

    pub fn with_dependencies(
        args: LoginArgs,
        run: impl Fn(&LoginArgs) -> AppResult<FaceLoginOutcome> + Send + Sync + 'static,
        render: impl Fn(&FaceLoginOutcome, OutputMode, bool) -> AppResult<()> + Send + Sync + 'static,
    ) -> Self {
        Self {
            args,
            run: Box::new(run),
            render: Box::new(render),
        }
    }
}

impl CommandHandler for LoginHandler {
    fn execute(&self, mode: OutputMode, verbose: bool) -> AppResult<ExitCode> {
        let outcome = (self.run)(&self.args)?;
        (self.render)(&outcome, mode, verbose)?;
        Ok(ExitCode::SUCCESS)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
