use std::any::Any;
use std::process::ExitCode;

use facegate_core::faces::enrollment::{run_enrollment_with, EnrollmentOutcome};
use facegate_core::faces::extractor::EmbeddingExtractor;
use facegate_core::faces::store::FilesystemIdentityStore;

use crate::cli::{EnrollArgs, OutputMode};
use crate::commands::{read_image_bytes, CommandHandler};
use crate::config;
use crate::errors::AppResult;
use crate::output::render_enroll;

pub fn run_enroll(args: &EnrollArgs) -> AppResult<EnrollmentOutcome> {
    let defaults = config::load_defaults()?;
    let image_bytes = read_image_bytes(&args.image)?;
    let store =
        FilesystemIdentityStore::new(config::resolve_store_path(args.store.clone(), &defaults));
    let extractor = EmbeddingExtractor::from_config(&config::build_extractor_config(
        args.landmark_model.clone(),
        args.encoder_model.clone(),
        args.jitters,
        &defaults,
    ))?;
    run_enrollment_with(&args.name, &image_bytes, &store, &extractor)
}

pub struct EnrollHandler {
    args: EnrollArgs,
    run: Box<dyn Fn(&EnrollArgs) -> AppResult<EnrollmentOutcome> + Send + Sync>,
    render: Box<dyn Fn(&EnrollmentOutcome, OutputMode, bool) -> AppResult<()> + Send + Sync>,
}

impl EnrollHandler {
    pub fn new(args: EnrollArgs) -> Self {
        Self::with_dependencies(args, run_enroll, render_enroll)
    }

    pub fn with_dependencies(
        args: EnrollArgs,
        run: impl Fn(&EnrollArgs) -> AppResult<EnrollmentOutcome> + Send + Sync + 'static,
        render: impl Fn(&EnrollmentOutcome, OutputMode, bool) -> AppResult<()> + Send + Sync + 'static,
    ) -> Self {
        Self {
            args,
            run: Box::new(run),
            render: Box::new(render),
        }
    }
}

impl CommandHandler for EnrollHandler {
    fn execute(&self, mode: OutputMode, verbose: bool) -> AppResult<ExitCode> {
        let outcome = (self.run)(&self.args)?;
        (self.render)(&outcome, mode, verbose)?;
        Ok(ExitCode::SUCCESS)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
