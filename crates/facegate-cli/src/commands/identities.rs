use std::any::Any;
use std::path::PathBuf;
use std::process::ExitCode;

use facegate_core::faces::store::{FilesystemIdentityStore, IdentityRecord, IdentityStore};

use crate::cli::{IdentitiesArgs, OutputMode};
use crate::commands::CommandHandler;
use crate::config;
use crate::errors::AppResult;
use crate::output::render_identities;

#[derive(Debug)]
pub struct IdentityListing {
    pub store_path: PathBuf,
    pub identities: Vec<IdentityRecord>,
}

pub fn run_identities(args: &IdentitiesArgs) -> AppResult<IdentityListing> {
    let defaults = config::load_defaults()?;
    let store_path = config::resolve_store_path(args.store.clone(), &defaults);
    let store = FilesystemIdentityStore::new(store_path.clone());
    let identities = store.list_all()?;
    Ok(IdentityListing {
        store_path,
        identities,
    })
}

pub struct IdentitiesHandler {
    args: IdentitiesArgs,
    run: Box<dyn Fn(&IdentitiesArgs) -> AppResult<IdentityListing> + Send + Sync>,
    render: Box<dyn Fn(&IdentityListing, OutputMode, bool) -> AppResult<()> + Send + Sync>,
}

impl IdentitiesHandler {
    pub fn new(args: IdentitiesArgs) -> Self {
        Self::with_dependencies(args, run_identities, render_identities)
    }

    pub fn with_dependencies(
        args: IdentitiesArgs,
        run: impl Fn(&IdentitiesArgs) -> AppResult<IdentityListing> + Send + Sync + 'static,
        render: impl Fn(&IdentityListing, OutputMode, bool) -> AppResult<()> + Send + Sync + 'static,
    ) -> Self {
        Self {
            args,
            run: Box::new(run),
            render: Box::new(render),
        }
    }
}

impl CommandHandler for IdentitiesHandler {
    fn execute(&self, mode: OutputMode, verbose: bool) -> AppResult<ExitCode> {
        let listing = (self.run)(&self.args)?;
        (self.render)(&listing, mode, verbose)?;
        Ok(ExitCode::SUCCESS)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
