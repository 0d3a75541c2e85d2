use std::any::Any;
use std::fs;
use std::path::Path;
use std::process::ExitCode;

use crate::cli::{Commands, OutputMode};
use crate::errors::{AppError, AppResult};

pub trait CommandHandler: Send + Sync {
    fn execute(&self, mode: OutputMode, verbose: bool) -> AppResult<ExitCode>;
    fn as_any(&self) -> &dyn Any;
}

mod enroll;
mod identities;
mod login;

pub use enroll::{run_enroll, EnrollHandler};
pub use identities::{run_identities, IdentitiesHandler, IdentityListing};
pub use login::{run_login, LoginHandler};

impl From<Commands> for Box<dyn CommandHandler> {
    fn from(command: Commands) -> Self {
        match command {
            Commands::Enroll(args) => Box::new(EnrollHandler::new(args)),
            Commands::Login(args) => Box::new(LoginHandler::new(args)),
            Commands::Identities(args) => Box::new(IdentitiesHandler::new(args)),
        }
    }
}

pub(crate) fn read_image_bytes(path: &Path) -> AppResult<Vec<u8>> {
    if !path.exists() {
        return Err(AppError::MissingInput {
            path: path.to_path_buf(),
        });
    }
    fs::read(path).map_err(|source| AppError::ImageRead {
        path: path.to_path_buf(),
        source,
    })
}
