use std::collections::HashMap;
use std::env;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{SecondsFormat, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use uuid::Uuid;

use crate::errors::{AppError, AppResult};

pub const STORE_PATH_ENV: &str = "FACEGATE_IDENTITY_STORE";
pub const DEFAULT_STORE_PATH: &str = "/var/lib/facegate/identities.json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IdentityRecord {
    pub id: String,
    pub display_name: String,
    pub encoding: String,
    pub created_at: String,
}

pub trait IdentityStore {
    /// Rejects the insert with `DisplayNameConflict` when the name is taken;
    /// the check and the append happen under one store-level guard.
    fn insert(&self, display_name: &str, encoding: &str) -> AppResult<IdentityRecord>;
    fn find_by_name(&self, display_name: &str) -> AppResult<Option<IdentityRecord>>;
    fn find_by_id(&self, id: &str) -> AppResult<Option<IdentityRecord>>;
    /// Records in insertion order; the verification scan depends on it.
    fn list_all(&self) -> AppResult<Vec<IdentityRecord>>;
}

pub fn resolve_store_path(override_path: Option<&Path>) -> PathBuf {
    if let Some(path) = override_path {
        return path.to_path_buf();
    }
    if let Ok(env_value) = env::var(STORE_PATH_ENV) {
        return PathBuf::from(env_value);
    }
    PathBuf::from(DEFAULT_STORE_PATH)
}

/// One guard per store path, shared process-wide, so racing inserts through
/// separate store instances opened on the same file still serialize their
/// read-check-append-rewrite cycle.
static STORE_GUARDS: Lazy<Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

fn guard_for(path: &Path) -> Arc<Mutex<()>> {
    let key = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    let mut guards = match STORE_GUARDS.lock() {
        Ok(guards) => guards,
        Err(poisoned) => poisoned.into_inner(),
    };
    Arc::clone(guards.entry(key).or_default())
}

#[derive(Debug)]
pub struct FilesystemIdentityStore {
    path: PathBuf,
    guard: Arc<Mutex<()>>,
}

impl FilesystemIdentityStore {
    pub fn new(path: PathBuf) -> Self {
        let guard = guard_for(&path);
        Self { path, guard }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        // records live on disk; the guard protects no in-memory state
        match self.guard.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl IdentityStore for FilesystemIdentityStore {
    fn insert(&self, display_name: &str, encoding: &str) -> AppResult<IdentityRecord> {
        let _lock = self.lock();
        let mut records = read_identity_file(&self.path)?;
        if records
            .iter()
            .any(|record| record.display_name == display_name)
        {
            return Err(AppError::DisplayNameConflict {
                name: display_name.to_string(),
            });
        }

        let record = IdentityRecord {
            id: Uuid::new_v4().to_string(),
            display_name: display_name.to_string(),
            encoding: encoding.to_string(),
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        };
        records.push(record.clone());
        write_identity_file(&self.path, &records)?;
        Ok(record)
    }

    fn find_by_name(&self, display_name: &str) -> AppResult<Option<IdentityRecord>> {
        let _lock = self.lock();
        let records = read_identity_file(&self.path)?;
        Ok(records
            .into_iter()
            .find(|record| record.display_name == display_name))
    }

    fn find_by_id(&self, id: &str) -> AppResult<Option<IdentityRecord>> {
        let _lock = self.lock();
        let records = read_identity_file(&self.path)?;
        Ok(records.into_iter().find(|record| record.id == id))
    }

    fn list_all(&self) -> AppResult<Vec<IdentityRecord>> {
        let _lock = self.lock();
        read_identity_file(&self.path)
    }
}

pub fn read_identity_file(path: &Path) -> AppResult<Vec<IdentityRecord>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path).map_err(|source| AppError::StoreRead {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::new(file);
    let records: Vec<IdentityRecord> =
        serde_json::from_reader(reader).map_err(|err| AppError::InvalidStoreFile {
            path: path.to_path_buf(),
            message: format!("invalid identity store contents: {err}"),
        })?;
    Ok(records)
}

pub fn write_identity_file(path: &Path, records: &[IdentityRecord]) -> AppResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| AppError::StoreWrite {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(parent).map_err(|source| AppError::StoreWrite {
        path: path.to_path_buf(),
        source,
    })?;

    {
        let file = tmp.as_file_mut();
        {
            let mut writer = BufWriter::new(&mut *file);
            serde_json::to_writer_pretty(&mut writer, records)?;
            writer.flush().map_err(|source| AppError::StoreWrite {
                path: path.to_path_buf(),
                source,
            })?;
        }
        file.sync_all().map_err(|source| AppError::StoreWrite {
            path: path.to_path_buf(),
            source,
        })?;
    }

    let file = tmp.persist(path).map_err(|err| AppError::StoreWrite {
        path: path.to_path_buf(),
        source: err.error,
    })?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = file
            .metadata()
            .map_err(|source| AppError::StoreWrite {
                path: path.to_path_buf(),
                source,
            })?
            .permissions();
        perms.set_mode(0o600);
        file.set_permissions(perms)
            .map_err(|source| AppError::StoreWrite {
                path: path.to_path_buf(),
                source,
            })?;
    }

    Ok(())
}
