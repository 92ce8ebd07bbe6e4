//! Application context - wires the store, collaborator and service together

use kycflow_core::{Actor, UserRole};
use kycflow_workflow::{CaseService, JsonExtractor, ServiceConfig, SqliteCaseStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const DATABASE_FILE: &str = "cases.db";

/// Application context
pub struct AppContext {
    pub service: CaseService,
    db_path: PathBuf,
}

impl AppContext {
    /// Open the case database under `data_path`, creating it if needed
    ///
    /// A misconfigured scoring section refuses to start.
    pub async fn new(data_path: impl AsRef<Path>, config_path: Option<&Path>) -> Result<Self, anyhow::Error> {
        let data_path = data_path.as_ref();
        std::fs::create_dir_all(data_path)?;

        let config = load_config(config_path)?;
        let db_path = data_path.join(DATABASE_FILE);
        let store = SqliteCaseStore::new(&db_path)?;

        let service = CaseService::new(Arc::new(store), Arc::new(JsonExtractor), config)?;

        Ok(Self { service, db_path })
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }
}

/// Service configuration from a JSON file, or defaults
pub fn load_config(config_path: Option<&Path>) -> Result<ServiceConfig, anyhow::Error> {
    match config_path {
        Some(path) => Ok(ServiceConfig::from_file(path)?),
        None => Ok(ServiceConfig::default()),
    }
}

/// Build the acting user from the identity flags
pub fn actor(id: &str, name: Option<&str>, role: &str) -> Result<Actor, anyhow::Error> {
    let role = UserRole::parse_human(role)?;
    Ok(Actor::new(id, name.unwrap_or(id), role)?)
}
