//! Command implementations.

mod demo;
mod info;
mod run;
mod validate;

pub use demo::run_demo;
pub use info::run_info;
pub use run::run_query;
pub use validate::run_validate;

use std::path::Path;

use anyhow::{Context, Result};
use contracts::ClusterBlueprint;

use crate::error::CliError;

/// Load a configuration file, failing early with a clear message when it is missing
fn load_blueprint(path: &Path) -> Result<ClusterBlueprint> {
    if !path.exists() {
        return Err(CliError::config_not_found(path.display().to_string()).into());
    }

    config_loader::ConfigLoader::load_from_path(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))
}
