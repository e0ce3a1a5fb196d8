pub mod data_locations;
pub mod scheduling;
pub mod server;

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use anyhow::Result;
use arc_swap::ArcSwap;
use serde::Deserialize;
use serde::Serialize;

use self::data_locations::DataLocations;
use self::scheduling::SchedulingConfiguration;
use self::server::ServerConfiguration;

pub const CONFIGURATION_PATH_VARIABLE: &str = "HAULPLAN_CONFIG";
const DEFAULT_CONFIGURATION_PATH: &str = "./configuration/haulplan.toml";

/// Single source of all configuration. It is loaded once by the orchestrator
/// and handed to the components that need it.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SystemConfigurations {
    #[serde(default)]
    pub scheduling: SchedulingConfiguration,
    pub data_locations: DataLocations,
    pub server: ServerConfiguration,
}

impl SystemConfigurations {
    /// Reads the TOML file named by `HAULPLAN_CONFIG`, falling back to
    /// `./configuration/haulplan.toml`. The result is always handed out
    /// wrapped so that a reload swaps every reader over at once.
    pub fn read_all_configs() -> Result<Arc<ArcSwap<SystemConfigurations>>> {
        let configuration_path = dotenvy::var(CONFIGURATION_PATH_VARIABLE)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIGURATION_PATH));

        let system_configurations = Self::from_path(&configuration_path)?;

        Ok(Arc::new(ArcSwap::new(Arc::new(system_configurations))))
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("could not read configuration file {}", path.display()))?;

        Self::from_toml_str(&contents)
            .with_context(|| format!("invalid configuration in {}", path.display()))
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("could not parse the system configuration")
    }
}
