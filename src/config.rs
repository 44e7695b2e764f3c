use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{
    catalog::{Catalog, ToolDefinition},
    city::{CityState, DEFAULT_GRID_SIZE, DEFAULT_STARTING_WALLET},
};

fn default_grid_size() -> usize {
    DEFAULT_GRID_SIZE
}

fn default_starting_wallet() -> i64 {
    DEFAULT_STARTING_WALLET
}

/// City setup read from YAML. Every field is optional; an empty file
/// describes the standard 100 tile city with $500 and four tools.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityConfig {
    #[serde(default = "default_grid_size")]
    pub grid_size: usize,
    #[serde(default = "default_starting_wallet")]
    pub starting_wallet: i64,
    #[serde(default)]
    pub tools: Option<Vec<ToolDefinition>>,
}

impl Default for CityConfig {
    fn default() -> Self {
        Self {
            grid_size: default_grid_size(),
            starting_wallet: default_starting_wallet(),
            tools: None,
        }
    }
}

impl CityConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).context("Failed to parse city config")
    }

    pub fn build_catalog(&self) -> Result<Catalog> {
        match &self.tools {
            Some(tools) => Catalog::new(tools.clone()).context("Invalid tool table"),
            None => Ok(Catalog::standard()),
        }
    }

    pub fn build_city(&self) -> Result<CityState> {
        let catalog = self.build_catalog()?;
        CityState::initialize(catalog, self.grid_size, self.starting_wallet)
            .context("Invalid city dimensions")
    }

    pub fn with_overrides(mut self, grid_size: Option<usize>, starting_wallet: Option<i64>) -> Self {
        if let Some(size) = grid_size {
            self.grid_size = size;
        }
        if let Some(wallet) = starting_wallet {
            self.starting_wallet = wallet;
        }
        self
    }
}

pub struct ConfigLoader {
    base_dir: PathBuf,
}

impl ConfigLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<CityConfig> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read city config {}", path.display()))?;
        CityConfig::from_yaml_str(&data)
            .with_context(|| format!("Failed to load {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = CityConfig::from_yaml_str("").unwrap();
        assert_eq!(config, CityConfig::default());
        let city = config.build_city().unwrap();
        assert_eq!(city.grid_size(), 100);
        assert_eq!(city.wallet(), 500);
        assert_eq!(city.catalog(), &Catalog::standard());
    }

    #[test]
    fn partial_config_keeps_remaining_defaults() {
        let config = CityConfig::from_yaml_str("starting_wallet: 42\n").unwrap();
        assert_eq!(config.grid_size, 100);
        assert_eq!(config.starting_wallet, 42);
    }

    #[test]
    fn custom_tools_replace_the_standard_table() {
        let yaml = r#"
grid_size: 16
tools:
  - id: farm
    label: Farm
    cost: 25
    income_yield: 3
  - id: tower
    label: Tower
    cost: 120
    income_yield: 2
    population_yield: 20
"#;
        let config = CityConfig::from_yaml_str(yaml).unwrap();
        let city = config.build_city().unwrap();
        assert_eq!(city.grid_size(), 16);
        let ids: Vec<&str> = city
            .catalog()
            .list_all()
            .iter()
            .map(|tool| tool.id.as_str())
            .collect();
        assert_eq!(ids, ["farm", "tower"]);
        assert_eq!(city.catalog().lookup("farm").unwrap().population_yield, 0);
    }

    #[test]
    fn zero_grid_size_is_rejected() {
        let config = CityConfig::default().with_overrides(Some(0), None);
        assert!(config.build_city().is_err());
    }

    #[test]
    fn loader_reads_files_relative_to_base_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("meadow.yaml"),
            "grid_size: 25\nstarting_wallet: 120\n",
        )
        .unwrap();

        let config = ConfigLoader::new(dir.path()).load("meadow.yaml").unwrap();
        assert_eq!(config.grid_size, 25);
        assert_eq!(config.starting_wallet, 120);
        assert!(config.tools.is_none());
    }

    #[test]
    fn loader_reports_missing_and_broken_files() {
        let dir = tempfile::tempdir().unwrap();
        let loader = ConfigLoader::new(dir.path());

        let missing = loader.load("absent.yaml").unwrap_err();
        assert!(format!("{missing:#}").contains("Failed to read city config"));
        assert!(format!("{missing:#}").contains("absent.yaml"));

        fs::write(dir.path().join("broken.yaml"), "grid_size: [oops\n").unwrap();
        let broken = loader.load("broken.yaml").unwrap_err();
        assert!(format!("{broken:#}").contains("Failed to load"));
        assert!(format!("{broken:#}").contains("Failed to parse city config"));
    }

    #[test]
    fn duplicate_tools_are_rejected() {
        let yaml = "tools:\n  - {id: road, label: Road, cost: 1}\n  - {id: road, label: Road, cost: 2}\n";
        let config = CityConfig::from_yaml_str(yaml).unwrap();
        let err = config.build_catalog().unwrap_err();
        assert!(format!("{err:#}").contains("defined more than once"));
    }
}
