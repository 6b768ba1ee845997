use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::links::FormatterOptions;
use crate::registry::{MasterRecord, Registry, RepositoryRecord};

/// Configuration file structure for buildlinks.
///
/// Every section is optional. Omitted tables fall back to the built-in
/// repository and master registries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Link formatting behaviour
    #[serde(default)]
    pub formatter: FormatterOptions,

    /// Replacement repository table
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repositories: Option<Vec<RepositoryRecord>>,

    /// Replacement master table
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub masters: Option<Vec<MasterRecord>>,
}

const CANDIDATES: [&str; 4] = [
    "buildlinks.toml",
    "buildlinks.json",
    "buildlinks.yaml",
    "buildlinks.yml",
];

impl Config {
    /// Load configuration from a file.
    ///
    /// Searches for configuration files in this order:
    /// 1. Specified path
    /// 2. ./buildlinks.toml, ./buildlinks.json, ./buildlinks.yaml, ./buildlinks.yml
    /// 3. `<config dir>/buildlinks/config.toml`
    ///
    /// Returns default configuration if no file is found.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_path(path);
        }

        for candidate in &CANDIDATES {
            let path = Path::new(candidate);
            if path.exists() {
                return Self::load_from_path(path);
            }
        }

        if let Some(path) = user_config_path().filter(|path| path.exists()) {
            return Self::load_from_path(&path);
        }

        debug!("No config file found, using built-in registry");
        Ok(Self::default())
    }

    /// Load configuration from a specific file path.
    fn load_from_path(path: &Path) -> Result<Self> {
        debug!("Loading config from {}", path.display());

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

        match extension {
            "toml" => toml::from_str(&contents)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display())),
            "json" => serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display())),
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display())),
            _ => toml::from_str(&contents)
                .or_else(|_| serde_json::from_str(&contents))
                .or_else(|_| serde_yaml::from_str(&contents))
                .with_context(|| format!("Failed to parse config file: {}", path.display())),
        }
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::to_string_pretty(self)?,
            Some("yaml") | Some("yml") => serde_yaml::to_string(self)?,
            _ => toml::to_string_pretty(self)?,
        };

        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Builds the registry described by this config.
    ///
    /// A table that is not configured keeps its built-in contents.
    pub fn registry(&self) -> Result<Registry> {
        if self.repositories.is_none() && self.masters.is_none() {
            return Ok(Registry::builtin());
        }

        let repositories = self
            .repositories
            .clone()
            .unwrap_or_else(crate::registry::builtin_repositories);
        let masters = self
            .masters
            .clone()
            .unwrap_or_else(crate::registry::builtin_masters);

        Registry::new(repositories, masters).context("Invalid registry in config")
    }
}

impl Config {
    /// This config with both tables filled in from the registry it
    /// describes, ready to be saved and edited.
    pub fn effective(&self) -> Result<Self> {
        let registry = self.registry()?;
        Ok(Self {
            formatter: self.formatter.clone(),
            repositories: Some(registry.repositories().cloned().collect()),
            masters: Some(registry.masters().cloned().collect()),
        })
    }
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("buildlinks").join("config.toml"))
}
