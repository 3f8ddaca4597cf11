//! Configuration loader with hierarchical merging: defaults, then a global
//! file, then a project-local file, then environment variables.

use crate::error::{ConfigError, Result};
use crate::types::Config;
use directories::ProjectDirs;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Configuration source in override order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigSource {
    /// Built-in defaults.
    Defaults = 0,
    /// User-global `gitsu/config.json`.
    Global = 1,
    /// Project-local `gitsu.config.json`.
    Project = 2,
    /// Environment variables.
    Environment = 3,
}

impl ConfigSource {
    /// Description for display in diagnostics.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Defaults => "built-in defaults",
            Self::Global => "global configuration",
            Self::Project => "project configuration",
            Self::Environment => "environment variables",
        }
    }
}

/// A config file's contents: every field is optional, so a file can
/// override as few or as many recognized options as it likes.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct PartialConfig {
    production: Option<bool>,
    force: Option<bool>,
    #[serde(rename = "forceLatest")]
    force_latest: Option<bool>,
    interactive: Option<bool>,
    tmp: Option<PathBuf>,
    #[serde(rename = "componentsDir")]
    components_dir: Option<PathBuf>,
}

impl PartialConfig {
    fn apply_to(&self, config: &mut Config) {
        if let Some(v) = self.production {
            config.production = v;
        }
        if let Some(v) = self.force {
            config.force = v;
        }
        if let Some(v) = self.force_latest {
            config.force_latest = v;
        }
        if let Some(v) = self.interactive {
            config.interactive = v;
        }
        if let Some(ref v) = self.tmp {
            config.tmp.clone_from(v);
        }
        if let Some(ref v) = self.components_dir {
            config.components_dir.clone_from(v);
        }
    }
}

/// Loads a [`Config`] from the filesystem and environment.
#[derive(Debug)]
pub struct ConfigLoader {
    project_dir: PathBuf,
}

impl ConfigLoader {
    /// Create a loader rooted at `project_dir` (where `gitsu.config.json`
    /// and `gitsu.json` are read from).
    #[must_use]
    pub fn new(project_dir: impl Into<PathBuf>) -> Self {
        Self {
            project_dir: project_dir.into(),
        }
    }

    /// Path to the user-global config file, if the platform exposes a
    /// config directory.
    #[must_use]
    pub fn global_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "gitsu").map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Path to the project-local config file.
    #[must_use]
    pub fn project_config_path(&self) -> PathBuf {
        self.project_dir.join("gitsu.config.json")
    }

    fn load_partial(path: &Path) -> Result<Option<PartialConfig>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        let partial = sonic_rs::from_str(&content).map_err(|e| ConfigError::json(path, &e))?;
        Ok(Some(partial))
    }

    /// Build the effective configuration by merging every source in order.
    ///
    /// # Errors
    /// Returns an error if a present config file is not valid JSON.
    pub fn load(&self) -> Result<Config> {
        let mut config = Config::default();

        if let Some(global_path) = Self::global_config_path()
            && let Some(partial) = Self::load_partial(&global_path)?
        {
            partial.apply_to(&mut config);
        }

        if let Some(partial) = Self::load_partial(&self.project_config_path())? {
            partial.apply_to(&mut config);
        }

        self.apply_env(&mut config)?;

        Ok(config)
    }

    fn apply_env(&self, config: &mut Config) -> Result<()> {
        if let Ok(val) = std::env::var("GITSU_PRODUCTION") {
            config.production = parse_bool_env("GITSU_PRODUCTION", &val)?;
        }
        if let Ok(val) = std::env::var("GITSU_FORCE") {
            config.force = parse_bool_env("GITSU_FORCE", &val)?;
        }
        if let Ok(val) = std::env::var("GITSU_FORCE_LATEST") {
            config.force_latest = parse_bool_env("GITSU_FORCE_LATEST", &val)?;
        }
        if let Ok(val) = std::env::var("GITSU_NO_INTERACTION") {
            config.interactive = !parse_bool_env("GITSU_NO_INTERACTION", &val)?;
        }
        if let Ok(val) = std::env::var("GITSU_TMP") {
            config.tmp = PathBuf::from(val);
        }
        if let Ok(val) = std::env::var("GITSU_COMPONENTS_DIR") {
            config.components_dir = PathBuf::from(val);
        }
        Ok(())
    }

    /// The project directory this loader reads from.
    #[must_use]
    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }
}

fn parse_bool_env(var: &str, val: &str) -> Result<bool> {
    match val {
        "1" | "true" | "TRUE" | "yes" => Ok(true),
        "0" | "false" | "FALSE" | "no" | "" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            field: var.to_string(),
            message: format!("expected a boolean, got '{other}'"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_with_no_files_present() {
        let dir = tempfile::tempdir().unwrap();
        let loader = ConfigLoader::new(dir.path());
        let config = loader.load().unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn project_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = std::fs::File::create(dir.path().join("gitsu.config.json")).unwrap();
        write!(file, r#"{{"production": true, "forceLatest": true}}"#).unwrap();
        drop(file);

        let loader = ConfigLoader::new(dir.path());
        let config = loader.load().unwrap();
        assert!(config.production);
        assert!(config.force_latest);
        assert!(!config.force);
    }

    #[test]
    fn malformed_project_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("gitsu.config.json"), "{not json}").unwrap();

        let loader = ConfigLoader::new(dir.path());
        assert!(loader.load().is_err());
    }
}
