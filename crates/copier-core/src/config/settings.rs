//! User settings threaded into every component

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable pointing at an explicit settings file
pub const CONFIG_ENV: &str = "COPIER_HELPER_CONFIG";
/// Environment variable overriding the copier executable
pub const COPIER_PATH_ENV: &str = "COPIER_PATH";
/// Environment variable overriding the git executable
pub const GIT_PATH_ENV: &str = "COPIER_GIT_PATH";

/// How `copier update` reports merge conflicts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictStrategy {
    /// Conflict markers written into the file
    #[default]
    Inline,
    /// Separate `.rej` files
    Rej,
}

impl ConflictStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictStrategy::Inline => "inline",
            ConflictStrategy::Rej => "rej",
        }
    }
}

impl fmt::Display for ConflictStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named template the user can refer to instead of a URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateEntry {
    pub name: String,
    pub url: String,
}

/// Time budgets for external invocations, in seconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    pub remote_query: u64,
    pub status: u64,
    pub clone: u64,
    pub copy: u64,
    pub update: u64,
    /// `<tool> --version` during diagnostics
    pub version: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            remote_query: 30,
            status: 10,
            clone: 60,
            copy: 60,
            update: 60,
            version: 10,
        }
    }
}

impl Timeouts {
    pub fn remote_query(&self) -> Duration {
        Duration::from_secs(self.remote_query)
    }

    pub fn status(&self) -> Duration {
        Duration::from_secs(self.status)
    }

    pub fn clone_repo(&self) -> Duration {
        Duration::from_secs(self.clone)
    }

    pub fn copy(&self) -> Duration {
        Duration::from_secs(self.copy)
    }

    pub fn update(&self) -> Duration {
        Duration::from_secs(self.update)
    }

    pub fn version(&self) -> Duration {
        Duration::from_secs(self.version)
    }
}

/// Settings for the template engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Path to the copier executable
    pub copier_path: String,

    /// Path to the git executable
    pub git_path: String,

    /// Conflict handling for `copier update`
    pub conflict_strategy: ConflictStrategy,

    /// Pass `--skip-answered` on update
    pub skip_answered: bool,

    /// Pass `--vcs-ref HEAD` on update
    pub update_to_latest: bool,

    /// Where new projects go when no directory is given
    pub default_output_folder: Option<PathBuf>,

    /// Named templates
    pub default_templates: Vec<TemplateEntry>,

    pub timeouts: Timeouts,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            copier_path: "copier".to_string(),
            git_path: "git".to_string(),
            conflict_strategy: ConflictStrategy::Inline,
            skip_answered: true,
            update_to_latest: false,
            default_output_folder: None,
            default_templates: Vec::new(),
            timeouts: Timeouts::default(),
        }
    }
}

impl Settings {
    /// Parse settings from YAML text
    pub fn from_yaml(content: &str) -> Result<Self> {
        Self::parse(content).map_err(|e| Error::Config(e.to_string()))
    }

    fn parse(content: &str) -> std::result::Result<Self, serde_yaml::Error> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }

    /// Load settings from `path`; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self> {
        let settings = match std::fs::read_to_string(path) {
            Ok(content) => Self::parse(&content)
                .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no settings file, using defaults");
                Self::default()
            }
            Err(e) => {
                return Err(Error::Config(format!(
                    "failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };
        Ok(settings.with_env_overrides())
    }

    /// Load from `$COPIER_HELPER_CONFIG` or the platform config directory
    pub fn load_default() -> Result<Self> {
        match Self::default_path() {
            Some(path) => Self::load(&path),
            None => Ok(Self::default().with_env_overrides()),
        }
    }

    /// Resolved location of the settings file
    pub fn default_path() -> Option<PathBuf> {
        std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .or_else(|| dirs::config_dir().map(|d| d.join("copier-helper").join("settings.yaml")))
    }

    /// Apply `COPIER_PATH` / `COPIER_GIT_PATH`
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(path) = std::env::var(COPIER_PATH_ENV) {
            if !path.trim().is_empty() {
                self.copier_path = path;
            }
        }
        if let Ok(path) = std::env::var(GIT_PATH_ENV) {
            if !path.trim().is_empty() {
                self.git_path = path;
            }
        }
        self
    }

    /// Look up a configured template by name (case-insensitive)
    pub fn find_template(&self, name: &str) -> Option<&TemplateEntry> {
        self.default_templates
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(name))
    }

    /// Resolve a user-supplied template reference to a URL
    pub fn resolve_template<'a>(&'a self, reference: &'a str) -> &'a str {
        self.find_template(reference)
            .map(|t| t.url.as_str())
            .unwrap_or(reference)
    }
}
