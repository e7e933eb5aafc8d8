//! Availability checks for the external tools the engine drives
//!
//! Both git and copier are opaque executables; this module only answers
//! "is it there, which version" and points at the docs when it is not.

use crate::config::Settings;
use crate::runtime::command::{CancelToken, CommandRunner, CommandSpec, SystemRunner};
use std::fmt;
use std::time::Duration;

/// Configuration for an external CLI tool
#[derive(Debug, Clone)]
pub struct ToolConfig {
    /// Executable name or path (e.g., "copier", "/opt/bin/git")
    pub program: String,
    /// Display name for user-facing messages
    pub display_name: &'static str,
    /// URL to the documentation
    pub docs_url: &'static str,
    /// Suggested install command
    pub install_hint: &'static str,
    /// Budget for `<program> --version`
    pub timeout: Duration,
}

/// Detection result for one tool
#[derive(Debug, Clone)]
pub struct ToolStatus {
    pub name: &'static str,
    pub program: String,
    pub version: Option<String>,
    pub available: bool,
}

impl fmt::Display for ToolStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.version, self.available) {
            (Some(version), true) => write!(f, "{} ({})", self.name, version),
            (None, true) => write!(f, "{} (unknown version)", self.name),
            _ => write!(f, "{} (not found: {})", self.name, self.program),
        }
    }
}

/// Manager for checking an external tool
pub struct ToolManager<R = SystemRunner> {
    config: ToolConfig,
    runner: R,
}

impl ToolManager<SystemRunner> {
    pub fn new(config: ToolConfig) -> Self {
        Self::with_runner(SystemRunner, config)
    }
}

impl<R: CommandRunner> ToolManager<R> {
    pub fn with_runner(runner: R, config: ToolConfig) -> Self {
        Self { config, runner }
    }

    pub fn config(&self) -> &ToolConfig {
        &self.config
    }

    /// Run `<program> --version`; `None` when it cannot be started, fails or times out
    pub async fn get_version(&self, cancel: &CancelToken) -> Option<String> {
        let spec = CommandSpec::new(&self.config.program, self.config.timeout).arg("--version");
        match self.runner.run(&spec, cancel).await {
            Ok(output) if output.success() => Some(output.stdout.trim().to_string()),
            Ok(output) => {
                tracing::debug!(program = %self.config.program, code = ?output.code, "version query failed");
                None
            }
            Err(e) => {
                tracing::debug!(program = %self.config.program, error = %e, "version query failed");
                None
            }
        }
    }

    pub async fn status(&self, cancel: &CancelToken) -> ToolStatus {
        let version = self.get_version(cancel).await;
        ToolStatus {
            name: self.config.display_name,
            program: self.config.program.clone(),
            available: version.is_some(),
            version,
        }
    }

    /// Open the tool's documentation in the default browser
    pub fn open_docs(&self) -> std::io::Result<()> {
        tracing::info!(url = self.config.docs_url, "opening documentation");
        open::that(self.config.docs_url)
    }
}

/// Tool manager for the configured copier executable
pub fn copier_tool(settings: &Settings) -> ToolManager {
    ToolManager::new(ToolConfig {
        program: settings.copier_path.clone(),
        display_name: "Copier",
        docs_url: "https://copier.readthedocs.io/",
        install_hint: "pipx install copier",
        timeout: settings.timeouts.version(),
    })
}

/// Tool manager for the configured git executable
pub fn git_tool(settings: &Settings) -> ToolManager {
    ToolManager::new(ToolConfig {
        program: settings.git_path.clone(),
        display_name: "Git",
        docs_url: "https://git-scm.com/doc",
        install_hint: "https://git-scm.com/downloads",
        timeout: settings.timeouts.version(),
    })
}

/// Check every tool the engine needs
pub async fn check_tools(settings: &Settings, cancel: &CancelToken) -> Vec<(ToolManager, ToolStatus)> {
    let mut checked = Vec::new();
    for tool in [git_tool(settings), copier_tool(settings)] {
        let status = tool.status(cancel).await;
        checked.push((tool, status));
    }
    checked
}
