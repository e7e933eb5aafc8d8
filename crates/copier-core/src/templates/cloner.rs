//! Local checkouts of template repositories
//!
//! Reading a template's schema needs its files on disk. The checkout lives in
//! a uniquely named temporary directory that is removed when the returned
//! [`ClonedTemplate`] is dropped.

use super::schema::VariableSchema;
use super::version::requested_version;
use crate::config::Settings;
use crate::error::{Error, Result};
use crate::runtime::command::{CancelToken, CommandRunner, CommandSpec, SystemRunner};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

/// Schema filenames, in lookup priority order
pub const SCHEMA_FILE_NAMES: &[&str] = &["copier.yaml", ".copier.yaml", "copier.yml", ".copier.yml"];

/// Find the schema file in a template directory
pub fn find_schema_file(dir: &Path) -> Option<PathBuf> {
    let found = SCHEMA_FILE_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file());
    match &found {
        Some(path) => tracing::debug!(path = %path.display(), "found template schema"),
        None => tracing::warn!(dir = %dir.display(), "no template schema file found"),
    }
    found
}

/// Find and normalize the schema of a template directory
pub fn load_template_schema(dir: &Path) -> Result<VariableSchema> {
    let path = find_schema_file(dir).ok_or_else(|| Error::SchemaNotFound {
        dir: dir.to_path_buf(),
    })?;
    VariableSchema::load(&path)
}

/// A temporary checkout of a template repository
#[derive(Debug)]
pub struct ClonedTemplate {
    dir: TempDir,
}

impl ClonedTemplate {
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn schema_file(&self) -> Option<PathBuf> {
        find_schema_file(self.path())
    }

    pub fn load_schema(&self) -> Result<VariableSchema> {
        load_template_schema(self.path())
    }
}

/// Clones template repositories with git
pub struct TemplateCloner<R = SystemRunner> {
    runner: R,
    git: String,
    timeout: Duration,
}

impl TemplateCloner<SystemRunner> {
    pub fn from_settings(settings: &Settings) -> Self {
        Self::with_runner(SystemRunner, settings)
    }
}

impl<R: CommandRunner> TemplateCloner<R> {
    pub fn with_runner(runner: R, settings: &Settings) -> Self {
        Self {
            runner,
            git: settings.git_path.clone(),
            timeout: settings.timeouts.clone_repo(),
        }
    }

    /// Clone `url` (at `version`, when given) into a fresh temporary directory
    pub async fn clone_template(
        &self,
        url: &str,
        version: Option<&str>,
        cancel: &CancelToken,
    ) -> Result<ClonedTemplate> {
        let dir = tempfile::Builder::new().prefix("copier-template-").tempdir()?;
        tracing::info!(url, version, dir = %dir.path().display(), "cloning template");

        let mut spec = CommandSpec::new(&self.git, self.timeout).arg("clone");
        if let Some(version) = requested_version(version) {
            spec = spec.args(["--branch", version]);
        }
        // `--` keeps a url beginning with `-` from being read as an option.
        spec = spec.args(["--".to_string(), url.to_string(), dir.path().display().to_string()]);

        // On any error `dir` is dropped here and the partial checkout removed.
        let output = self.runner.run(&spec, cancel).await?;
        if !output.success() {
            return Err(Error::CommandExecution {
                command: spec.display(),
                code: output.code,
                stderr: output.stderr,
            });
        }

        Ok(ClonedTemplate { dir })
    }

    /// Clone a template and read its variable schema
    pub async fn fetch_schema(
        &self,
        url: &str,
        version: Option<&str>,
        cancel: &CancelToken,
    ) -> Result<(ClonedTemplate, VariableSchema)> {
        let cloned = self.clone_template(url, version, cancel).await?;
        let schema = cloned.load_schema()?;
        Ok((cloned, schema))
    }
}
