//! Runs `copier copy` and `copier update`
//!
//! Collected answers are handed to copier through a `--data-file` that lives
//! only for the duration of one invocation. Update runs are refused up front
//! when the project has no answers file or has uncommitted changes.

pub mod data_file;

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::git::has_uncommitted_changes;
use crate::runtime::command::{CancelToken, CommandOutput, CommandRunner, CommandSpec, SystemRunner};
use crate::templates::version::requested_version;
use crate::update::is_template_project;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;

pub use data_file::{coerce_value, DataFile};

/// Parameters of one `copier copy` run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CopyRequest {
    pub template_source: String,
    pub target_dir: PathBuf,
    pub version: Option<String>,
    pub variables: BTreeMap<String, String>,
}

impl CopyRequest {
    pub fn new(template_source: impl Into<String>, target_dir: impl Into<PathBuf>) -> Self {
        Self {
            template_source: template_source.into(),
            target_dir: target_dir.into(),
            ..Default::default()
        }
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn variables(mut self, variables: BTreeMap<String, String>) -> Self {
        self.variables = variables;
        self
    }
}

/// Whether `url` is scp-style SSH syntax such as `git@github.com:org/repo.git`
///
/// Those have no `scheme://` part and carry a login before the host colon, so
/// appending `@version` would be read as part of the address.
pub fn is_ssh_url(url: &str) -> bool {
    if url::Url::parse(url).is_ok_and(|parsed| url.starts_with(&format!("{}://", parsed.scheme()))) {
        return false;
    }
    match (url.find('@'), url.find(':')) {
        (Some(at), Some(colon)) => at > 0 && at < colon && colon + 1 < url.len(),
        _ => false,
    }
}

/// Build the `copy` argument list, without the data file
pub fn copy_args(template_source: &str, target_dir: &Path, version: Option<&str>) -> Vec<String> {
    let target = target_dir.display().to_string();
    match requested_version(version) {
        Some(version) if is_ssh_url(template_source) => vec![
            "copy".to_string(),
            template_source.to_string(),
            target,
            "--vcs-ref".to_string(),
            version.to_string(),
        ],
        Some(version) => vec![
            "copy".to_string(),
            format!("{}@{}", template_source, version),
            target,
        ],
        None => vec!["copy".to_string(), template_source.to_string(), target],
    }
}

/// Drives the copier executable
pub struct CopierExecutor<R = SystemRunner> {
    runner: R,
    settings: Settings,
}

impl CopierExecutor<SystemRunner> {
    pub fn from_settings(settings: &Settings) -> Self {
        Self::with_runner(SystemRunner, settings)
    }
}

impl<R: CommandRunner> CopierExecutor<R> {
    pub fn with_runner(runner: R, settings: &Settings) -> Self {
        Self {
            runner,
            settings: settings.clone(),
        }
    }

    /// Generate a project from a template
    ///
    /// The target directory is created when missing. The data file, if any,
    /// is removed before this returns, whatever the outcome.
    pub async fn run(&self, request: &CopyRequest, cancel: &CancelToken) -> Result<CommandOutput> {
        if request.template_source.starts_with('-') {
            return Err(Error::Config(format!(
                "invalid template source `{}`",
                request.template_source
            )));
        }
        fs::create_dir_all(&request.target_dir).await?;

        let mut spec = CommandSpec::new(&self.settings.copier_path, self.settings.timeouts.copy()).args(
            copy_args(
                &request.template_source,
                &request.target_dir,
                request.version.as_deref(),
            ),
        );

        let data_file = if request.variables.is_empty() {
            None
        } else {
            Some(DataFile::create(&request.variables)?)
        };
        if let Some(file) = &data_file {
            spec = spec.args(["--data-file".to_string(), file.path().display().to_string()]);
        }

        tracing::info!(command = %spec.display(), "running copier copy");
        let result = self.execute(&spec, cancel).await;
        drop(data_file);
        result
    }

    /// Update a generated project in place
    ///
    /// Fails with [`Error::NotATemplateProject`] when `target_dir` has no
    /// answers file and with [`Error::DirtyWorkingTree`] when it has local
    /// changes; copier is not invoked in either case.
    pub async fn update(&self, target_dir: &Path, cancel: &CancelToken) -> Result<CommandOutput> {
        if !is_template_project(target_dir) {
            return Err(Error::NotATemplateProject {
                dir: target_dir.to_path_buf(),
            });
        }

        let dirty = has_uncommitted_changes(
            &self.runner,
            &self.settings.git_path,
            target_dir,
            self.settings.timeouts.status(),
            cancel,
        )
        .await?;
        if dirty {
            tracing::error!(dir = %target_dir.display(), "refusing to update a dirty working tree");
            return Err(Error::DirtyWorkingTree {
                dir: target_dir.to_path_buf(),
            });
        }

        let spec = CommandSpec::new(&self.settings.copier_path, self.settings.timeouts.update())
            .args(self.update_args())
            .current_dir(target_dir);

        tracing::info!(command = %spec.display(), dir = %target_dir.display(), "running copier update");
        self.execute(&spec, cancel).await
    }

    fn update_args(&self) -> Vec<String> {
        let mut args = vec![
            "update".to_string(),
            "--conflict".to_string(),
            self.settings.conflict_strategy.as_str().to_string(),
        ];
        if self.settings.skip_answered {
            args.push("--skip-answered".to_string());
        }
        if self.settings.update_to_latest {
            args.push("--vcs-ref".to_string());
            args.push("HEAD".to_string());
        }
        args
    }

    async fn execute(&self, spec: &CommandSpec, cancel: &CancelToken) -> Result<CommandOutput> {
        let output = self.runner.run(spec, cancel).await?;
        if !output.success() {
            tracing::error!(command = %spec.display(), code = ?output.code, "copier failed");
            return Err(Error::CommandExecution {
                command: spec.display(),
                code: output.code,
                stderr: output.stderr,
            });
        }
        tracing::info!("copier finished successfully");
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConflictStrategy;
    use crate::testing::{failed, ok, RecordingRunner};
    use crate::update::ANSWERS_FILE;
    use std::sync::{Arc, Mutex};

    fn vars(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn template_project() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(ANSWERS_FILE),
            "_src_path: https://example.com/t.git\n_commit: v1.0.0\n",
        )
        .unwrap();
        dir
    }

    /// Records the data file path and whether it existed while copier ran
    fn watch_data_file(runner: &RecordingRunner, output: CommandOutput) -> Arc<Mutex<Option<(PathBuf, bool)>>> {
        let seen = Arc::new(Mutex::new(None));
        let slot = seen.clone();
        runner.respond_with(move |spec| {
            let pos = spec.args.iter().position(|a| a == "--data-file")?;
            let path = PathBuf::from(&spec.args[pos + 1]);
            let existed = path.is_file();
            *slot.lock().unwrap() = Some((path, existed));
            Some(Ok(output.clone()))
        });
        seen
    }

    #[test]
    fn test_ssh_url_detection() {
        assert!(is_ssh_url("git@github.com:acme/template.git"));
        assert!(is_ssh_url("deploy@git.internal:team/template"));
        assert!(!is_ssh_url("https://github.com/acme/template.git"));
        assert!(!is_ssh_url("ssh://git@github.com/acme/template.git"));
        assert!(!is_ssh_url("gh:acme/template"));
        assert!(!is_ssh_url("/local/path/template"));
        assert!(!is_ssh_url("git@github.com"));
    }

    #[test]
    fn test_copy_args_version_routing() {
        let target = Path::new("/tmp/out");
        assert_eq!(
            copy_args("https://example.com/t.git", target, Some("v1.2.0")),
            vec!["copy", "https://example.com/t.git@v1.2.0", "/tmp/out"]
        );
        assert_eq!(
            copy_args("git@github.com:acme/t.git", target, Some("v1.2.0")),
            vec!["copy", "git@github.com:acme/t.git", "/tmp/out", "--vcs-ref", "v1.2.0"]
        );
        assert_eq!(
            copy_args("git@github.com:acme/t.git", target, None),
            vec!["copy", "git@github.com:acme/t.git", "/tmp/out"]
        );
        assert_eq!(
            copy_args("https://example.com/t.git", target, Some("--- Branches ---")),
            vec!["copy", "https://example.com/t.git", "/tmp/out"]
        );
    }

    #[tokio::test]
    async fn test_run_creates_target_and_skips_data_file_without_variables() {
        let root = tempfile::tempdir().unwrap();
        let target = root.path().join("nested").join("project");
        let runner = RecordingRunner::new();
        let executor = CopierExecutor::with_runner(runner.clone(), &Settings::default());

        let request = CopyRequest::new("https://example.com/t.git", &target);
        executor.run(&request, &CancelToken::new()).await.unwrap();

        assert!(target.is_dir());
        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].program, "copier");
        assert_eq!(calls[0].timeout, Settings::default().timeouts.copy());
        assert!(!calls[0].args.contains(&"--data-file".to_string()));
    }

    #[tokio::test]
    async fn test_data_file_removed_after_success() {
        let root = tempfile::tempdir().unwrap();
        let runner = RecordingRunner::new();
        let seen = watch_data_file(&runner, ok("Copying from template\n"));
        let executor = CopierExecutor::with_runner(runner.clone(), &Settings::default());

        let request = CopyRequest::new("https://example.com/t.git", root.path())
            .variables(vars(&[("project_name", "demo"), ("port", "8080")]));
        let output = executor.run(&request, &CancelToken::new()).await.unwrap();
        assert!(output.stdout.contains("Copying"));

        let (path, existed) = seen.lock().unwrap().clone().unwrap();
        assert!(existed);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_data_file_removed_after_failure() {
        let root = tempfile::tempdir().unwrap();
        let runner = RecordingRunner::new();
        let seen = watch_data_file(&runner, failed(2, "template not found"));
        let executor = CopierExecutor::with_runner(runner.clone(), &Settings::default());

        let request = CopyRequest::new("https://example.com/t.git", root.path())
            .variables(vars(&[("project_name", "demo")]));
        let err = executor.run(&request, &CancelToken::new()).await.unwrap_err();
        match err {
            Error::CommandExecution { code, stderr, .. } => {
                assert_eq!(code, Some(2));
                assert_eq!(stderr, "template not found");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let (path, existed) = seen.lock().unwrap().clone().unwrap();
        assert!(existed);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_data_file_removed_after_timeout() {
        let root = tempfile::tempdir().unwrap();
        let runner = RecordingRunner::new();
        let seen = Arc::new(Mutex::new(None));
        let slot = seen.clone();
        runner.respond_with(move |spec| {
            let pos = spec.args.iter().position(|a| a == "--data-file")?;
            *slot.lock().unwrap() = Some(PathBuf::from(&spec.args[pos + 1]));
            Some(Err(Error::Timeout {
                command: spec.display(),
                secs: 60,
            }))
        });
        let executor = CopierExecutor::with_runner(runner, &Settings::default());

        let request = CopyRequest::new("https://example.com/t.git", root.path())
            .variables(vars(&[("name", "demo")]));
        let err = executor.run(&request, &CancelToken::new()).await.unwrap_err();
        assert!(matches!(err, Error::Timeout { .. }));

        let path: PathBuf = seen.lock().unwrap().clone().unwrap();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_data_file_removed_after_cancellation() {
        let root = tempfile::tempdir().unwrap();
        let runner = RecordingRunner::new();
        let seen = Arc::new(Mutex::new(None));
        let slot = seen.clone();
        runner.respond_with(move |spec| {
            let pos = spec.args.iter().position(|a| a == "--data-file")?;
            let path = PathBuf::from(&spec.args[pos + 1]);
            *slot.lock().unwrap() = Some((path.clone(), path.exists()));
            Some(Err(Error::Cancelled))
        });
        let executor = CopierExecutor::with_runner(runner, &Settings::default());

        let request = CopyRequest::new("https://example.com/t.git", root.path())
            .variables(vars(&[("name", "demo")]));
        let err = executor.run(&request, &CancelToken::new()).await.unwrap_err();
        assert!(err.is_cancelled());

        let (path, existed) = seen.lock().unwrap().clone().unwrap();
        assert!(existed);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_run_rejects_option_like_source() {
        let root = tempfile::tempdir().unwrap();
        let target = root.path().join("project");
        let runner = RecordingRunner::new();
        let executor = CopierExecutor::with_runner(runner.clone(), &Settings::default());

        let request = CopyRequest::new("--pretend", &target);
        let err = executor.run(&request, &CancelToken::new()).await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(runner.calls().is_empty());
        assert!(!target.exists());
    }

    #[tokio::test]
    async fn test_update_refuses_non_template_project() {
        let dir = tempfile::tempdir().unwrap();
        let runner = RecordingRunner::new();
        let executor = CopierExecutor::with_runner(runner.clone(), &Settings::default());

        let err = executor.update(dir.path(), &CancelToken::new()).await.unwrap_err();
        assert!(matches!(err, Error::NotATemplateProject { .. }));
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_update_refuses_dirty_tree() {
        let dir = template_project();
        let runner = RecordingRunner::new();
        runner.respond(&["status", "--porcelain"], ok(" M src/main.rs\n"));
        let executor = CopierExecutor::with_runner(runner.clone(), &Settings::default());

        let err = executor.update(dir.path(), &CancelToken::new()).await.unwrap_err();
        assert!(matches!(err, Error::DirtyWorkingTree { .. }));
        assert!(err.to_string().starts_with(crate::error::DIRTY_TREE_MESSAGE));
        assert_eq!(runner.calls_with("update"), 0);
    }

    #[tokio::test]
    async fn test_update_passes_settings_flags() {
        let dir = template_project();
        let runner = RecordingRunner::new();
        let settings = Settings {
            conflict_strategy: ConflictStrategy::Rej,
            skip_answered: true,
            update_to_latest: true,
            ..Default::default()
        };
        let executor = CopierExecutor::with_runner(runner.clone(), &settings);
        executor.update(dir.path(), &CancelToken::new()).await.unwrap();

        let calls = runner.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].program, "git");
        let update = &calls[1];
        assert_eq!(
            update.args,
            vec!["update", "--conflict", "rej", "--skip-answered", "--vcs-ref", "HEAD"]
        );
        assert_eq!(update.cwd.as_deref(), Some(dir.path()));
        assert_eq!(update.timeout, settings.timeouts.update());
    }

    #[tokio::test]
    async fn test_update_minimal_flags() {
        let dir = template_project();
        let runner = RecordingRunner::new();
        let settings = Settings {
            skip_answered: false,
            ..Default::default()
        };
        let executor = CopierExecutor::with_runner(runner.clone(), &settings);
        executor.update(dir.path(), &CancelToken::new()).await.unwrap();

        assert_eq!(runner.calls()[1].args, vec!["update", "--conflict", "inline"]);
    }

    #[tokio::test]
    async fn test_update_failure_carries_stderr() {
        let dir = template_project();
        let runner = RecordingRunner::new();
        runner.respond(&["update"], failed(1, "merge conflict"));
        let executor = CopierExecutor::with_runner(runner, &Settings::default());

        let err = executor.update(dir.path(), &CancelToken::new()).await.unwrap_err();
        assert!(err.to_string().contains("merge conflict"));
    }
}
