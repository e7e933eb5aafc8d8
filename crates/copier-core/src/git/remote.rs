//! Tag and branch enumeration against a remote, without a local clone
//!
//! Everything here is best effort. A listing that times out or exits
//! non-zero is logged and yields an empty result, so one failed query gives
//! partial data instead of aborting the caller.

use crate::config::Settings;
use crate::error::Error;
use crate::runtime::command::{CancelToken, CommandRunner, CommandSpec, SystemRunner};
use async_trait::async_trait;
use std::time::Duration;

const TAG_PREFIX: &str = "refs/tags/";
const HEAD_PREFIX: &str = "refs/heads/";

/// Suffix git appends to the peeled commit of an annotated tag
const PEELED_SUFFIX: &str = "^{}";

/// Branch names tried, in order, when looking for the main line
pub const MAIN_BRANCH_NAMES: &[&str] = &["main", "master", "trunk", "develop"];

/// Tags and branches of a remote as of one enumeration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteVersionSet {
    pub tags: Vec<String>,
    pub branches: Vec<String>,
}

impl RemoteVersionSet {
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty() && self.branches.is_empty()
    }
}

/// Source of remote ref information for update checks
#[async_trait]
pub trait RefSource: Send + Sync {
    async fn list_tags(&self, remote: &str) -> Vec<String>;

    async fn latest_commit_on_main_branch(&self, remote: &str) -> Option<String>;
}

/// Parse `git ls-remote` output, keeping names under `prefix` with the prefix stripped
pub fn parse_ref_lines(stdout: &str, prefix: &str) -> Vec<String> {
    stdout
        .lines()
        .filter_map(|line| {
            let (_hash, reference) = line.trim().split_once(char::is_whitespace)?;
            reference.trim_start().strip_prefix(prefix)
        })
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Pick the branch treated as the main line
///
/// Prefers [`MAIN_BRANCH_NAMES`] in order, otherwise the first branch the
/// remote reported. The fallback is a guess: the remote's HEAD may point
/// elsewhere.
pub fn pick_main_branch(branches: &[String]) -> Option<&str> {
    MAIN_BRANCH_NAMES
        .iter()
        .copied()
        .find(|name| branches.iter().any(|b| b == *name))
        .or_else(|| branches.first().map(String::as_str))
}

/// Lists refs of remote repositories with `git ls-remote`
pub struct GitRemote<R = SystemRunner> {
    runner: R,
    git: String,
    timeout: Duration,
    cancel: CancelToken,
}

impl GitRemote<SystemRunner> {
    pub fn from_settings(settings: &Settings) -> Self {
        Self::with_runner(SystemRunner, settings)
    }
}

impl<R: CommandRunner> GitRemote<R> {
    pub fn with_runner(runner: R, settings: &Settings) -> Self {
        Self {
            runner,
            git: settings.git_path.clone(),
            timeout: settings.timeouts.remote_query(),
            cancel: CancelToken::new(),
        }
    }

    /// Observe `cancel`; a cancelled query behaves like a failed one
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub async fn list_tags(&self, remote: &str) -> Vec<String> {
        let stdout = self.ls_remote(&["--tags", "--", remote]).await.unwrap_or_default();
        parse_ref_lines(&stdout, TAG_PREFIX)
            .into_iter()
            .filter(|tag| !tag.ends_with(PEELED_SUFFIX))
            .collect()
    }

    pub async fn list_branches(&self, remote: &str) -> Vec<String> {
        let stdout = self.ls_remote(&["--heads", "--", remote]).await.unwrap_or_default();
        parse_ref_lines(&stdout, HEAD_PREFIX)
    }

    /// Tags and branches, queried concurrently
    pub async fn list_versions(&self, remote: &str) -> RemoteVersionSet {
        let (tags, branches) = tokio::join!(self.list_tags(remote), self.list_branches(remote));
        RemoteVersionSet { tags, branches }
    }

    /// Tip commit of the remote's main line, if it can be resolved
    pub async fn latest_commit_on_main_branch(&self, remote: &str) -> Option<String> {
        let branches = self.list_branches(remote).await;
        let Some(branch) = pick_main_branch(&branches) else {
            tracing::warn!(remote, "no branches found");
            return None;
        };
        tracing::info!(remote, branch, "using branch as main line");

        let reference = format!("{HEAD_PREFIX}{branch}");
        let stdout = self.ls_remote(&["--", remote, reference.as_str()]).await?;
        let commit = stdout
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .and_then(|line| line.split_whitespace().next())
            .map(str::to_string);

        match &commit {
            Some(hash) => tracing::info!(remote, branch, commit = %hash, "resolved latest commit"),
            None => tracing::warn!(remote, branch, "no commit found for branch"),
        }
        commit
    }

    /// Run `git ls-remote <args>`; `None` on any failure
    async fn ls_remote(&self, args: &[&str]) -> Option<String> {
        let spec = CommandSpec::new(&self.git, self.timeout)
            .arg("ls-remote")
            .args(args.iter().copied());

        let failure = match self.runner.run(&spec, &self.cancel).await {
            Ok(output) if output.success() => return Some(output.stdout),
            Ok(output) => Error::RemoteQuery {
                command: spec.display(),
                reason: format!(
                    "exit code {}: {}",
                    output.code.map_or_else(|| "unknown".to_string(), |c| c.to_string()),
                    output.stderr.trim()
                ),
            },
            Err(e) => Error::RemoteQuery {
                command: spec.display(),
                reason: e.to_string(),
            },
        };
        tracing::warn!(error = %failure, "remote query failed");
        None
    }
}

#[async_trait]
impl<R: CommandRunner> RefSource for GitRemote<R> {
    async fn list_tags(&self, remote: &str) -> Vec<String> {
        GitRemote::list_tags(self, remote).await
    }

    async fn latest_commit_on_main_branch(&self, remote: &str) -> Option<String> {
        GitRemote::latest_commit_on_main_branch(self, remote).await
    }
}
