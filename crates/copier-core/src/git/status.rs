//! Working tree status of a generated project

use crate::runtime::command::{CancelToken, CommandRunner, CommandSpec};
use crate::error::{Error, Result};
use std::path::Path;
use std::time::Duration;

/// Whether `dir` has uncommitted changes according to `git status --porcelain`
///
/// A failing status query (not a repository, git missing) counts as clean
/// and is logged; only cancellation is reported as an error.
pub async fn has_uncommitted_changes<R: CommandRunner + ?Sized>(
    runner: &R,
    git: &str,
    dir: &Path,
    timeout: Duration,
    cancel: &CancelToken,
) -> Result<bool> {
    let spec = CommandSpec::new(git, timeout)
        .args(["status", "--porcelain"])
        .current_dir(dir);

    match runner.run(&spec, cancel).await {
        Ok(output) if output.success() => {
            let dirty = !output.stdout.trim().is_empty();
            tracing::info!(dir = %dir.display(), dirty, "checked working tree");
            Ok(dirty)
        }
        Ok(output) => {
            tracing::warn!(
                dir = %dir.display(),
                stderr = %output.stderr.trim(),
                "git status failed, assuming clean"
            );
            Ok(false)
        }
        Err(Error::Cancelled) => Err(Error::Cancelled),
        Err(e) => {
            tracing::warn!(dir = %dir.display(), error = %e, "git status failed, assuming clean");
            Ok(false)
        }
    }
}
