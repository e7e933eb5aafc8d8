//! Decide whether a generated project is behind its template
//!
//! Tags win whenever the remote has any: the lexicographically greatest tag
//! is compared with the recorded version. Only tagless templates fall back
//! to comparing the recorded commit with the tip of the main branch. That
//! fallback can only tell "different", not "newer": a project pinned to a
//! commit ahead of or diverged from the main branch is also reported as
//! having an update.

use super::answers::TemplateRecord;
use crate::config::Settings;
use crate::git::remote::{GitRemote, RefSource};
use crate::templates::version::{commits_match, is_commit_hash, is_newer, newest_tag};
use std::fmt;
use std::path::Path;

/// Outcome of an update check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateVerdict {
    UpToDate,
    UpdateAvailable { newest_version: String },
    /// Update status cannot be determined; not the same as up to date
    Indeterminate { reason: String },
}

impl UpdateVerdict {
    fn indeterminate(reason: &str) -> Self {
        UpdateVerdict::Indeterminate {
            reason: reason.to_string(),
        }
    }

    pub fn is_update_available(&self) -> bool {
        matches!(self, UpdateVerdict::UpdateAvailable { .. })
    }
}

impl fmt::Display for UpdateVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateVerdict::UpToDate => f.write_str("up to date"),
            UpdateVerdict::UpdateAvailable { newest_version } => {
                write!(f, "update available: {}", newest_version)
            }
            UpdateVerdict::Indeterminate { reason } => write!(f, "cannot determine: {}", reason),
        }
    }
}

/// A project's record together with its verdict
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateReport {
    pub record: TemplateRecord,
    pub verdict: UpdateVerdict,
}

/// Classifies template records against their remotes
pub struct UpdateChecker<S = GitRemote> {
    refs: S,
}

impl UpdateChecker<GitRemote> {
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(GitRemote::from_settings(settings))
    }
}

impl<S: RefSource> UpdateChecker<S> {
    pub fn new(refs: S) -> Self {
        Self { refs }
    }

    pub async fn classify(&self, record: &TemplateRecord) -> UpdateVerdict {
        let (Some(source), Some(current)) = (&record.source_path, &record.current_version) else {
            return UpdateVerdict::indeterminate("missing source or version");
        };
        tracing::info!(source = %source, current = %current, "checking for template updates");

        let tags = self.refs.list_tags(source).await;
        if let Some(newest) = newest_tag(&tags) {
            tracing::debug!(count = tags.len(), newest, "comparing against tags");
            return if is_newer(newest, current) {
                tracing::info!(newest, current = %current, "update available");
                UpdateVerdict::UpdateAvailable {
                    newest_version: newest.to_string(),
                }
            } else {
                UpdateVerdict::UpToDate
            };
        }

        tracing::debug!(source = %source, "no tags, falling back to commit comparison");
        if !is_commit_hash(current) {
            return UpdateVerdict::indeterminate("current version is not a recognizable commit hash");
        }

        let Some(latest) = self.refs.latest_commit_on_main_branch(source).await else {
            return UpdateVerdict::indeterminate("could not resolve latest commit");
        };

        if commits_match(&latest, current) {
            UpdateVerdict::UpToDate
        } else {
            tracing::info!(latest = %latest, current = %current, "main branch moved");
            UpdateVerdict::UpdateAvailable {
                newest_version: latest,
            }
        }
    }

    /// Read a project's answers file and classify it
    pub async fn check_project(&self, project_dir: &Path) -> UpdateReport {
        let record = TemplateRecord::read(project_dir);
        let verdict = self.classify(&record).await;
        UpdateReport { record, verdict }
    }
}
