//! The answers record copier leaves in a generated project

use crate::templates::value::DocValue;
use std::path::{Path, PathBuf};

/// Answers file name in a generated project's root
pub const ANSWERS_FILE: &str = ".copier-answers.yml";

const SOURCE_KEY: &str = "_src_path";
/// Version keys, in priority order
const VERSION_KEYS: &[&str] = &["_commit", "_version"];

/// Template source and version a project was generated from
///
/// Either field may be absent; such a record cannot be checked for updates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateRecord {
    pub source_path: Option<String>,
    pub current_version: Option<String>,
}

impl TemplateRecord {
    pub fn new(source_path: impl Into<String>, current_version: impl Into<String>) -> Self {
        Self {
            source_path: Some(source_path.into()),
            current_version: Some(current_version.into()),
        }
    }

    /// Extract the record from a loaded answers document
    pub fn from_document(answers: &DocValue) -> Self {
        let string_at = |key: &str| answers.get(key).and_then(DocValue::as_str).map(str::to_string);
        // A source that parses as a git option is never handed to git.
        let source_path = string_at(SOURCE_KEY).filter(|src| {
            let usable = !src.starts_with('-');
            if !usable {
                tracing::warn!(source = %src, "ignoring template source that looks like an option");
            }
            usable
        });
        Self {
            source_path,
            current_version: VERSION_KEYS.iter().find_map(|key| string_at(*key)),
        }
    }

    /// Parse answers YAML; unparseable text yields an empty record
    pub fn from_yaml(content: &str) -> Self {
        match serde_yaml::from_str::<serde_yaml::Value>(content) {
            Ok(value) => Self::from_document(&DocValue::from(value)),
            Err(e) => {
                tracing::warn!(error = %e, "failed to parse answers file");
                Self::default()
            }
        }
    }

    /// Read the answers file of `project_dir`; a missing file yields an empty record
    pub fn read(project_dir: &Path) -> Self {
        let path = answers_path(project_dir);
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                tracing::debug!(path = %path.display(), "read answers file");
                Self::from_yaml(&content)
            }
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "no readable answers file");
                Self::default()
            }
        }
    }

    /// Both fields present
    pub fn is_checkable(&self) -> bool {
        self.source_path.is_some() && self.current_version.is_some()
    }
}

pub fn answers_path(project_dir: &Path) -> PathBuf {
    project_dir.join(ANSWERS_FILE)
}

/// Whether `project_dir` was generated from a copier template
pub fn is_template_project(project_dir: &Path) -> bool {
    answers_path(project_dir).is_file()
}
