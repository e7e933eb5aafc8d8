//! Copier Core - Library for generating and updating projects from Copier templates
//!
//! The external `copier` and `git` executables do the real work; this crate
//! discovers what a template asks, which versions it offers, whether a
//! generated project is behind, and drives the tools with bounded,
//! cancellable invocations.
//!
//! # Architecture
//!
//! - **Schema** - [`templates`] turns a template's `copier.yml` into a typed [`VariableSchema`]
//! - **Remote refs** - [`git`] lists tags and branches without a local clone
//! - **Update checks** - [`update`] classifies a project's answers record into an [`UpdateVerdict`]
//! - **Execution** - [`executor`] runs `copier copy` and `copier update`
//! - **Prompts** - [`tui`] is an optional cliclack flow on top of the above (feature-gated)
//!
//! Every component takes a [`Settings`] value explicitly; there is no global
//! configuration.
//!
//! # Feature Flags
//!
//! - `tui` (default): Enables the cliclack-based prompts module
//!
//! # Example Usage (without TUI)
//!
//! ```ignore
//! use copier_core::{CancelToken, CopierExecutor, CopyRequest, Settings, UpdateChecker};
//!
//! let settings = Settings::load_default()?;
//! let report = UpdateChecker::from_settings(&settings).check_project(dir).await;
//! if report.verdict.is_update_available() {
//!     CopierExecutor::from_settings(&settings).update(dir, &CancelToken::new()).await?;
//! }
//! ```

pub mod config;
pub mod error;
pub mod executor;
pub mod git;
pub mod runtime;
pub mod templates;
pub mod update;

#[cfg(feature = "tui")]
pub mod tui;

#[cfg(test)]
mod testing;

// Re-export main types for convenience
pub use config::{ConflictStrategy, Settings};
pub use error::{Error, Result};
pub use executor::{CopierExecutor, CopyRequest};
pub use git::{GitRemote, RemoteVersionSet};
pub use runtime::{CancelToken, CommandOutput, CommandRunner, CommandSpec, SystemRunner};
pub use templates::{fetch_template_schema, TemplateVariable, VariableKind, VariableSchema};
pub use update::{TemplateRecord, UpdateChecker, UpdateReport, UpdateVerdict};

#[cfg(feature = "tui")]
pub use tui::run;
