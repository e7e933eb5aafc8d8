//! Template checkout, schema parsing and version handling
//!
//! This module provides:
//! - The closed YAML document model ([`DocValue`])
//! - Variable schema normalization ([`VariableSchema`], [`TemplateVariable`])
//! - Temporary template checkouts and schema file discovery
//! - Version helpers shared by the orchestrator and the update checker

pub mod cloner;
pub mod schema;
pub mod value;
pub mod version;

use crate::config::Settings;
use crate::error::Result;
use crate::runtime::command::CancelToken;

pub use cloner::{find_schema_file, load_template_schema, ClonedTemplate, TemplateCloner};
pub use schema::{TemplateVariable, VariableKind, VariableSchema};
pub use value::DocValue;

/// Clone a template at `version` and return its variable schema
///
/// The checkout is removed before this returns.
pub async fn fetch_template_schema(
    settings: &Settings,
    url: &str,
    version: Option<&str>,
    cancel: &CancelToken,
) -> Result<VariableSchema> {
    let cloner = TemplateCloner::from_settings(settings);
    let (_checkout, schema) = cloner.fetch_schema(url, version, cancel).await?;
    Ok(schema)
}
