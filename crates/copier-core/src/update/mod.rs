//! Update detection for generated projects

pub mod answers;
pub mod checker;

pub use answers::{is_template_project, TemplateRecord, ANSWERS_FILE};
pub use checker::{UpdateChecker, UpdateReport, UpdateVerdict};
