//! Configuration handed explicitly to each component

pub mod settings;

pub use settings::{ConflictStrategy, Settings, TemplateEntry, Timeouts};
