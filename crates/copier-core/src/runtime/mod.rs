//! Process execution and tool management
//!
//! This module provides:
//! - A timeout- and cancellation-aware command runner for git and copier
//! - Availability checks for those tools

pub mod command;
pub mod tool;

pub use command::{CancelToken, CommandOutput, CommandRunner, CommandSpec, SystemRunner};
pub use tool::{check_tools, ToolManager, ToolStatus};
