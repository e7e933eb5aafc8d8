//! Git plumbing: remote ref enumeration and working tree status

pub mod remote;
pub mod status;

pub use remote::{pick_main_branch, GitRemote, RefSource, RemoteVersionSet, MAIN_BRANCH_NAMES};
pub use status::has_uncommitted_changes;
