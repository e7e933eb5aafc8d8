//! Version handling for template refs
//!
//! Ordering is plain string ordering. Tags such as `1.10.0` sort below
//! `1.9.0`; templates that need numeric ordering should zero-pad their tags.

/// Version-picker rows starting with this prefix are separators, not refs
const SEPARATOR_PREFIX: &str = "---";

/// Normalize a requested version: blank values and separators mean "none"
pub fn requested_version(version: Option<&str>) -> Option<&str> {
    version
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.starts_with(SEPARATOR_PREFIX))
}

/// Lexicographically greatest tag
pub fn newest_tag(tags: &[String]) -> Option<&str> {
    tags.iter().max().map(String::as_str)
}

/// Whether `candidate` is strictly newer than `current` under string ordering
pub fn is_newer(candidate: &str, current: &str) -> bool {
    candidate != current && candidate > current
}

/// Whether a recorded version looks like an abbreviated or full commit hash
pub fn is_commit_hash(version: &str) -> bool {
    (7..=40).contains(&version.len()) && version.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f'))
}

/// Whether two commit hashes name the same commit, allowing short forms
pub fn commits_match(a: &str, b: &str) -> bool {
    a == b || a.starts_with(b) || b.starts_with(a)
}
