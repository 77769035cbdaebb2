//! Branch ↔ job/view naming convention.
//!
//! Managed-name detection is an unanchored search: the prefix may occur
//! anywhere in the name as long as the suffix occurs somewhere after it.
//! Names that merely contain both fragments in order are therefore treated as
//! managed too.

use crate::types::{BranchName, JobName, ViewName};

/// Prefix/suffix pairs that define which jobs and views this tool owns.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NamingConvention {
    pub job_prefix: String,
    pub job_suffix: String,
    pub view_prefix: String,
    /// Only consulted when classifying existing views; never appended.
    pub view_suffix: String,
}

impl NamingConvention {
    pub fn new(
        job_prefix: impl Into<String>,
        job_suffix: impl Into<String>,
        view_prefix: impl Into<String>,
        view_suffix: impl Into<String>,
    ) -> Self {
        Self {
            job_prefix: job_prefix.into(),
            job_suffix: job_suffix.into(),
            view_prefix: view_prefix.into(),
            view_suffix: view_suffix.into(),
        }
    }

    /// `job_prefix + branch + job_suffix`
    pub fn job_name(&self, branch: &BranchName) -> JobName {
        JobName(format!("{}{}{}", self.job_prefix, branch.0, self.job_suffix))
    }

    /// `view_prefix + branch`
    pub fn view_name(&self, branch: &BranchName) -> ViewName {
        ViewName(format!("{}{}", self.view_prefix, branch.0))
    }

    pub fn is_managed_job(&self, name: &str) -> bool {
        contains_in_order(name, &self.job_prefix, &self.job_suffix)
    }

    pub fn is_managed_view(&self, name: &str) -> bool {
        contains_in_order(name, &self.view_prefix, &self.view_suffix)
    }
}

/// `true` if `prefix` occurs in `haystack` and `suffix` occurs after the end
/// of that occurrence. Taking the leftmost prefix leaves the longest tail for
/// the suffix, so no other occurrence can succeed where this one fails.
fn contains_in_order(haystack: &str, prefix: &str, suffix: &str) -> bool {
    match haystack.find(prefix) {
        Some(start) => haystack[start + prefix.len()..].contains(suffix),
        None => false,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
