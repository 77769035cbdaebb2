//! Domain newtypes for branchsync.
//!
//! Everything here is transient: recomputed from the repository and the CI
//! server on every run.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

macro_rules! string_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }
    };
}

string_newtype!(
    /// Name of a live remote branch head (`refs/heads/<name>` → `<name>`).
    BranchName
);

string_newtype!(
    /// Name of a CI job, managed or not.
    JobName
);

string_newtype!(
    /// Name of a CI dashboard view, managed or not.
    ViewName
);

/// Opaque job configuration payload produced by the renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor(pub String);

impl Descriptor {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Descriptor {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Reference to a view that jobs can be added to.
///
/// Returned by `create_view`; in preview mode it is a placeholder that names a
/// view which was never created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewHandle {
    pub name: ViewName,
    pub placeholder: bool,
}

impl ViewHandle {
    /// Handle for a view that exists on the server.
    pub fn existing(name: ViewName) -> Self {
        Self { name, placeholder: false }
    }

    /// Handle for a view that was only previewed.
    pub fn placeholder(name: ViewName) -> Self {
        Self { name, placeholder: true }
    }
}

impl fmt::Display for ViewHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.placeholder {
            write!(f, "{} (preview)", self.name)
        } else {
            self.name.fmt(f)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newtype_display() {
        assert_eq!(BranchName::from("main").to_string(), "main");
        assert_eq!(JobName::from("ci-main-job").to_string(), "ci-main-job");
        assert_eq!(ViewName::from("view-main").as_str(), "view-main");
    }

    #[test]
    fn newtype_equality() {
        assert_eq!(BranchName::from("x"), BranchName::from(String::from("x")));
    }

    #[test]
    fn placeholder_handle_display_marks_preview() {
        let handle = ViewHandle::placeholder(ViewName::from("v-main"));
        assert_eq!(handle.to_string(), "v-main (preview)");
        assert_eq!(ViewHandle::existing(ViewName::from("v-main")).to_string(), "v-main");
    }
}
