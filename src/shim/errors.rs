//! Errors raised while loading and querying a shim table.
//!
//! Only loading can fail hard. Queries against a loaded registry never
//! return errors to `dispatch` callers; an unknown id is reported through
//! [`UnknownShimError`] where a caller explicitly asked for a shim.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use crate::core::helpers::ShimHelperParseError;
use crate::core::resource::ResourceTypeParseError;

/// A table could not be turned into a registry.
#[derive(Debug, Error, Diagnostic)]
pub enum LoadError {
    #[error("failed to read shim table {}", path.display())]
    #[diagnostic(code(shimreg::load::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse shim table: {message}")]
    #[diagnostic(code(shimreg::load::parse))]
    Parse { message: String },

    #[error("shim #{index} has an empty id")]
    #[diagnostic(code(shimreg::load::empty_id))]
    EmptyId { index: usize },

    #[error("duplicate shim id `{id}`")]
    #[diagnostic(
        code(shimreg::load::duplicate_id),
        help("shim ids must be unique across the table")
    )]
    DuplicateId { id: String },

    #[error("shim `{id}` has a bare match pattern but no `file` to serve")]
    #[diagnostic(
        code(shimreg::load::missing_file),
        help("add `file`, or give every match entry an explicit `target`")
    )]
    MissingFile { id: String },

    #[error("shim `{id}` has a match entry without patterns")]
    #[diagnostic(code(shimreg::load::empty_patterns))]
    EmptyPatterns { id: String },

    #[error("shim `{id}` option `{key}` is invalid: {reason}")]
    #[diagnostic(
        code(shimreg::load::invalid_option),
        help("scoped options look like `{{ value = ..., branches = [...] }}` or `{{ value = ..., platform = \"...\" }}`")
    )]
    InvalidOption {
        id: String,
        key: String,
        reason: String,
    },

    #[error("shim `{id}`: {source}")]
    #[diagnostic(code(shimreg::load::unknown_helper))]
    UnknownHelper {
        id: String,
        #[source]
        source: ShimHelperParseError,
    },

    #[error("shim `{id}`: {source}")]
    #[diagnostic(code(shimreg::load::unknown_resource_type))]
    UnknownResourceType {
        id: String,
        #[source]
        source: ResourceTypeParseError,
    },
}

/// A match pattern failed to compile. The owning shim is left out of the
/// registry; the rest of the table still loads.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
#[error("shim `{shim}` has an invalid match pattern `{pattern}`: {reason}")]
#[diagnostic(
    code(shimreg::load::pattern),
    help("patterns look like `*://host.example.com/path*`")
)]
pub struct PatternError {
    pub shim: String,
    pub pattern: String,
    pub reason: String,
}

/// A lookup named a shim that isn't in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
#[error("no shim with id `{id}`")]
#[diagnostic(
    code(shimreg::unknown_shim),
    help("run `shimreg list --all` to see registered shims")
)]
pub struct UnknownShimError {
    pub id: String,
}

impl UnknownShimError {
    pub fn new(id: impl Into<String>) -> Self {
        UnknownShimError { id: id.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = LoadError::DuplicateId {
            id: "AdNexus".to_string(),
        };
        assert_eq!(err.to_string(), "duplicate shim id `AdNexus`");

        let err = LoadError::UnknownHelper {
            id: "Rambler".to_string(),
            source: ShimHelperParseError("getCookies".to_string()),
        };
        assert!(err.to_string().contains("unknown shim helper 'getCookies'"));

        let err = PatternError {
            shim: "Broken".to_string(),
            pattern: "example.com".to_string(),
            reason: "missing `://` after scheme".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "shim `Broken` has an invalid match pattern `example.com`: missing `://` after scheme"
        );

        assert_eq!(
            UnknownShimError::new("Nope").to_string(),
            "no shim with id `Nope`"
        );
    }
}
