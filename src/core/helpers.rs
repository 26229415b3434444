//! Helper capabilities an injected shim script can ask the host for.
//!
//! The injector only hands a script the helpers it declared. Names are
//! checked against this fixed list when the table is loaded.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A helper the injector can expose to a shim script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ShimHelper {
    /// Read the shim's resolved options
    #[serde(rename = "getOptions")]
    GetOptions,
    /// Ask the user to opt in and report the answer
    #[serde(rename = "optIn")]
    OptIn,
}

impl ShimHelper {
    /// Every helper the injector provides.
    pub const ALL: [ShimHelper; 2] = [ShimHelper::GetOptions, ShimHelper::OptIn];

    /// Get the helper name as written in shim tables.
    pub fn as_str(&self) -> &'static str {
        match self {
            ShimHelper::GetOptions => "getOptions",
            ShimHelper::OptIn => "optIn",
        }
    }
}

impl fmt::Display for ShimHelper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShimHelper {
    type Err = ShimHelperParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "getOptions" => Ok(ShimHelper::GetOptions),
            "optIn" => Ok(ShimHelper::OptIn),
            _ => Err(ShimHelperParseError(s.to_string())),
        }
    }
}

/// Error returned when a table names a helper the injector doesn't provide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShimHelperParseError(pub String);

impl fmt::Display for ShimHelperParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown shim helper '{}', valid values: getOptions, optIn",
            self.0
        )
    }
}

impl std::error::Error for ShimHelperParseError {}

/// Declared helper requirements of a shim.
pub type HelperSet = BTreeSet<ShimHelper>;
