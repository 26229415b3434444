//! Shim definitions.
//!
//! A table is first deserialized into [`RawShim`] records, which mirror the
//! table format field by field. Validation turns each record into an
//! immutable [`ShimDefinition`] with compiled patterns, typed platforms and
//! helpers, and compiled option rules.

use std::collections::{BTreeMap, BTreeSet};

use serde::Deserialize;
use serde_json::Value;

use crate::core::context::RuntimeContext;
use crate::core::helpers::HelperSet;
use crate::core::options::{OptionRule, ResolvedOptions};
use crate::core::platform::{any_branch_matches, BranchSpec, Platform};
use crate::core::resource::{ResourceType, ResourceTypeSet};
use crate::shim::pattern::MatchPattern;

/// A validated shim definition.
#[derive(Debug, Clone)]
pub struct ShimDefinition {
    /// Unique identifier
    pub id: String,

    /// Human-readable name
    pub name: Option<String>,

    /// Tracking bug
    pub bug: Option<String>,

    /// Globally switched off
    pub disabled: bool,

    /// Host platform gate
    pub platform: Platform,

    /// Release branches the shim is limited to, if any
    pub branches: Option<Vec<BranchSpec>>,

    /// Page hosts the shim is limited to
    pub hosts: Option<BTreeSet<String>>,

    /// Page hosts the shim never applies to
    pub not_hosts: Option<BTreeSet<String>>,

    /// Match entries, in declared order
    pub matches: Vec<MatchEntry>,

    /// Default resource served for bare patterns
    pub file: Option<String>,

    /// Helpers the injected script needs
    pub needs_shim_helpers: HelperSet,

    /// Images shown by the opt-in prompt
    pub logos: Vec<String>,

    /// Option rules by key
    pub options: BTreeMap<String, OptionRule>,

    /// Extra URLs unblocked once the user opts in
    pub unblocks_on_opt_in: Vec<MatchEntry>,

    /// Only applies when tracking protection would block the request
    pub only_if_blocked_by_etp: bool,
}

impl ShimDefinition {
    /// Display name, falling back to the id.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }

    /// Whether the injector has to provide anything to this shim.
    pub fn needs_helpers(&self) -> bool {
        !self.needs_shim_helpers.is_empty()
    }

    /// Resolve every option rule against a context.
    pub fn resolve_options(&self, ctx: &RuntimeContext) -> ResolvedOptions {
        self.options
            .iter()
            .filter_map(|(key, rule)| rule.resolve(ctx).map(|v| (key.clone(), v.clone())))
            .collect()
    }

    /// Iterate over every compiled pattern of the shim.
    pub fn patterns(&self) -> impl Iterator<Item = &MatchPattern> + '_ {
        self.matches
            .iter()
            .chain(self.unblocks_on_opt_in.iter())
            .flat_map(|entry| entry.patterns.iter())
    }
}

/// One entry of a `matches` or `unblocksOnOptIn` list.
#[derive(Debug, Clone)]
pub struct MatchEntry {
    /// Patterns tried in order; the first hit wins
    pub patterns: Vec<MatchPattern>,

    /// Resource served instead of the shim's file
    pub target: Option<String>,

    /// Resource types the entry is restricted to
    pub types: Option<ResourceTypeSet>,

    /// Branches the entry is restricted to
    pub branches: Option<Vec<BranchSpec>>,

    /// Written as a bare pattern string
    pub bare: bool,
}

impl MatchEntry {
    /// Find the first pattern that matches the URL.
    pub fn first_hit(&self, url: &str) -> Option<&MatchPattern> {
        self.patterns.iter().find(|p| p.matches(url))
    }

    /// Check the entry's resource type restriction.
    pub fn admits_type(&self, resource_type: ResourceType) -> bool {
        self.types
            .as_ref()
            .map_or(true, |types| types.contains(&resource_type))
    }

    /// Check the entry's branch restriction.
    pub fn admits_branch(&self, ctx: &RuntimeContext) -> bool {
        self.branches
            .as_ref()
            .map_or(true, |b| any_branch_matches(b, ctx.channel, ctx.platform))
    }

    /// Resource served on a hit: the explicit target or the shim's file.
    pub fn resource<'a>(&'a self, shim: &'a ShimDefinition) -> Option<&'a str> {
        self.target.as_deref().or(shim.file.as_deref())
    }
}

/// A shim table as stored on disk.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTable {
    #[serde(default)]
    pub shims: Vec<RawShim>,
}

/// A shim record before validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawShim {
    pub id: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub bug: Option<String>,

    #[serde(default)]
    pub disabled: bool,

    #[serde(default = "default_platform")]
    pub platform: String,

    #[serde(default)]
    pub branches: Option<Vec<String>>,

    #[serde(default)]
    pub hosts: Option<Vec<String>>,

    #[serde(default)]
    pub not_hosts: Option<Vec<String>>,

    #[serde(default)]
    pub matches: Vec<RawMatchEntry>,

    #[serde(default)]
    pub file: Option<String>,

    #[serde(default)]
    pub needs_shim_helpers: Vec<String>,

    #[serde(default)]
    pub logos: Vec<String>,

    #[serde(default)]
    pub options: BTreeMap<String, Value>,

    #[serde(default)]
    pub unblocks_on_opt_in: Vec<RawMatchEntry>,

    #[serde(default, rename = "onlyIfBlockedByETP")]
    pub only_if_blocked_by_etp: bool,

    /// Fields we don't know about, reported and ignored
    #[serde(flatten)]
    pub unknown: BTreeMap<String, Value>,
}

fn default_platform() -> String {
    "all".to_string()
}

/// A match entry before validation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawMatchEntry {
    /// Bare pattern serving the shim's own file
    Pattern(String),
    /// Structured entry
    Entry {
        patterns: Vec<String>,
        #[serde(default)]
        target: Option<String>,
        #[serde(default)]
        types: Option<Vec<String>>,
        #[serde(default)]
        branches: Option<Vec<String>>,
    },
}

impl RawMatchEntry {
    /// Create a bare pattern entry.
    pub fn pattern(pattern: impl Into<String>) -> Self {
        RawMatchEntry::Pattern(pattern.into())
    }

    /// Create a structured entry serving `target` for the given types.
    pub fn targeted(patterns: &[&str], target: impl Into<String>, types: &[&str]) -> Self {
        RawMatchEntry::Entry {
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
            target: Some(target.into()),
            types: Some(types.iter().map(|t| t.to_string()).collect()),
            branches: None,
        }
    }
}
