//! Load-time validation of shim records.
//!
//! Each [`RawShim`] is checked and compiled on its own. Table-wide checks
//! (duplicate ids) happen in the registry once every record is validated.
//!
//! Failures come in two severities:
//! - [`LoadError`] - the table is unusable and loading stops
//! - [`PatternError`] - only this shim is dropped

use std::collections::{BTreeMap, BTreeSet};

use crate::core::helpers::{HelperSet, ShimHelper};
use crate::core::options::OptionRule;
use crate::core::platform::{BranchSpec, Platform};
use crate::core::resource::{ResourceType, ResourceTypeSet};
use crate::core::shim::{MatchEntry, RawMatchEntry, RawShim, ShimDefinition};
use crate::shim::errors::{LoadError, PatternError};
use crate::shim::pattern::MatchPattern;

/// Why a record was rejected.
#[derive(Debug)]
pub enum Rejection {
    Fatal(LoadError),
    Pattern(PatternError),
}

impl From<LoadError> for Rejection {
    fn from(err: LoadError) -> Self {
        Rejection::Fatal(err)
    }
}

impl From<PatternError> for Rejection {
    fn from(err: PatternError) -> Self {
        Rejection::Pattern(err)
    }
}

/// Which list an entry came from; bare strings mean different things.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryList {
    Matches,
    UnblocksOnOptIn,
}

/// Validate one record. `index` is its position in the table.
pub fn validate_shim(raw: RawShim, index: usize) -> Result<ShimDefinition, Rejection> {
    if raw.id.trim().is_empty() {
        return Err(LoadError::EmptyId { index }.into());
    }

    for field in raw.unknown.keys() {
        tracing::warn!("shim `{}`: ignoring unknown field `{}`", raw.id, field);
    }

    let needs_shim_helpers = validate_helpers(&raw.id, &raw.needs_shim_helpers)?;
    let options = validate_options(&raw.id, &raw.options)?;

    // Both lists are scanned in full so a bad pattern never hides a fatal
    // error further down the record.
    let matches = validate_entries(&raw, &raw.matches, EntryList::Matches);
    let unblocks = validate_entries(&raw, &raw.unblocks_on_opt_in, EntryList::UnblocksOnOptIn);
    let (matches, unblocks_on_opt_in) = match (matches, unblocks) {
        (Err(Rejection::Fatal(err)), _) | (_, Err(Rejection::Fatal(err))) => {
            return Err(Rejection::Fatal(err))
        }
        (Err(rejection), _) | (_, Err(rejection)) => return Err(rejection),
        (Ok(matches), Ok(unblocks)) => (matches, unblocks),
    };

    Ok(ShimDefinition {
        platform: Platform::parse(&raw.platform),
        branches: raw
            .branches
            .as_ref()
            .map(|b| b.iter().map(|t| BranchSpec::parse(t)).collect()),
        hosts: raw.hosts.as_deref().map(normalize_hosts),
        not_hosts: raw.not_hosts.as_deref().map(normalize_hosts),
        matches,
        unblocks_on_opt_in,
        needs_shim_helpers,
        options,
        id: raw.id,
        name: raw.name,
        bug: raw.bug,
        disabled: raw.disabled,
        file: raw.file,
        logos: raw.logos,
        only_if_blocked_by_etp: raw.only_if_blocked_by_etp,
    })
}

fn validate_helpers(id: &str, names: &[String]) -> Result<HelperSet, LoadError> {
    names
        .iter()
        .map(|name| {
            name.parse::<ShimHelper>()
                .map_err(|source| LoadError::UnknownHelper {
                    id: id.to_string(),
                    source,
                })
        })
        .collect()
}

fn validate_options(
    id: &str,
    raw: &BTreeMap<String, serde_json::Value>,
) -> Result<BTreeMap<String, OptionRule>, LoadError> {
    raw.iter()
        .map(|(key, value)| {
            OptionRule::compile(value)
                .map(|rule| (key.clone(), rule))
                .map_err(|reason| LoadError::InvalidOption {
                    id: id.to_string(),
                    key: key.clone(),
                    reason,
                })
        })
        .collect()
}

/// Validate every entry of one list.
///
/// A fatal error returns at once. A pattern error is held until the rest of
/// the list has been checked.
fn validate_entries(
    shim: &RawShim,
    entries: &[RawMatchEntry],
    list: EntryList,
) -> Result<Vec<MatchEntry>, Rejection> {
    let mut compiled = Vec::with_capacity(entries.len());
    let mut bad_pattern = None;

    for entry in entries {
        match validate_entry(shim, entry, list) {
            Ok(entry) => compiled.push(entry),
            Err(Rejection::Fatal(err)) => return Err(Rejection::Fatal(err)),
            Err(Rejection::Pattern(err)) => {
                bad_pattern.get_or_insert(err);
            }
        }
    }

    match bad_pattern {
        Some(err) => Err(Rejection::Pattern(err)),
        None => Ok(compiled),
    }
}

fn validate_entry(
    shim: &RawShim,
    entry: &RawMatchEntry,
    list: EntryList,
) -> Result<MatchEntry, Rejection> {
    match entry {
        RawMatchEntry::Pattern(pattern) => {
            if list == EntryList::Matches && shim.file.is_none() {
                return Err(LoadError::MissingFile {
                    id: shim.id.clone(),
                }
                .into());
            }

            Ok(MatchEntry {
                patterns: vec![compile_pattern(&shim.id, pattern)?],
                target: None,
                types: None,
                branches: None,
                bare: true,
            })
        }
        RawMatchEntry::Entry {
            patterns,
            target,
            types,
            branches,
        } => {
            if patterns.is_empty() {
                return Err(LoadError::EmptyPatterns {
                    id: shim.id.clone(),
                }
                .into());
            }
            if list == EntryList::Matches && target.is_none() && shim.file.is_none() {
                return Err(LoadError::MissingFile {
                    id: shim.id.clone(),
                }
                .into());
            }

            let types = types
                .as_ref()
                .map(|names| validate_types(&shim.id, names))
                .transpose()?;

            let patterns = patterns
                .iter()
                .map(|p| compile_pattern(&shim.id, p))
                .collect::<Result<Vec<_>, _>>()?;

            Ok(MatchEntry {
                patterns,
                target: target.clone(),
                types,
                branches: branches
                    .as_ref()
                    .map(|b| b.iter().map(|t| BranchSpec::parse(t)).collect()),
                bare: false,
            })
        }
    }
}

fn validate_types(id: &str, names: &[String]) -> Result<ResourceTypeSet, LoadError> {
    names
        .iter()
        .map(|name| {
            name.parse::<ResourceType>()
                .map_err(|source| LoadError::UnknownResourceType {
                    id: id.to_string(),
                    source,
                })
        })
        .collect()
}

fn compile_pattern(id: &str, pattern: &str) -> Result<MatchPattern, PatternError> {
    MatchPattern::parse(pattern).map_err(|reason| PatternError {
        shim: id.to_string(),
        pattern: pattern.to_string(),
        reason,
    })
}

fn normalize_hosts(hosts: &[String]) -> BTreeSet<String> {
    hosts.iter().map(|h| h.trim().to_ascii_lowercase()).collect()
}
