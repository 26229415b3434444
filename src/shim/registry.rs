//! Shim registry - the immutable, ordered table of shim definitions.
//!
//! Key principle: the registry is built once and never mutated, so every
//! query is a pure read and can run from any number of threads at once.
//! Registration order is preserved; dispatch relies on it.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::core::context::RuntimeContext;
use crate::core::options::ResolvedOptions;
use crate::core::shim::{RawShim, RawTable, ShimDefinition};
use crate::shim::eligibility;
use crate::shim::errors::{LoadError, PatternError, UnknownShimError};
use crate::shim::validation::{validate_shim, Rejection};

/// Shim table shipped with the crate.
const BUILTIN_TABLE: &str = include_str!("../../data/shims.toml");

/// Registry of validated shims.
#[derive(Debug, Clone, Default)]
pub struct ShimRegistry {
    shims: Vec<ShimDefinition>,
    index: HashMap<String, usize>,
}

/// Outcome of loading a table.
///
/// Shims whose patterns failed to compile are left out of the registry and
/// listed in `excluded`.
#[derive(Debug)]
pub struct LoadReport {
    pub registry: ShimRegistry,
    pub excluded: Vec<PatternError>,
}

impl LoadReport {
    /// Whether every record made it into the registry.
    pub fn is_clean(&self) -> bool {
        self.excluded.is_empty()
    }
}

impl ShimRegistry {
    /// Validate records and build a registry.
    pub fn from_records(records: Vec<RawShim>) -> Result<LoadReport, LoadError> {
        let mut registry = ShimRegistry::default();
        let mut excluded = Vec::new();
        let mut seen = HashSet::new();

        for (index, raw) in records.into_iter().enumerate() {
            let id = raw.id.clone();
            let result = validate_shim(raw, index);

            if !id.trim().is_empty() && !seen.insert(id.clone()) {
                return Err(LoadError::DuplicateId { id });
            }

            match result {
                Ok(shim) => {
                    registry.index.insert(shim.id.clone(), registry.shims.len());
                    registry.shims.push(shim);
                }
                Err(Rejection::Fatal(err)) => return Err(err),
                Err(Rejection::Pattern(err)) => {
                    tracing::warn!("excluding shim: {}", err);
                    excluded.push(err);
                }
            }
        }

        tracing::info!(
            "Loaded {} shims ({} excluded)",
            registry.shims.len(),
            excluded.len()
        );

        Ok(LoadReport { registry, excluded })
    }

    /// Load a table from TOML text.
    pub fn from_toml_str(content: &str) -> Result<LoadReport, LoadError> {
        let table: RawTable = toml::from_str(content).map_err(|e| LoadError::Parse {
            message: e.to_string(),
        })?;
        Self::from_records(table.shims)
    }

    /// Load a table from JSON text: `{"shims": [...]}` or a bare array.
    pub fn from_json_str(content: &str) -> Result<LoadReport, LoadError> {
        let parse_error = |e: serde_json::Error| LoadError::Parse {
            message: e.to_string(),
        };

        let value: serde_json::Value = serde_json::from_str(content).map_err(parse_error)?;
        let records = if value.is_array() {
            serde_json::from_value::<Vec<RawShim>>(value).map_err(parse_error)?
        } else {
            serde_json::from_value::<RawTable>(value)
                .map_err(parse_error)?
                .shims
        };

        Self::from_records(records)
    }

    /// Load a table file. `.json` files are read as JSON, anything else as TOML.
    pub fn load(path: &Path) -> Result<LoadReport, LoadError> {
        let content = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::debug!("reading shim table {}", path.display());

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_toml_str(&content)
        }
    }

    /// Load the built-in table.
    pub fn builtin() -> Result<LoadReport, LoadError> {
        Self::from_toml_str(BUILTIN_TABLE)
    }

    /// Get a shim by id.
    pub fn get(&self, id: &str) -> Option<&ShimDefinition> {
        self.index.get(id).map(|&i| &self.shims[i])
    }

    /// Get a shim by id, failing if it isn't registered.
    pub fn require(&self, id: &str) -> Result<&ShimDefinition, UnknownShimError> {
        self.get(id).ok_or_else(|| UnknownShimError::new(id))
    }

    /// Check if a shim is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// All shims, in registration order.
    pub fn all(&self) -> impl Iterator<Item = &ShimDefinition> + '_ {
        self.shims.iter()
    }

    /// Shims eligible in this context, in registration order.
    pub fn candidates_for<'a>(
        &'a self,
        ctx: &'a RuntimeContext,
    ) -> impl Iterator<Item = &'a ShimDefinition> + 'a {
        self.shims
            .iter()
            .filter(move |shim| eligibility::is_eligible(shim, ctx))
    }

    /// Resolve a shim's options against a context.
    pub fn resolve_options(
        &self,
        id: &str,
        ctx: &RuntimeContext,
    ) -> Result<ResolvedOptions, UnknownShimError> {
        self.require(id).map(|shim| shim.resolve_options(ctx))
    }

    /// Resolve options, treating an unknown id as "no options".
    pub fn options_or_empty(&self, id: &str, ctx: &RuntimeContext) -> ResolvedOptions {
        self.resolve_options(id, ctx).unwrap_or_else(|err| {
            tracing::debug!("{}; using no options", err);
            ResolvedOptions::new()
        })
    }

    /// Get the number of registered shims.
    pub fn len(&self) -> usize {
        self.shims.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.shims.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::platform::HostPlatform;
    use crate::test_support::{context, ShimBuilder};
    use serde_json::json;

    fn registry(records: Vec<RawShim>) -> ShimRegistry {
        ShimRegistry::from_records(records).unwrap().registry
    }

    #[test]
    fn test_registry_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ShimRegistry>();
    }

    #[test]
    fn test_registration_order_is_kept() {
        let reg = registry(vec![
            ShimBuilder::new("B").raw(),
            ShimBuilder::new("A").raw(),
            ShimBuilder::new("C").raw(),
        ]);
        let ids: Vec<_> = reg.all().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["B", "A", "C"]);
        assert_eq!(reg.len(), 3);
        assert!(reg.contains("A"));
        assert!(!reg.contains("D"));
    }

    #[test]
    fn test_duplicate_id_is_fatal() {
        let err = ShimRegistry::from_records(vec![
            ShimBuilder::new("Same").raw(),
            ShimBuilder::new("Other").raw(),
            ShimBuilder::new("Same").raw(),
        ])
        .unwrap_err();
        assert!(matches!(err, LoadError::DuplicateId { id } if id == "Same"));
    }

    #[test]
    fn test_pattern_error_excludes_only_that_shim() {
        let report = ShimRegistry::from_records(vec![
            ShimBuilder::new("Good").pattern("*://good.example/*").raw(),
            ShimBuilder::new("Bad").pattern("bad.example/no-scheme").raw(),
            ShimBuilder::new("AlsoGood").pattern("*://also.example/*").raw(),
        ])
        .unwrap();

        assert!(!report.is_clean());
        assert_eq!(report.excluded.len(), 1);
        assert_eq!(report.excluded[0].shim, "Bad");
        assert_eq!(report.registry.len(), 2);
        assert!(!report.registry.contains("Bad"));
    }

    #[test]
    fn test_fatal_error_after_bad_pattern_aborts_load() {
        let toml = r#"
[[shims]]
id = "Broken"
file = "x.js"
matches = [
    "no-scheme-pattern",
    { patterns = ["*://a.example/*"], target = "y.js", types = ["scripts"] },
]
"#;
        let err = ShimRegistry::from_toml_str(toml).unwrap_err();
        assert!(matches!(err, LoadError::UnknownResourceType { ref id, .. } if id == "Broken"));
    }

    #[test]
    fn test_excluded_shims_still_reserve_their_id() {
        let err = ShimRegistry::from_records(vec![
            ShimBuilder::new("Dup").pattern("broken").raw(),
            ShimBuilder::new("Dup").raw(),
        ])
        .unwrap_err();
        assert!(matches!(err, LoadError::DuplicateId { .. }));
    }

    #[test]
    fn test_candidates_filter_and_keep_order() {
        let reg = registry(vec![
            ShimBuilder::new("First").raw(),
            ShimBuilder::new("Off").disabled().raw(),
            ShimBuilder::new("Android").platform("android").raw(),
            ShimBuilder::new("Last").raw(),
        ]);

        let ctx = context();
        let ids: Vec<_> = reg.candidates_for(&ctx).map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["First", "Last"]);

        let mut ctx = context();
        ctx.platform = HostPlatform::Android;
        let ids: Vec<_> = reg.candidates_for(&ctx).map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["First", "Android", "Last"]);
    }

    #[test]
    fn test_resolve_options() {
        let reg = registry(vec![ShimBuilder::new("Opts")
            .option("simpleOption", json!(true))
            .option("complexOption", json!({"a": 1, "b": "test"}))
            .option("branchValue", json!({"value": true, "branches": []}))
            .option("platformValue", json!({"value": true, "platform": "neverUsed"}))
            .raw()]);

        let options = reg.resolve_options("Opts", &context()).unwrap();
        assert_eq!(options.get("simpleOption"), Some(&json!(true)));
        assert_eq!(options.get("complexOption"), Some(&json!({"a": 1, "b": "test"})));
        assert!(!options.contains_key("branchValue"));
        assert!(!options.contains_key("platformValue"));
        assert_eq!(options.len(), 2);
    }

    #[test]
    fn test_unknown_shim_options() {
        let reg = registry(vec![ShimBuilder::new("Known").raw()]);
        let err = reg.resolve_options("Missing", &context()).unwrap_err();
        assert_eq!(err, UnknownShimError::new("Missing"));
        assert!(reg.options_or_empty("Missing", &context()).is_empty());
    }

    #[test]
    fn test_from_toml_and_json() {
        let toml = r#"
[[shims]]
id = "Chartbeat"
file = "chartbeat.js"
matches = ["*://static.chartbeat.com/js/chartbeat.js"]
onlyIfBlockedByETP = true
"#;
        let report = ShimRegistry::from_toml_str(toml).unwrap();
        assert!(report.registry.get("Chartbeat").unwrap().only_if_blocked_by_etp);

        let json = r#"[{"id": "Criteo", "file": "criteo.js",
                        "matches": ["*://static.criteo.net/js/ld/publishertag.js"]}]"#;
        let report = ShimRegistry::from_json_str(json).unwrap();
        assert!(report.registry.contains("Criteo"));

        let json = r#"{"shims": [{"id": "Moat", "file": "moat.js", "matches": []}]}"#;
        let report = ShimRegistry::from_json_str(json).unwrap();
        assert!(report.registry.contains("Moat"));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            ShimRegistry::from_toml_str("[[shims]\nid = 1"),
            Err(LoadError::Parse { .. })
        ));
        assert!(matches!(
            ShimRegistry::from_json_str("{\"shims\": 3}"),
            Err(LoadError::Parse { .. })
        ));
    }

    #[test]
    fn test_load_from_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("table.json");
        std::fs::write(
            &path,
            r#"{"shims": [{"id": "GoogleIMA", "file": "google-ima.js",
                "matches": ["*://imasdk.googleapis.com/js/sdkloader/ima3.js"]}]}"#,
        )
        .unwrap();

        let report = ShimRegistry::load(&path).unwrap();
        assert!(report.registry.contains("GoogleIMA"));

        let missing = tmp.path().join("missing.toml");
        assert!(matches!(
            ShimRegistry::load(&missing),
            Err(LoadError::Io { .. })
        ));
    }

    #[test]
    fn test_builtin_table_loads_cleanly() {
        let report = ShimRegistry::builtin().unwrap();
        assert!(report.is_clean());
        assert!(report.registry.contains("MochitestShim"));
        assert!(report.registry.contains("AdNexus"));
    }
}
