//! Per-shim runtime options.
//!
//! Every option key compiles to an [`OptionRule`]: an ordered list of scoped
//! layers evaluated first-match, then an optional base value. A key whose
//! layers all miss and which has no base value is left unset.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::core::context::RuntimeContext;
use crate::core::platform::{any_branch_matches, BranchSpec, Platform};

/// Options after resolution against a context.
pub type ResolvedOptions = BTreeMap<String, Value>;

/// Keys that turn an option table into a scoped value.
const SCOPE_KEYS: [&str; 2] = ["branches", "platform"];

/// Conditions under which a scoped value applies.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionScope {
    pub branches: Option<Vec<BranchSpec>>,
    pub platform: Option<Platform>,
}

impl OptionScope {
    /// Both scopes must hold when both are given.
    pub fn matches(&self, ctx: &RuntimeContext) -> bool {
        let branch_ok = self
            .branches
            .as_ref()
            .map_or(true, |b| any_branch_matches(b, ctx.channel, ctx.platform));
        let platform_ok = self
            .platform
            .as_ref()
            .map_or(true, |p| p.matches(ctx.platform));
        branch_ok && platform_ok
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptionLayer {
    pub scope: OptionScope,
    pub value: Value,
}

/// Compiled resolution rule for one option key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionRule {
    pub layers: Vec<OptionLayer>,
    pub base: Option<Value>,
}

impl OptionRule {
    /// Compile the table representation of an option.
    ///
    /// Accepted shapes:
    /// - any literal (including tables without scope keys) - base value
    /// - `{ value }` - base value
    /// - `{ value, branches }`, `{ value, platform }` or both - scoped layer
    pub fn compile(raw: &Value) -> Result<Self, String> {
        let table = match raw {
            Value::Object(table) => table,
            literal => return Ok(OptionRule::literal(literal.clone())),
        };

        let scoped = SCOPE_KEYS.iter().any(|k| table.contains_key(*k));
        if !scoped {
            if table.len() == 1 {
                if let Some(value) = table.get("value") {
                    return Ok(OptionRule::literal(value.clone()));
                }
            }
            return Ok(OptionRule::literal(raw.clone()));
        }

        let value = table
            .get("value")
            .cloned()
            .ok_or_else(|| "scoped option is missing `value`".to_string())?;

        if let Some(extra) = table
            .keys()
            .find(|k| k.as_str() != "value" && !SCOPE_KEYS.contains(&k.as_str()))
        {
            return Err(format!("unexpected key `{}` in scoped option", extra));
        }

        let scope = OptionScope {
            branches: compile_branches(table)?,
            platform: compile_platform(table)?,
        };

        Ok(OptionRule {
            layers: vec![OptionLayer { scope, value }],
            base: None,
        })
    }

    fn literal(value: Value) -> Self {
        OptionRule {
            layers: Vec::new(),
            base: Some(value),
        }
    }

    /// Resolve the value for a context, if any applies.
    pub fn resolve(&self, ctx: &RuntimeContext) -> Option<&Value> {
        self.layers
            .iter()
            .find(|layer| layer.scope.matches(ctx))
            .map(|layer| &layer.value)
            .or(self.base.as_ref())
    }
}

fn compile_branches(table: &Map<String, Value>) -> Result<Option<Vec<BranchSpec>>, String> {
    let Some(raw) = table.get("branches") else {
        return Ok(None);
    };

    let items = raw
        .as_array()
        .ok_or_else(|| "`branches` must be a list of strings".to_string())?;

    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(BranchSpec::parse)
                .ok_or_else(|| "`branches` must be a list of strings".to_string())
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

fn compile_platform(table: &Map<String, Value>) -> Result<Option<Platform>, String> {
    match table.get("platform") {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(Platform::parse(s))),
        Some(_) => Err("`platform` must be a string".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::platform::{HostPlatform, ReleaseChannel};
    use serde_json::json;

    fn ctx(platform: HostPlatform, channel: ReleaseChannel) -> RuntimeContext {
        RuntimeContext::new(platform, channel)
    }

    #[test]
    fn test_literal_values() {
        let c = ctx(HostPlatform::Desktop, ReleaseChannel::Release);

        let rule = OptionRule::compile(&json!(true)).unwrap();
        assert_eq!(rule.resolve(&c), Some(&json!(true)));

        // Tables without scope keys are plain values
        let rule = OptionRule::compile(&json!({"a": 1, "b": "test"})).unwrap();
        assert_eq!(rule.resolve(&c), Some(&json!({"a": 1, "b": "test"})));

        // `value` alone unwraps to the base value
        let rule = OptionRule::compile(&json!({"value": 7})).unwrap();
        assert_eq!(rule.resolve(&c), Some(&json!(7)));
    }

    #[test]
    fn test_empty_branch_list_leaves_option_unset() {
        let rule = OptionRule::compile(&json!({"value": true, "branches": []})).unwrap();
        assert!(rule.base.is_none());
        assert_eq!(
            rule.resolve(&ctx(HostPlatform::Desktop, ReleaseChannel::Nightly)),
            None
        );
    }

    #[test]
    fn test_branch_scoped_value() {
        let rule =
            OptionRule::compile(&json!({"value": "on", "branches": ["nightly:android"]})).unwrap();

        assert_eq!(
            rule.resolve(&ctx(HostPlatform::Android, ReleaseChannel::Nightly)),
            Some(&json!("on"))
        );
        assert_eq!(
            rule.resolve(&ctx(HostPlatform::Desktop, ReleaseChannel::Nightly)),
            None
        );
    }

    #[test]
    fn test_platform_scoped_value() {
        let rule = OptionRule::compile(&json!({"value": true, "platform": "neverUsed"})).unwrap();
        assert_eq!(
            rule.resolve(&ctx(HostPlatform::Desktop, ReleaseChannel::Release)),
            None
        );

        let rule = OptionRule::compile(&json!({"value": 3, "platform": "android"})).unwrap();
        assert_eq!(
            rule.resolve(&ctx(HostPlatform::Android, ReleaseChannel::Release)),
            Some(&json!(3))
        );
    }

    #[test]
    fn test_both_scopes_must_match() {
        let rule = OptionRule::compile(
            &json!({"value": 1, "branches": ["beta"], "platform": "desktop"}),
        )
        .unwrap();

        assert_eq!(
            rule.resolve(&ctx(HostPlatform::Desktop, ReleaseChannel::Beta)),
            Some(&json!(1))
        );
        assert_eq!(
            rule.resolve(&ctx(HostPlatform::Android, ReleaseChannel::Beta)),
            None
        );
    }

    #[test]
    fn test_layer_beats_base() {
        let rule = OptionRule {
            layers: vec![OptionLayer {
                scope: OptionScope {
                    branches: Some(vec![BranchSpec::parse("nightly")]),
                    platform: None,
                },
                value: json!("nightly"),
            }],
            base: Some(json!("default")),
        };

        assert_eq!(
            rule.resolve(&ctx(HostPlatform::Desktop, ReleaseChannel::Nightly)),
            Some(&json!("nightly"))
        );
        assert_eq!(
            rule.resolve(&ctx(HostPlatform::Desktop, ReleaseChannel::Release)),
            Some(&json!("default"))
        );
    }

    #[test]
    fn test_malformed_scoped_options() {
        let err = OptionRule::compile(&json!({"branches": ["nightly"]})).unwrap_err();
        assert!(err.contains("missing `value`"));

        let err =
            OptionRule::compile(&json!({"value": 1, "platform": "android", "extra": 2}))
                .unwrap_err();
        assert!(err.contains("unexpected key `extra`"));

        let err = OptionRule::compile(&json!({"value": 1, "branches": "nightly"})).unwrap_err();
        assert!(err.contains("list of strings"));

        let err = OptionRule::compile(&json!({"value": 1, "platform": 4})).unwrap_err();
        assert!(err.contains("must be a string"));
    }
}
