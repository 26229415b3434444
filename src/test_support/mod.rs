//! Test utilities for shimreg unit tests.
//!
//! Provides a builder for shim records, a default runtime context, and
//! collaborators that record what the host asked them to do.
//!
//! # Example
//!
//! ```rust,ignore
//! use shimreg::test_support::{context, ShimBuilder};
//!
//! let shim = ShimBuilder::new("AdNexus")
//!     .pattern("*://acdn.adnxs.com/ast/ast.js")
//!     .only_if_blocked_by_etp()
//!     .build();
//! assert!(!is_eligible(&shim, &context()));
//! ```

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::core::context::RuntimeContext;
use crate::core::helpers::HelperSet;
use crate::core::platform::{HostPlatform, ReleaseChannel};
use crate::core::resource::ResourceType;
use crate::core::shim::{RawMatchEntry, RawShim, ShimDefinition};
use crate::shim::host::{Injector, RedirectExecutor};
use crate::shim::validation::validate_shim;

/// Desktop release context with no page host and no opt-ins.
pub fn context() -> RuntimeContext {
    RuntimeContext::new(HostPlatform::Desktop, ReleaseChannel::Release)
}

/// Opt-in snapshot holding the given ids.
pub fn opted_in(ids: &[&str]) -> Arc<BTreeSet<String>> {
    Arc::new(ids.iter().map(|id| id.to_string()).collect())
}

/// Builder for shim records.
///
/// Starts with `file = "<id in lowercase>.js"`, platform `all`, and no
/// match entries.
#[derive(Debug, Clone)]
pub struct ShimBuilder {
    raw: RawShim,
}

impl ShimBuilder {
    pub fn new(id: &str) -> Self {
        ShimBuilder {
            raw: RawShim {
                id: id.to_string(),
                platform: "all".to_string(),
                file: Some(format!("{}.js", id.to_ascii_lowercase())),
                ..RawShim::default()
            },
        }
    }

    pub fn disabled(mut self) -> Self {
        self.raw.disabled = true;
        self
    }

    pub fn platform(mut self, platform: &str) -> Self {
        self.raw.platform = platform.to_string();
        self
    }

    pub fn branches(mut self, branches: &[&str]) -> Self {
        self.raw.branches = Some(strings(branches));
        self
    }

    pub fn hosts(mut self, hosts: &[&str]) -> Self {
        self.raw.hosts = Some(strings(hosts));
        self
    }

    pub fn not_hosts(mut self, hosts: &[&str]) -> Self {
        self.raw.not_hosts = Some(strings(hosts));
        self
    }

    pub fn only_if_blocked_by_etp(mut self) -> Self {
        self.raw.only_if_blocked_by_etp = true;
        self
    }

    pub fn file(mut self, file: &str) -> Self {
        self.raw.file = Some(file.to_string());
        self
    }

    pub fn no_file(mut self) -> Self {
        self.raw.file = None;
        self
    }

    /// Add a bare pattern to `matches`.
    pub fn pattern(mut self, pattern: &str) -> Self {
        self.raw.matches.push(RawMatchEntry::pattern(pattern));
        self
    }

    /// Add a structured entry to `matches`.
    pub fn entry(mut self, patterns: &[&str], target: &str, types: &[&str]) -> Self {
        self.raw
            .matches
            .push(RawMatchEntry::targeted(patterns, target, types));
        self
    }

    pub fn helpers(mut self, helpers: &[&str]) -> Self {
        self.raw.needs_shim_helpers = strings(helpers);
        self
    }

    pub fn option(mut self, key: &str, value: Value) -> Self {
        self.raw.options.insert(key.to_string(), value);
        self
    }

    /// Add a bare pattern to `unblocksOnOptIn`.
    pub fn unblock(mut self, pattern: &str) -> Self {
        self.raw
            .unblocks_on_opt_in
            .push(RawMatchEntry::pattern(pattern));
        self
    }

    /// Add a branch-limited entry to `unblocksOnOptIn`.
    pub fn unblock_entry(mut self, patterns: &[&str], branches: &[&str]) -> Self {
        self.raw.unblocks_on_opt_in.push(RawMatchEntry::Entry {
            patterns: strings(patterns),
            target: None,
            types: None,
            branches: Some(strings(branches)),
        });
        self
    }

    pub fn raw(self) -> RawShim {
        self.raw
    }

    /// Validate the record, panicking if it is rejected.
    pub fn build(self) -> ShimDefinition {
        match validate_shim(self.raw, 0) {
            Ok(shim) => shim,
            Err(rejection) => panic!("test shim rejected: {:?}", rejection),
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Executor that records every call.
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    served: Mutex<Vec<(String, ResourceType)>>,
    cancelled: Mutex<Vec<ResourceType>>,
}

impl RecordingExecutor {
    pub fn served(&self) -> Vec<(String, ResourceType)> {
        self.served.lock().unwrap().clone()
    }

    pub fn cancelled(&self) -> Vec<ResourceType> {
        self.cancelled.lock().unwrap().clone()
    }
}

impl RedirectExecutor for RecordingExecutor {
    fn serve(&self, resource: &str, resource_type: ResourceType, _payload: &[u8]) {
        self.served
            .lock()
            .unwrap()
            .push((resource.to_string(), resource_type));
    }

    fn cancel(&self, resource_type: ResourceType) {
        self.cancelled.lock().unwrap().push(resource_type);
    }
}

/// Injector that records every call.
#[derive(Debug, Default)]
pub struct RecordingInjector {
    injected: Mutex<Vec<(String, HelperSet)>>,
}

impl RecordingInjector {
    pub fn injected(&self) -> Vec<(String, HelperSet)> {
        self.injected.lock().unwrap().clone()
    }
}

impl Injector for RecordingInjector {
    fn inject(&self, script: &str, helpers: &HelperSet) {
        self.injected
            .lock()
            .unwrap()
            .push((script.to_string(), helpers.clone()));
    }
}
