//! Dispatch engine: turn a request into a shim action.
//!
//! Dispatch is a pure function of the registry, the request, and the
//! context. Candidates are scanned in registration order and their match
//! entries in declared order; the first valid hit wins.

use std::sync::Arc;

use rayon::prelude::*;
use serde::Serialize;

use crate::core::context::RuntimeContext;
use crate::core::helpers::HelperSet;
use crate::core::resource::ResourceType;
use crate::core::shim::{MatchEntry, ShimDefinition};
use crate::shim::eligibility::{check_gates, Gate};
use crate::shim::pattern::MatchPattern;
use crate::shim::registry::ShimRegistry;

/// What the host should do with a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Action {
    /// Substitute a local resource for the network response
    Serve {
        shim: String,
        resource: String,
        #[serde(rename = "resourceType")]
        resource_type: ResourceType,
    },
    /// Run a script in the page with the declared helpers
    Inject {
        shim: String,
        script: String,
        #[serde(rename = "neededHelpers")]
        helpers: HelperSet,
    },
}

impl Action {
    /// Id of the shim that produced this action.
    pub fn shim(&self) -> &str {
        match self {
            Action::Serve { shim, .. } | Action::Inject { shim, .. } => shim,
        }
    }
}

/// A match found while scanning, with the entry and pattern that produced it.
#[derive(Debug, Clone)]
pub struct Hit<'a> {
    pub shim: &'a ShimDefinition,
    pub entry: &'a MatchEntry,
    pub pattern: &'a MatchPattern,
    pub action: Action,
}

/// One request in a batch.
#[derive(Debug, Clone)]
pub struct DispatchRequest {
    pub url: String,
    pub resource_type: ResourceType,
    pub ctx: RuntimeContext,
}

/// Evaluates requests against a shared registry.
///
/// Cloning is cheap; clones share the registry.
#[derive(Debug, Clone)]
pub struct DispatchEngine {
    registry: Arc<ShimRegistry>,
}

impl DispatchEngine {
    pub fn new(registry: Arc<ShimRegistry>) -> Self {
        DispatchEngine { registry }
    }

    pub fn registry(&self) -> &ShimRegistry {
        &self.registry
    }

    /// Find the action for a request. `None` means leave the request alone.
    pub fn dispatch(
        &self,
        url: &str,
        resource_type: ResourceType,
        ctx: &RuntimeContext,
    ) -> Option<Action> {
        let action = self.hits(url, resource_type, ctx).next().map(|hit| hit.action);

        match &action {
            Some(action) => tracing::debug!("{} {} -> {:?}", resource_type, url, action),
            None => tracing::trace!("{} {} -> no action", resource_type, url),
        }

        action
    }

    /// Every valid hit across all candidates, in dispatch order.
    ///
    /// `dispatch` only ever acts on the first one; the rest are for
    /// diagnostics.
    pub fn dispatch_all<'a>(
        &'a self,
        url: &'a str,
        resource_type: ResourceType,
        ctx: &'a RuntimeContext,
    ) -> Vec<Hit<'a>> {
        self.hits(url, resource_type, ctx).collect()
    }

    /// Dispatch many requests in parallel. Results keep the input order.
    pub fn dispatch_batch(&self, requests: &[DispatchRequest]) -> Vec<Option<Action>> {
        requests
            .par_iter()
            .map(|req| self.dispatch(&req.url, req.resource_type, &req.ctx))
            .collect()
    }

    /// Whether an opted-in shim lists the URL in `unblocksOnOptIn`.
    ///
    /// This is narrower than "some opted-in shim lists the URL". Opted-in
    /// shims still have to pass the disabled, platform, branch and host
    /// gates, so a shim limited by `hosts` or `notHosts` only unblocks on the
    /// pages it applies to. Entry-level `branches` and `types` apply too. The
    /// tracking-protection gate is skipped since this check is what decides
    /// whether the block is lifted.
    pub fn unblock_check(&self, url: &str, ctx: &RuntimeContext) -> bool {
        ctx.opted_in.iter().any(|id| {
            let shim = match self.registry.require(id) {
                Ok(shim) => shim,
                Err(err) => {
                    tracing::debug!("{}; treating as not opted in", err);
                    return false;
                }
            };

            if let Err(reason) = check_gates(&Gate::UNBLOCK, shim, ctx) {
                tracing::trace!("opted-in shim `{}` skipped: {}", shim.id, reason);
                return false;
            }

            shim.unblocks_on_opt_in.iter().any(|entry| {
                entry.admits_branch(ctx)
                    && entry.admits_type(ctx.resource_type)
                    && entry.first_hit(url).is_some()
            })
        })
    }

    fn hits<'a>(
        &'a self,
        url: &'a str,
        resource_type: ResourceType,
        ctx: &'a RuntimeContext,
    ) -> impl Iterator<Item = Hit<'a>> + 'a {
        self.registry.candidates_for(ctx).flat_map(move |shim| {
            shim.matches.iter().filter_map(move |entry| {
                if !entry.admits_branch(ctx) {
                    return None;
                }
                let pattern = entry.first_hit(url)?;
                if !entry.admits_type(resource_type) {
                    tracing::trace!(
                        "shim `{}` matched {} but not for type {}",
                        shim.id,
                        pattern,
                        resource_type
                    );
                    return None;
                }
                action_for(shim, entry, resource_type).map(|action| Hit {
                    shim,
                    entry,
                    pattern,
                    action,
                })
            })
        })
    }
}

/// Build the action for a valid hit.
fn action_for(
    shim: &ShimDefinition,
    entry: &MatchEntry,
    resource_type: ResourceType,
) -> Option<Action> {
    if entry.bare && shim.needs_helpers() {
        return shim.file.as_ref().map(|file| Action::Inject {
            shim: shim.id.clone(),
            script: file.clone(),
            helpers: shim.needs_shim_helpers.clone(),
        });
    }

    entry.resource(shim).map(|resource| Action::Serve {
        shim: shim.id.clone(),
        resource: resource.to_string(),
        resource_type,
    })
}
