//! Host-side collaborators.
//!
//! The engine only decides. Carrying out a decision (serving bytes,
//! cancelling, injecting a script) and supplying the environment belong to
//! the host, through the traits below. [`ShimHost`] wires a registry to a set
//! of collaborators.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use crate::core::context::RuntimeContext;
use crate::core::helpers::HelperSet;
use crate::core::options::ResolvedOptions;
use crate::core::platform::{HostPlatform, ReleaseChannel};
use crate::core::resource::ResourceType;
use crate::shim::dispatch::{Action, DispatchEngine};
use crate::shim::opt_in::OptInSet;
use crate::shim::registry::ShimRegistry;

/// Lookup of bundled resources by name.
pub trait ResourceStore {
    /// Bytes for a resource, or `None` if the store doesn't carry it.
    fn resource_bytes(&self, name: &str) -> Option<&[u8]>;
}

/// Carries out network redirections.
pub trait RedirectExecutor {
    /// Answer the request with local bytes.
    fn serve(&self, resource: &str, resource_type: ResourceType, payload: &[u8]);

    /// Cancel the request.
    fn cancel(&self, resource_type: ResourceType);
}

/// Runs shim scripts inside pages.
pub trait Injector {
    /// Inject `script`, exposing only the listed helpers to it.
    fn inject(&self, script: &str, helpers: &HelperSet);
}

/// Supplies the runtime context for a request.
pub trait EnvironmentProvider {
    fn context(&self, request: &Request<'_>) -> RuntimeContext;
}

/// A request seen by the host.
#[derive(Debug, Clone, Copy)]
pub struct Request<'a> {
    pub url: &'a str,
    pub resource_type: ResourceType,
    pub page_host: &'a str,
}

/// What the host did with a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum Outcome {
    Served { shim: String, resource: String },
    /// The resource was void, so the request was cancelled
    Cancelled { shim: String, resource: String },
    Injected { shim: String, script: String },
    PassedThrough,
}

/// A registry plus the collaborators that act on its decisions.
pub struct ShimHost<E, I, P> {
    engine: DispatchEngine,
    store: Arc<dyn ResourceStore + Send + Sync>,
    executor: E,
    injector: I,
    environment: P,
}

impl<E, I, P> ShimHost<E, I, P>
where
    E: RedirectExecutor,
    I: Injector,
    P: EnvironmentProvider,
{
    pub fn new(
        registry: Arc<ShimRegistry>,
        store: Arc<dyn ResourceStore + Send + Sync>,
        executor: E,
        injector: I,
        environment: P,
    ) -> Self {
        ShimHost {
            engine: DispatchEngine::new(registry),
            store,
            executor,
            injector,
            environment,
        }
    }

    pub fn engine(&self) -> &DispatchEngine {
        &self.engine
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn injector(&self) -> &I {
        &self.injector
    }

    /// Evaluate a request and hand the decision to the right collaborator.
    pub fn handle_request(
        &self,
        url: &str,
        resource_type: ResourceType,
        page_host: &str,
    ) -> Outcome {
        let ctx = self.context_for(url, resource_type, page_host);

        match self.engine.dispatch(url, resource_type, &ctx) {
            None => Outcome::PassedThrough,
            Some(Action::Serve {
                shim,
                resource,
                resource_type,
            }) => match self.store.resource_bytes(&resource) {
                Some(payload) if !payload.is_empty() => {
                    self.executor.serve(&resource, resource_type, payload);
                    Outcome::Served { shim, resource }
                }
                _ => {
                    tracing::debug!("`{}` is void; cancelling request", resource);
                    self.executor.cancel(resource_type);
                    Outcome::Cancelled { shim, resource }
                }
            },
            Some(Action::Inject {
                shim,
                script,
                helpers,
            }) => {
                self.injector.inject(&script, &helpers);
                Outcome::Injected { shim, script }
            }
        }
    }

    /// Whether a blocked request should be let through because of an opt-in.
    pub fn should_unblock(&self, url: &str, resource_type: ResourceType, page_host: &str) -> bool {
        let ctx = self.context_for(url, resource_type, page_host);
        self.engine.unblock_check(url, &ctx)
    }

    /// Options answered by the `getOptions` helper of an injected shim.
    ///
    /// An unknown id gets no options.
    pub fn shim_options(&self, shim: &str, url: &str, page_host: &str) -> ResolvedOptions {
        let ctx = self.context_for(url, ResourceType::Script, page_host);
        self.engine.registry().options_or_empty(shim, &ctx)
    }

    fn context_for(&self, url: &str, resource_type: ResourceType, page_host: &str) -> RuntimeContext {
        let request = Request {
            url,
            resource_type,
            page_host,
        };
        self.environment
            .context(&request)
            .with_host(page_host)
            .with_resource_type(resource_type)
    }
}

/// Resources held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryResourceStore {
    resources: HashMap<String, Vec<u8>>,
}

impl MemoryResourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.resources.insert(name.into(), bytes.into());
    }

    /// Give every resource the registry refers to a placeholder body.
    ///
    /// Names listed in `void` get an empty body instead.
    pub fn placeholders(registry: &ShimRegistry, void: &[&str]) -> Self {
        let mut store = MemoryResourceStore::new();
        for shim in registry.all() {
            let names = shim
                .file
                .iter()
                .chain(shim.matches.iter().filter_map(|e| e.target.as_ref()));
            for name in names {
                let body = if void.contains(&name.as_str()) {
                    Vec::new()
                } else {
                    format!("/* {} */", name).into_bytes()
                };
                store.insert(name.clone(), body);
            }
        }
        store
    }
}

impl ResourceStore for MemoryResourceStore {
    fn resource_bytes(&self, name: &str) -> Option<&[u8]> {
        self.resources.get(name).map(|b| b.as_slice())
    }
}

/// Fixed environment backed by a live opt-in set.
#[derive(Debug, Clone)]
pub struct StaticEnvironment {
    pub platform: HostPlatform,
    pub channel: ReleaseChannel,
    pub etp_blocked: bool,
    pub opt_ins: Arc<OptInSet>,
}

impl StaticEnvironment {
    pub fn new(platform: HostPlatform, channel: ReleaseChannel) -> Self {
        StaticEnvironment {
            platform,
            channel,
            etp_blocked: false,
            opt_ins: Arc::new(OptInSet::new()),
        }
    }

    pub fn with_etp_blocked(mut self, etp_blocked: bool) -> Self {
        self.etp_blocked = etp_blocked;
        self
    }

    pub fn with_opt_ins(mut self, opt_ins: Arc<OptInSet>) -> Self {
        self.opt_ins = opt_ins;
        self
    }
}

impl EnvironmentProvider for StaticEnvironment {
    fn context(&self, _request: &Request<'_>) -> RuntimeContext {
        RuntimeContext::new(self.platform, self.channel)
            .with_etp_blocked(self.etp_blocked)
            .with_opted_in(self.opt_ins.snapshot())
    }
}
