//! Shim evaluation engine.
//!
//! A shim table is validated once into an immutable [`ShimRegistry`]. Each
//! request is then evaluated against it without touching shared state.
//!
//! # Architecture
//!
//! ```text
//!        request (url, type) + RuntimeContext
//!                       │
//!                       ▼
//!              ┌─────────────────┐
//!              │ DispatchEngine  │
//!              └────────┬────────┘
//!                       │ candidates_for(ctx)
//!                       ▼
//!   ┌────────────────┐     ┌────────────────┐
//!   │  ShimRegistry  │ ──▶ │  Eligibility   │ (disabled, platform,
//!   └────────────────┘     └────────────────┘  branches, hosts, ETP)
//!                       │
//!                       ▼ first pattern hit
//!              ┌─────────────────┐
//!              │  Action / None  │ ──▶ ShimHost collaborators
//!              └─────────────────┘
//! ```
//!
//! # Key Concepts
//!
//! - **Patterns** - WebExtension-style URL globs (in `pattern.rs`)
//! - **Eligibility** - Ordered gates deciding whether a shim applies (in `eligibility.rs`)
//! - **Registry** - Ordered, immutable table of shims (in `registry.rs`)
//! - **Dispatch** - First-match-wins request evaluation (in `dispatch.rs`)
//! - **Opt-ins** - Host-owned set of opted-in shims (in `opt_in.rs`)
//! - **Host** - Collaborator traits that carry out decisions (in `host.rs`)
//!
//! # Usage
//!
//! ```ignore
//! use shimreg::shim::{DispatchEngine, ShimRegistry};
//!
//! let report = ShimRegistry::builtin()?;
//! let engine = DispatchEngine::new(Arc::new(report.registry));
//!
//! let ctx = RuntimeContext::new(HostPlatform::Desktop, ReleaseChannel::Release)
//!     .with_etp_blocked(true);
//! if let Some(action) = engine.dispatch(url, ResourceType::Script, &ctx) {
//!     println!("{} handles {}", action.shim(), url);
//! }
//! ```

pub mod dispatch;
pub mod eligibility;
pub mod errors;
pub mod host;
pub mod opt_in;
pub mod pattern;
pub mod registry;
pub mod validation;

pub use dispatch::{Action, DispatchEngine, DispatchRequest, Hit};
pub use eligibility::{check, is_eligible, Gate, Ineligible};
pub use errors::{LoadError, PatternError, UnknownShimError};
pub use host::{
    EnvironmentProvider, Injector, MemoryResourceStore, Outcome, RedirectExecutor, Request,
    ResourceStore, ShimHost, StaticEnvironment,
};
pub use opt_in::OptInSet;
pub use pattern::MatchPattern;
pub use registry::{LoadReport, ShimRegistry};
