//! Core data structures for shimreg.
//!
//! This module contains the types the engine works on:
//! - Shim definitions and their raw table records
//! - Platforms, release channels and branch tokens
//! - Resource types and injector helpers
//! - Option rules and the per-request runtime context

pub mod context;
pub mod helpers;
pub mod options;
pub mod platform;
pub mod resource;
pub mod shim;

pub use context::RuntimeContext;
pub use helpers::{HelperSet, ShimHelper};
pub use options::{OptionRule, ResolvedOptions};
pub use platform::{BranchSpec, HostPlatform, Platform, ReleaseChannel};
pub use resource::{ResourceType, ResourceTypeSet};
pub use shim::{MatchEntry, RawMatchEntry, RawShim, RawTable, ShimDefinition};
