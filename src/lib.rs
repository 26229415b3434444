//! shimreg - registry and dispatch engine for web compatibility shims
//!
//! This crate provides the core library functionality for shimreg,
//! including table loading, eligibility evaluation, and request dispatch.

pub mod core;
pub mod ops;
pub mod shim;
pub mod util;

/// Test utilities for shimreg unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides a shim record builder and recording
/// collaborators.
#[cfg(test)]
pub mod test_support;

pub use core::{
    context::RuntimeContext, platform::HostPlatform, platform::ReleaseChannel,
    resource::ResourceType, shim::ShimDefinition,
};

pub use shim::{Action, DispatchEngine, OptInSet, ShimRegistry};
