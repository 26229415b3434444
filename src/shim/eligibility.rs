//! Rule eligibility: does a shim apply in the current environment?
//!
//! A shim passes through a fixed sequence of gates. The cheap identity gates
//! (disabled, platform, branches) come first, then the host lists, then the
//! external tracking-protection signal. The first failing gate stops the
//! evaluation.

use std::fmt;

use crate::core::context::RuntimeContext;
use crate::core::platform::{any_branch_matches, HostPlatform, ReleaseChannel};
use crate::core::shim::ShimDefinition;

/// One eligibility check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gate {
    Disabled,
    Platform,
    Branches,
    Hosts,
    NotHosts,
    Etp,
}

impl Gate {
    /// All gates in evaluation order.
    pub const ALL: [Gate; 6] = [
        Gate::Disabled,
        Gate::Platform,
        Gate::Branches,
        Gate::Hosts,
        Gate::NotHosts,
        Gate::Etp,
    ];

    /// Gates consulted before unblocking opted-in URLs.
    pub const UNBLOCK: [Gate; 5] = [
        Gate::Disabled,
        Gate::Platform,
        Gate::Branches,
        Gate::Hosts,
        Gate::NotHosts,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Gate::Disabled => "disabled",
            Gate::Platform => "platform",
            Gate::Branches => "branches",
            Gate::Hosts => "hosts",
            Gate::NotHosts => "notHosts",
            Gate::Etp => "onlyIfBlockedByETP",
        }
    }

    /// Evaluate this gate alone.
    pub fn check(&self, shim: &ShimDefinition, ctx: &RuntimeContext) -> Result<(), Ineligible> {
        match self {
            Gate::Disabled => {
                if shim.disabled {
                    return Err(Ineligible::Disabled);
                }
            }
            Gate::Platform => {
                if !shim.platform.matches(ctx.platform) {
                    return Err(Ineligible::Platform {
                        required: shim.platform.to_string(),
                        actual: ctx.platform,
                    });
                }
            }
            Gate::Branches => {
                if let Some(branches) = &shim.branches {
                    if !any_branch_matches(branches, ctx.channel, ctx.platform) {
                        return Err(Ineligible::Branch {
                            allowed: branches.iter().map(|b| b.to_string()).collect(),
                            channel: ctx.channel,
                            platform: ctx.platform,
                        });
                    }
                }
            }
            Gate::Hosts => {
                if let Some(hosts) = &shim.hosts {
                    if !hosts.contains(&ctx.host) {
                        return Err(Ineligible::HostNotListed {
                            host: ctx.host.clone(),
                        });
                    }
                }
            }
            Gate::NotHosts => {
                if let Some(not_hosts) = &shim.not_hosts {
                    if not_hosts.contains(&ctx.host) {
                        return Err(Ineligible::HostExcluded {
                            host: ctx.host.clone(),
                        });
                    }
                }
            }
            Gate::Etp => {
                if shim.only_if_blocked_by_etp && !ctx.etp_blocked {
                    return Err(Ineligible::NotBlockedByEtp);
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a shim doesn't apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ineligible {
    Disabled,
    Platform {
        required: String,
        actual: HostPlatform,
    },
    Branch {
        allowed: Vec<String>,
        channel: ReleaseChannel,
        platform: HostPlatform,
    },
    HostNotListed {
        host: String,
    },
    HostExcluded {
        host: String,
    },
    NotBlockedByEtp,
}

impl fmt::Display for Ineligible {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ineligible::Disabled => write!(f, "shim is disabled"),
            Ineligible::Platform { required, actual } => {
                write!(f, "requires platform `{}`, running on `{}`", required, actual)
            }
            Ineligible::Branch {
                allowed,
                channel,
                platform,
            } => {
                if allowed.is_empty() {
                    write!(f, "branch list is empty")
                } else {
                    write!(
                        f,
                        "limited to branches [{}], running {}:{}",
                        allowed.join(", "),
                        channel,
                        platform
                    )
                }
            }
            Ineligible::HostNotListed { host } => {
                write!(f, "page host `{}` is not in `hosts`", host)
            }
            Ineligible::HostExcluded { host } => write!(f, "page host `{}` is in `notHosts`", host),
            Ineligible::NotBlockedByEtp => {
                write!(f, "only applies when tracking protection blocks the request")
            }
        }
    }
}

/// Run every gate, stopping at the first failure.
pub fn check(shim: &ShimDefinition, ctx: &RuntimeContext) -> Result<(), Ineligible> {
    check_gates(&Gate::ALL, shim, ctx)
}

/// Run a subset of gates in order, stopping at the first failure.
pub fn check_gates(
    gates: &[Gate],
    shim: &ShimDefinition,
    ctx: &RuntimeContext,
) -> Result<(), Ineligible> {
    gates.iter().try_for_each(|gate| gate.check(shim, ctx))
}

/// Whether a shim applies in this context.
pub fn is_eligible(shim: &ShimDefinition, ctx: &RuntimeContext) -> bool {
    check(shim, ctx).is_ok()
}

/// Evaluate every gate without stopping, for diagnostics.
pub fn evaluate_all(
    shim: &ShimDefinition,
    ctx: &RuntimeContext,
) -> Vec<(Gate, Result<(), Ineligible>)> {
    Gate::ALL
        .iter()
        .map(|gate| (*gate, gate.check(shim, ctx)))
        .collect()
}
