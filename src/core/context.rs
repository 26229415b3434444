//! Per-request runtime context.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::core::platform::{HostPlatform, ReleaseChannel};
use crate::core::resource::ResourceType;

/// Environment facts for a single evaluation.
///
/// Built fresh for every request and dropped afterwards. The opt-in set is a
/// snapshot owned by the host; the engine only reads it.
#[derive(Debug, Clone)]
pub struct RuntimeContext {
    /// Platform the browser runs on
    pub platform: HostPlatform,

    /// Release channel of the browser
    pub channel: ReleaseChannel,

    /// Host of the page that issued the request (lowercase)
    pub host: String,

    /// Resource type of the request being evaluated
    pub resource_type: ResourceType,

    /// Whether tracking protection would block the request
    pub etp_blocked: bool,

    /// Ids of shims the user has opted into
    pub opted_in: Arc<BTreeSet<String>>,
}

impl RuntimeContext {
    /// Create a context with no host, no opt-ins, and ETP not blocking.
    pub fn new(platform: HostPlatform, channel: ReleaseChannel) -> Self {
        RuntimeContext {
            platform,
            channel,
            host: String::new(),
            resource_type: ResourceType::Other,
            etp_blocked: false,
            opted_in: Arc::new(BTreeSet::new()),
        }
    }

    /// Set the requesting page host. Hostnames compare case-insensitively.
    pub fn with_host(mut self, host: impl AsRef<str>) -> Self {
        self.host = host.as_ref().to_ascii_lowercase();
        self
    }

    /// Set the resource type of the request.
    pub fn with_resource_type(mut self, resource_type: ResourceType) -> Self {
        self.resource_type = resource_type;
        self
    }

    /// Set the tracking-protection signal.
    pub fn with_etp_blocked(mut self, etp_blocked: bool) -> Self {
        self.etp_blocked = etp_blocked;
        self
    }

    /// Use an opt-in snapshot published by the host.
    pub fn with_opted_in(mut self, opted_in: Arc<BTreeSet<String>>) -> Self {
        self.opted_in = opted_in;
        self
    }

    /// Check whether the user opted into a shim.
    pub fn is_opted_in(&self, id: &str) -> bool {
        self.opted_in.contains(id)
    }
}

impl Default for RuntimeContext {
    fn default() -> Self {
        Self::new(HostPlatform::default(), ReleaseChannel::default())
    }
}
