//! Request resource types.
//!
//! These are the `webRequest.ResourceType` values a host hands us for each
//! intercepted request. Match entries may restrict themselves to a subset.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Kind of resource a request is fetching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    MainFrame,
    SubFrame,
    Stylesheet,
    Script,
    Image,
    Imageset,
    Object,
    ObjectSubrequest,
    Xmlhttprequest,
    Xslt,
    Ping,
    Beacon,
    XmlDtd,
    Font,
    Media,
    Websocket,
    CspReport,
    WebManifest,
    Speculative,
    Other,
}

impl ResourceType {
    /// Every known resource type, in declaration order.
    pub const ALL: [ResourceType; 20] = [
        ResourceType::MainFrame,
        ResourceType::SubFrame,
        ResourceType::Stylesheet,
        ResourceType::Script,
        ResourceType::Image,
        ResourceType::Imageset,
        ResourceType::Object,
        ResourceType::ObjectSubrequest,
        ResourceType::Xmlhttprequest,
        ResourceType::Xslt,
        ResourceType::Ping,
        ResourceType::Beacon,
        ResourceType::XmlDtd,
        ResourceType::Font,
        ResourceType::Media,
        ResourceType::Websocket,
        ResourceType::CspReport,
        ResourceType::WebManifest,
        ResourceType::Speculative,
        ResourceType::Other,
    ];

    /// Get the wire name of this resource type.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::MainFrame => "main_frame",
            ResourceType::SubFrame => "sub_frame",
            ResourceType::Stylesheet => "stylesheet",
            ResourceType::Script => "script",
            ResourceType::Image => "image",
            ResourceType::Imageset => "imageset",
            ResourceType::Object => "object",
            ResourceType::ObjectSubrequest => "object_subrequest",
            ResourceType::Xmlhttprequest => "xmlhttprequest",
            ResourceType::Xslt => "xslt",
            ResourceType::Ping => "ping",
            ResourceType::Beacon => "beacon",
            ResourceType::XmlDtd => "xml_dtd",
            ResourceType::Font => "font",
            ResourceType::Media => "media",
            ResourceType::Websocket => "websocket",
            ResourceType::CspReport => "csp_report",
            ResourceType::WebManifest => "web_manifest",
            ResourceType::Speculative => "speculative",
            ResourceType::Other => "other",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = ResourceTypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ResourceTypeParseError(s.to_string()))
    }
}

/// Error returned when parsing an unknown resource type name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceTypeParseError(pub String);

impl fmt::Display for ResourceTypeParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown resource type '{}'", self.0)
    }
}

impl std::error::Error for ResourceTypeParseError {}

/// Set of resource types a match entry is restricted to.
///
/// `None` on the owning entry means "any type"; an empty set matches nothing.
pub type ResourceTypeSet = BTreeSet<ResourceType>;
