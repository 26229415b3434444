//! Platform and release-channel gating.
//!
//! Shim tables name platforms and branches as free-form strings. Anything we
//! don't recognize is kept verbatim and simply never matches, which is how
//! test fixtures express "never eligible".

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Platform the host browser runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostPlatform {
    #[default]
    Desktop,
    Android,
}

impl HostPlatform {
    pub fn as_str(&self) -> &'static str {
        match self {
            HostPlatform::Desktop => "desktop",
            HostPlatform::Android => "android",
        }
    }
}

impl fmt::Display for HostPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HostPlatform {
    type Err = PlatformParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "desktop" => Ok(HostPlatform::Desktop),
            "android" => Ok(HostPlatform::Android),
            _ => Err(PlatformParseError(s.to_string())),
        }
    }
}

/// Error returned when parsing an invalid host platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformParseError(pub String);

impl fmt::Display for PlatformParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid platform '{}', valid values: desktop, android",
            self.0
        )
    }
}

impl std::error::Error for PlatformParseError {}

/// Platform constraint as written in a shim table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Platform {
    #[default]
    All,
    Desktop,
    Android,
    /// Unrecognized value, never matches
    Unknown(String),
}

impl Platform {
    /// Parse a table value, ignoring case. Never fails; unknown strings are
    /// preserved.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Platform::All,
            "desktop" => Platform::Desktop,
            "android" => Platform::Android,
            _ => Platform::Unknown(s.to_string()),
        }
    }

    /// Check whether this constraint admits the given host platform.
    pub fn matches(&self, host: HostPlatform) -> bool {
        match self {
            Platform::All => true,
            Platform::Desktop => host == HostPlatform::Desktop,
            Platform::Android => host == HostPlatform::Android,
            Platform::Unknown(_) => false,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Platform::All => "all",
            Platform::Desktop => "desktop",
            Platform::Android => "android",
            Platform::Unknown(s) => s,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Release channel of the running browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseChannel {
    Nightly,
    /// Developer edition
    Aurora,
    Beta,
    #[default]
    Release,
    Esr,
}

impl ReleaseChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReleaseChannel::Nightly => "nightly",
            ReleaseChannel::Aurora => "aurora",
            ReleaseChannel::Beta => "beta",
            ReleaseChannel::Release => "release",
            ReleaseChannel::Esr => "esr",
        }
    }
}

impl fmt::Display for ReleaseChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReleaseChannel {
    type Err = ChannelParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "nightly" => Ok(ReleaseChannel::Nightly),
            "aurora" | "dev-edition" => Ok(ReleaseChannel::Aurora),
            "beta" => Ok(ReleaseChannel::Beta),
            "release" => Ok(ReleaseChannel::Release),
            "esr" => Ok(ReleaseChannel::Esr),
            _ => Err(ChannelParseError(s.to_string())),
        }
    }
}

/// Error returned when parsing an invalid release channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelParseError(pub String);

impl fmt::Display for ChannelParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid release channel '{}', valid values: nightly, aurora, beta, release, esr",
            self.0
        )
    }
}

impl std::error::Error for ChannelParseError {}

/// Channel half of a branch token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChannelSpec {
    /// `all` - every channel
    Any,
    Is(ReleaseChannel),
    Unknown(String),
}

impl ChannelSpec {
    fn matches(&self, channel: ReleaseChannel) -> bool {
        match self {
            ChannelSpec::Any => true,
            ChannelSpec::Is(c) => *c == channel,
            ChannelSpec::Unknown(_) => false,
        }
    }
}

/// A `channel[:platform]` branch token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BranchSpec {
    pub channel: ChannelSpec,
    pub platform: Option<Platform>,
}

impl BranchSpec {
    /// Parse a branch token. Never fails; unknown halves never match.
    pub fn parse(token: &str) -> Self {
        let (channel, platform) = match token.split_once(':') {
            Some((c, p)) => (c, Some(Platform::parse(p))),
            None => (token, None),
        };

        let channel = channel.trim();
        let channel = if channel.eq_ignore_ascii_case("all") {
            ChannelSpec::Any
        } else {
            match channel.parse::<ReleaseChannel>() {
                Ok(c) => ChannelSpec::Is(c),
                Err(_) => ChannelSpec::Unknown(channel.to_string()),
            }
        };

        BranchSpec { channel, platform }
    }

    /// Check whether this token admits the running channel and platform.
    pub fn matches(&self, channel: ReleaseChannel, platform: HostPlatform) -> bool {
        self.channel.matches(channel)
            && self.platform.as_ref().map_or(true, |p| p.matches(platform))
    }
}

impl fmt::Display for BranchSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.channel {
            ChannelSpec::Any => f.write_str("all")?,
            ChannelSpec::Is(c) => f.write_str(c.as_str())?,
            ChannelSpec::Unknown(s) => f.write_str(s)?,
        }
        if let Some(p) = &self.platform {
            write!(f, ":{}", p)?;
        }
        Ok(())
    }
}

/// Check a branch list. An empty list matches nothing.
pub fn any_branch_matches(
    branches: &[BranchSpec],
    channel: ReleaseChannel,
    platform: HostPlatform,
) -> bool {
    branches.iter().any(|b| b.matches(channel, platform))
}
