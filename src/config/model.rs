//! Config data model: one [`GraphConfig`] per configuration file, one
//! [`ActorConfig`] per entry in its `actors` array.

// Layer 1: Standard library imports
use std::time::Duration;

// Layer 2: Third-party crate imports
use serde::{Deserialize, Serialize};

// Layer 3: Internal module imports
use crate::master::FailurePolicy;

/// Per-actor pause behavior for in-flight messages, left unresolved by the
/// source material and made explicit here (buffer is the default).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PausePolicy {
    /// Queue messages in the mailbox while paused; deliver on resume.
    Buffer,
    /// Discard messages that arrive while paused.
    Drop,
}

impl Default for PausePolicy {
    fn default() -> Self {
        Self::Buffer
    }
}

/// Mirrors [`FailurePolicy`] in a `Deserialize`-friendly, kebab-case shape
/// matching the config file's `failure-policy ∈ {critical, optional,
/// restartable}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicyConfig {
    Critical,
    Optional,
    Restartable,
}

impl Default for FailurePolicyConfig {
    fn default() -> Self {
        Self::Critical
    }
}

impl From<FailurePolicyConfig> for FailurePolicy {
    fn from(value: FailurePolicyConfig) -> Self {
        match value {
            FailurePolicyConfig::Critical => FailurePolicy::Critical,
            FailurePolicyConfig::Optional => FailurePolicy::Optional,
            FailurePolicyConfig::Restartable => FailurePolicy::Restartable,
        }
    }
}

/// One or several channel patterns; config files may write either a bare
/// string or an array under `read-from`/`write-to`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChannelList {
    One(String),
    Many(Vec<String>),
}

impl ChannelList {
    pub fn as_slice_owned(&self) -> Vec<String> {
        match self {
            Self::One(channel) => vec![channel.clone()],
            Self::Many(channels) => channels.clone(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    5
}

/// One entry in the config file's `actors` array.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ActorConfig {
    pub name: String,
    /// Logical actor type, resolved against the binary's built-in class
    /// registry (see `src/bin/race.rs`) — the core has no dynamic-dispatch
    /// plugin mechanism, so `class` is only ever as open-ended as the
    /// binary that loads this config compiles in.
    pub class: String,
    #[serde(default)]
    pub read_from: Option<ChannelList>,
    #[serde(default)]
    pub write_to: Option<ChannelList>,
    /// Node id of the peer that owns this actor, if it is remote to the
    /// node loading this config.
    #[serde(default)]
    pub remote: Option<String>,
    #[serde(default = "default_timeout_secs", rename = "create-timeout")]
    pub create_timeout_secs: u64,
    #[serde(default = "default_timeout_secs", rename = "init-timeout")]
    pub init_timeout_secs: u64,
    #[serde(default = "default_timeout_secs", rename = "start-timeout")]
    pub start_timeout_secs: u64,
    #[serde(default = "default_timeout_secs", rename = "terminate-timeout")]
    pub terminate_timeout_secs: u64,
    #[serde(default)]
    pub failure_policy: FailurePolicyConfig,
    #[serde(default)]
    pub pause_policy: PausePolicy,
    #[serde(default = "default_mailbox_capacity")]
    pub mailbox_capacity: usize,
}

fn default_mailbox_capacity() -> usize {
    64
}

impl ActorConfig {
    pub fn create_timeout(&self) -> Duration {
        Duration::from_secs(self.create_timeout_secs)
    }

    pub fn init_timeout(&self) -> Duration {
        Duration::from_secs(self.init_timeout_secs)
    }

    pub fn start_timeout(&self) -> Duration {
        Duration::from_secs(self.start_timeout_secs)
    }

    pub fn terminate_timeout(&self) -> Duration {
        Duration::from_secs(self.terminate_timeout_secs)
    }

    pub fn is_remote(&self) -> bool {
        self.remote.is_some()
    }
}

/// Top-level shape of a configuration file: a graph name plus its actors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    pub name: String,
    #[serde(default)]
    pub actors: Vec<ActorConfig>,
    /// Required once any actor declares `remote`; rejected at validation
    /// otherwise (no implicit skew tolerance — §9 open question).
    #[serde(default, rename = "max-clock-diff-ms")]
    pub max_clock_diff_ms: Option<u64>,
    /// TCP port this node listens on for incoming remote connections.
    #[serde(default)]
    pub port: Option<u16>,
}

impl GraphConfig {
    pub fn max_clock_diff(&self) -> Option<Duration> {
        self.max_clock_diff_ms.map(Duration::from_millis)
    }

    pub fn has_remote_actors(&self) -> bool {
        self.actors.iter().any(ActorConfig::is_remote)
    }
}
