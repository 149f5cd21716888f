//! Agent configuration.
//!
//! Settings are merged from an optional `config/default` file and
//! `TRACKSIDE_`-prefixed environment variables with `__` as the section
//! separator (e.g. `TRACKSIDE_CHANNEL__URL`, `TRACKSIDE_LAP__BASE_URL`),
//! with hard-coded defaults filling the rest.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;
use trackside_core::constants::{
    DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_HTTP_TIMEOUT_MS, DEFAULT_ITERATION_DELAY_MS,
    DEFAULT_PING_INTERVAL_SECS, DEFAULT_PONG_TIMEOUT_MS, DEFAULT_RECONNECT_BACKOFF_MS,
    DEFAULT_RECOVERY_PAUSE_MS, DEFAULT_SEND_TIMEOUT_MS, DEFAULT_SKIP_PAUSE_MS,
};

/// Top-level agent settings.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub lap: LapSettings,
    pub channel: ChannelSettings,
    pub agent: AgentSettings,
}

/// Lap-tracking service settings.
#[derive(Debug, Deserialize, Clone)]
pub struct LapSettings {
    pub base_url: String,
    pub timeout_ms: u64,
}

/// Notification channel settings.
#[derive(Debug, Deserialize, Clone)]
pub struct ChannelSettings {
    pub url: String,
    pub connect_timeout_ms: u64,
    pub send_timeout_ms: u64,
    pub ping_interval_secs: u64,
    pub pong_timeout_ms: u64,
    pub reconnect_backoff_ms: u64,
}

/// Main-loop timing settings.
#[derive(Debug, Deserialize, Clone)]
pub struct AgentSettings {
    pub iteration_delay_ms: u64,
    pub skip_pause_ms: u64,
    pub recovery_pause_ms: u64,
}

/// Partial settings as read from file/environment; missing values fall back
/// to defaults during the merge.
#[derive(Debug, Default, Deserialize)]
struct PartialSettings {
    lap: Option<PartialLapSettings>,
    channel: Option<PartialChannelSettings>,
    agent: Option<PartialAgentSettings>,
}

#[derive(Debug, Default, Deserialize)]
struct PartialLapSettings {
    base_url: Option<String>,
    timeout_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct PartialChannelSettings {
    url: Option<String>,
    connect_timeout_ms: Option<u64>,
    send_timeout_ms: Option<u64>,
    ping_interval_secs: Option<u64>,
    pong_timeout_ms: Option<u64>,
    reconnect_backoff_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct PartialAgentSettings {
    iteration_delay_ms: Option<u64>,
    skip_pause_ms: Option<u64>,
    recovery_pause_ms: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            lap: LapSettings {
                base_url: "http://127.0.0.1:8080".to_string(),
                timeout_ms: DEFAULT_HTTP_TIMEOUT_MS,
            },
            channel: ChannelSettings {
                url: "ws://127.0.0.1:8765".to_string(),
                connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
                send_timeout_ms: DEFAULT_SEND_TIMEOUT_MS,
                ping_interval_secs: DEFAULT_PING_INTERVAL_SECS,
                pong_timeout_ms: DEFAULT_PONG_TIMEOUT_MS,
                reconnect_backoff_ms: DEFAULT_RECONNECT_BACKOFF_MS,
            },
            agent: AgentSettings {
                iteration_delay_ms: DEFAULT_ITERATION_DELAY_MS,
                skip_pause_ms: DEFAULT_SKIP_PAUSE_MS,
                recovery_pause_ms: DEFAULT_RECOVERY_PAUSE_MS,
            },
        }
    }
}

impl Settings {
    /// Lap client configuration view.
    #[must_use]
    pub fn lap_config(&self) -> trackside_lap::LapApiConfig {
        trackside_lap::LapApiConfig {
            base_url: self.lap.base_url.clone(),
            timeout: Duration::from_millis(self.lap.timeout_ms),
        }
    }

    /// Notification channel configuration view.
    #[must_use]
    pub fn channel_config(&self) -> trackside_channel::ChannelConfig {
        trackside_channel::ChannelConfig {
            url: self.channel.url.clone(),
            connect_timeout: Duration::from_millis(self.channel.connect_timeout_ms),
            send_timeout: Duration::from_millis(self.channel.send_timeout_ms),
            ping_interval: Duration::from_secs(self.channel.ping_interval_secs),
            pong_timeout: Duration::from_millis(self.channel.pong_timeout_ms),
            reconnect_backoff: Duration::from_millis(self.channel.reconnect_backoff_ms),
        }
    }

    /// Main-loop timing view.
    #[must_use]
    pub fn loop_timing(&self) -> crate::orchestrator::LoopTiming {
        crate::orchestrator::LoopTiming {
            iteration_delay: Duration::from_millis(self.agent.iteration_delay_ms),
            skip_pause: Duration::from_millis(self.agent.skip_pause_ms),
            recovery_pause: Duration::from_millis(self.agent.recovery_pause_ms),
        }
    }
}

/// Load settings from `config/default` and the environment, merged over
/// defaults.
pub fn load_config() -> Result<Settings, ConfigError> {
    let builder = Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(Environment::with_prefix("TRACKSIDE").separator("__"));

    let partial: PartialSettings = builder.build()?.try_deserialize()?;
    let default = Settings::default();

    let lap = partial.lap.unwrap_or_default();
    let channel = partial.channel.unwrap_or_default();
    let agent = partial.agent.unwrap_or_default();

    Ok(Settings {
        lap: LapSettings {
            base_url: lap.base_url.unwrap_or(default.lap.base_url),
            timeout_ms: lap.timeout_ms.unwrap_or(default.lap.timeout_ms),
        },
        channel: ChannelSettings {
            url: channel.url.unwrap_or(default.channel.url),
            connect_timeout_ms: channel
                .connect_timeout_ms
                .unwrap_or(default.channel.connect_timeout_ms),
            send_timeout_ms: channel
                .send_timeout_ms
                .unwrap_or(default.channel.send_timeout_ms),
            ping_interval_secs: channel
                .ping_interval_secs
                .unwrap_or(default.channel.ping_interval_secs),
            pong_timeout_ms: channel
                .pong_timeout_ms
                .unwrap_or(default.channel.pong_timeout_ms),
            reconnect_backoff_ms: channel
                .reconnect_backoff_ms
                .unwrap_or(default.channel.reconnect_backoff_ms),
        },
        agent: AgentSettings {
            iteration_delay_ms: agent
                .iteration_delay_ms
                .unwrap_or(default.agent.iteration_delay_ms),
            skip_pause_ms: agent.skip_pause_ms.unwrap_or(default.agent.skip_pause_ms),
            recovery_pause_ms: agent
                .recovery_pause_ms
                .unwrap_or(default.agent.recovery_pause_ms),
        },
    })
}
