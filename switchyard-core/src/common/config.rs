/*
 * Copyright (c) 2026. Switchyard contributors
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */

use std::path::Path;
use std::time::Duration;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

/// Configuration for the Switchyard routing core.
///
/// All values are loadable from TOML files in XDG-compliant directories;
/// any key left unset falls back to its default.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct SwitchyardConfig {
    /// Routing and delivery configuration
    pub routing: RoutingConfig,
    /// Timeout configuration
    pub timeouts: TimeoutConfig,
    /// Limits and capacity configuration
    pub limits: LimitsConfig,
}

/// Routing and delivery configuration values
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Maximum number of concurrent transport send attempts
    pub max_parallel_sends: usize,
    /// Interval between retries of a retryable send failure, in milliseconds
    pub send_retry_interval_ms: u64,
    /// Grace period before an expired routing entry is actually purged, in milliseconds
    pub routing_table_grace_period_ms: u64,
    /// Interval of the routing-table cleanup sweep, in milliseconds
    pub cleanup_interval_ms: u64,
}

/// Timeout-related configuration values
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Default message time-to-live when the caller does not supply one, in milliseconds
    pub default_ttl_ms: u64,
    /// System-wide shutdown timeout in milliseconds
    pub shutdown_timeout_ms: u64,
}

/// Limits and capacity configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Capacity of the inbound message channel fed by transports
    pub inbound_channel_capacity: usize,
    /// Capacity of each in-process transport channel
    pub in_process_channel_capacity: usize,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            max_parallel_sends: 4,
            send_retry_interval_ms: 500,
            routing_table_grace_period_ms: 30_000,
            cleanup_interval_ms: 5_000,
        }
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            default_ttl_ms: 60_000,
            shutdown_timeout_ms: 10_000,
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            inbound_channel_capacity: 255,
            in_process_channel_capacity: 255,
        }
    }
}

impl SwitchyardConfig {
    /// Convert the retry interval to a `Duration`
    pub const fn send_retry_interval(&self) -> Duration {
        Duration::from_millis(self.routing.send_retry_interval_ms)
    }

    /// Convert the cleanup sweep interval to a `Duration`
    pub const fn cleanup_interval(&self) -> Duration {
        Duration::from_millis(self.routing.cleanup_interval_ms)
    }

    /// Load configuration from XDG-compliant locations.
    ///
    /// Looks for `switchyard/config.toml` under the XDG config directories,
    /// honoring a `SWITCHYARD_CONFIG` environment variable as an explicit
    /// override. If no configuration file is found, returns the default
    /// configuration. If a configuration file exists but is malformed, logs
    /// an error and uses defaults.
    pub fn load() -> Self {
        use tracing::{error, info};

        if let Ok(path) = std::env::var("SWITCHYARD_CONFIG") {
            return Self::load_from_path(Path::new(&path));
        }

        let xdg_dirs = match xdg::BaseDirectories::with_prefix("switchyard") {
            Ok(dirs) => dirs,
            Err(e) => {
                error!("Failed to initialize XDG directories: {}", e);
                return Self::default();
            }
        };

        if let Some(path) = xdg_dirs.find_config_file("config.toml") {
            info!("Loading configuration from: {}", path.display());
            Self::load_from_path(&path)
        } else {
            info!("No configuration file found, using defaults");
            Self::default()
        }
    }

    /// Load configuration from an explicit path, falling back to defaults on
    /// read or parse failure.
    pub fn load_from_path(path: &Path) -> Self {
        use tracing::{error, info};

        match std::fs::read_to_string(path) {
            Ok(config_str) => match toml::from_str::<Self>(&config_str) {
                Ok(config) => {
                    info!("Successfully loaded configuration");
                    config
                }
                Err(e) => {
                    error!("Failed to parse configuration file {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                error!("Failed to read configuration file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}

lazy_static! {
    /// Global configuration instance loaded from XDG-compliant locations
    pub static ref CONFIG: SwitchyardConfig = SwitchyardConfig::load();
}
