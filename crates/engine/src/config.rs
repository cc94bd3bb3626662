// Copyright 2025 boxoffice contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use serde::{Deserialize, Serialize};

/// Default log level when RUST_LOG is not set
pub const DEFAULT_LOG_LEVEL: &str = "info";
/// Whether console output is enabled by default
pub const DEFAULT_LOG_TO_CONSOLE: bool = false;
/// Component name used for the log subdirectory and file prefix
pub const LOG_COMPONENT_NAME: &str = "boxoffice";

/// Capacity limits for the inventory engine, fixed for the lifetime
/// of the process once initialization succeeds.
///
/// Fields are kept signed so that out-of-range values arriving from
/// the environment survive deserialization and are rejected with a
/// configuration error naming the field, instead of failing opaquely
/// in the config layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineLimits {
    /// Goodie exchanges allowed (stock on hand). Must be 0 or greater.
    pub exchange_stock: i64,
    /// Movies the theatre handles simultaneously. Must be at least 1.
    pub movies: i64,
    /// Times per day each movie is shown. Must be at least 1.
    pub showings_per_movie: i64,
    /// Seats in each movie room. Must be at least 1.
    pub seats_per_showing: i64,
    /// Ticket windows. Must be at least 1.
    pub windows: i64,
}

impl Default for EngineLimits {
    fn default() -> Self {
        Self {
            exchange_stock: 200,
            movies: 5,
            showings_per_movie: 4,
            seats_per_showing: 100,
            windows: 2,
        }
    }
}

impl EngineLimits {
    /// Load limits from `BOXOFFICE_`-prefixed environment variables
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::with_prefix("BOXOFFICE"))
            .build()?;

        cfg.try_deserialize()
    }

    /// Load limits from a file, with the environment taking precedence
    pub fn from_file(path: &str) -> Result<Self, config::ConfigError> {
        let cfg = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("BOXOFFICE"))
            .build()?;

        cfg.try_deserialize()
    }
}

/// Knobs for the simulation driver (the `boxoffice` binary).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// How long to keep the windows open, in seconds.
    pub run_secs: u64,
    /// Average delay between sales at one window, in milliseconds.
    /// The actual delay is random between zero and twice this value;
    /// zero disables artificial delays.
    pub avg_delay_ms: u64,
    /// Most tickets a single sale may request.
    pub max_per_sale: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            run_secs: 10,
            avg_delay_ms: 100,
            max_per_sale: 4,
        }
    }
}

impl SimulationConfig {
    /// Load simulation knobs from `SIM_`-prefixed environment variables
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::with_prefix("SIM"))
            .build()?;

        cfg.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits_match_the_standard_theatre() {
        let limits = EngineLimits::default();
        assert_eq!(limits.exchange_stock, 200);
        assert_eq!(limits.movies, 5);
        assert_eq!(limits.showings_per_movie, 4);
        assert_eq!(limits.seats_per_showing, 100);
        assert_eq!(limits.windows, 2);
    }
}
