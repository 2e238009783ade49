// Dotlanth
// Copyright (C) 2025 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Autotune configuration.
//!
//! The configuration is supplied once when a [`QueryTuner`](crate::QueryTuner)
//! is built and is read-only afterwards. It can be assembled in code with the
//! `with_*` builders or loaded from a JSON document.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{AutoTuneError, AutoTuneResult};

/// Implicit tuning mode used when a query carries no explicit override
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum AutoTuneMode {
    /// Tune every query
    DefaultOn,
    /// Tune no query unless it asks for it
    DefaultOff,
    /// Tune queries that select no explicit fetch detail
    #[default]
    DefaultOnIfEmpty,
    /// Tune only queries carrying an explicit per-query override
    Explicit,
}

impl AutoTuneMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AutoTuneMode::DefaultOn => "default_on",
            AutoTuneMode::DefaultOff => "default_off",
            AutoTuneMode::DefaultOnIfEmpty => "default_on_if_empty",
            AutoTuneMode::Explicit => "explicit",
        }
    }

    /// Resolves the implicit decision for a query without an override.
    pub fn resolve(&self, detail_empty: bool) -> bool {
        match self {
            AutoTuneMode::DefaultOn => true,
            AutoTuneMode::DefaultOff => false,
            AutoTuneMode::DefaultOnIfEmpty => detail_empty,
            AutoTuneMode::Explicit => false,
        }
    }
}

impl fmt::Display for AutoTuneMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AutoTuneMode {
    type Err = AutoTuneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "default_on" | "on" => Ok(AutoTuneMode::DefaultOn),
            "default_off" | "off" => Ok(AutoTuneMode::DefaultOff),
            "default_on_if_empty" | "default_onifempty" | "on_if_empty" => Ok(AutoTuneMode::DefaultOnIfEmpty),
            "explicit" => Ok(AutoTuneMode::Explicit),
            _ => Err(AutoTuneError::InvalidMode(s.to_string())),
        }
    }
}

impl TryFrom<String> for AutoTuneMode {
    type Error = AutoTuneError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Sampling rates used by the built-in profiler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfilingConfig {
    /// Number of requests per origin that are always profiled
    pub base: u32,
    /// Probability of profiling a request once `base` is exceeded
    pub rate: f64,
    /// Minimum number of profiled requests per origin
    pub min: u32,
}

impl Default for ProfilingConfig {
    fn default() -> Self {
        Self { base: 10, rate: 0.05, min: 1 }
    }
}

/// Tuning store sizing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Maximum number of tuned plans kept. `None` keeps every plan.
    pub capacity: Option<usize>,
    /// Plans older than this are treated as absent
    pub ttl_secs: Option<u64>,
}

impl StoreConfig {
    pub fn is_bounded(&self) -> bool {
        self.capacity.is_some() || self.ttl_secs.is_some()
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoTuneConfig {
    /// Apply tuned fetch plans to eligible queries
    pub query_tuning: bool,
    /// Sample queries so that plans can be learned
    pub profiling: bool,
    pub mode: AutoTuneMode,
    /// Profile queries that are not eligible for tuning
    pub full_profiling: bool,
    pub profiling_rates: ProfilingConfig,
    pub store: StoreConfig,
}

impl Default for AutoTuneConfig {
    fn default() -> Self {
        Self {
            query_tuning: true,
            profiling: true,
            mode: AutoTuneMode::default(),
            full_profiling: true,
            profiling_rates: ProfilingConfig::default(),
            store: StoreConfig::default(),
        }
    }
}

impl AutoTuneConfig {
    /// Configuration with both tuning and profiling switched off.
    pub fn disabled() -> Self {
        Self {
            query_tuning: false,
            profiling: false,
            ..Self::default()
        }
    }

    pub fn with_query_tuning(mut self, enabled: bool) -> Self {
        self.query_tuning = enabled;
        self
    }

    pub fn with_profiling(mut self, enabled: bool) -> Self {
        self.profiling = enabled;
        self
    }

    pub fn with_mode(mut self, mode: AutoTuneMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_full_profiling(mut self, enabled: bool) -> Self {
        self.full_profiling = enabled;
        self
    }

    pub fn with_profiling_rates(mut self, rates: ProfilingConfig) -> Self {
        self.profiling_rates = rates;
        self
    }

    pub fn with_store(mut self, store: StoreConfig) -> Self {
        self.store = store;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.query_tuning || self.profiling
    }

    pub fn validate(&self) -> AutoTuneResult<()> {
        let rate = self.profiling_rates.rate;
        if !(0.0..=1.0).contains(&rate) {
            return Err(AutoTuneError::InvalidConfiguration(format!("profiling rate {} is outside [0, 1]", rate)));
        }

        if self.store.capacity == Some(0) {
            return Err(AutoTuneError::InvalidConfiguration("store capacity must be greater than zero".to_string()));
        }

        if self.store.ttl_secs == Some(0) {
            return Err(AutoTuneError::InvalidConfiguration("store ttl must be greater than zero".to_string()));
        }

        Ok(())
    }

    /// Parses and validates a JSON configuration document.
    pub fn from_json_str(json: &str) -> AutoTuneResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> AutoTuneResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }
}
