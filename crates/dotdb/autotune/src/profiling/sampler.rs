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

use dashmap::DashMap;
use rand::Rng;
use std::sync::atomic::{AtomicU64, Ordering};

use super::ProfilingListener;
use crate::config::ProfilingConfig;
use crate::query::{OriginNode, TunableQuery};

#[derive(Debug, Default)]
struct OriginCounters {
    requests: AtomicU64,
    profiled: AtomicU64,
}

/// Rate based profiling sampler
///
/// For every query point the first `base` requests are profiled. After that
/// a request is profiled with probability `rate`, and always while fewer
/// than `min` requests have been profiled.
#[derive(Debug)]
pub struct SamplingProfiler {
    config: ProfilingConfig,
    origins: DashMap<String, OriginCounters>,
}

impl SamplingProfiler {
    pub fn new(config: ProfilingConfig) -> Self {
        Self { config, origins: DashMap::new() }
    }

    pub fn config(&self) -> &ProfilingConfig {
        &self.config
    }

    pub fn request_count(&self, key: &str) -> u64 {
        self.origins.get(key).map(|c| c.requests.load(Ordering::Relaxed)).unwrap_or(0)
    }

    pub fn profiled_count(&self, key: &str) -> u64 {
        self.origins.get(key).map(|c| c.profiled.load(Ordering::Relaxed)).unwrap_or(0)
    }

    /// Forgets the counters of every query point.
    pub fn reset(&self) {
        self.origins.clear();
    }

    fn should_profile(&self, counters: &OriginCounters) -> bool {
        let request = counters.requests.fetch_add(1, Ordering::Relaxed);
        let profiled = counters.profiled.load(Ordering::Relaxed);

        let profile = request < u64::from(self.config.base)
            || profiled < u64::from(self.config.min)
            || (self.config.rate > 0.0 && rand::thread_rng().gen_bool(self.config.rate.min(1.0)));

        if profile {
            counters.profiled.fetch_add(1, Ordering::Relaxed);
        }
        profile
    }
}

impl Default for SamplingProfiler {
    fn default() -> Self {
        Self::new(ProfilingConfig::default())
    }
}

impl ProfilingListener for SamplingProfiler {
    fn is_profile_request(&self, origin: &OriginNode, _query: &dyn TunableQuery) -> bool {
        if let Some(counters) = self.origins.get(origin.key()) {
            return self.should_profile(&counters);
        }
        let counters = self.origins.entry(origin.key().to_string()).or_default();
        self.should_profile(&counters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{CallStack, QueryContext};

    fn origin(key: &str) -> OriginNode {
        OriginNode::root(CallStack::new([key]))
    }

    #[test]
    fn test_profiles_base_requests_only_without_rate() {
        let profiler = SamplingProfiler::new(ProfilingConfig { base: 3, rate: 0.0, min: 1 });
        let origin = origin("orders::list");
        let query = QueryContext::new("Order");

        let profiled = (0..10).filter(|_| profiler.is_profile_request(&origin, &query)).count();
        assert_eq!(profiled, 3);
        assert_eq!(profiler.request_count("orders::list"), 10);
        assert_eq!(profiler.profiled_count("orders::list"), 3);
    }

    #[test]
    fn test_min_profiled_requests() {
        let profiler = SamplingProfiler::new(ProfilingConfig { base: 0, rate: 0.0, min: 2 });
        let origin = origin("orders::list");
        let query = QueryContext::new("Order");

        let decisions: Vec<bool> = (0..4).map(|_| profiler.is_profile_request(&origin, &query)).collect();
        assert_eq!(decisions, vec![true, true, false, false]);
    }

    #[test]
    fn test_full_rate_always_profiles() {
        let profiler = SamplingProfiler::new(ProfilingConfig { base: 0, rate: 1.0, min: 0 });
        let origin = origin("orders::list");
        let query = QueryContext::new("Order");

        assert!((0..20).all(|_| profiler.is_profile_request(&origin, &query)));
    }

    #[test]
    fn test_counters_are_per_origin() {
        let profiler = SamplingProfiler::new(ProfilingConfig { base: 1, rate: 0.0, min: 0 });
        let query = QueryContext::new("Order");

        assert!(profiler.is_profile_request(&origin("a"), &query));
        assert!(!profiler.is_profile_request(&origin("a"), &query));
        assert!(profiler.is_profile_request(&origin("b"), &query));

        profiler.reset();
        assert_eq!(profiler.request_count("a"), 0);
    }
}
