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

//! Query tuning decision engine.
//!
//! [`QueryTuner::decide`] runs immediately before a query executes. It picks
//! one of four behaviours for the query: leave it alone, profile it, tune it
//! with a learned plan, or tune and profile it. All side effects are made on
//! the query itself or through the configured collaborators.

use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, trace};

use crate::config::{AutoTuneConfig, AutoTuneMode};
use crate::error::AutoTuneResult;
use crate::profiling::{BacktraceCallStack, CallStackSource, ProfilingListener, SamplingProfiler};
use crate::query::{FetchDetail, OriginNode, TunableQuery};
use crate::stats::{TunerStats, TunerStatsSnapshot};
use crate::tuning::{TunedPlan, TuningStore, store};

/// Result of a single tuning decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TuningOutcome {
    /// Tuning and profiling are both switched off
    Disabled,
    /// The query is not eligible for tuning; it may have been profiled
    NotEligible,
    /// Nested query continuing its parent's profiling
    Continuation,
    /// No plan has been learned for the query point yet
    NotLearned,
    /// A plan exists but does not fit the query
    Refused,
    /// A plan was applied to the query
    Applied,
    /// Query tuning is off; the query point was identified for profiling only
    ProfileOnly,
}

impl TuningOutcome {
    /// True for the outcomes reported as "tuned" by [`QueryTuner::decide`].
    pub fn is_tuned(&self) -> bool {
        matches!(self, TuningOutcome::Applied | TuningOutcome::Continuation)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TuningOutcome::Disabled => "disabled",
            TuningOutcome::NotEligible => "not_eligible",
            TuningOutcome::Continuation => "continuation",
            TuningOutcome::NotLearned => "not_learned",
            TuningOutcome::Refused => "refused",
            TuningOutcome::Applied => "applied",
            TuningOutcome::ProfileOnly => "profile_only",
        }
    }
}

impl fmt::Display for TuningOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct QueryTuner {
    query_tuning: bool,
    profiling: bool,
    full_profiling: bool,
    mode: AutoTuneMode,
    store: Arc<dyn TuningStore>,
    call_stacks: Arc<dyn CallStackSource>,
    profiling_listener: Arc<dyn ProfilingListener>,
    stats: TunerStats,
}

impl QueryTuner {
    /// Creates a tuner with the store described by `config.store`.
    pub fn new(config: &AutoTuneConfig, call_stacks: Arc<dyn CallStackSource>, profiling_listener: Arc<dyn ProfilingListener>) -> AutoTuneResult<Self> {
        config.validate()?;
        let store = store::from_config(&config.store);
        Self::with_store(config, store, call_stacks, profiling_listener)
    }

    /// Creates a tuner reading plans from a store shared with the learning
    /// subsystem.
    pub fn with_store(config: &AutoTuneConfig, store: Arc<dyn TuningStore>, call_stacks: Arc<dyn CallStackSource>, profiling_listener: Arc<dyn ProfilingListener>) -> AutoTuneResult<Self> {
        config.validate()?;

        info!(
            query_tuning = config.query_tuning,
            profiling = config.profiling,
            mode = %config.mode,
            "Query tuner created"
        );

        Ok(Self {
            query_tuning: config.query_tuning,
            profiling: config.profiling,
            full_profiling: config.full_profiling,
            mode: config.mode,
            store,
            call_stacks,
            profiling_listener,
            stats: TunerStats::new(),
        })
    }

    /// Creates a tuner using the backtrace call stack source and the
    /// sampling profiler.
    pub fn from_config(config: &AutoTuneConfig) -> AutoTuneResult<Self> {
        let profiler = SamplingProfiler::new(config.profiling_rates.clone());
        Self::new(config, Arc::new(BacktraceCallStack::default()), Arc::new(profiler))
    }

    pub fn mode(&self) -> AutoTuneMode {
        self.mode
    }

    pub fn is_query_tuning(&self) -> bool {
        self.query_tuning
    }

    pub fn is_profiling(&self) -> bool {
        self.profiling
    }

    pub fn store(&self) -> &Arc<dyn TuningStore> {
        &self.store
    }

    pub fn profiling_listener(&self) -> &Arc<dyn ProfilingListener> {
        &self.profiling_listener
    }

    /// Loads a tuned plan for a query point.
    pub fn load(&self, key: impl Into<String>, plan: TunedPlan) {
        let key = key.into();
        debug!("Loading tuned plan for {}", key);
        self.store.load(key, plan);
    }

    /// Returns the detail currently used to tune `key`.
    pub fn tuned_detail(&self, key: &str) -> Option<FetchDetail> {
        self.store.get(key).map(|plan| plan.detail().clone())
    }

    pub fn stats(&self) -> TunerStatsSnapshot {
        self.stats.snapshot()
    }

    /// Tunes and/or profiles `query`.
    ///
    /// Returns true when a tuned plan was applied or the query continues the
    /// profiling of its parent.
    pub fn decide<Q: TunableQuery>(&self, query: &mut Q) -> bool {
        self.evaluate(query).is_tuned()
    }

    /// Same as [`decide`](Self::decide) but reports the detailed outcome.
    pub fn evaluate<Q: TunableQuery>(&self, query: &mut Q) -> TuningOutcome {
        let outcome = self.tune(query);
        self.stats.record(outcome);
        trace!(outcome = outcome.as_str(), entity = query.entity_type(), "Autotune decision");
        outcome
    }

    /// Returns true if the query should be considered for tuning.
    pub fn use_auto_tune<Q: TunableQuery + ?Sized>(&self, query: &Q) -> bool {
        if query.is_cache_load() {
            // cache loads always fetch full objects
            return false;
        }

        match query.autotune_override() {
            Some(explicit) => explicit,
            None => self.mode.resolve(query.is_detail_empty()),
        }
    }

    fn tune<Q: TunableQuery>(&self, query: &mut Q) -> TuningOutcome {
        if !self.query_tuning && !self.profiling {
            return TuningOutcome::Disabled;
        }

        if !self.use_auto_tune(query) {
            if self.profiling && self.full_profiling {
                let origin = self.create_origin(query);
                self.profile(query, &origin);
            }
            return TuningOutcome::NotEligible;
        }

        if let Some(parent) = query.parent_node() {
            // lazy loading or secondary query, keep collecting for the parent
            let inherited = parent.profiling_listener().cloned();
            if let Some(listener) = inherited {
                query.set_profiling_listener(listener);
            }
            return TuningOutcome::Continuation;
        }

        let origin = self.create_origin(query);

        if self.profiling {
            self.profile(query, &origin);
        }

        if !self.query_tuning {
            return TuningOutcome::ProfileOnly;
        }

        if origin.key().is_empty() {
            // no application frame was captured, the call site is unknown
            debug!("No call site identity for {} query", query.entity_type());
            return TuningOutcome::NotLearned;
        }

        let Some(plan) = self.store.get(origin.key()) else {
            return TuningOutcome::NotLearned;
        };

        if plan.apply(query) {
            TuningOutcome::Applied
        } else {
            debug!("Tuned plan for {} does not fit {} query", origin.key(), query.entity_type());
            TuningOutcome::Refused
        }
    }

    fn create_origin<Q: TunableQuery>(&self, query: &mut Q) -> Arc<OriginNode> {
        let origin = Arc::new(OriginNode::root(self.call_stacks.capture()));
        query.set_origin(Arc::clone(&origin));
        origin
    }

    fn profile<Q: TunableQuery>(&self, query: &mut Q, origin: &OriginNode) {
        if self.profiling_listener.is_profile_request(origin, &*query) {
            query.set_profiling_listener(Arc::clone(&self.profiling_listener));
            self.stats.record_profiled();
        }
    }
}

impl fmt::Debug for QueryTuner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryTuner")
            .field("query_tuning", &self.query_tuning)
            .field("profiling", &self.profiling)
            .field("full_profiling", &self.full_profiling)
            .field("mode", &self.mode)
            .field("tuned_plans", &self.store.len())
            .finish()
    }
}
