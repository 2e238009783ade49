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

//! Decision counters.
//!
//! Every decision is counted locally, so [`QueryTuner::stats`](crate::QueryTuner::stats)
//! works without a metrics recorder, and reported through the `metrics`
//! facade for whichever recorder the host process installs.

use metrics::counter;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::engine::TuningOutcome;

#[derive(Debug, Default)]
pub struct TunerStats {
    decisions: AtomicU64,
    disabled: AtomicU64,
    not_eligible: AtomicU64,
    continuations: AtomicU64,
    not_learned: AtomicU64,
    refused: AtomicU64,
    applied: AtomicU64,
    profile_only: AtomicU64,
    profiled: AtomicU64,
}

/// Point-in-time copy of [`TunerStats`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TunerStatsSnapshot {
    pub decisions: u64,
    pub disabled: u64,
    pub not_eligible: u64,
    pub continuations: u64,
    pub not_learned: u64,
    pub refused: u64,
    pub applied: u64,
    pub profile_only: u64,
    pub profiled: u64,
}

impl TunerStatsSnapshot {
    /// Share of tuning lookups that found and applied a plan
    pub fn hit_rate(&self) -> f64 {
        let lookups = self.applied + self.refused + self.not_learned;
        if lookups == 0 { 0.0 } else { self.applied as f64 / lookups as f64 }
    }
}

impl TunerStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&self, outcome: TuningOutcome) {
        self.decisions.fetch_add(1, Ordering::Relaxed);
        let slot = match outcome {
            TuningOutcome::Disabled => &self.disabled,
            TuningOutcome::NotEligible => &self.not_eligible,
            TuningOutcome::Continuation => &self.continuations,
            TuningOutcome::NotLearned => &self.not_learned,
            TuningOutcome::Refused => &self.refused,
            TuningOutcome::Applied => &self.applied,
            TuningOutcome::ProfileOnly => &self.profile_only,
        };
        slot.fetch_add(1, Ordering::Relaxed);

        if outcome != TuningOutcome::Disabled {
            counter!("autotune_decisions_total", 1, "outcome" => outcome.as_str());
        }
    }

    pub(crate) fn record_profiled(&self) {
        self.profiled.fetch_add(1, Ordering::Relaxed);
        counter!("autotune_profiled_queries_total", 1);
    }

    pub fn snapshot(&self) -> TunerStatsSnapshot {
        TunerStatsSnapshot {
            decisions: self.decisions.load(Ordering::Relaxed),
            disabled: self.disabled.load(Ordering::Relaxed),
            not_eligible: self.not_eligible.load(Ordering::Relaxed),
            continuations: self.continuations.load(Ordering::Relaxed),
            not_learned: self.not_learned.load(Ordering::Relaxed),
            refused: self.refused.load(Ordering::Relaxed),
            applied: self.applied.load(Ordering::Relaxed),
            profile_only: self.profile_only.load(Ordering::Relaxed),
            profiled: self.profiled.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_outcomes() {
        let stats = TunerStats::new();
        stats.record(TuningOutcome::Applied);
        stats.record(TuningOutcome::Applied);
        stats.record(TuningOutcome::NotLearned);
        stats.record(TuningOutcome::Refused);
        stats.record(TuningOutcome::Disabled);
        stats.record_profiled();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.decisions, 5);
        assert_eq!(snapshot.applied, 2);
        assert_eq!(snapshot.disabled, 1);
        assert_eq!(snapshot.profiled, 1);
        assert_eq!(snapshot.hit_rate(), 0.5);
    }

    #[test]
    fn test_empty_hit_rate() {
        assert_eq!(TunerStatsSnapshot::default().hit_rate(), 0.0);
    }
}
