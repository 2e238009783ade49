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

use criterion::{Criterion, criterion_group, criterion_main};
use dotdb_autotune::query::{CallStack, FetchDetail, OriginNode, QueryContext};
use dotdb_autotune::{AutoTuneConfig, AutoTuneMode, CallStackSource, ProfilingListener, QueryTuner, TunableQuery, TunedPlan};
use std::hint::black_box;
use std::sync::Arc;

struct FixedSite;

impl CallStackSource for FixedSite {
    fn capture(&self) -> CallStack {
        CallStack::new(["orders::repository::find_open"])
    }
}

struct NoProfiling;

impl ProfilingListener for NoProfiling {
    fn is_profile_request(&self, _origin: &OriginNode, _query: &dyn TunableQuery) -> bool {
        false
    }
}

fn tuner(config: AutoTuneConfig) -> QueryTuner {
    let tuner = QueryTuner::new(&config, Arc::new(FixedSite), Arc::new(NoProfiling)).unwrap();
    tuner.load(
        "orders::repository::find_open",
        TunedPlan::new("orders::repository::find_open", "Order", FetchDetail::new().select(["id", "status"]).fetch("customer", ["name"])),
    );
    tuner
}

fn bench_decisions(c: &mut Criterion) {
    let disabled = tuner(AutoTuneConfig::disabled());
    c.bench_function("decide_disabled", |b| {
        b.iter(|| {
            let mut query = QueryContext::new("Order");
            black_box(disabled.decide(&mut query))
        })
    });

    let not_eligible = tuner(AutoTuneConfig::default().with_mode(AutoTuneMode::DefaultOff).with_profiling(false));
    c.bench_function("decide_not_eligible", |b| {
        b.iter(|| {
            let mut query = QueryContext::new("Order");
            black_box(not_eligible.decide(&mut query))
        })
    });

    let applied = tuner(AutoTuneConfig::default().with_mode(AutoTuneMode::DefaultOn));
    c.bench_function("decide_apply_plan", |b| {
        b.iter(|| {
            let mut query = QueryContext::new("Order");
            black_box(applied.decide(&mut query))
        })
    });
}

criterion_group!(benches, bench_decisions);
criterion_main!(benches);
