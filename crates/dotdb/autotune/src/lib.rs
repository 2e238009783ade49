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

//! # DotDB Autotune
//!
//! Adaptive query tuning for DotDB query executors. Before a query runs the
//! executor hands it to a [`QueryTuner`], which decides whether to narrow the
//! query with a tuned fetch plan learned for its call site, whether to sample
//! the execution so a plan can be learned later, or both.
//!
//! ## Modules
//!
//! - `config`: tuning mode, switches and sampling rates
//! - `engine`: the decision engine
//! - `query`: the query capabilities the engine relies on
//! - `tuning`: tuned plans and the concurrent store holding them
//! - `profiling`: call stack capture and profiling sampler seams
//! - `stats`: decision counters
//!
//! ## Usage
//!
//! ```rust
//! use dotdb_autotune::{AutoTuneConfig, AutoTuneMode, QueryTuner, TunableQuery};
//! use dotdb_autotune::query::{FetchDetail, QueryContext};
//! use dotdb_autotune::tuning::TunedPlan;
//!
//! let config = AutoTuneConfig::default().with_mode(AutoTuneMode::DefaultOn);
//! let tuner = QueryTuner::from_config(&config).unwrap();
//!
//! // Plans are published by the learning subsystem
//! let plan = TunedPlan::new("orders::list", "Order", FetchDetail::new().select(["id", "status"]));
//! tuner.load("orders::list", plan);
//!
//! let mut query = QueryContext::new("Order");
//! let tuned = tuner.decide(&mut query);
//! assert!(query.origin().is_some());
//! # let _ = tuned;
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod profiling;
pub mod query;
pub mod stats;
pub mod tuning;

pub use config::{AutoTuneConfig, AutoTuneMode, ProfilingConfig, StoreConfig};
pub use engine::{QueryTuner, TuningOutcome};
pub use error::{AutoTuneError, AutoTuneResult};
pub use profiling::{CallStackSource, ProfilingListener};
pub use query::TunableQuery;
pub use stats::TunerStatsSnapshot;
pub use tuning::{TunedPlan, TuningStore};
