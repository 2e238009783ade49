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

//! Profiling collaborators.
//!
//! The tuner depends on two external collaborators: a [`CallStackSource`]
//! that fingerprints the code location issuing a query, and a
//! [`ProfilingListener`] that decides whether a query execution is sampled.
//! Reference implementations of both live in this module.

pub mod call_stack;
pub mod sampler;

pub use call_stack::BacktraceCallStack;
pub use sampler::SamplingProfiler;

use crate::query::{CallStack, OriginNode, TunableQuery};

/// Captures the call stack of the code issuing a query
pub trait CallStackSource: Send + Sync {
    fn capture(&self) -> CallStack;
}

/// Sampling hook attached to profiled queries
pub trait ProfilingListener: Send + Sync {
    /// Returns true when this execution of `origin` should be profiled.
    fn is_profile_request(&self, origin: &OriginNode, query: &dyn TunableQuery) -> bool;
}
