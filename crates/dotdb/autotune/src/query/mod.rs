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

//! # Query Model
//!
//! The autotune service never executes queries. It works against the narrow
//! set of capabilities described by [`TunableQuery`], which a query executor
//! implements for its own query type.
//!
//! ## Modules
//!
//! - `detail`: fetch detail descriptors (selected properties and relations)
//! - `origin`: call stacks, query points and origin nodes
//! - `context`: [`QueryContext`], a ready-made [`TunableQuery`] implementation

pub mod context;
pub mod detail;
pub mod origin;

pub use context::QueryContext;
pub use detail::{FetchDetail, FetchProperties};
pub use origin::{CallStack, OriginNode, ParentNode, QueryPoint};

use std::sync::Arc;

use crate::profiling::ProfilingListener;

/// Capabilities a query exposes to the tuner
pub trait TunableQuery {
    /// Explicit per-query override. `None` defers to the configured mode.
    fn autotune_override(&self) -> Option<bool>;

    /// True when the query populates the bean cache and needs full objects.
    fn is_cache_load(&self) -> bool;

    /// Name of the root entity the query loads
    fn entity_type(&self) -> &str;

    fn detail(&self) -> &FetchDetail;

    fn detail_mut(&mut self) -> &mut FetchDetail;

    fn set_detail(&mut self, detail: FetchDetail) {
        *self.detail_mut() = detail;
    }

    /// True when the caller selected no explicit properties or relations.
    fn is_detail_empty(&self) -> bool {
        self.detail().is_empty()
    }

    /// Parent reference of a nested or lazy-loading query
    fn parent_node(&self) -> Option<&ParentNode>;

    fn origin(&self) -> Option<&Arc<OriginNode>>;

    fn set_origin(&mut self, origin: Arc<OriginNode>);

    fn set_profiling_listener(&mut self, listener: Arc<dyn ProfilingListener>);

    fn set_auto_tuned(&mut self, tuned: bool);
}
