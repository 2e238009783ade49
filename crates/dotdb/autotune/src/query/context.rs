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

use std::fmt;
use std::sync::Arc;

use super::{FetchDetail, OriginNode, ParentNode, TunableQuery};
use crate::profiling::ProfilingListener;

/// Execution context of a single query
#[derive(Clone)]
pub struct QueryContext {
    entity_type: String,
    detail: FetchDetail,
    autotune: Option<bool>,
    load_bean_cache: bool,
    parent: Option<ParentNode>,
    origin: Option<Arc<OriginNode>>,
    profiling_listener: Option<Arc<dyn ProfilingListener>>,
    auto_tuned: bool,
}

impl QueryContext {
    pub fn new(entity_type: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            detail: FetchDetail::default(),
            autotune: None,
            load_bean_cache: false,
            parent: None,
            origin: None,
            profiling_listener: None,
            auto_tuned: false,
        }
    }

    pub fn with_detail(mut self, detail: FetchDetail) -> Self {
        self.detail = detail;
        self
    }

    pub fn with_autotune(mut self, autotune: Option<bool>) -> Self {
        self.autotune = autotune;
        self
    }

    pub fn with_load_bean_cache(mut self, load_bean_cache: bool) -> Self {
        self.load_bean_cache = load_bean_cache;
        self
    }

    pub fn with_parent(mut self, parent: ParentNode) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Builds the lazy-loading query for `path`, inheriting this query's
    /// origin and profiling listener.
    ///
    /// Returns `None` when this query has no origin yet.
    pub fn lazy_load_query(&self, path: &str, entity_type: impl Into<String>) -> Option<QueryContext> {
        let origin = self.origin.as_ref()?;
        let mut parent = ParentNode::new(Arc::new(origin.child(path)));
        if let Some(listener) = &self.profiling_listener {
            parent = parent.with_profiling_listener(Arc::clone(listener));
        }
        Some(QueryContext::new(entity_type).with_parent(parent))
    }

    pub fn profiling_listener(&self) -> Option<&Arc<dyn ProfilingListener>> {
        self.profiling_listener.as_ref()
    }

    pub fn is_profiling(&self) -> bool {
        self.profiling_listener.is_some()
    }

    pub fn is_auto_tuned(&self) -> bool {
        self.auto_tuned
    }
}

impl TunableQuery for QueryContext {
    fn autotune_override(&self) -> Option<bool> {
        self.autotune
    }

    fn is_cache_load(&self) -> bool {
        self.load_bean_cache
    }

    fn entity_type(&self) -> &str {
        &self.entity_type
    }

    fn detail(&self) -> &FetchDetail {
        &self.detail
    }

    fn detail_mut(&mut self) -> &mut FetchDetail {
        &mut self.detail
    }

    fn parent_node(&self) -> Option<&ParentNode> {
        self.parent.as_ref()
    }

    fn origin(&self) -> Option<&Arc<OriginNode>> {
        self.origin.as_ref()
    }

    fn set_origin(&mut self, origin: Arc<OriginNode>) {
        self.origin = Some(origin);
    }

    fn set_profiling_listener(&mut self, listener: Arc<dyn ProfilingListener>) {
        self.profiling_listener = Some(listener);
    }

    fn set_auto_tuned(&mut self, tuned: bool) {
        self.auto_tuned = tuned;
    }
}

impl fmt::Debug for QueryContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryContext")
            .field("entity_type", &self.entity_type)
            .field("detail", &self.detail)
            .field("autotune", &self.autotune)
            .field("load_bean_cache", &self.load_bean_cache)
            .field("parent", &self.parent)
            .field("origin", &self.origin)
            .field("profiling", &self.profiling_listener.is_some())
            .field("auto_tuned", &self.auto_tuned)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::CallStack;

    #[test]
    fn test_new_query_defaults() {
        let query = QueryContext::new("Order");
        assert_eq!(query.entity_type(), "Order");
        assert!(query.is_detail_empty());
        assert!(!query.is_cache_load());
        assert_eq!(query.autotune_override(), None);
        assert!(query.parent_node().is_none());
        assert!(query.origin().is_none());
        assert!(!query.is_profiling());
        assert!(!query.is_auto_tuned());
    }

    #[test]
    fn test_lazy_load_query_requires_origin() {
        let query = QueryContext::new("Order");
        assert!(query.lazy_load_query("customer", "Customer").is_none());

        let mut query = QueryContext::new("Order");
        query.set_origin(Arc::new(OriginNode::root(CallStack::new(["orders::list"]))));

        let lazy = query.lazy_load_query("customer", "Customer").unwrap();
        let parent = lazy.parent_node().unwrap();
        assert_eq!(parent.node().key(), "orders::list");
        assert_eq!(parent.node().path(), Some("customer"));
        assert!(parent.profiling_listener().is_none());
    }
}
