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

//! Query origins.
//!
//! A query point identifies the code location that issued a query. An
//! [`OriginNode`] ties one query execution to its query point and, for
//! nested or lazy-loading queries, to the relation path being resolved.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::profiling::ProfilingListener;

const FRAME_SEPARATOR: &str = ";";

/// Fingerprint of the call stack that issued a query
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallStack {
    frames: Vec<String>,
}

impl CallStack {
    pub fn new<I, S>(frames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            frames: frames.into_iter().map(Into::into).collect(),
        }
    }

    pub fn frames(&self) -> &[String] {
        &self.frames
    }

    /// The innermost frame, used for log output
    pub fn summary(&self) -> &str {
        self.frames.first().map(String::as_str).unwrap_or("<unknown>")
    }

    /// Stable key for the call site
    pub fn origin_key(&self) -> String {
        self.frames.join(FRAME_SEPARATOR)
    }
}

impl fmt::Display for CallStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for frame in &self.frames {
            writeln!(f, "  at {}", frame)?;
        }
        Ok(())
    }
}

/// Call-site identity of a query
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryPoint {
    key: String,
    call_stack: CallStack,
}

impl QueryPoint {
    pub fn new(call_stack: CallStack) -> Self {
        Self {
            key: call_stack.origin_key(),
            call_stack,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn call_stack(&self) -> &CallStack {
        &self.call_stack
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginNode {
    origin: Arc<QueryPoint>,
    path: Option<String>,
}

impl OriginNode {
    /// Origin of a top-level query.
    pub fn root(call_stack: CallStack) -> Self {
        Self {
            origin: Arc::new(QueryPoint::new(call_stack)),
            path: None,
        }
    }

    /// Node for a relation loaded underneath this origin.
    pub fn child(&self, path: impl Into<String>) -> Self {
        let path = path.into();
        let path = match &self.path {
            Some(parent) => format!("{}.{}", parent, path),
            None => path,
        };
        Self {
            origin: Arc::clone(&self.origin),
            path: Some(path),
        }
    }

    pub fn origin(&self) -> &QueryPoint {
        &self.origin
    }

    pub fn key(&self) -> &str {
        self.origin.key()
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }
}

/// Parent reference carried by nested and lazy-loading queries
#[derive(Clone)]
pub struct ParentNode {
    node: Arc<OriginNode>,
    profiling_listener: Option<Arc<dyn ProfilingListener>>,
}

impl ParentNode {
    pub fn new(node: Arc<OriginNode>) -> Self {
        Self {
            node,
            profiling_listener: None,
        }
    }

    pub fn with_profiling_listener(mut self, listener: Arc<dyn ProfilingListener>) -> Self {
        self.profiling_listener = Some(listener);
        self
    }

    pub fn node(&self) -> &OriginNode {
        &self.node
    }

    pub fn profiling_listener(&self) -> Option<&Arc<dyn ProfilingListener>> {
        self.profiling_listener.as_ref()
    }
}

impl fmt::Debug for ParentNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParentNode")
            .field("node", &self.node)
            .field("profiling", &self.profiling_listener.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_key() {
        let stack = CallStack::new(["pkg.Foo.bar"]);
        assert_eq!(stack.origin_key(), "pkg.Foo.bar");

        let stack = CallStack::new(["orders::list", "api::handler"]);
        assert_eq!(stack.origin_key(), "orders::list;api::handler");
        assert_eq!(stack.summary(), "orders::list");
    }

    #[test]
    fn test_empty_stack_summary() {
        let stack = CallStack::new(Vec::<String>::new());
        assert_eq!(stack.summary(), "<unknown>");
        assert_eq!(stack.origin_key(), "");
    }

    #[test]
    fn test_child_nodes_share_origin() {
        let root = OriginNode::root(CallStack::new(["orders::list"]));
        let customer = root.child("customer");
        let address = customer.child("address");

        assert_eq!(root.path(), None);
        assert_eq!(customer.path(), Some("customer"));
        assert_eq!(address.path(), Some("customer.address"));
        assert_eq!(address.key(), "orders::list");
        assert!(Arc::ptr_eq(&root.origin, &address.origin));
    }
}
