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

use serde::{Deserialize, Serialize};

use crate::query::{FetchDetail, TunableQuery};

/// Tuned fetch plan learned for one query point
///
/// Plans are immutable once built. The learning subsystem publishes a new
/// plan through [`TuningStore::load`](super::TuningStore::load) instead of
/// modifying an existing one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TunedPlan {
    key: String,
    entity_type: String,
    detail: FetchDetail,
}

impl TunedPlan {
    pub fn new(key: impl Into<String>, entity_type: impl Into<String>, detail: FetchDetail) -> Self {
        Self {
            key: key.into(),
            entity_type: entity_type.into(),
            detail,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    pub fn detail(&self) -> &FetchDetail {
        &self.detail
    }

    /// Applies the tuned detail to `query`.
    ///
    /// Returns false, leaving the query untouched, when the query loads a
    /// different entity than the plan was learned for or when the plan selects
    /// no root properties.
    pub fn apply<Q: TunableQuery + ?Sized>(&self, query: &mut Q) -> bool {
        if query.entity_type() != self.entity_type || !self.detail.root().has_properties() {
            return false;
        }

        let tuned = if query.is_detail_empty() {
            query.set_detail(self.detail.clone());
            true
        } else {
            query.detail_mut().tune_fetch_properties(&self.detail)
        };

        if tuned {
            query.set_auto_tuned(true);
        }
        tuned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::QueryContext;

    fn order_plan() -> TunedPlan {
        TunedPlan::new("orders::list", "Order", FetchDetail::new().select(["id", "status"]).fetch("customer", ["name"]))
    }

    #[test]
    fn test_apply_to_empty_query() {
        let plan = order_plan();
        let mut query = QueryContext::new("Order");

        assert!(plan.apply(&mut query));
        assert_eq!(query.detail(), plan.detail());
        assert!(query.is_auto_tuned());
    }

    #[test]
    fn test_apply_narrows_explicit_detail() {
        let plan = order_plan();
        let mut query = QueryContext::new("Order").with_detail(FetchDetail::new().select(["id", "status", "notes"]).fetch("customer", ["name", "email"]));

        assert!(plan.apply(&mut query));
        assert!(!query.detail().root().contains("notes"));
        assert!(!query.detail().path("customer").unwrap().contains("email"));
        assert!(query.is_auto_tuned());
    }

    #[test]
    fn test_refuses_entity_mismatch() {
        let plan = order_plan();
        let mut query = QueryContext::new("Invoice");

        assert!(!plan.apply(&mut query));
        assert!(query.is_detail_empty());
        assert!(!query.is_auto_tuned());
    }

    #[test]
    fn test_refuses_plan_without_root_properties() {
        let plan = TunedPlan::new("orders::list", "Order", FetchDetail::new().fetch("customer", ["name"]));
        let original = FetchDetail::new().select(["id"]);
        let mut query = QueryContext::new("Order").with_detail(original.clone());

        assert!(!plan.apply(&mut query));
        assert_eq!(query.detail(), &original);
        assert!(!query.is_auto_tuned());
    }

    #[test]
    fn test_refuses_plan_without_root_properties_on_empty_query() {
        let plan = TunedPlan::new("orders::list", "Order", FetchDetail::new().fetch("customer", ["name"]));
        let mut query = QueryContext::new("Order");

        assert!(!plan.apply(&mut query));
        assert!(!query.is_auto_tuned());
    }

    #[test]
    fn test_plan_from_json() {
        let json = r#"{
            "key": "orders::list",
            "entity_type": "Order",
            "detail": {
                "root": { "properties": ["id"] },
                "paths": { "customer": { "properties": ["name"] } }
            }
        }"#;

        let plan: TunedPlan = serde_json::from_str(json).unwrap();
        assert_eq!(plan.key(), "orders::list");
        assert!(plan.detail().path("customer").unwrap().contains("name"));
    }
}
