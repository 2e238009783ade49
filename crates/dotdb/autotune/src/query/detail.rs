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

//! Fetch detail descriptors.
//!
//! A [`FetchDetail`] describes which properties of the root entity and which
//! nested relations (with their properties) a query loads. An empty property
//! set means "all properties" for that level.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Properties selected at one level of the object graph
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchProperties {
    properties: BTreeSet<String>,
}

impl FetchProperties {
    pub fn new<I, S>(properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            properties: properties.into_iter().map(Into::into).collect(),
        }
    }

    /// All properties of the level are loaded
    pub fn all() -> Self {
        Self::default()
    }

    pub fn has_properties(&self) -> bool {
        !self.properties.is_empty()
    }

    pub fn contains(&self, property: &str) -> bool {
        self.properties.contains(property)
    }

    pub fn properties(&self) -> impl Iterator<Item = &str> {
        self.properties.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Replaces the selected properties with the tuned ones.
    pub fn set_tuned_properties(&mut self, tuned: &FetchProperties) {
        self.properties.clone_from(&tuned.properties);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchDetail {
    root: FetchProperties,
    paths: BTreeMap<String, FetchProperties>,
}

impl FetchDetail {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects properties of the root entity.
    pub fn select<I, S>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.root = FetchProperties::new(properties);
        self
    }

    /// Fetches a nested relation with the given properties.
    pub fn fetch<I, S>(mut self, path: impl Into<String>, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.paths.insert(path.into(), FetchProperties::new(properties));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty() && self.paths.is_empty()
    }

    pub fn root(&self) -> &FetchProperties {
        &self.root
    }

    pub fn path(&self, path: &str) -> Option<&FetchProperties> {
        self.paths.get(path)
    }

    pub fn paths(&self) -> impl Iterator<Item = (&str, &FetchProperties)> {
        self.paths.iter().map(|(path, props)| (path.as_str(), props))
    }

    pub fn put_fetch_path(&mut self, path: impl Into<String>, properties: FetchProperties) {
        self.paths.insert(path.into(), properties);
    }

    /// Narrows this detail with a tuned detail.
    ///
    /// Returns false without touching `self` when the tuned detail selects
    /// nothing at its root.
    pub fn tune_fetch_properties(&mut self, tuned: &FetchDetail) -> bool {
        if !tuned.root.has_properties() {
            return false;
        }

        self.root.set_tuned_properties(&tuned.root);
        for (path, tuned_props) in &tuned.paths {
            match self.paths.get_mut(path) {
                Some(existing) => existing.set_tuned_properties(tuned_props),
                None => {
                    self.paths.insert(path.clone(), tuned_props.clone());
                }
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_detail() {
        let detail = FetchDetail::new();
        assert!(detail.is_empty());
        assert!(!detail.root().has_properties());

        let detail = FetchDetail::new().fetch("customer", Vec::<String>::new());
        assert!(!detail.is_empty());
    }

    #[test]
    fn test_builder() {
        let detail = FetchDetail::new().select(["id", "status"]).fetch("customer", ["name"]);

        assert!(detail.root().contains("status"));
        assert_eq!(detail.root().len(), 2);
        assert!(detail.path("customer").unwrap().contains("name"));
        assert!(detail.path("lines").is_none());
    }

    #[test]
    fn test_tune_fetch_properties_overwrites_and_adds() {
        let mut detail = FetchDetail::new().select(["id", "status", "notes"]).fetch("customer", ["name", "email"]);
        let tuned = FetchDetail::new().select(["id"]).fetch("customer", ["name"]).fetch("lines", ["qty"]);

        assert!(detail.tune_fetch_properties(&tuned));
        assert_eq!(detail.root().properties().collect::<Vec<_>>(), vec!["id"]);
        assert_eq!(detail.path("customer").unwrap().properties().collect::<Vec<_>>(), vec!["name"]);
        assert!(detail.path("lines").unwrap().contains("qty"));
    }

    #[test]
    fn test_tune_fetch_properties_requires_root_selection() {
        let mut detail = FetchDetail::new().select(["id"]);
        let tuned = FetchDetail::new().fetch("customer", ["name"]);

        assert!(!detail.tune_fetch_properties(&tuned));
        assert!(detail.path("customer").is_none());
    }

    #[test]
    fn test_serde() {
        let detail = FetchDetail::new().select(["id"]).fetch("customer", ["name"]);
        let json = serde_json::to_string(&detail).unwrap();
        let restored: FetchDetail = serde_json::from_str(&json).unwrap();
        assert_eq!(detail, restored);
    }
}
