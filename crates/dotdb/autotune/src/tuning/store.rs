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

//! Tuning stores.
//!
//! A tuning store maps a query point key to the [`TunedPlan`] learned for it.
//! The learning subsystem publishes plans with `load` while query threads read
//! them with `get`. Plans are shared as `Arc<TunedPlan>` so a reader observes
//! either the previous or the new plan for a key, never a partial one.

use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;

use super::TunedPlan;
use crate::config::StoreConfig;

pub trait TuningStore: Send + Sync {
    /// Inserts or replaces the plan for `key`, returning the replaced plan.
    fn load(&self, key: String, plan: TunedPlan) -> Option<Arc<TunedPlan>>;

    /// Returns the current plan for `key`.
    fn get(&self, key: &str) -> Option<Arc<TunedPlan>>;

    fn remove(&self, key: &str) -> Option<Arc<TunedPlan>>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn clear(&self);

    fn keys(&self) -> Vec<String>;

    /// Current plans, for an external layer to persist
    fn snapshot(&self) -> Vec<Arc<TunedPlan>>;

    /// Loads every plan under its own key.
    fn load_all(&self, plans: Vec<TunedPlan>) {
        for plan in plans {
            let key = plan.key().to_string();
            self.load(key, plan);
        }
    }
}

/// Unbounded store. Plans stay until they are replaced or removed.
#[derive(Debug, Default)]
pub struct ConcurrentTuningStore {
    plans: DashMap<String, Arc<TunedPlan>>,
}

impl ConcurrentTuningStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TuningStore for ConcurrentTuningStore {
    fn load(&self, key: String, plan: TunedPlan) -> Option<Arc<TunedPlan>> {
        let replaced = self.plans.insert(key, Arc::new(plan));
        if let Some(previous) = &replaced {
            debug!("Replaced tuned plan for {}", previous.key());
        }
        replaced
    }

    fn get(&self, key: &str) -> Option<Arc<TunedPlan>> {
        self.plans.get(key).map(|entry| Arc::clone(entry.value()))
    }

    fn remove(&self, key: &str) -> Option<Arc<TunedPlan>> {
        self.plans.remove(key).map(|(_, plan)| plan)
    }

    fn len(&self) -> usize {
        self.plans.len()
    }

    fn clear(&self) {
        self.plans.clear();
    }

    fn keys(&self) -> Vec<String> {
        self.plans.iter().map(|entry| entry.key().clone()).collect()
    }

    fn snapshot(&self) -> Vec<Arc<TunedPlan>> {
        self.plans.iter().map(|entry| Arc::clone(entry.value())).collect()
    }
}

#[derive(Debug)]
struct BoundedEntry {
    plan: Arc<TunedPlan>,
    generation: u64,
    loaded_at: Instant,
}

impl BoundedEntry {
    fn is_expired(&self, ttl: Option<Duration>) -> bool {
        ttl.is_some_and(|ttl| self.loaded_at.elapsed() > ttl)
    }
}

/// Store with a capacity and an optional time-to-live
///
/// When the capacity is exceeded the least recently loaded plans are evicted.
/// Reads only touch the map; the load-order queue is locked by writers only.
#[derive(Debug)]
pub struct BoundedTuningStore {
    plans: DashMap<String, BoundedEntry>,
    load_order: Mutex<VecDeque<(String, u64)>>,
    next_generation: AtomicU64,
    capacity: Option<usize>,
    ttl: Option<Duration>,
    evictions: AtomicU64,
}

impl BoundedTuningStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            plans: DashMap::new(),
            load_order: Mutex::new(VecDeque::new()),
            next_generation: AtomicU64::new(0),
            capacity: Some(capacity),
            ttl: None,
            evictions: AtomicU64::new(0),
        }
    }

    /// Store that only expires plans by age
    pub fn with_ttl_only(ttl: Duration) -> Self {
        Self {
            capacity: None,
            ttl: Some(ttl),
            ..Self::new(0)
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Number of plans evicted for capacity or age
    pub fn eviction_count(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }

    fn evict_over_capacity(&self, capacity: usize, load_order: &mut VecDeque<(String, u64)>) {
        while self.plans.len() > capacity {
            let Some((key, generation)) = load_order.pop_front() else {
                break;
            };
            if self.plans.remove_if(&key, |_, entry| entry.generation == generation).is_some() {
                self.evictions.fetch_add(1, Ordering::Relaxed);
                debug!("Evicted tuned plan for {}", key);
            }
        }

        // Reloads leave stale queue entries behind
        if load_order.len() > capacity.saturating_mul(2) {
            load_order.retain(|(key, generation)| self.plans.get(key).is_some_and(|entry| entry.generation == *generation));
        }
    }
}

impl TuningStore for BoundedTuningStore {
    fn load(&self, key: String, plan: TunedPlan) -> Option<Arc<TunedPlan>> {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let entry = BoundedEntry {
            plan: Arc::new(plan),
            generation,
            loaded_at: Instant::now(),
        };

        let Some(capacity) = self.capacity else {
            return self.plans.insert(key, entry).map(|previous| previous.plan);
        };

        let mut load_order = self.load_order.lock();
        let replaced = self.plans.insert(key.clone(), entry).map(|previous| previous.plan);
        load_order.push_back((key, generation));
        self.evict_over_capacity(capacity, &mut load_order);
        replaced
    }

    fn get(&self, key: &str) -> Option<Arc<TunedPlan>> {
        let (plan, generation) = {
            let entry = self.plans.get(key)?;
            if !entry.is_expired(self.ttl) {
                return Some(Arc::clone(&entry.plan));
            }
            (Arc::clone(&entry.plan), entry.generation)
        };

        if self.plans.remove_if(key, |_, entry| entry.generation == generation).is_some() {
            self.evictions.fetch_add(1, Ordering::Relaxed);
            debug!("Expired tuned plan for {}", plan.key());
        }
        None
    }

    fn remove(&self, key: &str) -> Option<Arc<TunedPlan>> {
        self.plans.remove(key).map(|(_, entry)| entry.plan)
    }

    fn len(&self) -> usize {
        self.plans.len()
    }

    fn clear(&self) {
        let mut load_order = self.load_order.lock();
        self.plans.clear();
        load_order.clear();
    }

    fn keys(&self) -> Vec<String> {
        self.plans.iter().filter(|entry| !entry.is_expired(self.ttl)).map(|entry| entry.key().clone()).collect()
    }

    fn snapshot(&self) -> Vec<Arc<TunedPlan>> {
        self.plans.iter().filter(|entry| !entry.is_expired(self.ttl)).map(|entry| Arc::clone(&entry.plan)).collect()
    }
}

/// Builds the store described by `config`.
pub fn from_config(config: &StoreConfig) -> Arc<dyn TuningStore> {
    match (config.capacity, config.ttl()) {
        (None, None) => Arc::new(ConcurrentTuningStore::new()),
        (Some(capacity), None) => Arc::new(BoundedTuningStore::new(capacity)),
        (Some(capacity), Some(ttl)) => Arc::new(BoundedTuningStore::new(capacity).with_ttl(ttl)),
        (None, Some(ttl)) => Arc::new(BoundedTuningStore::with_ttl_only(ttl)),
    }
}
