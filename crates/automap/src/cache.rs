// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Concurrent plan cache.
//!
//! Plans are pure functions of their key, so concurrent misses on the same
//! key may each build a plan; the last insert wins and no lock is held while
//! building. There is no eviction: entries live until [`PlanCache::clear`].

use crate::plan::{MappingPlan, PlanKey};
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Instant;

/// Cache hit/miss statistics.
#[derive(Debug, Default, Clone, Copy)]
pub struct LookupStats {
    pub hits: u64,
    pub misses: u64,
    pub last_build_us: u64,
}

/// Plans keyed by (source signature, target signature, fingerprint).
#[derive(Debug, Default)]
pub struct PlanCache {
    plans: DashMap<PlanKey, Arc<MappingPlan>>,
    stats: RwLock<LookupStats>,
}

impl PlanCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached plan, if any.
    pub fn get(&self, key: &PlanKey) -> Option<Arc<MappingPlan>> {
        self.plans.get(key).map(|entry| Arc::clone(entry.value()))
    }

    /// Return the cached plan for `key`, building and storing it on a miss.
    pub fn get_or_try_build<F, E>(&self, key: &PlanKey, build: F) -> Result<Arc<MappingPlan>, E>
    where
        F: FnOnce() -> Result<MappingPlan, E>,
    {
        if let Some(hit) = self.get(key) {
            self.stats.write().hits += 1;
            tracing::trace!(plan = %hit.name, "plan cache hit");
            return Ok(hit);
        }

        let start = Instant::now();
        let built = Arc::new(build()?);
        let elapsed = u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX);
        {
            let mut stats = self.stats.write();
            stats.misses += 1;
            stats.last_build_us = elapsed;
        }

        self.plans.insert(key.clone(), Arc::clone(&built));
        tracing::debug!(plan = %built.name, elapsed_us = elapsed, "plan cached");
        Ok(built)
    }

    pub fn contains(&self, key: &PlanKey) -> bool {
        self.plans.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.plans.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }

    #[must_use]
    pub fn stats(&self) -> LookupStats {
        *self.stats.read()
    }

    /// Drop every plan and reset statistics.
    pub fn clear(&self) {
        self.plans.clear();
        *self.stats.write() = LookupStats::default();
    }
}
