// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-call execution state.

use crate::config::MapOptions;
use crate::plan::Signature;
use crate::value::{ObjectRef, Value};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;

/// Mutable state of one top-level `map()` call.
///
/// Owned by a single call and never shared: the visited registry holds the
/// targets produced so far, keyed by source identity and target signature,
/// which is what makes cyclic graphs terminate.
#[derive(Debug, Default)]
pub struct ExecutionContext {
    /// (source id, target) -> (source handle, produced target). The source
    /// handle keeps the id from being reused while the call runs.
    visited: HashMap<(usize, Signature), (ObjectRef, ObjectRef)>,
    depth: HashMap<String, usize>,
    constructing: HashSet<(usize, Arc<str>)>,
    normalizing: HashSet<usize>,
    groups: Option<BTreeSet<String>>,
    skip_null_values: bool,
    deep_target_to_populate: bool,
    allow_extra_properties: bool,
    extra: BTreeMap<String, Value>,
}

impl ExecutionContext {
    pub fn new(options: &MapOptions) -> Self {
        Self {
            groups: options.groups.clone(),
            skip_null_values: options.skip_null_values,
            deep_target_to_populate: options.deep_target_to_populate,
            allow_extra_properties: options.allow_extra_properties,
            extra: options.extra.clone(),
            ..Self::default()
        }
    }

    /// Active groups; `None` when group filtering is off.
    pub fn groups(&self) -> Option<&BTreeSet<String>> {
        self.groups.as_ref()
    }

    pub fn skip_null_values(&self) -> bool {
        self.skip_null_values
    }

    pub fn deep_target_to_populate(&self) -> bool {
        self.deep_target_to_populate
    }

    pub fn allow_extra_properties(&self) -> bool {
        self.allow_extra_properties
    }

    /// User data passed through [`MapOptions::with_extra`].
    pub fn extra(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    /// Current recursion count of a member chain.
    pub fn depth(&self, key: &str) -> usize {
        self.depth.get(key).copied().unwrap_or(0)
    }

    /// Number of targets produced so far.
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    pub(crate) fn visited(&self, source: &ObjectRef, target: &Signature) -> Option<ObjectRef> {
        self.visited
            .get(&(source.id(), target.clone()))
            .map(|(_, produced)| produced.clone())
    }

    pub(crate) fn remember(
        &mut self,
        source: &ObjectRef,
        target: &Signature,
        produced: &ObjectRef,
    ) {
        self.visited.insert(
            (source.id(), target.clone()),
            (source.clone(), produced.clone()),
        );
    }

    pub(crate) fn descend(&mut self, key: &str) {
        *self.depth.entry(key.to_string()).or_insert(0) += 1;
    }

    pub(crate) fn ascend(&mut self, key: &str) {
        if let Some(depth) = self.depth.get_mut(key) {
            *depth = depth.saturating_sub(1);
        }
    }

    /// Returns `false` when the same source is already being passed to the
    /// constructor of the same class.
    pub(crate) fn enter_construction(&mut self, source: usize, class: &Arc<str>) -> bool {
        self.constructing.insert((source, class.clone()))
    }

    pub(crate) fn exit_construction(&mut self, source: usize, class: &Arc<str>) {
        self.constructing.remove(&(source, class.clone()));
    }

    pub(crate) fn enter_normalizing(&mut self, source: usize) -> bool {
        self.normalizing.insert(source)
    }

    pub(crate) fn exit_normalizing(&mut self, source: usize) {
        self.normalizing.remove(&source);
    }
}
