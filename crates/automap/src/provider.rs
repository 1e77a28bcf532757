// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! External value providers.
//!
//! A class registered with a provider asks it for an existing instance
//! before constructing a fresh one, e.g. to load an entity by identifier.
//! A returned object is populated in place like any existing target.

use crate::context::ExecutionContext;
use crate::error::BoxError;
use crate::value::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Supplies existing target instances.
pub trait ValueProvider: Send + Sync {
    /// Return `Some(object)` to populate an existing instance, `None` (or
    /// `Some(Value::Null)`) to construct a fresh one.
    fn provide(
        &self,
        target_class: &str,
        source: &Value,
        ctx: &ExecutionContext,
    ) -> Result<Option<Value>, BoxError>;
}

impl<F> ValueProvider for F
where
    F: Fn(&str, &Value, &ExecutionContext) -> Result<Option<Value>, BoxError> + Send + Sync,
{
    fn provide(
        &self,
        target_class: &str,
        source: &Value,
        ctx: &ExecutionContext,
    ) -> Result<Option<Value>, BoxError> {
        self(target_class, source, ctx)
    }
}

/// Provider resolved by name at plan compilation.
#[derive(Clone)]
pub struct NamedProvider {
    pub name: String,
    pub inner: Arc<dyn ValueProvider>,
}

impl fmt::Debug for NamedProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NamedProvider({})", self.name)
    }
}

/// Name-keyed provider registry.
#[derive(Default, Clone)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn ValueProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, provider: impl ValueProvider + 'static) {
        self.providers.insert(name.into(), Arc::new(provider));
    }

    pub fn get(&self, name: &str) -> Option<NamedProvider> {
        self.providers.get(name).map(|inner| NamedProvider {
            name: name.to_string(),
            inner: inner.clone(),
        })
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.providers.keys()).finish()
    }
}
