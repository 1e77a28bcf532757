// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! User supplied transformers.

use crate::error::BoxError;
use crate::types::MemberType;
use crate::value::{ObjectRef, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Per-pair transformation supplied by the application.
///
/// `value` is the raw source value, `source` the whole source container and
/// `target` the instance being populated (`None` while constructor
/// arguments are being built, or when the target is a map).
pub trait CustomTransformer: Send + Sync {
    fn transform(
        &self,
        value: Value,
        source: &Value,
        target: Option<&ObjectRef>,
    ) -> Result<Value, BoxError>;

    /// Whether this transformer should be picked automatically for a type
    /// pair that has no explicit directive.
    fn supports(&self, _source: &MemberType, _target: &MemberType) -> bool {
        false
    }
}

impl<F> CustomTransformer for F
where
    F: Fn(Value, &Value, Option<&ObjectRef>) -> Result<Value, BoxError> + Send + Sync,
{
    fn transform(
        &self,
        value: Value,
        source: &Value,
        target: Option<&ObjectRef>,
    ) -> Result<Value, BoxError> {
        self(value, source, target)
    }
}

/// A registered transformer together with its name.
#[derive(Clone)]
pub struct NamedTransformer {
    pub name: String,
    pub inner: Arc<dyn CustomTransformer>,
}

impl fmt::Debug for NamedTransformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NamedTransformer({})", self.name)
    }
}

/// Name-keyed transformer registry.
///
/// Registration order is kept so that automatic selection through
/// [`CustomTransformer::supports`] is deterministic.
#[derive(Default, Clone)]
pub struct TransformerRegistry {
    named: HashMap<String, Arc<dyn CustomTransformer>>,
    order: Vec<String>,
}

impl TransformerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a transformer.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        transformer: impl CustomTransformer + 'static,
    ) {
        let name = name.into();
        if !self.named.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.named.insert(name, Arc::new(transformer));
    }

    pub fn get(&self, name: &str) -> Option<NamedTransformer> {
        self.named.get(name).map(|inner| NamedTransformer {
            name: name.to_string(),
            inner: inner.clone(),
        })
    }

    /// First registered transformer accepting the type pair.
    pub fn find_supporting(
        &self,
        source: &MemberType,
        target: &MemberType,
    ) -> Option<NamedTransformer> {
        self.order
            .iter()
            .find(|name| {
                self.named
                    .get(*name)
                    .is_some_and(|t| t.supports(source, target))
            })
            .and_then(|name| self.get(name))
    }

    pub fn len(&self) -> usize {
        self.named.len()
    }

    pub fn is_empty(&self) -> bool {
        self.named.is_empty()
    }
}

impl fmt::Debug for TransformerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.order).finish()
    }
}
