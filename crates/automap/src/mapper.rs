// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Mapper entry point.
//!
//! [`AutoMapper`] owns the metadata, the member cache and the plan cache.
//! It is `Send + Sync`: a single instance can serve concurrent `map()`
//! calls, each with its own [`ExecutionContext`].

use crate::cache::{LookupStats, PlanCache};
use crate::config::{ConfigError, MapOptions, MapperConfig};
use crate::context::ExecutionContext;
use crate::error::{MapperError, Result};
use crate::executor::MappingExecutor;
use crate::metadata::MetadataSource;
use crate::plan::{ConfigFingerprint, MappingPlan, PlanCompiler, PlanKey, Signature};
use crate::provider::{ProviderRegistry, ValueProvider};
use crate::resolver::TypeResolver;
use crate::transformer::{CustomTransformer, TransformerRegistry};
use crate::value::{ObjectRef, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Target of a mapping call.
#[derive(Debug, Clone)]
pub enum Target {
    /// Construct a new instance of the class.
    Class(Arc<str>),
    /// Produce a map.
    Array,
    /// Populate this instance in place.
    Existing(ObjectRef),
}

impl From<&str> for Target {
    fn from(name: &str) -> Self {
        match Signature::parse(name) {
            Signature::Array => Self::Array,
            Signature::Class(class) => Self::Class(class),
        }
    }
}

impl From<String> for Target {
    fn from(name: String) -> Self {
        Self::from(name.as_str())
    }
}

impl From<ObjectRef> for Target {
    fn from(object: ObjectRef) -> Self {
        Self::Existing(object)
    }
}

impl From<&ObjectRef> for Target {
    fn from(object: &ObjectRef) -> Self {
        Self::Existing(object.clone())
    }
}

/// Automatic object mapper.
///
/// # Example
///
/// ```rust
/// use automap::metadata::{ClassBuilder, ClassRegistry};
/// use automap::{AutoMapper, MapOptions, TypeDescriptor, Value};
/// use std::sync::Arc;
///
/// let registry = ClassRegistry::new().with_class(
///     ClassBuilder::new("User")
///         .field("id", TypeDescriptor::int())
///         .field("name", TypeDescriptor::string())
///         .build(),
/// );
/// let mapper = AutoMapper::new(Arc::new(registry));
///
/// let source = Value::map([("id", Value::from("7")), ("name", Value::from("Ada"))]);
/// let user = mapper.map(&source, "User", &MapOptions::default())?;
/// assert_eq!(user.get_field("id"), Some(Value::Int(7)));
/// # Ok::<(), automap::MapperError>(())
/// ```
pub struct AutoMapper {
    metadata: Arc<dyn MetadataSource>,
    config: MapperConfig,
    resolver: TypeResolver,
    plans: PlanCache,
    transformers: TransformerRegistry,
    providers: ProviderRegistry,
}

impl AutoMapper {
    /// Mapper with the default configuration and no transformers or
    /// providers.
    pub fn new(metadata: Arc<dyn MetadataSource>) -> Self {
        Self::from_parts(
            metadata,
            MapperConfig::default(),
            TransformerRegistry::new(),
            ProviderRegistry::new(),
        )
    }

    pub fn builder(metadata: Arc<dyn MetadataSource>) -> AutoMapperBuilder {
        AutoMapperBuilder::new(metadata)
    }

    fn from_parts(
        metadata: Arc<dyn MetadataSource>,
        config: MapperConfig,
        transformers: TransformerRegistry,
        providers: ProviderRegistry,
    ) -> Self {
        Self {
            resolver: TypeResolver::new(Arc::clone(&metadata)),
            metadata,
            config,
            plans: PlanCache::new(),
            transformers,
            providers,
        }
    }

    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    pub fn metadata(&self) -> &dyn MetadataSource {
        self.metadata.as_ref()
    }

    pub(crate) fn resolver(&self) -> &TypeResolver {
        &self.resolver
    }

    pub(crate) fn plan_for_key(&self, key: &PlanKey) -> Result<Arc<MappingPlan>> {
        self.plans.get_or_try_build(key, || {
            PlanCompiler::new(&self.resolver, &self.transformers, &self.providers).compile(key)
        })
    }

    /// Map `source` into `target`.
    ///
    /// `target` is a class name, `"array"` for a map, or an existing
    /// instance to populate in place.
    pub fn map(
        &self,
        source: &Value,
        target: impl Into<Target>,
        options: &MapOptions,
    ) -> Result<Value> {
        let mut ctx = ExecutionContext::new(options);
        self.map_with(source, target.into(), &mut ctx)
    }

    /// Populate `target` from `source` and return the same instance.
    pub fn map_into(
        &self,
        source: &Value,
        target: &ObjectRef,
        options: &MapOptions,
    ) -> Result<ObjectRef> {
        self.map(source, target, options)?;
        Ok(target.clone())
    }

    /// Map every element of a list (or every value of a map, keys kept)
    /// into `target`. All elements share one execution context, so objects
    /// referenced from several elements are mapped once.
    pub fn map_collection(
        &self,
        source: &Value,
        target: impl Into<Target>,
        options: &MapOptions,
    ) -> Result<Value> {
        let target = target.into();
        if let Target::Existing(object) = &target {
            return Err(MapperError::InvalidTarget(format!(
                "cannot map a collection into the existing {} instance",
                object.class()
            )));
        }

        let mut ctx = ExecutionContext::new(options);
        match source {
            Value::List(items) => items
                .iter()
                .map(|item| self.map_with(item, target.clone(), &mut ctx))
                .collect::<Result<Vec<_>>>()
                .map(Value::List),
            Value::Map(entries) => {
                let mut out = BTreeMap::new();
                for (key, item) in entries {
                    out.insert(key.clone(), self.map_with(item, target.clone(), &mut ctx)?);
                }
                Ok(Value::Map(out))
            }
            other => Err(MapperError::incompatible("list or map", other)),
        }
    }

    fn map_with(
        &self,
        source: &Value,
        target: Target,
        ctx: &mut ExecutionContext,
    ) -> Result<Value> {
        let executor = MappingExecutor::new(self, ctx);
        match target {
            Target::Class(class) => executor.map_value(source, &Signature::Class(class), None, ctx),
            Target::Array => executor.map_value(source, &Signature::Array, None, ctx),
            Target::Existing(object) => {
                if source.is_null() {
                    return Ok(Value::Object(object));
                }
                let signature = Signature::Class(object.class());
                executor.map_value(source, &signature, Some(object), ctx)
            }
        }
    }

    /// Compiled plan for a (source, target) signature pair under the given
    /// options' groups. Compiles and caches the plan on first use.
    pub fn plan(
        &self,
        source: &str,
        target: &str,
        options: &MapOptions,
    ) -> Result<Arc<MappingPlan>> {
        let key = PlanKey::new(
            Signature::parse(source),
            Signature::parse(target),
            ConfigFingerprint::new(&self.config, options.groups.as_ref()),
        );
        self.plan_for_key(&key)
    }

    /// Drop every cached plan and resolved member list.
    ///
    /// Needed after metadata behind a mutable [`MetadataSource`] changes.
    pub fn reset(&self) {
        self.plans.clear();
        self.resolver.clear();
        tracing::debug!("mapper caches cleared");
    }

    pub fn plan_count(&self) -> usize {
        self.plans.len()
    }

    pub fn cache_stats(&self) -> LookupStats {
        self.plans.stats()
    }
}

impl std::fmt::Debug for AutoMapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutoMapper")
            .field("config", &self.config)
            .field("plans", &self.plans.len())
            .field("transformers", &self.transformers)
            .field("providers", &self.providers)
            .finish()
    }
}

/// Builder for [`AutoMapper`].
pub struct AutoMapperBuilder {
    metadata: Arc<dyn MetadataSource>,
    config: MapperConfig,
    transformers: TransformerRegistry,
    providers: ProviderRegistry,
}

impl AutoMapperBuilder {
    fn new(metadata: Arc<dyn MetadataSource>) -> Self {
        Self {
            metadata,
            config: MapperConfig::default(),
            transformers: TransformerRegistry::new(),
            providers: ProviderRegistry::new(),
        }
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: MapperConfig) -> Self {
        self.config = config;
        self
    }

    pub fn map_private_properties(mut self, enabled: bool) -> Self {
        self.config.map_private_properties = enabled;
        self
    }

    pub fn use_constructor(mut self, enabled: bool) -> Self {
        self.config.use_constructor = enabled;
        self
    }

    pub fn allow_readonly_target_to_populate(mut self, enabled: bool) -> Self {
        self.config.allow_readonly_target_to_populate = enabled;
        self
    }

    pub fn class_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.class_prefix = prefix.into();
        self
    }

    /// Register a transformer referenced by name from mapping directives.
    pub fn transformer(
        mut self,
        name: impl Into<String>,
        transformer: impl CustomTransformer + 'static,
    ) -> Self {
        self.transformers.register(name, transformer);
        self
    }

    /// Register a value provider referenced by name from class metadata.
    pub fn provider(
        mut self,
        name: impl Into<String>,
        provider: impl ValueProvider + 'static,
    ) -> Self {
        self.providers.register(name, provider);
        self
    }

    /// Validate the configuration and build the mapper.
    pub fn build(self) -> std::result::Result<AutoMapper, ConfigError> {
        self.config.validate()?;
        tracing::debug!(
            transformers = self.transformers.len(),
            providers = self.providers.len(),
            "building mapper"
        );
        Ok(AutoMapper::from_parts(
            self.metadata,
            self.config,
            self.transformers,
            self.providers,
        ))
    }
}
