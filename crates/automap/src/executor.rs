// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Mapping executor: walks a plan against a concrete source value.
//!
//! For class targets the order is fixed:
//!
//! 1. discriminator resolution (abstract/base targets only);
//! 2. cycle check against the visited registry;
//! 3. provider lookup, else constructor arguments and instantiation;
//! 4. registration of the target in the visited registry;
//! 5. setter pairs, then the extra-properties bag.
//!
//! Registering before populating is what lets a member refer back to an
//! object that is still being mapped.

use crate::context::ExecutionContext;
use crate::error::{MapperError, Result};
use crate::mapper::AutoMapper;
use crate::metadata::{ConstructorBody, MetadataSource};
use crate::plan::{
    ConfigFingerprint, MappingPair, MappingPlan, PlanKey, Signature, SourceAccessor,
    TargetAccessor,
};
use crate::resolver::MemberDescriptor;
use crate::transformer::{coerce, CollectionKind, Transformer, UnionCandidate};
use crate::types::{MemberType, ScalarKind, TypeKind};
use crate::value::{Object, ObjectRef, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Runs plans for one top-level call.
pub struct MappingExecutor<'m> {
    mapper: &'m AutoMapper,
    fingerprint: ConfigFingerprint,
}

impl<'m> MappingExecutor<'m> {
    pub fn new(mapper: &'m AutoMapper, ctx: &ExecutionContext) -> Self {
        Self {
            mapper,
            fingerprint: ConfigFingerprint::new(mapper.config(), ctx.groups()),
        }
    }

    fn metadata(&self) -> &dyn MetadataSource {
        self.mapper.metadata()
    }

    fn plan(&self, source: &Signature, target: &Signature) -> Result<Arc<MappingPlan>> {
        let key = PlanKey::new(source.clone(), target.clone(), self.fingerprint.clone());
        self.mapper.plan_for_key(&key)
    }

    /// Map `source` into `target`, populating `existing` when given.
    pub fn map_value(
        &self,
        source: &Value,
        target: &Signature,
        existing: Option<ObjectRef>,
        ctx: &mut ExecutionContext,
    ) -> Result<Value> {
        if source.is_null() {
            return Ok(Value::Null);
        }
        let Some(source_signature) = Signature::of(source) else {
            return Err(MapperError::incompatible(target, source));
        };
        // An existing instance may be a subclass of the declared target.
        let target = match &existing {
            Some(object) => Signature::Class(object.class()),
            None => target.clone(),
        };
        let plan = self.plan(&source_signature, &target)?;
        self.execute(&plan, source, existing, ctx)
    }

    /// Run `plan` against `source`.
    pub fn execute(
        &self,
        plan: &MappingPlan,
        source: &Value,
        existing: Option<ObjectRef>,
        ctx: &mut ExecutionContext,
    ) -> Result<Value> {
        if plan.key.target.is_array() {
            return self.execute_into_map(plan, source, ctx);
        }
        if existing.is_none() {
            if let Some(concrete) = self.concrete_class(plan, source)? {
                tracing::trace!(
                    base = %plan.key.target,
                    concrete = %concrete,
                    "discriminator resolved"
                );
                let concrete_plan = self.plan(&plan.key.source, &Signature::Class(concrete))?;
                return self.execute(&concrete_plan, source, None, ctx);
            }
        }
        self.execute_into_class(plan, source, existing, ctx)
    }

    /// Concrete subclass selected by the target's discriminator, when it
    /// differs from the plan's target.
    fn concrete_class(&self, plan: &MappingPlan, source: &Value) -> Result<Option<Arc<str>>> {
        let (Some(discriminator), Some(base)) = (&plan.discriminator, plan.target_class()) else {
            return Ok(None);
        };

        let value = match source {
            Value::Object(object) => {
                let class = object.class();
                if discriminator.value_for(&class).is_some() {
                    return Ok(Some(class).filter(|c| c != base));
                }
                object
                    .get(&discriminator.property)
                    .and_then(|v| self.discriminator_text(&v))
                    .or_else(|| self.inherited_discriminator(&class))
            }
            Value::Map(entries) => entries
                .get(&discriminator.property)
                .and_then(|v| self.discriminator_text(v)),
            _ => None,
        };

        let Some(value) = value else {
            if plan.is_abstract {
                return Err(MapperError::DiscriminatorFieldMissing {
                    class: base.to_string(),
                    field: discriminator.property.clone(),
                    source_kind: plan.key.source.to_string(),
                });
            }
            return Ok(None);
        };

        match discriminator.class_for(&value) {
            Some(concrete) if concrete == base => Ok(None),
            Some(concrete) => Ok(Some(concrete.clone())),
            None => Err(MapperError::UnknownDiscriminatorValue {
                class: base.to_string(),
                field: discriminator.property.clone(),
                value,
            }),
        }
    }

    fn discriminator_text(&self, value: &Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s.clone()),
            Value::Int(i) => Some(i.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Enum(case) => {
                let backing = self
                    .metadata()
                    .enumeration(&case.enum_name)
                    .and_then(|e| e.case(&case.case).and_then(|c| c.backing.clone()));
                match backing {
                    Some(backing) => self.discriminator_text(&backing),
                    None => Some(case.case.to_string()),
                }
            }
            _ => None,
        }
    }

    /// Discriminator value a source class carries through its own hierarchy.
    fn inherited_discriminator(&self, class: &str) -> Option<String> {
        self.metadata().lineage(class).iter().find_map(|ancestor| {
            ancestor
                .discriminator
                .as_ref()
                .and_then(|d| d.value_for(class))
                .map(String::from)
        })
    }

    fn execute_into_class(
        &self,
        plan: &MappingPlan,
        source: &Value,
        existing: Option<ObjectRef>,
        ctx: &mut ExecutionContext,
    ) -> Result<Value> {
        let Some(class) = plan.target_class().cloned() else {
            return Err(MapperError::InvalidTarget(plan.key.target.to_string()));
        };
        let target_signature = &plan.key.target;

        if let Value::Object(object) = source {
            if let Some(done) = ctx.visited(object, target_signature) {
                tracing::trace!(plan = %plan.name, "source already mapped");
                return Ok(Value::Object(done));
            }
        }

        let mut existing = existing;
        if existing.is_none() {
            if let Some(provider) = &plan.provider {
                let provided = provider
                    .inner
                    .provide(&class, source, ctx)
                    .map_err(|source| MapperError::Provider {
                        name: provider.name.clone(),
                        source,
                    })?;
                match provided {
                    None | Some(Value::Null) => {}
                    Some(Value::Object(object)) => existing = Some(object),
                    Some(other) => {
                        return Err(MapperError::InvalidTarget(format!(
                            "provider '{}' returned a {} value for {}",
                            provider.name,
                            other.kind_name(),
                            class
                        )))
                    }
                }
            }
        }

        let fresh = existing.is_none();
        let target = match existing {
            Some(target) => target,
            None => self.construct(plan, &class, source, ctx)?,
        };
        if let Value::Object(object) = source {
            ctx.remember(object, target_signature, &target);
        }

        if !fresh {
            for pair in plan.constructor.iter().filter_map(|arg| arg.pair.as_ref()) {
                self.apply_to_object(plan, pair, source, &target, fresh, ctx)?;
            }
        }
        for pair in &plan.setters {
            self.apply_to_object(plan, pair, source, &target, fresh, ctx)?;
        }
        if ctx.allow_extra_properties() {
            self.collect_extras(plan, source, &target);
        }

        Ok(Value::Object(target))
    }

    fn construct(
        &self,
        plan: &MappingPlan,
        class: &Arc<str>,
        source: &Value,
        ctx: &mut ExecutionContext,
    ) -> Result<ObjectRef> {
        if plan.is_abstract {
            return Err(MapperError::AbstractClass(class.to_string()));
        }

        let guard = source.as_object().map(ObjectRef::id);
        if let Some(id) = guard {
            if !ctx.enter_construction(id, class) {
                return Err(MapperError::CircularConstructor(class.to_string()));
            }
        }
        let result = self.instantiate(plan, class, source, ctx);
        if let Some(id) = guard {
            ctx.exit_construction(id, class);
        }
        result
    }

    fn instantiate(
        &self,
        plan: &MappingPlan,
        class: &Arc<str>,
        source: &Value,
        ctx: &mut ExecutionContext,
    ) -> Result<ObjectRef> {
        let mut object = blank(class, &plan.members);
        let mut args = BTreeMap::new();

        for arg in &plan.constructor {
            let produced = match &arg.pair {
                Some(pair) => self.produce(pair, source, None, None, true, ctx)?,
                None => None,
            };
            let value = match (produced, arg.default_value()) {
                (Some(Value::Null), Some(default)) if !arg.member.is_nullable() => default.clone(),
                (Some(Value::Null), None) if !arg.member.is_nullable() => {
                    return Err(MapperError::NullNotAllowed {
                        class: class.to_string(),
                        member: arg.member.name.clone(),
                    })
                }
                (Some(value), _) => value,
                (None, Some(default)) => default.clone(),
                (None, None) => {
                    return Err(MapperError::MissingRequiredArgument {
                        class: class.to_string(),
                        argument: arg.member.name.clone(),
                    })
                }
            };
            if arg.member.has_field {
                object.set(arg.member.name.clone(), value.clone());
            }
            args.insert(arg.member.name.clone(), value);
        }

        if self.fingerprint.use_constructor {
            if let Some(body) = self.constructor_body(class) {
                body.call(&mut object, &args);
            }
        }
        Ok(ObjectRef::new(object))
    }

    /// Body of the nearest declared constructor.
    fn constructor_body(&self, class: &str) -> Option<ConstructorBody> {
        self.metadata()
            .lineage(class)
            .iter()
            .find(|c| c.constructor.is_some() || c.constructor_body.is_some())
            .and_then(|c| c.constructor_body.clone())
    }

    /// Read, filter and transform the value of one pair. `None` means the
    /// pair does not apply: value absent, skipped or depth exhausted.
    ///
    /// Constructor arguments of a fresh instance keep explicit nulls even
    /// when nulls are skipped: there is no existing value to preserve.
    fn produce(
        &self,
        pair: &MappingPair,
        source: &Value,
        target: Option<&ObjectRef>,
        existing: Option<ObjectRef>,
        constructing: bool,
        ctx: &mut ExecutionContext,
    ) -> Result<Option<Value>> {
        if !pair.active_for(ctx.groups()) {
            return Ok(None);
        }
        if let Some(condition) = &pair.condition {
            if !condition.test(source) {
                return Ok(None);
            }
        }
        let Some(raw) = read(&pair.source, source) else {
            tracing::trace!(slot = %pair.target.slot(), "source value absent");
            return Ok(None);
        };
        if raw.is_null() && ctx.skip_null_values() && !constructing {
            return Ok(None);
        }

        let Some(limit) = pair.max_depth else {
            return self
                .transform(&pair.transformer, raw, source, target, existing, ctx)
                .map(Some);
        };
        if ctx.depth(&pair.depth_key) >= limit {
            tracing::trace!(key = %pair.depth_key, limit, "max depth reached");
            return Ok(None);
        }
        ctx.descend(&pair.depth_key);
        let result = self.transform(&pair.transformer, raw, source, target, existing, ctx);
        ctx.ascend(&pair.depth_key);
        result.map(Some)
    }

    fn apply_to_object(
        &self,
        plan: &MappingPlan,
        pair: &MappingPair,
        source: &Value,
        target: &ObjectRef,
        fresh: bool,
        ctx: &mut ExecutionContext,
    ) -> Result<()> {
        let existing = match &pair.target {
            TargetAccessor::Member(member) if ctx.deep_target_to_populate() && !fresh => {
                current_value(member, target).and_then(|v| v.as_object().cloned())
            }
            _ => None,
        };
        let Some(value) = self.produce(pair, source, Some(target), existing, false, ctx)? else {
            return Ok(());
        };

        match &pair.target {
            TargetAccessor::Member(member) => {
                self.write_member(plan, member, target, value, fresh, ctx)
            }
            TargetAccessor::Path {
                head: Some(head),
                segments,
            } => {
                let current = current_value(head, target);
                let updated = self.write_path(current, segments, value, &head.ty)?;
                self.write_member(plan, head, target, updated, fresh, ctx)
            }
            TargetAccessor::Path { head: None, .. } | TargetAccessor::Key(_) => Ok(()),
        }
    }

    fn write_member(
        &self,
        plan: &MappingPlan,
        member: &MemberDescriptor,
        target: &ObjectRef,
        value: Value,
        fresh: bool,
        ctx: &ExecutionContext,
    ) -> Result<()> {
        let class = || plan.key.target.to_string();
        if value.is_null() && !member.is_nullable() {
            return Err(MapperError::NullNotAllowed {
                class: class(),
                member: member.name.clone(),
            });
        }
        if member.writable {
            member.write(target, value);
            return Ok(());
        }

        let config = self.mapper.config();
        if fresh {
            if !config.use_constructor && member.has_field {
                target.set(member.name.clone(), value);
            } else {
                tracing::trace!(member = %member.name, "read-only member left to its constructor");
            }
            return Ok(());
        }

        if config.allow_readonly_target_to_populate && member.has_field {
            target.set(member.name.clone(), value);
            return Ok(());
        }
        if ctx.deep_target_to_populate() {
            let unchanged = current_value(member, target)
                .is_some_and(|current| current.same_instance(&value) || current == value);
            if !unchanged {
                return Err(MapperError::ReadOnlyTargetViolation {
                    class: class(),
                    member: member.name.clone(),
                });
            }
        }
        tracing::trace!(member = %member.name, "read-only member of existing target kept");
        Ok(())
    }

    /// Write `value` at `segments` below `current`, synthesizing missing
    /// intermediates from `hint` (an instance for class types, else a map).
    fn write_path(
        &self,
        current: Option<Value>,
        segments: &[String],
        value: Value,
        hint: &MemberType,
    ) -> Result<Value> {
        let Some((first, rest)) = segments.split_first() else {
            return Ok(value);
        };

        let container = match current {
            Some(existing @ (Value::Object(_) | Value::Map(_))) => existing,
            _ => match hint.descriptor().map(|t| &t.kind) {
                Some(TypeKind::Object(class)) => Value::Object(self.blank_instance(class)?),
                _ => Value::Map(BTreeMap::new()),
            },
        };

        match container {
            Value::Object(object) => {
                let members = self
                    .mapper
                    .resolver()
                    .resolve(&object.class(), self.fingerprint.map_private)?;
                let member = members.iter().find(|m| &m.name == first);
                let child_hint = member.map_or(MemberType::Dynamic, |m| m.ty.clone());
                let next = match member {
                    Some(m) => current_value(m, &object),
                    None => object.get(first),
                };
                let updated = self.write_path(next, rest, value, &child_hint)?;
                match member {
                    Some(m) if m.writable => m.write(&object, updated),
                    _ => object.set(first.clone(), updated),
                }
                Ok(Value::Object(object))
            }
            Value::Map(mut entries) => {
                let next = entries.remove(first);
                let updated = self.write_path(next, rest, value, &MemberType::Dynamic)?;
                entries.insert(first.clone(), updated);
                Ok(Value::Map(entries))
            }
            other => Ok(other),
        }
    }

    fn blank_instance(&self, class: &Arc<str>) -> Result<ObjectRef> {
        let members = self
            .mapper
            .resolver()
            .resolve(class, self.fingerprint.map_private)?;
        Ok(ObjectRef::new(blank(class, &members)))
    }

    fn collect_extras(&self, plan: &MappingPlan, source: &Value, target: &ObjectRef) {
        let Some(bag) = &plan.extra_bag else {
            return;
        };
        let extras: BTreeMap<String, Value> = match source {
            Value::Map(entries) => entries
                .iter()
                .filter(|(key, _)| !plan.consumed.contains(*key))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
            Value::Object(object) => plan
                .leftovers
                .iter()
                .filter_map(|m| m.read(object).map(|v| (m.external_name().to_string(), v)))
                .collect(),
            _ => BTreeMap::new(),
        };
        if extras.is_empty() {
            return;
        }

        let mut merged = match current_value(bag, target) {
            Some(Value::Map(entries)) => entries,
            _ => BTreeMap::new(),
        };
        tracing::trace!(count = extras.len(), bag = %bag.name, "collected extra properties");
        merged.extend(extras);
        bag.write(target, Value::Map(merged));
    }

    fn execute_into_map(
        &self,
        plan: &MappingPlan,
        source: &Value,
        ctx: &mut ExecutionContext,
    ) -> Result<Value> {
        let guard = source.as_object().map(ObjectRef::id);
        if let Some(id) = guard {
            if !ctx.enter_normalizing(id) {
                tracing::trace!(plan = %plan.name, "cycle while normalizing, emitting null");
                return Ok(Value::Null);
            }
        }
        let result = self.populate_map(plan, source, ctx);
        if let Some(id) = guard {
            ctx.exit_normalizing(id);
        }
        result
    }

    fn populate_map(
        &self,
        plan: &MappingPlan,
        source: &Value,
        ctx: &mut ExecutionContext,
    ) -> Result<Value> {
        let mut out = BTreeMap::new();
        if plan.passthrough {
            if let Value::Map(entries) = source {
                for (key, value) in entries {
                    if value.is_null() && ctx.skip_null_values() {
                        continue;
                    }
                    out.insert(key.clone(), self.normalize(value.clone(), ctx)?);
                }
            }
        }

        for pair in &plan.setters {
            let Some(value) = self.produce(pair, source, None, None, false, ctx)? else {
                continue;
            };
            match &pair.target {
                TargetAccessor::Key(key) => {
                    out.insert(key.clone(), value);
                }
                TargetAccessor::Member(member) => {
                    out.insert(member.external_name().to_string(), value);
                }
                TargetAccessor::Path { segments, .. } => {
                    let current = Value::Map(std::mem::take(&mut out));
                    if let Value::Map(entries) =
                        self.write_path(Some(current), segments, value, &MemberType::Dynamic)?
                    {
                        out = entries;
                    }
                }
            }
        }
        Ok(Value::Map(out))
    }

    fn transform(
        &self,
        transformer: &Transformer,
        value: Value,
        source: &Value,
        target: Option<&ObjectRef>,
        existing: Option<ObjectRef>,
        ctx: &mut ExecutionContext,
    ) -> Result<Value> {
        match transformer {
            Transformer::Identity => Ok(value),
            Transformer::Coerce(coercion) => coerce::coerce(value, coercion, self.metadata()),
            Transformer::Collection { kind, element } => {
                self.transform_collection(*kind, element, value, source, ctx)
            }
            Transformer::Discriminated(base) => {
                self.map_value(&value, &Signature::Class(base.clone()), existing, ctx)
            }
            Transformer::Nested(signature) => self.map_value(&value, signature, existing, ctx),
            Transformer::Union {
                name,
                nullable,
                candidates,
            } => {
                if value.is_null() && *nullable {
                    return Ok(Value::Null);
                }
                let candidate = self.pick_candidate(name, candidates, &value)?;
                self.transform(&candidate.transformer, value, source, target, existing, ctx)
            }
            Transformer::Custom(custom) => custom
                .inner
                .transform(value, source, target)
                .map_err(|source| MapperError::Transformer {
                    name: custom.name.clone(),
                    source,
                }),
            Transformer::Normalize => self.normalize(value, ctx),
        }
    }

    fn transform_collection(
        &self,
        kind: CollectionKind,
        element: &Transformer,
        value: Value,
        source: &Value,
        ctx: &mut ExecutionContext,
    ) -> Result<Value> {
        let entries: Vec<(String, Value)> = match value {
            Value::Null => return Ok(Value::Null),
            Value::List(items) => items
                .into_iter()
                .enumerate()
                .map(|(index, item)| (index.to_string(), item))
                .collect(),
            Value::Map(entries) => entries.into_iter().collect(),
            other => {
                let expected = match kind {
                    CollectionKind::List => "list",
                    CollectionKind::Map => "map",
                };
                return Err(MapperError::incompatible(expected, &other));
            }
        };

        match kind {
            CollectionKind::List => {
                let mut items = Vec::with_capacity(entries.len());
                for (_, item) in entries {
                    items.push(self.transform(element, item, source, None, None, ctx)?);
                }
                Ok(Value::List(items))
            }
            CollectionKind::Map => {
                let mut out = BTreeMap::new();
                for (key, item) in entries {
                    out.insert(key, self.transform(element, item, source, None, None, ctx)?);
                }
                Ok(Value::Map(out))
            }
        }
    }

    /// Objects become maps, enums their backing value (or case name).
    fn normalize(&self, value: Value, ctx: &mut ExecutionContext) -> Result<Value> {
        match value {
            Value::Object(_) => self.map_value(&value, &Signature::Array, None, ctx),
            Value::Enum(case) => Ok(self
                .metadata()
                .enumeration(&case.enum_name)
                .and_then(|e| e.case(&case.case).and_then(|c| c.backing.clone()))
                .unwrap_or_else(|| Value::String(case.case.to_string()))),
            Value::List(items) => items
                .into_iter()
                .map(|item| self.normalize(item, ctx))
                .collect::<Result<Vec<_>>>()
                .map(Value::List),
            Value::Map(entries) => {
                let mut out = BTreeMap::new();
                for (key, item) in entries {
                    out.insert(key, self.normalize(item, ctx)?);
                }
                Ok(Value::Map(out))
            }
            scalar => Ok(scalar),
        }
    }

    /// First union candidate compatible with the runtime value: instances
    /// by class, maps by shape, scalars by exact kind, then enum backing,
    /// then any coercible scalar.
    fn pick_candidate<'c>(
        &self,
        union: &str,
        candidates: &'c [UnionCandidate],
        value: &Value,
    ) -> Result<&'c UnionCandidate> {
        let metadata = self.metadata();
        let coercible = |c: &&UnionCandidate| match &c.transformer {
            Transformer::Coerce(coercion) => coerce::can_coerce(value, coercion, metadata),
            _ => false,
        };

        let found = match value {
            Value::Object(object) => {
                let class = object.class();
                candidates
                    .iter()
                    .find(|c| match &c.ty.kind {
                        TypeKind::Object(n) => metadata.is_subclass_of(&class, n),
                        _ => false,
                    })
                    .or_else(|| {
                        let fields = object.read().fields().clone();
                        self.match_shape(candidates, &fields)
                    })
                    .or_else(|| candidates.iter().find(coercible))
            }
            Value::Map(entries) => self
                .match_shape(candidates, entries)
                .or_else(|| candidates.iter().find(|c| matches!(c.ty.kind, TypeKind::Map(_)))),
            Value::List(_) => candidates
                .iter()
                .find(|c| matches!(c.ty.kind, TypeKind::List(_))),
            Value::Enum(case) => candidates
                .iter()
                .find(|c| matches!(&c.ty.kind, TypeKind::Enum(n) if *n == case.enum_name))
                .or_else(|| candidates.iter().find(coercible)),
            scalar => {
                let kind = scalar_kind(scalar);
                candidates
                    .iter()
                    .find(|c| kind.is_some() && c.ty.scalar() == kind)
                    .or_else(|| {
                        candidates
                            .iter()
                            .filter(|c| matches!(c.ty.kind, TypeKind::Enum(_)))
                            .find(coercible)
                    })
                    .or_else(|| {
                        candidates
                            .iter()
                            .filter(|c| c.ty.scalar().is_some())
                            .find(coercible)
                    })
            }
        };

        found
            .or_else(|| candidates.iter().find(|c| c.ty.is_mixed()))
            .ok_or_else(|| MapperError::NoMatchingUnionMember {
                union: union.to_string(),
                value_kind: value.kind_name().to_string(),
            })
    }

    /// Class candidate whose required constructor arguments are all present
    /// and which knows every key; else the first with required arguments
    /// present.
    fn match_shape<'c>(
        &self,
        candidates: &'c [UnionCandidate],
        entries: &BTreeMap<String, Value>,
    ) -> Option<&'c UnionCandidate> {
        let mut fallback = None;
        for candidate in candidates {
            let TypeKind::Object(class) = &candidate.ty.kind else {
                continue;
            };
            let Ok(members) = self
                .mapper
                .resolver()
                .resolve(class, self.fingerprint.map_private)
            else {
                continue;
            };

            let required_present = members
                .iter()
                .filter(|m| m.constructor.as_ref().is_some_and(|s| s.default.is_none()))
                .all(|m| entries.contains_key(m.external_name()));
            if !required_present {
                continue;
            }

            let discriminator = self
                .metadata()
                .lineage(class)
                .iter()
                .find_map(|c| c.discriminator.as_ref().map(|d| d.property.clone()));
            let all_known = entries.keys().all(|key| {
                discriminator.as_deref() == Some(key.as_str())
                    || members.iter().any(|m| m.external_name() == key.as_str() || &m.name == key)
            });
            if all_known {
                return Some(candidate);
            }
            fallback.get_or_insert(candidate);
        }
        fallback
    }
}

/// Fresh instance holding the initial values of `members`.
fn blank(class: &Arc<str>, members: &[MemberDescriptor]) -> Object {
    let mut object = Object::new(class.clone());
    for member in members {
        if let Some(value) = member.initial_value() {
            object.set(member.name.clone(), value);
        }
    }
    object
}

/// Current value of a member, falling back to the raw field when the member
/// is not readable through its accessor.
fn current_value(member: &MemberDescriptor, target: &ObjectRef) -> Option<Value> {
    member.read(target).or_else(|| target.get(&member.name))
}

fn read(accessor: &SourceAccessor, source: &Value) -> Option<Value> {
    match accessor {
        SourceAccessor::Member(member) => read_member(member, source),
        SourceAccessor::Key(key) => source.get_field(key),
        SourceAccessor::Path {
            head: Some(head),
            segments,
        } => read_member(head, source)?.get_path(segments),
        SourceAccessor::Path {
            head: None,
            segments,
        } => source.get_path(segments),
        SourceAccessor::Constant(value) => Some(value.clone()),
        SourceAccessor::Whole => Some(source.clone()),
    }
}

fn read_member(member: &MemberDescriptor, source: &Value) -> Option<Value> {
    match source {
        Value::Object(object) => member.read(object),
        Value::Map(entries) => entries.get(member.external_name()).cloned(),
        _ => None,
    }
}

fn scalar_kind(value: &Value) -> Option<ScalarKind> {
    match value {
        Value::Bool(_) => Some(ScalarKind::Bool),
        Value::Int(_) => Some(ScalarKind::Int),
        Value::Float(_) => Some(ScalarKind::Float),
        Value::String(_) => Some(ScalarKind::String),
        _ => None,
    }
}
