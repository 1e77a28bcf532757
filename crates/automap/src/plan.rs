// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Mapping plans and their compiler.
//!
//! A [`MappingPlan`] is the immutable, cached description of how one
//! (source signature, target signature, configuration) combination maps:
//! the constructor arguments, the setter pairs applied afterwards, the
//! discriminator rule of the target and the optional value provider.

use crate::config::MapperConfig;
use crate::error::{MapperError, Result};
use crate::matcher::{MemberMatch, MemberMatcher, Shape};
use crate::metadata::{Condition, Discriminator};
use crate::provider::{NamedProvider, ProviderRegistry};
use crate::resolver::MemberDescriptor;
use crate::resolver::TypeResolver;
use crate::transformer::{Transformer, TransformerRegistry, TransformerSelector};
use crate::value::Value;
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::sync::Arc;

/// Shape of one side of a mapping: `array` for maps, otherwise a class.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Signature {
    Array,
    Class(Arc<str>),
}

impl Signature {
    /// Signature of a runtime value; `None` for scalars and lists.
    pub fn of(value: &Value) -> Option<Self> {
        match value {
            Value::Map(_) => Some(Self::Array),
            Value::Object(object) => Some(Self::Class(object.class())),
            _ => None,
        }
    }

    /// Parse a signature name; `array` denotes maps.
    pub fn parse(name: &str) -> Self {
        if name == "array" {
            Self::Array
        } else {
            Self::Class(Arc::from(name))
        }
    }

    pub fn class_name(&self) -> Option<&Arc<str>> {
        match self {
            Self::Array => None,
            Self::Class(name) => Some(name),
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Self::Array)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Array => f.write_str("array"),
            Self::Class(name) => f.write_str(name),
        }
    }
}

/// Configuration flags that change emitted plans.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConfigFingerprint {
    pub map_private: bool,
    pub use_constructor: bool,
    /// Active groups, sorted.
    pub groups: Option<Vec<String>>,
    pub class_prefix: String,
}

impl ConfigFingerprint {
    pub fn new(config: &MapperConfig, groups: Option<&BTreeSet<String>>) -> Self {
        Self {
            map_private: config.map_private_properties,
            use_constructor: config.use_constructor,
            groups: groups.map(|g| g.iter().cloned().collect()),
            class_prefix: config.class_prefix.clone(),
        }
    }
}

/// Plan cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlanKey {
    pub source: Signature,
    pub target: Signature,
    pub fingerprint: ConfigFingerprint,
}

impl PlanKey {
    pub fn new(source: Signature, target: Signature, fingerprint: ConfigFingerprint) -> Self {
        Self {
            source,
            target,
            fingerprint,
        }
    }

    /// Generated plan name, e.g. `Mapper_UserDto_User`.
    pub fn plan_name(&self) -> String {
        format!(
            "{}{}_{}",
            self.fingerprint.class_prefix,
            identifier(&self.source),
            identifier(&self.target)
        )
    }
}

fn identifier(signature: &Signature) -> String {
    signature
        .to_string()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Where a pair reads its value.
#[derive(Debug, Clone)]
pub enum SourceAccessor {
    /// Class member (field or getter).
    Member(MemberDescriptor),
    /// Map key.
    Key(String),
    /// Dotted path; `head` is the first segment when it is a known member.
    Path {
        head: Option<MemberDescriptor>,
        segments: Vec<String>,
    },
    /// Literal value, e.g. a discriminator written into a map target.
    Constant(Value),
    /// The whole source value.
    Whole,
}

impl SourceAccessor {
    /// Top-level source name this accessor consumes.
    pub fn consumed_name(&self) -> Option<&str> {
        match self {
            Self::Member(member) => Some(&member.name),
            Self::Key(key) => Some(key),
            Self::Path { head: Some(head), .. } => Some(&head.name),
            Self::Path { head: None, segments } => segments.first().map(String::as_str),
            Self::Constant(_) | Self::Whole => None,
        }
    }
}

/// Where a pair writes its value.
#[derive(Debug, Clone)]
pub enum TargetAccessor {
    /// Class member (field or setter).
    Member(MemberDescriptor),
    /// Map key.
    Key(String),
    /// Dotted path below `head` (class targets) or below the map root.
    /// Missing intermediates are synthesized.
    Path {
        head: Option<MemberDescriptor>,
        segments: Vec<String>,
    },
}

impl TargetAccessor {
    /// Unique name of the written slot.
    pub fn slot(&self) -> String {
        match self {
            Self::Member(member) => member.name.clone(),
            Self::Key(key) => key.clone(),
            Self::Path { head, segments } => {
                let mut parts: Vec<&str> = Vec::with_capacity(segments.len() + 1);
                if let Some(head) = head {
                    parts.push(&head.name);
                }
                parts.extend(segments.iter().map(String::as_str));
                parts.join(".")
            }
        }
    }

    pub fn member(&self) -> Option<&MemberDescriptor> {
        match self {
            Self::Member(member) => Some(member),
            Self::Path { head, .. } => head.as_ref(),
            Self::Key(_) => None,
        }
    }
}

/// One (source accessor, target slot, transformer) triple.
#[derive(Debug, Clone)]
pub struct MappingPair {
    pub source: SourceAccessor,
    pub target: TargetAccessor,
    pub transformer: Transformer,
    pub groups: Vec<String>,
    pub max_depth: Option<usize>,
    /// Counter key of the member chain, `Class::member`.
    pub depth_key: String,
    pub condition: Option<Condition>,
}

impl MappingPair {
    /// Untagged pairs are always active; tagged pairs need one active group.
    pub fn active_for(&self, groups: Option<&BTreeSet<String>>) -> bool {
        match groups {
            None => true,
            Some(_) if self.groups.is_empty() => true,
            Some(active) => self.groups.iter().any(|g| active.contains(g)),
        }
    }

    fn active_for_names(&self, groups: Option<&[String]>) -> bool {
        match groups {
            None => true,
            Some(_) if self.groups.is_empty() => true,
            Some(active) => self.groups.iter().any(|g| active.contains(g)),
        }
    }
}

/// One constructor parameter of the target.
#[derive(Debug, Clone)]
pub struct ConstructorArgument {
    pub member: MemberDescriptor,
    /// `None` when nothing in the source matches.
    pub pair: Option<MappingPair>,
}

impl ConstructorArgument {
    pub fn default_value(&self) -> Option<&Value> {
        self.member.constructor.as_ref().and_then(|s| s.default.as_ref())
    }

    pub fn is_required(&self) -> bool {
        self.default_value().is_none()
    }
}

/// Compiled mapping for one plan key.
#[derive(Debug)]
pub struct MappingPlan {
    pub key: PlanKey,
    pub name: String,
    /// Constructor arguments in parameter order; empty when constructors
    /// are not used or the target has none.
    pub constructor: Vec<ConstructorArgument>,
    /// Pairs applied after construction, in target member order.
    pub setters: Vec<MappingPair>,
    pub discriminator: Option<Discriminator>,
    pub is_abstract: bool,
    pub provider: Option<NamedProvider>,
    /// Map-typed member collecting unmatched source members.
    pub extra_bag: Option<MemberDescriptor>,
    /// Top-level source names read by some pair.
    pub consumed: BTreeSet<String>,
    /// Readable source members no pair reads.
    pub leftovers: Vec<MemberDescriptor>,
    /// Map to map: every source entry is copied.
    pub passthrough: bool,
    /// Resolved target members.
    pub members: Arc<[MemberDescriptor]>,
}

impl MappingPlan {
    /// All pairs, constructor arguments first.
    pub fn pairs(&self) -> impl Iterator<Item = &MappingPair> {
        self.constructor
            .iter()
            .filter_map(|arg| arg.pair.as_ref())
            .chain(self.setters.iter())
    }

    /// Pair writing the given target slot.
    pub fn pair_for(&self, slot: &str) -> Option<&MappingPair> {
        self.pairs().find(|p| p.target.slot() == slot)
    }

    pub fn target_class(&self) -> Option<&Arc<str>> {
        self.key.target.class_name()
    }
}

/// Builds plans from resolved members.
pub struct PlanCompiler<'a> {
    resolver: &'a TypeResolver,
    transformers: &'a TransformerRegistry,
    providers: &'a ProviderRegistry,
}

impl<'a> PlanCompiler<'a> {
    pub fn new(
        resolver: &'a TypeResolver,
        transformers: &'a TransformerRegistry,
        providers: &'a ProviderRegistry,
    ) -> Self {
        Self {
            resolver,
            transformers,
            providers,
        }
    }

    pub fn compile(&self, key: &PlanKey) -> Result<MappingPlan> {
        let fingerprint = &key.fingerprint;
        let source = self.shape(&key.source, fingerprint.map_private)?;
        let target = self.shape(&key.target, fingerprint.map_private)?;

        let matcher = MemberMatcher::new(self.resolver, fingerprint.map_private);
        let selector =
            TransformerSelector::new(self.resolver.metadata().as_ref(), self.transformers);

        let mut pairs = Vec::new();
        let mut consumed: BTreeSet<String> = BTreeSet::new();
        for matched in matcher.match_members(&source, &target) {
            if let Some(name) = matched.source.consumed_name() {
                consumed.insert(name.to_string());
            }
            let pair = self.pair(&selector, &key.target, matched)?;
            if !pair.active_for_names(fingerprint.groups.as_deref()) {
                tracing::trace!(slot = %pair.target.slot(), "pair outside active groups");
                continue;
            }
            pairs.push(pair);
        }

        let leftovers = source
            .members
            .iter()
            .filter(|m| m.readable && !m.ignored && !consumed.contains(&m.name))
            .cloned()
            .collect();

        let mut plan = MappingPlan {
            name: key.plan_name(),
            key: key.clone(),
            constructor: Vec::new(),
            setters: Vec::new(),
            discriminator: None,
            is_abstract: false,
            provider: None,
            extra_bag: None,
            consumed,
            leftovers,
            passthrough: source.signature.is_array() && target.signature.is_array(),
            members: target.members.clone(),
        };

        if let Some(class) = &target.class {
            if fingerprint.use_constructor {
                plan.constructor = self.constructor_arguments(&target, &mut pairs);
            } else {
                pairs.retain(|p| p.target.member().is_some_and(|m| m.writable || m.has_field));
            }
            plan.discriminator = class.discriminator.clone();
            plan.is_abstract = class.is_abstract;
            plan.provider = match &class.provider {
                Some(name) => Some(
                    self.providers
                        .get(name)
                        .ok_or_else(|| MapperError::UnknownProvider(name.clone()))?,
                ),
                None => None,
            };
            plan.extra_bag = self
                .resolver
                .metadata()
                .lineage(&class.name)
                .iter()
                .find_map(|c| c.extra_properties.clone())
                .and_then(|bag| target.members.iter().find(|m| m.name == bag).cloned());
        }
        plan.setters = pairs;

        tracing::debug!(
            plan = %plan.name,
            constructor = plan.constructor.len(),
            setters = plan.setters.len(),
            "compiled mapping plan"
        );
        Ok(plan)
    }

    fn shape(&self, signature: &Signature, include_private: bool) -> Result<Shape> {
        match signature {
            Signature::Array => Ok(Shape::array()),
            Signature::Class(name) => Ok(Shape {
                signature: signature.clone(),
                class: Some(self.resolver.class(name)?),
                members: self.resolver.resolve(name, include_private)?,
            }),
        }
    }

    fn pair(
        &self,
        selector: &TransformerSelector<'_>,
        target: &Signature,
        matched: MemberMatch,
    ) -> Result<MappingPair> {
        let transformer = if target.is_array() {
            selector.select_normalized(&matched.source_type, matched.transformer.as_deref())?
        } else {
            selector.select(
                &matched.source_type,
                &matched.target_type,
                matched.transformer.as_deref(),
            )?
        };
        Ok(MappingPair {
            source: matched.source,
            target: matched.target,
            transformer,
            groups: matched.groups,
            max_depth: matched.max_depth,
            depth_key: matched.depth_key,
            condition: matched.condition,
        })
    }

    /// Move the pairs feeding constructor parameters out of `pairs`.
    fn constructor_arguments(
        &self,
        target: &Shape,
        pairs: &mut Vec<MappingPair>,
    ) -> Vec<ConstructorArgument> {
        let mut params: Vec<&MemberDescriptor> = target
            .members
            .iter()
            .filter(|m| m.constructor.is_some())
            .collect();
        params.sort_by_key(|m| m.constructor.as_ref().map(|s| s.position));

        let mut seen = HashSet::new();
        params
            .into_iter()
            .filter(|m| seen.insert(m.name.clone()))
            .map(|member| {
                let pair = pairs
                    .iter()
                    .position(|p| {
                        matches!(&p.target, TargetAccessor::Member(m) if m.name == member.name)
                    })
                    .map(|index| pairs.remove(index));
                ConstructorArgument {
                    member: member.clone(),
                    pair,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{ClassBuilder, ClassRegistry, ConstructorParam, PropertyMetadata};
    use crate::types::TypeDescriptor;

    fn registry() -> ClassRegistry {
        ClassRegistry::new()
            .with_class(
                ClassBuilder::new("UserDto")
                    .field("id", TypeDescriptor::string())
                    .field("name", TypeDescriptor::string())
                    .field("email", TypeDescriptor::string())
                    .property(
                        PropertyMetadata::new("notes", TypeDescriptor::string()).groups(["admin"]),
                    )
                    .build(),
            )
            .with_class(
                ClassBuilder::new("User")
                    .promoted(ConstructorParam::new("id", TypeDescriptor::int()))
                    .promoted(
                        ConstructorParam::new("name", TypeDescriptor::string())
                            .with_default("anon"),
                    )
                    .field("email", TypeDescriptor::string())
                    .field("notes", TypeDescriptor::string())
                    .provider("users")
                    .build(),
            )
    }

    fn key(source: &str, target: &str, groups: Option<&BTreeSet<String>>) -> PlanKey {
        PlanKey::new(
            Signature::parse(source),
            Signature::parse(target),
            ConfigFingerprint::new(&MapperConfig::default(), groups),
        )
    }

    fn compile(key: &PlanKey) -> Result<MappingPlan> {
        let resolver = TypeResolver::new(Arc::new(registry()));
        let transformers = TransformerRegistry::new();
        let mut providers = ProviderRegistry::new();
        providers.register("users", |_: &str, _: &Value, _: &crate::context::ExecutionContext| {
            Ok::<Option<Value>, crate::error::BoxError>(None)
        });
        PlanCompiler::new(&resolver, &transformers, &providers).compile(key)
    }

    #[test]
    fn test_signature_and_name() {
        assert_eq!(Signature::parse("array"), Signature::Array);
        assert_eq!(Signature::of(&Value::map([("a", 1)])), Some(Signature::Array));
        assert_eq!(Signature::of(&Value::Int(1)), None);
        assert_eq!(key("array", "User", None).plan_name(), "Mapper_array_User");
    }

    #[test]
    fn test_constructor_and_setters() {
        let plan = compile(&key("UserDto", "User", None)).expect("compile");

        let params: Vec<_> = plan.constructor.iter().map(|a| a.member.name.as_str()).collect();
        assert_eq!(params, ["id", "name"]);
        assert!(plan.constructor[0].is_required());
        assert!(!plan.constructor[1].is_required());
        assert!(matches!(
            plan.constructor[0].pair.as_ref().map(|p| &p.transformer),
            Some(Transformer::Coerce(_))
        ));

        let setters: Vec<_> = plan.setters.iter().map(|p| p.target.slot()).collect();
        assert_eq!(setters, ["email", "notes"]);
        assert_eq!(plan.provider.as_ref().map(|p| p.name.as_str()), Some("users"));
        assert!(plan.leftovers.is_empty());
    }

    #[test]
    fn test_groups_prune_pairs_and_change_key() {
        let groups: BTreeSet<String> = ["public".to_string()].into_iter().collect();
        let filtered = key("UserDto", "User", Some(&groups));
        assert_ne!(filtered, key("UserDto", "User", None));

        let plan = compile(&filtered).expect("compile");
        assert!(plan.pair_for("notes").is_none());
        assert!(plan.pair_for("email").is_some());
        assert!(plan.consumed.contains("notes"));
    }

    #[test]
    fn test_map_targets() {
        let plan = compile(&key("User", "array", None)).expect("compile");
        let keys: Vec<_> = plan.setters.iter().map(|p| p.target.slot()).collect();
        assert_eq!(keys, ["id", "name", "email", "notes"]);
        assert!(!plan.passthrough);

        let plan = compile(&key("array", "array", None)).expect("compile");
        assert!(plan.passthrough && plan.setters.is_empty());
    }

    #[test]
    fn test_unknown_class_surfaces_at_compile() {
        let err = compile(&key("UserDto", "Ghost", None)).expect_err("unknown");
        assert!(matches!(err, MapperError::UnknownClass(c) if c == "Ghost"));
    }
}
