// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Member matcher: pairs source members with target members.
//!
//! Per target member, first match wins:
//!
//! 1. a `MapFrom` directive on the target or a `MapTo` directive on a source
//!    member, optionally restricted to a counterpart class, possibly naming
//!    a dotted path (`address.zipcode`);
//! 2. equal serialized names;
//! 3. equal member names (case-sensitive).
//!
//! Ignored members take part only through a directive with `ignore(false)`.
//! Map sources are read by key; map targets receive every readable source
//! member under its external name.

use crate::metadata::{ClassMetadata, Condition, MetadataSource};
use crate::plan::{Signature, SourceAccessor, TargetAccessor};
use crate::resolver::{MemberDescriptor, TypeResolver};
use crate::types::{MemberType, TypeKind};
use crate::value::Value;
use std::collections::HashSet;
use std::sync::Arc;

/// One side of a mapping with its resolved members.
#[derive(Debug, Clone)]
pub struct Shape {
    pub signature: Signature,
    pub class: Option<Arc<ClassMetadata>>,
    pub members: Arc<[MemberDescriptor]>,
}

impl Shape {
    /// Map shape: no static members.
    pub fn array() -> Self {
        Self {
            signature: Signature::Array,
            class: None,
            members: Arc::from(Vec::new()),
        }
    }

    fn member(&self, name: &str) -> Option<&MemberDescriptor> {
        self.members.iter().find(|m| m.name == name)
    }

    fn class_name(&self) -> &str {
        self.class.as_ref().map_or("array", |c| c.name.as_ref())
    }
}

/// A matched pair before transformer selection.
#[derive(Debug, Clone)]
pub struct MemberMatch {
    pub source: SourceAccessor,
    pub target: TargetAccessor,
    pub source_type: MemberType,
    pub target_type: MemberType,
    /// Named custom transformer.
    pub transformer: Option<String>,
    pub groups: Vec<String>,
    pub max_depth: Option<usize>,
    pub depth_key: String,
    pub condition: Option<Condition>,
}

/// Directive fields shared by `MapTo` and `MapFrom`.
struct Directive<'d> {
    property: Option<&'d str>,
    transformer: Option<&'d str>,
    groups: Option<&'d [String]>,
    ignore: Option<bool>,
    condition: Option<&'d Condition>,
}

pub struct MemberMatcher<'a> {
    resolver: &'a TypeResolver,
    include_private: bool,
}

impl<'a> MemberMatcher<'a> {
    pub fn new(resolver: &'a TypeResolver, include_private: bool) -> Self {
        Self {
            resolver,
            include_private,
        }
    }

    fn metadata(&self) -> &dyn MetadataSource {
        self.resolver.metadata().as_ref()
    }

    /// Match `source` against `target`, in target member order.
    pub fn match_members(&self, source: &Shape, target: &Shape) -> Vec<MemberMatch> {
        if target.signature.is_array() {
            self.match_into_map(source)
        } else {
            self.match_into_class(source, target)
        }
    }

    fn applies(&self, restriction: Option<&str>, counterpart: &Signature) -> bool {
        match (restriction, counterpart) {
            (None, _) => true,
            (Some(r), Signature::Array) => r == "array",
            (Some(r), Signature::Class(class)) => self.metadata().is_subclass_of(class, r),
        }
    }

    fn match_into_class(&self, source: &Shape, target: &Shape) -> Vec<MemberMatch> {
        let target_class = target.class_name();
        let bag = target.class.as_ref().and_then(|c| c.extra_properties.as_deref());
        let assignable = |m: &MemberDescriptor| {
            Some(m.name.as_str()) != bag && (m.writable || m.has_field || m.constructor.is_some())
        };

        let mut matches = Vec::new();
        // Slots taken by directives, and heads written through dotted paths.
        let mut claimed: HashSet<String> = HashSet::new();
        let mut claimed_heads: HashSet<String> = HashSet::new();
        let mut excluded_sources: HashSet<String> = HashSet::new();

        for tm in target.members.iter().filter(|m| assignable(*m)) {
            let directives = tm
                .map_from
                .iter()
                .filter(|d| self.applies(d.source.as_deref(), &source.signature));
            for d in directives {
                let directive = Directive {
                    property: d.property.as_deref(),
                    transformer: d.transformer.as_deref(),
                    groups: d.groups.as_deref(),
                    ignore: d.ignore,
                    condition: d.condition.as_ref(),
                };
                if directive.ignore == Some(true) {
                    claimed.insert(tm.name.clone());
                    break;
                }
                if tm.ignored && directive.ignore != Some(false) {
                    continue;
                }

                let found = match directive.property {
                    Some(path) => Some(self.source_path(source, path)),
                    None => self
                        .infer_source(source, tm, &excluded_sources, true)
                        .or_else(|| {
                            directive
                                .transformer
                                .map(|_| (SourceAccessor::Whole, MemberType::Dynamic, None))
                        }),
                };
                let Some((accessor, source_type, sm)) = found else {
                    continue;
                };
                matches.push(self.class_match(
                    target_class,
                    accessor,
                    source_type,
                    TargetAccessor::Member(tm.clone()),
                    tm.ty.clone(),
                    tm,
                    sm,
                    Some(&directive),
                ));
                claimed.insert(tm.name.clone());
                break;
            }
        }

        for sm in source.members.iter().filter(|m| m.readable) {
            let directives = sm
                .map_to
                .iter()
                .filter(|d| self.applies(d.target.as_deref(), &target.signature));
            for d in directives {
                let directive = Directive {
                    property: d.property.as_deref(),
                    transformer: d.transformer.as_deref(),
                    groups: d.groups.as_deref(),
                    ignore: d.ignore,
                    condition: d.condition.as_ref(),
                };
                if directive.ignore == Some(true) {
                    excluded_sources.insert(sm.name.clone());
                    break;
                }
                if sm.ignored && directive.ignore != Some(false) {
                    continue;
                }

                let path = directive.property.unwrap_or(&sm.name);
                let segments: Vec<String> = path.split('.').map(String::from).collect();
                let Some(head) = target.member(&segments[0]).filter(|m| assignable(*m)) else {
                    tracing::trace!(source = %sm.name, path, "map-to names no target member");
                    continue;
                };
                if claimed.contains(path) || claimed.contains(&head.name) {
                    continue;
                }

                let (target_accessor, target_type) = if segments.len() == 1 {
                    (TargetAccessor::Member(head.clone()), head.ty.clone())
                } else {
                    let rest = segments[1..].to_vec();
                    let ty = self.walk(&head.ty, &rest);
                    claimed_heads.insert(head.name.clone());
                    (
                        TargetAccessor::Path {
                            head: Some(head.clone()),
                            segments: rest,
                        },
                        ty,
                    )
                };
                matches.push(self.class_match(
                    target_class,
                    SourceAccessor::Member(sm.clone()),
                    sm.ty.clone(),
                    target_accessor,
                    target_type,
                    head,
                    Some(sm),
                    Some(&directive),
                ));
                claimed.insert(path.to_string());
                excluded_sources.insert(sm.name.clone());
                break;
            }
        }

        for tm in target.members.iter().filter(|m| assignable(*m)) {
            if tm.ignored || claimed.contains(&tm.name) || claimed_heads.contains(&tm.name) {
                continue;
            }
            let Some((accessor, source_type, sm)) =
                self.infer_source(source, tm, &excluded_sources, false)
            else {
                continue;
            };
            matches.push(self.class_match(
                target_class,
                accessor,
                source_type,
                TargetAccessor::Member(tm.clone()),
                tm.ty.clone(),
                tm,
                sm,
                None,
            ));
        }

        matches
    }

    /// Name-based source lookup: serialized names first, then exact names.
    fn infer_source<'s>(
        &self,
        source: &'s Shape,
        tm: &MemberDescriptor,
        excluded: &HashSet<String>,
        forced: bool,
    ) -> Option<(SourceAccessor, MemberType, Option<&'s MemberDescriptor>)> {
        if source.signature.is_array() {
            return Some((
                SourceAccessor::Key(tm.external_name().to_string()),
                MemberType::Dynamic,
                None,
            ));
        }

        let usable = |sm: &&MemberDescriptor| {
            sm.readable && (forced || !sm.ignored) && !excluded.contains(&sm.name)
        };
        let renamed = source.members.iter().filter(usable).find(|sm| {
            (sm.serialized_name.is_some() || tm.serialized_name.is_some())
                && sm.external_name() == tm.external_name()
        });
        let found = renamed.or_else(|| {
            source
                .members
                .iter()
                .filter(usable)
                .find(|sm| sm.name == tm.name)
        })?;
        Some((SourceAccessor::Member(found.clone()), found.ty.clone(), Some(found)))
    }

    /// Accessor for an explicit source path.
    fn source_path<'s>(
        &self,
        source: &'s Shape,
        path: &str,
    ) -> (SourceAccessor, MemberType, Option<&'s MemberDescriptor>) {
        let mut segments: Vec<String> = path.split('.').map(String::from).collect();
        if source.signature.is_array() {
            return if segments.len() == 1 {
                (SourceAccessor::Key(path.to_string()), MemberType::Dynamic, None)
            } else {
                (SourceAccessor::Path { head: None, segments }, MemberType::Dynamic, None)
            };
        }

        match source.member(&segments[0]).filter(|m| m.readable) {
            Some(head) if segments.len() == 1 => {
                (SourceAccessor::Member(head.clone()), head.ty.clone(), Some(head))
            }
            Some(head) => {
                let rest = segments.split_off(1);
                let ty = self.walk(&head.ty, &rest);
                (
                    SourceAccessor::Path {
                        head: Some(head.clone()),
                        segments: rest,
                    },
                    ty,
                    Some(head),
                )
            }
            None => (SourceAccessor::Path { head: None, segments }, MemberType::Dynamic, None),
        }
    }

    /// Type of `segments` below a member of type `ty`.
    fn walk(&self, ty: &MemberType, segments: &[String]) -> MemberType {
        let mut current = ty.clone();
        for segment in segments {
            let class = match current.descriptor().map(|t| &t.kind) {
                Some(TypeKind::Object(class)) => class.clone(),
                _ => return MemberType::Dynamic,
            };
            let members = match self.resolver.resolve(&class, self.include_private) {
                Ok(members) => members,
                Err(_) => return MemberType::Dynamic,
            };
            current = members
                .iter()
                .find(|m| &m.name == segment)
                .map_or(MemberType::Dynamic, |m| m.ty.clone());
        }
        current
    }

    #[allow(clippy::too_many_arguments)]
    fn class_match(
        &self,
        target_class: &str,
        source: SourceAccessor,
        source_type: MemberType,
        target: TargetAccessor,
        target_type: MemberType,
        tm: &MemberDescriptor,
        sm: Option<&MemberDescriptor>,
        directive: Option<&Directive<'_>>,
    ) -> MemberMatch {
        let groups = match directive.and_then(|d| d.groups) {
            Some(groups) => groups.to_vec(),
            None if !tm.groups.is_empty() => tm.groups.clone(),
            None => sm.map(|m| m.groups.clone()).unwrap_or_default(),
        };
        MemberMatch {
            source,
            target,
            source_type,
            target_type,
            transformer: directive
                .and_then(|d| d.transformer)
                .map(String::from)
                .or_else(|| tm.transformer.clone()),
            groups,
            max_depth: tm.max_depth.or_else(|| sm.and_then(|m| m.max_depth)),
            depth_key: format!("{}::{}", target_class, tm.name),
            condition: directive.and_then(|d| d.condition.cloned()),
        }
    }

    fn match_into_map(&self, source: &Shape) -> Vec<MemberMatch> {
        let source_class = source.class_name();
        let mut matches: Vec<MemberMatch> = Vec::new();
        let mut written: HashSet<String> = HashSet::new();

        for sm in source.members.iter().filter(|m| m.readable) {
            let directive = sm
                .map_to
                .iter()
                .find(|d| self.applies(d.target.as_deref(), &Signature::Array));
            if directive.is_some_and(|d| d.ignore == Some(true)) {
                continue;
            }
            if sm.ignored && !directive.is_some_and(|d| d.ignore == Some(false)) {
                continue;
            }

            let key = directive
                .and_then(|d| d.property.as_deref())
                .unwrap_or_else(|| sm.external_name());
            if !written.insert(key.to_string()) {
                continue;
            }
            let target = if key.contains('.') {
                TargetAccessor::Path {
                    head: None,
                    segments: key.split('.').map(String::from).collect(),
                }
            } else {
                TargetAccessor::Key(key.to_string())
            };

            matches.push(MemberMatch {
                source: SourceAccessor::Member(sm.clone()),
                target,
                source_type: sm.ty.clone(),
                target_type: MemberType::Dynamic,
                transformer: directive.and_then(|d| d.transformer.clone()),
                groups: directive
                    .and_then(|d| d.groups.clone())
                    .unwrap_or_else(|| sm.groups.clone()),
                max_depth: sm.max_depth,
                depth_key: format!("{}::{}", source_class, sm.name),
                condition: directive.and_then(|d| d.condition.clone()),
            });
        }

        if let Some((property, value)) = self.discriminator_constant(source) {
            if !written.contains(&property) {
                matches.push(MemberMatch {
                    source: SourceAccessor::Constant(Value::String(value)),
                    target: TargetAccessor::Key(property.clone()),
                    source_type: MemberType::Dynamic,
                    target_type: MemberType::Dynamic,
                    transformer: None,
                    groups: Vec::new(),
                    max_depth: None,
                    depth_key: format!("{}::{}", source_class, property),
                    condition: None,
                });
            }
        }

        matches
    }

    /// Discriminator field and value identifying the source class in an
    /// ancestor's discriminator table.
    fn discriminator_constant(&self, source: &Shape) -> Option<(String, String)> {
        let class = source.class.as_ref()?;
        self.metadata().lineage(&class.name).iter().find_map(|ancestor| {
            let discriminator = ancestor.discriminator.as_ref()?;
            let value = discriminator.value_for(&class.name)?;
            Some((discriminator.property.clone(), value.to_string()))
        })
    }
}
