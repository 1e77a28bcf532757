// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type resolver: class metadata to ordered member descriptors.
//!
//! Members are collected root class first so that parent members keep their
//! declaration order, then overridden in place by subclasses. Constructor
//! parameters either promote the property of the same name or add a
//! constructor-only member. Results are cached per (class, private flag).

use crate::error::{MapperError, Result};
use crate::metadata::{
    ClassMetadata, Getter, MapFrom, MapTo, MetadataSource, PropertyMetadata, Setter,
};
use crate::types::{MemberType, TypeDescriptor, TypeKind};
use crate::value::{ObjectRef, Value};
use dashmap::DashMap;
use std::sync::Arc;

/// How a member is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    PublicField,
    PublicAccessor,
    /// Only reachable when private mapping is enabled.
    Private,
}

/// Where a member comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberOrigin {
    DeclaredProperty,
    ConstructorParameter,
}

/// Constructor slot of a member.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstructorSlot {
    pub position: usize,
    /// Parameter default; `None` makes the argument required.
    pub default: Option<Value>,
}

/// One gettable/settable slot of a class.
#[derive(Debug, Clone)]
pub struct MemberDescriptor {
    pub name: String,
    pub ty: MemberType,
    pub visibility: Visibility,
    pub origin: MemberOrigin,
    pub constructor: Option<ConstructorSlot>,
    /// Initial property value of a fresh instance.
    pub default: Option<Value>,
    pub readable: bool,
    /// Settable after construction.
    pub writable: bool,
    /// Backed by a field (not a computed accessor or plain parameter).
    pub has_field: bool,
    pub ignored: bool,
    pub groups: Vec<String>,
    pub max_depth: Option<usize>,
    pub serialized_name: Option<String>,
    pub map_to: Vec<MapTo>,
    pub map_from: Vec<MapFrom>,
    pub transformer: Option<String>,
    pub getter: Option<Getter>,
    pub setter: Option<Setter>,
    pub declaring_class: Arc<str>,
}

impl MemberDescriptor {
    /// Name used when matching against differently named counterparts and
    /// when reading from or writing to maps.
    pub fn external_name(&self) -> &str {
        self.serialized_name.as_deref().unwrap_or(&self.name)
    }

    pub fn is_nullable(&self) -> bool {
        self.ty.is_nullable()
    }

    /// Read the member from an instance. Unreadable members read as absent.
    pub fn read(&self, object: &ObjectRef) -> Option<Value> {
        if !self.readable {
            return None;
        }
        let guard = object.read();
        match &self.getter {
            Some(getter) => getter.call(&guard),
            None => guard.get(&self.name).cloned(),
        }
    }

    /// Write the member on an instance.
    pub fn write(&self, object: &ObjectRef, value: Value) {
        let mut guard = object.write();
        match &self.setter {
            Some(setter) => setter.call(&mut guard, value),
            None => guard.set(self.name.clone(), value),
        }
    }

    /// Value of the member on a fresh instance.
    pub fn initial_value(&self) -> Option<Value> {
        if !self.has_field {
            return None;
        }
        match (&self.default, &self.ty) {
            (Some(value), _) => Some(value.clone()),
            (None, MemberType::Dynamic) => Some(Value::Null),
            (None, MemberType::Typed(_)) => None,
        }
    }
}

/// Resolves and caches member lists.
pub struct TypeResolver {
    metadata: Arc<dyn MetadataSource>,
    cache: DashMap<(Arc<str>, bool), Arc<[MemberDescriptor]>>,
}

impl TypeResolver {
    pub fn new(metadata: Arc<dyn MetadataSource>) -> Self {
        Self {
            metadata,
            cache: DashMap::new(),
        }
    }

    /// Metadata this resolver reads.
    pub fn metadata(&self) -> &Arc<dyn MetadataSource> {
        &self.metadata
    }

    /// Look up a class, failing on unknown names.
    pub fn class(&self, name: &str) -> Result<Arc<ClassMetadata>> {
        self.metadata
            .class(name)
            .ok_or_else(|| MapperError::UnknownClass(name.to_string()))
    }

    /// Ordered members of `class`.
    pub fn resolve(&self, class: &str, include_private: bool) -> Result<Arc<[MemberDescriptor]>> {
        let key: (Arc<str>, bool) = (Arc::from(class), include_private);
        if let Some(members) = self.cache.get(&key) {
            return Ok(members.clone());
        }

        let members: Arc<[MemberDescriptor]> = self.build(class, include_private)?.into();
        tracing::trace!(class, count = members.len(), "resolved members");
        self.cache.insert(key, members.clone());
        Ok(members)
    }

    /// Number of cached member lists.
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    /// Drop all cached member lists.
    pub fn clear(&self) {
        self.cache.clear();
    }

    /// Replace object types naming registered enums by enum types, and
    /// recurse into containers and unions.
    pub fn canonical(&self, ty: TypeDescriptor) -> TypeDescriptor {
        let kind = match ty.kind {
            TypeKind::Object(name) if self.metadata.enumeration(&name).is_some() => {
                TypeKind::Enum(name)
            }
            TypeKind::List(e) => TypeKind::List(Box::new(self.canonical(*e))),
            TypeKind::Map(e) => TypeKind::Map(Box::new(self.canonical(*e))),
            TypeKind::Union(candidates) => {
                TypeKind::Union(candidates.into_iter().map(|c| self.canonical(c)).collect())
            }
            other => other,
        };
        TypeDescriptor {
            kind,
            nullable: ty.nullable,
        }
    }

    fn build(&self, class: &str, include_private: bool) -> Result<Vec<MemberDescriptor>> {
        let lineage = self.metadata.lineage(class);
        let Some(root) = lineage.last() else {
            return Err(MapperError::UnknownClass(class.to_string()));
        };
        if let Some(parent) = &root.parent {
            if !lineage.iter().any(|c| &c.name == parent) {
                return Err(MapperError::UnknownClass(parent.to_string()));
            }
        }

        let mut members: Vec<MemberDescriptor> = Vec::new();
        for owner in lineage.iter().rev() {
            for property in &owner.properties {
                let mut member = self.describe(property, owner, include_private);
                match members.iter_mut().find(|m| m.name == property.name) {
                    Some(inherited) => {
                        if member.ty == MemberType::Dynamic {
                            member.ty = inherited.ty.clone();
                        }
                        *inherited = member;
                    }
                    None => members.push(member),
                }
            }
        }

        if let Some(owner) = lineage.iter().find(|c| c.constructor.is_some()) {
            let params = owner.constructor.as_deref().unwrap_or_default();
            for (position, param) in params.iter().enumerate() {
                let slot = ConstructorSlot {
                    position,
                    default: param.default.clone(),
                };
                let param_ty: MemberType = param.ty.clone().map(|t| self.canonical(t)).into();
                match members.iter_mut().find(|m| m.name == param.name) {
                    Some(member) => {
                        member.origin = MemberOrigin::ConstructorParameter;
                        member.constructor = Some(slot);
                        if member.ty == MemberType::Dynamic {
                            member.ty = param_ty;
                        }
                    }
                    None => members.push(MemberDescriptor {
                        name: param.name.clone(),
                        ty: param_ty,
                        visibility: Visibility::PublicField,
                        origin: MemberOrigin::ConstructorParameter,
                        constructor: Some(slot),
                        default: None,
                        readable: false,
                        writable: false,
                        has_field: false,
                        ignored: false,
                        groups: Vec::new(),
                        max_depth: None,
                        serialized_name: None,
                        map_to: Vec::new(),
                        map_from: Vec::new(),
                        transformer: None,
                        getter: None,
                        setter: None,
                        declaring_class: owner.name.clone(),
                    }),
                }
            }
        }

        members.retain(|m| m.readable || m.writable || m.constructor.is_some());
        Ok(members)
    }

    fn describe(
        &self,
        property: &PropertyMetadata,
        owner: &ClassMetadata,
        include_private: bool,
    ) -> MemberDescriptor {
        let has_field = !property.virtual_property;
        let visibility = if !property.private {
            Visibility::PublicField
        } else if property.getter.is_some() || property.setter.is_some() {
            Visibility::PublicAccessor
        } else {
            Visibility::Private
        };
        let direct = has_field && (visibility == Visibility::PublicField || include_private);
        let readable = property.getter.is_some() || direct;
        let writable = property.writable && (property.setter.is_some() || direct);

        MemberDescriptor {
            name: property.name.clone(),
            ty: self.member_type(property),
            visibility,
            origin: MemberOrigin::DeclaredProperty,
            constructor: None,
            default: property.default.clone(),
            readable,
            writable,
            has_field,
            ignored: property.ignore,
            groups: property.groups.clone(),
            max_depth: property.max_depth,
            serialized_name: property.serialized_name.clone(),
            map_to: property.map_to.clone(),
            map_from: property.map_from.clone(),
            transformer: property.transformer.clone(),
            getter: property.getter.clone(),
            setter: property.setter.clone(),
            declaring_class: owner.name.clone(),
        }
    }

    fn member_type(&self, property: &PropertyMetadata) -> MemberType {
        let hint = property.element_hint.clone().map(|h| self.canonical(h));
        match (property.ty.clone(), hint) {
            (Some(ty), Some(hint)) => {
                let ty = self.canonical(ty);
                let kind = match ty.kind {
                    TypeKind::List(e) if e.is_mixed() => TypeKind::List(Box::new(hint)),
                    TypeKind::Map(e) if e.is_mixed() => TypeKind::Map(Box::new(hint)),
                    other => other,
                };
                MemberType::Typed(TypeDescriptor {
                    kind,
                    nullable: ty.nullable,
                })
            }
            (Some(ty), None) => MemberType::Typed(self.canonical(ty)),
            (None, Some(hint)) => MemberType::Typed(TypeDescriptor::list(hint).nullable()),
            (None, None) => MemberType::Dynamic,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{ClassBuilder, ClassRegistry, ConstructorParam, EnumBuilder};
    use crate::value::Object;

    fn resolver(registry: ClassRegistry) -> TypeResolver {
        TypeResolver::new(Arc::new(registry))
    }

    #[test]
    fn test_plain_fields_in_order() {
        let r = resolver(ClassRegistry::new().with_class(
            ClassBuilder::new("Point")
                .field("x", TypeDescriptor::float())
                .field("y", TypeDescriptor::float())
                .untyped_field("label")
                .build(),
        ));
        let members = r.resolve("Point", false).expect("resolve");
        let names: Vec<_> = members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["x", "y", "label"]);
        assert_eq!(members[2].ty, MemberType::Dynamic);
        assert_eq!(members[2].initial_value(), Some(Value::Null));
        assert!(members.iter().all(|m| m.visibility == Visibility::PublicField));
    }

    #[test]
    fn test_inheritance_override_and_covariance() {
        let r = resolver(
            ClassRegistry::new()
                .with_class(
                    ClassBuilder::new("Base")
                        .untyped_field("id")
                        .field("owner", TypeDescriptor::object("Person"))
                        .build(),
                )
                .with_class(
                    ClassBuilder::new("Child")
                        .extends("Base")
                        .field("id", TypeDescriptor::int())
                        .field("owner", TypeDescriptor::object("Employee"))
                        .field("extra", TypeDescriptor::bool())
                        .build(),
                ),
        );
        let members = r.resolve("Child", false).expect("resolve");
        let names: Vec<_> = members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["id", "owner", "extra"]);
        assert_eq!(members[0].ty, MemberType::Typed(TypeDescriptor::int()));
        assert_eq!(
            members[1].ty,
            MemberType::Typed(TypeDescriptor::object("Employee"))
        );
        assert_eq!(members[1].declaring_class.as_ref(), "Child");
    }

    #[test]
    fn test_constructor_promotion_and_plain_params() {
        let r = resolver(ClassRegistry::new().with_class(
            ClassBuilder::new("User")
                .promoted(ConstructorParam::new("id", TypeDescriptor::int()))
                .constructor_param(
                    ConstructorParam::new("nickname", TypeDescriptor::string())
                        .with_default("anon"),
                )
                .field("email", TypeDescriptor::string())
                .build(),
        ));
        let members = r.resolve("User", false).expect("resolve");

        let id = members.iter().find(|m| m.name == "id").expect("id");
        assert_eq!(id.origin, MemberOrigin::ConstructorParameter);
        assert_eq!(id.constructor.as_ref().map(|s| s.position), Some(0));
        assert!(id.readable);

        let nickname = members.iter().find(|m| m.name == "nickname").expect("nickname");
        assert!(!nickname.readable && !nickname.writable);
        assert_eq!(
            nickname.constructor.as_ref().and_then(|s| s.default.clone()),
            Some(Value::from("anon"))
        );

        let email = members.iter().find(|m| m.name == "email").expect("email");
        assert_eq!(email.origin, MemberOrigin::DeclaredProperty);
    }

    #[test]
    fn test_private_members_need_flag_or_accessor() {
        let r = resolver(ClassRegistry::new().with_class(
            ClassBuilder::new("Account")
                .property(PropertyMetadata::new("secret", TypeDescriptor::string()).private())
                .accessor_pair("token", TypeDescriptor::string())
                .build(),
        ));

        let public_only = r.resolve("Account", false).expect("resolve");
        let names: Vec<_> = public_only.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["token"]);
        assert_eq!(public_only[0].visibility, Visibility::PublicAccessor);

        let with_private = r.resolve("Account", true).expect("resolve");
        let secret = with_private.iter().find(|m| m.name == "secret").expect("secret");
        assert_eq!(secret.visibility, Visibility::Private);
        assert!(secret.readable && secret.writable);
        assert_eq!(r.cached(), 2);
    }

    #[test]
    fn test_element_hint_and_enum_canonicalisation() {
        let r = resolver(
            ClassRegistry::new()
                .with_enum(EnumBuilder::new("Status").case("On").build())
                .with_class(
                    ClassBuilder::new("Box")
                        .property(
                            PropertyMetadata::new(
                                "items",
                                TypeDescriptor::list(TypeDescriptor::mixed()),
                            )
                            .element_hint(TypeDescriptor::object("Item")),
                        )
                        .property(
                            PropertyMetadata::untyped("legacy").element_hint(TypeDescriptor::int()),
                        )
                        .field("status", TypeDescriptor::object("Status"))
                        .build(),
                ),
        );
        let members = r.resolve("Box", false).expect("resolve");
        assert_eq!(
            members[0].ty,
            MemberType::Typed(TypeDescriptor::list(TypeDescriptor::object("Item")))
        );
        assert_eq!(
            members[1].ty,
            MemberType::Typed(TypeDescriptor::list(TypeDescriptor::int()).nullable())
        );
        assert_eq!(
            members[2].ty,
            MemberType::Typed(TypeDescriptor::enumeration("Status"))
        );
    }

    #[test]
    fn test_computed_member_reads_through_getter() {
        let r = resolver(ClassRegistry::new().with_class(
            ClassBuilder::new("Person")
                .field("first", TypeDescriptor::string())
                .field("last", TypeDescriptor::string())
                .property(PropertyMetadata::computed(
                    "full",
                    Some(TypeDescriptor::string()),
                    |o: &Object| {
                        let first = o.get("first")?.as_str()?.to_string();
                        let last = o.get("last")?.as_str()?.to_string();
                        Some(Value::from(format!("{} {}", first, last)))
                    },
                ))
                .build(),
        ));
        let members = r.resolve("Person", false).expect("resolve");
        let full = members.iter().find(|m| m.name == "full").expect("full");
        assert!(full.readable && !full.writable && !full.has_field);

        let person = ObjectRef::new(
            Object::new("Person")
                .with_field("first", "Ada")
                .with_field("last", "Lovelace"),
        );
        assert_eq!(full.read(&person), Some(Value::from("Ada Lovelace")));
    }

    #[test]
    fn test_unknown_class() {
        let r = resolver(
            ClassRegistry::new().with_class(ClassBuilder::new("A").extends("Ghost").build()),
        );
        assert!(matches!(
            r.resolve("Nope", false),
            Err(MapperError::UnknownClass(c)) if c == "Nope"
        ));
        assert!(matches!(
            r.resolve("A", false),
            Err(MapperError::UnknownClass(c)) if c == "Ghost"
        ));
    }
}
