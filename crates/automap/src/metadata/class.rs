// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Class, property, constructor and enum metadata.

use super::{Condition, ConstructorBody, Getter, Setter, Stringify};
use crate::types::TypeDescriptor;
use crate::value::Value;
use std::sync::Arc;

/// Directive on a source property: where its value goes on the target.
#[derive(Debug, Clone, Default)]
pub struct MapTo {
    /// Only applies when the target is this class (or a subclass).
    pub target: Option<String>,
    /// Target property name or dotted path.
    pub property: Option<String>,
    /// Named custom transformer.
    pub transformer: Option<String>,
    /// Groups for the resulting pair; overrides the member's own groups.
    pub groups: Option<Vec<String>>,
    /// `Some(false)` forces inclusion of an ignored member.
    pub ignore: Option<bool>,
    /// The pair is applied only when the predicate accepts the source.
    pub condition: Option<Condition>,
}

impl MapTo {
    /// Map to a named target property (dotted paths allowed).
    pub fn property(property: impl Into<String>) -> Self {
        Self {
            property: Some(property.into()),
            ..Self::default()
        }
    }

    /// Restrict to a target class.
    pub fn for_class(mut self, class: impl Into<String>) -> Self {
        self.target = Some(class.into());
        self
    }

    pub fn transformer(mut self, name: impl Into<String>) -> Self {
        self.transformer = Some(name.into());
        self
    }

    pub fn groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups = Some(groups.into_iter().map(Into::into).collect());
        self
    }

    pub fn ignore(mut self, ignore: bool) -> Self {
        self.ignore = Some(ignore);
        self
    }

    pub fn when(mut self, condition: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
        self.condition = Some(Condition::new(condition));
        self
    }
}

/// Directive on a target property: where its value comes from.
#[derive(Debug, Clone, Default)]
pub struct MapFrom {
    /// Only applies when the source is this class (`array` for maps).
    pub source: Option<String>,
    /// Source property name or dotted path.
    pub property: Option<String>,
    pub transformer: Option<String>,
    pub groups: Option<Vec<String>>,
    pub ignore: Option<bool>,
    pub condition: Option<Condition>,
}

impl MapFrom {
    /// Read from a named source property (dotted paths allowed).
    pub fn property(property: impl Into<String>) -> Self {
        Self {
            property: Some(property.into()),
            ..Self::default()
        }
    }

    /// Restrict to a source class.
    pub fn for_class(mut self, class: impl Into<String>) -> Self {
        self.source = Some(class.into());
        self
    }

    pub fn transformer(mut self, name: impl Into<String>) -> Self {
        self.transformer = Some(name.into());
        self
    }

    pub fn groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups = Some(groups.into_iter().map(Into::into).collect());
        self
    }

    pub fn ignore(mut self, ignore: bool) -> Self {
        self.ignore = Some(ignore);
        self
    }

    pub fn when(mut self, condition: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
        self.condition = Some(Condition::new(condition));
        self
    }
}

/// Property declared on a class.
#[derive(Debug, Clone)]
pub struct PropertyMetadata {
    pub name: String,
    /// Declared type; `None` = untyped.
    pub ty: Option<TypeDescriptor>,
    /// Docblock-style element type for plain containers.
    pub element_hint: Option<TypeDescriptor>,
    /// Not accessible without accessors unless private mapping is enabled.
    pub private: bool,
    /// `false` for readonly properties (set through the constructor only).
    pub writable: bool,
    pub getter: Option<Getter>,
    pub setter: Option<Setter>,
    /// Has no backing field (accessor-only).
    pub virtual_property: bool,
    pub default: Option<Value>,
    pub ignore: bool,
    pub groups: Vec<String>,
    pub max_depth: Option<usize>,
    pub serialized_name: Option<String>,
    pub map_to: Vec<MapTo>,
    pub map_from: Vec<MapFrom>,
    /// Custom transformer applied whenever this property is a target.
    pub transformer: Option<String>,
}

impl PropertyMetadata {
    /// Public, writable, typed property.
    pub fn new(name: impl Into<String>, ty: TypeDescriptor) -> Self {
        Self {
            ty: Some(ty),
            ..Self::untyped(name)
        }
    }

    /// Public, writable property without type information.
    pub fn untyped(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: None,
            element_hint: None,
            private: false,
            writable: true,
            getter: None,
            setter: None,
            virtual_property: false,
            default: None,
            ignore: false,
            groups: Vec::new(),
            max_depth: None,
            serialized_name: None,
            map_to: Vec::new(),
            map_from: Vec::new(),
            transformer: None,
        }
    }

    /// Computed property exposed through a getter only.
    pub fn computed(
        name: impl Into<String>,
        ty: Option<TypeDescriptor>,
        getter: impl Fn(&crate::value::Object) -> Option<Value> + Send + Sync + 'static,
    ) -> Self {
        let mut property = Self::untyped(name);
        property.ty = ty;
        property.private = true;
        property.writable = false;
        property.virtual_property = true;
        property.getter = Some(Getter::new(getter));
        property
    }

    pub fn private(mut self) -> Self {
        self.private = true;
        self
    }

    pub fn readonly(mut self) -> Self {
        self.writable = false;
        self
    }

    pub fn getter(
        mut self,
        getter: impl Fn(&crate::value::Object) -> Option<Value> + Send + Sync + 'static,
    ) -> Self {
        self.getter = Some(Getter::new(getter));
        self
    }

    pub fn setter(
        mut self,
        setter: impl Fn(&mut crate::value::Object, Value) + Send + Sync + 'static,
    ) -> Self {
        self.setter = Some(Setter::new(setter));
        self
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Element type for a plain `list`/`map` property.
    pub fn element_hint(mut self, element: TypeDescriptor) -> Self {
        self.element_hint = Some(element);
        self
    }

    pub fn ignored(mut self) -> Self {
        self.ignore = true;
        self
    }

    pub fn groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups = groups.into_iter().map(Into::into).collect();
        self
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn serialized_name(mut self, name: impl Into<String>) -> Self {
        self.serialized_name = Some(name.into());
        self
    }

    pub fn map_to(mut self, directive: MapTo) -> Self {
        self.map_to.push(directive);
        self
    }

    pub fn map_from(mut self, directive: MapFrom) -> Self {
        self.map_from.push(directive);
        self
    }

    pub fn transformer(mut self, name: impl Into<String>) -> Self {
        self.transformer = Some(name.into());
        self
    }
}

/// Constructor parameter.
#[derive(Debug, Clone)]
pub struct ConstructorParam {
    pub name: String,
    pub ty: Option<TypeDescriptor>,
    pub default: Option<Value>,
}

impl ConstructorParam {
    pub fn new(name: impl Into<String>, ty: TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            ty: Some(ty),
            default: None,
        }
    }

    pub fn untyped(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: None,
            default: None,
        }
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }
}

/// Discriminator table declared on an abstract/base class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discriminator {
    /// Field carrying the discriminator in the source.
    pub property: String,
    /// Discriminator value -> concrete class.
    pub mapping: Vec<(String, Arc<str>)>,
}

impl Discriminator {
    pub fn new(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            mapping: Vec::new(),
        }
    }

    pub fn with(mut self, value: impl Into<String>, class: impl Into<Arc<str>>) -> Self {
        self.mapping.push((value.into(), class.into()));
        self
    }

    /// Concrete class for a discriminator value.
    pub fn class_for(&self, value: &str) -> Option<&Arc<str>> {
        self.mapping
            .iter()
            .find(|(v, _)| v == value)
            .map(|(_, class)| class)
    }

    /// Discriminator value for a concrete class.
    pub fn value_for(&self, class: &str) -> Option<&str> {
        self.mapping
            .iter()
            .find(|(_, c)| c.as_ref() == class)
            .map(|(v, _)| v.as_str())
    }
}

/// Registered class.
#[derive(Debug, Clone)]
pub struct ClassMetadata {
    pub name: Arc<str>,
    pub parent: Option<Arc<str>>,
    /// Abstract classes and interfaces cannot be instantiated.
    pub is_abstract: bool,
    pub properties: Vec<PropertyMetadata>,
    /// `None` = no declared constructor (inherit or default-construct).
    pub constructor: Option<Vec<ConstructorParam>>,
    pub constructor_body: Option<ConstructorBody>,
    pub discriminator: Option<Discriminator>,
    /// Named value provider consulted before construction.
    pub provider: Option<String>,
    /// Map-typed property collecting unmatched source members.
    pub extra_properties: Option<String>,
    pub stringify: Option<Stringify>,
}

impl ClassMetadata {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            is_abstract: false,
            properties: Vec::new(),
            constructor: None,
            constructor_body: None,
            discriminator: None,
            provider: None,
            extra_properties: None,
            stringify: None,
        }
    }

    /// Declared (not inherited) property by name.
    pub fn property(&self, name: &str) -> Option<&PropertyMetadata> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// Enum case with optional backing value.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumCase {
    pub name: Arc<str>,
    /// Backing scalar (`Int` or `String`).
    pub backing: Option<Value>,
}

/// Registered enum.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumMetadata {
    pub name: Arc<str>,
    pub cases: Vec<EnumCase>,
}

impl EnumMetadata {
    /// Case by name.
    pub fn case(&self, name: &str) -> Option<&EnumCase> {
        self.cases.iter().find(|c| c.name.as_ref() == name)
    }

    /// Case by backing value.
    pub fn case_by_backing(&self, value: &Value) -> Option<&EnumCase> {
        self.cases
            .iter()
            .find(|c| c.backing.as_ref() == Some(value))
    }

    /// Whether every case carries a backing value.
    pub fn is_backed(&self) -> bool {
        !self.cases.is_empty() && self.cases.iter().all(|c| c.backing.is_some())
    }
}
