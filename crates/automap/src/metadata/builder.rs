// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fluent builder API for class and enum metadata.

use super::class::{
    ClassMetadata, ConstructorParam, Discriminator, EnumCase, EnumMetadata, PropertyMetadata,
};
use super::{ConstructorBody, Stringify};
use crate::types::TypeDescriptor;
use crate::value::{Object, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Builder for [`ClassMetadata`].
#[derive(Debug)]
pub struct ClassBuilder {
    class: ClassMetadata,
}

impl ClassBuilder {
    /// Create a new builder for a concrete class.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            class: ClassMetadata::new(name),
        }
    }

    /// Inherit members from a parent class.
    pub fn extends(mut self, parent: impl Into<Arc<str>>) -> Self {
        self.class.parent = Some(parent.into());
        self
    }

    /// Mark as abstract (or interface).
    pub fn abstract_class(mut self) -> Self {
        self.class.is_abstract = true;
        self
    }

    /// Add a public typed field.
    pub fn field(self, name: impl Into<String>, ty: TypeDescriptor) -> Self {
        self.property(PropertyMetadata::new(name, ty))
    }

    /// Add a public field without type information.
    pub fn untyped_field(self, name: impl Into<String>) -> Self {
        self.property(PropertyMetadata::untyped(name))
    }

    /// Add a fully described property.
    pub fn property(mut self, property: PropertyMetadata) -> Self {
        self.class.properties.retain(|p| p.name != property.name);
        self.class.properties.push(property);
        self
    }

    /// Add a private field exposed through a getter/setter pair.
    pub fn accessor_pair(self, name: impl Into<String>, ty: TypeDescriptor) -> Self {
        let name = name.into();
        let (read, write) = (name.clone(), name.clone());
        self.property(
            PropertyMetadata::new(name, ty)
                .private()
                .getter(move |o: &Object| o.get(&read).cloned())
                .setter(move |o: &mut Object, v| o.set(write.clone(), v)),
        )
    }

    /// Add a constructor-promoted property.
    pub fn promoted(mut self, param: ConstructorParam) -> Self {
        let mut property = match &param.ty {
            Some(ty) => PropertyMetadata::new(param.name.clone(), ty.clone()),
            None => PropertyMetadata::untyped(param.name.clone()),
        };
        property.default = param.default.clone();
        self = self.property(property);
        self.class
            .constructor
            .get_or_insert_with(Vec::new)
            .push(param);
        self
    }

    /// Add a readonly constructor-promoted property.
    pub fn promoted_readonly(mut self, param: ConstructorParam) -> Self {
        let name = param.name.clone();
        self = self.promoted(param);
        if let Some(p) = self.class.properties.iter_mut().find(|p| p.name == name) {
            p.writable = false;
        }
        self
    }

    /// Add a plain constructor parameter (not a property).
    pub fn constructor_param(mut self, param: ConstructorParam) -> Self {
        self.class
            .constructor
            .get_or_insert_with(Vec::new)
            .push(param);
        self
    }

    /// Constructor body run after promoted parameters are assigned.
    pub fn constructor_body(
        mut self,
        body: impl Fn(&mut Object, &BTreeMap<String, Value>) + Send + Sync + 'static,
    ) -> Self {
        self.class.constructor_body = Some(ConstructorBody::new(body));
        self
    }

    /// Attach a discriminator table.
    pub fn discriminator(mut self, discriminator: Discriminator) -> Self {
        self.class.discriminator = Some(discriminator);
        self
    }

    /// Consult a named value provider before constructing.
    pub fn provider(mut self, name: impl Into<String>) -> Self {
        self.class.provider = Some(name.into());
        self
    }

    /// Collect unmatched source members into this map-typed property.
    pub fn extra_properties(mut self, property: impl Into<String>) -> Self {
        let name = property.into();
        if self.class.property(&name).is_none() {
            self = self.field(name.clone(), TypeDescriptor::map(TypeDescriptor::mixed()));
        }
        self.class.extra_properties = Some(name);
        self
    }

    /// Make instances convertible to strings.
    pub fn stringable(mut self, f: impl Fn(&Object) -> String + Send + Sync + 'static) -> Self {
        self.class.stringify = Some(Stringify::new(f));
        self
    }

    /// Build the ClassMetadata.
    pub fn build(self) -> ClassMetadata {
        self.class
    }
}

/// Builder for enum types.
#[derive(Debug)]
pub struct EnumBuilder {
    name: Arc<str>,
    cases: Vec<EnumCase>,
}

impl EnumBuilder {
    /// Create a new enum builder.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            cases: Vec::new(),
        }
    }

    /// Add a pure case.
    pub fn case(mut self, name: impl Into<Arc<str>>) -> Self {
        self.cases.push(EnumCase {
            name: name.into(),
            backing: None,
        });
        self
    }

    /// Add a backed case.
    pub fn backed_case(mut self, name: impl Into<Arc<str>>, backing: impl Into<Value>) -> Self {
        self.cases.push(EnumCase {
            name: name.into(),
            backing: Some(backing.into()),
        });
        self
    }

    /// Build the EnumMetadata.
    pub fn build(self) -> EnumMetadata {
        EnumMetadata {
            name: self.name,
            cases: self.cases,
        }
    }
}
