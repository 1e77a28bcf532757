// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Class metadata registered ahead of mapping.
//!
//! Stands in for runtime reflection: every class, enum, constructor and
//! mapping directive the mapper knows about is described here once, either
//! through the fluent builders or from a schema document
//! (see [`crate::schema`]).
//!
//! # Example
//!
//! ```rust
//! use automap::metadata::{ClassBuilder, ClassRegistry, MapFrom, PropertyMetadata};
//! use automap::TypeDescriptor;
//!
//! let mut registry = ClassRegistry::new();
//! registry.register(
//!     ClassBuilder::new("UserDto")
//!         .field("id", TypeDescriptor::int())
//!         .property(
//!             PropertyMetadata::new("zip", TypeDescriptor::string())
//!                 .map_from(MapFrom::property("address.zipcode")),
//!         )
//!         .build(),
//! );
//! assert!(registry.contains_class("UserDto"));
//! ```

mod builder;
mod class;
mod registry;

pub use builder::{ClassBuilder, EnumBuilder};
pub use class::{
    ClassMetadata, ConstructorParam, Discriminator, EnumCase, EnumMetadata, MapFrom, MapTo,
    PropertyMetadata,
};
pub use registry::{ClassRegistry, MetadataSource};

use crate::value::{Object, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

macro_rules! hook {
    ($(#[$meta:meta])* $name:ident, $($sig:tt)*) => {
        $(#[$meta])*
        #[derive(Clone)]
        pub struct $name(Arc<dyn $($sig)* + Send + Sync>);

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(stringify!($name))
            }
        }
    };
}

hook!(
    /// Accessor reading a (possibly computed) property. `None` = unreadable.
    Getter,
    Fn(&Object) -> Option<Value>
);
hook!(
    /// Accessor writing a property.
    Setter,
    Fn(&mut Object, Value)
);
hook!(
    /// Predicate on the source value deciding whether a directive applies.
    Condition,
    Fn(&Value) -> bool
);
hook!(
    /// String conversion for stringable classes.
    Stringify,
    Fn(&Object) -> String
);
hook!(
    /// Constructor body: receives the fresh instance and the named arguments.
    ConstructorBody,
    Fn(&mut Object, &BTreeMap<String, Value>)
);

impl Getter {
    pub fn new(f: impl Fn(&Object) -> Option<Value> + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn call(&self, object: &Object) -> Option<Value> {
        (self.0)(object)
    }
}

impl Setter {
    pub fn new(f: impl Fn(&mut Object, Value) + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn call(&self, object: &mut Object, value: Value) {
        (self.0)(object, value)
    }
}

impl Condition {
    pub fn new(f: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn test(&self, source: &Value) -> bool {
        (self.0)(source)
    }
}

impl Stringify {
    pub fn new(f: impl Fn(&Object) -> String + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn call(&self, object: &Object) -> String {
        (self.0)(object)
    }
}

impl ConstructorBody {
    pub fn new(f: impl Fn(&mut Object, &BTreeMap<String, Value>) + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn call(&self, object: &mut Object, args: &BTreeMap<String, Value>) {
        (self.0)(object, args)
    }
}
