// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Automatic object-to-object mapper
//!
//! Maps between class instances, maps and lists without per-pair
//! boilerplate. Classes are described once in a metadata registry; for each
//! (source, target, configuration) combination the mapper compiles a
//! mapping plan, caches it, and runs it against concrete values.
//!
//! # Features
//!
//! - **Member matching**: by name, serialized name, or `MapTo`/`MapFrom`
//!   directives with dotted paths
//! - **Constructors**: promoted parameters, defaults, required arguments
//! - **Type coercion**: numeric strings, booleans, backed enums, unions
//! - **Polymorphism**: discriminator tables on abstract base classes
//! - **Object graphs**: cycles preserved, per-member max depth
//! - **Groups**: per-call filtering of tagged members
//! - **Hooks**: custom transformers and value providers
//!
//! # Quick Start
//!
//! ```rust
//! use automap::metadata::{ClassBuilder, ClassRegistry, MapFrom, PropertyMetadata};
//! use automap::{AutoMapper, MapOptions, Object, TypeDescriptor, Value};
//! use std::sync::Arc;
//!
//! let registry = ClassRegistry::new()
//!     .with_class(
//!         ClassBuilder::new("User")
//!             .field("name", TypeDescriptor::string())
//!             .field("city", TypeDescriptor::string())
//!             .build(),
//!     )
//!     .with_class(
//!         ClassBuilder::new("UserDto")
//!             .field("name", TypeDescriptor::string())
//!             .property(
//!                 PropertyMetadata::new("town", TypeDescriptor::string())
//!                     .map_from(MapFrom::property("city")),
//!             )
//!             .build(),
//!     );
//! let mapper = AutoMapper::new(Arc::new(registry));
//!
//! let user = Value::object(
//!     Object::new("User")
//!         .with_field("name", "Ada")
//!         .with_field("city", "London"),
//! );
//! let dto = mapper.map(&user, "UserDto", &MapOptions::default())?;
//! assert_eq!(dto.get_field("town"), Some(Value::from("London")));
//! # Ok::<(), automap::MapperError>(())
//! ```
//!
//! # Configuration File
//!
//! ```toml
//! map_private_properties = false
//! class_prefix = "Mapper_"
//! use_constructor = true
//! allow_readonly_target_to_populate = false
//! ```

pub mod cache;
pub mod config;
pub mod context;
pub mod error;
pub mod executor;
pub mod mapper;
pub mod matcher;
pub mod metadata;
pub mod plan;
pub mod provider;
pub mod resolver;
pub mod schema;
pub mod transformer;
pub mod types;
pub mod value;

pub use cache::{LookupStats, PlanCache};
pub use config::{ConfigError, MapOptions, MapperConfig};
pub use context::ExecutionContext;
pub use error::{BoxError, MapperError, Result};
pub use mapper::{AutoMapper, AutoMapperBuilder, Target};
pub use plan::{MappingPlan, Signature};
pub use provider::ValueProvider;
pub use resolver::{MemberDescriptor, TypeResolver};
pub use schema::{SchemaDocument, SchemaError};
pub use transformer::{CustomTransformer, Transformer};
pub use types::{MemberType, ScalarKind, TypeDescriptor, TypeKind};
pub use value::{EnumValue, Object, ObjectRef, Value};
