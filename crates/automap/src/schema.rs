// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Declarative class metadata.
//!
//! Classes and enums can be described in TOML or JSON instead of builder
//! code. Types use the textual form understood by
//! [`TypeDescriptor::parse`].
//!
//! ```toml
//! [[enums]]
//! name = "Status"
//! cases = [{ name = "Active", value = "active" }, { name = "Banned", value = "banned" }]
//!
//! [[classes]]
//! name = "User"
//! constructor = [{ name = "id", type = "int" }]
//!
//! [[classes.properties]]
//! name = "id"
//! type = "int"
//!
//! [[classes.properties]]
//! name = "zip"
//! type = "?string"
//! map_from = [{ property = "address.zipcode" }]
//! ```
//!
//! Accessor callables, conditions and constructor bodies cannot be expressed
//! declaratively; add them with the builders after loading.

use crate::metadata::{
    ClassMetadata, ClassRegistry, ConstructorParam, Discriminator, EnumCase, EnumMetadata,
    MapFrom, MapTo, PropertyMetadata,
};
use crate::types::{ParseTypeError, TypeDescriptor, TypeKind};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// Schema loading errors.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{context}: {source}")]
    Type {
        context: String,
        #[source]
        source: ParseTypeError,
    },

    #[error("Invalid schema: {0}")]
    Invalid(String),
}

/// Root of a schema document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaDocument {
    #[serde(default)]
    pub enums: Vec<EnumDef>,
    #[serde(default)]
    pub classes: Vec<ClassDef>,
}

/// Enum definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnumDef {
    pub name: String,
    pub cases: Vec<EnumCaseDef>,
}

/// Enum case definition; `value` is the backing scalar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnumCaseDef {
    pub name: String,
    #[serde(default)]
    pub value: Option<serde_json::Value>,
}

/// Class definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassDef {
    pub name: String,
    #[serde(default)]
    pub extends: Option<String>,
    #[serde(default, rename = "abstract")]
    pub is_abstract: bool,
    #[serde(default)]
    pub properties: Vec<PropertyDef>,
    #[serde(default)]
    pub constructor: Option<Vec<ParamDef>>,
    #[serde(default)]
    pub discriminator: Option<DiscriminatorDef>,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub extra_properties: Option<String>,
}

/// Property definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyDef {
    pub name: String,
    #[serde(default, rename = "type")]
    pub ty: Option<String>,
    /// Docblock-style element type for plain containers.
    #[serde(default)]
    pub element: Option<String>,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub readonly: bool,
    #[serde(default)]
    pub default: Option<serde_json::Value>,
    #[serde(default)]
    pub ignore: bool,
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub max_depth: Option<usize>,
    #[serde(default)]
    pub serialized_name: Option<String>,
    #[serde(default)]
    pub map_to: Vec<DirectiveDef>,
    #[serde(default)]
    pub map_from: Vec<DirectiveDef>,
    #[serde(default)]
    pub transformer: Option<String>,
}

/// `map_to` / `map_from` entry. `class` restricts the counterpart class.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirectiveDef {
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default)]
    pub property: Option<String>,
    #[serde(default)]
    pub transformer: Option<String>,
    #[serde(default)]
    pub groups: Option<Vec<String>>,
    #[serde(default)]
    pub ignore: Option<bool>,
}

/// Constructor parameter definition. A parameter named like a property
/// promotes that property.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamDef {
    pub name: String,
    #[serde(default, rename = "type")]
    pub ty: Option<String>,
    #[serde(default)]
    pub default: Option<serde_json::Value>,
}

/// Discriminator definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscriminatorDef {
    pub property: String,
    pub mapping: BTreeMap<String, String>,
}

impl SchemaDocument {
    /// Parse a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, SchemaError> {
        Ok(toml::from_str(content)?)
    }

    /// Parse a JSON document.
    pub fn from_json_str(content: &str) -> Result<Self, SchemaError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Load from a file; `.json` files are parsed as JSON, anything else as TOML.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SchemaError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&content),
            _ => Self::from_toml_str(&content),
        }
    }

    /// Build and validate a registry.
    pub fn into_registry(self) -> Result<ClassRegistry, SchemaError> {
        let mut registry = ClassRegistry::new();
        let enum_names: Vec<String> = self.enums.iter().map(|e| e.name.clone()).collect();

        for def in self.enums {
            registry.register_enum(EnumMetadata {
                name: def.name.into(),
                cases: def
                    .cases
                    .into_iter()
                    .map(|c| EnumCase {
                        name: c.name.into(),
                        backing: c.value.map(Value::from),
                    })
                    .collect(),
            });
        }

        for def in self.classes {
            registry.register(class_from_def(def, &enum_names)?);
        }

        registry.validate()?;
        Ok(registry)
    }
}

impl ClassRegistry {
    /// Load a registry from a TOML schema.
    pub fn from_toml_str(content: &str) -> Result<Self, SchemaError> {
        SchemaDocument::from_toml_str(content)?.into_registry()
    }

    /// Load a registry from a JSON schema.
    pub fn from_json_str(content: &str) -> Result<Self, SchemaError> {
        SchemaDocument::from_json_str(content)?.into_registry()
    }

    /// Load a registry from a schema file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SchemaError> {
        SchemaDocument::from_file(path)?.into_registry()
    }
}

fn class_from_def(def: ClassDef, enums: &[String]) -> Result<ClassMetadata, SchemaError> {
    let mut class = ClassMetadata::new(def.name.as_str());
    class.parent = def.extends.map(Into::into);
    class.is_abstract = def.is_abstract;
    class.provider = def.provider;
    class.extra_properties = def.extra_properties;
    class.discriminator = def.discriminator.map(|d| Discriminator {
        property: d.property,
        mapping: d
            .mapping
            .into_iter()
            .map(|(value, class)| (value, class.into()))
            .collect(),
    });

    for prop in def.properties {
        let context = format!("{}::{}", def.name, prop.name);
        let mut property = PropertyMetadata::untyped(prop.name);
        property.ty = parse_optional(prop.ty.as_deref(), enums, &context)?;
        property.element_hint = parse_optional(prop.element.as_deref(), enums, &context)?;
        property.private = prop.private;
        property.writable = !prop.readonly;
        property.default = prop.default.map(Value::from);
        property.ignore = prop.ignore;
        property.groups = prop.groups;
        property.max_depth = prop.max_depth;
        property.serialized_name = prop.serialized_name;
        property.transformer = prop.transformer;
        property.map_to = prop
            .map_to
            .into_iter()
            .map(|d| MapTo {
                target: d.class,
                property: d.property,
                transformer: d.transformer,
                groups: d.groups,
                ignore: d.ignore,
                condition: None,
            })
            .collect();
        property.map_from = prop
            .map_from
            .into_iter()
            .map(|d| MapFrom {
                source: d.class,
                property: d.property,
                transformer: d.transformer,
                groups: d.groups,
                ignore: d.ignore,
                condition: None,
            })
            .collect();
        class.properties.push(property);
    }

    if let Some(params) = def.constructor {
        let mut constructor = Vec::with_capacity(params.len());
        for param in params {
            let context = format!("{}::__construct({})", def.name, param.name);
            constructor.push(ConstructorParam {
                ty: parse_optional(param.ty.as_deref(), enums, &context)?,
                default: param.default.map(Value::from),
                name: param.name,
            });
        }
        class.constructor = Some(constructor);
    }

    if let Some(bag) = &class.extra_properties {
        if class.property(bag).is_none() {
            class.properties.push(PropertyMetadata::new(
                bag.clone(),
                TypeDescriptor::map(TypeDescriptor::mixed()),
            ));
        }
    }

    Ok(class)
}

fn parse_optional(
    text: Option<&str>,
    enums: &[String],
    context: &str,
) -> Result<Option<TypeDescriptor>, SchemaError> {
    text.map(|t| {
        TypeDescriptor::parse(t)
            .map(|ty| mark_enums(ty, enums))
            .map_err(|source| SchemaError::Type {
                context: context.to_string(),
                source,
            })
    })
    .transpose()
}

/// The textual form cannot tell classes from enums; fix up names that were
/// declared as enums in the same document.
fn mark_enums(ty: TypeDescriptor, enums: &[String]) -> TypeDescriptor {
    let kind = match ty.kind {
        TypeKind::Object(name) if enums.iter().any(|e| e.as_str() == name.as_ref()) => {
            TypeKind::Enum(name)
        }
        TypeKind::List(e) => TypeKind::List(Box::new(mark_enums(*e, enums))),
        TypeKind::Map(e) => TypeKind::Map(Box::new(mark_enums(*e, enums))),
        TypeKind::Union(c) => {
            TypeKind::Union(c.into_iter().map(|t| mark_enums(t, enums)).collect())
        }
        other => other,
    };
    TypeDescriptor {
        kind,
        nullable: ty.nullable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::MetadataSource;
    use std::io::Write;

    const SCHEMA: &str = r#"
[[enums]]
name = "Status"
cases = [{ name = "Active", value = "active" }, { name = "Banned", value = "banned" }]

[[classes]]
name = "Pet"
abstract = true
discriminator = { property = "type", mapping = { cat = "Cat" } }

[[classes.properties]]
name = "name"
type = "string"

[[classes]]
name = "Cat"
extends = "Pet"
constructor = [{ name = "lives", type = "int", default = 9 }]

[[classes.properties]]
name = "lives"
type = "int"
readonly = true

[[classes.properties]]
name = "status"
type = "?Status"

[[classes.properties]]
name = "toys"
type = "array"
element = "string"
map_from = [{ property = "inventory.toys", class = "array" }]
"#;

    #[test]
    fn test_load_toml_schema() {
        let registry = ClassRegistry::from_toml_str(SCHEMA).expect("schema loads");

        let cat = registry.class("Cat").expect("Cat");
        assert_eq!(cat.parent.as_deref(), Some("Pet"));
        let status = cat.property("status").expect("status");
        assert_eq!(status.ty, Some(TypeDescriptor::enumeration("Status").nullable()));
        let lives = cat.property("lives").expect("lives");
        assert!(!lives.writable);
        let ctor = cat.constructor.as_ref().expect("constructor");
        assert_eq!(ctor[0].default, Some(Value::Int(9)));
        let toys = cat.property("toys").expect("toys");
        assert_eq!(toys.element_hint, Some(TypeDescriptor::string()));
        assert_eq!(toys.map_from[0].source.as_deref(), Some("array"));

        let pet = registry.class("Pet").expect("Pet");
        assert!(pet.is_abstract);
        assert_eq!(
            pet.discriminator.as_ref().and_then(|d| d.class_for("cat")).map(|c| c.as_ref()),
            Some("Cat")
        );
        let status_enum = registry.enumeration("Status").expect("enum");
        assert!(status_enum.is_backed());
    }

    #[test]
    fn test_load_json_file() {
        let mut file = tempfile::Builder::new()
            .suffix(".json")
            .tempfile()
            .expect("temp file");
        let document = serde_json::json!({
            "classes": [{
                "name": "Point",
                "properties": [{ "name": "x", "type": "float" }],
            }],
        });
        write!(file, "{}", document).expect("write");

        let registry = ClassRegistry::from_file(file.path()).expect("load json");
        assert_eq!(registry.len(), 1);
        assert!(registry.contains_class("Point"));
    }

    #[test]
    fn test_bad_type_reports_member() {
        let err = ClassRegistry::from_toml_str(
            r#"
[[classes]]
name = "Broken"
properties = [{ name = "x", type = "list<int" }]
"#,
        )
        .expect_err("bad type");
        let message = err.to_string();
        assert!(message.contains("Broken::x"), "{}", message);
    }

    #[test]
    fn test_unknown_discriminator_class_rejected() {
        let err = ClassRegistry::from_toml_str(
            r#"
[[classes]]
name = "Base"
discriminator = { property = "kind", mapping = { a = "Missing" } }
"#,
        )
        .expect_err("unknown mapped class");
        assert!(matches!(err, SchemaError::Invalid(_)));
    }
}
