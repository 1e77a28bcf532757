// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type descriptors for members and plan signatures.

use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Scalar kinds a value can be coerced between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Bool,
    Int,
    Float,
    String,
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::String => "string",
        };
        f.write_str(name)
    }
}

/// Type kind enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// Scalar type.
    Scalar(ScalarKind),
    /// Any value; the runtime shape decides.
    Mixed,
    /// Ordered container with element type.
    List(Box<TypeDescriptor>),
    /// String-keyed container with element type.
    Map(Box<TypeDescriptor>),
    /// Registered class.
    Object(Arc<str>),
    /// Registered enum.
    Enum(Arc<str>),
    /// One of several candidates.
    Union(Vec<TypeDescriptor>),
}

/// A complete type descriptor: kind plus nullability.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeDescriptor {
    pub kind: TypeKind,
    pub nullable: bool,
}

impl TypeDescriptor {
    /// Create a non-nullable descriptor.
    pub fn new(kind: TypeKind) -> Self {
        Self {
            kind,
            nullable: false,
        }
    }

    pub fn bool() -> Self {
        Self::new(TypeKind::Scalar(ScalarKind::Bool))
    }

    pub fn int() -> Self {
        Self::new(TypeKind::Scalar(ScalarKind::Int))
    }

    pub fn float() -> Self {
        Self::new(TypeKind::Scalar(ScalarKind::Float))
    }

    pub fn string() -> Self {
        Self::new(TypeKind::Scalar(ScalarKind::String))
    }

    /// `mixed` is always nullable.
    pub fn mixed() -> Self {
        Self {
            kind: TypeKind::Mixed,
            nullable: true,
        }
    }

    /// List of `element`.
    pub fn list(element: TypeDescriptor) -> Self {
        Self::new(TypeKind::List(Box::new(element)))
    }

    /// Map of `element`.
    pub fn map(element: TypeDescriptor) -> Self {
        Self::new(TypeKind::Map(Box::new(element)))
    }

    /// Instance of a registered class.
    pub fn object(class: impl Into<Arc<str>>) -> Self {
        Self::new(TypeKind::Object(class.into()))
    }

    /// Case of a registered enum.
    pub fn enumeration(name: impl Into<Arc<str>>) -> Self {
        Self::new(TypeKind::Enum(name.into()))
    }

    /// Union of candidates. A nullable candidate makes the union nullable.
    pub fn union(candidates: Vec<TypeDescriptor>) -> Self {
        let nullable = candidates.iter().any(|c| c.nullable);
        Self {
            kind: TypeKind::Union(candidates),
            nullable,
        }
    }

    /// Mark as nullable.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Scalar kind, if scalar.
    pub fn scalar(&self) -> Option<ScalarKind> {
        match self.kind {
            TypeKind::Scalar(kind) => Some(kind),
            _ => None,
        }
    }

    /// Class name, if an object type.
    pub fn class_name(&self) -> Option<&Arc<str>> {
        match &self.kind {
            TypeKind::Object(name) => Some(name),
            _ => None,
        }
    }

    /// Element type of a list or map.
    pub fn element(&self) -> Option<&TypeDescriptor> {
        match &self.kind {
            TypeKind::List(e) | TypeKind::Map(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_mixed(&self) -> bool {
        matches!(self.kind, TypeKind::Mixed)
    }

    pub fn is_container(&self) -> bool {
        matches!(self.kind, TypeKind::List(_) | TypeKind::Map(_))
    }

    /// Same kind, ignoring nullability.
    pub fn same_kind(&self, other: &TypeDescriptor) -> bool {
        self.kind == other.kind
    }

    /// Parse the textual form: `int`, `?string`, `list<Address>`,
    /// `map<int>`, `Tag[]`, `Cat|Dog|null`, `mixed`.
    ///
    /// Key/value hints such as `array<string, Address>` are accepted; the
    /// key must be `int` or `string` and does not change the container.
    pub fn parse(input: &str) -> Result<Self, ParseTypeError> {
        let text = input.trim();
        if text.is_empty() {
            return Err(ParseTypeError::new(input, "empty type"));
        }
        if let Some(rest) = text.strip_prefix('?') {
            return Ok(Self::parse(rest)?.nullable());
        }

        let parts = split_top_level(text, '|');
        if parts.len() > 1 {
            let mut candidates = Vec::new();
            let mut nullable = false;
            for part in parts {
                if part.trim() == "null" {
                    nullable = true;
                } else {
                    candidates.push(Self::parse(part)?);
                }
            }
            let mut descriptor = match candidates.len() {
                0 => return Err(ParseTypeError::new(input, "union of null only")),
                1 => candidates.remove(0),
                _ => Self::union(candidates),
            };
            descriptor.nullable |= nullable;
            return Ok(descriptor);
        }

        if let Some(inner) = text.strip_suffix("[]") {
            return Ok(Self::list(Self::parse(inner)?));
        }

        if let Some(open) = text.find('<') {
            let inner = text[open + 1..]
                .strip_suffix('>')
                .ok_or_else(|| ParseTypeError::new(input, "unterminated '<'"))?;
            let element = match split_top_level(inner, ',').as_slice() {
                [value] => Self::parse(value)?,
                [key, value] => {
                    let key = Self::parse(key)?;
                    let keyable =
                        matches!(key.scalar(), Some(ScalarKind::Int | ScalarKind::String));
                    if key.nullable || !keyable {
                        return Err(ParseTypeError::new(
                            input,
                            "container key must be int or string",
                        ));
                    }
                    Self::parse(value)?
                }
                _ => return Err(ParseTypeError::new(input, "too many type arguments")),
            };
            return match &text[..open] {
                "list" | "array" => Ok(Self::list(element)),
                "map" => Ok(Self::map(element)),
                other => Err(ParseTypeError::new(
                    input,
                    format!("unknown container '{}'", other),
                )),
            };
        }

        Ok(match text {
            "bool" | "boolean" => Self::bool(),
            "int" | "integer" => Self::int(),
            "float" | "double" => Self::float(),
            "string" => Self::string(),
            "mixed" => Self::mixed(),
            "array" | "list" => Self::list(Self::mixed()),
            "map" => Self::map(Self::mixed()),
            "null" => return Err(ParseTypeError::new(input, "bare null type")),
            name if is_identifier(name) => Self::object(name),
            _ => return Err(ParseTypeError::new(input, "invalid type name")),
        })
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let is_union = matches!(self.kind, TypeKind::Union(_));
        if self.nullable && !self.is_mixed() && !is_union {
            f.write_str("?")?;
        }
        match &self.kind {
            TypeKind::Scalar(kind) => write!(f, "{}", kind),
            TypeKind::Mixed => f.write_str("mixed"),
            TypeKind::List(e) => write!(f, "list<{}>", e),
            TypeKind::Map(e) => write!(f, "map<{}>", e),
            TypeKind::Object(name) | TypeKind::Enum(name) => f.write_str(name),
            TypeKind::Union(candidates) => {
                for (i, c) in candidates.iter().enumerate() {
                    if i > 0 {
                        f.write_str("|")?;
                    }
                    write!(f, "{}", c)?;
                }
                if self.nullable {
                    f.write_str("|null")?;
                }
                Ok(())
            }
        }
    }
}

/// Member type: statically known, or decided from the runtime value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MemberType {
    Typed(TypeDescriptor),
    Dynamic,
}

impl MemberType {
    /// Static descriptor, if any.
    pub fn descriptor(&self) -> Option<&TypeDescriptor> {
        match self {
            Self::Typed(t) => Some(t),
            Self::Dynamic => None,
        }
    }

    /// Dynamic members accept null.
    pub fn is_nullable(&self) -> bool {
        match self {
            Self::Typed(t) => t.nullable,
            Self::Dynamic => true,
        }
    }
}

impl From<Option<TypeDescriptor>> for MemberType {
    fn from(ty: Option<TypeDescriptor>) -> Self {
        ty.map(Self::Typed).unwrap_or(Self::Dynamic)
    }
}

impl fmt::Display for MemberType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Typed(t) => write!(f, "{}", t),
            Self::Dynamic => f.write_str("<dynamic>"),
        }
    }
}

/// Error parsing the textual type form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid type '{input}': {reason}")]
pub struct ParseTypeError {
    pub input: String,
    pub reason: String,
}

impl ParseTypeError {
    fn new(input: &str, reason: impl Into<String>) -> Self {
        Self {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

fn split_top_level(text: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            c if c == separator && depth == 0 => {
                parts.push(&text[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_' || c == '\\')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '\\' || c == ':')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scalars() {
        assert_eq!(TypeDescriptor::parse("int"), Ok(TypeDescriptor::int()));
        assert_eq!(
            TypeDescriptor::parse("?string"),
            Ok(TypeDescriptor::string().nullable())
        );
        assert!(TypeDescriptor::parse("mixed").expect("mixed").nullable);
    }

    #[test]
    fn test_parse_containers() {
        assert_eq!(
            TypeDescriptor::parse("list<Address>"),
            Ok(TypeDescriptor::list(TypeDescriptor::object("Address")))
        );
        assert_eq!(
            TypeDescriptor::parse("Tag[]"),
            Ok(TypeDescriptor::list(TypeDescriptor::object("Tag")))
        );
        assert_eq!(
            TypeDescriptor::parse("map<list<int>>"),
            Ok(TypeDescriptor::map(TypeDescriptor::list(TypeDescriptor::int())))
        );
        assert_eq!(
            TypeDescriptor::parse("array"),
            Ok(TypeDescriptor::list(TypeDescriptor::mixed()))
        );
    }

    #[test]
    fn test_parse_key_value_hints() {
        assert_eq!(
            TypeDescriptor::parse("array<string, Foo>"),
            Ok(TypeDescriptor::list(TypeDescriptor::object("Foo")))
        );
        assert_eq!(
            TypeDescriptor::parse("map<int, list<?string>>"),
            Ok(TypeDescriptor::map(TypeDescriptor::list(
                TypeDescriptor::string().nullable()
            )))
        );
        assert_eq!(
            TypeDescriptor::parse("array<int, Cat|Dog>"),
            Ok(TypeDescriptor::list(TypeDescriptor::union(vec![
                TypeDescriptor::object("Cat"),
                TypeDescriptor::object("Dog"),
            ])))
        );
        assert!(TypeDescriptor::parse("array<Foo, Bar>").is_err());
        assert!(TypeDescriptor::parse("array<int, string, Foo>").is_err());
    }

    #[test]
    fn test_parse_union() {
        let ty = TypeDescriptor::parse("Cat|Dog|null").expect("union");
        assert!(ty.nullable);
        match &ty.kind {
            TypeKind::Union(c) => assert_eq!(c.len(), 2),
            other => panic!("expected union, got {:?}", other),
        }
        assert_eq!(ty.to_string(), "Cat|Dog|null");

        let single = TypeDescriptor::parse("int|null").expect("nullable int");
        assert_eq!(single, TypeDescriptor::int().nullable());
    }

    #[test]
    fn test_parse_errors() {
        assert!(TypeDescriptor::parse("").is_err());
        assert!(TypeDescriptor::parse("list<int").is_err());
        assert!(TypeDescriptor::parse("set<int>").is_err());
        assert!(TypeDescriptor::parse("1abc").is_err());
    }

    #[test]
    fn test_display_round_trip() {
        for text in ["int", "?float", "list<?User>", "map<string>", "mixed"] {
            let ty = TypeDescriptor::parse(text).expect("parse");
            assert_eq!(ty.to_string(), text);
        }
    }
}
