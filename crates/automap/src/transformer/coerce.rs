// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Scalar and enum coercion.
//!
//! Values already of the requested kind pass through unchanged, so a
//! coercion is safe to select when the source kind is only known at runtime.

use crate::error::{MapperError, Result};
use crate::metadata::{EnumMetadata, MetadataSource};
use crate::types::ScalarKind;
use crate::value::{EnumValue, Value};
use std::fmt;
use std::sync::Arc;

/// Target of a coercion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Coercion {
    Scalar(ScalarKind),
    /// Enum case, from a case, a backing value or a case name.
    Enum(Arc<str>),
}

impl fmt::Display for Coercion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(kind) => write!(f, "{}", kind),
            Self::Enum(name) => f.write_str(name),
        }
    }
}

/// Apply a coercion. `Null` passes through; nullability is checked by the
/// caller, which knows the member.
pub fn coerce(value: Value, coercion: &Coercion, metadata: &dyn MetadataSource) -> Result<Value> {
    if value.is_null() {
        return Ok(value);
    }
    match coercion {
        Coercion::Scalar(kind) => to_scalar(value, *kind, metadata),
        Coercion::Enum(name) => to_enum(value, name, metadata),
    }
}

/// Whether `coerce` would succeed.
pub fn can_coerce(value: &Value, coercion: &Coercion, metadata: &dyn MetadataSource) -> bool {
    coerce(value.clone(), coercion, metadata).is_ok()
}

fn to_scalar(value: Value, kind: ScalarKind, metadata: &dyn MetadataSource) -> Result<Value> {
    let value = match value {
        Value::Enum(case) => return enum_to_scalar(&case, kind, metadata),
        Value::Object(object) if kind == ScalarKind::String => {
            let class = object.class();
            let stringify = metadata.class(&class).and_then(|c| c.stringify.clone());
            return match stringify {
                Some(stringify) => Ok(Value::String(stringify.call(&object.read()))),
                None => Err(MapperError::IncompatibleValue {
                    expected: kind.to_string(),
                    value_kind: format!("{} object", class),
                }),
            };
        }
        other => other,
    };

    let coerced = match (kind, &value) {
        (ScalarKind::Int, Value::Int(_))
        | (ScalarKind::Float, Value::Float(_))
        | (ScalarKind::String, Value::String(_))
        | (ScalarKind::Bool, Value::Bool(_)) => return Ok(value),

        (ScalarKind::Int, Value::Float(f)) => float_to_int(*f).map(Value::Int),
        (ScalarKind::Int, Value::Bool(b)) => Some(Value::Int(i64::from(*b))),
        (ScalarKind::Int, Value::String(s)) => parse_int(s).map(Value::Int),

        (ScalarKind::Float, Value::Int(i)) => Some(Value::Float(*i as f64)),
        (ScalarKind::Float, Value::Bool(b)) => Some(Value::Float(if *b { 1.0 } else { 0.0 })),
        (ScalarKind::Float, Value::String(s)) => s.trim().parse::<f64>().ok().map(Value::Float),

        (ScalarKind::String, Value::Int(i)) => Some(Value::String(i.to_string())),
        (ScalarKind::String, Value::Float(f)) => Some(Value::String(f.to_string())),
        (ScalarKind::String, Value::Bool(b)) => Some(Value::String(b.to_string())),

        (ScalarKind::Bool, Value::Int(i)) => Some(Value::Bool(*i != 0)),
        (ScalarKind::Bool, Value::Float(f)) => Some(Value::Bool(*f != 0.0)),
        (ScalarKind::Bool, Value::String(s)) => match s.trim() {
            "1" | "true" => Some(Value::Bool(true)),
            "0" | "false" | "" => Some(Value::Bool(false)),
            _ => None,
        },

        _ => None,
    };

    match coerced {
        Some(result) => {
            tracing::trace!(from = value.kind_name(), to = %kind, "coerced scalar");
            Ok(result)
        }
        None => Err(MapperError::incompatible(kind, &value)),
    }
}

fn parse_int(input: &str) -> Option<i64> {
    let input = input.trim();
    if let Ok(i) = input.parse::<i64>() {
        return Some(i);
    }
    input.parse::<f64>().ok().and_then(float_to_int)
}

/// Integral floats inside the `i64` range; `i64::MAX as f64` rounds up to
/// 2^63, so the upper bound is exclusive.
fn float_to_int(f: f64) -> Option<i64> {
    if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

fn enum_to_scalar(
    case: &EnumValue,
    kind: ScalarKind,
    metadata: &dyn MetadataSource,
) -> Result<Value> {
    let enumeration = lookup_enum(&case.enum_name, metadata)?;
    let backing = enumeration
        .case(&case.case)
        .and_then(|c| c.backing.clone());
    match backing {
        Some(backing) => to_scalar(backing, kind, metadata),
        None if kind == ScalarKind::String => Ok(Value::String(case.case.to_string())),
        None => Err(MapperError::IncompatibleValue {
            expected: kind.to_string(),
            value_kind: format!("pure enum {}", case.enum_name),
        }),
    }
}

fn to_enum(value: Value, name: &Arc<str>, metadata: &dyn MetadataSource) -> Result<Value> {
    let enumeration = lookup_enum(name, metadata)?;

    if let Value::Enum(case) = &value {
        if case.enum_name == *name {
            return Ok(value);
        }
    }

    let case = match &value {
        Value::Enum(other) => enumeration.case(&other.case),
        Value::Int(i) => enumeration
            .case_by_backing(&value)
            .or_else(|| enumeration.case_by_backing(&Value::String(i.to_string()))),
        Value::String(s) => enumeration
            .case_by_backing(&value)
            .or_else(|| parse_int(s).and_then(|i| enumeration.case_by_backing(&Value::Int(i))))
            .or_else(|| enumeration.case(s)),
        _ => None,
    };

    match case {
        Some(case) => Ok(Value::Enum(EnumValue::new(name.clone(), case.name.clone()))),
        None => Err(MapperError::incompatible(name, &value)),
    }
}

fn lookup_enum(name: &str, metadata: &dyn MetadataSource) -> Result<Arc<EnumMetadata>> {
    metadata
        .enumeration(name)
        .ok_or_else(|| MapperError::UnknownEnum(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{ClassBuilder, ClassRegistry, EnumBuilder};
    use crate::value::Object;

    fn registry() -> ClassRegistry {
        ClassRegistry::new()
            .with_enum(
                EnumBuilder::new("Status")
                    .backed_case("Active", "active")
                    .backed_case("Banned", "banned")
                    .build(),
            )
            .with_enum(
                EnumBuilder::new("Level")
                    .backed_case("Low", 1)
                    .backed_case("High", 2)
                    .build(),
            )
            .with_enum(EnumBuilder::new("Suit").case("Hearts").case("Spades").build())
            .with_class(
                ClassBuilder::new("Money")
                    .field("amount", crate::types::TypeDescriptor::int())
                    .stringable(|o| {
                        let amount = o.get("amount").and_then(Value::as_i64).unwrap_or(0);
                        format!("{} EUR", amount)
                    })
                    .build(),
            )
    }

    fn scalar(value: impl Into<Value>, kind: ScalarKind) -> Result<Value> {
        coerce(value.into(), &Coercion::Scalar(kind), &registry())
    }

    #[test]
    fn test_numeric_strings() {
        assert_eq!(scalar("42", ScalarKind::Int).expect("int"), Value::Int(42));
        assert_eq!(scalar(" 42.0 ", ScalarKind::Int).expect("int"), Value::Int(42));
        assert_eq!(scalar("1.5", ScalarKind::Float).expect("float"), Value::Float(1.5));
        assert_eq!(scalar(7, ScalarKind::String).expect("string"), Value::from("7"));
        assert_eq!(scalar(2.5, ScalarKind::String).expect("string"), Value::from("2.5"));
        assert!(matches!(
            scalar("4.2", ScalarKind::Int),
            Err(MapperError::IncompatibleValue { .. })
        ));
        assert!(scalar("abc", ScalarKind::Float).is_err());
    }

    #[test]
    fn test_out_of_range_int_is_incompatible() {
        for value in [
            Value::from("1e30"),
            Value::Float(1e19),
            Value::from("9223372036854775808"),
            Value::Float(-1e19),
        ] {
            assert!(
                matches!(
                    scalar(value.clone(), ScalarKind::Int),
                    Err(MapperError::IncompatibleValue { .. })
                ),
                "{value:?}"
            );
        }
        assert_eq!(
            scalar("9223372036854775807", ScalarKind::Int).expect("max"),
            Value::Int(i64::MAX)
        );
        assert_eq!(
            scalar(-4e18, ScalarKind::Int).expect("in range"),
            Value::Int(-4_000_000_000_000_000_000)
        );
    }

    #[test]
    fn test_bool_conversions() {
        assert_eq!(scalar("true", ScalarKind::Bool).expect("bool"), Value::Bool(true));
        assert_eq!(scalar("", ScalarKind::Bool).expect("bool"), Value::Bool(false));
        assert_eq!(scalar(0, ScalarKind::Bool).expect("bool"), Value::Bool(false));
        assert_eq!(scalar(true, ScalarKind::Int).expect("int"), Value::Int(1));
        assert!(scalar("maybe", ScalarKind::Bool).is_err());
    }

    #[test]
    fn test_null_and_identity_pass_through() {
        assert_eq!(scalar(Value::Null, ScalarKind::Int).expect("null"), Value::Null);
        assert_eq!(scalar(5, ScalarKind::Int).expect("same"), Value::Int(5));
    }

    #[test]
    fn test_enum_from_backing_and_name() {
        let reg = registry();
        let status = Coercion::Enum("Status".into());
        assert_eq!(
            coerce(Value::from("banned"), &status, &reg).expect("backing"),
            Value::Enum(EnumValue::new("Status", "Banned"))
        );
        assert_eq!(
            coerce(Value::from("Active"), &status, &reg).expect("case name"),
            Value::Enum(EnumValue::new("Status", "Active"))
        );

        let level = Coercion::Enum("Level".into());
        assert_eq!(
            coerce(Value::from("2"), &level, &reg).expect("numeric string"),
            Value::Enum(EnumValue::new("Level", "High"))
        );
        assert!(coerce(Value::from("pending"), &status, &reg).is_err());
        assert!(matches!(
            coerce(Value::from("x"), &Coercion::Enum("Nope".into()), &reg),
            Err(MapperError::UnknownEnum(_))
        ));
    }

    #[test]
    fn test_enum_to_scalar() {
        let reg = registry();
        let banned = Value::Enum(EnumValue::new("Status", "Banned"));
        assert_eq!(
            coerce(banned, &Coercion::Scalar(ScalarKind::String), &reg).expect("backing"),
            Value::from("banned")
        );

        let hearts = Value::Enum(EnumValue::new("Suit", "Hearts"));
        assert_eq!(
            coerce(hearts.clone(), &Coercion::Scalar(ScalarKind::String), &reg).expect("name"),
            Value::from("Hearts")
        );
        assert!(coerce(hearts, &Coercion::Scalar(ScalarKind::Int), &reg).is_err());
    }

    #[test]
    fn test_stringable_object() {
        let reg = registry();
        let money = Value::object(Object::new("Money").with_field("amount", 12));
        assert_eq!(
            coerce(money, &Coercion::Scalar(ScalarKind::String), &reg).expect("stringable"),
            Value::from("12 EUR")
        );

        let plain = Value::object(Object::new("Other"));
        assert!(!can_coerce(&plain, &Coercion::Scalar(ScalarKind::String), &reg));
    }
}
