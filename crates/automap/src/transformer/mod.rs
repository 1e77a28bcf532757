// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Transformer selection.
//!
//! A [`Transformer`] describes how one matched value is converted into the
//! shape the target member requires. Selection happens once, at plan
//! compilation; nested and collection transformers recurse through the
//! executor at mapping time.
//!
//! Decision order (first match wins):
//!
//! | Condition                                     | Transformer     |
//! |-----------------------------------------------|-----------------|
//! | named or auto-selected custom transformer     | `Custom`        |
//! | target is a list/map of `E`                   | `Collection`    |
//! | target class carries a discriminator table    | `Discriminated` |
//! | target is a class                             | `Nested`        |
//! | target is a union                             | `Union`         |
//! | scalar or enum with a different source kind   | `Coerce`        |
//! | identical or mixed type                       | `Identity`      |

pub mod coerce;
mod custom;

pub use coerce::Coercion;
pub use custom::{CustomTransformer, NamedTransformer, TransformerRegistry};

use crate::error::{MapperError, Result};
use crate::metadata::MetadataSource;
use crate::plan::Signature;
use crate::types::{MemberType, TypeDescriptor, TypeKind};
use std::sync::Arc;

/// Container shape produced by a [`Transformer::Collection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKind {
    List,
    Map,
}

/// One candidate of a union.
#[derive(Debug, Clone)]
pub struct UnionCandidate {
    pub ty: TypeDescriptor,
    pub transformer: Transformer,
}

/// Value transformation strategy of a mapping pair.
#[derive(Debug, Clone)]
pub enum Transformer {
    /// Copy the value as is.
    Identity,
    Coerce(Coercion),
    /// Element-wise transformation.
    Collection {
        kind: CollectionKind,
        element: Box<Transformer>,
    },
    /// Pick the concrete class from a discriminator, then map into it.
    Discriminated(Arc<str>),
    /// Map through the plan for (runtime source signature, this target).
    /// Resolved from the plan cache at execution time, so recursive types
    /// never recurse at compile time.
    Nested(Signature),
    /// First candidate compatible with the runtime value.
    Union {
        name: String,
        nullable: bool,
        candidates: Vec<UnionCandidate>,
    },
    Custom(NamedTransformer),
    /// Turn objects into maps and enums into their backing values.
    Normalize,
}

impl Transformer {
    /// Short label for diagnostics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Identity => "identity",
            Self::Coerce(_) => "coerce",
            Self::Collection { .. } => "collection",
            Self::Discriminated(_) => "discriminated",
            Self::Nested(_) => "nested",
            Self::Union { .. } => "union",
            Self::Custom(_) => "custom",
            Self::Normalize => "normalize",
        }
    }

    pub fn is_identity(&self) -> bool {
        matches!(self, Self::Identity)
    }
}

/// Chooses transformers for matched pairs.
pub struct TransformerSelector<'a> {
    metadata: &'a dyn MetadataSource,
    transformers: &'a TransformerRegistry,
}

impl<'a> TransformerSelector<'a> {
    pub fn new(metadata: &'a dyn MetadataSource, transformers: &'a TransformerRegistry) -> Self {
        Self {
            metadata,
            transformers,
        }
    }

    /// Select the transformer for a pair writing into a class member.
    pub fn select(
        &self,
        source: &MemberType,
        target: &MemberType,
        custom: Option<&str>,
    ) -> Result<Transformer> {
        if let Some(custom) = self.custom(source, target, custom)? {
            return Ok(custom);
        }
        match target {
            MemberType::Dynamic => Ok(Transformer::Identity),
            MemberType::Typed(ty) => self.select_typed(source.descriptor(), ty),
        }
    }

    /// Select the transformer for a pair writing into a map key.
    pub fn select_normalized(
        &self,
        source: &MemberType,
        custom: Option<&str>,
    ) -> Result<Transformer> {
        let target = MemberType::Dynamic;
        if let Some(custom) = self.custom(source, &target, custom)? {
            return Ok(custom);
        }
        let plain = source.descriptor().is_some_and(|t| {
            t.scalar().is_some()
                || matches!(&t.kind, TypeKind::List(e) | TypeKind::Map(e) if e.scalar().is_some())
        });
        Ok(if plain {
            Transformer::Identity
        } else {
            Transformer::Normalize
        })
    }

    fn custom(
        &self,
        source: &MemberType,
        target: &MemberType,
        name: Option<&str>,
    ) -> Result<Option<Transformer>> {
        if let Some(name) = name {
            return self
                .transformers
                .get(name)
                .map(|t| Some(Transformer::Custom(t)))
                .ok_or_else(|| MapperError::UnknownTransformer(name.to_string()));
        }
        Ok(self
            .transformers
            .find_supporting(source, target)
            .map(Transformer::Custom))
    }

    fn select_typed(
        &self,
        source: Option<&TypeDescriptor>,
        target: &TypeDescriptor,
    ) -> Result<Transformer> {
        if let Some(source) = source {
            if source.kind == target.kind && is_plain(target) {
                return Ok(Transformer::Identity);
            }
        }

        match &target.kind {
            TypeKind::List(element) | TypeKind::Map(element) => {
                let kind = if matches!(target.kind, TypeKind::List(_)) {
                    CollectionKind::List
                } else {
                    CollectionKind::Map
                };
                let source_element: MemberType = source.and_then(|s| s.element()).cloned().into();
                let target_element = MemberType::Typed((**element).clone());
                let element = self.select(&source_element, &target_element, None)?;
                Ok(Transformer::Collection {
                    kind,
                    element: Box::new(element),
                })
            }
            TypeKind::Object(class) => {
                let metadata = self
                    .metadata
                    .class(class)
                    .ok_or_else(|| MapperError::UnknownClass(class.to_string()))?;
                if metadata.discriminator.is_some() {
                    Ok(Transformer::Discriminated(class.clone()))
                } else {
                    Ok(Transformer::Nested(Signature::Class(class.clone())))
                }
            }
            TypeKind::Union(candidates) => {
                let candidates = candidates
                    .iter()
                    .map(|ty| {
                        let transformer = self.select_typed(None, ty)?;
                        Ok(UnionCandidate {
                            ty: ty.clone(),
                            transformer,
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(Transformer::Union {
                    name: target.to_string(),
                    nullable: target.nullable,
                    candidates,
                })
            }
            TypeKind::Scalar(kind) => Ok(Transformer::Coerce(Coercion::Scalar(*kind))),
            TypeKind::Enum(name) => {
                if self.metadata.enumeration(name).is_none() {
                    return Err(MapperError::UnknownEnum(name.to_string()));
                }
                Ok(Transformer::Coerce(Coercion::Enum(name.clone())))
            }
            TypeKind::Mixed => Ok(Transformer::Identity),
        }
    }
}

/// Types whose values can be copied when source and target agree.
fn is_plain(ty: &TypeDescriptor) -> bool {
    match &ty.kind {
        TypeKind::Scalar(_) | TypeKind::Enum(_) | TypeKind::Mixed => true,
        TypeKind::List(e) | TypeKind::Map(e) => {
            e.scalar().is_some() || matches!(e.kind, TypeKind::Enum(_))
        }
        TypeKind::Object(_) | TypeKind::Union(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BoxError;
    use crate::metadata::{ClassBuilder, ClassRegistry, Discriminator, EnumBuilder};
    use crate::types::ScalarKind;
    use crate::value::{ObjectRef, Value};

    fn registry() -> ClassRegistry {
        ClassRegistry::new()
            .with_class(
                ClassBuilder::new("Address")
                    .field("city", TypeDescriptor::string())
                    .build(),
            )
            .with_class(
                ClassBuilder::new("Pet")
                    .abstract_class()
                    .discriminator(Discriminator::new("type").with("cat", "Cat"))
                    .build(),
            )
            .with_class(ClassBuilder::new("Cat").extends("Pet").build())
            .with_enum(EnumBuilder::new("Status").backed_case("On", "on").build())
    }

    fn typed(ty: TypeDescriptor) -> MemberType {
        MemberType::Typed(ty)
    }

    #[test]
    fn test_decision_table() {
        let reg = registry();
        let transformers = TransformerRegistry::new();
        let selector = TransformerSelector::new(&reg, &transformers);

        let pick = |s: MemberType, t: MemberType| selector.select(&s, &t, None).expect("select");

        assert!(pick(typed(TypeDescriptor::int()), typed(TypeDescriptor::int())).is_identity());
        assert!(matches!(
            pick(typed(TypeDescriptor::string()), typed(TypeDescriptor::int())),
            Transformer::Coerce(Coercion::Scalar(ScalarKind::Int))
        ));
        assert!(matches!(
            pick(MemberType::Dynamic, typed(TypeDescriptor::object("Address"))),
            Transformer::Nested(Signature::Class(c)) if c.as_ref() == "Address"
        ));
        assert!(matches!(
            pick(MemberType::Dynamic, typed(TypeDescriptor::object("Pet"))),
            Transformer::Discriminated(c) if c.as_ref() == "Pet"
        ));
        assert!(matches!(
            pick(typed(TypeDescriptor::string()), typed(TypeDescriptor::enumeration("Status"))),
            Transformer::Coerce(Coercion::Enum(_))
        ));
        assert!(pick(typed(TypeDescriptor::int()), MemberType::Dynamic).is_identity());
    }

    #[test]
    fn test_collection_of_objects() {
        let reg = registry();
        let transformers = TransformerRegistry::new();
        let selector = TransformerSelector::new(&reg, &transformers);

        let t = selector
            .select(
                &MemberType::Dynamic,
                &typed(TypeDescriptor::list(TypeDescriptor::object("Address"))),
                None,
            )
            .expect("select");
        match t {
            Transformer::Collection { kind, element } => {
                assert_eq!(kind, CollectionKind::List);
                assert!(matches!(*element, Transformer::Nested(_)));
            }
            other => panic!("unexpected transformer {:?}", other),
        }

        let same = selector
            .select(
                &typed(TypeDescriptor::list(TypeDescriptor::int())),
                &typed(TypeDescriptor::list(TypeDescriptor::int())),
                None,
            )
            .expect("select");
        assert!(same.is_identity());
    }

    #[test]
    fn test_union_candidates() {
        let reg = registry();
        let transformers = TransformerRegistry::new();
        let selector = TransformerSelector::new(&reg, &transformers);

        let union = TypeDescriptor::union(vec![
            TypeDescriptor::object("Address"),
            TypeDescriptor::int(),
        ]);
        match selector.select(&MemberType::Dynamic, &typed(union), None).expect("select") {
            Transformer::Union { candidates, nullable, .. } => {
                assert!(!nullable);
                assert_eq!(candidates.len(), 2);
                assert!(matches!(candidates[0].transformer, Transformer::Nested(_)));
            }
            other => panic!("unexpected transformer {:?}", other),
        }
    }

    #[test]
    fn test_custom_wins_and_unknown_fails() {
        let reg = registry();
        let mut transformers = TransformerRegistry::new();
        transformers.register("id", |v: Value, _: &Value, _: Option<&ObjectRef>| {
            Ok::<_, BoxError>(v)
        });
        let selector = TransformerSelector::new(&reg, &transformers);

        let int = typed(TypeDescriptor::int());
        assert!(matches!(
            selector.select(&int, &int, Some("id")).expect("custom"),
            Transformer::Custom(t) if t.name == "id"
        ));
        assert!(matches!(
            selector.select(&int, &int, Some("missing")),
            Err(MapperError::UnknownTransformer(_))
        ));
        assert!(matches!(
            selector.select(&int, &typed(TypeDescriptor::object("Ghost")), None),
            Err(MapperError::UnknownClass(_))
        ));
    }

    #[test]
    fn test_normalized_selection() {
        let reg = registry();
        let transformers = TransformerRegistry::new();
        let selector = TransformerSelector::new(&reg, &transformers);

        assert!(selector
            .select_normalized(&typed(TypeDescriptor::string()), None)
            .expect("select")
            .is_identity());
        assert!(matches!(
            selector
                .select_normalized(&typed(TypeDescriptor::object("Address")), None)
                .expect("select"),
            Transformer::Normalize
        ));
        assert!(matches!(
            selector.select_normalized(&MemberType::Dynamic, None).expect("select"),
            Transformer::Normalize
        ));
    }
}
