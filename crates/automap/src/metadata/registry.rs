// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Metadata lookup.

use super::class::{ClassMetadata, EnumMetadata};
use crate::schema::SchemaError;
use std::collections::HashMap;
use std::sync::Arc;

/// Source of class and enum metadata.
///
/// The mapper only reads through this trait, so metadata may come from a
/// hand-built [`ClassRegistry`], a schema file, or generated code.
pub trait MetadataSource: Send + Sync {
    /// Look up a class by name.
    fn class(&self, name: &str) -> Option<Arc<ClassMetadata>>;

    /// Look up an enum by name.
    fn enumeration(&self, name: &str) -> Option<Arc<EnumMetadata>>;

    /// Inheritance chain from the class itself up to its root.
    ///
    /// Stops at the first unknown ancestor; callers that need the whole
    /// chain should validate it first.
    fn lineage(&self, name: &str) -> Vec<Arc<ClassMetadata>> {
        let mut chain: Vec<Arc<ClassMetadata>> = Vec::new();
        let mut current = self.class(name);
        while let Some(class) = current {
            if chain.iter().any(|c| c.name == class.name) {
                break;
            }
            current = class.parent.as_deref().and_then(|p| self.class(p));
            chain.push(class);
        }
        chain
    }

    /// Whether `class` is `ancestor` or inherits from it.
    fn is_subclass_of(&self, class: &str, ancestor: &str) -> bool {
        class == ancestor
            || self
                .lineage(class)
                .iter()
                .any(|c| c.name.as_ref() == ancestor)
    }
}

/// Simple [`HashMap`]-backed [`MetadataSource`].
#[derive(Debug, Default, Clone)]
pub struct ClassRegistry {
    classes: HashMap<Arc<str>, Arc<ClassMetadata>>,
    enums: HashMap<Arc<str>, Arc<EnumMetadata>>,
}

impl ClassRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a class, replacing any previous class of the same name.
    pub fn register(&mut self, class: ClassMetadata) -> &mut Self {
        self.classes.insert(class.name.clone(), Arc::new(class));
        self
    }

    /// Register an enum.
    pub fn register_enum(&mut self, enumeration: EnumMetadata) -> &mut Self {
        self.enums
            .insert(enumeration.name.clone(), Arc::new(enumeration));
        self
    }

    /// Builder-style registration.
    #[must_use]
    pub fn with_class(mut self, class: ClassMetadata) -> Self {
        self.register(class);
        self
    }

    /// Builder-style enum registration.
    #[must_use]
    pub fn with_enum(mut self, enumeration: EnumMetadata) -> Self {
        self.register_enum(enumeration);
        self
    }

    pub fn contains_class(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    pub fn contains_enum(&self, name: &str) -> bool {
        self.enums.contains_key(name)
    }

    /// Number of registered classes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Returns `true` if no classes are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Check cross references: parents exist, inheritance is acyclic,
    /// discriminator tables point at known subclasses and extra-property
    /// bags name declared members.
    pub fn validate(&self) -> Result<(), SchemaError> {
        self.check_references().map_err(SchemaError::Invalid)
    }

    fn check_references(&self) -> Result<(), String> {
        for class in self.classes.values() {
            let mut seen = vec![class.name.clone()];
            let mut parent = class.parent.clone();
            while let Some(name) = parent {
                let Some(next) = self.classes.get(&name) else {
                    return Err(format!(
                        "class '{}' extends unknown class '{}'",
                        class.name, name
                    ));
                };
                if seen.contains(&next.name) {
                    return Err(format!("class '{}' has cyclic inheritance", class.name));
                }
                seen.push(next.name.clone());
                parent = next.parent.clone();
            }

            if let Some(discriminator) = &class.discriminator {
                if discriminator.property.is_empty() {
                    return Err(format!(
                        "class '{}' has an empty discriminator property",
                        class.name
                    ));
                }
                for (value, mapped) in &discriminator.mapping {
                    if !self.contains_class(mapped) {
                        return Err(format!(
                            "discriminator value '{}' of '{}' maps to unknown class '{}'",
                            value, class.name, mapped
                        ));
                    }
                    if !self.is_subclass_of(mapped, &class.name) {
                        return Err(format!(
                            "discriminator value '{}' maps '{}' which does not extend '{}'",
                            value, mapped, class.name
                        ));
                    }
                }
            }

            if let Some(bag) = &class.extra_properties {
                let declared = self
                    .lineage(&class.name)
                    .iter()
                    .any(|c| c.property(bag).is_some());
                if !declared {
                    return Err(format!(
                        "class '{}' collects extra properties into unknown property '{}'",
                        class.name, bag
                    ));
                }
            }
        }
        Ok(())
    }
}

impl MetadataSource for ClassRegistry {
    fn class(&self, name: &str) -> Option<Arc<ClassMetadata>> {
        self.classes.get(name).cloned()
    }

    fn enumeration(&self, name: &str) -> Option<Arc<EnumMetadata>> {
        self.enums.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{ClassBuilder, Discriminator};
    use crate::types::TypeDescriptor;

    fn pets() -> ClassRegistry {
        ClassRegistry::new()
            .with_class(
                ClassBuilder::new("Pet")
                    .abstract_class()
                    .field("name", TypeDescriptor::string())
                    .discriminator(Discriminator::new("type").with("cat", "Cat"))
                    .build(),
            )
            .with_class(ClassBuilder::new("Cat").extends("Pet").build())
    }

    #[test]
    fn test_lineage_and_subclass() {
        let registry = pets();
        let chain: Vec<_> = registry
            .lineage("Cat")
            .iter()
            .map(|c| c.name.to_string())
            .collect();
        assert_eq!(chain, vec!["Cat", "Pet"]);
        assert!(registry.is_subclass_of("Cat", "Pet"));
        assert!(!registry.is_subclass_of("Pet", "Cat"));
        assert!(registry.validate().is_ok());
    }

    #[test]
    fn test_validate_unknown_parent() {
        let registry = ClassRegistry::new().with_class(ClassBuilder::new("A").extends("B").build());
        let err = registry.validate().expect_err("unknown parent");
        assert!(err.to_string().contains("unknown class 'B'"));
    }

    #[test]
    fn test_validate_discriminator_target() {
        let registry = pets().with_class(
            ClassBuilder::new("Zoo")
                .discriminator(Discriminator::new("kind").with("cat", "Cat"))
                .build(),
        );
        let err = registry.validate().expect_err("Cat does not extend Zoo");
        assert!(err.to_string().contains("does not extend 'Zoo'"));
    }

    #[test]
    fn test_validate_cyclic_inheritance() {
        let registry = ClassRegistry::new()
            .with_class(ClassBuilder::new("A").extends("B").build())
            .with_class(ClassBuilder::new("B").extends("A").build());
        assert!(registry.validate().is_err());
        assert_eq!(registry.lineage("A").len(), 2);
    }
}
