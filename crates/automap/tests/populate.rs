// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Existing-target population, groups, providers and extra properties.

use automap::metadata::{
    ClassBuilder, ClassRegistry, ConstructorParam, MapFrom, PropertyMetadata,
};
use automap::{
    AutoMapper, BoxError, ExecutionContext, MapOptions, MapperError, Object, ObjectRef,
    TypeDescriptor, Value,
};
use std::sync::Arc;

fn registry() -> ClassRegistry {
    ClassRegistry::new()
        .with_class(
            ClassBuilder::new("Contact")
                .field("name", TypeDescriptor::string())
                .field("email", TypeDescriptor::string().nullable())
                .build(),
        )
        .with_class(
            ClassBuilder::new("Order")
                .field("reference", TypeDescriptor::string())
                .field("customer", TypeDescriptor::object("Contact"))
                .build(),
        )
        .with_class(
            ClassBuilder::new("Badge")
                .promoted_readonly(ConstructorParam::new("code", TypeDescriptor::string()))
                .field("label", TypeDescriptor::string())
                .build(),
        )
        .with_class(
            ClassBuilder::new("Profile")
                .field("name", TypeDescriptor::string())
                .property(
                    PropertyMetadata::new("email", TypeDescriptor::string()).groups(["private"]),
                )
                .property(
                    PropertyMetadata::new("notes", TypeDescriptor::string()).groups(["admin"]),
                )
                .property(
                    PropertyMetadata::new("nickname", TypeDescriptor::string())
                        .groups(["admin"])
                        .map_from(MapFrom::default().groups(["public"])),
                )
                .property(
                    PropertyMetadata::new("motto", TypeDescriptor::string().nullable())
                        .map_from(MapFrom::property("quote").when(|source| {
                            source.get_field("public").and_then(|p| p.as_bool()) == Some(true)
                        })),
                )
                .build(),
        )
        .with_class(
            ClassBuilder::new("Account")
                .provider("accounts")
                .field("id", TypeDescriptor::int())
                .field("owner", TypeDescriptor::string())
                .build(),
        )
        .with_class(
            ClassBuilder::new("Ident")
                .promoted(ConstructorParam::new("id", TypeDescriptor::int().nullable()))
                .promoted(
                    ConstructorParam::new("label", TypeDescriptor::string()).with_default("none"),
                )
                .build(),
        )
        .with_class(
            ClassBuilder::new("Settings")
                .field("theme", TypeDescriptor::string())
                .extra_properties("extra")
                .build(),
        )
}

fn mapper() -> AutoMapper {
    AutoMapper::new(Arc::new(registry()))
}

fn contact(name: &str, email: &str) -> ObjectRef {
    ObjectRef::new(
        Object::new("Contact")
            .with_field("name", name)
            .with_field("email", email),
    )
}

#[test]
fn test_existing_target_is_updated_in_place() {
    let target = contact("Ada", "ada@old");
    let source = Value::map([("email", "ada@new")]);

    let out = mapper()
        .map_into(&source, &target, &MapOptions::default())
        .expect("populated");
    assert!(out.ptr_eq(&target));
    assert_eq!(target.get("email"), Some(Value::from("ada@new")));
    assert_eq!(target.get("name"), Some(Value::from("Ada")));
}

#[test]
fn test_skip_null_values_keeps_existing() {
    let target = contact("Ada", "ada@old");
    let source = Value::map([("name", Value::Null), ("email", Value::from("a@b"))]);

    mapper()
        .map(&source, &target, &MapOptions::new().skip_null_values(true))
        .expect("nulls skipped");
    assert_eq!(target.get("name"), Some(Value::from("Ada")));
    assert_eq!(target.get("email"), Some(Value::from("a@b")));

    let err = mapper()
        .map(&source, &target, &MapOptions::default())
        .unwrap_err();
    assert!(
        matches!(&err, MapperError::NullNotAllowed { member, .. } if member == "name"),
        "{err}"
    );
}

#[test]
fn test_nullable_member_accepts_null() {
    let target = contact("Ada", "ada@old");
    mapper()
        .map(&Value::map([("email", Value::Null)]), &target, &MapOptions::default())
        .expect("nullable");
    assert_eq!(target.get("email"), Some(Value::Null));
}

#[test]
fn test_deep_populate_reuses_nested_instance() {
    let customer = contact("Ada", "ada@old");
    let order = ObjectRef::new(
        Object::new("Order")
            .with_field("reference", "A-1")
            .with_field("customer", customer.clone()),
    );
    let source = Value::map([
        ("reference", Value::from("A-2")),
        ("customer", Value::map([("email", "ada@new")])),
    ]);

    mapper()
        .map(&source, &order, &MapOptions::new().deep_populate(true))
        .expect("deep");
    let nested = order.get("customer").expect("customer");
    assert!(nested.same_instance(&Value::Object(customer.clone())));
    assert_eq!(customer.get("email"), Some(Value::from("ada@new")));
    assert_eq!(customer.get("name"), Some(Value::from("Ada")));

    // Without deep population the nested instance is replaced.
    mapper()
        .map(
            &Value::map([
                ("customer", Value::map([("name", Value::from("Bob"))])),
            ]),
            &order,
            &MapOptions::default(),
        )
        .expect("shallow");
    let replaced = order.get("customer").expect("customer");
    assert!(!replaced.same_instance(&Value::Object(customer)));
    assert_eq!(replaced.get_field("name"), Some(Value::from("Bob")));
}

#[test]
fn test_readonly_member_of_existing_target() {
    let mapper = mapper();
    let badge = mapper
        .map(&Value::map([("code", "A"), ("label", "first")]), "Badge", &MapOptions::default())
        .expect("badge");
    let badge = badge.as_object().cloned().expect("object");

    // Shallow population leaves read-only members alone.
    mapper
        .map(&Value::map([("code", "B"), ("label", "second")]), &badge, &MapOptions::default())
        .expect("shallow");
    assert_eq!(badge.get("code"), Some(Value::from("A")));
    assert_eq!(badge.get("label"), Some(Value::from("second")));

    // Deep population accepts an unchanged value and rejects a new one.
    mapper
        .map(&Value::map([("code", "A")]), &badge, &MapOptions::new().deep_populate(true))
        .expect("unchanged");
    let err = mapper
        .map(&Value::map([("code", "B")]), &badge, &MapOptions::new().deep_populate(true))
        .unwrap_err();
    assert!(
        matches!(&err, MapperError::ReadOnlyTargetViolation { member, .. } if member == "code"),
        "{err}"
    );

    let permissive = AutoMapper::builder(Arc::new(registry()))
        .allow_readonly_target_to_populate(true)
        .build()
        .expect("mapper");
    permissive
        .map(&Value::map([("code", "C")]), &badge, &MapOptions::default())
        .expect("allowed");
    assert_eq!(badge.get("code"), Some(Value::from("C")));
}

#[test]
fn test_groups_filter_members() {
    let mapper = mapper();
    let source = Value::map([
        ("name", "Ada"),
        ("email", "ada@x"),
        ("notes", "vip"),
        ("nickname", "countess"),
    ]);

    let all = mapper
        .map(&source, "Profile", &MapOptions::default())
        .expect("no groups");
    assert_eq!(all.get_field("notes"), Some(Value::from("vip")));

    let private = mapper
        .map(&source, "Profile", &MapOptions::new().groups(["private"]))
        .expect("private");
    assert_eq!(private.get_field("name"), Some(Value::from("Ada")));
    assert_eq!(private.get_field("email"), Some(Value::from("ada@x")));
    assert_eq!(private.get_field("notes"), None);
    assert_eq!(private.get_field("nickname"), None);

    // The directive's groups replace the member's own.
    let public = mapper
        .map(&source, "Profile", &MapOptions::new().groups(["public"]))
        .expect("public");
    assert_eq!(public.get_field("nickname"), Some(Value::from("countess")));
    assert_eq!(public.get_field("email"), None);

    let admin = mapper
        .map(&source, "Profile", &MapOptions::new().groups(["admin"]))
        .expect("admin");
    assert_eq!(admin.get_field("notes"), Some(Value::from("vip")));
    assert_eq!(admin.get_field("nickname"), None);
}

#[test]
fn test_conditional_directive() {
    let mapper = mapper();
    let shown = mapper
        .map(
            &Value::map([("quote", Value::from("carpe diem")), ("public", Value::from(true))]),
            "Profile",
            &MapOptions::default(),
        )
        .expect("shown");
    assert_eq!(shown.get_field("motto"), Some(Value::from("carpe diem")));

    let hidden = mapper
        .map(&Value::map([("quote", "carpe diem")]), "Profile", &MapOptions::default())
        .expect("hidden");
    assert_eq!(hidden.get_field("motto"), None);
}

#[test]
fn test_provider_supplies_existing_instance() {
    let stored = ObjectRef::new(
        Object::new("Account")
            .with_field("id", 1)
            .with_field("owner", "old"),
    );
    let repository = stored.clone();
    let mapper = AutoMapper::builder(Arc::new(registry()))
        .provider(
            "accounts",
            move |_class: &str,
                  source: &Value,
                  ctx: &ExecutionContext|
                  -> Result<Option<Value>, BoxError> {
                if ctx.extra("tenant").is_none() {
                    return Err("tenant missing".into());
                }
                match source.get_field("id") {
                    Some(Value::Int(1)) => Ok(Some(Value::Object(repository.clone()))),
                    _ => Ok(None),
                }
            },
        )
        .build()
        .expect("mapper");
    let options = MapOptions::new().with_extra("tenant", "acme");

    let source = Value::map([("id", Value::from(1)), ("owner", Value::from("new"))]);
    let loaded = mapper.map(&source, "Account", &options).expect("loaded");
    assert!(loaded.same_instance(&Value::Object(stored.clone())));
    assert_eq!(stored.get("owner"), Some(Value::from("new")));

    let source = Value::map([("id", Value::from(2)), ("owner", Value::from("x"))]);
    let fresh = mapper.map(&source, "Account", &options).expect("fresh");
    assert!(!fresh.same_instance(&Value::Object(stored)));
    assert_eq!(fresh.get_field("id"), Some(Value::Int(2)));

    let err = mapper
        .map(&Value::map([("id", 2)]), "Account", &MapOptions::default())
        .unwrap_err();
    assert!(matches!(&err, MapperError::Provider { name, .. } if name == "accounts"), "{err}");
}

#[test]
fn test_missing_provider_is_reported() {
    let err = mapper()
        .map(&Value::map([("id", 1)]), "Account", &MapOptions::default())
        .unwrap_err();
    assert!(matches!(&err, MapperError::UnknownProvider(name) if name == "accounts"), "{err}");
}

#[test]
fn test_extra_properties_collected() {
    let mapper = mapper();
    let source = Value::map([
        ("theme", Value::from("dark")),
        ("font", Value::from("mono")),
        ("size", Value::from(12)),
    ]);

    let settings = mapper
        .map(&source, "Settings", &MapOptions::new().allow_extra_properties(true))
        .expect("settings");
    assert_eq!(settings.get_field("theme"), Some(Value::from("dark")));
    assert_eq!(
        settings.get_field("extra"),
        Some(Value::map([("font", Value::from("mono")), ("size", Value::from(12))]))
    );

    let strict = mapper
        .map(&source, "Settings", &MapOptions::default())
        .expect("settings");
    assert_eq!(strict.get_field("extra"), None);
}

#[test]
fn test_skip_null_keeps_explicit_constructor_nulls() {
    let mapper = mapper();
    let source = Value::map([("id", Value::Null), ("label", Value::Null)]);

    for options in [MapOptions::default(), MapOptions::new().skip_null_values(true)] {
        let ident = mapper.map(&source, "Ident", &options).expect("constructed");
        assert_eq!(ident.get_field("id"), Some(Value::Null));
        assert_eq!(ident.get_field("label"), Some(Value::from("none")));
    }

    let err = mapper
        .map(&Value::map([("label", "x")]), "Ident", &MapOptions::new().skip_null_values(true))
        .unwrap_err();
    assert!(
        matches!(&err, MapperError::MissingRequiredArgument { argument, .. } if argument == "id"),
        "{err}"
    );
}
