use openapi_introspect::descriptor::TypeRef;
use openapi_introspect::introspect::{Conflict, IntrospectionSession};
use openapi_introspect::metadata::{
    Attributes, FieldOptionality, PropertyDef, RenameSource, SerializerDescriptor, TypeCatalog,
    TypeDef,
};
use openapi_introspect::schema::{ElementSchema, ObjectDescriptor, ScalarType};
use pretty_assertions::assert_eq;

fn object<'a>(session: &'a IntrospectionSession<'_>, identity: &str) -> &'a ObjectDescriptor {
    session
        .registry()
        .by_identity(identity)
        .and_then(|entry| entry.schema.as_object())
        .unwrap_or_else(|| panic!("{} is not a registered object", identity))
}

fn property_names(object: &ObjectDescriptor) -> Vec<&str> {
    object.properties.keys().map(String::as_str).collect()
}

#[test]
fn test_resolving_twice_reuses_the_entry() {
    let catalog = TypeCatalog::new()
        .with(
            TypeDef::object("crate::models::User")
                .property(PropertyDef::new("id", TypeRef::named("u64"))),
        )
        .unwrap();
    let mut session = IntrospectionSession::new(&catalog);

    let first = session.resolve(&TypeRef::named("User"));
    let second = session.resolve(&TypeRef::named("crate::models::User"));

    assert_eq!(first, second);
    assert_eq!(session.registry().len(), 1);
}

#[test]
fn test_self_referencing_type_terminates() {
    let catalog = TypeCatalog::new()
        .with(
            TypeDef::object("crate::Node")
                .property(PropertyDef::new("next", TypeRef::named("Node").nullable())),
        )
        .unwrap();
    let mut session = IntrospectionSession::new(&catalog);

    let schema = session.resolve(&TypeRef::named("Node"));
    assert_eq!(schema.as_reference().unwrap().name, "Node");
    assert_eq!(session.registry().len(), 1);

    let next = &object(&session, "crate::Node").properties["next"];
    assert_eq!(next.schema.as_reference().unwrap().name, "Node");
    assert!(next.nullable);
}

#[test]
fn test_mutually_referencing_types_terminate() {
    let catalog = TypeCatalog::new()
        .with(TypeDef::object("crate::A").property(PropertyDef::new("b", TypeRef::named("B"))))
        .unwrap()
        .with(TypeDef::object("crate::B").property(PropertyDef::new("a", TypeRef::named("A"))))
        .unwrap();
    let mut session = IntrospectionSession::new(&catalog);

    session.resolve(&TypeRef::named("A"));

    assert_eq!(session.registry().len(), 2);
    let a = object(&session, "crate::A");
    let b = object(&session, "crate::B");
    assert_eq!(a.properties["b"].schema.as_reference().unwrap().name, "B");
    assert_eq!(b.properties["a"].schema.as_reference().unwrap().name, "A");
}

#[test]
fn test_subtype_properties_come_first() {
    let catalog = TypeCatalog::new()
        .with(
            TypeDef::object("crate::Person")
                .property(PropertyDef::new("name", TypeRef::named("String")))
                .property(PropertyDef::new("age", TypeRef::named("u8"))),
        )
        .unwrap()
        .with(
            TypeDef::object("crate::Employee")
                .extends(TypeRef::named("crate::Person"))
                .property(PropertyDef::new("name", TypeRef::named("String")))
                .property(PropertyDef::new("role", TypeRef::named("String"))),
        )
        .unwrap();
    let mut session = IntrospectionSession::new(&catalog);

    session.resolve(&TypeRef::named("Employee"));

    assert_eq!(
        property_names(object(&session, "crate::Employee")),
        vec!["name", "role", "age"]
    );
}

#[test]
fn test_generic_parameters_are_substituted() {
    let catalog = TypeCatalog::new()
        .with(
            TypeDef::object("crate::Page")
                .type_params(["T"])
                .property(PropertyDef::new("items", TypeRef::parse("Vec<T>").unwrap()))
                .property(PropertyDef::new("total", TypeRef::named("i64"))),
        )
        .unwrap()
        .with(
            TypeDef::object("crate::Employee")
                .property(PropertyDef::new("name", TypeRef::named("String"))),
        )
        .unwrap();
    let mut session = IntrospectionSession::new(&catalog);

    let page = session.resolve(&TypeRef::parse("Page<Employee>").unwrap());
    assert_eq!(page.as_reference().unwrap().name, "Page_Employee");

    let items = &object(&session, "crate::Page<crate::Employee>").properties["items"];
    match &items.schema {
        ElementSchema::Array(array) => {
            assert_eq!(array.items.as_reference().unwrap().name, "Employee");
        }
        other => panic!("expected array, got {:?}", other),
    }
}

#[test]
fn test_distinct_instantiations_are_distinct_entries() {
    let catalog = TypeCatalog::new()
        .with(
            TypeDef::object("crate::Page")
                .type_params(["T"])
                .property(PropertyDef::new("items", TypeRef::parse("Vec<T>").unwrap())),
        )
        .unwrap();
    let mut session = IntrospectionSession::new(&catalog);

    session.resolve(&TypeRef::parse("Page<String>").unwrap());
    session.resolve(&TypeRef::parse("Page<i32>").unwrap());

    let names: Vec<&str> = session.registry().iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["Page_String", "Page_i32"]);
    assert!(session.conflicts().is_empty());
}

fn slot_catalog() -> TypeCatalog {
    TypeCatalog::new()
        .with(
            TypeDef::object("crate::Slot")
                .type_params(["T"])
                .property(PropertyDef::new("current", TypeRef::named("T"))),
        )
        .unwrap()
        .with(
            TypeDef::object("crate::Employee")
                .property(PropertyDef::new("name", TypeRef::named("String"))),
        )
        .unwrap()
}

/// `current` nullability of `Slot<Employee>` and `Slot<Option<Employee>>`, resolved in order
fn slot_nullability(expressions: [&str; 2]) -> (bool, bool) {
    let catalog = slot_catalog();
    let mut session = IntrospectionSession::new(&catalog);
    for expr in expressions {
        session.resolve_expr(expr).unwrap();
    }
    assert_eq!(session.registry().len(), 3);

    let current = |identity: &str| object(&session, identity).properties["current"].nullable;
    (
        current("crate::Slot<crate::Employee>"),
        current("crate::Slot<Option<crate::Employee>>"),
    )
}

#[test]
fn test_nullable_argument_is_its_own_instantiation() {
    assert_eq!(
        slot_nullability(["Slot<Employee>", "Slot<Option<Employee>>"]),
        (false, true)
    );
    assert_eq!(
        slot_nullability(["Slot<Option<Employee>>", "Slot<Employee>"]),
        (false, true)
    );

    let catalog = slot_catalog();
    let mut session = IntrospectionSession::new(&catalog);
    let plain = session.resolve_expr("Slot<Employee>").unwrap();
    let optional = session.resolve_expr("Slot<Option<Employee>>").unwrap();
    assert_eq!(plain.as_reference().unwrap().name, "Slot_Employee");
    assert_eq!(optional.as_reference().unwrap().name, "Slot_Option_Employee");
    assert!(session.conflicts().is_empty());
}

#[test]
fn test_nullable_collection_elements_keep_null() {
    let catalog = slot_catalog();
    let mut session = IntrospectionSession::new(&catalog);

    let plain = session.resolve_expr("Vec<String>").unwrap();
    let optional = session.resolve_expr("Vec<Option<String>>").unwrap();
    assert_ne!(plain, optional);
    match optional {
        ElementSchema::Array(array) => assert!(array.items_nullable),
        other => panic!("expected array, got {:?}", other),
    }

    match session.resolve_expr("HashMap<String, Option<Employee>>").unwrap() {
        ElementSchema::AdditionalProperties(map) => {
            assert!(map.values_nullable);
            assert_eq!(map.values.as_reference().unwrap().name, "Employee");
        }
        other => panic!("expected map, got {:?}", other),
    }
}

#[test]
fn test_non_string_map_key_still_resolves() {
    let catalog = TypeCatalog::new();
    let mut session = IntrospectionSession::new(&catalog);

    match session.resolve(&TypeRef::parse("HashMap<i32, String>").unwrap()) {
        ElementSchema::AdditionalProperties(map) => match *map.values {
            ElementSchema::Primitive(primitive) => {
                assert_eq!(primitive.scalar, ScalarType::String)
            }
            other => panic!("expected primitive, got {:?}", other),
        },
        other => panic!("expected map, got {:?}", other),
    }
    assert!(session.registry().is_empty());
}

#[test]
fn test_conflicting_names_are_reported() {
    let catalog = TypeCatalog::new()
        .with(
            TypeDef::object("crate::shop::Item")
                .property(PropertyDef::new("price", TypeRef::named("f64"))),
        )
        .unwrap()
        .with(
            TypeDef::object("crate::stock::Item")
                .property(PropertyDef::new("count", TypeRef::named("u32"))),
        )
        .unwrap()
        .with(
            TypeDef::object("crate::Order")
                .property(PropertyDef::new("sold", TypeRef::named("crate::shop::Item")))
                .property(PropertyDef::new("held", TypeRef::named("crate::stock::Item"))),
        )
        .unwrap();
    let mut session = IntrospectionSession::new(&catalog);

    session.resolve(&TypeRef::named("Order"));
    let output = session.into_output();

    assert_eq!(
        output.conflicts,
        vec![Conflict {
            name: "Item".to_string(),
            qualified_types: vec!["crate::shop::Item".to_string(), "crate::stock::Item".to_string()],
        }]
    );
    assert_eq!(output.registry.find_by_name("Item").len(), 2);
    assert_eq!(output.registry.len(), 3);
}

#[test]
fn test_nullable_flag_leaves_primitive_shape_alone() {
    let catalog = TypeCatalog::new()
        .with(
            TypeDef::object("crate::Profile")
                .property(PropertyDef::new("bio", TypeRef::named("String").nullable()))
                .property(PropertyDef::new("motto", TypeRef::named("String"))),
        )
        .unwrap();
    let mut session = IntrospectionSession::new(&catalog);
    session.resolve(&TypeRef::named("Profile"));

    let profile = object(&session, "crate::Profile");
    let bio = &profile.properties["bio"];
    let motto = &profile.properties["motto"];
    assert!(bio.nullable);
    assert!(!motto.nullable);
    assert_eq!(bio.schema, motto.schema);
}

#[test]
fn test_enum_is_named_and_referenced() {
    let catalog = TypeCatalog::new()
        .with(TypeDef::enumeration("crate::Status", ["ACTIVE", "INACTIVE"]))
        .unwrap()
        .with(
            TypeDef::object("crate::Account")
                .property(PropertyDef::new("status", TypeRef::named("Status")))
                .property(PropertyDef::new("history", TypeRef::parse("Vec<Status>").unwrap())),
        )
        .unwrap();
    let mut session = IntrospectionSession::new(&catalog);
    session.resolve(&TypeRef::named("Account"));

    let status = session.registry().by_identity("crate::Status").unwrap();
    match &status.schema {
        ElementSchema::Enum(enumeration) => {
            assert_eq!(enumeration.values, vec!["ACTIVE", "INACTIVE"])
        }
        other => panic!("expected enum, got {:?}", other),
    }
    let account = object(&session, "crate::Account");
    assert_eq!(
        account.properties["status"].schema.as_reference().unwrap().name,
        "Status"
    );
    assert_eq!(session.registry().len(), 2);
}

#[test]
fn test_renames_and_requiredness_follow_metadata() {
    let mut serializer = SerializerDescriptor::default();
    serializer
        .fields
        .insert("first_name".to_string(), FieldOptionality::Required);
    serializer
        .fields
        .insert("nickname".to_string(), FieldOptionality::Optional);

    let catalog = TypeCatalog::new()
        .with(
            TypeDef::object("crate::Contact")
                .with_serializer(serializer)
                .property(
                    PropertyDef::new("first_name", TypeRef::named("String"))
                        .renamed_by(RenameSource::Metadata, "given")
                        .renamed_by(RenameSource::Serializer, "firstName"),
                )
                .property(PropertyDef::new("nickname", TypeRef::named("String"))),
        )
        .unwrap();
    let mut session = IntrospectionSession::new(&catalog);
    session.resolve(&TypeRef::named("Contact"));

    let contact = object(&session, "crate::Contact");
    assert_eq!(property_names(contact), vec!["firstName", "nickname"]);
    assert_eq!(
        contact.properties["firstName"].original_name.as_deref(),
        Some("first_name")
    );
    assert_eq!(contact.required(), vec!["firstName"]);
}

#[test]
fn test_attributes_are_merged_onto_primitives_only() {
    let constraints = Attributes {
        min_length: Some(3),
        description: Some("Login name".to_string()),
        ..Default::default()
    };
    let catalog = TypeCatalog::new()
        .with(
            TypeDef::object("crate::Login")
                .property(
                    PropertyDef::new("user", TypeRef::named("String"))
                        .with_attributes(constraints.clone()),
                )
                .property(
                    PropertyDef::new("profile", TypeRef::named("Profile"))
                        .with_attributes(constraints),
                ),
        )
        .unwrap()
        .with(
            TypeDef::object("crate::Profile")
                .property(PropertyDef::new("bio", TypeRef::named("String"))),
        )
        .unwrap();
    let mut session = IntrospectionSession::new(&catalog);
    session.resolve(&TypeRef::named("Login"));

    let login = object(&session, "crate::Login");
    match &login.properties["user"].schema {
        ElementSchema::Primitive(primitive) => {
            assert_eq!(primitive.constraints.min_length, Some(3));
            assert_eq!(primitive.meta.description.as_deref(), Some("Login name"));
        }
        other => panic!("expected primitive, got {:?}", other),
    }
    let profile = &login.properties["profile"];
    assert!(profile.schema.as_reference().is_some());
    assert_eq!(profile.description.as_deref(), Some("Login name"));
    assert!(object(&session, "crate::Profile").meta.is_empty());
}

#[test]
fn test_fresh_sessions_are_isolated() {
    let catalog = TypeCatalog::new()
        .with(TypeDef::object("crate::A").property(PropertyDef::new("x", TypeRef::named("i32"))))
        .unwrap();

    let mut first = IntrospectionSession::new(&catalog);
    first.resolve(&TypeRef::named("A"));
    let second = IntrospectionSession::new(&catalog);

    assert_eq!(first.registry().len(), 1);
    assert!(second.registry().is_empty());
}
