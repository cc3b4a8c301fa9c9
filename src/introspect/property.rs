use super::{Bindings, IntrospectionSession};
use crate::metadata::{MetadataDescriptor, PropertyDef, TypeDef, TypeMetadataProvider, TypeShape};
use crate::schema::{SchemaFactory, SchemaProperty};
use log::{debug, warn};
use std::collections::HashSet;

/// A property in schema order, with the bindings of the type that declares it
#[derive(Debug, Clone)]
pub struct OrderedProperty<'p> {
    pub owner: &'p TypeDef,
    pub property: &'p PropertyDef,
    pub bindings: Bindings,
}

/// Resolves single properties and the property order of a type hierarchy.
pub struct PropertyResolver;

impl PropertyResolver {
    /// Resolves `property` of `owner`, returning its effective name and schema.
    ///
    /// Transient properties keep their flags but their types are not resolved.
    pub fn traverse(
        session: &mut IntrospectionSession<'_>,
        owner: &TypeDef,
        property: &PropertyDef,
        bindings: &Bindings,
    ) -> (String, SchemaProperty) {
        let metadata = MetadataDescriptor::of_property(session.provider(), owner, property);
        let target = format!("{}.{}", owner.qualified_name, property.name);
        let description = property.attributes.description.clone();

        if metadata.transient {
            debug!("{} is transient; not resolving {}", target, property.ty);
            return (
                metadata.name,
                SchemaProperty {
                    schema: SchemaFactory::empty_object(),
                    nullable: metadata.nullable,
                    required: metadata.required,
                    original_name: metadata.original_name,
                    transient: true,
                    description,
                },
            );
        }

        let (schema, substituted_nullable) = match bindings.substitute(&property.ty) {
            Some(ty) => (session.resolve(&ty), ty.nullable),
            None => {
                warn!(
                    "{} has unbound type parameter {}; using an object schema",
                    target, property.ty
                );
                (SchemaFactory::empty_object(), false)
            }
        };
        let schema = SchemaFactory::apply_attributes(schema, &property.attributes, &target);

        (
            metadata.name,
            SchemaProperty {
                schema,
                nullable: metadata.nullable || substituted_nullable,
                required: metadata.required,
                original_name: metadata.original_name,
                transient: false,
                description,
            },
        )
    }

    /// Public properties of `def` and its supertypes in schema order.
    ///
    /// The type's own properties come first in declaration order, then each supertype's,
    /// depth first. A name declared again by an ancestor is skipped.
    pub fn ordered_properties<'p>(
        provider: &'p dyn TypeMetadataProvider,
        def: &'p TypeDef,
        bindings: &Bindings,
    ) -> Vec<OrderedProperty<'p>> {
        let mut ordered = Vec::new();
        let mut seen = HashSet::new();
        let mut visited = HashSet::new();
        visited.insert(def.qualified_name.as_str());
        collect(provider, def, bindings, &mut ordered, &mut seen, &mut visited);
        ordered
    }
}

fn collect<'p>(
    provider: &'p dyn TypeMetadataProvider,
    def: &'p TypeDef,
    bindings: &Bindings,
    ordered: &mut Vec<OrderedProperty<'p>>,
    seen: &mut HashSet<&'p str>,
    visited: &mut HashSet<&'p str>,
) {
    for property in def.properties().iter().filter(|p| p.public) {
        if seen.insert(property.name.as_str()) {
            ordered.push(OrderedProperty {
                owner: def,
                property,
                bindings: bindings.clone(),
            });
        } else {
            debug!(
                "{}.{} is shadowed by a subtype",
                def.qualified_name, property.name
            );
        }
    }

    for supertype in def.supertypes() {
        let Some(ty) = bindings.substitute(supertype) else {
            warn!("Supertype {} of {} is unbound", supertype, def.qualified_name);
            continue;
        };
        let parent = match provider.shape(&ty) {
            TypeShape::Object(parent) => parent,
            _ => {
                warn!(
                    "Supertype {} of {} is not an object type; skipping it",
                    ty, def.qualified_name
                );
                continue;
            }
        };
        if !visited.insert(parent.qualified_name.as_str()) {
            continue;
        }
        let parent_bindings = Bindings::new().extended(&parent.type_params, &ty.args);
        collect(provider, parent, &parent_bindings, ordered, seen, visited);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::TypeRef;
    use crate::metadata::{Attributes, TypeCatalog};
    use crate::schema::ElementSchema;

    fn hierarchy() -> TypeCatalog {
        TypeCatalog::new()
            .with(
                TypeDef::object("crate::Person")
                    .property(PropertyDef::new("name", TypeRef::named("String")))
                    .property(PropertyDef::new("age", TypeRef::named("u8"))),
            )
            .unwrap()
            .with(
                TypeDef::object("crate::Employee")
                    .property(PropertyDef::new("name", TypeRef::named("String")))
                    .property(PropertyDef::new("role", TypeRef::named("String")))
                    .property(PropertyDef::new("salary", TypeRef::named("u32")).private())
                    .extends(TypeRef::named("crate::Person")),
            )
            .unwrap()
    }

    #[test]
    fn test_subtype_properties_first_without_duplicates() {
        let catalog = hierarchy();
        let employee = catalog.get("crate::Employee").unwrap();

        let ordered = PropertyResolver::ordered_properties(&catalog, employee, &Bindings::new());
        let names: Vec<(&str, &str)> = ordered
            .iter()
            .map(|o| (o.owner.name.as_str(), o.property.name.as_str()))
            .collect();
        assert_eq!(
            names,
            vec![("Employee", "name"), ("Employee", "role"), ("Person", "age")]
        );
    }

    #[test]
    fn test_supertype_cycle_is_visited_once() {
        let catalog = TypeCatalog::new()
            .with(
                TypeDef::object("crate::A")
                    .property(PropertyDef::new("a", TypeRef::named("u8")))
                    .extends(TypeRef::named("crate::B")),
            )
            .unwrap()
            .with(
                TypeDef::object("crate::B")
                    .property(PropertyDef::new("b", TypeRef::named("u8")))
                    .extends(TypeRef::named("crate::A")),
            )
            .unwrap();

        let a = catalog.get("crate::A").unwrap();
        let ordered = PropertyResolver::ordered_properties(&catalog, a, &Bindings::new());
        assert_eq!(ordered.len(), 2);
    }

    #[test]
    fn test_generic_supertype_bindings() {
        let catalog = TypeCatalog::new()
            .with(
                TypeDef::object("crate::Envelope")
                    .type_params(["T"])
                    .property(PropertyDef::new("data", TypeRef::named("T"))),
            )
            .unwrap()
            .with(
                TypeDef::object("crate::UserEnvelope")
                    .property(PropertyDef::new("version", TypeRef::named("u32")))
                    .extends(TypeRef::parse("crate::Envelope<String>").unwrap()),
            )
            .unwrap();

        let def = catalog.get("crate::UserEnvelope").unwrap();
        let ordered = PropertyResolver::ordered_properties(&catalog, def, &Bindings::new());
        let data = &ordered[1];
        assert_eq!(data.property.name, "data");
        assert_eq!(data.bindings.get("T").unwrap().classifier, "String");
    }

    #[test]
    fn test_traverse_applies_attributes_and_flags() {
        let catalog = TypeCatalog::new()
            .with(
                TypeDef::object("crate::User").property(
                    PropertyDef::new("email", TypeRef::named("String").nullable()).with_attributes(
                        Attributes {
                            format: Some("email".to_string()),
                            description: Some("Contact address".to_string()),
                            ..Default::default()
                        },
                    ),
                ),
            )
            .unwrap();
        let owner = catalog.get("crate::User").unwrap();
        let mut session = IntrospectionSession::new(&catalog);

        let (name, property) =
            PropertyResolver::traverse(&mut session, owner, &owner.properties()[0], &Bindings::new());
        assert_eq!(name, "email");
        assert!(property.nullable);
        assert!(property.required);
        assert_eq!(property.description.as_deref(), Some("Contact address"));
        match property.schema {
            ElementSchema::Primitive(p) => assert_eq!(p.format.as_deref(), Some("email")),
            other => panic!("expected primitive, got {:?}", other),
        }
    }

    #[test]
    fn test_transient_property_is_not_resolved() {
        let catalog = TypeCatalog::new()
            .with(TypeDef::object("crate::Cache").property(PropertyDef::new("x", TypeRef::named("u8"))))
            .unwrap()
            .with(
                TypeDef::object("crate::Holder")
                    .property(PropertyDef::new("cache", TypeRef::named("crate::Cache")).ignored()),
            )
            .unwrap();
        let owner = catalog.get("crate::Holder").unwrap();
        let mut session = IntrospectionSession::new(&catalog);

        let (_, property) =
            PropertyResolver::traverse(&mut session, owner, &owner.properties()[0], &Bindings::new());
        assert!(property.transient);
        assert!(!property.required);
        assert!(session.registry().is_empty());
    }

    #[test]
    fn test_unbound_parameter_falls_back_to_object() {
        let catalog = TypeCatalog::new()
            .with(
                TypeDef::object("crate::Wrapper")
                    .type_params(["T"])
                    .property(PropertyDef::new("inner", TypeRef::named("T"))),
            )
            .unwrap();
        let owner = catalog.get("crate::Wrapper").unwrap();
        let mut session = IntrospectionSession::new(&catalog);
        let bindings = Bindings::new().extended(&owner.type_params, &[]);

        let (_, property) =
            PropertyResolver::traverse(&mut session, owner, &owner.properties()[0], &bindings);
        assert_eq!(property.schema, SchemaFactory::empty_object());
    }
}
