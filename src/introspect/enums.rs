use super::IntrospectionSession;
use crate::metadata::{MetadataDescriptor, TypeDef, TypeDefKind};
use crate::schema::{ElementSchema, SchemaFactory};
use log::debug;

/// Registers enumerations as named enum schemas.
pub struct EnumResolver;

impl EnumResolver {
    /// Enums are never inlined: the result is always a reference.
    pub fn resolve(session: &mut IntrospectionSession<'_>, def: &TypeDef) -> ElementSchema {
        if let Some(existing) = session.registry.by_identity(&def.qualified_name) {
            return ElementSchema::Reference(existing.reference());
        }

        let values = match &def.kind {
            TypeDefKind::Enum { variants } => variants.clone(),
            TypeDefKind::Object { .. } => Vec::new(),
        };
        let mut schema = SchemaFactory::enumeration(values);
        if let Some(meta) = schema.meta_mut() {
            meta.merge(SchemaFactory::meta_from(&def.attributes));
        }

        let metadata = MetadataDescriptor::of_type(def);
        let id = session.registry.insert(
            metadata.name.clone(),
            metadata.original_name,
            def.qualified_name.clone(),
            schema,
        );
        debug!("Registered enum {} as {}", def.qualified_name, metadata.name);
        SchemaFactory::reference(id, metadata.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::TypeRef;
    use crate::metadata::{Attributes, PropertyDef, TypeCatalog};

    #[test]
    fn test_enum_is_registered_and_referenced() {
        let catalog = TypeCatalog::new()
            .with(
                TypeDef::enumeration("crate::Status", ["ACTIVE", "INACTIVE"]).with_attributes(
                    Attributes {
                        description: Some("Account state".to_string()),
                        ..Default::default()
                    },
                ),
            )
            .unwrap()
            .with(
                TypeDef::object("crate::Account")
                    .property(PropertyDef::new("status", TypeRef::named("Status"))),
            )
            .unwrap();
        let mut session = IntrospectionSession::new(&catalog);

        session.resolve(&TypeRef::named("Account"));
        let account = session.registry().by_identity("crate::Account").unwrap();
        let status = &account.schema.as_object().unwrap().properties["status"];
        assert_eq!(status.schema.as_reference().unwrap().name, "Status");

        let entry = session.registry().by_identity("crate::Status").unwrap();
        match &entry.schema {
            ElementSchema::Enum(e) => {
                assert_eq!(e.values, vec!["ACTIVE", "INACTIVE"]);
                assert_eq!(e.meta.description.as_deref(), Some("Account state"));
            }
            other => panic!("expected enum, got {:?}", other),
        }
        assert_eq!(session.registry().len(), 2);
    }
}
