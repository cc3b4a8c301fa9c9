use super::IntrospectionSession;
use crate::descriptor::TypeRef;
use crate::schema::{ElementSchema, SchemaFactory, SchemaMeta};
use log::error;

/// Resolves string-keyed maps into additional-properties schemas.
pub struct MapResolver;

impl MapResolver {
    /// Resolves the value type of `ty` (`HashMap<K, V>` and friends).
    ///
    /// Keys must serialize as strings. Other key types are reported but still produce a
    /// schema. A value type that cannot be resolved registers a diagnostic entry named
    /// `Unresolved_<type>`.
    pub fn resolve(session: &mut IntrospectionSession<'_>, ty: &TypeRef) -> ElementSchema {
        let provider = session.provider();
        match ty.arg(0) {
            None => error!("Key type of {} cannot be resolved", ty),
            Some(key) => {
                let string_like = provider
                    .primitive_kind(key)
                    .is_some_and(|kind| kind.is_string_like())
                    || provider.is_enum_like(key);
                if !string_like {
                    error!(
                        "Key type {} of {} is not string-like; map keys must be strings",
                        key, ty
                    );
                }
            }
        }

        let (values, nullable) = match ty.arg(1) {
            Some(value) => (session.resolve(value), value.nullable),
            None => (Self::unresolved(session, ty), false),
        };
        SchemaFactory::additional_properties(values, nullable)
    }

    fn unresolved(session: &mut IntrospectionSession<'_>, ty: &TypeRef) -> ElementSchema {
        let identity = format!("unresolved::{}", ty.qualified());
        if let Some(existing) = session.registry.by_identity(&identity) {
            return ElementSchema::Reference(existing.reference());
        }

        error!("Value type of {} cannot be resolved; using an object schema", ty);
        let name = format!("Unresolved_{}", session.display_name(ty));
        let schema = SchemaFactory::object(SchemaMeta {
            description: Some(format!("Value type of `{}` could not be resolved", ty)),
            ..Default::default()
        });
        let id = session.registry.insert(name.clone(), None, identity, schema);
        SchemaFactory::reference(id, name)
    }
}
