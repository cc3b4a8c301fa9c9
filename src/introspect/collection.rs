use super::IntrospectionSession;
use crate::descriptor::TypeRef;
use crate::metadata::CollectionKind;
use crate::schema::{ElementSchema, SchemaFactory};
use log::error;

/// Resolves homogeneous collections (`Vec<T>`, `HashSet<T>`, typed arrays).
pub struct CollectionResolver;

impl CollectionResolver {
    pub fn resolve(
        session: &mut IntrospectionSession<'_>,
        ty: &TypeRef,
        kind: CollectionKind,
    ) -> ElementSchema {
        let (items, nullable) = match ty.arg(0) {
            Some(element) => (session.resolve(element), element.nullable),
            None => {
                error!(
                    "Element type of {} cannot be resolved; using an object schema",
                    ty
                );
                (SchemaFactory::empty_object(), false)
            }
        };

        match kind {
            CollectionKind::List => SchemaFactory::array(items, nullable),
            CollectionKind::Set => SchemaFactory::set(items, nullable),
        }
    }
}
