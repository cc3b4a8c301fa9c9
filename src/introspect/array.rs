use super::{CollectionResolver, IntrospectionSession};
use crate::descriptor::TypeRef;
use crate::metadata::CollectionKind;
use crate::schema::{ElementSchema, SchemaFactory};

/// Resolves fixed-size arrays and slices (`[T; N]`, `[T]`).
pub struct ArrayResolver;

impl ArrayResolver {
    /// Arrays of numbers, `bool` or `char` map straight to an array of that primitive;
    /// any other element type goes through [`CollectionResolver`].
    pub fn resolve(session: &mut IntrospectionSession<'_>, ty: &TypeRef) -> ElementSchema {
        if let Some(element) = ty.arg(0) {
            let kind = session
                .provider()
                .primitive_kind(element)
                .filter(|kind| kind.is_primitive_array_element());
            if let Some(kind) = kind {
                return SchemaFactory::array(SchemaFactory::primitive(kind), element.nullable);
            }
        }
        CollectionResolver::resolve(session, ty, CollectionKind::List)
    }
}
