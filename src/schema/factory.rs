use super::{
    ArrayConstraints, ArraySchema, ElementSchema, EnumSchema, MapSchema, ObjectDescriptor,
    PrimitiveSchema, ScalarType, SchemaId, SchemaMeta, SchemaRef, ValueConstraints,
};
use crate::metadata::{Attributes, PrimitiveKind};
use log::{debug, warn};

/// Stateless constructor of canonical schema shapes.
pub struct SchemaFactory;

impl SchemaFactory {
    /// Schema of a well-known scalar type
    pub fn primitive(kind: PrimitiveKind) -> ElementSchema {
        use PrimitiveKind::*;

        let (scalar, format) = match kind {
            String => (ScalarType::String, None),
            Char => (ScalarType::String, None),
            Bool => (ScalarType::Boolean, None),
            I8 | I16 | I32 | U8 | U16 => (ScalarType::Integer, Some("int32")),
            I64 | I128 | Isize | U32 | U64 | U128 | Usize => (ScalarType::Integer, Some("int64")),
            F32 => (ScalarType::Number, Some("float")),
            F64 => (ScalarType::Number, Some("double")),
            Uuid => (ScalarType::String, Some("uuid")),
            DateTime => (ScalarType::String, Some("date-time")),
            Date => (ScalarType::String, Some("date")),
            Time => (ScalarType::String, Some("time")),
            Duration => (ScalarType::String, Some("duration")),
            Uri => (ScalarType::String, Some("uri")),
            Ipv4 => (ScalarType::String, Some("ipv4")),
            Ipv6 => (ScalarType::String, Some("ipv6")),
            Binary => (ScalarType::String, Some("binary")),
        };

        let mut constraints = ValueConstraints::default();
        if kind.is_unsigned() {
            constraints.minimum = Some(0.0);
        }
        if kind == Char {
            constraints.min_length = Some(1);
            constraints.max_length = Some(1);
        }

        ElementSchema::Primitive(PrimitiveSchema {
            scalar,
            format: format.map(str::to_string),
            constraints,
            meta: SchemaMeta::default(),
        })
    }

    pub fn enumeration(values: Vec<String>) -> ElementSchema {
        ElementSchema::Enum(EnumSchema {
            values,
            meta: SchemaMeta::default(),
        })
    }

    pub fn array(items: ElementSchema, items_nullable: bool) -> ElementSchema {
        ElementSchema::Array(ArraySchema {
            items: Box::new(items),
            items_nullable,
            constraints: ArrayConstraints::default(),
            meta: SchemaMeta::default(),
        })
    }

    /// Array whose items are unique
    pub fn set(items: ElementSchema, items_nullable: bool) -> ElementSchema {
        ElementSchema::Array(ArraySchema {
            items: Box::new(items),
            items_nullable,
            constraints: ArrayConstraints {
                unique_items: true,
                ..Default::default()
            },
            meta: SchemaMeta::default(),
        })
    }

    pub fn additional_properties(values: ElementSchema, values_nullable: bool) -> ElementSchema {
        ElementSchema::AdditionalProperties(MapSchema {
            values: Box::new(values),
            values_nullable,
            meta: SchemaMeta::default(),
        })
    }

    /// Object with no properties; the universal fallback
    pub fn empty_object() -> ElementSchema {
        ElementSchema::Object(ObjectDescriptor::default())
    }

    /// Object placeholder carrying class-level documentation
    pub fn object(meta: SchemaMeta) -> ElementSchema {
        ElementSchema::Object(ObjectDescriptor {
            properties: Default::default(),
            meta,
        })
    }

    pub fn reference(id: SchemaId, name: impl Into<String>) -> ElementSchema {
        ElementSchema::Reference(SchemaRef {
            id,
            name: name.into(),
        })
    }

    pub fn meta_from(attributes: &Attributes) -> SchemaMeta {
        SchemaMeta {
            description: attributes.description.clone(),
            default: attributes.default.clone(),
            examples: attributes.examples.clone(),
            deprecated: attributes.deprecated,
        }
    }

    /// Merges annotation attributes onto a resolved schema.
    ///
    /// Objects are returned untouched and references keep their shape. Constraints that do
    /// not fit the schema are dropped with a warning; `target` names the annotated item.
    pub fn apply_attributes(
        schema: ElementSchema,
        attributes: &Attributes,
        target: &str,
    ) -> ElementSchema {
        if attributes.is_empty() {
            return schema;
        }

        match schema {
            ElementSchema::Object(_) => {
                debug!("Skipping attributes of {}: object schemas take no constraints", target);
                schema
            }
            ElementSchema::Reference(_) => {
                if has_constraints(attributes) {
                    warn!(
                        "Constraints on {} are ignored: it refers to a named schema",
                        target
                    );
                }
                schema
            }
            ElementSchema::Primitive(mut primitive) => {
                apply_value_constraints(&mut primitive, attributes, target);
                if attributes.has_array_constraints() {
                    warn!("Item constraints on {} are ignored: it is not an array", target);
                }
                if let Some(format) = &attributes.format {
                    primitive.format = Some(format.clone());
                }
                primitive.meta.merge(Self::meta_from(attributes));
                ElementSchema::Primitive(primitive)
            }
            ElementSchema::Array(mut array) => {
                // `length(..)` on a collection counts its items
                let min_items = attributes.min_items.or(attributes.min_length);
                let max_items = attributes.max_items.or(attributes.max_length);
                if min_items.is_some() {
                    array.constraints.min_items = min_items;
                }
                if max_items.is_some() {
                    array.constraints.max_items = max_items;
                }
                if let Some(unique) = attributes.unique_items {
                    array.constraints.unique_items = unique;
                }
                if attributes.pattern.is_some() || attributes.has_numeric_constraints() {
                    warn!("Value constraints on {} are ignored: it is an array", target);
                }
                array.meta.merge(Self::meta_from(attributes));
                ElementSchema::Array(array)
            }
            mut other => {
                if has_constraints(attributes) {
                    warn!(
                        "Constraints on {} are ignored: {} schemas take none",
                        target,
                        other.kind()
                    );
                }
                if let Some(meta) = other.meta_mut() {
                    meta.merge(Self::meta_from(attributes));
                }
                other
            }
        }
    }
}

fn has_constraints(attributes: &Attributes) -> bool {
    attributes.has_string_constraints()
        || attributes.has_numeric_constraints()
        || attributes.has_array_constraints()
}

fn apply_value_constraints(primitive: &mut PrimitiveSchema, attributes: &Attributes, target: &str) {
    if attributes.has_string_constraints() {
        if primitive.scalar == ScalarType::String {
            let constraints = &mut primitive.constraints;
            constraints.min_length = attributes.min_length.or(constraints.min_length);
            constraints.max_length = attributes.max_length.or(constraints.max_length);
            constraints.pattern = attributes.pattern.clone().or(constraints.pattern.take());
        } else {
            warn!(
                "String constraints on {} are ignored: it is a {}",
                target,
                primitive.scalar.as_str()
            );
        }
    }

    if attributes.has_numeric_constraints() {
        if primitive.scalar.is_numeric() {
            let constraints = &mut primitive.constraints;
            constraints.minimum = attributes.minimum.or(constraints.minimum);
            constraints.maximum = attributes.maximum.or(constraints.maximum);
            constraints.multiple_of = attributes.multiple_of.or(constraints.multiple_of);
        } else {
            warn!(
                "Numeric constraints on {} are ignored: it is a {}",
                target,
                primitive.scalar.as_str()
            );
        }
    }
}
