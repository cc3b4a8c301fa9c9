//! Schema nodes produced by the introspection engine.
//!
//! [`ElementSchema`] is a closed set of shapes. Named types live in the session registry and
//! are pointed at with [`ElementSchema::Reference`]; everything else is inline.

mod factory;

pub use factory::SchemaFactory;

use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;

/// Stable index of a named schema in the registry arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaId(pub(crate) usize);

impl SchemaId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for SchemaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Symbolic pointer to a named schema
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SchemaRef {
    pub id: SchemaId,
    pub name: String,
}

/// Documentation carried by any schema node
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaMeta {
    pub description: Option<String>,
    pub default: Option<Value>,
    pub examples: Vec<Value>,
    pub deprecated: bool,
}

impl SchemaMeta {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Overlays `other`; set values in `other` win, examples accumulate
    pub fn merge(&mut self, other: SchemaMeta) {
        if other.description.is_some() {
            self.description = other.description;
        }
        if other.default.is_some() {
            self.default = other.default;
        }
        self.examples.extend(other.examples);
        self.deprecated |= other.deprecated;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    String,
    Integer,
    Number,
    Boolean,
}

impl ScalarType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Integer | Self::Number)
    }
}

/// Scalar constraints. String and numeric constraints never coexist on one schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueConstraints {
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub pattern: Option<String>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub multiple_of: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrimitiveSchema {
    pub scalar: ScalarType,
    pub format: Option<String>,
    pub constraints: ValueConstraints,
    pub meta: SchemaMeta,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumSchema {
    /// Constant names in declaration order
    pub values: Vec<String>,
    pub meta: SchemaMeta,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArrayConstraints {
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
    pub unique_items: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArraySchema {
    pub items: Box<ElementSchema>,
    /// Items may be `null` (`Vec<Option<T>>`)
    pub items_nullable: bool,
    pub constraints: ArrayConstraints,
    pub meta: SchemaMeta,
}

/// String-keyed map with homogeneous values
#[derive(Debug, Clone, PartialEq)]
pub struct MapSchema {
    pub values: Box<ElementSchema>,
    pub values_nullable: bool,
    pub meta: SchemaMeta,
}

/// Ordered property map of an object type.
///
/// Registry entries start as empty placeholders and are filled in place while their
/// properties resolve.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectDescriptor {
    pub properties: IndexMap<String, SchemaProperty>,
    pub meta: SchemaMeta,
}

impl ObjectDescriptor {
    /// Names of required, non-transient properties in order
    pub fn required(&self) -> Vec<&str> {
        self.properties
            .iter()
            .filter(|(_, p)| p.required && !p.transient)
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

/// A resolved property: its schema plus the flags that are not part of the schema shape
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaProperty {
    pub schema: ElementSchema,
    pub nullable: bool,
    pub required: bool,
    /// Declared name when the property was renamed
    pub original_name: Option<String>,
    pub transient: bool,
    /// Property-level description, kept apart so it survives on references
    pub description: Option<String>,
}

/// One resolved schema shape.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementSchema {
    Primitive(PrimitiveSchema),
    Enum(EnumSchema),
    Array(ArraySchema),
    AdditionalProperties(MapSchema),
    Object(ObjectDescriptor),
    Reference(SchemaRef),
}

impl ElementSchema {
    pub fn as_reference(&self) -> Option<&SchemaRef> {
        match self {
            Self::Reference(reference) => Some(reference),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectDescriptor> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut ObjectDescriptor> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Self::Object(_))
    }

    /// Documentation of this node; references carry none
    pub fn meta(&self) -> Option<&SchemaMeta> {
        match self {
            Self::Primitive(schema) => Some(&schema.meta),
            Self::Enum(schema) => Some(&schema.meta),
            Self::Array(schema) => Some(&schema.meta),
            Self::AdditionalProperties(schema) => Some(&schema.meta),
            Self::Object(schema) => Some(&schema.meta),
            Self::Reference(_) => None,
        }
    }

    pub fn meta_mut(&mut self) -> Option<&mut SchemaMeta> {
        match self {
            Self::Primitive(schema) => Some(&mut schema.meta),
            Self::Enum(schema) => Some(&mut schema.meta),
            Self::Array(schema) => Some(&mut schema.meta),
            Self::AdditionalProperties(schema) => Some(&mut schema.meta),
            Self::Object(schema) => Some(&mut schema.meta),
            Self::Reference(_) => None,
        }
    }

    /// Short shape name for log messages
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Primitive(_) => "primitive",
            Self::Enum(_) => "enum",
            Self::Array(_) => "array",
            Self::AdditionalProperties(_) => "map",
            Self::Object(_) => "object",
            Self::Reference(_) => "reference",
        }
    }
}
