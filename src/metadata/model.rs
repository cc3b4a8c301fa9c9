use crate::descriptor::{simple_name, TypeRef};
use crate::error::{Error, Result};
use indexmap::IndexMap;
use serde_json::Value;

/// Definition of a user type (struct or enum) as seen by the engine
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDef {
    /// Unique identity, e.g. `crate::models::User`
    pub qualified_name: String,
    /// Declared name, e.g. `User`
    pub name: String,
    /// Class-level rename (`#[serde(rename = "...")]` on the container)
    pub rename: Option<String>,
    /// Generic type parameter names in declaration order
    pub type_params: Vec<String>,
    /// Class-level attribute bundle
    pub attributes: Attributes,
    pub kind: TypeDefKind,
    /// Present when a serializer (serde) is derived for this type
    pub serializer: Option<SerializerDescriptor>,
    /// Constructor parameters, when the type can be constructed from its fields
    pub constructor: Option<Vec<ConstructorParam>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeDefKind {
    Object {
        /// Declared properties in backing-field order
        properties: Vec<PropertyDef>,
        /// Types whose properties this type inherits, nearest first
        supertypes: Vec<TypeRef>,
    },
    Enum {
        /// Constant names in declaration order
        variants: Vec<String>,
    },
}

/// A single declared property
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDef {
    pub name: String,
    pub ty: TypeRef,
    /// Non-public properties are not part of the schema
    pub public: bool,
    pub attributes: Attributes,
    /// Rename directives in the order they were declared
    pub renames: Vec<RenameDirective>,
    /// Explicit `required` marker
    pub required: Option<bool>,
    /// Explicit "ignore" marker (transient property)
    pub ignored: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameDirective {
    pub source: RenameSource,
    pub name: String,
}

/// Where a rename comes from. Serializer renames take precedence over metadata renames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenameSource {
    /// Serialization library, e.g. `#[serde(rename = "...")]`
    Serializer,
    /// Schema metadata, e.g. `#[schema(rename = "...")]`
    Metadata,
}

/// Per-field optionality as reported by the serializer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldOptionality {
    Required,
    Optional,
    /// The serializer attributes on this field could not be read
    Malformed(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SerializerDescriptor {
    pub fields: IndexMap<String, FieldOptionality>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstructorParam {
    pub name: String,
    pub has_default: bool,
}

/// Annotation-derived attributes for a type or property
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes {
    pub description: Option<String>,
    pub format: Option<String>,
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub pattern: Option<String>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub multiple_of: Option<f64>,
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
    pub unique_items: Option<bool>,
    pub default: Option<Value>,
    pub examples: Vec<Value>,
    pub deprecated: bool,
}

impl Attributes {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn has_string_constraints(&self) -> bool {
        self.min_length.is_some() || self.max_length.is_some() || self.pattern.is_some()
    }

    pub fn has_numeric_constraints(&self) -> bool {
        self.minimum.is_some() || self.maximum.is_some() || self.multiple_of.is_some()
    }

    pub fn has_array_constraints(&self) -> bool {
        self.min_items.is_some() || self.max_items.is_some() || self.unique_items.is_some()
    }

    /// Rejects constraint combinations that cannot describe any value
    pub fn validate(&self, target: &str) -> Result<()> {
        if let (Some(min), Some(max)) = (self.min_length, self.max_length) {
            if min > max {
                return Err(Error::invalid_constraint(
                    target,
                    format!("minLength {} exceeds maxLength {}", min, max),
                ));
            }
        }
        if let (Some(min), Some(max)) = (self.minimum, self.maximum) {
            if min > max {
                return Err(Error::invalid_constraint(
                    target,
                    format!("minimum {} exceeds maximum {}", min, max),
                ));
            }
        }
        if let (Some(min), Some(max)) = (self.min_items, self.max_items) {
            if min > max {
                return Err(Error::invalid_constraint(
                    target,
                    format!("minItems {} exceeds maxItems {}", min, max),
                ));
            }
        }
        if let Some(multiple_of) = self.multiple_of {
            if multiple_of <= 0.0 {
                return Err(Error::invalid_constraint(target, "multipleOf must be positive"));
            }
        }
        if self.has_string_constraints() && self.has_numeric_constraints() {
            return Err(Error::invalid_constraint(
                target,
                "string constraints cannot be combined with numeric constraints",
            ));
        }
        Ok(())
    }
}

impl TypeDef {
    /// Starts an object definition
    pub fn object(qualified_name: impl Into<String>) -> Self {
        Self::with_kind(
            qualified_name.into(),
            TypeDefKind::Object {
                properties: Vec::new(),
                supertypes: Vec::new(),
            },
        )
    }

    /// Creates an enum definition with its constants in declaration order
    pub fn enumeration<I, S>(qualified_name: impl Into<String>, variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_kind(
            qualified_name.into(),
            TypeDefKind::Enum {
                variants: variants.into_iter().map(Into::into).collect(),
            },
        )
    }

    fn with_kind(qualified_name: String, kind: TypeDefKind) -> Self {
        let name = simple_name(&qualified_name).to_string();
        Self {
            qualified_name,
            name,
            rename: None,
            type_params: Vec::new(),
            attributes: Attributes::default(),
            kind,
            serializer: None,
            constructor: None,
        }
    }

    /// Appends a property (ignored for enums)
    pub fn property(mut self, property: PropertyDef) -> Self {
        if let TypeDefKind::Object { properties, .. } = &mut self.kind {
            properties.push(property);
        }
        self
    }

    /// Declares a supertype whose properties are inherited
    pub fn extends(mut self, supertype: TypeRef) -> Self {
        if let TypeDefKind::Object { supertypes, .. } = &mut self.kind {
            supertypes.push(supertype);
        }
        self
    }

    pub fn type_params<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.type_params = params.into_iter().map(Into::into).collect();
        self
    }

    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.rename = Some(name.into());
        self
    }

    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn with_serializer(mut self, serializer: SerializerDescriptor) -> Self {
        self.serializer = Some(serializer);
        self
    }

    pub fn with_constructor(mut self, params: Vec<ConstructorParam>) -> Self {
        self.constructor = Some(params);
        self
    }

    pub fn properties(&self) -> &[PropertyDef] {
        match &self.kind {
            TypeDefKind::Object { properties, .. } => properties,
            TypeDefKind::Enum { .. } => &[],
        }
    }

    pub fn supertypes(&self) -> &[TypeRef] {
        match &self.kind {
            TypeDefKind::Object { supertypes, .. } => supertypes,
            TypeDefKind::Enum { .. } => &[],
        }
    }

    pub fn is_enum(&self) -> bool {
        matches!(self.kind, TypeDefKind::Enum { .. })
    }
}

impl PropertyDef {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            public: true,
            attributes: Attributes::default(),
            renames: Vec::new(),
            required: None,
            ignored: false,
        }
    }

    pub fn renamed_by(mut self, source: RenameSource, name: impl Into<String>) -> Self {
        self.renames.push(RenameDirective {
            source,
            name: name.into(),
        });
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    pub fn ignored(mut self) -> Self {
        self.ignored = true;
        self
    }

    pub fn private(mut self) -> Self {
        self.public = false;
        self
    }

    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }
}
