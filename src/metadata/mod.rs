//! Type metadata consumed by the introspection engine.
//!
//! The engine never looks at source code or attributes directly. A binding layer fills a
//! [`TypeCatalog`] once (by hand through its builder API, or from parsed Rust files through
//! [`SourceCatalog`]) and the engine queries it through the [`TypeMetadataProvider`] trait.
//!
//! The provider exposes capability probes (`is_primitive`, `is_array_like`, `is_map_like`,
//! `is_enum_like`, `has_declared_properties`) that collapse into a single closed
//! [`TypeShape`] tag the resolvers match on.

mod attributes;
mod catalog;
mod descriptor;
mod model;
mod source;

pub use catalog::TypeCatalog;
pub use descriptor::{MetadataDescriptor, PropertyMetadata, TypeMetadata};
pub use model::{
    Attributes, ConstructorParam, FieldOptionality, PropertyDef, RenameDirective, RenameSource,
    SerializerDescriptor, TypeDef, TypeDefKind,
};
pub use source::SourceCatalog;

use crate::descriptor::{simple_name, TypeRef, ARRAY_CLASSIFIER};
use thiserror::Error;

/// Types that carry arbitrary JSON and map to a free-form object.
const FREE_FORM_TYPES: &[&str] = &["Value", "JsonValue", "Any"];

/// Failure to extract metadata for a single property.
///
/// These never abort introspection; the caller logs them and falls back to a conservative
/// default.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetadataError {
    #[error("malformed attribute on `{owner}.{property}`: {message}")]
    MalformedAttribute {
        owner: String,
        property: String,
        message: String,
    },

    #[error("serializer descriptor of `{owner}` has no field `{property}`")]
    UnknownField { owner: String, property: String },
}

/// Well-known scalar types that map directly to a primitive schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    String,
    Char,
    Bool,
    I8,
    I16,
    I32,
    I64,
    I128,
    Isize,
    U8,
    U16,
    U32,
    U64,
    U128,
    Usize,
    F32,
    F64,
    Uuid,
    DateTime,
    Date,
    Time,
    Duration,
    Uri,
    Ipv4,
    Ipv6,
    Binary,
}

impl PrimitiveKind {
    /// Maps a classifier (by its last path segment) to a primitive kind
    pub fn from_classifier(classifier: &str) -> Option<Self> {
        let kind = match simple_name(classifier) {
            "String" | "str" => Self::String,
            "char" => Self::Char,
            "bool" => Self::Bool,
            "i8" => Self::I8,
            "i16" => Self::I16,
            "i32" => Self::I32,
            "i64" => Self::I64,
            "i128" => Self::I128,
            "isize" => Self::Isize,
            "u8" => Self::U8,
            "u16" => Self::U16,
            "u32" => Self::U32,
            "u64" => Self::U64,
            "u128" => Self::U128,
            "usize" => Self::Usize,
            "f32" => Self::F32,
            "f64" => Self::F64,
            "Uuid" => Self::Uuid,
            "DateTime" | "NaiveDateTime" | "OffsetDateTime" | "PrimitiveDateTime" | "SystemTime" | "Timestamp" => {
                Self::DateTime
            }
            "NaiveDate" | "Date" => Self::Date,
            "NaiveTime" | "Time" => Self::Time,
            "Duration" => Self::Duration,
            "Url" | "Uri" => Self::Uri,
            "Ipv4Addr" => Self::Ipv4,
            "Ipv6Addr" => Self::Ipv6,
            "Bytes" | "BytesMut" | "ByteBuf" => Self::Binary,
            _ => return None,
        };
        Some(kind)
    }

    /// Whether values of this kind serialize as JSON strings
    pub fn is_string_like(self) -> bool {
        matches!(
            self,
            Self::String
                | Self::Char
                | Self::Uuid
                | Self::DateTime
                | Self::Date
                | Self::Time
                | Self::Duration
                | Self::Uri
                | Self::Ipv4
                | Self::Ipv6
                | Self::Binary
        )
    }

    pub fn is_integer(self) -> bool {
        matches!(
            self,
            Self::I8
                | Self::I16
                | Self::I32
                | Self::I64
                | Self::I128
                | Self::Isize
                | Self::U8
                | Self::U16
                | Self::U32
                | Self::U64
                | Self::U128
                | Self::Usize
        )
    }

    pub fn is_numeric(self) -> bool {
        self.is_integer() || matches!(self, Self::F32 | Self::F64)
    }

    pub fn is_unsigned(self) -> bool {
        matches!(self, Self::U8 | Self::U16 | Self::U32 | Self::U64 | Self::U128 | Self::Usize)
    }

    /// Element kinds that form a primitive array (`[i32; N]`, `[bool; N]`, ...)
    pub fn is_primitive_array_element(self) -> bool {
        self.is_numeric() || matches!(self, Self::Bool | Self::Char)
    }
}

/// Homogeneous collection flavours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKind {
    List,
    Set,
}

/// Standard-library and common container types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    /// `[T; N]` and `[T]`
    Array,
    Collection(CollectionKind),
    Map,
}

impl ContainerKind {
    pub fn from_classifier(classifier: &str) -> Option<Self> {
        if classifier == ARRAY_CLASSIFIER {
            return Some(Self::Array);
        }
        let kind = match simple_name(classifier) {
            "Vec" | "VecDeque" | "LinkedList" | "BinaryHeap" | "SmallVec" => Self::Collection(CollectionKind::List),
            "HashSet" | "BTreeSet" | "IndexSet" => Self::Collection(CollectionKind::Set),
            "HashMap" | "BTreeMap" | "IndexMap" => Self::Map,
            _ => return None,
        };
        Some(kind)
    }
}

/// Closed classification of a type, computed once per descriptor.
#[derive(Debug, Clone, Copy)]
pub enum TypeShape<'a> {
    Primitive(PrimitiveKind),
    Array,
    Collection(CollectionKind),
    Map,
    Enum(&'a TypeDef),
    Object(&'a TypeDef),
    /// Arbitrary JSON (`serde_json::Value`)
    FreeForm,
    Unknown,
}

/// Read-only access to the metadata of the host application's types.
pub trait TypeMetadataProvider {
    /// Looks up a definition by its exact qualified name
    fn type_def_exact(&self, qualified_name: &str) -> Option<&TypeDef>;

    /// Looks up a definition by classifier; implementations may accept partial paths
    fn type_def(&self, classifier: &str) -> Option<&TypeDef> {
        self.type_def_exact(classifier)
    }

    /// Whether a property is optional according to the type's serializer descriptor.
    ///
    /// `Ok(None)` means no serializer is registered for the owning type.
    fn serializer_optionality(
        &self,
        owner: &TypeDef,
        property: &PropertyDef,
    ) -> Result<Option<bool>, MetadataError> {
        let Some(descriptor) = &owner.serializer else {
            return Ok(None);
        };
        match descriptor.fields.get(&property.name) {
            Some(FieldOptionality::Required) => Ok(Some(false)),
            Some(FieldOptionality::Optional) => Ok(Some(true)),
            Some(FieldOptionality::Malformed(message)) => Err(MetadataError::MalformedAttribute {
                owner: owner.qualified_name.clone(),
                property: property.name.clone(),
                message: message.clone(),
            }),
            None => Err(MetadataError::UnknownField {
                owner: owner.qualified_name.clone(),
                property: property.name.clone(),
            }),
        }
    }

    /// Whether the constructor parameter backing `property` has a default value.
    ///
    /// `None` when the type has no constructor or no parameter of that name.
    fn constructor_default(&self, owner: &TypeDef, property: &PropertyDef) -> Option<bool> {
        owner
            .constructor
            .as_ref()?
            .iter()
            .find(|param| param.name == property.name)
            .map(|param| param.has_default)
    }

    fn primitive_kind(&self, ty: &TypeRef) -> Option<PrimitiveKind> {
        match self.shape(ty) {
            TypeShape::Primitive(kind) => Some(kind),
            _ => None,
        }
    }

    fn is_primitive(&self, ty: &TypeRef) -> bool {
        self.primitive_kind(ty).is_some()
    }

    fn container_kind(&self, ty: &TypeRef) -> Option<ContainerKind> {
        match self.shape(ty) {
            TypeShape::Array => Some(ContainerKind::Array),
            TypeShape::Collection(kind) => Some(ContainerKind::Collection(kind)),
            TypeShape::Map => Some(ContainerKind::Map),
            _ => None,
        }
    }

    fn is_array_like(&self, ty: &TypeRef) -> bool {
        matches!(self.shape(ty), TypeShape::Array | TypeShape::Collection(_))
    }

    fn is_map_like(&self, ty: &TypeRef) -> bool {
        matches!(self.shape(ty), TypeShape::Map)
    }

    fn is_enum_like(&self, ty: &TypeRef) -> bool {
        matches!(self.shape(ty), TypeShape::Enum(_))
    }

    fn has_declared_properties(&self, ty: &TypeRef) -> bool {
        match self.shape(ty) {
            TypeShape::Object(def) => !def.properties().is_empty() || !def.supertypes().is_empty(),
            _ => false,
        }
    }

    /// Classifies a descriptor. Exact user definitions shadow well-known names.
    fn shape(&self, ty: &TypeRef) -> TypeShape<'_> {
        if let Some(def) = self.type_def_exact(&ty.classifier) {
            return def_shape(def);
        }
        if let Some(kind) = PrimitiveKind::from_classifier(&ty.classifier) {
            return TypeShape::Primitive(kind);
        }
        if let Some(container) = ContainerKind::from_classifier(&ty.classifier) {
            return match container {
                ContainerKind::Array => TypeShape::Array,
                ContainerKind::Collection(kind) => TypeShape::Collection(kind),
                ContainerKind::Map => TypeShape::Map,
            };
        }
        if FREE_FORM_TYPES.contains(&simple_name(&ty.classifier)) {
            return TypeShape::FreeForm;
        }
        match self.type_def(&ty.classifier) {
            Some(def) => def_shape(def),
            None => TypeShape::Unknown,
        }
    }
}

fn def_shape(def: &TypeDef) -> TypeShape<'_> {
    match def.kind {
        TypeDefKind::Enum { .. } => TypeShape::Enum(def),
        TypeDefKind::Object { .. } => TypeShape::Object(def),
    }
}
