//! The type-introspection engine.
//!
//! An [`IntrospectionSession`] turns [`TypeRef`]s into [`ElementSchema`]s. Named types
//! (objects and enums) are registered once per qualified identity in the session's
//! [`SchemaRegistry`] and referenced everywhere else; primitives, arrays and maps stay
//! inline.
//!
//! Object types are registered as an empty placeholder before their properties are
//! resolved, so a property that leads back to its own declaring type (directly or through
//! other types) resolves to a reference instead of recursing forever.
//!
//! ```
//! use openapi_introspect::descriptor::TypeRef;
//! use openapi_introspect::introspect::IntrospectionSession;
//! use openapi_introspect::metadata::{PropertyDef, TypeCatalog, TypeDef};
//!
//! let catalog = TypeCatalog::new()
//!     .with(
//!         TypeDef::object("crate::Node")
//!             .property(PropertyDef::new("next", TypeRef::named("crate::Node").nullable())),
//!     )
//!     .unwrap();
//!
//! let mut session = IntrospectionSession::new(&catalog);
//! let schema = session.resolve(&TypeRef::named("Node"));
//! assert_eq!(schema.as_reference().unwrap().name, "Node");
//! assert_eq!(session.registry().len(), 1);
//! ```

mod array;
mod bindings;
mod collection;
pub mod conflicts;
mod enums;
mod map;
mod object;
mod property;
mod registry;

pub use array::ArrayResolver;
pub use bindings::Bindings;
pub use collection::CollectionResolver;
pub use conflicts::Conflict;
pub use enums::EnumResolver;
pub use map::MapResolver;
pub use object::ObjectResolver;
pub use property::{OrderedProperty, PropertyResolver};
pub use registry::{SchemaRegistry, TypeSchema};

use crate::descriptor::{TypeArg, TypeRef, ARRAY_CLASSIFIER};
use crate::error::Result;
use crate::metadata::{MetadataDescriptor, TypeMetadataProvider, TypeShape};
use crate::schema::{ElementSchema, SchemaFactory, SchemaRef};
use log::{debug, warn};
use std::collections::HashMap;

/// Result of a generation pass: the named schemas and the naming conflicts among them
#[derive(Debug, Clone)]
pub struct IntrospectionOutput {
    pub registry: SchemaRegistry,
    pub conflicts: Vec<Conflict>,
}

/// One schema-generation pass over a metadata provider.
///
/// The session owns the registry and the set of types whose properties are being resolved.
/// Sessions are not shared between threads; create one per pass.
pub struct IntrospectionSession<'p> {
    provider: &'p dyn TypeMetadataProvider,
    registry: SchemaRegistry,
    /// Objects between placeholder insertion and completion, by identity
    in_flight: HashMap<String, SchemaRef>,
}

impl<'p> IntrospectionSession<'p> {
    pub fn new(provider: &'p dyn TypeMetadataProvider) -> Self {
        Self {
            provider,
            registry: SchemaRegistry::new(),
            in_flight: HashMap::new(),
        }
    }

    pub fn provider(&self) -> &'p dyn TypeMetadataProvider {
        self.provider
    }

    /// Resolves a top-level type
    pub fn resolve(&mut self, ty: &TypeRef) -> ElementSchema {
        self.resolve_with(ty, &Bindings::new())
    }

    /// Parses a type expression (`"Page<Employee>"`) and resolves it
    ///
    /// # Errors
    ///
    /// Returns an error if `expr` is not a valid Rust type.
    pub fn resolve_expr(&mut self, expr: &str) -> Result<ElementSchema> {
        let ty = TypeRef::parse(expr)?;
        Ok(self.resolve(&ty))
    }

    /// Resolves `ty` with generic parameters substituted from `bindings`.
    ///
    /// Nullability is not part of the returned schema; callers record it next to it.
    pub fn resolve_with(&mut self, ty: &TypeRef, bindings: &Bindings) -> ElementSchema {
        let Some(ty) = bindings.substitute(ty) else {
            warn!("Type parameter {} is unbound; using an object schema", ty);
            return SchemaFactory::empty_object();
        };
        let ty = self.canonical(&ty);
        debug!("Resolving {}", ty.qualified());

        let provider = self.provider;
        match provider.shape(&ty) {
            TypeShape::Primitive(kind) => SchemaFactory::primitive(kind),
            TypeShape::Array => ArrayResolver::resolve(self, &ty),
            TypeShape::Collection(kind) => CollectionResolver::resolve(self, &ty, kind),
            TypeShape::Map => MapResolver::resolve(self, &ty),
            TypeShape::Enum(def) => EnumResolver::resolve(self, def),
            TypeShape::Object(def) => ObjectResolver::resolve(self, &ty, def),
            TypeShape::FreeForm => SchemaFactory::empty_object(),
            TypeShape::Unknown => {
                warn!("Type {} is not known; using an object schema", ty);
                SchemaFactory::empty_object()
            }
        }
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Naming conflicts among the types resolved so far
    pub fn conflicts(&self) -> Vec<Conflict> {
        conflicts::detect(&self.registry)
    }

    /// Forgets every resolved type
    pub fn clear(&mut self) {
        self.registry.clear();
        self.in_flight.clear();
    }

    pub fn into_output(self) -> IntrospectionOutput {
        let conflicts = conflicts::detect(&self.registry);
        IntrospectionOutput {
            registry: self.registry,
            conflicts,
        }
    }

    /// Qualifies every user-type classifier in `ty`, so `Page<Employee>` and
    /// `crate::models::Page<crate::models::Employee>` share one identity.
    pub(crate) fn canonical(&self, ty: &TypeRef) -> TypeRef {
        let mut canonical = ty.clone();
        canonical.for_each_classifier_mut(&mut |classifier| {
            let probe = TypeRef::named(classifier.as_str());
            if let TypeShape::Object(def) | TypeShape::Enum(def) = self.provider.shape(&probe) {
                if *classifier != def.qualified_name {
                    *classifier = def.qualified_name.clone();
                }
            }
        });
        canonical
    }

    /// Component name of a type: the declared (or renamed) name, followed by the names of
    /// its generic arguments joined by `_`. Nullable arguments are prefixed with `Option_`.
    pub(crate) fn display_name(&self, ty: &TypeRef) -> String {
        let mut parts = Vec::new();
        if ty.classifier == ARRAY_CLASSIFIER {
            parts.push("Array".to_string());
        } else {
            let base = match self.provider.type_def_exact(&ty.classifier) {
                Some(def) => MetadataDescriptor::of_type(def).name,
                None => ty.simple_name().to_string(),
            };
            parts.push(sanitize(&base));
        }
        for arg in &ty.args {
            match arg {
                TypeArg::Type(inner) if inner.nullable => {
                    parts.push(format!("Option_{}", self.display_name(inner)))
                }
                TypeArg::Type(inner) => parts.push(self.display_name(inner)),
                TypeArg::Wildcard => parts.push("Any".to_string()),
            }
        }
        parts.join("_")
    }
}

/// Restricts a component name to `[A-Za-z0-9._-]`
pub(crate) fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
