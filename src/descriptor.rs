//! Type descriptors handed to the introspection engine.
//!
//! A [`TypeRef`] is the engine's view of a Rust type: a classifier (the type's path), its
//! generic arguments and whether it is nullable. Descriptors are built either from parsed
//! source (`syn::Type`) or from a type expression string such as `"Page<Employee>"`.

use crate::error::{Error, Result};
use std::fmt;

/// Classifier used for fixed-size arrays and slices.
pub const ARRAY_CLASSIFIER: &str = "[]";
/// Classifier used for types the binding layer cannot describe (tuples, fn pointers, ...).
pub const UNSUPPORTED_CLASSIFIER: &str = "(unsupported)";

/// Wrapper types that serialize exactly like their inner type.
const TRANSPARENT_WRAPPERS: &[&str] = &["Box", "Rc", "Arc", "Cow", "RefCell", "Cell", "Mutex", "RwLock"];

/// Reference to a (possibly generic) type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeRef {
    /// Type path, e.g. `String`, `Vec`, `crate::models::User` or `T` for a type parameter
    pub classifier: String,
    /// Generic type arguments in declaration order
    pub args: Vec<TypeArg>,
    /// Whether the value may be absent (`Option<T>`)
    pub nullable: bool,
}

/// A single generic argument.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeArg {
    Type(TypeRef),
    /// `_` or any argument the binding layer could not express
    Wildcard,
}

impl TypeRef {
    /// Create a non-generic, non-nullable reference
    pub fn named(classifier: impl Into<String>) -> Self {
        Self {
            classifier: classifier.into(),
            args: Vec::new(),
            nullable: false,
        }
    }

    /// Create a generic reference with concrete arguments
    pub fn generic(classifier: impl Into<String>, args: Vec<TypeRef>) -> Self {
        Self {
            classifier: classifier.into(),
            args: args.into_iter().map(TypeArg::Type).collect(),
            nullable: false,
        }
    }

    /// `[T]` / `[T; N]`
    pub fn array_of(element: TypeRef) -> Self {
        Self::generic(ARRAY_CLASSIFIER, vec![element])
    }

    /// Mark this reference as nullable
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Returns the argument at `index` if it is a concrete type
    pub fn arg(&self, index: usize) -> Option<&TypeRef> {
        match self.args.get(index) {
            Some(TypeArg::Type(ty)) => Some(ty),
            _ => None,
        }
    }

    /// Last path segment of the classifier
    pub fn simple_name(&self) -> &str {
        simple_name(&self.classifier)
    }

    /// Canonical identity of this instantiation, ignoring its own nullability.
    ///
    /// `crate::models::Page<crate::models::Employee>` and `crate::models::Page` are distinct
    /// identities, and so are `Page<Employee>` and `Page<Option<Employee>>`.
    pub fn qualified(&self) -> String {
        let mut out = String::new();
        self.write_identity(&mut out, false);
        out
    }

    fn write_identity(&self, out: &mut String, simple: bool) {
        if self.classifier == ARRAY_CLASSIFIER {
            out.push('[');
            match self.args.first() {
                Some(TypeArg::Type(inner)) => inner.write_argument(out, simple),
                _ => out.push('_'),
            }
            out.push(']');
            return;
        }

        out.push_str(if simple {
            self.simple_name()
        } else {
            &self.classifier
        });
        if !self.args.is_empty() {
            out.push('<');
            for (i, arg) in self.args.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                match arg {
                    TypeArg::Type(ty) => ty.write_argument(out, simple),
                    TypeArg::Wildcard => out.push('_'),
                }
            }
            out.push('>');
        }
    }

    /// Nested arguments keep their nullability
    fn write_argument(&self, out: &mut String, simple: bool) {
        if self.nullable {
            out.push_str("Option<");
            self.write_identity(out, simple);
            out.push('>');
        } else {
            self.write_identity(out, simple);
        }
    }

    /// Builds a descriptor from a parsed Rust type
    pub fn from_syn(ty: &syn::Type) -> Self {
        match ty {
            syn::Type::Path(type_path) => Self::from_path(&type_path.path),
            syn::Type::Reference(reference) => Self::from_syn(&reference.elem),
            syn::Type::Paren(paren) => Self::from_syn(&paren.elem),
            syn::Type::Group(group) => Self::from_syn(&group.elem),
            syn::Type::Array(array) => Self::array_of(Self::from_syn(&array.elem)),
            syn::Type::Slice(slice) => Self::array_of(Self::from_syn(&slice.elem)),
            _ => Self::named(UNSUPPORTED_CLASSIFIER),
        }
    }

    fn from_path(path: &syn::Path) -> Self {
        let Some(last) = path.segments.last() else {
            return Self::named(UNSUPPORTED_CLASSIFIER);
        };
        let ident = last.ident.to_string();

        let mut args = Vec::new();
        if let syn::PathArguments::AngleBracketed(angle) = &last.arguments {
            for arg in &angle.args {
                match arg {
                    syn::GenericArgument::Type(syn::Type::Infer(_)) => args.push(TypeArg::Wildcard),
                    syn::GenericArgument::Type(inner) => args.push(TypeArg::Type(Self::from_syn(inner))),
                    // lifetimes, const generics and associated bindings carry no schema
                    _ => {}
                }
            }
        }

        if ident == "Option" {
            return match args.into_iter().next() {
                Some(TypeArg::Type(inner)) => inner.nullable(),
                _ => Self::named(UNSUPPORTED_CLASSIFIER).nullable(),
            };
        }
        if TRANSPARENT_WRAPPERS.contains(&ident.as_str()) {
            // Cow<'a, T> has a lifetime first, which is already filtered out
            if let Some(TypeArg::Type(inner)) = args.into_iter().next() {
                return inner;
            }
            return Self::named(UNSUPPORTED_CLASSIFIER);
        }

        let classifier = path
            .segments
            .iter()
            .map(|segment| segment.ident.to_string())
            .collect::<Vec<_>>()
            .join("::");
        let classifier = if path.leading_colon.is_some() {
            format!("::{}", classifier)
        } else {
            classifier
        };

        Self {
            classifier,
            args,
            nullable: false,
        }
    }

    /// Parses a type expression such as `Page<Employee>` or `Option<[u8; 4]>`
    pub fn parse(expr: &str) -> Result<Self> {
        let ty: syn::Type = syn::parse_str(expr).map_err(|e| Error::InvalidTypeExpression {
            expr: expr.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self::from_syn(&ty))
    }

    /// Visits every classifier in this reference, outermost first
    pub fn for_each_classifier_mut(&mut self, f: &mut impl FnMut(&mut String)) {
        f(&mut self.classifier);
        for arg in &mut self.args {
            if let TypeArg::Type(inner) = arg {
                inner.for_each_classifier_mut(f);
            }
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        self.write_identity(&mut out, true);
        if self.nullable {
            write!(f, "Option<{}>", out)
        } else {
            f.write_str(&out)
        }
    }
}

/// Last `::`-separated segment of a path
pub fn simple_name(path: &str) -> &str {
    path.rsplit("::").next().unwrap_or(path)
}
