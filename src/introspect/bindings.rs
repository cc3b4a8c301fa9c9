use crate::descriptor::{TypeArg, TypeRef};
use std::collections::HashMap;

/// Generic type-parameter bindings threaded through a resolution.
///
/// Bindings are never mutated in place: [`extended`](Self::extended) returns a new map so
/// sibling resolutions cannot see each other's parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings {
    /// Parameter name -> bound type, `None` when the parameter is unbound
    params: HashMap<String, Option<TypeRef>>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy that also binds `params` to `args`, position by position.
    ///
    /// Missing and wildcard arguments leave their parameter unbound.
    pub fn extended(&self, params: &[String], args: &[TypeArg]) -> Self {
        let mut extended = self.clone();
        for (i, param) in params.iter().enumerate() {
            let bound = match args.get(i) {
                Some(TypeArg::Type(ty)) => Some(ty.clone()),
                _ => None,
            };
            extended.params.insert(param.clone(), bound);
        }
        extended
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Whether `name` is a known parameter, bound or not
    pub fn contains(&self, name: &str) -> bool {
        self.params.contains_key(name)
    }

    /// The type bound to `name`, if any
    pub fn get(&self, name: &str) -> Option<&TypeRef> {
        self.params.get(name).and_then(Option::as_ref)
    }

    /// Replaces type parameters in `ty` by their bindings.
    ///
    /// Returns `None` when `ty` itself is an unbound parameter. Unbound parameters nested in
    /// generic arguments become wildcards.
    pub fn substitute(&self, ty: &TypeRef) -> Option<TypeRef> {
        if ty.args.is_empty() {
            if let Some(bound) = self.params.get(&ty.classifier) {
                let mut bound = bound.clone()?;
                bound.nullable |= ty.nullable;
                return Some(bound);
            }
        }

        let args = ty
            .args
            .iter()
            .map(|arg| match arg {
                TypeArg::Type(inner) => self
                    .substitute(inner)
                    .map_or(TypeArg::Wildcard, TypeArg::Type),
                TypeArg::Wildcard => TypeArg::Wildcard,
            })
            .collect();

        Some(TypeRef {
            classifier: ty.classifier.clone(),
            args,
            nullable: ty.nullable,
        })
    }
}
