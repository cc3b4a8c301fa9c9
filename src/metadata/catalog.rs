use super::model::{TypeDef, TypeDefKind};
use super::TypeMetadataProvider;
use crate::descriptor::{simple_name, TypeRef};
use crate::error::{Error, Result};
use indexmap::IndexMap;
use log::{debug, warn};
use std::collections::HashSet;

/// In-memory metadata provider.
///
/// Definitions are validated when registered, so configuration mistakes (blank names,
/// duplicate types, impossible constraints) fail here instead of during introspection.
#[derive(Debug, Clone, Default)]
pub struct TypeCatalog {
    types: IndexMap<String, TypeDef>,
}

impl TypeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a definition
    ///
    /// # Errors
    ///
    /// Returns an error if the definition is malformed or its qualified name is taken.
    pub fn register(&mut self, def: TypeDef) -> Result<()> {
        Self::validate(&def)?;
        if self.types.contains_key(&def.qualified_name) {
            return Err(Error::DuplicateType(def.qualified_name));
        }
        debug!("Registered type {}", def.qualified_name);
        self.types.insert(def.qualified_name.clone(), def);
        Ok(())
    }

    /// Builder-style [`register`](Self::register)
    pub fn with(mut self, def: TypeDef) -> Result<Self> {
        self.register(def)?;
        Ok(self)
    }

    pub fn get(&self, qualified_name: &str) -> Option<&TypeDef> {
        self.types.get(qualified_name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TypeDef> {
        self.types.values()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Rewrites every classifier in `ty` that names a registered type to its qualified name
    pub fn qualify(&self, ty: &mut TypeRef) {
        ty.for_each_classifier_mut(&mut |classifier| {
            if let Some(def) = self.type_def(classifier) {
                if *classifier != def.qualified_name {
                    *classifier = def.qualified_name.clone();
                }
            }
        });
    }

    fn validate(def: &TypeDef) -> Result<()> {
        if def.qualified_name.trim().is_empty() || def.name.trim().is_empty() {
            return Err(Error::InvalidArgument("type name must not be blank".to_string()));
        }
        if let Some(rename) = &def.rename {
            if rename.trim().is_empty() {
                return Err(Error::InvalidArgument(format!(
                    "rename of {} must not be blank",
                    def.qualified_name
                )));
            }
        }
        def.attributes.validate(&def.qualified_name)?;

        match &def.kind {
            TypeDefKind::Object { properties, .. } => {
                let mut seen = HashSet::new();
                for property in properties {
                    let target = format!("{}.{}", def.qualified_name, property.name);
                    if property.name.trim().is_empty() {
                        return Err(Error::InvalidArgument(format!(
                            "{} has a property with a blank name",
                            def.qualified_name
                        )));
                    }
                    if !seen.insert(property.name.as_str()) {
                        return Err(Error::InvalidArgument(format!(
                            "property {} is declared twice",
                            target
                        )));
                    }
                    if property.renames.iter().any(|r| r.name.trim().is_empty()) {
                        return Err(Error::InvalidArgument(format!(
                            "rename of {} must not be blank",
                            target
                        )));
                    }
                    property.attributes.validate(&target)?;
                }
            }
            TypeDefKind::Enum { variants } => {
                if variants.iter().any(|v| v.trim().is_empty()) {
                    return Err(Error::InvalidArgument(format!(
                        "{} has a blank enum constant",
                        def.qualified_name
                    )));
                }
            }
        }
        Ok(())
    }
}

impl TypeMetadataProvider for TypeCatalog {
    fn type_def_exact(&self, qualified_name: &str) -> Option<&TypeDef> {
        self.types.get(qualified_name)
    }

    /// Exact match first, then a unique match on the trailing path segments
    /// (`Employee`, `models::Employee`).
    fn type_def(&self, classifier: &str) -> Option<&TypeDef> {
        if let Some(def) = self.types.get(classifier) {
            return Some(def);
        }

        let classifier = classifier.trim_start_matches("::");
        let suffix = format!("::{}", classifier);
        let name = simple_name(classifier);
        let mut candidates = self
            .types
            .values()
            .filter(|def| def.name == name && def.qualified_name.ends_with(&suffix));

        let first = candidates.next()?;
        if candidates.next().is_some() {
            warn!(
                "Type `{}` is ambiguous in the catalog; use a qualified path",
                classifier
            );
            return None;
        }
        Some(first)
    }
}
