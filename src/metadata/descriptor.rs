use super::model::{PropertyDef, RenameSource, TypeDef};
use super::TypeMetadataProvider;
use log::{debug, warn};

/// Effective metadata of a property after applying renames and requiredness rules
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyMetadata {
    /// Name after applying the winning rename directive
    pub name: String,
    /// Declared name when a rename was applied
    pub original_name: Option<String>,
    pub nullable: bool,
    pub transient: bool,
    pub required: bool,
}

/// Effective metadata of a type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeMetadata {
    pub name: String,
    pub original_name: Option<String>,
}

/// Resolves names, nullability, transience and requiredness from type metadata.
pub struct MetadataDescriptor;

impl MetadataDescriptor {
    /// Describes a type: its display name honours a class-level rename
    pub fn of_type(def: &TypeDef) -> TypeMetadata {
        match &def.rename {
            Some(rename) if *rename != def.name => TypeMetadata {
                name: rename.clone(),
                original_name: Some(def.name.clone()),
            },
            _ => TypeMetadata {
                name: def.name.clone(),
                original_name: None,
            },
        }
    }

    /// Describes a property declared on `owner`
    pub fn of_property(
        provider: &dyn TypeMetadataProvider,
        owner: &TypeDef,
        property: &PropertyDef,
    ) -> PropertyMetadata {
        let (name, original_name) = match Self::effective_rename(property) {
            Some(rename) if rename != property.name => {
                (rename.to_string(), Some(property.name.clone()))
            }
            _ => (property.name.clone(), None),
        };

        PropertyMetadata {
            name,
            original_name,
            nullable: property.ty.nullable,
            transient: property.ignored,
            required: Self::is_required(provider, owner, property),
        }
    }

    /// First serializer rename wins, then the first metadata rename
    fn effective_rename(property: &PropertyDef) -> Option<&str> {
        [RenameSource::Serializer, RenameSource::Metadata]
            .iter()
            .find_map(|source| {
                property
                    .renames
                    .iter()
                    .find(|directive| directive.source == *source)
            })
            .map(|directive| directive.name.as_str())
    }

    fn is_required(
        provider: &dyn TypeMetadataProvider,
        owner: &TypeDef,
        property: &PropertyDef,
    ) -> bool {
        if let Some(required) = property.required {
            return required;
        }
        if property.ignored {
            return false;
        }

        match provider.serializer_optionality(owner, property) {
            Ok(Some(optional)) => return !optional,
            Ok(None) => debug!(
                "No serializer descriptor for {}, checking constructor defaults",
                owner.qualified_name
            ),
            Err(e) => warn!("{}; falling back to constructor defaults", e),
        }

        // a property without a matching constructor parameter is required
        match provider.constructor_default(owner, property) {
            Some(has_default) => !has_default,
            None => true,
        }
    }
}
