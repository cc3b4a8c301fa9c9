use crate::schema::{ElementSchema, SchemaId, SchemaRef};
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

/// A named schema in the registry.
///
/// Equality and hashing use only the qualified identity: two types with identical schemas
/// are still distinct entries.
#[derive(Debug, Clone)]
pub struct TypeSchema {
    pub id: SchemaId,
    /// Display name, used as the component name
    pub name: String,
    /// Declared name when the type was renamed
    pub original_name: Option<String>,
    /// Qualified identity, e.g. `crate::models::Page<crate::models::Employee>`
    pub qualified: String,
    pub schema: ElementSchema,
}

impl TypeSchema {
    pub fn reference(&self) -> SchemaRef {
        SchemaRef {
            id: self.id,
            name: self.name.clone(),
        }
    }
}

impl PartialEq for TypeSchema {
    fn eq(&self, other: &Self) -> bool {
        self.qualified == other.qualified
    }
}

impl Eq for TypeSchema {}

impl Hash for TypeSchema {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.qualified.hash(state);
    }
}

/// Arena of named schemas, indexed by qualified identity.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    entries: Vec<TypeSchema>,
    index: HashMap<String, SchemaId>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry unless its identity is already present; returns the entry's id
    pub(crate) fn insert(
        &mut self,
        name: String,
        original_name: Option<String>,
        qualified: String,
        schema: ElementSchema,
    ) -> SchemaId {
        if let Some(id) = self.index.get(&qualified) {
            return *id;
        }
        let id = SchemaId(self.entries.len());
        self.index.insert(qualified.clone(), id);
        self.entries.push(TypeSchema {
            id,
            name,
            original_name,
            qualified,
            schema,
        });
        id
    }

    pub fn get(&self, id: SchemaId) -> Option<&TypeSchema> {
        self.entries.get(id.0)
    }

    pub(crate) fn get_mut(&mut self, id: SchemaId) -> Option<&mut TypeSchema> {
        self.entries.get_mut(id.0)
    }

    pub fn by_identity(&self, qualified: &str) -> Option<&TypeSchema> {
        self.index.get(qualified).and_then(|id| self.get(*id))
    }

    /// Every entry with the given display name, in registration order
    pub fn find_by_name(&self, name: &str) -> Vec<&TypeSchema> {
        self.entries.iter().filter(|e| e.name == name).collect()
    }

    /// Entries in registration order
    pub fn iter(&self) -> impl Iterator<Item = &TypeSchema> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every entry; ids handed out before are invalid afterwards
    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }
}
