use super::{Bindings, IntrospectionSession, PropertyResolver};
use crate::descriptor::TypeRef;
use crate::metadata::{MetadataDescriptor, TypeDef};
use crate::schema::{ElementSchema, SchemaFactory, SchemaRef};
use log::{debug, warn};

/// Resolves data-carrying object types into named, cycle-safe registry entries.
pub struct ObjectResolver;

impl ObjectResolver {
    /// Registers `ty` (an instantiation of `def`) and returns a reference to it.
    ///
    /// `ty` must already be canonical. A type that is registered or in flight resolves to a
    /// reference without touching its properties again.
    pub fn resolve(session: &mut IntrospectionSession<'_>, ty: &TypeRef, def: &TypeDef) -> ElementSchema {
        let identity = ty.qualified();

        if let Some(reference) = session.in_flight.get(&identity) {
            debug!("{} is being resolved; breaking the cycle with a reference", identity);
            return ElementSchema::Reference(reference.clone());
        }
        if let Some(existing) = session.registry.by_identity(&identity) {
            return ElementSchema::Reference(existing.reference());
        }

        let metadata = MetadataDescriptor::of_type(def);
        let name = session.display_name(ty);
        let placeholder = SchemaFactory::object(SchemaFactory::meta_from(&def.attributes));
        let id = session
            .registry
            .insert(name.clone(), metadata.original_name, identity.clone(), placeholder);
        session.in_flight.insert(
            identity.clone(),
            SchemaRef {
                id,
                name: name.clone(),
            },
        );
        debug!("Registered placeholder {} for {}", name, identity);

        let provider = session.provider();
        let bindings = Bindings::new().extended(&def.type_params, &ty.args);
        let properties = PropertyResolver::ordered_properties(provider, def, &bindings);
        if properties.is_empty() {
            warn!("{} has no public properties; its schema has none", identity);
        }

        for ordered in properties {
            let (property_name, property) =
                PropertyResolver::traverse(session, ordered.owner, ordered.property, &ordered.bindings);
            match session
                .registry
                .get_mut(id)
                .and_then(|entry| entry.schema.as_object_mut())
            {
                Some(object) => {
                    if object.properties.insert(property_name.clone(), property).is_some() {
                        warn!(
                            "{} has two properties named {}; keeping the later one",
                            identity, property_name
                        );
                    }
                }
                None => warn!("Placeholder of {} disappeared during resolution", identity),
            }
        }

        session.in_flight.remove(&identity);
        debug!("Resolved {}", identity);
        SchemaFactory::reference(id, name)
    }
}
