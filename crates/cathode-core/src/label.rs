//! Display labels for entities, used to build resolution breadcrumbs.
//!
//! Labels never influence resolution. They are only text for humans.

use crate::composite::Composite;
use crate::entity::EntityRef;
use crate::names::EntityNameTable;
use crate::registry::IdentifierRegistry;

/// Produces a human-readable label for an entity.
pub trait EntityLabeler {
    fn label(&self, composite: &Composite, entity: EntityRef<'_>) -> String;
}

/// Labels entities by their raw identifier bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdLabeler;

impl EntityLabeler for IdLabeler {
    fn label(&self, _composite: &Composite, entity: EntityRef<'_>) -> String {
        entity.id().to_byte_string()
    }
}

/// Labels entities by custom display name, falling back to the registry.
#[derive(Debug, Clone, Copy)]
pub struct RegistryLabeler<'a> {
    registry: &'a IdentifierRegistry,
    names: Option<&'a EntityNameTable>,
}

impl<'a> RegistryLabeler<'a> {
    pub fn new(registry: &'a IdentifierRegistry) -> Self {
        RegistryLabeler {
            registry,
            names: None,
        }
    }

    /// Prefers custom entity names from `names` where one is set.
    pub fn with_entity_names(mut self, names: &'a EntityNameTable) -> Self {
        self.names = Some(names);
        self
    }
}

impl EntityLabeler for RegistryLabeler<'_> {
    fn label(&self, composite: &Composite, entity: EntityRef<'_>) -> String {
        if let Some(custom) = self
            .names
            .and_then(|names| names.get(composite.id, entity.id()))
        {
            return custom.to_string();
        }
        self.registry.find_string(entity.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::FunctionEntity;
    use crate::id::Identifier;

    #[test]
    fn registry_labels_and_overrides() {
        let mut registry = IdentifierRegistry::new();
        let composite_id = registry.generate("Level");
        let door = registry.generate("Door");
        let anonymous = Identifier([0xDE, 0xAD, 0xBE, 0xEF]);

        let mut composite = Composite::new(composite_id, "Level");
        composite.add_function(FunctionEntity::new(door, Identifier([1, 0, 0, 0])));
        composite.add_function(FunctionEntity::new(anonymous, Identifier([1, 0, 0, 0])));

        let plain = RegistryLabeler::new(&registry);
        assert_eq!(plain.label(&composite, composite.entity(door).unwrap()), "Door");
        assert_eq!(
            plain.label(&composite, composite.entity(anonymous).unwrap()),
            "DE-AD-BE-EF"
        );

        let mut names = EntityNameTable::new();
        names.set(composite_id, door, "Front Door");
        let named = RegistryLabeler::new(&registry).with_entity_names(&names);
        assert_eq!(named.label(&composite, composite.entity(door).unwrap()), "Front Door");
    }

    #[test]
    fn id_labeler_uses_bytes() {
        let composite = {
            let mut c = Composite::new(Identifier([9, 9, 9, 9]), "C");
            c.add_function(FunctionEntity::new(Identifier([1, 2, 3, 4]), Identifier([5, 0, 0, 0])));
            c
        };
        let entity = composite.entity(Identifier([1, 2, 3, 4])).unwrap();
        assert_eq!(IdLabeler.label(&composite, entity), "01-02-03-04");
    }
}
