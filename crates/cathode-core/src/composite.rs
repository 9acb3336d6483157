//! Composites and the program that holds them.
//!
//! A [`Composite`] is an independently addressable flow-graph. It owns its
//! entities in one ordered collection per variant. A [`Program`] is the whole
//! loaded archive: every composite keyed by identifier, plus the ordered entry
//! points used as starting scopes for hierarchy resolution.
//!
//! Both are normally populated by the archive loader; the builder methods
//! here exist for editing workflows and tests.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::entity::{
    AliasEntity, EntityCore, EntityRef, FunctionEntity, ProxyEntity, VariableEntity,
};
use crate::error::CoreError;
use crate::id::Identifier;

/// A named subgraph of entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Composite {
    pub id: Identifier,
    pub name: String,
    pub functions: Vec<FunctionEntity>,
    pub variables: Vec<VariableEntity>,
    pub proxies: Vec<ProxyEntity>,
    pub aliases: Vec<AliasEntity>,
}

impl Composite {
    /// Creates an empty composite.
    pub fn new(id: Identifier, name: impl Into<String>) -> Self {
        Composite {
            id,
            name: name.into(),
            functions: Vec::new(),
            variables: Vec::new(),
            proxies: Vec::new(),
            aliases: Vec::new(),
        }
    }

    /// Looks up an entity of any variant by identifier.
    ///
    /// Variables are checked first, then functions, aliases and proxies.
    pub fn entity(&self, id: Identifier) -> Option<EntityRef<'_>> {
        if let Some(e) = self.variables.iter().find(|e| e.core.id == id) {
            return Some(EntityRef::Variable(e));
        }
        if let Some(e) = self.functions.iter().find(|e| e.core.id == id) {
            return Some(EntityRef::Function(e));
        }
        if let Some(e) = self.aliases.iter().find(|e| e.core.id == id) {
            return Some(EntityRef::Alias(e));
        }
        self.proxies
            .iter()
            .find(|e| e.core.id == id)
            .map(EntityRef::Proxy)
    }

    /// Returns `true` if an entity with `id` exists in this composite.
    pub fn contains(&self, id: Identifier) -> bool {
        self.entity(id).is_some()
    }

    /// Mutable access to the shared state of any entity.
    pub fn core_mut(&mut self, id: Identifier) -> Option<&mut EntityCore> {
        self.cores_mut().find(|core| core.id == id)
    }

    /// Iterates every entity in storage order (variables, functions,
    /// aliases, proxies).
    pub fn entities(&self) -> impl Iterator<Item = EntityRef<'_>> {
        self.variables
            .iter()
            .map(EntityRef::Variable)
            .chain(self.functions.iter().map(EntityRef::Function))
            .chain(self.aliases.iter().map(EntityRef::Alias))
            .chain(self.proxies.iter().map(EntityRef::Proxy))
    }

    pub(crate) fn cores_mut(&mut self) -> impl Iterator<Item = &mut EntityCore> {
        self.variables
            .iter_mut()
            .map(|e| &mut e.core)
            .chain(self.functions.iter_mut().map(|e| &mut e.core))
            .chain(self.aliases.iter_mut().map(|e| &mut e.core))
            .chain(self.proxies.iter_mut().map(|e| &mut e.core))
    }

    pub fn entity_count(&self) -> usize {
        self.functions.len() + self.variables.len() + self.proxies.len() + self.aliases.len()
    }

    /// Appends a function entity and returns it for further setup.
    pub fn add_function(&mut self, entity: FunctionEntity) -> &mut FunctionEntity {
        self.functions.push(entity);
        let last = self.functions.len() - 1;
        &mut self.functions[last]
    }

    pub fn add_variable(&mut self, entity: VariableEntity) -> &mut VariableEntity {
        self.variables.push(entity);
        let last = self.variables.len() - 1;
        &mut self.variables[last]
    }

    pub fn add_proxy(&mut self, entity: ProxyEntity) -> &mut ProxyEntity {
        self.proxies.push(entity);
        let last = self.proxies.len() - 1;
        &mut self.proxies[last]
    }

    pub fn add_alias(&mut self, entity: AliasEntity) -> &mut AliasEntity {
        self.aliases.push(entity);
        let last = self.aliases.len() - 1;
        &mut self.aliases[last]
    }
}

/// The whole loaded archive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    composites: IndexMap<Identifier, Composite>,
    entry_points: Vec<Identifier>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a composite.
    ///
    /// Returns [`CoreError::DuplicateComposite`] if the identifier is taken.
    pub fn add_composite(&mut self, composite: Composite) -> Result<(), CoreError> {
        if self.composites.contains_key(&composite.id) {
            return Err(CoreError::DuplicateComposite { id: composite.id });
        }
        self.composites.insert(composite.id, composite);
        Ok(())
    }

    pub fn composite(&self, id: Identifier) -> Option<&Composite> {
        self.composites.get(&id)
    }

    pub fn composite_mut(&mut self, id: Identifier) -> Option<&mut Composite> {
        self.composites.get_mut(&id)
    }

    pub fn contains_composite(&self, id: Identifier) -> bool {
        self.composites.contains_key(&id)
    }

    /// Iterates composites in load order.
    pub fn composites(&self) -> impl Iterator<Item = &Composite> {
        self.composites.values()
    }

    /// Marks `id` as an entry point. The first entry point added is primary.
    ///
    /// Returns [`CoreError::CompositeNotFound`] for unknown composites.
    pub fn add_entry_point(&mut self, id: Identifier) -> Result<(), CoreError> {
        if !self.composites.contains_key(&id) {
            return Err(CoreError::CompositeNotFound { id });
        }
        if !self.entry_points.contains(&id) {
            self.entry_points.push(id);
        }
        Ok(())
    }

    pub fn entry_points(&self) -> &[Identifier] {
        &self.entry_points
    }

    /// The primary entry composite, if any entry point is set.
    pub fn primary_entry(&self) -> Option<&Composite> {
        self.entry_points
            .first()
            .and_then(|id| self.composites.get(id))
    }
}
