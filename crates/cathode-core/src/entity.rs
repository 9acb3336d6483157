//! Entities: the typed nodes of a composite.
//!
//! Each entity variant is its own struct sharing an [`EntityCore`] (identity
//! plus outgoing child links). A composite stores the variants in separate
//! ordered collections; [`EntityRef`] is the closed view over all four used by
//! lookups and resolution.

use serde::{Deserialize, Serialize};

use crate::hierarchy::Hierarchy;
use crate::id::Identifier;

/// Direction tag on a child link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkDirection {
    Input,
    Output,
}

/// An edge from one entity's parameter to another entity in the same
/// composite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildLink {
    /// Identity of the link itself.
    pub id: Identifier,
    /// Parameter on the owning entity.
    pub parameter: Identifier,
    /// Entity the link points at.
    pub target: Identifier,
    /// Parameter on the target entity.
    pub target_parameter: Identifier,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<LinkDirection>,
}

impl ChildLink {
    pub fn new(
        id: Identifier,
        parameter: Identifier,
        target: Identifier,
        target_parameter: Identifier,
    ) -> Self {
        ChildLink {
            id,
            parameter,
            target,
            target_parameter,
            direction: None,
        }
    }
}

/// State common to every entity variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityCore {
    pub id: Identifier,
    pub child_links: Vec<ChildLink>,
}

impl EntityCore {
    pub fn new(id: Identifier) -> Self {
        EntityCore {
            id,
            child_links: Vec::new(),
        }
    }
}

/// Variant tag of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityVariant {
    Function,
    Variable,
    Proxy,
    Alias,
}

/// A call to a builtin function type or, when `function` names a composite,
/// to that composite as a sub-graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionEntity {
    pub core: EntityCore,
    pub function: Identifier,
    #[serde(default)]
    pub extras: FunctionExtras,
}

impl FunctionEntity {
    pub fn new(id: Identifier, function: Identifier) -> Self {
        FunctionEntity {
            core: EntityCore::new(id),
            function,
            extras: FunctionExtras::None,
        }
    }
}

/// Reference lists owned by specialised function types.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum FunctionExtras {
    #[default]
    None,
    TriggerSequence(TriggerSequence),
    CageAnimation(CageAnimation),
}

/// Ordered, timed triggers of other entities.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriggerSequence {
    pub triggers: Vec<TriggerEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerEntry {
    pub hierarchy: Hierarchy,
    /// Delay in seconds from the start of the sequence.
    pub timing: f32,
}

/// Animation tracks bound to remote entities.
///
/// Each connection is keyed by a local identifier that must match one of the
/// animation's own keyframe or event tracks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CageAnimation {
    pub connections: Vec<AnimationConnection>,
    pub keyframes: Vec<Identifier>,
    pub events: Vec<Identifier>,
}

impl CageAnimation {
    /// Returns `true` if `key` names a keyframe or event track.
    pub fn has_track(&self, key: Identifier) -> bool {
        self.keyframes.contains(&key) || self.events.contains(&key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationConnection {
    pub key: Identifier,
    pub hierarchy: Hierarchy,
    pub parameter: Identifier,
}

/// Value type of a composite-level parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    Bool,
    Integer,
    Float,
    String,
    Vector,
    Enum,
    Transform,
    Resource,
    Object,
    ZoneLink,
    SpliceConnection,
}

/// A composite-level parameter pin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableEntity {
    pub core: EntityCore,
    pub name: Identifier,
    pub value_type: ValueType,
}

impl VariableEntity {
    pub fn new(id: Identifier, name: Identifier, value_type: ValueType) -> Self {
        VariableEntity {
            core: EntityCore::new(id),
            name,
            value_type,
        }
    }
}

/// A local stand-in for a remote entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyEntity {
    pub core: EntityCore,
    /// Function type of the proxied entity.
    pub function: Identifier,
    pub hierarchy: Hierarchy,
}

impl ProxyEntity {
    pub fn new(id: Identifier, function: Identifier, hierarchy: Hierarchy) -> Self {
        ProxyEntity {
            core: EntityCore::new(id),
            function,
            hierarchy,
        }
    }
}

/// An override of parameters on a remote entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasEntity {
    pub core: EntityCore,
    pub hierarchy: Hierarchy,
}

impl AliasEntity {
    pub fn new(id: Identifier, hierarchy: Hierarchy) -> Self {
        AliasEntity {
            core: EntityCore::new(id),
            hierarchy,
        }
    }
}

/// Borrowed view of any entity variant.
#[derive(Debug, Clone, Copy)]
pub enum EntityRef<'a> {
    Function(&'a FunctionEntity),
    Variable(&'a VariableEntity),
    Proxy(&'a ProxyEntity),
    Alias(&'a AliasEntity),
}

impl<'a> EntityRef<'a> {
    pub fn core(&self) -> &'a EntityCore {
        match *self {
            EntityRef::Function(e) => &e.core,
            EntityRef::Variable(e) => &e.core,
            EntityRef::Proxy(e) => &e.core,
            EntityRef::Alias(e) => &e.core,
        }
    }

    pub fn id(&self) -> Identifier {
        self.core().id
    }

    pub fn variant(&self) -> EntityVariant {
        match self {
            EntityRef::Function(_) => EntityVariant::Function,
            EntityRef::Variable(_) => EntityVariant::Variable,
            EntityRef::Proxy(_) => EntityVariant::Proxy,
            EntityRef::Alias(_) => EntityVariant::Alias,
        }
    }

    pub fn child_links(&self) -> &'a [ChildLink] {
        &self.core().child_links
    }

    /// The function reference, for function entities.
    pub fn function(&self) -> Option<Identifier> {
        match self {
            EntityRef::Function(e) => Some(e.function),
            _ => None,
        }
    }
}
