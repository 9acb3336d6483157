//! Identifier registry and composite graph engine for archive editing.
//!
//! # Modules
//!
//! - [`id`]: the 4-byte content-addressed [`Identifier`]
//! - [`names`]: [`NameCache`] and [`EntityNameTable`]
//! - [`registry`]: [`IdentifierRegistry`] (generate / find / random)
//! - [`entity`], [`composite`], [`hierarchy`]: the in-memory graph model
//! - [`label`], [`catalog`]: collaborator traits for labels and builtin types
//! - [`resolve`]: [`HierarchyResolver`]
//! - [`purge`]: [`purge_dead_links`]

pub mod catalog;
pub mod composite;
pub mod entity;
pub mod error;
pub mod hierarchy;
pub mod id;
pub mod label;
pub mod names;
pub mod purge;
pub mod registry;
pub mod resolve;

// Re-export commonly used types
pub use catalog::{FunctionCatalog, StaticCatalog};
pub use composite::{Composite, Program};
pub use entity::{EntityRef, EntityVariant};
pub use error::{ContractViolation, CoreError};
pub use hierarchy::Hierarchy;
pub use id::Identifier;
pub use label::{EntityLabeler, IdLabeler, RegistryLabeler};
pub use names::{EntityNameTable, NameCache};
pub use purge::{purge_dead_links, PurgeReport};
pub use registry::IdentifierRegistry;
pub use resolve::{HierarchyResolver, Resolved};
