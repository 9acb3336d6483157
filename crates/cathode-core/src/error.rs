//! Core error types for cathode-core.
//!
//! Uses `thiserror` for structured, matchable error variants. Failing to
//! resolve a hierarchy or a name is not an error in this crate; those paths
//! return `None`. The variants here cover malformed input and structural
//! contract violations that must abort the current operation.

use thiserror::Error;

use crate::id::Identifier;

/// Errors produced by the cathode-core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A string could not be parsed as an identifier.
    #[error("invalid identifier: '{input}'")]
    InvalidIdentifier { input: String },

    /// A composite with the same identifier is already part of the program.
    #[error("duplicate composite: {id}")]
    DuplicateComposite { id: Identifier },

    /// A composite identifier was not found in the program.
    #[error("composite not found: {id}")]
    CompositeNotFound { id: Identifier },

    /// The graph violates a rule the data model forbids, such as a proxy
    /// whose target is another proxy. The input is corrupt.
    #[error("contract violation in composite {composite}, entity {entity}: {reason}")]
    ContractViolation {
        composite: Identifier,
        entity: Identifier,
        reason: ContractViolation,
    },
}

/// The specific forbidden combination behind a [`CoreError::ContractViolation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ContractViolation {
    /// A proxy hierarchy resolved to another proxy.
    #[error("proxy targets another proxy")]
    ProxyToProxy,
    /// An alias hierarchy resolved to another alias.
    #[error("alias targets another alias")]
    AliasToAlias,
}
