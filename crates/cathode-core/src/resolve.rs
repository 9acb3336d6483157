//! Hierarchy resolution: turning an identifier path into a concrete entity.
//!
//! A path names an entity in some starting scope, then (optionally) steps
//! through function entities whose function reference is another composite.
//! Paths carry no explicit "enter sub-graph" marker, so every scope change is
//! re-derived from whether the current entity calls a composite.
//!
//! Dangling paths are routine in real archives. Every failure here is a
//! plain `None`, except the structural contract checks in
//! [`HierarchyResolver::resolve_proxy_target`] and
//! [`HierarchyResolver::resolve_alias_target`].

use smallvec::SmallVec;
use tracing::debug;

use crate::composite::{Composite, Program};
use crate::entity::{AliasEntity, EntityRef, ProxyEntity};
use crate::error::{ContractViolation, CoreError};
use crate::id::Identifier;
use crate::label::EntityLabeler;

/// Separator between breadcrumb levels.
const LABEL_SEPARATOR: &str = " -> ";

/// A successfully resolved path.
#[derive(Debug, Clone)]
pub struct Resolved<'p> {
    pub entity: EntityRef<'p>,
    /// Composite that directly contains `entity`.
    pub composite: &'p Composite,
    /// Breadcrumb of every entity walked, e.g. `"Door -> Open"`.
    pub label: String,
}

/// Resolves hierarchy paths against a program.
pub struct HierarchyResolver<'p, L: EntityLabeler + ?Sized> {
    program: &'p Program,
    labeler: &'p L,
}

impl<'p, L: EntityLabeler + ?Sized> HierarchyResolver<'p, L> {
    pub fn new(program: &'p Program, labeler: &'p L) -> Self {
        HierarchyResolver { program, labeler }
    }

    /// Resolves `path` to an entity.
    ///
    /// The final element of `path` is the terminator and is never looked up.
    /// The starting scope is the first of:
    /// 1. `start`, if it contains `path[0]`;
    /// 2. the primary entry composite, if it contains `path[0]`;
    /// 3. the composite whose own id is `path[0]`, if it contains `path[1]`
    ///    (the leading composite id is then skipped).
    ///
    /// Returns `None` when no scope matches, an element is missing, a
    /// non-final element does not call a composite, or the walk would
    /// re-enter a composite it already passed through.
    pub fn resolve(
        &self,
        start: Option<&'p Composite>,
        path: &[Identifier],
        include_ids: bool,
    ) -> Option<Resolved<'p>> {
        if path.len() < 2 {
            return None;
        }
        let last = path.len() - 2;

        let (mut scope, mut index) = self.select_scope(start, path)?;
        let mut visited: SmallVec<[Identifier; 8]> = SmallVec::new();
        visited.push(scope.id);
        let mut label = String::new();

        loop {
            let id = path[index];
            let Some(entity) = scope.entity(id) else {
                debug!(composite = %scope.id, entity = %id, "hierarchy element not found");
                return None;
            };

            if !label.is_empty() {
                label.push_str(LABEL_SEPARATOR);
            }
            if include_ids {
                label.push('[');
                label.push_str(&id.to_byte_string());
                label.push_str("] ");
            }
            label.push_str(&self.labeler.label(scope, entity));

            if index == last {
                return Some(Resolved {
                    entity,
                    composite: scope,
                    label,
                });
            }

            let EntityRef::Function(function) = entity else {
                debug!(
                    composite = %scope.id,
                    entity = %id,
                    "hierarchy continues past a non-function entity"
                );
                return None;
            };
            let Some(next) = self.program.composite(function.function) else {
                debug!(
                    composite = %scope.id,
                    entity = %id,
                    "hierarchy continues past a builtin function"
                );
                return None;
            };
            if visited.contains(&next.id) {
                debug!(composite = %next.id, "hierarchy re-enters a composite");
                return None;
            }

            visited.push(next.id);
            scope = next;
            index += 1;
        }
    }

    fn select_scope(
        &self,
        start: Option<&'p Composite>,
        path: &[Identifier],
    ) -> Option<(&'p Composite, usize)> {
        let head = path[0];

        if let Some(start) = start.filter(|c| c.contains(head)) {
            return Some((start, 0));
        }
        if let Some(primary) = self.program.primary_entry().filter(|c| c.contains(head)) {
            return Some((primary, 0));
        }
        // A path may lead with the id of the composite it lives in; the
        // second element must still be an entity, not the terminator.
        if path.len() >= 3 {
            if let Some(composite) = self.program.composite(head).filter(|c| c.contains(path[1])) {
                return Some((composite, 1));
            }
        }
        None
    }

    /// Resolves a proxy's target from the composite that owns the proxy.
    ///
    /// Returns [`CoreError::ContractViolation`] if the target is itself a
    /// proxy.
    pub fn resolve_proxy_target(
        &self,
        owner: &'p Composite,
        proxy: &ProxyEntity,
    ) -> Result<Option<Resolved<'p>>, CoreError> {
        let resolved = self.resolve(Some(owner), proxy.hierarchy.elements(), false);
        if let Some(Resolved {
            entity: EntityRef::Proxy(_),
            ..
        }) = resolved
        {
            return Err(CoreError::ContractViolation {
                composite: owner.id,
                entity: proxy.core.id,
                reason: ContractViolation::ProxyToProxy,
            });
        }
        Ok(resolved)
    }

    /// Resolves an alias's target from the composite that owns the alias.
    ///
    /// Returns [`CoreError::ContractViolation`] if the target is itself an
    /// alias.
    pub fn resolve_alias_target(
        &self,
        owner: &'p Composite,
        alias: &AliasEntity,
    ) -> Result<Option<Resolved<'p>>, CoreError> {
        let resolved = self.resolve(Some(owner), alias.hierarchy.elements(), false);
        if let Some(Resolved {
            entity: EntityRef::Alias(_),
            ..
        }) = resolved
        {
            return Err(CoreError::ContractViolation {
                composite: owner.id,
                entity: alias.core.id,
                reason: ContractViolation::AliasToAlias,
            });
        }
        Ok(resolved)
    }
}
