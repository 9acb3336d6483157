//! Dead-reference purging for a single composite.
//!
//! Archives routinely carry references that no longer resolve: calls to
//! deleted composites, proxies into removed sub-graphs, links to entities
//! that are gone. [`purge_dead_links`] sweeps one composite in place and
//! reports, per category, how many items existed before and after.
//!
//! The sweep runs in phases so that a second run is always a no-op:
//! 1. function entities whose function reference is neither a composite nor
//!    a builtin type are removed;
//! 2. proxies and aliases whose hierarchy no longer resolves are removed,
//!    repeated until nothing changes (one may target another);
//! 3. trigger-sequence entries and animation connections with dead
//!    hierarchies (or, for animations, unknown track keys) are removed;
//! 4. child links to entities no longer in the composite are removed.

use std::collections::HashSet;
use std::fmt;

use tracing::info;

use crate::catalog::{is_known_function, FunctionCatalog};
use crate::composite::Program;
use crate::entity::FunctionExtras;
use crate::error::CoreError;
use crate::id::Identifier;
use crate::label::IdLabeler;
use crate::resolve::HierarchyResolver;

/// Item counts for one category, before and after a purge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CategoryCount {
    pub before: usize,
    pub after: usize,
}

impl CategoryCount {
    pub fn removed(&self) -> usize {
        self.before - self.after
    }
}

/// Outcome of [`purge_dead_links`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurgeReport {
    pub composite: Identifier,
    pub composite_name: String,
    pub functions: CategoryCount,
    pub proxies: CategoryCount,
    pub aliases: CategoryCount,
    pub trigger_entries: CategoryCount,
    pub animation_connections: CategoryCount,
    pub child_links: CategoryCount,
}

impl PurgeReport {
    /// Every category with its display name, in report order.
    pub fn categories(&self) -> [(&'static str, CategoryCount); 6] {
        [
            ("functions", self.functions),
            ("proxies", self.proxies),
            ("aliases", self.aliases),
            ("trigger sequence entries", self.trigger_entries),
            ("animation connections", self.animation_connections),
            ("child links", self.child_links),
        ]
    }

    pub fn total_removed(&self) -> usize {
        self.categories().iter().map(|(_, c)| c.removed()).sum()
    }

    /// Returns `true` if nothing was removed.
    pub fn is_clean(&self) -> bool {
        self.total_removed() == 0
    }

    /// Human-readable summary, or `None` when nothing was removed.
    pub fn summary(&self) -> Option<String> {
        if self.is_clean() {
            None
        } else {
            Some(self.to_string())
        }
    }
}

impl fmt::Display for PurgeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "purged {} dead reference(s) from composite '{}' [{}]",
            self.total_removed(),
            self.composite_name,
            self.composite
        )?;
        for (name, count) in self.categories() {
            if count.removed() > 0 {
                write!(
                    f,
                    "\n  - {}: removed {} of {}",
                    name,
                    count.removed(),
                    count.before
                )?;
            }
        }
        Ok(())
    }
}

/// Removes every reference in `composite` that fails to resolve.
///
/// Pure in-memory mutation; persisting the result is up to the caller.
/// Returns [`CoreError::CompositeNotFound`] if `composite` is not in the
/// program, and aborts with [`CoreError::ContractViolation`] on a proxy that
/// targets a proxy or an alias that targets an alias. On error the program
/// is left unchanged.
pub fn purge_dead_links(
    program: &mut Program,
    composite: Identifier,
    catalog: &dyn FunctionCatalog,
) -> Result<PurgeReport, CoreError> {
    let Some(target) = program.composite(composite) else {
        return Err(CoreError::CompositeNotFound { id: composite });
    };

    let (triggers_before, connections_before) = count_extras(program, composite);
    let mut report = PurgeReport {
        composite,
        composite_name: target.name.clone(),
        functions: CategoryCount::default(),
        proxies: CategoryCount::default(),
        aliases: CategoryCount::default(),
        trigger_entries: CategoryCount {
            before: triggers_before,
            after: triggers_before,
        },
        animation_connections: CategoryCount {
            before: connections_before,
            after: connections_before,
        },
        child_links: CategoryCount::default(),
    };
    report.functions.before = target.functions.len();
    report.proxies.before = target.proxies.len();
    report.aliases.before = target.aliases.len();
    let snapshot = target.clone();

    purge_orphaned_calls(program, composite, catalog);
    if let Err(e) = purge_dead_remotes(program, composite) {
        // Leave the composite exactly as it was handed in.
        if let Some(target) = program.composite_mut(composite) {
            *target = snapshot;
        }
        return Err(e);
    }
    purge_dead_extras(program, composite);

    // Links owned by entities removed above go with their owner; only links
    // from surviving entities count towards this category.
    report.child_links.before = count_links(program, composite);
    purge_dangling_links(program, composite);

    let (triggers_after, connections_after) = count_extras(program, composite);
    if let Some(target) = program.composite(composite) {
        report.functions.after = target.functions.len();
        report.proxies.after = target.proxies.len();
        report.aliases.after = target.aliases.len();
    }
    report.trigger_entries.after = triggers_after;
    report.animation_connections.after = connections_after;
    report.child_links.after = count_links(program, composite);

    if let Some(summary) = report.summary() {
        info!("{}", summary);
    }
    Ok(report)
}

fn purge_orphaned_calls(
    program: &mut Program,
    composite: Identifier,
    catalog: &dyn FunctionCatalog,
) {
    let Some(target) = program.composite(composite) else {
        return;
    };
    let dead: HashSet<Identifier> = target
        .functions
        .iter()
        .filter(|f| !is_known_function(catalog, program, f.function))
        .map(|f| f.core.id)
        .collect();

    if let Some(target) = program.composite_mut(composite) {
        target.functions.retain(|f| !dead.contains(&f.core.id));
    }
}

fn purge_dead_remotes(program: &mut Program, composite: Identifier) -> Result<(), CoreError> {
    loop {
        let (dead_proxies, dead_aliases) = {
            let Some(owner) = program.composite(composite) else {
                return Ok(());
            };
            let resolver = HierarchyResolver::new(program, &IdLabeler);

            let mut dead_proxies = HashSet::new();
            for proxy in &owner.proxies {
                if resolver.resolve_proxy_target(owner, proxy)?.is_none() {
                    dead_proxies.insert(proxy.core.id);
                }
            }
            let mut dead_aliases = HashSet::new();
            for alias in &owner.aliases {
                if resolver.resolve_alias_target(owner, alias)?.is_none() {
                    dead_aliases.insert(alias.core.id);
                }
            }
            (dead_proxies, dead_aliases)
        };

        if dead_proxies.is_empty() && dead_aliases.is_empty() {
            return Ok(());
        }
        if let Some(owner) = program.composite_mut(composite) {
            owner.proxies.retain(|p| !dead_proxies.contains(&p.core.id));
            owner.aliases.retain(|a| !dead_aliases.contains(&a.core.id));
        }
    }
}

/// Per function entity index: which trigger entries / connections survive.
struct ExtrasPlan {
    function: usize,
    keep: Vec<bool>,
}

fn purge_dead_extras(program: &mut Program, composite: Identifier) {
    let plans: Vec<ExtrasPlan> = {
        let Some(owner) = program.composite(composite) else {
            return;
        };
        let resolver = HierarchyResolver::new(program, &IdLabeler);
        let resolves = |path: &[Identifier]| resolver.resolve(Some(owner), path, false).is_some();

        owner
            .functions
            .iter()
            .enumerate()
            .filter_map(|(function, entity)| {
                let keep: Vec<bool> = match &entity.extras {
                    FunctionExtras::None => return None,
                    FunctionExtras::TriggerSequence(seq) => seq
                        .triggers
                        .iter()
                        .map(|t| resolves(t.hierarchy.elements()))
                        .collect(),
                    FunctionExtras::CageAnimation(anim) => anim
                        .connections
                        .iter()
                        .map(|c| anim.has_track(c.key) && resolves(c.hierarchy.elements()))
                        .collect(),
                };
                Some(ExtrasPlan { function, keep })
            })
            .collect()
    };

    let Some(owner) = program.composite_mut(composite) else {
        return;
    };
    for plan in plans {
        let mut keep = plan.keep.into_iter();
        match &mut owner.functions[plan.function].extras {
            FunctionExtras::None => {}
            FunctionExtras::TriggerSequence(seq) => {
                seq.triggers.retain(|_| keep.next().unwrap_or(true));
            }
            FunctionExtras::CageAnimation(anim) => {
                anim.connections.retain(|_| keep.next().unwrap_or(true));
            }
        }
    }
}

fn purge_dangling_links(program: &mut Program, composite: Identifier) {
    let Some(owner) = program.composite_mut(composite) else {
        return;
    };
    let live: HashSet<Identifier> = owner.entities().map(|e| e.id()).collect();
    for core in owner.cores_mut() {
        core.child_links.retain(|link| live.contains(&link.target));
    }
}

fn count_links(program: &Program, composite: Identifier) -> usize {
    program
        .composite(composite)
        .map(|c| c.entities().map(|e| e.child_links().len()).sum())
        .unwrap_or(0)
}

fn count_extras(program: &Program, composite: Identifier) -> (usize, usize) {
    let mut triggers = 0;
    let mut connections = 0;
    if let Some(owner) = program.composite(composite) {
        for function in &owner.functions {
            match &function.extras {
                FunctionExtras::None => {}
                FunctionExtras::TriggerSequence(seq) => triggers += seq.triggers.len(),
                FunctionExtras::CageAnimation(anim) => connections += anim.connections.len(),
            }
        }
    }
    (triggers, connections)
}
