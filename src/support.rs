//! Support bookkeeping for the justification graph.
//!
//! Every fact and rule carries a [`Support`] record: whether the user
//! asserted it directly, the ordered [`Justification`] pairs that derived it,
//! and back-references to the entities it in turn helps justify. Entities
//! live in the KB's arena and are addressed by [`EntityId`] handles, so the
//! bidirectional links are handle lists rather than owning references — the
//! retraction cascade walks handles instead of chasing pointers.

use std::num::NonZeroU64;

use serde::{Deserialize, Serialize};

/// Unique, niche-optimized handle for a fact or rule in the KB arena.
///
/// Uses `NonZeroU64` so that `Option<EntityId>` is the same size as
/// `EntityId` (0 serves as the `None` discriminant).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct EntityId(NonZeroU64);

impl EntityId {
    /// Create an `EntityId` from a raw `u64`.
    ///
    /// Returns `None` if `raw` is zero.
    pub fn new(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(EntityId)
    }

    pub(crate) fn from_raw(raw: NonZeroU64) -> Self {
        EntityId(raw)
    }

    /// Get the underlying `u64` value.
    pub fn get(self) -> u64 {
        self.0.get()
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ent:{}", self.0)
    }
}

/// The `(premise fact, premise rule)` pair recorded as the reason a derived
/// entity exists: firing `rule` with `fact` as its anchor premise produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Justification {
    /// The triggering fact.
    pub fact: EntityId,
    /// The rule whose anchor premise the fact matched.
    pub rule: EntityId,
}

impl Justification {
    /// Create a justification pair.
    pub fn new(fact: EntityId, rule: EntityId) -> Self {
        Self { fact, rule }
    }

    /// Whether either premise of this pair is the given entity.
    pub fn mentions(&self, id: EntityId) -> bool {
        self.fact == id || self.rule == id
    }
}

/// Provenance bookkeeping shared by facts and rules.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Support {
    /// True iff the user directly supplied this entity, independent of any
    /// derivation.
    pub asserted: bool,
    /// Justification pairs in derivation order. Duplicate pairs are
    /// meaningful: each stands for one independent derivation event, and
    /// each retraction removes exactly one.
    pub supported_by: Vec<Justification>,
    /// Facts this entity helps justify (inverse of their `supported_by`).
    pub supports_facts: Vec<EntityId>,
    /// Rules this entity helps justify.
    pub supports_rules: Vec<EntityId>,
}

impl Support {
    /// Support record for a direct user assertion.
    pub fn for_assertion() -> Self {
        Self {
            asserted: true,
            ..Self::default()
        }
    }

    /// Support record for an inferred entity with its single justification.
    pub fn for_derivation(justification: Justification) -> Self {
        Self {
            asserted: false,
            supported_by: vec![justification],
            ..Self::default()
        }
    }

    /// True when no justification keeps this entity alive.
    pub fn is_unsupported(&self) -> bool {
        self.supported_by.is_empty()
    }

    /// Drop one occurrence of a fact back-reference.
    pub fn drop_fact_backref(&mut self, id: EntityId) {
        remove_one(&mut self.supports_facts, id);
    }

    /// Drop one occurrence of a rule back-reference.
    pub fn drop_rule_backref(&mut self, id: EntityId) {
        remove_one(&mut self.supports_rules, id);
    }
}

fn remove_one(list: &mut Vec<EntityId>, id: EntityId) {
    if let Some(position) = list.iter().position(|entry| *entry == id) {
        list.remove(position);
    }
}
