//! The knowledge base: fact/rule storage, assert/retract/ask, and the
//! retraction cascade.
//!
//! Facts and rules live in an indexed arena keyed by [`EntityId`] handles,
//! with explicit statement→handle indexes for O(1) structural-equality
//! lookups. Asserting a claim inserts it (or merges it into its structural
//! equal) and forward-chains to a fixed point through an explicit worklist;
//! retracting a claim removes it and cascades through the support graph,
//! sweeping out every entity whose last justification vanished.
//!
//! Invariants maintained here:
//! - no two stored facts share a statement, no two rules share `(lhs, rhs)`;
//!   structural equals are merged, with justification multiplicity preserved
//! - every `supported_by` pair references live entities, and every
//!   `supports_*` back-reference has a matching forward entry
//! - a non-asserted entity with no justification is never left in the KB
//! - the justification graph stays acyclic: a merge drops any justification
//!   pair that would make an entity support itself

use std::collections::{HashMap, HashSet, VecDeque};
use std::num::NonZeroU64;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{KbError, KbResult};
use crate::infer::{InferenceEngine, StepOutput};
use crate::statement::Statement;
use crate::support::{EntityId, Justification, Support};
use crate::unify::{Bindings, unify};

// ---------------------------------------------------------------------------
// Stored entities
// ---------------------------------------------------------------------------

/// A stored fact: a statement plus its support record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fact {
    pub statement: Statement,
    pub support: Support,
}

/// A stored rule: conjunctive premises, a conclusion, and a support record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    /// Premises, in order. The first premise is the *anchor* the inference
    /// engine unifies incoming facts against.
    pub lhs: Vec<Statement>,
    /// The conclusion.
    pub rhs: Statement,
    pub support: Support,
}

impl std::fmt::Display for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(")?;
        for (i, premise) in self.lhs.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{premise}")?;
        }
        write!(f, ") -> {}", self.rhs)
    }
}

/// A fact or rule as stored in the arena.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Entity {
    Fact(Fact),
    Rule(Rule),
}

impl Entity {
    /// The shared support record.
    pub fn support(&self) -> &Support {
        match self {
            Entity::Fact(fact) => &fact.support,
            Entity::Rule(rule) => &rule.support,
        }
    }

    fn support_mut(&mut self) -> &mut Support {
        match self {
            Entity::Fact(fact) => &mut fact.support,
            Entity::Rule(rule) => &mut rule.support,
        }
    }
}

/// Knowledge as supplied by callers (and produced by the parser): either a
/// fact statement or an implication rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Claim {
    Fact(Statement),
    Rule { lhs: Vec<Statement>, rhs: Statement },
}

impl std::fmt::Display for Claim {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Claim::Fact(statement) => write!(f, "fact: {statement}"),
            Claim::Rule { lhs, rhs } => {
                write!(f, "rule: (")?;
                for (i, premise) in lhs.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{premise}")?;
                }
                write!(f, ") -> {rhs}")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Operation results
// ---------------------------------------------------------------------------

/// One `ask` match: the variable bindings plus the stored facts serving as
/// evidence for them.
#[derive(Debug, Clone)]
pub struct Answer {
    pub bindings: Bindings,
    pub evidence: Vec<EntityId>,
}

/// Outcome of a retraction request.
#[derive(Debug, Clone)]
pub enum Retraction {
    /// The entity was removed; the cascade result lists everything swept out.
    Removed(RetractionResult),
    /// The fact's `asserted` flag was cleared, but surviving derivations
    /// keep it in the KB.
    Unasserted(EntityId),
    /// No structurally equal entity was stored; retraction is idempotent.
    NotFound,
}

/// What a retraction cascade removed.
#[derive(Debug, Clone, Default)]
pub struct RetractionResult {
    /// Removed entities, cascade order, the explicitly retracted one first.
    pub retracted: Vec<EntityId>,
    /// Maximum cascade depth reached.
    pub cascade_depth: usize,
}

// ---------------------------------------------------------------------------
// Knowledge base
// ---------------------------------------------------------------------------

/// The knowledge base of facts and rules with truth maintenance.
#[derive(Debug)]
pub struct KnowledgeBase {
    /// Arena of live entities.
    entities: HashMap<EntityId, Entity>,
    /// Facts in insertion order, scanned by `ask` and by inference.
    facts: Vec<EntityId>,
    /// Rules in insertion order.
    rules: Vec<EntityId>,
    /// statement → canonical fact handle.
    fact_index: HashMap<Statement, EntityId>,
    /// `(lhs, rhs)` → canonical rule handle.
    rule_index: HashMap<(Vec<Statement>, Statement), EntityId>,
    next_id: NonZeroU64,
    engine: InferenceEngine,
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self::new()
    }
}

impl KnowledgeBase {
    /// Create an empty knowledge base.
    pub fn new() -> Self {
        Self {
            entities: HashMap::new(),
            facts: Vec::new(),
            rules: Vec::new(),
            fact_index: HashMap::new(),
            rule_index: HashMap::new(),
            next_id: NonZeroU64::MIN,
            engine: InferenceEngine,
        }
    }

    // -- public surface -----------------------------------------------------

    /// Assert a claim as directly user-supplied knowledge.
    ///
    /// Inserts the entity (or merges it into its structural equal) and runs
    /// forward chaining to a fixed point. Returns the canonical handle of
    /// the stored entity.
    pub fn assert_claim(&mut self, claim: Claim) -> EntityId {
        debug!(claim = %claim, "asserting");
        let entity = match claim {
            Claim::Fact(statement) => Entity::Fact(Fact {
                statement,
                support: Support::for_assertion(),
            }),
            Claim::Rule { lhs, rhs } => Entity::Rule(Rule {
                lhs,
                rhs,
                support: Support::for_assertion(),
            }),
        };
        self.absorb(entity)
    }

    /// Query the KB: match the claim's statement against every stored fact.
    ///
    /// Each matching fact contributes one [`Answer`]. An empty result is a
    /// successful query that matched nothing; only a rule claim is an
    /// [`KbError::InvalidQuery`].
    pub fn ask(&self, query: &Claim) -> KbResult<Vec<Answer>> {
        let Claim::Fact(pattern) = query else {
            return Err(KbError::InvalidQuery {
                query: query.to_string(),
            });
        };
        let mut answers = Vec::new();
        for &id in &self.facts {
            let Some(Entity::Fact(fact)) = self.entities.get(&id) else {
                continue;
            };
            if let Some(bindings) = unify(pattern, &fact.statement) {
                answers.push(Answer {
                    bindings,
                    evidence: vec![id],
                });
            }
        }
        Ok(answers)
    }

    /// Retract a claim from the KB.
    ///
    /// Resolves the claim to its canonical stored entity; an absent entity
    /// is an idempotent no-op. Asserted rules are immutable and refuse
    /// retraction. Asserted facts have their flag cleared, and surviving
    /// derivations keep them alive. Derived entities holding a surviving
    /// justification refuse force-retraction. Anything left unasserted and
    /// unsupported is removed, and the removal cascades through the support
    /// graph. Refusal checks run before any mutation.
    pub fn retract(&mut self, claim: &Claim) -> KbResult<Retraction> {
        let Some(id) = self.resolve(claim) else {
            debug!(claim = %claim, "retraction of absent entity is a no-op");
            return Ok(Retraction::NotFound);
        };
        let Some(entity) = self.entities.get(&id) else {
            return Ok(Retraction::NotFound);
        };

        match entity {
            Entity::Rule(rule) if rule.support.asserted => {
                return Err(KbError::RetractAssertedRule {
                    rule: rule.to_string(),
                });
            }
            Entity::Rule(rule) if !rule.support.is_unsupported() => {
                return Err(KbError::RetractSupported {
                    entity: rule.to_string(),
                    justifications: rule.support.supported_by.len(),
                });
            }
            Entity::Fact(fact) if !fact.support.asserted && !fact.support.is_unsupported() => {
                return Err(KbError::RetractSupported {
                    entity: fact.statement.to_string(),
                    justifications: fact.support.supported_by.len(),
                });
            }
            _ => {}
        }

        if let Some(Entity::Fact(fact)) = self.entities.get_mut(&id)
            && fact.support.asserted
        {
            fact.support.asserted = false;
            if !fact.support.is_unsupported() {
                debug!(%id, "unasserted fact kept alive by surviving derivations");
                return Ok(Retraction::Unasserted(id));
            }
        }

        let result = self.remove_cascade(id);
        debug!(
            %id,
            retracted = result.retracted.len(),
            depth = result.cascade_depth,
            "retraction cascade complete"
        );
        Ok(Retraction::Removed(result))
    }

    // -- lookups ------------------------------------------------------------

    /// Whether a structurally equal fact is stored.
    pub fn contains_fact(&self, statement: &Statement) -> bool {
        self.fact_index.contains_key(statement)
    }

    /// Whether a structurally equal rule is stored.
    pub fn contains_rule(&self, lhs: &[Statement], rhs: &Statement) -> bool {
        self.rule_index.contains_key(&(lhs.to_vec(), rhs.clone()))
    }

    /// Get a stored fact by handle.
    pub fn fact(&self, id: EntityId) -> Option<&Fact> {
        match self.entities.get(&id) {
            Some(Entity::Fact(fact)) => Some(fact),
            _ => None,
        }
    }

    /// Get a stored rule by handle.
    pub fn rule(&self, id: EntityId) -> Option<&Rule> {
        match self.entities.get(&id) {
            Some(Entity::Rule(rule)) => Some(rule),
            _ => None,
        }
    }

    /// Number of stored facts.
    pub fn fact_count(&self) -> usize {
        self.facts.len()
    }

    /// Number of stored rules.
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Iterate over stored facts in insertion order.
    pub fn facts(&self) -> impl Iterator<Item = (EntityId, &Fact)> {
        self.facts.iter().filter_map(|&id| Some((id, self.fact(id)?)))
    }

    /// Iterate over stored rules in insertion order.
    pub fn rules(&self) -> impl Iterator<Item = (EntityId, &Rule)> {
        self.rules.iter().filter_map(|&id| Some((id, self.rule(id)?)))
    }

    fn resolve(&self, claim: &Claim) -> Option<EntityId> {
        match claim {
            Claim::Fact(statement) => self.fact_index.get(statement).copied(),
            Claim::Rule { lhs, rhs } => {
                self.rule_index.get(&(lhs.clone(), rhs.clone())).copied()
            }
        }
    }

    fn alloc(&mut self) -> EntityId {
        let id = EntityId::from_raw(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        id
    }

    // -- assertion worklist -------------------------------------------------

    /// Insert an entity and drain the inference worklist to a fixed point.
    fn absorb(&mut self, entity: Entity) -> EntityId {
        let mut queue = VecDeque::new();
        let id = self.integrate(entity, &mut queue);
        while let Some(pending) = queue.pop_front() {
            self.integrate(pending, &mut queue);
        }
        id
    }

    /// Insert-or-merge one entity. A genuinely new entity additionally gets
    /// an inference attempt against every stored counterpart; derived
    /// entities join the worklist rather than being asserted re-entrantly.
    fn integrate(&mut self, entity: Entity, queue: &mut VecDeque<Entity>) -> EntityId {
        let is_fact = matches!(entity, Entity::Fact(_));
        let (id, fresh) = self.insert_or_merge(entity);
        if !fresh {
            return id;
        }

        // Snapshot the counterpart collection: entities added while this
        // scan is in flight must not be visited by it.
        let scan = if is_fact {
            self.rules.clone()
        } else {
            self.facts.clone()
        };
        for other in scan {
            let (fact_id, rule_id) = if is_fact { (id, other) } else { (other, id) };
            let Some(step) = self.try_fire(fact_id, rule_id) else {
                continue;
            };
            let justification = Justification::new(fact_id, rule_id);
            let StepOutput { lhs, rhs, fact } = step;
            queue.push_back(Entity::Rule(Rule {
                lhs,
                rhs,
                support: Support::for_derivation(justification),
            }));
            if let Some(statement) = fact {
                queue.push_back(Entity::Fact(Fact {
                    statement,
                    support: Support::for_derivation(justification),
                }));
            }
        }
        id
    }

    fn try_fire(&self, fact_id: EntityId, rule_id: EntityId) -> Option<StepOutput> {
        let fact = self.fact(fact_id)?;
        let rule = self.rule(rule_id)?;
        self.engine.fire_step(fact, rule, self)
    }

    /// Insert a new entity, or merge a structural duplicate into the
    /// canonical one. Returns the canonical handle and whether the entity
    /// was genuinely new — only new entities trigger inference, which is
    /// what keeps idempotent re-assertion from looping.
    fn insert_or_merge(&mut self, entity: Entity) -> (EntityId, bool) {
        match entity {
            Entity::Fact(fact) => {
                if let Some(&id) = self.fact_index.get(&fact.statement) {
                    self.merge(id, fact.support, true);
                    return (id, false);
                }
                let id = self.alloc();
                let pairs = fact.support.supported_by.clone();
                trace!(%id, statement = %fact.statement, "storing fact");
                self.fact_index.insert(fact.statement.clone(), id);
                self.facts.push(id);
                self.entities.insert(id, Entity::Fact(fact));
                self.record_backrefs(id, &pairs, true);
                (id, true)
            }
            Entity::Rule(rule) => {
                let key = (rule.lhs.clone(), rule.rhs.clone());
                if let Some(&id) = self.rule_index.get(&key) {
                    self.merge(id, rule.support, false);
                    return (id, false);
                }
                let id = self.alloc();
                let pairs = rule.support.supported_by.clone();
                trace!(%id, rule = %rule, "storing rule");
                self.rule_index.insert(key, id);
                self.rules.push(id);
                self.entities.insert(id, Entity::Rule(rule));
                self.record_backrefs(id, &pairs, false);
                (id, true)
            }
        }
    }

    /// Merge an incoming duplicate into the canonical entity: append its
    /// justification pairs (multiplicity preserved — each pair stands for an
    /// independent derivation event), or flip `asserted` for a bare user
    /// re-assertion.
    fn merge(&mut self, id: EntityId, incoming: Support, is_fact: bool) {
        if incoming.supported_by.is_empty() {
            trace!(%id, "re-assertion marks entity as asserted");
            if let Some(entity) = self.entities.get_mut(&id) {
                entity.support_mut().asserted = true;
            }
            return;
        }
        // A justification may not trace back to the entity it would support;
        // dropping such a pair keeps the support graph acyclic and the
        // retraction cascade terminating.
        let appended: Vec<Justification> = incoming
            .supported_by
            .into_iter()
            .filter(|justification| {
                let cyclic = self.depends_on(justification.fact, id)
                    || self.depends_on(justification.rule, id);
                if cyclic {
                    debug!(%id, "dropping justification that would close a support cycle");
                }
                !cyclic
            })
            .collect();
        if let Some(entity) = self.entities.get_mut(&id) {
            entity
                .support_mut()
                .supported_by
                .extend(appended.iter().copied());
        }
        self.record_backrefs(id, &appended, is_fact);
    }

    /// Record the inverse `supports_*` links on both premises of each pair.
    fn record_backrefs(&mut self, derived: EntityId, pairs: &[Justification], is_fact: bool) {
        for justification in pairs {
            for premise in [justification.fact, justification.rule] {
                let Some(entity) = self.entities.get_mut(&premise) else {
                    continue;
                };
                if is_fact {
                    entity.support_mut().supports_facts.push(derived);
                } else {
                    entity.support_mut().supports_rules.push(derived);
                }
            }
        }
    }

    /// Whether `start` is justified, directly or transitively, by `target`.
    fn depends_on(&self, start: EntityId, target: EntityId) -> bool {
        if start == target {
            return true;
        }
        let mut queue = VecDeque::from([start]);
        let mut visited = HashSet::from([start]);
        while let Some(current) = queue.pop_front() {
            let Some(entity) = self.entities.get(&current) else {
                continue;
            };
            for justification in &entity.support().supported_by {
                for premise in [justification.fact, justification.rule] {
                    if premise == target {
                        return true;
                    }
                    if visited.insert(premise) {
                        queue.push_back(premise);
                    }
                }
            }
        }
        false
    }

    // -- retraction cascade -------------------------------------------------

    /// Remove an entity and walk the support graph breadth-first, stripping
    /// every justification pair that mentions a removed entity from its
    /// dependents. Dependents whose last justification vanishes (and which
    /// are not asserted) follow it out of the KB.
    fn remove_cascade(&mut self, root: EntityId) -> RetractionResult {
        let mut result = RetractionResult::default();
        let mut queue: VecDeque<(EntityId, usize)> = VecDeque::new();
        queue.push_back((root, 0));

        while let Some((current, depth)) = queue.pop_front() {
            let Some(entity) = self.remove_entity(current) else {
                continue;
            };
            result.cascade_depth = result.cascade_depth.max(depth);
            result.retracted.push(current);
            let support = entity.support();

            // An entity is only removed once nothing justifies it, but keep
            // the inverse links of any residual pair consistent regardless.
            for justification in &support.supported_by {
                for premise in [justification.fact, justification.rule] {
                    if let Some(entity) = self.entities.get_mut(&premise) {
                        entity.support_mut().drop_fact_backref(current);
                        entity.support_mut().drop_rule_backref(current);
                    }
                }
            }

            // The supports lists may hold duplicate handles (one per pair);
            // stripping is exhaustive per dependent, so repeats are no-ops.
            let dependents: Vec<EntityId> = support
                .supports_facts
                .iter()
                .chain(support.supports_rules.iter())
                .copied()
                .collect();
            for dependent in dependents {
                self.strip_justifications(dependent, current);
                let Some(entity) = self.entities.get(&dependent) else {
                    continue;
                };
                let support = entity.support();
                if !support.asserted && support.is_unsupported() {
                    queue.push_back((dependent, depth + 1));
                }
            }
        }
        result
    }

    /// Remove from `dependent.supported_by` every pair mentioning `gone`.
    /// Each removed pair also surrenders one matching back-reference on the
    /// pair's surviving premise.
    fn strip_justifications(&mut self, dependent: EntityId, gone: EntityId) {
        let (dependent_is_fact, removed) = {
            let Some(entity) = self.entities.get_mut(&dependent) else {
                return;
            };
            let is_fact = matches!(entity, Entity::Fact(_));
            let support = entity.support_mut();
            let mut kept = Vec::with_capacity(support.supported_by.len());
            let mut removed = Vec::new();
            for justification in support.supported_by.drain(..) {
                if justification.mentions(gone) {
                    removed.push(justification);
                } else {
                    kept.push(justification);
                }
            }
            support.supported_by = kept;
            (is_fact, removed)
        };
        for justification in removed {
            for premise in [justification.fact, justification.rule] {
                if premise == gone {
                    continue;
                }
                let Some(entity) = self.entities.get_mut(&premise) else {
                    continue;
                };
                if dependent_is_fact {
                    entity.support_mut().drop_fact_backref(dependent);
                } else {
                    entity.support_mut().drop_rule_backref(dependent);
                }
            }
        }
    }

    fn remove_entity(&mut self, id: EntityId) -> Option<Entity> {
        let entity = self.entities.remove(&id)?;
        match &entity {
            Entity::Fact(fact) => {
                self.fact_index.remove(&fact.statement);
                self.facts.retain(|&entry| entry != id);
            }
            Entity::Rule(rule) => {
                self.rule_index.remove(&(rule.lhs.clone(), rule.rhs.clone()));
                self.rules.retain(|&entry| entry != id);
            }
        }
        Some(entity)
    }
}

impl std::fmt::Display for KnowledgeBase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Knowledge base:")?;
        for (_, fact) in self.facts() {
            writeln!(f, "  fact: {}", fact.statement)?;
        }
        for (_, rule) in self.rules() {
            writeln!(f, "  rule: {rule}")?;
        }
        Ok(())
    }
}
