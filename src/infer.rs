//! Forward-chaining inference: one fact, one rule, one step.
//!
//! [`InferenceEngine::fire_step`] unifies a fact against a rule's *anchor*
//! premise (its first premise) and, on success, emits a specialized rule —
//! and, when every remaining premise is already stored as a fact, the
//! concluded fact as well. Multi-premise rules are thereby satisfied
//! incrementally as matching facts accumulate; the engine is a single-pass
//! matcher and never backtracks or searches.
//!
//! The engine is stateless: it only reads the fact, the rule, and the KB's
//! fact index, and returns a [`StepOutput`] for the KB to apply. Recording
//! the justification and triggering further inference is the KB's job.

use tracing::trace;

use crate::kb::{Fact, KnowledgeBase, Rule};
use crate::statement::Statement;
use crate::unify::{instantiate, unify};

/// Stateless forward-chaining engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct InferenceEngine;

/// What one successful inference step produces.
#[derive(Debug, Clone)]
pub struct StepOutput {
    /// Premises of the specialized rule, instantiated under the anchor
    /// bindings, with the satisfied anchor dropped from multi-premise rules.
    pub lhs: Vec<Statement>,
    /// The instantiated conclusion.
    pub rhs: Statement,
    /// Present when every premise in `lhs` is already stored as a fact:
    /// the conclusion can be minted as a derived fact.
    pub fact: Option<Statement>,
}

impl InferenceEngine {
    /// Attempt a single inference step between a fact and a rule.
    ///
    /// Returns `None` when the fact does not unify with the rule's anchor
    /// premise — the expected outcome for most pairings.
    pub fn fire_step(&self, fact: &Fact, rule: &Rule, kb: &KnowledgeBase) -> Option<StepOutput> {
        let anchor = rule.lhs.first()?;
        let bindings = unify(&fact.statement, anchor)?;

        let mut lhs: Vec<Statement> = rule
            .lhs
            .iter()
            .map(|premise| instantiate(premise, &bindings))
            .collect();
        // The anchor is satisfied by the triggering fact; drop it from
        // multi-premise rules rather than restating it.
        if lhs.len() > 1 && lhs[0] == fact.statement {
            lhs.remove(0);
        }
        let rhs = instantiate(&rule.rhs, &bindings);

        let all_premises_present = lhs.iter().all(|premise| kb.contains_fact(premise));
        let fact_out = all_premises_present.then(|| rhs.clone());

        trace!(
            fact = %fact.statement,
            rule = %rule,
            conclusion = %rhs,
            concluded_fact = fact_out.is_some(),
            "inference step fired"
        );
        Some(StepOutput {
            lhs,
            rhs,
            fact: fact_out,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kb::Claim;
    use crate::parse::{parse_claim, parse_statement};
    use crate::support::Support;

    fn fact(src: &str) -> Fact {
        Fact {
            statement: parse_statement(src).unwrap(),
            support: Support::for_assertion(),
        }
    }

    fn rule(src: &str) -> Rule {
        match parse_claim(src).unwrap() {
            Claim::Rule { lhs, rhs } => Rule {
                lhs,
                rhs,
                support: Support::for_assertion(),
            },
            Claim::Fact(_) => panic!("expected a rule"),
        }
    }

    fn kb_with_facts(facts: &[&str]) -> KnowledgeBase {
        let mut kb = KnowledgeBase::new();
        for src in facts {
            kb.assert_claim(Claim::Fact(parse_statement(src).unwrap()));
        }
        kb
    }

    #[test]
    fn anchor_mismatch_yields_nothing() {
        let engine = InferenceEngine;
        let kb = KnowledgeBase::new();
        let output = engine.fire_step(
            &fact("(on cube table)"),
            &rule("rule: ((isa ?x block)) -> (stackable ?x)"),
            &kb,
        );
        assert!(output.is_none());
    }

    #[test]
    fn single_premise_rule_concludes_a_fact() {
        let engine = InferenceEngine;
        let kb = kb_with_facts(&["(isa cube block)"]);
        let output = engine
            .fire_step(
                &fact("(isa cube block)"),
                &rule("rule: ((isa ?x block)) -> (stackable ?x)"),
                &kb,
            )
            .expect("anchor should unify");

        assert_eq!(output.lhs, vec![parse_statement("(isa cube block)").unwrap()]);
        assert_eq!(output.rhs, parse_statement("(stackable cube)").unwrap());
        assert_eq!(output.fact, Some(parse_statement("(stackable cube)").unwrap()));
    }

    #[test]
    fn multi_premise_rule_drops_the_satisfied_anchor() {
        let engine = InferenceEngine;
        let kb = kb_with_facts(&["(hasColor pyramid red)"]);
        let output = engine
            .fire_step(
                &fact("(hasColor pyramid red)"),
                &rule("rule: ((hasColor ?x red) (isa ?x block)) -> (isRedBlock ?x)"),
                &kb,
            )
            .expect("anchor should unify");

        // The anchor is gone; only the unsatisfied premise remains.
        assert_eq!(output.lhs, vec![parse_statement("(isa pyramid block)").unwrap()]);
        assert_eq!(output.rhs, parse_statement("(isRedBlock pyramid)").unwrap());
        // (isa pyramid block) is not stored, so no fact is concluded yet.
        assert_eq!(output.fact, None);
    }

    #[test]
    fn remaining_premises_present_concludes_the_fact() {
        let engine = InferenceEngine;
        let kb = kb_with_facts(&["(hasColor pyramid red)", "(isa pyramid block)"]);
        let output = engine
            .fire_step(
                &fact("(hasColor pyramid red)"),
                &rule("rule: ((hasColor ?x red) (isa ?x block)) -> (isRedBlock ?x)"),
                &kb,
            )
            .expect("anchor should unify");
        assert_eq!(
            output.fact,
            Some(parse_statement("(isRedBlock pyramid)").unwrap())
        );
    }

    #[test]
    fn unbound_conclusion_variables_stay_in_the_specialized_rule() {
        let engine = InferenceEngine;
        let kb = kb_with_facts(&["(parent amun khonsu)"]);
        let output = engine
            .fire_step(
                &fact("(parent amun khonsu)"),
                &rule("rule: ((parent ?p ?c) (parent ?c ?g)) -> (grandparent ?p ?g)"),
                &kb,
            )
            .expect("anchor should unify");

        assert_eq!(output.lhs, vec![parse_statement("(parent khonsu ?g)").unwrap()]);
        assert_eq!(
            output.rhs,
            parse_statement("(grandparent amun ?g)").unwrap()
        );
        assert_eq!(output.fact, None);
    }
}
