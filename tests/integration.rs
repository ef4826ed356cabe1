//! End-to-end scenarios for the maat knowledge base.
//!
//! These tests exercise the full pipeline from parsing through assertion,
//! forward chaining, querying, and retraction cascades, validating that the
//! parser, unifier, inference engine, and support graph work together.

use maat::error::KbError;
use maat::kb::{Claim, KnowledgeBase, Retraction};
use maat::parse::{parse_claim, parse_statement};
use maat::statement::Term;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn claim(src: &str) -> Claim {
    parse_claim(src).unwrap()
}

#[test]
fn derive_ask_retract_scenario() {
    init_tracing();
    let mut kb = KnowledgeBase::new();

    // KB starts with an asserted fact and an asserted implication.
    kb.assert_claim(claim("fact: (a x1)"));
    kb.assert_claim(claim("rule: ((a ?y)) -> (b ?y)"));

    // The conclusion was derived, and asking for it yields one binding with
    // the derived fact as evidence.
    let answers = kb.ask(&claim("fact: (b ?y)")).unwrap();
    assert_eq!(answers.len(), 1);
    assert_eq!(
        answers[0].bindings.lookup("y"),
        Some(&Term::Constant("x1".into()))
    );
    assert_eq!(answers[0].evidence.len(), 1);
    let evidence = kb.fact(answers[0].evidence[0]).unwrap();
    assert_eq!(evidence.statement, parse_statement("(b x1)").unwrap());
    assert!(!evidence.support.asserted);

    // Retracting the premise removes the conclusion: its sole justification
    // vanished.
    let outcome = kb.retract(&claim("fact: (a x1)")).unwrap();
    assert!(matches!(outcome, Retraction::Removed(_)));
    let after = kb.ask(&claim("fact: (b x1)")).unwrap();
    assert!(after.is_empty());
}

#[test]
fn two_premise_rule_is_order_independent() {
    init_tracing();
    for order in [
        ["fact: (a 1)", "fact: (c 1)"],
        ["fact: (c 1)", "fact: (a 1)"],
    ] {
        let mut kb = KnowledgeBase::new();
        kb.assert_claim(claim("rule: ((a ?x) (c ?x)) -> (d ?x)"));
        for fact in order {
            kb.assert_claim(claim(fact));
        }
        // Exactly one derived (d 1), never two, regardless of order.
        let answers = kb.ask(&claim("fact: (d ?x)")).unwrap();
        assert_eq!(answers.len(), 1, "assertion order {order:?}");
    }
}

#[test]
fn deep_chain_retraction_sweeps_everything_derived() {
    init_tracing();
    let mut kb = KnowledgeBase::new();
    kb.assert_claim(claim("rule: ((gen0 ?x)) -> (gen1 ?x)"));
    kb.assert_claim(claim("rule: ((gen1 ?x)) -> (gen2 ?x)"));
    kb.assert_claim(claim("rule: ((gen2 ?x)) -> (gen3 ?x)"));
    kb.assert_claim(claim("rule: ((gen3 ?x)) -> (gen4 ?x)"));
    kb.assert_claim(claim("fact: (gen0 seed)"));

    for generation in 0..=4 {
        let answers = kb
            .ask(&claim(&format!("fact: (gen{generation} ?x)")))
            .unwrap();
        assert_eq!(answers.len(), 1, "generation {generation}");
    }

    let outcome = kb.retract(&claim("fact: (gen0 seed)")).unwrap();
    let Retraction::Removed(result) = outcome else {
        panic!("expected removal");
    };
    assert!(result.cascade_depth >= 4);
    assert_eq!(kb.fact_count(), 0);
    // Only the four asserted rules survive.
    assert_eq!(kb.rule_count(), 4);
}

#[test]
fn independently_justified_knowledge_survives_partial_retraction() {
    init_tracing();
    let mut kb = KnowledgeBase::new();
    kb.assert_claim(claim("rule: ((parent ?p ?c)) -> (ancestor ?p ?c)"));
    kb.assert_claim(claim("rule: ((guardian ?p ?c)) -> (ancestor ?p ?c)"));
    kb.assert_claim(claim("fact: (parent isis horus)"));
    kb.assert_claim(claim("fact: (guardian isis horus)"));

    assert_eq!(kb.ask(&claim("fact: (ancestor isis horus)")).unwrap().len(), 1);

    // One premise down: the conclusion keeps its other justification.
    kb.retract(&claim("fact: (parent isis horus)")).unwrap();
    assert_eq!(kb.ask(&claim("fact: (ancestor isis horus)")).unwrap().len(), 1);

    // Both premises down: the conclusion goes with them.
    kb.retract(&claim("fact: (guardian isis horus)")).unwrap();
    assert!(kb.ask(&claim("fact: (ancestor isis horus)")).unwrap().is_empty());
}

#[test]
fn re_assertion_preserves_justification_multiplicity() {
    init_tracing();
    let mut kb = KnowledgeBase::new();
    kb.assert_claim(claim("rule: ((a ?x)) -> (b ?x)"));
    kb.assert_claim(claim("fact: (a 1)"));
    // Re-asserting the premise changes nothing observable.
    kb.assert_claim(claim("fact: (a 1)"));
    assert_eq!(kb.fact_count(), 2);
    assert_eq!(kb.ask(&claim("fact: (b 1)")).unwrap().len(), 1);

    // Asserting the derived fact directly flips it to asserted, so it
    // outlives its premise.
    kb.assert_claim(claim("fact: (b 1)"));
    kb.retract(&claim("fact: (a 1)")).unwrap();
    assert_eq!(kb.ask(&claim("fact: (b 1)")).unwrap().len(), 1);
}

#[test]
fn refusals_and_no_ops_leave_the_kb_unchanged() {
    init_tracing();
    let mut kb = KnowledgeBase::new();
    kb.assert_claim(claim("fact: (isa cube block)"));
    kb.assert_claim(claim("rule: ((isa ?x block)) -> (stackable ?x)"));
    let facts_before = kb.fact_count();
    let rules_before = kb.rule_count();

    // Asserted rules refuse retraction.
    assert!(matches!(
        kb.retract(&claim("rule: ((isa ?x block)) -> (stackable ?x)")),
        Err(KbError::RetractAssertedRule { .. })
    ));
    // Supported derived facts refuse force-retraction.
    assert!(matches!(
        kb.retract(&claim("fact: (stackable cube)")),
        Err(KbError::RetractSupported { .. })
    ));
    // Absent entities retract as a no-op.
    assert!(matches!(
        kb.retract(&claim("fact: (isa sphinx statue)")).unwrap(),
        Retraction::NotFound
    ));
    // Rule queries are invalid.
    assert!(matches!(
        kb.ask(&claim("rule: ((isa ?x block)) -> (stackable ?x)")),
        Err(KbError::InvalidQuery { .. })
    ));

    assert_eq!(kb.fact_count(), facts_before);
    assert_eq!(kb.rule_count(), rules_before);
}

#[test]
fn claims_round_trip_through_serde() {
    let rule = claim("rule: ((hasColor ?x red) (isa ?x block)) -> (isRedBlock ?x)");
    let json = serde_json::to_string(&rule).unwrap();
    let back: Claim = serde_json::from_str(&json).unwrap();
    assert_eq!(back, rule);
}
