//! # maat
//!
//! A justification-based truth maintenance system: a knowledge base of
//! logical facts and implication rules that forward-chains new knowledge on
//! every assertion and cascades retractions through the justification graph,
//! removing all and only the knowledge whose support has vanished.
//!
//! ## Architecture
//!
//! - **Statements** (`statement`): predicate + terms, structurally compared
//! - **Unifier** (`unify`): pattern matching and substitution
//! - **Parser** (`parse`): the textual `fact:`/`rule:` claim syntax
//! - **Support graph** (`support`): justification pairs and handle-indexed
//!   back-references
//! - **Knowledge base** (`kb`): arena storage, assert/retract/ask, and the
//!   retraction cascade
//! - **Inference** (`infer`): single-step forward chaining driven by the KB
//!
//! ## Library usage
//!
//! ```
//! use maat::kb::KnowledgeBase;
//! use maat::parse::parse_claim;
//!
//! let mut kb = KnowledgeBase::new();
//! kb.assert_claim(parse_claim("fact: (isa cube block)").unwrap());
//! kb.assert_claim(parse_claim("rule: ((isa ?x block)) -> (stackable ?x)").unwrap());
//!
//! let answers = kb.ask(&parse_claim("fact: (stackable ?what)").unwrap()).unwrap();
//! assert_eq!(answers.len(), 1);
//! assert_eq!(answers[0].bindings.to_string(), "?what: cube");
//! ```

pub mod error;
pub mod infer;
pub mod kb;
pub mod parse;
pub mod statement;
pub mod support;
pub mod unify;
