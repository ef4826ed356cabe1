//! Unification and substitution over statements.
//!
//! [`unify`] matches a pattern statement against a target statement and
//! produces the variable bindings that make the two equal, or `None` when no
//! consistent binding exists — a failed match is the expected outcome of most
//! pairings, never an error. Variables may appear on either side; within one
//! binding set a variable is never bound to two different terms.
//!
//! [`instantiate`] applies a binding set to a statement, substituting bound
//! variables and leaving unbound ones in place (the result may stay partially
//! ground).

use serde::{Deserialize, Serialize};

use crate::statement::{Statement, Term};

/// An ordered mapping from variable names to the terms they are bound to.
///
/// Insertion order is preserved so that query answers print deterministically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bindings {
    pairs: Vec<(String, Term)>,
}

impl Bindings {
    /// Create an empty binding set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the term a variable is bound to.
    pub fn lookup(&self, variable: &str) -> Option<&Term> {
        self.pairs
            .iter()
            .find(|(name, _)| name == variable)
            .map(|(_, term)| term)
    }

    /// Bind a variable to a term.
    ///
    /// Returns `false` when the variable is already bound to a different
    /// term; the binding set is left unchanged in that case.
    pub fn bind(&mut self, variable: &str, term: Term) -> bool {
        match self.lookup(variable) {
            Some(existing) => *existing == term,
            None => {
                self.pairs.push((variable.to_string(), term));
                true
            }
        }
    }

    /// Number of bound variables.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether no variables are bound (a ground-on-ground match).
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Iterate over `(variable, term)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Term)> {
        self.pairs.iter().map(|(name, term)| (name.as_str(), term))
    }
}

impl std::fmt::Display for Bindings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, (name, term)) in self.pairs.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "?{name}: {term}")?;
        }
        Ok(())
    }
}

/// Unify a pattern statement against a target statement.
///
/// Returns the binding set that makes the two statements equal, or `None`
/// when the predicates, arities, or any argument pair cannot be reconciled.
/// An empty binding set (ground-on-ground equality) is still a match.
pub fn unify(pattern: &Statement, target: &Statement) -> Option<Bindings> {
    if pattern.predicate != target.predicate || pattern.terms.len() != target.terms.len() {
        return None;
    }
    let mut bindings = Bindings::new();
    for (ours, theirs) in pattern.terms.iter().zip(&target.terms) {
        let consistent = match (ours, theirs) {
            (Term::Variable(name), other) => bindings.bind(name, other.clone()),
            (other, Term::Variable(name)) => bindings.bind(name, other.clone()),
            (Term::Constant(a), Term::Constant(b)) => a == b,
        };
        if !consistent {
            return None;
        }
    }
    Some(bindings)
}

/// Substitute bound variables in a statement.
///
/// Unbound variables are left as-is, so the result may remain a pattern.
pub fn instantiate(statement: &Statement, bindings: &Bindings) -> Statement {
    let terms = statement
        .terms
        .iter()
        .map(|term| match term {
            Term::Variable(name) => bindings.lookup(name).cloned().unwrap_or_else(|| term.clone()),
            constant => constant.clone(),
        })
        .collect();
    Statement::new(statement.predicate.clone(), terms)
}
