//! Logical statements: the atomic terms of the knowledge base.
//!
//! A [`Statement`] is a predicate applied to argument [`Term`]s, written in a
//! lispy surface form such as `(isa block1 block)`. Terms are either bare
//! constants or `?`-prefixed variables; a statement containing variables acts
//! as a pattern that the unifier matches against stored statements.
//!
//! Equality and hashing are purely structural (predicate name, arity, and
//! position-wise term equality, with no implicit binding), which is what lets
//! the KB treat statements as set keys.

use serde::{Deserialize, Serialize};

/// One argument position in a statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Term {
    /// A ground symbol, compared by name.
    Constant(String),
    /// A pattern variable, compared by name. Two occurrences of the same
    /// variable name are the same variable only within one statement match.
    Variable(String),
}

impl Term {
    /// Interpret a surface token: a leading `?` marks a variable.
    pub fn from_token(token: &str) -> Self {
        match token.strip_prefix('?') {
            Some(name) => Term::Variable(name.to_string()),
            None => Term::Constant(token.to_string()),
        }
    }

    /// Whether this term is a pattern variable.
    pub fn is_variable(&self) -> bool {
        matches!(self, Term::Variable(_))
    }

    /// The constant or variable name, without the `?` sigil.
    pub fn name(&self) -> &str {
        match self {
            Term::Constant(name) | Term::Variable(name) => name,
        }
    }
}

impl std::fmt::Display for Term {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Term::Constant(name) => write!(f, "{name}"),
            Term::Variable(name) => write!(f, "?{name}"),
        }
    }
}

/// A predicate applied to argument terms.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Statement {
    /// The predicate name.
    pub predicate: String,
    /// The argument terms, in order. Arity is part of structural identity.
    pub terms: Vec<Term>,
}

impl Statement {
    /// Create a statement from a predicate and its argument terms.
    pub fn new(predicate: impl Into<String>, terms: Vec<Term>) -> Self {
        Self {
            predicate: predicate.into(),
            terms,
        }
    }

    /// Whether the statement contains no variables.
    pub fn is_ground(&self) -> bool {
        self.terms.iter().all(|term| !term.is_variable())
    }
}

impl std::fmt::Display for Statement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}", self.predicate)?;
        for term in &self.terms {
            write!(f, " {term}")?;
        }
        write!(f, ")")
    }
}
