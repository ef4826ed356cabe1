//! Rich diagnostic error types for the maat knowledge base.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]`
//! derives, providing error codes and help text so callers know exactly what
//! went wrong and how to fix it. Refusals are checked before any mutation, so
//! an error never leaves the KB partially updated.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for the maat crate.
///
/// Each variant wraps a subsystem-specific error, preserving the full
/// diagnostic chain (error codes and help text) through to the caller.
#[derive(Debug, Error, Diagnostic)]
pub enum MaatError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Kb(#[from] KbError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ParseError),
}

// ---------------------------------------------------------------------------
// Knowledge base errors
// ---------------------------------------------------------------------------

/// Errors from KB operations.
///
/// Note what is deliberately *not* here: retracting an absent entity is an
/// idempotent no-op, and a failed unification is the expected outcome of most
/// fact/rule pairings — neither is an error.
#[derive(Debug, Error, Diagnostic)]
pub enum KbError {
    #[error("invalid query: `{query}` is not a fact")]
    #[diagnostic(
        code(maat::kb::invalid_query),
        help(
            "`ask` matches a fact pattern against the stored facts. \
             Rules cannot be queried directly; assert the rule and \
             query its conclusion instead."
        )
    )]
    InvalidQuery { query: String },

    #[error("cannot retract asserted rule `{rule}`")]
    #[diagnostic(
        code(maat::kb::retract_asserted_rule),
        help(
            "Directly asserted rules are immutable once in the KB. \
             Only derived rules are removable, and only through the \
             retraction cascade."
        )
    )]
    RetractAssertedRule { rule: String },

    #[error("cannot retract `{entity}`: {justifications} derivation(s) still support it")]
    #[diagnostic(
        code(maat::kb::retract_supported),
        help(
            "A derived fact or rule stays in the KB while any justification \
             survives. Retract its premises instead and let the cascade \
             remove it once the last justification vanishes."
        )
    )]
    RetractSupported {
        entity: String,
        justifications: usize,
    },
}

// ---------------------------------------------------------------------------
// Parse errors
// ---------------------------------------------------------------------------

/// Errors from the textual fact/rule syntax.
#[derive(Debug, Error, Diagnostic)]
pub enum ParseError {
    #[error("missing `fact:` or `rule:` prefix: `{input}`")]
    #[diagnostic(
        code(maat::parse::missing_prefix),
        help(
            "Claims are written as `fact: (pred arg ...)` or \
             `rule: ((premise ...) ...) -> (conclusion ...)`."
        )
    )]
    MissingPrefix { input: String },

    #[error("unbalanced or malformed parentheses: `{input}`")]
    #[diagnostic(
        code(maat::parse::unbalanced),
        help("Every `(` needs a matching `)`, and terms may not appear outside a statement.")
    )]
    Unbalanced { input: String },

    #[error("empty statement")]
    #[diagnostic(
        code(maat::parse::empty_statement),
        help("A statement needs at least a predicate: `(pred)`.")
    )]
    EmptyStatement,

    #[error("rule is missing `->` between premises and conclusion: `{input}`")]
    #[diagnostic(
        code(maat::parse::missing_arrow),
        help("Rules are written `rule: ((premise ...) (premise ...)) -> (conclusion ...)`.")
    )]
    MissingArrow { input: String },

    #[error("rule has no premises")]
    #[diagnostic(
        code(maat::parse::no_premises),
        help("A rule needs at least one premise statement left of the `->`.")
    )]
    NoPremises,

    #[error("unexpected trailing input: `{rest}`")]
    #[diagnostic(
        code(maat::parse::trailing_input),
        help("Only one claim or statement is allowed per line.")
    )]
    TrailingInput { rest: String },
}

/// Convenience alias for functions returning maat results.
pub type MaatResult<T> = std::result::Result<T, MaatError>;

/// Result type for KB operations.
pub type KbResult<T> = std::result::Result<T, KbError>;

/// Result type for parser operations.
pub type ParseResult<T> = std::result::Result<T, ParseError>;
