use thiserror::Error;

/// Everything that can go wrong while evaluating an expression.
///
/// Each variant carries the (whitespace-stripped) source expression and,
/// where one is meaningful, the character offset it points at. Errors are
/// fatal to the evaluation that raised them; no partial result is
/// returned. They travel inside [`anyhow::Error`] and can be recovered
/// with `err.downcast_ref::<EvalError>()`.
#[derive(Debug, Error)]
pub enum EvalError {
    /// Evaluation stopped before consuming the whole expression, e.g. at a
    /// stray closing parenthesis.
    #[error("syntax error, incomplete evaluation of expression {expression:?}, evaluated to offset {offset}")]
    IncompleteEvaluation { expression: String, offset: usize },

    /// A character that can start neither a value nor an operator.
    #[error("syntax error, no value could be matched in expression {expression:?} at offset {offset}")]
    UnexpectedCharacter { expression: String, offset: usize },

    /// An opening parenthesis was never closed, or a sub-expression did
    /// not end at its closing parenthesis.
    #[error("syntax error, unmatched parenthesis in expression {expression:?}")]
    UnmatchedParenthesis { expression: String },

    /// A literal that is shaped like a number but does not parse as one,
    /// e.g. `4.0.0`.
    #[error("invalid number format {literal:?} in expression {expression:?} at offset {offset}")]
    InvalidNumberFormat {
        literal: String,
        expression: String,
        offset: usize,
    },

    /// An operator with no right-hand value to operate on.
    #[error("right-hand side value missing in expression {expression:?} at offset {offset}")]
    MissingRhsValue { expression: String, offset: usize },

    /// A call site named a function that was never registered. The offset
    /// points at the start of the call, not the closing parenthesis.
    #[error("call to unregistered function {name:?} in expression {expression:?} at offset {offset}")]
    UnknownFunction {
        name: String,
        expression: String,
        offset: usize,
    },

    /// A well-formed variable name with no entry in the variable table.
    #[error("used unset variable {name:?} in expression {expression:?} at offset {offset}")]
    UnknownVariable {
        name: String,
        expression: String,
        offset: usize,
    },

    /// A literal that is malformed both as a variable name and as a
    /// number, e.g. `str.len`.
    #[error("invalid variable name {name:?} in expression {expression:?} at offset {offset}")]
    InvalidVariableName {
        name: String,
        expression: String,
        offset: usize,
    },
}
