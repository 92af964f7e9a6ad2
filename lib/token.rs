use std::{collections::HashMap, fmt};

use lazy_static::lazy_static;

/// A binary operator recognized by the expression grammar.
///
/// Operators are applied strictly left to right in source order; there is
/// no precedence. The comma also scans as [`Operator::And`] outside of
/// function argument lists.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Operator {
    Eq,
    NotEq,
    Gt,
    Gte,
    Lt,
    Lte,
    And,
    Or,
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

lazy_static! {
    /// Maps operator lexemes to their tokens. Two-character lexemes must be
    /// probed before one-character lexemes so that `>=` never scans as `>`.
    pub(crate) static ref OPS_TOKEN_MAP: HashMap<&'static str, Operator> = HashMap::from([
        (">=", Operator::Gte),
        ("<=", Operator::Lte),
        ("==", Operator::Eq),
        ("!=", Operator::NotEq),
        ("&&", Operator::And),
        ("||", Operator::Or),
        ("**", Operator::Pow),
        ("+", Operator::Add),
        ("-", Operator::Sub),
        ("*", Operator::Mul),
        ("/", Operator::Div),
        (">", Operator::Gt),
        ("<", Operator::Lt),
    ]);
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Operator::Eq => write!(f, "=="),
            Operator::NotEq => write!(f, "!="),
            Operator::Gt => write!(f, ">"),
            Operator::Gte => write!(f, ">="),
            Operator::Lt => write!(f, "<"),
            Operator::Lte => write!(f, "<="),
            Operator::And => write!(f, "&&"),
            Operator::Or => write!(f, "||"),
            Operator::Add => write!(f, "+"),
            Operator::Sub => write!(f, "-"),
            Operator::Mul => write!(f, "*"),
            Operator::Div => write!(f, "/"),
            Operator::Pow => write!(f, "**"),
        }
    }
}
