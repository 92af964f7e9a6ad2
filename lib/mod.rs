//! An embeddable evaluator for small boolean and arithmetic rule
//! expressions, such as `length>5&&<100` or `min(2),max(4)`.
//!
//! Expressions are evaluated left to right with no operator precedence.
//! Three pieces of relaxed grammar make short rule strings possible:
//!
//! * **Context elision**: an operator with no left-hand operand operates
//!   against the context value, so `<5` with a context of 4 means `4 < 5`.
//! * **Sequential operators**: `<5&&>3` chains two context comparisons.
//! * **Comma as logical AND**: outside a function argument list, `,`
//!   behaves exactly like `&&`.
//!
//! A [`Parser`] is built for a single expression and evaluates it once.
//! Variables (case-sensitive) and functions (case-insensitive) are
//! registered on the instance before evaluation; [`DefaultFactory`] builds
//! an instance with a small stock library (`min`, `max`, `length`) already
//! in place.
//!
//! ```
//! use expression_engine::{DefaultFactory, ParserFactory, Value};
//!
//! let mut parser = DefaultFactory::build("min(2),max(4)");
//! parser.set_context(3);
//!
//! assert_eq!(parser.evaluate().unwrap(), Value::Boolean(true));
//! ```

pub mod error;
pub mod factory;
pub mod operations;
pub mod parser;
pub mod token;
pub mod value;

pub use error::EvalError;
pub use factory::{DefaultFactory, ParserFactory};
pub use parser::{FunctionCallback, Parser, Variable, VariableCallback};
pub use token::Operator;
pub use value::Value;
