//! Builds [`Parser`] instances pre-populated with a small library of
//! default functions and variables.
//!
//! The evaluator itself ships with no functions or variables at all. The
//! factory registers a stock set (`min`, `max` and a `length` variable)
//! through the public registration API only, skipping any name the
//! embedder has already claimed.

use anyhow::{bail, Result};

use crate::{operations, parser::Parser, token::Operator, value::Value};

/// Builds ready-to-use evaluators.
///
/// Implementors may override [`ParserFactory::extend`] to register their
/// own functions and variables; it runs before the defaults, and a default
/// is never registered over an existing name, so an `extend` registration
/// always wins.
///
/// ```
/// use expression_engine::{Parser, ParserFactory, Value};
///
/// struct AnswerFactory;
///
/// impl ParserFactory for AnswerFactory {
///     fn extend(parser: &mut Parser) {
///         parser.set_variable("answer", 42);
///     }
/// }
///
/// let mut parser = AnswerFactory::build("answer==42");
/// assert_eq!(parser.evaluate().unwrap(), Value::Boolean(true));
/// ```
pub trait ParserFactory {
    /// Registration hook, called before the defaults go in.
    fn extend(_parser: &mut Parser) {}

    /// Builds an evaluator for `expression` with the default library
    /// registered.
    fn build(expression: &str) -> Parser {
        let mut parser = Parser::new(expression);

        Self::extend(&mut parser);

        maybe_register_function(&mut parser, "min", func_min);
        maybe_register_function(&mut parser, "max", func_max);
        maybe_set_variable_callback(&mut parser, "length", var_length);

        parser
    }
}

/// The stock factory: nothing beyond the default library.
pub struct DefaultFactory;

impl ParserFactory for DefaultFactory {}

fn maybe_register_function<F>(parser: &mut Parser, name: &str, callback: F)
where
    F: Fn(&mut Parser, Vec<Value>) -> Result<Value> + 'static,
{
    if parser.has_function(name) {
        return;
    }

    parser.register_function(name, callback);
}

fn maybe_set_variable_callback<F>(parser: &mut Parser, name: &str, callback: F)
where
    F: Fn(&mut Parser) -> Result<Value> + 'static,
{
    if parser.has_variable(name) {
        return;
    }

    parser.set_variable_callback(name, callback);
}

/// `min(bound)` tests the context against a lower bound; with two or more
/// arguments it returns the smallest of them instead.
fn func_min(parser: &mut Parser, args: Vec<Value>) -> Result<Value> {
    match args.len() {
        0 => bail!("min requires at least one argument"),
        1 => {
            let context = parser.get_context().cloned().unwrap_or(Value::Null);
            Ok(operations::apply(&context, Operator::Gte, &args[0]))
        }
        _ => {
            let mut args = args.into_iter();
            let mut smallest = args.next().unwrap_or(Value::Null);
            for candidate in args {
                if operations::apply(&candidate, Operator::Lt, &smallest).is_truthy() {
                    smallest = candidate;
                }
            }
            Ok(smallest)
        }
    }
}

/// `max(bound)` tests the context against an upper bound; with two or more
/// arguments it returns the largest of them instead.
fn func_max(parser: &mut Parser, args: Vec<Value>) -> Result<Value> {
    match args.len() {
        0 => bail!("max requires at least one argument"),
        1 => {
            let context = parser.get_context().cloned().unwrap_or(Value::Null);
            Ok(operations::apply(&context, Operator::Lte, &args[0]))
        }
        _ => {
            let mut args = args.into_iter();
            let mut largest = args.next().unwrap_or(Value::Null);
            for candidate in args {
                if operations::apply(&candidate, Operator::Gt, &largest).is_truthy() {
                    largest = candidate;
                }
            }
            Ok(largest)
        }
    }
}

/// The `length` variable: byte length of the context string.
fn var_length(parser: &mut Parser) -> Result<Value> {
    match parser.get_context() {
        None | Some(Value::Null) => bail!("no context to check for length"),
        Some(Value::String(value)) => Ok(Value::Integer(value.len() as i64)),
        Some(other) => Ok(Value::Integer(other.to_string().len() as i64)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_registers_defaults() {
        let parser = DefaultFactory::build("");

        for name in ["min", "max"] {
            assert!(parser.has_function(name), "missing function {}", name);
        }
        assert!(parser.has_variable("length"));
    }

    #[test]
    fn test_min_single_argument_tests_lower_bound() {
        let tests = vec![("min(3)", true), ("min(2)", true), ("min(4)", false)];

        for (expression, expected) in tests {
            let mut parser = DefaultFactory::build(expression);
            parser.set_context(3);
            assert_eq!(
                parser.evaluate().unwrap(),
                Value::Boolean(expected),
                "{}",
                expression
            );
        }
    }

    #[test]
    fn test_max_single_argument_tests_upper_bound() {
        let tests = vec![("max(3)", true), ("max(4)", true), ("max(2)", false)];

        for (expression, expected) in tests {
            let mut parser = DefaultFactory::build(expression);
            parser.set_context(3);
            assert_eq!(
                parser.evaluate().unwrap(),
                Value::Boolean(expected),
                "{}",
                expression
            );
        }
    }

    #[test]
    fn test_min_max_multiple_arguments_pick_an_extreme() {
        let mut parser = DefaultFactory::build("min(3,5,2)");
        assert_eq!(parser.evaluate().unwrap(), Value::Integer(2));

        let mut parser = DefaultFactory::build("max(3,5,2)");
        assert_eq!(parser.evaluate().unwrap(), Value::Integer(5));
    }

    #[test]
    fn test_min_max_without_arguments_fail() {
        for expression in ["min()", "max()"] {
            let mut parser = DefaultFactory::build(expression);
            parser.set_context(3);
            assert!(parser.evaluate().is_err(), "{}", expression);
        }
    }

    #[test]
    fn test_length_of_context_string() {
        let mut parser = DefaultFactory::build("length==7");
        parser.set_context("CtxStub");

        assert_eq!(parser.evaluate().unwrap(), Value::Boolean(true));
    }

    #[test]
    fn test_length_without_context_fails() {
        let mut parser = DefaultFactory::build("length");
        assert!(parser.evaluate().is_err());
    }

    #[test]
    fn test_extend_hook_overrides_default_function() {
        struct MockFactory;

        impl ParserFactory for MockFactory {
            fn extend(parser: &mut Parser) {
                parser.register_function("max", |_, _| Ok(Value::Integer(99)));
            }
        }

        let mut parser = MockFactory::build("max(1,2,3)");
        assert_eq!(parser.evaluate().unwrap(), Value::Integer(99));
    }

    #[test]
    fn test_extend_hook_registers_new_function() {
        struct MockFactory;

        impl ParserFactory for MockFactory {
            fn extend(parser: &mut Parser) {
                parser.register_function("myLen", |_, args| {
                    Ok(Value::Integer(args[0].to_string().len() as i64))
                });
            }
        }

        let parser = MockFactory::build("");
        assert!(parser.has_function("myLen"));
        assert!(parser.has_function("min"));
    }

    #[test]
    fn test_extend_hook_overrides_default_variable() {
        struct MockFactory;

        impl ParserFactory for MockFactory {
            fn extend(parser: &mut Parser) {
                parser.set_variable("length", 2);
            }
        }

        let mut parser = MockFactory::build("length==2");
        assert_eq!(parser.evaluate().unwrap(), Value::Boolean(true));
    }

    #[test]
    fn test_extend_hook_registers_new_variable() {
        struct MockFactory;

        impl ParserFactory for MockFactory {
            fn extend(parser: &mut Parser) {
                parser.set_variable("myVar", 3);
            }
        }

        let parser = MockFactory::build("");
        assert!(parser.has_variable("myVar"));
        assert!(parser.has_variable("length"));
    }
}
