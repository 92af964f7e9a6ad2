//! Applies a single binary operator to two fully evaluated values.
//!
//! This layer is pure: it never touches the cursor, never fails, and both
//! operands have already been produced, so `&&`/`||` do not short-circuit.
//! The loose coercion rules live here and nowhere else.

use std::{borrow::Cow, cmp::Ordering};

use crate::{
    token::Operator,
    value::{Number, Value},
};

/// Applies `operator` to `(lhs, rhs)` and returns the resulting value.
pub fn apply(lhs: &Value, operator: Operator, rhs: &Value) -> Value {
    match operator {
        Operator::Eq
        | Operator::NotEq
        | Operator::Gt
        | Operator::Gte
        | Operator::Lt
        | Operator::Lte => Value::Boolean(ordering_satisfies(operator, loose_cmp(lhs, rhs))),
        Operator::And => Value::Boolean(lhs.is_truthy() && rhs.is_truthy()),
        Operator::Or => Value::Boolean(lhs.is_truthy() || rhs.is_truthy()),
        Operator::Add | Operator::Sub | Operator::Mul | Operator::Div | Operator::Pow => {
            arithmetic(lhs, operator, rhs)
        }
    }
}

/// Orders two values the way the relational operators see them.
///
/// A boolean on either side makes the comparison a boolean one. Otherwise
/// both sides compare numerically when both have a numeric reading
/// (integer pairs stay in integer space), and as strings when either does
/// not. `None` only arises from a NaN on the numeric path.
fn loose_cmp(lhs: &Value, rhs: &Value) -> Option<Ordering> {
    if matches!(lhs, Value::Boolean(_)) || matches!(rhs, Value::Boolean(_)) {
        return Some(lhs.is_truthy().cmp(&rhs.is_truthy()));
    }

    if let (Value::Integer(left), Value::Integer(right)) = (lhs, rhs) {
        return Some(left.cmp(right));
    }

    match (lhs.as_numeric(), rhs.as_numeric()) {
        (Some(left), Some(right)) => left.partial_cmp(&right),
        _ => Some(comparison_str(lhs).cmp(&comparison_str(rhs))),
    }
}

fn ordering_satisfies(operator: Operator, ordering: Option<Ordering>) -> bool {
    match operator {
        Operator::Eq => ordering == Some(Ordering::Equal),
        Operator::NotEq => ordering != Some(Ordering::Equal),
        Operator::Gt => ordering == Some(Ordering::Greater),
        Operator::Gte => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
        Operator::Lt => ordering == Some(Ordering::Less),
        Operator::Lte => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
        // only the relational operators consult an ordering
        _ => false,
    }
}

/// The string a value contributes to a string comparison. `Null` compares
/// as the empty string, not as the word "null".
fn comparison_str(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(value) => Cow::Borrowed(value),
        Value::Null => Cow::Borrowed(""),
        other => Cow::Owned(other.to_string()),
    }
}

/// Integer operands stay in integer space while the result fits; overflow,
/// inexact division and negative exponents promote to float. Division by
/// an integer zero takes the float path and yields the IEEE result instead
/// of panicking.
fn arithmetic(lhs: &Value, operator: Operator, rhs: &Value) -> Value {
    if let (Number::Int(left), Number::Int(right)) = (lhs.to_number(), rhs.to_number()) {
        let promoted = || float_arithmetic(left as f64, operator, right as f64);
        return match operator {
            Operator::Add => left.checked_add(right).map_or_else(promoted, Value::Integer),
            Operator::Sub => left.checked_sub(right).map_or_else(promoted, Value::Integer),
            Operator::Mul => left.checked_mul(right).map_or_else(promoted, Value::Integer),
            Operator::Div => {
                if right != 0 && left % right == 0 {
                    Value::Integer(left / right)
                } else {
                    promoted()
                }
            }
            Operator::Pow => u32::try_from(right)
                .ok()
                .and_then(|exponent| left.checked_pow(exponent))
                .map_or_else(promoted, Value::Integer),
            _ => promoted(),
        };
    }

    let (left, right) = match (lhs.to_number(), rhs.to_number()) {
        (Number::Int(left), Number::Int(right)) => (left as f64, right as f64),
        (Number::Int(left), Number::Float(right)) => (left as f64, right),
        (Number::Float(left), Number::Int(right)) => (left, right as f64),
        (Number::Float(left), Number::Float(right)) => (left, right),
    };

    float_arithmetic(left, operator, right)
}

fn float_arithmetic(left: f64, operator: Operator, right: f64) -> Value {
    match operator {
        Operator::Add => Value::Float(left + right),
        Operator::Sub => Value::Float(left - right),
        Operator::Mul => Value::Float(left * right),
        Operator::Div => Value::Float(left / right),
        Operator::Pow => Value::Float(left.powf(right)),
        // the arithmetic dispatcher never passes anything else down
        _ => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_comparisons() {
        let tests = vec![
            (Value::Integer(12), Operator::Eq, Value::Integer(12), true),
            (Value::Integer(12), Operator::Eq, Value::Integer(10), false),
            (Value::Integer(5), Operator::NotEq, Value::Integer(3), true),
            (Value::Integer(30), Operator::Gt, Value::Integer(15), true),
            (Value::Integer(30), Operator::Gt, Value::Integer(30), false),
            (Value::Integer(30), Operator::Gte, Value::Integer(30), true),
            (Value::Integer(15), Operator::Lt, Value::Integer(30), true),
            (Value::Integer(30), Operator::Lte, Value::Integer(15), false),
            (Value::Float(0.5), Operator::Lt, Value::Integer(1), true),
        ];

        for (lhs, operator, rhs, expected) in tests {
            assert_eq!(
                apply(&lhs, operator, &rhs),
                Value::Boolean(expected),
                "{:?} {} {:?}",
                lhs,
                operator,
                rhs
            );
        }
    }

    #[test]
    fn test_numeric_looking_strings_compare_numerically() {
        let tests = vec![
            (Value::String("5".to_string()), Value::Integer(5), true),
            (Value::String("5.0".to_string()), Value::Integer(5), true),
            (Value::String(" 5 ".to_string()), Value::Integer(5), true),
            (Value::String("5x".to_string()), Value::Integer(5), false),
        ];

        for (lhs, rhs, expected) in tests {
            assert_eq!(apply(&lhs, Operator::Eq, &rhs), Value::Boolean(expected));
        }
    }

    #[test]
    fn test_string_comparisons() {
        let abc = Value::String("abc".to_string());
        let abd = Value::String("abd".to_string());

        assert_eq!(apply(&abc, Operator::Eq, &abc), Value::Boolean(true));
        assert_eq!(apply(&abc, Operator::Eq, &abd), Value::Boolean(false));
        assert_eq!(apply(&abc, Operator::Lt, &abd), Value::Boolean(true));
        assert_eq!(
            apply(&Value::Null, Operator::Eq, &Value::String("".to_string())),
            Value::Boolean(true)
        );
    }

    #[test]
    fn test_boolean_coercion_wins_comparisons() {
        // a boolean on either side drags the other operand to truthiness
        let tests = vec![
            (Value::Boolean(true), Value::Integer(1), true),
            (Value::Boolean(true), Value::Integer(2), true),
            (Value::Boolean(false), Value::String("0".to_string()), true),
            (Value::Boolean(true), Value::Integer(0), false),
        ];

        for (lhs, rhs, expected) in tests {
            assert_eq!(apply(&lhs, Operator::Eq, &rhs), Value::Boolean(expected));
        }

        // true >= 2 compares as true >= true
        assert_eq!(
            apply(&Value::Boolean(true), Operator::Gte, &Value::Integer(2)),
            Value::Boolean(true)
        );
    }

    #[test]
    fn test_logical_operators_do_not_short_circuit_results() {
        let tests = vec![
            (1, Operator::And, 1, true),
            (1, Operator::And, 0, false),
            (0, Operator::And, 1, false),
            (0, Operator::Or, 1, true),
            (0, Operator::Or, 0, false),
        ];

        for (lhs, operator, rhs, expected) in tests {
            assert_eq!(
                apply(&Value::Integer(lhs), operator, &Value::Integer(rhs)),
                Value::Boolean(expected)
            );
        }
    }

    #[test]
    fn test_integer_arithmetic_stays_integer() {
        let tests = vec![
            (30, Operator::Add, 22, 52),
            (5, Operator::Sub, 3, 2),
            (3, Operator::Sub, 5, -2),
            (5, Operator::Mul, 3, 15),
            (15, Operator::Div, 3, 5),
            (5, Operator::Pow, 2, 25),
            (0, Operator::Pow, 0, 1),
        ];

        for (lhs, operator, rhs, expected) in tests {
            assert_eq!(
                apply(&Value::Integer(lhs), operator, &Value::Integer(rhs)),
                Value::Integer(expected)
            );
        }
    }

    #[test]
    fn test_inexact_division_is_float() {
        assert_eq!(
            apply(&Value::Integer(1), Operator::Div, &Value::Integer(2)),
            Value::Float(0.5)
        );
    }

    #[test]
    fn test_division_by_zero_is_infinite_not_fatal() {
        let result = apply(&Value::Integer(5), Operator::Div, &Value::Integer(0));
        match result {
            Value::Float(value) => assert!(value.is_infinite()),
            other => panic!("expected float, got {:?}", other),
        }
    }

    #[test]
    fn test_overflow_promotes_to_float() {
        let result = apply(
            &Value::Integer(i64::MAX),
            Operator::Add,
            &Value::Integer(1),
        );
        assert!(matches!(result, Value::Float(_)));

        let result = apply(&Value::Integer(2), Operator::Pow, &Value::Integer(64));
        assert!(matches!(result, Value::Float(_)));
    }

    #[test]
    fn test_negative_exponent_is_float() {
        assert_eq!(
            apply(&Value::Integer(2), Operator::Pow, &Value::Integer(-1)),
            Value::Float(0.5)
        );
    }

    #[test]
    fn test_arithmetic_coercion() {
        // non-numeric strings count as zero, booleans as 0/1
        assert_eq!(
            apply(
                &Value::String("abc".to_string()),
                Operator::Add,
                &Value::Integer(5)
            ),
            Value::Integer(5)
        );
        assert_eq!(
            apply(&Value::Boolean(true), Operator::Add, &Value::Boolean(true)),
            Value::Integer(2)
        );
        assert_eq!(
            apply(
                &Value::String("4".to_string()),
                Operator::Mul,
                &Value::String("2.5".to_string())
            ),
            Value::Float(10.0)
        );
    }
}
