use std::{collections::HashMap, mem, rc::Rc};

use anyhow::Result;

use crate::{
    error::EvalError,
    operations,
    token::{Operator, OPS_TOKEN_MAP},
    value::Value,
};

/// Characters that terminate accumulation of a literal or identifier.
/// None of them can ever be part of a value.
const WORD_BOUNDARY_CHARSET: &[char] = &[
    '!', '@', '#', '$', '%', '^', '&', '*', '(', ')', '-', '+', '=', '|', '\\', '/', '<', '>', ':',
    ';', '"', '\'', ',', '?', '`', '~',
];

/// A function callback. Receives the evaluator and the already-evaluated
/// arguments in source order; whatever it returns becomes the call's value.
pub type FunctionCallback = Rc<dyn Fn(&mut Parser, Vec<Value>) -> Result<Value>>;

/// A computed-variable callback, re-invoked on every read of the variable.
pub type VariableCallback = Rc<dyn Fn(&mut Parser) -> Result<Value>>;

/// A variable table entry: either a stored value or a callback computed on
/// every read (never cached).
#[derive(Clone)]
pub enum Variable {
    Literal(Value),
    Computed(VariableCallback),
}

/// Evaluates a single expression.
///
/// A `Parser` is instantiated per expression and runs once only; after
/// [`Parser::evaluate`] has returned, the instance is spent. Variables,
/// functions and the context value are registered on the instance before
/// (or, from within callbacks, during) that one evaluation.
///
/// Instances are not meant to be shared across threads or across logical
/// evaluations; every method that participates in evaluation mutates the
/// cursor. Callbacks receive `&mut Parser` and may read the context and
/// read or register variables and functions mid-evaluation.
pub struct Parser {
    expression: Vec<char>,
    source: String,
    pos: usize,
    variables: HashMap<String, Variable>,
    functions: HashMap<String, FunctionCallback>,
    context: Option<Value>,

    /// Inside a function argument list the comma delimits arguments
    /// instead of acting as a logical AND.
    parsing_function_args: bool,
}

impl Parser {
    /// Creates an evaluator for `expression`. All whitespace is stripped
    /// up front; offsets in errors refer to the stripped source.
    pub fn new(expression: &str) -> Self {
        let expression: Vec<char> = expression.chars().filter(|c| !c.is_whitespace()).collect();
        Self {
            source: expression.iter().collect(),
            expression,
            pos: 0,
            variables: HashMap::new(),
            functions: HashMap::new(),
            context: None,
            parsing_function_args: false,
        }
    }

    /// Whether a variable of exactly this name has been set. Variable
    /// names are case-sensitive.
    pub fn has_variable(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    /// The current value of a variable, or `Null` if it was never set.
    /// A computed variable is invoked afresh on every call.
    pub fn get_variable(&mut self, name: &str) -> Result<Value> {
        match self.variables.get(name).cloned() {
            Some(Variable::Literal(value)) => Ok(value),
            Some(Variable::Computed(callback)) => (*callback)(self),
            None => Ok(Value::Null),
        }
    }

    /// Sets a variable to a fixed value.
    ///
    /// Variable names must start with a letter and contain only letters
    /// and digits; anything else can never be matched by the grammar.
    pub fn set_variable(&mut self, name: &str, value: impl Into<Value>) {
        self.variables
            .insert(name.to_string(), Variable::Literal(value.into()));
    }

    /// Sets a variable to a callback computed at read time. The callback
    /// receives the evaluator and is re-invoked on every read.
    pub fn set_variable_callback<F>(&mut self, name: &str, callback: F)
    where
        F: Fn(&mut Parser) -> Result<Value> + 'static,
    {
        self.variables
            .insert(name.to_string(), Variable::Computed(Rc::new(callback)));
    }

    /// Whether a context value has been set.
    pub fn has_context(&self) -> bool {
        self.context.is_some()
    }

    /// The context value, if one has been set.
    pub fn get_context(&self) -> Option<&Value> {
        self.context.as_ref()
    }

    /// Sets the value that short expressions operate against.
    ///
    /// An operator with no left-hand operand takes the context as its
    /// left-hand side: with a context of 5, `<10&&>2` evaluates as
    /// `5<10&&5>2`.
    pub fn set_context(&mut self, value: impl Into<Value>) {
        self.context = Some(value.into());
    }

    /// Whether a function is registered under this name. Function names
    /// are case-insensitive.
    pub fn has_function(&self, name: &str) -> bool {
        self.functions.contains_key(&name.to_lowercase())
    }

    /// Registers a function callback, replacing any previous registration
    /// under the same (case-insensitive) name.
    pub fn register_function<F>(&mut self, name: &str, callback: F)
    where
        F: Fn(&mut Parser, Vec<Value>) -> Result<Value> + 'static,
    {
        self.functions
            .insert(name.to_lowercase(), Rc::new(callback));
    }

    /// Evaluates the expression to a single value.
    ///
    /// Fails with an [`EvalError`] if the expression is malformed, names
    /// an unregistered function or an unset variable, or could not be
    /// consumed in full. Errors raised by registered callbacks pass
    /// through unmodified.
    pub fn evaluate(&mut self) -> Result<Value> {
        let value = self.evaluate_expression()?;

        if self.pos < self.expression.len() {
            return Err(EvalError::IncompleteEvaluation {
                expression: self.source.clone(),
                offset: self.pos,
            }
            .into());
        }

        Ok(value.unwrap_or(Value::Null))
    }

    /// The control loop: a term, then repeatedly an operator and a second
    /// operand, applied left to right.
    fn evaluate_expression(&mut self) -> Result<Option<Value>> {
        let mut value = self.next_term()?;

        loop {
            let operator = self.next_operator();

            let operator = match (value.is_some(), operator) {
                // no left-hand operand: the context stands in for it
                (false, Some(operator)) => {
                    value = Some(self.context.clone().unwrap_or(Value::Null));
                    operator
                }
                // no operator left: the term is the result. This is how
                // recursion unwinds at a close-paren, an argument
                // delimiter, or the end of input.
                (true, None) => return Ok(value),
                (true, Some(operator)) => operator,
                (false, None) => {
                    return Err(EvalError::MissingRhsValue {
                        expression: self.source.clone(),
                        offset: self.pos,
                    }
                    .into())
                }
            };

            // Sequential operators: in `>1&&<5` the `<` follows `&&` with
            // no term in between, so the right-hand side is a whole
            // sub-evaluation (itself context-elided) rather than a bare
            // term. A trailing `&&`/`||` never starts one.
            let rhs = match self.peek_operator() {
                Some(next) if !matches!(next, Operator::And | Operator::Or) => {
                    self.evaluate_expression()?
                }
                _ => self.next_term()?,
            };

            let Some(rhs) = rhs else {
                return Err(EvalError::MissingRhsValue {
                    expression: self.source.clone(),
                    offset: self.pos,
                }
                .into());
            };

            let lhs = value.take().unwrap_or(Value::Null);
            value = Some(operations::apply(&lhs, operator, &rhs));
        }
    }

    /// Consumes the next primary operand: a number, a variable, a
    /// parenthesized sub-expression, a function call, or any of those
    /// under a run of leading `!`. Returns `None` when the cursor sits
    /// directly on a word boundary (the "no term" outcome the control
    /// loop turns into context elision).
    fn next_term(&mut self) -> Result<Option<Value>> {
        let mut literal = String::new();
        let mut invert: Option<bool> = None;
        let mut float_seen = false;
        let mut value = None;

        loop {
            match self.expression.get(self.pos).copied() {
                // '!' only inverts when it is not the start of '!='
                Some('!') if self.expression.get(self.pos + 1) != Some(&'=') => {
                    invert = Some(!invert.unwrap_or(false));
                    self.pos += 1;
                }
                Some('(') if !float_seen => {
                    self.pos += 1;

                    // an accumulated name makes this a function call,
                    // otherwise it is a sub-expression
                    value = if literal.is_empty() {
                        self.evaluate_expression()?
                    } else {
                        Some(self.evaluate_function(&mem::take(&mut literal))?)
                    };

                    if self.expression.get(self.pos) != Some(&')') {
                        return Err(EvalError::UnmatchedParenthesis {
                            expression: self.source.clone(),
                        }
                        .into());
                    }
                    self.pos += 1;

                    break;
                }
                Some(c) if WORD_BOUNDARY_CHARSET.contains(&c) => break,
                None => break,
                Some('.') => {
                    float_seen = true;
                    literal.push('.');
                    self.pos += 1;
                }
                Some(c) if c.is_ascii_alphanumeric() => {
                    literal.push(c);
                    self.pos += 1;
                }
                Some(_) => {
                    return Err(EvalError::UnexpectedCharacter {
                        expression: self.source.clone(),
                        offset: self.pos,
                    }
                    .into())
                }
            }
        }

        let mut value = match value {
            Some(value) => value,
            None if literal.is_empty() => return Ok(None),
            None => self.resolve_literal(&literal, float_seen)?,
        };

        // An odd run of '!' negates, an even run is an explicit boolean
        // cast; untouched means the value passes through as-is.
        if let Some(negate) = invert {
            let truthy = value.is_truthy();
            value = Value::Boolean(if negate { !truthy } else { truthy });
        }

        Ok(Some(value))
    }

    /// Turns an accumulated literal into a value: a registered variable
    /// read, or a parsed number. Which failure is reported depends on the
    /// literal's shape, so that `str.len` and `4.0.0` and an unset `foo`
    /// each read differently.
    fn resolve_literal(&mut self, literal: &str, float_seen: bool) -> Result<Value> {
        let is_variable = literal
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic());

        if is_variable && !float_seen && self.has_variable(literal) {
            return self.get_variable(literal);
        }

        if !is_variable {
            if !float_seen {
                if let Ok(int) = literal.parse::<i64>() {
                    return Ok(Value::Integer(int));
                }
            }
            // also picks up exponent forms and integers too wide for i64
            if let Ok(float) = literal.parse::<f64>() {
                return Ok(Value::Float(float));
            }
        }

        let offset = self.pos - literal.chars().count();

        if is_variable {
            if float_seen {
                Err(EvalError::InvalidVariableName {
                    name: literal.to_string(),
                    expression: self.source.clone(),
                    offset,
                }
                .into())
            } else {
                Err(EvalError::UnknownVariable {
                    name: literal.to_string(),
                    expression: self.source.clone(),
                    offset,
                }
                .into())
            }
        } else {
            Err(EvalError::InvalidNumberFormat {
                literal: literal.to_string(),
                expression: self.source.clone(),
                offset,
            }
            .into())
        }
    }

    /// Consumes a comma-delimited argument list and dispatches to the
    /// registered callback. On entry the cursor sits just past the opening
    /// parenthesis; on success it sits on the closing parenthesis, which
    /// the caller consumes.
    fn evaluate_function(&mut self, name: &str) -> Result<Value> {
        // where the call began, in case the name turns out unregistered
        let func_offset = self.pos - name.chars().count() - 1;
        let mut args = Vec::new();

        let in_args = mem::replace(&mut self.parsing_function_args, true);

        loop {
            match self.expression.get(self.pos).copied() {
                None => {
                    return Err(EvalError::UnmatchedParenthesis {
                        expression: self.source.clone(),
                    }
                    .into())
                }
                Some(')') => break,
                Some(',') => self.pos += 1,
                Some(_) => {
                    // arguments are full expressions; evaluation consumes
                    // up to the next delimiter or the closing parenthesis
                    if let Some(value) = self.evaluate_expression()? {
                        args.push(value);
                    }
                }
            }
        }

        self.parsing_function_args = in_args;

        let name = name.to_lowercase();
        let Some(callback) = self.functions.get(&name).cloned() else {
            return Err(EvalError::UnknownFunction {
                name,
                expression: self.source.clone(),
                offset: func_offset,
            }
            .into());
        };

        (*callback)(self, args)
    }

    fn next_operator(&mut self) -> Option<Operator> {
        self.read_raw_operator(true)
    }

    fn peek_operator(&mut self) -> Option<Operator> {
        self.read_raw_operator(false)
    }

    /// The one shared operator scanner, so lookahead and consumption can
    /// never disagree. Returns `None` when no operator starts at the
    /// cursor, which is a normal outcome.
    fn read_raw_operator(&mut self, consume: bool) -> Option<Operator> {
        if self.pos + 2 <= self.expression.len() {
            let lexeme: String = self.expression[self.pos..self.pos + 2].iter().collect();
            if let Some(&operator) = OPS_TOKEN_MAP.get(lexeme.as_str()) {
                if consume {
                    self.pos += 2;
                }
                return Some(operator);
            }
        }

        if let Some(&char) = self.expression.get(self.pos) {
            if let Some(&operator) = OPS_TOKEN_MAP.get(char.to_string().as_str()) {
                if consume {
                    self.pos += 1;
                }
                return Some(operator);
            }

            // outside a parameter list the comma is sugar for logical AND
            if !self.parsing_function_args && char == ',' {
                if consume {
                    self.pos += 1;
                }
                return Some(Operator::And);
            }
        }

        None
    }
}
