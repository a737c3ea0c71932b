use std::collections::BTreeMap;
use std::fmt;
use std::io::{self, BufRead, StdinLock, Stdout, Write};
use std::rc::Rc;
use std::thread;

use crate::ast::*;
use crate::builtin::{collection, console, import};
use crate::environment::Environment;
use crate::error::{Error, RuntimeError};
use crate::lexer::Lexer;
use crate::object::{Function, Key, Value};
use crate::parser::Parser;

type EvalResult = Result<Value, RuntimeError>;

/// Nesting of function calls and imports allowed before evaluation fails
/// with [`RuntimeError::RecursionLimit`].
pub const MAX_CALL_DEPTH: usize = 10_000;

/// Native stack reserved by [`with_call_stack`]; enough for
/// [`MAX_CALL_DEPTH`] nested calls in unoptimized builds.
pub const CALL_STACK_SIZE: usize = 1 << 30;

/// Runs `f` on a thread whose stack can hold [`MAX_CALL_DEPTH`] nested
/// calls. A panic inside `f` is resumed on the calling thread.
pub fn with_call_stack<T, F>(f: F) -> io::Result<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let handle = thread::Builder::new()
        .name("goscript".to_string())
        .stack_size(CALL_STACK_SIZE)
        .spawn(f)?;
    Ok(handle
        .join()
        .unwrap_or_else(|payload| std::panic::resume_unwind(payload)))
}

/// Tree-walking evaluator.
///
/// The interpreter owns the console it talks to: `print` writes to `output`
/// and `input` reads lines from `input`. Scopes are passed in by the caller,
/// so one [`Environment`] can outlive many calls to [`Interpreter::run`].
pub struct Interpreter<R, W> {
    input: R,
    output: W,
    trace: Option<Box<dyn Write>>,
    depth: usize,
}

impl Interpreter<StdinLock<'static>, Stdout> {
    pub fn new() -> Self {
        Self::with_io(io::stdin().lock(), io::stdout())
    }
}

impl Default for Interpreter<StdinLock<'static>, Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: BufRead, W: Write> Interpreter<R, W> {
    pub fn with_io(input: R, output: W) -> Self {
        Self {
            input,
            output,
            trace: None,
            depth: 0,
        }
    }

    pub fn input_mut(&mut self) -> &mut R {
        &mut self.input
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut W {
        &mut self.output
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Installs a sink that receives one line per evaluated top-level node
    /// and per imported file.
    pub fn set_trace(&mut self, sink: Box<dyn Write>) {
        self.trace = Some(sink);
    }

    fn trace(&mut self, args: fmt::Arguments<'_>) {
        if let Some(sink) = self.trace.as_mut() {
            // A broken trace sink must not change the program's outcome.
            let _ = writeln!(sink, "{}", args);
        }
    }

    /// Lexes, parses and evaluates `source` statement by statement in `env`,
    /// returning the value of the last statement.
    ///
    /// Statements are pulled from the parser one at a time, so everything
    /// before a lexical or syntax error has already run when it is reported.
    pub fn run(&mut self, source: &str, env: &Environment) -> Result<Value, Error> {
        let mut result = Value::Nil;
        for node in Parser::new(Lexer::new(source)) {
            let node = node?;
            self.trace(format_args!("eval: {:?}", node));
            result = self.eval(&node, env)?;
        }
        Ok(result)
    }

    pub fn eval(&mut self, node: &Node, env: &Environment) -> EvalResult {
        match node {
            Node::String(s) => Ok(Value::String(s.clone())),
            Node::Integer(i) => Ok(Value::Integer(*i)),
            Node::Float(x) => Ok(Value::Float(*x)),
            Node::Boolean(b) => Ok(Value::Boolean(*b)),
            Node::Array(elements) => Ok(Value::Array(self.eval_expressions(elements, env)?)),
            Node::Map(entries) => self.eval_map_literal(entries, env),
            Node::Function(literal) => {
                if let Some(name) = &literal.name {
                    env.define_function(name, Rc::clone(literal));
                }
                Ok(Value::Function(Function::new(Rc::clone(literal), env.clone())))
            }
            Node::Identifier(name) => self.lookup_variable(name, env),
            Node::Prefix(prefix, right) => {
                let right = self.eval(right, env)?;
                eval_prefix_expression(*prefix, right)
            }
            Node::Infix(infix, left, right) => self.eval_infix_expression(*infix, left, right, env),
            Node::Index { subject, index } => {
                let subject = self.eval(subject, env)?;
                let index = self.eval(index, env)?;
                collection::index(&subject, &index)
            }
            Node::Range { from, to, step } => {
                let from = self.eval(from, env)?;
                let to = self.eval(to, env)?;
                let step = match step {
                    Some(step) => Some(self.eval(step, env)?),
                    None => None,
                };
                collection::range(&from, &to, step.as_ref())
            }
            Node::Call {
                function,
                arguments,
            } => {
                let function = self.lookup_callable(function, env)?;
                let arguments = self.eval_expressions(arguments, env)?;
                self.call_function(&function, arguments)
            }
            Node::If {
                condition,
                consequence,
                alternative,
            } => match self.eval(condition, env)? {
                Value::Boolean(true) => self.eval_block(consequence, env),
                Value::Boolean(false) => match alternative {
                    Some(alternative) => self.eval_block(alternative, env),
                    None => Ok(Value::Nil),
                },
                other => Err(RuntimeError::type_error(format!(
                    "Condition must be bool, got {}",
                    other.type_name()
                ))),
            },
            Node::For {
                key,
                value,
                target,
                body,
            } => self.eval_for_expression(key, value.as_deref(), target, body, env),
            Node::Return(value) => self.eval(value, env),
            Node::Assign { target, value } => {
                let value = self.eval(value, env)?;
                self.assign(target, value.clone(), env)?;
                Ok(value)
            }
            Node::Swap(left, right) => {
                let left_value = self.eval(left, env)?;
                let right_value = self.eval(right, env)?;
                self.assign(left, right_value, env)?;
                self.assign(right, left_value, env)?;
                Ok(Value::Nil)
            }
            Node::Print { arguments, newline } => {
                let arguments = self.eval_expressions(arguments, env)?;
                self.output
                    .write_all(console::format_print(&arguments, *newline).as_bytes())?;
                self.output.flush()?;
                Ok(Value::Nil)
            }
            Node::Input(prompt) => {
                let prompt = self.eval(prompt, env)?;
                write!(self.output, "{}", prompt)?;
                self.output.flush()?;
                Ok(Value::String(console::read_line(&mut self.input)?))
            }
            Node::Len(value) => {
                let value = self.eval(value, env)?;
                collection::length(&value)
            }
            Node::Import(path) => {
                let path = import::script_path(&self.eval(path, env)?)?;
                self.trace(format_args!("import: {}", path.display()));
                let source = import::read_script(&path)?;
                self.nested(|interpreter| {
                    interpreter
                        .run(&source, env)
                        .map_err(|err| RuntimeError::Import {
                            path,
                            source: Box::new(err),
                        })
                })?;
                Ok(Value::Nil)
            }
        }
    }

    /// Runs `block` in `env`. A non-nil `if` or `return` statement ends the
    /// block with its value.
    fn eval_block(&mut self, block: &[Node], env: &Environment) -> EvalResult {
        let mut result = Value::Nil;
        for statement in block {
            result = self.eval(statement, env)?;
            if matches!(statement, Node::If { .. } | Node::Return(_)) && !result.is_nil() {
                return Ok(result);
            }
        }
        Ok(result)
    }

    fn eval_expressions(
        &mut self,
        nodes: &[Node],
        env: &Environment,
    ) -> Result<Vec<Value>, RuntimeError> {
        nodes.iter().map(|node| self.eval(node, env)).collect()
    }

    fn eval_map_literal(&mut self, entries: &[(Node, Node)], env: &Environment) -> EvalResult {
        let mut map = BTreeMap::new();
        for (key, value) in entries {
            let key = Key::try_from(&self.eval(key, env)?)?;
            let value = self.eval(value, env)?;
            map.insert(key, value);
        }
        Ok(Value::Map(map))
    }

    fn lookup_variable(&self, name: &str, env: &Environment) -> EvalResult {
        if let Some(value) = env.get_variable(name) {
            return Ok(value);
        }
        env.get_function(name)
            .map(Value::Function)
            .ok_or_else(|| RuntimeError::Reference(name.to_string()))
    }

    /// Resolves the callee of a call. A bare name is looked up among
    /// functions first, then among variables holding a function value.
    fn lookup_callable(
        &mut self,
        function: &Node,
        env: &Environment,
    ) -> Result<Function, RuntimeError> {
        let value = match function {
            Node::Identifier(name) => match env.get_function(name) {
                Some(function) => return Ok(function),
                None => env
                    .get_variable(name)
                    .ok_or_else(|| RuntimeError::Reference(name.to_string()))?,
            },
            other => self.eval(other, env)?,
        };
        match value {
            Value::Function(function) => Ok(function),
            other => Err(RuntimeError::type_error(format!(
                "A value of type {} is not callable",
                other.type_name()
            ))),
        }
    }

    fn call_function(&mut self, function: &Function, arguments: Vec<Value>) -> EvalResult {
        let parameters = &function.literal.parameters;
        if parameters.len() != arguments.len() {
            return Err(RuntimeError::type_error(format!(
                "{} expects {} argument(s), got {}",
                function,
                parameters.len(),
                arguments.len()
            )));
        }
        let env = function.closure.new_child();
        for (parameter, argument) in parameters.iter().zip(arguments) {
            env.define_variable(parameter, argument);
        }
        self.nested(|interpreter| interpreter.eval_block(&function.literal.body, &env))
    }

    /// Runs `f` one call level deeper, failing once [`MAX_CALL_DEPTH`] levels
    /// are active.
    fn nested<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, RuntimeError>,
    ) -> Result<T, RuntimeError> {
        if self.depth >= MAX_CALL_DEPTH {
            return Err(RuntimeError::RecursionLimit(MAX_CALL_DEPTH));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn eval_infix_expression(
        &mut self,
        infix: Infix,
        left: &Node,
        right: &Node,
        env: &Environment,
    ) -> EvalResult {
        let left = self.eval(left, env)?;
        match (infix, &left) {
            (Infix::And, Value::Boolean(false)) => return Ok(Value::Boolean(false)),
            (Infix::Or, Value::Boolean(true)) => return Ok(Value::Boolean(true)),
            _ => {}
        }
        let right = self.eval(right, env)?;
        eval_binary(infix, left, right)
    }

    fn eval_for_expression(
        &mut self,
        key: &str,
        value: Option<&str>,
        target: &Node,
        body: &[Node],
        env: &Environment,
    ) -> EvalResult {
        // The single-variable form binds the key of a map and the element of
        // anything else.
        let (bindings, binds_key): (Vec<(Value, Value)>, bool) = match self.eval(target, env)? {
            Value::String(s) => (
                s.chars()
                    .enumerate()
                    .map(|(i, c)| (Value::Integer(i as i64), Value::String(c.to_string())))
                    .collect(),
                false,
            ),
            Value::Array(items) => (
                items
                    .into_iter()
                    .enumerate()
                    .map(|(i, item)| (Value::Integer(i as i64), item))
                    .collect(),
                false,
            ),
            Value::Map(entries) => (
                entries
                    .into_iter()
                    .map(|(key, item)| (Value::from(key), item))
                    .collect(),
                true,
            ),
            other => {
                return Err(RuntimeError::type_error(format!(
                    "A value of type {} cannot be iterated",
                    other.type_name()
                )))
            }
        };

        for (index, item) in bindings {
            match value {
                Some(value) => {
                    env.define_variable(key, index);
                    env.define_variable(value, item);
                }
                None if binds_key => env.define_variable(key, index),
                None => env.define_variable(key, item),
            }
            self.eval_block(body, env)?;
        }
        Ok(Value::Nil)
    }

    fn assign(
        &mut self,
        target: &Node,
        value: Value,
        env: &Environment,
    ) -> Result<(), RuntimeError> {
        let (name, path) = self.place(target, env)?;
        if path.is_empty() {
            env.assign_variable(&name, value);
            return Ok(());
        }
        env.with_variable_mut(&name, |root| collection::assign_path(root, &path, value))
            .unwrap_or_else(|| Err(RuntimeError::Reference(name)))
    }

    /// Splits an assignment target into the variable it is rooted at and the
    /// evaluated index path below it.
    fn place(
        &mut self,
        target: &Node,
        env: &Environment,
    ) -> Result<(String, Vec<Value>), RuntimeError> {
        match target {
            Node::Identifier(name) => Ok((name.clone(), Vec::new())),
            Node::Index { subject, index } => {
                let (name, mut path) = self.place(subject, env)?;
                path.push(self.eval(index, env)?);
                Ok((name, path))
            }
            other => Err(RuntimeError::type_error(format!(
                "Cannot assign to {:?}",
                other
            ))),
        }
    }
}

fn unsupported(infix: Infix, left: &Value, right: &Value) -> RuntimeError {
    RuntimeError::type_error(format!(
        "Unsupported operation: {} {} {}",
        left.type_name(),
        infix,
        right.type_name()
    ))
}

fn eval_prefix_expression(prefix: Prefix, right: Value) -> EvalResult {
    match (prefix, right) {
        (Prefix::Minus, Value::Integer(i)) => Ok(Value::Integer(i.wrapping_neg())),
        (Prefix::Minus, Value::Float(x)) => Ok(Value::Float(-x)),
        (Prefix::Bang, Value::Boolean(b)) => Ok(Value::Boolean(!b)),
        (prefix, other) => Err(RuntimeError::type_error(format!(
            "Unsupported operation: {}{}",
            prefix,
            other.type_name()
        ))),
    }
}

/// Applies `infix` once both operands are known, dispatching on their
/// runtime types. An int meeting a float is widened to float.
fn eval_binary(infix: Infix, left: Value, right: Value) -> EvalResult {
    match (left, right) {
        (Value::Integer(l), Value::Integer(r)) => eval_integer_infix(infix, l, r),
        (Value::Float(l), Value::Float(r)) => eval_float_infix(infix, l, r),
        (Value::Integer(l), Value::Float(r)) => eval_float_infix(infix, l as f64, r),
        (Value::Float(l), Value::Integer(r)) => eval_float_infix(infix, l, r as f64),
        (Value::String(l), r @ (Value::String(_) | Value::Integer(_) | Value::Float(_)))
            if infix == Infix::Plus =>
        {
            Ok(Value::String(format!("{}{}", l, r)))
        }
        (Value::Boolean(l), Value::Boolean(r)) => eval_boolean_infix(infix, l, r),
        (left, right) => Err(unsupported(infix, &left, &right)),
    }
}

fn eval_integer_infix(infix: Infix, l: i64, r: i64) -> EvalResult {
    let value = match infix {
        Infix::Plus => Value::Integer(l.wrapping_add(r)),
        Infix::Minus => Value::Integer(l.wrapping_sub(r)),
        Infix::Product => Value::Integer(l.wrapping_mul(r)),
        Infix::ForwardSlash => {
            if r == 0 {
                return Err(RuntimeError::DivisionByZero);
            }
            Value::Integer(l.wrapping_div(r))
        }
        Infix::Equal => Value::Boolean(l == r),
        Infix::DoesNotEqual => Value::Boolean(l != r),
        Infix::GreaterThan => Value::Boolean(l > r),
        Infix::LessThan => Value::Boolean(l < r),
        Infix::GTOrEqual => Value::Boolean(l >= r),
        Infix::LTOrEqual => Value::Boolean(l <= r),
        Infix::And | Infix::Or => {
            return Err(unsupported(infix, &Value::Integer(l), &Value::Integer(r)))
        }
    };
    Ok(value)
}

fn eval_float_infix(infix: Infix, l: f64, r: f64) -> EvalResult {
    let value = match infix {
        Infix::Plus => Value::Float(l + r),
        Infix::Minus => Value::Float(l - r),
        Infix::Product => Value::Float(l * r),
        Infix::ForwardSlash => Value::Float(l / r),
        Infix::Equal => Value::Boolean(l == r),
        Infix::DoesNotEqual => Value::Boolean(l != r),
        Infix::GreaterThan => Value::Boolean(l > r),
        Infix::LessThan => Value::Boolean(l < r),
        Infix::GTOrEqual => Value::Boolean(l >= r),
        Infix::LTOrEqual => Value::Boolean(l <= r),
        Infix::And | Infix::Or => {
            return Err(unsupported(infix, &Value::Float(l), &Value::Float(r)))
        }
    };
    Ok(value)
}

fn eval_boolean_infix(infix: Infix, l: bool, r: bool) -> EvalResult {
    match infix {
        Infix::Equal => Ok(Value::Boolean(l == r)),
        Infix::DoesNotEqual => Ok(Value::Boolean(l != r)),
        Infix::And => Ok(Value::Boolean(l && r)),
        Infix::Or => Ok(Value::Boolean(l || r)),
        _ => Err(unsupported(infix, &Value::Boolean(l), &Value::Boolean(r))),
    }
}
