use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use ordered_float::OrderedFloat;

use crate::ast::FunctionLiteral;
use crate::environment::Environment;
use crate::error::RuntimeError;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Nil,
    Integer(i64),
    Float(f64),
    Boolean(bool),
    String(String),
    Array(Vec<Value>),
    Map(BTreeMap<Key, Value>),
    Function(Function),
}

/// A map key. Only scalars with a stable structural equality can key a map;
/// keys of different variants never compare equal (`1` and `1.0` are two
/// distinct keys).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Key {
    Integer(i64),
    Float(OrderedFloat<f64>),
    Boolean(bool),
    String(String),
}

/// A function value: the literal it was created from plus the scope that was
/// active where it was defined.
#[derive(Clone)]
pub struct Function {
    pub literal: Rc<FunctionLiteral>,
    pub closure: Environment,
}

impl Function {
    pub fn new(literal: Rc<FunctionLiteral>, closure: Environment) -> Self {
        Self { literal, closure }
    }

    pub fn name(&self) -> Option<&str> {
        self.literal.name.as_deref()
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.literal, &other.literal) && self.closure.ptr_eq(&other.closure)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "<fn {}>", name),
            None => write!(f, "<fn>"),
        }
    }
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Integer(_) => "int",
            Value::Float(_) => "float",
            Value::Boolean(_) => "bool",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
            Value::Function(_) => "function",
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }
}

impl TryFrom<&Value> for Key {
    type Error = RuntimeError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::Integer(i) => Ok(Key::Integer(*i)),
            Value::Float(x) => Ok(Key::Float(OrderedFloat(*x))),
            Value::Boolean(b) => Ok(Key::Boolean(*b)),
            Value::String(s) => Ok(Key::String(s.clone())),
            other => Err(RuntimeError::type_error(format!(
                "A value of type {} cannot be used as a map key",
                other.type_name()
            ))),
        }
    }
}

impl From<Key> for Value {
    fn from(key: Key) -> Self {
        match key {
            Key::Integer(i) => Value::Integer(i),
            Key::Float(x) => Value::Float(x.into_inner()),
            Key::Boolean(b) => Value::Boolean(b),
            Key::String(s) => Value::String(s),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Integer(i) => write!(f, "{}", i),
            Key::Float(x) => write!(f, "{}", x.into_inner()),
            Key::Boolean(b) => write!(f, "{}", b),
            Key::String(s) => write!(f, "{}", s),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::String(s) => write!(f, "{}", s),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Map(entries) => {
                write!(f, "{{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                write!(f, "}}")
            }
            Value::Function(function) => write!(f, "{}", function),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_scalars() {
        assert_eq!(Value::Integer(-3).to_string(), "-3");
        assert_eq!(Value::Float(1.5).to_string(), "1.5");
        assert_eq!(Value::Float(3.0).to_string(), "3");
        assert_eq!(Value::Boolean(true).to_string(), "true");
        assert_eq!(Value::Nil.to_string(), "nil");
    }

    #[test]
    fn display_collections() {
        let array = Value::Array(vec![Value::Integer(1), Value::String("a".to_string())]);
        assert_eq!(array.to_string(), "[1, a]");

        let mut entries = BTreeMap::new();
        entries.insert(Key::String("b".to_string()), Value::Integer(2));
        entries.insert(Key::String("a".to_string()), Value::Integer(1));
        assert_eq!(Value::Map(entries).to_string(), "{a: 1, b: 2}");
    }

    #[test]
    fn keys_keep_their_variant() {
        let int = Key::try_from(&Value::Integer(1)).unwrap();
        let float = Key::try_from(&Value::Float(1.0)).unwrap();
        assert_ne!(int, float);
        assert_eq!(Value::from(float), Value::Float(1.0));
    }

    #[test]
    fn containers_are_not_keys() {
        assert!(Key::try_from(&Value::Array(vec![])).is_err());
        assert!(Key::try_from(&Value::Nil).is_err());
    }
}
