use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::ast::FunctionLiteral;
use crate::object::{Function, Value};

#[derive(Debug, Default)]
struct Scope {
    variables: HashMap<String, Value>,
    // Only the literal is stored; the closure is the scope it is found in,
    // which keeps a scope from holding a strong reference to itself.
    functions: HashMap<String, Rc<FunctionLiteral>>,
    outer: Option<Environment>,
}

/// Shared handle to one scope of the chain. Cloning the handle does not copy
/// the scope; a function value keeps its defining scope alive through it.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    inner: Rc<RefCell<Scope>>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_child(&self) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Scope {
                outer: Some(self.clone()),
                ..Scope::default()
            })),
        }
    }

    pub fn ptr_eq(&self, other: &Environment) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn get_variable(&self, name: &str) -> Option<Value> {
        let scope = self.inner.borrow();
        match scope.variables.get(name) {
            Some(value) => Some(value.clone()),
            None => scope.outer.as_ref()?.get_variable(name),
        }
    }

    pub fn get_function(&self, name: &str) -> Option<Function> {
        let scope = self.inner.borrow();
        match scope.functions.get(name) {
            Some(literal) => Some(Function::new(Rc::clone(literal), self.clone())),
            None => scope.outer.as_ref()?.get_function(name),
        }
    }

    /// Binds `name` in this scope, shadowing any outer binding.
    pub fn define_variable(&self, name: &str, value: Value) {
        self.inner
            .borrow_mut()
            .variables
            .insert(name.to_string(), value);
    }

    /// Rebinds `name` in the nearest scope that already holds it, or defines
    /// it here when no scope does.
    pub fn assign_variable(&self, name: &str, value: Value) {
        let owner = self.owner_of(name).unwrap_or_else(|| self.clone());
        owner.define_variable(name, value);
    }

    pub fn define_function(&self, name: &str, literal: Rc<FunctionLiteral>) {
        self.inner
            .borrow_mut()
            .functions
            .insert(name.to_string(), literal);
    }

    /// Runs `f` on the visible binding of `name` in place.
    pub fn with_variable_mut<T>(
        &self,
        name: &str,
        f: impl FnOnce(&mut Value) -> T,
    ) -> Option<T> {
        let mut scope = self.inner.borrow_mut();
        if let Some(value) = scope.variables.get_mut(name) {
            return Some(f(value));
        }
        let outer = scope.outer.clone();
        drop(scope);
        outer?.with_variable_mut(name, f)
    }

    fn owner_of(&self, name: &str) -> Option<Environment> {
        let scope = self.inner.borrow();
        if scope.variables.contains_key(name) {
            return Some(self.clone());
        }
        scope.outer.as_ref()?.owner_of(name)
    }
}
