//! Lexical environments
//!
//! Environments form a parent-linked chain: one per function call frame plus
//! one per entered block. Variable resolution walks outward from the
//! innermost scope; the debugger walks the same chain read-only when
//! collecting variables.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::value::{RuntimeError, Value};

/// Shared handle to an environment
pub type EnvRef = Rc<RefCell<Environment>>;

/// A single lexical scope with an optional enclosing scope
#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    parent: Option<EnvRef>,
}

impl Environment {
    /// Create a root environment with no parent
    pub fn root() -> EnvRef {
        Rc::new(RefCell::new(Environment::default()))
    }

    /// Create a child environment enclosed by `parent`
    pub fn child_of(parent: &EnvRef) -> EnvRef {
        Rc::new(RefCell::new(Environment {
            values: HashMap::new(),
            parent: Some(Rc::clone(parent)),
        }))
    }

    /// Define a variable in this scope, shadowing any outer binding
    pub fn define(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    /// The enclosing environment, if any
    pub fn enclosing(&self) -> Option<EnvRef> {
        self.parent.clone()
    }

    /// Enumerate this scope's own bindings, sorted by name
    pub fn own_bindings(&self) -> Vec<(String, Value)> {
        let mut bindings: Vec<(String, Value)> = self
            .values
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        bindings.sort_by(|a, b| a.0.cmp(&b.0));
        bindings
    }
}

/// Look up a variable along the environment chain
pub fn lookup(env: &EnvRef, name: &str) -> Result<Value, RuntimeError> {
    let mut current = Rc::clone(env);
    loop {
        if let Some(value) = current.borrow().values.get(name) {
            return Ok(value.clone());
        }
        let parent = current.borrow().parent.clone();
        match parent {
            Some(p) => current = p,
            None => return Err(RuntimeError::UndefinedVariable(name.to_string())),
        }
    }
}

/// Assign to an existing variable along the environment chain
pub fn assign(env: &EnvRef, name: &str, value: Value) -> Result<(), RuntimeError> {
    let mut current = Rc::clone(env);
    loop {
        if current.borrow().values.contains_key(name) {
            current.borrow_mut().values.insert(name.to_string(), value);
            return Ok(());
        }
        let parent = current.borrow().parent.clone();
        match parent {
            Some(p) => current = p,
            None => return Err(RuntimeError::UndefinedVariable(name.to_string())),
        }
    }
}
