use std::{cell::RefCell, collections::HashMap, rc::Rc};

use super::value::Value;
use crate::error::ErrorKind;

/// One scope frame. Frames are shared through `Rc<RefCell<_>>` because a
/// closure keeps its defining frame alive after the block that created it
/// has finished.
#[derive(Debug, Default)]
pub struct Environment {
    entries: HashMap<String, Value>,
    enclosing: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_enclosing(enclosing: Rc<RefCell<Environment>>) -> Self {
        Self {
            entries: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    pub fn into_shared(self) -> Rc<RefCell<Environment>> {
        Rc::new(RefCell::new(self))
    }

    /// Binds `name` in this frame only, shadowing any outer binding.
    pub fn define(&mut self, name: &str, value: Value) {
        let _ = self.entries.insert(name.to_owned(), value);
    }

    pub fn get(&self, name: &str) -> Result<Value, ErrorKind> {
        if let Some(value) = self.entries.get(name) {
            return Ok(value.clone());
        }

        let mut next = self.enclosing.clone();
        while let Some(env) = next {
            let frame = env.borrow();
            if let Some(value) = frame.entries.get(name) {
                return Ok(value.clone());
            }
            next = frame.enclosing.clone();
        }
        Err(ErrorKind::UndefinedVariable(name.to_owned()))
    }

    /// Overwrites the nearest existing binding of `name`. Never creates one.
    pub fn assign(&mut self, name: &str, value: Value) -> Result<(), ErrorKind> {
        if let Some(slot) = self.entries.get_mut(name) {
            *slot = value;
            return Ok(());
        }

        let mut next = self.enclosing.clone();
        while let Some(env) = next {
            let mut frame = env.borrow_mut();
            if let Some(slot) = frame.entries.get_mut(name) {
                *slot = value;
                return Ok(());
            }
            next = frame.enclosing.clone();
        }
        Err(ErrorKind::UndefinedVariable(name.to_owned()))
    }

    #[cfg(test)]
    pub fn contains_key(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }
}

impl Drop for Environment {
    // Unlinks the chain one frame at a time so a long chain is not dropped
    // recursively.
    fn drop(&mut self) {
        let mut next = self.enclosing.take();
        while let Some(env) = next {
            next = match Rc::try_unwrap(env) {
                Ok(frame) => frame.into_inner().enclosing.take(),
                Err(_) => None,
            };
        }
    }
}
