// ABOUTME: SymbolTable — a chained name-to-value mapping forming the scope tree

use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// A scope's variable bindings, with an optional parent for lexical lookup.
/// Symbol tables form a tree; lookup walks parent links, but `set` always
/// writes to the table it was invoked on.
#[derive(Debug)]
pub struct SymbolTable {
    bindings: RefCell<HashMap<String, Value>>,
    parent: Option<Rc<SymbolTable>>,
}

impl SymbolTable {
    pub fn new() -> Rc<Self> {
        Rc::new(SymbolTable {
            bindings: RefCell::new(HashMap::new()),
            parent: None,
        })
    }

    pub fn with_parent(parent: Rc<SymbolTable>) -> Rc<Self> {
        Rc::new(SymbolTable {
            bindings: RefCell::new(HashMap::new()),
            parent: Some(parent),
        })
    }

    /// Local lookup first, then delegate up the parent chain.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.bindings.borrow().get(name) {
            return Some(value.clone());
        }
        self.parent.as_ref().and_then(|p| p.get(name))
    }

    /// Binds `name` in THIS table, overwriting any prior local binding.
    pub fn set(&self, name: impl Into<String>, value: Value) {
        self.bindings.borrow_mut().insert(name.into(), value);
    }

    /// Removes `name` from THIS table only; parent bindings are untouched.
    pub fn remove(&self, name: &str) {
        self.bindings.borrow_mut().remove(name);
    }
}
