// ABOUTME: Context — an activation record carrying the call-stack trace and local symbol table

use crate::env::SymbolTable;
use crate::position::Position;
use std::rc::Rc;

/// One activation record. The global context has no parent. A call's
/// `Context` links to its caller for tracebacks via `parent`/`parent_entry_pos`,
/// and owns a freshly-parented `SymbolTable` for the call's local bindings.
#[derive(Debug)]
pub struct Context {
    pub display_name: String,
    pub parent: Option<Rc<Context>>,
    pub parent_entry_pos: Option<Position>,
    pub symbol_table: Rc<SymbolTable>,
}

impl Context {
    pub fn new(
        display_name: impl Into<String>,
        parent: Option<Rc<Context>>,
        parent_entry_pos: Option<Position>,
        symbol_table: Rc<SymbolTable>,
    ) -> Rc<Self> {
        Rc::new(Context {
            display_name: display_name.into(),
            parent,
            parent_entry_pos,
            symbol_table,
        })
    }

    pub fn global(symbol_table: Rc<SymbolTable>) -> Rc<Self> {
        Context::new("<program>", None, None, symbol_table)
    }

    /// Walks the parent chain to the context with no parent.
    pub fn root(self: &Rc<Self>) -> Rc<Self> {
        let mut current = self.clone();
        while let Some(parent) = current.parent.clone() {
            current = parent;
        }
        current
    }
}
