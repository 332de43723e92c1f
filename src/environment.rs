use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::prelude::*;

pub type ScopeRef = Shared<Scope>;

/// A lexical environment with the control-flow signals of the construct it belongs to.
#[derive(Default)]
pub struct Scope {
    name: Option<String>,
    pub parent: Option<ScopeRef>,
    symbols: HashMap<String, Symbol>,
    pub returned: Option<Shared<Variable>>,
    pub break_requested: bool,
    pub continue_requested: bool,
}

impl Scope {
    pub fn new(parent: Option<ScopeRef>) -> Self {
        Self { parent, ..Default::default() }
    }

    /// Class and module scopes are named; their names qualify the types declared inside.
    pub fn named(name: impl Into<String>, parent: Option<ScopeRef>) -> Self {
        Self { name: Some(name.into()), parent, ..Default::default() }
    }

    pub fn as_shared(self) -> ScopeRef {
        Rc::new(RefCell::new(self))
    }

    pub fn define(&mut self, name: &str, symbol: Symbol) {
        self.symbols.insert(name.to_owned(), symbol);
    }

    pub fn contains_local(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }

    pub fn get_local(&self, name: &str) -> Option<Symbol> {
        self.symbols.get(name).cloned()
    }

    /// Looks `name` up here, then through the parent chain.
    pub fn lookup(&self, name: &str) -> Option<Symbol> {
        if let Some(symbol) = self.symbols.get(name) {
            return Some(symbol.clone());
        }

        // Ask one level above if possible
        self.parent.as_ref().and_then(|parent| parent.borrow().lookup(name))
    }

    /// Names of the enclosing named scopes, outermost first. Stops at the
    /// first anonymous scope.
    pub fn named_chain(&self) -> Vec<String> {
        let Some(name) = &self.name else { return vec![] };

        let mut chain = match &self.parent {
            Some(parent) => parent.borrow().named_chain(),
            None => vec![],
        };
        chain.push(name.clone());
        chain
    }

    pub fn has_signal(&self) -> bool {
        self.returned.is_some() || self.break_requested || self.continue_requested
    }

    /// Hands all three signals to `parent`.
    pub fn propagate_signals(&mut self, parent: &mut Scope) {
        parent.returned = self.returned.take();
        parent.break_requested = self.break_requested;
        parent.continue_requested = self.continue_requested;
    }

    /// Drops every symbol. Breaks the class/scope reference cycles rooted here.
    pub fn clear(&mut self) {
        self.symbols.clear();
        self.returned = None;
    }
}

impl std::fmt::Debug for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&String> = self.symbols.keys().collect();
        names.sort();
        f.debug_struct("Scope").field("name", &self.name).field("symbols", &names).finish()
    }
}
