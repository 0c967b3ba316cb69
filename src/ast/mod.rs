pub mod node;
pub mod ravi_type;
pub mod symbol;

use crate::arena::Arena;
use node::{Expr, Stat};
use symbol::{Function, Scope, Symbol};

/// The arenas the container owns, per spec §4.1 (expressions and
/// statements each get their own arena; see DESIGN.md).
#[derive(Default)]
pub struct Ast {
    pub exprs: Arena<Expr>,
    pub stats: Arena<Stat>,
    pub scopes: Arena<Scope>,
    pub symbols: Arena<Symbol>,
    pub functions: Arena<Function>,
}

impl Ast {
    pub fn new() -> Self {
        Ast::default()
    }

    /// Bulk release: drops every arena's contents at once (spec §4.1).
    pub fn clear(&mut self) {
        self.exprs.clear();
        self.stats.clear();
        self.scopes.clear();
        self.symbols.clear();
        self.functions.clear();
    }
}
