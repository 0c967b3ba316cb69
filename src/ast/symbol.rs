//! Symbol, scope, and function records (spec §3).

use crate::arena::Id;
use crate::ast::ravi_type::RaviType;
use crate::intern::Name;

pub type SymbolId = Id<Symbol>;
pub type ScopeId = Id<Scope>;
pub type FunctionId = Id<Function>;

#[derive(Debug, Clone)]
pub enum Symbol {
    Local {
        name: Name,
        ravi_type: RaviType,
        scope: ScopeId,
    },
    /// References the captured local directly, even when reached through
    /// a chain of intermediate upvalues (invariant 2): every upvalue on
    /// the chain names the same ancestor local.
    Upvalue {
        name: Name,
        owner_function: FunctionId,
        captured_local: SymbolId,
        ravi_type: RaviType,
    },
    Global {
        name: Name,
    },
    Label {
        name: Name,
        scope: ScopeId,
    },
}

impl Symbol {
    pub fn name(&self) -> Name {
        match *self {
            Symbol::Local { name, .. } => name,
            Symbol::Upvalue { name, .. } => name,
            Symbol::Global { name, .. } => name,
            Symbol::Label { name, .. } => name,
        }
    }
}

/// Ordered list of symbols declared in this scope, owning function, and a
/// parent link. Scopes form a single chain across function boundaries —
/// a function's `main_block`'s parent is its enclosing function's current
/// scope at the point of function creation.
#[derive(Debug, Clone)]
pub struct Scope {
    pub symbols: Vec<SymbolId>,
    pub function: FunctionId,
    pub parent: Option<ScopeId>,
}

impl Scope {
    /// Reverse-order search: Lua permits redeclaring a local within one
    /// scope, so the newest entry with a matching name wins.
    pub fn find(&self, name: Name, symbols: &crate::arena::Arena<Symbol>) -> Option<SymbolId> {
        self.symbols
            .iter()
            .rev()
            .copied()
            .find(|&id| symbols.get(id).name() == name)
    }
}

#[derive(Debug, Clone)]
pub struct Function {
    pub is_method: bool,
    pub is_vararg: bool,
    pub params: Vec<SymbolId>,
    pub upvalues: Vec<SymbolId>,
    /// Every local ever declared in this function, not only currently-live
    /// ones (invariant 3: superset of any scope's symbol list).
    pub locals: Vec<SymbolId>,
    pub main_block: Option<ScopeId>,
    pub parent_function: Option<FunctionId>,
    pub children: Vec<FunctionId>,
    pub body: Vec<crate::ast::node::StatId>,
    /// `LABEL` symbols declared anywhere in this function, for the
    /// post-parse goto/label resolution pass.
    pub labels: Vec<SymbolId>,
}

impl Function {
    pub fn new(parent_function: Option<FunctionId>, is_vararg: bool) -> Self {
        Function {
            is_method: false,
            is_vararg,
            params: Vec::new(),
            upvalues: Vec::new(),
            locals: Vec::new(),
            main_block: None,
            parent_function,
            children: Vec::new(),
            body: Vec::new(),
            labels: Vec::new(),
        }
    }

    pub fn find_upvalue(&self, name: Name, symbols: &crate::arena::Arena<Symbol>) -> Option<SymbolId> {
        self.upvalues
            .iter()
            .copied()
            .find(|&id| symbols.get(id).name() == name)
    }
}
