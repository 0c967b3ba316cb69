//! Identifier resolution (spec §4.3's core algorithm).
//!
//! Grounded on `ravi_ast_parse.c`'s `search_for_variable`,
//! `add_upvalue_in_function`, and `add_upvalue_in_levels_upto`: a local
//! found in an ancestor function is lifted into an upvalue of every
//! strictly-intermediate function on the way back to the reference site,
//! with early-stop once a function on the chain already owns the upvalue.

use super::Parser;
use crate::ast::ravi_type::RaviType;
use crate::ast::symbol::{FunctionId, ScopeId, Symbol, SymbolId};
use crate::intern::Name;

impl<'s> Parser<'s> {
    pub(crate) fn new_local(&mut self, name: Name, ravi_type: RaviType) -> SymbolId {
        let scope = self.current_scope.expect("local outside scope");
        let function = self.current_function.expect("local outside function");
        let symbol = self.ast.symbols.alloc(Symbol::Local {
            name,
            ravi_type,
            scope,
        });
        self.ast.scopes.get_mut(scope).symbols.push(symbol);
        self.ast.functions.get_mut(function).locals.push(symbol);
        symbol
    }

    pub(crate) fn new_label(&mut self, name: Name) -> SymbolId {
        let scope = self.current_scope.expect("label outside scope");
        let function = self.current_function.expect("label outside function");
        let symbol = self.ast.symbols.alloc(Symbol::Label { name, scope });
        self.ast.scopes.get_mut(scope).symbols.push(symbol);
        self.ast.functions.get_mut(function).labels.push(symbol);
        symbol
    }

    fn new_global(&mut self, name: Name) -> SymbolId {
        // Never inserted into any scope, and never memoised: each
        // occurrence allocates a fresh GLOBAL symbol (spec §3, §4.3 step 7).
        self.ast.symbols.alloc(Symbol::Global { name })
    }

    /// The 7-step resolution algorithm. Called for every bare-name
    /// primary expression.
    pub(crate) fn resolve_identifier(&mut self, name: Name) -> SymbolId {
        let start_function = self
            .current_function
            .expect("identifier reference outside function");

        let mut function = start_function;
        let mut scope = self.current_scope;
        let mut chain: Vec<FunctionId> = Vec::new();

        loop {
            chain.push(function);

            let (local_found, boundary) = self.search_scope_chain(function, scope, name);
            if let Some(sym) = local_found {
                if function == start_function {
                    return sym;
                }
                return self.backfill_upvalues(&chain, name, sym);
            }

            if let Some(sym) = self.ast.functions.get(function).find_upvalue(name, &self.ast.symbols) {
                if function == start_function {
                    return sym;
                }
                return self.backfill_upvalues(&chain, name, sym);
            }

            match self.ast.functions.get(function).parent_function {
                Some(parent) => {
                    function = parent;
                    scope = boundary;
                }
                None => break,
            }
        }

        self.new_global(name)
    }

    /// Steps 1-2: reverse-order search within `function`'s own scopes,
    /// stopping at the first scope belonging to a different function. That
    /// scope (if any) is returned as the continuation point for the
    /// caller's ascent into the parent function.
    fn search_scope_chain(
        &self,
        function: FunctionId,
        scope: Option<ScopeId>,
        name: Name,
    ) -> (Option<SymbolId>, Option<ScopeId>) {
        let mut cursor = scope;
        while let Some(sid) = cursor {
            let sc = self.ast.scopes.get(sid);
            if sc.function != function {
                return (None, Some(sid));
            }
            if let Some(sym) = sc.find(name, &self.ast.symbols) {
                if matches!(self.ast.symbols.get(sym), Symbol::Local { .. }) {
                    return (Some(sym), None);
                }
            }
            cursor = sc.parent;
        }
        (None, None)
    }

    /// Steps 5-6: `found` is the symbol discovered in `chain`'s last
    /// (outermost) function — either the ancestor LOCAL itself, or an
    /// UPVALUE of that ancestor already capturing the root local. Installs
    /// a direct-capturing upvalue in every function strictly between the
    /// reference site and that ancestor.
    fn backfill_upvalues(&mut self, chain: &[FunctionId], name: Name, found: SymbolId) -> SymbolId {
        let (captured_local, root_type) = match self.ast.symbols.get(found) {
            Symbol::Local { ravi_type, .. } => (found, *ravi_type),
            Symbol::Upvalue {
                captured_local,
                ravi_type,
                ..
            } => (*captured_local, *ravi_type),
            _ => unreachable!("backfill target must be a local or upvalue"),
        };

        let mut result = None;
        for (i, &f) in chain[..chain.len() - 1].iter().enumerate() {
            if let Some(existing) = self.ast.functions.get(f).find_upvalue(name, &self.ast.symbols) {
                if i == 0 {
                    result = Some(existing);
                }
                break;
            }
            let upvalue = self.ast.symbols.alloc(Symbol::Upvalue {
                name,
                owner_function: f,
                captured_local,
                ravi_type: root_type,
            });
            self.ast.functions.get_mut(f).upvalues.push(upvalue);
            if i == 0 {
                result = Some(upvalue);
            }
        }
        result.expect("chain has at least the reference-site function")
    }
}
