//! Goto/label resolution pass (SPEC_FULL §3b).
//!
//! Runs once per function, right after that function's body is fully
//! parsed (`end_function`), matching unresolved `GOTO` nodes against
//! `LABEL` symbols declared anywhere in the function by name. Grounded on
//! the original's own unresolved comment ("Resolve labels in the end?")
//! and the Open Question it leaves behind: forward references are
//! permitted, and an unmatched goto is left unresolved rather than
//! treated as an error.

use crate::ast::node::Stat;
use crate::ast::symbol::{FunctionId, Symbol};
use crate::ast::Ast;
use crate::intern::Name;
use ahash::RandomState;
use std::collections::HashMap;

fn collect_stat_ids(ast: &Ast, ids: &[crate::ast::node::StatId], out: &mut Vec<crate::ast::node::StatId>) {
    for &id in ids {
        out.push(id);
        match ast.stats.get(id) {
            Stat::If { arms, else_body, .. } => {
                for arm in arms {
                    collect_stat_ids(ast, &arm.body, out);
                }
                if let Some(body) = else_body {
                    collect_stat_ids(ast, body, out);
                }
            }
            Stat::While { body, .. }
            | Stat::Repeat { body, .. }
            | Stat::Do { body, .. }
            | Stat::ForNum { body, .. }
            | Stat::ForIn { body, .. } => collect_stat_ids(ast, body, out),
            _ => {}
        }
    }
}

pub fn resolve_function(ast: &mut Ast, function: FunctionId) {
    let label_ids = ast.functions.get(function).labels.clone();
    let mut by_name: HashMap<Name, crate::ast::symbol::SymbolId, RandomState> = HashMap::default();
    for sym in label_ids {
        if let Symbol::Label { name, .. } = ast.symbols.get(sym) {
            by_name.insert(*name, sym);
        }
    }
    if by_name.is_empty() {
        return;
    }

    let body = ast.functions.get(function).body.clone();
    let mut all = Vec::new();
    collect_stat_ids(ast, &body, &mut all);

    for id in all {
        let pending = match ast.stats.get(id) {
            Stat::Goto { name, target: None } => Some(*name),
            _ => None,
        };
        if let Some(name) = pending {
            if let Some(&target) = by_name.get(&name) {
                if let Stat::Goto { target: slot, .. } = ast.stats.get_mut(id) {
                    *slot = Some(target);
                }
            }
        }
    }
}
