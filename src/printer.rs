//! Recursive AST dumper backing `Container::tostring()`.
//!
//! The spec lists the pretty-printer as an external collaborator
//! (`print_ast_node`); SPEC_FULL still ships a working implementation so
//! `tostring()` is not a stub, styled as a line-per-node indented dump
//! rather than a literal port (the original's printer was not part of the
//! retrieval pack's kept excerpt).

use crate::ast::node::{BinOp, Expr, LiteralValue, Stat, Suffix, TableKey, UnOp};
use crate::ast::ravi_type::{RaviTag, RaviType};
use crate::ast::symbol::{FunctionId, Symbol, SymbolId};
use crate::ast::Ast;
use crate::intern::Interner;
use std::fmt::Write as _;

pub struct Printer<'a> {
    ast: &'a Ast,
    interner: &'a Interner,
    out: String,
}

pub fn print_chunk(ast: &Ast, interner: &Interner, root: FunctionId) -> String {
    let mut p = Printer {
        ast,
        interner,
        out: String::new(),
    };
    p.function(root, 0);
    p.out
}

impl<'a> Printer<'a> {
    fn indent(&mut self, depth: usize) {
        for _ in 0..depth {
            self.out.push_str("  ");
        }
    }

    fn line(&mut self, depth: usize, text: impl AsRef<str>) {
        self.indent(depth);
        self.out.push_str(text.as_ref());
        self.out.push('\n');
    }

    fn function(&mut self, function: FunctionId, depth: usize) {
        let f = self.ast.functions.get(function).clone();
        self.line(
            depth,
            format!(
                "function(vararg={}, method={}, params={})",
                f.is_vararg,
                f.is_method,
                f.params.len()
            ),
        );
        for &stat in &f.body {
            self.stat(stat, depth + 1);
        }
    }

    fn stat(&mut self, id: crate::ast::node::StatId, depth: usize) {
        let stat = self.ast.stats.get(id).clone();
        match stat {
            Stat::Local { symbols, exprs } => {
                self.line(depth, format!("local {}", self.symbol_names(&symbols)));
                for e in exprs {
                    self.expr(e, depth + 1);
                }
            }
            Stat::ExprStat { lhs, rhs } => {
                if lhs.is_empty() {
                    self.line(depth, "exprstat (call)");
                } else {
                    self.line(depth, "exprstat (assign)");
                    for e in &lhs {
                        self.expr(*e, depth + 1);
                    }
                    self.line(depth + 1, "=");
                }
                for e in rhs {
                    self.expr(e, depth + 1);
                }
            }
            Stat::If {
                arms,
                else_scope: _,
                else_body,
            } => {
                self.line(depth, "if");
                for arm in arms {
                    self.line(depth + 1, "test-then");
                    self.expr(arm.cond, depth + 2);
                    for s in arm.body {
                        self.stat(s, depth + 2);
                    }
                }
                if let Some(body) = else_body {
                    self.line(depth + 1, "else");
                    for s in body {
                        self.stat(s, depth + 2);
                    }
                }
            }
            Stat::While { cond, body, .. } => {
                self.line(depth, "while");
                self.expr(cond, depth + 1);
                for s in body {
                    self.stat(s, depth + 1);
                }
            }
            Stat::Repeat { cond, body, .. } => {
                self.line(depth, "repeat");
                for s in body {
                    self.stat(s, depth + 1);
                }
                self.line(depth + 1, "until");
                self.expr(cond, depth + 2);
            }
            Stat::ForNum { symbol, init, body, .. } => {
                self.line(depth, format!("fornum {}", self.symbol_names(&[symbol])));
                for e in init {
                    self.expr(e, depth + 1);
                }
                for s in body {
                    self.stat(s, depth + 1);
                }
            }
            Stat::ForIn {
                symbols, exprs, body, ..
            } => {
                self.line(depth, format!("forin {}", self.symbol_names(&symbols)));
                for e in exprs {
                    self.expr(e, depth + 1);
                }
                for s in body {
                    self.stat(s, depth + 1);
                }
            }
            Stat::Do { body, .. } => {
                self.line(depth, "do");
                for s in body {
                    self.stat(s, depth + 1);
                }
            }
            Stat::FunctionStmt {
                name,
                selectors,
                method,
                function,
            } => {
                let mut header = String::from("functionstmt ");
                self.expr_inline(name, &mut header);
                for s in &selectors {
                    let _ = write!(header, ".{}", self.interner.resolve(*s));
                }
                if let Some(m) = method {
                    let _ = write!(header, ":{}", self.interner.resolve(m));
                }
                self.line(depth, header);
                self.function(function, depth + 1);
            }
            Stat::Return { exprs } => {
                self.line(depth, "return");
                for e in exprs {
                    self.expr(e, depth + 1);
                }
            }
            Stat::Label { symbol } => {
                self.line(depth, format!("label {}", self.interner.resolve(self.ast.symbols.get(symbol).name())));
            }
            Stat::Goto { name, target } => {
                self.line(
                    depth,
                    format!(
                        "goto {} (resolved={})",
                        self.interner.resolve(name),
                        target.is_some()
                    ),
                );
            }
            Stat::Break { .. } => self.line(depth, "break"),
        }
    }

    fn expr(&mut self, id: crate::ast::node::ExprId, depth: usize) {
        let mut s = String::new();
        self.expr_inline(id, &mut s);
        self.line(depth, s);
    }

    fn expr_inline(&mut self, id: crate::ast::node::ExprId, out: &mut String) {
        match self.ast.exprs.get(id).clone() {
            Expr::Literal { value, .. } => {
                let _ = write!(out, "{}", self.literal(&value));
            }
            Expr::SymbolRef { symbol } => {
                let _ = write!(out, "{}", self.symbol_label(symbol));
            }
            Expr::Unary { op, expr } => {
                let _ = write!(out, "({}", unop_str(op));
                self.expr_inline(expr, out);
                out.push(')');
            }
            Expr::ToType { target, expr } => {
                let _ = write!(out, "(@{} ", self.ravi_type_str(&target));
                self.expr_inline(expr, out);
                out.push(')');
            }
            Expr::Binary { op, left, right } => {
                out.push('(');
                self.expr_inline(left, out);
                let _ = write!(out, " {} ", binop_str(op));
                self.expr_inline(right, out);
                out.push(')');
            }
            Expr::Suffixed { primary, suffixes } => {
                self.expr_inline(primary, out);
                for suffix in suffixes {
                    match suffix {
                        Suffix::Field(name) => {
                            let _ = write!(out, ".{}", self.interner.resolve(name));
                        }
                        Suffix::Index(e) => {
                            out.push('[');
                            self.expr_inline(e, out);
                            out.push(']');
                        }
                        Suffix::Call { method, args } => {
                            if let Some(m) = method {
                                let _ = write!(out, ":{}", self.interner.resolve(m));
                            }
                            out.push('(');
                            for (i, a) in args.iter().enumerate() {
                                if i > 0 {
                                    out.push_str(", ");
                                }
                                self.expr_inline(*a, out);
                            }
                            out.push(')');
                        }
                    }
                }
            }
            Expr::TableConstructor { fields } => {
                out.push('{');
                for (i, f) in fields.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    match &f.key {
                        Some(TableKey::Field(name)) => {
                            let _ = write!(out, "{}=", self.interner.resolve(*name));
                        }
                        Some(TableKey::Index(e)) => {
                            out.push('[');
                            self.expr_inline(*e, out);
                            out.push_str("]=");
                        }
                        None => {}
                    }
                    self.expr_inline(f.value, out);
                }
                out.push('}');
            }
            Expr::FunctionExpr { .. } => out.push_str("<function>"),
            Expr::Vararg => out.push_str("..."),
        }
    }

    fn literal(&self, value: &LiteralValue) -> String {
        match value {
            LiteralValue::Nil => "nil".to_string(),
            LiteralValue::True => "true".to_string(),
            LiteralValue::False => "false".to_string(),
            LiteralValue::Int(v) => v.to_string(),
            LiteralValue::Float(v) => v.to_string(),
            LiteralValue::Str(name) => format!("{:?}", self.interner.resolve(*name)),
        }
    }

    fn symbol_label(&self, symbol: SymbolId) -> String {
        match self.ast.symbols.get(symbol) {
            Symbol::Local { name, .. } => format!("local:{}", self.interner.resolve(*name)),
            Symbol::Upvalue { name, .. } => format!("upvalue:{}", self.interner.resolve(*name)),
            Symbol::Global { name } => format!("global:{}", self.interner.resolve(*name)),
            Symbol::Label { name, .. } => format!("label:{}", self.interner.resolve(*name)),
        }
    }

    fn symbol_names(&self, symbols: &[SymbolId]) -> String {
        symbols
            .iter()
            .map(|&s| self.symbol_label(s))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn ravi_type_str(&self, ty: &RaviType) -> String {
        match ty.tag {
            RaviTag::Userdata => ty
                .user_type
                .map(|n| self.interner.resolve(n).to_string())
                .unwrap_or_else(|| "userdata".to_string()),
            other => format!("{other:?}"),
        }
    }
}

fn unop_str(op: UnOp) -> &'static str {
    match op {
        UnOp::Neg => "-",
        UnOp::Not => "not ",
        UnOp::Len => "#",
        UnOp::BNot => "~",
    }
}

fn binop_str(op: BinOp) -> &'static str {
    match op {
        BinOp::Add => "+",
        BinOp::Sub => "-",
        BinOp::Mul => "*",
        BinOp::Mod => "%",
        BinOp::Pow => "^",
        BinOp::Div => "/",
        BinOp::IDiv => "//",
        BinOp::BAnd => "&",
        BinOp::BOr => "|",
        BinOp::BXor => "~",
        BinOp::Shl => "<<",
        BinOp::Shr => ">>",
        BinOp::Concat => "..",
        BinOp::Eq => "==",
        BinOp::Lt => "<",
        BinOp::Le => "<=",
        BinOp::Ne => "~=",
        BinOp::Gt => ">",
        BinOp::Ge => ">=",
        BinOp::And => "and",
        BinOp::Or => "or",
    }
}
