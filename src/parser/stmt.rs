//! Statement dispatch (spec §4.3).
//!
//! Grounded on `ravi_ast_parse.c`'s `parse_statement`/`parse_statement_list`
//! control flow, including the "`return` must be last" rule and the
//! auto-injected `self` parameter for method declarations.

use super::{LoopFrame, Parser, MAX_LOCALS};
use crate::ast::node::{Expr, Stat, StatId, TestThenBlock};
use crate::ast::ravi_type::{RaviTag, RaviType};
use crate::error::SyntaxError;
use crate::token::TokenKind;

impl<'s> Parser<'s> {
    /// Parses a block's statement list; a `return` ends the list even if
    /// the source has more (non-`end`) tokens following it.
    pub(crate) fn parse_statement_list(&mut self) -> Result<Vec<StatId>, SyntaxError> {
        let mut body = Vec::new();
        while !self.block_follow(true) {
            if self.check(TokenKind::Return) {
                body.push(self.parse_return_statement()?);
                break;
            }
            if let Some(stat) = self.parse_statement()? {
                body.push(stat);
            }
        }
        Ok(body)
    }

    fn parse_statement(&mut self) -> Result<Option<StatId>, SyntaxError> {
        match self.current.kind {
            TokenKind::Semicolon => {
                self.advance()?;
                Ok(None)
            }
            TokenKind::If => self.parse_if_statement().map(Some),
            TokenKind::While => self.parse_while_statement().map(Some),
            TokenKind::Do => self.parse_do_statement().map(Some),
            TokenKind::For => self.parse_for_statement().map(Some),
            TokenKind::Repeat => self.parse_repeat_statement().map(Some),
            TokenKind::Function => self.parse_function_statement().map(Some),
            TokenKind::Local => self.parse_local_statement().map(Some),
            TokenKind::DColon => self.parse_label_statement().map(Some),
            TokenKind::Break => {
                let line = self.line();
                self.advance()?;
                let scope = self
                    .loop_stack
                    .last()
                    .map(|frame| frame.scope)
                    .ok_or_else(|| SyntaxError::break_outside_loop(line))?;
                Ok(Some(self.ast.stats.alloc(Stat::Break { scope })))
            }
            TokenKind::Goto => {
                self.advance()?;
                let name = self.expect_name()?;
                Ok(Some(self.ast.stats.alloc(Stat::Goto { name, target: None })))
            }
            _ => self.parse_expr_statement().map(Some),
        }
    }

    fn parse_label_statement(&mut self) -> Result<StatId, SyntaxError> {
        self.advance()?; // '::'
        let name = self.expect_name()?;
        self.checknext(TokenKind::DColon)?;
        let symbol = self.new_label(name);
        Ok(self.ast.stats.alloc(Stat::Label { symbol }))
    }

    fn parse_return_statement(&mut self) -> Result<StatId, SyntaxError> {
        self.advance()?; // 'return'
        let exprs = if self.block_follow(true) || self.check(TokenKind::Semicolon) {
            Vec::new()
        } else {
            self.parse_expr_list()?
        };
        self.testnext(TokenKind::Semicolon)?;
        Ok(self.ast.stats.alloc(Stat::Return { exprs }))
    }

    fn parse_expr_list(&mut self) -> Result<Vec<crate::ast::node::ExprId>, SyntaxError> {
        let mut exprs = vec![self.parse_expr()?];
        while self.testnext(TokenKind::Comma)? {
            exprs.push(self.parse_expr()?);
        }
        Ok(exprs)
    }

    fn with_scope<T>(&mut self, body: impl FnOnce(&mut Self) -> Result<T, SyntaxError>) -> Result<T, SyntaxError> {
        let enclosing = self.current_scope;
        self.new_scope();
        let result = body(self);
        self.end_scope(enclosing);
        result
    }

    fn parse_test_then_block(&mut self) -> Result<TestThenBlock, SyntaxError> {
        let cond = self.parse_expr()?;
        self.checknext(TokenKind::Then)?;
        let mut scope_out = None;
        let body = self.with_scope(|p| {
            scope_out = p.current_scope;
            p.parse_statement_list()
        })?;
        Ok(TestThenBlock {
            cond,
            scope: scope_out.expect("scope opened"),
            body,
        })
    }

    fn parse_if_statement(&mut self) -> Result<StatId, SyntaxError> {
        self.advance()?; // 'if'
        let mut arms = vec![self.parse_test_then_block()?];
        while self.check(TokenKind::ElseIf) {
            self.advance()?;
            arms.push(self.parse_test_then_block()?);
        }
        let (else_scope, else_body) = if self.testnext(TokenKind::Else)? {
            let mut scope_out = None;
            let body = self.with_scope(|p| {
                scope_out = p.current_scope;
                p.parse_statement_list()
            })?;
            (scope_out, Some(body))
        } else {
            (None, None)
        };
        self.checknext(TokenKind::End)?;
        Ok(self.ast.stats.alloc(Stat::If {
            arms,
            else_scope,
            else_body,
        }))
    }

    fn parse_while_statement(&mut self) -> Result<StatId, SyntaxError> {
        self.advance()?; // 'while'
        let cond = self.parse_expr()?;
        self.checknext(TokenKind::Do)?;
        let mut scope_out = None;
        let body = self.with_loop_scope(|p| {
            scope_out = p.current_scope;
            p.parse_statement_list()
        })?;
        self.checknext(TokenKind::End)?;
        Ok(self.ast.stats.alloc(Stat::While {
            cond,
            scope: scope_out.expect("scope opened"),
            body,
        }))
    }

    /// `repeat`'s condition is evaluated inside the loop scope, so the
    /// scope is closed only after the condition is parsed.
    fn parse_repeat_statement(&mut self) -> Result<StatId, SyntaxError> {
        self.advance()?; // 'repeat'
        let enclosing = self.current_scope;
        let scope = self.new_scope();
        self.loop_stack.push(LoopFrame { scope });
        let body = self.parse_statement_list()?;
        self.checknext(TokenKind::Until)?;
        let cond = self.parse_expr()?;
        self.loop_stack.pop();
        self.end_scope(enclosing);
        Ok(self.ast.stats.alloc(Stat::Repeat { cond, scope, body }))
    }

    fn with_loop_scope<T>(&mut self, body: impl FnOnce(&mut Self) -> Result<T, SyntaxError>) -> Result<T, SyntaxError> {
        let enclosing = self.current_scope;
        let scope = self.new_scope();
        self.loop_stack.push(LoopFrame { scope });
        let result = body(self);
        self.loop_stack.pop();
        self.end_scope(enclosing);
        result
    }

    fn parse_do_statement(&mut self) -> Result<StatId, SyntaxError> {
        self.advance()?; // 'do'
        let mut scope_out = None;
        let body = self.with_scope(|p| {
            scope_out = p.current_scope;
            p.parse_statement_list()
        })?;
        self.checknext(TokenKind::End)?;
        Ok(self.ast.stats.alloc(Stat::Do {
            scope: scope_out.expect("scope opened"),
            body,
        }))
    }

    fn parse_for_statement(&mut self) -> Result<StatId, SyntaxError> {
        self.advance()?; // 'for'
        let first_name = self.expect_name()?;
        if self.check(TokenKind::Assign) {
            self.advance()?;
            let mut init = vec![self.parse_expr()?];
            self.checknext(TokenKind::Comma)?;
            init.push(self.parse_expr()?);
            if self.testnext(TokenKind::Comma)? {
                init.push(self.parse_expr()?);
            }
            self.checknext(TokenKind::Do)?;
            let enclosing = self.current_scope;
            let scope = self.new_scope();
            let symbol = self.new_local(first_name, RaviType::any());
            self.loop_stack.push(LoopFrame { scope });
            let body = self.parse_statement_list()?;
            self.loop_stack.pop();
            self.end_scope(enclosing);
            self.checknext(TokenKind::End)?;
            Ok(self.ast.stats.alloc(Stat::ForNum {
                symbol,
                init,
                scope,
                body,
            }))
        } else {
            let mut names = vec![first_name];
            while self.testnext(TokenKind::Comma)? {
                names.push(self.expect_name()?);
            }
            self.checknext(TokenKind::In)?;
            let exprs = self.parse_expr_list()?;
            self.checknext(TokenKind::Do)?;
            let enclosing = self.current_scope;
            let scope = self.new_scope();
            let symbols = names
                .into_iter()
                .map(|n| self.new_local(n, RaviType::any()))
                .collect();
            self.loop_stack.push(LoopFrame { scope });
            let body = self.parse_statement_list()?;
            self.loop_stack.pop();
            self.end_scope(enclosing);
            self.checknext(TokenKind::End)?;
            Ok(self.ast.stats.alloc(Stat::ForIn {
                symbols,
                exprs,
                scope,
                body,
            }))
        }
    }

    /// `local name [: type] {, name [: type]} [= exprlist]`, or
    /// `local function NAME funcbody` (desugared to a `LOCAL` statement
    /// whose single RHS expression is the function, with the name bound
    /// before the body is parsed so the function can call itself).
    fn parse_local_statement(&mut self) -> Result<StatId, SyntaxError> {
        self.advance()?; // 'local'
        if self.testnext(TokenKind::Function)? {
            let name = self.expect_name()?;
            let symbol = self.new_local(name, RaviType::simple(RaviTag::Function));
            let function = self.parse_function_body(false)?;
            let func_expr = self.ast.exprs.alloc(Expr::FunctionExpr { function });
            return Ok(self.ast.stats.alloc(Stat::Local {
                symbols: vec![symbol],
                exprs: vec![func_expr],
            }));
        }

        let mut declared = Vec::new();
        loop {
            let name = self.expect_name()?;
            let ravi_type = if self.testnext(TokenKind::Colon)? {
                self.parse_typeref()?
            } else {
                RaviType::any()
            };
            declared.push((name, ravi_type));
            if !self.testnext(TokenKind::Comma)? {
                break;
            }
        }
        if declared.len() > MAX_LOCALS {
            return Err(SyntaxError::too_many_locals(self.line()));
        }
        let exprs = if self.testnext(TokenKind::Assign)? {
            self.parse_expr_list()?
        } else {
            Vec::new()
        };
        // Locals become visible only after the RHS is parsed, so
        // `local x = x` resolves the RHS `x` against the outer scope.
        let symbols = declared
            .into_iter()
            .map(|(name, ty)| self.new_local(name, ty))
            .collect();
        Ok(self.ast.stats.alloc(Stat::Local { symbols, exprs }))
    }

    /// `function a.b.c:m ...`: `name` resolves through the ordinary
    /// identifier-resolution algorithm (it may land on a GLOBAL even for
    /// a dotted name — see SPEC_FULL §3's preserved Open Question), and a
    /// trailing `:m` marks `is_method` and injects `self`.
    fn parse_function_statement(&mut self) -> Result<StatId, SyntaxError> {
        self.advance()?; // 'function'
        let first = self.expect_name()?;
        let symbol = self.resolve_identifier(first);
        let name = self.ast.exprs.alloc(Expr::SymbolRef { symbol });
        let mut selectors = Vec::new();
        while self.check(TokenKind::Dot) {
            self.advance()?;
            selectors.push(self.expect_name()?);
        }
        let method = if self.testnext(TokenKind::Colon)? {
            Some(self.expect_name()?)
        } else {
            None
        };
        let function = self.parse_function_body(method.is_some())?;
        Ok(self.ast.stats.alloc(Stat::FunctionStmt {
            name,
            selectors,
            method,
            function,
        }))
    }

    /// `funcbody ::= '(' parlist ')' block 'end'`; `is_method` injects a
    /// synthetic `self` as the first parameter before the declared ones.
    pub(crate) fn parse_function_body(&mut self, is_method: bool) -> Result<crate::ast::symbol::FunctionId, SyntaxError> {
        let enclosing_function = self.current_function;
        let enclosing_scope = self.current_scope;
        let function = self.new_function(false);
        self.new_scope();

        if is_method {
            let self_name = self.interner.intern("self");
            let self_sym = self.new_local(self_name, RaviType::any());
            self.ast.functions.get_mut(function).params.push(self_sym);
            self.ast.functions.get_mut(function).is_method = true;
        }

        let open_line = self.line();
        self.checknext(TokenKind::LParen)?;
        let mut is_vararg = false;
        if !self.check(TokenKind::RParen) {
            loop {
                if self.check(TokenKind::Dots) {
                    self.advance()?;
                    is_vararg = true;
                    break;
                } else if self.check(TokenKind::Name) {
                    let pname = self.expect_name()?;
                    let psym = self.new_local(pname, RaviType::any());
                    self.ast.functions.get_mut(function).params.push(psym);
                } else {
                    return Err(SyntaxError::bad_parameter_list(self.line()));
                }
                if !self.testnext(TokenKind::Comma)? {
                    break;
                }
            }
        }
        self.check_match(TokenKind::RParen, TokenKind::LParen, open_line)?;
        self.ast.functions.get_mut(function).is_vararg = is_vararg;

        let body = self.parse_statement_list()?;
        self.ast.functions.get_mut(function).body = body;
        self.checknext(TokenKind::End)?;
        self.end_function(enclosing_function, enclosing_scope);
        Ok(function)
    }

    /// Parses one or more comma-separated suffixed expressions; `=`
    /// switches the accumulated list to an assignment's LHS.
    fn parse_expr_statement(&mut self) -> Result<StatId, SyntaxError> {
        let line = self.line();
        let first = self.parse_suffixed_expr(line)?;
        let mut lhs = vec![first];
        while self.testnext(TokenKind::Comma)? {
            let l = self.line();
            lhs.push(self.parse_suffixed_expr(l)?);
        }
        if self.testnext(TokenKind::Assign)? {
            let rhs = self.parse_expr_list()?;
            Ok(self.ast.stats.alloc(Stat::ExprStat { lhs, rhs }))
        } else {
            // A bare call statement: the single parsed expression is the
            // whole statement. Semantic validation that it is in fact a
            // call is the type checker's job, not the parser's.
            Ok(self.ast.stats.alloc(Stat::ExprStat {
                lhs: Vec::new(),
                rhs: lhs,
            }))
        }
    }

}
