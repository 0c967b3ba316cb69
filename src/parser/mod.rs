//! Recursive-descent parser skeleton (spec §4.3).
//!
//! Grounded on `compiler/statement.rs` / `compiler/expr_parser.rs` for the
//! overall pull-parse shape, and directly on the original's
//! `ravi_ast_parse.c` (`testnext`/`check`/`checknext`/`check_match`/
//! `block_follow`) for exact helper semantics.

mod expr;
mod resolve;
mod stmt;

use crate::ast::symbol::{FunctionId, ScopeId};
use crate::ast::Ast;
use crate::error::SyntaxError;
use crate::intern::Interner;
use crate::lexer::TokenSource;
use crate::token::{spelling, Token, TokenKind};

/// A single `local` statement may not introduce more than this many
/// variables (spec §7: "implementation-defined maximum (≥ 200)").
pub const MAX_LOCALS: usize = 200;
/// Dotted user-type names longer than this many bytes are rejected.
pub const MAX_USER_TYPE_NAME: usize = 127;

pub(crate) struct LoopFrame {
    pub scope: ScopeId,
}

pub struct Parser<'s> {
    pub(crate) source: &'s mut dyn TokenSource,
    pub(crate) interner: &'s mut Interner,
    pub ast: Ast,
    pub(crate) current: Token,
    pub(crate) current_function: Option<FunctionId>,
    pub(crate) current_scope: Option<ScopeId>,
    pub(crate) loop_stack: Vec<LoopFrame>,
}

impl<'s> Parser<'s> {
    pub fn new(source: &'s mut dyn TokenSource, interner: &'s mut Interner) -> Result<Self, SyntaxError> {
        let current = source.next()?;
        Ok(Parser {
            source,
            interner,
            ast: Ast::new(),
            current,
            current_function: None,
            current_scope: None,
            loop_stack: Vec::new(),
        })
    }

    pub fn line(&self) -> u32 {
        self.current.line
    }

    fn advance(&mut self) -> Result<Token, SyntaxError> {
        let next = self.source.next()?;
        Ok(std::mem::replace(&mut self.current, next))
    }

    pub(crate) fn check(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    /// Consumes `kind` if present, returning whether it was consumed.
    pub(crate) fn testnext(&mut self, kind: TokenKind) -> Result<bool, SyntaxError> {
        if self.check(kind) {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Fails with `"'<K>' expected"` if `kind` is not current.
    pub(crate) fn check_tok(&self, kind: TokenKind) -> Result<(), SyntaxError> {
        if self.check(kind) {
            Ok(())
        } else {
            Err(SyntaxError::expected(spelling(kind), self.line()))
        }
    }

    pub(crate) fn checknext(&mut self, kind: TokenKind) -> Result<Token, SyntaxError> {
        self.check_tok(kind)?;
        self.advance()
    }

    /// Same as `checknext`, but cites `open`'s line when opener/closer are
    /// on different lines.
    pub(crate) fn check_match(
        &mut self,
        close: TokenKind,
        open: TokenKind,
        open_line: u32,
    ) -> Result<(), SyntaxError> {
        if self.check(close) {
            self.advance()?;
            Ok(())
        } else {
            Err(SyntaxError::expected_match(
                spelling(close),
                spelling(open),
                open_line,
                self.line(),
            ))
        }
    }

    /// True on `else`, `elseif`, `end`, end-of-stream, and (if
    /// `allow_until`) `until`.
    pub(crate) fn block_follow(&self, allow_until: bool) -> bool {
        match self.current.kind {
            TokenKind::Else | TokenKind::ElseIf | TokenKind::End | TokenKind::Eof => true,
            TokenKind::Until => allow_until,
            _ => false,
        }
    }

    pub(crate) fn expect_name(&mut self) -> Result<crate::intern::Name, SyntaxError> {
        if !self.check(TokenKind::Name) {
            return Err(SyntaxError::expected(spelling(TokenKind::Name), self.line()));
        }
        let crate::token::Literal::Name(text) = self.current.payload.clone() else {
            return Err(SyntaxError::expected(spelling(TokenKind::Name), self.line()));
        };
        let name = self.interner.intern(&text);
        self.advance()?;
        Ok(name)
    }

    /// Parses a dotted identifier already starting at the current NAME
    /// token (`a.b.c`); used by typerefs and by `@`-cast user-type names.
    pub(crate) fn parse_dotted_name(&mut self) -> Result<String, SyntaxError> {
        let first = self.expect_name()?;
        let mut text = self.interner.resolve(first).to_string();
        while self.check(TokenKind::Dot) {
            self.advance()?;
            let part = self.expect_name()?;
            text.push('.');
            text.push_str(self.interner.resolve(part));
        }
        if text.len() > MAX_USER_TYPE_NAME {
            return Err(SyntaxError::user_type_too_long(self.line()));
        }
        Ok(text)
    }

    pub(crate) fn new_scope(&mut self) -> ScopeId {
        let function = self.current_function.expect("scope outside function");
        let parent = self.current_scope;
        let scope = self.ast.scopes.alloc(crate::ast::symbol::Scope {
            symbols: Vec::new(),
            function,
            parent,
        });
        if self.ast.functions.get(function).main_block.is_none() {
            self.ast.functions.get_mut(function).main_block = Some(scope);
        }
        self.current_scope = Some(scope);
        scope
    }

    pub(crate) fn end_scope(&mut self, enclosing: Option<ScopeId>) {
        self.current_scope = enclosing;
    }

    pub(crate) fn new_function(&mut self, is_vararg: bool) -> FunctionId {
        let parent = self.current_function;
        let function = self
            .ast
            .functions
            .alloc(crate::ast::symbol::Function::new(parent, is_vararg));
        if let Some(parent) = parent {
            self.ast.functions.get_mut(parent).children.push(function);
        }
        self.current_function = Some(function);
        function
    }

    pub(crate) fn end_function(&mut self, parent_function: Option<FunctionId>, parent_scope: Option<ScopeId>) {
        if let Some(function) = self.current_function {
            crate::labels::resolve_function(&mut self.ast, function);
        }
        self.current_function = parent_function;
        self.current_scope = parent_scope;
    }

    /// `chunk ::= block`: the implicit top-level function wrapper, always
    /// vararg and parentless (spec §3, invariant 4).
    pub fn parse_chunk(&mut self) -> Result<FunctionId, SyntaxError> {
        let function = self.new_function(true);
        self.new_scope();
        let body = self.parse_statement_list()?;
        self.ast.functions.get_mut(function).body = body;
        if !self.check(TokenKind::Eof) {
            return Err(SyntaxError::unexpected_symbol(self.line()));
        }
        self.end_function(None, None);
        Ok(function)
    }
}
