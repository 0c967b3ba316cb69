//! Pratt expression parser (spec §4.3).
//!
//! Priority table and right-associativity handling are grounded directly
//! on `ravi_ast_parse.c`'s `priority[]` table and `parse_sub_expression`,
//! and on `compiler/parser/lua_operator_kind.rs`'s `PriorityTable`/
//! `PRIORITY` for the same constant values expressed in this corpus's
//! idiom.

use super::Parser;
use crate::ast::node::{BinOp, Expr, ExprId, IndexedAssign, LiteralValue, Suffix, TableKey, UnOp};
use crate::ast::ravi_type::{array_tag, builtin_tag, RaviTag, RaviType};
use crate::error::SyntaxError;
use crate::token::{Literal, TokenKind};

const UNARY_PRIORITY: u8 = 12;

fn binop_of(kind: TokenKind) -> Option<(BinOp, u8, u8)> {
    use TokenKind::*;
    Some(match kind {
        Plus => (BinOp::Add, 10, 10),
        Minus => (BinOp::Sub, 10, 10),
        Star => (BinOp::Mul, 11, 11),
        Percent => (BinOp::Mod, 11, 11),
        Caret => (BinOp::Pow, 14, 13),
        Slash => (BinOp::Div, 11, 11),
        DSlash => (BinOp::IDiv, 11, 11),
        Amp => (BinOp::BAnd, 6, 6),
        Pipe => (BinOp::BOr, 4, 4),
        Tilde => (BinOp::BXor, 5, 5),
        Shl => (BinOp::Shl, 7, 7),
        Shr => (BinOp::Shr, 7, 7),
        Concat => (BinOp::Concat, 9, 8),
        Eq => (BinOp::Eq, 3, 3),
        Lt => (BinOp::Lt, 3, 3),
        Le => (BinOp::Le, 3, 3),
        Ne => (BinOp::Ne, 3, 3),
        Gt => (BinOp::Gt, 3, 3),
        Ge => (BinOp::Ge, 3, 3),
        And => (BinOp::And, 2, 2),
        Or => (BinOp::Or, 1, 1),
        _ => return None,
    })
}

fn unop_of(kind: TokenKind) -> Option<UnOp> {
    match kind {
        TokenKind::Minus => Some(UnOp::Neg),
        TokenKind::Not => Some(UnOp::Not),
        TokenKind::Hash => Some(UnOp::Len),
        TokenKind::Tilde => Some(UnOp::BNot),
        _ => None,
    }
}

impl<'s> Parser<'s> {
    pub(crate) fn parse_expr(&mut self) -> Result<ExprId, SyntaxError> {
        self.parse_sub(0)
    }

    /// Parses a primary (possibly unary-wrapped), then greedily extends
    /// while the next binop's left-priority strictly exceeds `limit`,
    /// recursing with that op's right-priority.
    fn parse_sub(&mut self, limit: u8) -> Result<ExprId, SyntaxError> {
        let mut left = if let Some(target) = self.try_builtin_conversion()? {
            let expr = self.parse_sub(UNARY_PRIORITY)?;
            self.ast.exprs.alloc(Expr::ToType { target, expr })
        } else if self.check(TokenKind::At) {
            self.advance()?;
            let name = self.parse_dotted_name()?;
            let interned = self.interner.intern(&name);
            let target = RaviType::userdata(interned);
            let expr = self.parse_sub(UNARY_PRIORITY)?;
            self.ast.exprs.alloc(Expr::ToType { target, expr })
        } else if let Some(op) = unop_of(self.current.kind) {
            self.advance()?;
            let expr = self.parse_sub(UNARY_PRIORITY)?;
            self.ast.exprs.alloc(Expr::Unary { op, expr })
        } else {
            self.parse_simple_expr()?
        };

        while let Some((op, lprio, rprio)) = binop_of(self.current.kind) {
            if lprio <= limit {
                break;
            }
            self.advance()?;
            let right = self.parse_sub(rprio)?;
            left = self.ast.exprs.alloc(Expr::Binary { op, left, right });
        }
        Ok(left)
    }

    fn try_builtin_conversion(&mut self) -> Result<Option<RaviType>, SyntaxError> {
        let tag = match self.current.kind {
            TokenKind::ToInteger => RaviTag::Integer,
            TokenKind::ToNumber => RaviTag::Float,
            TokenKind::ToIntArray => RaviTag::ArrayInteger,
            TokenKind::ToNumArray => RaviTag::ArrayFloat,
            TokenKind::ToTable => RaviTag::Table,
            TokenKind::ToString => RaviTag::String,
            TokenKind::ToClosure => RaviTag::Function,
            _ => return Ok(None),
        };
        self.advance()?;
        Ok(Some(RaviType::simple(tag)))
    }

    fn parse_simple_expr(&mut self) -> Result<ExprId, SyntaxError> {
        let line = self.line();
        match self.current.kind {
            TokenKind::Nil => {
                self.advance()?;
                Ok(self.ast.exprs.alloc(Expr::Literal {
                    ravi_type: RaviType::simple(RaviTag::Nil),
                    value: LiteralValue::Nil,
                }))
            }
            TokenKind::True => {
                self.advance()?;
                Ok(self.ast.exprs.alloc(Expr::Literal {
                    ravi_type: RaviType::simple(RaviTag::Boolean),
                    value: LiteralValue::True,
                }))
            }
            TokenKind::False => {
                self.advance()?;
                Ok(self.ast.exprs.alloc(Expr::Literal {
                    ravi_type: RaviType::simple(RaviTag::Boolean),
                    value: LiteralValue::False,
                }))
            }
            TokenKind::Int => {
                let Literal::Int(v) = self.current.payload.clone() else {
                    unreachable!()
                };
                self.advance()?;
                Ok(self.ast.exprs.alloc(Expr::Literal {
                    ravi_type: RaviType::simple(RaviTag::Integer),
                    value: LiteralValue::Int(v),
                }))
            }
            TokenKind::Float => {
                let Literal::Float(v) = self.current.payload.clone() else {
                    unreachable!()
                };
                self.advance()?;
                Ok(self.ast.exprs.alloc(Expr::Literal {
                    ravi_type: RaviType::simple(RaviTag::Float),
                    value: LiteralValue::Float(v),
                }))
            }
            TokenKind::Str => {
                let Literal::Str(text) = self.current.payload.clone() else {
                    unreachable!()
                };
                let name = self.interner.intern(&text);
                self.advance()?;
                Ok(self.ast.exprs.alloc(Expr::Literal {
                    ravi_type: RaviType::simple(RaviTag::String),
                    value: LiteralValue::Str(name),
                }))
            }
            TokenKind::Dots => {
                self.advance()?;
                Ok(self.ast.exprs.alloc(Expr::Vararg))
            }
            TokenKind::LBrace => self.parse_table_constructor(),
            TokenKind::Function => {
                self.advance()?;
                let function = self.parse_function_body(false)?;
                Ok(self.ast.exprs.alloc(Expr::FunctionExpr { function }))
            }
            _ => self.parse_suffixed_expr(line),
        }
    }

    /// `{...}` → `TABLE_CONSTRUCTOR` of `INDEXED_ASSIGN` fields.
    fn parse_table_constructor(&mut self) -> Result<ExprId, SyntaxError> {
        let open_line = self.line();
        self.advance()?; // '{'
        let mut fields = Vec::new();
        while !self.check(TokenKind::RBrace) {
            let field = if self.check(TokenKind::LBracket) {
                self.advance()?;
                let key_expr = self.parse_expr()?;
                self.checknext(TokenKind::RBracket)?;
                self.checknext(TokenKind::Assign)?;
                let value = self.parse_expr()?;
                IndexedAssign {
                    key: Some(TableKey::Index(key_expr)),
                    value,
                }
            } else if self.check(TokenKind::Name) && self.peek_is_assign()? {
                let name = self.expect_name()?;
                self.advance()?; // '='
                let value = self.parse_expr()?;
                IndexedAssign {
                    key: Some(TableKey::Field(name)),
                    value,
                }
            } else {
                let value = self.parse_expr()?;
                IndexedAssign { key: None, value }
            };
            fields.push(field);
            if !self.testnext(TokenKind::Comma)? && !self.testnext(TokenKind::Semicolon)? {
                break;
            }
        }
        self.check_match(TokenKind::RBrace, TokenKind::LBrace, open_line)?;
        Ok(self.ast.exprs.alloc(Expr::TableConstructor { fields }))
    }

    fn peek_is_assign(&mut self) -> Result<bool, SyntaxError> {
        Ok(self.source.lookahead()?.kind == TokenKind::Assign)
    }

    /// A primary expression followed by a (possibly empty) suffix chain
    /// of dot-selectors, index expressions, method calls, and call
    /// arguments.
    pub(crate) fn parse_suffixed_expr(&mut self, line: u32) -> Result<ExprId, SyntaxError> {
        let primary = self.parse_primary_expr(line)?;
        let mut suffixes = Vec::new();
        loop {
            match self.current.kind {
                TokenKind::Dot => {
                    self.advance()?;
                    let name = self.expect_name()?;
                    suffixes.push(Suffix::Field(name));
                }
                TokenKind::LBracket => {
                    self.advance()?;
                    let expr = self.parse_expr()?;
                    self.checknext(TokenKind::RBracket)?;
                    suffixes.push(Suffix::Index(expr));
                }
                TokenKind::Colon => {
                    self.advance()?;
                    let method = self.expect_name()?;
                    let args = self.parse_call_args()?;
                    suffixes.push(Suffix::Call {
                        method: Some(method),
                        args,
                    });
                }
                TokenKind::LParen | TokenKind::LBrace | TokenKind::Str => {
                    let args = self.parse_call_args()?;
                    suffixes.push(Suffix::Call { method: None, args });
                }
                _ => break,
            }
        }
        if suffixes.is_empty() {
            Ok(primary)
        } else {
            Ok(self.ast.exprs.alloc(Expr::Suffixed { primary, suffixes }))
        }
    }

    fn parse_call_args(&mut self) -> Result<Vec<ExprId>, SyntaxError> {
        match self.current.kind {
            TokenKind::LParen => {
                let open_line = self.line();
                self.advance()?;
                let mut args = Vec::new();
                if !self.check(TokenKind::RParen) {
                    args.push(self.parse_expr()?);
                    while self.testnext(TokenKind::Comma)? {
                        args.push(self.parse_expr()?);
                    }
                }
                self.check_match(TokenKind::RParen, TokenKind::LParen, open_line)?;
                Ok(args)
            }
            TokenKind::LBrace => {
                let table = self.parse_table_constructor()?;
                Ok(vec![table])
            }
            TokenKind::Str => {
                let str_expr = self.parse_simple_expr()?;
                Ok(vec![str_expr])
            }
            _ => Err(SyntaxError::new("function arguments expected", self.line())),
        }
    }

    /// Bare-name primary (identifier resolution) or a parenthesised
    /// expression.
    fn parse_primary_expr(&mut self, line: u32) -> Result<ExprId, SyntaxError> {
        match self.current.kind {
            TokenKind::LParen => {
                self.advance()?;
                let inner = self.parse_expr()?;
                self.check_match(TokenKind::RParen, TokenKind::LParen, line)?;
                Ok(inner)
            }
            TokenKind::Name => {
                let name = self.expect_name()?;
                let symbol = self.resolve_identifier(name);
                Ok(self.ast.exprs.alloc(Expr::SymbolRef { symbol }))
            }
            _ => Err(SyntaxError::unexpected_symbol(line)),
        }
    }

    /// `local` / `@`-cast type annotation: recognises the built-in
    /// keywords exactly, promotes `integer`/`number` to their ARRAY_*
    /// variants on a trailing `[]`, and otherwise treats the name as a
    /// (possibly dotted) USERDATA user-type.
    pub(crate) fn parse_typeref(&mut self) -> Result<RaviType, SyntaxError> {
        let first = self.expect_name()?;
        let word = self.interner.resolve(first).to_string();
        if let Some(tag) = builtin_tag(&word) {
            if self.check(TokenKind::LBracket) {
                if let Some(array) = array_tag(tag) {
                    let save = self.source.lookahead()?;
                    if save.kind == TokenKind::RBracket {
                        self.advance()?; // '['
                        self.advance()?; // ']'
                        return Ok(RaviType::simple(array));
                    }
                }
            }
            return Ok(RaviType::simple(tag));
        }
        let mut dotted = word;
        while self.check(TokenKind::Dot) {
            self.advance()?;
            let part = self.expect_name()?;
            dotted.push('.');
            dotted.push_str(self.interner.resolve(part));
        }
        if dotted.len() > super::MAX_USER_TYPE_NAME {
            return Err(SyntaxError::user_type_too_long(self.line()));
        }
        let name = self.interner.intern(&dotted);
        Ok(RaviType::userdata(name))
    }
}
