//! Parser and scope-resolved AST builder for a Lua-5.3-derived dialect
//! with optional static types.
//!
//! The lexical scanner is specified only by the `TokenSource` interface
//! (see [`lexer`]); [`lexer::Lexer`] is the concrete implementation this
//! crate ships so the parser is exercisable end to end. Resolution of
//! identifiers to locals/upvalues/globals happens inline during parsing
//! (see [`parser::resolve`]); `goto`/`label` matching runs as a
//! best-effort pass per function (see [`labels`]).

pub mod arena;
pub mod ast;
pub mod container;
pub mod error;
pub mod intern;
pub mod labels;
pub mod lexer;
pub mod parser;
pub mod printer;
pub mod token;

pub use container::{parse, parse_named, parse_with_mode, Container};
pub use error::{ParseError, SyntaxError};
