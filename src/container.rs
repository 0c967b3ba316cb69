//! Container facade (spec §4.1, §6): owns the arenas and the interner,
//! exposes `parse`/`tostring`/`release` to the host.
//!
//! Grounded on `compiler/mod.rs`'s `Compiler::compile_with_name` driver
//! shape (tokenize, drive the parser, surface errors) and the original's
//! `ast_container` lifecycle (`new_ast_container` / `collect_ast_container`,
//! whose `killed` flag is this type's `released`).

use crate::ast::symbol::FunctionId;
use crate::ast::Ast;
use crate::error::ParseError;
use crate::intern::Interner;
use crate::lexer::Lexer;
use crate::parser::Parser;
use crate::printer;

/// The opaque AST container returned by `parse`.
pub struct Container {
    ast: Ast,
    interner: Interner,
    chunk_name: String,
    main_function: Option<FunctionId>,
    released: bool,
}

impl Container {
    /// `container.tostring()` — a human-readable dump of the tree.
    pub fn tostring(&self) -> String {
        if self.released {
            return String::new();
        }
        match self.main_function {
            Some(root) => printer::print_chunk(&self.ast, &self.interner, root),
            None => String::new(),
        }
    }

    pub fn chunk_name(&self) -> &str {
        &self.chunk_name
    }

    pub fn main_function(&self) -> Option<FunctionId> {
        self.main_function
    }

    pub fn ast(&self) -> &Ast {
        &self.ast
    }

    pub fn interner(&self) -> &Interner {
        &self.interner
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Releases the arenas; idempotent (spec §4.1, §6).
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.ast.clear();
        self.main_function = None;
        self.released = true;
    }
}

impl Drop for Container {
    fn drop(&mut self) {
        self.release();
    }
}

/// `parse(source)`: parses `source` as an anonymous chunk.
pub fn parse(source: &str) -> Result<Container, ParseError> {
    parse_named(source, "?")
}

/// `parse(source, chunkname)`.
pub fn parse_named(source: &str, chunk_name: &str) -> Result<Container, ParseError> {
    parse_with_mode(source, chunk_name, "t")
}

/// `parse(source, chunkname, mode)`: `mode` must contain `t` (the only
/// supported mode; spec §6, §7).
pub fn parse_with_mode(source: &str, chunk_name: &str, mode: &str) -> Result<Container, ParseError> {
    if !mode.contains('t') {
        return Err(ParseError::ModeMismatch(mode.to_string()));
    }
    tracing::debug!(chunk_name, "parsing chunk");

    let mut interner = Interner::new();
    // The lexer produces owned-string payloads (it has no interner of its
    // own); the parser is the sole interner of `Name`/`Str` tokens, so
    // only one `&mut Interner` borrow ever exists.
    let mut lexer = Lexer::new(source);
    let (ast, main_function) = {
        let mut parser = Parser::new(&mut lexer, &mut interner).map_err(|err| {
            tracing::debug!(chunk_name, error = %err, "parse failed (tokenizing entry)");
            ParseError::from(err)
        })?;
        let main_function = parser.parse_chunk().map_err(|err| {
            tracing::debug!(chunk_name, error = %err, "parse failed");
            ParseError::from(err)
        })?;
        (std::mem::take(&mut parser.ast), main_function)
    };

    tracing::trace!(chunk_name, functions = ast.functions.len(), "parse complete");

    Ok(Container {
        ast,
        interner,
        chunk_name: chunk_name.to_string(),
        main_function: Some(main_function),
        released: false,
    })
}
