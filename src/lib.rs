//! `nexparse` library crate.
//!
//! Front end for a small dual-lexicon imperative language. Data flows in
//! one pass:
//! - `lexer` classifies source text into `token`s, accumulating lexical
//!   diagnostics without ever aborting
//! - `parser` buffers the token stream and descends the grammar into the
//!   `ast`, recording declarations in the flat `symbol_table` and
//!   checking references along the way
//! - `report` renders the finished parse as a JSON report or a text
//!   summary
pub mod ast;
pub mod diagnostics;
pub mod lexer;
pub mod parser;
pub mod report;
pub mod symbol_table;
pub mod token;
