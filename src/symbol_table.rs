use rustc_hash::FxHashMap;
use serde::Serialize;
use thiserror::Error;

use crate::ast::DataType;

/// A declared name. `initialized` is recorded for reporting completeness;
/// the front end performs no definite-assignment analysis, so it stays
/// false at declaration time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Symbol {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: DataType,
    pub line: usize,
    pub column: usize,
    #[serde(skip)]
    pub initialized: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Symbol '{name}' already declared")]
pub struct DuplicateSymbol {
    pub name: String,
}

/// Flat symbol table: one global namespace, no scopes. Iteration order is
/// unspecified; reporting adapters sort externally when they need stable
/// output.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    symbols: FxHashMap<String, Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a declaration. The first declaration of a name wins; a
    /// second insert reports the duplicate and leaves the table unchanged.
    pub fn insert(
        &mut self,
        name: &str,
        ty: DataType,
        line: usize,
        column: usize,
    ) -> Result<(), DuplicateSymbol> {
        if self.symbols.contains_key(name) {
            return Err(DuplicateSymbol {
                name: name.to_string(),
            });
        }
        self.symbols.insert(
            name.to_string(),
            Symbol {
                name: name.to_string(),
                ty,
                line,
                column,
                initialized: false,
            },
        );
        Ok(())
    }

    pub fn exists(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }

    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.values()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
