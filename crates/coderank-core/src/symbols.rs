//! Global symbol table for cross-file call resolution

use crate::model::FunctionSymbol;
use std::collections::{BTreeMap, HashMap};

/// Repository-wide function table: bare name -> candidate qualified ids, and
/// qualified id -> definition.
#[derive(Debug, Default, Clone)]
pub struct SymbolTable {
    by_name: HashMap<String, Vec<String>>,
    definitions: BTreeMap<String, FunctionSymbol>,
    /// file path -> qualified ids defined in that file
    file_symbols: HashMap<String, Vec<String>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable::default()
    }

    /// Insert a definition. Returns false if the qualified id was already taken.
    pub fn insert(&mut self, symbol: FunctionSymbol) -> bool {
        if self.definitions.contains_key(&symbol.qualified_id) {
            return false;
        }
        self.by_name
            .entry(symbol.name.clone())
            .or_default()
            .push(symbol.qualified_id.clone());
        self.file_symbols
            .entry(symbol.file.clone())
            .or_default()
            .push(symbol.qualified_id.clone());
        self.definitions.insert(symbol.qualified_id.clone(), symbol);
        true
    }

    /// Candidate qualified ids for a bare name, in insertion order.
    pub fn candidates(&self, name: &str) -> &[String] {
        self.by_name.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn lookup(&self, qualified_id: &str) -> Option<&FunctionSymbol> {
        self.definitions.get(qualified_id)
    }

    pub fn contains(&self, qualified_id: &str) -> bool {
        self.definitions.contains_key(qualified_id)
    }

    /// Qualified ids defined in a file.
    pub fn symbols_in_file(&self, file_path: &str) -> &[String] {
        self.file_symbols
            .get(file_path)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All definitions ordered by qualified id.
    pub fn iter(&self) -> impl Iterator<Item = &FunctionSymbol> {
        self.definitions.values()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Number of distinct bare names.
    pub fn name_count(&self) -> usize {
        self.by_name.len()
    }
}
