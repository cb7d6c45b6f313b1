//! Thread-local tree-sitter parsers
//!
//! Tree-sitter parsers are not `Sync`, so each extraction worker keeps its own
//! parser per grammar and reuses it for every file it handles.

use anyhow::{Result, anyhow};
use std::cell::RefCell;
use tree_sitter::{Language, Parser, Tree};

/// Grammars with a structural parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grammar {
    Python,
}

impl Grammar {
    pub fn language(self) -> Language {
        match self {
            Grammar::Python => tree_sitter_python::LANGUAGE.into(),
        }
    }
}

thread_local! {
    static PARSERS: RefCell<Vec<(Grammar, Parser)>> = const { RefCell::new(Vec::new()) };
}

/// Parse `text` with this thread's parser for `grammar`, creating it on first use.
pub fn parse(grammar: Grammar, text: &str) -> Result<Tree> {
    PARSERS.with(|cell| {
        let mut parsers = cell.borrow_mut();
        let pos = match parsers.iter().position(|(g, _)| *g == grammar) {
            Some(pos) => pos,
            None => {
                let mut parser = Parser::new();
                parser
                    .set_language(&grammar.language())
                    .map_err(|e| anyhow!("failed to load {grammar:?} grammar: {e}"))?;
                tracing::debug!(?grammar, "created thread-local parser");
                parsers.push((grammar, parser));
                parsers.len() - 1
            }
        };
        parsers[pos]
            .1
            .parse(text, None)
            .ok_or_else(|| anyhow!("{grammar:?} parser produced no tree"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_python() {
        let tree = parse(Grammar::Python, "def main():\n    print('hi')\n").unwrap();
        assert_eq!(tree.root_node().kind(), "module");
        assert!(!tree.root_node().has_error());
    }

    #[test]
    fn test_parser_is_reused() {
        parse(Grammar::Python, "x = 1\n").unwrap();
        parse(Grammar::Python, "y = 2\n").unwrap();
        let count = PARSERS.with(|cell| cell.borrow().len());
        assert_eq!(count, 1);
    }
}
