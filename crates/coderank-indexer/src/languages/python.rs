//! Python language extractor using tree-sitter

use crate::extractor::{ExtractionResult, LanguageExtractor, QualifiedIds};
use crate::parser_pool::{self, Grammar};
use anyhow::Result;
use coderank_core::{CallSite, ImportRef, Symbol, SymbolRole};
use tree_sitter::{Node, Point};

/// Receivers whose attribute calls are treated as calls to a sibling method.
const SELF_RECEIVERS: &[&str] = &["self", "cls"];

pub struct PythonExtractor;

impl LanguageExtractor for PythonExtractor {
    fn extract(&self, path: &str, text: &str) -> Result<ExtractionResult> {
        let tree = parser_pool::parse(Grammar::Python, text)?;
        let mut walker = Walker {
            path,
            source: text.as_bytes(),
            scope: Vec::new(),
            callers: Vec::new(),
            ids: QualifiedIds::default(),
            result: ExtractionResult::default(),
        };
        walker.visit(tree.root_node());
        Ok(walker.result)
    }
}

fn line(point: Point) -> u32 {
    point.row as u32 + 1
}

struct Walker<'a> {
    path: &'a str,
    source: &'a [u8],
    /// Names of the enclosing classes and functions, outermost first.
    scope: Vec<String>,
    /// Qualified ids of the enclosing functions, innermost last.
    callers: Vec<String>,
    ids: QualifiedIds,
    result: ExtractionResult,
}

impl Walker<'_> {
    fn visit(&mut self, node: Node<'_>) {
        if node.is_error() {
            self.result.skipped.push(format!(
                "syntax error at lines {}-{}",
                line(node.start_position()),
                line(node.end_position())
            ));
            return;
        }
        match node.kind() {
            "function_definition" => self.definition(node, SymbolRole::Callable),
            "class_definition" => self.definition(node, SymbolRole::Container),
            "import_statement" => self.import(node),
            "import_from_statement" => self.import_from(node),
            "call" => {
                self.call(node);
                self.visit_children(node, None);
            }
            _ => self.visit_children(node, None),
        }
    }

    fn visit_children(&mut self, node: Node<'_>, except: Option<Node<'_>>) {
        let mut cursor = node.walk();
        let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
        for child in children {
            if except.is_some_and(|e| e.id() == child.id()) {
                continue;
            }
            self.visit(child);
        }
    }

    fn text(&self, node: Node<'_>) -> Option<&str> {
        node.utf8_text(self.source).ok()
    }

    /// Record a `def` or `class`. The span starts at the keyword line, so
    /// decorators never shift it.
    fn definition(&mut self, node: Node<'_>, role: SymbolRole) {
        let name = node
            .child_by_field_name("name")
            .filter(|n| !n.is_missing())
            .and_then(|n| self.text(n))
            .map(str::to_string);
        let Some(name) = name else {
            self.result.skipped.push(format!(
                "definition without a name at line {}",
                line(node.start_position())
            ));
            return;
        };

        let scope = (!self.scope.is_empty()).then(|| self.scope.join("."));
        let mut symbol = Symbol::new(
            self.path,
            scope.as_deref(),
            &name,
            line(node.start_position()),
            line(node.end_position()),
            role,
        );
        self.ids.claim(&mut symbol);
        let qualified_id = symbol.qualified_id.clone();
        match role {
            SymbolRole::Callable => self.result.symbols.functions.push(symbol),
            SymbolRole::Container => self.result.symbols.classes.push(symbol),
        }

        // Parameters, defaults and base classes are evaluated in the outer scope.
        let body = node.child_by_field_name("body");
        self.visit_children(node, body);

        let Some(body) = body else {
            return;
        };
        self.scope.push(name);
        let callable = role == SymbolRole::Callable;
        if callable {
            self.callers.push(qualified_id);
        }
        self.visit(body);
        if callable {
            self.callers.pop();
        }
        self.scope.pop();
    }

    fn call(&mut self, node: Node<'_>) {
        let Some(function) = node.child_by_field_name("function") else {
            return;
        };
        let callee = match function.kind() {
            "identifier" => self.text(function),
            "attribute" => {
                let receiver = function
                    .child_by_field_name("object")
                    .and_then(|o| self.text(o));
                if receiver.is_some_and(|r| SELF_RECEIVERS.contains(&r)) {
                    function
                        .child_by_field_name("attribute")
                        .and_then(|a| self.text(a))
                } else {
                    None
                }
            }
            _ => None,
        };
        let (Some(callee), Some(caller)) = (callee, self.callers.last()) else {
            return;
        };
        let site = CallSite {
            caller: caller.clone(),
            callee: callee.to_string(),
            line: line(node.start_position()),
        };
        self.result.symbols.calls.push(site);
    }

    /// Module path of a `dotted_name` or `aliased_import` node.
    fn imported_name(&self, node: Node<'_>) -> Option<String> {
        let target = match node.kind() {
            "aliased_import" => node.child_by_field_name("name")?,
            _ => node,
        };
        let text = self.text(target)?;
        Some(text.split_whitespace().collect())
    }

    /// `import a.b, c as d`
    fn import(&mut self, node: Node<'_>) {
        let line = line(node.start_position());
        let mut cursor = node.walk();
        let targets: Vec<String> = node
            .children_by_field_name("name", &mut cursor)
            .filter_map(|n| self.imported_name(n))
            .collect();
        for target in targets {
            self.result
                .symbols
                .imports
                .push(ImportRef::statement(target, line));
        }
    }

    /// `from ..pkg import a, b as c`
    fn import_from(&mut self, node: Node<'_>) {
        let Some(module) = node
            .child_by_field_name("module_name")
            .and_then(|n| self.text(n))
            .map(|t| t.split_whitespace().collect::<String>())
        else {
            return;
        };
        let mut cursor = node.walk();
        let names: Vec<String> = node
            .children_by_field_name("name", &mut cursor)
            .filter_map(|n| self.imported_name(n))
            .collect();
        let import = ImportRef::statement(module, line(node.start_position())).with_names(names);
        self.result.symbols.imports.push(import);
    }
}
