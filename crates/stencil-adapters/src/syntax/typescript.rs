//! Tree-sitter backend using the TypeScript grammar.
//!
//! TypeScript is a superset of the JavaScript that plugins generate, so one
//! grammar covers `.js` and `.ts` entry files. The backend walks the
//! concrete syntax tree once and keeps only what the mutation engine needs:
//!
//! - top-level `const x = f(...)` declarations whose callee is a plain
//!   identifier
//! - every `a.b(...)` call, with its first argument when that is an array
//! - where the first real statement begins

use thiserror::Error;
use tracing::{debug, instrument};
use tree_sitter::{Language, Node, Parser};

use stencil_core::application::ports::SyntaxBackend;
use stencil_core::domain::{
    CallBinding, ListElement, ListLiteral, MemberCall, MutationFailure, SourceOutline, Span,
    SyntaxTree,
};

/// The grammar could not be loaded into a parser.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("failed to load TypeScript grammar: {0}")]
    Language(#[from] tree_sitter::LanguageError),
}

/// Node kinds that can hold a list of statements.
const STATEMENT_CONTAINERS: &[&str] =
    &["program", "statement_block", "switch_case", "switch_default"];

#[derive(Debug, Clone)]
pub struct TreeSitterBackend {
    language: Language,
}

impl TreeSitterBackend {
    /// Load the grammar, failing if it is incompatible with the linked runtime.
    pub fn new() -> Result<Self, BackendError> {
        let language: Language = tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into();
        Parser::new().set_language(&language)?;
        Ok(Self { language })
    }

    fn parser(&self) -> Result<Parser, MutationFailure> {
        let mut parser = Parser::new();
        parser
            .set_language(&self.language)
            .map_err(|e| MutationFailure::Unparsable {
                reason: e.to_string(),
            })?;
        Ok(parser)
    }
}

impl SyntaxBackend for TreeSitterBackend {
    #[instrument(skip_all, fields(bytes = source.len()))]
    fn parse(&self, source: &str) -> Result<SyntaxTree, MutationFailure> {
        let tree = self
            .parser()?
            .parse(source, None)
            .ok_or_else(|| MutationFailure::Unparsable {
                reason: "parser produced no tree".into(),
            })?;
        let root = tree.root_node();

        if root.has_error() {
            let reason = first_error(root)
                .map(|node| {
                    let at = node.start_position();
                    format!("syntax error at line {}, column {}", at.row + 1, at.column + 1)
                })
                .unwrap_or_else(|| "syntax error".into());
            debug!(%reason, "rejecting source");
            return Err(MutationFailure::Unparsable { reason });
        }

        let outline = SourceOutline {
            bindings: top_level_bindings(root, source),
            calls: member_calls(root, source),
            program_start: program_start(root, source),
        };
        debug!(
            bindings = outline.bindings.len(),
            calls = outline.calls.len(),
            "parsed outline"
        );
        Ok(SyntaxTree::new(source, outline))
    }
}

// ── outline extraction ──────────────────────────────────────────────────────

fn text<'s>(node: Node<'_>, source: &'s str) -> &'s str {
    node.utf8_text(source.as_bytes()).unwrap_or_default()
}

fn span(node: Node<'_>) -> Span {
    Span::new(node.start_byte(), node.end_byte())
}

fn named_children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .filter(|child| child.has_error())
        .find_map(first_error)
}

fn top_level_bindings(root: Node<'_>, source: &str) -> Vec<CallBinding> {
    let mut bindings = Vec::new();
    for statement in named_children(root) {
        if !matches!(statement.kind(), "lexical_declaration" | "variable_declaration") {
            continue;
        }
        for declarator in named_children(statement) {
            if declarator.kind() != "variable_declarator" {
                continue;
            }
            let (Some(name), Some(value)) = (
                declarator.child_by_field_name("name"),
                declarator.child_by_field_name("value"),
            ) else {
                continue;
            };
            if name.kind() != "identifier" || value.kind() != "call_expression" {
                continue;
            }
            let Some(callee) = value
                .child_by_field_name("function")
                .filter(|f| f.kind() == "identifier")
            else {
                continue;
            };
            bindings.push(CallBinding {
                name: text(name, source).to_owned(),
                callee: text(callee, source).to_owned(),
                statement: span(statement),
            });
        }
    }
    bindings
}

fn member_calls(root: Node<'_>, source: &str) -> Vec<MemberCall> {
    let mut calls = Vec::new();
    let mut stack = vec![root];
    // Pre-order, so calls come out in source order.
    while let Some(node) = stack.pop() {
        if node.kind() == "call_expression" {
            if let Some(call) = member_call(node, source) {
                calls.push(call);
            }
        }
        let mut children = named_children(node);
        children.reverse();
        stack.extend(children);
    }
    calls
}

fn member_call(node: Node<'_>, source: &str) -> Option<MemberCall> {
    let callee = node
        .child_by_field_name("function")
        .filter(|f| f.kind() == "member_expression")?;
    let receiver = callee
        .child_by_field_name("object")
        .filter(|o| o.kind() == "identifier")?;
    let member = callee
        .child_by_field_name("property")
        .filter(|p| p.kind() == "property_identifier")?;

    let list = node
        .child_by_field_name("arguments")
        .and_then(|args| {
            named_children(args)
                .into_iter()
                .find(|arg| arg.kind() != "comment")
        })
        .filter(|first| first.kind() == "array")
        .map(|array| ListLiteral {
            span: span(array),
            elements: named_children(array)
                .into_iter()
                .filter(|e| e.kind() != "comment")
                .map(|e| ListElement {
                    name: text(e, source).to_owned(),
                    span: span(e),
                })
                .collect(),
        });

    Some(MemberCall {
        receiver: text(receiver, source).to_owned(),
        member: text(member, source).to_owned(),
        statement: span(enclosing_statement(node)),
        list,
    })
}

/// Climb to the node that sits directly in a statement list.
fn enclosing_statement(node: Node<'_>) -> Node<'_> {
    let mut current = node;
    while let Some(parent) = current.parent() {
        if STATEMENT_CONTAINERS.contains(&parent.kind()) {
            break;
        }
        current = parent;
    }
    current
}

/// Offset of the first statement that is not a comment, directive or hashbang.
fn program_start(root: Node<'_>, source: &str) -> usize {
    let mut after_preamble = 0;
    for child in named_children(root) {
        let preamble = match child.kind() {
            "comment" | "hash_bang_line" => true,
            "expression_statement" => is_directive(child),
            _ => false,
        };
        if !preamble {
            return child.start_byte();
        }
        after_preamble = child.end_byte();
    }
    if after_preamble == 0 {
        return 0;
    }
    // Only preamble: start on the line after it.
    source[after_preamble..]
        .find('\n')
        .map_or(source.len(), |i| after_preamble + i + 1)
}

fn is_directive(statement: Node<'_>) -> bool {
    let children = named_children(statement);
    matches!(children.as_slice(), [only] if only.kind() == "string")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> TreeSitterBackend {
        TreeSitterBackend::new().unwrap()
    }

    #[test]
    fn collects_top_level_call_bindings() {
        let src = "const a = require('a');\nlet b = require('b'), c = 1;\nfunction f() {\n  const d = require('d');\n}\nconst e = other.call();\n";
        let tree = backend().parse(src).unwrap();

        let names: Vec<&str> = tree
            .find_top_level_call_bindings("require")
            .iter()
            .map(|b| b.name.as_str())
            .collect();
        assert_eq!(names, ["a", "b"]);
        let first = &tree.outline().bindings[0];
        assert_eq!(first.statement.slice(src), "const a = require('a');");
    }

    #[test]
    fn finds_member_calls_with_array_argument() {
        let src = "function setup(app) {\n  app.use([one, two.three()]);\n}\napp.listen(3000);\n";
        let tree = backend().parse(src).unwrap();

        let call = tree.find_call_expression("app", "use").unwrap();
        assert_eq!(call.statement.slice(src), "app.use([one, two.three()]);");
        let list = call.list.as_ref().unwrap();
        assert_eq!(list.span.slice(src), "[one, two.three()]");
        let names: Vec<&str> = list.elements.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["one", "two.three()"]);

        let listen = tree.find_call_expression("app", "listen").unwrap();
        assert!(listen.list.is_none());
    }

    #[test]
    fn rejects_syntax_errors() {
        let err = backend().parse("const a = require('a';\n").unwrap_err();
        assert!(matches!(err, MutationFailure::Unparsable { .. }));
    }

    #[test]
    fn program_start_skips_comments_and_directives() {
        let src = "#!/usr/bin/env node\n// entry\n'use strict';\n\nrun();\n";
        let tree = backend().parse(src).unwrap();
        assert_eq!(tree.outline().program_start, src.find("run").unwrap());
    }

    #[test]
    fn program_start_of_preamble_only_file_is_after_it() {
        let src = "'use strict';\n";
        let tree = backend().parse(src).unwrap();
        assert_eq!(tree.outline().program_start, src.len());

        let empty = backend().parse("").unwrap();
        assert_eq!(empty.outline().program_start, 0);
    }
}
