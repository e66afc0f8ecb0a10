//! Structural view of a source file.
//!
//! A `SyntaxBackend` parses text into a [`SourceOutline`]: only the nodes
//! the mutation engine needs, with byte spans into the original text. The
//! [`SyntaxTree`] pairs the text with its outline and buffers insertions
//! until [`SyntaxTree::serialize`] applies them in one pass.

use thiserror::Error;

/// Half-open byte range `[start, end)` into the parsed text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn slice<'s>(&self, text: &'s str) -> &'s str {
        text.get(self.start..self.end).unwrap_or_default()
    }
}

/// A top-level `const name = callee(...)` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallBinding {
    pub name: String,
    pub callee: String,
    /// The whole declaration statement.
    pub statement: Span,
}

/// One element of an array literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListElement {
    pub name: String,
    pub span: Span,
}

/// An array literal passed as the first argument of a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListLiteral {
    /// Includes the brackets.
    pub span: Span,
    pub elements: Vec<ListElement>,
}

/// A call of the form `receiver.member(...)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberCall {
    pub receiver: String,
    pub member: String,
    /// The statement that directly contains the call.
    pub statement: Span,
    pub list: Option<ListLiteral>,
}

/// What a backend extracts from a file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceOutline {
    pub bindings: Vec<CallBinding>,
    pub calls: Vec<MemberCall>,
    /// Start of the first statement, after any leading comments or directives.
    pub program_start: usize,
}

/// Why a source mutation was refused. The file is left untouched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MutationFailure {
    #[error("'{name}' is already declared")]
    NameCollision { name: String },

    #[error("cannot satisfy ordering: must follow index {prev} but precede index {next}")]
    UnsatisfiableOrder { prev: usize, next: usize },

    #[error("could not find {anchor}")]
    AnchorNotFound { anchor: String },

    #[error("source could not be parsed: {reason}")]
    Unparsable { reason: String },

    #[error("invalid snippet: {reason}")]
    InvalidSnippet { reason: String },

    #[error("file '{path}' does not exist")]
    FileNotFound { path: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Edit {
    offset: usize,
    text: String,
}

/// Parsed text plus pending insertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxTree {
    source: String,
    outline: SourceOutline,
    edits: Vec<Edit>,
}

impl SyntaxTree {
    pub fn new(source: impl Into<String>, outline: SourceOutline) -> Self {
        Self {
            source: source.into(),
            outline,
            edits: Vec::new(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn outline(&self) -> &SourceOutline {
        &self.outline
    }

    /// Top-level declarations initialized by a call to `loader`, in source order.
    pub fn find_top_level_call_bindings(&self, loader: &str) -> Vec<&CallBinding> {
        self.outline
            .bindings
            .iter()
            .filter(|b| b.callee == loader)
            .collect()
    }

    /// First `receiver.member(...)` call.
    pub fn find_call_expression(&self, receiver: &str, member: &str) -> Option<&MemberCall> {
        self.outline
            .calls
            .iter()
            .find(|c| c.receiver == receiver && c.member == member)
    }

    /// Queue `text` at `offset`. Insertions at the same offset keep their
    /// queueing order.
    pub fn insert_at(&mut self, offset: usize, text: impl Into<String>) {
        self.edits.push(Edit {
            offset: offset.min(self.source.len()),
            text: text.into(),
        });
    }

    /// Insert a statement on its own line before `statement`, matching its
    /// indentation.
    pub fn insert_before(&mut self, statement: Span, text: &str) {
        let indent = self.indentation_at(statement.start).to_owned();
        self.insert_at(statement.start, format!("{text}\n{indent}"));
    }

    /// Insert a statement on its own line after `statement`. A comment
    /// trailing `statement` on the same line stays on that line.
    pub fn insert_after(&mut self, statement: Span, text: &str) {
        let indent = self.indentation_at(statement.start).to_owned();
        let offset = self.trailing_line_end(statement.end);
        self.insert_at(offset, format!("\n{indent}{text}"));
    }

    pub fn has_edits(&self) -> bool {
        !self.edits.is_empty()
    }

    /// Text with all queued insertions applied.
    pub fn serialize(&self) -> String {
        let mut edits: Vec<&Edit> = self.edits.iter().collect();
        edits.sort_by_key(|e| e.offset);

        let extra: usize = edits.iter().map(|e| e.text.len()).sum();
        let mut out = String::with_capacity(self.source.len() + extra);
        let mut cursor = 0;
        for edit in edits {
            out.push_str(&self.source[cursor..edit.offset]);
            out.push_str(&edit.text);
            cursor = edit.offset;
        }
        out.push_str(&self.source[cursor..]);
        out
    }

    /// End of the line containing `offset` when only whitespace or a comment
    /// follows it there, otherwise `offset` itself.
    fn trailing_line_end(&self, offset: usize) -> usize {
        let offset = offset.min(self.source.len());
        let rest = &self.source[offset..];
        let line_len = rest.find('\n').unwrap_or(rest.len());
        let line = rest[..line_len].trim_end_matches('\r');
        let trailing = line.trim();

        let only_comment = trailing.is_empty()
            || trailing.starts_with("//")
            || (trailing.starts_with("/*")
                && trailing.find("*/").map(|i| i + 2) == Some(trailing.len()));
        if only_comment {
            offset + line.len()
        } else {
            offset
        }
    }

    /// Whitespace between the start of the line and `offset`.
    fn indentation_at(&self, offset: usize) -> &str {
        let line_start = self.source[..offset].rfind('\n').map_or(0, |i| i + 1);
        let prefix = &self.source[line_start..offset];
        if prefix.chars().all(char::is_whitespace) {
            prefix
        } else {
            ""
        }
    }
}
