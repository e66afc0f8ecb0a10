//! Source mutation engine.
//!
//! Splices generated statements into hand-written entry files:
//!
//! - [`SourceMutator::insert_binding`] adds a `const x = require('...')`
//!   declaration, keeping the loader bindings sorted by name.
//! - [`SourceMutator::insert_list_entry`] adds an identifier to the array
//!   passed to `receiver.member([...])`, honouring `before`/`after`
//!   constraints, plus its declaration.
//!
//! Both return the new text or a [`MutationFailure`]; the input is never
//! modified on failure. Inserting the same binding twice fails the second
//! time with [`MutationFailure::NameCollision`], which callers treat as
//! "already applied".

use tracing::debug;

use crate::application::ports::SyntaxBackend;
use crate::domain::{ListElement, MutationFailure};

const DEFAULT_SEPARATOR: &str = ", ";

/// A list entry to insert.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListEntry {
    pub receiver: String,
    pub member: String,
    /// Identifier inserted into the array.
    pub name: String,
    /// Statement declaring `name`, placed before the call's statement.
    pub declaration: Option<String>,
    /// The entry must come before all of these.
    pub before: Vec<String>,
    /// The entry must come after all of these.
    pub after: Vec<String>,
}

impl ListEntry {
    pub fn new(
        receiver: impl Into<String>,
        member: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            receiver: receiver.into(),
            member: member.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn declared_by(mut self, declaration: impl Into<String>) -> Self {
        self.declaration = Some(declaration.into());
        self
    }

    pub fn before(mut self, name: impl Into<String>) -> Self {
        self.before.push(name.into());
        self
    }

    pub fn after(mut self, name: impl Into<String>) -> Self {
        self.after.push(name.into());
        self
    }
}

pub struct SourceMutator<'a> {
    backend: &'a dyn SyntaxBackend,
    loader: &'a str,
}

impl<'a> SourceMutator<'a> {
    pub fn new(backend: &'a dyn SyntaxBackend, loader: &'a str) -> Self {
        Self { backend, loader }
    }

    /// Insert the loader binding declared by `snippet` into `source`.
    pub fn insert_binding(&self, source: &str, snippet: &str) -> Result<String, MutationFailure> {
        let mut tree = self.backend.parse(source)?;
        let snippet_tree = self.backend.parse(snippet).map_err(as_invalid_snippet)?;

        let new = match snippet_tree.find_top_level_call_bindings(self.loader).as_slice() {
            [one] => (*one).clone(),
            found => {
                return Err(MutationFailure::InvalidSnippet {
                    reason: format!(
                        "expected exactly one '{}' binding, found {}",
                        self.loader,
                        found.len()
                    ),
                });
            }
        };
        let text = new.statement.slice(snippet).trim().to_owned();

        let existing = tree.find_top_level_call_bindings(self.loader);
        if existing.iter().any(|b| b.name == new.name) {
            return Err(MutationFailure::NameCollision { name: new.name });
        }

        let anchor = existing
            .iter()
            .filter(|b| b.name < new.name)
            .max_by(|a, b| a.name.cmp(&b.name))
            .map(|b| b.statement);
        let first = existing.first().map(|b| b.statement);

        let output = match (anchor, first) {
            (Some(after), _) => {
                debug!(name = %new.name, "inserting binding after anchor");
                tree.insert_after(after, &text);
                tree.serialize()
            }
            (None, Some(first)) => {
                // Sorts before every existing binding.
                let marker = format!("/*stencil:{}*/", uuid::Uuid::new_v4());
                tree.insert_before(first, &format!("{marker}{text}"));
                tree.serialize().replace(&marker, "")
            }
            (None, None) => {
                let start = tree.outline().program_start;
                let rest_is_code = !tree.source()[start..].trim().is_empty();
                let text = if rest_is_code {
                    format!("{text}\n\n")
                } else {
                    format!("{text}\n")
                };
                tree.insert_at(start, text);
                tree.serialize()
            }
        };

        self.validate(output)
    }

    /// Insert `entry` into the call's array argument.
    pub fn insert_list_entry(
        &self,
        source: &str,
        entry: &ListEntry,
    ) -> Result<String, MutationFailure> {
        let mut tree = self.backend.parse(source)?;

        if let Some(decl) = &entry.declaration {
            self.backend.parse(decl).map_err(as_invalid_snippet)?;
        }

        let call = tree
            .find_call_expression(&entry.receiver, &entry.member)
            .ok_or_else(|| MutationFailure::AnchorNotFound {
                anchor: format!("call {}.{}(...)", entry.receiver, entry.member),
            })?
            .clone();
        let list = call
            .list
            .as_ref()
            .ok_or_else(|| MutationFailure::AnchorNotFound {
                anchor: format!("array argument of {}.{}(...)", entry.receiver, entry.member),
            })?;

        let index_of = |name: &String| list.elements.iter().position(|e| &e.name == name);
        let len = list.elements.len();
        let next = entry.before.iter().filter_map(index_of).min().unwrap_or(len);
        let prev = entry.after.iter().filter_map(index_of).max().unwrap_or(0);

        if prev > next {
            return Err(MutationFailure::UnsatisfiableOrder { prev, next });
        }

        let separator = list_separator(tree.source(), &list.elements);
        match list.elements.get(next) {
            Some(at) => tree.insert_at(at.span.start, format!("{}{separator}", entry.name)),
            None => match list.elements.last() {
                Some(last) => tree.insert_at(last.span.end, format!("{separator}{}", entry.name)),
                None => tree.insert_at(list.span.start + 1, entry.name.clone()),
            },
        }

        if let Some(decl) = &entry.declaration {
            tree.insert_before(call.statement, decl.trim());
        }

        debug!(name = %entry.name, index = next, "inserting list entry");
        self.validate(tree.serialize())
    }

    /// The edited text must still parse.
    fn validate(&self, output: String) -> Result<String, MutationFailure> {
        self.backend
            .parse(&output)
            .map(|_| output)
            .map_err(as_invalid_snippet)
    }
}

fn as_invalid_snippet(failure: MutationFailure) -> MutationFailure {
    match failure {
        MutationFailure::Unparsable { reason } => MutationFailure::InvalidSnippet { reason },
        other => other,
    }
}

/// Text between the first two elements, e.g. `", "` or `",\n  "`.
fn list_separator(source: &str, elements: &[ListElement]) -> String {
    match elements {
        [a, b, ..] => source
            .get(a.span.end..b.span.start)
            .filter(|s| s.contains(','))
            .unwrap_or(DEFAULT_SEPARATOR)
            .to_owned(),
        _ => DEFAULT_SEPARATOR.to_owned(),
    }
}
