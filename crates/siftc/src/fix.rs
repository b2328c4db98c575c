//! Composable source edits.
//!
//! A [`Fix`] is a set of non-overlapping replacements kept in span order plus a
//! set of imports to add. Fixes built independently for several declarations
//! merge into one; an overlap is a detector bug and surfaces as [`FixError`].

use std::collections::BTreeSet;

use crate::diagnostics::{ImportEdit, Quickfix, QuickfixKind, TextEdit};
use crate::tree::{CompilationUnit, NodeId, Span};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FixError {
    #[error("edit at {}..{} overlaps edit at {}..{}", new.start, new.end, existing.start, existing.end)]
    Overlap { existing: Span, new: Span },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fix {
    edits: Vec<TextEdit>,
    imports: BTreeSet<ImportEdit>,
}

impl Fix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(&mut self, span: Span, replacement: impl Into<String>) -> Result<(), FixError> {
        if let Some(existing) = self.edits.iter().find(|e| e.span.overlaps(&span)) {
            return Err(FixError::Overlap {
                existing: existing.span,
                new: span,
            });
        }
        let idx = self.edits.partition_point(|e| e.span < span);
        self.edits.insert(
            idx,
            TextEdit {
                span,
                replacement: replacement.into(),
            },
        );
        Ok(())
    }

    pub fn replace_node(
        &mut self,
        unit: &CompilationUnit,
        node: NodeId,
        replacement: impl Into<String>,
    ) -> Result<(), FixError> {
        self.replace(unit.node(node).span, replacement)
    }

    pub fn add_import(&mut self, path: &str) {
        self.imports.insert(ImportEdit {
            path: path.to_string(),
            is_static: false,
        });
    }

    pub fn add_static_import(&mut self, path: &str) {
        self.imports.insert(ImportEdit {
            path: path.to_string(),
            is_static: true,
        });
    }

    pub fn merge(&mut self, other: Fix) -> Result<(), FixError> {
        for edit in other.edits {
            self.replace(edit.span, edit.replacement)?;
        }
        self.imports.extend(other.imports);
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty() && self.imports.is_empty()
    }

    pub fn edits(&self) -> &[TextEdit] {
        &self.edits
    }

    pub fn imports(&self) -> impl Iterator<Item = &ImportEdit> {
        self.imports.iter()
    }

    pub fn into_quickfix(self, note: Option<String>) -> Quickfix {
        Quickfix {
            kind: QuickfixKind::TextEdits,
            edits: self.edits,
            imports: self.imports.into_iter().collect(),
            note,
        }
    }
}
