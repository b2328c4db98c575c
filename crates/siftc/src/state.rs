use crate::config::LintOptions;
use crate::oracle::CompatibilityOracle;
use crate::symbols::Symbol;
use crate::tree::{CompilationUnit, NodeId, NodeKind};
use crate::types::{Ty, TypeTable};

/// Everything a check can look at while visiting one node: the unit, the lint
/// options, the compatibility oracle and the path from the root class down to
/// the current node.
#[derive(Clone, Copy)]
pub struct VisitorState<'a> {
    pub unit: &'a CompilationUnit,
    pub options: &'a LintOptions,
    pub oracle: &'a dyn CompatibilityOracle,
    path: &'a [NodeId],
}

impl<'a> VisitorState<'a> {
    pub fn new(
        unit: &'a CompilationUnit,
        options: &'a LintOptions,
        oracle: &'a dyn CompatibilityOracle,
    ) -> Self {
        Self {
            unit,
            options,
            oracle,
            path: &[],
        }
    }

    /// The same state positioned at the last node of `path`.
    pub fn at<'p>(&self, path: &'p [NodeId]) -> VisitorState<'p>
    where
        'a: 'p,
    {
        VisitorState {
            unit: self.unit,
            options: self.options,
            oracle: self.oracle,
            path,
        }
    }

    pub fn types(&self) -> &'a TypeTable {
        &self.unit.types
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.ancestors().next()
    }

    /// Ancestors of the current node, nearest first.
    pub fn ancestors(&self) -> impl Iterator<Item = NodeId> + 'a {
        let path = self.path;
        let upto = path.len().saturating_sub(1);
        path[..upto].iter().rev().copied()
    }

    pub fn enclosing_classes(&self) -> impl Iterator<Item = NodeId> + 'a {
        let unit = self.unit;
        self.ancestors()
            .filter(move |id| matches!(unit.kind(*id), NodeKind::Class { .. }))
    }

    pub fn enclosing_class_type(&self) -> Option<&'a Ty> {
        let unit = self.unit;
        self.enclosing_classes().next().and_then(|class| unit.ty(class))
    }

    pub fn ty(&self, node: NodeId) -> Option<&'a Ty> {
        self.unit.ty(node)
    }

    pub fn symbol(&self, node: NodeId) -> Option<&'a Symbol> {
        self.unit.symbol(node)
    }
}

impl std::fmt::Debug for VisitorState<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisitorState")
            .field("unit", &self.unit.path)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}
