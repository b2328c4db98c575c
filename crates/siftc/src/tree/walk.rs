use std::convert::Infallible;

use super::{CompilationUnit, NodeId};

/// What the walker does after visiting a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitAction {
    Descend,
    SkipSubtree,
}

/// Depth-first, source-order walk of the subtree rooted at `root`.
///
/// The callback receives the node and the ancestor path (root first, the node
/// itself last). Returning [`VisitAction::SkipSubtree`] prunes the node's
/// children; an `Err` stops the walk.
pub fn try_walk<E>(
    unit: &CompilationUnit,
    root: NodeId,
    mut visit: impl FnMut(NodeId, &[NodeId]) -> Result<VisitAction, E>,
) -> Result<(), E> {
    let mut path: Vec<NodeId> = Vec::new();
    let mut stack: Vec<(NodeId, usize)> = vec![(root, 0)];
    while let Some((id, depth)) = stack.pop() {
        path.truncate(depth);
        path.push(id);
        if visit(id, &path)? == VisitAction::SkipSubtree {
            continue;
        }
        let children = unit.kind(id).children();
        stack.extend(children.into_iter().rev().map(|c| (c, depth + 1)));
    }
    Ok(())
}

pub fn walk(
    unit: &CompilationUnit,
    root: NodeId,
    mut visit: impl FnMut(NodeId, &[NodeId]) -> VisitAction,
) {
    let res: Result<(), Infallible> = try_walk(unit, root, |id, path| Ok(visit(id, path)));
    match res {
        Ok(()) => {}
        Err(never) => match never {},
    }
}
