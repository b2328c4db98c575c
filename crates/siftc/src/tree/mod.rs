//! Resolved syntax tree of one compilation unit.
//!
//! The tree is produced by an external front end (or by [`build::UnitBuilder`])
//! and handed over as a `sift.tree` JSON document. Nodes live in an arena and are
//! addressed by [`NodeId`]; spans are byte offsets into [`CompilationUnit::source`].

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use sift_contracts::SIFT_TREE_SCHEMA_VERSIONS_SUPPORTED;

use crate::symbols::{Symbol, SymbolId, SymbolTable};
use crate::types::{Ty, TypeId, TypeTable};

pub mod build;
pub mod walk;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        if self.is_empty() || other.is_empty() {
            return self.start == other.start && self.end == other.end;
        }
        self.start < other.end && other.start < self.end
    }

    pub fn range(&self) -> std::ops::Range<usize> {
        self.start as usize..self.end as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modifier {
    Public,
    Protected,
    Private,
    Static,
    Final,
    Abstract,
    Default,
    Synchronized,
    Transient,
    Volatile,
    Native,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Literal {
    String { value: String },
    Char { value: char },
    Int { value: i64 },
    Long { value: i64 },
    Float { value: f32 },
    Double { value: f64 },
    Bool { value: bool },
    Null,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeKind {
    Class {
        name: String,
        #[serde(default)]
        members: Vec<NodeId>,
    },
    /// Field, local variable or parameter declaration.
    Variable {
        name: String,
        #[serde(default)]
        modifiers: BTreeSet<Modifier>,
        #[serde(default)]
        annotations: Vec<String>,
        var_type: NodeId,
        #[serde(default)]
        init: Option<NodeId>,
    },
    Method {
        name: String,
        #[serde(default)]
        modifiers: BTreeSet<Modifier>,
        #[serde(default)]
        annotations: Vec<String>,
        #[serde(default)]
        result: Option<NodeId>,
        #[serde(default)]
        params: Vec<NodeId>,
        #[serde(default)]
        body: Option<NodeId>,
    },
    Block {
        #[serde(default)]
        stmts: Vec<NodeId>,
    },
    ExprStmt {
        expr: NodeId,
    },
    Return {
        #[serde(default)]
        expr: Option<NodeId>,
    },
    If {
        cond: NodeId,
        then: NodeId,
        #[serde(default)]
        otherwise: Option<NodeId>,
    },
    While {
        cond: NodeId,
        body: NodeId,
    },
    ForEach {
        var: NodeId,
        iterable: NodeId,
        body: NodeId,
    },
    Call {
        callee: NodeId,
        #[serde(default)]
        type_args: Vec<NodeId>,
        #[serde(default)]
        args: Vec<NodeId>,
    },
    New {
        class: NodeId,
        #[serde(default)]
        args: Vec<NodeId>,
    },
    Select {
        target: NodeId,
        name: String,
    },
    Ident {
        name: String,
    },
    Literal {
        lit: Literal,
    },
    Assign {
        target: NodeId,
        value: NodeId,
    },
    Binary {
        op: String,
        lhs: NodeId,
        rhs: NodeId,
    },
    Unary {
        op: String,
        operand: NodeId,
    },
    Lambda {
        #[serde(default)]
        params: Vec<NodeId>,
        body: NodeId,
    },
    MethodRef {
        target: NodeId,
        name: String,
    },
    TypeName {
        name: String,
    },
    TypeApply {
        base: NodeId,
        #[serde(default)]
        args: Vec<NodeId>,
    },
    Other {
        #[serde(default)]
        children: Vec<NodeId>,
    },
}

impl NodeKind {
    /// Child nodes in source order.
    pub fn children(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        match self {
            NodeKind::Class { members, .. } => out.extend(members),
            NodeKind::Variable { var_type, init, .. } => {
                out.push(*var_type);
                out.extend(init);
            }
            NodeKind::Method {
                result,
                params,
                body,
                ..
            } => {
                out.extend(result);
                out.extend(params);
                out.extend(body);
            }
            NodeKind::Block { stmts } => out.extend(stmts),
            NodeKind::ExprStmt { expr } => out.push(*expr),
            NodeKind::Return { expr } => out.extend(expr),
            NodeKind::If {
                cond,
                then,
                otherwise,
            } => {
                out.push(*cond);
                out.push(*then);
                out.extend(otherwise);
            }
            NodeKind::While { cond, body } => out.extend([*cond, *body]),
            NodeKind::ForEach {
                var,
                iterable,
                body,
            } => out.extend([*var, *iterable, *body]),
            NodeKind::Call {
                callee,
                type_args,
                args,
            } => {
                out.push(*callee);
                out.extend(type_args);
                out.extend(args);
            }
            NodeKind::New { class, args } => {
                out.push(*class);
                out.extend(args);
            }
            NodeKind::Select { target, .. } => out.push(*target),
            NodeKind::Ident { .. } | NodeKind::Literal { .. } | NodeKind::TypeName { .. } => {}
            NodeKind::Assign { target, value } => out.extend([*target, *value]),
            NodeKind::Binary { lhs, rhs, .. } => out.extend([*lhs, *rhs]),
            NodeKind::Unary { operand, .. } => out.push(*operand),
            NodeKind::Lambda { params, body } => {
                out.extend(params);
                out.push(*body);
            }
            NodeKind::MethodRef { target, .. } => out.push(*target),
            NodeKind::TypeApply { base, args } => {
                out.push(*base);
                out.extend(args);
            }
            NodeKind::Other { children } => out.extend(children),
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    #[serde(flatten)]
    pub kind: NodeKind,
    pub span: Span,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<Ty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sym: Option<SymbolId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageDecl {
    pub name: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportDecl {
    pub path: String,
    #[serde(default)]
    pub is_static: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompilationUnit {
    pub schema_version: String,
    pub path: String,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<PackageDecl>,
    #[serde(default)]
    pub imports: Vec<ImportDecl>,
    #[serde(default)]
    pub types: TypeTable,
    #[serde(default)]
    pub symbols: SymbolTable,
    pub nodes: Vec<Node>,
    pub classes: Vec<NodeId>,
}

#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    #[error("decode tree document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported tree schema_version {found:?} (supported: {supported})")]
    UnsupportedSchemaVersion { found: String, supported: String },
    #[error("node {from} refers to missing node {to}")]
    DanglingNode { from: String, to: u32 },
    #[error("node {node} refers to missing symbol {sym}")]
    DanglingSymbol { node: u32, sym: u32 },
    #[error("{owner} refers to missing type {ty}")]
    DanglingType { owner: String, ty: u32 },
    #[error("node {node} span {start}..{end} is outside the source ({len} bytes) or not on a char boundary")]
    BadSpan {
        node: String,
        start: u32,
        end: u32,
        len: usize,
    },
    #[error("node {0} has more than one parent")]
    SharedNode(u32),
}

pub fn parse_tree_json(bytes: &[u8]) -> Result<CompilationUnit, TreeError> {
    let unit: CompilationUnit = serde_json::from_slice(bytes)?;
    unit.validate()?;
    Ok(unit)
}

impl CompilationUnit {
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.node(id).kind
    }

    pub fn ty(&self, id: NodeId) -> Option<&Ty> {
        self.node(id).ty.as_ref()
    }

    pub fn symbol_id(&self, id: NodeId) -> Option<SymbolId> {
        self.node(id).sym
    }

    pub fn symbol(&self, id: NodeId) -> Option<&Symbol> {
        self.node(id).sym.and_then(|s| self.symbols.get(s))
    }

    pub fn source_for(&self, id: NodeId) -> &str {
        self.source
            .get(self.node(id).span.range())
            .unwrap_or_default()
    }

    /// Explicit receiver of a call (`recv` in `recv.m(..)`); `None` for bare calls.
    pub fn receiver(&self, call: NodeId) -> Option<NodeId> {
        let NodeKind::Call { callee, .. } = self.kind(call) else {
            return None;
        };
        match self.kind(*callee) {
            NodeKind::Select { target, .. } => Some(*target),
            _ => None,
        }
    }

    pub fn call_args(&self, call: NodeId) -> &[NodeId] {
        match self.kind(call) {
            NodeKind::Call { args, .. } => args,
            _ => &[],
        }
    }

    pub fn is_import_present(&self, path: &str, is_static: bool) -> bool {
        self.imports
            .iter()
            .any(|i| i.path == path && i.is_static == is_static)
    }

    pub fn validate(&self) -> Result<(), TreeError> {
        if !SIFT_TREE_SCHEMA_VERSIONS_SUPPORTED.contains(&self.schema_version.as_str()) {
            return Err(TreeError::UnsupportedSchemaVersion {
                found: self.schema_version.clone(),
                supported: SIFT_TREE_SCHEMA_VERSIONS_SUPPORTED.join(", "),
            });
        }

        let node_count = self.nodes.len();
        let mut parents = vec![0u32; node_count];
        for (idx, node) in self.nodes.iter().enumerate() {
            for child in node.kind.children() {
                if child.index() >= node_count {
                    return Err(TreeError::DanglingNode {
                        from: idx.to_string(),
                        to: child.0,
                    });
                }
                parents[child.index()] += 1;
                if parents[child.index()] > 1 {
                    return Err(TreeError::SharedNode(child.0));
                }
            }
            if let Some(sym) = node.sym {
                if self.symbols.get(sym).is_none() {
                    return Err(TreeError::DanglingSymbol {
                        node: idx as u32,
                        sym: sym.0,
                    });
                }
            }
            if let Some(ty) = &node.ty {
                self.check_ty(ty, || format!("node {idx}"))?;
            }
            self.check_span(node.span, || idx.to_string())?;
        }
        for root in &self.classes {
            if root.index() >= node_count {
                return Err(TreeError::DanglingNode {
                    from: "classes".to_string(),
                    to: root.0,
                });
            }
            if parents[root.index()] > 0 {
                return Err(TreeError::SharedNode(root.0));
            }
        }
        for (id, decl) in self.types.iter() {
            for sup in &decl.supertypes {
                self.check_ty(sup, || format!("type {}", id.0))?;
            }
        }
        for (id, sym) in self.symbols.iter() {
            if let Some(owner) = sym.owner {
                self.check_type_id(owner, || format!("symbol {}", id.0))?;
            }
            for p in sym.params.iter().chain(sym.ty.iter()) {
                self.check_ty(p, || format!("symbol {}", id.0))?;
            }
        }
        for import in &self.imports {
            self.check_span(import.span, || format!("import {}", import.path))?;
        }
        if let Some(pkg) = &self.package {
            self.check_span(pkg.span, || "package".to_string())?;
        }
        Ok(())
    }

    fn check_span(&self, span: Span, who: impl Fn() -> String) -> Result<(), TreeError> {
        let ok = span.start <= span.end
            && (span.end as usize) <= self.source.len()
            && self.source.is_char_boundary(span.start as usize)
            && self.source.is_char_boundary(span.end as usize);
        if ok {
            Ok(())
        } else {
            Err(TreeError::BadSpan {
                node: who(),
                start: span.start,
                end: span.end,
                len: self.source.len(),
            })
        }
    }

    fn check_type_id(&self, id: TypeId, who: impl Fn() -> String) -> Result<(), TreeError> {
        if self.types.get(id).is_none() {
            return Err(TreeError::DanglingType {
                owner: who(),
                ty: id.0,
            });
        }
        Ok(())
    }

    fn check_ty(&self, ty: &Ty, who: impl Fn() -> String + Copy) -> Result<(), TreeError> {
        match ty {
            Ty::Class { decl, args } => {
                self.check_type_id(*decl, who)?;
                for a in args {
                    self.check_ty(a, who)?;
                }
                Ok(())
            }
            Ty::Array { elem } => self.check_ty(elem, who),
            _ => Ok(()),
        }
    }
}
