//! Programmatic construction of a [`CompilationUnit`].
//!
//! The builder lays out source text while it creates nodes, so every node's span
//! matches the text it renders to. Nodes are created bottom-up; `finish` places
//! the root classes in the file and assigns absolute spans.

use std::collections::BTreeSet;

use sift_contracts::SIFT_TREE_SCHEMA_VERSION;

use super::{
    CompilationUnit, ImportDecl, Literal, Modifier, Node, NodeId, NodeKind, PackageDecl, Span,
    TreeError,
};
use crate::symbols::{SymbolId, SymbolTable};
use crate::types::{Ty, TypeTable};

#[derive(Debug)]
struct Pending {
    kind: NodeKind,
    ty: Option<Ty>,
    sym: Option<SymbolId>,
    text: String,
    offsets: Vec<(NodeId, u32)>,
}

#[derive(Debug, Default)]
struct Layout {
    text: String,
    offsets: Vec<(NodeId, u32)>,
}

impl Layout {
    fn push(&mut self, s: &str) {
        self.text.push_str(s);
    }

    fn node(&mut self, b: &UnitBuilder, id: NodeId) {
        self.offsets.push((id, self.text.len() as u32));
        self.text.push_str(b.text_of(id));
    }

    fn nodes_sep(&mut self, b: &UnitBuilder, ids: &[NodeId], sep: &str) {
        for (i, id) in ids.iter().enumerate() {
            if i > 0 {
                self.push(sep);
            }
            self.node(b, *id);
        }
    }
}

#[derive(Debug)]
pub struct UnitBuilder {
    path: String,
    package: Option<String>,
    imports: Vec<(String, bool)>,
    nodes: Vec<Pending>,
    pub types: TypeTable,
    pub symbols: SymbolTable,
}

impl UnitBuilder {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            package: None,
            imports: Vec::new(),
            nodes: Vec::new(),
            types: TypeTable::new(),
            symbols: SymbolTable::new(),
        }
    }

    pub fn package(&mut self, name: &str) {
        self.package = Some(name.to_string());
    }

    /// Imports render in the order they are added.
    pub fn import(&mut self, path: &str) {
        self.imports.push((path.to_string(), false));
    }

    pub fn static_import(&mut self, path: &str) {
        self.imports.push((path.to_string(), true));
    }

    pub fn text_of(&self, id: NodeId) -> &str {
        self.nodes
            .get(id.index())
            .map(|p| p.text.as_str())
            .unwrap_or_default()
    }

    fn alloc(
        &mut self,
        kind: NodeKind,
        layout: Layout,
        ty: Option<Ty>,
        sym: Option<SymbolId>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Pending {
            kind,
            ty,
            sym,
            text: layout.text,
            offsets: layout.offsets,
        });
        id
    }

    pub fn ident(&mut self, name: &str, ty: Option<Ty>, sym: Option<SymbolId>) -> NodeId {
        let mut l = Layout::default();
        l.push(name);
        self.alloc(
            NodeKind::Ident {
                name: name.to_string(),
            },
            l,
            ty,
            sym,
        )
    }

    pub fn select(
        &mut self,
        target: NodeId,
        name: &str,
        ty: Option<Ty>,
        sym: Option<SymbolId>,
    ) -> NodeId {
        let mut l = Layout::default();
        l.node(self, target);
        l.push(".");
        l.push(name);
        self.alloc(
            NodeKind::Select {
                target,
                name: name.to_string(),
            },
            l,
            ty,
            sym,
        )
    }

    /// `target.<type_args>name(args)`, or `name(args)` without a target.
    ///
    /// Explicit type arguments are only rendered when a target is present.
    pub fn call(
        &mut self,
        target: Option<NodeId>,
        type_args: Vec<NodeId>,
        name: &str,
        args: Vec<NodeId>,
        ty: Option<Ty>,
        sym: Option<SymbolId>,
    ) -> NodeId {
        let mut type_arg_offsets = Vec::new();
        let callee = match target {
            Some(target) => {
                let mut sel = Layout::default();
                sel.node(self, target);
                sel.push(".");
                if !type_args.is_empty() {
                    sel.push("<");
                    for (i, ta) in type_args.iter().enumerate() {
                        if i > 0 {
                            sel.push(", ");
                        }
                        type_arg_offsets.push((*ta, sel.text.len() as u32));
                        sel.text.push_str(self.text_of(*ta));
                    }
                    sel.push(">");
                }
                sel.push(name);
                self.alloc(
                    NodeKind::Select {
                        target,
                        name: name.to_string(),
                    },
                    sel,
                    None,
                    sym,
                )
            }
            None => self.ident(name, None, sym),
        };
        let mut l = Layout::default();
        l.node(self, callee);
        l.offsets.extend(type_arg_offsets);
        l.push("(");
        l.nodes_sep(self, &args, ", ");
        l.push(")");
        let type_args = if target.is_some() {
            type_args
        } else {
            Vec::new()
        };
        self.alloc(
            NodeKind::Call {
                callee,
                type_args,
                args,
            },
            l,
            ty,
            sym,
        )
    }

    pub fn new_instance(
        &mut self,
        class: NodeId,
        args: Vec<NodeId>,
        ty: Option<Ty>,
        sym: Option<SymbolId>,
    ) -> NodeId {
        let mut l = Layout::default();
        l.push("new ");
        l.node(self, class);
        l.push("(");
        l.nodes_sep(self, &args, ", ");
        l.push(")");
        self.alloc(NodeKind::New { class, args }, l, ty, sym)
    }

    pub fn literal(&mut self, lit: Literal, ty: Option<Ty>) -> NodeId {
        let mut l = Layout::default();
        l.push(&render_literal(&lit));
        self.alloc(NodeKind::Literal { lit }, l, ty, None)
    }

    pub fn binary(&mut self, lhs: NodeId, op: &str, rhs: NodeId, ty: Option<Ty>) -> NodeId {
        let mut l = Layout::default();
        l.node(self, lhs);
        l.push(&format!(" {op} "));
        l.node(self, rhs);
        self.alloc(
            NodeKind::Binary {
                op: op.to_string(),
                lhs,
                rhs,
            },
            l,
            ty,
            None,
        )
    }

    pub fn unary(&mut self, op: &str, operand: NodeId, ty: Option<Ty>) -> NodeId {
        let mut l = Layout::default();
        l.push(op);
        l.node(self, operand);
        self.alloc(
            NodeKind::Unary {
                op: op.to_string(),
                operand,
            },
            l,
            ty,
            None,
        )
    }

    pub fn assign(&mut self, target: NodeId, value: NodeId) -> NodeId {
        let mut l = Layout::default();
        l.node(self, target);
        l.push(" = ");
        l.node(self, value);
        let ty = self.nodes.get(target.index()).and_then(|p| p.ty.clone());
        self.alloc(NodeKind::Assign { target, value }, l, ty, None)
    }

    pub fn method_ref(&mut self, target: NodeId, name: &str, sym: Option<SymbolId>) -> NodeId {
        let mut l = Layout::default();
        l.node(self, target);
        l.push("::");
        l.push(name);
        self.alloc(
            NodeKind::MethodRef {
                target,
                name: name.to_string(),
            },
            l,
            None,
            sym,
        )
    }

    pub fn type_name(&mut self, name: &str, ty: Option<Ty>) -> NodeId {
        let mut l = Layout::default();
        l.push(name);
        self.alloc(
            NodeKind::TypeName {
                name: name.to_string(),
            },
            l,
            ty,
            None,
        )
    }

    pub fn type_apply(&mut self, base: NodeId, args: Vec<NodeId>, ty: Option<Ty>) -> NodeId {
        let mut l = Layout::default();
        l.node(self, base);
        l.push("<");
        l.nodes_sep(self, &args, ", ");
        l.push(">");
        self.alloc(NodeKind::TypeApply { base, args }, l, ty, None)
    }

    /// Field declaration: `@A mods Type name = init;`.
    pub fn field(
        &mut self,
        annotations: &[&str],
        modifiers: &[Modifier],
        var_type: NodeId,
        name: &str,
        init: Option<NodeId>,
        sym: Option<SymbolId>,
    ) -> NodeId {
        let mut l = Layout::default();
        for a in annotations {
            let simple = a.rsplit('.').next().unwrap_or(a);
            l.push(&format!("@{simple} "));
        }
        for m in modifiers {
            l.push(modifier_text(*m));
            l.push(" ");
        }
        self.variable_tail(l, annotations, modifiers, var_type, name, init, sym, true)
    }

    /// Local variable declaration statement: `Type name = init;`.
    pub fn local(
        &mut self,
        var_type: NodeId,
        name: &str,
        init: Option<NodeId>,
        sym: Option<SymbolId>,
    ) -> NodeId {
        self.variable_tail(Layout::default(), &[], &[], var_type, name, init, sym, true)
    }

    /// Parameter or loop variable: `Type name`.
    pub fn param(&mut self, var_type: NodeId, name: &str, sym: Option<SymbolId>) -> NodeId {
        self.variable_tail(Layout::default(), &[], &[], var_type, name, None, sym, false)
    }

    #[allow(clippy::too_many_arguments)]
    fn variable_tail(
        &mut self,
        mut l: Layout,
        annotations: &[&str],
        modifiers: &[Modifier],
        var_type: NodeId,
        name: &str,
        init: Option<NodeId>,
        sym: Option<SymbolId>,
        terminated: bool,
    ) -> NodeId {
        l.node(self, var_type);
        l.push(" ");
        l.push(name);
        if let Some(init) = init {
            l.push(" = ");
            l.node(self, init);
        }
        if terminated {
            l.push(";");
        }
        let ty = self.nodes.get(var_type.index()).and_then(|p| p.ty.clone());
        self.alloc(
            NodeKind::Variable {
                name: name.to_string(),
                modifiers: modifiers.iter().copied().collect::<BTreeSet<_>>(),
                annotations: annotations.iter().map(|a| a.to_string()).collect(),
                var_type,
                init,
            },
            l,
            ty,
            sym,
        )
    }

    pub fn method(
        &mut self,
        modifiers: &[Modifier],
        result: NodeId,
        name: &str,
        params: Vec<NodeId>,
        body: NodeId,
        sym: Option<SymbolId>,
    ) -> NodeId {
        let mut l = Layout::default();
        for m in modifiers {
            l.push(modifier_text(*m));
            l.push(" ");
        }
        l.node(self, result);
        l.push(" ");
        l.push(name);
        l.push("(");
        l.nodes_sep(self, &params, ", ");
        l.push(") ");
        l.node(self, body);
        self.alloc(
            NodeKind::Method {
                name: name.to_string(),
                modifiers: modifiers.iter().copied().collect(),
                annotations: Vec::new(),
                result: Some(result),
                params,
                body: Some(body),
            },
            l,
            None,
            sym,
        )
    }

    pub fn block(&mut self, stmts: Vec<NodeId>) -> NodeId {
        let mut l = Layout::default();
        l.push("{");
        for s in &stmts {
            l.push("\n    ");
            l.node(self, *s);
        }
        l.push(if stmts.is_empty() { "}" } else { "\n  }" });
        self.alloc(NodeKind::Block { stmts }, l, None, None)
    }

    pub fn expr_stmt(&mut self, expr: NodeId) -> NodeId {
        let mut l = Layout::default();
        l.node(self, expr);
        l.push(";");
        self.alloc(NodeKind::ExprStmt { expr }, l, None, None)
    }

    pub fn ret(&mut self, expr: Option<NodeId>) -> NodeId {
        let mut l = Layout::default();
        l.push("return");
        if let Some(e) = expr {
            l.push(" ");
            l.node(self, e);
        }
        l.push(";");
        self.alloc(NodeKind::Return { expr }, l, None, None)
    }

    pub fn if_stmt(&mut self, cond: NodeId, then: NodeId, otherwise: Option<NodeId>) -> NodeId {
        let mut l = Layout::default();
        l.push("if (");
        l.node(self, cond);
        l.push(") ");
        l.node(self, then);
        if let Some(e) = otherwise {
            l.push(" else ");
            l.node(self, e);
        }
        self.alloc(
            NodeKind::If {
                cond,
                then,
                otherwise,
            },
            l,
            None,
            None,
        )
    }

    pub fn for_each(&mut self, var: NodeId, iterable: NodeId, body: NodeId) -> NodeId {
        let mut l = Layout::default();
        l.push("for (");
        l.node(self, var);
        l.push(" : ");
        l.node(self, iterable);
        l.push(") ");
        l.node(self, body);
        self.alloc(
            NodeKind::ForEach {
                var,
                iterable,
                body,
            },
            l,
            None,
            None,
        )
    }

    pub fn class(&mut self, name: &str, members: Vec<NodeId>, ty: Option<Ty>) -> NodeId {
        let mut l = Layout::default();
        l.push("class ");
        l.push(name);
        l.push(" {");
        for m in &members {
            l.push("\n  ");
            l.node(self, *m);
        }
        l.push("\n}");
        self.alloc(
            NodeKind::Class {
                name: name.to_string(),
                members,
            },
            l,
            ty,
            None,
        )
    }

    /// Lays out the file and produces a validated unit.
    pub fn finish(self, classes: Vec<NodeId>) -> Result<CompilationUnit, TreeError> {
        let mut source = String::new();
        let mut package = None;
        if let Some(name) = &self.package {
            let start = source.len() as u32;
            source.push_str(&format!("package {name};"));
            package = Some(PackageDecl {
                name: name.clone(),
                span: Span::new(start, source.len() as u32),
            });
            source.push_str("\n\n");
        }
        let mut imports = Vec::new();
        for (path, is_static) in &self.imports {
            let start = source.len() as u32;
            if *is_static {
                source.push_str(&format!("import static {path};"));
            } else {
                source.push_str(&format!("import {path};"));
            }
            imports.push(ImportDecl {
                path: path.clone(),
                is_static: *is_static,
                span: Span::new(start, source.len() as u32),
            });
            source.push('\n');
        }
        if !imports.is_empty() {
            source.push('\n');
        }

        let mut spans = vec![Span::default(); self.nodes.len()];
        let mut work: Vec<(NodeId, u32)> = Vec::new();
        for root in &classes {
            work.push((*root, source.len() as u32));
            source.push_str(self.text_of(*root));
            source.push('\n');
        }
        while let Some((id, start)) = work.pop() {
            let Some(p) = self.nodes.get(id.index()) else {
                continue;
            };
            spans[id.index()] = Span::new(start, start + p.text.len() as u32);
            for (child, off) in &p.offsets {
                work.push((*child, start + off));
            }
        }

        let nodes = self
            .nodes
            .into_iter()
            .zip(spans)
            .map(|(p, span)| Node {
                kind: p.kind,
                span,
                ty: p.ty,
                sym: p.sym,
            })
            .collect();

        let unit = CompilationUnit {
            schema_version: SIFT_TREE_SCHEMA_VERSION.to_string(),
            path: self.path,
            source,
            package,
            imports,
            types: self.types,
            symbols: self.symbols,
            nodes,
            classes,
        };
        unit.validate()?;
        Ok(unit)
    }
}

pub fn modifier_text(m: Modifier) -> &'static str {
    match m {
        Modifier::Public => "public",
        Modifier::Protected => "protected",
        Modifier::Private => "private",
        Modifier::Static => "static",
        Modifier::Final => "final",
        Modifier::Abstract => "abstract",
        Modifier::Default => "default",
        Modifier::Synchronized => "synchronized",
        Modifier::Transient => "transient",
        Modifier::Volatile => "volatile",
        Modifier::Native => "native",
    }
}

fn render_literal(lit: &Literal) -> String {
    match lit {
        Literal::String { value } => format!("{value:?}"),
        Literal::Char { value } => match value {
            '\'' => "'\\''".to_string(),
            '\\' => "'\\\\'".to_string(),
            c => format!("'{c}'"),
        },
        Literal::Int { value } => value.to_string(),
        Literal::Long { value } => format!("{value}L"),
        Literal::Float { value } => format!("{value:?}f"),
        Literal::Double { value } => format!("{value:?}"),
        Literal::Bool { value } => value.to_string(),
        Literal::Null => "null".to_string(),
    }
}
