//! Predicates over tree nodes.
//!
//! Method matchers are plain values built with `const fn`s so they can live in
//! `static`s; combinators box their parts and are built once behind a
//! `LazyLock`.

use crate::state::VisitorState;
use crate::symbols::SymbolKind;
use crate::tree::{Modifier, NodeId, NodeKind};
use crate::types::Ty;

pub trait Matcher: Send + Sync {
    fn matches(&self, node: NodeId, state: &VisitorState<'_>) -> bool;
}

pub type BoxMatcher = Box<dyn Matcher>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dispatch {
    Instance,
    Static,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Owner {
    Any,
    Exact(&'static str),
    DescendantOf(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Names {
    Any,
    One(&'static str),
    AnyOf(&'static [&'static str]),
}

/// Matches call nodes by the resolved method symbol.
///
/// For instance methods the owner test looks at the receiver's static type
/// (the enclosing class for calls without a receiver); for static methods it
/// looks at the declaring type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodMatcher {
    dispatch: Dispatch,
    owner: Owner,
    names: Names,
    params: Option<&'static [&'static str]>,
}

impl MethodMatcher {
    pub const fn instance_method() -> Self {
        Self {
            dispatch: Dispatch::Instance,
            owner: Owner::Any,
            names: Names::Any,
            params: None,
        }
    }

    pub const fn static_method() -> Self {
        Self {
            dispatch: Dispatch::Static,
            owner: Owner::Any,
            names: Names::Any,
            params: None,
        }
    }

    pub const fn any_class(mut self) -> Self {
        self.owner = Owner::Any;
        self
    }

    pub const fn on_exact_class(mut self, name: &'static str) -> Self {
        self.owner = Owner::Exact(name);
        self
    }

    /// Alias of [`MethodMatcher::on_exact_class`] for static methods.
    pub const fn on_class(self, name: &'static str) -> Self {
        self.on_exact_class(name)
    }

    pub const fn on_descendant_of(mut self, name: &'static str) -> Self {
        self.owner = Owner::DescendantOf(name);
        self
    }

    pub const fn named(mut self, name: &'static str) -> Self {
        self.names = Names::One(name);
        self
    }

    pub const fn named_any_of(mut self, names: &'static [&'static str]) -> Self {
        self.names = Names::AnyOf(names);
        self
    }

    /// Exact parameter list, by qualified erasure name.
    pub const fn with_parameters(mut self, params: &'static [&'static str]) -> Self {
        self.params = Some(params);
        self
    }

    fn name_ok(&self, name: &str) -> bool {
        match self.names {
            Names::Any => true,
            Names::One(n) => n == name,
            Names::AnyOf(ns) => ns.contains(&name),
        }
    }

    fn owner_ty<'s>(&self, call: NodeId, state: &VisitorState<'s>) -> Option<Ty> {
        let sym = state.symbol(call)?;
        match self.dispatch {
            Dispatch::Static => sym.owner.map(Ty::raw),
            Dispatch::Instance => match state.unit.receiver(call) {
                Some(recv) => state.ty(recv).cloned(),
                None => state.enclosing_class_type().cloned(),
            },
        }
    }
}

impl Matcher for MethodMatcher {
    fn matches(&self, node: NodeId, state: &VisitorState<'_>) -> bool {
        if !matches!(state.unit.kind(node), NodeKind::Call { .. }) {
            return false;
        }
        let Some(sym) = state.symbol(node) else {
            return false;
        };
        if sym.kind != SymbolKind::Method {
            return false;
        }
        if sym.is_static != (self.dispatch == Dispatch::Static) || !self.name_ok(&sym.name) {
            return false;
        }
        let types = state.types();
        if let Some(params) = self.params {
            if sym.params.len() != params.len() {
                return false;
            }
            let same = sym
                .params
                .iter()
                .zip(params)
                .all(|(have, want)| types.erasure_name(have) == Some(*want));
            if !same {
                return false;
            }
        }
        match self.owner {
            Owner::Any => true,
            Owner::Exact(name) => self
                .owner_ty(node, state)
                .is_some_and(|ty| types.is_named(&ty, name)),
            Owner::DescendantOf(name) => self
                .owner_ty(node, state)
                .is_some_and(|ty| types.is_subtype_of_name(&ty, name)),
        }
    }
}

/// Static type of the node has exactly the given erasure.
#[derive(Debug, Clone, Copy)]
pub struct IsSameType(pub &'static str);

impl Matcher for IsSameType {
    fn matches(&self, node: NodeId, state: &VisitorState<'_>) -> bool {
        state
            .ty(node)
            .is_some_and(|ty| state.types().is_named(ty, self.0))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct IsSubtypeOf(pub &'static str);

impl Matcher for IsSubtypeOf {
    fn matches(&self, node: NodeId, state: &VisitorState<'_>) -> bool {
        state
            .ty(node)
            .is_some_and(|ty| state.types().is_subtype_of_name(ty, self.0))
    }
}

/// Declaration carries every listed modifier.
#[derive(Debug, Clone, Copy)]
pub struct HasModifiers(pub &'static [Modifier]);

impl Matcher for HasModifiers {
    fn matches(&self, node: NodeId, state: &VisitorState<'_>) -> bool {
        let modifiers = match state.unit.kind(node) {
            NodeKind::Variable { modifiers, .. } | NodeKind::Method { modifiers, .. } => modifiers,
            _ => return false,
        };
        self.0.iter().all(|m| modifiers.contains(m))
    }
}

pub struct AllOf(pub Vec<BoxMatcher>);
pub struct AnyOf(pub Vec<BoxMatcher>);
pub struct Not(pub BoxMatcher);

impl Matcher for AllOf {
    fn matches(&self, node: NodeId, state: &VisitorState<'_>) -> bool {
        self.0.iter().all(|m| m.matches(node, state))
    }
}

impl Matcher for AnyOf {
    fn matches(&self, node: NodeId, state: &VisitorState<'_>) -> bool {
        self.0.iter().any(|m| m.matches(node, state))
    }
}

impl Matcher for Not {
    fn matches(&self, node: NodeId, state: &VisitorState<'_>) -> bool {
        !self.0.matches(node, state)
    }
}

pub fn all_of(ms: impl IntoIterator<Item = BoxMatcher>) -> AllOf {
    AllOf(ms.into_iter().collect())
}

pub fn any_of(ms: impl IntoIterator<Item = BoxMatcher>) -> AnyOf {
    AnyOf(ms.into_iter().collect())
}

pub fn not(m: impl Matcher + 'static) -> Not {
    Not(Box::new(m))
}
