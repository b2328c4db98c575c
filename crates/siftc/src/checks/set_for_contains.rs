//! Narrow `private static final ImmutableList` constants that are only queried
//! for membership into `ImmutableSet`.
//!
//! A class body is handled in four steps: collect candidate fields, scan the
//! whole body for disqualifying uses, check that the enumerated elements are
//! provably distinct, then rewrite the declared type and the initializer of
//! every surviving field into one compound fix.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, trace};

use super::{diagnostic, CheckId};
use crate::diagnostics::Diagnostic;
use crate::fix::{Fix, FixError};
use crate::matchers::{HasModifiers, IsSameType, Matcher, MethodMatcher};
use crate::state::VisitorState;
use crate::symbols::{SymbolId, SymbolKind};
use crate::tree::walk::{walk, VisitAction};
use crate::tree::{Literal, Modifier, NodeId, NodeKind};

pub const MESSAGE: &str = "ImmutableSet is a more efficient type for private static final constants if the constant is only used for contains, containsAll or isEmpty checks.";

const IMMUTABLE_LIST: &str = "com.google.common.collect.ImmutableList";
const IMMUTABLE_LIST_BUILDER: &str = "com.google.common.collect.ImmutableList.Builder";
const IMMUTABLE_SET: &str = "com.google.common.collect.ImmutableSet";
const TO_IMMUTABLE_SET: &str = "com.google.common.collect.ImmutableSet.toImmutableSet";
const STREAM: &str = "java.util.stream.Stream";

static LIST_TYPE: IsSameType = IsSameType(IMMUTABLE_LIST);

static BUILDER_TYPE: IsSameType = IsSameType(IMMUTABLE_LIST_BUILDER);

static CANDIDATE_MODIFIERS: HasModifiers =
    HasModifiers(&[Modifier::Private, Modifier::Static, Modifier::Final]);

static MEMBERSHIP: MethodMatcher = MethodMatcher::instance_method()
    .on_exact_class(IMMUTABLE_LIST)
    .named_any_of(&["contains", "containsAll", "isEmpty"]);

static ITERATION: MethodMatcher = MethodMatcher::instance_method()
    .on_exact_class(IMMUTABLE_LIST)
    .named_any_of(&["stream", "forEach", "iterator"]);

static LIST_FACTORY: MethodMatcher = MethodMatcher::static_method()
    .on_class(IMMUTABLE_LIST)
    .named_any_of(&["of", "copyOf"]);

static BUILDER_BUILD: MethodMatcher = MethodMatcher::instance_method()
    .on_exact_class(IMMUTABLE_LIST_BUILDER)
    .named("build");

static BUILDER_ADD: MethodMatcher = MethodMatcher::instance_method()
    .on_exact_class(IMMUTABLE_LIST_BUILDER)
    .named("add");

static STREAM_COLLECT: MethodMatcher = MethodMatcher::instance_method()
    .on_exact_class(STREAM)
    .named("collect");

static TO_IMMUTABLE_LIST: MethodMatcher = MethodMatcher::static_method()
    .on_class(IMMUTABLE_LIST)
    .named("toImmutableList");

#[derive(Debug, Clone, Copy)]
struct Candidate {
    sym: SymbolId,
    decl: NodeId,
    var_type: NodeId,
    init: NodeId,
}

/// How a candidate's initializer is rewritten.
#[derive(Debug, Clone, PartialEq, Eq)]
enum InitShape {
    /// `ImmutableList.<T>builder().add(..).build()`; the leading type reference.
    Builder { root: NodeId },
    /// `ImmutableList.of(..)` / `ImmutableList.copyOf(..)`; the receiver.
    Factory { owner: NodeId, is_of: bool },
    /// `stream.collect(toImmutableList())`; the collector argument.
    Pipeline { collector: NodeId },
    Opaque,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum ElementKey {
    Str(String),
    Char(char),
    Int(i64),
    Long(i64),
    Float(u32),
    Double(u64),
    Bool(bool),
    EnumConstant(SymbolId),
}

pub fn check_class(class: NodeId, state: &VisitorState<'_>) -> Result<Option<Diagnostic>, FixError> {
    let candidates = collect_candidates(class, state);
    if candidates.is_empty() {
        return Ok(None);
    }
    let (used, iterated) = scan_usages(class, &candidates, state);

    let mut fix = Fix::new();
    let mut anchor = None;
    for c in &candidates {
        if used.get(&c.sym).copied().unwrap_or(true) {
            debug!(field = c.sym.0, "field escapes membership-only use");
            continue;
        }
        let (shape, elements) = classify(c.init, state);
        if !provably_distinct(&elements, state) {
            debug!(field = c.sym.0, "initializer elements are not provably distinct");
            continue;
        }
        if iterated.contains(&c.sym) {
            let iteration_safe = matches!(shape, InitShape::Factory { is_of: true, .. })
                && !elements.is_empty();
            if !iteration_safe {
                debug!(field = c.sym.0, "iterated field without a direct of(...) initializer");
                continue;
            }
        }
        fix.merge(field_fix(c, &shape, state)?)?;
        anchor.get_or_insert(c.decl);
    }

    let Some(anchor) = anchor else {
        return Ok(None);
    };
    let Some(mut d) = diagnostic(state, CheckId::ImmutableSetForContains, anchor, MESSAGE.to_string())
    else {
        return Ok(None);
    };
    d.quickfix = Some(fix.into_quickfix(Some("Use ImmutableSet".to_string())));
    Ok(Some(d))
}

fn collect_candidates(class: NodeId, state: &VisitorState<'_>) -> Vec<Candidate> {
    let unit = state.unit;
    let NodeKind::Class { members, .. } = unit.kind(class) else {
        return Vec::new();
    };
    let mut out = Vec::new();
    for member in members {
        let NodeKind::Variable {
            annotations,
            var_type,
            init,
            ..
        } = unit.kind(*member)
        else {
            continue;
        };
        if !CANDIDATE_MODIFIERS.matches(*member, state) {
            continue;
        }
        let typed = if state.ty(*var_type).is_some() {
            *var_type
        } else {
            *member
        };
        if !LIST_TYPE.matches(typed, state) {
            continue;
        }
        if let Some(excluded) = annotations
            .iter()
            .find(|a| state.options.is_excluded_annotation(a))
        {
            trace!(field = member.0, annotation = %excluded, "excluded by annotation");
            continue;
        }
        let (Some(sym), Some(init)) = (unit.symbol_id(*member), *init) else {
            continue;
        };
        out.push(Candidate {
            sym,
            decl: *member,
            var_type: *var_type,
            init,
        });
    }
    out
}

/// Usage flags (`true` once a field escapes) and the set of iterated fields.
fn scan_usages(
    class: NodeId,
    candidates: &[Candidate],
    state: &VisitorState<'_>,
) -> (BTreeMap<SymbolId, bool>, BTreeSet<SymbolId>) {
    let unit = state.unit;
    let mut used: BTreeMap<SymbolId, bool> = candidates.iter().map(|c| (c.sym, false)).collect();
    let mut iterated = BTreeSet::new();
    // Receiver identifiers of accepted iteration uses; they do not disqualify.
    let mut iteration_sources: BTreeSet<NodeId> = BTreeSet::new();
    let distinct_iteration = state.options.allow_distinct_iteration;

    let candidate_ident = |node: NodeId| -> Option<SymbolId> {
        match unit.kind(node) {
            NodeKind::Ident { .. } => unit.symbol_id(node).filter(|s| used.contains_key(s)),
            _ => None,
        }
    };
    let is_candidate = |sym: SymbolId| candidates.iter().any(|c| c.sym == sym);

    let mut flips: Vec<SymbolId> = Vec::new();
    walk(unit, class, |id, path| {
        let st = state.at(path);
        match unit.kind(id) {
            NodeKind::Call { .. } => {
                let receiver = unit.receiver(id).and_then(candidate_ident);
                if receiver.is_some() && MEMBERSHIP.matches(id, &st) {
                    return VisitAction::SkipSubtree;
                }
                if distinct_iteration && ITERATION.matches(id, &st) {
                    if let (Some(sym), Some(recv)) = (receiver, unit.receiver(id)) {
                        iterated.insert(sym);
                        iteration_sources.insert(recv);
                    }
                }
            }
            NodeKind::ForEach { iterable, .. } if distinct_iteration => {
                if let Some(sym) = candidate_ident(*iterable) {
                    iterated.insert(sym);
                    iteration_sources.insert(*iterable);
                }
            }
            NodeKind::Ident { .. } | NodeKind::Select { .. } => {
                if iteration_sources.contains(&id) {
                    return VisitAction::Descend;
                }
                if let Some(sym) = unit.symbol_id(id).filter(|s| is_candidate(*s)) {
                    trace!(node = id.0, field = sym.0, "disqualifying reference");
                    flips.push(sym);
                }
            }
            _ => {}
        }
        VisitAction::Descend
    });
    for sym in flips {
        used.insert(sym, true);
    }
    (used, iterated)
}

/// Shape of an initializer plus the elements it enumerates literally.
fn classify(init: NodeId, state: &VisitorState<'_>) -> (InitShape, Vec<NodeId>) {
    let unit = state.unit;

    if BUILDER_BUILD.matches(init, state) {
        let mut elements = Vec::new();
        let mut cur = unit.receiver(init);
        while let Some(node) = cur {
            if !BUILDER_TYPE.matches(node, state) {
                break;
            }
            if BUILDER_ADD.matches(node, state) {
                elements.extend_from_slice(unit.call_args(node));
            }
            cur = unit.receiver(node);
        }
        let root = cur.filter(|node| {
            matches!(
                unit.kind(*node),
                NodeKind::Ident { .. } | NodeKind::Select { .. } | NodeKind::TypeName { .. }
            ) && LIST_TYPE.matches(*node, state)
        });
        return match root {
            Some(root) => (InitShape::Builder { root }, elements),
            None => (InitShape::Opaque, elements),
        };
    }

    if LIST_FACTORY.matches(init, state) {
        let is_of = state.symbol(init).is_some_and(|s| s.name == "of");
        let elements = if is_of {
            unit.call_args(init).to_vec()
        } else {
            Vec::new()
        };
        return match unit.receiver(init) {
            Some(owner) => (InitShape::Factory { owner, is_of }, elements),
            None => (InitShape::Opaque, elements),
        };
    }

    if STREAM_COLLECT.matches(init, state) {
        if let [collector] = unit.call_args(init) {
            if TO_IMMUTABLE_LIST.matches(*collector, state) {
                return (
                    InitShape::Pipeline {
                        collector: *collector,
                    },
                    Vec::new(),
                );
            }
        }
    }

    (InitShape::Opaque, Vec::new())
}

fn element_key(node: NodeId, state: &VisitorState<'_>) -> Option<ElementKey> {
    let unit = state.unit;
    match unit.kind(node) {
        NodeKind::Literal { lit } => match lit {
            Literal::String { value } => Some(ElementKey::Str(value.clone())),
            Literal::Char { value } => Some(ElementKey::Char(*value)),
            Literal::Int { value } => Some(ElementKey::Int(*value)),
            Literal::Long { value } => Some(ElementKey::Long(*value)),
            Literal::Float { value } => Some(ElementKey::Float(if value.is_nan() {
                f32::NAN.to_bits()
            } else {
                value.to_bits()
            })),
            Literal::Double { value } => Some(ElementKey::Double(if value.is_nan() {
                f64::NAN.to_bits()
            } else {
                value.to_bits()
            })),
            Literal::Bool { value } => Some(ElementKey::Bool(*value)),
            Literal::Null => None,
        },
        NodeKind::Ident { .. } | NodeKind::Select { .. } => {
            let sym = unit.symbol_id(node)?;
            let symbol = unit.symbols.get(sym)?;
            (symbol.kind == SymbolKind::EnumConstant).then_some(ElementKey::EnumConstant(sym))
        }
        _ => None,
    }
}

fn provably_distinct(elements: &[NodeId], state: &VisitorState<'_>) -> bool {
    let mut seen = BTreeSet::new();
    for e in elements {
        let Some(key) = element_key(*e, state) else {
            return false;
        };
        if !seen.insert(key) {
            return false;
        }
    }
    true
}

fn field_fix(c: &Candidate, shape: &InitShape, state: &VisitorState<'_>) -> Result<Fix, FixError> {
    let unit = state.unit;
    let mut fix = Fix::new();
    let type_ref = match unit.kind(c.var_type) {
        NodeKind::TypeApply { base, .. } => *base,
        _ => c.var_type,
    };
    fix.replace_node(unit, type_ref, "ImmutableSet")?;
    match shape {
        InitShape::Builder { root } => fix.replace_node(unit, *root, "ImmutableSet")?,
        InitShape::Factory { owner, .. } => fix.replace_node(unit, *owner, "ImmutableSet")?,
        InitShape::Pipeline { collector } => {
            fix.replace_node(unit, *collector, "toImmutableSet()")?;
            fix.add_static_import(TO_IMMUTABLE_SET);
        }
        InitShape::Opaque => {
            let original = unit.source_for(c.init);
            fix.replace_node(unit, c.init, format!("ImmutableSet.copyOf({original})"))?;
        }
    }
    fix.add_import(IMMUTABLE_SET);
    Ok(fix)
}
