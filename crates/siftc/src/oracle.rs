//! Structural type-compatibility queries for equality checks.
//!
//! Two static types are compatible when some value of the one could be `equals`
//! to some value of the other. Anything the oracle cannot reason about
//! (error types, type variables, wildcards) is compatible.

use std::collections::BTreeSet;

use crate::types::{Ty, TypeId, TypeTable, OBJECT};

const ARRAY_SUPERTYPES: &[&str] = &[OBJECT, "java.lang.Cloneable", "java.io.Serializable"];

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Compatibility {
    Compatible,
    /// The innermost conflicting pair; equal to the queried pair unless the
    /// conflict sits in a generic argument.
    Incompatible { lhs: Ty, rhs: Ty },
}

impl Compatibility {
    pub fn is_compatible(&self) -> bool {
        matches!(self, Compatibility::Compatible)
    }
}

pub trait CompatibilityOracle: Send + Sync {
    fn compatibility(&self, types: &TypeTable, lhs: &Ty, rhs: &Ty) -> Compatibility;
}

/// Decides compatibility from the type table alone: subtyping, castability,
/// shared `equals` overrides and generic arguments.
#[derive(Clone, Copy, Debug, Default)]
pub struct StructuralOracle;

impl CompatibilityOracle for StructuralOracle {
    fn compatibility(&self, types: &TypeTable, lhs: &Ty, rhs: &Ty) -> Compatibility {
        let mut seen = BTreeSet::new();
        check(types, lhs, rhs, &mut seen)
    }
}

fn incompatible(lhs: &Ty, rhs: &Ty) -> Compatibility {
    Compatibility::Incompatible {
        lhs: lhs.clone(),
        rhs: rhs.clone(),
    }
}

fn check(
    types: &TypeTable,
    lhs: &Ty,
    rhs: &Ty,
    seen: &mut BTreeSet<(Ty, Ty)>,
) -> Compatibility {
    if is_opaque(lhs) || is_opaque(rhs) {
        return Compatibility::Compatible;
    }
    let (Some(lhs), Some(rhs)) = (boxed(types, lhs), boxed(types, rhs)) else {
        return Compatibility::Compatible;
    };
    // Recursive generic bounds (`Enum<E extends Enum<E>>`) would otherwise loop.
    if !seen.insert((lhs.clone(), rhs.clone())) {
        return Compatibility::Compatible;
    }
    match (&lhs, &rhs) {
        (Ty::Array { elem: a }, Ty::Array { elem: b }) => match (a.as_ref(), b.as_ref()) {
            (Ty::Prim { prim: pa }, Ty::Prim { prim: pb }) => {
                if pa == pb {
                    Compatibility::Compatible
                } else {
                    incompatible(&lhs, &rhs)
                }
            }
            (Ty::Prim { .. }, _) | (_, Ty::Prim { .. }) => {
                if is_opaque(a) || is_opaque(b) {
                    Compatibility::Compatible
                } else {
                    incompatible(&lhs, &rhs)
                }
            }
            (a, b) => match check(types, a, b, seen) {
                Compatibility::Compatible => Compatibility::Compatible,
                Compatibility::Incompatible { .. } => incompatible(&lhs, &rhs),
            },
        },
        (Ty::Array { .. }, Ty::Class { .. }) => array_vs_class(types, &lhs, &rhs, &rhs),
        (Ty::Class { .. }, Ty::Array { .. }) => array_vs_class(types, &lhs, &rhs, &lhs),
        (Ty::Class { decl: a, .. }, Ty::Class { decl: b, .. }) => {
            class_pair(types, &lhs, *a, &rhs, *b, seen)
        }
        _ => Compatibility::Compatible,
    }
}

fn is_opaque(ty: &Ty) -> bool {
    ty.is_unreliable() || matches!(ty, Ty::Null | Ty::Void)
}

/// Primitives compare through their wrapper; `None` when the wrapper is unknown.
fn boxed(types: &TypeTable, ty: &Ty) -> Option<Ty> {
    match ty {
        Ty::Prim { prim } => types.boxed(*prim),
        other => Some(other.clone()),
    }
}

fn array_vs_class(types: &TypeTable, lhs: &Ty, rhs: &Ty, class: &Ty) -> Compatibility {
    if ARRAY_SUPERTYPES.iter().any(|name| types.is_named(class, name)) {
        Compatibility::Compatible
    } else {
        incompatible(lhs, rhs)
    }
}

fn class_pair(
    types: &TypeTable,
    lhs: &Ty,
    a: TypeId,
    rhs: &Ty,
    b: TypeId,
    seen: &mut BTreeSet<(Ty, Ty)>,
) -> Compatibility {
    if types.is_subtype_decl(a, b) {
        return match types.as_super(lhs, b) {
            Some(up) => generic_args(types, &up, rhs, seen),
            None => Compatibility::Compatible,
        };
    }
    if types.is_subtype_decl(b, a) {
        return match types.as_super(rhs, a) {
            Some(up) => generic_args(types, lhs, &up, seen),
            None => Compatibility::Compatible,
        };
    }
    let (Some(da), Some(db)) = (types.get(a), types.get(b)) else {
        return Compatibility::Compatible;
    };
    let castable = match (da.is_interface(), db.is_interface()) {
        (true, true) => true,
        (true, false) => !db.is_effectively_final(),
        (false, true) => !da.is_effectively_final(),
        (false, false) => false,
    };
    if castable {
        return Compatibility::Compatible;
    }
    let object = types.lookup(OBJECT);
    let ours = types.supertype_closure(a);
    let shared_equals = types
        .supertype_closure(b)
        .intersection(&ours)
        .filter(|id| Some(**id) != object)
        .filter_map(|id| types.get(*id))
        .any(|d| d.overrides_equals);
    if shared_equals {
        Compatibility::Compatible
    } else {
        incompatible(lhs, rhs)
    }
}

/// Same erasure on both sides: the pair conflicts iff some generic argument
/// pair does. Raw types never conflict.
fn generic_args(
    types: &TypeTable,
    lhs: &Ty,
    rhs: &Ty,
    seen: &mut BTreeSet<(Ty, Ty)>,
) -> Compatibility {
    let (la, ra) = (lhs.args(), rhs.args());
    if la.is_empty() || ra.is_empty() || la.len() != ra.len() {
        return Compatibility::Compatible;
    }
    for (x, y) in la.iter().zip(ra) {
        if let found @ Compatibility::Incompatible { .. } = check(types, x, y, seen) {
            return found;
        }
    }
    Compatibility::Compatible
}
