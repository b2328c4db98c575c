//! Equality calls between operands whose static types can never be equal.

use std::sync::LazyLock;

use tracing::{debug, trace};

use super::{diagnostic, CheckId};
use crate::diagnostics::Diagnostic;
use crate::matchers::{any_of, AnyOf, BoxMatcher, Matcher, MethodMatcher};
use crate::oracle::Compatibility;
use crate::state::VisitorState;
use crate::tree::NodeId;
use crate::types::{Ty, TypeTable, OBJECT};

static INSTANCE_EQUALS: MethodMatcher = MethodMatcher::instance_method()
    .any_class()
    .named("equals")
    .with_parameters(&[OBJECT]);

static STATIC_EQUALS: LazyLock<AnyOf> = LazyLock::new(|| {
    any_of([
        Box::new(
            MethodMatcher::static_method()
                .on_class("java.util.Objects")
                .named("equals")
                .with_parameters(&[OBJECT, OBJECT]),
        ) as BoxMatcher,
        Box::new(
            MethodMatcher::static_method()
                .on_class("com.google.common.base.Objects")
                .named("equal")
                .with_parameters(&[OBJECT, OBJECT]),
        ),
        Box::new(
            MethodMatcher::static_method()
                .on_class("androidx.core.util.ObjectsCompat")
                .named("equals")
                .with_parameters(&[OBJECT, OBJECT]),
        ),
    ])
});

static ASSERT_FALSE: LazyLock<AnyOf> = LazyLock::new(|| {
    any_of([
        Box::new(MethodMatcher::instance_method().named("assertFalse")) as BoxMatcher,
        Box::new(MethodMatcher::static_method().named("assertFalse")),
    ])
});

pub fn check_call(call: NodeId, state: &VisitorState<'_>) -> Option<Diagnostic> {
    let unit = state.unit;
    let args = unit.call_args(call);
    let (lhs, rhs) = if INSTANCE_EQUALS.matches(call, state) {
        let receiver = match unit.receiver(call) {
            Some(recv) => state.ty(recv),
            None => state.enclosing_class_type(),
        }?;
        (receiver, state.ty(*args.first()?)?)
    } else if STATIC_EQUALS.matches(call, state) {
        let [a, b, ..] = args else {
            return None;
        };
        (state.ty(*a)?, state.ty(*b)?)
    } else {
        return None;
    };

    let types = state.types();
    let Compatibility::Incompatible {
        lhs: inner_lhs,
        rhs: inner_rhs,
    } = state.oracle.compatibility(types, lhs, rhs)
    else {
        return None;
    };

    if let Some(parent) = state.parent() {
        if ASSERT_FALSE.matches(parent, state) {
            trace!(call = call.0, "equality inside assertFalse");
            return None;
        }
    }

    let operation = state
        .symbol(call)
        .map(|s| s.name.as_str())
        .unwrap_or("equals");
    let (r, a) = render_pair(types, lhs, rhs);
    let mut message = format!("Calling {operation} on incompatible types {r} and {a}");
    let nested =
        types.pretty(lhs) != types.pretty(&inner_lhs) || types.pretty(rhs) != types.pretty(&inner_rhs);
    if nested {
        let (ri, ai) = render_pair(types, &inner_lhs, &inner_rhs);
        message.push_str(&format!(
            ". They are incompatible because {ri} and {ai} are incompatible."
        ));
    }
    debug!(call = call.0, %message, "incompatible equality");

    let mut d = diagnostic(state, CheckId::EqualsIncompatibleType, call, message)?;
    d.data.insert("receiver_type".to_string(), types.qualified(lhs).into());
    d.data.insert("argument_type".to_string(), types.qualified(rhs).into());
    Some(d)
}

/// Simple-name renderings, or qualified ones when the simple names collide.
fn render_pair(types: &TypeTable, lhs: &Ty, rhs: &Ty) -> (String, String) {
    let (l, r) = (types.pretty(lhs), types.pretty(rhs));
    if l == r {
        (types.qualified(lhs), types.qualified(rhs))
    } else {
        (l, r)
    }
}
