use tracing::debug;

use super::{diagnostic, CheckId};
use crate::diagnostics::Diagnostic;
use crate::matchers::{IsSubtypeOf, Matcher, MethodMatcher};
use crate::state::VisitorState;
use crate::tree::{NodeId, NodeKind};

pub const MESSAGE: &str =
    "Type#toString shouldn't be used for comparison as it is expensive and fragile.";

const COMPILER_TYPE: &str = "com.sun.tools.javac.code.Type";
const BUG_CHECKER: &str = "com.google.errorprone.bugpatterns.BugChecker";

static TYPE_TO_STRING: MethodMatcher = MethodMatcher::instance_method()
    .on_descendant_of(COMPILER_TYPE)
    .named("toString")
    .with_parameters(&[]);

static IN_CHECKER: IsSubtypeOf = IsSubtypeOf(BUG_CHECKER);

static STRING_EQUALS: MethodMatcher = MethodMatcher::instance_method()
    .on_exact_class("java.lang.String")
    .named("equals");

/// `type.toString().equals(..)` inside checker code.
pub fn check_call(call: NodeId, state: &VisitorState<'_>) -> Option<Diagnostic> {
    if !TYPE_TO_STRING.matches(call, state) {
        return None;
    }
    let unit = state.unit;
    let mut ancestors = state.ancestors();
    let select = ancestors.next()?;
    let equals = ancestors.next()?;
    let NodeKind::Call { callee, .. } = unit.kind(equals) else {
        return None;
    };
    if *callee != select || !matches!(unit.kind(select), NodeKind::Select { .. }) {
        return None;
    }
    if !STRING_EQUALS.matches(equals, state) {
        return None;
    }
    if !state
        .enclosing_classes()
        .any(|class| IN_CHECKER.matches(class, state))
    {
        return None;
    }
    debug!(call = call.0, "type toString comparison");
    diagnostic(state, CheckId::TypeToString, call, MESSAGE.to_string())
}
