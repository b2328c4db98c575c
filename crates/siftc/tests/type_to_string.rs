use siftc::checks::type_to_string::MESSAGE;
use siftc::diagnostics::Severity;
use siftc::tree::{CompilationUnit, NodeId};
use siftc::types::Ty;

mod support;

use support::{codes, lint_default, Jdk};

/// `class <name> { void m(Type t, String s) { <stmt> } }`
fn unit_with(
    checker: bool,
    body: impl FnOnce(&mut Jdk, NodeId, NodeId) -> NodeId,
) -> CompilationUnit {
    let mut j = Jdk::new("MyChecker.java");
    let type_ty = Ty::raw(j.t.javac_type);
    let (pt, st) = j.param("Type", type_ty, "t");
    let string = j.string();
    let (ps, ss) = j.param("String", string, "s");
    let t = j.var_ref("t", st);
    let s = j.var_ref("s", ss);
    let expr = body(&mut j, t, s);
    let stmt = j.b.expr_stmt(expr);
    let m = j.void_method("m", vec![pt, ps], vec![stmt]);
    let supertypes = if checker {
        vec![Ty::raw(j.t.bug_checker)]
    } else {
        vec![]
    };
    let class_ty = j.declare_class("com.example.MyChecker", supertypes);
    let class = j.class("MyChecker", class_ty, vec![m]);
    j.finish(vec![class])
}

fn to_string(j: &mut Jdk, t: NodeId) -> NodeId {
    let ty = j.string();
    let sym = j.m.to_string;
    j.invoke(t, "toString", vec![], Some(ty), sym)
}

fn equals(j: &mut Jdk, recv: NodeId, arg: NodeId) -> NodeId {
    let ty = j.boolean();
    let sym = j.m.equals;
    j.invoke(recv, "equals", vec![arg], Some(ty), sym)
}

#[test]
fn comparing_type_strings_in_a_checker_is_flagged() {
    let unit = unit_with(true, |j, t, s| {
        let text = to_string(j, t);
        equals(j, text, s)
    });
    let report = lint_default(&unit);
    assert_eq!(codes(&report), vec!["SIFT-TOSTR-0001"]);
    let d = &report.diagnostics[0];
    assert_eq!(d.message, MESSAGE);
    assert_eq!(d.severity, Severity::Hint);
    let at = d.loc.as_ref().and_then(|l| l.offset()).expect("offset");
    let start = at as usize;
    assert!(unit.source[start..].starts_with("t.toString()"));
}

#[test]
fn outside_checker_classes_it_is_allowed() {
    let unit = unit_with(false, |j, t, s| {
        let text = to_string(j, t);
        equals(j, text, s)
    });
    assert!(lint_default(&unit).diagnostics.is_empty());
}

#[test]
fn type_string_as_the_argument_is_not_flagged() {
    let unit = unit_with(true, |j, t, s| {
        let text = to_string(j, t);
        equals(j, s, text)
    });
    assert!(lint_default(&unit).diagnostics.is_empty());
}

#[test]
fn plain_to_string_is_not_flagged() {
    let unit = unit_with(true, |j, t, _| to_string(j, t));
    assert!(lint_default(&unit).diagnostics.is_empty());
}
