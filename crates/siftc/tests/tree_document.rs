use serde_json::{json, Value};
use siftc::tree::{parse_tree_json, NodeKind, TreeError};

mod support;

use support::{lint_default, Jdk};

fn minimal() -> Value {
    json!({
        "schema_version": "sift.tree@0.1.0",
        "path": "A.java",
        "source": "class A {}\n",
        "types": [{ "name": "com.example.A", "kind": "class" }],
        "nodes": [{
            "kind": "class",
            "name": "A",
            "members": [],
            "span": { "start": 0, "end": 10 },
            "ty": { "kind": "class", "decl": 0 }
        }],
        "classes": [0]
    })
}

fn parse(doc: &Value) -> Result<siftc::tree::CompilationUnit, TreeError> {
    parse_tree_json(&serde_json::to_vec(doc).expect("encode"))
}

#[test]
fn minimal_document_parses() {
    let unit = parse(&minimal()).expect("parse");
    assert_eq!(unit.path, "A.java");
    assert_eq!(unit.classes.len(), 1);
    assert!(matches!(unit.kind(unit.classes[0]), NodeKind::Class { name, .. } if name == "A"));
    assert_eq!(unit.source_for(unit.classes[0]), "class A {}");
    assert!(lint_default(&unit).diagnostics.is_empty());
}

#[test]
fn unsupported_schema_version_is_rejected() {
    let mut doc = minimal();
    doc["schema_version"] = json!("sift.tree@9.0.0");
    assert!(matches!(
        parse(&doc),
        Err(TreeError::UnsupportedSchemaVersion { .. })
    ));
}

#[test]
fn dangling_and_shared_nodes_are_rejected() {
    let mut doc = minimal();
    doc["nodes"][0]["members"] = json!([7]);
    assert!(matches!(
        parse(&doc),
        Err(TreeError::DanglingNode { to: 7, .. })
    ));

    let mut doc = minimal();
    doc["source"] = json!("class A { x }\n");
    doc["nodes"][0]["span"] = json!({ "start": 0, "end": 13 });
    doc["nodes"][0]["members"] = json!([1, 1]);
    doc["nodes"]
        .as_array_mut()
        .expect("nodes")
        .push(json!({ "kind": "ident", "name": "x", "span": { "start": 10, "end": 11 } }));
    assert!(matches!(parse(&doc), Err(TreeError::SharedNode(1))));
}

#[test]
fn spans_must_stay_inside_the_source() {
    let mut doc = minimal();
    doc["nodes"][0]["span"] = json!({ "start": 0, "end": 64 });
    assert!(matches!(parse(&doc), Err(TreeError::BadSpan { end: 64, .. })));
}

#[test]
fn missing_type_and_symbol_references_are_rejected() {
    let mut doc = minimal();
    doc["nodes"][0]["ty"] = json!({ "kind": "class", "decl": 3 });
    assert!(matches!(
        parse(&doc),
        Err(TreeError::DanglingType { ty: 3, .. })
    ));

    let mut doc = minimal();
    doc["nodes"][0]["sym"] = json!(0);
    assert!(matches!(
        parse(&doc),
        Err(TreeError::DanglingSymbol { node: 0, sym: 0 })
    ));
}

#[test]
fn malformed_json_is_a_decode_error() {
    let err = parse_tree_json(b"{\"schema_version\": ").expect_err("truncated");
    assert!(matches!(err, TreeError::Json(_)));
}

#[test]
fn built_units_survive_a_json_round_trip() {
    let mut j = Jdk::new("Test.java");
    j.b.package("com.example");
    j.b.import("com.google.common.collect.ImmutableList");
    let a = j.str_lit("a");
    let init = j.list_of(vec![a]);
    let (field, sym) = j.list_field(&[], "NAMES", init);
    let string = j.string();
    let (p, s) = j.param("String", string, "s");
    let arg = j.var_ref("s", s);
    let stmt = j.contains_stmt("NAMES", sym, arg);
    let m = j.void_method("m", vec![p], vec![stmt]);
    let test = j.declare_class("com.example.Test", vec![]);
    let class = j.class("Test", test, vec![field, m]);
    let unit = j.finish(vec![class]);

    let bytes = serde_json::to_vec(&unit).expect("encode");
    let back = parse_tree_json(&bytes).expect("decode");
    assert_eq!(back, unit);
    assert_eq!(lint_default(&back), lint_default(&unit));
}
