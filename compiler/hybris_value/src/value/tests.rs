use std::sync::Arc;

use hybris_ir::{FunctionDecl, Node, NodeKind, Params, Span};
use pretty_assertions::assert_eq;

use super::*;
use crate::Heap;

#[test]
fn kind_names() {
    assert_eq!(Value::Integer(1).kind().name(), "int");
    assert_eq!(Value::Boolean(true).kind().to_string(), "boolean");
    assert_eq!(Value::Map(MapValue::new()).type_name(), "map");
}

#[test]
fn user_types_report_declared_name() {
    let s = Value::Struct(StructValue {
        name: "Point".into(),
        attributes: Vec::new(),
    });
    assert_eq!(s.kind(), Kind::Struct);
    assert_eq!(s.type_name(), "Point");
}

#[test]
fn floats_always_show_fraction() {
    assert_eq!(format_float(1.0), "1.0");
    assert_eq!(format_float(-2.5), "-2.5");
    assert_eq!(format_float(f64::INFINITY), "inf");
}

#[test]
fn top_level_strings_are_unquoted() {
    assert_eq!(Value::String("hi".into()).to_string(), "hi");
    assert_eq!(Value::Char('x').to_string(), "x");
    assert_eq!(Value::String("hi".into()).nested_display(), "\"hi\"");
}

#[test]
fn collection_display() {
    let heap = Heap::new();
    let v = Value::Vector(vec![
        heap.alloc(Value::Integer(1)),
        heap.alloc(Value::String("a".into())),
        heap.alloc(Value::Char('c')),
    ]);
    assert_eq!(v.to_string(), "[1, \"a\", 'c']");
    assert_eq!(Value::Map(MapValue::new()).to_string(), "[:]");
    assert_eq!(Value::Binary(vec![1, 255]).to_string(), "binary(01 ff)");
}

#[test]
fn struct_and_class_display() {
    let heap = Heap::new();
    let s = Value::Struct(StructValue {
        name: "P".into(),
        attributes: vec![Attribute::public("x", heap.alloc(Value::Integer(1)))],
    });
    assert_eq!(s.to_string(), "P { x: 1 }");

    let c = Value::Class(ClassValue {
        name: "Dog".into(),
        attributes: Vec::new(),
        methods: Arc::new(MethodTable::new()),
        expiry: None,
    });
    assert_eq!(c.to_string(), "<Dog>");
}

#[test]
fn alias_display() {
    let decl = FunctionDecl {
        name: "f".into(),
        params: Params::default(),
        body: Node::new(NodeKind::Block(Vec::new()), Span::DUMMY),
        span: Span::DUMMY,
    };
    assert_eq!(Value::Alias(Arc::new(decl)).to_string(), "<function f>");
}

#[test]
fn self_containing_vector_display_terminates() {
    let heap = Heap::new();
    let v = heap.alloc(Value::Vector(Vec::new()));
    if let Value::Vector(items) = &mut *v.write() {
        items.push(v.clone());
    }
    let shown = v.read().to_string();
    assert!(shown.starts_with("[["));
    assert!(shown.contains("..."));
    v.write().take_children();
}

#[test]
fn children_are_visited() {
    let heap = Heap::new();
    let mut map = MapValue::new();
    map.push(heap.alloc(Value::Integer(1)), heap.alloc(Value::Integer(2)));
    let value = Value::Map(map);

    let mut seen = 0;
    value.for_each_child(|_| seen += 1);
    assert_eq!(seen, 2);
}

#[test]
fn method_lookup_by_arity() {
    use hybris_ir::{Access, MethodDecl};

    let method = |params: &[&str], variadic: bool| {
        Arc::new(MethodDecl {
            name: "m".into(),
            params: Params {
                names: params.iter().map(|p| (*p).to_string()).collect(),
                variadic,
            },
            access: Access::Public,
            is_static: false,
            body: Node::new(NodeKind::Block(Vec::new()), Span::DUMMY),
            span: Span::DUMMY,
        })
    };
    let mut table = MethodTable::new();
    table.insert(method(&["a"], false));
    table.insert(method(&["a", "b"], false));
    table.insert(method(&[], true));

    let arity = |argc| table.lookup("m", argc).map(|m| m.params.names.len());
    assert_eq!(arity(2), Some(2));
    assert_eq!(arity(1), Some(1));
    assert_eq!(arity(5), Some(0));
    assert_eq!(table.lookup("missing", 0).map(|m| m.name.clone()), None);
}
