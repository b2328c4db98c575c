#![allow(dead_code)]

//! A small JDK + Guava type environment for building test units.

use siftc::config::LintOptions;
use siftc::diagnostics::Report;
use siftc::lint;
use siftc::symbols::{Symbol, SymbolId, SymbolKind};
use siftc::tree::build::UnitBuilder;
use siftc::tree::{CompilationUnit, Literal, Modifier, NodeId};
use siftc::types::{PrimKind, Ty, TypeDecl, TypeId, TypeKind, OBJECT};

pub const PSF: &[Modifier] = &[Modifier::Private, Modifier::Static, Modifier::Final];

pub struct Types {
    pub object: TypeId,
    pub string: TypeId,
    pub integer: TypeId,
    pub long: TypeId,
    pub boolean: TypeId,
    pub iterable: TypeId,
    pub collection: TypeId,
    pub list: TypeId,
    pub set: TypeId,
    pub immutable_collection: TypeId,
    pub immutable_list: TypeId,
    pub list_builder: TypeId,
    pub immutable_set: TypeId,
    pub stream: TypeId,
    pub collector: TypeId,
    pub objects: TypeId,
    pub guava_objects: TypeId,
    pub assert: TypeId,
    pub color: TypeId,
    pub javac_type: TypeId,
    pub bug_checker: TypeId,
}

pub struct Methods {
    pub equals: SymbolId,
    pub objects_equals: SymbolId,
    pub guava_equal: SymbolId,
    pub assert_false: SymbolId,
    pub contains: SymbolId,
    pub contains_all: SymbolId,
    pub is_empty: SymbolId,
    pub size: SymbolId,
    pub list_stream: SymbolId,
    pub list_for_each: SymbolId,
    pub list_of: SymbolId,
    pub list_copy_of: SymbolId,
    pub list_builder: SymbolId,
    pub builder_add: SymbolId,
    pub builder_add_all: SymbolId,
    pub builder_build: SymbolId,
    pub stream_of: SymbolId,
    pub stream_collect: SymbolId,
    pub to_immutable_list: SymbolId,
    pub to_string: SymbolId,
    pub red: SymbolId,
    pub green: SymbolId,
}

pub struct Jdk {
    pub b: UnitBuilder,
    pub t: Types,
    pub m: Methods,
}

fn var(name: &str) -> Ty {
    Ty::Var {
        name: name.to_string(),
    }
}

fn generic(name: &str, kind: TypeKind, params: &[&str], supertypes: Vec<Ty>) -> TypeDecl {
    let mut d = TypeDecl::new(name, kind);
    d.type_params = params.iter().map(|p| p.to_string()).collect();
    d.supertypes = supertypes;
    d
}

fn value_class(name: &str, object: TypeId) -> TypeDecl {
    let mut d = TypeDecl::new(name, TypeKind::Class);
    d.is_final = true;
    d.overrides_equals = true;
    d.supertypes = vec![Ty::raw(object)];
    d
}

fn returning(mut sym: Symbol, ty: Ty) -> Symbol {
    sym.ty = Some(ty);
    sym
}

impl Jdk {
    pub fn new(path: &str) -> Self {
        let mut b = UnitBuilder::new(path);
        let tt = &mut b.types;
        let object = tt.push(TypeDecl::new(OBJECT, TypeKind::Class));
        let string = tt.push(value_class("java.lang.String", object));
        let integer = tt.push(value_class("java.lang.Integer", object));
        let long = tt.push(value_class("java.lang.Long", object));
        let boolean = tt.push(value_class("java.lang.Boolean", object));
        let iterable = tt.push(generic("java.lang.Iterable", TypeKind::Interface, &["T"], vec![]));
        let collection = tt.push(generic(
            "java.util.Collection",
            TypeKind::Interface,
            &["E"],
            vec![Ty::class(iterable, vec![var("E")])],
        ));
        let mut list = generic(
            "java.util.List",
            TypeKind::Interface,
            &["E"],
            vec![Ty::class(collection, vec![var("E")])],
        );
        list.overrides_equals = true;
        let list = tt.push(list);
        let mut set = generic(
            "java.util.Set",
            TypeKind::Interface,
            &["E"],
            vec![Ty::class(collection, vec![var("E")])],
        );
        set.overrides_equals = true;
        let set = tt.push(set);
        let immutable_collection = tt.push(generic(
            "com.google.common.collect.ImmutableCollection",
            TypeKind::Class,
            &["E"],
            vec![Ty::raw(object), Ty::class(collection, vec![var("E")])],
        ));
        let immutable_list = tt.push(generic(
            "com.google.common.collect.ImmutableList",
            TypeKind::Class,
            &["E"],
            vec![
                Ty::class(immutable_collection, vec![var("E")]),
                Ty::class(list, vec![var("E")]),
            ],
        ));
        let list_builder = tt.push(generic(
            "com.google.common.collect.ImmutableList.Builder",
            TypeKind::Class,
            &["E"],
            vec![Ty::raw(object)],
        ));
        let immutable_set = tt.push(generic(
            "com.google.common.collect.ImmutableSet",
            TypeKind::Class,
            &["E"],
            vec![
                Ty::class(immutable_collection, vec![var("E")]),
                Ty::class(set, vec![var("E")]),
            ],
        ));
        let stream = tt.push(generic("java.util.stream.Stream", TypeKind::Interface, &["T"], vec![]));
        let collector = tt.push(generic(
            "java.util.stream.Collector",
            TypeKind::Interface,
            &["T", "A", "R"],
            vec![],
        ));
        let mut objects = TypeDecl::new("java.util.Objects", TypeKind::Class);
        objects.is_final = true;
        let objects = tt.push(objects);
        let guava_objects = tt.push(TypeDecl::new("com.google.common.base.Objects", TypeKind::Class));
        let assert = tt.push(TypeDecl::new("org.junit.Assert", TypeKind::Class));
        let color = tt.push(generic("com.example.Color", TypeKind::Enum, &[], vec![Ty::raw(object)]));
        let javac_type = tt.push(generic(
            "com.sun.tools.javac.code.Type",
            TypeKind::Class,
            &[],
            vec![Ty::raw(object)],
        ));
        let bug_checker = tt.push(generic(
            "com.google.errorprone.bugpatterns.BugChecker",
            TypeKind::Class,
            &[],
            vec![Ty::raw(object)],
        ));

        let boolean_ty = Ty::Prim {
            prim: PrimKind::Boolean,
        };
        let obj = Ty::raw(object);
        let st = &mut b.symbols;
        let equals = st.push(returning(
            Symbol::method(object, "equals", false, vec![obj.clone()]),
            boolean_ty.clone(),
        ));
        let objects_equals = st.push(returning(
            Symbol::method(objects, "equals", true, vec![obj.clone(), obj.clone()]),
            boolean_ty.clone(),
        ));
        let guava_equal = st.push(returning(
            Symbol::method(guava_objects, "equal", true, vec![obj.clone(), obj.clone()]),
            boolean_ty.clone(),
        ));
        let assert_false = st.push(Symbol::method(assert, "assertFalse", true, vec![boolean_ty.clone()]));
        let contains = st.push(returning(
            Symbol::method(immutable_collection, "contains", false, vec![obj.clone()]),
            boolean_ty.clone(),
        ));
        let contains_all = st.push(returning(
            Symbol::method(
                collection,
                "containsAll",
                false,
                vec![Ty::class(collection, vec![Ty::Wildcard])],
            ),
            boolean_ty.clone(),
        ));
        let is_empty = st.push(returning(
            Symbol::method(collection, "isEmpty", false, vec![]),
            boolean_ty,
        ));
        let size = st.push(Symbol::method(collection, "size", false, vec![]));
        let list_stream = st.push(Symbol::method(collection, "stream", false, vec![]));
        let list_for_each = st.push(Symbol::method(iterable, "forEach", false, vec![Ty::Error]));
        let list_of = st.push(Symbol::method(immutable_list, "of", true, vec![]));
        let list_copy_of = st.push(Symbol::method(
            immutable_list,
            "copyOf",
            true,
            vec![Ty::class(collection, vec![var("E")])],
        ));
        let list_builder_m = st.push(Symbol::method(immutable_list, "builder", true, vec![]));
        let builder_add = st.push(Symbol::method(list_builder, "add", false, vec![var("E")]));
        let builder_add_all = st.push(Symbol::method(
            list_builder,
            "addAll",
            false,
            vec![Ty::raw(iterable)],
        ));
        let builder_build = st.push(Symbol::method(list_builder, "build", false, vec![]));
        let stream_of = st.push(Symbol::method(stream, "of", true, vec![]));
        let stream_collect = st.push(Symbol::method(stream, "collect", false, vec![Ty::raw(collector)]));
        let to_immutable_list = st.push(Symbol::method(immutable_list, "toImmutableList", true, vec![]));
        let to_string = st.push(Symbol::method(object, "toString", false, vec![]));
        let mut red = Symbol::new("RED", SymbolKind::EnumConstant);
        red.owner = Some(color);
        red.is_static = true;
        let red = st.push(red);
        let mut green = Symbol::new("GREEN", SymbolKind::EnumConstant);
        green.owner = Some(color);
        green.is_static = true;
        let green = st.push(green);

        Self {
            b,
            t: Types {
                object,
                string,
                integer,
                long,
                boolean,
                iterable,
                collection,
                list,
                set,
                immutable_collection,
                immutable_list,
                list_builder,
                immutable_set,
                stream,
                collector,
                objects,
                guava_objects,
                assert,
                color,
                javac_type,
                bug_checker,
            },
            m: Methods {
                equals,
                objects_equals,
                guava_equal,
                assert_false,
                contains,
                contains_all,
                is_empty,
                size,
                list_stream,
                list_for_each,
                list_of,
                list_copy_of,
                list_builder: list_builder_m,
                builder_add,
                builder_add_all,
                builder_build,
                stream_of,
                stream_collect,
                to_immutable_list,
                to_string,
                red,
                green,
            },
        }
    }

    pub fn string(&self) -> Ty {
        Ty::raw(self.t.string)
    }

    pub fn integer(&self) -> Ty {
        Ty::raw(self.t.integer)
    }

    pub fn list_of_ty(&self, elem: Ty) -> Ty {
        Ty::class(self.t.immutable_list, vec![elem])
    }

    pub fn builder_of_ty(&self, elem: Ty) -> Ty {
        Ty::class(self.t.list_builder, vec![elem])
    }

    pub fn boolean(&self) -> Ty {
        Ty::Prim {
            prim: PrimKind::Boolean,
        }
    }

    /// A declared class; its type extends `supertypes` (or `Object`).
    pub fn declare_class(&mut self, name: &str, supertypes: Vec<Ty>) -> TypeId {
        let supertypes = if supertypes.is_empty() {
            vec![Ty::raw(self.t.object)]
        } else {
            supertypes
        };
        self.b
            .types
            .push(generic(name, TypeKind::Class, &[], supertypes))
    }

    pub fn local_sym(&mut self, name: &str, ty: Ty) -> SymbolId {
        let mut s = Symbol::new(name, SymbolKind::Local);
        s.ty = Some(ty);
        self.b.symbols.push(s)
    }

    pub fn field_sym(&mut self, name: &str, ty: Ty) -> SymbolId {
        let mut s = Symbol::new(name, SymbolKind::Field);
        s.ty = Some(ty);
        s.is_static = true;
        self.b.symbols.push(s)
    }

    pub fn method_sym(&mut self, owner: TypeId, name: &str, is_static: bool, params: Vec<Ty>) -> SymbolId {
        self.b.symbols.push(Symbol::method(owner, name, is_static, params))
    }

    pub fn var_ref(&mut self, name: &str, sym: SymbolId) -> NodeId {
        let ty = self.b.symbols.get(sym).and_then(|s| s.ty.clone());
        self.b.ident(name, ty, Some(sym))
    }

    pub fn str_lit(&mut self, value: &str) -> NodeId {
        let ty = self.string();
        self.b.literal(
            Literal::String {
                value: value.to_string(),
            },
            Some(ty),
        )
    }

    pub fn int_lit(&mut self, value: i64) -> NodeId {
        self.b.literal(
            Literal::Int { value },
            Some(Ty::Prim {
                prim: PrimKind::Int,
            }),
        )
    }

    pub fn null_lit(&mut self) -> NodeId {
        self.b.literal(Literal::Null, Some(Ty::Null))
    }

    pub fn enum_const(&mut self, name: &str, sym: SymbolId) -> NodeId {
        let color = self.b.ident("Color", Some(Ty::raw(self.t.color)), None);
        self.b.select(color, name, Some(Ty::raw(self.t.color)), Some(sym))
    }

    /// `ImmutableList` used as a type reference or static receiver.
    pub fn list_ref(&mut self) -> NodeId {
        let ty = Ty::raw(self.t.immutable_list);
        self.b.ident("ImmutableList", Some(ty), None)
    }

    /// `ImmutableList<Elem>` in a declaration.
    pub fn list_type(&mut self, elem: &str, elem_ty: Ty) -> NodeId {
        let base = self
            .b
            .type_name("ImmutableList", Some(Ty::raw(self.t.immutable_list)));
        let arg = self.b.type_name(elem, Some(elem_ty.clone()));
        let ty = self.list_of_ty(elem_ty);
        self.b.type_apply(base, vec![arg], Some(ty))
    }

    pub fn type_name(&mut self, name: &str, ty: Ty) -> NodeId {
        self.b.type_name(name, Some(ty))
    }

    /// `ImmutableList.of(elems..)`.
    pub fn list_of(&mut self, elems: Vec<NodeId>) -> NodeId {
        let recv = self.list_ref();
        let ty = self.list_of_ty(self.string());
        let sym = self.m.list_of;
        self.b.call(Some(recv), vec![], "of", elems, Some(ty), Some(sym))
    }

    /// `ImmutableList.copyOf(src)`.
    pub fn list_copy_of(&mut self, src: NodeId) -> NodeId {
        let recv = self.list_ref();
        let ty = self.list_of_ty(self.string());
        let sym = self.m.list_copy_of;
        self.b.call(Some(recv), vec![], "copyOf", vec![src], Some(ty), Some(sym))
    }

    /// `ImmutableList.<String>builder()` followed by `add(e)` per element and `build()`.
    pub fn builder_chain(&mut self, adds: Vec<NodeId>) -> NodeId {
        let recv = self.list_ref();
        let string = self.string();
        let string_arg = self.b.type_name("String", Some(string));
        let builder_ty = self.builder_of_ty(self.string());
        let sym = self.m.list_builder;
        let mut cur = self.b.call(
            Some(recv),
            vec![string_arg],
            "builder",
            vec![],
            Some(builder_ty.clone()),
            Some(sym),
        );
        for e in adds {
            let add = self.m.builder_add;
            cur = self
                .b
                .call(Some(cur), vec![], "add", vec![e], Some(builder_ty.clone()), Some(add));
        }
        let ty = self.list_of_ty(self.string());
        let build = self.m.builder_build;
        self.b.call(Some(cur), vec![], "build", vec![], Some(ty), Some(build))
    }

    /// `private static final ImmutableList<String> NAME = init;`
    pub fn list_field(&mut self, annotations: &[&str], name: &str, init: NodeId) -> (NodeId, SymbolId) {
        let ty = self.list_of_ty(self.string());
        let sym = self.field_sym(name, ty);
        let string = self.string();
        let type_node = self.list_type("String", string);
        let field = self.b.field(annotations, PSF, type_node, name, Some(init), Some(sym));
        (field, sym)
    }

    /// `recv.<name>(args)` for an instance method returning `ty`.
    pub fn invoke(&mut self, recv: NodeId, name: &str, args: Vec<NodeId>, ty: Option<Ty>, sym: SymbolId) -> NodeId {
        self.b.call(Some(recv), vec![], name, args, ty, Some(sym))
    }

    /// `FIELD.contains(arg);` as a statement.
    pub fn contains_stmt(&mut self, field: &str, sym: SymbolId, arg: NodeId) -> NodeId {
        let recv = self.var_ref(field, sym);
        let ty = self.boolean();
        let contains = self.m.contains;
        let call = self.invoke(recv, "contains", vec![arg], Some(ty), contains);
        self.b.expr_stmt(call)
    }

    pub fn void_method(&mut self, name: &str, params: Vec<NodeId>, stmts: Vec<NodeId>) -> NodeId {
        let body = self.b.block(stmts);
        let void = self.b.type_name("void", Some(Ty::Void));
        self.b.method(&[], void, name, params, body, None)
    }

    pub fn param(&mut self, type_name: &str, ty: Ty, name: &str) -> (NodeId, SymbolId) {
        let sym = {
            let mut s = Symbol::new(name, SymbolKind::Param);
            s.ty = Some(ty.clone());
            self.b.symbols.push(s)
        };
        let t = self.b.type_name(type_name, Some(ty));
        (self.b.param(t, name, Some(sym)), sym)
    }

    /// Top-level class `name` of type `ty`.
    pub fn class(&mut self, name: &str, ty: TypeId, members: Vec<NodeId>) -> NodeId {
        self.b.class(name, members, Some(Ty::raw(ty)))
    }

    pub fn finish(self, classes: Vec<NodeId>) -> CompilationUnit {
        self.b.finish(classes).expect("valid unit")
    }
}

pub fn lint_default(unit: &CompilationUnit) -> Report {
    lint::lint_unit(unit, &LintOptions::default()).expect("lint")
}

pub fn codes(report: &Report) -> Vec<&str> {
    report.diagnostics.iter().map(|d| d.code.as_str()).collect()
}
