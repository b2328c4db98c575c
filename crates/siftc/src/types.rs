use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

pub const OBJECT: &str = "java.lang.Object";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeId(pub u32);

impl TypeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    Class,
    Interface,
    Enum,
    Record,
    Annotation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimKind {
    Boolean,
    Byte,
    Short,
    Char,
    Int,
    Long,
    Float,
    Double,
}

impl PrimKind {
    pub fn name(self) -> &'static str {
        match self {
            PrimKind::Boolean => "boolean",
            PrimKind::Byte => "byte",
            PrimKind::Short => "short",
            PrimKind::Char => "char",
            PrimKind::Int => "int",
            PrimKind::Long => "long",
            PrimKind::Float => "float",
            PrimKind::Double => "double",
        }
    }

    pub fn boxed_name(self) -> &'static str {
        match self {
            PrimKind::Boolean => "java.lang.Boolean",
            PrimKind::Byte => "java.lang.Byte",
            PrimKind::Short => "java.lang.Short",
            PrimKind::Char => "java.lang.Character",
            PrimKind::Int => "java.lang.Integer",
            PrimKind::Long => "java.lang.Long",
            PrimKind::Float => "java.lang.Float",
            PrimKind::Double => "java.lang.Double",
        }
    }
}

/// A static type term as resolved by the front end.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Ty {
    Class {
        decl: TypeId,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        args: Vec<Ty>,
    },
    Prim {
        prim: PrimKind,
    },
    Array {
        elem: Box<Ty>,
    },
    Var {
        name: String,
    },
    Wildcard,
    Null,
    Void,
    Error,
}

impl Ty {
    pub fn class(decl: TypeId, args: Vec<Ty>) -> Self {
        Ty::Class { decl, args }
    }

    pub fn raw(decl: TypeId) -> Self {
        Ty::Class {
            decl,
            args: Vec::new(),
        }
    }

    pub fn decl(&self) -> Option<TypeId> {
        match self {
            Ty::Class { decl, .. } => Some(*decl),
            _ => None,
        }
    }

    pub fn args(&self) -> &[Ty] {
        match self {
            Ty::Class { args, .. } => args,
            _ => &[],
        }
    }

    /// True for terms that carry no reliable nominal information.
    pub fn is_unreliable(&self) -> bool {
        matches!(self, Ty::Error | Ty::Var { .. } | Ty::Wildcard)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDecl {
    pub name: String,
    pub kind: TypeKind,
    #[serde(default)]
    pub is_final: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub type_params: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub supertypes: Vec<Ty>,
    #[serde(default)]
    pub overrides_equals: bool,
}

impl TypeDecl {
    pub fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            is_final: false,
            type_params: Vec::new(),
            supertypes: Vec::new(),
            overrides_equals: false,
        }
    }

    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    pub fn is_interface(&self) -> bool {
        matches!(self.kind, TypeKind::Interface | TypeKind::Annotation)
    }

    pub fn is_effectively_final(&self) -> bool {
        self.is_final || matches!(self.kind, TypeKind::Enum | TypeKind::Record)
    }
}

/// Arena of nominal type declarations, addressed by [`TypeId`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<TypeDecl>", into = "Vec<TypeDecl>")]
pub struct TypeTable {
    decls: Vec<TypeDecl>,
    by_name: BTreeMap<String, TypeId>,
}

impl From<Vec<TypeDecl>> for TypeTable {
    fn from(decls: Vec<TypeDecl>) -> Self {
        let mut by_name = BTreeMap::new();
        for (idx, decl) in decls.iter().enumerate() {
            by_name
                .entry(decl.name.clone())
                .or_insert(TypeId(idx as u32));
        }
        Self { decls, by_name }
    }
}

impl From<TypeTable> for Vec<TypeDecl> {
    fn from(table: TypeTable) -> Self {
        table.decls
    }
}

impl TypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, decl: TypeDecl) -> TypeId {
        let id = TypeId(self.decls.len() as u32);
        self.by_name.entry(decl.name.clone()).or_insert(id);
        self.decls.push(decl);
        id
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    pub fn get(&self, id: TypeId) -> Option<&TypeDecl> {
        self.decls.get(id.index())
    }

    pub fn iter(&self) -> impl Iterator<Item = (TypeId, &TypeDecl)> {
        self.decls
            .iter()
            .enumerate()
            .map(|(idx, decl)| (TypeId(idx as u32), decl))
    }

    pub fn lookup(&self, name: &str) -> Option<TypeId> {
        self.by_name.get(name).copied()
    }

    pub fn name_of(&self, id: TypeId) -> Option<&str> {
        self.get(id).map(|d| d.name.as_str())
    }

    /// Qualified name of the type's erasure, if it is a class type.
    pub fn erasure_name(&self, ty: &Ty) -> Option<&str> {
        ty.decl().and_then(|id| self.name_of(id))
    }

    pub fn is_named(&self, ty: &Ty, name: &str) -> bool {
        self.erasure_name(ty) == Some(name)
    }

    pub fn boxed(&self, prim: PrimKind) -> Option<Ty> {
        self.lookup(prim.boxed_name()).map(Ty::raw)
    }

    /// Every declaration reachable through supertype edges, `id` included.
    pub fn supertype_closure(&self, id: TypeId) -> BTreeSet<TypeId> {
        let mut seen = BTreeSet::new();
        let mut work = vec![id];
        while let Some(cur) = work.pop() {
            if !seen.insert(cur) {
                continue;
            }
            if let Some(decl) = self.get(cur) {
                work.extend(decl.supertypes.iter().filter_map(Ty::decl));
            }
        }
        seen
    }

    pub fn is_subtype_decl(&self, sub: TypeId, sup: TypeId) -> bool {
        sub == sup || self.supertype_closure(sub).contains(&sup)
    }

    pub fn is_subtype_of_name(&self, ty: &Ty, name: &str) -> bool {
        match (ty.decl(), self.lookup(name)) {
            (Some(sub), Some(sup)) => self.is_subtype_decl(sub, sup),
            _ => false,
        }
    }

    /// View `ty` as an instance of the supertype `target`, carrying generic
    /// arguments through the supertype edges. Raw types stay raw.
    pub fn as_super(&self, ty: &Ty, target: TypeId) -> Option<Ty> {
        let mut seen = BTreeSet::new();
        self.as_super_inner(ty, target, &mut seen)
    }

    fn as_super_inner(&self, ty: &Ty, target: TypeId, seen: &mut BTreeSet<TypeId>) -> Option<Ty> {
        let Ty::Class { decl, args } = ty else {
            return None;
        };
        if *decl == target {
            return Some(ty.clone());
        }
        if !seen.insert(*decl) {
            return None;
        }
        let decl_info = self.get(*decl)?;
        let raw = args.is_empty() || args.len() != decl_info.type_params.len();
        for sup in &decl_info.supertypes {
            let sup = if raw {
                erase(sup)
            } else {
                substitute(sup, &decl_info.type_params, args)
            };
            if let Some(found) = self.as_super_inner(&sup, target, seen) {
                return Some(found);
            }
        }
        None
    }

    /// Short rendering: simple class names with generic arguments.
    pub fn pretty(&self, ty: &Ty) -> String {
        self.render(ty, false)
    }

    /// Fully-qualified rendering.
    pub fn qualified(&self, ty: &Ty) -> String {
        self.render(ty, true)
    }

    fn render(&self, ty: &Ty, qualified: bool) -> String {
        match ty {
            Ty::Class { decl, args } => {
                let head = match self.get(*decl) {
                    Some(d) if qualified => d.name.clone(),
                    Some(d) => d.simple_name().to_string(),
                    None => "<any>".to_string(),
                };
                if args.is_empty() {
                    head
                } else {
                    let args: Vec<String> = args.iter().map(|a| self.render(a, qualified)).collect();
                    format!("{head}<{}>", args.join(","))
                }
            }
            Ty::Prim { prim } => prim.name().to_string(),
            Ty::Array { elem } => format!("{}[]", self.render(elem, qualified)),
            Ty::Var { name } => name.clone(),
            Ty::Wildcard => "?".to_string(),
            Ty::Null => "null".to_string(),
            Ty::Void => "void".to_string(),
            Ty::Error => "<any>".to_string(),
        }
    }
}

fn erase(ty: &Ty) -> Ty {
    match ty {
        Ty::Class { decl, .. } => Ty::raw(*decl),
        other => other.clone(),
    }
}

fn substitute(ty: &Ty, params: &[String], args: &[Ty]) -> Ty {
    match ty {
        Ty::Var { name } => params
            .iter()
            .position(|p| p == name)
            .and_then(|idx| args.get(idx))
            .cloned()
            .unwrap_or_else(|| ty.clone()),
        Ty::Class { decl, args: inner } => Ty::Class {
            decl: *decl,
            args: inner.iter().map(|a| substitute(a, params, args)).collect(),
        },
        Ty::Array { elem } => Ty::Array {
            elem: Box::new(substitute(elem, params, args)),
        },
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> (TypeTable, TypeId, TypeId, TypeId) {
        let mut t = TypeTable::new();
        t.push(TypeDecl::new(OBJECT, TypeKind::Class));
        let string = t.push(TypeDecl::new("java.lang.String", TypeKind::Class));
        let mut collection = TypeDecl::new("java.util.Collection", TypeKind::Interface);
        collection.type_params = vec!["E".to_string()];
        let collection = t.push(collection);
        let mut list = TypeDecl::new("java.util.List", TypeKind::Interface);
        list.type_params = vec!["T".to_string()];
        list.supertypes = vec![Ty::class(
            collection,
            vec![Ty::Var {
                name: "T".to_string(),
            }],
        )];
        let list = t.push(list);
        (t, string, collection, list)
    }

    #[test]
    fn as_super_substitutes_type_arguments() {
        let (t, string, collection, list) = table();
        let list_of_string = Ty::class(list, vec![Ty::raw(string)]);
        let up = t.as_super(&list_of_string, collection).expect("upcast");
        assert_eq!(up, Ty::class(collection, vec![Ty::raw(string)]));
    }

    #[test]
    fn as_super_keeps_raw_types_raw() {
        let (t, _, collection, list) = table();
        let up = t.as_super(&Ty::raw(list), collection).expect("upcast");
        assert_eq!(up, Ty::raw(collection));
    }

    #[test]
    fn pretty_and_qualified_renderings() {
        let (t, string, _, list) = table();
        let ty = Ty::class(list, vec![Ty::raw(string)]);
        assert_eq!(t.pretty(&ty), "List<String>");
        assert_eq!(t.qualified(&ty), "java.util.List<java.lang.String>");
    }

    #[test]
    fn table_roundtrips_through_json_with_lookup_index() {
        let (t, string, _, _) = table();
        let v = serde_json::to_value(&t).expect("encode");
        let back: TypeTable = serde_json::from_value(v).expect("decode");
        assert_eq!(back.lookup("java.lang.String"), Some(string));
    }
}
