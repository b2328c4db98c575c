use serde::{Deserialize, Serialize};

use crate::types::{Ty, TypeId};

/// Stable handle of a declared entity; issued by [`SymbolTable::push`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymbolId(pub u32);

impl SymbolId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Field,
    Local,
    Param,
    Method,
    Constructor,
    Class,
    EnumConstant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<TypeId>,
    #[serde(default)]
    pub is_static: bool,
    /// Declared parameter types (methods and constructors only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<Ty>,
    /// Variable type, or the return type for methods.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<Ty>,
}

impl Symbol {
    pub fn new(name: impl Into<String>, kind: SymbolKind) -> Self {
        Self {
            name: name.into(),
            kind,
            owner: None,
            is_static: false,
            params: Vec::new(),
            ty: None,
        }
    }

    pub fn method(owner: TypeId, name: impl Into<String>, is_static: bool, params: Vec<Ty>) -> Self {
        Self {
            name: name.into(),
            kind: SymbolKind::Method,
            owner: Some(owner),
            is_static,
            params,
            ty: None,
        }
    }

    pub fn is_method(&self) -> bool {
        matches!(self.kind, SymbolKind::Method)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sym: Symbol) -> SymbolId {
        let id = SymbolId(self.symbols.len() as u32);
        self.symbols.push(sym);
        id
    }

    pub fn get(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.get(id.index())
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SymbolId, &Symbol)> {
        self.symbols
            .iter()
            .enumerate()
            .map(|(idx, sym)| (SymbolId(idx as u32), sym))
    }
}
