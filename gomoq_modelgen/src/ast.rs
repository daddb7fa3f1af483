//! Declaration-level syntax tree of a Go source file.
//!
//! Only what interface extraction needs is kept: the package clause, imports
//! and type declarations. Function bodies, constants and variables are
//! skipped by the parser.

use std::ops::Range;

use gomoq_model::ChanDir;

use crate::parser::SyntaxError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub package: String,
    pub imports: Vec<ImportSpec>,
    pub decls: Vec<TypeSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSpec {
    /// `None` for a plain import, `.` and `_` are kept as written.
    pub alias: Option<String>,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSpec {
    pub name: String,
    pub type_params: Vec<String>,
    /// `type A = B`
    pub alias: bool,
    /// A body that failed to parse keeps its error until someone asks for it.
    pub ty: Result<TypeExpr, SyntaxError>,
    /// Whether the body starts with the `interface` keyword.
    pub interface_like: bool,
    pub span: Range<usize>,
}

impl SourceFile {
    pub fn decl(&self, name: &str) -> Option<&TypeSpec> {
        self.decls.iter().find(|decl| decl.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    Name {
        qualifier: Option<String>,
        name: String,
        args: Vec<TypeExpr>,
    },
    Pointer(Box<TypeExpr>),
    Slice(Box<TypeExpr>),
    Array(String, Box<TypeExpr>),
    Map(Box<TypeExpr>, Box<TypeExpr>),
    Chan(ChanDir, Box<TypeExpr>),
    Func(Signature),
    Interface(Vec<InterfaceElem>),
    Struct(Vec<Field>),
    /// `...T` in the last parameter position.
    Ellipsis(Box<TypeExpr>),
}

impl TypeExpr {
    pub fn name(name: impl Into<String>) -> Self {
        TypeExpr::Name {
            qualifier: None,
            name: name.into(),
            args: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signature {
    pub params: Vec<Field>,
    pub results: Vec<Field>,
}

/// One parameter, result or struct field. Grouped declarations such as
/// `a, b int` are expanded into one field per name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: Option<String>,
    pub ty: TypeExpr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterfaceElem {
    Method { name: String, sig: Signature },
    Embed(TypeExpr),
    /// Union or `~T` term of a constraint interface.
    TypeSet(Vec<TypeExpr>),
}
