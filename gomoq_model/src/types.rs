use std::collections::BTreeSet;
use std::fmt;

use itertools::Itertools;

use crate::builtin;

/// Direction of a channel type.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChanDir {
    /// `chan T`
    Both,
    /// `chan<- T`
    Send,
    /// `<-chan T`
    Recv,
}

/// A type referenced by name, e.g. `string`, `http.Request` or `List[int]`.
///
/// `package` is the full import path of the declaring package and is empty
/// for predeclared types.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NamedType {
    pub package: String,
    pub name: String,
    pub type_args: Vec<TypeRef>,
}

/// Parameters and results of a function type.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FuncType {
    pub params: Vec<TypeRef>,
    pub results: Vec<TypeRef>,
}

/// A field of an anonymous struct type. Embedded fields have no name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StructField {
    pub name: Option<String>,
    pub ty: TypeRef,
}

/// Reference to the type of a parameter or a result.
///
/// Values are immutable once built. The ordering is total so that references can
/// be deduplicated in ordered sets.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TypeRef {
    Named(NamedType),
    Pointer(Box<TypeRef>),
    Slice(Box<TypeRef>),
    /// Array with its length expression as written (`3`, `N`).
    Array(String, Box<TypeRef>),
    Map(Box<TypeRef>, Box<TypeRef>),
    Chan(ChanDir, Box<TypeRef>),
    Func(FuncType),
    /// Anonymous interface; `interface{}` has no methods.
    Interface(Vec<MethodSignature>),
    /// Anonymous struct; `struct{}` has no fields.
    Struct(Vec<StructField>),
    /// `...T`, only valid as the last parameter.
    Variadic(Box<TypeRef>),
}

impl TypeRef {
    pub fn named(package: impl Into<String>, name: impl Into<String>) -> Self {
        TypeRef::Named(NamedType {
            package: package.into(),
            name: name.into(),
            type_args: Vec::new(),
        })
    }

    pub fn builtin(name: impl Into<String>) -> Self {
        Self::named("", name)
    }

    pub fn pointer(inner: TypeRef) -> Self {
        TypeRef::Pointer(Box::new(inner))
    }

    pub fn slice(inner: TypeRef) -> Self {
        TypeRef::Slice(Box::new(inner))
    }

    pub fn map(key: TypeRef, value: TypeRef) -> Self {
        TypeRef::Map(Box::new(key), Box::new(value))
    }

    pub fn chan(dir: ChanDir, inner: TypeRef) -> Self {
        TypeRef::Chan(dir, Box::new(inner))
    }

    pub fn variadic(inner: TypeRef) -> Self {
        TypeRef::Variadic(Box::new(inner))
    }

    pub fn empty_interface() -> Self {
        TypeRef::Interface(Vec::new())
    }

    pub fn is_variadic(&self) -> bool {
        matches!(self, TypeRef::Variadic(_))
    }

    /// Predeclared types such as `int`, `string` or `error`.
    pub fn is_builtin(&self) -> bool {
        match self {
            TypeRef::Named(named) => {
                named.package.is_empty()
                    && named.type_args.is_empty()
                    && builtin::is_predeclared(&named.name)
            }
            _ => false,
        }
    }

    /// The type a value of this parameter has inside the function body:
    /// `...T` is stored as `[]T`, everything else as is.
    pub fn storage_type(&self) -> TypeRef {
        match self {
            TypeRef::Variadic(inner) => TypeRef::Slice(inner.clone()),
            other => other.clone(),
        }
    }

    /// Visits this type and every type nested in it, parents first.
    pub fn walk<'a>(&'a self, f: &mut dyn FnMut(&'a TypeRef)) {
        f(self);
        match self {
            TypeRef::Named(named) => named.type_args.iter().for_each(|arg| arg.walk(f)),
            TypeRef::Pointer(inner)
            | TypeRef::Slice(inner)
            | TypeRef::Array(_, inner)
            | TypeRef::Chan(_, inner)
            | TypeRef::Variadic(inner) => inner.walk(f),
            TypeRef::Map(key, value) => {
                key.walk(f);
                value.walk(f);
            }
            TypeRef::Func(func) => func
                .params
                .iter()
                .chain(&func.results)
                .for_each(|ty| ty.walk(f)),
            TypeRef::Interface(methods) => methods
                .iter()
                .flat_map(|m| m.params.iter().map(|p| &p.ty).chain(&m.results))
                .for_each(|ty| ty.walk(f)),
            TypeRef::Struct(fields) => fields.iter().for_each(|field| field.ty.walk(f)),
        }
    }

    /// Import paths of every package this type mentions.
    pub fn packages(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.walk(&mut |ty| {
            if let TypeRef::Named(named) = ty {
                if !named.package.is_empty() {
                    out.insert(named.package.clone());
                }
            }
        });
        out
    }

    /// Same type with predeclared aliases resolved (`byte` → `uint8`,
    /// `rune` → `int32`, `any` → `interface{}`) and anonymous interface
    /// methods sorted by name.
    pub fn canonical(&self) -> TypeRef {
        match self {
            TypeRef::Named(named) if named.package.is_empty() && named.type_args.is_empty() => {
                match named.name.as_str() {
                    "byte" => TypeRef::builtin("uint8"),
                    "rune" => TypeRef::builtin("int32"),
                    "any" => TypeRef::empty_interface(),
                    _ => self.clone(),
                }
            }
            TypeRef::Named(named) => TypeRef::Named(NamedType {
                package: named.package.clone(),
                name: named.name.clone(),
                type_args: named.type_args.iter().map(TypeRef::canonical).collect(),
            }),
            TypeRef::Pointer(inner) => TypeRef::pointer(inner.canonical()),
            TypeRef::Slice(inner) => TypeRef::slice(inner.canonical()),
            TypeRef::Array(len, inner) => TypeRef::Array(len.clone(), Box::new(inner.canonical())),
            TypeRef::Map(key, value) => TypeRef::map(key.canonical(), value.canonical()),
            TypeRef::Chan(dir, inner) => TypeRef::chan(*dir, inner.canonical()),
            TypeRef::Func(func) => TypeRef::Func(FuncType {
                params: func.params.iter().map(TypeRef::canonical).collect(),
                results: func.results.iter().map(TypeRef::canonical).collect(),
            }),
            TypeRef::Interface(methods) => TypeRef::Interface(
                methods
                    .iter()
                    .map(MethodSignature::canonical)
                    .sorted_by(|a, b| a.name.cmp(&b.name))
                    .collect(),
            ),
            TypeRef::Struct(fields) => TypeRef::Struct(
                fields
                    .iter()
                    .map(|field| StructField {
                        name: field.name.clone(),
                        ty: field.ty.canonical(),
                    })
                    .collect(),
            ),
            TypeRef::Variadic(inner) => TypeRef::variadic(inner.canonical()),
        }
    }
}

/// A named parameter of a method. The name may have been synthesized.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Parameter {
    pub name: String,
    pub ty: TypeRef,
}

impl Parameter {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MethodSignature {
    pub name: String,
    pub params: Vec<Parameter>,
    pub results: Vec<TypeRef>,
}

impl MethodSignature {
    pub fn new(name: impl Into<String>, params: Vec<Parameter>, results: Vec<TypeRef>) -> Self {
        Self {
            name: name.into(),
            params,
            results,
        }
    }

    pub fn is_variadic(&self) -> bool {
        self.params.last().map_or(false, |p| p.ty.is_variadic())
    }

    fn canonical(&self) -> MethodSignature {
        MethodSignature {
            name: self.name.clone(),
            params: self
                .params
                .iter()
                .map(|p| Parameter::new(p.name.clone(), p.ty.canonical()))
                .collect(),
            results: self.results.iter().map(TypeRef::canonical).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Display renders Go syntax, qualifying named types with the last element of
// their import path. Used for messages and `--debug` output; generated code
// goes through the import-aware renderer of the generator instead.
// ---------------------------------------------------------------------------

impl fmt::Display for NamedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.package.is_empty() {
            write!(f, "{}.", crate::guess_package_name(&self.package))?;
        }
        f.write_str(&self.name)?;
        if !self.type_args.is_empty() {
            write!(f, "[{}]", self.type_args.iter().join(", "))?;
        }
        Ok(())
    }
}

impl fmt::Display for FuncType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.params.iter().join(", "))?;
        fmt_results(f, &self.results)
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Named(named) => named.fmt(f),
            TypeRef::Pointer(inner) => write!(f, "*{inner}"),
            TypeRef::Slice(inner) => write!(f, "[]{inner}"),
            TypeRef::Array(len, inner) => write!(f, "[{len}]{inner}"),
            TypeRef::Map(key, value) => write!(f, "map[{key}]{value}"),
            TypeRef::Chan(ChanDir::Both, inner) => match &**inner {
                TypeRef::Chan(ChanDir::Recv, _) => write!(f, "chan ({inner})"),
                _ => write!(f, "chan {inner}"),
            },
            TypeRef::Chan(ChanDir::Send, inner) => write!(f, "chan<- {inner}"),
            TypeRef::Chan(ChanDir::Recv, inner) => write!(f, "<-chan {inner}"),
            TypeRef::Func(func) => write!(f, "func{func}"),
            TypeRef::Interface(methods) if methods.is_empty() => f.write_str("interface{}"),
            TypeRef::Interface(methods) => write!(f, "interface{{ {} }}", methods.iter().join("; ")),
            TypeRef::Struct(fields) if fields.is_empty() => f.write_str("struct{}"),
            TypeRef::Struct(fields) => {
                let fields = fields.iter().map(|field| match &field.name {
                    Some(name) => format!("{name} {}", field.ty),
                    None => field.ty.to_string(),
                });
                write!(f, "struct{{ {} }}", fields.format("; "))
            }
            TypeRef::Variadic(inner) => write!(f, "...{inner}"),
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.ty)
    }
}

impl fmt::Display for MethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.params.iter().join(", "))?;
        fmt_results(f, &self.results)
    }
}

fn fmt_results(f: &mut fmt::Formatter<'_>, results: &[TypeRef]) -> fmt::Result {
    match results {
        [] => Ok(()),
        [single] => write!(f, " {single}"),
        many => write!(f, " ({})", many.iter().join(", ")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_nested_types() {
        let ty = TypeRef::map(
            TypeRef::builtin("string"),
            TypeRef::slice(TypeRef::pointer(TypeRef::named("net/http", "Request"))),
        );
        assert_eq!(ty.to_string(), "map[string][]*http.Request");

        let ch = TypeRef::chan(ChanDir::Both, TypeRef::chan(ChanDir::Recv, TypeRef::builtin("int")));
        assert_eq!(ch.to_string(), "chan (<-chan int)");
    }

    #[test]
    fn variadic_is_stored_as_slice() {
        let ty = TypeRef::variadic(TypeRef::builtin("string"));
        assert!(ty.is_variadic());
        assert_eq!(ty.storage_type(), TypeRef::slice(TypeRef::builtin("string")));
    }

    #[test]
    fn packages_are_collected_from_nested_types() {
        let ty = TypeRef::Func(FuncType {
            params: vec![TypeRef::named("io", "Reader")],
            results: vec![TypeRef::map(
                TypeRef::named("time", "Duration"),
                TypeRef::builtin("error"),
            )],
        });
        let packages = ty.packages().into_iter().collect::<Vec<_>>();
        assert_eq!(packages, vec!["io".to_string(), "time".to_string()]);
    }

    #[test]
    fn canonical_resolves_predeclared_aliases() {
        assert_eq!(TypeRef::builtin("byte").canonical(), TypeRef::builtin("uint8"));
        assert_eq!(
            TypeRef::slice(TypeRef::builtin("any")).canonical(),
            TypeRef::slice(TypeRef::empty_interface())
        );
    }
}
