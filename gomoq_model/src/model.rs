use std::collections::BTreeSet;
use std::fmt;

use itertools::Itertools;

use crate::builtin;
use crate::types::{MethodSignature, TypeRef};

/// Method set of one interface, ready for code generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceModel {
    pub name: String,
    /// Import path of the declaring package.
    pub package: String,
    pub methods: Vec<MethodSignature>,
}

/// Name-erased, order-independent form of an [`InterfaceModel`].
///
/// Two extractions of the same interface have equal shapes even when only one
/// of them knows the real parameter names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceShape {
    pub name: String,
    pub package: String,
    pub methods: Vec<MethodShape>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct MethodShape {
    pub name: String,
    pub params: Vec<TypeRef>,
    pub results: Vec<TypeRef>,
}

impl InterfaceModel {
    pub fn new(
        name: impl Into<String>,
        package: impl Into<String>,
        methods: Vec<MethodSignature>,
    ) -> Self {
        Self {
            name: name.into(),
            package: package.into(),
            methods,
        }
    }

    pub fn method(&self, name: &str) -> Option<&MethodSignature> {
        self.methods.iter().find(|m| m.name == name)
    }

    pub fn is_exported(&self) -> bool {
        builtin::is_exported(&self.name)
    }

    pub fn shape(&self) -> InterfaceShape {
        let methods = self
            .methods
            .iter()
            .map(|m| MethodShape {
                name: m.name.clone(),
                params: m.params.iter().map(|p| p.ty.canonical()).collect(),
                results: m.results.iter().map(TypeRef::canonical).collect(),
            })
            .sorted()
            .collect();

        InterfaceShape {
            name: self.name.clone(),
            package: self.package.clone(),
            methods,
        }
    }

    /// Parameter and result types in declaration order.
    pub fn types(&self) -> impl Iterator<Item = &TypeRef> {
        self.methods
            .iter()
            .flat_map(|m| m.params.iter().map(|p| &p.ty).chain(&m.results))
    }

    /// Import paths of every package the method set refers to.
    pub fn referenced_packages(&self) -> BTreeSet<String> {
        self.types().flat_map(TypeRef::packages).collect()
    }
}

impl fmt::Display for InterfaceModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "// {}", self.package)?;
        if self.methods.is_empty() {
            return writeln!(f, "type {} interface{{}}", self.name);
        }
        writeln!(f, "type {} interface {{", self.name)?;
        for method in &self.methods {
            writeln!(f, "\t{method}")?;
        }
        writeln!(f, "}}")
    }
}
