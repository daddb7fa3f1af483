//! Turns syntax-level type expressions into [`TypeRef`]s by following
//! declarations and imports across packages.

use std::rc::Rc;

use gomoq_model::{
    guess_package_name, is_predeclared, FuncType, InterfaceModel, MethodSignature, NamedType,
    Parameter, StructField, TypeRef,
};
use if_chain::if_chain;
use log::debug;

use crate::ast::{InterfaceElem, Signature, TypeExpr, TypeSpec};
use crate::error::ExtractionError;
use crate::loader::{Package, PackageLoader, ParsedFile};

const MAX_ALIAS_DEPTH: usize = 32;

/// The file a type expression was written in.
#[derive(Debug, Clone)]
struct Scope {
    package: Rc<Package>,
    file: usize,
}

impl Scope {
    fn file(&self) -> &ParsedFile {
        &self.package.files[self.file]
    }
}

/// What an identifier refers to.
enum Target {
    Decl(Scope, String),
    Predeclared(String),
}

pub struct Resolver<'l> {
    loader: &'l PackageLoader,
}

impl<'l> Resolver<'l> {
    pub fn new(loader: &'l PackageLoader) -> Self {
        Self { loader }
    }

    /// Builds the flattened method set of interface `name` in `package`.
    pub fn interface_model(
        &self,
        package: &Rc<Package>,
        name: &str,
    ) -> Result<InterfaceModel, ExtractionError> {
        let (file, decl) =
            package
                .lookup(name)
                .ok_or_else(|| ExtractionError::InterfaceNotFound {
                    package: package.import_path.clone(),
                    name: name.to_string(),
                })?;
        if !decl.type_params.is_empty() {
            return Err(ExtractionError::Unsupported {
                name: name.to_string(),
                reason: "generic interfaces are not supported".to_string(),
            });
        }
        debug!("resolving interface {}.{name}", package.import_path);

        let scope = Scope {
            package: Rc::clone(package),
            file,
        };
        let mut chain = vec![qualified_name(package, name)];
        let (body_scope, elems) = self.interface_body(&scope, name, 0)?;
        let mut methods = Vec::new();
        self.flatten(&body_scope, &elems, name, &mut chain, &mut methods)?;

        let model = InterfaceModel::new(name, package.import_path.clone(), methods);
        gomoq_model::validate(&model)?;
        Ok(model)
    }

    /// The interface elements behind declaration `name` of `scope`'s package,
    /// following aliases and defined types such as `type A io.Reader`.
    fn interface_body(
        &self,
        scope: &Scope,
        name: &str,
        depth: usize,
    ) -> Result<(Scope, Vec<InterfaceElem>), ExtractionError> {
        let package = &scope.package;
        let (file, decl) = package
            .lookup(name)
            .ok_or_else(|| ExtractionError::UnresolvedIdent {
                package: package.import_path.clone(),
                ident: name.to_string(),
            })?;
        let decl_scope = Scope {
            package: Rc::clone(package),
            file,
        };
        let not_an_interface = || ExtractionError::NotAnInterface {
            package: package.import_path.clone(),
            name: name.to_string(),
        };

        match &decl.ty {
            Err(err) => Err(decl_scope.file().syntax_error(err)),
            Ok(TypeExpr::Interface(elems)) => Ok((decl_scope, elems.clone())),
            Ok(TypeExpr::Name {
                qualifier,
                name: target,
                args,
            }) if args.is_empty() => {
                if depth >= MAX_ALIAS_DEPTH {
                    return Err(not_an_interface());
                }
                match self.lookup(&decl_scope, qualifier.as_deref(), target)? {
                    Target::Decl(target_scope, target) => {
                        self.interface_body(&target_scope, &target, depth + 1)
                    }
                    Target::Predeclared(target) => match predeclared_interface(&target) {
                        Some(elems) => Ok((decl_scope, elems)),
                        None => Err(not_an_interface()),
                    },
                }
            }
            Ok(_) => Err(not_an_interface()),
        }
    }

    /// Appends the methods of `elems` to `methods`, inlining embedded
    /// interfaces at their position.
    fn flatten(
        &self,
        scope: &Scope,
        elems: &[InterfaceElem],
        interface: &str,
        chain: &mut Vec<String>,
        methods: &mut Vec<MethodSignature>,
    ) -> Result<(), ExtractionError> {
        for elem in elems {
            match elem {
                InterfaceElem::Method { name, sig } => {
                    let method = self.method_signature(scope, name, sig)?;
                    push_method(interface, methods, method)?;
                }
                InterfaceElem::Embed(TypeExpr::Name {
                    qualifier,
                    name,
                    args,
                }) => {
                    if !args.is_empty() {
                        return Err(ExtractionError::Unsupported {
                            name: interface.to_string(),
                            reason: format!("embeds the generic interface `{name}`"),
                        });
                    }
                    self.embed(scope, qualifier.as_deref(), name, interface, chain, methods)?;
                }
                InterfaceElem::Embed(_) | InterfaceElem::TypeSet(_) => {
                    return Err(ExtractionError::Unsupported {
                        name: interface.to_string(),
                        reason: "constraint interfaces with type sets cannot be mocked".to_string(),
                    })
                }
            }
        }
        Ok(())
    }

    fn embed(
        &self,
        scope: &Scope,
        qualifier: Option<&str>,
        name: &str,
        interface: &str,
        chain: &mut Vec<String>,
        methods: &mut Vec<MethodSignature>,
    ) -> Result<(), ExtractionError> {
        let (target_scope, target) = match self.lookup(scope, qualifier, name)? {
            Target::Decl(target_scope, target) => (target_scope, target),
            Target::Predeclared(target) => {
                let elems = predeclared_interface(&target).ok_or_else(|| {
                    ExtractionError::Unsupported {
                        name: interface.to_string(),
                        reason: format!("embeds the constraint `{target}`"),
                    }
                })?;
                return self.flatten(scope, &elems, interface, chain, methods);
            }
        };

        let key = qualified_name(&target_scope.package, &target);
        if chain.contains(&key) {
            chain.push(key);
            return Err(ExtractionError::EmbeddingCycle {
                interface: interface.to_string(),
                chain: chain.clone(),
            });
        }
        if_chain! {
            if let Some((_, decl)) = target_scope.package.lookup(&target);
            if !decl.type_params.is_empty();
            then {
                return Err(ExtractionError::Unsupported {
                    name: interface.to_string(),
                    reason: format!("embeds the generic interface `{target}`"),
                });
            }
        }

        debug!("flattening {key} into {interface}");
        chain.push(key);
        let (body_scope, elems) = self.interface_body(&target_scope, &target, 0)?;
        self.flatten(&body_scope, &elems, interface, chain, methods)?;
        chain.pop();
        Ok(())
    }

    fn method_signature(
        &self,
        scope: &Scope,
        name: &str,
        sig: &Signature,
    ) -> Result<MethodSignature, ExtractionError> {
        let params = sig
            .params
            .iter()
            .enumerate()
            .map(|(i, field)| {
                let name = match field.name.as_deref() {
                    None | Some("_") => format!("_param{i}"),
                    Some(name) => name.to_string(),
                };
                Ok(Parameter::new(name, self.resolve(scope, &field.ty, 0)?))
            })
            .collect::<Result<Vec<_>, ExtractionError>>()?;
        let results = sig
            .results
            .iter()
            .map(|field| self.resolve(scope, &field.ty, 0))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(MethodSignature::new(name, params, results))
    }

    fn resolve(
        &self,
        scope: &Scope,
        expr: &TypeExpr,
        depth: usize,
    ) -> Result<TypeRef, ExtractionError> {
        let ty = match expr {
            TypeExpr::Name {
                qualifier,
                name,
                args,
            } => return self.resolve_name(scope, qualifier.as_deref(), name, args, depth),
            TypeExpr::Pointer(inner) => TypeRef::pointer(self.resolve(scope, inner, depth)?),
            TypeExpr::Slice(inner) => TypeRef::slice(self.resolve(scope, inner, depth)?),
            TypeExpr::Array(len, inner) => {
                TypeRef::Array(len.clone(), Box::new(self.resolve(scope, inner, depth)?))
            }
            TypeExpr::Map(key, value) => TypeRef::map(
                self.resolve(scope, key, depth)?,
                self.resolve(scope, value, depth)?,
            ),
            TypeExpr::Chan(dir, inner) => TypeRef::chan(*dir, self.resolve(scope, inner, depth)?),
            TypeExpr::Func(sig) => TypeRef::Func(FuncType {
                params: sig
                    .params
                    .iter()
                    .map(|field| self.resolve(scope, &field.ty, depth))
                    .collect::<Result<_, _>>()?,
                results: sig
                    .results
                    .iter()
                    .map(|field| self.resolve(scope, &field.ty, depth))
                    .collect::<Result<_, _>>()?,
            }),
            TypeExpr::Interface(elems) => {
                let mut methods = Vec::new();
                self.flatten(scope, elems, "interface{}", &mut Vec::new(), &mut methods)?;
                TypeRef::Interface(methods)
            }
            TypeExpr::Struct(fields) => TypeRef::Struct(
                fields
                    .iter()
                    .map(|field| {
                        Ok(StructField {
                            name: field.name.clone(),
                            ty: self.resolve(scope, &field.ty, depth)?,
                        })
                    })
                    .collect::<Result<_, ExtractionError>>()?,
            ),
            TypeExpr::Ellipsis(inner) => TypeRef::variadic(self.resolve(scope, inner, depth)?),
        };
        Ok(ty)
    }

    fn resolve_name(
        &self,
        scope: &Scope,
        qualifier: Option<&str>,
        name: &str,
        args: &[TypeExpr],
        depth: usize,
    ) -> Result<TypeRef, ExtractionError> {
        let type_args = args
            .iter()
            .map(|arg| self.resolve(scope, arg, depth))
            .collect::<Result<Vec<_>, _>>()?;

        let target = match qualifier {
            // A package we cannot read still names its types; only aliases
            // inside it go unresolved.
            Some(qualifier) => {
                let import_path = self.import_path(scope, qualifier)?;
                match self.loader.load(&import_path) {
                    Ok(package) => match package.lookup(name) {
                        Some((file, _)) => Target::Decl(Scope { package, file }, name.to_string()),
                        None => {
                            return Err(ExtractionError::UnresolvedIdent {
                                package: import_path,
                                ident: name.to_string(),
                            })
                        }
                    },
                    Err(err) => {
                        debug!("keeping {import_path}.{name} opaque: {err}");
                        return Ok(TypeRef::Named(NamedType {
                            package: import_path,
                            name: name.to_string(),
                            type_args,
                        }));
                    }
                }
            }
            None => self.lookup(scope, None, name)?,
        };

        match target {
            Target::Predeclared(name) => Ok(TypeRef::Named(NamedType {
                package: String::new(),
                name,
                type_args,
            })),
            Target::Decl(decl_scope, name) => {
                if_chain! {
                    if type_args.is_empty();
                    if let Some((_, TypeSpec { alias: true, ty, .. })) = decl_scope.package.lookup(&name);
                    then {
                        if depth >= MAX_ALIAS_DEPTH {
                            return Err(ExtractionError::Unsupported {
                                name,
                                reason: "alias chain too deep".to_string(),
                            });
                        }
                        let target = ty.as_ref().map_err(|err| decl_scope.file().syntax_error(err))?;
                        return self.resolve(&decl_scope, target, depth + 1);
                    }
                }
                Ok(TypeRef::Named(NamedType {
                    package: decl_scope.package.import_path.clone(),
                    name,
                    type_args,
                }))
            }
        }
    }

    /// Finds what `qualifier.name` (or plain `name`) refers to from `scope`.
    /// The returned scope is the file holding the declaration.
    fn lookup(
        &self,
        scope: &Scope,
        qualifier: Option<&str>,
        name: &str,
    ) -> Result<Target, ExtractionError> {
        if let Some(qualifier) = qualifier {
            let import_path = self.import_path(scope, qualifier)?;
            let package = self.loader.load(&import_path)?;
            return match package.lookup(name) {
                Some((file, _)) => Ok(Target::Decl(Scope { package, file }, name.to_string())),
                None => Err(ExtractionError::UnresolvedIdent {
                    package: import_path,
                    ident: name.to_string(),
                }),
            };
        }

        if let Some((file, _)) = scope.package.lookup(name) {
            let package = Rc::clone(&scope.package);
            return Ok(Target::Decl(Scope { package, file }, name.to_string()));
        }

        let dot_imports = scope
            .file()
            .ast
            .imports
            .iter()
            .filter(|import| import.alias.as_deref() == Some("."));
        for import in dot_imports {
            match self.loader.load(&import.path) {
                Ok(package) => {
                    if let Some((file, _)) = package.lookup(name) {
                        return Ok(Target::Decl(Scope { package, file }, name.to_string()));
                    }
                }
                Err(err) => debug!("skipping dot import {}: {err}", import.path),
            }
        }

        if is_predeclared(name) {
            return Ok(Target::Predeclared(name.to_string()));
        }

        Err(ExtractionError::UnresolvedIdent {
            package: scope.package.import_path.clone(),
            ident: name.to_string(),
        })
    }

    /// Import path behind `qualifier` in the file of `scope`.
    fn import_path(&self, scope: &Scope, qualifier: &str) -> Result<String, ExtractionError> {
        let imports = &scope.file().ast.imports;

        if let Some(import) = imports
            .iter()
            .find(|import| import.alias.as_deref() == Some(qualifier))
        {
            return Ok(import.path.clone());
        }

        let unaliased = imports.iter().filter(|import| import.alias.is_none());
        if let Some(import) = unaliased
            .clone()
            .find(|import| guess_package_name(&import.path) == qualifier)
        {
            return Ok(import.path.clone());
        }

        // The package clause may differ from the last path element.
        for import in unaliased {
            if let Ok(package) = self.loader.load(&import.path) {
                if package.name == qualifier {
                    return Ok(import.path.clone());
                }
            }
        }

        Err(ExtractionError::UnresolvedImport {
            import: qualifier.to_string(),
        })
    }
}

fn push_method(
    interface: &str,
    methods: &mut Vec<MethodSignature>,
    method: MethodSignature,
) -> Result<(), ExtractionError> {
    if methods.iter().any(|m| m.name == method.name) {
        return Err(ExtractionError::MethodCollision {
            interface: interface.to_string(),
            method: method.name,
        });
    }
    methods.push(method);
    Ok(())
}

/// Method sets of the predeclared interfaces.
fn predeclared_interface(name: &str) -> Option<Vec<InterfaceElem>> {
    match name {
        "any" => Some(Vec::new()),
        "error" => Some(vec![InterfaceElem::Method {
            name: "Error".to_string(),
            sig: Signature {
                params: Vec::new(),
                results: vec![crate::ast::Field {
                    name: None,
                    ty: TypeExpr::name("string"),
                }],
            },
        }]),
        _ => None,
    }
}

fn qualified_name(package: &Package, name: &str) -> String {
    format!("{}.{name}", package.import_path)
}
