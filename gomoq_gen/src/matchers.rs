//! Argument matchers for the parameter types of generated mocks.
//!
//! Every distinct non-predeclared parameter type gets one file with four
//! functions: `AnyT`, `EqT`, `NotEqT` and `TThat`.

use std::collections::{BTreeSet, HashMap};

use gomoq_model::{guess_package_name, is_exported, ChanDir, TypeRef};
use if_chain::if_chain;
use itertools::Itertools;
use log::{debug, warn};

use crate::artifact::{GeneratedArtifact, MatcherArtifact, MatcherOptions};
use crate::error::GenerationError;
use crate::imports::Imports;
use crate::render::{render_reflect_type, render_type};
use crate::symbols::{self, NULL_VALUE, RUNTIME};
use crate::utils::{capitalize, dedupe_param_names, to_camel_case, to_snake_case};
use crate::writer::{go, GoWriter, ToGo};

/// Renders the matchers of every parameter type used by `artifacts`, each
/// type once.
pub fn generate_matchers(
    artifacts: &[GeneratedArtifact],
    options: &MatcherOptions,
) -> Result<Vec<MatcherArtifact>, GenerationError> {
    let types = artifacts
        .iter()
        .flat_map(|artifact| &artifact.referenced_types)
        .filter(|ty| !ty.is_builtin())
        .collect::<BTreeSet<_>>();

    let mut used_names: HashMap<String, usize> = HashMap::new();
    let mut out = Vec::new();
    for ty in types {
        if let Some(name) = unreachable_name(ty) {
            warn!("no matcher for {ty}: `{name}` is not exported");
            continue;
        }

        let base = matcher_name(ty);
        let count = used_names.entry(base.clone()).or_insert(0);
        *count += 1;
        let name = match *count {
            1 => base,
            n => format!("{base}{n}"),
        };

        let matcher = Matcher::new(ty, &name, options)?;
        let destination = options
            .destination_dir
            .join(format!("{}.go", to_snake_case(&name)));
        debug!("matcher {name} for {ty}");
        out.push(MatcherArtifact {
            ty: ty.clone(),
            destination,
            source: matcher.to_go_string(),
        });
    }
    Ok(out)
}

/// Matchers live in their own package and can only name exported types.
fn unreachable_name(ty: &TypeRef) -> Option<String> {
    let mut found = None;
    ty.walk(&mut |ty| {
        if_chain! {
            if found.is_none();
            if let TypeRef::Named(named) = ty;
            if !named.package.is_empty() && !is_exported(&named.name);
            then {
                found = Some(named.name.clone());
            }
        }
    });
    found
}

/// Structural name of a type: `PtrToHttpRequest`, `SliceOfString`,
/// `MapOfStringToInt`, `RecvChanOfInt`.
pub fn matcher_name(ty: &TypeRef) -> String {
    match ty {
        TypeRef::Named(named) => {
            let mut name = if named.package.is_empty() {
                capitalize(&named.name)
            } else {
                format!(
                    "{}{}",
                    to_camel_case(&guess_package_name(&named.package)),
                    capitalize(&named.name)
                )
            };
            if !named.type_args.is_empty() {
                name.push_str("Of");
                name.push_str(&named.type_args.iter().map(matcher_name).join("And"));
            }
            name
        }
        TypeRef::Pointer(inner) => format!("PtrTo{}", matcher_name(inner)),
        TypeRef::Slice(inner) | TypeRef::Variadic(inner) => format!("SliceOf{}", matcher_name(inner)),
        TypeRef::Array(len, inner) => {
            format!("ArrayOf{}{}", to_camel_case(len), matcher_name(inner))
        }
        TypeRef::Map(key, value) => {
            format!("MapOf{}To{}", matcher_name(key), matcher_name(value))
        }
        TypeRef::Chan(dir, inner) => {
            let prefix = match dir {
                ChanDir::Both => "",
                ChanDir::Send => "Send",
                ChanDir::Recv => "Recv",
            };
            format!("{prefix}ChanOf{}", matcher_name(inner))
        }
        TypeRef::Func(func) => {
            let mut name = "Func".to_string();
            if !func.params.is_empty() {
                name.push_str("From");
                name.push_str(&func.params.iter().map(matcher_name).join("And"));
            }
            if !func.results.is_empty() {
                name.push_str("To");
                name.push_str(&func.results.iter().map(matcher_name).join("And"));
            }
            name
        }
        TypeRef::Interface(methods) if methods.is_empty() => "Interface".to_string(),
        TypeRef::Interface(methods) => {
            format!("InterfaceWith{}", methods.iter().map(|m| capitalize(&m.name)).join(""))
        }
        TypeRef::Struct(fields) if fields.is_empty() => "Struct".to_string(),
        TypeRef::Struct(fields) => format!(
            "StructWith{}",
            fields
                .iter()
                .map(|field| match &field.name {
                    Some(name) => capitalize(name),
                    None => matcher_name(&field.ty),
                })
                .join("")
        ),
    }
}

#[derive(Debug)]
struct Matcher {
    name: String,
    package_name: String,
    imports: Imports,
    ty: String,
    reflect_ty: String,
    /// Parameter names, clear of the import aliases.
    value: String,
    matcher: String,
}

impl Matcher {
    fn new(ty: &TypeRef, name: &str, options: &MatcherOptions) -> Result<Self, GenerationError> {
        let mut imports = Imports::empty("");
        imports.insert_fixed(&options.runtime_import, RUNTIME)?;
        imports.insert_fixed(symbols::REFLECT_IMPORT, symbols::REFLECT)?;
        for package in ty.packages() {
            imports.add(&package)?;
        }

        let mut params = dedupe_param_names(["value", "matcher"], &imports).into_iter();
        let value = params.next().unwrap_or_default();
        let matcher = params.next().unwrap_or_default();

        Ok(Self {
            value,
            matcher,
            name: name.to_string(),
            package_name: options.package_name.clone(),
            ty: render_type(ty, &imports),
            reflect_ty: render_reflect_type(ty, &imports),
            imports,
        })
    }

    fn func(&self, dst: &mut GoWriter, name: &str, params: &str, register: &str) {
        let ty = &self.ty;
        dst.block(format!("func {name}({params}) {ty} {{"), "}", |dst| {
            go!(dst, "{RUNTIME}.RegisterMatcher({register})");
            go!(dst, "var {NULL_VALUE} {ty}");
            go!(dst, "return {NULL_VALUE}");
        });
    }
}

impl ToGo for Matcher {
    fn to_go(&self, dst: &mut GoWriter) {
        let name = &self.name;
        let ty = &self.ty;
        let value = &self.value;
        let matcher = &self.matcher;

        dst.line(symbols::MARKER);
        go!(dst, "package {}", self.package_name);
        dst.blank();
        self.imports.to_go(dst);
        dst.blank();

        self.func(
            dst,
            &format!("Any{name}"),
            "",
            &format!("{RUNTIME}.NewAnyMatcher({})", self.reflect_ty),
        );
        dst.blank();
        self.func(
            dst,
            &format!("Eq{name}"),
            &format!("{value} {ty}"),
            &format!("&{RUNTIME}.EqMatcher{{Value: {value}}}"),
        );
        dst.blank();
        self.func(
            dst,
            &format!("NotEq{name}"),
            &format!("{value} {ty}"),
            &format!("&{RUNTIME}.NotEqMatcher{{Value: {value}}}"),
        );
        dst.blank();
        self.func(
            dst,
            &format!("{name}That"),
            &format!("{matcher} {RUNTIME}.ArgumentMatcher"),
            matcher,
        );
    }
}
