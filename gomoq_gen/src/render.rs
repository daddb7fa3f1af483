use gomoq_model::{ChanDir, MethodSignature, TypeRef};
use itertools::Itertools;

use crate::imports::Imports;
use crate::symbols;

/// Go spelling of `ty` as seen from the generated file.
pub fn render_type(ty: &TypeRef, imports: &Imports) -> String {
    match ty {
        TypeRef::Named(named) => {
            let mut out = match imports.qualifier(&named.package) {
                Some(qualifier) => format!("{qualifier}.{}", named.name),
                None => named.name.clone(),
            };
            if !named.type_args.is_empty() {
                let args = named
                    .type_args
                    .iter()
                    .map(|arg| render_type(arg, imports))
                    .join(", ");
                out.push_str(&format!("[{args}]"));
            }
            out
        }
        TypeRef::Pointer(inner) => format!("*{}", render_type(inner, imports)),
        TypeRef::Slice(inner) => format!("[]{}", render_type(inner, imports)),
        TypeRef::Array(len, inner) => format!("[{len}]{}", render_type(inner, imports)),
        TypeRef::Map(key, value) => format!(
            "map[{}]{}",
            render_type(key, imports),
            render_type(value, imports)
        ),
        TypeRef::Chan(dir, inner) => {
            let elem = render_type(inner, imports);
            match (dir, &**inner) {
                (ChanDir::Both, TypeRef::Chan(ChanDir::Recv, _)) => format!("chan ({elem})"),
                (ChanDir::Both, _) => format!("chan {elem}"),
                (ChanDir::Send, _) => format!("chan<- {elem}"),
                (ChanDir::Recv, _) => format!("<-chan {elem}"),
            }
        }
        TypeRef::Func(func) => format!(
            "func({}){}",
            func.params.iter().map(|p| render_type(p, imports)).join(", "),
            render_results(&func.results, imports)
        ),
        TypeRef::Interface(methods) if methods.is_empty() => "interface{}".to_string(),
        TypeRef::Interface(methods) => format!(
            "interface{{ {} }}",
            methods.iter().map(|m| render_method_spec(m, imports)).join("; ")
        ),
        TypeRef::Struct(fields) if fields.is_empty() => "struct{}".to_string(),
        TypeRef::Struct(fields) => {
            let fields = fields.iter().map(|field| {
                let ty = render_type(&field.ty, imports);
                match &field.name {
                    Some(name) => format!("{name} {ty}"),
                    None => ty,
                }
            });
            format!("struct{{ {} }}", fields.format("; "))
        }
        TypeRef::Variadic(inner) => format!("...{}", render_type(inner, imports)),
    }
}

/// ` T` or ` (T, U)`, empty without results.
pub fn render_results(results: &[TypeRef], imports: &Imports) -> String {
    match results {
        [] => String::new(),
        [single] => format!(" {}", render_type(single, imports)),
        many => format!(
            " ({})",
            many.iter().map(|ty| render_type(ty, imports)).join(", ")
        ),
    }
}

/// `M(T, U) R` as it appears inside an interface type.
fn render_method_spec(method: &MethodSignature, imports: &Imports) -> String {
    format!(
        "{}({}){}",
        method.name,
        method.params.iter().map(|p| render_type(&p.ty, imports)).join(", "),
        render_results(&method.results, imports)
    )
}

/// `reflect.Type` value of `ty`, usable for any type including interfaces.
pub fn render_reflect_type(ty: &TypeRef, imports: &Imports) -> String {
    format!(
        "{}.TypeOf((*{})(nil)).Elem()",
        symbols::REFLECT,
        render_type(ty, imports)
    )
}

#[cfg(test)]
mod tests {
    use gomoq_model::{FuncType, NamedType, Parameter, StructField};

    use super::*;

    fn imports() -> Imports {
        let mut imports = Imports::empty("example.com/app");
        imports.add("net/http").unwrap();
        imports
    }

    #[test]
    fn qualified_and_self_package_names() {
        let imports = imports();
        let request = TypeRef::pointer(TypeRef::named("net/http", "Request"));
        assert_eq!(render_type(&request, &imports), "*http.Request");
        assert_eq!(
            render_type(&TypeRef::named("example.com/app", "store"), &imports),
            "store"
        );
        let list = TypeRef::Named(NamedType {
            package: "example.com/app".to_string(),
            name: "List".to_string(),
            type_args: vec![TypeRef::builtin("int"), request],
        });
        assert_eq!(render_type(&list, &imports), "List[int, *http.Request]");
    }

    #[test]
    fn composite_types() {
        let imports = imports();
        let ty = TypeRef::map(
            TypeRef::builtin("string"),
            TypeRef::chan(
                ChanDir::Both,
                TypeRef::chan(ChanDir::Recv, TypeRef::Array("4".to_string(), Box::new(TypeRef::builtin("byte")))),
            ),
        );
        assert_eq!(render_type(&ty, &imports), "map[string]chan (<-chan [4]byte)");

        let func = TypeRef::Func(FuncType {
            params: vec![
                TypeRef::builtin("int"),
                TypeRef::variadic(TypeRef::empty_interface()),
            ],
            results: vec![TypeRef::builtin("bool"), TypeRef::builtin("error")],
        });
        assert_eq!(
            render_type(&func, &imports),
            "func(int, ...interface{}) (bool, error)"
        );

        let iface = TypeRef::Interface(vec![MethodSignature::new(
            "Close",
            vec![Parameter::new("force", TypeRef::builtin("bool"))],
            vec![TypeRef::builtin("error")],
        )]);
        assert_eq!(render_type(&iface, &imports), "interface{ Close(bool) error }");

        let st = TypeRef::Struct(vec![
            StructField {
                name: Some("Name".to_string()),
                ty: TypeRef::builtin("string"),
            },
            StructField {
                name: None,
                ty: TypeRef::pointer(TypeRef::named("net/http", "Client")),
            },
        ]);
        assert_eq!(render_type(&st, &imports), "struct{ Name string; *http.Client }");
        assert_eq!(
            render_reflect_type(&TypeRef::builtin("error"), &imports),
            "reflect.TypeOf((*error)(nil)).Elem()"
        );
    }
}
