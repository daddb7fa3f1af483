use std::collections::HashSet;

use crate::error::SignatureConstraintError;
use crate::model::InterfaceModel;
use crate::types::{MethodSignature, TypeRef};

/// Rejects method sets that cannot be expressed in Go.
pub fn validate(model: &InterfaceModel) -> Result<(), SignatureConstraintError> {
    check_method_names(model)?;
    for method in &model.methods {
        check_params(model, method)?;
        check_results(model, method)?;
    }
    Ok(())
}

fn check_method_names(model: &InterfaceModel) -> Result<(), SignatureConstraintError> {
    let mut seen = HashSet::new();
    for method in &model.methods {
        if method.name.is_empty() {
            return Err(SignatureConstraintError::EmptyMethodName {
                interface: model.name.clone(),
            });
        }
        if !seen.insert(method.name.as_str()) {
            return Err(SignatureConstraintError::DuplicateMethod {
                interface: model.name.clone(),
                method: method.name.clone(),
            });
        }
    }
    Ok(())
}

fn check_params(
    model: &InterfaceModel,
    method: &MethodSignature,
) -> Result<(), SignatureConstraintError> {
    let last = method.params.len().saturating_sub(1);
    for (i, param) in method.params.iter().enumerate() {
        let inner = match &param.ty {
            TypeRef::Variadic(_) if i != last => {
                return Err(SignatureConstraintError::VariadicNotLast {
                    interface: model.name.clone(),
                    method: method.name.clone(),
                    param: param.name.clone(),
                })
            }
            TypeRef::Variadic(inner) => inner,
            ty => ty,
        };
        check_nested(model, method, inner)?;
    }
    Ok(())
}

fn check_results(
    model: &InterfaceModel,
    method: &MethodSignature,
) -> Result<(), SignatureConstraintError> {
    for ty in &method.results {
        if ty.is_variadic() {
            return Err(SignatureConstraintError::VariadicResult {
                interface: model.name.clone(),
                method: method.name.clone(),
            });
        }
        check_nested(model, method, ty)?;
    }
    Ok(())
}

/// A variadic may only appear as the last parameter of a nested func type.
fn check_nested(
    model: &InterfaceModel,
    method: &MethodSignature,
    ty: &TypeRef,
) -> Result<(), SignatureConstraintError> {
    let nested_err = || SignatureConstraintError::NestedVariadic {
        interface: model.name.clone(),
        method: method.name.clone(),
        ty: ty.to_string(),
    };

    match ty {
        TypeRef::Variadic(_) => Err(nested_err()),
        TypeRef::Func(func) => {
            let last = func.params.len().saturating_sub(1);
            for (i, param) in func.params.iter().enumerate() {
                match param {
                    TypeRef::Variadic(inner) if i == last => check_nested(model, method, inner)?,
                    TypeRef::Variadic(_) => return Err(nested_err()),
                    other => check_nested(model, method, other)?,
                }
            }
            for result in &func.results {
                check_nested(model, method, result)?;
            }
            Ok(())
        }
        TypeRef::Named(named) => named
            .type_args
            .iter()
            .try_for_each(|arg| check_nested(model, method, arg)),
        TypeRef::Pointer(inner)
        | TypeRef::Slice(inner)
        | TypeRef::Array(_, inner)
        | TypeRef::Chan(_, inner) => check_nested(model, method, inner),
        TypeRef::Map(key, value) => {
            check_nested(model, method, key)?;
            check_nested(model, method, value)
        }
        TypeRef::Interface(methods) => {
            let nested = InterfaceModel::new(model.name.clone(), model.package.clone(), methods.clone());
            methods.iter().try_for_each(|m| {
                check_params(&nested, m)?;
                check_results(&nested, m)
            })
        }
        TypeRef::Struct(fields) => fields
            .iter()
            .try_for_each(|field| check_nested(model, method, &field.ty)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FuncType, Parameter};

    fn model(methods: Vec<MethodSignature>) -> InterfaceModel {
        InterfaceModel::new("Store", "example.com/store", methods)
    }

    fn string() -> TypeRef {
        TypeRef::builtin("string")
    }

    #[test]
    fn accepts_trailing_variadic() {
        let m = model(vec![MethodSignature::new(
            "Put",
            vec![
                Parameter::new("key", string()),
                Parameter::new("values", TypeRef::variadic(string())),
            ],
            vec![],
        )]);
        assert_eq!(validate(&m), Ok(()));
    }

    #[test]
    fn accepts_variadic_callback() {
        let callback = TypeRef::Func(FuncType {
            params: vec![string(), TypeRef::variadic(TypeRef::builtin("int"))],
            results: vec![],
        });
        let m = model(vec![MethodSignature::new(
            "Each",
            vec![Parameter::new("f", callback)],
            vec![],
        )]);
        assert_eq!(validate(&m), Ok(()));
    }

    #[test]
    fn rejects_duplicate_method() {
        let m = model(vec![
            MethodSignature::new("Get", vec![], vec![]),
            MethodSignature::new("Get", vec![], vec![string()]),
        ]);
        assert!(matches!(
            validate(&m),
            Err(SignatureConstraintError::DuplicateMethod { method, .. }) if method == "Get"
        ));
    }

    #[test]
    fn rejects_empty_name() {
        let m = model(vec![MethodSignature::new("", vec![], vec![])]);
        assert!(matches!(
            validate(&m),
            Err(SignatureConstraintError::EmptyMethodName { .. })
        ));
    }

    #[test]
    fn rejects_non_last_variadic() {
        let m = model(vec![MethodSignature::new(
            "Put",
            vec![
                Parameter::new("values", TypeRef::variadic(string())),
                Parameter::new("key", string()),
            ],
            vec![],
        )]);
        assert!(matches!(
            validate(&m),
            Err(SignatureConstraintError::VariadicNotLast { param, .. }) if param == "values"
        ));
    }

    #[test]
    fn rejects_nested_variadic() {
        let m = model(vec![MethodSignature::new(
            "Put",
            vec![Parameter::new("values", TypeRef::slice(TypeRef::variadic(string())))],
            vec![],
        )]);
        assert!(matches!(
            validate(&m),
            Err(SignatureConstraintError::NestedVariadic { .. })
        ));
    }

    #[test]
    fn rejects_variadic_result() {
        let m = model(vec![MethodSignature::new(
            "All",
            vec![],
            vec![TypeRef::variadic(string())],
        )]);
        assert!(matches!(
            validate(&m),
            Err(SignatureConstraintError::VariadicResult { .. })
        ));
    }
}
