use gomoq_model::{is_exported, is_predeclared, InterfaceModel, TypeRef};

use crate::error::GenerationError;
use crate::imports::check_import_path;

/// Checks that a mock of `model` placed in `self_package` can compile.
pub fn validate(model: &InterfaceModel, self_package: &str) -> Result<(), GenerationError> {
    gomoq_model::validate(model)?;
    check_methods(model, self_package)?;
    check_types(model, self_package)?;
    Ok(())
}

fn check_methods(model: &InterfaceModel, self_package: &str) -> Result<(), GenerationError> {
    if model.package == self_package {
        return Ok(());
    }
    match model.methods.iter().find(|m| !is_exported(&m.name)) {
        Some(method) => Err(GenerationError::UnexportedMethod {
            interface: model.name.clone(),
            method: method.name.clone(),
        }),
        None => Ok(()),
    }
}

fn check_types(model: &InterfaceModel, self_package: &str) -> Result<(), GenerationError> {
    let mut result = Ok(());
    for ty in model.types() {
        ty.walk(&mut |ty| {
            if result.is_ok() {
                result = check_type(ty, self_package);
            }
        });
    }
    result
}

fn check_type(ty: &TypeRef, self_package: &str) -> Result<(), GenerationError> {
    let TypeRef::Named(named) = ty else {
        return Ok(());
    };
    if named.package.is_empty() {
        if is_predeclared(&named.name) {
            return Ok(());
        }
        return Err(GenerationError::UnqualifiedType {
            name: named.name.clone(),
        });
    }

    check_import_path(&named.package)?;
    if named.package != self_package && !is_exported(&named.name) {
        return Err(GenerationError::UnexportedType {
            package: named.package.clone(),
            name: named.name.clone(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use gomoq_model::{MethodSignature, Parameter};

    use super::*;

    fn model(method: &str, ty: TypeRef) -> InterfaceModel {
        InterfaceModel::new(
            "Store",
            "example.com/app/store",
            vec![MethodSignature::new(method, vec![Parameter::new("v", ty)], vec![])],
        )
    }

    #[test]
    fn unexported_methods_need_the_same_package() {
        let model = model("get", TypeRef::builtin("int"));
        assert!(matches!(
            validate(&model, ""),
            Err(GenerationError::UnexportedMethod { .. })
        ));
        assert!(validate(&model, "example.com/app/store").is_ok());
    }

    #[test]
    fn named_types() {
        let unqualified = model("Get", TypeRef::slice(TypeRef::builtin("Key")));
        assert!(matches!(
            validate(&unqualified, ""),
            Err(GenerationError::UnqualifiedType { name }) if name == "Key"
        ));

        let unexported = model("Get", TypeRef::named("example.com/app/store", "key"));
        assert!(matches!(
            validate(&unexported, ""),
            Err(GenerationError::UnexportedType { .. })
        ));
        assert!(validate(&unexported, "example.com/app/store").is_ok());

        let bad_path = model("Get", TypeRef::named("example.com/a b", "Key"));
        assert!(matches!(
            validate(&bad_path, ""),
            Err(GenerationError::InvalidImportPath { .. })
        ));
    }
}
