use gomoq_model::InterfaceModel;

use crate::artifact::GenerateOptions;
use crate::imports::Imports;
use crate::utils;
use crate::validate::validate;

/// Everything the renderers of one mock share.
#[derive(Debug)]
pub struct Context<'a> {
    pub model: &'a InterfaceModel,
    pub options: &'a GenerateOptions,
    pub imports: Imports,

    pub mock_ident: String,
    pub verifier_ident: String,

    /// The interface as the mock package spells it, `None` when the mock
    /// package cannot refer to it.
    pub interface_ref: Option<String>,
}

impl<'a> Context<'a> {
    pub fn from_model(
        model: &'a InterfaceModel,
        options: &'a GenerateOptions,
    ) -> Result<Self, crate::GenerationError> {
        validate(model, &options.self_package)?;

        let mut imports = Imports::new(&options.runtime_import, &options.self_package)?;
        for package in model.referenced_packages() {
            imports.add(&package)?;
        }

        let same_package = model.package == options.self_package;
        let interface_ref = if same_package {
            Some(model.name.clone())
        } else if model.is_exported() && !model.package.is_empty() {
            imports.add(&model.package)?;
            imports
                .qualifier(&model.package)
                .map(|qualifier| format!("{qualifier}.{}", model.name))
        } else {
            None
        };

        Ok(Self {
            model,
            options,
            imports,
            mock_ident: utils::format_mock_ident(&model.name),
            verifier_ident: utils::format_verifier_ident(&model.name),
            interface_ref,
        })
    }
}
