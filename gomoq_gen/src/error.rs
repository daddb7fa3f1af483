use gomoq_model::SignatureConstraintError;
use miette::Diagnostic;
use thiserror::Error;

/// Reasons a model cannot be turned into a mock.
#[derive(Debug, Error, Diagnostic)]
pub enum GenerationError {
    #[error("invalid import path `{path}`")]
    #[diagnostic(code(gomoq::generate::invalid_import_path))]
    InvalidImportPath { path: String },

    #[error("type `{name}` is not predeclared and has no package")]
    #[diagnostic(code(gomoq::generate::unqualified_type))]
    UnqualifiedType { name: String },

    #[error("type `{name}` is not exported by package `{package}`")]
    #[diagnostic(
        code(gomoq::generate::unexported_type),
        help("generate the mock into package `{package}` with --self_package")
    )]
    UnexportedType { package: String, name: String },

    #[error("method `{method}` of interface `{interface}` is not exported")]
    #[diagnostic(
        code(gomoq::generate::unexported_method),
        help("a mock outside the interface's package cannot implement unexported methods")
    )]
    UnexportedMethod { interface: String, method: String },

    #[error(transparent)]
    #[diagnostic(code(gomoq::generate::constraint))]
    Constraint(#[from] SignatureConstraintError),
}
