use std::path::PathBuf;

use gomoq_model::SignatureConstraintError;
use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use crate::parser::SyntaxError;

/// Reasons an interface model could not be extracted.
#[derive(Debug, Error, Diagnostic)]
pub enum ExtractionError {
    #[error("failed to parse `{file}`: {message}")]
    #[diagnostic(code(gomoq::extract::parse))]
    Parse {
        file: String,
        message: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("{message}")]
        span: SourceSpan,
    },

    #[error("interface `{name}` not found in package `{package}`")]
    #[diagnostic(code(gomoq::extract::interface_not_found))]
    InterfaceNotFound { package: String, name: String },

    #[error("`{name}` in package `{package}` is not an interface")]
    #[diagnostic(code(gomoq::extract::not_an_interface))]
    NotAnInterface { package: String, name: String },

    #[error("the source model generator mocks exactly one interface per package, {count} were requested")]
    #[diagnostic(
        code(gomoq::extract::multiple_interfaces),
        help("run one generation per interface, or use the default reflect-based model generator")
    )]
    MultipleInterfaces { count: usize },

    #[error("the reflect-based model generator cannot read the source file `{}`", path.display())]
    #[diagnostic(code(gomoq::extract::source_file_unsupported))]
    SourceFileUnsupported { path: PathBuf },

    #[error("cannot resolve import `{import}`")]
    #[diagnostic(
        code(gomoq::extract::unresolved_import),
        help("make sure the package is part of the module, vendored, or in GOPATH")
    )]
    UnresolvedImport { import: String },

    #[error("undefined type `{ident}` in package `{package}`")]
    #[diagnostic(code(gomoq::extract::unresolved_ident))]
    UnresolvedIdent { package: String, ident: String },

    #[error("method `{method}` of interface `{interface}` is declared more than once")]
    #[diagnostic(code(gomoq::extract::method_collision))]
    MethodCollision { interface: String, method: String },

    #[error("interface `{interface}` embeds itself through {}", chain.join(" -> "))]
    #[diagnostic(code(gomoq::extract::embedding_cycle))]
    EmbeddingCycle { interface: String, chain: Vec<String> },

    #[error("cannot mock `{name}`: {reason}")]
    #[diagnostic(code(gomoq::extract::unsupported))]
    Unsupported { name: String, reason: String },

    #[error("`{program}` failed ({status}):\n{stderr}")]
    #[diagnostic(code(gomoq::extract::toolchain))]
    Toolchain {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("cannot decode the reflection output")]
    #[diagnostic(code(gomoq::extract::decode))]
    Decode(#[source] serde_json::Error),

    #[error("cannot read `{}`", path.display())]
    #[diagnostic(code(gomoq::extract::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    #[diagnostic(code(gomoq::extract::constraint))]
    Constraint(#[from] SignatureConstraintError),
}

impl ExtractionError {
    pub(crate) fn parse(file: impl Into<String>, source: &str, err: SyntaxError) -> Self {
        let file = file.into();
        Self::Parse {
            src: NamedSource::new(file.clone(), source.to_string()),
            span: err.span.into(),
            message: err.message,
            file,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
