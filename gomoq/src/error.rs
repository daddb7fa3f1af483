use std::path::PathBuf;

use gomoq_gen::GenerationError;
use gomoq_model::SignatureConstraintError;
use gomoq_modelgen::ExtractionError;
use miette::Diagnostic;
use thiserror::Error;

/// Everything a gomoq command can fail with.
#[derive(Debug, Error, Diagnostic)]
pub enum GomoqError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    #[diagnostic(code(gomoq::constraint))]
    Constraint(#[from] SignatureConstraintError),

    #[error("cannot access `{}`", path.display())]
    #[diagnostic(code(gomoq::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    #[diagnostic(code(gomoq::usage), help("run `gomoq help` for the accepted arguments"))]
    Usage(String),

    #[error("cannot install the interrupt handler")]
    #[diagnostic(code(gomoq::signal))]
    Signal(#[from] ctrlc::Error),

    #[error("invalid configuration in `{}`", path.display())]
    #[diagnostic(code(gomoq::config))]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl GomoqError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GomoqError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn usage(message: impl Into<String>) -> Self {
        GomoqError::Usage(message.into())
    }
}
