//! Extraction of [`InterfaceModel`]s from Go packages and source files.
//!
//! Two interchangeable backends implement [`Extractor`]:
//!
//! * [`ReflectExtractor`] builds and runs a small Go program that describes
//!   the interfaces through `reflect`;
//! * [`SourceExtractor`] parses the Go sources itself and follows imports on
//!   demand.
//!
//! Both produce models with the same [`InterfaceModel::shape`].

use std::path::PathBuf;

use gomoq_model::InterfaceModel;

mod ast;
mod error;
mod lexer;
mod loader;
mod locator;
mod parser;
mod reflect;
mod resolver;
mod source;

pub use error::ExtractionError;
pub use locator::{Module, PackageLocator};
pub use parser::SyntaxError;
pub use reflect::{decode as decode_reflection, GoToolchain, ProgramRunner, ReflectExtractor};
pub use source::SourceExtractor;

/// What to extract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceRequest {
    /// Interfaces of a package, given as an import path or a directory
    /// relative to the working directory.
    Package {
        path: String,
        interfaces: Vec<String>,
    },
    /// Every interface declared in one Go source file.
    File { path: PathBuf },
}

impl SourceRequest {
    /// Builds a request from command line arguments: either a single `.go`
    /// file or a package followed by interface names.
    pub fn from_args(args: &[String]) -> Option<Self> {
        match args {
            [file] if file.ends_with(".go") => Some(SourceRequest::File {
                path: PathBuf::from(file),
            }),
            [path, interfaces @ ..] if !interfaces.is_empty() => Some(SourceRequest::Package {
                path: path.clone(),
                interfaces: interfaces.to_vec(),
            }),
            _ => None,
        }
    }

    pub fn is_source_file(&self) -> bool {
        matches!(self, SourceRequest::File { .. })
    }
}

/// A model generator backend.
pub trait Extractor {
    fn extract(&self, request: &SourceRequest) -> Result<Vec<InterfaceModel>, ExtractionError>;
}

impl<E: Extractor + ?Sized> Extractor for &E {
    fn extract(&self, request: &SourceRequest) -> Result<Vec<InterfaceModel>, ExtractionError> {
        (**self).extract(request)
    }
}

impl<E: Extractor + ?Sized> Extractor for Box<E> {
    fn extract(&self, request: &SourceRequest) -> Result<Vec<InterfaceModel>, ExtractionError> {
        (**self).extract(request)
    }
}
