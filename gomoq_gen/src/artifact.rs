use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use gomoq_model::TypeRef;

pub const DEFAULT_RUNTIME_IMPORT: &str = "github.com/petergtz/pegomock/v4";
pub const DEFAULT_MATCHERS_DIR: &str = "matchers";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateOptions {
    pub destination: PathBuf,
    pub package_name: String,
    /// Import path of the package the mock is generated into. Its types
    /// render unqualified.
    pub self_package: String,
    pub generate_matchers: bool,
    pub runtime_import: String,
}

impl GenerateOptions {
    pub fn new(destination: impl Into<PathBuf>, package_name: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            package_name: package_name.into(),
            self_package: String::new(),
            generate_matchers: false,
            runtime_import: DEFAULT_RUNTIME_IMPORT.to_string(),
        }
    }
}

/// Rendered mock source for one interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedArtifact {
    pub destination: PathBuf,
    pub package_name: String,
    pub source: String,
    /// Parameter types, a variadic parameter counting as its slice type.
    pub referenced_types: BTreeSet<TypeRef>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatcherOptions {
    pub destination_dir: PathBuf,
    pub package_name: String,
    pub runtime_import: String,
}

impl MatcherOptions {
    /// Matchers next to the mock in `<mock dir>/<matchers_dir>`, in a package
    /// named after that directory.
    pub fn for_mock(mock: &Path, matchers_dir: &str, runtime_import: &str) -> Self {
        let mock_dir = mock.parent().unwrap_or_else(|| Path::new(""));
        let destination_dir = mock_dir.join(matchers_dir);
        Self::in_dir(destination_dir, runtime_import)
    }

    pub fn in_dir(destination_dir: impl Into<PathBuf>, runtime_import: &str) -> Self {
        let destination_dir = destination_dir.into();
        let package_name = destination_dir
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| DEFAULT_MATCHERS_DIR.to_string());
        Self {
            destination_dir,
            package_name,
            runtime_import: runtime_import.to_string(),
        }
    }
}

/// Rendered matcher source for one parameter type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatcherArtifact {
    pub ty: TypeRef,
    pub destination: PathBuf,
    pub source: String,
}
