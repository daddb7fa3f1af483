use std::path::{Path, PathBuf};

use gomoq_model::guess_package_name;

use crate::error::GomoqError;

/// Where the user asked mocks to go.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DestinationArgs {
    /// A single output file.
    pub output: Option<PathBuf>,
    /// A directory that receives one `mock_<interface>.go` per interface.
    pub output_dir: Option<PathBuf>,
    /// Package clause of the generated files.
    pub package: Option<String>,
}

/// Resolved file and package of one mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub file: PathBuf,
    pub package_name: String,
}

/// Turns [`DestinationArgs`] into concrete destinations, relative paths
/// being anchored at the working directory.
#[derive(Debug)]
pub struct DestinationResolver<'a> {
    work_dir: &'a Path,
    args: &'a DestinationArgs,
}

impl<'a> DestinationResolver<'a> {
    pub fn new(work_dir: &'a Path, args: &'a DestinationArgs) -> Result<Self, GomoqError> {
        if args.output.is_some() && args.output_dir.is_some() {
            return Err(GomoqError::usage(
                "--output and --output-dir are mutually exclusive",
            ));
        }
        Ok(Self { work_dir, args })
    }

    /// `<basename(workdir)>_test`, or `<basename(output-dir)>` when mocks go
    /// to their own directory.
    pub fn package_name(&self) -> String {
        if let Some(package) = &self.args.package {
            return package.clone();
        }
        match self.output_dir() {
            Some(dir) => package_ident(&dir),
            None => format!("{}_test", package_ident(self.work_dir)),
        }
    }

    /// One destination per interface, in the order given.
    pub fn resolve<S: AsRef<str>>(&self, interfaces: &[S]) -> Result<Vec<Destination>, GomoqError> {
        let package_name = self.package_name();

        if let Some(output) = &self.args.output {
            if interfaces.len() > 1 {
                return Err(GomoqError::usage(format!(
                    "--output names a single file, but {} interfaces were extracted",
                    interfaces.len()
                )));
            }
            return Ok(interfaces
                .iter()
                .map(|_| Destination {
                    file: self.anchor(output),
                    package_name: package_name.clone(),
                })
                .collect());
        }

        let output_dir = self.output_dir();
        Ok(interfaces
            .iter()
            .map(|interface| {
                let lower = interface.as_ref().to_lowercase();
                let file = match &output_dir {
                    Some(dir) => dir.join(format!("mock_{lower}.go")),
                    None => self.work_dir.join(format!("mock_{lower}_test.go")),
                };
                Destination {
                    file,
                    package_name: package_name.clone(),
                }
            })
            .collect())
    }

    fn output_dir(&self) -> Option<PathBuf> {
        self.args.output_dir.as_deref().map(|dir| self.anchor(dir))
    }

    fn anchor(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.work_dir.join(path)
        }
    }
}

/// A Go package name derived from a directory's base name.
fn package_ident(dir: &Path) -> String {
    let base = dir
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    if base.is_empty() {
        return "mocks".to_string();
    }
    guess_package_name(&base)
}
