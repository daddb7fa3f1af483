//! Extraction by parsing Go sources directly, without the Go toolchain.

use std::path::{Path, PathBuf};
use std::rc::Rc;

use gomoq_model::InterfaceModel;
use log::{debug, warn};

use crate::ast::TypeExpr;
use crate::error::ExtractionError;
use crate::loader::{Package, PackageLoader};
use crate::locator::PackageLocator;
use crate::resolver::Resolver;
use crate::{Extractor, SourceRequest};

/// The syntactic model generator.
///
/// Keeps declared parameter names and the declaration order of methods.
/// Package mode mocks exactly one interface, source-file mode mocks every
/// non-generic interface declared in the file.
#[derive(Debug, Clone)]
pub struct SourceExtractor {
    work_dir: PathBuf,
    locator: PackageLocator,
}

impl SourceExtractor {
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        let work_dir = work_dir.into();
        let locator = PackageLocator::new(&work_dir);
        Self { work_dir, locator }
    }

    pub fn with_locator(work_dir: impl Into<PathBuf>, locator: PackageLocator) -> Self {
        Self {
            work_dir: work_dir.into(),
            locator,
        }
    }

    /// Loads the package named by `path`, which is either an import path or
    /// a directory relative to the working directory (`.`, `./store`).
    fn load_package(
        &self,
        loader: &PackageLoader,
        path: &str,
    ) -> Result<Rc<Package>, ExtractionError> {
        if !is_relative_package(path) {
            return loader.load(path);
        }

        let dir = self.work_dir.join(path);
        if !dir.is_dir() {
            return Err(ExtractionError::UnresolvedImport {
                import: path.to_string(),
            });
        }
        let import_path = self.import_path_of(loader, &dir)?;
        loader.load_dir(&dir, &import_path)
    }

    /// Falls back to the package clause for directories outside any module.
    fn import_path_of(&self, loader: &PackageLoader, dir: &Path) -> Result<String, ExtractionError> {
        if let Some(import_path) = loader.locator().import_path_of(dir) {
            return Ok(import_path);
        }

        let file = dir
            .read_dir()
            .map_err(|err| ExtractionError::io(dir, err))?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| crate::loader::is_package_source(path))
            .min()
            .ok_or_else(|| ExtractionError::UnresolvedImport {
                import: dir.display().to_string(),
            })?;
        let parsed = crate::loader::parse_path(&file)?;
        debug!(
            "{} is outside the module, using package name {}",
            dir.display(),
            parsed.ast.package
        );
        Ok(parsed.ast.package)
    }

    fn extract_package(
        &self,
        path: &str,
        interfaces: &[String],
    ) -> Result<Vec<InterfaceModel>, ExtractionError> {
        let [interface] = interfaces else {
            return Err(ExtractionError::MultipleInterfaces {
                count: interfaces.len(),
            });
        };

        let loader = PackageLoader::new(self.locator.clone());
        let package = self.load_package(&loader, path)?;
        let model = Resolver::new(&loader).interface_model(&package, interface)?;
        Ok(vec![model])
    }

    fn extract_file(&self, path: &Path) -> Result<Vec<InterfaceModel>, ExtractionError> {
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.work_dir.join(path)
        };
        let dir = path.parent().unwrap_or(self.work_dir.as_path());

        let loader = PackageLoader::new(self.locator.clone());
        let import_path = self.import_path_of(&loader, dir)?;
        let package = loader.load_dir(dir, &import_path)?;
        let file = match package.file_index(&path) {
            Some(index) => &package.files[index],
            // Not part of the directory's build, parse it on its own.
            None => {
                let parsed = crate::loader::parse_path(&path)?;
                return Err(ExtractionError::Unsupported {
                    name: path.display().to_string(),
                    reason: format!(
                        "package `{}` does not match the directory's package `{}`",
                        parsed.ast.package, package.name
                    ),
                });
            }
        };

        let resolver = Resolver::new(&loader);
        let mut models = Vec::new();
        for decl in &file.ast.decls {
            let is_interface = match &decl.ty {
                Ok(TypeExpr::Interface(_)) => true,
                Ok(_) => false,
                Err(_) => decl.interface_like,
            };
            if !is_interface {
                continue;
            }
            if !decl.type_params.is_empty() {
                warn!("skipping generic interface {}", decl.name);
                continue;
            }
            match resolver.interface_model(&package, &decl.name) {
                Ok(model) => models.push(model),
                Err(ExtractionError::Unsupported { name, reason }) => {
                    warn!("skipping {name}: {reason}");
                }
                Err(err) => return Err(err),
            }
        }

        debug!(
            "found {} interface(s) in {}",
            models.len(),
            path.display()
        );
        Ok(models)
    }
}

impl Extractor for SourceExtractor {
    fn extract(&self, request: &SourceRequest) -> Result<Vec<InterfaceModel>, ExtractionError> {
        match request {
            SourceRequest::Package { path, interfaces } => self.extract_package(path, interfaces),
            SourceRequest::File { path } => self.extract_file(path),
        }
    }
}

fn is_relative_package(path: &str) -> bool {
    path == "." || path == ".." || path.starts_with("./") || path.starts_with("../")
}
