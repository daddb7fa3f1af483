use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use log::debug;

use crate::ast::{SourceFile, TypeSpec};
use crate::error::ExtractionError;
use crate::locator::PackageLocator;
use crate::parser::{self, SyntaxError};

#[derive(Debug)]
pub struct ParsedFile {
    pub path: PathBuf,
    pub source: String,
    pub ast: SourceFile,
}

impl ParsedFile {
    pub fn syntax_error(&self, err: &SyntaxError) -> ExtractionError {
        ExtractionError::parse(self.path.display().to_string(), &self.source, err.clone())
    }
}

/// The non-test Go files of one directory.
#[derive(Debug)]
pub struct Package {
    pub import_path: String,
    /// Name from the package clause.
    pub name: String,
    pub files: Vec<ParsedFile>,
}

impl Package {
    /// The declaration of `name` together with the index of its file.
    pub fn lookup(&self, name: &str) -> Option<(usize, &TypeSpec)> {
        self.files
            .iter()
            .enumerate()
            .find_map(|(i, file)| file.ast.decl(name).map(|decl| (i, decl)))
    }

    pub fn file_index(&self, path: &Path) -> Option<usize> {
        self.files.iter().position(|file| file.path == path)
    }
}

/// Parses packages on demand and keeps them for the lifetime of one
/// extraction.
#[derive(Debug)]
pub struct PackageLoader {
    locator: PackageLocator,
    cache: RefCell<HashMap<String, Rc<Package>>>,
}

impl PackageLoader {
    pub fn new(locator: PackageLocator) -> Self {
        Self {
            locator,
            cache: RefCell::new(HashMap::new()),
        }
    }

    pub fn locator(&self) -> &PackageLocator {
        &self.locator
    }

    pub fn load(&self, import_path: &str) -> Result<Rc<Package>, ExtractionError> {
        if let Some(package) = self.cache.borrow().get(import_path) {
            return Ok(Rc::clone(package));
        }

        let dir = self
            .locator
            .locate(import_path)
            .ok_or_else(|| ExtractionError::UnresolvedImport {
                import: import_path.to_string(),
            })?;
        self.load_dir(&dir, import_path)
    }

    pub fn load_dir(&self, dir: &Path, import_path: &str) -> Result<Rc<Package>, ExtractionError> {
        if let Some(package) = self.cache.borrow().get(import_path) {
            return Ok(Rc::clone(package));
        }

        debug!("loading package {import_path} from {}", dir.display());
        let package = Rc::new(read_package(dir, import_path)?);
        self.cache
            .borrow_mut()
            .insert(import_path.to_string(), Rc::clone(&package));
        Ok(package)
    }
}

fn read_package(dir: &Path, import_path: &str) -> Result<Package, ExtractionError> {
    let entries = fs::read_dir(dir).map_err(|err| ExtractionError::io(dir, err))?;
    let mut paths = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| is_package_source(path))
        .collect::<Vec<_>>();
    paths.sort();

    let mut name: Option<String> = None;
    let mut files = Vec::new();
    for path in paths {
        let file = parse_path(&path)?;
        let package_name = name.get_or_insert_with(|| file.ast.package.clone());
        if *package_name != file.ast.package {
            debug!(
                "skipping {}: package {} instead of {package_name}",
                path.display(),
                file.ast.package
            );
            continue;
        }
        files.push(file);
    }

    let name = name.ok_or_else(|| ExtractionError::UnresolvedImport {
        import: import_path.to_string(),
    })?;

    Ok(Package {
        import_path: import_path.to_string(),
        name,
        files,
    })
}

pub fn parse_path(path: &Path) -> Result<ParsedFile, ExtractionError> {
    let source = fs::read_to_string(path).map_err(|err| ExtractionError::io(path, err))?;
    let ast = parser::parse_file(&source)
        .map_err(|err| ExtractionError::parse(path.display().to_string(), &source, err))?;
    Ok(ParsedFile {
        path: path.to_path_buf(),
        source,
        ast,
    })
}

/// `.go` files that take part in a regular build: no tests, nothing hidden.
pub fn is_package_source(path: &Path) -> bool {
    let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    path.is_file()
        && file_name.ends_with(".go")
        && !file_name.ends_with("_test.go")
        && !file_name.starts_with('.')
        && !file_name.starts_with('_')
}
