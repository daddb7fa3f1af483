use std::collections::BTreeMap;

use gomoq_model::guess_package_name;

use crate::error::GenerationError;
use crate::symbols::{self, Symbol};
use crate::writer::{go, GoWriter, ToGo};

/// Characters the `go` command rejects in import paths.
const INVALID_PATH_CHARS: &str = "!\"#$%&'()*,:;<=>?[\\]^`{|}";

/// The import block of one generated file. Every entry carries an explicit
/// alias so that qualified names never depend on package clauses.
#[derive(Debug, Clone)]
pub struct Imports {
    self_package: String,
    by_path: BTreeMap<String, String>,
}

impl Imports {
    /// Starts with the imports every mock uses: the runtime, `reflect` and
    /// `time`.
    pub fn new(runtime_import: &str, self_package: &str) -> Result<Self, GenerationError> {
        let mut imports = Self::empty(self_package);
        imports.insert_fixed(runtime_import, symbols::RUNTIME)?;
        imports.insert_fixed(symbols::REFLECT_IMPORT, symbols::REFLECT)?;
        imports.insert_fixed(symbols::TIME_IMPORT, symbols::TIME)?;
        Ok(imports)
    }

    pub fn empty(self_package: &str) -> Self {
        Self {
            self_package: self_package.to_string(),
            by_path: BTreeMap::new(),
        }
    }

    pub fn insert_fixed(&mut self, path: &str, alias: Symbol<'_>) -> Result<(), GenerationError> {
        check_import_path(path)?;
        self.by_path.insert(path.to_string(), alias.to_string());
        Ok(())
    }

    /// Adds `path` unless it is the mock's own package. A name already in
    /// use gets a numeric suffix.
    pub fn add(&mut self, path: &str) -> Result<(), GenerationError> {
        if path == self.self_package || self.by_path.contains_key(path) {
            return Ok(());
        }
        check_import_path(path)?;

        let base = guess_package_name(path);
        let mut alias = base.clone();
        let mut n = 0;
        while self.is_alias(&alias) || symbols::is_reserved(&alias) {
            n += 1;
            alias = format!("{base}{n}");
        }
        self.by_path.insert(path.to_string(), alias);
        Ok(())
    }

    /// Qualifier for types of `package`, `None` for predeclared types and
    /// the mock's own package.
    pub fn qualifier(&self, package: &str) -> Option<&str> {
        if package.is_empty() || package == self.self_package {
            return None;
        }
        self.by_path.get(package).map(String::as_str)
    }

    pub fn is_alias(&self, name: &str) -> bool {
        self.by_path.values().any(|alias| alias == name)
    }
}

impl ToGo for Imports {
    fn to_go(&self, dst: &mut GoWriter) {
        if self.by_path.is_empty() {
            return;
        }
        dst.block("import (", ")", |dst| {
            for (path, alias) in &self.by_path {
                go!(dst, "{alias} \"{path}\"");
            }
        });
    }
}

pub fn check_import_path(path: &str) -> Result<(), GenerationError> {
    let invalid = path.is_empty()
        || path.starts_with('/')
        || path.ends_with('/')
        || path.contains("//")
        || path.split('/').any(|segment| segment == "." || segment == "..")
        || path
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || INVALID_PATH_CHARS.contains(c));
    if invalid {
        return Err(GenerationError::InvalidImportPath {
            path: path.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn aliases_are_unique() {
        let mut imports = Imports::new("github.com/petergtz/pegomock/v4", "example.com/app").unwrap();
        imports.add("example.com/app").unwrap();
        imports.add("example.com/app/time").unwrap();
        imports.add("example.com/lib/store").unwrap();
        imports.add("example.com/app/store").unwrap();
        imports.add("time").unwrap();

        assert_eq!(imports.qualifier("example.com/app"), None);
        assert_eq!(imports.qualifier("time"), Some("time"));
        assert_eq!(imports.qualifier("example.com/app/time"), Some("time1"));
        assert_eq!(imports.qualifier("example.com/lib/store"), Some("store"));
        assert_eq!(imports.qualifier("example.com/app/store"), Some("store1"));

        assert_eq!(
            imports.to_go_string(),
            "import (\n\
             \tstore1 \"example.com/app/store\"\n\
             \ttime1 \"example.com/app/time\"\n\
             \tstore \"example.com/lib/store\"\n\
             \tpegomock \"github.com/petergtz/pegomock/v4\"\n\
             \treflect \"reflect\"\n\
             \ttime \"time\"\n\
             )\n"
        );
    }

    #[test]
    fn reserved_names_are_not_aliases() {
        let mut imports = Imports::empty("");
        imports.add("example.com/mock").unwrap();
        assert_eq!(imports.qualifier("example.com/mock"), Some("mock1"));
    }

    #[test]
    fn invalid_import_paths() {
        for path in ["", "/abs", "a//b", "a b", "a/../b", "a\"b", "a/"] {
            assert!(
                matches!(
                    check_import_path(path),
                    Err(GenerationError::InvalidImportPath { .. })
                ),
                "{path:?}"
            );
        }
        assert!(check_import_path("gopkg.in/yaml.v3").is_ok());
        assert!(check_import_path("github.com/petergtz/pegomock/v4").is_ok());
    }
}
