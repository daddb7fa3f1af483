//! Maps Go import paths to package directories and back.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Requirement {
    path: String,
    version: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Replacement {
    Dir(PathBuf),
    Module(Requirement),
}

/// The main module as described by its `go.mod`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    pub path: String,
    pub root: PathBuf,
    requires: Vec<Requirement>,
    replaces: Vec<(String, Replacement)>,
}

impl Module {
    /// Reads the `go.mod` in `root`.
    pub fn load(root: &Path) -> Option<Self> {
        let text = fs::read_to_string(root.join("go.mod")).ok()?;
        Self::parse(root, &text)
    }

    fn parse(root: &Path, text: &str) -> Option<Self> {
        let mut path = None;
        let mut requires = Vec::new();
        let mut replaces = Vec::new();
        let mut block: Option<&str> = None;

        for line in text.lines() {
            let line = line.split("//").next().unwrap_or_default().trim();
            if line.is_empty() {
                continue;
            }
            if line == ")" {
                block = None;
                continue;
            }

            let (directive, rest) = match block {
                Some(directive) => (directive, line),
                None => match line.split_once(char::is_whitespace) {
                    Some((directive, rest)) => (directive, rest.trim()),
                    None => continue,
                },
            };
            if rest == "(" {
                block = Some(directive);
                continue;
            }

            match directive {
                "module" => path = Some(unquote(rest).to_string()),
                "require" => {
                    let mut fields = rest.split_whitespace().map(unquote);
                    if let (Some(path), Some(version)) = (fields.next(), fields.next()) {
                        requires.push(Requirement {
                            path: path.to_string(),
                            version: version.to_string(),
                        });
                    }
                }
                "replace" => {
                    if let Some((old, new)) = rest.split_once("=>") {
                        let old = old.split_whitespace().next().map(unquote).unwrap_or_default();
                        let mut new = new.split_whitespace().map(unquote);
                        let replacement = match (new.next(), new.next()) {
                            (Some(path), Some(version)) => Replacement::Module(Requirement {
                                path: path.to_string(),
                                version: version.to_string(),
                            }),
                            (Some(dir), None) => Replacement::Dir(root.join(dir)),
                            _ => continue,
                        };
                        replaces.push((old.to_string(), replacement));
                    }
                }
                _ => {}
            }
        }

        Some(Self {
            path: path?,
            root: root.to_path_buf(),
            requires,
            replaces,
        })
    }
}

/// Finds package directories the way the `go` command would for a build
/// started in `work_dir`: main module, `vendor/`, module cache, GOPATH and
/// finally GOROOT.
#[derive(Debug, Clone)]
pub struct PackageLocator {
    module: Option<Module>,
    gopath: Vec<PathBuf>,
    gomodcache: Option<PathBuf>,
    goroot: Option<PathBuf>,
}

impl PackageLocator {
    pub fn new(work_dir: &Path) -> Self {
        let module = work_dir.ancestors().find_map(Module::load);

        let gopath = match env::var_os("GOPATH") {
            Some(paths) => env::split_paths(&paths).collect(),
            None => env::var_os("HOME")
                .map(|home| vec![PathBuf::from(home).join("go")])
                .unwrap_or_default(),
        };
        let gomodcache = env::var_os("GOMODCACHE")
            .map(PathBuf::from)
            .or_else(|| gopath.first().map(|p| p.join("pkg").join("mod")));
        let goroot = env::var_os("GOROOT").map(PathBuf::from).or_else(|| {
            ["/usr/local/go", "/usr/lib/go"]
                .iter()
                .map(PathBuf::from)
                .find(|p| p.join("src").is_dir())
        });

        debug!(
            "package locator: module {:?}, GOPATH {:?}, GOROOT {:?}",
            module.as_ref().map(|m| &m.path),
            gopath,
            goroot
        );

        Self {
            module,
            gopath,
            gomodcache,
            goroot,
        }
    }

    /// Locator that only knows the given module. Used by tests and callers
    /// that want to keep the environment out.
    pub fn for_module(module: Module) -> Self {
        Self {
            module: Some(module),
            gopath: Vec::new(),
            gomodcache: None,
            goroot: None,
        }
    }

    pub fn module(&self) -> Option<&Module> {
        self.module.as_ref()
    }

    /// Directory of the package with the given import path, if it exists.
    pub fn locate(&self, import_path: &str) -> Option<PathBuf> {
        self.candidates(import_path)
            .into_iter()
            .find(|dir| dir.is_dir())
    }

    fn candidates(&self, import_path: &str) -> Vec<PathBuf> {
        let mut out = Vec::new();

        if let Some(module) = &self.module {
            if let Some(rest) = strip_module(import_path, &module.path) {
                out.push(join_rest(&module.root, rest));
            }
            out.push(module.root.join("vendor").join(import_path));

            for (old, replacement) in &module.replaces {
                if let Some(rest) = strip_module(import_path, old) {
                    match replacement {
                        Replacement::Dir(dir) => out.push(join_rest(dir, rest)),
                        Replacement::Module(req) => {
                            if let Some(dir) = self.cached_module(req) {
                                out.push(join_rest(&dir, rest));
                            }
                        }
                    }
                }
            }

            for req in &module.requires {
                if let Some(rest) = strip_module(import_path, &req.path) {
                    if let Some(dir) = self.cached_module(req) {
                        out.push(join_rest(&dir, rest));
                    }
                }
            }
        }

        out.extend(self.gopath.iter().map(|p| p.join("src").join(import_path)));
        if let Some(goroot) = &self.goroot {
            out.push(goroot.join("src").join(import_path));
        }
        out
    }

    fn cached_module(&self, req: &Requirement) -> Option<PathBuf> {
        let cache = self.gomodcache.as_ref()?;
        Some(cache.join(format!("{}@{}", escape_module_path(&req.path), req.version)))
    }

    /// Import path of the package in `dir`, if `dir` lies in the main module
    /// or under a GOPATH.
    pub fn import_path_of(&self, dir: &Path) -> Option<String> {
        let dir = fs::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf());

        if let Some(module) = &self.module {
            let root = fs::canonicalize(&module.root).unwrap_or_else(|_| module.root.clone());
            if let Ok(rest) = dir.strip_prefix(&root) {
                return Some(join_import(&module.path, rest));
            }
        }

        self.gopath.iter().find_map(|gopath| {
            let src = fs::canonicalize(gopath.join("src")).ok()?;
            let rest = dir.strip_prefix(&src).ok()?;
            Some(join_import("", rest))
        })
    }
}

fn strip_module<'p>(import_path: &'p str, module: &str) -> Option<&'p str> {
    if import_path == module {
        Some("")
    } else {
        import_path
            .strip_prefix(module)
            .and_then(|rest| rest.strip_prefix('/'))
    }
}

fn join_rest(dir: &Path, rest: &str) -> PathBuf {
    if rest.is_empty() {
        dir.to_path_buf()
    } else {
        dir.join(rest)
    }
}

fn join_import(base: &str, rest: &Path) -> String {
    let rest = rest
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
    match (base.is_empty(), rest.is_empty()) {
        (_, true) => base.to_string(),
        (true, false) => rest,
        (false, false) => format!("{base}/{rest}"),
    }
}

/// Module cache directories encode upper-case letters as `!` + lower case.
fn escape_module_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for c in path.chars() {
        if c.is_ascii_uppercase() {
            out.push('!');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

fn unquote(s: &str) -> &str {
    s.trim_matches('"')
}
