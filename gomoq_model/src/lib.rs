//! Interface model shared by the gomoq extractors and generators.
//!
//! An [`InterfaceModel`] describes the method set of one Go interface. Both
//! extraction backends produce it and the code generator consumes it.

mod builtin;
mod error;
mod model;
mod types;
mod validate;

pub use builtin::{is_exported, is_predeclared, PREDECLARED_TYPES};
pub use error::SignatureConstraintError;
pub use model::{InterfaceModel, InterfaceShape, MethodShape};
pub use types::{ChanDir, FuncType, MethodSignature, NamedType, Parameter, StructField, TypeRef};
pub use validate::validate;

/// Guesses the package name of an import path the way `go` tooling does when
/// no package clause is at hand.
///
/// ```
/// assert_eq!(gomoq_model::guess_package_name("net/http"), "http");
/// assert_eq!(gomoq_model::guess_package_name("github.com/petergtz/pegomock/v4"), "pegomock");
/// assert_eq!(gomoq_model::guess_package_name("gopkg.in/yaml.v3"), "yaml");
/// ```
pub fn guess_package_name(import_path: &str) -> String {
    let mut segments = import_path.trim_end_matches('/').rsplit('/');
    let mut last = segments.next().unwrap_or_default();
    if is_major_version(last) {
        if let Some(prev) = segments.next() {
            last = prev;
        }
    }
    if let Some((head, tail)) = last.rsplit_once('.') {
        if is_major_version(tail) {
            last = head;
        }
    }
    let last = last.strip_prefix("go-").unwrap_or(last);
    let last = last.strip_suffix("-go").unwrap_or(last);

    let mut name = last
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect::<String>();
    if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert(0, '_');
    }
    name
}

fn is_major_version(segment: &str) -> bool {
    segment.len() > 1
        && segment.starts_with('v')
        && segment[1..].chars().all(|c| c.is_ascii_digit())
}
