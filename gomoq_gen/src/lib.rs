//! Go source generation for mocks of [`InterfaceModel`]s.
//!
//! [`generate`] renders one mock file, [`generate_matchers`] renders the
//! argument matchers for the parameter types of a batch of mocks. Nothing
//! here touches the filesystem.

mod artifact;
mod context;
mod error;
mod imports;
mod matchers;
mod method;
mod mock;
mod render;
mod symbols;
mod utils;
mod validate;
mod writer;

use gomoq_model::InterfaceModel;
use log::debug;

pub use artifact::{
    GenerateOptions, GeneratedArtifact, MatcherArtifact, MatcherOptions, DEFAULT_MATCHERS_DIR,
    DEFAULT_RUNTIME_IMPORT,
};
pub use error::GenerationError;
pub use matchers::{generate_matchers, matcher_name};
pub use symbols::MARKER;

use context::Context;
use mock::Mock;
use writer::ToGo;

/// Renders the mock of `model`.
///
/// The output is a pure function of its inputs, so regenerating an
/// unchanged interface yields byte-identical text.
pub fn generate(
    model: &InterfaceModel,
    options: &GenerateOptions,
) -> Result<GeneratedArtifact, GenerationError> {
    debug!(
        "generating mock for {}.{} into {}",
        model.package,
        model.name,
        options.destination.display()
    );
    let cx = Context::from_model(model, options)?;
    let mock = Mock::from_context(&cx);

    let mut source = mock.to_go_string();
    let trimmed = source.trim_end().len();
    source.truncate(trimmed);
    source.push('\n');

    let referenced_types = model
        .methods
        .iter()
        .flat_map(|m| &m.params)
        .map(|p| p.ty.storage_type())
        .collect();

    Ok(GeneratedArtifact {
        destination: options.destination.clone(),
        package_name: options.package_name.clone(),
        source,
        referenced_types,
    })
}

/// Whether `source` was written by this generator.
pub fn is_generated(source: &str) -> bool {
    source.lines().next() == Some(MARKER)
}
