use std::io::Write;
use std::path::{Path, PathBuf};

use gomoq_gen::{generate_matchers, GenerateOptions, GeneratedArtifact, MatcherOptions};
use gomoq_modelgen::{Extractor, ReflectExtractor, SourceExtractor, SourceRequest};
use log::{debug, info, warn};

use crate::config::Config;
use crate::destination::{DestinationArgs, DestinationResolver};
use crate::error::GomoqError;

/// One `generate` invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateSettings {
    pub work_dir: PathBuf,
    /// A package path followed by interface names, or a single `.go` file.
    pub args: Vec<String>,
    pub destination: DestinationArgs,
    pub self_package: String,
    /// Print the extracted models.
    pub debug: bool,
    pub use_source_model_gen: bool,
    pub generate_matchers: bool,
    /// Overrides `<mock dir>/<matchers_dir>`.
    pub matchers_dir: Option<PathBuf>,
}

/// Files touched by one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationReport {
    pub written: Vec<PathBuf>,
    pub unchanged: Vec<PathBuf>,
}

impl GenerationReport {
    pub fn files(&self) -> impl Iterator<Item = &PathBuf> {
        self.written.iter().chain(&self.unchanged)
    }
}

/// Picks the model generator: source files and the experimental flag use
/// the syntactic one, everything else goes through `go run`.
pub fn select_extractor(
    request: &SourceRequest,
    settings: &GenerateSettings,
    config: &Config,
) -> Box<dyn Extractor> {
    if settings.use_source_model_gen || request.is_source_file() {
        debug!("using the source model generator");
        Box::new(SourceExtractor::new(&settings.work_dir))
    } else {
        debug!("using the reflect model generator ({})", config.go_binary);
        Box::new(ReflectExtractor::new(&settings.work_dir, &config.go_binary))
    }
}

/// Extracts, renders and writes the mocks described by `settings`.
pub fn generate_mock_files(
    settings: &GenerateSettings,
    config: &Config,
    out: &mut dyn Write,
) -> Result<GenerationReport, GomoqError> {
    let request = parse_request(&settings.args)?;
    let extractor = select_extractor(&request, settings, config);
    generate_with(&*extractor, &request, settings, config, out)
}

pub(crate) fn parse_request(args: &[String]) -> Result<SourceRequest, GomoqError> {
    SourceRequest::from_args(args).ok_or_else(|| {
        GomoqError::usage(
            "expected a package path followed by one or more interfaces, or a single .go file",
        )
    })
}

/// Like [`generate_mock_files`], with the model generator supplied by the
/// caller.
///
/// Every file is rendered before the first one is written, so a failing
/// interface leaves the destination untouched.
pub fn generate_with(
    extractor: &dyn Extractor,
    request: &SourceRequest,
    settings: &GenerateSettings,
    config: &Config,
    out: &mut dyn Write,
) -> Result<GenerationReport, GomoqError> {
    let models = extractor.extract(request)?;
    if models.is_empty() {
        warn!("nothing to mock in {}", settings.args.join(" "));
        return Ok(GenerationReport::default());
    }

    if settings.debug {
        for model in &models {
            write!(out, "{model}").map_err(|err| GomoqError::io("<stdout>", err))?;
        }
    }

    let names = models.iter().map(|m| m.name.as_str()).collect::<Vec<_>>();
    let destinations =
        DestinationResolver::new(&settings.work_dir, &settings.destination)?.resolve(&names)?;

    let artifacts = models
        .iter()
        .zip(destinations)
        .map(|(model, destination)| {
            let options = GenerateOptions {
                destination: destination.file,
                package_name: destination.package_name,
                self_package: settings.self_package.clone(),
                generate_matchers: settings.generate_matchers,
                runtime_import: config.runtime_import.clone(),
            };
            gomoq_gen::generate(model, &options)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut files = artifacts
        .iter()
        .map(|artifact| (artifact.destination.clone(), artifact.source.clone()))
        .collect::<Vec<_>>();

    if settings.generate_matchers {
        let options = matcher_options(&artifacts, settings, config);
        for matcher in generate_matchers(&artifacts, &options)? {
            files.push((matcher.destination, matcher.source));
        }
    }

    let mut report = GenerationReport::default();
    for (path, source) in files {
        if write_if_changed(&path, &source)? {
            report.written.push(path);
        } else {
            report.unchanged.push(path);
        }
    }
    Ok(report)
}

fn matcher_options(
    artifacts: &[GeneratedArtifact],
    settings: &GenerateSettings,
    config: &Config,
) -> MatcherOptions {
    let dir = match &settings.matchers_dir {
        Some(dir) if dir.is_absolute() => dir.clone(),
        Some(dir) => settings.work_dir.join(dir),
        None => artifacts
            .first()
            .and_then(|artifact| artifact.destination.parent())
            .unwrap_or(settings.work_dir.as_path())
            .join(&config.matchers_dir),
    };
    MatcherOptions::in_dir(dir, &config.runtime_import)
}

/// Atomically replaces `path` with `contents` unless it already holds
/// exactly that text. Returns whether the file was written.
pub fn write_if_changed(path: &Path, contents: &str) -> Result<bool, GomoqError> {
    match std::fs::read_to_string(path) {
        Ok(existing) if existing == contents => {
            debug!("{} is up to date", path.display());
            return Ok(false);
        }
        Ok(_) => {}
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => return Err(GomoqError::io(path, err)),
    }

    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(|err| GomoqError::io(dir, err))?;

    let mut file = tempfile::NamedTempFile::new_in(dir).map_err(|err| GomoqError::io(dir, err))?;
    file.write_all(contents.as_bytes())
        .map_err(|err| GomoqError::io(file.path(), err))?;
    file.persist(path)
        .map_err(|err| GomoqError::io(path, err.error))?;

    info!("wrote {}", path.display());
    Ok(true)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use gomoq_model::{InterfaceModel, MethodSignature, Parameter, TypeRef};
    use gomoq_modelgen::ExtractionError;
    use pretty_assertions::assert_eq;

    use super::*;

    struct Fixed(Vec<InterfaceModel>);

    impl Extractor for Fixed {
        fn extract(&self, _: &SourceRequest) -> Result<Vec<InterfaceModel>, ExtractionError> {
            Ok(self.0.clone())
        }
    }

    fn clock() -> InterfaceModel {
        InterfaceModel::new(
            "Clock",
            "example.com/app/clock",
            vec![MethodSignature::new(
                "After",
                vec![Parameter::new(
                    "d",
                    TypeRef::named("time", "Duration"),
                )],
                vec![TypeRef::chan(
                    gomoq_model::ChanDir::Recv,
                    TypeRef::named("time", "Time"),
                )],
            )],
        )
    }

    fn settings(work_dir: &Path) -> GenerateSettings {
        GenerateSettings {
            work_dir: work_dir.to_path_buf(),
            args: vec!["example.com/app/clock".to_string(), "Clock".to_string()],
            ..Default::default()
        }
    }

    fn run(extractor: &Fixed, settings: &GenerateSettings) -> GenerationReport {
        let request = parse_request(&settings.args).unwrap();
        generate_with(extractor, &request, settings, &Config::default(), &mut Vec::new()).unwrap()
    }

    #[test]
    fn writes_then_leaves_unchanged_files_alone() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(dir.path());
        let extractor = Fixed(vec![clock()]);
        let mock = dir.path().join("mock_clock_test.go");

        let first = run(&extractor, &settings);
        assert_eq!(first.written, vec![mock.clone()]);
        let written = fs::read_to_string(&mock).unwrap();
        assert!(gomoq_gen::is_generated(&written));

        let modified = fs::metadata(&mock).unwrap().modified().unwrap();
        let second = run(&extractor, &settings);
        assert_eq!(second.written, Vec::<PathBuf>::new());
        assert_eq!(second.unchanged, vec![mock.clone()]);
        assert_eq!(fs::metadata(&mock).unwrap().modified().unwrap(), modified);
    }

    #[test]
    fn matchers_go_next_to_the_mock() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = settings(dir.path());
        settings.generate_matchers = true;

        let report = run(&Fixed(vec![clock()]), &settings);
        assert_eq!(
            report.written,
            vec![
                dir.path().join("mock_clock_test.go"),
                dir.path().join("matchers/time_duration.go"),
            ]
        );
        let matcher = fs::read_to_string(dir.path().join("matchers/time_duration.go")).unwrap();
        assert!(matcher.contains("package matchers\n"));
        assert!(matcher.contains("func AnyTimeDuration() time.Duration {"));
    }

    #[test]
    fn failing_interface_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let broken = InterfaceModel::new(
            "Broken",
            "example.com/app/clock",
            vec![MethodSignature::new(
                "Do",
                vec![Parameter::new("k", TypeRef::named("example.com/app/other", "key"))],
                vec![],
            )],
        );
        let mut settings = settings(dir.path());
        settings.args.push("Broken".to_string());
        let request = parse_request(&settings.args).unwrap();

        let err = generate_with(
            &Fixed(vec![clock(), broken]),
            &request,
            &settings,
            &Config::default(),
            &mut Vec::new(),
        )
        .unwrap_err();
        assert!(matches!(err, GomoqError::Generation(_)), "{err:?}");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn debug_prints_the_model() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = settings(dir.path());
        settings.debug = true;
        let request = parse_request(&settings.args).unwrap();
        let mut out = Vec::new();

        generate_with(
            &Fixed(vec![clock()]),
            &request,
            &settings,
            &Config::default(),
            &mut out,
        )
        .unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "// example.com/app/clock\ntype Clock interface {\n\tAfter(d time.Duration) <-chan time.Time\n}\n"
        );
    }

    #[test]
    fn missing_interfaces_is_a_usage_error() {
        let err = parse_request(&["example.com/app".to_string()]).unwrap_err();
        assert!(matches!(err, GomoqError::Usage(_)));
    }
}
