#![allow(dead_code)]

use std::fs;
use std::path::Path;

use gomoq::{Config, GenerateSettings, GenerationReport, GomoqError};

/// A Go module `example.com/app` holding `files`.
pub fn module(files: &[(&str, &str)]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("go.mod"), "module example.com/app\n\ngo 1.21\n").unwrap();
    for (path, text) in files {
        write(dir.path(), path, text);
    }
    dir
}

pub fn write(root: &Path, path: &str, text: &str) {
    let path = root.join(path);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
}

pub fn read(root: &Path, path: &str) -> String {
    fs::read_to_string(root.join(path)).unwrap()
}

pub fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Settings for the source model generator, run in `work_dir`.
pub fn settings(work_dir: &Path, args: &[&str]) -> GenerateSettings {
    GenerateSettings {
        work_dir: work_dir.to_path_buf(),
        args: strings(args),
        use_source_model_gen: true,
        ..Default::default()
    }
}

pub fn generate(work_dir: &Path, args: &[&str]) -> Result<GenerationReport, GomoqError> {
    generate_with_settings(&settings(work_dir, args))
}

pub fn generate_with_settings(settings: &GenerateSettings) -> Result<GenerationReport, GomoqError> {
    gomoq::generate_mock_files(settings, &Config::default(), &mut Vec::new())
}
