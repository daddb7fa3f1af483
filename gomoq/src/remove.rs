use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use gomoq_gen::MARKER;
use log::{debug, info};

use crate::error::GomoqError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoveOptions {
    /// A directory to search, or a single file.
    pub path: PathBuf,
    pub recursive: bool,
    /// Remove without asking.
    pub non_interactive: bool,
    pub dry_run: bool,
    /// Only prompts are printed.
    pub silent: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoveReport {
    pub removed: Vec<PathBuf>,
    /// Declined, or listed by a dry run.
    pub skipped: Vec<PathBuf>,
}

/// Deletes the generated mocks and matchers under `options.path`.
///
/// Files are recognised by the marker on their first line only. `delete` is
/// called for every confirmed file and never during a dry run.
pub fn remove<F>(
    options: &RemoveOptions,
    out: &mut dyn Write,
    input: &mut dyn BufRead,
    mut delete: F,
) -> Result<RemoveReport, GomoqError>
where
    F: FnMut(&Path) -> std::io::Result<()>,
{
    let files = find_generated_files(&options.path, options.recursive)?;
    let mut report = RemoveReport::default();
    let say = |out: &mut dyn Write, line: String| -> Result<(), GomoqError> {
        if options.silent {
            return Ok(());
        }
        writeln!(out, "{line}").map_err(|err| GomoqError::io("<stdout>", err))
    };

    if files.is_empty() {
        say(out, format!("no generated files found in {}", options.path.display()))?;
        return Ok(report);
    }

    for file in files {
        if options.dry_run {
            say(out, format!("would remove {}", file.display()))?;
            report.skipped.push(file);
            continue;
        }
        if !options.non_interactive && !confirm(&file, out, input)? {
            debug!("keeping {}", file.display());
            report.skipped.push(file);
            continue;
        }
        delete(&file).map_err(|err| GomoqError::io(&file, err))?;
        info!("removed {}", file.display());
        say(out, format!("removed {}", file.display()))?;
        report.removed.push(file);
    }
    Ok(report)
}

fn confirm(file: &Path, out: &mut dyn Write, input: &mut dyn BufRead) -> Result<bool, GomoqError> {
    write!(out, "remove {}? [y/N] ", file.display())
        .and_then(|_| out.flush())
        .map_err(|err| GomoqError::io("<stdout>", err))?;

    let mut answer = String::new();
    input
        .read_line(&mut answer)
        .map_err(|err| GomoqError::io("<stdin>", err))?;
    Ok(matches!(
        answer.trim().to_lowercase().as_str(),
        "y" | "yes"
    ))
}

/// Go files under `root` whose first line is the generator's marker, in
/// path order.
pub fn find_generated_files(root: &Path, recursive: bool) -> Result<Vec<PathBuf>, GomoqError> {
    let mut found = Vec::new();
    if root.is_file() {
        if is_generated_file(root)? {
            found.push(root.to_path_buf());
        }
        return Ok(found);
    }
    collect(root, recursive, &mut found)?;
    found.sort();
    Ok(found)
}

fn collect(dir: &Path, recursive: bool, found: &mut Vec<PathBuf>) -> Result<(), GomoqError> {
    let entries = std::fs::read_dir(dir).map_err(|err| GomoqError::io(dir, err))?;
    for entry in entries {
        let entry = entry.map_err(|err| GomoqError::io(dir, err))?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(|err| GomoqError::io(&path, err))?;
        if file_type.is_dir() {
            if recursive && !is_hidden(&path) {
                collect(&path, recursive, found)?;
            }
        } else if path.extension().is_some_and(|ext| ext == "go") && is_generated_file(&path)? {
            found.push(path);
        }
    }
    Ok(())
}

fn is_generated_file(path: &Path) -> Result<bool, GomoqError> {
    let file = File::open(path).map_err(|err| GomoqError::io(path, err))?;
    let mut first = String::new();
    match BufReader::new(file).read_line(&mut first) {
        Ok(_) => Ok(first.trim_end_matches(['\r', '\n']) == MARKER),
        // not text, so not ours
        Err(err) if err.kind() == std::io::ErrorKind::InvalidData => Ok(false),
        Err(err) => Err(GomoqError::io(path, err)),
    }
}

pub(crate) fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with('.'))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pretty_assertions::assert_eq;

    use super::*;

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let generated = format!("{MARKER}\npackage app_test\n");
        fs::write(dir.path().join("mock_a_test.go"), &generated).unwrap();
        fs::write(dir.path().join("app.go"), "package app\n").unwrap();
        fs::write(
            dir.path().join("notes.go"),
            format!("package app\n\n{MARKER}\n"),
        )
        .unwrap();
        fs::create_dir_all(dir.path().join("sub/matchers")).unwrap();
        fs::write(dir.path().join("sub/matchers/int_ptr.go"), &generated).unwrap();
        fs::create_dir_all(dir.path().join(".cache")).unwrap();
        fs::write(dir.path().join(".cache/mock_b.go"), &generated).unwrap();
        dir
    }

    fn options(path: &Path) -> RemoveOptions {
        RemoveOptions {
            path: path.to_path_buf(),
            non_interactive: true,
            ..Default::default()
        }
    }

    #[test]
    fn finds_marked_files_only() {
        let dir = fixture();
        assert_eq!(
            find_generated_files(dir.path(), false).unwrap(),
            vec![dir.path().join("mock_a_test.go")]
        );
        assert_eq!(
            find_generated_files(dir.path(), true).unwrap(),
            vec![
                dir.path().join("mock_a_test.go"),
                dir.path().join("sub/matchers/int_ptr.go"),
            ]
        );
    }

    #[test]
    fn dry_run_deletes_nothing() {
        let dir = fixture();
        let mut options = options(dir.path());
        options.dry_run = true;
        let mut out = Vec::new();

        let report = remove(&options, &mut out, &mut &b""[..], |path| {
            panic!("deleted {}", path.display())
        })
        .unwrap();

        assert_eq!(report.removed, Vec::<PathBuf>::new());
        assert_eq!(report.skipped, vec![dir.path().join("mock_a_test.go")]);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            format!("would remove {}\n", dir.path().join("mock_a_test.go").display())
        );
    }

    #[test]
    fn interactive_mode_asks_per_file() {
        let dir = fixture();
        let mut options = options(dir.path());
        options.recursive = true;
        options.non_interactive = false;
        options.silent = true;
        let mut out = Vec::new();
        let mut deleted = Vec::new();

        let report = remove(&options, &mut out, &mut &b"yes\nn\n"[..], |path| {
            deleted.push(path.to_path_buf());
            Ok(())
        })
        .unwrap();

        let first = dir.path().join("mock_a_test.go");
        let second = dir.path().join("sub/matchers/int_ptr.go");
        assert_eq!(deleted, vec![first.clone()]);
        assert_eq!(report.removed, vec![first.clone()]);
        assert_eq!(report.skipped, vec![second.clone()]);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            format!(
                "remove {}? [y/N] remove {}? [y/N] ",
                first.display(),
                second.display()
            )
        );
    }

    #[test]
    fn end_of_input_declines() {
        let dir = fixture();
        let mut options = options(dir.path());
        options.non_interactive = false;

        let report = remove(&options, &mut Vec::new(), &mut &b""[..], |_| Ok(())).unwrap();
        assert_eq!(report.removed, Vec::<PathBuf>::new());
        assert_eq!(report.skipped.len(), 1);
    }

    #[test]
    fn removes_files_from_disk() {
        let dir = fixture();
        let report = remove(
            &options(dir.path()),
            &mut Vec::new(),
            &mut &b""[..],
            |path| fs::remove_file(path),
        )
        .unwrap();
        assert_eq!(report.removed, vec![dir.path().join("mock_a_test.go")]);
        assert!(!dir.path().join("mock_a_test.go").exists());
        assert!(dir.path().join("app.go").exists());
    }
}
