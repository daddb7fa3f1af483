//! Regeneration of mocks whenever their interfaces change.
//!
//! A watched directory lists what to mock in [`LIST_FILE`]. The
//! [`MockFileUpdater`] compares fingerprints of that list and the package
//! sources on every pass, and the [`Watcher`] runs passes on a single
//! worker thread.

use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{bounded, select, tick, Receiver, Sender};
use gomoq_gen::{is_generated, DEFAULT_MATCHERS_DIR};
use gomoq_modelgen::PackageLocator;
use log::{debug, error, info, warn};

use crate::error::GomoqError;
use crate::filehandling::GenerationReport;
use crate::remove::is_hidden;

/// Name of the per-directory list of interfaces to mock.
pub const LIST_FILE: &str = "interfaces_to_mock";

const LIST_FILE_HEADER: &str = "\
# Use this file to specify on each line the interfaces you want to mock.
# A line is one of:
#   Interface...                  interfaces of the package in this directory
#   package/path Interface...     interfaces of another package
#   file.go                       every interface declared in a source file
# Lines starting with # are ignored.
";

const SKIPPED_DIRS: &[&str] = &["vendor", DEFAULT_MATCHERS_DIR];

/// Writes a commented [`LIST_FILE`] into every directory that has none.
pub fn create_list_files_if_necessary(dirs: &[PathBuf]) -> Result<(), GomoqError> {
    for dir in dirs {
        let path = dir.join(LIST_FILE);
        if path.exists() {
            continue;
        }
        std::fs::write(&path, LIST_FILE_HEADER).map_err(|err| GomoqError::io(&path, err))?;
        info!("created {}", path.display());
    }
    Ok(())
}

/// The generate arguments of every entry in a list file. A bare interface
/// name refers to the package of the list file's directory.
pub fn parse_list_file(content: &str) -> Vec<Vec<String>> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with("//"))
        .map(|line| {
            let parts = line.split_whitespace().map(str::to_string).collect::<Vec<_>>();
            match parts.as_slice() {
                [single] if single.ends_with(".go") => parts,
                [_] => vec![".".to_string(), parts[0].clone()],
                _ => parts,
            }
        })
        .collect()
}

/// Directories to inspect on one pass: the targets and, when recursive,
/// everything below them except hidden, `vendor` and matcher directories.
pub fn watched_dirs(targets: &[PathBuf], recursive: bool) -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    for target in targets {
        dirs.push(target.clone());
        if recursive {
            collect_subdirs(target, &mut dirs);
        }
    }
    dirs
}

fn collect_subdirs(dir: &Path, dirs: &mut Vec<PathBuf>) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            warn!("cannot read {}: {err}", dir.display());
            return;
        }
    };
    let mut subdirs = entries
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_ok_and(|ty| ty.is_dir()))
        .map(|entry| entry.path())
        .filter(|path| !is_hidden(path) && !is_skipped(path))
        .collect::<Vec<_>>();
    subdirs.sort();
    for subdir in subdirs {
        dirs.push(subdir.clone());
        collect_subdirs(&subdir, dirs);
    }
}

fn is_skipped(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| SKIPPED_DIRS.contains(&name))
}

/// Hash of the list file and of the hand-written Go sources of `dir`.
fn fingerprint_dir(dir: &Path, list: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    list.hash(&mut hasher);
    hash_sources(dir, &mut hasher);
    hasher.finish()
}

/// Fingerprint of one list entry. An entry naming another package also
/// covers the sources of that package.
fn fingerprint_entry(
    dir: &Path,
    dir_fingerprint: u64,
    args: &[String],
    locator: &PackageLocator,
) -> u64 {
    let Some(package_dir) = other_package_dir(dir, args, locator) else {
        return dir_fingerprint;
    };
    let mut hasher = DefaultHasher::new();
    dir_fingerprint.hash(&mut hasher);
    hash_sources(&package_dir, &mut hasher);
    hasher.finish()
}

fn other_package_dir(dir: &Path, args: &[String], locator: &PackageLocator) -> Option<PathBuf> {
    let [path, _, ..] = args else {
        return None;
    };
    if path == "." {
        None
    } else if path.starts_with("./") || path.starts_with("../") {
        Some(dir.join(path))
    } else {
        let located = locator.locate(path);
        if located.is_none() {
            debug!("cannot locate {path}, watching {} only", dir.display());
        }
        located
    }
}

fn hash_sources(dir: &Path, hasher: &mut DefaultHasher) {
    let mut sources = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(Result::ok)
                .map(|entry| entry.path())
                .filter(|path| {
                    path.extension().is_some_and(|ext| ext == "go")
                        && !path.to_string_lossy().ends_with("_test.go")
                })
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();
    sources.sort();

    for path in sources {
        let Ok(content) = std::fs::read_to_string(&path) else {
            continue;
        };
        if is_generated(&content) {
            continue;
        }
        path.file_name().hash(hasher);
        content.hash(hasher);
    }
}

/// Keeps the mocks listed in watched directories up to date.
///
/// `regenerate` receives the directory of a list file and the generate
/// arguments of one of its entries.
pub struct MockFileUpdater<G> {
    targets: Vec<PathBuf>,
    recursive: bool,
    fingerprints: HashMap<(PathBuf, Vec<String>), u64>,
    regenerate: G,
}

impl<G> MockFileUpdater<G>
where
    G: FnMut(&Path, &[String]) -> Result<GenerationReport, GomoqError>,
{
    pub fn new(targets: Vec<PathBuf>, recursive: bool, regenerate: G) -> Self {
        Self {
            targets,
            recursive,
            fingerprints: HashMap::new(),
            regenerate,
        }
    }

    /// One pass over all watched directories. Returns how many entries were
    /// regenerated, failed ones included.
    pub fn update(&mut self) -> usize {
        let mut seen = HashSet::new();
        let mut regenerated = 0;

        for dir in watched_dirs(&self.targets, self.recursive) {
            let list_path = dir.join(LIST_FILE);
            let Ok(list) = std::fs::read_to_string(&list_path) else {
                continue;
            };
            let dir_fingerprint = fingerprint_dir(&dir, &list);
            let locator = PackageLocator::new(&dir);

            for args in parse_list_file(&list) {
                let fingerprint = fingerprint_entry(&dir, dir_fingerprint, &args, &locator);
                let key = (dir.clone(), args.clone());
                seen.insert(key.clone());
                if self.fingerprints.get(&key) == Some(&fingerprint) {
                    continue;
                }
                // failures are retried only after the next change
                self.fingerprints.insert(key, fingerprint);
                regenerated += 1;

                debug!("regenerating `{}` in {}", args.join(" "), dir.display());
                match (self.regenerate)(&dir, &args) {
                    Ok(report) => debug!(
                        "{} written, {} unchanged",
                        report.written.len(),
                        report.unchanged.len()
                    ),
                    Err(err) => error!(
                        "cannot generate `{}` in {}: {:?}",
                        args.join(" "),
                        dir.display(),
                        miette::Report::new(err)
                    ),
                }
            }
        }

        self.fingerprints.retain(|key, _| seen.contains(key));
        regenerated
    }
}

/// Runs a job periodically on one worker thread.
#[derive(Debug)]
pub struct Watcher;

impl Watcher {
    /// Starts the worker. `run` is called once right away, then on every
    /// tick of `interval` and on every [`WatchHandle::trigger`]. Runs never
    /// overlap, and redundant triggers collapse into one pending run.
    ///
    /// The worker stops when `shutdown` receives a message or disconnects,
    /// or when the handle is stopped. Shutdown is only observed between
    /// runs.
    pub fn spawn<F>(interval: Duration, shutdown: Receiver<()>, mut run: F) -> WatchHandle
    where
        F: FnMut() + Send + 'static,
    {
        let (trigger_tx, trigger_rx) = bounded::<()>(1);
        let (stop_tx, stop_rx) = bounded::<()>(1);

        let thread = thread::spawn(move || {
            let ticker = tick(interval);
            run();
            loop {
                select! {
                    recv(stop_rx) -> _ => break,
                    recv(shutdown) -> _ => break,
                    recv(ticker) -> _ => run(),
                    recv(trigger_rx) -> msg => match msg {
                        Ok(()) => run(),
                        Err(_) => break,
                    },
                }
            }
            debug!("watcher stopped");
        });

        WatchHandle {
            trigger: trigger_tx,
            stop: stop_tx,
            thread: Some(thread),
        }
    }
}

/// Controls a running [`Watcher`]. Dropping the handle stops the worker.
#[derive(Debug)]
pub struct WatchHandle {
    trigger: Sender<()>,
    stop: Sender<()>,
    thread: Option<JoinHandle<()>>,
}

impl WatchHandle {
    /// Requests a run. Returns `false` when one is already pending.
    pub fn trigger(&self) -> bool {
        self.trigger.try_send(()).is_ok()
    }

    /// Stops the worker after the current run and waits for it.
    pub fn stop(mut self) {
        if let Err(panic) = self.finish(true) {
            std::panic::resume_unwind(panic);
        }
    }

    /// Waits for the worker to exit on its own shutdown channel.
    pub fn join(mut self) {
        if let Err(panic) = self.finish(false) {
            std::panic::resume_unwind(panic);
        }
    }

    fn finish(&mut self, stop: bool) -> thread::Result<()> {
        if stop {
            let _ = self.stop.try_send(());
        }
        match self.thread.take() {
            Some(thread) => thread.join(),
            None => Ok(()),
        }
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        let _ = self.finish(true);
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use crossbeam::channel::never;
    use pretty_assertions::assert_eq;

    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn list_file_entries() {
        let entries = parse_list_file(
            "# comment\n\nDisplay\nexample.com/app/clock Clock Timer\n  store.go  \n// old style\n",
        );
        assert_eq!(
            entries,
            vec![
                strings(&[".", "Display"]),
                strings(&["example.com/app/clock", "Clock", "Timer"]),
                strings(&["store.go"]),
            ]
        );
    }

    #[test]
    fn bootstraps_missing_list_files_only() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        fs::create_dir_all(&a).unwrap();
        fs::create_dir_all(&b).unwrap();
        fs::write(b.join(LIST_FILE), "Display\n").unwrap();

        create_list_files_if_necessary(&[a.clone(), b.clone()]).unwrap();

        let created = fs::read_to_string(a.join(LIST_FILE)).unwrap();
        assert!(created.starts_with("# Use this file"));
        assert!(parse_list_file(&created).is_empty());
        assert_eq!(fs::read_to_string(b.join(LIST_FILE)).unwrap(), "Display\n");
    }

    #[test]
    fn recursive_discovery_skips_hidden_vendor_and_matchers() {
        let dir = tempfile::tempdir().unwrap();
        for sub in ["api", "api/v1", ".git", "vendor/x", "matchers", "store"] {
            fs::create_dir_all(dir.path().join(sub)).unwrap();
        }
        let root = dir.path().to_path_buf();
        assert_eq!(
            watched_dirs(&[root.clone()], true),
            vec![
                root.clone(),
                root.join("api"),
                root.join("api/v1"),
                root.join("store"),
            ]
        );
        assert_eq!(watched_dirs(&[root.clone()], false), vec![root]);
    }

    #[test]
    fn regenerates_only_on_change() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(LIST_FILE), "Display\n").unwrap();
        fs::write(dir.path().join("display.go"), "package display\n").unwrap();

        let calls = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&calls);
        let mut updater = MockFileUpdater::new(
            vec![dir.path().to_path_buf()],
            false,
            move |dir: &Path, args: &[String]| {
                recorded.lock().unwrap().push((dir.to_path_buf(), args.to_vec()));
                // the mock itself must not count as a change
                fs::write(
                    dir.join("mock_display_test.go"),
                    format!("{}\npackage display_test\n", gomoq_gen::MARKER),
                )
                .unwrap();
                Ok(GenerationReport::default())
            },
        );

        assert_eq!(updater.update(), 1);
        assert_eq!(updater.update(), 0);

        fs::write(
            dir.path().join("display.go"),
            "package display\n\ntype Display interface{}\n",
        )
        .unwrap();
        assert_eq!(updater.update(), 1);

        fs::write(dir.path().join(LIST_FILE), "Display\nexample.com/x Clock\n").unwrap();
        assert_eq!(updater.update(), 2);

        assert_eq!(
            calls.lock().unwrap().last().unwrap(),
            &(dir.path().to_path_buf(), strings(&["example.com/x", "Clock"]))
        );
    }

    #[test]
    fn entries_of_other_packages_follow_their_sources() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        fs::create_dir_all(&a).unwrap();
        fs::create_dir_all(&b).unwrap();
        fs::write(dir.path().join("go.mod"), "module example.com/app\n").unwrap();
        fs::write(a.join(LIST_FILE), "example.com/app/b B\n../b B\n").unwrap();
        fs::write(a.join("a.go"), "package a\n").unwrap();
        fs::write(b.join("b.go"), "package b\n\ntype B interface{ One() }\n").unwrap();

        let mut updater = MockFileUpdater::new(vec![a.clone()], false, |_: &Path, _: &[String]| {
            Ok(GenerationReport::default())
        });
        assert_eq!(updater.update(), 2);
        assert_eq!(updater.update(), 0);

        fs::write(
            b.join("b.go"),
            "package b\n\ntype B interface{ One(); Two() }\n",
        )
        .unwrap();
        assert_eq!(updater.update(), 2);
        assert_eq!(updater.update(), 0);
    }

    #[test]
    fn failures_wait_for_the_next_change() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(LIST_FILE), "Display\n").unwrap();

        let mut updater = MockFileUpdater::new(
            vec![dir.path().to_path_buf()],
            false,
            |_: &Path, _: &[String]| Err(GomoqError::usage("broken")),
        );
        assert_eq!(updater.update(), 1);
        assert_eq!(updater.update(), 0);

        fs::write(dir.path().join("display.go"), "package display\n").unwrap();
        assert_eq!(updater.update(), 1);
    }

    #[test]
    fn runs_never_overlap() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let overlapped = Arc::new(AtomicBool::new(false));
        let runs = Arc::new(AtomicUsize::new(0));

        let handle = {
            let in_flight = Arc::clone(&in_flight);
            let overlapped = Arc::clone(&overlapped);
            let runs = Arc::clone(&runs);
            Watcher::spawn(Duration::from_millis(5), never(), move || {
                if in_flight.fetch_add(1, Ordering::SeqCst) != 0 {
                    overlapped.store(true, Ordering::SeqCst);
                }
                thread::sleep(Duration::from_millis(2));
                runs.fetch_add(1, Ordering::SeqCst);
                in_flight.fetch_sub(1, Ordering::SeqCst);
            })
        };

        thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    for _ in 0..50 {
                        handle.trigger();
                        thread::sleep(Duration::from_micros(200));
                    }
                });
            }
        });
        handle.stop();

        assert!(!overlapped.load(Ordering::SeqCst));
        let runs = runs.load(Ordering::SeqCst);
        // 400 triggers collapse into far fewer runs
        assert!(runs >= 1 && runs < 400, "{runs} runs");
    }

    #[test]
    fn shutdown_channel_stops_the_worker() {
        let (shutdown_tx, shutdown_rx) = bounded(1);
        let runs = Arc::new(AtomicUsize::new(0));
        let counted = Arc::clone(&runs);
        let handle = Watcher::spawn(Duration::from_secs(60), shutdown_rx, move || {
            counted.fetch_add(1, Ordering::SeqCst);
        });

        shutdown_tx.send(()).unwrap();
        handle.join();
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }
}
