mod common;

use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam::channel::{bounded, never};
use gomoq::{create_list_files_if_necessary, Config, MockFileUpdater, Watcher, LIST_FILE};

use common::{module, read, settings, write};

fn wait_for(what: &str, mut done: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(20);
    while !done() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        thread::sleep(Duration::from_millis(10));
    }
}

fn mock_contains(pkg: &Path, needle: &str) -> bool {
    std::fs::read_to_string(pkg.join("mock_display_test.go"))
        .map(|mock| mock.contains(needle))
        .unwrap_or(false)
}

#[test]
fn test1() {
    let dir = module(&[(
        "display/display.go",
        "package display\n\ntype Display interface {\n\tShow(text string)\n}\n",
    )]);
    let pkg = dir.path().join("display");
    create_list_files_if_necessary(&[pkg.clone()]).unwrap();
    assert!(pkg.join(LIST_FILE).exists());
    write(&pkg, LIST_FILE, "Display\n");

    let mut updater = MockFileUpdater::new(vec![pkg.clone()], false, |dir: &Path, args: &[String]| {
        let args = args.iter().map(String::as_str).collect::<Vec<_>>();
        gomoq::generate_mock_files(&settings(dir, &args), &Config::default(), &mut Vec::new())
    });
    let handle = Watcher::spawn(Duration::from_millis(20), never(), move || {
        updater.update();
    });

    wait_for("the first mock", || mock_contains(&pkg, "Show(text string)"));

    // edits land while runs may be in flight; the last one wins
    for i in 0..5 {
        write(
            &pkg,
            "display.go",
            &format!("package display\n\ntype Display interface {{\n\tShow(text string)\n\tStep{i}()\n}}\n"),
        );
        for _ in 0..4 {
            handle.trigger();
        }
    }
    wait_for("the last edit", || mock_contains(&pkg, "Step4()"));
    handle.stop();

    let mock = read(&pkg, "mock_display_test.go");
    assert!(gomoq::is_generated(&mock));
    assert!(!mock.contains("Step3()"));
}

#[test]
fn test2() {
    // recursive watching picks up list files in sub-packages
    let dir = module(&[
        ("a/a.go", "package a\n\ntype A interface {\n\tA()\n}\n"),
        ("a/b/b.go", "package b\n\ntype B interface {\n\tB()\n}\n"),
        ("a/b/interfaces_to_mock", "B\n"),
        ("a/vendor/c/c.go", "package c\n\ntype C interface {\n\tC()\n}\n"),
        ("a/vendor/c/interfaces_to_mock", "C\n"),
    ]);
    let root = dir.path().join("a");
    create_list_files_if_necessary(&[root.clone()]).unwrap();

    let mut updater = MockFileUpdater::new(vec![root.clone()], true, |dir: &Path, args: &[String]| {
        let args = args.iter().map(String::as_str).collect::<Vec<_>>();
        gomoq::generate_mock_files(&settings(dir, &args), &Config::default(), &mut Vec::new())
    });
    assert_eq!(updater.update(), 1);

    assert!(root.join("b/mock_b_test.go").exists());
    assert!(!root.join("mock_a_test.go").exists());
    assert!(!root.join("vendor/c/mock_c_test.go").exists());
}

#[test]
fn test3() {
    // `watch` returns once its shutdown channel fires
    let dir = module(&[(
        "display/display.go",
        "package display\n\ntype Display interface {\n\tShow(text string)\n}\n",
    )]);
    let pkg = dir.path().join("display");
    write(&pkg, LIST_FILE, "display.go\n");

    let config = Config {
        watch_interval_ms: 20,
        ..Config::default()
    };
    let (shutdown_tx, shutdown_rx) = bounded(1);
    let targets = vec![pkg.clone()];
    let watching = thread::spawn(move || gomoq::watch(targets, false, config, shutdown_rx));

    wait_for("the mock", || mock_contains(&pkg, "Show(text string)"));
    shutdown_tx.send(()).unwrap();
    watching.join().unwrap().unwrap();

    // nothing regenerates after shutdown
    write(
        &pkg,
        "display.go",
        "package display\n\ntype Display interface {\n\tHide()\n}\n",
    );
    thread::sleep(Duration::from_millis(100));
    assert!(!mock_contains(&pkg, "Hide()"));
}
