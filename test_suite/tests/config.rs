mod common;

use clap::Parser;
use gomoq::cli::Cli;
use gomoq::GomoqError;

use common::{module, read, write};

const CLOCK: &str = "package clock\n\ntype Clock interface {\n\tNow() int64\n}\n";
const WAITER: &str =
    "package clock\n\ntype Tick struct{}\n\ntype Waiter interface {\n\tWait(t *Tick) bool\n}\n";

fn run(pkg: &std::path::Path, args: &[&str]) -> Result<(), GomoqError> {
    let cli = Cli::try_parse_from(std::iter::once("gomoq").chain(args.iter().copied())).unwrap();
    gomoq::run_in(cli, pkg)
}

#[test]
fn test1() {
    let dir = module(&[("clock/clock.go", CLOCK)]);
    let pkg = dir.path().join("clock");
    write(
        &pkg,
        "gomoq.toml",
        "runtime_import = \"example.com/fork/pegomock\"\n",
    );

    run(&pkg, &["generate", "clock.go"]).unwrap();
    let mock = read(&pkg, "mock_clock_test.go");
    assert!(mock.contains("\tpegomock \"example.com/fork/pegomock\"\n"));
    assert!(!mock.contains("github.com/petergtz/pegomock"));
}

#[test]
fn test2() {
    let dir = module(&[("clock/clock.go", WAITER)]);
    let pkg = dir.path().join("clock");
    write(&pkg, "gomoq.toml", "matchers_dir = \"fakes\"\n");

    run(&pkg, &["generate", "-m", "clock.go"]).unwrap();
    assert!(read(&pkg, "fakes/ptr_to_clock_tick.go").starts_with(gomoq::MARKER));
    assert!(!pkg.join("matchers").exists());

    // the flag wins over the file
    run(&pkg, &["generate", "-m", "-p", "other", "clock.go"]).unwrap();
    assert!(read(&pkg, "other/ptr_to_clock_tick.go").contains("package other\n"));
}

#[test]
fn test3() {
    let dir = module(&[("clock/clock.go", CLOCK)]);
    let pkg = dir.path().join("clock");
    write(&pkg, "gomoq.toml", "watch_interval = 5\n");

    let err = run(&pkg, &["generate", "clock.go"]).unwrap_err();
    assert!(matches!(err, GomoqError::Config { .. }), "{err:?}");
    assert!(!pkg.join("mock_clock_test.go").exists());
}
