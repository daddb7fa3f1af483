use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_verbosity_flag::{InfoLevel, Verbosity};

use crate::destination::DestinationArgs;
use crate::filehandling::GenerateSettings;
use crate::remove::RemoveOptions;

#[derive(Parser, Debug)]
#[command(name = "gomoq", version)]
#[command(about = "Generates pegomock-style mocks for Go interfaces", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub verbose: Verbosity<InfoLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate mocks for interfaces of a package or of a Go source file
    Generate {
        /// Output file, when a single interface is mocked
        #[arg(short, long, value_name = "FILE", conflicts_with = "output_dir")]
        output: Option<PathBuf>,
        /// Directory that receives one mock_<interface>.go per interface
        #[arg(long = "output-dir", value_name = "DIR")]
        output_dir: Option<PathBuf>,
        /// Package of the generated files
        #[arg(long, value_name = "NAME")]
        package: Option<String>,
        /// Import path of the package the mocks are generated into
        #[arg(long = "self_package", value_name = "PATH")]
        self_package: Option<String>,
        /// Print the extracted interface models
        #[arg(short, long)]
        debug: bool,
        /// Parse the Go sources instead of running `go`; one interface only
        #[arg(long = "use-experimental-model-gen")]
        use_experimental_model_gen: bool,
        /// Also generate argument matchers for the parameter types
        #[arg(short = 'm', long = "generate-matchers")]
        generate_matchers: bool,
        /// Directory of the generated matchers
        #[arg(short = 'p', long = "matchers-dir", value_name = "DIR")]
        matchers_dir: Option<PathBuf>,
        /// A package path followed by interfaces, or a single .go file
        #[arg(required = true, value_name = "ARGS")]
        args: Vec<String>,
    },

    /// Watch directories and regenerate the mocks listed in their interfaces_to_mock files
    Watch {
        /// Watch sub-directories as well
        #[arg(short, long)]
        recursive: bool,
        /// Directories of Go packages, the working directory by default
        #[arg(value_name = "DIRS")]
        dirs: Vec<PathBuf>,
    },

    /// Remove generated mocks and matchers
    Remove {
        /// Search sub-directories as well
        #[arg(short, long)]
        recursive: bool,
        /// Do not ask before removing a file
        #[arg(short = 'n', long = "non-interactive")]
        non_interactive: bool,
        /// Only list the files that would be removed
        #[arg(short = 'd', long = "dry-run")]
        dry_run: bool,
        /// Print prompts only
        #[arg(short, long)]
        silent: bool,
        /// Directory or file, the working directory by default
        #[arg(value_name = "PATH")]
        path: Option<PathBuf>,
    },
}

impl Command {
    /// Settings of a `generate` command run in `work_dir`.
    pub fn generate_settings(&self, work_dir: PathBuf) -> Option<GenerateSettings> {
        let Command::Generate {
            output,
            output_dir,
            package,
            self_package,
            debug,
            use_experimental_model_gen,
            generate_matchers,
            matchers_dir,
            args,
        } = self
        else {
            return None;
        };

        Some(GenerateSettings {
            work_dir,
            args: args.clone(),
            destination: DestinationArgs {
                output: output.clone(),
                output_dir: output_dir.clone(),
                package: package.clone(),
            },
            self_package: self_package.clone().unwrap_or_default(),
            debug: *debug,
            use_source_model_gen: *use_experimental_model_gen,
            generate_matchers: *generate_matchers,
            matchers_dir: matchers_dir.clone(),
        })
    }

    /// Options of a `remove` command run in `work_dir`.
    pub fn remove_options(&self, work_dir: PathBuf) -> Option<RemoveOptions> {
        let Command::Remove {
            recursive,
            non_interactive,
            dry_run,
            silent,
            path,
        } = self
        else {
            return None;
        };

        Some(RemoveOptions {
            path: match path {
                Some(path) if path.is_absolute() => path.clone(),
                Some(path) => work_dir.join(path),
                None => work_dir,
            },
            recursive: *recursive,
            non_interactive: *non_interactive,
            dry_run: *dry_run,
            silent: *silent,
        })
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn command_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn generate_flags() {
        let cli = Cli::try_parse_from([
            "gomoq",
            "generate",
            "--output-dir",
            "fakes",
            "--self_package",
            "example.com/app/fakes",
            "-m",
            "example.com/app",
            "Display",
            "Clock",
        ])
        .unwrap();

        let settings = cli
            .command
            .generate_settings(PathBuf::from("/src/app"))
            .unwrap();
        assert_eq!(
            settings,
            GenerateSettings {
                work_dir: PathBuf::from("/src/app"),
                args: vec![
                    "example.com/app".to_string(),
                    "Display".to_string(),
                    "Clock".to_string(),
                ],
                destination: DestinationArgs {
                    output_dir: Some(PathBuf::from("fakes")),
                    ..Default::default()
                },
                self_package: "example.com/app/fakes".to_string(),
                generate_matchers: true,
                ..Default::default()
            }
        );
    }

    #[test]
    fn output_and_output_dir_conflict() {
        let err = Cli::try_parse_from([
            "gomoq", "generate", "-o", "mock.go", "--output-dir", "fakes", "app.go",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn generate_needs_arguments() {
        assert!(Cli::try_parse_from(["gomoq", "generate"]).is_err());
    }

    #[test]
    fn remove_flags() {
        let cli =
            Cli::try_parse_from(["gomoq", "remove", "-r", "-n", "--dry-run", "mocks"]).unwrap();
        assert_eq!(
            cli.command.remove_options(PathBuf::from("/src/app")),
            Some(RemoveOptions {
                path: PathBuf::from("/src/app/mocks"),
                recursive: true,
                non_interactive: true,
                dry_run: true,
                silent: false,
            })
        );
    }

    #[test]
    fn remove_dry_run_short_flag() {
        let cli = Cli::try_parse_from(["gomoq", "remove", "-d", "-s"]).unwrap();
        assert_eq!(
            cli.command.remove_options(PathBuf::from("/src/app")),
            Some(RemoveOptions {
                path: PathBuf::from("/src/app"),
                recursive: false,
                non_interactive: false,
                dry_run: true,
                silent: true,
            })
        );
    }

    #[test]
    fn watch_defaults() {
        let cli = Cli::try_parse_from(["gomoq", "watch"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Watch { recursive: false, ref dirs } if dirs.is_empty()
        ));
    }
}
