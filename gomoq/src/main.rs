use clap::Parser;
use gomoq::cli::Cli;

fn main() -> miette::Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::new()
        .filter_level(cli.verbose.log_level_filter())
        .format_timestamp(None)
        .init();

    gomoq::run(cli)?;
    Ok(())
}
