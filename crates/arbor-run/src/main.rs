use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() -> miette::Result<()> {
    let cli = arbor_run::Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(cli.verbose.tracing_level_filter().to_string())),
        )
        .init();
    tracing::debug!(?cli, "parsed arguments");

    cli.run()
}
