use clap::Parser;
use memotic::{cli, logging};

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();
    logging::init_tracing(cli.default_log_level());
    if let Err(err) = cli::run(cli).await {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
