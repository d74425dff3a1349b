// ABOUTME: Main entry point for kubo-peek
// ABOUTME: Loads configuration, starts logging, and runs the pipeline until a fatal error

use anyhow::Result;
use clap::Parser;
use kubo_peek::config::Config;
use kubo_peek::constants::logging::DEFAULT_FILTER;
use kubo_peek::image_protocols::TerminalSink;
use kubo_peek::pipeline::Pipeline;
use kubo_sdk::{KuboClient, KuboError};
use std::convert::Infallible;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "kubo-peek")]
#[command(
    about = "Show images announced to a Kubo node inline in the terminal",
    long_about = None
)]
struct Cli {
    /// Config file applied on top of the standard locations
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Node RPC API address (default http://127.0.0.1:5001)
    #[arg(long, value_name = "URL")]
    api_url: Option<String>,
}

async fn run(cli: Cli) -> Result<Infallible> {
    let mut config = Config::load_with(cli.config.as_deref())?;
    if let Some(api_url) = cli.api_url {
        config.api_url = Some(api_url);
    }
    let settings = config.resolve()?;

    let client = KuboClient::new(settings.api_url.as_str())?;
    let sink = Arc::new(TerminalSink::stdout());

    Pipeline::new(client, &settings, sink).run().await
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(DEFAULT_FILTER))
        .init();

    let cli = Cli::parse();

    let err = match run(cli).await {
        Ok(never) => match never {},
        Err(err) => err,
    };

    log::error!("{:#}", err);
    if let Some(help) = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<KuboError>())
        .and_then(KuboError::help_text)
    {
        log::error!("{}", help);
    }

    ExitCode::FAILURE
}
