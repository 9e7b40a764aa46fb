//! Shortlet - Main Entry Point
//!
//! Parses arguments, loads configuration and runs a single command.

use std::process::ExitCode;

use clap::Parser;
use shortlet::cli::{self, Args};
use shortlet::{App, AppError};
use shortlet_infrastructure::ClientConfig;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    cli::init_logging(args.log_format);

    match run(args).await {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            eprintln!("error: {}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<String, AppError> {
    let mut config = ClientConfig::from_env()?;
    if let Some(base_url) = &args.base_url {
        config = config.with_base_url(base_url)?;
    }
    if args.ephemeral {
        config.session_file = None;
    } else if let Some(path) = args.session_file {
        config.session_file = Some(path);
    }

    let app = App::connect(&config).await?;
    let output = app.execute(args.command).await;
    app.finish().await;
    output
}
