use std::process::ExitCode;

use clap::Parser;

mod config;
mod models;
mod persist;
mod upload;
mod walker;

#[cfg(test)]
mod test_support;

use config::Config;

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = Config::parse();

    match walker::run_batch(&config).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "batch aborted");
            ExitCode::FAILURE
        }
    }
}
