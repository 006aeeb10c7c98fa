use anyhow::Context;
use clap::Parser;
use tracing::error;

use recipe_analyzer::{
    app::{run_analyze, run_review},
    cli::{Cli, Command},
    config::Config,
    observability,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    std::panic::set_hook(Box::new(|panic_info| {
        let message = panic_info
            .payload()
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| {
                panic_info
                    .payload()
                    .downcast_ref::<String>()
                    .map(String::as_str)
            })
            .unwrap_or("unknown panic payload");

        if let Some(location) = panic_info.location() {
            error!(
                file = location.file(),
                line = location.line(),
                message,
                "panic occurred"
            );
        } else {
            error!(message, "panic occurred without location information");
        }
    }));

    let cli = Cli::parse();
    observability::init_tracing(cli.log_format)?;
    let config = Config::from_env().context("failed to load configuration")?;

    let result = match &cli.command {
        Command::Analyze(args) => run_analyze(&config, args).await,
        Command::Review(command) => run_review(command),
    };
    if let Err(error) = &result {
        error!(error = %format!("{error:#}"), "command failed");
    }
    result
}
