//! kettle - run the two-stage bootstrap.
//!
//! Prints one `==> [n/N]` line per stage and echoes each external command.
//! Exits with the failing stage's exit code, or 1 for any other error.

use clap::Parser;
use kettle::logging::init_logging;
use kettle::{Bootstrap, KettleError, KettleOptions};
use std::path::PathBuf;
use std::process::ExitCode;

/// Bootstrap the compiler: portable build first, then a native self-build.
#[derive(Parser, Debug)]
#[command(name = "kettle")]
#[command(version)]
pub struct Cli {
    /// JSON configuration file. Relative paths inside it resolve against
    /// its directory. Defaults describe the standard layout under the
    /// current directory.
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Debug-level logging (overridden by RUST_LOG).
    #[arg(long, short = 'd')]
    debug: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Bootstrap failed");
            eprintln!("kettle: {}", e);
            ExitCode::from(exit_code_for(&e))
        }
    }
}

async fn run(cli: Cli) -> Result<(), KettleError> {
    let options = match &cli.config {
        Some(path) => KettleOptions::from_file(path)?,
        None => KettleOptions::default().resolve_paths(&std::env::current_dir()?),
    };

    init_logging(cli.debug, options.log_dir.as_deref())?;
    match &cli.config {
        Some(path) => tracing::info!("Loaded configuration from {}", path.display()),
        None => tracing::info!("Using default configuration"),
    }

    let metrics = Bootstrap::new(options)?.execute().await?;
    tracing::info!(
        total_duration_ms = metrics.total_duration_ms as u64,
        "Bootstrap complete"
    );
    Ok(())
}

/// Process exit status for `error`. Codes outside 1..=255 become 1.
fn exit_code_for(error: &KettleError) -> u8 {
    u8::try_from(error.exit_code()).unwrap_or(1).max(1)
}
