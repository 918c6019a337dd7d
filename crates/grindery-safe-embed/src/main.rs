/*
[INPUT]:  CLI arguments, YAML configuration file, OS shutdown signals
[OUTPUT]: Authenticated embed URL for the configured Safe, or the waiting indicator
[POS]:    Binary entry point
[UPDATE]: When changing CLI flags, startup flow, or shutdown handling
*/

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use console::style;
use dialoguer::{Confirm, theme::ColorfulTheme};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use grindery_safe_adapter::{EvmWalletSigner, SessionContext, WalletSigner};
use grindery_safe_embed::config::default_config_path;
use grindery_safe_embed::{EmbedConfig, RunOutcome, WAITING_TEXT};

#[derive(Parser, Debug)]
#[command(name = "grindery-safe-embed", version, about = "Grindery Safe session bootstrap")]
struct Cli {
    /// Defaults to <config dir>/grindery-safe/config.yaml
    #[arg(long = "config", value_name = "PATH")]
    config_path: Option<PathBuf>,
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    log_level: String,
    /// Validate configuration and signer key, then exit
    #[arg(long = "dry-run")]
    dry_run: bool,
    /// Never ask to retry a failed session
    #[arg(long = "no-prompt")]
    no_prompt: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(&args.log_level)?;

    let config_path = match args.config_path {
        Some(path) => path,
        None => default_config_path().context("no config dir on this platform; pass --config")?,
    };
    info!(
        config_path = %config_path.display(),
        dry_run = args.dry_run,
        "starting grindery-safe-embed"
    );

    let config = EmbedConfig::from_file(&config_path).context("load config")?;
    let signer = EvmWalletSigner::new(&config.resolve_private_key()?).context("load signer key")?;
    info!(
        safe = %config.identity(),
        signer = signer.address(),
        engine = %config.engine.base_url,
        "configuration loaded"
    );

    if args.dry_run {
        info!("dry-run requested; configuration validated");
        return Ok(());
    }

    let shutdown = CancellationToken::new();
    setup_signal_handlers(shutdown.clone());

    let no_prompt = args.no_prompt;
    let outcome = grindery_safe_embed::run(&config, Arc::new(signer), shutdown, |context| {
        if no_prompt {
            return Ok(false);
        }
        tokio::task::block_in_place(|| prompt_retry(context))
    })
    .await?;

    match outcome {
        RunOutcome::Authenticated { view, context } => {
            if context.is_token_expired() {
                warn!("access token already past its advertised lifetime");
            }
            println!("{}", style("Safe session authenticated.").green());
            println!("{view}");
            Ok(())
        }
        RunOutcome::NotAuthenticated { context, .. } => {
            println!("{}", style(WAITING_TEXT).yellow());
            match context.failure {
                Some(failure) => bail!("{:?} failed: {}", failure.stage, failure.reason),
                None => bail!("engine returned neither a session nor a challenge"),
            }
        }
        RunOutcome::Cancelled => {
            info!("shutdown signal received; session abandoned");
            Ok(())
        }
    }
}

fn prompt_retry(context: &SessionContext) -> Result<bool> {
    match &context.failure {
        Some(failure) => println!(
            "{} {}",
            style(format!("{:?} failed:", failure.stage)).red().bold(),
            failure.reason
        ),
        None => println!(
            "{}",
            style("Engine returned neither a session nor a challenge.").yellow()
        ),
    }
    let retry = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt("Retry with a fresh challenge?")
        .default(true)
        .interact()?;
    Ok(retry)
}

fn init_tracing(log_level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(log_level).context("invalid log level")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow!(err))
        .context("initialize tracing subscriber")?;
    Ok(())
}

fn setup_signal_handlers(shutdown: CancellationToken) {
    let shutdown_clone = shutdown.clone();
    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to install SIGINT handler");
            return;
        }
        info!("received SIGINT");
        shutdown_clone.cancel();
    });

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        tokio::spawn(async move {
            match signal(SignalKind::terminate()) {
                Ok(mut stream) => {
                    stream.recv().await;
                    info!("received SIGTERM");
                    shutdown.cancel();
                }
                Err(err) => {
                    warn!(error = %err, "failed to install SIGTERM handler");
                }
            }
        });
    }
}
