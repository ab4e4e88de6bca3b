use anyhow::{Context, Result};
use clap::Parser;
use simplehttp_core::SimpleServer;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::sync::oneshot;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "simplehttp=info,simplehttp_core=info";

#[derive(Parser)]
#[command(name = "simplehttp")]
#[command(about = "Serve canned HTTP responses defined in an XML settings file")]
#[command(version)]
pub struct Cli {
    /// Settings file
    #[arg(short, long, default_value = "settings.xml")]
    pub config: PathBuf,
    /// Log filter, e.g. "debug" or "simplehttp_core=trace"
    #[arg(long)]
    pub log_level: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref());

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{:#}", err);
            eprintln!("Can't initialize server.");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(directive: Option<&str>) {
    let filter = match directive {
        Some(directive) => EnvFilter::new(directive),
        None => {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
        }
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run(cli: &Cli) -> Result<()> {
    let server = SimpleServer::from_settings_file(&cli.config)
        .with_context(|| format!("loading settings from {}", cli.config.display()))?;
    server.start().context("starting server")?;

    println!("{server}");
    println!("Press Enter or Ctrl-C to stop the server.");

    wait_for_operator().await?;

    server.stop().context("stopping server")?;
    println!("{server}");
    Ok(())
}

/// Resolve on Enter or Ctrl-C; a closed stdin leaves only Ctrl-C
async fn wait_for_operator() -> Result<()> {
    // A blocking stdin read cannot be cancelled, so it lives on a detached
    // thread rather than the runtime's blocking pool.
    let (enter_tx, enter_rx) = oneshot::channel();
    std::thread::spawn(move || {
        let mut line = String::new();
        if let Ok(n) = std::io::stdin().read_line(&mut line) {
            if n > 0 {
                let _ = enter_tx.send(());
            }
        }
    });

    tokio::select! {
        entered = enter_rx => {
            if entered.is_err() {
                tokio::signal::ctrl_c().await.context("waiting for Ctrl-C")?;
            }
        }
        res = tokio::signal::ctrl_c() => res.context("waiting for Ctrl-C")?,
    }
    Ok(())
}
