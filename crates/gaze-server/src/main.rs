use anyhow::Context;
use clap::Parser;
use gaze_config::GazeConfig;
use gaze_db::GazeDb;
use tokio::net::TcpListener;

mod cli;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("gazelog error: {error:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    init_tracing(cli.quiet, cli.verbose)?;

    let mut config = GazeConfig::load_with_dotenv().context("failed to load configuration")?;
    cli.apply_overrides(&mut config);

    let store = GazeDb::from_config(&config.database)
        .await
        .context("failed to open database")?;

    match cli.subcommand() {
        cli::Commands::Serve => serve(config, store).await,
        cli::Commands::EnsureSchema => ensure_schema(store).await,
    }
}

async fn serve(config: GazeConfig, store: Option<GazeDb>) -> anyhow::Result<()> {
    if store.is_none() {
        tracing::warn!("DATABASE_URL not set; submissions will be acknowledged but not stored");
    }
    if !config.server.static_dir.is_dir() {
        tracing::warn!(
            dir = %config.server.static_dir.display(),
            "static directory does not exist; only the API will respond"
        );
    }

    let addr = config.server.bind_addr();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    let app = gaze_server::app(&config, store);
    gaze_server::serve(listener, app, shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("shut down cleanly");
    Ok(())
}

async fn ensure_schema(store: Option<GazeDb>) -> anyhow::Result<()> {
    let db = store.context("no database configured; set DATABASE_URL")?;
    db.ensure_schema()
        .await
        .context("failed to provision gaze_logs")?;
    tracing::info!("schema ready");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::error!(%error, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!(%error, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("shutdown signal received");
}

fn init_tracing(quiet: bool, verbose: bool) -> anyhow::Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "info"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("GAZE_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}
