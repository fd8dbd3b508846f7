//! Quill server binary.
//!
//! `quill-server [config.toml]` starts the axum HTTP server with structured
//! logging and graceful shutdown on SIGTERM/SIGINT.
//!
//! `quill-server init-db [config.toml]` is the one operator action: it runs
//! the destructive schema script against the configured database and exits.
//! It is never run implicitly on startup.

use quill_server::{app, config, AppState};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

fn resolve_config_path(cli_arg: Option<String>) -> (Option<String>, &'static str) {
    if let Some(path) = cli_arg.filter(|value| !value.trim().is_empty()) {
        return (Some(path), "cli-arg");
    }

    if let Ok(path) = std::env::var("QUILL_CONFIG_PATH") {
        if !path.trim().is_empty() {
            return (Some(path), "env-var");
        }
    }

    (None, "default")
}

fn init_tracing(config: &config::Config) {
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    if config.log_json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn load_startup_config(cli_arg: Option<String>) -> config::Config {
    let (resolved_path, source) = resolve_config_path(cli_arg);
    let selected_path = resolved_path.as_deref().or(Some("config.toml"));

    let config = config::Config::load(selected_path)
        .expect("failed to load configuration — the server cannot start without valid config");

    init_tracing(&config);

    tracing::info!(
        source,
        path = selected_path.unwrap_or("<none>"),
        "resolved startup configuration path"
    );

    config
}

/// The operator "initialize schema" action. Destructive on purpose: wipes
/// and recreates the tables for a fresh setup.
fn run_init_db(config: &config::Config) {
    let mut db = quill_db::RequestDb::new(&config.database);

    match quill_db::init_db(&mut db) {
        Ok(()) => {
            println!("Initialized the database.");
        }
        Err(e) => {
            // SchemaError distinguishes an unreachable database from a
            // failing script; its Display carries that distinction.
            eprintln!("Failed to initialize the database: {e}");
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    let mut args = std::env::args().skip(1);
    let first = args.next();

    if first.as_deref() == Some("init-db") {
        let config = load_startup_config(args.next());
        run_init_db(&config);
        return;
    }

    let config = load_startup_config(first);

    let state = AppState {
        database: config.database.clone(),
    };

    let app = app(state);
    let addr = config.bind_addr();

    tracing::info!(%addr, database = %config.database, "starting quill server");

    let listener = TcpListener::bind(addr)
        .await
        .expect("failed to bind to address — is another process using this port?");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("quill server shut down");
}

/// Waits for a SIGINT (Ctrl+C) or SIGTERM signal for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { tracing::info!("received SIGINT, initiating graceful shutdown"); }
        () = terminate => { tracing::info!("received SIGTERM, initiating graceful shutdown"); }
    }
}
