//! Taska CLI and REST API entry point.
//!
//! Binary name: `taska`
//!
//! Parses CLI arguments, initializes configuration and services, then
//! dispatches to the appropriate command handler or starts the REST API
//! server.

mod cli;
mod http;
mod state;

use clap::Parser;
use clap_complete::generate;

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up tracing based on verbosity; RUST_LOG wins when set.
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,taska_api=debug,taska_core=debug,taska_infra=debug",
        _ => "trace",
    };
    taska_observe::tracing_setup::init_tracing(filter, cli.log_json, cli.otel)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "taska", &mut std::io::stdout());
        return Ok(());
    }

    match cli.command {
        Commands::Check => {
            run_check(cli.json).await?;
        }

        Commands::Serve { port, host } => {
            // Initialize application state (config, stores, backend client)
            let state = AppState::init().await?;

            let host = host.unwrap_or_else(|| state.config.server.host.clone());
            let port = port.unwrap_or(state.config.server.port);
            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;

            println!(
                "  {} Taska API listening on {}",
                console::style("⚡").bold(),
                console::style(format!("http://{addr}")).cyan()
            );
            println!(
                "  {}",
                console::style(format!("data dir: {}", state.data_dir.display())).dim()
            );
            println!("  {}", console::style("Press Ctrl+C to stop").dim());

            let router = http::router::build_router(state);

            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            println!("\n  Server stopped.");
        }

        Commands::Completions { .. } => unreachable!("handled above"),
    }

    taska_observe::tracing_setup::shutdown_tracing();
    Ok(())
}

/// Inspect configuration and report what `serve` would use.
///
/// Unlike `serve`, this never fails on a missing API key; it reports the
/// gap instead so operators can fix the environment before starting.
async fn run_check(json: bool) -> anyhow::Result<()> {
    let data_dir = taska_infra::config::resolve_data_dir();
    let config = taska_infra::config::load_config(&data_dir).await;

    let config_path = data_dir.join("config.toml");
    let has_config = tokio::fs::try_exists(&config_path).await.unwrap_or(false);
    let has_api_key = std::env::var(&config.backend.api_key_env).is_ok();
    let blob_root = config
        .storage
        .root
        .clone()
        .unwrap_or_else(|| data_dir.join("blobs"));
    let identity_mode = if config.identity.userinfo_url.is_some() {
        "oidc"
    } else if config.identity.tokens.is_empty() {
        "none"
    } else {
        "static"
    };
    let healthy = has_api_key && identity_mode != "none";

    if json {
        let check = serde_json::json!({
            "data_dir": data_dir.display().to_string(),
            "config_file_exists": has_config,
            "backend_base_url": config.backend.base_url,
            "backend_api_key_present": has_api_key,
            "blob_root": blob_root.display().to_string(),
            "identity_mode": identity_mode,
            "healthy": healthy,
        });
        println!("{}", serde_json::to_string_pretty(&check)?);
    } else {
        println!();
        println!(
            "  {} Taska configuration check",
            console::style("🔍").bold()
        );
        println!();
        let check_mark = |ok: bool| {
            if ok {
                format!("{}", console::style("✓").green())
            } else {
                format!("{}", console::style("✗").red())
            }
        };
        println!("  data dir:    {}", data_dir.display());
        println!(
            "  config file: {}",
            if has_config {
                config_path.display().to_string()
            } else {
                "(none, using defaults)".to_string()
            }
        );
        println!("  blob root:   {}", blob_root.display());
        println!("  backend:     {}", config.backend.base_url);
        println!(
            "  {} backend API key in {}",
            check_mark(has_api_key),
            config.backend.api_key_env
        );
        println!(
            "  {} identity provider: {}",
            check_mark(identity_mode != "none"),
            identity_mode
        );
        println!();
    }

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
