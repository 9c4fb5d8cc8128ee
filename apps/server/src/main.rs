//! Templatesmith HTTP service: `POST /api/modify-template` and `GET /api/health`.

mod error;
mod routes;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use tokio::net::TcpListener;
use tracing::{info, warn};

use templatesmith_editor::TemplateEditor;
use templatesmith_shared::{EditorConfig, load_config};

use routes::{AppState, router};

/// Templatesmith template-editing service.
#[derive(Parser)]
#[command(name = "templatesmith-server", version, long_about = None)]
struct Args {
    /// Bind address (defaults to `server.host`).
    #[arg(long, env = "TEMPLATESMITH_HOST")]
    host: Option<String>,

    /// Bind port (defaults to `server.port`).
    #[arg(long, env = "PORT")]
    port: Option<u16>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text")]
    log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Debug, clap::ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

fn init_tracing(args: &Args) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match args.verbose {
        0 => "templatesmith=info,tower_http=info",
        1 => "templatesmith=debug,tower_http=debug",
        _ => "templatesmith=trace,tower_http=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match args.log_format {
        LogFormat::Text => fmt().with_env_filter(env_filter).with_target(false).init(),
        LogFormat::Json => fmt().json().with_env_filter(env_filter).init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    init_tracing(&args);

    let config = load_config()?;
    let editor_config = EditorConfig::from(&config);
    if editor_config.default_credential.is_none() {
        warn!(
            env = %config.editor.api_key_env,
            "no default API key; every request must carry api_key"
        );
    }

    let editor = TemplateEditor::from_config(editor_config)?;
    info!(
        model = editor.model(),
        rules_version = editor.rules_version(),
        "editor ready"
    );

    let host = args.host.unwrap_or(config.server.host);
    let port = args.port.unwrap_or(config.server.port);
    let listener = TcpListener::bind((host.as_str(), port))
        .await
        .wrap_err_with(|| format!("failed to bind {host}:{port}"))?;
    info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, router(AppState::new(editor)))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
