use clap::Parser;
use miette::{IntoDiagnostic, Result};
use rolegate::authz::gate::{AuthorizationGate, GateConfig, HeaderRoleExtractor};
use rolegate::authz::loader::load_roles_file;
use rolegate::authz::types::Permission;
use rolegate::authz::web;
use rolegate::settings::Settings;
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "rolegate",
    version,
    about = "Role-based access control gateway"
)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // logging
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    let settings = Settings::load(&cli.config)?;
    tracing::info!(?settings, "Loaded configuration");

    let registry = load_roles_file(&settings.authz.roles_file)?;
    let required = Permission::parse(&settings.authz.protected_permission)?;

    let gate = AuthorizationGate::new(
        registry,
        GateConfig {
            extractor: Arc::new(HeaderRoleExtractor::new(settings.authz.roles_header.clone())),
            ..Default::default()
        },
    );

    #[cfg(unix)]
    spawn_reload_on_hangup(gate.clone(), settings.authz.roles_file.clone());

    if settings.authz.api_enabled {
        let api_addr = settings.api_addr();
        let api_listener = tokio::net::TcpListener::bind(&api_addr)
            .await
            .into_diagnostic()?;
        tracing::info!(%api_addr, "Authorization check API listening");
        let api_router = web::router(gate.clone());
        tokio::spawn(async move {
            if let Err(e) = axum::serve(api_listener, api_router).await {
                tracing::error!(error = %e, "Authorization check API failed");
            }
        });
    }

    let addr = settings.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .into_diagnostic()?;
    tracing::info!(%addr, "Listening");

    axum::serve(listener, web::public_router(gate, required))
        .await
        .into_diagnostic()?;
    Ok(())
}

/// Re-read the role file on SIGHUP. A broken file keeps the previous registry.
#[cfg(unix)]
fn spawn_reload_on_hangup(gate: AuthorizationGate, roles_file: std::path::PathBuf) {
    use tokio::signal::unix::{signal, SignalKind};

    tokio::spawn(async move {
        let mut hangups = match signal(SignalKind::hangup()) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!("Failed to install SIGHUP handler: {}", e);
                return;
            }
        };

        while hangups.recv().await.is_some() {
            match load_roles_file(&roles_file) {
                Ok(registry) => gate.reload(registry),
                Err(e) => tracing::error!(error = %e, "Role reload failed, keeping previous roles"),
            }
        }
    });
}
