use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use turntable_axum::AppState;
use turntable_core::{AuthService, Clock, Janitor, LoginThrottle, MembershipService, SystemClock};

mod config;
mod gotrue;
mod postgrest;

use config::Cli;
use gotrue::GoTrueVerifier;
use postgrest::PostgrestStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let throttle = Arc::new(LoginThrottle::new(cli.throttle_config())?);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let verifier = Arc::new(GoTrueVerifier::new(&cli.supabase_url, &cli.supabase_key)?);
    let store = Arc::new(PostgrestStore::new(&cli.supabase_url, &cli.supabase_key)?);

    let janitor = Janitor::start(throttle.clone(), clock.clone());

    let state = AppState {
        auth: Arc::new(AuthService::new(verifier, store.clone(), throttle, clock)),
        memberships: Arc::new(MembershipService::new(store)),
    };
    let app = turntable_axum::routes(state).build();

    let listener = tokio::net::TcpListener::bind(cli.bind).await?;
    tracing::info!(addr = %listener.local_addr()?, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    janitor.shutdown().await;
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
