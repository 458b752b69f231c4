// ABOUTME: Server binary for the cadecalc webhook service
// ABOUTME: Wires Strava clients, credential store, and orchestrator into the HTTP router
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 cadecalc contributors

//! # cadecalc server
//!
//! Serves the Strava webhook callback and OAuth redirect. On shutdown the
//! listener stops accepting, in-progress replacements get a grace period,
//! and anything still polling after it is cancelled.

use anyhow::{anyhow, Result};
use clap::Parser;
use std::future::pending;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal::ctrl_c;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{error, info, warn};

use cadecalc::auth::{CodeExchange, CredentialStore, TokenRefresher};
use cadecalc::config::ServerConfig;
use cadecalc::dedup::InMemoryDedupStore;
use cadecalc::logging::LoggingConfig;
use cadecalc::providers::{
    initialize_shared_client, ActivitySource, CommandDeletion, CredentialResolver,
    DeletionCapability, DisabledDeletion, StravaClient, StravaConfig, StravaOAuthClient,
    StravaSubscriptions, TelemetrySource,
};
use cadecalc::replacement::{Collaborators, ReplacementOrchestrator};
use cadecalc::routes::{router, AppState};

/// Time allowed for in-progress replacements after a shutdown signal
const SHUTDOWN_GRACE: Duration = Duration::from_secs(60);

#[derive(Parser)]
#[command(name = "cadecalc-server")]
#[command(about = "Replaces Strava rides lacking cadence with copies carrying derived cadence")]
struct Args {
    /// Override HTTP port
    #[arg(long)]
    port: Option<u16>,

    /// Create the push subscription at startup and delete it on shutdown
    #[arg(long)]
    manage_subscription: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    LoggingConfig::from_env().init()?;

    let mut config = ServerConfig::from_env()?;
    if let Some(port) = args.port {
        config.http_port = port;
    }
    initialize_shared_client(
        config.http_client.timeout_secs,
        config.http_client.connect_timeout_secs,
    );

    let strava_config = config.strava_config();
    let client = Arc::new(StravaClient::new(strava_config.clone()));
    let oauth = Arc::new(StravaOAuthClient::new(strava_config.clone()));

    let refresher: Arc<dyn TokenRefresher> = oauth.clone();
    let credentials = Arc::new(CredentialStore::with_refresher(refresher));
    if let Some(seed) = &config.seed_account {
        credentials.set_account(seed.athlete_id, seed.account.clone());
        info!(owner.id = seed.athlete_id, "seeded account login");
    }

    let deletion: Arc<dyn DeletionCapability> = match config
        .deletion
        .command
        .as_deref()
        .and_then(CommandDeletion::from_command_line)
    {
        Some(command) => Arc::new(command.with_timeout(config.deletion.timeout)),
        None => Arc::new(DisabledDeletion),
    };

    let shutdown = CancellationToken::new();
    let collaborators = Collaborators {
        activities: Arc::clone(&client) as Arc<dyn ActivitySource>,
        telemetry: Arc::clone(&client) as Arc<dyn TelemetrySource>,
        uploader: client,
        deletion,
        credentials: Arc::clone(&credentials) as Arc<dyn CredentialResolver>,
        dedup: Arc::new(InMemoryDedupStore::new()),
    };
    let orchestrator = Arc::new(
        ReplacementOrchestrator::new(collaborators, config.poll, config.cadence)
            .with_shutdown(shutdown.clone()),
    );

    match oauth.authorization_url(&config.redirect_uri()) {
        Ok(url) => info!(url = %url, "athletes authorize at this URL"),
        Err(e) => warn!(error = %e, "could not build the authorization URL"),
    }

    let exchange: Arc<dyn CodeExchange> = oauth;
    let tasks = TaskTracker::new();
    let state = Arc::new(AppState {
        orchestrator,
        credentials,
        oauth: Some(exchange),
        verify_token: config.strava.verify_token.clone(),
        tasks: tasks.clone(),
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| anyhow!("Failed to bind {addr}: {e}"))?;
    info!(%addr, callback = %config.callback_url(), "cadecalc server listening");

    let subscription = args
        .manage_subscription
        .then(|| spawn_subscription(&config, strava_config));

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow!("Server error: {e}"))?;

    drain(&tasks, &shutdown).await;
    if let Some(handle) = subscription {
        remove_subscription(handle).await;
    }

    info!("server shutdown complete");
    Ok(())
}

/// Ensure the push subscription once the listener is accepting
///
/// Strava validates the callback while the create request is in flight, so
/// this runs alongside the server.
fn spawn_subscription(
    config: &ServerConfig,
    strava_config: StravaConfig,
) -> JoinHandle<Option<(StravaSubscriptions, u64)>> {
    let subscriptions = StravaSubscriptions::new(strava_config);
    let callback_url = config.callback_url();
    let verify_token = config.strava.verify_token.clone();

    tokio::spawn(async move {
        match subscriptions.ensure(&callback_url, &verify_token).await {
            Ok(id) => {
                info!(subscription.id = id, callback = %callback_url, "push subscription active");
                Some((subscriptions, id))
            }
            Err(e) => {
                error!(error = %e, callback = %callback_url, "failed to create push subscription");
                None
            }
        }
    })
}

async fn remove_subscription(handle: JoinHandle<Option<(StravaSubscriptions, u64)>>) {
    let Ok(Some((subscriptions, id))) = handle.await else {
        return;
    };
    match subscriptions.delete(id).await {
        Ok(()) => info!(subscription.id = id, "push subscription deleted"),
        Err(e) => warn!(subscription.id = id, error = %e, "failed to delete push subscription"),
    }
}

/// Wait for spawned replacements, cancelling polling after the grace period
async fn drain(tasks: &TaskTracker, shutdown: &CancellationToken) {
    tasks.close();
    if tasks.is_empty() {
        return;
    }
    info!(in_progress = tasks.len(), "waiting for in-progress replacements");
    if timeout(SHUTDOWN_GRACE, tasks.wait()).await.is_err() {
        warn!(
            in_progress = tasks.len(),
            "grace period elapsed; cancelling in-progress replacements"
        );
        shutdown.cancel();
        tasks.wait().await;
    }
}

async fn shutdown_signal() {
    let interrupt = async {
        if let Err(e) = ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
            pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = pending::<()>();

    tokio::select! {
        () = interrupt => info!("received Ctrl+C, shutting down"),
        () = terminate => info!("received terminate signal, shutting down"),
    }
}
