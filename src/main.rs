//! ClassHub Server — School Workspace Membership Platform
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, fmt};

use classhub_core::config::AppConfig;
use classhub_core::error::AppError;
use classhub_database::repositories::{
    AccountRepository, DbDirectory, InvitationRepository, SchoolRepository,
    WorkspaceMemberRepository, WorkspaceRepository,
};
use classhub_service::account::AccountService;
use classhub_service::invitation::InvitationService;
use classhub_service::membership::MembershipService;
use classhub_service::notification::{EmailNotifier, LogEmailSender};

#[tokio::main]
async fn main() {
    let env = std::env::var("CLASSHUB_ENV").unwrap_or_else(|_| "development".to_string());

    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
        _ => {
            fmt().pretty().with_env_filter(filter).with_target(true).init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting ClassHub v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Database connection + migrations ─────────────────
    let db_pool = classhub_database::connection::create_pool(&config.database).await?;
    classhub_database::migration::run_migrations(&db_pool).await?;

    // ── Step 2: Repositories ─────────────────────────────────────
    let school_repo = Arc::new(SchoolRepository::new(db_pool.clone()));
    let account_repo = Arc::new(AccountRepository::new(db_pool.clone()));
    let workspace_repo = Arc::new(WorkspaceRepository::new(db_pool.clone()));
    let member_repo = Arc::new(WorkspaceMemberRepository::new(db_pool.clone()));
    let invitation_repo = Arc::new(InvitationRepository::new(db_pool.clone()));

    let directory = Arc::new(DbDirectory::new(
        Arc::clone(&school_repo),
        Arc::clone(&workspace_repo),
        Arc::clone(&account_repo),
    ));

    // ── Step 3: Services ─────────────────────────────────────────
    let email_sender = Arc::new(LogEmailSender);
    let notifier = Arc::new(EmailNotifier::new(email_sender));

    let invitation_service = Arc::new(InvitationService::new(
        directory.clone(),
        invitation_repo.clone(),
        config.invitation.expiry_days,
    ));
    let membership_service = Arc::new(MembershipService::new(
        directory.clone(),
        member_repo.clone(),
        Arc::clone(&invitation_service),
        notifier,
    ));
    let account_service = Arc::new(AccountService::new(
        directory.clone(),
        account_repo.clone(),
        Arc::clone(&invitation_service),
        member_repo.clone(),
    ));

    tracing::info!("Services initialized");

    // ── Step 4: Shutdown channel ─────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ── Step 5: Invitation expiry sweep ──────────────────────────
    let sweep_handle = {
        let invitations = Arc::clone(&invitation_service);
        let interval = Duration::from_secs(config.invitation.sweep_interval_seconds);
        let mut sweep_cancel = shutdown_rx.clone();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick fires immediately; skip it so startup is quiet.
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = invitations.sweep_expired().await {
                            tracing::warn!("Invitation sweep failed: {e}");
                        }
                    }
                    _ = sweep_cancel.changed() => break,
                }
            }
        })
    };
    tracing::info!(
        interval_seconds = config.invitation.sweep_interval_seconds,
        "Invitation expiry sweep started"
    );

    // ── Step 6: Build and start HTTP server ──────────────────────
    let jwt_decoder = Arc::new(classhub_api::auth::JwtDecoder::new(&config.auth));

    let app_state = classhub_api::state::AppState {
        config: Arc::new(config.clone()),
        db_pool: db_pool.clone(),
        jwt_decoder,
        workspace_repo,
        membership_service,
        invitation_service,
        account_service,
    };

    let app = classhub_api::router::build_router(app_state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!("ClassHub server listening on {addr}");

    // ── Step 7: Graceful shutdown ────────────────────────────────
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, starting graceful shutdown...");
        let _ = shutdown_tx.send(true);
    });

    server
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    let _ = tokio::time::timeout(Duration::from_secs(10), sweep_handle).await;

    tracing::info!("ClassHub server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
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
