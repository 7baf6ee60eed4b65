use anyhow::Context as _;
use sea_orm::Database;
use tokio::net::TcpListener;

use quillbox_api::config::ApiConfig;
use quillbox_api::router;
use quillbox_api::state::AppState;
use quillbox_api::usecase::otp::run_otp_sweep;
use quillbox_core::tracing::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = ApiConfig::from_env();

    let db = Database::connect(&config.database_url)
        .await
        .context("connect to database")?;
    tracing::info!("database connected");

    let state = AppState::new(db, &config)?;

    tokio::spawn(run_otp_sweep(state.otp_repo(), config.otp_sweep_seconds));

    let app = router::build(state);

    let listener = TcpListener::bind(("0.0.0.0", config.port))
        .await
        .with_context(|| format!("bind port {}", config.port))?;
    tracing::info!(port = config.port, "api listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await
    .context("serve")?;
    Ok(())
}
