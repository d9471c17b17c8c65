use movieflix_api::{
    api::{create_router, AppState},
    config::Config,
    services::PosterResolver,
    telemetry,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init_tracing();

    let config = Config::from_env()?;
    let addr = format!("{}:{}", config.host, config.port);

    // A missing dataset is reported per request, not at startup
    let posters = PosterResolver::from_config(&config)?;
    let state = AppState::load(config, posters).await;

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server running");
    axum::serve(listener, app).await?;

    Ok(())
}
