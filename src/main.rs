use chat_gateway::{
    clock::SystemClock,
    config::{Args, GateConfig},
    error::ServerError,
    serve,
    state::AppState,
};
use clap::Parser; // for cli
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    // parse cli arguments
    let args = Args::parse();

    // RUST_LOG wins over --log-level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).init();

    let config = GateConfig::from(&args);
    let state = Arc::new(AppState::new(&config, Arc::new(SystemClock)));

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: addr.clone(),
            source,
        })?;

    info!("Gateway running on http://{}", addr);
    info!(
        "Chat open from {} to {}",
        config.allowed_start.format("%H:%M"),
        config.allowed_end.format("%H:%M")
    );
    info!(
        "Rate limit: {} requests per {} seconds for {:?}",
        state.rate_gate.max_requests(),
        config.window_seconds,
        config.rate_methods
    );
    info!("Gate stages: {:?}", state.gate.stage_names());

    serve(listener, state).await
}
