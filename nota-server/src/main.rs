use nota_server::{Config, ServerState, init_logger_with_file};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_logger_with_file(std::env::var("LOG_LEVEL").ok().as_deref(), None);

    tracing::info!("Nota server starting...");

    let config = Config::from_env();
    let state = ServerState::initialize(&config)?;

    let app = nota_server::api::router(state.clone());
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on {addr} ({})", config.environment);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down...");
        })
        .await?;

    // final flush of any pending local save
    state.shutdown_and_flush().await;

    Ok(())
}
