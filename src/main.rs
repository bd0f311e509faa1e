mod app;
mod calculator;
mod config;
mod products;
mod profile;
mod recent;
mod scanner;
mod state;
mod storage;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "nutriscan=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let (app_state, scan_results) = state::AppState::init().await?;
    tracing::info!(
        camera = ?app_state.config.camera.kind,
        data_dir = %app_state.config.data_dir.display(),
        recent = app_state.recent.lock().await.len(),
        "state ready"
    );

    let (stop_pipeline, pipeline_shutdown) = tokio::sync::watch::channel(false);
    let pipeline = tokio::spawn(scanner::pipeline::run(
        app_state.clone(),
        scan_results,
        pipeline_shutdown,
    ));

    let scanner = app_state.scanner.clone();
    let router = app::build_app(app_state);
    let served = app::serve(router).await;

    // release the camera even when the server stopped with an error
    scanner.close().await;
    let _ = stop_pipeline.send(true);
    let _ = pipeline.await;
    served
}
