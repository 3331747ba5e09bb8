use std::sync::Arc;

use tokio::net::TcpListener;

use grayscale_colorizer_service::{
    AppConfig, InferenceInvoker, build_router, load_generator,
    telemetry::{SERVER_DIRECTIVES, init_tracing},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing(SERVER_DIRECTIVES);

    let config = Arc::new(AppConfig::from_env()?);
    tracing::info!(model = %config.model_path.display(), "loading generator");

    let generator = load_generator(config.as_ref())?;
    let invoker = InferenceInvoker::new(generator);
    tracing::info!(model = ?invoker.metadata(), "generator ready");

    let router = build_router(config.clone(), invoker);

    let listener = TcpListener::bind(config.listen_addr).await?;
    let addr = listener.local_addr()?;
    tracing::info!(%addr, "REST server ready");

    axum::serve(listener, router).await?;

    Ok(())
}
