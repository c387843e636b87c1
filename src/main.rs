use account_tracker::{
    backend::HttpBackend,
    clock::SystemClock,
    config::NotifierKind,
    notifier::{DesktopNotifier, LogNotifier, NoopNotifier, Notifier},
    router, AppState, Config, PollingController,
};
use std::{net::SocketAddr, sync::Arc};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = Config::from_env();

    let notifier: Arc<dyn Notifier> = match config.notifier {
        NotifierKind::Desktop => Arc::new(DesktopNotifier::new(config.notify_command.clone())),
        NotifierKind::Log => Arc::new(LogNotifier),
        NotifierKind::Off => Arc::new(NoopNotifier),
    };
    let backend = HttpBackend::new(config.request_timeout).map_err(|err| {
        error!(error = %err, "failed to build HTTP client");
        err
    })?;
    let controller = PollingController::new(
        Arc::new(backend),
        notifier,
        Arc::new(SystemClock),
        config.controller_settings(),
    );

    controller.start().await;

    if let Some(backend_url) = config.backend_url.as_deref() {
        if let Err(err) = controller.configure(backend_url).await {
            warn!(error = %err, "initial poll failed");
        }
    }

    let app = router(AppState::new(controller.clone()));
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    controller.shutdown();
    info!("tracker stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
