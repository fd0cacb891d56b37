use anyhow::{Context, Result};
use camera_session::{
    create_router, AppState, CameraProviderFactory, Config, DirectoryMediaStore, DisplayMonitor,
    MediaStore, SessionController, SessionHandle, StaticPermissionGate, UiState,
};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "camera-session", version, about = "Camera preview and video recording session core")]
struct Cli {
    /// Config file (extension optional)
    #[arg(short, long, default_value = "config/camera-session")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP control API
    Serve,
    /// Record once and print the final status
    Record {
        /// Stop after this many recorded seconds (default: duration cap)
        #[arg(long)]
        seconds: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;

    info!("Camera Session v{}", env!("CARGO_PKG_VERSION"));
    info!("Loaded config: {}", cfg.service.name);

    let output_dir = cfg.output_dir();
    let store: Arc<dyn MediaStore> = Arc::new(
        DirectoryMediaStore::new(&output_dir)
            .with_context(|| format!("Failed to open media store at {}", output_dir.display()))?,
    );
    info!("Recordings will be saved to {}", output_dir.display());

    let provider =
        CameraProviderFactory::create(&cfg.camera.backend, cfg.simulator_config(), Arc::clone(&store))?;

    let gate = StaticPermissionGate::new(&cfg.platform.granted_permissions, &[]);

    // Missing permissions end the process, nothing is retried
    let (session, controller) = SessionController::launch(
        provider,
        store,
        &gate,
        cfg.session_config(),
        cfg.display_metrics(),
        cfg.display.rotation,
    )
    .await
    .context("Camera activation failed")?;

    match cli.command {
        Command::Serve => serve(&cfg, session, controller).await,
        Command::Record { seconds } => record(&cfg, session, controller, seconds).await,
    }
}

async fn serve(
    cfg: &Config,
    session: SessionHandle,
    controller: JoinHandle<camera_session::CameraResult<()>>,
) -> Result<()> {
    let displays = DisplayMonitor::new();
    let subscription = displays.register(session.clone());

    let router = create_router(AppState::new(session.clone(), displays));
    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("HTTP API listening on {}", addr);

    let watcher = session.clone();
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => info!("Shutting down"),
                _ = watcher.wait_for(|s| s.fatal_error.is_some()) => {
                    error!("Camera session failed, shutting down");
                }
            }
        })
        .await
        .context("HTTP server failed")?;

    subscription.unregister();
    finish(session, controller).await
}

async fn record(
    cfg: &Config,
    session: SessionHandle,
    controller: JoinHandle<camera_session::CameraResult<()>>,
    seconds: Option<u64>,
) -> Result<()> {
    let output = session.start_recording().await?;
    info!("Recording {}", output.descriptor.display_name);

    if let Some(seconds) = seconds {
        session.wait_for(|s| s.ui_state == UiState::Recording).await?;
        tokio::time::sleep(recording_wait(cfg.simulator.tick_ms, seconds)).await;
        session.stop_recording().await?;
    }

    let done = session
        .wait_for(|s| s.ui_state == UiState::Finalized || s.fatal_error.is_some())
        .await?;
    println!("{}", done.status_text);

    finish(session, controller).await
}

/// Wall-clock time the simulated camera needs to record `seconds`
fn recording_wait(tick_ms: u64, seconds: u64) -> Duration {
    Duration::from_millis(tick_ms.saturating_mul(seconds))
}

async fn finish(
    session: SessionHandle,
    controller: JoinHandle<camera_session::CameraResult<()>>,
) -> Result<()> {
    if !session.is_closed() {
        // Controller may already be gone after a fatal error
        let _ = session.shutdown().await;
    }
    drop(session);

    controller.await.context("Session controller panicked")??;
    Ok(())
}
