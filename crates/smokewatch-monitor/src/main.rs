//! Webcam smoking monitor binary.

use tokio::sync::watch;
use tracing::{error, info};

use smokewatch_monitor::logging::init_tracing;
use smokewatch_monitor::{MonitorConfig, MonitorResult, RunSummary};

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    init_tracing();
    info!("Starting smokewatch");

    let config = MonitorConfig::from_env();
    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        std::process::exit(1);
    }
    info!(
        "Monitor config: {}",
        serde_json::to_string(&config).unwrap_or_else(|_| format!("{:?}", config))
    );

    // Ctrl-C flips the shutdown flag; the loop notices it between frames
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received shutdown signal");
            shutdown_tx.send(true).ok();
        }
    });

    match run(&config, shutdown_rx).await {
        Ok(summary) => {
            info!(
                reason = ?summary.reason,
                frames = summary.frames,
                alerts = summary.alerts,
                "smokewatch shutdown complete"
            );
        }
        Err(e) => {
            error!("smokewatch failed: {}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(feature = "opencv")]
async fn run(config: &MonitorConfig, shutdown: watch::Receiver<bool>) -> MonitorResult<RunSummary> {
    use smokewatch_monitor::{speaker_from_config, Monitor, Pipeline};
    use smokewatch_vision::opencv::core::Mat;
    use smokewatch_vision::{
        CameraSource, Display, HeadlessDisplay, HighGuiDisplay, ModelPaths, OrtFaceMeshProvider,
        OrtHandProvider, OverlayRenderer,
    };

    let paths = ModelPaths::resolve(&config.model_dir)?;
    let faces = OrtFaceMeshProvider::new(&paths)?;
    let hands = OrtHandProvider::new(&paths, config.hand_min_confidence, config.max_hands)?;
    let speaker = speaker_from_config(config)?;
    let source = CameraSource::open(config.camera_index, config.mirror)?;

    let display: Box<dyn Display<Mat>> = if config.show_window {
        Box::new(HighGuiDisplay::new(config.window_name.clone())?)
    } else {
        info!("Preview window disabled, press Ctrl-C to stop");
        Box::new(HeadlessDisplay::<Mat>::new())
    };

    let pipeline = Pipeline {
        source: Box::new(source),
        faces: Box::new(faces),
        hands: Box::new(hands),
        renderer: Box::new(OverlayRenderer::new()),
        display,
    };

    let mut monitor = Monitor::new(config, pipeline, speaker, shutdown);
    let summary = monitor.run().await?;
    info!("Ran for {:.1}s", monitor.uptime().as_secs_f64());
    Ok(summary)
}

#[cfg(not(feature = "opencv"))]
async fn run(_config: &MonitorConfig, _shutdown: watch::Receiver<bool>) -> MonitorResult<RunSummary> {
    Err(smokewatch_monitor::MonitorError::config(
        "smokewatch was built without the `opencv` feature; no camera backend available",
    ))
}
