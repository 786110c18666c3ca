use smokewatch_monitor::{CommandSpeaker, MonitorConfig};
use smokewatch_vision::ModelPaths;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = MonitorConfig::from_env();

    println!(
        "smokewatch-selfcheck: starting with model_dir={} camera={}",
        config.model_dir.display(),
        config.camera_index
    );
    config.validate()?;
    ensure_models(&config)?;
    ensure_speech_engine(&config)?;
    ensure_camera(&config)?;

    println!("smokewatch-selfcheck: ok");
    Ok(())
}

fn ensure_models(config: &MonitorConfig) -> anyhow::Result<()> {
    let paths = ModelPaths::resolve(&config.model_dir)
        .map_err(|e| anyhow::anyhow!("model files incomplete: {}", e))?;
    for path in paths.all() {
        println!("smokewatch-selfcheck: found {}", path.display());
    }
    if paths.palm_detection.is_none() {
        println!("smokewatch-selfcheck: no palm detector, hands searched in frame halves");
    }
    Ok(())
}

fn ensure_speech_engine(config: &MonitorConfig) -> anyhow::Result<()> {
    let speaker = CommandSpeaker::detect(config.speech_engine.as_deref(), config.speech_rate)
        .map_err(|e| anyhow::anyhow!("speech engine not available: {}", e))?;
    println!(
        "smokewatch-selfcheck: speech engine {}",
        speaker.engine().binary()
    );
    Ok(())
}

#[cfg(feature = "opencv")]
fn ensure_camera(config: &MonitorConfig) -> anyhow::Result<()> {
    use smokewatch_vision::{CameraSource, FrameSource};

    let mut camera = CameraSource::open(config.camera_index, config.mirror)?;
    camera
        .read()
        .map_err(|e| anyhow::anyhow!("camera {} opened but gave no frame: {}", config.camera_index, e))?;
    Ok(())
}

#[cfg(not(feature = "opencv"))]
fn ensure_camera(_config: &MonitorConfig) -> anyhow::Result<()> {
    println!("smokewatch-selfcheck: built without opencv, skipping camera check");
    Ok(())
}
