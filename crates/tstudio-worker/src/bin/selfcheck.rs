use std::path::Path;
use std::process::Command;

use tstudio_worker::WorkerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = WorkerConfig::from_env();

    println!(
        "tstudio-selfcheck: starting with output_dir={}",
        config.output_dir.display()
    );
    ensure_output_dir(&config.output_dir).await?;
    ensure_tool("ffmpeg")?;
    ensure_tool("ffprobe")?;
    ensure_detection_config(&config)?;

    println!("tstudio-selfcheck: ok");
    Ok(())
}

async fn ensure_output_dir<P: AsRef<Path>>(path: P) -> anyhow::Result<()> {
    let path = path.as_ref();
    tokio::fs::create_dir_all(path).await?;

    // The store writes through a temp file, so the directory must be writable
    let probe = path.join(".selfcheck");
    tokio::fs::write(&probe, b"ok").await?;
    tokio::fs::remove_file(&probe).await?;
    Ok(())
}

fn ensure_tool(name: &str) -> anyhow::Result<()> {
    let path = which::which(name).map_err(|e| anyhow::anyhow!("{} not found in PATH: {}", name, e))?;

    let output = Command::new(&path)
        .arg("-version")
        .output()
        .map_err(|e| anyhow::anyhow!("{} not available: {}", name, e))?;

    if !output.status.success() {
        return Err(anyhow::anyhow!(
            "{} -version failed: {:?}",
            name,
            output.status
        ));
    }
    Ok(())
}

fn ensure_detection_config(config: &WorkerConfig) -> anyhow::Result<()> {
    config
        .detection_config()
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid detection settings: {}", e))
}
