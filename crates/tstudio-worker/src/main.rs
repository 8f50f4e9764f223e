//! Transition analysis worker binary.

use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tstudio_models::AnalysisStatus;
use tstudio_worker::{AnalysisExecutor, AnalysisJob, JsonFileStore, WorkerConfig};

#[derive(Parser, Debug)]
#[command(name = "tstudio-worker")]
#[command(about = "Detect scene transitions in videos and store analysis records")]
struct Args {
    /// Video files, or image directories with --frames-dir
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Treat each input as a directory of still frames
    #[arg(long, default_value_t = false)]
    frames_dir: bool,

    /// Directory for analysis records (overrides TSTUDIO_OUTPUT_DIR)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Sampling rate in frames per second (overrides TSTUDIO_SAMPLE_RATE_HZ)
    #[arg(long)]
    sample_rate: Option<f64>,

    /// Seed for the classifier tie-break (overrides TSTUDIO_CLASSIFIER_SEED)
    #[arg(long)]
    seed: Option<u64>,

    /// Label ambiguous transitions by their strongest signal instead of randomly
    #[arg(long, default_value_t = false)]
    deterministic: bool,
}

fn init_tracing() {
    // Colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let mut env_filter = EnvFilter::from_default_env();
    if let Ok(directive) = "tstudio=info".parse() {
        env_filter = env_filter.add_directive(directive);
    }

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    let args = Args::parse();
    info!("Starting tstudio-worker");

    let mut config = WorkerConfig::from_env();
    if let Some(dir) = args.output_dir {
        config.output_dir = dir;
    }
    if let Some(rate) = args.sample_rate {
        config.sample_rate_hz = rate;
    }
    if let Some(seed) = args.seed {
        config.classifier_seed = Some(seed);
    }
    config.deterministic |= args.deterministic;
    info!("Worker config: {:?}", config);

    let store = match JsonFileStore::open(&config.output_dir).await {
        Ok(store) => store,
        Err(e) => {
            error!("Failed to open analysis store: {}", e);
            std::process::exit(1);
        }
    };

    let jobs: Vec<AnalysisJob> = args
        .inputs
        .into_iter()
        .map(|input| {
            if args.frames_dir {
                AnalysisJob::frames(input)
            } else {
                AnalysisJob::video(input)
            }
        })
        .collect();

    let executor = AnalysisExecutor::new(config, store);
    let records = match executor.run_all(jobs).await {
        Ok(records) => records,
        Err(e) => {
            error!("Executor error: {}", e);
            std::process::exit(1);
        }
    };

    let failed = records
        .iter()
        .filter(|r| r.status == AnalysisStatus::Failed)
        .count();
    for record in &records {
        info!(
            analysis_id = %record.id,
            video = %record.video_name,
            status = %record.status,
            transitions = record.transitions.len(),
            path = %executor.store().record_path(&record.id).display(),
            "Analysis finished"
        );
    }

    info!(total = records.len(), failed, "Worker run complete");
    if failed > 0 {
        std::process::exit(2);
    }
}
