use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use scalp_monitor::{
    config::{ShellProfile, DEFAULT_MODEL_PATH},
    desktop::DesktopShell,
    image::{Normalization, PreprocessConfig, ResizePolicy, TensorLayout},
    models::{ModelManager, OutputConvention},
    web::serve,
    ClassifierConfig, Config, ThresholdPreset,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "scalp-monitor")]
#[command(version, about = "Scalp health risk classifier")]
struct Cli {
    /// Log level
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the web form and dashboard
    Serve(ServeArgs),
    /// Classify image files in the terminal
    Classify(ClassifyArgs),
}

#[derive(Args)]
struct ModelArgs {
    /// Path to the ONNX model
    #[arg(long, default_value = DEFAULT_MODEL_PATH)]
    model: PathBuf,

    /// How the model output maps to a risk probability (must match the exported model)
    #[arg(long, value_enum)]
    output_convention: OutputConvention,

    /// Preprocessing defaults of the front-end the model was trained for
    #[arg(long, value_enum)]
    profile: Option<ShellProfile>,

    /// Override the resize policy
    #[arg(long, value_enum)]
    resize: Option<ResizePolicy>,

    /// Override the pixel normalization
    #[arg(long, value_enum)]
    normalization: Option<Normalization>,

    /// Override the input tensor layout
    #[arg(long, value_enum)]
    layout: Option<TensorLayout>,
}

#[derive(Args)]
struct ServeArgs {
    /// Server bind address
    #[arg(long, default_value = "0.0.0.0:5000")]
    bind: String,

    /// Number of worker threads
    #[arg(long)]
    workers: Option<usize>,

    /// Enable development mode
    #[arg(long)]
    dev: bool,

    /// Threshold preset for the web form
    #[arg(long, value_enum, default_value = "binary")]
    form_preset: ThresholdPreset,

    /// Threshold preset for the dashboard
    #[arg(long, value_enum, default_value = "safe-risky")]
    dashboard_preset: ThresholdPreset,

    #[command(flatten)]
    model: ModelArgs,
}

#[derive(Args)]
struct ClassifyArgs {
    /// Image files to classify
    #[arg(value_name = "IMAGE", required = true)]
    images: Vec<PathBuf>,

    /// Threshold preset (defaults to the profile's preset, else four-level)
    #[arg(long, value_enum)]
    preset: Option<ThresholdPreset>,

    /// Disable the progress spinner
    #[arg(long)]
    no_progress: bool,

    #[command(flatten)]
    model: ModelArgs,
}

impl ModelArgs {
    fn classifier_config(&self) -> ClassifierConfig {
        let base = self
            .profile
            .map(|profile| profile.preprocess())
            .unwrap_or_default();

        let preprocess = PreprocessConfig {
            resize: self.resize.unwrap_or(base.resize),
            normalization: self.normalization.unwrap_or(base.normalization),
            layout: self.layout.unwrap_or(base.layout),
        };

        ClassifierConfig::new(preprocess, self.output_convention)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // 初始化日志系统
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&cli.log_level))
        )
        .with_target(false)
        .init();

    let outcome = match cli.command {
        Command::Serve(args) => run_server(args),
        Command::Classify(args) => run_classify(args),
    };

    match outcome {
        Ok(code) => code,
        Err(err) => {
            tracing::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run_server(args: ServeArgs) -> Result<ExitCode> {
    tracing::info!("Starting scalp monitor service...");
    tracing::info!("Bind address: {}", args.bind);
    tracing::info!("Model: {}", args.model.model.display());

    let config = Config::new(
        args.bind,
        args.model.model.clone(),
        args.workers,
        args.dev,
        args.model.classifier_config(),
    )?
    .with_presets(args.form_preset, args.dashboard_preset);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.workers)
        .enable_all()
        .build()
        .context("Failed to build async runtime")?;

    runtime
        .block_on(serve(config))
        .context("Server terminated with an error")?;

    Ok(ExitCode::SUCCESS)
}

fn run_classify(args: ClassifyArgs) -> Result<ExitCode> {
    let config = Config::new(
        "127.0.0.1:0".to_string(),
        args.model.model.clone(),
        Some(1),
        false,
        args.model.classifier_config(),
    )?;

    let models = ModelManager::init(&config).context("Failed to load model")?;

    let preset = args
        .preset
        .or_else(|| args.model.profile.map(|profile| profile.threshold_preset()))
        .unwrap_or(ThresholdPreset::FourLevel);

    let mut shell = DesktopShell::new(models.classifier(), preset);
    if args.no_progress {
        shell = shell.without_progress();
    }

    let failures = shell.run(&args.images);
    if failures > 0 {
        tracing::warn!("{} of {} image(s) failed", failures, args.images.len());
        return Ok(ExitCode::FAILURE);
    }

    Ok(ExitCode::SUCCESS)
}
