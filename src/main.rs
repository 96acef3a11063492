//! CIFAR-100 training benchmark CLI
//!
//! Downloads the dataset, trains ResNet-18 and prints per-epoch metrics on
//! the selected compute device.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use cifar_bench::backend::{print_device_info, resolve_device, DeviceKind, ResolvedDevice};
use cifar_bench::config::TrainingConfig;
use cifar_bench::dataset::download_cifar100;
use cifar_bench::utils::logging::{init_logging, LogConfig};

/// Training samples kept in quick mode
const QUICK_TRAIN_SAMPLES: usize = 1000;

/// Validation samples kept in quick mode
const QUICK_TEST_SAMPLES: usize = 200;

/// CIFAR-100 ResNet-18 training benchmark
///
/// Trains a stock ResNet-18 on CIFAR-100 and reports loss, accuracy and
/// throughput, to compare compute devices.
#[derive(Parser, Debug)]
#[command(name = "cifar_bench")]
#[command(version)]
#[command(about = "CIFAR-100 ResNet-18 training benchmark with Burn", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, default_value = "false")]
    verbose: bool,

    /// TOML configuration file; command-line flags override its values
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Download and extract CIFAR-100
    Download {
        /// Directory to store the dataset in
        #[arg(short, long)]
        data_dir: Option<PathBuf>,
    },

    /// Train ResNet-18 on CIFAR-100
    Train {
        /// Directory holding the dataset
        #[arg(short, long)]
        data_dir: Option<PathBuf>,

        /// Number of training epochs
        #[arg(short, long)]
        epochs: Option<usize>,

        /// Batch size for training and validation
        #[arg(short, long)]
        batch_size: Option<usize>,

        /// Adam learning rate
        #[arg(short, long)]
        learning_rate: Option<f64>,

        /// Validate every N epochs (the last epoch is always validated)
        #[arg(long)]
        validation_every: Option<usize>,

        /// Square input resolution
        #[arg(long)]
        image_size: Option<usize>,

        /// Compute device
        #[arg(long, value_enum)]
        device: Option<DeviceKind>,

        /// Random seed for weight initialisation
        #[arg(long)]
        seed: Option<u64>,

        /// Quick test mode - train on a small prefix of each split
        #[arg(long, default_value = "false")]
        quick: bool,

        /// Fail instead of downloading a missing dataset
        #[arg(long, default_value = "false")]
        no_download: bool,

        /// Hide the per-batch progress bar
        #[arg(long, default_value = "false")]
        no_progress: bool,
    },

    /// Show which compute devices are available
    Devices,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => TrainingConfig::from_toml_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => TrainingConfig::default(),
    };

    let log_config = if cli.verbose {
        LogConfig::verbose()
    } else {
        config.logging.clone()
    };
    if let Err(e) = init_logging(&log_config) {
        eprintln!("{} {}", "Logging disabled:".yellow(), e);
    }

    print_banner();

    match cli.command {
        Commands::Download { data_dir } => {
            let data_dir = data_dir.unwrap_or(config.data.data_dir);
            cmd_download(&data_dir)?;
        }

        Commands::Train {
            data_dir,
            epochs,
            batch_size,
            learning_rate,
            validation_every,
            image_size,
            device,
            seed,
            quick,
            no_download,
            no_progress,
        } => {
            if let Some(data_dir) = data_dir {
                config.data.data_dir = data_dir;
            }
            if let Some(epochs) = epochs {
                config.training.epochs = epochs;
            }
            if let Some(batch_size) = batch_size {
                config.training.batch_size = batch_size;
            }
            if let Some(learning_rate) = learning_rate {
                config.training.learning_rate = learning_rate;
            }
            if let Some(validation_every) = validation_every {
                config.training.validation_every = validation_every;
            }
            if let Some(image_size) = image_size {
                config.data.image_size = image_size;
            }
            if let Some(device) = device {
                config.device = device;
            }
            if let Some(seed) = seed {
                config.seed = seed;
            }
            if quick {
                println!(
                    "{}",
                    format!(
                        "🚀 Quick test mode: {} train / {} validation samples",
                        QUICK_TRAIN_SAMPLES, QUICK_TEST_SAMPLES
                    )
                    .yellow()
                    .bold()
                );
                config.data.max_train_samples = Some(QUICK_TRAIN_SAMPLES);
                config.data.max_test_samples = Some(QUICK_TEST_SAMPLES);
            }
            if no_download {
                config.data.download = false;
            }
            if no_progress {
                config.training.progress = false;
            }

            config.validate().context("Invalid configuration")?;
            cmd_train(&config)?;
        }

        Commands::Devices => {
            print_device_info();
        }
    }

    Ok(())
}

fn print_banner() {
    println!();
    println!(
        "{}",
        format!("CIFAR-100 Training Benchmark v{}", cifar_bench::VERSION)
            .green()
            .bold()
    );
    println!("{}", "ResNet-18 · Burn".dimmed());
    println!();
}

fn cmd_download(data_dir: &std::path::Path) -> Result<()> {
    println!("{}", "Downloading CIFAR-100...".cyan().bold());
    let extracted = download_cifar100(data_dir)
        .with_context(|| format!("Failed to prepare CIFAR-100 in {}", data_dir.display()))?;
    println!("  📁 Dataset ready in {}", extracted.display());
    Ok(())
}

fn cmd_train(config: &TrainingConfig) -> Result<()> {
    let resolved = resolve_device(config.device);
    println!("  🧠 Device: {}", resolved.to_string().bold());
    info!("Training on {}", resolved);

    match resolved {
        ResolvedDevice::Cpu => {
            use cifar_bench::backend::CpuTrainingBackend;
            cifar_bench::training::run_training::<CpuTrainingBackend>(config, Default::default())
                .context("Training failed")?;
        }

        #[cfg(feature = "cuda")]
        ResolvedDevice::Accelerator(index) => {
            use cifar_bench::backend::AcceleratorTrainingBackend;
            let device = burn_cuda::CudaDevice::new(index);
            cifar_bench::training::run_training::<AcceleratorTrainingBackend>(config, device)
                .context("Training failed")?;
        }

        #[cfg(not(feature = "cuda"))]
        ResolvedDevice::Accelerator(_) => {
            anyhow::bail!("this binary was built without an accelerator backend");
        }
    }

    Ok(())
}
