//! # cifar_bench
//!
//! Trains a ResNet-18 on CIFAR-100 with the Burn framework and reports loss,
//! accuracy and throughput per epoch. Intended as a compute-device benchmark:
//! the same run can be executed on the CPU (NdArray) or on a CUDA GPU.
//!
//! ## Modules
//!
//! - `dataset`: CIFAR-100 download, binary parsing, preprocessing and batching
//! - `model`: ResNet architecture and the mode-aware classifier wrapper
//! - `training`: Loss, optimizer, epoch loop and validation
//! - `config`: Run configuration with TOML loading
//! - `backend`: Device selection
//! - `utils`: Logging, errors and formatting helpers
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use cifar_bench::backend::CpuTrainingBackend;
//! use cifar_bench::config::TrainingConfig;
//! use cifar_bench::training::run_training;
//!
//! let config = TrainingConfig::default();
//! let outcome = run_training::<CpuTrainingBackend>(&config, Default::default())?;
//! println!("{:?}", outcome.val_accuracy.last());
//! ```

pub mod backend;
pub mod config;
pub mod dataset;
pub mod model;
pub mod training;
pub mod utils;

// Re-export commonly used items for convenience
pub use config::TrainingConfig;
pub use dataset::{BatchLoader, Cifar100, ImageBatch, ImageBatcher, ImageItem};
pub use model::{Classifier, ModelMode, ResNet, ResNetConfig};
pub use training::{
    run_training, EpochSummary, MetricsRecord, Trainer, TrainerConfig, TrainingOutcome,
};
pub use utils::error::{BenchError, Result};

/// CIFAR-100 fine classes
pub const NUM_CLASSES: usize = 100;

/// Default network input resolution
pub const IMAGE_SIZE: usize = 224;

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
