//! Configuration structures for the benchmark.
//!
//! Defaults reproduce the reference run: 224×224 inputs, batch size 128,
//! Adam at 1e-3, 20 epochs, validation after every epoch.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::backend::DeviceKind;
use crate::dataset::preprocess::Normalization;
use crate::utils::error::{BenchError, Result};
use crate::utils::logging::LogConfig;

/// Main configuration for a benchmark run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Data configuration
    pub data: DataConfig,
    /// Model configuration
    pub model: ModelConfig,
    /// Training hyperparameters
    pub training: TrainingParams,
    /// Requested compute device
    pub device: DeviceKind,
    /// Random seed for weight initialisation
    pub seed: u64,
    /// Logging configuration
    pub logging: LogConfig,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            data: DataConfig::default(),
            model: ModelConfig::default(),
            training: TrainingParams::default(),
            device: DeviceKind::default(),
            seed: 42,
            logging: LogConfig::default(),
        }
    }
}

/// Data configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Directory holding (or receiving) the CIFAR-100 archive
    pub data_dir: PathBuf,
    /// Square input resolution fed to the network
    pub image_size: usize,
    /// Per-channel normalization constants
    pub normalization: Normalization,
    /// Fetch the archive when it is not on disk
    pub download: bool,
    /// Keep only the first N training samples
    pub max_train_samples: Option<usize>,
    /// Keep only the first N test samples
    pub max_test_samples: Option<usize>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data/cifar100"),
            image_size: 224,
            normalization: Normalization::cifar100(),
            download: true,
            max_train_samples: None,
            max_test_samples: None,
        }
    }
}

/// Model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Channels of the first residual stage
    pub base_width: usize,
    /// Residual blocks per stage (`[2, 2, 2, 2]` is ResNet-18)
    pub layers: Vec<usize>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_width: 64,
            layers: vec![2, 2, 2, 2],
        }
    }
}

/// Training hyperparameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingParams {
    /// Number of training epochs
    pub epochs: usize,
    /// Batch size
    pub batch_size: usize,
    /// Adam learning rate
    pub learning_rate: f64,
    /// Validate when `epoch % validation_every == 0` (and after the last epoch)
    pub validation_every: usize,
    /// Show a progress bar over the batch loop
    pub progress: bool,
}

impl Default for TrainingParams {
    fn default() -> Self {
        Self {
            epochs: 20,
            batch_size: 128,
            learning_rate: 1e-3,
            validation_every: 1,
            progress: true,
        }
    }
}

impl TrainingConfig {
    /// Load a configuration from a TOML file; missing keys take their defaults
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            BenchError::Config(format!("Failed to read config {}: {e}", path.display()))
        })?;

        Self::from_toml_str(&content)
            .map_err(|e| BenchError::Config(format!("{} ({})", e, path.display())))
    }

    /// Parse a configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| BenchError::Config(format!("Failed to parse config: {e}")))
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.training.batch_size == 0 {
            return Err(BenchError::Config("batch_size must be > 0".into()));
        }
        if self.training.validation_every == 0 {
            return Err(BenchError::Config("validation_every must be > 0".into()));
        }
        if !(self.training.learning_rate > 0.0) || !self.training.learning_rate.is_finite() {
            return Err(BenchError::Config(format!(
                "learning_rate must be a positive number, got {}",
                self.training.learning_rate
            )));
        }
        if self.data.image_size == 0 {
            return Err(BenchError::Config("image_size must be > 0".into()));
        }
        if self.model.base_width == 0 {
            return Err(BenchError::Config("base_width must be > 0".into()));
        }
        if self.model.layers.is_empty() || self.model.layers.contains(&0) {
            return Err(BenchError::Config(format!(
                "layers must list at least one stage with >= 1 block, got {:?}",
                self.model.layers
            )));
        }
        self.data.normalization.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_reference_run() {
        let config = TrainingConfig::default();
        assert_eq!(config.data.image_size, 224);
        assert_eq!(config.training.batch_size, 128);
        assert_eq!(config.training.learning_rate, 1e-3);
        assert_eq!(config.training.epochs, 20);
        assert_eq!(config.training.validation_every, 1);
        assert_eq!(config.device, DeviceKind::Auto);
        assert_eq!(config.model.layers, vec![2, 2, 2, 2]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = TrainingConfig::from_toml_str(
            r#"
            device = "cpu"
            seed = 7

            [training]
            epochs = 3
            batch_size = 32

            [data]
            max_train_samples = 500
            "#,
        )
        .unwrap();

        assert_eq!(config.device, DeviceKind::Cpu);
        assert_eq!(config.seed, 7);
        assert_eq!(config.training.epochs, 3);
        assert_eq!(config.training.batch_size, 32);
        assert_eq!(config.training.learning_rate, 1e-3);
        assert_eq!(config.data.max_train_samples, Some(500));
        assert_eq!(config.data.image_size, 224);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = TrainingConfig::from_toml_str("training = 3").unwrap_err();
        assert!(matches!(err, BenchError::Config(_)));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = TrainingConfig::default();
        config.training.batch_size = 0;
        assert!(config.validate().is_err());

        let mut config = TrainingConfig::default();
        config.training.validation_every = 0;
        assert!(config.validate().is_err());

        let mut config = TrainingConfig::default();
        config.training.learning_rate = -1.0;
        assert!(config.validate().is_err());

        let mut config = TrainingConfig::default();
        config.model.layers = vec![2, 0];
        assert!(config.validate().is_err());

        let mut config = TrainingConfig::default();
        config.data.normalization.std = [0.2, 0.0, 0.2];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_epochs_is_valid() {
        let mut config = TrainingConfig::default();
        config.training.epochs = 0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_missing_file() {
        let err = TrainingConfig::from_toml_file(Path::new("/nonexistent/bench.toml")).unwrap_err();
        assert!(err.to_string().contains("bench.toml"));
    }
}
