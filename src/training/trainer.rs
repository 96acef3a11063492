//! Epoch loop: train on every batch, validate at a fixed cadence
//!
//! Per batch: forward, loss, clear gradients, backward, optimizer step. The
//! optimizer is the only thing that changes parameters, and only between
//! batches. At the end of each epoch the classifier is validated when
//! `epoch % validation_every == 0` or the epoch is the last one; results are
//! recorded in sparse per-epoch records.

use std::time::Instant;

use burn::data::dataset::Dataset;
use burn::tensor::backend::AutodiffBackend;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use crate::config::TrainingParams;
use crate::dataset::{BatchLoader, ImageBatcher, ImageItem};
use crate::model::{Classifier, ModelMode, ResNet};
use crate::training::history::{summary_header, EpochSummary, MetricsRecord};
use crate::training::loss::ClassificationLoss;
use crate::training::optimizer::ParamOptimizer;
use crate::training::validation::{validate, ValidationResult};
use crate::utils::error::{BenchError, Result};
use crate::utils::logging::TrainingLogger;

/// Settings for the epoch loop
#[derive(Debug, Clone, PartialEq)]
pub struct TrainerConfig {
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    pub validation_every: usize,
    /// Show a progress bar over the batch loop
    pub progress: bool,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self::from(&TrainingParams::default())
    }
}

impl From<&TrainingParams> for TrainerConfig {
    fn from(params: &TrainingParams) -> Self {
        Self {
            epochs: params.epochs,
            batch_size: params.batch_size,
            learning_rate: params.learning_rate,
            validation_every: params.validation_every,
            progress: params.progress,
        }
    }
}

impl TrainerConfig {
    /// Whether validation runs after `epoch` (0-based)
    pub fn should_validate(&self, epoch: usize) -> bool {
        epoch % self.validation_every == 0 || epoch + 1 == self.epochs
    }
}

/// Everything a finished run produces
#[derive(Debug)]
pub struct TrainingOutcome<B: AutodiffBackend> {
    /// Final model
    pub classifier: Classifier<B>,
    /// Validation loss keyed by epoch
    pub val_loss: MetricsRecord,
    /// Validation accuracy keyed by epoch
    pub val_accuracy: MetricsRecord,
    /// One summary per completed epoch
    pub epochs: Vec<EpochSummary>,
}

impl<B: AutodiffBackend> TrainingOutcome<B> {
    /// Total training samples processed across all epochs
    pub fn samples_processed(&self) -> usize {
        self.epochs.iter().map(|e| e.samples).sum()
    }

    /// Overall training throughput in images per second
    pub fn images_per_sec(&self) -> f64 {
        let seconds: f64 = self.epochs.iter().map(|e| e.train_seconds).sum();
        if seconds > 0.0 {
            self.samples_processed() as f64 / seconds
        } else {
            0.0
        }
    }
}

/// Owns the classifier, optimizer and loss for one run
pub struct Trainer<B: AutodiffBackend> {
    classifier: Classifier<B>,
    optimizer: ParamOptimizer<B, ResNet<B>>,
    loss_fn: ClassificationLoss<B>,
    config: TrainerConfig,
    device: B::Device,
}

impl<B: AutodiffBackend> Trainer<B> {
    pub fn new(classifier: Classifier<B>, config: TrainerConfig, device: B::Device) -> Result<Self> {
        if config.batch_size == 0 {
            return Err(BenchError::Config("batch_size must be > 0".into()));
        }
        if config.validation_every == 0 {
            return Err(BenchError::Config("validation_every must be > 0".into()));
        }

        Ok(Self {
            optimizer: ParamOptimizer::new(config.learning_rate),
            loss_fn: ClassificationLoss::new(&device),
            classifier,
            config,
            device,
        })
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Run all epochs and hand back the trained classifier with its records
    pub fn fit<DT, DV>(
        mut self,
        train: &BatchLoader<DT>,
        valid: &BatchLoader<DV>,
        batcher: &ImageBatcher,
    ) -> Result<TrainingOutcome<B>>
    where
        DT: Dataset<ImageItem>,
        DV: Dataset<ImageItem>,
    {
        let mut val_loss = MetricsRecord::new();
        let mut val_accuracy = MetricsRecord::new();
        let mut summaries = Vec::with_capacity(self.config.epochs);

        if self.config.epochs == 0 {
            info!("No epochs requested, returning the initial model");
            return Ok(TrainingOutcome {
                classifier: self.classifier,
                val_loss,
                val_accuracy,
                epochs: summaries,
            });
        }
        if train.is_empty() {
            return Err(BenchError::Dataset("training split is empty".into()));
        }

        info!(
            "Training {} epochs: {} train / {} validation samples, {} batches per epoch",
            self.config.epochs,
            train.len(),
            valid.len(),
            train.num_batches()
        );

        let mut logger = TrainingLogger::new(self.config.epochs);
        println!("{}", summary_header());

        for epoch in 0..self.config.epochs {
            logger.start_epoch(epoch);

            let (train_loss, samples) = self.train_epoch(epoch, train, batcher)?;
            let train_seconds = logger.epoch_seconds();

            let validation = if self.config.should_validate(epoch) {
                let result = self.validate(valid, batcher)?;
                val_loss.record(epoch, result.loss);
                val_accuracy.record(epoch, result.accuracy);
                Some(result)
            } else {
                None
            };

            let summary = EpochSummary {
                epoch,
                train_loss,
                val_loss: validation.map(|v| v.loss),
                val_accuracy: validation.map(|v| v.accuracy),
                samples,
                train_seconds,
            };
            println!("{}", summary);
            logger.log_epoch_end();
            summaries.push(summary);
        }

        let outcome = TrainingOutcome {
            classifier: self.classifier,
            val_loss,
            val_accuracy,
            epochs: summaries,
        };
        logger.log_complete(outcome.images_per_sec());
        Ok(outcome)
    }

    /// One pass over the training split; returns (mean per-sample loss, samples)
    fn train_epoch<D: Dataset<ImageItem>>(
        &mut self,
        epoch: usize,
        loader: &BatchLoader<D>,
        batcher: &ImageBatcher,
    ) -> Result<(f64, usize)> {
        self.classifier.set_mode(ModelMode::Training);

        let num_batches = loader.num_batches();
        let progress = self.progress_bar(epoch, num_batches);
        let started = Instant::now();

        let mut loss_sum = 0.0;
        let mut samples = 0usize;

        for (batch_idx, batch) in loader.iter::<B>(batcher, &self.device).enumerate() {
            let batch = batch?;
            let n = batch.len();

            let scores = self.classifier.forward(batch.images);
            let loss = self.loss_fn.forward(scores, batch.targets);
            let loss_value = ClassificationLoss::value(loss.clone());
            if !loss_value.is_finite() {
                progress.abandon();
                return Err(BenchError::Training(format!(
                    "non-finite loss {} at epoch {} batch {}",
                    loss_value, epoch, batch_idx
                )));
            }

            self.optimizer.zero_grad();
            self.optimizer.backward(loss, self.classifier.model());
            let updated = self.optimizer.step(self.classifier.model().clone());
            self.classifier.set_model(updated);

            loss_sum += loss_value * n as f64;
            samples += n;
            progress.inc(1);

            if (batch_idx + 1) % 50 == 0 || batch_idx + 1 == num_batches {
                debug!(
                    "  Batch {:>4}/{}: loss = {:.4}, {:.1} img/s",
                    batch_idx + 1,
                    num_batches,
                    loss_value,
                    samples as f64 / started.elapsed().as_secs_f64().max(1e-9)
                );
            }
        }

        progress.finish_and_clear();
        Ok((loss_sum / samples.max(1) as f64, samples))
    }

    fn validate<D: Dataset<ImageItem>>(
        &mut self,
        loader: &BatchLoader<D>,
        batcher: &ImageBatcher,
    ) -> Result<ValidationResult> {
        validate(&mut self.classifier, loader, batcher, &self.loss_fn, &self.device)
    }

    fn progress_bar(&self, epoch: usize, num_batches: usize) -> ProgressBar {
        if !self.config.progress {
            return ProgressBar::hidden();
        }

        let bar = ProgressBar::new(num_batches as u64);
        let style = ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} batches ({eta}) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-");
        bar.set_style(style);
        bar.set_message(format!("epoch {}", epoch));
        bar
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};
    use burn::data::dataset::InMemDataset;

    use crate::model::ResNetConfig;

    type TestBackend = Autodiff<NdArray<f32>>;

    const SIZE: usize = 8;

    fn dataset(n: usize) -> InMemDataset<ImageItem> {
        let items = (0..n)
            .map(|i| {
                let label = i % 2;
                let value = if label == 0 { -1.0 } else { 1.0 };
                ImageItem::new(vec![value; 3 * SIZE * SIZE], label)
            })
            .collect();
        InMemDataset::new(items)
    }

    fn trainer(epochs: usize, validation_every: usize) -> Trainer<TestBackend> {
        let device = Default::default();
        let model = ResNetConfig::new()
            .with_num_classes(2)
            .with_base_width(4)
            .with_layers(vec![1]);
        let config = TrainerConfig {
            epochs,
            batch_size: 4,
            learning_rate: 1e-3,
            validation_every,
            progress: false,
        };
        Trainer::new(Classifier::from_config(&model, &device), config, device).unwrap()
    }

    #[test]
    fn test_validation_cadence() {
        let config = TrainerConfig {
            epochs: 5,
            validation_every: 2,
            ..TrainerConfig::default()
        };
        let validated: Vec<usize> = (0..5).filter(|&e| config.should_validate(e)).collect();
        assert_eq!(validated, vec![0, 2, 4]);

        let config = TrainerConfig {
            epochs: 4,
            validation_every: 3,
            ..TrainerConfig::default()
        };
        let validated: Vec<usize> = (0..4).filter(|&e| config.should_validate(e)).collect();
        assert_eq!(validated, vec![0, 3]);
    }

    #[test]
    fn test_zero_epochs_returns_untouched_model() {
        let batcher = ImageBatcher::new(SIZE);
        let train = BatchLoader::new(dataset(0), 4).unwrap();
        let valid = BatchLoader::new(dataset(0), 4).unwrap();

        let outcome = trainer(0, 1).fit(&train, &valid, &batcher).unwrap();

        assert!(outcome.epochs.is_empty());
        assert!(outcome.val_loss.is_empty());
        assert!(outcome.val_accuracy.is_empty());
        assert_eq!(outcome.classifier.mode(), ModelMode::Training);
    }

    #[test]
    fn test_records_follow_cadence() {
        let batcher = ImageBatcher::new(SIZE);
        let train = BatchLoader::new(dataset(10), 4).unwrap();
        let valid = BatchLoader::new(dataset(6), 4).unwrap();

        let outcome = trainer(3, 2).fit(&train, &valid, &batcher).unwrap();

        assert_eq!(outcome.epochs.len(), 3);
        assert_eq!(outcome.val_loss.epochs(), vec![0, 2]);
        assert_eq!(outcome.val_accuracy.epochs(), vec![0, 2]);
        assert!(outcome.epochs[1].val_loss.is_none());
        assert_eq!(outcome.samples_processed(), 30);

        let first = &outcome.epochs[0];
        assert!(first.train_loss.is_finite() && first.train_loss > 0.0);
        assert_eq!(first.samples, 10);
    }

    #[test]
    fn test_empty_training_split_is_an_error() {
        let batcher = ImageBatcher::new(SIZE);
        let train = BatchLoader::new(dataset(0), 4).unwrap();
        let valid = BatchLoader::new(dataset(4), 4).unwrap();

        assert!(trainer(1, 1).fit(&train, &valid, &batcher).is_err());
    }

    #[test]
    fn test_empty_validation_split_aborts_run() {
        let batcher = ImageBatcher::new(SIZE);
        let train = BatchLoader::new(dataset(4), 4).unwrap();
        let valid = BatchLoader::new(dataset(0), 4).unwrap();

        let err = trainer(2, 1).fit(&train, &valid, &batcher).unwrap_err();
        assert!(matches!(err, BenchError::Dataset(_)));
    }

    #[test]
    fn test_rejects_zero_cadence() {
        let device = Default::default();
        let model = ResNetConfig::new().with_num_classes(2).with_base_width(4).with_layers(vec![1]);
        let config = TrainerConfig {
            validation_every: 0,
            ..TrainerConfig::default()
        };
        assert!(Trainer::<TestBackend>::new(Classifier::from_config(&model, &device), config, device).is_err());
    }
}
