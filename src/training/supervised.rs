//! End-to-end benchmark run
//!
//! Loads CIFAR-100, builds the ResNet classifier and drives the epoch loop on
//! whichever autodiff backend the caller picked.

use burn::tensor::backend::AutodiffBackend;
use colored::Colorize;
use tracing::info;

use crate::config::TrainingConfig;
use crate::dataset::{BatchLoader, Cifar100, ImageBatcher};
use crate::model::{Classifier, ResNetConfig};
use crate::training::trainer::{Trainer, TrainerConfig, TrainingOutcome};
use crate::utils::error::Result;
use crate::utils::{format_duration, format_number};

/// Run training with the given configuration
///
/// # Type Parameters
/// * `B` - The autodiff backend to use (e.g., `Autodiff<NdArray>` or `Autodiff<Cuda>`)
pub fn run_training<B>(config: &TrainingConfig, device: B::Device) -> Result<TrainingOutcome<B>>
where
    B: AutodiffBackend,
{
    config.validate()?;

    println!("{}", "Initializing Training...".green().bold());
    println!("  Device: {:?}", device);
    B::seed(config.seed);

    println!("{}", "Loading Dataset...".cyan());
    let cifar = Cifar100::load(&config.data)?;

    let batch_size = config.training.batch_size;
    let train_loader = BatchLoader::new(cifar.train, batch_size)?;
    let valid_loader = BatchLoader::new(cifar.test, batch_size)?;
    let batcher = ImageBatcher::new(config.data.image_size);

    println!("{}", "Creating Model...".cyan());
    let model_config = ResNetConfig::new()
        .with_num_classes(cifar.class_names.len())
        .with_base_width(config.model.base_width)
        .with_layers(config.model.layers.clone());
    let classifier = Classifier::<B>::from_config(&model_config, &device);

    println!();
    println!("{}", "Training Configuration:".cyan().bold());
    println!("  📊 Training samples:   {}", format_number(train_loader.len()));
    println!("  ✅ Validation samples: {}", format_number(valid_loader.len()));
    println!("  🏷️  Classes:            {}", cifar.class_names.len());
    println!("  🖼️  Image size:         {0}x{0}", config.data.image_size);
    println!("  🔄 Epochs:             {}", config.training.epochs);
    println!("  📦 Batch size:         {}", batch_size);
    println!("  📈 Learning rate:      {}", config.training.learning_rate);
    println!("  🔍 Validate every:     {} epoch(s)", config.training.validation_every);
    println!();

    let trainer = Trainer::new(classifier, TrainerConfig::from(&config.training), device)?;

    println!("{}", "Starting Training...".green().bold());
    let outcome = trainer.fit(&train_loader, &valid_loader, &batcher)?;

    print_summary(&outcome);
    Ok(outcome)
}

/// Print the final results table
pub fn print_summary<B: AutodiffBackend>(outcome: &TrainingOutcome<B>) {
    let total_seconds: f64 = outcome.epochs.iter().map(|e| e.train_seconds).sum();

    println!();
    println!("{}", "Training Complete!".green().bold());
    println!("  🔄 Epochs run:         {}", outcome.epochs.len());
    println!("  🖼️  Images processed:   {}", format_number(outcome.samples_processed()));
    println!("  ⏱️  Training time:      {}", format_duration(total_seconds));
    println!("  🚀 Throughput:         {:.1} images/s", outcome.images_per_sec());

    if let Some((epoch, acc)) = outcome.val_accuracy.last() {
        println!("  ✅ Final val accuracy: {:.2}% (epoch {})", acc * 100.0, epoch);
    }
    if let Some((epoch, acc)) = outcome.val_accuracy.best_max() {
        println!("  🎉 Best val accuracy:  {:.2}% (epoch {})", acc * 100.0, epoch);
    }
    if let Some((epoch, loss)) = outcome.val_loss.best_min() {
        println!("  📉 Best val loss:      {:.4} (epoch {})", loss, epoch);
    }

    info!(
        "Run finished: {} epochs, {:.1} images/s",
        outcome.epochs.len(),
        outcome.images_per_sec()
    );
}
