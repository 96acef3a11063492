//! Validation pass: mean loss and top-1 accuracy over a held-out split

use burn::data::dataset::Dataset;
use burn::tensor::backend::AutodiffBackend;
use burn::tensor::{ElementConversion, Int, Tensor};
use tracing::debug;

use crate::dataset::{BatchLoader, ImageBatcher, ImageItem};
use crate::model::{Classifier, ModelMode};
use crate::training::loss::ClassificationLoss;
use crate::utils::error::{BenchError, Result};

/// Outcome of one validation pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidationResult {
    /// Mean per-sample loss
    pub loss: f64,
    /// Top-1 accuracy in [0, 1]
    pub accuracy: f64,
    /// Samples evaluated
    pub samples: usize,
}

/// Number of rows whose highest score matches the label
pub fn count_correct<B: burn::tensor::backend::Backend>(
    scores: Tensor<B, 2>,
    targets: Tensor<B, 1, Int>,
) -> usize {
    let [batch_size, _] = scores.dims();
    let predictions = scores.argmax(1).reshape([batch_size]);
    let correct: i64 = predictions.equal(targets).int().sum().into_scalar().elem();
    correct as usize
}

/// Evaluate `classifier` on every sample of `loader`
///
/// Switches the classifier to [`ModelMode::Evaluation`] and leaves it there;
/// the caller switches back before training resumes. Batch losses are
/// weighted by batch size, so a short final batch counts proportionally.
pub fn validate<B, D>(
    classifier: &mut Classifier<B>,
    loader: &BatchLoader<D>,
    batcher: &ImageBatcher,
    loss_fn: &ClassificationLoss<B>,
    device: &B::Device,
) -> Result<ValidationResult>
where
    B: AutodiffBackend,
    D: Dataset<ImageItem>,
{
    classifier.set_mode(ModelMode::Evaluation);

    if loader.is_empty() {
        return Err(BenchError::Dataset(
            "validation split is empty".to_string(),
        ));
    }

    let mut loss_sum = 0.0;
    let mut correct = 0usize;
    let mut samples = 0usize;

    for (index, batch) in loader.iter::<B>(batcher, device).enumerate() {
        let batch = batch?;
        let n = batch.len();

        let scores = classifier.forward(batch.images);
        let loss = ClassificationLoss::value(loss_fn.forward(scores.clone(), batch.targets.clone()));

        loss_sum += loss * n as f64;
        correct += count_correct(scores, batch.targets);
        samples += n;

        debug!("  Validation batch {}/{}: loss = {:.4}", index + 1, loader.num_batches(), loss);
    }

    Ok(ValidationResult {
        loss: loss_sum / samples as f64,
        accuracy: correct as f64 / samples as f64,
        samples,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};
    use burn::data::dataset::InMemDataset;
    use burn::tensor::TensorData;

    use crate::model::ResNetConfig;

    type TestBackend = Autodiff<NdArray<f32>>;

    fn synthetic(n: usize, size: usize) -> InMemDataset<ImageItem> {
        let items = (0..n)
            .map(|i| {
                let value = (i % 3) as f32 - 1.0;
                ImageItem::new(vec![value; 3 * size * size], i % 3)
            })
            .collect();
        InMemDataset::new(items)
    }

    #[test]
    fn test_count_correct() {
        let device = Default::default();
        let scores = Tensor::<NdArray<f32>, 2>::from_floats(
            TensorData::new(vec![0.9f32, 0.1, 0.2, 0.8, 0.6, 0.4], [3, 2]),
            &device,
        );
        let targets = Tensor::<NdArray<f32>, 1, Int>::from_data(TensorData::new(vec![0i64, 1, 1], [3]), &device);
        assert_eq!(count_correct(scores, targets), 2);
    }

    #[test]
    fn test_validation_metrics_in_range_and_mode_left_in_evaluation() {
        let device = Default::default();
        let config = ResNetConfig::new()
            .with_num_classes(3)
            .with_base_width(4)
            .with_layers(vec![1, 1]);
        let mut classifier = Classifier::<TestBackend>::from_config(&config, &device);
        let loader = BatchLoader::new(synthetic(7, 16), 3).unwrap();
        let batcher = ImageBatcher::new(16);
        let loss_fn = ClassificationLoss::new(&device);

        let result = validate(&mut classifier, &loader, &batcher, &loss_fn, &device).unwrap();

        assert_eq!(result.samples, 7);
        assert!(result.loss.is_finite() && result.loss >= 0.0);
        assert!((0.0..=1.0).contains(&result.accuracy));
        assert_eq!(classifier.mode(), ModelMode::Evaluation);
    }

    #[test]
    fn test_validation_is_repeatable() {
        let device = Default::default();
        let config = ResNetConfig::new()
            .with_num_classes(3)
            .with_base_width(4)
            .with_layers(vec![1]);
        let mut classifier = Classifier::<TestBackend>::from_config(&config, &device);
        let loader = BatchLoader::new(synthetic(5, 8), 2).unwrap();
        let batcher = ImageBatcher::new(8);
        let loss_fn = ClassificationLoss::new(&device);

        let first = validate(&mut classifier, &loader, &batcher, &loss_fn, &device).unwrap();
        let second = validate(&mut classifier, &loader, &batcher, &loss_fn, &device).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_split_is_an_error() {
        let device = Default::default();
        let config = ResNetConfig::new()
            .with_num_classes(3)
            .with_base_width(4)
            .with_layers(vec![1]);
        let mut classifier = Classifier::<TestBackend>::from_config(&config, &device);
        let loader = BatchLoader::new(synthetic(0, 8), 2).unwrap();
        let batcher = ImageBatcher::new(8);
        let loss_fn = ClassificationLoss::new(&device);

        let err = validate(&mut classifier, &loader, &batcher, &loss_fn, &device).unwrap_err();
        assert!(matches!(err, BenchError::Dataset(_)));
    }
}
