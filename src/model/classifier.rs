//! Classifier wrapper with an explicit training/evaluation mode.
//!
//! Burn has no mode flag on modules: BatchNorm uses batch statistics whenever
//! it runs on an autodiff backend and its running statistics otherwise. The
//! mode here selects which of the two the forward pass goes through.

use burn::module::AutodiffModule;
use burn::tensor::backend::AutodiffBackend;
use burn::tensor::Tensor;

use crate::model::resnet::{ResNet, ResNetConfig};

/// Which forward path the classifier uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelMode {
    /// Batch statistics, autodiff graph recorded
    #[default]
    Training,
    /// Running statistics, no graph
    Evaluation,
}

impl std::fmt::Display for ModelMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelMode::Training => write!(f, "training"),
            ModelMode::Evaluation => write!(f, "evaluation"),
        }
    }
}

/// ResNet classifier that is always in exactly one [`ModelMode`]
#[derive(Debug)]
pub struct Classifier<B: AutodiffBackend> {
    model: ResNet<B>,
    mode: ModelMode,
}

impl<B: AutodiffBackend> Classifier<B> {
    /// Wrap a model; starts in `Training` mode
    pub fn new(model: ResNet<B>) -> Self {
        Self {
            model,
            mode: ModelMode::Training,
        }
    }

    /// Build a randomly initialized model from `config`
    pub fn from_config(config: &ResNetConfig, device: &B::Device) -> Self {
        Self::new(config.init(device))
    }

    pub fn mode(&self) -> ModelMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: ModelMode) {
        if self.mode != mode {
            tracing::debug!("Classifier mode {} -> {}", self.mode, mode);
        }
        self.mode = mode;
    }

    /// Class scores of shape [N, num_classes]
    ///
    /// In `Evaluation` mode the scores are computed on the inner backend and
    /// carry no gradient history.
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        match self.mode {
            ModelMode::Training => self.model.forward(images),
            ModelMode::Evaluation => {
                let scores = self.model.valid().forward(images.inner());
                Tensor::from_inner(scores)
            }
        }
    }

    pub fn model(&self) -> &ResNet<B> {
        &self.model
    }

    pub fn into_model(self) -> ResNet<B> {
        self.model
    }

    /// Replace the parameters, keeping the mode
    pub fn set_model(&mut self, model: ResNet<B>) {
        self.model = model;
    }

    pub fn num_classes(&self) -> usize {
        self.model.num_classes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::ndarray::NdArrayDevice;
    use burn::backend::{Autodiff, NdArray};
    use burn::tensor::Distribution;

    type TestBackend = Autodiff<NdArray<f32>>;

    fn tiny_classifier(device: &NdArrayDevice) -> Classifier<TestBackend> {
        let config = ResNetConfig::new()
            .with_num_classes(5)
            .with_base_width(4)
            .with_layers(vec![1, 1]);
        Classifier::from_config(&config, device)
    }

    #[test]
    fn test_starts_in_training_mode() {
        let device = Default::default();
        let mut classifier = tiny_classifier(&device);
        assert_eq!(classifier.mode(), ModelMode::Training);

        classifier.set_mode(ModelMode::Evaluation);
        assert_eq!(classifier.mode(), ModelMode::Evaluation);
    }

    #[test]
    fn test_output_shape_in_both_modes() {
        let device = Default::default();
        let mut classifier = tiny_classifier(&device);
        let images = Tensor::<TestBackend, 4>::random([3, 3, 16, 16], Distribution::Default, &device);

        assert_eq!(classifier.forward(images.clone()).dims(), [3, 5]);
        classifier.set_mode(ModelMode::Evaluation);
        assert_eq!(classifier.forward(images).dims(), [3, 5]);
    }

    #[test]
    fn test_evaluation_forward_is_deterministic() {
        let device = Default::default();
        let mut classifier = tiny_classifier(&device);
        classifier.set_mode(ModelMode::Evaluation);

        let images = Tensor::<TestBackend, 4>::random([2, 3, 16, 16], Distribution::Default, &device);
        let first = classifier.forward(images.clone()).into_data();
        let second = classifier.forward(images).into_data();

        assert_eq!(first.to_vec::<f32>().unwrap(), second.to_vec::<f32>().unwrap());
    }

    #[test]
    fn test_set_model_keeps_mode() {
        let device = Default::default();
        let mut classifier = tiny_classifier(&device);
        classifier.set_mode(ModelMode::Evaluation);

        let replacement = tiny_classifier(&device).into_model();
        classifier.set_model(replacement);
        assert_eq!(classifier.mode(), ModelMode::Evaluation);
        assert_eq!(classifier.num_classes(), 5);
    }
}
