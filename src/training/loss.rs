//! Softmax cross-entropy over class scores

use burn::nn::loss::{CrossEntropyLoss, CrossEntropyLossConfig};
use burn::tensor::backend::Backend;
use burn::tensor::{ElementConversion, Int, Tensor};

/// Mean-reduced cross-entropy between scores [N, C] and labels [N]
#[derive(Debug)]
pub struct ClassificationLoss<B: Backend> {
    inner: CrossEntropyLoss<B>,
}

impl<B: Backend> ClassificationLoss<B> {
    pub fn new(device: &B::Device) -> Self {
        Self {
            inner: CrossEntropyLossConfig::new().init(device),
        }
    }

    /// Scalar loss tensor, suitable for `backward()` on an autodiff backend
    pub fn forward(&self, scores: Tensor<B, 2>, targets: Tensor<B, 1, Int>) -> Tensor<B, 1> {
        self.inner.forward(scores, targets)
    }

    /// Read a scalar loss tensor back to the host
    pub fn value(loss: Tensor<B, 1>) -> f64 {
        loss.into_scalar().elem::<f64>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::TensorData;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_uniform_scores_give_log_num_classes() {
        let device = Default::default();
        let loss = ClassificationLoss::<TestBackend>::new(&device);

        let scores = Tensor::<TestBackend, 2>::zeros([4, 100], &device);
        let targets =
            Tensor::<TestBackend, 1, Int>::from_data(TensorData::new(vec![0i64, 5, 42, 99], [4]), &device);

        let value = ClassificationLoss::value(loss.forward(scores, targets));
        assert!((value - (100f64).ln()).abs() < 1e-4);
    }

    #[test]
    fn test_confident_correct_prediction_has_small_loss() {
        let device = Default::default();
        let loss = ClassificationLoss::<TestBackend>::new(&device);

        let scores = Tensor::<TestBackend, 2>::from_floats(
            TensorData::new(vec![20.0f32, 0.0, 0.0, 0.0, 20.0, 0.0], [2, 3]),
            &device,
        );
        let right = Tensor::<TestBackend, 1, Int>::from_data(TensorData::new(vec![0i64, 1], [2]), &device);
        let wrong = Tensor::<TestBackend, 1, Int>::from_data(TensorData::new(vec![2i64, 2], [2]), &device);

        let right = ClassificationLoss::value(loss.forward(scores.clone(), right));
        let wrong = ClassificationLoss::value(loss.forward(scores, wrong));

        assert!(right >= 0.0 && right < 1e-3);
        assert!(wrong > 10.0);
    }
}
