//! Adam optimizer with explicit gradient bookkeeping
//!
//! Burn's optimizers consume a `GradientsParams` per step. This wrapper keeps
//! gradients in an accumulator between `backward` and `step` so that a stale
//! gradient can never leak into the next update: `step` always drains the
//! accumulator and `zero_grad` discards whatever is pending.

use burn::module::AutodiffModule;
use burn::optim::adaptor::OptimizerAdaptor;
use burn::optim::{Adam, AdamConfig, GradientsAccumulator, GradientsParams, Optimizer};
use burn::tensor::backend::AutodiffBackend;
use burn::tensor::Tensor;

/// Adam (β1 0.9, β2 0.999, ε 1e-8, no weight decay) over module `M`
pub struct ParamOptimizer<B: AutodiffBackend, M: AutodiffModule<B>> {
    adam: OptimizerAdaptor<Adam, M, B>,
    accumulator: GradientsAccumulator<M>,
    passes: usize,
    learning_rate: f64,
}

impl<B: AutodiffBackend, M: AutodiffModule<B>> ParamOptimizer<B, M> {
    pub fn new(learning_rate: f64) -> Self {
        let adam = AdamConfig::new()
            .with_beta_1(0.9)
            .with_beta_2(0.999)
            .with_epsilon(1e-8)
            .init();

        Self {
            adam,
            accumulator: GradientsAccumulator::new(),
            passes: 0,
            learning_rate,
        }
    }

    /// Discard pending gradients
    pub fn zero_grad(&mut self) {
        let _ = self.accumulator.grads();
        self.passes = 0;
    }

    /// Backpropagate `loss` and add the parameter gradients of `module`
    pub fn backward(&mut self, loss: Tensor<B, 1>, module: &M) {
        let grads = GradientsParams::from_grads(loss.backward(), module);
        self.accumulator.accumulate(module, grads);
        self.passes += 1;
    }

    /// Backward passes accumulated since the last clear
    pub fn accumulated_passes(&self) -> usize {
        self.passes
    }

    /// Apply pending gradients to `module` and clear them
    pub fn step(&mut self, module: M) -> M {
        let grads = self.take_gradients();
        if grads.is_empty() {
            tracing::warn!("Optimizer step with no accumulated gradients");
            return module;
        }
        self.adam.step(self.learning_rate, module, grads)
    }

    /// Drain pending gradients without applying them
    pub fn take_gradients(&mut self) -> GradientsParams {
        self.passes = 0;
        self.accumulator.grads()
    }
}
