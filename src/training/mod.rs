//! Training module
//!
//! Loss, optimizer, epoch loop, validation and the end-to-end pipeline.

pub mod history;
pub mod loss;
pub mod optimizer;
pub mod supervised;
pub mod trainer;
pub mod validation;

pub use history::{EpochSummary, MetricsRecord};
pub use loss::ClassificationLoss;
pub use optimizer::ParamOptimizer;
pub use supervised::run_training;
pub use trainer::{Trainer, TrainerConfig, TrainingOutcome};
pub use validation::{validate, ValidationResult};
