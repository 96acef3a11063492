//! Model module
//!
//! ResNet network definition and the mode-aware classifier wrapper.

pub mod classifier;
pub mod resnet;

pub use classifier::{Classifier, ModelMode};
pub use resnet::{BasicBlock, ResNet, ResNetConfig};
