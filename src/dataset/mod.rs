//! Dataset module for CIFAR-100
//!
//! Download, binary parsing, preprocessing and Burn integration.

pub mod burn_dataset;
pub mod cifar;
pub mod download;
pub mod loader;
pub mod preprocess;

pub use burn_dataset::{ImageBatch, ImageBatcher, ImageItem};
pub use cifar::{Cifar100, Cifar100Dataset, DatasetSplit, RawImage};
pub use download::download_cifar100;
pub use loader::{BatchIter, BatchLoader};
pub use preprocess::{ImagePreprocessor, Normalization};
