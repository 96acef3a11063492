//! CIFAR-100 binary loader
//!
//! The binary distribution stores each split as a flat sequence of 3074-byte
//! records: `[coarse label][fine label][1024 R][1024 G][1024 B]`. Only the
//! fine label is used. Pixels stay as raw bytes in memory and are resized and
//! normalized when an item is requested, since a 224×224 float cache of the
//! training split would not fit in memory.

use std::fs;
use std::path::Path;

use burn::data::dataset::Dataset;
use tracing::{info, warn};

use crate::config::DataConfig;
use crate::dataset::burn_dataset::ImageItem;
use crate::dataset::download::{download_cifar100, extracted_dir, is_extracted};
use crate::dataset::preprocess::ImagePreprocessor;
use crate::utils::error::{BenchError, Result, ResultExt};
use crate::NUM_CLASSES;

/// Side length of the stored images
pub const CIFAR_IMAGE_SIZE: usize = 32;

/// Pixel bytes per record (3 planes of 32×32)
pub const PIXEL_BYTES: usize = 3 * CIFAR_IMAGE_SIZE * CIFAR_IMAGE_SIZE;

/// Coarse label + fine label + pixels
pub const RECORD_SIZE: usize = 2 + PIXEL_BYTES;

/// Images per class in the training split
pub const TRAIN_IMAGES_PER_CLASS: usize = 500;

/// Images per class in the test split
pub const TEST_IMAGES_PER_CLASS: usize = 100;

/// Dataset split
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetSplit {
    Train,
    Test,
}

impl DatasetSplit {
    /// Binary file holding this split
    pub fn file_name(&self) -> &'static str {
        match self {
            DatasetSplit::Train => "train.bin",
            DatasetSplit::Test => "test.bin",
        }
    }

    /// Number of images per class in the full split
    pub fn images_per_class(&self) -> usize {
        match self {
            DatasetSplit::Train => TRAIN_IMAGES_PER_CLASS,
            DatasetSplit::Test => TEST_IMAGES_PER_CLASS,
        }
    }
}

impl std::fmt::Display for DatasetSplit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatasetSplit::Train => write!(f, "train"),
            DatasetSplit::Test => write!(f, "test"),
        }
    }
}

/// One undecoded CIFAR-100 record
#[derive(Debug, Clone, PartialEq)]
pub struct RawImage {
    /// Planar pixel bytes: 1024 R, 1024 G, 1024 B
    pub pixels: Vec<u8>,
    /// Fine label
    pub label: usize,
}

/// Parse a split file's bytes into records, checking every fine label
pub fn parse_records(bytes: &[u8], num_classes: usize) -> Result<Vec<RawImage>> {
    if bytes.len() % RECORD_SIZE != 0 {
        return Err(BenchError::Dataset(format!(
            "file size {} is not a multiple of the {}-byte record size",
            bytes.len(),
            RECORD_SIZE
        )));
    }

    bytes
        .chunks_exact(RECORD_SIZE)
        .enumerate()
        .map(|(i, record)| {
            let label = record[1] as usize;
            if label >= num_classes {
                return Err(BenchError::Dataset(format!(
                    "record {} has fine label {} but only {} classes are defined",
                    i, label, num_classes
                )));
            }
            Ok(RawImage {
                pixels: record[2..].to_vec(),
                label,
            })
        })
        .collect()
}

/// Read class names, one per line, in label order
pub fn read_class_names(path: &Path) -> Result<Vec<String>> {
    if !path.is_file() {
        return Err(BenchError::PathNotFound(path.to_path_buf()));
    }

    let names: Vec<String> = fs::read_to_string(path)
        .with_context(|| format!("failed to read class names {:?}", path))?
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect();

    if names.is_empty() {
        return Err(BenchError::Dataset(format!("no class names in {:?}", path)));
    }
    Ok(names)
}

/// Read and parse one split file
pub fn read_split(path: &Path, num_classes: usize) -> Result<Vec<RawImage>> {
    if !path.is_file() {
        return Err(BenchError::PathNotFound(path.to_path_buf()));
    }
    let bytes = fs::read(path).with_context(|| format!("failed to read {:?}", path))?;
    parse_records(&bytes, num_classes)
        .map_err(|e| BenchError::Dataset(format!("{:?}: {}", path, e)))
}

/// One CIFAR-100 split implementing Burn's Dataset trait
///
/// Items are preprocessed on access; the same index always yields the same
/// tensor data.
#[derive(Debug, Clone)]
pub struct Cifar100Dataset {
    images: Vec<RawImage>,
    preprocessor: ImagePreprocessor,
}

impl Cifar100Dataset {
    pub fn new(images: Vec<RawImage>, preprocessor: ImagePreprocessor) -> Self {
        Self {
            images,
            preprocessor,
        }
    }

    /// Keep only the first `max` samples
    pub fn truncate(&mut self, max: usize) {
        self.images.truncate(max);
    }

    /// Number of samples per label
    pub fn class_distribution(&self, num_classes: usize) -> Vec<usize> {
        let mut counts = vec![0; num_classes];
        for img in &self.images {
            if let Some(count) = counts.get_mut(img.label) {
                *count += 1;
            }
        }
        counts
    }
}

impl Dataset<ImageItem> for Cifar100Dataset {
    fn get(&self, index: usize) -> Option<ImageItem> {
        let raw = self.images.get(index)?;
        match self.preprocessor.preprocess(&raw.pixels) {
            Ok(image) => Some(ImageItem::new(image, raw.label)),
            Err(e) => {
                warn!("Failed to preprocess sample {}: {}", index, e);
                None
            }
        }
    }

    fn len(&self) -> usize {
        self.images.len()
    }
}

/// Both CIFAR-100 splits and the class names
#[derive(Debug, Clone)]
pub struct Cifar100 {
    pub train: Cifar100Dataset,
    pub test: Cifar100Dataset,
    pub class_names: Vec<String>,
}

impl Cifar100 {
    /// Load the dataset described by `config`, downloading it first if allowed
    pub fn load(config: &DataConfig) -> Result<Self> {
        if !is_extracted(&config.data_dir) {
            if config.download {
                download_cifar100(&config.data_dir)?;
            } else {
                return Err(BenchError::PathNotFound(extracted_dir(&config.data_dir)));
            }
        }

        let preprocessor = ImagePreprocessor::new(
            CIFAR_IMAGE_SIZE,
            config.image_size,
            config.normalization,
        );
        let mut dataset = Self::load_from_dir(&extracted_dir(&config.data_dir), preprocessor)?;

        if let Some(max) = config.max_train_samples {
            dataset.train.truncate(max);
        }
        if let Some(max) = config.max_test_samples {
            dataset.test.truncate(max);
        }

        info!(
            "Loaded CIFAR-100: {} train / {} test images, {} classes",
            dataset.train.len(),
            dataset.test.len(),
            dataset.num_classes()
        );
        Ok(dataset)
    }

    /// Load from an extracted `cifar-100-binary` directory
    pub fn load_from_dir(dir: &Path, preprocessor: ImagePreprocessor) -> Result<Self> {
        let class_names = read_class_names(&dir.join("fine_label_names.txt"))?;
        if class_names.len() != NUM_CLASSES {
            warn!(
                "Expected {} class names, found {}",
                NUM_CLASSES,
                class_names.len()
            );
        }

        let train = read_split(&dir.join(DatasetSplit::Train.file_name()), class_names.len())?;
        let test = read_split(&dir.join(DatasetSplit::Test.file_name()), class_names.len())?;

        check_split_size(DatasetSplit::Train, train.len(), class_names.len());
        check_split_size(DatasetSplit::Test, test.len(), class_names.len());

        Ok(Self {
            train: Cifar100Dataset::new(train, preprocessor.clone()),
            test: Cifar100Dataset::new(test, preprocessor),
            class_names,
        })
    }

    pub fn num_classes(&self) -> usize {
        self.class_names.len()
    }

    /// Class name for a label
    pub fn class_name(&self, label: usize) -> Option<&str> {
        self.class_names.get(label).map(String::as_str)
    }
}

fn check_split_size(split: DatasetSplit, actual: usize, num_classes: usize) {
    let expected = split.images_per_class() * num_classes;
    if actual != expected {
        warn!(
            "{} split has {} images, expected {} ({} per class)",
            split,
            actual,
            expected,
            split.images_per_class()
        );
    }
}
