//! Sequential batch iteration over a Burn dataset
//!
//! Batches are built lazily, in index order, one at a time; only the batch
//! currently in use is materialized on the device. Every pass visits each
//! sample exactly once and the final batch may be shorter than `batch_size`.

use std::marker::PhantomData;

use burn::data::dataloader::batcher::Batcher;
use burn::data::dataset::Dataset;
use burn::prelude::*;

use crate::dataset::burn_dataset::{ImageBatch, ImageBatcher, ImageItem};
use crate::utils::error::{BenchError, Result};

/// Restartable, finite batch source over a dataset
#[derive(Debug, Clone)]
pub struct BatchLoader<D> {
    dataset: D,
    batch_size: usize,
}

impl<D: Dataset<ImageItem>> BatchLoader<D> {
    /// Wrap `dataset`; `batch_size` must be positive
    pub fn new(dataset: D, batch_size: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(BenchError::Config("batch_size must be > 0".into()));
        }
        Ok(Self {
            dataset,
            batch_size,
        })
    }

    /// Number of samples per pass
    pub fn len(&self) -> usize {
        self.dataset.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dataset.is_empty()
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// `ceil(len / batch_size)`
    pub fn num_batches(&self) -> usize {
        self.len().div_ceil(self.batch_size)
    }

    pub fn dataset(&self) -> &D {
        &self.dataset
    }

    /// Start a new pass from the first sample
    pub fn iter<'a, B: Backend>(
        &'a self,
        batcher: &'a ImageBatcher,
        device: &'a B::Device,
    ) -> BatchIter<'a, B, D> {
        BatchIter {
            loader: self,
            batcher,
            device,
            cursor: 0,
            _backend: PhantomData,
        }
    }
}

/// One pass over a [`BatchLoader`]
pub struct BatchIter<'a, B: Backend, D> {
    loader: &'a BatchLoader<D>,
    batcher: &'a ImageBatcher,
    device: &'a B::Device,
    cursor: usize,
    _backend: PhantomData<B>,
}

impl<B: Backend, D: Dataset<ImageItem>> Iterator for BatchIter<'_, B, D> {
    type Item = Result<ImageBatch<B>>;

    fn next(&mut self) -> Option<Self::Item> {
        let len = self.loader.len();
        if self.cursor >= len {
            return None;
        }

        let start = self.cursor;
        let end = (start + self.loader.batch_size).min(len);
        self.cursor = end;

        let mut items = Vec::with_capacity(end - start);
        for index in start..end {
            match self.loader.dataset.get(index) {
                Some(item) => items.push(item),
                None => {
                    // Stop the pass; the caller aborts on the error.
                    self.cursor = len;
                    return Some(Err(BenchError::Dataset(format!(
                        "sample {} of {} could not be loaded",
                        index, len
                    ))));
                }
            }
        }

        Some(Ok(self.batcher.batch(items, self.device)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self
            .loader
            .len()
            .saturating_sub(self.cursor)
            .div_ceil(self.loader.batch_size);
        (remaining, Some(remaining))
    }
}
