//! Per-epoch metrics records and summaries

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Sparse, append-only mapping epoch → value
///
/// Only epochs that were measured have an entry; nothing is interpolated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    values: BTreeMap<usize, f64>,
}

impl MetricsRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `value` for `epoch`; an epoch can be recorded only once
    pub fn record(&mut self, epoch: usize, value: f64) -> bool {
        if self.values.contains_key(&epoch) {
            tracing::warn!("Epoch {} already recorded, keeping the first value", epoch);
            return false;
        }
        self.values.insert(epoch, value);
        true
    }

    pub fn get(&self, epoch: usize) -> Option<f64> {
        self.values.get(&epoch).copied()
    }

    /// Most recent (epoch, value)
    pub fn last(&self) -> Option<(usize, f64)> {
        self.values.iter().next_back().map(|(&e, &v)| (e, v))
    }

    /// Measured epochs in ascending order
    pub fn epochs(&self) -> Vec<usize> {
        self.values.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.values.iter().map(|(&e, &v)| (e, v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Largest recorded value and its epoch
    pub fn best_max(&self) -> Option<(usize, f64)> {
        self.iter()
            .fold(None, |best: Option<(usize, f64)>, (e, v)| match best {
                Some((_, bv)) if bv >= v => best,
                _ => Some((e, v)),
            })
    }

    /// Smallest recorded value and its epoch
    pub fn best_min(&self) -> Option<(usize, f64)> {
        self.iter()
            .fold(None, |best: Option<(usize, f64)>, (e, v)| match best {
                Some((_, bv)) if bv <= v => best,
                _ => Some((e, v)),
            })
    }
}

/// What happened in one epoch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochSummary {
    /// 0-based epoch index
    pub epoch: usize,
    /// Mean per-sample training loss
    pub train_loss: f64,
    /// Validation loss, when validation ran
    pub val_loss: Option<f64>,
    /// Validation top-1 accuracy in [0, 1], when validation ran
    pub val_accuracy: Option<f64>,
    /// Training samples processed
    pub samples: usize,
    /// Wall time of the training pass in seconds
    pub train_seconds: f64,
}

impl EpochSummary {
    /// Training throughput in images per second
    pub fn images_per_sec(&self) -> f64 {
        if self.train_seconds > 0.0 {
            self.samples as f64 / self.train_seconds
        } else {
            0.0
        }
    }

    pub fn validated(&self) -> bool {
        self.val_loss.is_some()
    }
}

impl std::fmt::Display for EpochSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let val_loss = self
            .val_loss
            .map(|v| format!("{:.4}", v))
            .unwrap_or_else(|| "-".to_string());
        let val_acc = self
            .val_accuracy
            .map(|v| format!("{:.2}%", v * 100.0))
            .unwrap_or_else(|| "-".to_string());

        write!(
            f,
            "{:>5} | {:>10.4} | {:>10} | {:>8} | {:>9.1} img/s",
            self.epoch,
            self.train_loss,
            val_loss,
            val_acc,
            self.images_per_sec()
        )
    }
}

/// Header matching the `EpochSummary` display columns
pub fn summary_header() -> String {
    format!(
        "{:>5} | {:>10} | {:>10} | {:>8} | {:>15}",
        "epoch", "train loss", "val loss", "val acc", "throughput"
    )
}
