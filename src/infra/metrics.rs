// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Appends one CSV row per finished epoch:
//
//   epoch,batches,mean_loss
//   0,812,6.204113
//   1,812,5.377020
//
// Output file: <checkpoint_dir>/metrics.csv. The header is only
// written when the file is new, so resumed runs keep appending.

use anyhow::Result;
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::PathBuf,
};
use serde::{Deserialize, Serialize};

use crate::ml::trainer::EpochSummary;

/// One row of metrics data for a single training epoch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub epoch: usize,

    /// Batches trained in this epoch
    pub batches: usize,

    /// Average cross-entropy loss over those batches
    pub mean_loss: f64,
}

impl EpochMetrics {
    /// Returns true if this epoch beat the best loss seen so far
    pub fn is_improvement(&self, best_loss: f64) -> bool {
        self.mean_loss < best_loss
    }
}

impl From<&EpochSummary> for EpochMetrics {
    fn from(s: &EpochSummary) -> Self {
        Self { epoch: s.epoch, batches: s.batches, mean_loss: s.mean_loss }
    }
}

pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;

        let csv_path = dir.join("metrics.csv");

        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)?;
            writeln!(f, "epoch,batches,mean_loss")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)?;

        writeln!(f, "{},{},{:.6}", m.epoch, m.batches, m.mean_loss)?;

        tracing::debug!("Logged epoch {} metrics: mean_loss={:.4}", m.epoch, m.mean_loss);
        Ok(())
    }

    pub fn csv_path(&self) -> &PathBuf {
        &self.csv_path
    }
}
