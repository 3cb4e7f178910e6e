//! Batch processing of load tables.
//!
//! Every profile is independent of every other, so a table is processed as a
//! data-parallel map on a local Rayon thread pool. The schedule and
//! breakpoints inside [`FeaturePipeline`] are shared read-only. Results are
//! collected by row index, so the output row order always equals the input row
//! order regardless of which worker finished first.
//!
//! # Example
//!
//! ```
//! use ifeel::batch::{BatchConfig, BatchProcessor, ErrorMode};
//! use ifeel::{ExtractionConfig, FeaturePipeline, LoadTable};
//!
//! let csv = "day,00:00:00,12:00:00\nmon,1,5\ntue,2,oops\n";
//! let table = LoadTable::from_csv_str(csv).unwrap();
//! let pipeline = FeaturePipeline::new(ExtractionConfig::new(3, 9, 17), &table.slot_labels).unwrap();
//!
//! let batch_config = BatchConfig::new()
//!     .with_threads(2)
//!     .with_error_mode(ErrorMode::CollectErrors);
//! let output = BatchProcessor::new(pipeline, batch_config)
//!     .process_table(&table)
//!     .unwrap();
//!
//! assert_eq!(output.successful_count(), 1);
//! assert_eq!(output.failed_count(), 1);
//! ```

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::IfeelError;
use crate::pipeline::FeaturePipeline;
use crate::table::LoadTable;
use crate::types::ProfileFeatures;

// ============================================================================
// Configuration
// ============================================================================

/// How the batch reacts to a profile that cannot be processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorMode {
    /// Report failed rows individually and keep going (default).
    #[default]
    CollectErrors,

    /// Abort with the first failed row, in row order.
    FailFast,
}

/// Batch execution settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Worker threads; `None` uses Rayon's default, `Some(1)` runs sequentially
    #[serde(default)]
    pub num_threads: Option<usize>,
    #[serde(default)]
    pub error_mode: ErrorMode,
}

impl BatchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.num_threads = Some(threads.max(1));
        self
    }

    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    pub fn effective_threads(&self) -> usize {
        self.num_threads.unwrap_or_else(rayon::current_num_threads)
    }
}

// ============================================================================
// Cancellation Support
// ============================================================================

/// Thread-safe flag that stops scheduling of remaining profiles.
///
/// Profiles already being processed finish normally; profiles not yet started
/// are reported as [`RowOutcome::Skipped`].
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

// ============================================================================
// Output
// ============================================================================

/// Result of processing one row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RowOutcome {
    Extracted(ProfileFeatures),
    Failed { error: String },
    Skipped,
}

/// One output row, carrying its input position and identifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub index: usize,
    pub id: String,
    #[serde(flatten)]
    pub outcome: RowOutcome,
}

impl FeatureRow {
    pub fn features(&self) -> Option<&ProfileFeatures> {
        match &self.outcome {
            RowOutcome::Extracted(features) => Some(features),
            _ => None,
        }
    }
}

/// Feature table for a whole batch, in input row order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureTable {
    pub index_name: String,
    pub sample_interval_hours: f64,
    pub rows: Vec<FeatureRow>,
    #[serde(skip)]
    pub elapsed: Duration,
    #[serde(skip)]
    pub threads_used: usize,
}

impl FeatureTable {
    pub fn successful_count(&self) -> usize {
        self.rows.iter().filter(|r| r.features().is_some()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.rows
            .iter()
            .filter(|r| matches!(r.outcome, RowOutcome::Failed { .. }))
            .count()
    }

    pub fn skipped_count(&self) -> usize {
        self.rows
            .iter()
            .filter(|r| matches!(r.outcome, RowOutcome::Skipped))
            .count()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&FeatureRow, &str)> {
        self.rows.iter().filter_map(|r| match &r.outcome {
            RowOutcome::Failed { error } => Some((r, error.as_str())),
            _ => None,
        })
    }
}

// ============================================================================
// Processor
// ============================================================================

/// Runs every row of a table through a [`FeaturePipeline`]
pub struct BatchProcessor {
    pipeline: FeaturePipeline,
    batch_config: BatchConfig,
    cancellation_token: CancellationToken,
}

impl BatchProcessor {
    pub fn new(pipeline: FeaturePipeline, batch_config: BatchConfig) -> Self {
        Self {
            pipeline,
            batch_config,
            cancellation_token: CancellationToken::new(),
        }
    }

    pub fn with_cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = token;
        self
    }

    pub fn pipeline(&self) -> &FeaturePipeline {
        &self.pipeline
    }

    /// Process every row of `table`.
    ///
    /// The table's slot labels must name the same clock times, in the same
    /// order, as the labels the pipeline was built from. Per-row failures are
    /// handled per [`ErrorMode`].
    pub fn process_table(&self, table: &LoadTable) -> Result<FeatureTable, IfeelError> {
        let start = Instant::now();
        self.pipeline.schedule().check_labels(&table.slot_labels)?;

        let threads_used = self.batch_config.effective_threads();
        let rows = self.process_rows(table, threads_used)?;

        if self.batch_config.error_mode == ErrorMode::FailFast {
            if let Some((row, error)) = rows.iter().find_map(|r| match &r.outcome {
                RowOutcome::Failed { error } => Some((r, error)),
                _ => None,
            }) {
                return Err(IfeelError::RowFailed {
                    index: row.index,
                    message: error.clone(),
                });
            }
        }

        let output = FeatureTable {
            index_name: table.index_name.clone(),
            sample_interval_hours: self.pipeline.schedule().sample_interval_hours(),
            rows,
            elapsed: start.elapsed(),
            threads_used,
        };
        info!(
            rows = output.rows.len(),
            failed = output.failed_count(),
            skipped = output.skipped_count(),
            threads = threads_used,
            elapsed_ms = output.elapsed.as_millis() as u64,
            "batch processed"
        );
        Ok(output)
    }

    /// Map every row on a local pool, in row order.
    ///
    /// Under [`ErrorMode::FailFast`] a row is skipped once a row with a lower
    /// index has failed, so the lowest failing index is always processed.
    fn process_rows(
        &self,
        table: &LoadTable,
        threads: usize,
    ) -> Result<Vec<FeatureRow>, IfeelError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| IfeelError::ThreadPool(e.to_string()))?;

        let fail_fast = self.batch_config.error_mode == ErrorMode::FailFast;
        let first_failure = AtomicUsize::new(usize::MAX);

        let rows = pool.install(|| {
            table
                .rows
                .par_iter()
                .enumerate()
                .map(|(index, row)| {
                    let skip = self.cancellation_token.is_cancelled()
                        || (fail_fast && index > first_failure.load(Ordering::SeqCst));
                    if skip {
                        return FeatureRow {
                            index,
                            id: row.id.clone(),
                            outcome: RowOutcome::Skipped,
                        };
                    }

                    let outcome = match self.pipeline.process_row(row) {
                        Ok(features) => RowOutcome::Extracted(features),
                        Err(e) => {
                            first_failure.fetch_min(index, Ordering::SeqCst);
                            warn!(index, id = %row.id, error = %e, "profile failed");
                            RowOutcome::Failed {
                                error: e.to_string(),
                            }
                        }
                    };
                    FeatureRow {
                        index,
                        id: row.id.clone(),
                        outcome,
                    }
                })
                .collect()
        });
        Ok(rows)
    }
}
