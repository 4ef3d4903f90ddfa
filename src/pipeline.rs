// src/pipeline.rs
//! Pipeline orchestration: drives a batch of input rows to destination records.
//!
//! Two stages, each a bounded ordered stream:
//! 1. prepare: extract → normalize → blocks → media → record, with `extract_workers` rows in flight
//! 2. create: record creation, with `create_concurrency` requests in flight
//!
//! A row's failure never leaves its row. Outcomes keep input order in both stages.

use crate::blocks::{resolve_media, to_blocks};
use crate::extractor::ArticleExtractor;
use crate::media::MediaRehoster;
use crate::model::{DestinationRecord, InputRow};
use crate::notion::RecordStore;
use crate::report::{BatchReport, EntryOutcome, ReportEntry, Stage};
use crate::routing::{build_record, RecordSkip};
use chrono::Utc;
use futures::stream::{self, StreamExt};
use std::sync::Arc;

/// Result of preparing one row, before record creation.
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Ready(DestinationRecord),
    Skipped { reason: String },
    Failed { stage: Stage, cause: String },
}

/// Concurrency bounds for the two stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineSettings {
    pub extract_workers: usize,
    pub create_concurrency: usize,
}

/// Runs batches of rows through extraction, transformation and record creation.
#[derive(Clone)]
pub struct MigrationPipeline {
    extractor: ArticleExtractor,
    rehoster: MediaRehoster,
    records: Arc<dyn RecordStore>,
    settings: PipelineSettings,
}

impl MigrationPipeline {
    pub fn new(
        extractor: ArticleExtractor,
        rehoster: MediaRehoster,
        records: Arc<dyn RecordStore>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            extractor,
            rehoster,
            records,
            settings,
        }
    }

    /// Takes one row as far as a ready-to-create record.
    pub async fn prepare_row(&self, row: &InputRow) -> RowOutcome {
        let article = match self.extractor.extract(row).await {
            Ok(Some(article)) => article,
            Ok(None) => {
                return RowOutcome::Skipped {
                    reason: "no article content".to_string(),
                }
            }
            Err(e) => {
                return RowOutcome::Failed {
                    stage: Stage::Extract,
                    cause: e.to_string(),
                }
            }
        };

        if article.destination_collection.is_none() {
            return RowOutcome::Skipped {
                reason: RecordSkip::UnknownCollection {
                    source_url: article.source_url,
                }
                .to_string(),
            };
        }

        let resolved = if article.has_body() {
            let blocks = to_blocks(&article.normalized_markup);
            resolve_media(blocks, &self.rehoster, row.source_url.as_url()).await
        } else {
            Default::default()
        };

        if resolved.dropped > 0 {
            log::debug!("{}: dropped {} missing image(s)", row.source_url, resolved.dropped);
        }

        match build_record(
            article,
            row.content_type,
            resolved.blocks,
            resolved.degraded,
            Utc::now(),
        ) {
            Ok(record) => RowOutcome::Ready(record),
            Err(skip) => RowOutcome::Skipped {
                reason: skip.to_string(),
            },
        }
    }

    /// Runs a whole batch. Every row gets exactly one report entry.
    pub async fn run(&self, rows: Vec<InputRow>) -> BatchReport {
        let total = rows.len();
        log::info!(
            "Processing {} row(s) with {} extraction worker(s)",
            total,
            self.settings.extract_workers
        );

        let prepared: Vec<(usize, InputRow, RowOutcome)> = stream::iter(rows.into_iter().enumerate())
            .map(|(index, row)| async move {
                let outcome = self.prepare_row(&row).await;
                (index + 1, row, outcome)
            })
            .buffered(self.settings.extract_workers.max(1))
            .collect()
            .await;

        for (number, row, outcome) in &prepared {
            log_prepared(*number, total, row, outcome);
        }

        let entries: Vec<ReportEntry> = stream::iter(prepared)
            .map(|(number, row, outcome)| async move { self.finish_row(number, row, outcome).await })
            .buffered(self.settings.create_concurrency.max(1))
            .collect()
            .await;

        let report = entries
            .into_iter()
            .fold(BatchReport::new(), BatchReport::with_entry);
        log::info!("{}", report.summary());
        report
    }

    async fn finish_row(&self, number: usize, row: InputRow, outcome: RowOutcome) -> ReportEntry {
        let source_url = row.source_url.to_string();

        let (outcome, degraded_media) = match outcome {
            RowOutcome::Ready(record) => {
                let degraded = record.degraded_media;
                match self.records.create_record(&record).await {
                    Ok(page_id) => {
                        log::info!("[{}] created {} from {}", number, page_id, source_url);
                        (EntryOutcome::Created { page_id }, degraded)
                    }
                    Err(e) => {
                        log::error!("[{}] could not create record for {}: {}", number, source_url, e);
                        (
                            EntryOutcome::Failed {
                                stage: Stage::Create,
                                cause: e.to_string(),
                            },
                            degraded,
                        )
                    }
                }
            }
            RowOutcome::Skipped { reason } => (EntryOutcome::Skipped { reason }, 0),
            RowOutcome::Failed { stage, cause } => (EntryOutcome::Failed { stage, cause }, 0),
        };

        ReportEntry {
            row: number,
            source_url,
            outcome,
            degraded_media,
        }
    }
}

fn log_prepared(number: usize, total: usize, row: &InputRow, outcome: &RowOutcome) {
    match outcome {
        RowOutcome::Ready(record) if record.degraded_media > 0 => log::warn!(
            "[{}/{}] {} ready with {} image(s) left at their source",
            number,
            total,
            row.source_url,
            record.degraded_media
        ),
        RowOutcome::Ready(record) => log::info!(
            "[{}/{}] {} ready: '{}' → {} ({} block(s))",
            number,
            total,
            row.source_url,
            record.title,
            record.collection,
            record.children.len()
        ),
        RowOutcome::Skipped { reason } => {
            log::info!("[{}/{}] {} skipped: {}", number, total, row.source_url, reason)
        }
        RowOutcome::Failed { stage, cause } => log::error!(
            "[{}/{}] {} failed during {}: {}",
            number,
            total,
            row.source_url,
            stage,
            cause
        ),
    }
}
