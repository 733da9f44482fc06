//! The end-to-end pipeline: workbook bytes in, PDF report and
//! classification result out.
//!
//! One invocation per upload, single-threaded apart from the external model
//! call. Nothing is shared between invocations, so concurrent uploads only
//! need distinct output paths.

use std::path::Path;

use chrono::{DateTime, Utc};
use chrono_tz::Europe::Stockholm;
use thiserror::Error;
use tracing::{debug, info};

use miljo_core::aggregate::aggregate_rows;
use miljo_core::grid::Sheet;
use miljo_core::layout::{CONTENT_LIMIT_MM, build_blocks, paginate};
use miljo_core::locator::{LocateError, locate};
use miljo_core::result::ClassificationResult;
use miljo_ingest::{IngestError, read_workbook_bytes};

use crate::classifier::Classifier;
use crate::gemini::ModelClient;
use crate::pdf::{RenderError, render_pdf};

/// What the upload handler knows about the file it hands us.
#[derive(Debug, Clone)]
pub struct UploadMeta {
    pub filename: String,
    pub uploaded_at: DateTime<Utc>,
}

/// Fatal pipeline outcomes. External-model trouble is not among them: the
/// classifier degrades to the local fallback instead of failing.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("unreadable workbook: {0}")]
    Workbook(#[from] IngestError),
    #[error(transparent)]
    NoTransactionData(#[from] LocateError),
    #[error("report could not be written: {0}")]
    Render(#[from] RenderError),
}

/// Ingestion, aggregation, classification and rendering wired together.
pub struct Pipeline<C: ModelClient> {
    classifier: Classifier<C>,
}

impl<C: ModelClient> Pipeline<C> {
    pub fn new(client: C) -> Self {
        Self {
            classifier: Classifier::new(client),
        }
    }

    pub fn with_classifier(classifier: Classifier<C>) -> Self {
        Self { classifier }
    }

    /// Analyze an uploaded workbook buffer and write the report to
    /// `out_path`. The returned result is what the caller persists and
    /// re-serves alongside the report file.
    pub async fn process(
        &self,
        workbook: &[u8],
        meta: &UploadMeta,
        out_path: &Path,
    ) -> Result<ClassificationResult, PipelineError> {
        let sheets = read_workbook_bytes(workbook)?;
        self.process_sheets(&sheets, meta, out_path).await
    }

    /// Same as [`process`](Self::process) for callers that already hold
    /// parsed sheets.
    pub async fn process_sheets(
        &self,
        sheets: &[Sheet],
        meta: &UploadMeta,
        out_path: &Path,
    ) -> Result<ClassificationResult, PipelineError> {
        info!(filename = %meta.filename, sheets = sheets.len(), "analyzing workbook");

        let (factors, table) = locate(sheets)?;
        debug!(
            sheet = %table.sheet_name,
            rows = table.rows.len(),
            factors = factors.len(),
            "transaction sheet selected"
        );

        let aggregates = aggregate_rows(&table.rows);
        info!(categories = aggregates.len(), "aggregated transaction rows");

        let result = self.classifier.classify(&aggregates, &factors).await;

        let generated = format_timestamp(&meta.uploaded_at);
        let pages = paginate(
            build_blocks(&meta.filename, &generated, &result),
            CONTENT_LIMIT_MM,
        );
        render_pdf(out_path, &pages)?;
        info!(report = %out_path.display(), pages = pages.len(), "report written");

        Ok(result)
    }
}

/// Upload timestamps arrive in UTC; the report cover shows Stockholm time.
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.with_timezone(&Stockholm)
        .format("%Y-%m-%d %H:%M")
        .to_string()
}
