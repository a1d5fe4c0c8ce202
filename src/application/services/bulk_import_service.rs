//! Bulk import of URLs from an uploaded CSV file.
//!
//! Each line holds one destination URL. Lines are processed in order and
//! every URL is created and fully validated before the next line starts, so
//! the report states a definitive outcome for each of them.

use std::path::PathBuf;
use std::sync::Arc;

use csv::{QuoteStyle, Terminator, WriterBuilder};
use serde_json::json;

use crate::application::services::short_url_service::{CreateShortUrl, ShortUrlService};
use crate::error::AppError;
use crate::infrastructure::reports::FileReportStore;
use crate::utils::url_normalizer::looks_like_http_url;

const FORMAT_INVALID: &str = "Format Invalid";
const FORMAT_INVALID_LABEL: &str = "ERROR: debe ser una URI http o https";
const MALFORMED_FILE: [&str; 2] = ["FALLO DE FORMATO", "NO SE HA PODIDO PROCESAR EL FICHERO"];

/// One entry of the import report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportEntry {
    /// The URL was shortened; `label` is `OK` or the validation failure.
    Created {
        original: String,
        short_url: String,
        label: &'static str,
    },
    /// The line is not an http(s) URL; nothing was created.
    FormatInvalid { original: String },
    /// A line contained the report delimiter and the scan stopped there.
    MalformedFile,
}

impl ReportEntry {
    fn fields(&self) -> Vec<&str> {
        match self {
            ReportEntry::Created {
                original,
                short_url,
                label,
            } => vec![original.as_str(), short_url.as_str(), *label],
            ReportEntry::FormatInvalid { original } => {
                vec![original.as_str(), FORMAT_INVALID, FORMAT_INVALID_LABEL]
            }
            ReportEntry::MalformedFile => MALFORMED_FILE.to_vec(),
        }
    }

    fn metric_label(&self) -> &'static str {
        match self {
            ReportEntry::Created { label, .. } if *label == "OK" => "ok",
            ReportEntry::Created { .. } => "validation_failed",
            ReportEntry::FormatInvalid { .. } => "format_invalid",
            ReportEntry::MalformedFile => "malformed_file",
        }
    }
}

/// A rendered import report.
#[derive(Debug, Clone)]
pub struct BulkImportReport {
    /// Name offered to the client, `<base>_check.csv`.
    pub file_name: String,
    /// Where the report was stored.
    pub path: PathBuf,
    pub entries: Vec<ReportEntry>,
    pub body: Vec<u8>,
}

pub struct BulkImportService {
    short_urls: Arc<ShortUrlService>,
    store: Arc<FileReportStore>,
}

impl BulkImportService {
    pub fn new(short_urls: Arc<ShortUrlService>, store: Arc<FileReportStore>) -> Self {
        Self { short_urls, store }
    }

    /// Imports the uploaded file `file_name` whose text is `content`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the file name does not end in
    /// `.csv`, or an error if a record cannot be stored or the report cannot
    /// be written.
    pub async fn import(
        &self,
        file_name: &str,
        content: &str,
        ip: Option<String>,
    ) -> Result<BulkImportReport, AppError> {
        let report_name = report_file_name(file_name)?;

        let mut entries = Vec::new();
        for line in content.split('\n') {
            let line = line.strip_suffix('\r').unwrap_or(line).trim();
            if line.is_empty() {
                continue;
            }
            if line.contains(';') {
                tracing::warn!(file = file_name, "Delimiter found in line, stopping import");
                entries.push(ReportEntry::MalformedFile);
                break;
            }
            entries.push(self.import_line(line, ip.clone()).await?);
        }

        for entry in &entries {
            metrics::counter!("bulk_import_lines_total", "outcome" => entry.metric_label())
                .increment(1);
        }

        let body = render(&entries)?;
        let path = self.store.store(&body).await.map_err(|e| {
            AppError::internal("Failed to store report", json!({ "reason": e.to_string() }))
        })?;

        tracing::info!(
            file = file_name,
            lines = entries.len(),
            report = %path.display(),
            "Bulk import finished"
        );

        Ok(BulkImportReport {
            file_name: report_name,
            path,
            entries,
            body,
        })
    }

    async fn import_line(&self, line: &str, ip: Option<String>) -> Result<ReportEntry, AppError> {
        let invalid = || ReportEntry::FormatInvalid {
            original: line.to_string(),
        };

        if !looks_like_http_url(line) {
            return Ok(invalid());
        }

        let input = CreateShortUrl {
            url: line.to_string(),
            sponsor: None,
            ip,
        };
        match self.short_urls.create_validated(input).await {
            Ok(record) => Ok(ReportEntry::Created {
                original: line.to_string(),
                short_url: self.short_urls.short_url(&record.hash),
                label: record.outcome().report_label(),
            }),
            Err(AppError::Validation { .. }) => Ok(invalid()),
            Err(e) => Err(e),
        }
    }
}

/// `<base>_check.csv` for an uploaded `<base>.csv`.
///
/// # Errors
///
/// Returns [`AppError::Validation`] unless `file_name` ends in `.csv`.
pub fn report_file_name(file_name: &str) -> Result<String, AppError> {
    let is_csv = file_name
        .rsplit_once('.')
        .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case("csv"));
    if !is_csv {
        return Err(AppError::bad_request(
            "Only .csv files are accepted",
            json!({ "file": file_name }),
        ));
    }

    let base = file_name.split('.').next().unwrap_or_default();
    Ok(format!("{base}_check.csv"))
}

fn render(entries: &[ReportEntry]) -> Result<Vec<u8>, AppError> {
    let failed = |e: String| AppError::internal("Failed to render report", json!({ "reason": e }));

    let mut writer = WriterBuilder::new()
        .delimiter(b';')
        .quote_style(QuoteStyle::Never)
        .flexible(true)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    for entry in entries {
        writer
            .write_record(entry.fields())
            .map_err(|e| failed(e.to_string()))?;
    }

    writer.into_inner().map_err(|e| failed(e.to_string()))
}
