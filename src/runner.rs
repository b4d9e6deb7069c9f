//! Shared collector driver.
//!
//! Written once, parameterized over the [`Collector`] capability: construct
//! the run logger, collect, assemble `raw_text`, build the uniform output
//! record, write it, and map the outcome to an exit code. The output and
//! error contracts are implemented here and nowhere else.

use std::path::Path;

use anyhow::{Context, Result};

use crate::logging::RunLogger;
use crate::models::{CollectionRequest, CollectionResult, ErrorKind};
use crate::traits::Collector;

/// Run one collector end to end and return the process exit code (0 or 1).
///
/// Every classified failure still writes a valid, degraded output record
/// before the non-zero exit: downstream consumers can always read a parseable
/// file at `output_path` and must inspect its `error` field.
pub async fn run(collector: &dyn Collector, request: &CollectionRequest) -> Result<u8> {
    let source = collector.source();
    let logger = RunLogger::create(&request.log_dir, source)?;

    logger.log(&format!(
        "Starting {} data gathering...",
        source.display_name()
    ));
    logger.log(&format!(
        "Date range: {} to {}",
        fmt_bound(request.window.start),
        fmt_bound(request.window.end)
    ));

    match collector.collect(request, &logger).await {
        Ok(harvest) => {
            let count = harvest.blocks.len();
            let raw_text = if harvest.blocks.is_empty() {
                harvest
                    .empty_text
                    .unwrap_or_else(|| source.empty_text().to_string())
            } else {
                harvest.blocks.join("\n")
            };
            let result =
                CollectionResult::success(source, raw_text, count, harvest.extra, request.window);
            write_result(&request.output_path, &result)?;
            logger.log(&format!(
                "{} data saved to {} ({} items)",
                source.display_name(),
                request.output_path.display(),
                count
            ));
            Ok(0)
        }
        Err(err) => {
            let kind = err.kind(source);
            let fatal = err.is_fatal(source);
            if fatal {
                logger.log(&format!("ERROR: {}", err));
            } else {
                logger.log(&format!(
                    "WARNING: {}, skipping {} data",
                    err,
                    source.display_name()
                ));
            }

            let message = matches!(kind, ErrorKind::ApiFailure | ErrorKind::UnexpectedError)
                .then(|| err.to_string());
            let result = CollectionResult::failure(source, kind, message);
            write_result(&request.output_path, &result)?;
            Ok(u8::from(fatal))
        }
    }
}

/// Overwrite `path` with the pretty-printed JSON record.
pub fn write_result(path: &Path, result: &CollectionResult) -> Result<()> {
    let json = serde_json::to_string_pretty(result)?;
    std::fs::write(path, json)
        .with_context(|| format!("failed to write output file {}", path.display()))?;
    Ok(())
}

fn fmt_bound(bound: Option<chrono::NaiveDate>) -> String {
    bound
        .map(|d| d.to_string())
        .unwrap_or_else(|| "None".to_string())
}
