//! One-shot build: every page, document and style sheet, then a summary.

use std::sync::Arc;

use anyhow::Result;

use crate::compiler::transform::Toolchain;
use crate::compiler::{BatchReport, Pipeline};
use crate::config::SiteConfig;
use crate::reload::NullTransport;
use crate::utils::plural_count;
use crate::{debug_do, log};

/// Build the whole site once with the configured transforms.
pub fn build_site(config: Arc<SiteConfig>) -> Result<BatchReport> {
    let toolchain = Toolchain::from_config(&config)?;
    let pipeline = Pipeline::new(config, toolchain);
    Ok(build_once(&pipeline))
}

/// Run a full build and print the per-task summary.
pub fn build_once(pipeline: &Pipeline) -> BatchReport {
    let report = pipeline.full_build(&NullTransport);
    let config = pipeline.config();

    debug_do! {
        for result in report.results.iter().filter(|r| r.is_success()) {
            crate::debug!(
                "build";
                "{} ({}) -> {}",
                config.root_relative(&result.task.source).display(),
                result.task.kind,
                config.root_relative(&result.task.destination).display()
            );
        }
    }

    for failure in report.failures() {
        log!(
            "error";
            "{} ({})",
            config.root_relative(&failure.task.source).display(),
            failure.task.kind
        );
        eprintln!("{}", failure.error().unwrap_or_default());
    }

    log!("build"; "{}", summary_line(&report));
    report
}

fn summary_line(report: &BatchReport) -> String {
    let elapsed = report.elapsed.as_millis();
    match (report.results.len(), report.failed()) {
        (0, _) => "nothing to build".to_string(),
        (total, 0) => format!("built {} in {} ms", plural_count(total, "task"), elapsed),
        (total, failed) => format!(
            "{} of {} failed in {} ms",
            failed,
            plural_count(total, "task"),
            elapsed
        ),
    }
}
