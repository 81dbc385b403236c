use super::commands::{DetectArgs, ShowArgs};
use crate::config::DetectorConfig;
use crate::detection::types::{DetectionOutcome, DetectionResult};
use crate::detection::DetectionService;
use crate::sink::{FileResultSink, ResultRecord, ResultSink, SinkError};
use serde::Serialize;
use std::collections::BTreeMap;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

/// Printed to stdout after a run: the four maps, the revision and the
/// error map, as published.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    #[serde(flatten)]
    pub result: DetectionResult,
    #[serde(rename = "errorMap")]
    pub errors: BTreeMap<String, String>,
}

impl From<DetectionOutcome> for Report {
    fn from(outcome: DetectionOutcome) -> Self {
        let errors = outcome
            .error
            .iter()
            .map(|e| (e.kind().name().to_string(), e.to_string()))
            .collect();
        Self {
            result: outcome.result,
            errors,
        }
    }
}

impl TryFrom<&ResultRecord> for Report {
    type Error = SinkError;

    fn try_from(record: &ResultRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            result: DetectionResult {
                devfiles: record.devfiles()?,
                devfile_urls: record.devfile_urls()?,
                dockerfiles: record.dockerfiles()?,
                ports: record.ports()?,
                revision: record.revision(),
            },
            errors: record.errors()?,
        })
    }
}

fn print_report(report: &Report) -> bool {
    match serde_json::to_string_pretty(report) {
        Ok(json) => {
            println!("{}", json);
            true
        }
        Err(e) => {
            error!(error = %e, "Failed to encode report");
            false
        }
    }
}

pub async fn handle_detect(args: &DetectArgs, mut config: DetectorConfig) -> i32 {
    if let Some(dir) = &args.result_dir {
        config.result_dir = dir.clone();
    }

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling detection");
            on_signal.cancel();
        }
    });

    let service = DetectionService::from_config(config);
    let outcome = service.run(args.to_request(), cancel).await;
    let success = outcome.is_success();

    if !print_report(&Report::from(outcome)) {
        return 1;
    }
    if success {
        0
    } else {
        1
    }
}

pub async fn handle_show(args: &ShowArgs, config: DetectorConfig) -> i32 {
    let root = args.result_dir.clone().unwrap_or(config.result_dir);
    let sink = FileResultSink::new(root);

    let record = match sink.fetch(&args.namespace, &args.name).await {
        Ok(Some(record)) => record,
        Ok(None) => {
            error!(namespace = %args.namespace, name = %args.name, "No result record found");
            return 1;
        }
        Err(e) => {
            error!(error = %e, "Failed to read result record");
            return 1;
        }
    };

    match Report::try_from(&record) {
        Ok(report) if print_report(&report) => 0,
        Ok(_) => 1,
        Err(e) => {
            error!(error = %e, "Failed to decode result record");
            1
        }
    }
}
