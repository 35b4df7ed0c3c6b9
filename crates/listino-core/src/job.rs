//! One complete run: download, process, publish, release

use crate::error::Result;
use crate::pipeline::{run_pipeline, PipelineOutcome, PipelineReport, PipelineSettings};
use crate::store::{split_remote_path, RemoteStore};
use chrono::{Local, NaiveDateTime};
use serde::Serialize;
use tracing::{error, info, warn};

/// Default name of the published file
pub const DEFAULT_OUTPUT_FILENAME: &str = "LISTINI_LISTINO_VENDITA_6.csv";

/// How the published file is named
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputName {
    /// Always the same name, replacing the previous run's file
    Fixed(String),
    /// The name with `_YYYYMMDD_HHMMSS` inserted before the extension
    Timestamped(String),
}

impl OutputName {
    pub fn resolve(&self, now: NaiveDateTime) -> String {
        match self {
            OutputName::Fixed(name) => name.clone(),
            OutputName::Timestamped(name) => {
                let stamp = now.format("%Y%m%d_%H%M%S");
                match name.rsplit_once('.') {
                    Some((stem, ext)) if !stem.is_empty() => format!("{}_{}.{}", stem, stamp, ext),
                    _ => format!("{}_{}", name, stamp),
                }
            }
        }
    }
}

/// Where to read from and where to publish
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSpec {
    pub input_path: String,
    /// `None` publishes next to the input
    pub output_dir: Option<String>,
    pub output_name: OutputName,
}

impl JobSpec {
    /// Directory and file name of the output for a run started at `now`
    pub fn output_target(&self, now: NaiveDateTime) -> (String, String) {
        let dir = match &self.output_dir {
            Some(dir) => dir.clone(),
            None => split_remote_path(&self.input_path).0,
        };
        (dir, self.output_name.resolve(now))
    }
}

/// Result of a run that did not fail
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum JobOutcome {
    /// The input decoded to nothing; nothing was uploaded
    EmptyInput,
    Published {
        directory: String,
        filename: String,
        bytes: usize,
        report: PipelineReport,
    },
}

/// Download the input, transform it and upload the result.
///
/// Does not close `store`; see [`run_and_close`].
pub fn run_job<S: RemoteStore + ?Sized>(
    store: &mut S,
    job: &JobSpec,
    settings: &PipelineSettings,
) -> Result<JobOutcome> {
    let input = store.download(&job.input_path)?;
    info!(path = %job.input_path, bytes = input.len(), "input downloaded");

    let (output, report) = match run_pipeline(&input, settings)? {
        PipelineOutcome::EmptyInput { .. } => {
            error!(path = %job.input_path, "input file is empty, nothing published");
            return Ok(JobOutcome::EmptyInput);
        }
        PipelineOutcome::Processed { output, report } => (output, report),
    };

    let (directory, filename) = job.output_target(Local::now().naive_local());
    match &job.output_dir {
        Some(dir) => store.upload(dir, &filename, &output)?,
        // The download left the store inside the input's directory
        None => store.store(&filename, &output)?,
    }
    info!(
        directory = %directory,
        filename = %filename,
        rows = report.rows_kept,
        "output published"
    );

    Ok(JobOutcome::Published {
        directory,
        filename,
        bytes: output.len(),
        report,
    })
}

/// [`run_job`] followed by an unconditional `close`.
///
/// A failing close is logged; it never replaces the run's own error and
/// does not fail an otherwise successful run.
pub fn run_and_close<S: RemoteStore>(
    mut store: S,
    job: &JobSpec,
    settings: &PipelineSettings,
) -> Result<JobOutcome> {
    let result = run_job(&mut store, job, settings);
    if let Err(e) = store.close() {
        warn!(error = %e, "closing the connection failed");
    }
    result
}
