//! One complete run of the step.
//!
//! [`run`] drives the sequence: build the test matrix, upload the packages,
//! submit the matrix, wait for completion, classify the results and,
//! optionally, download the produced assets. Any error ends the run; a
//! failed test outcome does not, it only makes [`RunSummary::successful`]
//! return `false`.
//!
//! Progress is reported through a [`ProgressSink`] so the binary decides how
//! it is printed.

use std::path::PathBuf;

use thiserror::Error;
use tracing::{info, info_span, Instrument};

use crate::assets::{create_assets_dir, download_assets};
use crate::client::{ClientError, RemoteTestClient};
use crate::config::StepConfig;
use crate::matrix::build_test_matrix;
use crate::parse::ParseError;
use crate::poll::{wait_for_completion, PollConfig};
use crate::report::Report;

/// Errors that abort a run.
#[derive(Error, Debug)]
pub enum RunError {
    /// A list, device, directive or numeric input was malformed.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The test service could not be reached or answered unexpectedly.
    #[error(transparent)]
    Client(#[from] ClientError),
}

/// Receives progress of a run.
pub trait ProgressSink {
    /// A new phase of the run starts.
    fn section(&mut self, title: &str);

    /// The current phase finished.
    fn done(&mut self, message: &str);

    /// A new, distinct test status line.
    fn status(&mut self, line: &str);

    /// The results of the finished run.
    fn report(&mut self, report: &Report);
}

/// What a run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub report: Report,
    /// Directory holding downloaded assets, when downloading was requested.
    pub assets_dir: Option<PathBuf>,
}

impl RunSummary {
    /// `true` if every step's outcome allows the step to pass.
    pub fn successful(&self) -> bool {
        self.report.successful()
    }
}

/// Runs the step against `client`.
///
/// `config` is expected to be validated already.
pub async fn run<C>(
    config: &StepConfig,
    client: &C,
    poll: &PollConfig,
    sink: &mut dyn ProgressSink,
) -> Result<RunSummary, RunError>
where
    C: RemoteTestClient + ?Sized,
{
    // Input errors must surface before anything is uploaded.
    let matrix = build_test_matrix(config)?;

    sink.section("Upload APKs");
    async {
        let urls = client.upload_urls().await?;
        client.upload_file(&urls.app_url, &config.apk_path).await?;
        if config.uploads_test_apk() {
            if let Some(test_apk) = &config.test_apk_path {
                client.upload_file(&urls.test_app_url, test_apk).await?;
            }
        }
        Ok::<(), ClientError>(())
    }
    .instrument(info_span!("upload"))
    .await?;
    sink.done("APKs uploaded");

    sink.section("Start test");
    client
        .start_test(&matrix)
        .instrument(info_span!(
            "start_test",
            test_type = %matrix.test_specification.test.test_type()
        ))
        .await?;
    info!(
        devices = matrix.environment_matrix.android_device_list.android_devices.len(),
        "test matrix submitted"
    );
    sink.done("Test started");

    sink.section("Waiting for test results");
    let steps = wait_for_completion(client, poll, |line| sink.status(line)).await?;
    sink.done("Test finished");

    let report = Report::from_steps(&steps);
    sink.report(&report);

    let assets_dir = if config.download_test_results {
        sink.section("Downloading test assets");
        let dir = create_assets_dir()?;
        let count = download_assets(client, &dir)
            .instrument(info_span!("download_assets"))
            .await?;
        info!(count, dir = %dir.display(), "test assets downloaded");
        sink.done("Assets downloaded");
        Some(dir)
    } else {
        None
    };

    Ok(RunSummary { report, assets_dir })
}
