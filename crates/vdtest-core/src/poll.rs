//! Waiting for a submitted test run to finish.
//!
//! The poll loop repeatedly lists the run's steps until every step is
//! `complete`, sleeping a fixed interval between requests. Each iteration
//! produces a status line; a line is emitted only the first time it is
//! seen, so a long run prints each `(k/n) running` count once.
//!
//! There is no overall timeout: a run that never completes keeps the loop
//! polling until the process is terminated.
//!
//! # Example
//!
//! ```no_run
//! use vdtest_core::client::HttpTestClient;
//! use vdtest_core::config::ApiEndpoint;
//! use vdtest_core::poll::{wait_for_completion, PollConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = HttpTestClient::new(ApiEndpoint::default()).unwrap();
//!     let steps = wait_for_completion(&client, &PollConfig::default(), |line| {
//!         println!("- {}", line);
//!     })
//!     .await
//!     .unwrap();
//!     println!("{} steps finished", steps.len());
//! }
//! ```

use std::collections::HashSet;
use std::time::Duration;

use tracing::{debug, debug_span, Instrument};

use crate::client::{ClientError, RemoteTestClient};
use crate::step::TestStep;

/// Delay between two polls of a running test.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Status line used while the service has not created any steps yet.
pub const VALIDATING_MESSAGE: &str = "Validating";

/// Configuration for the poll loop.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Delay between polls while the run is not finished (default: 5s).
    pub interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Whether the remote run still needs polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Running,
    Finished,
}

/// The evaluation of one step listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollStatus {
    pub state: PollState,
    pub message: String,
}

impl PollStatus {
    /// Evaluates a step listing.
    ///
    /// Finished iff there is at least one step and all steps are complete.
    pub fn evaluate(steps: &[TestStep]) -> Self {
        if steps.is_empty() {
            return Self {
                state: PollState::Running,
                message: VALIDATING_MESSAGE.to_string(),
            };
        }

        let running = steps.iter().filter(|step| !step.is_complete()).count();
        Self {
            state: if running == 0 {
                PollState::Finished
            } else {
                PollState::Running
            },
            message: format!("({}/{}) running", running, steps.len()),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.state == PollState::Finished
    }
}

/// Remembers every status line already emitted.
#[derive(Debug, Default)]
pub struct StatusLog {
    seen: HashSet<String>,
}

impl StatusLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `message`; returns `true` if it had not been seen before.
    pub fn record(&mut self, message: &str) -> bool {
        if self.seen.contains(message) {
            return false;
        }
        self.seen.insert(message.to_string());
        true
    }
}

/// Polls until the run is finished and returns the final steps.
///
/// `on_status` receives each distinct status line once. Any client error
/// ends the loop immediately.
pub async fn wait_for_completion<C, F>(
    client: &C,
    config: &PollConfig,
    mut on_status: F,
) -> Result<Vec<TestStep>, ClientError>
where
    C: RemoteTestClient + ?Sized,
    F: FnMut(&str),
{
    let mut log = StatusLog::new();
    let mut iteration: u64 = 0;

    loop {
        iteration += 1;
        let listing = client
            .list_steps()
            .instrument(debug_span!("poll", iteration))
            .await?;
        let status = PollStatus::evaluate(&listing.steps);
        debug!(iteration, state = ?status.state, message = %status.message, "polled test status");

        if log.record(&status.message) {
            on_status(&status.message);
        }

        if status.is_finished() {
            return Ok(listing.steps);
        }

        tokio::time::sleep(config.interval).await;
    }
}
