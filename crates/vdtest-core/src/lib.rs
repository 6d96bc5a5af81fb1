//! # vdtest-core
//!
//! Core library for running Android test matrices on a remote virtual
//! device testing service from a build pipeline.
//!
//! A run uploads the app (and test) APK, submits a test matrix built from
//! flat step inputs, polls until every device cell has finished, classifies
//! the outcomes and optionally downloads the produced assets.
//!
//! ## Modules
//!
//! - [`config`] - Typed step configuration and validation
//! - [`parse`] - Parsers for comma and newline separated inputs
//! - [`device`] - Test device descriptors
//! - [`directive`] - Robo test directives
//! - [`matrix`] - Test matrix construction and wire types
//! - [`step`] - Remote step states and outcomes
//! - [`client`] - The [`client::RemoteTestClient`] seam and its HTTP implementation
//! - [`poll`] - Waiting for a run to finish
//! - [`report`] - Outcome classification and the results table
//! - [`assets`] - Downloading produced artifacts
//! - [`runner`] - One complete run of the step
//!
//! ## Example
//!
//! ```no_run
//! use vdtest_core::client::HttpTestClient;
//! use vdtest_core::config::StepConfig;
//! use vdtest_core::poll::PollConfig;
//! use vdtest_core::report::Report;
//! use vdtest_core::runner::{run, ProgressSink};
//!
//! struct Stdout;
//!
//! impl ProgressSink for Stdout {
//!     fn section(&mut self, title: &str) { println!("{}", title); }
//!     fn done(&mut self, message: &str) { println!("=> {}", message); }
//!     fn status(&mut self, line: &str) { println!("- {}", line); }
//!     fn report(&mut self, report: &Report) { println!("{}", report.render()); }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = StepConfig::default();
//!     config.validate().expect("invalid configuration");
//!     let client = HttpTestClient::new(config.api.clone()).unwrap();
//!     let summary = run(&config, &client, &PollConfig::default(), &mut Stdout).await.unwrap();
//!     std::process::exit(if summary.successful() { 0 } else { 1 });
//! }
//! ```

pub mod assets;
pub mod client;
pub mod config;
pub mod device;
pub mod directive;
pub mod matrix;
pub mod parse;
pub mod poll;
pub mod report;
pub mod runner;
pub mod step;
