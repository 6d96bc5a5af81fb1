//! Shared test helpers for vdtest-core integration tests.
//!
//! Provides a scripted in-memory [`RemoteTestClient`], a recording
//! [`ProgressSink`], builders for step listings, and a wiremock-backed
//! service for tests that exercise the real HTTP client.

#![allow(dead_code)]

use std::collections::{BTreeMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vdtest_core::client::{ClientError, RemoteTestClient, UploadUrls};
use vdtest_core::config::{ApiEndpoint, StepConfig, TestType};
use vdtest_core::matrix::TestMatrix;
use vdtest_core::report::Report;
use vdtest_core::runner::ProgressSink;
use vdtest_core::step::ListStepsResponse;

pub const APP_SLUG: &str = "app-slug";
pub const BUILD_SLUG: &str = "build-slug";
pub const API_TOKEN: &str = "api-token";

// ---------------------------------------------------------------------------
// Step listings
// ---------------------------------------------------------------------------

/// A step JSON object with the four standard dimensions.
pub fn step_json(state: &str, model: &str, outcome: Option<Value>) -> Value {
    let mut step = json!({
        "state": state,
        "dimensionValue": [
            {"key": "Model", "value": model},
            {"key": "Version", "value": "28"},
            {"key": "Locale", "value": "en"},
            {"key": "Orientation", "value": "portrait"}
        ]
    });
    if let Some(outcome) = outcome {
        step["outcome"] = outcome;
    }
    step
}

pub fn listing(steps: Vec<Value>) -> ListStepsResponse {
    serde_json::from_value(json!({ "steps": steps })).unwrap()
}

// ---------------------------------------------------------------------------
// Scripted client
// ---------------------------------------------------------------------------

/// In-memory client that replays a fixed sequence of step listings.
///
/// The last listing is repeated once the script runs out.
pub struct ScriptedClient {
    listings: Mutex<VecDeque<ListStepsResponse>>,
    pub polls: Mutex<usize>,
    pub uploads: Mutex<Vec<(String, PathBuf)>>,
    pub submitted: Mutex<Option<TestMatrix>>,
    pub fail_polls_with_status: Option<u16>,
}

impl ScriptedClient {
    pub fn new(listings: Vec<ListStepsResponse>) -> Self {
        Self {
            listings: Mutex::new(listings.into()),
            polls: Mutex::new(0),
            uploads: Mutex::new(Vec::new()),
            submitted: Mutex::new(None),
            fail_polls_with_status: None,
        }
    }

    pub fn poll_count(&self) -> usize {
        *self.polls.lock().unwrap()
    }
}

#[async_trait]
impl RemoteTestClient for ScriptedClient {
    async fn upload_urls(&self) -> Result<UploadUrls, ClientError> {
        Ok(UploadUrls {
            app_url: "mem://app".to_string(),
            test_app_url: "mem://test-app".to_string(),
        })
    }

    async fn upload_file(&self, url: &str, path: &Path) -> Result<(), ClientError> {
        self.uploads
            .lock()
            .unwrap()
            .push((url.to_string(), path.to_path_buf()));
        Ok(())
    }

    async fn start_test(&self, matrix: &TestMatrix) -> Result<(), ClientError> {
        *self.submitted.lock().unwrap() = Some(matrix.clone());
        Ok(())
    }

    async fn list_steps(&self) -> Result<ListStepsResponse, ClientError> {
        *self.polls.lock().unwrap() += 1;
        if let Some(status) = self.fail_polls_with_status {
            return Err(ClientError::Status {
                context: "get test status",
                status,
            });
        }
        let mut listings = self.listings.lock().unwrap();
        if listings.len() > 1 {
            Ok(listings.pop_front().unwrap())
        } else {
            Ok(listings.front().cloned().unwrap_or_default())
        }
    }

    async fn list_assets(&self) -> Result<BTreeMap<String, String>, ClientError> {
        Ok(BTreeMap::new())
    }

    async fn download_file(&self, _url: &str, _dest: &Path) -> Result<(), ClientError> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Recording sink
// ---------------------------------------------------------------------------

/// Records everything a run reports, in order.
#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<String>,
    pub statuses: Vec<String>,
    pub report: Option<Report>,
}

impl ProgressSink for RecordingSink {
    fn section(&mut self, title: &str) {
        self.events.push(format!("section:{}", title));
    }

    fn done(&mut self, message: &str) {
        self.events.push(format!("done:{}", message));
    }

    fn status(&mut self, line: &str) {
        self.statuses.push(line.to_string());
    }

    fn report(&mut self, report: &Report) {
        self.events.push("report".to_string());
        self.report = Some(report.clone());
    }
}

// ---------------------------------------------------------------------------
// Configuration fixtures
// ---------------------------------------------------------------------------

/// A valid configuration with real APK files inside `dir`.
pub fn step_config(dir: &Path, base_url: &str, test_type: TestType) -> StepConfig {
    let apk = dir.join("app-debug.apk");
    let test_apk = dir.join("app-debug-androidTest.apk");
    std::fs::write(&apk, b"PK\x03\x04 app package").unwrap();
    std::fs::write(&test_apk, b"PK\x03\x04 test package").unwrap();

    StepConfig {
        api: ApiEndpoint {
            base_url: base_url.to_string(),
            app_slug: APP_SLUG.to_string(),
            build_slug: BUILD_SLUG.to_string(),
            api_token: API_TOKEN.to_string(),
        },
        apk_path: apk,
        test_apk_path: Some(test_apk),
        test_type,
        test_devices: "NexusLowRes,24,en,portrait\nPixel2,28,en,portrait".to_string(),
        ..StepConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Mock HTTP service
// ---------------------------------------------------------------------------

pub fn test_path() -> String {
    format!("/{}/{}/{}", APP_SLUG, BUILD_SLUG, API_TOKEN)
}

pub fn assets_path() -> String {
    format!("/assets/{}/{}/{}", APP_SLUG, BUILD_SLUG, API_TOKEN)
}

/// Starts a mock service answering the upload and submission endpoints.
///
/// Step listings and assets are left to the individual test.
pub async fn mock_service() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(assets_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "appUrl": format!("{}/upload/app", server.uri()),
            "testAppUrl": format!("{}/upload/test-app", server.uri()),
        })))
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/upload/app"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/upload/test-app"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(test_path()))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    server
}

/// Mounts a step listing answer, optionally limited to `times` requests.
pub async fn mount_listing(server: &MockServer, steps: Vec<Value>, times: Option<u64>) {
    let mock = Mock::given(method("GET"))
        .and(path(test_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "steps": steps })));
    let mock = match times {
        Some(n) => mock.up_to_n_times(n),
        None => mock,
    };
    mock.mount(server).await;
}
