//! HttpTestClient against a mock test service.

mod common;

use serde_json::{json, Value};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{assets_path, mock_service, mount_listing, step_json, test_path, API_TOKEN, APP_SLUG, BUILD_SLUG};
use vdtest_core::client::{ClientError, HttpTestClient, RemoteTestClient};
use vdtest_core::config::{ApiEndpoint, TestType};
use vdtest_core::matrix::build_test_matrix;
use vdtest_core::step::{StepState, Summary};

fn client_for(server: &MockServer) -> HttpTestClient {
    HttpTestClient::new(ApiEndpoint {
        base_url: server.uri(),
        app_slug: APP_SLUG.to_string(),
        build_slug: BUILD_SLUG.to_string(),
        api_token: API_TOKEN.to_string(),
    })
    .unwrap()
}

#[tokio::test]
async fn test_upload_urls_and_file_upload() {
    let server = mock_service().await;
    let client = client_for(&server);
    let dir = tempfile::tempdir().unwrap();
    let apk = dir.path().join("app.apk");
    std::fs::write(&apk, b"0123456789").unwrap();

    let urls = client.upload_urls().await.unwrap();
    assert_eq!(urls.app_url, format!("{}/upload/app", server.uri()));

    client.upload_file(&urls.app_url, &apk).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let put = requests
        .iter()
        .find(|r| r.method.as_str() == "PUT")
        .expect("upload request");
    assert_eq!(put.url.path(), "/upload/app");
    assert_eq!(put.body, b"0123456789");
    assert_eq!(
        put.headers.get("content-length").unwrap().to_str().unwrap(),
        "10"
    );
}

#[tokio::test]
async fn test_upload_rejected_by_storage() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/upload/app"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;
    let client = client_for(&server);
    let dir = tempfile::tempdir().unwrap();
    let apk = dir.path().join("app.apk");
    std::fs::write(&apk, b"apk").unwrap();

    let err = client
        .upload_file(&format!("{}/upload/app", server.uri()), &apk)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Status { status: 403, .. }));
}

#[tokio::test]
async fn test_upload_missing_file_is_io_error() {
    let server = MockServer::start().await;
    let client = client_for(&server);
    let err = client
        .upload_file(&format!("{}/upload/app", server.uri()), std::path::Path::new("/nonexistent/app.apk"))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Io { .. }));
}

#[tokio::test]
async fn test_start_test_posts_matrix_json() {
    let server = mock_service().await;
    let client = client_for(&server);
    let dir = tempfile::tempdir().unwrap();
    let config = common::step_config(dir.path(), &server.uri(), TestType::Robo);
    let matrix = build_test_matrix(&config).unwrap();

    client.start_test(&matrix).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let submit = requests
        .iter()
        .find(|r| r.method.as_str() == "POST" && r.url.path() == test_path())
        .expect("submission request");
    let body: Value = serde_json::from_slice(&submit.body).unwrap();
    assert_eq!(
        body["environmentMatrix"]["androidDeviceList"]["androidDevices"][1]["androidModelId"],
        "Pixel2"
    );
    assert_eq!(body["testSpecification"]["testTimeout"], "900s");
    assert!(body["testSpecification"].get("androidRoboTest").is_some());
    assert!(body["testSpecification"].get("androidInstrumentationTest").is_none());
}

#[tokio::test]
async fn test_start_test_non_200_is_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(test_path()))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(400))
        .mount(&server)
        .await;
    let client = client_for(&server);
    let dir = tempfile::tempdir().unwrap();
    let config = common::step_config(dir.path(), &server.uri(), TestType::Instrumentation);

    let err = client
        .start_test(&build_test_matrix(&config).unwrap())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Failed to start test, status code: 400");
}

#[tokio::test]
async fn test_list_steps_decodes_listing() {
    let server = MockServer::start().await;
    mount_listing(
        &server,
        vec![
            step_json("complete", "Pixel2", Some(json!({"summary": "success"}))),
            step_json("pending", "Nexus6", None),
        ],
        None,
    )
    .await;
    let client = client_for(&server);

    let listing = client.list_steps().await.unwrap();
    assert_eq!(listing.steps.len(), 2);
    assert_eq!(listing.steps[0].state, StepState::Complete);
    assert_eq!(listing.steps[0].outcome.as_ref().unwrap().summary, Summary::Success);
    assert_eq!(listing.steps[1].state, StepState::Pending);
}

#[tokio::test]
async fn test_list_steps_undecodable_body_is_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(test_path()))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;
    let client = client_for(&server);

    let err = client.list_steps().await.unwrap_err();
    match err {
        ClientError::Decode { body, .. } => assert_eq!(body, "<html>gateway</html>"),
        other => panic!("expected decode error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_list_assets_and_download() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(assets_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "logcat": format!("{}/files/logcat", server.uri()),
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/logcat"))
        .respond_with(ResponseTemplate::new(200).set_body_string("I/ActivityManager: started"))
        .mount(&server)
        .await;
    let client = client_for(&server);
    let dir = tempfile::tempdir().unwrap();

    let assets = client.list_assets().await.unwrap();
    assert_eq!(assets.len(), 1);

    let dest = dir.path().join("logcat");
    client.download_file(&assets["logcat"], &dest).await.unwrap();
    assert_eq!(std::fs::read_to_string(dest).unwrap(), "I/ActivityManager: started");
}

#[tokio::test]
async fn test_download_non_200_is_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    let client = client_for(&server);
    let dir = tempfile::tempdir().unwrap();

    let err = client
        .download_file(&format!("{}/files/missing", server.uri()), &dir.path().join("missing"))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Status { status: 404, .. }));
}

#[tokio::test]
async fn test_transport_errors_do_not_reveal_the_token() {
    // Nothing listens on the discard port.
    let client = HttpTestClient::new(ApiEndpoint {
        base_url: "http://127.0.0.1:9".to_string(),
        app_slug: APP_SLUG.to_string(),
        build_slug: BUILD_SLUG.to_string(),
        api_token: "very-secret-token".to_string(),
    })
    .unwrap();

    let err = client.upload_urls().await.unwrap_err();
    assert!(matches!(err, ClientError::Transport { .. }));
    assert!(!err.to_string().contains("very-secret-token"), "{}", err);
    assert!(!format!("{:?}", err).contains("very-secret-token"), "{:?}", err);

    let err = client.list_steps().await.unwrap_err();
    assert!(!err.to_string().contains("very-secret-token"), "{}", err);
}
