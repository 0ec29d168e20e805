//! HTTP backend client against a local responder.

mod support;

use std::io::Cursor;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

use serde_json::{json, Map, Value};

use modelrun::adapter::outbound::http::{BackendConfig, HttpBackend};
use modelrun::domain::{PredictionStatus, RecipeInput, RecipeRunRequest, RunRequest, RunState, SubmitOutcome};
use modelrun::error::{Error, TransportError};
use modelrun::port::{AssetService, RunBackend};
use modelrun::testkit::domain::model;

use support::http::{Reply, TestServer};

fn backend(server: &TestServer) -> HttpBackend {
    HttpBackend::new(&BackendConfig {
        base_url: server.base_url.clone(),
        api_token: Some("secret-token".into()),
        read_retries: 2,
        retry_delay_ms: 0,
        ..BackendConfig::default()
    })
    .unwrap()
}

fn query_pairs(target: &str) -> Vec<(String, String)> {
    url::Url::parse(&format!("http://localhost{target}"))
        .unwrap()
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

fn png(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = Vec::new();
    image::RgbImage::new(width, height)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

// ==================== Submissions ====================

#[tokio::test]
async fn model_run_posts_request_with_bearer_token() {
    let server =
        TestServer::start(vec![Reply::json(200, r#"{"predictionId":"pred-9"}"#)]).await;
    let mut input = Map::new();
    input.insert("prompt".into(), json!("a red fox"));
    let request = RunRequest::new(model("owner/model", "replicate"), input, "node-1", "recipe-1", 4);

    let outcome = backend(&server).submit_run(&request).await.unwrap();

    assert_eq!(outcome, SubmitOutcome::Prediction("pred-9".into()));
    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].target, "/v1/models/run");
    assert_eq!(requests[0].header("authorization"), Some("Bearer secret-token"));

    let body: Value = serde_json::from_str(&requests[0].body).unwrap();
    assert_eq!(body["input"]["prompt"], json!("a red fox"));
    assert_eq!(body["nodeId"], json!("node-1"));
    assert_eq!(body["recipeVersion"], json!(4));
    assert_eq!(body["model"]["name"], json!("owner/model"));
}

#[tokio::test]
async fn recipe_run_posts_to_recipe_path() {
    let server =
        TestServer::start(vec![Reply::json(200, r#"{"runIds":["r1","r2"]}"#)]).await;
    let request = RecipeRunRequest {
        recipe_id: "recipe-7".into(),
        inputs: vec![RecipeInput {
            node_id: "prompt-node".into(),
            input: json!({"prompt": "a castle"}),
            disabled: false,
            name: None,
        }],
        number_of_runs: 2,
        recipe_version: 1,
    };

    let outcome = backend(&server).submit_recipe(&request).await.unwrap();

    assert_eq!(outcome.ids(), ["r1", "r2"]);
    let requests = server.requests();
    assert_eq!(requests[0].target, "/v1/recipe-runs/recipes/recipe-7/run");
    let body: Value = serde_json::from_str(&requests[0].body).unwrap();
    assert_eq!(body["numberOfRuns"], json!(2));
    assert!(body.get("recipeId").is_none());
}

#[tokio::test]
async fn submissions_are_not_retried() {
    let server = TestServer::start(vec![Reply::json(503, r#"{"error":"busy"}"#)]).await;
    let request = RunRequest::new(model("owner/model", "replicate"), Map::new(), "n", "r", 1);

    let err = backend(&server).submit_run(&request).await.unwrap_err();

    assert!(matches!(
        err,
        Error::Transport(TransportError::Status { status, .. }) if status.as_u16() == 503
    ));
    assert_eq!(server.requests().len(), 1);
}

// ==================== Status reads ====================

#[tokio::test]
async fn prediction_status_is_retried_on_server_errors() {
    let server = TestServer::start(vec![
        Reply::json(503, "{}"),
        Reply::json(200, r#"{"status":"processing","progress":55}"#),
    ])
    .await;

    let status = backend(&server).prediction_status("pred-1").await.unwrap();

    assert_eq!(status, PredictionStatus::Processing { progress: 55.0 });
    let requests = server.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests
        .iter()
        .all(|r| r.target == "/v1/models/predict/pred-1/status"));
}

#[tokio::test]
async fn client_errors_are_not_retried() {
    let server = TestServer::start(vec![Reply::json(404, r#"{"error":"unknown"}"#)]).await;

    let err = backend(&server).prediction_status("missing").await.unwrap_err();

    assert!(matches!(err, Error::Transport(TransportError::Status { .. })));
    assert_eq!(server.requests().len(), 1);
}

#[tokio::test]
async fn read_retries_are_bounded() {
    let server = TestServer::start(vec![
        Reply::json(500, "{}"),
        Reply::json(500, "{}"),
        Reply::json(500, "{}"),
        Reply::json(200, r#"{"status":"starting"}"#),
    ])
    .await;

    assert!(backend(&server).prediction_status("pred-1").await.is_err());
    assert_eq!(server.requests().len(), 3);
}

#[tokio::test]
async fn batch_status_sends_run_ids_and_keeps_order() {
    let server = TestServer::start(vec![Reply::json(
        200,
        r#"{
            "runs": {
                "b": {"status": "RUNNING", "progress": 20, "outputCount": 1},
                "a": {"status": "COMPLETED", "progress": 100, "results": [{"url": "https://cdn.test/a.png", "type": "image"}]}
            },
            "userRemainingCredits": 42
        }"#,
    )])
    .await;

    let status = backend(&server)
        .batch_status("recipe-1", &["a".to_string(), "b".to_string()])
        .await
        .unwrap();

    let order: Vec<_> = status.runs.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(order, ["b", "a"]);
    assert_eq!(status.runs[1].1.state, RunState::Completed);
    assert_eq!(status.credits.user, Some(42.0));
    assert_eq!(status.credits.workspace, None);

    let request = &server.requests()[0];
    assert_eq!(request.method, "GET");
    assert!(request
        .target
        .starts_with("/v1/recipe-runs/recipes/recipe-1/runs/status?"));
    assert_eq!(
        query_pairs(&request.target),
        [("runIds".to_string(), "a,b".to_string())]
    );
}

#[tokio::test]
async fn cancel_posts_once() {
    let server = TestServer::start(vec![Reply::json(200, "{}")]).await;

    backend(&server).cancel_runs("recipe-3").await.unwrap();

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].target, "/v1/recipe-runs/recipes/recipe-3/runs/cancel");
}

// ==================== Assets ====================

#[tokio::test]
async fn probes_image_dimensions_without_credentials() {
    let server = TestServer::start(vec![Reply::bytes("image/png", png(64, 32))]).await;

    let dimensions = backend(&server)
        .image_dimensions(&server.url("/assets/source.png"))
        .await
        .unwrap();

    assert_eq!(dimensions, (64, 32));
    let request = &server.requests()[0];
    assert_eq!(request.target, "/assets/source.png");
    assert_eq!(request.header("authorization"), None);
}

#[tokio::test]
async fn unreadable_image_is_an_error() {
    let server =
        TestServer::start(vec![Reply::bytes("image/png", b"not an image".to_vec())]).await;

    let result = backend(&server)
        .image_dimensions(&server.url("/assets/broken.png"))
        .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn inverts_mask_colours_and_keeps_alpha() {
    let mut mask = image::RgbaImage::new(2, 1);
    mask.put_pixel(0, 0, image::Rgba([0, 0, 0, 255]));
    mask.put_pixel(1, 0, image::Rgba([10, 20, 30, 128]));
    let mut bytes = Vec::new();
    mask.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    let server = TestServer::start(vec![Reply::bytes("image/png", bytes)]).await;

    let data_url = backend(&server)
        .negate_mask(&server.url("/assets/mask.png"))
        .await
        .unwrap();

    let encoded = data_url.strip_prefix("data:image/png;base64,").unwrap();
    let decoded = BASE64.decode(encoded).unwrap();
    let inverted = image::load_from_memory(&decoded).unwrap().to_rgba8();
    assert_eq!(inverted.dimensions(), (2, 1));
    assert_eq!(inverted.get_pixel(0, 0).0, [255, 255, 255, 255]);
    assert_eq!(inverted.get_pixel(1, 0).0, [245, 235, 225, 128]);
    assert_eq!(server.requests()[0].header("authorization"), None);
}

#[tokio::test]
async fn unreadable_mask_is_an_error() {
    let server =
        TestServer::start(vec![Reply::bytes("image/png", b"not a mask".to_vec())]).await;

    let result = backend(&server)
        .negate_mask(&server.url("/assets/mask.png"))
        .await;

    assert!(matches!(result, Err(Error::Transport(TransportError::Decode(_)))));
}

#[tokio::test]
async fn registers_visual_from_url() {
    let server =
        TestServer::start(vec![Reply::json(200, r#"{"visualId":"vis-77"}"#)]).await;

    let visual_id = backend(&server)
        .register_visual("https://cdn.test/product.png")
        .await
        .unwrap();

    assert_eq!(visual_id, "vis-77");
    let request = &server.requests()[0];
    assert_eq!(request.target, "/v1/models/image/register");
    let body: Value = serde_json::from_str(&request.body).unwrap();
    assert_eq!(body, json!({"url": "https://cdn.test/product.png"}));
}
