use std::net::TcpListener;
use std::time::Duration;

use actix_web::{http::StatusCode, web, App, HttpResponse, HttpServer};
use serde_json::json;

use materialscan_backend::entities::asset::EncodedImage;
use materialscan_backend::errors::PipelineError;
use materialscan_backend::inference::{GeminiClient, MaterialAnalyzer};
use materialscan_backend::settings::{AppConfig, AppEnvironment};

/// Spawns a one-route server that answers every request with a fixed status
/// and body, playing the part of the inference endpoint.
async fn spawn_stub(status: u16, body: String) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind stub listener");
    let address = format!("http://127.0.0.1:{}", listener.local_addr().unwrap().port());

    let server = HttpServer::new(move || {
        let status = StatusCode::from_u16(status).unwrap();
        let body = body.clone();
        App::new().default_service(web::route().to(move || {
            let body = body.clone();
            async move {
                HttpResponse::build(status)
                    .content_type("application/json")
                    .body(body)
            }
        }))
    })
    .listen(listener)
    .expect("Failed to listen on stub address")
    .workers(1)
    .disable_signals()
    .run();

    tokio::spawn(server);

    let client = reqwest::Client::new();
    while client.get(&address).send().await.is_err() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    address
}

fn client_for(address: &str) -> GeminiClient {
    GeminiClient::new(&test_config(address))
}

fn test_config(api_base: &str) -> AppConfig {
    AppConfig {
        env: AppEnvironment::Testing,
        name: "MaterialScan Test".into(),
        port: 0,
        host: "127.0.0.1".into(),
        worker_count: 1,
        database_url: "postgres://localhost/test".into(),
        gemini_api_key: "test-key".into(),
        gemini_api_base: api_base.into(),
        gemini_model: "gemini-1.5-flash".into(),
        storage_bucket: "materials".into(),
        storage_region: "us-east-1".into(),
        storage_endpoint: None,
        cors_allowed_origins: vec!["*".into()],
        max_upload_bytes: 10 * 1024 * 1024,
        pending_retention_hours: 24,
    }
}

fn sample_image() -> EncodedImage {
    EncodedImage { media_type: "image/jpeg".into(), data: "Zm9v".into() }
}

#[actix_rt::test]
async fn returns_analysis_text_from_successful_response() {
    let body = json!({
        "candidates": [{
            "content": {
                "parts": [{ "text": "1) Materials Identified: aluminum" }]
            }
        }]
    });
    let address = spawn_stub(200, body.to_string()).await;

    let analysis = client_for(&address).analyze(&sample_image()).await.unwrap();

    assert_eq!(analysis, "1) Materials Identified: aluminum");
}

#[actix_rt::test]
async fn surfaces_server_message_on_rejected_request() {
    let body = json!({ "error": { "message": "quota exceeded", "code": 429 } });
    let address = spawn_stub(429, body.to_string()).await;

    let err = client_for(&address).analyze(&sample_image()).await.unwrap_err();

    assert_eq!(err, PipelineError::Analysis("quota exceeded".to_string()));
}

#[actix_rt::test]
async fn falls_back_to_generic_message_when_error_body_is_not_json() {
    let address = spawn_stub(500, "upstream exploded".to_string()).await;

    let err = client_for(&address).analyze(&sample_image()).await.unwrap_err();

    assert_eq!(
        err,
        PipelineError::Analysis("Failed to analyze image with Gemini".to_string())
    );
}

#[actix_rt::test]
async fn success_status_without_text_path_is_malformed() {
    let address = spawn_stub(200, json!({ "candidates": [] }).to_string()).await;

    let err = client_for(&address).analyze(&sample_image()).await.unwrap_err();

    assert_eq!(err, PipelineError::MalformedResponse);
}
