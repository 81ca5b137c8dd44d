use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use serde::Deserialize;
use serde_json::json;
use std::io::Cursor;
use std::path::Path;
use std::process::{Child, Command};
use std::sync::atomic::{AtomicU16, Ordering};
use std::time::Duration;

// Use atomic counter to give each test a unique port
static PORT_COUNTER: AtomicU16 = AtomicU16::new(9500);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(dead_code)]
struct ConvertResponse {
    message: String,
    artifact_url: String,
    page_count: usize,
    warnings: Vec<String>,
    processing_time_ms: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorResponse {
    error_kind: String,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(dead_code)]
struct InfoResponse {
    version: String,
    storage_backend: String,
    page_concurrency: usize,
    download_attempts: u32,
    jpeg_quality: u8,
    max_request_size_bytes: usize,
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct HealthResponse {
    status: String,
    version: String,
}

struct TestServer {
    child: Child,
    port: u16,
    root: tempfile::TempDir,
}

impl TestServer {
    async fn start() -> Self {
        let port = PORT_COUNTER.fetch_add(1, Ordering::SeqCst);
        let root = tempfile::tempdir().expect("Failed to create storage root");

        let child = Command::new(env!("CARGO_BIN_EXE_scan2pdf-server"))
            .args(["--host", "127.0.0.1", "--port", &port.to_string()])
            .arg("--storage-root")
            .arg(root.path())
            .args(["--download-retry-delay-ms", "10"])
            .spawn()
            .expect("Failed to start server");

        let server = Self { child, port, root };
        server.wait_until_ready().await;
        server
    }

    async fn wait_until_ready(&self) {
        let client = reqwest::Client::new();
        for _ in 0..100 {
            if let Ok(response) = client.get(format!("{}/health", self.base_url())).send().await {
                if response.status().is_success() {
                    return;
                }
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        panic!("Server did not become ready on port {}", self.port);
    }

    fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    fn folder(&self, name: &str) -> std::path::PathBuf {
        let path = self.root.path().join(name);
        std::fs::create_dir_all(&path).expect("Failed to create folder");
        path
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
    }
}

fn write_page(path: &Path, format: ImageFormat) {
    let mut img = RgbImage::from_pixel(160, 120, Rgb([30, 30, 30]));
    for y in 20..100 {
        for x in 30..130 {
            img.put_pixel(x, y, Rgb([235, 235, 235]));
        }
    }
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut bytes), format)
        .expect("Failed to encode page");
    std::fs::write(path, bytes).expect("Failed to write page");
}

#[tokio::test]
async fn test_health_endpoint() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();

    let response: HealthResponse = client
        .get(format!("{}/health", server.base_url()))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");

    assert_eq!(response.status, "ok");
    assert_eq!(response.version, env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_info_endpoint() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();

    let info: InfoResponse = client
        .get(format!("{}/info", server.base_url()))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");

    assert_eq!(info.storage_backend, "local");
    assert_eq!(info.download_attempts, 3);
    assert_eq!(info.page_concurrency, 4);
}

#[tokio::test]
async fn test_convert_two_pages() {
    let server = TestServer::start().await;
    let source = server.folder("F1");
    let destination = server.folder("F2");
    write_page(&source.join("scan.1.jpg"), ImageFormat::Jpeg);
    write_page(&source.join("scan.2.png"), ImageFormat::Png);
    write_page(&source.join("other.1.png"), ImageFormat::Png);

    let client = reqwest::Client::new();
    let response = client
        .post(format!("{}/convert", server.base_url()))
        .json(&json!({
            "key": "scan",
            "fileOrder": [1, 2],
            "applyPerspectiveCorrection": true,
            "applyContrastImprovement": true,
            "name": "out.pdf",
            "sourceFolderId": "F1",
            "destinationFolderId": "F2"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let result: ConvertResponse = response.json().await.expect("Failed to parse response");

    assert_eq!(result.page_count, 2);
    assert!(result.artifact_url.starts_with("file://"));
    assert!(result.artifact_url.ends_with("F2/out.pdf"));

    let pdf = lopdf::Document::load(destination.join("out.pdf")).expect("Failed to load PDF");
    assert_eq!(pdf.get_pages().len(), 2);
}

#[tokio::test]
async fn test_missing_parameters() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/convert", server.base_url()))
        .json(&json!({ "key": "scan", "fileOrder": [1] }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    let error: ErrorResponse = response.json().await.expect("Failed to parse response");
    assert_eq!(error.error_kind, "MISSING_PARAMETERS");
    assert!(error.message.contains("sourceFolderId"));
}

#[tokio::test]
async fn test_no_matching_pages() {
    let server = TestServer::start().await;
    let source = server.folder("F1");
    server.folder("F2");
    write_page(&source.join("unrelated.1.png"), ImageFormat::Png);

    let client = reqwest::Client::new();
    let response = client
        .post(format!("{}/convert", server.base_url()))
        .json(&json!({
            "key": "scan",
            "fileOrder": [1, 2],
            "name": "out.pdf",
            "sourceFolderId": "F1",
            "destinationFolderId": "F2"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
    let error: ErrorResponse = response.json().await.expect("Failed to parse response");
    assert_eq!(error.error_kind, "EMPTY_RESULT");
}
