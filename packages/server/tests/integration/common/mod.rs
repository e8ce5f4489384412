use std::io::Cursor;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use tempfile::TempDir;

use ::common::storage::filesystem::FilesystemStorage;
use places_server::config::AppConfig;
use places_server::service::TracingObserver;
use places_server::state::AppState;

pub mod routes {
    pub const PLACES: &str = "/api/v1/places/";

    pub fn place(slug_or_id: &str) -> String {
        format!("/api/v1/places/{slug_or_id}/")
    }

    pub fn upload_images(slug_or_id: &str) -> String {
        format!("/api/v1/places/{slug_or_id}/upload_images/")
    }

    pub fn update_image_order(slug_or_id: &str) -> String {
        format!("/api/v1/places/{slug_or_id}/update_image_order/")
    }

    pub fn image(slug_or_id: &str, image_id: i64) -> String {
        format!("/api/v1/places/{slug_or_id}/images/{image_id}/")
    }
}

/// A running test server backed by its own SQLite file and media directory.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub media_root: PathBuf,
    // Dropped last; removes the database and stored files.
    _dir: TempDir,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    /// Raw response body as text.
    pub text: String,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let media_root = dir.path().join("media");

        let mut config = AppConfig::defaults().expect("Default config should load");
        config.server.port = 0;
        config.database.url = format!("sqlite://{}?mode=rwc", dir.path().join("places.db").display());
        config.database.max_connections = 1;
        config.storage.root = media_root.display().to_string();

        let db = places_server::database::init_db(&config.database)
            .await
            .expect("Failed to initialize test database");
        let storage = FilesystemStorage::new(media_root.clone(), u64::MAX)
            .await
            .expect("Failed to create media storage");

        let state = AppState {
            db,
            config: Arc::new(config),
            storage: Arc::new(storage),
            observer: Arc::new(TracingObserver),
        };

        let app = places_server::build_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            client: Client::new(),
            media_root,
            _dir: dir,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn put(&self, path: &str, body: &Value) -> TestResponse {
        let res = self
            .client
            .put(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to send PUT request");

        TestResponse::from_response(res).await
    }

    pub async fn patch(&self, path: &str, body: &Value) -> TestResponse {
        let res = self
            .client
            .patch(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to send PATCH request");

        TestResponse::from_response(res).await
    }

    pub async fn delete(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .delete(self.url(path))
            .send()
            .await
            .expect("Failed to send DELETE request");

        TestResponse::from_response(res).await
    }

    /// Post `files` as repeated `images` parts of one multipart form.
    pub async fn upload(&self, path: &str, files: Vec<(&str, Vec<u8>)>) -> TestResponse {
        let form = files.into_iter().fold(Form::new(), |form, (name, bytes)| {
            let part = Part::bytes(bytes)
                .file_name(name.to_string())
                .mime_str("application/octet-stream")
                .expect("Failed to set MIME type");
            form.part("images", part)
        });

        let res = self
            .client
            .post(self.url(path))
            .multipart(form)
            .send()
            .await
            .expect("Failed to send multipart upload request");

        TestResponse::from_response(res).await
    }

    /// Create a place via the API and return its response body.
    pub async fn create_place(&self, body: Value) -> Value {
        let res = self.post(routes::PLACES, &body).await;
        assert_eq!(res.status, 201, "create_place failed: {}", res.text);
        res.body
    }

    /// Upload images to a place and return the created image objects.
    pub async fn upload_ok(&self, slug: &str, files: Vec<(&str, Vec<u8>)>) -> Vec<Value> {
        let res = self.upload(&routes::upload_images(slug), files).await;
        assert_eq!(res.status, 201, "upload failed: {}", res.text);
        res.body.as_array().expect("upload returns an array").clone()
    }

    /// Number of files currently stored under the media root.
    pub fn stored_file_count(&self) -> usize {
        let dir = self.media_root.join("places");
        std::fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
    }
}

impl TestResponse {
    pub async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let text = res.text().await.unwrap_or_default();
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self {
            status,
            text,
            body,
        }
    }
}

/// An RGB JPEG of the given size.
pub fn jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([200, 120, 40]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Jpeg)
        .expect("Failed to encode JPEG");
    out.into_inner()
}

/// A half-transparent PNG of the given size.
pub fn png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, Rgba([10, 200, 90, 128]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png)
        .expect("Failed to encode PNG");
    out.into_inner()
}
