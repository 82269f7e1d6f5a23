//! Common test utilities for E2E tests
#![allow(dead_code)]

use lagoon::{config, AppState};
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Password used for every test account
pub const TEST_PASSWORD: &str = "correct-horse-battery";

/// Test server instance
pub struct TestServer {
    pub addr: String,
    pub state: AppState,
    pub _temp_dir: TempDir,
    pub client: reqwest::Client,
}

impl TestServer {
    /// Create a new test server instance
    pub async fn new() -> Self {
        // Temporary directory for the test database and uploads
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let uploads_dir = temp_dir.path().join("uploads");

        let config = config::AppConfig {
            server: config::ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0, // Let OS assign port
                domain: "test.example.com".to_string(),
                protocol: "http".to_string(),
            },
            database: config::DatabaseConfig { path: db_path },
            auth: config::AuthConfig {
                token_secret: "test-secret-key-32-bytes-long!!!".to_string(),
                token_ttl_seconds: 3600,
            },
            storage: config::StorageConfig {
                media: config::MediaStorageConfig {
                    root: uploads_dir,
                    public_path: "/uploads".to_string(),
                },
            },
            logging: config::LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        };

        // Initialize app state
        let state = AppState::new(config).await.unwrap();

        // Create HTTP client
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap();

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let addr_str = format!("http://{}", addr);

        // Build router and spawn server in background
        let app = lagoon::build_router(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait a bit for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;

        Self {
            addr: addr_str,
            state,
            _temp_dir: temp_dir,
            client,
        }
    }

    /// Get base URL for API requests
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    /// Register an account through the API
    pub async fn register(&self, username: &str, role: Option<&str>) {
        let mut body = serde_json::json!({
            "email": format!("{}@example.com", username),
            "name": username,
            "username": username,
            "password": TEST_PASSWORD,
        });
        if let Some(role) = role {
            body["role"] = serde_json::Value::String(role.to_string());
        }

        let response = self
            .client
            .post(self.url("/users/register"))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 201);
    }

    /// Log in and return a bearer token
    pub async fn login(&self, username: &str) -> String {
        let response = self
            .client
            .post(self.url("/users/login"))
            .json(&serde_json::json!({
                "username": username,
                "password": TEST_PASSWORD,
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);

        let json: serde_json::Value = response.json().await.unwrap();
        json["token"].as_str().unwrap().to_string()
    }

    /// Register + login in one step
    pub async fn register_and_login(&self, username: &str, role: Option<&str>) -> String {
        self.register(username, role).await;
        self.login(username).await
    }

    /// Create a post through the API, returning its id
    pub async fn create_post(&self, token: &str, content: &str) -> String {
        let form = reqwest::multipart::Form::new().text("content", content.to_string());

        let response = self
            .client
            .post(self.url("/posts"))
            .header("Authorization", format!("Bearer {}", token))
            .multipart(form)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 201);

        let json: serde_json::Value = response.json().await.unwrap();
        json["post"]["id"].as_str().unwrap().to_string()
    }

    /// Add a comment through the API, returning its id
    pub async fn add_comment(&self, token: &str, post_id: &str, text: &str) -> String {
        let response = self
            .client
            .post(self.url(&format!("/posts/{}/comments", post_id)))
            .header("Authorization", format!("Bearer {}", token))
            .json(&serde_json::json!({ "text": text }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);

        let json: serde_json::Value = response.json().await.unwrap();
        json["post"]["comments"]
            .as_array()
            .unwrap()
            .iter()
            .find(|comment| comment["text"] == text)
            .unwrap()["id"]
            .as_str()
            .unwrap()
            .to_string()
    }

    /// Fetch a post as an anonymous caller
    pub async fn get_post(&self, post_id: &str) -> reqwest::Response {
        self.client
            .get(self.url(&format!("/posts/{}", post_id)))
            .send()
            .await
            .unwrap()
    }

    /// File names currently present in the uploads directory
    pub fn uploads_on_disk(&self) -> Vec<String> {
        let root = &self.state.config.storage.media.root;
        std::fs::read_dir(root)
            .map(|entries| {
                entries
                    .filter_map(|entry| entry.ok())
                    .map(|entry| entry.file_name().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Fetch a post with a bearer token
    pub async fn get_post_as(&self, token: &str, post_id: &str) -> reqwest::Response {
        self.client
            .get(self.url(&format!("/posts/{}", post_id)))
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await
            .unwrap()
    }
}

/// A fake PNG upload part
pub fn png_part(name: &str) -> reqwest::multipart::Part {
    reqwest::multipart::Part::bytes(vec![0x89, 0x50, 0x4E, 0x47, 0, 0, 0, 0])
        .file_name(name.to_string())
        .mime_str("image/png")
        .unwrap()
}
