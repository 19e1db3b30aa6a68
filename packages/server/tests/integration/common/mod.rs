use std::net::SocketAddr;
use std::sync::Arc;

use ::common::storage::filesystem::FilesystemMediaStore;
use reqwest::header::HeaderMap;
use reqwest::{Client, redirect};
use sea_orm::DatabaseConnection;
use serde_json::{Value, json};
use tempfile::TempDir;

use inventory_server::config::{
    AppConfig, AuthConfig, CorsConfig, DashboardConfig, DatabaseConfig, ServerConfig,
    StorageConfig,
};
use inventory_server::state::AppState;

pub const TEST_PASSWORD: &str = "rye-bread-42";
pub const JWT_SECRET: &str = "test-secret-for-integration-tests";

pub mod routes {
    pub const REGISTER: &str = "/api/v1/auth/register";
    pub const LOGIN: &str = "/api/v1/auth/login";
    pub const LOGOUT: &str = "/api/v1/auth/logout";
    pub const ME: &str = "/api/v1/auth/me";
    pub const DASHBOARD: &str = "/api/v1/dashboard";
    pub const CATEGORIES: &str = "/api/v1/categories";
    pub const ITEMS: &str = "/api/v1/items";
    pub const PRODUCTS: &str = "/api/v1/products";
    pub const PRODUCTIONS: &str = "/api/v1/productions";

    pub fn category(slug: &str) -> String {
        format!("/api/v1/categories/{slug}")
    }

    pub fn category_thumbnail(slug: &str) -> String {
        format!("/api/v1/categories/{slug}/thumbnail")
    }

    pub fn item(uid: &str) -> String {
        format!("/api/v1/items/{uid}")
    }

    pub fn item_thumbnail(uid: &str) -> String {
        format!("/api/v1/items/{uid}/thumbnail")
    }

    pub fn product(uid: &str) -> String {
        format!("/api/v1/products/{uid}")
    }

    pub fn product_components(uid: &str) -> String {
        format!("/api/v1/products/{uid}/components")
    }

    pub fn component(uid: &str) -> String {
        format!("/api/v1/components/{uid}")
    }

    pub fn production(uid: &str) -> String {
        format!("/api/v1/productions/{uid}")
    }

    pub fn production_details(uid: &str) -> String {
        format!("/api/v1/productions/{uid}/details")
    }

    pub fn production_detail(uid: &str) -> String {
        format!("/api/v1/production-details/{uid}")
    }
}

/// A running test server backed by a throwaway SQLite database and media directory.
pub struct TestApp {
    pub addr: SocketAddr,
    /// Client with a cookie store; holds the session once logged in.
    pub client: Client,
    pub db: DatabaseConnection,
    _dir: TempDir,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    pub headers: HeaderMap,
    /// Raw response body as text.
    pub text: String,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
}

fn new_client() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(redirect::Policy::none())
        .build()
        .expect("Failed to build HTTP client")
}

impl TestApp {
    pub async fn spawn() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let db_url = format!("sqlite://{}?mode=rwc", dir.path().join("test.db").display());

        let db = inventory_server::database::init_db(&db_url)
            .await
            .expect("Failed to initialize test database");

        let media_dir = dir.path().join("media");
        let max_upload_bytes = 256 * 1024;
        let media = FilesystemMediaStore::new(media_dir.clone(), max_upload_bytes)
            .await
            .expect("Failed to create media store");

        let app_config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors: CorsConfig {
                    allow_origins: vec![],
                    max_age: 3600,
                },
            },
            database: DatabaseConfig { url: db_url },
            auth: AuthConfig {
                jwt_secret: JWT_SECRET.to_string(),
                session_ttl_hours: 1,
                cookie_secure: false,
            },
            storage: StorageConfig {
                media_dir,
                max_upload_bytes,
            },
            dashboard: DashboardConfig { recent_limit: 3 },
        };

        let state = AppState {
            db: db.clone(),
            config: app_config,
            media: Arc::new(media),
        };

        let app = inventory_server::build_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            client: new_client(),
            db,
            _dir: dir,
        }
    }

    /// A spawned app whose client already holds a session for `baker`.
    pub async fn spawn_logged_in() -> Self {
        let app = Self::spawn().await;
        app.register("baker").await;
        let res = app.login("baker", TEST_PASSWORD).await;
        assert_eq!(res.status, 200, "Login failed: {}", res.text);
        app
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// A client with an empty cookie store, i.e. no session.
    pub fn anonymous_client(&self) -> Client {
        new_client()
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

    pub async fn get(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn get_with(&self, client: &Client, path: &str) -> TestResponse {
        let res = client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn get_with_token(&self, path: &str, token: &str) -> TestResponse {
        let res = self
            .anonymous_client()
            .get(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await
            .expect("Failed to send GET request");

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

    pub async fn put_file(&self, path: &str, file_name: &str, file_bytes: Vec<u8>) -> TestResponse {
        let part = reqwest::multipart::Part::bytes(file_bytes)
            .file_name(file_name.to_string())
            .mime_str("image/png")
            .expect("Failed to set MIME type");
        let form = reqwest::multipart::Form::new().part("file", part);

        let res = self
            .client
            .put(self.url(path))
            .multipart(form)
            .send()
            .await
            .expect("Failed to send multipart upload request");

        TestResponse::from_response(res).await
    }

    pub async fn register(&self, username: &str) -> TestResponse {
        let res = self
            .post(
                routes::REGISTER,
                &json!({
                    "username": username,
                    "password": TEST_PASSWORD,
                    "confirm_password": TEST_PASSWORD,
                }),
            )
            .await;
        assert_eq!(res.status, 201, "Registration failed: {}", res.text);
        res
    }

    pub async fn login(&self, username: &str, password: &str) -> TestResponse {
        self.post(
            routes::LOGIN,
            &json!({"username": username, "password": password}),
        )
        .await
    }

    /// Create a category via the API and return its response body.
    pub async fn create_category(&self, name: &str, slug: &str) -> Value {
        let res = self
            .post(routes::CATEGORIES, &json!({"name": name, "slug": slug}))
            .await;
        assert_eq!(res.status, 201, "create_category failed: {}", res.text);
        res.body
    }

    /// Create an item in `category` via the API and return its `uid`.
    pub async fn create_item(&self, name: &str, slug: &str, category: &str) -> String {
        let res = self
            .post(
                routes::ITEMS,
                &json!({
                    "name": name,
                    "slug": slug,
                    "price": "2.50",
                    "amount": "10.00",
                    "measurement_unit": "kg",
                    "category": category,
                }),
            )
            .await;
        assert_eq!(res.status, 201, "create_item failed: {}", res.text);
        res.uid()
    }

    /// Create a product in `category` via the API and return its `uid`.
    pub async fn create_product(&self, name: &str, slug: &str, category: &str) -> String {
        let res = self
            .post(
                routes::PRODUCTS,
                &json!({
                    "name": name,
                    "slug": slug,
                    "price": "4.20",
                    "units": 5,
                    "category": category,
                }),
            )
            .await;
        assert_eq!(res.status, 201, "create_product failed: {}", res.text);
        res.uid()
    }

    /// Add `item` to `product`'s composition and return the component `uid`.
    pub async fn add_component(&self, product: &str, item: &str, amount: &str) -> String {
        let res = self
            .post(
                &routes::product_components(product),
                &json!({"item": item, "amount": amount}),
            )
            .await;
        assert_eq!(res.status, 201, "add_component failed: {}", res.text);
        res.uid()
    }

    /// Record a production run with one line per `(product, units)` and return it.
    pub async fn create_production(&self, lines: &[(&str, i64)]) -> Value {
        let details: Vec<Value> = lines
            .iter()
            .map(|(product, units)| json!({"product": product, "produced_units": units}))
            .collect();
        let res = self
            .post(routes::PRODUCTIONS, &json!({"details": details}))
            .await;
        assert_eq!(res.status, 201, "create_production failed: {}", res.text);
        res.body
    }
}

impl TestResponse {
    pub async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let headers = res.headers().clone();
        let text = res.text().await.unwrap_or_default();
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self {
            status,
            headers,
            text,
            body,
        }
    }

    pub fn uid(&self) -> String {
        self.body["uid"]
            .as_str()
            .expect("response body should contain 'uid'")
            .to_string()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}
