use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Method, Request, Response, StatusCode},
    Router,
};
use sea_orm::{ConnectionTrait, DatabaseBackend as DbBackend, Statement};
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;

use autoshop_api::{
    config::AppConfig,
    db::{self, DbConfig},
    events::{self, EventSender},
    AppState,
};

/// Test harness backed by an in-memory SQLite database with the workshop
/// schema created up front.
pub struct TestApp {
    router: Router,
    pub db: Arc<db::DbPool>,
    _event_task: tokio::task::JoinHandle<()>,
}

const SCHEMA: &[&str] = &[
    "CREATE TABLE customers (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        customer_name TEXT NOT NULL,
        phone_number TEXT
    );",
    "CREATE TABLE receptions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        customer_id INTEGER NOT NULL,
        reception_number TEXT NOT NULL,
        reception_date TEXT NOT NULL,
        car_status TEXT NOT NULL,
        car_name TEXT NOT NULL,
        chassis_number TEXT
    );",
    "CREATE TABLE orders (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        customer_id INTEGER NOT NULL,
        reception_id INTEGER NOT NULL,
        order_number TEXT NOT NULL,
        piece_name TEXT,
        part_id TEXT,
        number_of_pieces INTEGER,
        order_channel TEXT NOT NULL,
        market_name TEXT,
        market_phone TEXT,
        order_date TEXT NOT NULL,
        delivery_date TEXT,
        estimated_arrival_days INTEGER,
        estimated_arrival_date TEXT,
        status TEXT NOT NULL,
        final_order_number TEXT,
        description TEXT,
        all_description TEXT,
        car_name TEXT
    );",
    "CREATE TABLE lost_orders (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        part_id TEXT,
        piece_name TEXT NOT NULL,
        car_name TEXT NOT NULL,
        lost_description TEXT NOT NULL,
        count TEXT NOT NULL,
        lost_date TEXT NOT NULL,
        lost_time TEXT NOT NULL,
        status TEXT NOT NULL,
        dealer_id INTEGER
    );",
    "CREATE TABLE audit_logs (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL,
        action TEXT NOT NULL,
        message TEXT NOT NULL,
        created_at TEXT NOT NULL
    );",
];

impl TestApp {
    pub async fn new() -> Self {
        let db_config = DbConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
            ..DbConfig::default()
        };
        let pool = db::establish_connection_with_config(&db_config)
            .await
            .expect("failed to open test database");

        for sql in SCHEMA {
            pool.execute(Statement::from_string(DbBackend::Sqlite, sql.to_string()))
                .await
                .expect("failed to create schema");
        }

        let db_arc = Arc::new(pool);

        let (event_tx, event_rx) = mpsc::channel(64);
        let event_sender = Arc::new(EventSender::new(event_tx));
        let event_task = tokio::spawn(events::process_events(event_rx));

        let cfg = AppConfig {
            database_url: db_config.url.clone(),
            environment: "test".to_string(),
            ..AppConfig::default()
        };

        let state = AppState::new(db_arc.clone(), cfg, Some(event_sender));
        let router = autoshop_api::app(state);

        Self {
            router,
            db: db_arc,
            _event_task: event_task,
        }
    }

    pub async fn seed_customer(&self, name: &str) -> i32 {
        let result = self
            .db
            .execute(Statement::from_sql_and_values(
                DbBackend::Sqlite,
                "INSERT INTO customers (customer_name) VALUES (?)",
                [name.into()],
            ))
            .await
            .expect("failed to seed customer");
        result.last_insert_id() as i32
    }

    /// Sends a JSON request carrying the test user's auth headers.
    pub async fn request(&self, method: Method, uri: &str, json: &Value) -> Response<Body> {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .header("x-user-id", "7")
            .header("x-dealer-id", "3")
            .body(Body::from(json.to_string()))
            .expect("failed to build request");

        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("request failed")
    }

    /// Same as `request` but with no auth headers at all.
    pub async fn request_without_auth(
        &self,
        method: Method,
        uri: &str,
        json: &Value,
    ) -> Response<Body> {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .expect("failed to build request");

        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("request failed")
    }

    pub async fn json_body(response: Response<Body>) -> Value {
        let bytes = body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("failed to read body");
        serde_json::from_slice(&bytes).expect("body is not valid json")
    }

    pub async fn expect_json(
        &self,
        method: Method,
        uri: &str,
        json: &Value,
        status: StatusCode,
    ) -> Value {
        let response = self.request(method, uri, json).await;
        assert_eq!(response.status(), status);
        Self::json_body(response).await
    }
}
