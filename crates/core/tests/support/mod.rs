#![allow(dead_code)]

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Map, Value};
use tokio::{
    net::TcpListener,
    sync::{oneshot, Mutex},
};
use webshell_core::{RemoteSettings, TableNames};

pub const ANON_KEY: &str = "test-anon-key";

type Row = Map<String, Value>;
type Params = Vec<(String, String)>;

/// In-memory rows keyed by table, plus a log of what was asked for.
#[derive(Default)]
pub struct Tables {
    rows: HashMap<String, Vec<Row>>,
    next_id: i64,
    failing: bool,
    requests: Vec<String>,
}

impl Tables {
    fn assign_id(&mut self, row: &mut Row) -> i64 {
        self.next_id += 1;
        let id = row
            .get("id")
            .and_then(Value::as_i64)
            .unwrap_or(self.next_id);
        row.insert("id".into(), json!(id));
        row.entry("created_at")
            .or_insert_with(|| json!(format!("2026-01-01T00:00:{:02}.000Z", self.next_id % 60)));
        id
    }
}

#[derive(Clone)]
struct StubState {
    tables: Arc<Mutex<Tables>>,
}

/// A PostgREST look-alike serving `/rest/v1/{table}` on a random local port.
pub struct PostgrestStub {
    pub base_url: String,
    tables: Arc<Mutex<Tables>>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl Drop for PostgrestStub {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

impl PostgrestStub {
    pub async fn spawn() -> Self {
        let tables = Arc::new(Mutex::new(Tables::default()));
        let app = Router::new()
            .route(
                "/rest/v1/:table",
                get(select).post(insert).patch(update).delete(remove),
            )
            .with_state(StubState {
                tables: tables.clone(),
            });

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        tokio::spawn(async move {
            let server = axum::serve(listener, app).with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            });
            let _ = server.await;
        });

        Self {
            base_url: format!("http://{addr}"),
            tables,
            shutdown: Some(shutdown_tx),
        }
    }

    pub fn settings(&self) -> RemoteSettings {
        RemoteSettings {
            url: self.base_url.clone(),
            anon_key: ANON_KEY.into(),
            tables: TableNames::default(),
        }
    }

    pub async fn seed(&self, table: &str, row: Value) -> i64 {
        let Value::Object(mut row) = row else {
            panic!("seed rows must be objects");
        };
        let mut tables = self.tables.lock().await;
        let id = tables.assign_id(&mut row);
        tables.rows.entry(table.into()).or_default().push(row);
        id
    }

    pub async fn rows(&self, table: &str) -> Vec<Row> {
        let tables = self.tables.lock().await;
        tables.rows.get(table).cloned().unwrap_or_default()
    }

    pub async fn set_failing(&self, failing: bool) {
        self.tables.lock().await.failing = failing;
    }

    pub async fn requests(&self) -> Vec<String> {
        self.tables.lock().await.requests.clone()
    }
}

fn cell_text(cell: Option<&Value>) -> String {
    match cell {
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
        None => "null".into(),
    }
}

fn param<'a>(params: &'a Params, name: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}

fn matches(row: &Row, params: &Params) -> bool {
    params
        .iter()
        .filter(|(key, _)| !matches!(key.as_str(), "select" | "order" | "limit"))
        .all(|(key, filter)| match filter.strip_prefix("eq.") {
            Some(expected) => cell_text(row.get(key)) == expected,
            None => false,
        })
}

async fn gate(state: &StubState, headers: &HeaderMap, request: String) -> Option<Response> {
    let mut tables = state.tables.lock().await;
    tables.requests.push(request);

    if tables.failing {
        return Some(
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({"message": "unavailable"})),
            )
                .into_response(),
        );
    }

    let bearer = format!("Bearer {ANON_KEY}");
    let authorized = headers.get("apikey").is_some_and(|key| key == ANON_KEY)
        && headers
            .get("authorization")
            .is_some_and(|auth| auth == bearer.as_str());
    if !authorized {
        return Some(
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({"message": "Invalid API key"})),
            )
                .into_response(),
        );
    }

    None
}

async fn select(
    State(state): State<StubState>,
    Path(table): Path<String>,
    headers: HeaderMap,
    Query(params): Query<Params>,
) -> Response {
    let columns = param(&params, "select").unwrap_or("*").to_owned();
    if let Some(denied) = gate(&state, &headers, format!("GET {table} select={columns}")).await {
        return denied;
    }

    let tables = state.tables.lock().await;
    let mut rows: Vec<Row> = tables
        .rows
        .get(&table)
        .into_iter()
        .flatten()
        .filter(|row| matches(row, &params))
        .cloned()
        .collect();

    if param(&params, "order") == Some("created_at.desc") {
        rows.sort_by_key(|row| {
            std::cmp::Reverse((
                cell_text(row.get("created_at")),
                row.get("id").and_then(Value::as_i64),
            ))
        });
    }
    if let Some(limit) = param(&params, "limit").and_then(|l| l.parse().ok()) {
        rows.truncate(limit);
    }
    if columns != "*" {
        let keep: Vec<&str> = columns.split(',').collect();
        for row in &mut rows {
            row.retain(|key, _| keep.contains(&key.as_str()));
        }
    }

    Json(rows).into_response()
}

async fn insert(
    State(state): State<StubState>,
    Path(table): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Some(denied) = gate(&state, &headers, format!("POST {table}")).await {
        return denied;
    }

    let rows = match body {
        Value::Array(rows) => rows,
        row => vec![row],
    };

    let mut tables = state.tables.lock().await;
    for row in rows {
        let Value::Object(mut row) = row else {
            return StatusCode::BAD_REQUEST.into_response();
        };
        tables.assign_id(&mut row);
        tables.rows.entry(table.clone()).or_default().push(row);
    }

    StatusCode::CREATED.into_response()
}

async fn update(
    State(state): State<StubState>,
    Path(table): Path<String>,
    headers: HeaderMap,
    Query(params): Query<Params>,
    Json(changes): Json<Row>,
) -> Response {
    if let Some(denied) = gate(&state, &headers, format!("PATCH {table}")).await {
        return denied;
    }

    let mut tables = state.tables.lock().await;
    for row in tables.rows.entry(table).or_default() {
        if matches(row, &params) {
            row.extend(changes.clone());
        }
    }

    StatusCode::NO_CONTENT.into_response()
}

async fn remove(
    State(state): State<StubState>,
    Path(table): Path<String>,
    headers: HeaderMap,
    Query(params): Query<Params>,
) -> Response {
    if let Some(denied) = gate(&state, &headers, format!("DELETE {table}")).await {
        return denied;
    }

    let mut tables = state.tables.lock().await;
    tables
        .rows
        .entry(table)
        .or_default()
        .retain(|row| !matches(row, &params));

    StatusCode::NO_CONTENT.into_response()
}
