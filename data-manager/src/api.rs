//! REST endpoints: one GET/PUT pair per content category
//!
//! Each request goes straight to the data file store: GET decodes the
//! category's module, PUT validates the body, encodes it and replaces the
//! file after a backup. No state is shared between requests beyond the
//! filesystem and the store's per-category write locks.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header::CONTENT_TYPE, Method},
    response::Json,
    routing::get,
    Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::category::{Category, Shape, PERSONAL_REQUIRED_FIELDS};
use crate::codec;
use crate::error::DataError;
use crate::store::DataFileStore;

/// State shared by all handlers
#[derive(Clone)]
pub struct AppState {
    store: Arc<DataFileStore>,
}

impl AppState {
    pub fn new(store: DataFileStore) -> Self {
        Self {
            store: Arc::new(store),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::PUT, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE]);

    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/categories", get(list_categories))
        .route("/api/backups/:category", get(list_backups))
        .route("/api/:category", get(get_collection).put(put_collection))
        .layer(cors)
        .with_state(state)
}

// --- API Types ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    message: &'static str,
}

#[derive(Serialize)]
struct CategorySummary {
    id: &'static str,
    name: &'static str,
    path: String,
    description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    count: Option<usize>,
}

#[derive(Serialize)]
struct BackupListResponse {
    category: &'static str,
    backups: Vec<String>,
}

// --- Handlers ---

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK",
        message: "Data Manager API is running",
    })
}

/// Decode and return the whole collection of one category
async fn get_collection(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Value>, DataError> {
    let category: Category = slug.parse()?;
    load(&state, category)
        .await
        .map(Json)
        .inspect_err(|e| warn!("GET /api/{slug} failed: {e}"))
}

/// Replace the whole collection of one category
async fn put_collection(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, DataError> {
    let category: Category = slug.parse()?;
    let Json(body) = body.map_err(|rejection| {
        warn!("PUT /api/{slug} rejected: {rejection}");
        DataError::Validation(format!("Invalid JSON body: {}", rejection.body_text()))
    })?;
    validate(category, &body).inspect_err(|e| warn!("PUT /api/{slug} rejected: {e}"))?;

    let text = codec::encode_category(&body, category);
    let backup = state
        .store
        .write_collection(category, &text)
        .await
        .inspect_err(|e| warn!("PUT /api/{slug} failed: {e}"))?;

    info!("Saved {category} (previous version in {backup})");
    Ok(Json(json!({ "success": true, "data": body })))
}

/// Dashboard listing with per-category element counts
async fn list_categories(State(state): State<AppState>) -> Json<Vec<CategorySummary>> {
    let mut summaries = Vec::with_capacity(Category::ALL.len());
    for category in Category::ALL {
        let count = match category.shape() {
            Shape::Record => None,
            Shape::List => match load(&state, category).await {
                Ok(value) => value.as_array().map(Vec::len),
                Err(e) => {
                    warn!("Cannot count {category}: {e}");
                    None
                }
            },
        };
        summaries.push(CategorySummary {
            id: category.slug(),
            name: category.label(),
            path: format!("/{}", category.slug()),
            description: category.description(),
            count,
        });
    }
    Json(summaries)
}

async fn list_backups(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<BackupListResponse>, DataError> {
    let category: Category = slug.parse()?;
    let backups = state.store.backups().list(category.base_name()).await?;
    Ok(Json(BackupListResponse {
        category: category.slug(),
        backups,
    }))
}

async fn load(state: &AppState, category: Category) -> Result<Value, DataError> {
    let text = state.store.read_collection(category).await?;
    codec::decode_category(&text, category)
}

/// Presence checks on a replacement collection
fn validate(category: Category, body: &Value) -> Result<(), DataError> {
    match category.shape() {
        Shape::List => {
            if !body.is_array() {
                return Err(DataError::Validation(format!(
                    "{} data must be an array",
                    category.label()
                )));
            }
        }
        Shape::Record => {
            let Some(record) = body.as_object() else {
                return Err(DataError::Validation(format!(
                    "{} data must be an object",
                    category.label()
                )));
            };
            if let Some(field) = PERSONAL_REQUIRED_FIELDS
                .iter()
                .find(|f| !is_truthy(record.get(**f)))
            {
                return Err(DataError::Validation(format!(
                    "Missing required field: {field}"
                )));
            }
        }
    }
    Ok(())
}

/// Absent, null, false, zero and empty strings count as missing
fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}
