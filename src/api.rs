// 🌐 REST API over the expense store (feature "server")
//
// All JSON responses use the `{success, data, error?}` envelope. The store
// is shared behind a Mutex, which serializes requests within the process.

use crate::entities::{find_currency, Theme, CURRENCY_OPTIONS};
use crate::error::StoreError;
use crate::expense::{Expense, NewExpense};
use crate::export::{json_export_filename, DEFAULT_CSV_FILENAME};
use crate::reports::search;
use crate::storage::KeyValueStore;
use crate::store::ExpenseStore;
use crate::temporal::Period;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};

/// Shared application state
pub struct AppState<S: KeyValueStore> {
    store: Arc<Mutex<ExpenseStore<S>>>,
}

impl<S: KeyValueStore> Clone for AppState<S> {
    fn clone(&self) -> Self {
        AppState {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: KeyValueStore> AppState<S> {
    pub fn new(store: ExpenseStore<S>) -> Self {
        AppState {
            store: Arc::new(Mutex::new(store)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, ExpenseStore<S>>, ApiError> {
        self.store
            .lock()
            .map_err(|_| ApiError::Internal("store lock poisoned".to_string()))
    }
}

// ============================================================================
// Response envelope & errors
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::BadRequest(msg) => msg.clone(),
            ApiError::NotFound(msg) => format!("{msg} not found"),
            ApiError::Internal(msg) => msg.clone(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        if err.is_user_error() {
            ApiError::BadRequest(err.to_string())
        } else {
            tracing::error!(error = %err, "store operation failed");
            ApiError::Internal(err.to_string())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(ApiResponse::<()>::error(self.message()))).into_response()
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::ok(data)))
}

// ============================================================================
// Request types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    period: Option<String>,
    search: Option<String>,
    category: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PeriodQuery {
    period: Option<String>,
}

impl PeriodQuery {
    fn period_or(&self, fallback: Period) -> Period {
        self.period.as_deref().map_or(fallback, Period::parse_or_all)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CurrencySetting {
    currency: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ThemeSetting {
    theme: Theme,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/health
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/expenses?period=&search=&category=
async fn list_expenses<S: KeyValueStore + 'static>(
    State(state): State<AppState<S>>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Vec<Expense>> {
    let period = query.period.as_deref().map_or(Period::All, Period::parse_or_all);
    let expenses = state.lock()?.by_period(period)?;

    ok(search(
        &expenses,
        query.search.as_deref().unwrap_or(""),
        query.category.as_deref(),
    ))
}

/// POST /api/expenses
async fn create_expense<S: KeyValueStore + 'static>(
    State(state): State<AppState<S>>,
    Json(new_expense): Json<NewExpense>,
) -> Result<(StatusCode, Json<ApiResponse<Expense>>), ApiError> {
    new_expense.validate()?;
    let expense = state.lock()?.add(new_expense)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(expense))))
}

/// GET /api/expenses/:id
async fn get_expense<S: KeyValueStore + 'static>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> ApiResult<Expense> {
    match state.lock()?.get(&id)? {
        Some(expense) => ok(expense),
        None => Err(ApiError::NotFound(format!("Expense {id}"))),
    }
}

/// PUT /api/expenses/:id - full replacement; an omitted date keeps the old one
async fn update_expense<S: KeyValueStore + 'static>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    Json(changes): Json<NewExpense>,
) -> ApiResult<Expense> {
    changes.validate()?;
    let store = state.lock()?;

    let Some(existing) = store.get(&id)? else {
        return Err(ApiError::NotFound(format!("Expense {id}")));
    };

    let updated = Expense {
        id: existing.id,
        amount: changes.amount,
        category: changes.category,
        description: changes.description,
        date: changes.date.unwrap_or(existing.date),
    };
    store.update(updated.clone())?;
    ok(updated)
}

/// DELETE /api/expenses/:id - returns the remaining collection
async fn delete_expense<S: KeyValueStore + 'static>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> ApiResult<Vec<Expense>> {
    ok(state.lock()?.remove(&id)?)
}

/// GET /api/summary
async fn get_summary<S: KeyValueStore + 'static>(
    State(state): State<AppState<S>>,
) -> ApiResult<crate::reports::Summary> {
    ok(state.lock()?.summary_at(&Local::now())?)
}

/// GET /api/stats?period=
async fn get_stats<S: KeyValueStore + 'static>(
    State(state): State<AppState<S>>,
    Query(query): Query<PeriodQuery>,
) -> ApiResult<crate::reports::Statistics> {
    let period = query.period_or(Period::Month);
    ok(state.lock()?.statistics_at(period, &Local::now())?)
}

/// GET /api/charts/pie?period=
async fn get_pie_chart<S: KeyValueStore + 'static>(
    State(state): State<AppState<S>>,
    Query(query): Query<PeriodQuery>,
) -> ApiResult<Vec<crate::reports::PieSlice>> {
    let period = query.period_or(Period::Month);
    ok(state.lock()?.pie_chart_at(period, &Local::now())?)
}

/// GET /api/charts/daily?period=
async fn get_daily_chart<S: KeyValueStore + 'static>(
    State(state): State<AppState<S>>,
    Query(query): Query<PeriodQuery>,
) -> ApiResult<Vec<crate::reports::DailyPoint>> {
    let period = query.period_or(Period::Month);
    ok(state.lock()?.daily_chart_at(period, &Local::now())?)
}

/// GET /api/export/json - download of the full collection
async fn export_json<S: KeyValueStore + 'static>(
    State(state): State<AppState<S>>,
) -> Result<Response, ApiError> {
    let body = state.lock()?.export_json()?;
    let filename = json_export_filename(Local::now().date_naive());
    Ok(attachment("application/json", &filename, body))
}

/// GET /api/export/csv?period= - 204 when there is nothing to export
async fn export_csv<S: KeyValueStore + 'static>(
    State(state): State<AppState<S>>,
    Query(query): Query<PeriodQuery>,
) -> Result<Response, ApiError> {
    let store = state.lock()?;
    let expenses = store.by_period(query.period_or(Period::All))?;

    match store.export_csv(&expenses)? {
        Some(csv) => Ok(attachment("text/csv;charset=utf-8", DEFAULT_CSV_FILENAME, csv)),
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

fn attachment(content_type: &str, filename: &str, body: String) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
        .into_response()
}

/// POST /api/import - raw JSON export file as the body
async fn import_json<S: KeyValueStore + 'static>(
    State(state): State<AppState<S>>,
    body: String,
) -> ApiResult<usize> {
    ok(state.lock()?.import_json(&body)?)
}

/// POST /api/clear
async fn clear_data<S: KeyValueStore + 'static>(State(state): State<AppState<S>>) -> ApiResult<()> {
    state.lock()?.clear()?;
    ok(())
}

/// GET /api/settings/currency
async fn get_currency<S: KeyValueStore + 'static>(
    State(state): State<AppState<S>>,
) -> ApiResult<CurrencySetting> {
    ok(CurrencySetting {
        currency: state.lock()?.currency()?,
    })
}

/// PUT /api/settings/currency
async fn put_currency<S: KeyValueStore + 'static>(
    State(state): State<AppState<S>>,
    Json(setting): Json<CurrencySetting>,
) -> ApiResult<CurrencySetting> {
    if find_currency(&setting.currency).is_none() {
        let supported: Vec<&str> = CURRENCY_OPTIONS.iter().map(|c| c.code).collect();
        return Err(ApiError::BadRequest(format!(
            "Unsupported currency {}; expected one of {}",
            setting.currency,
            supported.join(", ")
        )));
    }
    let currency = state.lock()?.set_currency(&setting.currency)?;
    ok(CurrencySetting { currency })
}

/// GET /api/settings/theme
async fn get_theme<S: KeyValueStore + 'static>(
    State(state): State<AppState<S>>,
) -> ApiResult<ThemeSetting> {
    ok(ThemeSetting {
        theme: state.lock()?.theme()?,
    })
}

/// PUT /api/settings/theme
async fn put_theme<S: KeyValueStore + 'static>(
    State(state): State<AppState<S>>,
    Json(setting): Json<ThemeSetting>,
) -> ApiResult<ThemeSetting> {
    let theme = state.lock()?.set_theme(setting.theme)?;
    ok(ThemeSetting { theme })
}

/// POST /api/settings/theme/toggle
async fn toggle_theme<S: KeyValueStore + 'static>(
    State(state): State<AppState<S>>,
) -> ApiResult<ThemeSetting> {
    let theme = state.lock()?.toggle_theme()?;
    ok(ThemeSetting { theme })
}

// ============================================================================
// Router
// ============================================================================

/// API routes, to be nested under `/api`
pub fn router<S: KeyValueStore + 'static>(state: AppState<S>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/expenses", get(list_expenses::<S>).post(create_expense::<S>))
        .route(
            "/expenses/:id",
            get(get_expense::<S>)
                .put(update_expense::<S>)
                .delete(delete_expense::<S>),
        )
        .route("/summary", get(get_summary::<S>))
        .route("/stats", get(get_stats::<S>))
        .route("/charts/pie", get(get_pie_chart::<S>))
        .route("/charts/daily", get(get_daily_chart::<S>))
        .route("/export/json", get(export_json::<S>))
        .route("/export/csv", get(export_csv::<S>))
        .route("/import", post(import_json::<S>))
        .route("/clear", post(clear_data::<S>))
        .route("/settings/currency", get(get_currency::<S>).put(put_currency::<S>))
        .route("/settings/theme", get(get_theme::<S>).put(put_theme::<S>))
        .route("/settings/theme/toggle", post(toggle_theme::<S>))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new().nest("/api", router(AppState::new(ExpenseStore::new(MemoryStore::new()))))
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(&app(), Method::GET, "/api/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], "OK");
    }

    #[tokio::test]
    async fn test_create_and_list() {
        let app = app();
        let (status, created) = send(
            &app,
            Method::POST,
            "/api/expenses",
            Some(json!({"amount": 50, "category": "food", "description": "lunch"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = created["data"]["id"].as_str().unwrap().to_string();

        let (status, listed) = send(&app, Method::GET, "/api/expenses?search=LUNCH", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed["data"][0]["id"], id.as_str());
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_amount() {
        let (status, body) = send(
            &app(),
            Method::POST,
            "/api/expenses",
            Some(json!({"amount": -5, "category": "food"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Please enter a valid amount");
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let app = app();
        let (_, created) = send(
            &app,
            Method::POST,
            "/api/expenses",
            Some(json!({"amount": 10, "category": "food", "date": "2024-01-05"})),
        )
        .await;
        let id = created["data"]["id"].as_str().unwrap().to_string();

        let (status, updated) = send(
            &app,
            Method::PUT,
            &format!("/api/expenses/{id}"),
            Some(json!({"amount": 12.5, "category": "health"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["data"]["amount"], 12.5);
        assert_eq!(updated["data"]["date"], "2024-01-05");

        let (status, remaining) = send(&app, Method::DELETE, &format!("/api/expenses/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(remaining["data"], json!([]));

        let (status, _) = send(&app, Method::GET, &format!("/api/expenses/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_update_unknown_id_is_not_found() {
        let (status, _) = send(
            &app(),
            Method::PUT,
            "/api/expenses/missing",
            Some(json!({"amount": 1, "category": "food"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_settings_round_trip() {
        let app = app();
        let (_, currency) = send(&app, Method::GET, "/api/settings/currency", None).await;
        assert_eq!(currency["data"]["currency"], "INR");

        let (status, _) = send(&app, Method::PUT, "/api/settings/currency", Some(json!({"currency": "USD"}))).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(&app, Method::PUT, "/api/settings/currency", Some(json!({"currency": "XYZ"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, theme) = send(&app, Method::PUT, "/api/settings/theme", Some(json!({"theme": "dark"}))).await;
        assert_eq!(theme["data"]["theme"], "dark");

        let (status, theme) = send(&app, Method::POST, "/api/settings/theme/toggle", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(theme["data"]["theme"], "light");
    }

    #[tokio::test]
    async fn test_import_and_export() {
        let app = app();
        let (status, body) = send(&app, Method::POST, "/api/import", Some(json!({"not": "an array"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/import",
            Some(json!([{"id": "a", "amount": 5, "category": "food", "date": "2024-01-05"}])),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], 1);

        let (status, exported) = send(&app, Method::GET, "/api/export/json", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(exported[0]["id"], "a");

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/import",
            Some(json!([{"id": 1704412800000u64, "amount": 5, "category": "food", "date": null}])),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], 1);
        let (_, exported) = send(&app, Method::GET, "/api/export/json", None).await;
        assert_eq!(exported[0]["id"], "1704412800000");

        let (status, _) = send(&app, Method::POST, "/api/clear", None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(&app, Method::GET, "/api/export/csv", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }
}
