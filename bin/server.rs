// Expense Ledger - Web Server
// JSON REST API over the account directory, ledger, and statistics views

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post, put},
    Router,
};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use expense_ledger::{
    summarize, AccountDirectory, AuthError, Expense, ExpenseLedger, Session, SqliteStore, Summary,
};

/// Shared application state
#[derive(Clone)]
struct AppState {
    store: SqliteStore,
}

impl AppState {
    fn directory(&self) -> AccountDirectory<SqliteStore> {
        AccountDirectory::new(self.store.clone())
    }

    /// Resolve the current session and load its ledger.
    fn open_ledger(&self) -> Result<(Session, ExpenseLedger<SqliteStore>), ApiError> {
        let session = self
            .directory()
            .current_session()
            .map_err(ApiError::from)?
            .ok_or(ApiError::NoActiveSession)?;

        let mut ledger = ExpenseLedger::new(self.store.clone());
        ledger.load(Some(&session)).map_err(AuthError::from)?;

        Ok((session, ledger))
    }
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
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

    fn err(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

/// Errors surfaced at the API edge. The core keeps ledger calls without a
/// session as silent no-ops; the HTTP surface turns that condition into 401.
enum ApiError {
    NoActiveSession,
    Auth(AuthError),
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        ApiError::Auth(e)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::NoActiveSession => StatusCode::UNAUTHORIZED,
            ApiError::Auth(AuthError::DuplicateEmail) => StatusCode::CONFLICT,
            ApiError::Auth(AuthError::InvalidCredentials) => StatusCode::UNAUTHORIZED,
            ApiError::Auth(AuthError::Storage(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::NoActiveSession => "no active session".to_string(),
            ApiError::Auth(e) => e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        tracing::warn!(error = %self.message(), "request rejected");
        (
            self.status(),
            Json(ApiResponse::<()>::err(self.message())),
        )
            .into_response()
    }
}

// ============================================================================
// Payloads
// ============================================================================

#[derive(Deserialize)]
struct Credentials {
    email: String,
    password: String,
}

#[derive(Deserialize)]
struct ExpensePayload {
    title: String,
    amount: f64,
    category: String,
    date: NaiveDate,
    #[serde(default)]
    notes: Option<String>,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// POST /api/register - Create an account and start a session
async fn register(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state
        .directory()
        .register(&credentials.email, &credentials.password)?;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(session))))
}

/// POST /api/login - Start a session
async fn login(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state
        .directory()
        .login(&credentials.email, &credentials.password)?;

    Ok(Json(ApiResponse::ok(session)))
}

/// POST /api/logout - Clear the session
async fn logout(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    state.directory().logout()?;
    Ok(Json(ApiResponse::ok("logged out")))
}

/// GET /api/session - The current session, if any
async fn current_session(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let session = state.directory().current_session()?;
    Ok(Json(ApiResponse::ok(session)))
}

/// GET /api/expenses - All expenses for the current account
async fn list_expenses(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let (_, ledger) = state.open_ledger()?;
    Ok(Json(ApiResponse::ok(ledger.list().to_vec())))
}

/// POST /api/expenses - Record a new expense
async fn add_expense(
    State(state): State<AppState>,
    Json(payload): Json<ExpensePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let (session, mut ledger) = state.open_ledger()?;

    let expense = Expense::new(
        &payload.title,
        payload.amount,
        &payload.category,
        payload.date,
        payload.notes,
    );
    let created = expense.clone();

    ledger
        .add(Some(&session), expense)
        .map_err(AuthError::from)?;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(created))))
}

/// PUT /api/expenses/:id - Replace an expense in full
async fn update_expense(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<ExpensePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let (session, mut ledger) = state.open_ledger()?;

    let expense = Expense {
        id,
        title: payload.title,
        amount: payload.amount,
        category: payload.category,
        date: payload.date,
        notes: payload.notes,
    };
    let updated = expense.clone();

    ledger
        .update(Some(&session), expense)
        .map_err(AuthError::from)?;

    Ok(Json(ApiResponse::ok(updated)))
}

/// DELETE /api/expenses/:id - Remove an expense
async fn delete_expense(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let (session, mut ledger) = state.open_ledger()?;

    ledger
        .delete(Some(&session), &id)
        .map_err(AuthError::from)?;

    Ok(Json(ApiResponse::ok(id)))
}

/// GET /api/stats - Dashboard statistics for the current account
async fn get_stats(State(state): State<AppState>) -> Result<Json<ApiResponse<Summary>>, ApiError> {
    let (_, ledger) = state.open_ledger()?;

    let summary = summarize(ledger.list(), Local::now().date_naive());
    Ok(Json(ApiResponse::ok(summary)))
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("Expense Ledger - Web Server v{}", expense_ledger::VERSION);

    let db_path = std::env::var("EXPENSE_LEDGER_DB").unwrap_or_else(|_| "expenses.db".to_string());
    let store = SqliteStore::open(std::path::Path::new(&db_path)).expect("Failed to open database");
    println!("✓ Database opened: {}", db_path);

    let state = AppState { store };

    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/session", get(current_session))
        .route("/expenses", get(list_expenses).post(add_expense))
        .route("/expenses/:id", put(update_expense).delete(delete_expense))
        .route("/stats", get(get_stats))
        .with_state(state);

    let app = Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive());

    let addr = "0.0.0.0:3000";
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    println!("\nServer running on http://localhost:3000");
    println!("   API: http://localhost:3000/api/expenses");
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
