use api_types::ApiResponse;
use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::IntoResponse,
};
use engine::EngineError;

pub use server::{ServerState, router, run, run_with_listener, spawn_with_listener};

mod accounts;
mod advice;
mod extract;
mod goals;
mod movements;
mod server;
mod views;

pub mod types {
    pub use api_types::ApiResponse;

    pub mod account {
        pub use api_types::account::{AccountNew, AccountView};
    }

    pub mod movement {
        pub use api_types::movement::{
            BalanceView, ImportRequest, ImportView, MovementListQuery, MovementNew, MovementView,
            PeriodQuery,
        };
    }

    pub mod report {
        pub use api_types::report::{ReportAccount, ReportRequest, ReportView};
    }

    pub mod goal {
        pub use api_types::goal::{AdviceView, GoalNew, GoalView, ProgressUpdate, SweepView};
    }
}

/// Body of a successful response.
type ApiResult<T> = Result<Json<ApiResponse<T>>, ServerError>;

#[derive(Debug)]
pub enum ServerError {
    Engine(EngineError),
    /// Malformed request: unreadable body, bad path or query, missing field.
    Generic(String),
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::ExistingKey(_) | EngineError::InvalidTransition(_) => StatusCode::CONFLICT,
        EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn message_for_status(status: StatusCode) -> &'static str {
    match status {
        StatusCode::BAD_REQUEST => "validation failed",
        StatusCode::NOT_FOUND => "resource not found",
        StatusCode::CONFLICT => "operation conflicts with the current state",
        _ => "unexpected failure",
    }
}

fn detail_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Engine(err) => (status_for_engine_error(&err), detail_for_engine_error(err)),
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
        };
        let body = ApiResponse::<()>::failure(message_for_status(status), error);

        (status, Json(body)).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

impl From<JsonRejection> for ServerError {
    fn from(value: JsonRejection) -> Self {
        Self::Generic(value.body_text())
    }
}

impl From<PathRejection> for ServerError {
    fn from(value: PathRejection) -> Self {
        Self::Generic(value.body_text())
    }
}

impl From<QueryRejection> for ServerError {
    fn from(value: QueryRejection) -> Self {
        Self::Generic(value.body_text())
    }
}
