//! Movement API endpoints

use api_types::{
    ApiResponse,
    movement::{
        BalanceView, ImportRequest, ImportView, MovementListQuery, MovementNew, MovementView,
        PeriodQuery,
    },
    report::{ReportRequest, ReportView},
};
use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;
use engine::{
    Category, ImportCmd, MoneyCents, MovementCmd, MovementFilter, MovementKind, MovementSource,
    MovementStatus, ReportParams,
};

use crate::{
    ApiResult, ServerError,
    extract::{JsonBody, PathParams, QueryParams},
    server::ServerState,
    views::{
        import_view, movement_view, movement_views, report_view, required, symbolic, symbolic_opt,
    },
};

/// Builds the engine command, defaulting the source to `default_source`.
fn movement_cmd(
    payload: MovementNew,
    default_source: MovementSource,
) -> Result<MovementCmd, ServerError> {
    let kind: MovementKind = symbolic(payload.kind.as_deref(), "kind")?;
    let category: Category = symbolic(payload.category.as_deref(), "category")?;
    let source = symbolic_opt(payload.source.as_deref())?.unwrap_or(default_source);
    let status: Option<MovementStatus> = symbolic_opt(payload.status.as_deref())?;

    let mut cmd = MovementCmd::new(
        required(payload.account_id, "account_id")?,
        kind,
        MoneyCents::new(required(payload.amount_minor, "amount_minor")?),
        payload.description.unwrap_or_default(),
        category,
        required(payload.movement_date, "movement_date")?,
    )
    .source(source);
    cmd.status = status;
    cmd.notes = payload.notes;
    cmd.origin_file = payload.origin_file;
    cmd.external_id = payload.external_id;
    Ok(cmd)
}

pub async fn create(
    State(state): State<ServerState>,
    JsonBody(payload): JsonBody<MovementNew>,
) -> Result<(StatusCode, Json<ApiResponse<MovementView>>), ServerError> {
    let cmd = movement_cmd(payload, MovementSource::Api)?;
    let movement = state.engine.register_movement(cmd, Utc::now()).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("movement registered", movement_view(movement))),
    ))
}

pub async fn list(State(state): State<ServerState>) -> ApiResult<Vec<MovementView>> {
    let movements = state.engine.list_movements().await?;

    Ok(Json(ApiResponse::ok(
        "movements listed",
        movement_views(movements),
    )))
}

pub async fn get(
    State(state): State<ServerState>,
    PathParams(id): PathParams<i64>,
) -> ApiResult<MovementView> {
    let movement = state.engine.movement(id).await?;

    Ok(Json(ApiResponse::ok("movement found", movement_view(movement))))
}

/// Edits a movement. Without an explicit source the stored one is kept.
pub async fn update(
    State(state): State<ServerState>,
    PathParams(id): PathParams<i64>,
    JsonBody(payload): JsonBody<MovementNew>,
) -> ApiResult<MovementView> {
    let current = state.engine.movement(id).await?;
    let cmd = movement_cmd(payload, current.source)?;
    let movement = state.engine.update_movement(id, cmd).await?;

    Ok(Json(ApiResponse::ok("movement updated", movement_view(movement))))
}

pub async fn delete(
    State(state): State<ServerState>,
    PathParams(id): PathParams<i64>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_movement(id).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn reverse(
    State(state): State<ServerState>,
    PathParams(id): PathParams<i64>,
) -> ApiResult<MovementView> {
    let movement = state.engine.reverse_movement(id).await?;

    Ok(Json(ApiResponse::ok("movement reversed", movement_view(movement))))
}

pub async fn complete(
    State(state): State<ServerState>,
    PathParams(id): PathParams<i64>,
) -> ApiResult<MovementView> {
    let movement = state.engine.complete_movement(id).await?;

    Ok(Json(ApiResponse::ok("movement completed", movement_view(movement))))
}

pub async fn cancel(
    State(state): State<ServerState>,
    PathParams(id): PathParams<i64>,
) -> ApiResult<MovementView> {
    let movement = state.engine.cancel_movement(id).await?;

    Ok(Json(ApiResponse::ok("movement cancelled", movement_view(movement))))
}

pub async fn by_account(
    State(state): State<ServerState>,
    PathParams(id): PathParams<i64>,
    QueryParams(query): QueryParams<MovementListQuery>,
) -> ApiResult<Vec<MovementView>> {
    let filter = MovementFilter {
        kind: symbolic_opt(query.kind.as_deref())?,
        status: symbolic_opt(query.status.as_deref())?,
        from: query.from,
        to: query.to,
    };
    let today = Utc::now().date_naive();
    let movements = state.engine.account_movements(id, &filter, today).await?;

    Ok(Json(ApiResponse::ok(
        "movements listed",
        movement_views(movements),
    )))
}

pub async fn by_period(
    State(state): State<ServerState>,
    PathParams(id): PathParams<i64>,
    QueryParams(query): QueryParams<PeriodQuery>,
) -> ApiResult<Vec<MovementView>> {
    let from = required(query.from, "from")?;
    let to = required(query.to, "to")?;
    let today = Utc::now().date_naive();
    let movements = state
        .engine
        .movements_in_period(id, from, to, today)
        .await?;

    Ok(Json(ApiResponse::ok(
        "movements listed",
        movement_views(movements),
    )))
}

pub async fn by_kind(
    State(state): State<ServerState>,
    PathParams((id, kind)): PathParams<(i64, String)>,
) -> ApiResult<Vec<MovementView>> {
    let kind = MovementKind::try_from(kind.as_str())?;
    let today = Utc::now().date_naive();
    let movements = state.engine.movements_by_kind(id, kind, today).await?;

    Ok(Json(ApiResponse::ok(
        "movements listed",
        movement_views(movements),
    )))
}

pub async fn balance(
    State(state): State<ServerState>,
    PathParams(id): PathParams<i64>,
) -> ApiResult<BalanceView> {
    let balance = state.engine.current_balance(id).await?;

    Ok(Json(ApiResponse::ok(
        "balance computed",
        BalanceView {
            account_id: id,
            balance_minor: balance.cents(),
        },
    )))
}

pub async fn report(
    State(state): State<ServerState>,
    JsonBody(payload): JsonBody<ReportRequest>,
) -> ApiResult<ReportView> {
    let mut params = ReportParams::new(required(payload.account_id, "account_id")?);
    params.from = payload.from;
    params.to = payload.to;
    params.kind = symbolic_opt(payload.kind.as_deref())?;
    params.title = payload.title;
    params.include_summary = payload.include_summary.unwrap_or(true);

    let report = state
        .engine
        .build_report(params, Utc::now().date_naive())
        .await?;

    Ok(Json(ApiResponse::ok("report built", report_view(report))))
}

pub async fn import(
    State(state): State<ServerState>,
    JsonBody(payload): JsonBody<ImportRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ImportView>>), ServerError> {
    let cmd = ImportCmd::new(
        required(payload.account_id, "account_id")?,
        payload.file_name.unwrap_or_default(),
        required(payload.content, "content")?,
    );
    let summary = state.engine.import_movements(cmd, Utc::now()).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("movements imported", import_view(summary))),
    ))
}
