//! Savings goal API endpoints

use api_types::{
    ApiResponse,
    goal::{GoalNew, GoalView, ProgressUpdate, SweepView},
};
use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;
use engine::{GoalCmd, GoalKind, MoneyCents};

use crate::{
    ApiResult, ServerError,
    extract::{JsonBody, PathParams},
    server::ServerState,
    views::{goal_view, goal_views, required, symbolic},
};

pub(crate) fn goal_cmd(payload: GoalNew) -> Result<GoalCmd, ServerError> {
    let kind: GoalKind = symbolic(payload.kind.as_deref(), "kind")?;
    let mut cmd = GoalCmd::new(
        required(payload.account_id, "account_id")?,
        payload.name.unwrap_or_default(),
        kind,
        MoneyCents::new(required(payload.target_minor, "target_minor")?),
        required(payload.start_date, "start_date")?,
        required(payload.end_date, "end_date")?,
    );
    cmd.description = payload.description;
    cmd.notes = payload.notes;
    Ok(cmd)
}

pub async fn create(
    State(state): State<ServerState>,
    JsonBody(payload): JsonBody<GoalNew>,
) -> Result<(StatusCode, Json<ApiResponse<GoalView>>), ServerError> {
    let goal = state
        .engine
        .create_goal(goal_cmd(payload)?, Utc::now())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("goal created", goal_view(goal))),
    ))
}

pub async fn list(State(state): State<ServerState>) -> ApiResult<Vec<GoalView>> {
    let goals = state.engine.list_goals().await?;

    Ok(Json(ApiResponse::ok("goals listed", goal_views(goals))))
}

pub async fn get(
    State(state): State<ServerState>,
    PathParams(id): PathParams<i64>,
) -> ApiResult<GoalView> {
    let goal = state.engine.goal(id).await?;

    Ok(Json(ApiResponse::ok("goal found", goal_view(goal))))
}

pub async fn update(
    State(state): State<ServerState>,
    PathParams(id): PathParams<i64>,
    JsonBody(payload): JsonBody<GoalNew>,
) -> ApiResult<GoalView> {
    let goal = state
        .engine
        .update_goal(id, goal_cmd(payload)?, Utc::now().date_naive())
        .await?;

    Ok(Json(ApiResponse::ok("goal updated", goal_view(goal))))
}

pub async fn delete(
    State(state): State<ServerState>,
    PathParams(id): PathParams<i64>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_goal(id).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn progress(
    State(state): State<ServerState>,
    PathParams(id): PathParams<i64>,
    JsonBody(payload): JsonBody<ProgressUpdate>,
) -> ApiResult<GoalView> {
    let amount = MoneyCents::new(required(payload.amount_minor, "amount_minor")?);
    let goal = state.engine.add_progress(id, amount).await?;

    Ok(Json(ApiResponse::ok("goal progress added", goal_view(goal))))
}

pub async fn pause(
    State(state): State<ServerState>,
    PathParams(id): PathParams<i64>,
) -> ApiResult<GoalView> {
    let goal = state.engine.pause_goal(id).await?;

    Ok(Json(ApiResponse::ok("goal paused", goal_view(goal))))
}

pub async fn reactivate(
    State(state): State<ServerState>,
    PathParams(id): PathParams<i64>,
) -> ApiResult<GoalView> {
    let goal = state
        .engine
        .reactivate_goal(id, Utc::now().date_naive())
        .await?;

    Ok(Json(ApiResponse::ok("goal reactivated", goal_view(goal))))
}

pub async fn complete(
    State(state): State<ServerState>,
    PathParams(id): PathParams<i64>,
) -> ApiResult<GoalView> {
    let goal = state.engine.complete_goal(id).await?;

    Ok(Json(ApiResponse::ok("goal completed", goal_view(goal))))
}

pub async fn by_account(
    State(state): State<ServerState>,
    PathParams(id): PathParams<i64>,
) -> ApiResult<Vec<GoalView>> {
    let goals = state.engine.account_goals(id).await?;

    Ok(Json(ApiResponse::ok("goals listed", goal_views(goals))))
}

pub async fn active(
    State(state): State<ServerState>,
    PathParams(id): PathParams<i64>,
) -> ApiResult<Vec<GoalView>> {
    let goals = state.engine.active_goals(id).await?;

    Ok(Json(ApiResponse::ok("active goals listed", goal_views(goals))))
}

pub async fn expired(
    State(state): State<ServerState>,
    PathParams(id): PathParams<i64>,
) -> ApiResult<Vec<GoalView>> {
    let goals = state
        .engine
        .expired_goals(id, Utc::now().date_naive())
        .await?;

    Ok(Json(ApiResponse::ok("expired goals listed", goal_views(goals))))
}

pub async fn by_kind(
    State(state): State<ServerState>,
    PathParams((id, kind)): PathParams<(i64, String)>,
) -> ApiResult<Vec<GoalView>> {
    let kind = GoalKind::try_from(kind.as_str())?;
    let goals = state.engine.goals_by_kind(id, kind).await?;

    Ok(Json(ApiResponse::ok("goals listed", goal_views(goals))))
}

pub async fn sweep_expired(State(state): State<ServerState>) -> ApiResult<SweepView> {
    let expired = state
        .engine
        .sweep_expired(Utc::now().date_naive())
        .await?;

    Ok(Json(ApiResponse::ok(
        "expired goals swept",
        SweepView { expired },
    )))
}
