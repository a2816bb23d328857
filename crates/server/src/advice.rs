//! Advice API endpoints
//!
//! Advisor failures never fail the request: the engine answers with a
//! fallback text flagged as `degraded`.

use api_types::{
    ApiResponse,
    goal::{AdviceView, GoalNew},
};
use axum::{Json, extract::State};
use chrono::Utc;

use crate::{
    ApiResult,
    extract::{JsonBody, PathParams},
    goals::goal_cmd,
    server::ServerState,
    views::advice_view,
};

fn message(advice: &AdviceView) -> &'static str {
    if advice.degraded {
        "advice unavailable, fallback returned"
    } else {
        "advice generated"
    }
}

pub async fn plan(
    State(state): State<ServerState>,
    PathParams(id): PathParams<i64>,
) -> ApiResult<AdviceView> {
    let advice = state
        .engine
        .goal_plan(id, Utc::now().date_naive())
        .await?;
    let view = advice_view(advice);

    Ok(Json(ApiResponse::ok(message(&view), view)))
}

pub async fn viability(
    State(state): State<ServerState>,
    JsonBody(payload): JsonBody<GoalNew>,
) -> ApiResult<AdviceView> {
    let advice = state
        .engine
        .goal_viability(goal_cmd(payload)?, Utc::now().date_naive())
        .await?;
    let view = advice_view(advice);

    Ok(Json(ApiResponse::ok(message(&view), view)))
}

pub async fn optimizations(
    State(state): State<ServerState>,
    PathParams(id): PathParams<i64>,
) -> ApiResult<AdviceView> {
    let advice = state
        .engine
        .optimization_suggestions(id, Utc::now().date_naive())
        .await?;
    let view = advice_view(advice);

    Ok(Json(ApiResponse::ok(message(&view), view)))
}
