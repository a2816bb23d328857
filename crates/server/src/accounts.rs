//! Account API endpoints

use api_types::{
    ApiResponse,
    account::{AccountNew, AccountView},
};
use axum::{Json, extract::State, http::StatusCode};
use engine::AccountCmd;

use crate::{
    ApiResult, ServerError,
    extract::{JsonBody, PathParams},
    server::ServerState,
    views::account_view,
};

fn account_cmd(payload: AccountNew) -> AccountCmd {
    AccountCmd::new(
        payload.bank.unwrap_or_default(),
        payload.agency.unwrap_or_default(),
        payload.account_number.unwrap_or_default(),
        payload.account_kind.unwrap_or_default(),
        payload.holder.unwrap_or_default(),
    )
}

pub async fn create(
    State(state): State<ServerState>,
    JsonBody(payload): JsonBody<AccountNew>,
) -> Result<(StatusCode, Json<ApiResponse<AccountView>>), ServerError> {
    let account = state.engine.register_account(account_cmd(payload)).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("account registered", account_view(account))),
    ))
}

pub async fn list(State(state): State<ServerState>) -> ApiResult<Vec<AccountView>> {
    let accounts = state.engine.list_accounts().await?;
    let views = accounts.into_iter().map(account_view).collect();

    Ok(Json(ApiResponse::ok("accounts listed", views)))
}

pub async fn get(
    State(state): State<ServerState>,
    PathParams(id): PathParams<i64>,
) -> ApiResult<AccountView> {
    let account = state.engine.account(id).await?;

    Ok(Json(ApiResponse::ok("account found", account_view(account))))
}

pub async fn by_number(
    State(state): State<ServerState>,
    PathParams(number): PathParams<String>,
) -> ApiResult<AccountView> {
    let account = state.engine.account_by_number(&number).await?;

    Ok(Json(ApiResponse::ok("account found", account_view(account))))
}

pub async fn update(
    State(state): State<ServerState>,
    PathParams(id): PathParams<i64>,
    JsonBody(payload): JsonBody<AccountNew>,
) -> ApiResult<AccountView> {
    let account = state
        .engine
        .update_account(id, account_cmd(payload))
        .await?;

    Ok(Json(ApiResponse::ok("account updated", account_view(account))))
}

pub async fn delete(
    State(state): State<ServerState>,
    PathParams(id): PathParams<i64>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_account(id).await?;

    Ok(StatusCode::NO_CONTENT)
}
