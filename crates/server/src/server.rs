use axum::{
    Router,
    routing::{get, post, put},
};

use std::{net::SocketAddr, sync::Arc};

use crate::{accounts, advice, goals, movements};
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
}

pub fn router(engine: Arc<Engine>) -> Router {
    let state = ServerState { engine };

    Router::new()
        .route("/accounts", post(accounts::create).get(accounts::list))
        .route(
            "/accounts/{id}",
            get(accounts::get)
                .put(accounts::update)
                .delete(accounts::delete),
        )
        .route("/accounts/number/{number}", get(accounts::by_number))
        .route("/movements", post(movements::create).get(movements::list))
        .route(
            "/movements/{id}",
            get(movements::get)
                .put(movements::update)
                .delete(movements::delete),
        )
        .route("/movements/{id}/reverse", post(movements::reverse))
        .route("/movements/{id}/complete", post(movements::complete))
        .route("/movements/{id}/cancel", post(movements::cancel))
        .route("/movements/account/{id}", get(movements::by_account))
        .route("/movements/account/{id}/period", get(movements::by_period))
        .route(
            "/movements/account/{id}/kind/{kind}",
            get(movements::by_kind),
        )
        .route("/movements/account/{id}/balance", get(movements::balance))
        .route("/movements/report", post(movements::report))
        .route("/movements/import", post(movements::import))
        .route("/goals", post(goals::create).get(goals::list))
        .route("/goals/sweep-expired", post(goals::sweep_expired))
        .route("/goals/viability", post(advice::viability))
        .route(
            "/goals/{id}",
            get(goals::get).put(goals::update).delete(goals::delete),
        )
        .route("/goals/{id}/progress", put(goals::progress))
        .route("/goals/{id}/pause", post(goals::pause))
        .route("/goals/{id}/reactivate", post(goals::reactivate))
        .route("/goals/{id}/complete", post(goals::complete))
        .route("/goals/{id}/plan", get(advice::plan))
        .route("/goals/account/{id}", get(goals::by_account))
        .route("/goals/account/{id}/active", get(goals::active))
        .route("/goals/account/{id}/expired", get(goals::expired))
        .route("/goals/account/{id}/kind/{kind}", get(goals::by_kind))
        .route(
            "/goals/account/{id}/optimizations",
            get(advice::optimizations),
        )
        .with_state(state)
}

pub async fn run(engine: Arc<Engine>, addr: SocketAddr) {
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener on {addr}: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Arc<Engine>,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router(engine)).await
}

pub fn spawn_with_listener(
    engine: Arc<Engine>,
    listener: tokio::net::TcpListener,
) -> Result<SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
