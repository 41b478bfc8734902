use std::fmt;
use std::net::SocketAddr;

use axum::extract::{Path, Query, Request, State};
use axum::http::header::{HeaderMap, HeaderName, HeaderValue};
use axum::http::Method;
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use contracts::{
    ApiError, Classification, ErrorCode, GrowthProjection, HarvestEvent, HarvestRequest,
    HarvestType, PondGeometry, PondRecord, PondUpdate, PopulationEvent, Role, SamplingEvent,
    SCHEMA_VERSION_V1,
};
use pond_core::{fish_per_kg_from_grams, EngineError};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

use crate::{EngineApi, EngineApiError};

const DEFAULT_PAGE_SIZE: usize = 200;
const MAX_PAGE_SIZE: usize = 1000;
const ROLE_HEADER: &str = "x-role";

include!("error.rs");
include!("state.rs");
include!("routes/ponds.rs");
include!("routes/ledger.rs");
include!("routes/readmodel.rs");
include!("util.rs");

pub async fn serve(addr: SocketAddr, api: EngineApi) -> Result<(), ServerError> {
    let state = AppState::new(api);
    let app = router(state);

    let listener = TcpListener::bind(addr).await?;
    log::info!("pond api listening on http://{addr}");
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/ponds", post(create_pond).get(list_ponds))
        .route("/api/v1/ponds/{pond_id}", get(get_pond).post(update_pond))
        .route(
            "/api/v1/ponds/{pond_id}/population",
            post(append_population_delta).get(list_population_events),
        )
        .route(
            "/api/v1/ponds/{pond_id}/samplings",
            post(record_sampling).get(list_sampling_events),
        )
        .route(
            "/api/v1/ponds/{pond_id}/harvests",
            post(record_harvest).get(list_harvest_events),
        )
        .route(
            "/api/v1/ponds/{pond_id}/classification",
            get(get_classification),
        )
        .route("/api/v1/ponds/{pond_id}/projection", get(get_projection))
        .layer(middleware::from_fn(cors_middleware))
        .with_state(state)
}

async fn cors_middleware(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        let mut response = Response::new(axum::body::Body::empty());
        *response.status_mut() = StatusCode::NO_CONTENT;
        apply_cors_headers(response.headers_mut());
        return response;
    }

    let mut response = next.run(request).await;
    apply_cors_headers(response.headers_mut());
    response
}
