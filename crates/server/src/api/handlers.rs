use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
};
use mibridge_shared::{Device, resolve_device_by_id};
use serde_json::Value;
use tracing::info;

use super::error::ApiError;
use super::types::*;
use crate::state::AppState;

type ApiResult<T> = Result<Json<T>, ApiError>;

fn target_device<'a>(state: &'a AppState, did: Option<&'a str>) -> Result<&'a str, ApiError> {
    match did.filter(|d| !d.is_empty()) {
        Some(did) => Ok(did),
        None => Ok(state.config.default_device()?),
    }
}

pub async fn handle_version() -> Json<&'static str> {
    Json(crate::VERSION)
}

pub async fn handle_list(State(state): State<Arc<AppState>>) -> ApiResult<Vec<Device>> {
    let devices = state.mina.device_list().await?;
    Ok(Json(devices))
}

pub async fn handle_spec(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SpecParams>,
) -> ApiResult<Value> {
    let spec = state.spec.lookup(&params.model).await?;
    Ok(Json(spec))
}

pub async fn handle_say(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SayRequest>,
) -> ApiResult<Value> {
    let did = target_device(&state, req.did.as_deref())?;
    info!(did, "Speaking {} chars", req.text.chars().count());

    let result = state.mina.text_to_speech(did, &req.text).await?;
    Ok(Json(result))
}

pub async fn handle_command(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CommandRequest>,
) -> ApiResult<Value> {
    let did = target_device(&state, req.did.as_deref())?;
    info!(did, echo = req.echo, "Executing command");

    let result = state.mina.execute_command(did, &req.text, req.echo).await?;
    Ok(Json(result))
}

pub async fn handle_last_ask(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LastAskParams>,
) -> ApiResult<Vec<String>> {
    let device_id = state.config.default_device()?;
    let limit = params.limit.unwrap_or(DEFAULT_LAST_ASK_LIMIT);
    let window = params.before.unwrap_or(DEFAULT_LAST_ASK_WINDOW_SECS);

    // Hardware model is needed by the conversation endpoint; learn it from the device list if unset.
    let hardware = match &state.config.hardware_model {
        Some(hw) => hw.clone(),
        None => {
            let devices = state.mina.device_list().await?;
            resolve_device_by_id(device_id, &devices)?.hardware
        }
    };

    let queries = state
        .mina
        .fetch_recent_queries(&hardware, device_id, limit, window)
        .await?;

    Ok(Json(queries))
}
