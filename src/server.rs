// src/server.rs
use std::{convert::Infallible, sync::Arc};

use bytes::{Buf, Bytes};
use futures_util::TryStreamExt;
use serde::Serialize;
use tracing::{debug, error, info};
use warp::{
    http::StatusCode,
    multipart::FormData,
    reply::{self, Reply, Response},
    Filter, Rejection,
};

use crate::{
    fetch::RegistrySource,
    loader,
    lookup::{validate, LookupTable, ADDRESSEE_CODE_PARAM},
    storage::ArtifactStore,
};

/// Decoded name/value pairs in arrival order; repeated names are kept.
type Params = Vec<(String, String)>;

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    details: Option<String>,
}

fn health(service: &'static str) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::path("health")
        .and(warp::path::end())
        .and(warp::get())
        .map(move || {
            reply::json(&serde_json::json!({
                "status": "healthy",
                "service": service
            }))
        })
}

/// Any method on `/`, plus `GET /health`.
///
/// `addresseeCode` comes from a urlencoded or multipart body when there is
/// one, otherwise from the query string. Every other body is ignored.
pub fn validator_routes(
    table: Arc<LookupTable>,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let with_table = warp::any().map(move || Arc::clone(&table));

    // urlencoded body values come before the query string
    let form = warp::path::end()
        .and(warp::query::<Params>())
        .and(warp::body::form::<Params>())
        .and(with_table.clone())
        .map(|query: Params, form: Params, table: Arc<LookupTable>| {
            respond(&table, &[&form, &query])
        });

    // multipart values come after the query string
    let multipart = warp::path::end()
        .and(warp::query::<Params>())
        .and(warp::multipart::form().and_then(multipart_params))
        .and(with_table.clone())
        .map(|query: Params, parts: Params, table: Arc<LookupTable>| {
            respond(&table, &[&query, &parts])
        });

    let query = warp::path::end()
        .and(warp::query::<Params>())
        .and(with_table)
        .map(|query: Params, table: Arc<LookupTable>| respond(&table, &[&query]));

    health("split-payment-validator")
        .or(form)
        .or(multipart)
        .or(query)
        .recover(empty_rejection)
}

async fn multipart_params(form: FormData) -> Result<Params, Rejection> {
    let mut form = Box::pin(form);
    let mut parts = Params::new();

    while let Some(mut part) = form.try_next().await.map_err(|e| {
        debug!(error = %e, "unreadable multipart body");
        warp::reject::reject()
    })? {
        let mut value = Vec::new();
        while let Some(chunk) = part.data().await {
            let chunk = chunk.map_err(|e| {
                debug!(error = %e, "unreadable multipart field");
                warp::reject::reject()
            })?;
            value.extend_from_slice(chunk.chunk());
        }
        // file uploads are not form values
        if part.filename().is_none() {
            parts.push((part.name().to_string(), String::from_utf8_lossy(&value).into_owned()));
        }
    }
    Ok(parts)
}

fn respond(table: &LookupTable, sources: &[&Params]) -> Response {
    let code = sources
        .iter()
        .flat_map(|params| params.iter())
        .find(|(name, _)| name == ADDRESSEE_CODE_PARAM)
        .map(|(_, value)| value.as_str());

    match validate(table, code) {
        Ok(result) => {
            debug!(code = ?code, success = result.success, "validated");
            reply::json(&result).into_response()
        }
        Err(e) => {
            debug!(error = %e, "rejected validation request");
            empty(StatusCode::BAD_REQUEST)
        }
    }
}

/// Unknown paths stay 404; anything else that could not be read is a 400.
async fn empty_rejection(err: Rejection) -> Result<Response, Infallible> {
    if err.is_not_found() {
        return Ok(empty(StatusCode::NOT_FOUND));
    }
    debug!(rejection = ?err, "unreadable validation request");
    Ok(empty(StatusCode::BAD_REQUEST))
}

fn empty(status: StatusCode) -> Response {
    reply::with_status(String::new(), status).into_response()
}

#[derive(Clone)]
pub struct LoaderState {
    pub source: Arc<dyn RegistrySource>,
    pub store: Arc<dyn ArtifactStore>,
}

/// `POST /` runs one load per event (the body, e.g. a Pub/Sub push envelope,
/// is not interpreted), plus `GET /health`.
pub fn loader_routes(
    state: LoaderState,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let with_state = warp::any().map(move || state.clone());

    let trigger = warp::post()
        .and(warp::path::end())
        .and(warp::body::bytes())
        .and(with_state)
        .and_then(trigger_load);

    health("split-payment-loader").or(trigger)
}

async fn trigger_load(event: Bytes, state: LoaderState) -> Result<Response, Infallible> {
    info!(event_bytes = event.len(), "load triggered");

    match loader::run_once(Arc::clone(&state.source), state.store.as_ref()).await {
        Ok(report) => Ok(reply::json(&report).into_response()),
        Err(e) => {
            error!("load failed: {}", e);
            let body = ErrorResponse {
                error: "Load failed".to_string(),
                details: Some(e.to_string()),
            };
            Ok(reply::with_status(reply::json(&body), StatusCode::INTERNAL_SERVER_ERROR).into_response())
        }
    }
}
