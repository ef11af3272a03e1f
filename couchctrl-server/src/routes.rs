//! HTTP route definitions and handlers.
//!
//! Every endpoint answers a JSON envelope: `{"ok": true, ...}` on success,
//! `{"ok": false, "error": ...}` with a non-2xx status on failure. Body
//! parse failures and unknown routes are recovered into the same envelope.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{info, warn};
use vlc_client::{Auth, ClientError, VlcClient};
use vlc_discovery::ScanConfig;
use warp::http::StatusCode;
use warp::{Filter, Rejection, Reply};

use crate::messages::DEFAULT_TARGET_PORT;
use crate::registry::SessionRegistry;
use crate::ws;

/// Shared state handed to every handler and websocket session.
#[derive(Clone, Default)]
pub struct AppState {
    pub client: VlcClient,
    pub registry: Arc<SessionRegistry>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }
}

fn default_target_port() -> u16 {
    DEFAULT_TARGET_PORT
}

#[derive(Debug, Deserialize)]
struct ProbeRequest {
    ip: String,
    #[serde(default = "default_target_port")]
    port: u16,
    auth: Option<Auth>,
    /// Per-probe deadline in milliseconds
    timeout: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DiscoverRequest {
    ports: Option<Vec<u16>>,
    auth: Option<Auth>,
    quick: Option<bool>,
    /// Per-probe deadline in milliseconds
    timeout: Option<u64>,
    concurrency: Option<usize>,
    stop_on_first: Option<bool>,
}

impl DiscoverRequest {
    fn into_config(self) -> ScanConfig {
        let defaults = ScanConfig::default();
        ScanConfig {
            ports: self
                .ports
                .filter(|ports| !ports.is_empty())
                .unwrap_or(defaults.ports),
            auth: self.auth,
            timeout: self
                .timeout
                .map(Duration::from_millis)
                .unwrap_or(defaults.timeout),
            concurrency: self.concurrency.unwrap_or(defaults.concurrency),
            quick: self.quick.unwrap_or(false),
            stop_on_first: self.stop_on_first.unwrap_or(false),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CommandRequest {
    ip: String,
    #[serde(default = "default_target_port")]
    port: u16,
    command: String,
    #[serde(default)]
    params: Map<String, Value>,
    auth: Option<Auth>,
}

/// Build the complete route tree: the three POST endpoints, the `/ws`
/// upgrade, CORS, and the rejection-to-envelope recovery.
pub fn routes(
    state: AppState,
) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    let probe = warp::path!("probe")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_state(state.clone()))
        .and_then(handle_probe);

    let discover = warp::path!("discover")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_state(state.clone()))
        .and_then(handle_discover);

    let command = warp::path!("command")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_state(state.clone()))
        .and_then(handle_command);

    let websocket = warp::path!("ws")
        .and(warp::ws())
        .and(with_state(state))
        .map(|upgrade: warp::ws::Ws, state: AppState| {
            upgrade.on_upgrade(move |socket| ws::handle_socket(socket, state))
        });

    let cors = warp::cors()
        .allow_any_origin()
        .allow_headers(vec!["content-type"])
        .allow_methods(vec!["GET", "POST"]);

    probe
        .or(discover)
        .or(command)
        .or(websocket)
        .with(cors)
        .recover(handle_rejection)
}

fn with_state(
    state: AppState,
) -> impl Filter<Extract = (AppState,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

async fn handle_probe(
    request: ProbeRequest,
    state: AppState,
) -> Result<impl Reply, Infallible> {
    let timeout = request.timeout.map(Duration::from_millis);
    match state
        .client
        .get_status(&request.ip, request.port, request.auth.as_ref(), timeout)
        .await
    {
        Ok(status) => Ok(ok_reply(json!({ "ok": true, "status": status }))),
        Err(err) => Ok(error_reply(
            StatusCode::INTERNAL_SERVER_ERROR,
            &err.to_string(),
        )),
    }
}

async fn handle_discover(
    request: DiscoverRequest,
    _state: AppState,
) -> Result<impl Reply, Infallible> {
    match vlc_discovery::discover(&request.into_config()).await {
        Ok(devices) => {
            info!(found = devices.len(), "discover finished");
            Ok(ok_reply(json!({ "ok": true, "devices": devices })))
        }
        Err(err) => Ok(error_reply(
            StatusCode::INTERNAL_SERVER_ERROR,
            &err.to_string(),
        )),
    }
}

async fn handle_command(
    request: CommandRequest,
    state: AppState,
) -> Result<impl Reply, Infallible> {
    match state
        .client
        .send_command(
            &request.ip,
            request.port,
            &request.command,
            &request.params,
            request.auth.as_ref(),
            None,
        )
        .await
    {
        Ok(result) => Ok(ok_reply(json!({ "ok": true, "result": result }))),
        Err(err @ ClientError::InvalidCommand) => {
            Ok(error_reply(StatusCode::BAD_REQUEST, &err.to_string()))
        }
        Err(err) => Ok(error_reply(
            StatusCode::INTERNAL_SERVER_ERROR,
            &err.to_string(),
        )),
    }
}

fn ok_reply(body: Value) -> warp::reply::WithStatus<warp::reply::Json> {
    warp::reply::with_status(warp::reply::json(&body), StatusCode::OK)
}

fn error_reply(
    status: StatusCode,
    error: &str,
) -> warp::reply::WithStatus<warp::reply::Json> {
    warp::reply::with_status(
        warp::reply::json(&json!({ "ok": false, "error": error })),
        status,
    )
}

/// Map warp rejections into the JSON error envelope.
async fn handle_rejection(rejection: Rejection) -> Result<impl Reply, Infallible> {
    let (status, error) = if rejection.is_not_found() {
        (StatusCode::NOT_FOUND, "not found".to_string())
    } else if let Some(err) = rejection.find::<warp::filters::body::BodyDeserializeError>()
    {
        (StatusCode::BAD_REQUEST, err.to_string())
    } else if rejection.find::<warp::reject::MethodNotAllowed>().is_some() {
        (
            StatusCode::METHOD_NOT_ALLOWED,
            "method not allowed".to_string(),
        )
    } else {
        warn!(?rejection, "unhandled rejection");
        (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
    };
    Ok(error_reply(status, &error))
}
