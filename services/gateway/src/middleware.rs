//! Edge middleware guarding the gateway routes

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;

use crate::{error::GatewayError, state::AppState};

/// Identify the caller: first `X-Forwarded-For` hop, else the peer address
pub fn client_key(req: &Request) -> String {
    forwarded_for(req.headers())
        .or_else(|| {
            req.extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        })
        .unwrap_or_else(|| "unknown".to_string())
}

fn forwarded_for(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
}

/// Rate limiting only
pub async fn rate_limit(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, GatewayError> {
    let key = client_key(&req);
    state.edge.check_rate(&key).await?;

    Ok(next.run(req).await)
}

/// Rate limiting followed by token authentication
pub async fn edge_auth(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, GatewayError> {
    let key = client_key(&req);
    let authorization = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok());

    state.edge.authorize(&key, authorization).await?;

    Ok(next.run(req).await)
}
