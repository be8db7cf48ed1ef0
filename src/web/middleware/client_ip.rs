//! Client IP extraction.
//!
//! The abuse guard keys its counters by client IP, so the address must
//! survive a reverse proxy: forwarding headers win over the socket peer.

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use std::convert::Infallible;
use std::net::SocketAddr;

/// Extractor yielding the client IP as a string.
#[derive(Debug, Clone)]
pub struct ClientIp(pub String);

#[axum::async_trait]
impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // X-Forwarded-For first (reverse proxy), first hop in the chain
        if let Some(forwarded) = parts
            .headers
            .get("X-Forwarded-For")
            .and_then(|v| v.to_str().ok())
        {
            if let Some(ip) = forwarded.split(',').next() {
                let ip = ip.trim();
                if !ip.is_empty() {
                    return Ok(ClientIp(ip.to_string()));
                }
            }
        }

        if let Some(real_ip) = parts
            .headers
            .get("X-Real-IP")
            .and_then(|v| v.to_str().ok())
        {
            return Ok(ClientIp(real_ip.to_string()));
        }

        if let Some(ConnectInfo(addr)) = parts.extensions.get::<ConnectInfo<SocketAddr>>() {
            return Ok(ClientIp(addr.ip().to_string()));
        }

        Ok(ClientIp("unknown".to_string()))
    }
}
