//! Middleware for the Web API.

pub mod client_ip;
pub mod cors;

pub use client_ip::ClientIp;
pub use cors::create_cors_layer;
