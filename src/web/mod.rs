//! Web API module for gatehouse.
//!
//! REST surface over the authentication core: registration, login/logout,
//! email verification and the password reset flows.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use router::create_router;
pub use server::WebServer;
