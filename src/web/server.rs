//! Web server assembly.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use crate::auth::{
    AccountService, CaptchaVerifier, HashParams, MemoryRateLimiter, SessionManager, TokenCodec,
};
use crate::config::Config;
use crate::db::Database;
use crate::mail::Mailer;

use super::handlers::AppState;
use super::router::{create_health_router, create_router};

/// Web server for the authentication API.
pub struct WebServer {
    addr: SocketAddr,
    app_state: Arc<AppState>,
    cors_origins: Vec<String>,
}

impl WebServer {
    /// Assemble the application state and server from configuration.
    pub fn new(
        config: &Config,
        db: Database,
        mailer: Arc<dyn Mailer>,
        captcha: Arc<dyn CaptchaVerifier>,
    ) -> crate::Result<Self> {
        let addr = format!("{}:{}", config.server.host, config.server.port)
            .parse()
            .map_err(|_| {
                crate::GatehouseError::Config(format!(
                    "invalid server address {}:{}",
                    config.server.host, config.server.port
                ))
            })?;

        let codec = Arc::new(TokenCodec::new(
            &config.auth.session_secret,
            &config.auth.email_verification_secret,
            &config.auth.forget_password_secret,
        ));

        let accounts = AccountService::new(
            db,
            codec.clone(),
            mailer,
            config.auth.base_url.clone(),
            config.auth.token_ttl_secs,
            HashParams {
                memory_kib: config.auth.hash_memory_kib,
                iterations: config.auth.hash_iterations,
                parallelism: config.auth.hash_parallelism,
            },
        )?;
        let sessions = SessionManager::new(
            codec,
            config.auth.session_ttl_secs,
            config.auth.secure_cookies,
        );
        let guard = Arc::new(MemoryRateLimiter::new(&config.rate_limit));

        let app_state = Arc::new(AppState {
            accounts,
            sessions,
            guard,
            captcha,
        });

        Ok(Self {
            addr,
            app_state,
            cors_origins: config.server.cors_origins.clone(),
        })
    }

    /// Get the configured bind address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    fn router(&self) -> axum::Router {
        create_router(self.app_state.clone(), &self.cors_origins).merge(create_health_router())
    }

    /// Run the web server until shutdown.
    pub async fn run(self) -> Result<(), std::io::Error> {
        let router = self.router();
        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;

        tracing::info!("Web server listening on http://{}", local_addr);

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
    }
}
