use std::sync::Arc;

use tracing::info;

use gatehouse::auth::RecaptchaVerifier;
use gatehouse::mail::{HttpMailer, Mailer, MemoryMailer};
use gatehouse::{Config, Database, WebServer};

#[tokio::main]
async fn main() {
    // Load configuration
    let config = match Config::load("config.toml") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config.toml: {e}");
            eprintln!("Using default configuration.");
            Config::default()
        }
    };

    // Initialize logging
    if let Err(e) = gatehouse::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        // Fall back to console-only logging
        gatehouse::logging::init_console_only(&config.logging.level);
    }

    info!("Gatehouse authentication service");

    // Migrations run as part of open
    let db = match Database::open(&config.database.path).await {
        Ok(db) => db,
        Err(e) => {
            eprintln!("Failed to open database {}: {e}", config.database.path);
            std::process::exit(1);
        }
    };

    // Without a mail endpoint, messages are recorded in memory only; links
    // then appear nowhere, so this is for local development.
    let mailer: Arc<dyn Mailer> = match HttpMailer::new(&config.mail) {
        Ok(mailer) => Arc::new(mailer),
        Err(_) => {
            tracing::warn!("No mail endpoint configured; outgoing mail will not be delivered");
            Arc::new(MemoryMailer::new())
        }
    };
    let captcha = Arc::new(RecaptchaVerifier::new(&config.captcha));

    let server = match WebServer::new(&config, db, mailer, captcha) {
        Ok(server) => server,
        Err(e) => {
            eprintln!("Failed to assemble server: {e}");
            std::process::exit(1);
        }
    };

    info!(
        "Server configured on {}:{}",
        config.server.host, config.server.port
    );

    if let Err(e) = server.run().await {
        eprintln!("Server error: {e}");
        std::process::exit(1);
    }
}
