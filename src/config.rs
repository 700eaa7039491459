//! Service configuration from environment variables.
//!
//! Subsystem-specific configs live next to their subsystem
//! (`notify::mailer::SmtpConfig`, `llm::gemini::GeminiConfig`); this module
//! holds the pieces owned by the composition root.

use std::path::PathBuf;

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Port the API listens on.
    pub port: u16,
    /// Origin allowed by the CORS layer (the frontend dev server).
    pub cors_origin: String,
}

impl HttpConfig {
    pub fn from_env() -> Self {
        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5000);

        let cors_origin = std::env::var("CORS_ORIGIN")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());

        Self { port, cors_origin }
    }
}

/// Database location.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

impl DbConfig {
    pub fn from_env() -> Self {
        let path = std::env::var("VRIKZO_DB_PATH")
            .unwrap_or_else(|_| "./data/vrikzo.db".to_string());
        Self { path: path.into() }
    }
}
