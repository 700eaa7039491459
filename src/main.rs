use std::sync::Arc;

use axum::http::{HeaderValue, Method, header};
use tower_http::cors::CorsLayer;

use vrikzo::config::{DbConfig, HttpConfig};
use vrikzo::llm::{GeminiConfig, GeminiGenerator, TextGenerator};
use vrikzo::notify::{Composer, MailTransport, SmtpConfig, SmtpMailer};
use vrikzo::scheduler::ReminderScheduler;
use vrikzo::store::{LibSqlBackend, ReminderStore};
use vrikzo::web::{ApiState, api_routes};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Install rustls crypto provider before any TLS usage
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let http = HttpConfig::from_env();
    let db_config = DbConfig::from_env();

    eprintln!("🌿 VrikZo reminders v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   API: http://0.0.0.0:{}", http.port);
    eprintln!("   Database: {}", db_config.path.display());

    // ── Database ────────────────────────────────────────────────────────
    let store: Arc<dyn ReminderStore> = Arc::new(
        LibSqlBackend::new_local(&db_config.path)
            .await
            .unwrap_or_else(|e| {
                eprintln!(
                    "Error: Failed to open database at {}: {}",
                    db_config.path.display(),
                    e
                );
                std::process::exit(1);
            }),
    );

    // ── Email body generation (optional) ────────────────────────────────
    let generator: Option<Arc<dyn TextGenerator>> = match GeminiConfig::from_env() {
        Some(config) => {
            eprintln!("   Generation: enabled (model: {})", config.model);
            match GeminiGenerator::new(config) {
                Ok(g) => Some(Arc::new(g)),
                Err(e) => {
                    eprintln!("   Warning: generation client unavailable: {e}");
                    None
                }
            }
        }
        None => {
            eprintln!("   Generation: disabled (GEMINI_API_KEY not set)");
            None
        }
    };

    // ── Reminder scheduler ──────────────────────────────────────────────
    // Runs only when mail can actually go out.
    let _scheduler = match SmtpConfig::from_env() {
        Some(smtp) => {
            eprintln!(
                "   SMTP: {}:{} (from: {})",
                smtp.host, smtp.port, smtp.from_address
            );
            let mailer: Arc<dyn MailTransport> = Arc::new(SmtpMailer::new(smtp));
            let scheduler = Arc::new(ReminderScheduler::new(
                Arc::clone(&store),
                Composer::new(generator),
                mailer,
            ));
            let _ticker = Arc::clone(&scheduler).spawn();
            eprintln!("   Scheduler: running (every minute)");
            Some(scheduler)
        }
        None => {
            eprintln!("   SMTP: not configured, reminder dispatch disabled");
            None
        }
    };

    // ── API server ──────────────────────────────────────────────────────
    let cors = CorsLayer::new()
        .allow_origin(
            http.cors_origin
                .parse::<HeaderValue>()
                .unwrap_or_else(|_| HeaderValue::from_static("http://localhost:3000")),
        )
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]);

    let app = api_routes(ApiState {
        store: Arc::clone(&store),
    })
    .layer(cors);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", http.port)).await?;
    tracing::info!(port = http.port, "API server started");
    axum::serve(listener, app).await?;

    Ok(())
}
