use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use dotenv::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{self, TraceLayer};
use tracing::{info, warn, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod router;

use agent_cell::SessionStore;
use shared_config::AppConfig;
use shared_database::{ClinicStore, InMemoryClinicStore, SupabaseClinicStore};
use shared_utils::SystemClock;

use router::AppServices;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting clinic appointment agent");

    // Load configuration
    let config = AppConfig::from_env();

    let store: Arc<dyn ClinicStore> = if config.is_database_configured() {
        info!("Using Supabase clinic store at {}", config.supabase_url);
        Arc::new(SupabaseClinicStore::new(&config))
    } else {
        warn!("Using the in-memory clinic store, bookings are lost on restart");
        Arc::new(InMemoryClinicStore::with_default_roster())
    };

    if !config.is_model_configured() {
        warn!("OPENAI_API_KEY not set, chat turns will answer with an error apology");
    }

    let clock = Arc::new(SystemClock::new(config.clinic_timezone));
    let sessions = Arc::new(SessionStore::new());
    let services = AppServices::build(&config, store, clock, Arc::clone(&sessions));

    if let Some(ttl) = config.session_idle_ttl {
        spawn_session_pruner(sessions, ttl);
    }

    // Set up CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the application router
    let app = router::create_router(services)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors);

    // Run the server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Periodically drop sessions idle for longer than `ttl`.
fn spawn_session_pruner(sessions: Arc<SessionStore>, ttl: Duration) {
    let period = (ttl / 2).max(Duration::from_secs(1));
    info!("Pruning sessions idle for more than {:?} every {:?}", ttl, period);

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            sessions.prune_idle(ttl);
        }
    });
}
