use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use dotenvy::dotenv;
use sqlx::sqlite::SqlitePoolOptions;
use std::env;
use std::net::SocketAddr;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

use eventdesk::database::{activity_repo, event_repo, schema};
use eventdesk::web::middleware::auth as auth_middleware;
use eventdesk::web::routes::{accreditation, events, raffle, registrations, scan};
use eventdesk::web::AppState;

#[tokio::main]
async fn main() {
    // Load .env file
    dotenv().ok();

    // 1. Start logging
    tracing_subscriber::fmt::init();

    // 2. Connect to the database
    let db_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set in .env");
    println!("Connecting to database: {}", db_url);

    let pool = SqlitePoolOptions::new()
        .connect(&db_url)
        .await
        .expect("Cannot connect to database");

    schema::init(&pool)
        .await
        .expect("Cannot apply database schema");

    // Create the configured event and its activity catalogue on first boot
    if let Ok(slug) = env::var("EVENT_SLUG") {
        let event = event_repo::load_event_by_slug(&pool, &slug)
            .await
            .expect("Cannot look up configured event");
        let event_id = match event {
            Some(event) => event.id,
            None => {
                let name = env::var("EVENT_NAME").unwrap_or_else(|_| slug.clone());
                event_repo::insert_event(&pool, &slug, &name)
                    .await
                    .expect("Cannot create configured event")
            }
        };
        activity_repo::seed_catalogue(&pool, event_id)
            .await
            .expect("Cannot seed activity catalogue");
        println!("Event '{}' ready", slug);
    }

    let state = AppState::new(pool);

    // 3. Protected routes under a single middleware layer
    let protected_routes = Router::new()
        .route(
            "/api/events/{slug}/form-fields",
            get(events::form_fields_handler),
        )
        .route(
            "/api/events/{slug}/register",
            post(registrations::register_handler),
        )
        .route(
            "/api/events/{slug}/registrations",
            get(registrations::list_handler),
        )
        .route(
            "/api/registrations/{id}/confirm-payment",
            post(registrations::confirm_payment_handler),
        )
        .route(
            "/api/registrations/{id}/role",
            post(registrations::role_handler),
        )
        .route(
            "/api/registrations/{id}",
            delete(registrations::delete_handler),
        )
        .route("/api/scan", get(scan::resolve_handler))
        .route("/api/scan/confirm", post(scan::confirm_handler))
        .route(
            "/api/events/{slug}/accreditations",
            get(accreditation::list_handler),
        )
        .route("/api/accreditations", post(accreditation::update_handler))
        .route("/api/events/{slug}/raffle", get(raffle::pool_handler))
        .route(
            "/api/events/{slug}/raffle/winner",
            get(raffle::winner_handler),
        )
        .layer(middleware::from_fn(auth_middleware::require_auth));

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .merge(protected_routes)
        // Layers
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::new())
        // State
        .with_state(state);

    // 4. Start the server (with fallback port)
    let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .expect("Cannot parse host/port");

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!(
                "Could not bind on {}: {}. Trying fallback {}:{}",
                addr,
                e,
                host,
                port + 1
            );
            let fallback: SocketAddr = format!("{}:{}", host, port + 1)
                .parse()
                .expect("Cannot parse fallback address");
            tokio::net::TcpListener::bind(fallback)
                .await
                .expect("Cannot bind on fallback port")
        }
    };

    let bound_addr = listener.local_addr().unwrap();
    println!("Server running on http://{}", bound_addr);

    axum::serve(listener, app).await.unwrap();
}
