use axum::http::{HeaderValue, Method};
use dotenvy::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use pokedex_api::{app, db::init_db};

// cargo watch -c -x run

#[tokio::main]
async fn main() {
    dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set.");
    let db_pool = init_db(&database_url).await;
    let addr = std::env::var("BACKEND_URL").unwrap_or_else(|_| "127.0.0.1:8000".into());

    let origin =
        std::env::var("FRONTEND_ORIGIN").unwrap_or_else(|_| "http://localhost:3000".into());
    let cors = CorsLayer::new()
        .allow_origin(origin.parse::<HeaderValue>().unwrap())
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
        ])
        .allow_credentials(true);

    let app = app::build_routes().with_state(db_pool).layer(cors);

    let listener = TcpListener::bind(&addr).await.unwrap();

    println!("🚀 Serveur démarré sur http://{addr}");

    axum::serve(listener, app).into_future().await.unwrap();
}
