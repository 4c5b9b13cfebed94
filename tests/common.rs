use sqlx::{PgPool, postgres::PgPoolOptions};
use std::cell::OnceCell;
use std::time::Duration;
use tokio::net::TcpListener;

thread_local! {
    // Un pool par thread de test: chaque #[tokio::test] a son propre
    // runtime, et un pool partagé entre runtimes bloque dès que le
    // runtime créateur est détruit.
    static POOL: OnceCell<&'static PgPool> = const { OnceCell::new() };
}

pub async fn test_pool() -> &'static PgPool {
    let _ = dotenvy::dotenv();

    if let Some(pool) = POOL.with(|cell| cell.get().copied()) {
        return pool;
    }

    let url = std::env::var("TEST_DATABASE_URL").expect("Set TEST_DATABASE_URL for tests");

    eprintln!("[tests] Using TEST_DATABASE_URL={}", url);
    let pool = PgPoolOptions::new()
        .max_connections(30)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&url)
        .await
        .expect("DB connect failed");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Migration failed");
    let pool: &'static PgPool = Box::leak(Box::new(pool));
    POOL.with(|cell| {
        let _ = cell.set(pool);
    });
    pool
}

#[allow(dead_code)]
pub fn setup_jwt_secret() {
    // SAFETY: même valeur posée par tous les tests du binaire.
    unsafe { std::env::set_var("JWT_SECRET", "integration-test-secret") };
}

#[allow(dead_code)]
pub async fn start_server() -> (String, tokio::task::JoinHandle<()>) {
    setup_jwt_secret();
    let pool = test_pool().await.clone();
    let app = pokedex_api::app::build_routes().with_state(pool);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let url = format!("http://{}", addr);

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).into_future().await {
            eprintln!("serve error: {e}");
        }
    });

    for _ in 0..30 {
        if let Ok(resp) = reqwest::get(format!("{url}/test")).await {
            if resp.status().is_success() {
                break;
            }
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    (url, handle)
}

#[allow(dead_code)]
pub async fn delete_pokemon_row(id: i32) {
    let pool = test_pool().await;
    let _ = sqlx::query("DELETE FROM pokemon WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await;
}

#[allow(dead_code)]
pub async fn delete_user(username: &str) {
    let pool = test_pool().await;
    let _ = sqlx::query("DELETE FROM users WHERE username = $1")
        .bind(username)
        .execute(pool)
        .await;
}
