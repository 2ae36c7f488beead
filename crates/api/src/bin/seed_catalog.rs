//! Loads catalog products from a JSON file into PostgreSQL.
//!
//! Usage: `seed-catalog <catalog.json>` with `DATABASE_URL` set.

use store::PostgresStore;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let path = std::env::args()
        .nth(1)
        .expect("usage: seed-catalog <catalog.json>");
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let raw = tokio::fs::read_to_string(&path)
        .await
        .unwrap_or_else(|err| panic!("failed to read {path}: {err}"));

    let store = PostgresStore::connect(&database_url, 2)
        .await
        .expect("failed to connect to database");
    store
        .run_migrations()
        .await
        .expect("failed to run migrations");

    let report = api::seed::seed_catalog(&store, &raw)
        .await
        .expect("catalog import failed");
    tracing::info!(%path, inserted = report.inserted, skipped = report.skipped, "done");
}
