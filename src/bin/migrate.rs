use anyhow::Context;
use cafe_storefront::db::{create_pool, run_migrations};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().with_env_filter("info").init();

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
    let pool = create_pool(&database_url).await?;
    run_migrations(&pool).await?;
    tracing::info!("migrations applied");
    Ok(())
}
