use anyhow::Context;
use cafe_storefront::{
    db::{create_orm_conn, create_pool, run_migrations},
    repository::PgRepository,
    seed::{DEMO_USERS, seed_demo},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().with_env_filter("info").init();

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;

    let pool = create_pool(&database_url).await?;
    // Ensure migrations are applied.
    run_migrations(&pool).await?;

    let repo = PgRepository::new(pool.clone(), create_orm_conn(pool));
    seed_demo(&repo).await?;

    let usernames: Vec<&str> = DEMO_USERS.iter().map(|(name, _)| *name).collect();
    tracing::info!(users = ?usernames, "seed completed");
    Ok(())
}
