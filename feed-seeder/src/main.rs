mod corpus;
mod retry;
mod seed;

use std::sync::Arc;

use clap::Parser;
use feed_server::data::post_repository::PostgresPostRepository;
use feed_server::data::user_repository::{PostgresUserRepository, UserRepository};
use feed_server::domain::user::NewUser;
use feed_server::infrastructure::database::{create_pool, run_migrations};
use feed_server::infrastructure::logging::init_logging;
use tracing::info;

#[derive(Parser, Debug)]
#[command(about = "Seed the feed database with demo users and synthesized posts")]
struct Cli {
    /// Number of synthesized posts for the prolific demo author.
    #[clap(long, default_value_t = 100_000)]
    posts: u64,

    /// Maximum concurrent inserts.
    #[clap(long, default_value_t = 16)]
    concurrency: usize,

    #[clap(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_logging();

    let args = Cli::parse();

    let pool = create_pool(&args.database_url).await?;
    run_migrations(&pool).await?;

    let users = PostgresUserRepository::new(pool.clone());
    let posts = Arc::new(PostgresPostRepository::new(pool.clone()));

    info!("start seeding");
    seed::seed_starter_users(&users, posts.as_ref()).await?;

    let author = users
        .create(NewUser {
            name: Some("Nahab".into()),
            email: "nahab@example.com".into(),
        })
        .await?;
    info!(user_id = author.id, "prolific author created");

    let report = seed::synthesize_posts(
        Arc::clone(&posts),
        author.id,
        args.posts,
        args.concurrency,
        retry::RetryPolicy::default(),
    )
    .await?;

    info!(
        inserted = report.inserted,
        failed = report.failed,
        "seeding finished"
    );

    pool.close().await;
    Ok(())
}
