use std::sync::Arc;

use actix_cors::Cors;
use actix_web::middleware::DefaultHeaders;
use actix_web::{App, HttpServer, web};
use feed_server::application::feed_service::FeedService;
use feed_server::data::post_repository::PostgresPostRepository;
use feed_server::data::user_repository::PostgresUserRepository;
use feed_server::domain::feed::POSTS_PER_PAGE;
use feed_server::infrastructure::config::AppConfig;
use feed_server::infrastructure::database::{create_pool, run_migrations};
use feed_server::infrastructure::logging::init_logging;
use feed_server::presentation::handlers;
use feed_server::presentation::middleware::{RequestIdMiddleware, TimingMiddleware};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let config = AppConfig::from_env()?;
    let pool = create_pool(&config.database_url).await?;
    run_migrations(&pool).await?;

    let user_repo = Arc::new(PostgresUserRepository::new(pool.clone()));
    let post_repo = Arc::new(PostgresPostRepository::new(pool.clone()));
    let feed_service = FeedService::new(post_repo, user_repo, POSTS_PER_PAGE);

    let config_data = config.clone();

    HttpServer::new(move || {
        let cors = build_cors(&config_data);
        App::new()
            .wrap(RequestIdMiddleware)
            .wrap(TimingMiddleware)
            .wrap(
                DefaultHeaders::new()
                    .add(("X-Content-Type-Options", "nosniff"))
                    .add(("Referrer-Policy", "no-referrer"))
                    .add(("Permissions-Policy", "geolocation=()"))
                    .add(("Cross-Origin-Opener-Policy", "same-origin")),
            )
            .wrap(cors)
            .app_data(web::Data::new(feed_service.clone()))
            .service(
                web::scope("/api")
                    .route("/health", web::get().to(handlers::health))
                    .service(handlers::feed::feed)
                    .service(handlers::feed::post_detail),
            )
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;

    Ok(())
}

fn build_cors(config: &AppConfig) -> Cors {
    let mut cors = Cors::default()
        .allowed_methods(vec!["GET"])
        .allowed_headers(vec![
            actix_web::http::header::CONTENT_TYPE,
            actix_web::http::header::AUTHORIZATION,
        ])
        .supports_credentials()
        .max_age(3600);

    for origin in &config.cors_origins {
        cors = cors.allowed_origin(origin);
    }

    cors
}
