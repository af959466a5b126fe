use dotenvy::dotenv;
use std::sync::Arc;

mod application;
mod data;
mod domain;
mod infrastructure;
mod presentation;

use application::notification::NotificationPublisher;
use application::{ImportService, PostQueryService, PostService, UserService};
use data::{
    memory::InMemoryStore, post_repository::PostRepository,
    post_repository::PostgresPostRepository, user_repository::PostgresUserRepository,
    user_repository::UserRepository,
};
use infrastructure::{
    config::AppConfig,
    database::{create_pool, run_migrations},
    logging::init_logging,
    notification::{
        spawn_notification_logger, BroadcastNotificationPublisher, RedisNotificationPublisher,
    },
};
use presentation::http_handlers::{json_config, UploadLimits};
use presentation::routes::configure_routes;

type PostRepo = Arc<dyn PostRepository + Send + Sync>;
type UserRepo = Arc<dyn UserRepository + Send + Sync>;

/// Application services shared by every worker.
#[derive(Clone)]
struct Services {
    users: Arc<UserService>,
    posts: Arc<PostService>,
    queries: Arc<PostQueryService>,
    imports: Arc<ImportService>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    init_logging();

    let config = AppConfig::from_env()?;

    tracing::info!("Starting travel blog server...");
    tracing::info!("HTTP server will listen on {}", config.http_addr());

    // Repositories
    let (post_repo, user_repo) = build_repositories(&config).await?;

    // Notifications
    let notifier = build_notifier(&config).await?;

    // Application services
    tracing::info!("Initializing services...");
    let services = Services {
        users: Arc::new(UserService::new(user_repo.clone())),
        posts: Arc::new(PostService::new(
            post_repo.clone(),
            user_repo.clone(),
            notifier,
        )),
        queries: Arc::new(PostQueryService::new(post_repo.clone())),
        imports: Arc::new(ImportService::new(post_repo, user_repo)),
    };
    tracing::info!("Services initialized successfully");

    run_http_server(&config, services).await?;

    tracing::info!("Shutting down...");
    Ok(())
}

async fn build_repositories(config: &AppConfig) -> anyhow::Result<(PostRepo, UserRepo)> {
    match &config.database_url {
        Some(database_url) => {
            tracing::info!("Connecting to database...");
            let pool = create_pool(database_url, config.database_max_connections).await?;

            tracing::info!("Running database migrations...");
            run_migrations(&pool).await?;

            let post_repo: PostRepo = Arc::new(PostgresPostRepository::new(pool.clone()));
            let user_repo: UserRepo = Arc::new(PostgresUserRepository::new(pool));
            Ok((post_repo, user_repo))
        }
        None => {
            tracing::warn!("DATABASE_URL is not set, data is kept in memory and lost on exit");
            let store = Arc::new(InMemoryStore::new());
            let post_repo: PostRepo = store.clone();
            let user_repo: UserRepo = store;
            Ok((post_repo, user_repo))
        }
    }
}

async fn build_notifier(config: &AppConfig) -> anyhow::Result<Arc<dyn NotificationPublisher>> {
    match &config.redis_url {
        Some(redis_url) => {
            let publisher =
                RedisNotificationPublisher::connect(redis_url, &config.notification_channel)
                    .await?;
            Ok(Arc::new(publisher))
        }
        None => {
            tracing::info!("REDIS_URL is not set, post notifications are only logged");
            let publisher = BroadcastNotificationPublisher::default();
            spawn_notification_logger(publisher.subscribe());
            Ok(Arc::new(publisher))
        }
    }
}

/// Configure CORS for the HTTP server with allowed origins from .env
fn configure_cors(allowed_origins: &[String]) -> actix_cors::Cors {
    use actix_cors::Cors;
    use actix_web::http::header;

    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
        .expose_headers(vec![header::CONTENT_DISPOSITION])
        .max_age(3600);

    // Добавляем каждый разрешенный домен
    for origin in allowed_origins {
        cors = cors.allowed_origin(origin);
        tracing::debug!("Added allowed CORS origin: {}", origin);
    }

    cors
}

async fn run_http_server(config: &AppConfig, services: Services) -> anyhow::Result<()> {
    use actix_web::{middleware::Logger, web, App, HttpServer};

    tracing::info!("Configuring HTTP server...");
    tracing::info!("CORS allowed origins: {:?}", config.cors_allowed_origins);

    let addr = config.http_addr();
    let cors_allowed_origins = config.cors_allowed_origins.clone();
    let upload_limits = UploadLimits {
        max_bytes: config.max_upload_bytes,
    };

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(configure_cors(&cors_allowed_origins))
            .app_data(web::Data::new(services.users.clone()))
            .app_data(web::Data::new(services.posts.clone()))
            .app_data(web::Data::new(services.queries.clone()))
            .app_data(web::Data::new(services.imports.clone()))
            .app_data(web::Data::new(upload_limits))
            .app_data(json_config())
            .configure(configure_routes)
    })
    .bind(&addr)?
    .run();

    tracing::info!("HTTP server running on {}", addr);

    server.await?;

    Ok(())
}
