use std::{process, sync::Arc};

use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;
use vitrina::{
    application::{
        error::AppError,
        invalidation::{InvalidationCoordinator, PageCache},
        repos::{CategoriesRepo, ProductsRepo, RatesRepo, SessionsRepo, SourceHealth},
        sessions::SessionService,
    },
    cache::{CacheConfig, CacheState, CategoryCache, ProductCatalog, RateCache, ResponseStore},
    config,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, RequestPolicy, RouterState},
        telemetry,
    },
};

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (_cli_args, settings) = config::load_with_cli()?;

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    run_serve(settings).await
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let state = build_router_state(repositories, &settings);
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.public_addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        addr = %settings.server.public_addr,
        "vitrina catalog service listening"
    );

    axum::serve(listener, router.into_make_service())
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    Ok(())
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    let pool =
        PostgresRepositories::connect(database_url, settings.database.max_connections.get())
            .await
            .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

fn build_router_state(
    repositories: Arc<PostgresRepositories>,
    settings: &config::Settings,
) -> RouterState {
    let cache_config = CacheConfig::from(&settings.cache);

    let products_repo: Arc<dyn ProductsRepo> = repositories.clone();
    let categories_repo: Arc<dyn CategoriesRepo> = repositories.clone();
    let rates_repo: Arc<dyn RatesRepo> = repositories.clone();
    let sessions_repo: Arc<dyn SessionsRepo> = repositories.clone();
    let source_health: Arc<dyn SourceHealth> = repositories.clone();

    let products = Arc::new(ProductCatalog::new(products_repo, &cache_config));
    let categories = Arc::new(CategoryCache::new(categories_repo, &cache_config));
    let rates = Arc::new(RateCache::new(rates_repo, &cache_config));
    let sessions = Arc::new(SessionService::new(sessions_repo));

    // The response store always exists so the coordinator has a fan-out
    // target; the middleware only serves from it when enabled.
    let response_store = Arc::new(ResponseStore::new(&cache_config));
    let response_cache = Some(CacheState {
        enabled: cache_config.enable_response_cache,
        store: Arc::clone(&response_store),
    });

    let coordinator = Arc::new(InvalidationCoordinator::new(
        response_store as Arc<dyn PageCache>,
        Arc::clone(&products),
    ));

    RouterState {
        products,
        categories,
        rates,
        sessions,
        coordinator,
        source_health,
        response_cache,
        policy: Arc::new(RequestPolicy::from_settings(settings)),
    }
}
