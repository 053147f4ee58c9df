use std::{future::IntoFuture, process, sync::Arc};

use gazette::{
    application::{
        articles::ArticleFeedService,
        comments::CommentService,
        error::AppError,
        repos::{ArticleStore, CommentFetcher, CommentStore, HealthCheck},
    },
    cache::{CacheConfig, CommentCacheManager},
    config,
    infra::{
        cache_backend,
        comment_client::HttpCommentFetcher,
        db::PostgresRepositories,
        error::InfraError,
        http::{self, ArticleState, CommentState},
        snapshot_refresher::{ArticleSnapshotRefresher, RefresherConfig},
        telemetry,
    },
};
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

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
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match cli_args.command {
        config::Command::Articles(_) => run_articles(settings).await,
        config::Command::Comments(_) => run_comments(settings).await,
    }
}

async fn run_articles(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let cache = cache_backend::connect(&settings.cache).await;
    let cache_config = CacheConfig::from(&settings.cache);

    let client = HttpCommentFetcher::new(
        settings.comment_service.url.clone(),
        settings.comment_service.timeout,
    )
    .map_err(AppError::from)?;
    info!(
        target = "gazette::articles",
        url = client.url(),
        "comment service client configured"
    );
    let fetcher: Arc<dyn CommentFetcher> = Arc::new(client);
    let articles: Arc<dyn ArticleStore> = repositories.clone();
    let health: Arc<dyn HealthCheck> = repositories.clone();

    let feed = Arc::new(ArticleFeedService::new(
        articles.clone(),
        fetcher.clone(),
        cache.clone(),
        cache_config.snapshot_ttl,
    ));

    let refresher = if settings.refresher.enabled {
        let refresher = ArticleSnapshotRefresher::new(
            articles,
            fetcher,
            cache,
            RefresherConfig::from_settings(&settings.refresher, &settings.cache),
        );
        Some(refresher.spawn())
    } else {
        info!(target = "gazette::articles", "snapshot refresher disabled");
        None
    };

    let router = http::build_article_router(ArticleState { feed, db: health });
    let result = serve_http(&settings, router, "articles").await;

    if let Some(handle) = refresher {
        handle.shutdown().await;
    }

    result
}

async fn run_comments(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let cache = cache_backend::connect(&settings.cache).await;
    let cache_config = CacheConfig::from(&settings.cache);

    let store: Arc<dyn CommentStore> = repositories.clone();
    let health: Arc<dyn HealthCheck> = repositories;
    let manager = Arc::new(CommentCacheManager::new(cache, &cache_config));
    info!(
        target = "gazette::comments",
        recency_capacity = manager.recency().capacity(),
        comment_ttl_secs = cache_config.comment_ttl.as_secs(),
        "comment cache configured"
    );
    let comments = Arc::new(CommentService::new(store, manager));

    let router = http::build_comment_router(CommentState {
        comments,
        db: health,
    });
    serve_http(&settings, router, "comments").await
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

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

async fn serve_http(
    settings: &config::Settings,
    router: axum::Router,
    service: &'static str,
) -> Result<(), AppError> {
    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "gazette::http",
        service,
        addr = %settings.server.addr,
        "listening"
    );

    let grace = settings.server.graceful_shutdown;
    let server = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .into_future();

    // Drain in-flight requests for at most `grace` once the signal arrives.
    tokio::select! {
        result = server => {
            result.map_err(|err| AppError::unexpected(format!("server error: {err}")))?;
        }
        _ = async {
            shutdown_signal().await;
            tokio::time::sleep(grace).await;
        } => {
            warn!(
                target = "gazette::http",
                grace_secs = grace.as_secs(),
                "graceful shutdown timed out, dropping open connections"
            );
        }
    }

    info!(target = "gazette::http", service, "server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
