use std::{process, sync::Arc};

use brusio::{
    application::error::AppError,
    application::repos::GroupsRepo,
    cache::{CacheConfig, PageCacheState, PageStore},
    config,
    infra::{
        db::SqliteRepositories,
        error::InfraError,
        http::{RouterState, build_router},
        telemetry,
        uploads::UploadStorage,
    },
};
use tracing::{Dispatch, Level, dispatcher, error, info};
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

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::AddGroup(args) => run_add_group(settings, args).await,
    }
}

async fn connect_repositories(settings: &config::Settings) -> Result<SqliteRepositories, AppError> {
    let pool = SqliteRepositories::connect(
        &settings.database.url,
        settings.database.max_connections,
    )
    .await
    .map_err(|err| InfraError::database(format!("failed to connect: {err}")))?;
    SqliteRepositories::run_migrations(&pool)
        .await
        .map_err(|err| InfraError::database(format!("failed to run migrations: {err}")))?;
    Ok(SqliteRepositories::new(pool))
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let db = connect_repositories(&settings).await?;

    let uploads = Arc::new(
        UploadStorage::new(settings.uploads.directory.clone()).map_err(InfraError::from)?,
    );

    let cache = settings.cache.is_enabled().then(|| PageCacheState {
        store: Arc::new(PageStore::new(&CacheConfig {
            ttl: settings.cache.home_ttl,
            max_pages: settings.cache.max_pages,
        })),
    });

    let state = RouterState::new(
        db,
        settings.feed.posts_per_page,
        uploads,
        cache,
        settings.uploads.max_request_bytes,
    );
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.bind)
        .await
        .map_err(InfraError::from)?;
    info!(
        target = "brusio::server",
        addr = %settings.server.bind,
        "listening"
    );

    axum::serve(listener, router.into_make_service())
        .await
        .map_err(InfraError::from)?;
    Ok(())
}

async fn run_add_group(
    settings: config::Settings,
    args: config::AddGroupArgs,
) -> Result<(), AppError> {
    let db = connect_repositories(&settings).await?;

    let group = db
        .insert_group(&args.title, &args.slug, &args.description)
        .await
        .map_err(|err| AppError::unexpected(format!("failed to create group: {err}")))?;
    info!(
        target = "brusio::cli",
        id = group.id,
        slug = %group.slug,
        "group created"
    );
    Ok(())
}
