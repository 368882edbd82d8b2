use anyhow::Context;
use catalog_kernel::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load catalog settings")?;
    catalog_telemetry::init(&settings.telemetry).context("failed to initialize telemetry")?;

    tracing::info!(
        env = ?settings.environment,
        db = %settings.database.url,
        "catalog-app bootstrap starting"
    );

    let pool = catalog_db::connect(&settings.database).await?;
    let registry = catalog_app::bootstrap(&settings, &pool).await?;

    tracing::info!(
        modules = registry.module_count(),
        "catalog-app bootstrap complete"
    );

    let served = catalog_http::start_server(&registry, &settings).await;

    registry.stop_modules().await?;
    pool.close().await;

    served
}
