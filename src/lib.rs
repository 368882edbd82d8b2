//! Book catalog application library
//!
//! Wires the project modules onto the catalog framework crates.

pub mod modules;

use anyhow::Context;
use catalog_kernel::{settings::Settings, InitCtx, ModuleRegistry};
use sqlx::SqlitePool;

/// Re-export commonly used types
pub use modules::*;

/// Register every module, apply their schema statements, then run the
/// init and start phases. The returned registry is ready to be served.
pub async fn bootstrap(settings: &Settings, pool: &SqlitePool) -> anyhow::Result<ModuleRegistry> {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, pool);

    catalog_db::apply_migrations(pool, &registry.collect_migrations())
        .await
        .context("failed to apply module schema")?;

    let ctx = InitCtx {
        settings,
        db: pool,
    };
    registry.init_modules(&ctx).await?;
    registry.start_modules(&ctx).await?;

    Ok(registry)
}
