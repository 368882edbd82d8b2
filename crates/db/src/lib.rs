//! SQLite pool factory and schema bootstrap for the catalog service.

use anyhow::Context;
use catalog_kernel::{settings::DatabaseSettings, Migration};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::time::Duration;

/// Open a connection pool for the configured database.
///
/// In-memory databases live and die with a single connection, so the pool is
/// pinned to one connection that is never recycled.
pub async fn connect(settings: &DatabaseSettings) -> anyhow::Result<SqlitePool> {
    let in_memory = settings.url.contains(":memory:");

    let options = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
    } else {
        SqlitePoolOptions::new().max_connections(settings.max_connections)
    };

    let pool = options
        .connect(&settings.url)
        .await
        .with_context(|| format!("failed to connect to database at {}", settings.url))?;

    tracing::info!(
        target: "catalog-db",
        url = %settings.url,
        in_memory,
        "database pool ready"
    );

    Ok(pool)
}

/// Apply every collected schema statement in order.
pub async fn apply_migrations(
    pool: &SqlitePool,
    migrations: &[(String, Migration)],
) -> anyhow::Result<()> {
    for (module, migration) in migrations {
        tracing::info!(
            target: "catalog-db",
            module = %module,
            migration = migration.id,
            "applying schema"
        );

        sqlx::raw_sql(migration.up)
            .execute(pool)
            .await
            .with_context(|| format!("failed to apply {}::{}", module, migration.id))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_settings() -> DatabaseSettings {
        DatabaseSettings {
            url: "sqlite::memory:".to_string(),
            ..DatabaseSettings::default()
        }
    }

    #[tokio::test]
    async fn applies_migrations_and_is_rerunnable() {
        let pool = connect(&memory_settings()).await.unwrap();
        let migrations = vec![(
            "test".to_string(),
            Migration {
                id: "001_init",
                up: "CREATE TABLE IF NOT EXISTS things (id INTEGER PRIMARY KEY, name TEXT NOT NULL);",
            },
        )];

        apply_migrations(&pool, &migrations).await.unwrap();
        apply_migrations(&pool, &migrations).await.unwrap();

        sqlx::query("INSERT INTO things (name) VALUES (?)")
            .bind("one")
            .execute(&pool)
            .await
            .unwrap();
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM things")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn broken_statement_reports_module_and_id() {
        let pool = connect(&memory_settings()).await.unwrap();
        let migrations = vec![(
            "broken".to_string(),
            Migration {
                id: "001_oops",
                up: "CREATE TABLOID nope;",
            },
        )];

        let err = apply_migrations(&pool, &migrations).await.unwrap_err();
        assert!(err.to_string().contains("broken::001_oops"));
    }
}
