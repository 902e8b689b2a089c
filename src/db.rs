use anyhow::{Context, Result};
use directories::ProjectDirs;
use sqlx::{any::AnyConnectOptions, AnyPool, ConnectOptions, migrate::Migrator};
use sqlx::any::AnyPoolOptions;
use std::{path::PathBuf, str::FromStr};
use std::sync::Once;

use crate::storage::Storage;

// Ensure drivers are installed exactly once for sqlx::any
static INSTALL_DRIVERS: Once = Once::new();

// Embed SQL migrations from the migrations/ directory
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Row counts for the feed cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub expired_entries: usize,
}

#[derive(Clone)]
pub struct Database {
    pool: AnyPool,
}

impl Database {
    // Create a connection pool. If database_url is None, use a sensible default
    // (SQLite file in the user's data directory).
    pub async fn connect(database_url: Option<&str>) -> Result<Self> {
        INSTALL_DRIVERS.call_once(sqlx::any::install_default_drivers);

        let url = match database_url {
            Some(u) if !u.trim().is_empty() => u.to_string(),
            _ => default_sqlite_url()?,
        };

        let opts = AnyConnectOptions::from_str(&url)
            .with_context(|| format!("invalid database URL: {url}"))?;
        // Quiet by default; callers can enable SQLX_LOG if they want
        let opts = opts.disable_statement_logging();

        let pool = AnyPoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await
            .with_context(|| format!("failed to connect to database: {url}"))?;

        tracing::debug!(%url, "connected to feed cache database");
        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> Result<()> {
        match MIGRATOR.run(&self.pool).await {
            Ok(_) => Ok(()),
            Err(e) => {
                let msg = e.to_string();
                let looks_modified = msg.contains("was previously applied but has been modified");
                if looks_modified {
                    // The cache is disposable: reset the ledger and rebuild.
                    tracing::warn!("migration ledger mismatch, resetting feed cache schema");
                    for stmt in ["DELETE FROM _sqlx_migrations", "DROP TABLE IF EXISTS feed_cache"] {
                        if let Err(reset_err) = sqlx::query(stmt).execute(&self.pool).await {
                            tracing::warn!(%stmt, error = %reset_err, "schema reset step failed");
                        }
                    }
                    MIGRATOR.run(&self.pool).await.context("running migrations after ledger reset")
                } else {
                    Err(e).context("running migrations")
                }
            }
        }
    }

    pub fn pool(&self) -> &AnyPool { &self.pool }

    /// Delete cache entries whose key starts with `prefix` (all entries when `None`).
    pub async fn clear_cache_prefix(&self, prefix: Option<&str>) -> Result<u64> {
        let result = if let Some(p) = prefix {
            let like = format!("{}%", p);
            sqlx::query("DELETE FROM feed_cache WHERE key LIKE ?")
                .bind(like)
                .execute(&self.pool)
                .await?
        } else {
            sqlx::query("DELETE FROM feed_cache")
                .execute(&self.pool)
                .await?
        };
        Ok(result.rows_affected())
    }

    /// Count entries, and those written at or before `expired_before` (epoch millis).
    pub async fn cache_stats(&self, expired_before: i64) -> Result<CacheStats> {
        let entries: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM feed_cache")
            .fetch_one(&self.pool)
            .await?;
        let expired: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM feed_cache WHERE written_at <= ?")
            .bind(expired_before)
            .fetch_one(&self.pool)
            .await?;
        Ok(CacheStats { entries: entries as usize, expired_entries: expired as usize })
    }

    pub async fn vacuum(&self) -> Result<()> {
        // Best-effort: works on SQLite
        if let Err(e) = sqlx::query("VACUUM").execute(&self.pool).await {
            tracing::warn!(error = %e, "vacuum skipped");
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl Storage for Database {
    async fn get_cache(&self, key: &str) -> Result<Option<String>> {
        let row = sqlx::query_scalar::<_, String>("SELECT payload FROM feed_cache WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn put_cache(&self, key: &str, payload: &str, written_at: i64) -> Result<()> {
        sqlx::query(
            "INSERT INTO feed_cache(key, payload, written_at) VALUES (?, ?, ?)\n             ON CONFLICT(key) DO UPDATE SET payload=excluded.payload, written_at=excluded.written_at",
        )
        .bind(key)
        .bind(payload)
        .bind(written_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

fn default_sqlite_url() -> Result<String> {
    let proj = ProjectDirs::from("dev", "showreel", "showreel")
        .context("unable to determine data directory for default sqlite path")?;
    let mut path: PathBuf = proj.data_dir().to_path_buf();
    std::fs::create_dir_all(&path).with_context(|| format!("creating data dir: {}", path.display()))?;
    path.push("showreel.db");

    // Encode spaces in the path for a valid sqlite URL
    let mut path_str = path.to_string_lossy().to_string();
    if path_str.contains(' ') { path_str = path_str.replace(' ', "%20"); }
    Ok(format!("sqlite://{path_str}?mode=rwc"))
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn temp_db(dir: &tempfile::TempDir) -> Database {
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("cache.db").display());
        let db = Database::connect(Some(&url)).await.unwrap();
        db.run_migrations().await.unwrap();
        db
    }

    #[tokio::test]
    async fn upsert_replaces_payload() {
        let dir = tempfile::tempdir().unwrap();
        let db = temp_db(&dir).await;

        assert!(db.get_cache("youtube|videos").await.unwrap().is_none());
        db.put_cache("youtube|videos", "[1]", 10).await.unwrap();
        db.put_cache("youtube|videos", "[2]", 20).await.unwrap();
        assert_eq!(db.get_cache("youtube|videos").await.unwrap().as_deref(), Some("[2]"));

        let stats = db.cache_stats(15).await.unwrap();
        assert_eq!(stats, CacheStats { entries: 1, expired_entries: 0 });
    }

    #[tokio::test]
    async fn clear_by_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let db = temp_db(&dir).await;

        db.put_cache("youtube|videos|a", "x", 1).await.unwrap();
        db.put_cache("github|repos|b", "y", 2).await.unwrap();
        assert_eq!(db.cache_stats(1).await.unwrap().expired_entries, 1);

        assert_eq!(db.clear_cache_prefix(Some("youtube|")).await.unwrap(), 1);
        assert!(db.get_cache("youtube|videos|a").await.unwrap().is_none());
        assert_eq!(db.clear_cache_prefix(None).await.unwrap(), 1);
        assert_eq!(db.cache_stats(0).await.unwrap().entries, 0);
    }

    #[tokio::test]
    async fn migrations_are_rerunnable() {
        let dir = tempfile::tempdir().unwrap();
        let db = temp_db(&dir).await;
        db.run_migrations().await.unwrap();
    }

    #[tokio::test]
    async fn modified_migration_resets_schema() {
        let dir = tempfile::tempdir().unwrap();
        let db = temp_db(&dir).await;
        db.put_cache("youtube|latest", "stale", 1).await.unwrap();
        sqlx::query("UPDATE _sqlx_migrations SET checksum = X'00'")
            .execute(db.pool())
            .await
            .unwrap();

        db.run_migrations().await.unwrap();

        assert!(db.get_cache("youtube|latest").await.unwrap().is_none());
        db.put_cache("youtube|latest", "fresh", 2).await.unwrap();
        assert_eq!(db.get_cache("youtube|latest").await.unwrap().as_deref(), Some("fresh"));
        db.vacuum().await.unwrap();
    }
}
