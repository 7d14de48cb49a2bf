/// SQLite persistence for the asset and tool-component catalog
///
/// The editor only ever reads these tables; rows arrive through ingest (or
/// test seeding) and are listed for reference selection in node
/// configuration.

use crate::catalog::{AssetRef, ComponentKind, ComponentRef};
use anyhow::Result;
use sqlx::{sqlite::SqlitePool, Row};

/// SQLite-backed catalog storage
#[derive(Debug, Clone)]
pub struct CatalogStorage {
    pool: SqlitePool,
}

impl CatalogStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Initialize the catalog schema
    ///
    /// Safe to call multiple times (uses IF NOT EXISTS).
    pub async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS user_assets (
                asset_id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS tool_components (
                component_id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                kind TEXT NOT NULL,
                service_url TEXT,
                param_desc TEXT,
                schedule TEXT,
                created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_tool_components_kind ON tool_components(kind)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// List assets available for reference selection
    pub async fn list_assets(&self) -> Result<Vec<AssetRef>> {
        let rows = sqlx::query("SELECT asset_id, name FROM user_assets ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        let mut assets = Vec::new();
        for row in rows {
            assets.push(AssetRef {
                asset_id: row.get("asset_id"),
                name: row.get("name"),
            });
        }

        Ok(assets)
    }

    /// List tool components available for node binding
    pub async fn list_components(&self) -> Result<Vec<ComponentRef>> {
        let rows = sqlx::query(
            r#"
            SELECT component_id, name, kind, service_url, param_desc, schedule
            FROM tool_components ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut components = Vec::new();
        for row in rows {
            let kind: String = row.get("kind");
            components.push(ComponentRef {
                component_id: row.get("component_id"),
                name: row.get("name"),
                kind: ComponentKind::parse(&kind)?,
                service_url: row.get("service_url"),
                param_desc: row.get("param_desc"),
                schedule: row.get("schedule"),
            });
        }

        Ok(components)
    }

    /// Insert or replace an asset row (catalog ingest / seeding)
    pub async fn upsert_asset(&self, asset: &AssetRef) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO user_assets (asset_id, name)
            VALUES (?, ?)
            ON CONFLICT(asset_id) DO UPDATE SET name = excluded.name
            "#,
        )
        .bind(&asset.asset_id)
        .bind(&asset.name)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Insert or replace a tool component row (catalog ingest / seeding)
    pub async fn upsert_component(&self, component: &ComponentRef) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO tool_components (component_id, name, kind, service_url, param_desc, schedule)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(component_id) DO UPDATE SET
                name = excluded.name,
                kind = excluded.kind,
                service_url = excluded.service_url,
                param_desc = excluded.param_desc,
                schedule = excluded.schedule
            "#,
        )
        .bind(&component.component_id)
        .bind(&component.name)
        .bind(component.kind.as_str())
        .bind(&component.service_url)
        .bind(&component.param_desc)
        .bind(&component.schedule)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
