/// SQLite persistence for workflow instances and templates
///
/// Flows and reusable templates are stored as JSON payload columns with
/// indexed metadata fields for listing. All calls may fail; failures surface
/// to the caller and never mutate in-memory editor state.

use crate::flow::FlowSnapshot;
use anyhow::Result;
use sqlx::{sqlite::SqlitePool, Row};
use uuid::Uuid;

/// SQLite-backed storage for named workflows and templates
#[derive(Debug, Clone)]
pub struct FlowStorage {
    pool: SqlitePool,
}

/// Listing row for workflow instances
#[derive(Debug, serde::Serialize)]
pub struct FlowSummary {
    pub flow_id: String,
    pub name: String,
    pub asset_id: Option<String>,
    pub template_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Full workflow row including the deserialized graph payload
#[derive(Debug, serde::Serialize)]
pub struct FlowRecord {
    pub flow_id: String,
    pub name: String,
    pub asset_id: Option<String>,
    pub template_id: Option<String>,
    pub payload: FlowSnapshot,
    pub created_at: String,
    pub updated_at: String,
}

/// Listing row for reusable templates
#[derive(Debug, serde::Serialize)]
pub struct TemplateSummary {
    pub template_id: String,
    pub name: String,
    pub description: Option<String>,
    pub asset_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Full template row including the deserialized graph payload
#[derive(Debug, serde::Serialize)]
pub struct TemplateRecord {
    pub template_id: String,
    pub name: String,
    pub description: Option<String>,
    pub asset_id: Option<String>,
    pub payload: FlowSnapshot,
}

impl FlowStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Initialize the flow and template schema
    ///
    /// Safe to call multiple times (uses IF NOT EXISTS).
    pub async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS agent_flows (
                flow_id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                asset_id TEXT,
                template_id TEXT,
                payload JSON NOT NULL,
                created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_agent_flows_name
            ON agent_flows(name)
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS workflow_templates (
                template_id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT,
                asset_id TEXT,
                payload JSON NOT NULL,
                created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_workflow_templates_name
            ON workflow_templates(name)
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Persist a new workflow and return its assigned id
    pub async fn create_flow(
        &self,
        name: &str,
        asset_id: Option<&str>,
        template_id: Option<&str>,
        payload: &FlowSnapshot,
    ) -> Result<String> {
        let flow_id = Uuid::new_v4().to_string();
        let payload_json = serde_json::to_string(payload)?;

        sqlx::query(
            r#"
            INSERT INTO agent_flows (flow_id, name, asset_id, template_id, payload)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&flow_id)
        .bind(name)
        .bind(asset_id)
        .bind(template_id)
        .bind(&payload_json)
        .execute(&self.pool)
        .await?;

        tracing::info!(flow_id = %flow_id, name, "workflow created");
        Ok(flow_id)
    }

    /// Update an existing workflow; returns false when the id is unknown
    pub async fn update_flow(
        &self,
        flow_id: &str,
        name: &str,
        asset_id: Option<&str>,
        template_id: Option<&str>,
        payload: &FlowSnapshot,
    ) -> Result<bool> {
        let payload_json = serde_json::to_string(payload)?;

        let result = sqlx::query(
            r#"
            UPDATE agent_flows
            SET name = ?, asset_id = ?, template_id = ?, payload = ?,
                updated_at = CURRENT_TIMESTAMP
            WHERE flow_id = ?
            "#,
        )
        .bind(name)
        .bind(asset_id)
        .bind(template_id)
        .bind(&payload_json)
        .bind(flow_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Retrieve a workflow by id
    pub async fn get_flow(&self, flow_id: &str) -> Result<Option<FlowRecord>> {
        let row = sqlx::query(
            r#"
            SELECT flow_id, name, asset_id, template_id, payload, created_at, updated_at
            FROM agent_flows WHERE flow_id = ?
            "#,
        )
        .bind(flow_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let payload_json: String = row.get("payload");
                let payload: FlowSnapshot = serde_json::from_str(&payload_json)?;
                Ok(Some(FlowRecord {
                    flow_id: row.get("flow_id"),
                    name: row.get("name"),
                    asset_id: row.get("asset_id"),
                    template_id: row.get("template_id"),
                    payload,
                    created_at: row.get("created_at"),
                    updated_at: row.get("updated_at"),
                }))
            }
            None => Ok(None),
        }
    }

    /// List all workflows with metadata only
    pub async fn list_flows(&self) -> Result<Vec<FlowSummary>> {
        let rows = sqlx::query(
            r#"
            SELECT flow_id, name, asset_id, template_id, created_at, updated_at
            FROM agent_flows ORDER BY updated_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut flows = Vec::new();
        for row in rows {
            flows.push(FlowSummary {
                flow_id: row.get("flow_id"),
                name: row.get("name"),
                asset_id: row.get("asset_id"),
                template_id: row.get("template_id"),
                created_at: row.get("created_at"),
                updated_at: row.get("updated_at"),
            });
        }

        Ok(flows)
    }

    /// Delete a workflow by id
    pub async fn delete_flow(&self, flow_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM agent_flows WHERE flow_id = ?")
            .bind(flow_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Persist a new reusable template and return its assigned id
    pub async fn create_template(
        &self,
        name: &str,
        description: Option<&str>,
        asset_id: Option<&str>,
        payload: &FlowSnapshot,
    ) -> Result<String> {
        let template_id = Uuid::new_v4().to_string();
        let payload_json = serde_json::to_string(payload)?;

        sqlx::query(
            r#"
            INSERT INTO workflow_templates (template_id, name, description, asset_id, payload)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&template_id)
        .bind(name)
        .bind(description)
        .bind(asset_id)
        .bind(&payload_json)
        .execute(&self.pool)
        .await?;

        tracing::info!(template_id = %template_id, name, "template created");
        Ok(template_id)
    }

    /// Retrieve a template by id
    pub async fn get_template(&self, template_id: &str) -> Result<Option<TemplateRecord>> {
        let row = sqlx::query(
            r#"
            SELECT template_id, name, description, asset_id, payload
            FROM workflow_templates WHERE template_id = ?
            "#,
        )
        .bind(template_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let payload_json: String = row.get("payload");
                let payload: FlowSnapshot = serde_json::from_str(&payload_json)?;
                Ok(Some(TemplateRecord {
                    template_id: row.get("template_id"),
                    name: row.get("name"),
                    description: row.get("description"),
                    asset_id: row.get("asset_id"),
                    payload,
                }))
            }
            None => Ok(None),
        }
    }

    /// List all templates with metadata only
    pub async fn list_templates(&self) -> Result<Vec<TemplateSummary>> {
        let rows = sqlx::query(
            r#"
            SELECT template_id, name, description, asset_id, created_at, updated_at
            FROM workflow_templates ORDER BY updated_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut templates = Vec::new();
        for row in rows {
            templates.push(TemplateSummary {
                template_id: row.get("template_id"),
                name: row.get("name"),
                description: row.get("description"),
                asset_id: row.get("asset_id"),
                created_at: row.get("created_at"),
                updated_at: row.get("updated_at"),
            });
        }

        Ok(templates)
    }

    /// Delete a template by id
    pub async fn delete_template(&self, template_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM workflow_templates WHERE template_id = ?")
            .bind(template_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
