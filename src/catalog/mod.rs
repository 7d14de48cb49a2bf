/// Asset and tool-component catalog
///
/// Read-only reference data consumed when configuring nodes: the assets a
/// node may point at and the tool components it may bind. The registry keeps
/// an in-memory snapshot behind an ArcSwap so reads on the request path are
/// lock-free; `refresh` reloads the snapshot from storage and swaps the
/// pointer atomically.

use crate::storage::catalog::CatalogStorage;
use anyhow::Result;
use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Kinds of tool components, mirroring the catalog's type column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    Asset,
    Service,
    Trigger,
}

impl ComponentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ComponentKind::Asset => "asset",
            ComponentKind::Service => "service",
            ComponentKind::Trigger => "trigger",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "asset" => Ok(ComponentKind::Asset),
            "service" => Ok(ComponentKind::Service),
            "trigger" => Ok(ComponentKind::Trigger),
            other => Err(anyhow::anyhow!("unknown component kind: {other}")),
        }
    }
}

/// An asset available for node reference selection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetRef {
    pub asset_id: String,
    pub name: String,
}

/// A tool component available for node binding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentRef {
    pub component_id: String,
    pub name: String,
    pub kind: ComponentKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub param_desc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<String>,
}

/// Immutable point-in-time view of the catalog
#[derive(Debug, Default)]
pub struct CatalogSnapshot {
    pub assets: Vec<AssetRef>,
    pub components: Vec<ComponentRef>,
}

/// Lock-free catalog cache backed by storage
#[derive(Debug)]
pub struct CatalogRegistry {
    snapshot: ArcSwap<CatalogSnapshot>,
    storage: CatalogStorage,
}

impl CatalogRegistry {
    pub fn new(storage: CatalogStorage) -> Self {
        Self {
            snapshot: ArcSwap::new(Arc::new(CatalogSnapshot::default())),
            storage,
        }
    }

    /// Reload the snapshot from storage and swap it in atomically
    pub async fn refresh(&self) -> Result<()> {
        let assets = self.storage.list_assets().await?;
        let components = self.storage.list_components().await?;
        let snapshot = CatalogSnapshot { assets, components };

        tracing::info!(
            assets = snapshot.assets.len(),
            components = snapshot.components.len(),
            "catalog refreshed"
        );
        self.snapshot.store(Arc::new(snapshot));
        Ok(())
    }

    /// Current snapshot (cheap pointer clone)
    pub fn load(&self) -> Arc<CatalogSnapshot> {
        self.snapshot.load_full()
    }

    pub fn assets(&self) -> Vec<AssetRef> {
        self.snapshot.load().assets.clone()
    }

    pub fn components(&self) -> Vec<ComponentRef> {
        self.snapshot.load().components.clone()
    }

    pub fn find_asset(&self, asset_id: &str) -> Option<AssetRef> {
        self.snapshot
            .load()
            .assets
            .iter()
            .find(|a| a.asset_id == asset_id)
            .cloned()
    }

    pub fn find_component(&self, component_id: &str) -> Option<ComponentRef> {
        self.snapshot
            .load()
            .components
            .iter()
            .find(|c| c.component_id == component_id)
            .cloned()
    }
}
