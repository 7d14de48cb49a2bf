/// Persistence Layer
///
/// SQLite-backed storage built on sqlx:
/// - Workflow instances and reusable templates (JSON payload + indexed
///   metadata)
/// - The read-only asset/tool-component catalog

// Workflow and template persistence
pub mod flows;

// Asset and tool-component catalog persistence
pub mod catalog;

// Re-export commonly used types
pub use catalog::CatalogStorage;
pub use flows::{FlowRecord, FlowStorage, FlowSummary, TemplateRecord, TemplateSummary};
