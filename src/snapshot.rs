use crate::aggregation::{summarize_nodes, title_conflicts};
use crate::db::{HierarchyRow, HierarchySource, NodeSummary};
use crate::error::Result;
use chrono::{DateTime, Utc};
use std::time::Instant;

/// The row set loaded at startup together with its node table.
///
/// Built once, then shared read-only (behind an `Arc`) by every handler.
#[derive(Debug, Clone)]
pub struct DashboardSnapshot {
    rows: Vec<HierarchyRow>,
    nodes: Vec<NodeSummary>,
    loaded_at: DateTime<Utc>,
}

impl DashboardSnapshot {
    /// Run the source query once and derive the node table.
    pub fn load(source: &dyn HierarchySource) -> Result<Self> {
        let start = Instant::now();
        let rows = source.fetch()?;
        let snapshot = Self::from_rows(rows);
        tracing::info!(
            rows = snapshot.rows.len(),
            nodes = snapshot.nodes.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Loaded hierarchy snapshot"
        );
        Ok(snapshot)
    }

    pub fn from_rows(rows: Vec<HierarchyRow>) -> Self {
        for node_id in title_conflicts(&rows) {
            tracing::warn!(node_id, "Node has rows with differing titles, keeping the first");
        }
        let nodes = summarize_nodes(&rows);
        Self { rows, nodes, loaded_at: Utc::now() }
    }

    pub fn rows(&self) -> &[HierarchyRow] {
        &self.rows
    }

    pub fn nodes(&self) -> &[NodeSummary] {
        &self.nodes
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }
}
