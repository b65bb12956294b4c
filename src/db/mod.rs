mod schema;
mod models;

pub use schema::Database;
pub use models::{
    Employee, Gender, GenderBreakdown, GenderSummary, HierarchyNode, HierarchyRow, NodeId,
    NodeSummary,
};

use crate::error::Result;

/// Anything that can produce the flat headcount row set.
pub trait HierarchySource {
    fn fetch(&self) -> Result<Vec<HierarchyRow>>;
}

impl HierarchySource for Vec<HierarchyRow> {
    fn fetch(&self) -> Result<Vec<HierarchyRow>> {
        Ok(self.clone())
    }
}
