//! Re-aggregation of the flat headcount rows.
//!
//! The store returns one row per (node, gender code). The node table wants one
//! row per node, and the chart wants one slice per gender of a single node.

use crate::db::{Gender, GenderBreakdown, GenderSummary, HierarchyRow, NodeId, NodeSummary};
use std::collections::BTreeMap;

/// Collapse rows by NodeId, summing counts across every gender code.
///
/// Output is ascending by NodeId. When rows of one node disagree on the title,
/// the first row's title is kept (see [`title_conflicts`]).
pub fn summarize_nodes(rows: &[HierarchyRow]) -> Vec<NodeSummary> {
    let mut by_node: BTreeMap<NodeId, NodeSummary> = BTreeMap::new();

    for row in rows {
        by_node
            .entry(row.node_id)
            .and_modify(|s| s.national_id_count += row.national_id_count)
            .or_insert_with(|| NodeSummary {
                node_id: row.node_id,
                title: row.title.clone(),
                national_id_count: row.national_id_count,
            });
    }

    by_node.into_values().collect()
}

/// Nodes whose rows carry more than one distinct title, ascending.
pub fn title_conflicts(rows: &[HierarchyRow]) -> Vec<NodeId> {
    let mut first_title: BTreeMap<NodeId, &str> = BTreeMap::new();
    let mut conflicts: Vec<NodeId> = Vec::new();

    for row in rows {
        match first_title.get(&row.node_id) {
            Some(title) if *title != row.title => {
                if !conflicts.contains(&row.node_id) {
                    conflicts.push(row.node_id);
                }
            }
            Some(_) => {}
            None => {
                first_title.insert(row.node_id, &row.title);
            }
        }
    }

    conflicts.sort_unstable();
    conflicts
}

/// Raw rows of a single node, in their original order.
pub fn filter_by_node(rows: &[HierarchyRow], node_id: NodeId) -> Vec<HierarchyRow> {
    rows.iter().filter(|r| r.node_id == node_id).cloned().collect()
}

/// Gender breakdown of one node's rows.
///
/// `NoData` when no row has a gender code. Otherwise one summary per gender
/// present, ordered Male, Female, Unknown. Unmapped codes and null codes that
/// sit next to coded rows both count as Unknown, so the total is preserved.
pub fn aggregate_gender(rows: &[HierarchyRow]) -> GenderBreakdown {
    if rows.iter().all(|r| r.sex_code.is_none()) {
        return GenderBreakdown::NoData;
    }

    let mut by_gender: BTreeMap<Gender, GenderSummary> = BTreeMap::new();
    for row in rows {
        by_gender
            .entry(row.gender())
            .and_modify(|s| s.national_id_count += row.national_id_count)
            .or_insert_with(|| GenderSummary {
                gender: row.gender(),
                national_id_count: row.national_id_count,
                title: row.title.clone(),
            });
    }

    GenderBreakdown::Summaries(by_gender.into_values().collect())
}
