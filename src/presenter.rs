//! Selection handling for the dashboard.
//!
//! [`on_selection_changed`] turns a table selection into everything the page
//! shows below the node table. It reads the snapshot and nothing else, so the
//! same selection always renders the same output.

use crate::aggregation::{aggregate_gender, filter_by_node};
use crate::db::{GenderBreakdown, GenderSummary, HierarchyRow, NodeId};
use crate::snapshot::DashboardSnapshot;
use serde::Serialize;

pub const NO_SELECTION_MESSAGE: &str = "No Node Selected";
pub const NO_GENDER_DATA_MESSAGE: &str = "No Gender Data Available";

/// Size of the donut hole as a fraction of the outer radius.
pub const DONUT_HOLE: f64 = 0.4;

const ROW_COLUMNS: [&str; 11] = [
    "NodeId",
    "ParentId",
    "Level1",
    "Level2",
    "Level3",
    "Level4",
    "FullPath",
    "Level",
    "Title",
    "NationalIdCount",
    "SEX_CODE",
];
const GENDER_COLUMN: &str = "SEX_CODE";

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum RenderOutput {
    NoSelection { message: String },
    NodeSelected(NodeView),
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NodeView {
    pub node_id: NodeId,
    pub heading: String,
    pub table: RowsTable,
    pub gender: GenderSection,
}

/// The selected node's raw rows as display cells. `None` is a null value.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RowsTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GenderSection {
    NoData { message: String },
    Chart(DonutChart),
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DonutChart {
    pub title: String,
    pub hole: f64,
    pub total: u64,
    pub slices: Vec<DonutSlice>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DonutSlice {
    pub label: String,
    pub value: u64,
    pub percent: f64,
}

/// Where the dashboard is in its selection lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PresenterState {
    #[default]
    NoSelection,
    NodeSelected(NodeId),
}

/// Tracks the current selection of one dashboard session.
///
/// A selection can be replaced but never cleared. Events that name no valid
/// row render the no-selection view and leave the recorded selection alone.
/// Over HTTP the `row` query parameter carries the session's selection, so the
/// handlers call [`on_selection_changed`] directly instead of holding one of these.
#[derive(Debug, Default)]
pub struct Presenter {
    state: PresenterState,
}

impl Presenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PresenterState {
        self.state
    }

    pub fn handle(&mut self, selected_rows: &[usize], snapshot: &DashboardSnapshot) -> RenderOutput {
        let output = on_selection_changed(selected_rows, snapshot);
        if let RenderOutput::NodeSelected(view) = &output {
            self.state = PresenterState::NodeSelected(view.node_id);
        }
        output
    }
}

/// Render the region below the node table for a selection event.
///
/// `selected_rows` are indices into `snapshot.nodes()`; only the first one is
/// used. An empty list or an out-of-range index yields the no-selection view.
pub fn on_selection_changed(selected_rows: &[usize], snapshot: &DashboardSnapshot) -> RenderOutput {
    let Some(node) = selected_rows.first().and_then(|&i| snapshot.nodes().get(i)) else {
        return RenderOutput::NoSelection { message: NO_SELECTION_MESSAGE.to_string() };
    };

    let rows = filter_by_node(snapshot.rows(), node.node_id);
    let breakdown = aggregate_gender(&rows);
    tracing::debug!(
        node_id = node.node_id,
        rows = rows.len(),
        has_gender = !matches!(breakdown, GenderBreakdown::NoData),
        "Node selected"
    );

    let (table, gender) = match breakdown {
        GenderBreakdown::NoData => (
            rows_table(&rows, true),
            GenderSection::NoData { message: NO_GENDER_DATA_MESSAGE.to_string() },
        ),
        GenderBreakdown::Summaries(summaries) => (
            rows_table(&rows, false),
            GenderSection::Chart(donut_chart(node.node_id, &summaries)),
        ),
    };

    RenderOutput::NodeSelected(NodeView {
        node_id: node.node_id,
        heading: format!("Filtered Data for Node ID {}", node.node_id),
        table,
        gender,
    })
}

fn rows_table(rows: &[HierarchyRow], show_gender: bool) -> RowsTable {
    let columns = ROW_COLUMNS
        .iter()
        .filter(|c| show_gender || **c != GENDER_COLUMN)
        .map(|c| c.to_string())
        .collect();

    let rows = rows
        .iter()
        .map(|r| {
            let mut cells = vec![
                Some(r.node_id.to_string()),
                r.parent_id.map(|p| p.to_string()),
                r.level1.clone(),
                r.level2.clone(),
                r.level3.clone(),
                r.level4.clone(),
                Some(r.full_path.clone()),
                Some(r.level.to_string()),
                Some(r.title.clone()),
                Some(r.national_id_count.to_string()),
            ];
            if show_gender {
                cells.push(r.sex_code.clone());
            }
            cells
        })
        .collect();

    RowsTable { columns, rows }
}

/// Chart input for a node's gender summaries.
pub fn donut_chart(node_id: NodeId, summaries: &[GenderSummary]) -> DonutChart {
    let total: u64 = summaries.iter().map(|s| s.national_id_count).sum();
    let slices = summaries
        .iter()
        .map(|s| DonutSlice {
            label: s.label().to_string(),
            value: s.national_id_count,
            percent: percent_of(s.national_id_count, total),
        })
        .collect();

    DonutChart {
        title: format!("Gender Distribution for Node ID {}", node_id),
        hole: DONUT_HOLE,
        total,
        slices,
    }
}

fn percent_of(value: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        value as f64 * 100.0 / total as f64
    }
}
