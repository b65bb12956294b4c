use serde::{Deserialize, Serialize};

pub type NodeId = i64;

/// Gender category of an employee group.
///
/// Raw `SEX_CODE` values from the store map onto this closed set:
/// "1" is Male, "2" is Female, anything else (null included) is Unknown.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Unknown,
}

impl Gender {
    pub fn from_code(code: Option<&str>) -> Self {
        match code.map(str::trim) {
            Some("1") => Gender::Male,
            Some("2") => Gender::Female,
            _ => Gender::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Unknown => "Unknown",
        }
    }
}

/// One row of the hierarchy/employee aggregation query.
///
/// A node appears once per distinct `SEX_CODE` among its employees, or once
/// with a null code and a zero count when it has none.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HierarchyRow {
    #[serde(rename = "NodeId")]
    pub node_id: NodeId,
    #[serde(rename = "ParentId")]
    pub parent_id: Option<NodeId>,
    #[serde(rename = "Level1")]
    pub level1: Option<String>,
    #[serde(rename = "Level2")]
    pub level2: Option<String>,
    #[serde(rename = "Level3")]
    pub level3: Option<String>,
    #[serde(rename = "Level4")]
    pub level4: Option<String>,
    #[serde(rename = "FullPath")]
    pub full_path: String,
    #[serde(rename = "Level")]
    pub level: i64,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "NationalIdCount")]
    pub national_id_count: u64,
    #[serde(rename = "SEX_CODE")]
    pub sex_code: Option<String>,
}

impl HierarchyRow {
    pub fn gender(&self) -> Gender {
        Gender::from_code(self.sex_code.as_deref())
    }
}

/// A node collapsed across all gender codes. One per distinct NodeId.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NodeSummary {
    #[serde(rename = "NodeId")]
    pub node_id: NodeId,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "NationalIdCount")]
    pub national_id_count: u64,
}

/// Headcount of one gender within a single node.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenderSummary {
    pub gender: Gender,
    #[serde(rename = "NationalIdCount")]
    pub national_id_count: u64,
    #[serde(rename = "Title")]
    pub title: String,
}

impl GenderSummary {
    pub fn label(&self) -> &'static str {
        self.gender.label()
    }
}

/// Outcome of the per-node gender breakdown.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "summaries", rename_all = "snake_case")]
pub enum GenderBreakdown {
    /// Every row carried a null gender code.
    NoData,
    Summaries(Vec<GenderSummary>),
}

/// Input for [`crate::db::Database::insert_hierarchy_node`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HierarchyNode {
    pub node_id: NodeId,
    pub parent_id: Option<NodeId>,
    pub levels: [Option<String>; 4],
    pub full_path: String,
    pub level: i64,
    pub title: String,
}

/// Input for [`crate::db::Database::insert_employee`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
    pub national_no: Option<String>,
    pub holding_code: NodeId,
    pub sex_code: Option<String>,
}
