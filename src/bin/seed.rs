//! Demo store writer
//!
//! Creates a small hierarchy with employees so the dashboard has something to
//! show. Usage: cargo run --bin hierarchy-seed -- [PATH]
//!
//! PATH defaults to ./.hierarchy.db, which the dashboard finds on its own.

use hierarchy_dashboard_lib::db::{Database, Employee, HierarchyNode};
use hierarchy_dashboard_lib::Result;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// (NodeId, ParentId, Title, male, female, unknown)
const NODES: &[(i64, Option<i64>, &str, u32, u32, u32)] = &[
    (1, None, "Head Office", 2, 1, 0),
    (2, Some(1), "Engineering", 8, 2, 0),
    (3, Some(1), "Operations", 0, 0, 0),
    (4, Some(2), "Platform", 5, 4, 1),
    (5, Some(2), "Research", 1, 3, 0),
    (6, Some(3), "Logistics", 6, 0, 0),
];

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(".hierarchy.db"));

    if path.exists() {
        tracing::error!("{} already exists. Remove it first.", path.display());
        std::process::exit(1);
    }

    if let Err(e) = seed(&path) {
        tracing::error!("Failed to seed {}: {}", path.display(), e);
        std::process::exit(1);
    }
}

fn seed(path: &Path) -> Result<()> {
    let db = Database::create(path)?;
    let mut employees = 0u32;

    for &(node_id, parent_id, title, male, female, unknown) in NODES {
        let segments = path_to_root(node_id);
        let mut levels: [Option<String>; 4] = Default::default();
        for (slot, segment) in levels.iter_mut().zip(&segments) {
            *slot = Some(segment.to_string());
        }

        db.insert_hierarchy_node(&HierarchyNode {
            node_id,
            parent_id,
            levels,
            full_path: segments.join("/"),
            level: segments.len() as i64,
            title: title.to_string(),
        })?;

        let groups = [(Some("1"), male), (Some("2"), female), (None, unknown)];
        for (sex_code, count) in groups {
            for _ in 0..count {
                employees += 1;
                db.insert_employee(&Employee {
                    national_no: Some(format!("{:010}", employees)),
                    holding_code: node_id,
                    sex_code: sex_code.map(str::to_string),
                })?;
            }
        }
    }

    tracing::info!(
        nodes = NODES.len(),
        employees,
        "Seeded demo store at {}",
        db.get_path()
    );
    Ok(())
}

/// Titles from the root down to `node_id`.
fn path_to_root(node_id: i64) -> Vec<&'static str> {
    let mut segments = Vec::new();
    let mut current = NODES.iter().find(|n| n.0 == node_id);
    while let Some(&(_, parent_id, title, ..)) = current {
        segments.push(title);
        current = parent_id.and_then(|p| NODES.iter().find(|n| n.0 == p));
    }
    segments.reverse();
    segments
}
