use rusqlite::types::{Type, Value};
use rusqlite::{params, Connection, OpenFlags};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use super::models::{Employee, HierarchyNode, HierarchyRow};
use super::HierarchySource;
use crate::error::{DashboardError, Result};

/// Node headcounts split by gender code.
///
/// LEFT JOIN keeps nodes without employees (count 0, null code).
/// `COUNT(e.NATIONAL_No)` skips employees with no national number.
const HIERARCHY_QUERY: &str = "
    SELECT
        h.NodeId,
        h.ParentId,
        h.Level1,
        h.Level2,
        h.Level3,
        h.Level4,
        h.FullPath,
        h.Level,
        h.Title,
        COUNT(e.NATIONAL_No) AS NationalIdCount,
        e.SEX_CODE
    FROM
        HierarchyTable_Final h
    LEFT JOIN
        Employees e
    ON
        h.NodeId = e.HoldingCode
    GROUP BY
        h.NodeId, h.ParentId, h.Level1, h.Level2, h.Level3, h.Level4,
        h.FullPath, h.Level, h.Title, e.SEX_CODE
    ORDER BY
        h.NodeId, e.SEX_CODE
";

pub struct Database {
    conn: Mutex<Connection>,
    path: String,
}

impl Database {
    /// Open an existing store read-only. A missing file is a connection error.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(&path, flags).map_err(|source| {
            DashboardError::Connection { path: path_str.clone(), source }
        })?;
        Ok(Database { conn: Mutex::new(conn), path: path_str })
    }

    /// Open (or create) a writable store and make sure both relations exist.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();
        let conn = Connection::open(&path).map_err(|source| DashboardError::Connection {
            path: path_str.clone(),
            source,
        })?;
        let db = Database { conn: Mutex::new(conn), path: path_str };
        db.init()?;
        Ok(db)
    }

    #[allow(dead_code)]
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| DashboardError::Connection {
            path: ":memory:".to_string(),
            source,
        })?;
        let db = Database { conn: Mutex::new(conn), path: ":memory:".to_string() };
        db.init()?;
        Ok(db)
    }

    pub fn get_path(&self) -> String {
        self.path.clone()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| DashboardError::Poisoned)
    }

    fn init(&self) -> Result<()> {
        let conn = self.lock()?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS HierarchyTable_Final (
                NodeId INTEGER PRIMARY KEY,
                ParentId INTEGER,
                Level1 TEXT,
                Level2 TEXT,
                Level3 TEXT,
                Level4 TEXT,
                FullPath TEXT NOT NULL,
                Level INTEGER NOT NULL,
                Title TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS Employees (
                NATIONAL_No TEXT,
                HoldingCode INTEGER,
                SEX_CODE TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_employees_holding ON Employees(HoldingCode);
            CREATE INDEX IF NOT EXISTS idx_hierarchy_parent ON HierarchyTable_Final(ParentId);
            "
        )?;

        Ok(())
    }

    pub fn insert_hierarchy_node(&self, node: &HierarchyNode) -> Result<()> {
        let conn = self.lock()?;
        let [level1, level2, level3, level4] = &node.levels;
        conn.execute(
            "INSERT INTO HierarchyTable_Final
                (NodeId, ParentId, Level1, Level2, Level3, Level4, FullPath, Level, Title)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                node.node_id,
                node.parent_id,
                level1,
                level2,
                level3,
                level4,
                node.full_path,
                node.level,
                node.title,
            ],
        )?;
        Ok(())
    }

    pub fn insert_employee(&self, employee: &Employee) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO Employees (NATIONAL_No, HoldingCode, SEX_CODE) VALUES (?1, ?2, ?3)",
            params![employee.national_no, employee.holding_code, employee.sex_code],
        )?;
        Ok(())
    }

    /// Run the headcount aggregation and return the flat row set.
    pub fn fetch_hierarchy_rows(&self) -> Result<Vec<HierarchyRow>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(HIERARCHY_QUERY)?;
        let rows = stmt
            .query_map([], Self::row_to_hierarchy_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// NodeId and ParentId must be integers. FullPath, Level and Title must not
    /// be null; a row that breaks either rule fails the whole query.
    fn row_to_hierarchy_row(row: &rusqlite::Row) -> rusqlite::Result<HierarchyRow> {
        let count: i64 = row.get(9)?;
        Ok(HierarchyRow {
            node_id: row.get(0)?,
            parent_id: row.get(1)?,
            level1: value_to_text(row.get(2)?),
            level2: value_to_text(row.get(3)?),
            level3: value_to_text(row.get(4)?),
            level4: value_to_text(row.get(5)?),
            full_path: required_text(row, 6)?,
            level: row.get(7)?,
            title: required_text(row, 8)?,
            national_id_count: u64::try_from(count)
                .map_err(|_| rusqlite::Error::IntegralValueOutOfRange(9, count))?,
            sex_code: value_to_text(row.get(10)?),
        })
    }
}

impl HierarchySource for Database {
    fn fetch(&self) -> Result<Vec<HierarchyRow>> {
        self.fetch_hierarchy_rows()
    }
}

fn required_text(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<String> {
    value_to_text(row.get(idx)?).ok_or_else(|| {
        let name = row.as_ref().column_name(idx).unwrap_or("?").to_string();
        rusqlite::Error::InvalidColumnType(idx, name, Type::Null)
    })
}

/// Stores disagree on whether codes are text or integers; keep them as text.
fn value_to_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Integer(i) => Some(i.to_string()),
        Value::Real(f) => Some(f.to_string()),
        Value::Text(s) => Some(s),
        Value::Blob(b) => Some(String::from_utf8_lossy(&b).into_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: i64, parent: Option<i64>, title: &str) -> HierarchyNode {
        HierarchyNode {
            node_id: id,
            parent_id: parent,
            levels: [Some("HQ".to_string()), None, None, None],
            full_path: format!("HQ/{}", title),
            level: if parent.is_some() { 2 } else { 1 },
            title: title.to_string(),
        }
    }

    fn employee(no: &str, holding: i64, sex: Option<&str>) -> Employee {
        Employee {
            national_no: Some(no.to_string()),
            holding_code: holding,
            sex_code: sex.map(|s| s.to_string()),
        }
    }

    #[test]
    fn test_node_without_employees_has_zero_count() {
        let db = Database::in_memory().unwrap();
        db.insert_hierarchy_node(&node(7, None, "Ops")).unwrap();

        let rows = db.fetch().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].node_id, 7);
        assert_eq!(rows[0].title, "Ops");
        assert_eq!(rows[0].national_id_count, 0);
        assert_eq!(rows[0].sex_code, None);
        assert_eq!(rows[0].level1.as_deref(), Some("HQ"));
    }

    #[test]
    fn test_counts_grouped_by_sex_code() {
        let db = Database::in_memory().unwrap();
        db.insert_hierarchy_node(&node(1, None, "HQ")).unwrap();
        db.insert_hierarchy_node(&node(3, Some(1), "Eng")).unwrap();
        for i in 0..8 {
            db.insert_employee(&employee(&format!("m{}", i), 3, Some("1"))).unwrap();
        }
        for i in 0..2 {
            db.insert_employee(&employee(&format!("f{}", i), 3, Some("2"))).unwrap();
        }

        let rows = db.fetch().unwrap();
        let eng: Vec<_> = rows.iter().filter(|r| r.node_id == 3).collect();
        assert_eq!(eng.len(), 2);
        assert_eq!(eng[0].sex_code.as_deref(), Some("1"));
        assert_eq!(eng[0].national_id_count, 8);
        assert_eq!(eng[1].sex_code.as_deref(), Some("2"));
        assert_eq!(eng[1].national_id_count, 2);
        assert_eq!(eng[0].parent_id, Some(1));

        // HQ itself has no employees but is still listed
        let hq: Vec<_> = rows.iter().filter(|r| r.node_id == 1).collect();
        assert_eq!(hq.len(), 1);
        assert_eq!(hq[0].national_id_count, 0);
    }

    #[test]
    fn test_missing_national_number_not_counted() {
        let db = Database::in_memory().unwrap();
        db.insert_hierarchy_node(&node(5, None, "Sales")).unwrap();
        db.insert_employee(&employee("a", 5, Some("2"))).unwrap();
        db.insert_employee(&Employee {
            national_no: None,
            holding_code: 5,
            sex_code: Some("2".to_string()),
        })
        .unwrap();

        let rows = db.fetch().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].national_id_count, 1);
    }

    #[test]
    fn test_integer_sex_codes_read_as_text() {
        let db = Database::in_memory().unwrap();
        db.insert_hierarchy_node(&node(2, None, "Legal")).unwrap();
        {
            let conn = db.lock().unwrap();
            conn.execute(
                "INSERT INTO Employees (NATIONAL_No, HoldingCode, SEX_CODE) VALUES ('x', 2, 1)",
                [],
            )
            .unwrap();
        }

        let rows = db.fetch().unwrap();
        assert_eq!(rows[0].sex_code.as_deref(), Some("1"));
    }

    fn store_without_constraints(dir: &Path, insert: &str) -> Database {
        let path = dir.join("loose.db");
        {
            let conn = Connection::open(&path).unwrap();
            conn.execute_batch(
                "CREATE TABLE HierarchyTable_Final (
                    NodeId, ParentId, Level1, Level2, Level3, Level4, FullPath, Level, Title
                 );
                 CREATE TABLE Employees (NATIONAL_No, HoldingCode, SEX_CODE);",
            )
            .unwrap();
            conn.execute_batch(insert).unwrap();
        }
        Database::open(&path).unwrap()
    }

    #[test]
    fn test_null_title_is_query_error() {
        let dir = tempfile::tempdir().unwrap();
        let db = store_without_constraints(
            dir.path(),
            "INSERT INTO HierarchyTable_Final VALUES (1, NULL, 'HQ', NULL, NULL, NULL, 'HQ', 1, NULL);",
        );
        assert!(matches!(db.fetch(), Err(DashboardError::Query(_))));
    }

    #[test]
    fn test_null_level_or_path_is_query_error() {
        let dir = tempfile::tempdir().unwrap();
        let db = store_without_constraints(
            dir.path(),
            "INSERT INTO HierarchyTable_Final VALUES (1, NULL, 'HQ', NULL, NULL, NULL, 'HQ', NULL, 'HQ');",
        );
        assert!(matches!(db.fetch(), Err(DashboardError::Query(_))));

        let dir = tempfile::tempdir().unwrap();
        let db = store_without_constraints(
            dir.path(),
            "INSERT INTO HierarchyTable_Final VALUES (1, NULL, 'HQ', NULL, NULL, NULL, NULL, 1, 'HQ');",
        );
        assert!(matches!(db.fetch(), Err(DashboardError::Query(_))));
    }

    #[test]
    fn test_text_node_id_is_query_error() {
        let dir = tempfile::tempdir().unwrap();
        let db = store_without_constraints(
            dir.path(),
            "INSERT INTO HierarchyTable_Final VALUES ('HQ-01', NULL, 'HQ', NULL, NULL, NULL, 'HQ', 1, 'HQ');",
        );
        assert!(matches!(db.fetch(), Err(DashboardError::Query(_))));
    }

    #[test]
    fn test_open_missing_file_is_connection_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = Database::open(dir.path().join("nope.db"));
        assert!(matches!(result, Err(DashboardError::Connection { .. })));
    }

    #[test]
    fn test_wrong_schema_is_query_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("other.db");
        {
            let conn = Connection::open(&path).unwrap();
            conn.execute_batch("CREATE TABLE Unrelated (id INTEGER);").unwrap();
        }

        let db = Database::open(&path).unwrap();
        assert!(matches!(db.fetch(), Err(DashboardError::Query(_))));
    }

    #[test]
    fn test_open_reads_store_written_by_create() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.db");
        {
            let db = Database::create(&path).unwrap();
            db.insert_hierarchy_node(&node(4, None, "Finance")).unwrap();
            db.insert_employee(&employee("z", 4, Some("1"))).unwrap();
        }

        let db = Database::open(&path).unwrap();
        let rows = db.fetch().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].title, "Finance");
        assert_eq!(rows[0].national_id_count, 1);
        assert_eq!(db.get_path(), path.to_string_lossy());
    }
}
