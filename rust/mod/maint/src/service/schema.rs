use royalcare_core::ServiceError;
use royalcare_sql::SQLStore;

/// Each table keeps the full JSON document in `data`, with the columns
/// used for filtering and joins extracted next to it.
const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS devices (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        data TEXT NOT NULL,
        department TEXT,
        created_at TEXT,
        updated_at TEXT
    )",
    "CREATE TABLE IF NOT EXISTS fault_reports (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        data TEXT NOT NULL,
        device_id INTEGER,
        user_id TEXT,
        status TEXT,
        created_at TEXT
    )",
    "CREATE INDEX IF NOT EXISTS idx_devices_department ON devices(department)",
    "CREATE INDEX IF NOT EXISTS idx_fault_reports_user ON fault_reports(user_id)",
];

/// Initialize the maintenance schema. Idempotent.
pub fn init_schema(sql: &dyn SQLStore) -> Result<(), ServiceError> {
    for ddl in SCHEMA {
        sql.exec(ddl, &[])
            .map_err(|e| ServiceError::Storage(format!("schema init: {}", e)))?;
    }
    Ok(())
}
