//! Database schema definitions
//!
//! This module contains the SQL schema for the page cache database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Extracted text of every fetched page, one row per normalized URL
CREATE TABLE IF NOT EXISTS page_text (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL UNIQUE,
    text TEXT NOT NULL,
    last_updated TEXT NOT NULL
);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
