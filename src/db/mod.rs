use rusqlite::{params, Connection, OptionalExtension, Result};
use std::path::Path;
use std::sync::Mutex;

use crate::models::StudentProfile;

/// Local preferences store. Only user settings and the student profile
/// persist; media, engagement, and catalog state are session-scoped.
pub struct Database {
    pub conn: Mutex<Connection>,
}

impl Database {
    pub fn new(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir).ok();
        let db_path = data_dir.join("corementis.db");
        let conn = Connection::open(db_path)?;
        let db = Database {
            conn: Mutex::new(conn),
        };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS profile (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                display_name TEXT NOT NULL DEFAULT 'Student',
                email TEXT NOT NULL DEFAULT '',
                institution TEXT
            );

            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            INSERT OR IGNORE INTO profile (id) VALUES (1);
            ",
        )
    }

    // --- Settings ---

    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT value FROM settings WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()
    }

    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn get_all_settings(&self) -> Result<Vec<(String, String)>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT key, value FROM settings ORDER BY key")?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
        rows.collect()
    }

    pub fn delete_setting(&self, key: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM settings WHERE key = ?1", params![key])?;
        Ok(())
    }

    // --- Profile ---

    pub fn get_profile(&self) -> Result<StudentProfile> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT display_name, email, institution FROM profile WHERE id = 1",
            [],
            |row| {
                Ok(StudentProfile {
                    display_name: row.get(0)?,
                    email: row.get(1)?,
                    institution: row.get(2)?,
                })
            },
        )
    }

    pub fn update_profile(&self, profile: &StudentProfile) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE profile SET display_name = ?1, email = ?2, institution = ?3 WHERE id = 1",
            params![profile.display_name, profile.email, profile.institution],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_db() -> (Database, std::path::PathBuf) {
        let dir = std::env::temp_dir().join(format!("corementis-test-{}", uuid::Uuid::new_v4()));
        let db = Database::new(&dir).unwrap();
        (db, dir)
    }

    #[test]
    fn settings_round_trip() {
        let (db, dir) = temp_db();

        assert_eq!(db.get_setting("theme").unwrap(), None);
        db.set_setting("theme", "dark").unwrap();
        assert_eq!(db.get_setting("theme").unwrap(), Some("dark".to_string()));

        db.set_setting("theme", "light").unwrap();
        assert_eq!(db.get_setting("theme").unwrap(), Some("light".to_string()));

        db.delete_setting("theme").unwrap();
        assert_eq!(db.get_setting("theme").unwrap(), None);

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn profile_has_defaults_and_updates() {
        let (db, dir) = temp_db();

        let profile = db.get_profile().unwrap();
        assert_eq!(profile.display_name, "Student");

        db.update_profile(&StudentProfile {
            display_name: "Maya Patel".to_string(),
            email: "maya@example.edu".to_string(),
            institution: Some("State University".to_string()),
        })
        .unwrap();

        let profile = db.get_profile().unwrap();
        assert_eq!(profile.display_name, "Maya Patel");
        assert_eq!(profile.institution.as_deref(), Some("State University"));

        std::fs::remove_dir_all(dir).ok();
    }
}
