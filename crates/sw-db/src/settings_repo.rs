use rusqlite::Connection;
use sw_core::error::ShipwrightError;
use sw_core::settings::SettingsRepository;

pub struct SettingsRepo<'a> {
    pub conn: &'a Connection,
}

impl<'a> SettingsRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl SettingsRepository for SettingsRepo<'_> {
    fn get(&self, key: &str) -> Result<Option<String>, ShipwrightError> {
        let mut stmt = self
            .conn
            .prepare("SELECT value FROM settings WHERE key = ?1")
            .map_err(|err| ShipwrightError::Internal {
                message: err.to_string(),
            })?;
        let mut rows = stmt
            .query([key])
            .map_err(|err| ShipwrightError::Internal {
                message: err.to_string(),
            })?;
        let Some(row) = rows.next().map_err(|err| ShipwrightError::Internal {
            message: err.to_string(),
        })?
        else {
            return Ok(None);
        };
        let value: String = row.get(0).map_err(|err| ShipwrightError::Internal {
            message: err.to_string(),
        })?;
        Ok(Some(value))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ShipwrightError> {
        self.conn
            .execute(
                "INSERT INTO settings (key, value) VALUES (?1, ?2) ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                (key, value),
            )
            .map_err(|err| ShipwrightError::Internal {
                message: err.to_string(),
            })?;
        Ok(())
    }
}
