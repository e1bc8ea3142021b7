use crate::error::ShipwrightError;

pub trait SettingsRepository {
    fn get(&self, key: &str) -> Result<Option<String>, ShipwrightError>;
    fn set(&self, key: &str, value: &str) -> Result<(), ShipwrightError>;
}
