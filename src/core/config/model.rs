use serde::{Deserialize, Serialize};

/// One package's persisted enable flag and load position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageConfigEntry {
    pub name: String,
    pub enabled: bool,
    pub order: i64,
}

/// An entry as found on disk, where users may have dropped fields.
#[derive(Debug, Clone, Deserialize)]
pub struct StoredEntry {
    pub name: String,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub order: Option<i64>,
}

impl StoredEntry {
    pub fn enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }

    pub fn order_or(&self, fallback: i64) -> i64 {
        self.order.unwrap_or(fallback)
    }
}
