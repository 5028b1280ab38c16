use crate::config::types::{Config, UserSettings};
use anyhow::{Context, Result};
use log::warn;
use std::fs;
use std::path::Path;

const SETTINGS_FILE: &str = "settings.json";

impl Config {
    pub fn new() -> Result<Self> {
        let settings = Self::load_settings().unwrap_or_else(|e| {
            warn!("讀取設定失敗，改用預設值: {e}");
            UserSettings::default()
        });

        Ok(Self { settings })
    }

    fn load_settings() -> Result<UserSettings> {
        let path = Path::new(SETTINGS_FILE);
        if !path.exists() {
            return Ok(UserSettings::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("無法讀取設定檔 {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("無法解析設定檔 {}", path.display()))
    }
}
