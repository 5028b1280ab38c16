use crate::config::types::UserSettings;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

pub fn save_settings(settings: &UserSettings) -> Result<()> {
    // 存到工作目錄下的 settings.json
    let path = Path::new("settings.json");
    let content =
        serde_json::to_string_pretty(settings).context("無法序列化設定")?;

    fs::write(path, content)
        .with_context(|| format!("無法寫入設定檔 {}", path.display()))?;

    Ok(())
}
