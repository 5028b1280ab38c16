use crate::tools::{
    DEFAULT_MAX_OUTPUT_MB, EncoderProfile, SplitMode, SplitPolicy,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 數值設定解析失敗時的預設值
pub const DEFAULT_BITRATE_BPS: u64 = 6_000_000;
pub const DEFAULT_WORKER_COUNT: usize = 2;
pub const DEFAULT_FIRST_SEGMENT_SECS: f64 = 270.0;
pub const DEFAULT_MIN_SEGMENT_SECS: f64 = 60.0;

/// 介面語言
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "en-US")]
    EnUs,
    #[serde(rename = "zh-TW")]
    ZhTw,
}

impl Language {
    #[must_use]
    pub const fn locale_code(self) -> &'static str {
        match self {
            Self::EnUs => "en-US",
            Self::ZhTw => "zh-TW",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::EnUs => "English",
            Self::ZhTw => "繁體中文",
        };
        write!(f, "{name}")
    }
}

/// 使用者設定
///
/// 數值欄位以輸入原文儲存，讀取時才解析；解析失敗一律退回預設值，
/// 不讓一筆壞設定擋下整個批次
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    pub language: Language,
    /// 輸出根目錄
    pub output_dir: String,
    /// 視訊位元率，如 "6000k"
    pub bitrate: String,
    /// 同時處理的檔案數
    pub concurrency: String,
    pub encoder_profile: EncoderProfile,
    /// 硬體編碼器的裝置編號
    pub device_index: String,
    pub split_mode: SplitMode,
    /// 首段目標時長，"分.秒" 形式，如 "4.30"
    pub first_segment_target: String,
    /// 最小分段長度（秒）
    pub min_segment_secs: String,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            language: Language::ZhTw,
            output_dir: String::new(),
            bitrate: "6000k".to_string(),
            concurrency: "2".to_string(),
            encoder_profile: EncoderProfile::Software,
            device_index: "0".to_string(),
            split_mode: SplitMode::Fixed,
            first_segment_target: "4.30".to_string(),
            min_segment_secs: "60".to_string(),
        }
    }
}

impl UserSettings {
    /// 位元率數值（bps）：取輸入中第一段數字乘以 1000，解析失敗退回 6000k
    #[must_use]
    pub fn bitrate_bps(&self) -> u64 {
        Regex::new(r"(\d+)")
            .ok()
            .and_then(|re| re.captures(&self.bitrate))
            .and_then(|caps| caps[1].parse::<u64>().ok())
            .map_or(DEFAULT_BITRATE_BPS, |kilobits| kilobits * 1000)
    }

    /// 傳給 `-b:v` 的位元率字串；原文不含數字時退回預設，
    /// 與 `bitrate_bps` 的大小估算保持同一數值
    #[must_use]
    pub fn bitrate_arg(&self) -> String {
        let trimmed = self.bitrate.trim();
        if trimmed.contains(|c: char| c.is_ascii_digit()) {
            trimmed.to_string()
        } else {
            format!("{}k", DEFAULT_BITRATE_BPS / 1000)
        }
    }

    /// 同時處理的檔案數，下限 1，解析失敗退回 2
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.concurrency
            .trim()
            .parse::<usize>()
            .unwrap_or(DEFAULT_WORKER_COUNT)
            .max(1)
    }

    /// 首段目標時長（秒）："分.秒" 形式，如 "4.30" → 270；
    /// 格式不符退回 270 秒
    #[must_use]
    pub fn first_segment_target_secs(&self) -> f64 {
        parse_minute_dot_second(&self.first_segment_target)
            .unwrap_or(DEFAULT_FIRST_SEGMENT_SECS)
    }

    /// 最小分段長度（秒），解析失敗退回 60
    #[must_use]
    pub fn min_segment_secs_value(&self) -> f64 {
        self.min_segment_secs
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| *v > 0.0)
            .unwrap_or(DEFAULT_MIN_SEGMENT_SECS)
    }

    /// 裝置編號，空白時退回 "0"
    #[must_use]
    pub fn device_index_arg(&self) -> String {
        let trimmed = self.device_index.trim();
        if trimmed.is_empty() {
            "0".to_string()
        } else {
            trimmed.to_string()
        }
    }

    /// 組出切分策略
    #[must_use]
    pub fn split_policy(&self) -> SplitPolicy {
        SplitPolicy {
            mode: self.split_mode,
            first_segment_target_secs: self.first_segment_target_secs(),
            min_segment_secs: self.min_segment_secs_value(),
            bitrate_bps: self.bitrate_bps(),
            max_output_mb: DEFAULT_MAX_OUTPUT_MB,
        }
    }
}

/// 解析 "分.秒" 字串，如 "4.30" → 270 秒
fn parse_minute_dot_second(text: &str) -> Option<f64> {
    let (minutes, seconds) = text.trim().split_once('.')?;
    let minutes: u32 = minutes.parse().ok()?;
    let seconds: u32 = seconds.parse().ok()?;
    Some(f64::from(minutes * 60 + seconds))
}

/// 程式設定
#[derive(Debug, Clone)]
pub struct Config {
    pub settings: UserSettings,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bitrate_parsing_with_fallback() {
        let mut settings = UserSettings::default();
        assert_eq!(settings.bitrate_bps(), 6_000_000);

        settings.bitrate = "8000k".to_string();
        assert_eq!(settings.bitrate_bps(), 8_000_000);

        settings.bitrate = "garbage".to_string();
        assert_eq!(settings.bitrate_bps(), DEFAULT_BITRATE_BPS);
    }

    #[test]
    fn test_bitrate_arg_falls_back_without_digits() {
        let mut settings = UserSettings::default();

        // 解析不出數字時，傳給編碼器的字串退回預設，
        // 與 bitrate_bps 的估算值一致
        settings.bitrate = "garbage".to_string();
        assert_eq!(settings.bitrate_arg(), "6000k");
        assert_eq!(settings.bitrate_bps(), DEFAULT_BITRATE_BPS);

        settings.bitrate = "  ".to_string();
        assert_eq!(settings.bitrate_arg(), "6000k");

        // 含數字的原文照樣直接轉交
        settings.bitrate = "8000k".to_string();
        assert_eq!(settings.bitrate_arg(), "8000k");
        settings.bitrate = " 4500k ".to_string();
        assert_eq!(settings.bitrate_arg(), "4500k");
    }

    #[test]
    fn test_worker_count_floor_and_fallback() {
        let mut settings = UserSettings::default();
        assert_eq!(settings.worker_count(), 2);

        settings.concurrency = "0".to_string();
        assert_eq!(settings.worker_count(), 1);

        settings.concurrency = "abc".to_string();
        assert_eq!(settings.worker_count(), DEFAULT_WORKER_COUNT);
    }

    #[test]
    fn test_first_segment_target_minute_dot_second() {
        let mut settings = UserSettings::default();
        assert!((settings.first_segment_target_secs() - 270.0).abs() < 1e-9);

        settings.first_segment_target = "1.05".to_string();
        assert!((settings.first_segment_target_secs() - 65.0).abs() < 1e-9);

        settings.first_segment_target = "oops".to_string();
        assert!(
            (settings.first_segment_target_secs() - DEFAULT_FIRST_SEGMENT_SECS).abs() < 1e-9
        );
    }

    #[test]
    fn test_min_segment_fallback() {
        let mut settings = UserSettings::default();
        settings.min_segment_secs = "-5".to_string();
        assert!((settings.min_segment_secs_value() - 60.0).abs() < 1e-9);

        settings.min_segment_secs = "90".to_string();
        assert!((settings.min_segment_secs_value() - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_settings_roundtrip_json() {
        let settings = UserSettings::default();
        let json = serde_json::to_string(&settings).unwrap();
        let back: UserSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(back.bitrate, settings.bitrate);
        assert_eq!(back.language, settings.language);
    }

    #[test]
    fn test_settings_default_on_missing_fields() {
        let back: UserSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(back.concurrency, "2");
        assert_eq!(back.split_mode, SplitMode::Fixed);
    }
}
