use anyhow::{Context, Result};
use log::debug;
use regex::Regex;
use std::path::Path;
use std::process::Command;

use crate::tools::MediaProber;

/// 場景變換偵測的預設敏感度（select 濾鏡的 scene 門檻，越低越敏感）
pub const DEFAULT_SCENE_SENSITIVITY: f64 = 0.3;

impl MediaProber {
    /// 偵測場景變換時間點
    ///
    /// 使用 `select=gt(scene,<sensitivity>),showinfo` 濾鏡，從診斷輸出
    /// 逐行解析 `pts_time:`，去重後遞增排序。沒有偵測到任何切點時
    /// 回傳空集合，屬正常結果而非錯誤
    pub fn probe_scene_cuts(&self, path: &Path, sensitivity: f64) -> Result<Vec<f64>> {
        let filter = format!("select=gt(scene\\,{sensitivity}),showinfo");

        let output = Command::new(self.ffmpeg_path())
            .arg("-i")
            .arg(path)
            .args(["-filter:v", &filter, "-f", "null", "-"])
            .output()
            .with_context(|| format!("無法執行 ffmpeg 場景偵測: {}", path.display()))?;

        // showinfo 的逐幀資訊輸出在 stderr
        let stderr = String::from_utf8_lossy(&output.stderr);
        let cuts = parse_scene_timestamps(&stderr);
        debug!("偵測到 {} 個場景切點: {}", cuts.len(), path.display());
        Ok(cuts)
    }
}

/// 解析 showinfo 輸出中的 `pts_time:<秒>`，每行至多取一個
#[must_use]
pub fn parse_scene_timestamps(output: &str) -> Vec<f64> {
    let Ok(pts_regex) = Regex::new(r"pts_time:([0-9.]+)") else {
        return Vec::new();
    };

    let mut timestamps: Vec<f64> = output
        .lines()
        .filter_map(|line| pts_regex.captures(line))
        .filter_map(|caps| caps.get(1))
        .filter_map(|m| m.as_str().parse::<f64>().ok())
        .collect();

    timestamps.sort_by(f64::total_cmp);
    timestamps.dedup_by(|a, b| *a == *b);
    timestamps
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scene_timestamps_sorted_and_deduplicated() {
        let output = "\
[Parsed_showinfo_1 @ 0x55] n: 2 pts: 5440 pts_time:58.2 duration: 1\n\
[Parsed_showinfo_1 @ 0x55] n: 0 pts: 1200 pts_time:12.5 duration: 1\n\
[Parsed_showinfo_1 @ 0x55] n: 1 pts: 1200 pts_time:12.5 duration: 1\n";
        let cuts = parse_scene_timestamps(output);
        assert_eq!(cuts, vec![12.5, 58.2]);
    }

    #[test]
    fn test_parse_scene_timestamps_empty() {
        let output = "frame=  100 fps= 25 q=-0.0 size=N/A time=00:00:04.00\n";
        assert!(parse_scene_timestamps(output).is_empty());
    }

    #[test]
    fn test_parse_scene_timestamps_ignores_invalid_numbers() {
        let cuts = parse_scene_timestamps("pts_time:1.2.3 junk\npts_time:42.0\n");
        assert_eq!(cuts, vec![42.0]);
    }
}
