use anyhow::{Context, Result};
use log::debug;
use regex::Regex;
use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;

/// 影片探測器：透過 ffmpeg 診斷輸出取得時長等資訊
#[derive(Debug, Clone)]
pub struct MediaProber {
    ffmpeg_path: PathBuf,
}

impl MediaProber {
    #[must_use]
    pub fn new(ffmpeg_path: PathBuf) -> Self {
        Self { ffmpeg_path }
    }

    #[must_use]
    pub fn ffmpeg_path(&self) -> &Path {
        &self.ffmpeg_path
    }

    /// 取得影片總時長（秒）
    ///
    /// `ffmpeg -i` 沒有輸出檔時必以非零碼結束，此處只看診斷文字；
    /// 找不到 `Duration:` 樣式時回傳 0.0（視為未知而非錯誤）
    pub fn probe_duration(&self, path: &Path) -> Result<f64> {
        let output = Command::new(&self.ffmpeg_path)
            .arg("-i")
            .arg(path)
            .output()
            .with_context(|| format!("無法執行 ffmpeg 探測: {}", path.display()))?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        let duration = parse_duration_output(&stderr).unwrap_or(0.0);
        debug!("探測時長 {}: {:.2}s", path.display(), duration);
        Ok(duration)
    }
}

/// 解析 ffmpeg 診斷輸出中的 `Duration: H:MM:SS.ff` 樣式
#[must_use]
pub fn parse_duration_output(output: &str) -> Option<f64> {
    let duration_regex = Regex::new(r"Duration:\s(\d+):(\d+):(\d+\.\d+)").ok()?;
    let caps = duration_regex.captures(output)?;

    let hours: f64 = caps.get(1)?.as_str().parse().ok()?;
    let minutes: f64 = caps.get(2)?.as_str().parse().ok()?;
    let seconds: f64 = caps.get(3)?.as_str().parse().ok()?;

    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}

/// 解析 ffmpeg `-progress` 資料流中的 `out_time_ms=<微秒>` 行，轉為秒
#[must_use]
pub fn parse_progress_line(line: &str) -> Option<f64> {
    let value = line.strip_prefix("out_time_ms=")?.trim();
    let micros: i64 = value.parse().ok()?;
    Some(micros as f64 / 1_000_000.0)
}

/// 解析 ffmpeg 執行路徑：優先使用執行檔旁的 ffmpeg，否則交給 PATH
#[must_use]
pub fn resolve_ffmpeg_path() -> PathBuf {
    let binary_name = if cfg!(windows) { "ffmpeg.exe" } else { "ffmpeg" };

    if let Ok(exe) = env::current_exe() {
        if let Some(dir) = exe.parent() {
            let local = dir.join(binary_name);
            if local.exists() {
                return local;
            }
        }
    }

    PathBuf::from(binary_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_output() {
        let output = "Input #0, mov,mp4, from 'a.mp4':\n  Duration: 01:02:03.45, start: 0.000000, bitrate: 6000 kb/s";
        let duration = parse_duration_output(output).unwrap();
        assert!((duration - (3600.0 + 120.0 + 3.45)).abs() < 1e-9);
    }

    #[test]
    fn test_parse_duration_output_missing() {
        assert!(parse_duration_output("no duration here").is_none());
        assert!(parse_duration_output("Duration: N/A, bitrate: N/A").is_none());
    }

    #[test]
    fn test_parse_progress_line() {
        // out_time_ms 實際單位是微秒
        let secs = parse_progress_line("out_time_ms=12500000").unwrap();
        assert!((secs - 12.5).abs() < 1e-9);
        assert!(parse_progress_line("frame=250").is_none());
        assert!(parse_progress_line("out_time_ms=abc").is_none());
    }
}
