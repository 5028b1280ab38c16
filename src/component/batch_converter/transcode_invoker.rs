use anyhow::{Context, Result};
use log::{debug, warn};
use std::collections::VecDeque;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::{Arc, Mutex};
use std::thread;

use crate::tools::{EncoderProfile, parse_progress_line};

/// 保留的診斷輸出行數（失敗時回報的尾段視窗）
const DIAGNOSTIC_TAIL_LINES: usize = 15;

/// 單一分段的轉檔工作：一段時間範圍對應一個輸出檔
#[derive(Debug, Clone)]
pub struct TranscodeJob {
    pub source: PathBuf,
    pub output: PathBuf,
    pub start_secs: f64,
    pub duration_secs: f64,
    pub encoder_profile: EncoderProfile,
    pub device_index: String,
    pub bitrate: String,
}

/// 一次編碼程序的結束方式
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminationOutcome {
    Success,
    /// 回應中止要求而提前結束，不視為錯誤
    Aborted,
    /// 程序以非零碼結束，附上診斷輸出尾段
    Failed(String),
}

/// 編碼程序執行器：負責組指令、跑程序、串流進度
#[derive(Debug, Clone)]
pub struct TranscodeInvoker {
    ffmpeg_path: PathBuf,
}

impl TranscodeInvoker {
    #[must_use]
    pub fn new(ffmpeg_path: PathBuf) -> Self {
        Self { ffmpeg_path }
    }

    /// 組出單一分段的編碼指令
    #[must_use]
    pub fn build_command(&self, job: &TranscodeJob) -> Command {
        let mut cmd = Command::new(&self.ffmpeg_path);

        cmd.arg("-y")
            .args(["-ss", &format!("{:.3}", job.start_secs)])
            .args(["-t", &format!("{:.3}", job.duration_secs)])
            .arg("-i")
            .arg(&job.source)
            .args(["-c:v", job.encoder_profile.codec()]);

        if let Some(flag) = job.encoder_profile.device_flag() {
            cmd.args([flag, &job.device_index]);
        }

        cmd.args(["-b:v", &job.bitrate])
            .args(["-c:a", "aac", "-b:a", "192k"])
            .args(["-avoid_negative_ts", "make_zero"])
            .args(["-movflags", "+faststart"])
            .args(["-progress", "pipe:1"])
            .arg(&job.output);

        cmd
    }

    /// 執行一段轉檔
    ///
    /// 每收到一筆進度就呼叫 `on_progress`（已換算為秒）；每筆進度之間
    /// 檢查 `should_abort`，為真時立刻終止程序並回傳 `Aborted`。
    /// 正常結束時依結束碼回傳 `Success` 或 `Failed`（附 stderr 尾段）
    pub fn run(
        &self,
        job: &TranscodeJob,
        mut on_progress: impl FnMut(f64),
        should_abort: impl Fn() -> bool,
    ) -> Result<TerminationOutcome> {
        let mut command = self.build_command(job);
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = command
            .spawn()
            .with_context(|| format!("無法啟動編碼程序: {}", job.source.display()))?;

        debug!(
            "啟動編碼 [{}]: {} ({:.3}s +{:.3}s) -> {}",
            child.id(),
            job.source.display(),
            job.start_secs,
            job.duration_secs,
            job.output.display()
        );

        // 診斷輸出走獨立執行緒收進固定大小的尾段緩衝
        let tail = Arc::new(Mutex::new(VecDeque::with_capacity(DIAGNOSTIC_TAIL_LINES)));
        let drain_handle = child.stderr.take().map(|stderr| {
            let tail = Arc::clone(&tail);
            thread::spawn(move || {
                for line in BufReader::new(stderr).lines().map_while(Result::ok) {
                    if line.trim().is_empty() {
                        continue;
                    }
                    if let Ok(mut tail) = tail.lock() {
                        tail.push_back(line);
                        if tail.len() > DIAGNOSTIC_TAIL_LINES {
                            tail.pop_front();
                        }
                    }
                }
            })
        });

        let mut aborted = false;
        if let Some(stdout) = child.stdout.take() {
            for line in BufReader::new(stdout).lines().map_while(Result::ok) {
                if should_abort() {
                    aborted = true;
                    if let Err(e) = child.kill() {
                        warn!("終止編碼程序失敗: {e}");
                    }
                    break;
                }
                if let Some(position_secs) = parse_progress_line(&line) {
                    on_progress(position_secs);
                }
            }
        }

        let status = child
            .wait()
            .with_context(|| format!("等待編碼程序失敗: {}", job.source.display()))?;
        if let Some(handle) = drain_handle {
            let _ = handle.join();
        }

        if aborted {
            return Ok(TerminationOutcome::Aborted);
        }

        if status.success() {
            Ok(TerminationOutcome::Success)
        } else {
            let detail = tail
                .lock()
                .map(|tail| tail.iter().cloned().collect::<Vec<_>>().join("\n"))
                .unwrap_or_default();
            Ok(TerminationOutcome::Failed(detail))
        }
    }
}

/// 輸出檔路徑：`{output_root}/{title}/{title}-episode{N}.mp4`
#[must_use]
pub fn segment_output_path(output_root: &Path, title: &str, episode: u32) -> PathBuf {
    output_root
        .join(title)
        .join(format!("{title}-episode{episode}.mp4"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(profile: EncoderProfile) -> TranscodeJob {
        TranscodeJob {
            source: PathBuf::from("/in/a.mp4"),
            output: PathBuf::from("/out/a-episode1.mp4"),
            start_secs: 301.0,
            duration_secs: 59.5,
            encoder_profile: profile,
            device_index: "1".to_string(),
            bitrate: "6000k".to_string(),
        }
    }

    fn args_of(cmd: &Command) -> Vec<String> {
        cmd.get_args()
            .map(|a| a.to_string_lossy().to_string())
            .collect()
    }

    #[test]
    fn test_build_command_time_range_and_bitrate() {
        let invoker = TranscodeInvoker::new(PathBuf::from("ffmpeg"));
        let args = args_of(&invoker.build_command(&job(EncoderProfile::Software)));

        let ss = args.iter().position(|a| a == "-ss").unwrap();
        assert_eq!(args[ss + 1], "301.000");
        let t = args.iter().position(|a| a == "-t").unwrap();
        assert_eq!(args[t + 1], "59.500");

        let bv = args.iter().position(|a| a == "-b:v").unwrap();
        assert_eq!(args[bv + 1], "6000k");
        assert!(args.contains(&"-progress".to_string()));
        assert!(args.contains(&"libx264".to_string()));
        assert!(!args.contains(&"-gpu".to_string()));
    }

    #[test]
    fn test_build_command_injects_device_index() {
        let invoker = TranscodeInvoker::new(PathBuf::from("ffmpeg"));

        let args = args_of(&invoker.build_command(&job(EncoderProfile::Nvenc)));
        let gpu = args.iter().position(|a| a == "-gpu").unwrap();
        assert_eq!(args[gpu + 1], "1");

        let args = args_of(&invoker.build_command(&job(EncoderProfile::QuickSync)));
        let dev = args.iter().position(|a| a == "-qsv_device").unwrap();
        assert_eq!(args[dev + 1], "1");
    }

    #[test]
    fn test_segment_output_path() {
        let path = segment_output_path(Path::new("/out"), "show", 7);
        assert_eq!(path, PathBuf::from("/out/show/show-episode7.mp4"));
    }
}
