use anyhow::Result;
use console::style;
use dialoguer::Input;
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Instant;

use super::orchestrator::Orchestrator;
use super::progress::{
    ProgressSink, ProgressSnapshot, RunOutcome, format_elapsed, format_remaining,
};
use crate::config::Config;
use crate::tools::{
    collect_video_files, ensure_directory_exists, resolve_ffmpeg_path, validate_input_exists,
};

/// 進度條內部刻度
const BAR_SCALE: u64 = 1000;

/// 批次切分壓制的互動介面
pub struct BatchConverter {
    config: Config,
    shutdown_signal: Arc<AtomicBool>,
}

impl BatchConverter {
    #[must_use]
    pub const fn new(config: Config, shutdown_signal: Arc<AtomicBool>) -> Self {
        Self {
            config,
            shutdown_signal,
        }
    }

    pub fn run(&self) -> Result<()> {
        println!("{}", style("=== 批次切分壓制 ===").cyan().bold());

        let input = self.prompt_input_path()?;
        let input_path = PathBuf::from(&input);
        validate_input_exists(&input_path)?;

        println!("{}", style("掃描影片檔案中...").dim());
        let files = collect_video_files(&input_path)?;

        if files.is_empty() {
            println!("{}", style("找不到任何影片檔案").yellow());
            return Ok(());
        }

        println!(
            "{}",
            style(format!("找到 {} 個影片檔案", files.len())).green()
        );
        for (index, file) in files.iter().enumerate() {
            println!(
                "  {}. {}",
                index + 1,
                file.file_name().unwrap_or_default().to_string_lossy()
            );
        }

        let output_root = self.prompt_output_root()?;
        ensure_directory_exists(&output_root)?;

        let settings = &self.config.settings;
        println!();
        println!(
            "{}",
            style(format!(
                "碼率: {} | 並發: {} | 編碼器: {}",
                settings.bitrate_arg(),
                settings.worker_count(),
                settings.encoder_profile
            ))
            .dim()
        );
        println!("{}", style("開始批次壓制...").cyan());

        let sink = CliProgressSink::new();
        let orchestrator = Orchestrator::new(
            settings,
            output_root,
            resolve_ffmpeg_path(),
            &sink,
            Arc::clone(&self.shutdown_signal),
        );

        let started = Instant::now();
        let outcome = orchestrator.run(&files)?;
        sink.finish();

        self.print_summary(&outcome, started);
        Ok(())
    }

    fn prompt_input_path(&self) -> Result<String> {
        let path: String = Input::new()
            .with_prompt("請輸入影片檔案或資料夾路徑")
            .interact_text()?;
        Ok(path.trim().to_string())
    }

    fn prompt_output_root(&self) -> Result<PathBuf> {
        let mut prompt = Input::new().with_prompt("請輸入輸出目錄");
        if !self.config.settings.output_dir.trim().is_empty() {
            prompt = prompt.default(self.config.settings.output_dir.trim().to_string());
        }
        let path: String = prompt.interact_text()?;
        Ok(PathBuf::from(path.trim()))
    }

    fn print_summary(&self, outcome: &RunOutcome, started: Instant) {
        println!();
        match outcome {
            RunOutcome::NoWork => {
                println!("{}", style("未找到有效影片，未執行任何工作").yellow());
            }
            RunOutcome::Completed => {
                let elapsed = format_elapsed(started.elapsed());
                println!(
                    "{}",
                    style(format!("已完成，耗時：{elapsed}")).green().bold()
                );
                info!("批次壓制完成，耗時 {elapsed}");
            }
            RunOutcome::Aborted => {
                println!("{}", style("任務已手動終止").yellow().bold());
                info!("批次壓制被使用者中止");
            }
            RunOutcome::Failed(detail) => {
                println!("{}", style("壓制出錯，已終止整批任務").red().bold());
                println!("{detail}");
                error!("批次壓制失敗: {detail}");
            }
        }
    }
}

/// 以 indicatif 呈現彙總進度的接收端
pub struct CliProgressSink {
    bar: ProgressBar,
}

impl Default for CliProgressSink {
    fn default() -> Self {
        Self::new()
    }
}

impl CliProgressSink {
    #[must_use]
    pub fn new() -> Self {
        let bar = ProgressBar::new(BAR_SCALE);
        bar.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {percent}% {msg}",
                )
                .expect("Invalid progress bar template")
                .progress_chars("#>-"),
        );
        Self { bar }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressSink for CliProgressSink {
    fn on_progress(&self, snapshot: &ProgressSnapshot, status: &str) {
        self.bar
            .set_position((snapshot.fraction * BAR_SCALE as f64) as u64);

        let message = match (snapshot.average_secs_per_episode, snapshot.remaining) {
            (Some(average), Some(remaining)) => format!(
                "{status} | 速度: {average:.1}s/ep | 剩: {}",
                format_remaining(remaining)
            ),
            _ => format!("{status} | 速度: -- | 剩: --"),
        };
        self.bar.set_message(message);
    }

    fn on_file_done(&self, file: &Path, done: usize, total: usize) {
        self.bar.println(format!(
            "{} ({done}/{total}): {}",
            style("已完成").green(),
            file.display()
        ));
    }

    fn on_run_finished(&self, outcome: &RunOutcome) {
        if matches!(outcome, RunOutcome::Completed) {
            self.bar.set_position(BAR_SCALE);
        }
    }
}
