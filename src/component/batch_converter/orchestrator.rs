use anyhow::{Context, Result};
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::file_task::{FileTask, FileTaskOutcome};
use super::progress::{ProgressSink, ProgressTracker, RunOutcome};
use super::transcode_invoker::TranscodeInvoker;
use crate::config::UserSettings;
use crate::tools::{EncoderProfile, MediaProber, SplitPolicy, parse_episode_naming};

/// 一輪批次執行的共享旗標：使用者中止與首個失敗
///
/// 失敗採「先到先贏」：第一個記錄的失敗保留其診斷內容並拉起中止旗標，
/// 之後的失敗與中止不覆蓋
pub struct RunState {
    user_abort: Arc<AtomicBool>,
    failure_abort: AtomicBool,
    first_failure: Mutex<Option<String>>,
}

impl RunState {
    #[must_use]
    pub fn new(user_abort: Arc<AtomicBool>) -> Self {
        Self {
            user_abort,
            failure_abort: AtomicBool::new(false),
            first_failure: Mutex::new(None),
        }
    }

    /// 中止一經拉起即為終態：任何任務都不得再啟動新分段
    #[must_use]
    pub fn should_abort(&self) -> bool {
        self.user_abort.load(Ordering::SeqCst) || self.failure_abort.load(Ordering::SeqCst)
    }

    pub fn record_failure(&self, detail: String) {
        if let Ok(mut first) = self.first_failure.lock() {
            if first.is_none() {
                *first = Some(detail);
            }
        }
        self.failure_abort.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn failure_detail(&self) -> Option<String> {
        self.first_failure.lock().ok().and_then(|first| first.clone())
    }

    #[must_use]
    pub fn user_abort_requested(&self) -> bool {
        self.user_abort.load(Ordering::SeqCst)
    }
}

/// 檔案任務執行時共享的環境
pub struct RunContext<'a> {
    pub prober: &'a MediaProber,
    pub invoker: &'a TranscodeInvoker,
    pub policy: SplitPolicy,
    pub encoder_profile: EncoderProfile,
    pub device_index: String,
    pub bitrate: String,
    pub output_root: &'a Path,
    pub tracker: &'a ProgressTracker,
    pub run_state: &'a RunState,
    /// 全域集數偏移累計器，跨檔案維持輸出編號連續
    pub episode_offset: &'a AtomicU32,
    pub sink: &'a dyn ProgressSink,
}

/// 批次協調器：量測總量、派發檔案任務、彙整結果
pub struct Orchestrator<'a> {
    settings: &'a UserSettings,
    output_root: PathBuf,
    prober: MediaProber,
    invoker: TranscodeInvoker,
    sink: &'a dyn ProgressSink,
    shutdown_signal: Arc<AtomicBool>,
}

impl<'a> Orchestrator<'a> {
    #[must_use]
    pub fn new(
        settings: &'a UserSettings,
        output_root: PathBuf,
        ffmpeg_path: PathBuf,
        sink: &'a dyn ProgressSink,
        shutdown_signal: Arc<AtomicBool>,
    ) -> Self {
        Self {
            settings,
            output_root,
            prober: MediaProber::new(ffmpeg_path.clone()),
            invoker: TranscodeInvoker::new(ffmpeg_path),
            sink,
            shutdown_signal,
        }
    }

    /// 執行一輪批次轉檔
    ///
    /// 第一階段依序量測所有檔案時長建立 ETA 基準；
    /// 第二階段以固定大小的工作池並行執行檔案任務
    pub fn run(&self, inputs: &[PathBuf]) -> Result<RunOutcome> {
        let (tasks, total_duration, total_segments_est) = self.probe_phase(inputs);

        if self.shutdown_signal.load(Ordering::SeqCst) {
            let outcome = RunOutcome::Aborted;
            self.sink.on_run_finished(&outcome);
            return Ok(outcome);
        }

        if tasks.is_empty() {
            warn!("沒有可處理的檔案，批次結束");
            let outcome = RunOutcome::NoWork;
            self.sink.on_run_finished(&outcome);
            return Ok(outcome);
        }

        info!(
            "第一階段完成: {} 個檔案，總時長 {:.1}s",
            tasks.len(),
            total_duration
        );

        let tracker = ProgressTracker::new(total_duration, total_segments_est);
        let run_state = RunState::new(Arc::clone(&self.shutdown_signal));
        let episode_offset = AtomicU32::new(0);
        let files_done = AtomicUsize::new(0);
        let total_files = tasks.len();

        let ctx = RunContext {
            prober: &self.prober,
            invoker: &self.invoker,
            policy: self.settings.split_policy(),
            encoder_profile: self.settings.encoder_profile,
            device_index: self.settings.device_index_arg(),
            bitrate: self.settings.bitrate_arg(),
            output_root: &self.output_root,
            tracker: &tracker,
            run_state: &run_state,
            episode_offset: &episode_offset,
            sink: self.sink,
        };

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.settings.worker_count())
            .build()
            .context("無法建立工作執行緒池")?;

        pool.scope(|scope| {
            for task in &tasks {
                let ctx = &ctx;
                let files_done = &files_done;
                scope.spawn(move |_| {
                    let outcome = task.run(ctx);
                    if matches!(outcome, FileTaskOutcome::Done { .. }) {
                        let done = files_done.fetch_add(1, Ordering::SeqCst) + 1;
                        ctx.sink.on_file_done(&task.source, done, total_files);
                    }
                });
            }
        });

        let outcome = if let Some(detail) = run_state.failure_detail() {
            RunOutcome::Failed(detail)
        } else if run_state.user_abort_requested() {
            RunOutcome::Aborted
        } else {
            RunOutcome::Completed
        };

        self.sink.on_run_finished(&outcome);
        Ok(outcome)
    }

    /// 第一階段：逐檔量測時長
    ///
    /// 量不到時長的檔案記警告後略過（不致命）；分段數估計以
    /// 名目每段 60 秒折算，僅供 ETA 顯示
    fn probe_phase(&self, inputs: &[PathBuf]) -> (Vec<FileTask>, f64, f64) {
        let mut tasks = Vec::with_capacity(inputs.len());
        let mut total_duration = 0.0;
        let mut total_segments_est = 0.0;

        for path in inputs {
            if self.shutdown_signal.load(Ordering::SeqCst) {
                break;
            }

            let duration = match self.prober.probe_duration(path) {
                Ok(duration) => duration,
                Err(e) => {
                    warn!("時長量測失敗: {e}");
                    0.0
                }
            };

            if duration <= 0.0 {
                warn!("無法取得時長，略過: {}", path.display());
                continue;
            }

            total_duration += duration;
            total_segments_est += (duration / 60.0).floor().max(1.0);
            tasks.push(FileTask {
                source: path.clone(),
                duration_secs: duration,
                naming: parse_episode_naming(path),
            });
        }

        (tasks, total_duration, total_segments_est)
    }
}
