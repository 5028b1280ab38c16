use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// 批次執行的最終結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// 沒有任何可處理的檔案，未啟動工作
    NoWork,
    Completed,
    /// 使用者要求中止
    Aborted,
    /// 首個失敗的描述（含編碼器診斷輸出尾段）
    Failed(String),
}

/// 彙總進度快照
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSnapshot {
    /// 0.0..1.0，執行中上限 0.999
    pub fraction: f64,
    /// 平均每集秒數（樣本足夠時才有值）
    pub average_secs_per_episode: Option<f64>,
    /// 預估剩餘時間
    pub remaining: Option<Duration>,
}

/// 進度事件的接收端（終端介面或測試替身）
pub trait ProgressSink: Sync {
    /// 高頻呼叫，實作必須輕量
    fn on_progress(&self, snapshot: &ProgressSnapshot, status: &str);
    fn on_file_done(&self, file: &Path, done: usize, total: usize);
    fn on_run_finished(&self, outcome: &RunOutcome);
}

/// 跨所有並行檔案任務共享的進度狀態
///
/// 彙總比例 = (已完成分段總時長 + 進行中分段目前位置總和) / 總時長。
/// 所有欄位都可能被多個工作執行緒同時更新，一律走互斥鎖
pub struct ProgressTracker {
    total_duration: f64,
    total_segments_est: f64,
    started_at: Instant,
    completed_duration: Mutex<f64>,
    active_positions: Mutex<HashMap<String, f64>>,
    last_fraction: Mutex<f64>,
}

impl ProgressTracker {
    #[must_use]
    pub fn new(total_duration: f64, total_segments_est: f64) -> Self {
        Self {
            total_duration,
            total_segments_est,
            started_at: Instant::now(),
            completed_duration: Mutex::new(0.0),
            active_positions: Mutex::new(HashMap::new()),
            last_fraction: Mutex::new(0.0),
        }
    }

    /// 更新某個進行中分段的目前編碼位置（秒）
    pub fn update_active(&self, job_key: &str, position_secs: f64) {
        if let Ok(mut active) = self.active_positions.lock() {
            active.insert(job_key.to_string(), position_secs);
        }
    }

    /// 分段完成：累入完成時長並清掉進行中項目
    pub fn finish_segment(&self, job_key: &str, segment_duration: f64) {
        if let Ok(mut completed) = self.completed_duration.lock() {
            *completed += segment_duration;
        }
        self.clear_active(job_key);
    }

    pub fn clear_active(&self, job_key: &str) {
        if let Ok(mut active) = self.active_positions.lock() {
            active.remove(job_key);
        }
    }

    /// 取得彙總快照
    ///
    /// 比例經兩道保護：執行中最多顯示 0.999，且對外永不倒退
    #[must_use]
    pub fn snapshot(&self) -> ProgressSnapshot {
        let completed = self.completed_duration.lock().map_or(0.0, |c| *c);
        let in_flight: f64 = self
            .active_positions
            .lock()
            .map_or(0.0, |active| active.values().sum());
        let done_secs = completed + in_flight;

        let raw_fraction = if self.total_duration > 0.0 {
            (done_secs / self.total_duration).min(0.999)
        } else {
            0.0
        };

        let fraction = self.last_fraction.lock().map_or(raw_fraction, |mut last| {
            if raw_fraction > *last {
                *last = raw_fraction;
            }
            *last
        });

        // 樣本太少時不估 ETA，避免開頭亂跳
        let (average, remaining) = if done_secs > 2.0 && self.total_segments_est > 0.0 {
            let elapsed = self.started_at.elapsed().as_secs_f64();
            let equivalent_done = (fraction * self.total_segments_est).max(0.001);
            let average = elapsed / equivalent_done;
            let remaining_secs =
                (average * (self.total_segments_est - equivalent_done)).max(0.0);
            (
                Some(average),
                Some(Duration::from_secs_f64(remaining_secs)),
            )
        } else {
            (None, None)
        };

        ProgressSnapshot {
            fraction,
            average_secs_per_episode: average,
            remaining,
        }
    }
}

/// 剩餘時間顯示："3m20s" 或 "45s"
#[must_use]
pub fn format_remaining(remaining: Duration) -> String {
    let secs = remaining.as_secs();
    if secs > 60 {
        format!("{}m{}s", secs / 60, secs % 60)
    } else {
        format!("{secs}s")
    }
}

/// 總耗時顯示："1時2分3秒"，不足一小時則 "2分3秒"
#[must_use]
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    let (hours, minutes, seconds) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if hours > 0 {
        format!("{hours}時{minutes}分{seconds}秒")
    } else {
        format!("{minutes}分{seconds}秒")
    }
}
