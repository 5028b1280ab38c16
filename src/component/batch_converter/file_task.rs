use anyhow::Result;
use log::{info, warn};
use std::path::PathBuf;
use std::sync::atomic::Ordering;

use super::orchestrator::RunContext;
use super::transcode_invoker::{TerminationOutcome, TranscodeJob, segment_output_path};
use crate::tools::{
    DEFAULT_SCENE_SENSITIVITY, EpisodeNaming, SplitMode, auto_segment_count,
    ensure_directory_exists, plan,
};

/// 單一輸入檔的最終狀態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileTaskOutcome {
    Done { segments: usize },
    Aborted,
    Failed,
}

/// 一個輸入檔的完整處理流程：量測 → 規劃 → 逐段壓制
///
/// 同一檔案的分段嚴格依序執行；並行只發生在不同檔案之間
#[derive(Debug, Clone)]
pub struct FileTask {
    pub source: PathBuf,
    /// 第一階段量測得到的總時長（秒），必為正值
    pub duration_secs: f64,
    pub naming: EpisodeNaming,
}

impl FileTask {
    pub fn run(&self, ctx: &RunContext<'_>) -> FileTaskOutcome {
        if ctx.run_state.should_abort() {
            return FileTaskOutcome::Aborted;
        }

        // 規劃：只有真的會切分時才花時間做場景偵測
        let scene_cuts = if self.needs_scene_probe(ctx) {
            match ctx
                .prober
                .probe_scene_cuts(&self.source, DEFAULT_SCENE_SENSITIVITY)
            {
                Ok(cuts) => cuts,
                Err(e) => {
                    warn!("場景偵測失敗，改用算術切分: {e}");
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        let plan = plan(self.duration_secs, &scene_cuts, &ctx.policy);

        // 認領全域集數偏移：本檔多切出的 (段數 - 1) 集推進後續檔案的編號
        let claimed_offset = ctx
            .episode_offset
            .fetch_add((plan.segment_count() - 1) as u32, Ordering::SeqCst);
        let base_episode = self.naming.first_episode + claimed_offset;

        info!(
            "規劃完成: {} 切為 {} 段，起始集數 {}",
            self.source.display(),
            plan.segment_count(),
            base_episode
        );

        if let Err(e) = ensure_directory_exists(&ctx.output_root.join(&self.naming.title)) {
            ctx.run_state
                .record_failure(format!("無法建立輸出資料夾: {e}"));
            return FileTaskOutcome::Failed;
        }

        for segment in plan.segments() {
            if ctx.run_state.should_abort() {
                return FileTaskOutcome::Aborted;
            }

            let episode = base_episode + segment.index as u32;
            match self.run_segment(ctx, episode, segment.start_secs, segment.duration_secs) {
                Ok(TerminationOutcome::Success) => {}
                Ok(TerminationOutcome::Aborted) => return FileTaskOutcome::Aborted,
                Ok(TerminationOutcome::Failed(tail)) => {
                    // 本輪首個失敗即中止整批（編碼失敗多半是系統性問題）
                    ctx.run_state.record_failure(format!(
                        "{} - episode{episode} 轉檔失敗:\n{tail}",
                        self.naming.title
                    ));
                    return FileTaskOutcome::Failed;
                }
                Err(e) => {
                    ctx.run_state
                        .record_failure(format!("無法執行編碼程序: {e}"));
                    return FileTaskOutcome::Failed;
                }
            }
        }

        FileTaskOutcome::Done {
            segments: plan.segment_count(),
        }
    }

    /// 固定模式一定要場景切點；自動模式只有預估會切分時才需要
    fn needs_scene_probe(&self, ctx: &RunContext<'_>) -> bool {
        match ctx.policy.mode {
            SplitMode::Fixed => true,
            SplitMode::Auto => {
                auto_segment_count(
                    ctx.policy.bitrate_bps,
                    self.duration_secs,
                    ctx.policy.max_output_mb,
                ) > 1
            }
        }
    }

    fn run_segment(
        &self,
        ctx: &RunContext<'_>,
        episode: u32,
        start_secs: f64,
        duration_secs: f64,
    ) -> Result<TerminationOutcome> {
        let title = &self.naming.title;
        let job_key = format!("{title}-{episode}");
        let status_text = format!("壓制中: {title} - episode{episode}");

        let job = TranscodeJob {
            source: self.source.clone(),
            output: segment_output_path(ctx.output_root, title, episode),
            start_secs,
            duration_secs,
            encoder_profile: ctx.encoder_profile,
            device_index: ctx.device_index.clone(),
            bitrate: ctx.bitrate.clone(),
        };

        let outcome = ctx.invoker.run(
            &job,
            |position_secs| {
                ctx.tracker.update_active(&job_key, position_secs);
                ctx.sink.on_progress(&ctx.tracker.snapshot(), &status_text);
            },
            || ctx.run_state.should_abort(),
        )?;

        match &outcome {
            TerminationOutcome::Success => {
                ctx.tracker.finish_segment(&job_key, duration_secs);
                info!("分段完成: {}", job.output.display());
            }
            TerminationOutcome::Aborted | TerminationOutcome::Failed(_) => {
                // 中止或失敗的分段不得留在進行中集合裡撐高比例
                ctx.tracker.clear_active(&job_key);
            }
        }

        Ok(outcome)
    }
}
