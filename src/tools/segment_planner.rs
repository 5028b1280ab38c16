use serde::{Deserialize, Serialize};

/// 後續分段的目標間隔（秒）
pub const FOLLOW_UP_INTERVAL_SECS: f64 = 60.0;

/// 音訊位元率（bps），用於輸出大小估算
pub const AUDIO_BITRATE_BPS: u64 = 192_000;

/// 單一輸出檔的大小上限（MB）
pub const DEFAULT_MAX_OUTPUT_MB: f64 = 450.0;

/// 相鄰切點視為同一點的誤差範圍（秒）
const CUT_EPSILON: f64 = 1e-3;

/// 切分模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitMode {
    /// 固定時長：首段對齊設定的目標時長，之後每段以固定間隔推進
    Fixed,
    /// 自動平分：依預估輸出大小決定段數後均分
    Auto,
}

/// 切分策略參數
#[derive(Debug, Clone)]
pub struct SplitPolicy {
    pub mode: SplitMode,
    /// 首段目標時長（秒），僅 Fixed 模式使用
    pub first_segment_target_secs: f64,
    /// 最小分段長度（秒），僅 Fixed 模式使用
    pub min_segment_secs: f64,
    /// 視訊位元率（bps），僅 Auto 模式使用
    pub bitrate_bps: u64,
    /// 單檔大小上限（MB），僅 Auto 模式使用
    pub max_output_mb: f64,
}

/// 一個輸出分段：來源檔中的一段連續時間範圍
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub index: usize,
    pub start_secs: f64,
    pub duration_secs: f64,
}

/// 分段計畫：嚴格遞增的切點序列，首項為 0、末項為總時長
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentPlan {
    cuts: Vec<f64>,
}

impl SegmentPlan {
    #[must_use]
    pub fn cuts(&self) -> &[f64] {
        &self.cuts
    }

    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.cuts.len() - 1
    }

    /// 是否未切分（整檔輸出為單一分段）
    #[must_use]
    pub fn is_single(&self) -> bool {
        self.segment_count() == 1
    }

    pub fn segments(&self) -> impl Iterator<Item = Segment> + '_ {
        self.cuts.windows(2).enumerate().map(|(index, pair)| Segment {
            index,
            start_secs: pair[0],
            duration_secs: pair[1] - pair[0],
        })
    }
}

/// 依策略計算切分計畫
///
/// 純函式：相同輸入必得相同輸出。`scene_cuts` 須為遞增且落在
/// `(0, duration)` 內的場景切點；空集合退回純算術切分。
/// `duration` 必須為正值。
#[must_use]
pub fn plan(duration: f64, scene_cuts: &[f64], policy: &SplitPolicy) -> SegmentPlan {
    let raw = match policy.mode {
        SplitMode::Fixed => plan_fixed(duration, scene_cuts, policy),
        SplitMode::Auto => plan_auto(duration, scene_cuts, policy),
    };

    SegmentPlan {
        cuts: normalize(&raw, duration),
    }
}

/// 依位元率與時長預估輸出大小（MB）
#[must_use]
pub fn estimated_output_mb(bitrate_bps: u64, duration: f64) -> f64 {
    (bitrate_bps + AUDIO_BITRATE_BPS) as f64 * duration / (8.0 * 1024.0 * 1024.0)
}

/// 自動平分模式下的分段數：預估大小除以上限後無條件進位
#[must_use]
pub fn auto_segment_count(bitrate_bps: u64, duration: f64, max_output_mb: f64) -> usize {
    if duration <= 0.0 || max_output_mb <= 0.0 {
        return 1;
    }
    let count = (estimated_output_mb(bitrate_bps, duration) / max_output_mb).ceil();
    (count as usize).max(1)
}

/// 固定時長模式
///
/// 首段與後續分段的挑選規則刻意不對稱（沿用既有產品行為）：
/// 首段取「目標之後最近」的場景切點，算術退路不檢查最小分段；
/// 後續分段取「距目標絕對值最近」的場景切點，算術退路檢查最小分段。
fn plan_fixed(duration: f64, scene_cuts: &[f64], policy: &SplitPolicy) -> Vec<f64> {
    let min_segment = policy.min_segment_secs;
    let mut cuts = vec![0.0];

    // 首段目標超過總時長時不切分，也不進入後續分段迴圈
    let Some(first) = select_first_cut(
        duration,
        scene_cuts,
        policy.first_segment_target_secs,
        min_segment,
    ) else {
        return cuts;
    };
    cuts.push(first);

    // 剩餘長度不足 1.5 倍最小分段時停止，不值得再切
    loop {
        let last = *cuts.last().unwrap_or(&0.0);
        if duration - last < min_segment * 1.5 {
            break;
        }
        match select_follow_up_cut(duration, scene_cuts, last, min_segment) {
            Some(next) => cuts.push(next),
            None => break,
        }
    }

    cuts
}

/// 首段切點：目標之後、且剩餘長度足夠的最近場景切點；
/// 沒有合格場景切點時退回算術目標本身
fn select_first_cut(
    duration: f64,
    scene_cuts: &[f64],
    target: f64,
    min_segment: f64,
) -> Option<f64> {
    if duration <= target {
        return None;
    }
    scene_cuts
        .iter()
        .copied()
        .filter(|&p| p >= target && duration - p >= min_segment)
        .min_by(f64::total_cmp)
        .or(Some(target))
}

/// 後續切點：與上一切點距離及剩餘長度皆滿足最小分段的場景切點中，
/// 取距目標絕對值最近者；否則在算術目標仍守住最小分段時退回算術目標
fn select_follow_up_cut(
    duration: f64,
    scene_cuts: &[f64],
    last_cut: f64,
    min_segment: f64,
) -> Option<f64> {
    let target = last_cut + FOLLOW_UP_INTERVAL_SECS;

    let nearest_scene = scene_cuts
        .iter()
        .copied()
        .filter(|&p| p - last_cut >= min_segment && duration - p >= min_segment)
        .min_by(|a, b| (a - target).abs().total_cmp(&(b - target).abs()));

    nearest_scene.or_else(|| (duration - target >= min_segment).then_some(target))
}

/// 自動平分模式：段數由大小上限決定，每個內部目標點取最近的場景切點，
/// 無場景切點時直接使用等分點（此模式不過濾最小分段，屬策略取捨）
fn plan_auto(duration: f64, scene_cuts: &[f64], policy: &SplitPolicy) -> Vec<f64> {
    let count = auto_segment_count(policy.bitrate_bps, duration, policy.max_output_mb);
    let mut cuts = vec![0.0];
    if count <= 1 {
        return cuts;
    }

    let ideal_step = duration / count as f64;
    let mut last_cut = 0.0;
    for _ in 0..count - 1 {
        let ideal = last_cut + ideal_step;
        let chosen = scene_cuts
            .iter()
            .copied()
            .min_by(|a, b| (a - ideal).abs().total_cmp(&(b - ideal).abs()))
            .unwrap_or(ideal);
        cuts.push(chosen);
        last_cut = chosen;
    }

    cuts
}

/// 收斂為合法計畫：保留嚴格遞增且落在 `(0, duration)` 內的切點，
/// 首尾補上 0 與總時長；退化輸入會收斂成單一分段 `[0, duration]`
fn normalize(raw_cuts: &[f64], duration: f64) -> Vec<f64> {
    let mut cuts = vec![0.0];
    for &cut in raw_cuts {
        let last = *cuts.last().unwrap_or(&0.0);
        if cut - last > CUT_EPSILON && duration - cut > CUT_EPSILON {
            cuts.push(cut);
        }
    }
    cuts.push(duration);
    cuts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_policy(target: f64, min_segment: f64) -> SplitPolicy {
        SplitPolicy {
            mode: SplitMode::Fixed,
            first_segment_target_secs: target,
            min_segment_secs: min_segment,
            bitrate_bps: 6_000_000,
            max_output_mb: DEFAULT_MAX_OUTPUT_MB,
        }
    }

    fn auto_policy(bitrate_bps: u64, max_output_mb: f64) -> SplitPolicy {
        SplitPolicy {
            mode: SplitMode::Auto,
            first_segment_target_secs: 270.0,
            min_segment_secs: 60.0,
            bitrate_bps,
            max_output_mb,
        }
    }

    fn assert_valid_plan(plan: &SegmentPlan, duration: f64) {
        let cuts = plan.cuts();
        assert!(cuts.len() >= 2);
        assert!((cuts[0] - 0.0).abs() < 1e-9);
        assert!((cuts[cuts.len() - 1] - duration).abs() < 1e-9);
        for pair in cuts.windows(2) {
            assert!(pair[1] > pair[0], "切點必須嚴格遞增: {cuts:?}");
        }
    }

    #[test]
    fn test_fixed_first_cut_prefers_nearest_scene_after_target() {
        // 目標 270，合格場景切點只有 301
        let scenes = [58.0, 119.0, 181.0, 242.0, 301.0];
        let result = plan(600.0, &scenes, &fixed_policy(270.0, 60.0));

        assert_valid_plan(&result, 600.0);
        assert!((result.cuts()[1] - 301.0).abs() < 1e-9);
        assert!(result.segment_count() >= 2);

        // 除末段外，所有相鄰切點間距皆不小於最小分段
        for pair in result.cuts().windows(2).take(result.segment_count() - 1) {
            assert!(pair[1] - pair[0] >= 60.0 - 1e-9);
        }
    }

    #[test]
    fn test_fixed_target_beyond_duration_yields_single_segment() {
        let result = plan(120.0, &[], &fixed_policy(270.0, 60.0));
        assert_eq!(result.cuts(), &[0.0, 120.0]);
        assert!(result.is_single());
    }

    #[test]
    fn test_fixed_without_scenes_uses_arithmetic_targets() {
        let result = plan(400.0, &[], &fixed_policy(270.0, 60.0));
        assert_valid_plan(&result, 400.0);
        // 首段退回算術目標 270，之後 330（400-330=70 >= 60），再無空間
        assert_eq!(result.cuts(), &[0.0, 270.0, 330.0, 400.0]);
    }

    #[test]
    fn test_fixed_loop_stops_below_threshold() {
        // 剩餘 299 秒 >= 90 秒，會繼續尋找後續切點
        let scenes = [58.0, 119.0, 181.0, 242.0, 301.0];
        let result = plan(600.0, &scenes, &fixed_policy(270.0, 60.0));
        let last_gap = {
            let cuts = result.cuts();
            cuts[cuts.len() - 1] - cuts[cuts.len() - 2]
        };
        assert!(last_gap < 60.0 * 1.5 + FOLLOW_UP_INTERVAL_SECS);
    }

    #[test]
    fn test_select_follow_up_cut_respects_floor_on_both_sides() {
        let scenes = [130.0, 145.0, 199.0];
        // 與上一切點距離不足 60 的 130/145 應被排除
        let chosen = select_follow_up_cut(300.0, &scenes, 100.0, 60.0);
        assert_eq!(chosen, Some(199.0));

        // 剩餘不足 60 時排除 260，落回算術目標 220
        let chosen = select_follow_up_cut(300.0, &[260.0], 160.0, 60.0);
        assert_eq!(chosen, Some(220.0));

        // 連算術目標都守不住最小分段時放棄
        let chosen = select_follow_up_cut(230.0, &[], 160.0, 60.0);
        assert_eq!(chosen, None);
    }

    #[test]
    fn test_estimated_output_size() {
        // 6000k 位元率、3600 秒 → 約 2657 MB
        let size = estimated_output_mb(6_000_000, 3600.0);
        assert!((size - 2657.0).abs() < 1.0, "估算大小 {size}");
    }

    #[test]
    fn test_auto_segment_count_ceiling() {
        assert_eq!(auto_segment_count(6_000_000, 3600.0, 450.0), 6);
        // 小檔不切分
        assert_eq!(auto_segment_count(6_000_000, 60.0, 450.0), 1);
        assert_eq!(auto_segment_count(6_000_000, 0.0, 450.0), 1);
    }

    #[test]
    fn test_auto_mode_equal_split_without_scenes() {
        let result = plan(3600.0, &[], &auto_policy(6_000_000, 450.0));
        assert_valid_plan(&result, 3600.0);
        assert_eq!(result.segment_count(), 6);
        for segment in result.segments() {
            assert!((segment.duration_secs - 600.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_auto_mode_snaps_to_scene_cuts() {
        let scenes = [590.0, 1205.0, 1790.0, 2410.0, 3010.0];
        let result = plan(3600.0, &scenes, &auto_policy(6_000_000, 450.0));
        assert_valid_plan(&result, 3600.0);
        assert_eq!(result.segment_count(), 6);
        assert_eq!(&result.cuts()[1..5], &[590.0, 1205.0, 1790.0, 2410.0]);
    }

    #[test]
    fn test_auto_mode_degenerate_scenes_still_strictly_increasing() {
        // 所有場景切點擠在開頭，最近點匹配會重複選同一點
        let scenes = [1.0, 2.0];
        let result = plan(3600.0, &scenes, &auto_policy(6_000_000, 450.0));
        assert_valid_plan(&result, 3600.0);
    }

    #[test]
    fn test_plan_is_idempotent() {
        let scenes = [58.0, 119.0, 181.0, 242.0, 301.0];
        let policy = fixed_policy(270.0, 60.0);
        let first = plan(600.0, &scenes, &policy);
        let second = plan(600.0, &scenes, &policy);
        assert_eq!(first, second);
    }

    #[test]
    fn test_segments_numbering_and_spans() {
        let result = plan(3600.0, &[], &auto_policy(6_000_000, 450.0));
        let segments: Vec<Segment> = result.segments().collect();
        assert_eq!(segments.len(), result.segment_count());
        for (i, segment) in segments.iter().enumerate() {
            assert_eq!(segment.index, i);
            assert!(segment.duration_secs > 0.0);
        }
        let total: f64 = segments.iter().map(|s| s.duration_secs).sum();
        assert!((total - 3600.0).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_drops_out_of_range_and_duplicates() {
        let cuts = normalize(&[10.0, 10.0, 5.0, 50.0, 120.0, 130.0], 120.0);
        assert_eq!(cuts, vec![0.0, 10.0, 50.0, 120.0]);
    }
}
