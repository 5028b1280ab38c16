use anyhow::Result;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 可處理的影片副檔名
const VIDEO_EXTENSIONS: [&str; 3] = ["mp4", "mkv", "mov"];

/// 收集待轉檔的輸入：單一檔案直接納入，資料夾則遞迴掃描影片檔
///
/// 回傳結果依路徑排序，讓集數偏移在單工執行時完全可重現
pub fn collect_video_files(input: &Path) -> Result<Vec<PathBuf>> {
    if input.is_file() {
        return Ok(if is_video_file(input) {
            vec![input.to_path_buf()]
        } else {
            Vec::new()
        });
    }

    let mut files: Vec<PathBuf> = WalkDir::new(input)
        .follow_links(false)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .filter(|path| is_video_file(path))
        .collect();

    files.sort();
    Ok(files)
}

#[must_use]
pub fn is_video_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            let lowered = ext.to_lowercase();
            VIDEO_EXTENSIONS.contains(&lowered.as_str())
        })
}
