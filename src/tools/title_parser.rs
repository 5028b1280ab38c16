use regex::Regex;
use std::path::Path;

/// 由檔名推得的輸出命名資訊
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeNaming {
    /// 顯示用標題（亦作為輸出子資料夾名稱）
    pub title: String,
    /// 起始集數
    pub first_episode: u32,
}

/// 從檔名推出標題與起始集數
///
/// 支援兩種樣式：`xxx第N集.mp4` 與 `N-標題.mp4` / `N 標題.mp4`；
/// 都不符合時整個檔名主體作為標題，集數從 1 起算
#[must_use]
pub fn parse_episode_naming(path: &Path) -> EpisodeNaming {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output")
        .to_string();

    if let Ok(episode_regex) = Regex::new(r"第(\d+)集") {
        if let Some(caps) = episode_regex.captures(&stem) {
            if let Ok(episode) = caps[1].parse::<u32>() {
                if let Ok(strip_regex) = Regex::new(r"[-]?第\d+集") {
                    let title = strip_regex.replace_all(&stem, "").trim().to_string();
                    return EpisodeNaming {
                        title: non_empty_or(title, &stem),
                        first_episode: episode,
                    };
                }
            }
        }
    }

    if let Ok(leading_regex) = Regex::new(r"^(\d+)[- ]*") {
        if let Some(caps) = leading_regex.captures(&stem) {
            if let Ok(episode) = caps[1].parse::<u32>() {
                let title = leading_regex.replace(&stem, "").trim().to_string();
                return EpisodeNaming {
                    title: non_empty_or(title, &stem),
                    first_episode: episode,
                };
            }
        }
    }

    EpisodeNaming {
        title: stem,
        first_episode: 1,
    }
}

fn non_empty_or(title: String, fallback: &str) -> String {
    if title.is_empty() {
        fallback.to_string()
    } else {
        title
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_episode_marker_pattern() {
        let naming = parse_episode_naming(Path::new("/in/某劇-第12集.mp4"));
        assert_eq!(naming.title, "某劇");
        assert_eq!(naming.first_episode, 12);
    }

    #[test]
    fn test_leading_number_pattern() {
        let naming = parse_episode_naming(Path::new("/in/03-forest walk.mp4"));
        assert_eq!(naming.title, "forest walk");
        assert_eq!(naming.first_episode, 3);
    }

    #[test]
    fn test_plain_name_defaults_to_episode_one() {
        let naming = parse_episode_naming(Path::new("/in/holiday.mp4"));
        assert_eq!(naming.title, "holiday");
        assert_eq!(naming.first_episode, 1);
    }

    #[test]
    fn test_number_only_name_keeps_stem_as_title() {
        let naming = parse_episode_naming(Path::new("/in/07.mp4"));
        assert_eq!(naming.title, "07");
        assert_eq!(naming.first_episode, 7);
    }
}
