use env_logger::{Builder, Env, Target};
use std::fs::OpenOptions;

const LOG_FILE: &str = "video_factory.log";

/// 初始化日誌：寫入工作目錄下的日誌檔，讓互動介面保持乾淨
///
/// 開不了日誌檔時退回 stderr
pub fn init() {
    let env = Env::default().default_filter_or("info");
    let mut builder = Builder::from_env(env);

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(LOG_FILE);

    if let Ok(file) = log_file {
        builder.target(Target::Pipe(Box::new(file)));
    }

    builder.init();
}
