pub mod load;
pub mod save;
pub mod types;

pub use types::{
    Config, DEFAULT_BITRATE_BPS, DEFAULT_FIRST_SEGMENT_SECS, DEFAULT_MIN_SEGMENT_SECS,
    DEFAULT_WORKER_COUNT, Language, UserSettings,
};
