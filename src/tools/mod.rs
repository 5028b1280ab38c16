mod encoder_profile;
mod media_prober;
mod path_validator;
mod scene_detector;
mod segment_planner;
mod title_parser;
mod video_scanner;

pub use encoder_profile::EncoderProfile;
pub use media_prober::{
    MediaProber, parse_duration_output, parse_progress_line, resolve_ffmpeg_path,
};
pub use path_validator::{ensure_directory_exists, validate_input_exists};
pub use scene_detector::{DEFAULT_SCENE_SENSITIVITY, parse_scene_timestamps};
pub use segment_planner::{
    AUDIO_BITRATE_BPS, DEFAULT_MAX_OUTPUT_MB, FOLLOW_UP_INTERVAL_SECS, Segment, SegmentPlan,
    SplitMode, SplitPolicy, auto_segment_count, estimated_output_mb, plan,
};
pub use title_parser::{EpisodeNaming, parse_episode_naming};
pub use video_scanner::{collect_video_files, is_video_file};
