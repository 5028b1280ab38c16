mod file_task;
mod main;
mod orchestrator;
mod progress;
mod transcode_invoker;

pub use file_task::{FileTask, FileTaskOutcome};
pub use main::{BatchConverter, CliProgressSink};
pub use orchestrator::{Orchestrator, RunState};
pub use progress::{
    ProgressSink, ProgressSnapshot, ProgressTracker, RunOutcome, format_elapsed,
    format_remaining,
};
pub use transcode_invoker::{
    TerminationOutcome, TranscodeInvoker, TranscodeJob, segment_output_path,
};
