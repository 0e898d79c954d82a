pub mod progress;
pub mod sequencer;
pub mod types;

pub use progress::ProgressReporter;
pub use sequencer::UploadSequencer;
pub use types::{UploadProgress, UploadResult, UploadStage};
