use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use super::types::{UploadProgress, UploadStage};

/// Optional sink for [`UploadProgress`] events.
#[derive(Debug, Clone, Default)]
pub struct ProgressReporter {
    sender: Option<UnboundedSender<UploadProgress>>,
}

impl ProgressReporter {
    /// Reporter that drops every event.
    pub fn disabled() -> Self {
        Self { sender: None }
    }

    pub fn new(sender: UnboundedSender<UploadProgress>) -> Self {
        Self {
            sender: Some(sender),
        }
    }

    /// Reporter plus the receiving end of its channel.
    pub fn channel() -> (Self, UnboundedReceiver<UploadProgress>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    pub(crate) fn report(
        &self,
        stage: UploadStage,
        file_index: usize,
        total_files: usize,
        reduction_percent: Option<i64>,
    ) {
        let Some(sender) = &self.sender else {
            return;
        };

        let event = UploadProgress {
            stage,
            file_index,
            total_files,
            percent: batch_percent(stage, file_index, total_files),
            message: stage_message(stage, file_index, total_files, reduction_percent),
        };

        // A closed receiver only means nobody is listening anymore.
        let _ = sender.send(event);
    }
}

/// Whole-batch percentage at `stage` of image `file_index`:
/// `floor(100 * index / total)` while optimizing, the midpoint to the next
/// image while uploading and `floor(100 * (index + 1) / total)` once stored.
fn batch_percent(stage: UploadStage, file_index: usize, total_files: usize) -> u8 {
    let total = total_files.max(1);
    let halves = match stage {
        UploadStage::Optimizing => 2 * file_index,
        UploadStage::Uploading => 2 * file_index + 1,
        UploadStage::Completed => 2 * (file_index + 1),
    };
    (100 * halves / (2 * total)).min(100) as u8
}

fn stage_message(
    stage: UploadStage,
    file_index: usize,
    total_files: usize,
    reduction_percent: Option<i64>,
) -> String {
    let position = file_index + 1;
    match stage {
        UploadStage::Optimizing => format!("Optimizing image {} of {}", position, total_files),
        UploadStage::Uploading => format!("Uploading image {} of {}", position, total_files),
        UploadStage::Completed => match reduction_percent {
            Some(reduction) if reduction < 0 => format!(
                "Uploaded image {} of {} ({}% larger)",
                position,
                total_files,
                reduction.unsigned_abs()
            ),
            Some(reduction) => format!(
                "Uploaded image {} of {} ({}% smaller)",
                position, total_files, reduction
            ),
            None => format!("Uploaded image {} of {}", position, total_files),
        },
    }
}
