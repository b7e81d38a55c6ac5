//! Progress reporting for an update run.
//!
//! Each pipeline invocation receives its own [`ProgressReporter`]; there is no
//! shared progress state. The CLI drives a terminal progress bar from it, and
//! an embedding launcher can forward events to its UI through a channel.

use tokio::sync::mpsc::UnboundedSender;
use tracing::info;

/// Pipeline stage, with the completion percentage shown when it starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateStage {
    Starting,
    Downloading,
    Extracting,
    Installing,
    Complete,
}

impl UpdateStage {
    #[must_use]
    pub const fn percent(self) -> u8 {
        match self {
            Self::Starting => 0,
            Self::Downloading => 20,
            Self::Extracting => 50,
            Self::Installing => 75,
            Self::Complete => 100,
        }
    }
}

/// A single progress notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    pub stage: UpdateStage,
    pub percent: u8,
    pub message: String,
}

impl ProgressEvent {
    pub fn new(stage: UpdateStage, message: impl Into<String>) -> Self {
        Self {
            stage,
            percent: stage.percent(),
            message: message.into(),
        }
    }
}

/// Receives progress events from the pipeline.
///
/// Called from the pipeline's task between stages; implementations must not
/// block for long.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: &ProgressEvent);
}

/// Writes progress to the tracing log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl ProgressReporter for LogReporter {
    fn report(&self, event: &ProgressEvent) {
        info!(stage = ?event.stage, percent = event.percent, "{}", event.message);
    }
}

/// Forwards progress events into a channel.
///
/// A closed receiver is ignored; the update carries on without a listener.
#[derive(Debug, Clone)]
pub struct ChannelReporter {
    sender: UnboundedSender<ProgressEvent>,
}

impl ChannelReporter {
    pub const fn new(sender: UnboundedSender<ProgressEvent>) -> Self {
        Self { sender }
    }
}

impl ProgressReporter for ChannelReporter {
    fn report(&self, event: &ProgressEvent) {
        let _ = self.sender.send(event.clone());
    }
}

impl<F> ProgressReporter for F
where
    F: Fn(&ProgressEvent) + Send + Sync,
{
    fn report(&self, event: &ProgressEvent) {
        self(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tokio::sync::mpsc;

    #[test]
    fn test_stage_percentages_increase() {
        let stages = [
            UpdateStage::Starting,
            UpdateStage::Downloading,
            UpdateStage::Extracting,
            UpdateStage::Installing,
            UpdateStage::Complete,
        ];
        let percents: Vec<u8> = stages.iter().map(|s| s.percent()).collect();
        assert_eq!(percents, vec![0, 20, 50, 75, 100]);
    }

    #[tokio::test]
    async fn test_channel_reporter() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let reporter = ChannelReporter::new(tx);

        reporter.report(&ProgressEvent::new(UpdateStage::Downloading, "Downloading"));
        let event = rx.recv().await.unwrap();
        assert_eq!(event.percent, 20);
        assert_eq!(event.message, "Downloading");

        drop(rx);
        reporter.report(&ProgressEvent::new(UpdateStage::Complete, "done"));
    }

    #[test]
    fn test_closure_reporter() {
        let seen = Mutex::new(Vec::new());
        let reporter = |event: &ProgressEvent| seen.lock().unwrap().push(event.percent);

        reporter.report(&ProgressEvent::new(UpdateStage::Extracting, "x"));
        LogReporter.report(&ProgressEvent::new(UpdateStage::Installing, "y"));
        assert_eq!(*seen.lock().unwrap(), vec![50]);
    }
}
