use tokio::sync::mpsc;
use tracing::debug;

use crate::mirrors::LogRecord;

/// Receiving side of a mirror refresh run, implemented by the presentation layer.
///
/// Calls arrive from the run's worker thread: records in output order, then
/// exactly one `on_run_finished`.
pub trait EventSink: Send + Sync {
    fn on_log_record(&self, record: LogRecord);
    fn on_run_finished(&self, exit_code: i32);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    Log(LogRecord),
    Finished(i32),
}

/// Forwards run events onto a channel drained by the UI loop.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<RunEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<RunEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, event: RunEvent) {
        if self.tx.send(event).is_err() {
            debug!("Run event dropped, receiver closed");
        }
    }
}

impl EventSink for ChannelSink {
    fn on_log_record(&self, record: LogRecord) {
        self.send(RunEvent::Log(record));
    }

    fn on_run_finished(&self, exit_code: i32) {
        self.send(RunEvent::Finished(exit_code));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn events_from_another_thread_arrive_in_order() {
        let (sink, mut rx) = ChannelSink::new();

        std::thread::spawn(move || {
            sink.on_log_record(LogRecord::Info("first".to_string()));
            sink.on_log_record(LogRecord::Warning("second".to_string()));
            sink.on_run_finished(0);
        })
        .join()
        .unwrap();

        assert_eq!(rx.recv().await, Some(RunEvent::Log(LogRecord::Info("first".to_string()))));
        assert_eq!(
            rx.recv().await,
            Some(RunEvent::Log(LogRecord::Warning("second".to_string())))
        );
        assert_eq!(rx.recv().await, Some(RunEvent::Finished(0)));
        assert_eq!(rx.recv().await, None);
    }

    #[test]
    fn closed_receiver_is_not_an_error() {
        let (sink, rx) = ChannelSink::new();
        drop(rx);
        sink.on_log_record(LogRecord::Info("nobody listening".to_string()));
        sink.on_run_finished(1);
    }
}
