// Communication channels for the card tracker
use super::types::{TrackerCommand, TrackerEvent};
use tokio::sync::mpsc;

/// Helper function to create tracker channels
pub fn create_tracker_channels() -> (
    mpsc::Sender<TrackerCommand>,
    mpsc::Receiver<TrackerCommand>,
    mpsc::Sender<TrackerEvent>,
    mpsc::Receiver<TrackerEvent>,
) {
    let (cmd_tx, cmd_rx) = mpsc::channel(32);
    let (event_tx, event_rx) = mpsc::channel(32);
    (cmd_tx, cmd_rx, event_tx, event_rx)
}
