// Communication channels for the macro engine
use super::types::{MacroCommand, MacroEvent};
use tokio::sync::mpsc;

/// Helper function to create macro engine channels
pub fn create_macro_channels() -> (
    mpsc::Sender<MacroCommand>,
    mpsc::Receiver<MacroCommand>,
    mpsc::Sender<MacroEvent>,
    mpsc::Receiver<MacroEvent>,
) {
    let (cmd_tx, cmd_rx) = mpsc::channel(32);
    let (event_tx, event_rx) = mpsc::channel(32);
    (cmd_tx, cmd_rx, event_tx, event_rx)
}
