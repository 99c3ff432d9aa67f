//! Process-wide input listener
//!
//! `rdev` supports a single global listener per process, so one hook is
//! installed once and fans events out through a broadcast channel; the
//! macro recorder and the hotkey surface each subscribe independently.
//! Button events carry the coordinates of the last observed pointer move.

use super::MouseButton;
use super::keys::rdev_key_name;
use tokio::sync::broadcast;

#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    MouseMove { x: i32, y: i32 },
    ButtonPress { x: i32, y: i32, button: MouseButton },
    ButtonRelease { x: i32, y: i32, button: MouseButton },
    KeyPress { key: String },
    KeyRelease { key: String },
}

pub struct InputHook {
    tx: broadcast::Sender<InputEvent>,
}

impl InputHook {
    /// Install the global listener on a dedicated OS thread.
    ///
    /// The listener thread lives for the rest of the process; recording
    /// stops by unsubscribing, not by tearing the hook down.
    pub fn spawn() -> Self {
        let (tx, _) = broadcast::channel(1024);
        let hook_tx = tx.clone();
        std::thread::spawn(move || {
            let mut last_pos = (0i32, 0i32);
            let result = rdev::listen(move |event| {
                if let Some(converted) = convert_event(&event.event_type, &mut last_pos) {
                    // Send fails only when nobody is subscribed
                    let _ = hook_tx.send(converted);
                }
            });
            if let Err(e) = result {
                log::error!("Global input listener failed: {e:?}");
            }
        });
        Self { tx }
    }

    /// Channel-only hook without an OS listener, for tests and headless
    /// replay-only runs.
    pub fn detached() -> Self {
        let (tx, _) = broadcast::channel(1024);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<InputEvent> {
        self.tx.subscribe()
    }

    /// Raw sender, used to feed synthetic events into the stream.
    pub fn sender(&self) -> broadcast::Sender<InputEvent> {
        self.tx.clone()
    }
}

fn convert_event(event_type: &rdev::EventType, last_pos: &mut (i32, i32)) -> Option<InputEvent> {
    match event_type {
        rdev::EventType::MouseMove { x, y } => {
            *last_pos = (*x as i32, *y as i32);
            Some(InputEvent::MouseMove {
                x: last_pos.0,
                y: last_pos.1,
            })
        }
        rdev::EventType::ButtonPress(button) => map_button(button).map(|button| {
            InputEvent::ButtonPress {
                x: last_pos.0,
                y: last_pos.1,
                button,
            }
        }),
        rdev::EventType::ButtonRelease(button) => map_button(button).map(|button| {
            InputEvent::ButtonRelease {
                x: last_pos.0,
                y: last_pos.1,
                button,
            }
        }),
        rdev::EventType::KeyPress(key) => Some(InputEvent::KeyPress {
            key: rdev_key_name(key),
        }),
        rdev::EventType::KeyRelease(key) => Some(InputEvent::KeyRelease {
            key: rdev_key_name(key),
        }),
        rdev::EventType::Wheel { .. } => None,
    }
}

fn map_button(button: &rdev::Button) -> Option<MouseButton> {
    match button {
        rdev::Button::Left => Some(MouseButton::Left),
        rdev::Button::Right => Some(MouseButton::Right),
        rdev::Button::Middle => Some(MouseButton::Middle),
        rdev::Button::Unknown(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_events_carry_last_move_position() {
        let mut last_pos = (0, 0);
        convert_event(&rdev::EventType::MouseMove { x: 120.7, y: 48.2 }, &mut last_pos);
        let event = convert_event(&rdev::EventType::ButtonPress(rdev::Button::Left), &mut last_pos);
        assert_eq!(
            event,
            Some(InputEvent::ButtonPress {
                x: 120,
                y: 48,
                button: MouseButton::Left
            })
        );
    }

    #[test]
    fn test_unknown_buttons_are_dropped() {
        let mut last_pos = (0, 0);
        let event = convert_event(
            &rdev::EventType::ButtonPress(rdev::Button::Unknown(9)),
            &mut last_pos,
        );
        assert_eq!(event, None);
    }
}
