//! Synthetic input injection
//!
//! `InputInjector` is the seam the macro player and the completion action
//! drive; `EnigoInjector` performs real injection, `NoopInjector` records
//! calls for tests.

use super::MouseButton;
use super::keys::to_enigo_key;
use enigo::{Coordinate, Direction, Enigo, Keyboard, Mouse, Settings};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InjectError {
    #[error("Input backend failed: {0}")]
    Backend(String),

    #[error("Unknown key: {0}")]
    UnknownKey(String),
}

/// Factory producing an injector inside whatever thread performs the
/// injection; backends are not assumed to be Send.
pub type InjectorFactory = dyn Fn() -> Box<dyn InputInjector> + Send + Sync;

pub trait InputInjector {
    fn mouse_move(&mut self, x: i32, y: i32) -> Result<(), InjectError>;

    /// Move the pointer with a short smoothing duration.
    fn mouse_move_smooth(&mut self, x: i32, y: i32, duration: Duration) -> Result<(), InjectError>;

    fn mouse_down(&mut self, x: i32, y: i32, button: MouseButton) -> Result<(), InjectError>;

    fn mouse_up(&mut self, x: i32, y: i32, button: MouseButton) -> Result<(), InjectError>;

    fn key_down(&mut self, key: &str) -> Result<(), InjectError>;

    fn key_up(&mut self, key: &str) -> Result<(), InjectError>;

    fn key_tap(&mut self, key: &str) -> Result<(), InjectError>;

    /// Toggle corner-abort style safety behavior. The player disables it
    /// for the duration of a replay and restores it afterwards.
    fn set_failsafe(&mut self, enabled: bool);
}

/// Production injector backed by `enigo`.
pub struct EnigoInjector {
    enigo: Enigo,
    failsafe_enabled: bool,
}

impl EnigoInjector {
    pub fn new() -> Result<Self, InjectError> {
        let enigo =
            Enigo::new(&Settings::default()).map_err(|e| InjectError::Backend(e.to_string()))?;
        Ok(Self {
            enigo,
            failsafe_enabled: true,
        })
    }

    pub fn failsafe_enabled(&self) -> bool {
        self.failsafe_enabled
    }

    fn press_button(&mut self, button: MouseButton, direction: Direction) -> Result<(), InjectError> {
        self.enigo
            .button(map_button(button), direction)
            .map_err(|e| InjectError::Backend(e.to_string()))
    }

    fn press_key(&mut self, key: &str, direction: Direction) -> Result<(), InjectError> {
        let key = to_enigo_key(key).ok_or_else(|| InjectError::UnknownKey(key.to_string()))?;
        self.enigo
            .key(key, direction)
            .map_err(|e| InjectError::Backend(e.to_string()))
    }
}

fn map_button(button: MouseButton) -> enigo::Button {
    match button {
        MouseButton::Left => enigo::Button::Left,
        MouseButton::Right => enigo::Button::Right,
        MouseButton::Middle => enigo::Button::Middle,
    }
}

impl InputInjector for EnigoInjector {
    fn mouse_move(&mut self, x: i32, y: i32) -> Result<(), InjectError> {
        self.enigo
            .move_mouse(x, y, Coordinate::Abs)
            .map_err(|e| InjectError::Backend(e.to_string()))
    }

    fn mouse_move_smooth(&mut self, x: i32, y: i32, duration: Duration) -> Result<(), InjectError> {
        const STEPS: u32 = 8;
        let (sx, sy) = self.enigo.location().unwrap_or((x, y));
        for step in 1..=STEPS {
            let t = step as f64 / STEPS as f64;
            let ix = sx + ((x - sx) as f64 * t).round() as i32;
            let iy = sy + ((y - sy) as f64 * t).round() as i32;
            self.mouse_move(ix, iy)?;
            std::thread::sleep(duration / STEPS);
        }
        Ok(())
    }

    fn mouse_down(&mut self, x: i32, y: i32, button: MouseButton) -> Result<(), InjectError> {
        self.mouse_move(x, y)?;
        self.press_button(button, Direction::Press)
    }

    fn mouse_up(&mut self, x: i32, y: i32, button: MouseButton) -> Result<(), InjectError> {
        self.mouse_move(x, y)?;
        self.press_button(button, Direction::Release)
    }

    fn key_down(&mut self, key: &str) -> Result<(), InjectError> {
        self.press_key(key, Direction::Press)
    }

    fn key_up(&mut self, key: &str) -> Result<(), InjectError> {
        self.press_key(key, Direction::Release)
    }

    fn key_tap(&mut self, key: &str) -> Result<(), InjectError> {
        self.press_key(key, Direction::Click)
    }

    fn set_failsafe(&mut self, enabled: bool) {
        self.failsafe_enabled = enabled;
    }
}

/// One call recorded by `NoopInjector`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InjectedAction {
    MouseMove(i32, i32),
    MouseDown(i32, i32, MouseButton),
    MouseUp(i32, i32, MouseButton),
    KeyDown(String),
    KeyUp(String),
    KeyTap(String),
    Failsafe(bool),
}

/// Injector that performs nothing, optionally recording every call.
#[derive(Default)]
pub struct NoopInjector {
    log: Option<Arc<Mutex<Vec<InjectedAction>>>>,
}

impl NoopInjector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_log(log: Arc<Mutex<Vec<InjectedAction>>>) -> Self {
        Self { log: Some(log) }
    }

    fn record(&self, action: InjectedAction) {
        if let Some(log) = &self.log
            && let Ok(mut entries) = log.lock()
        {
            entries.push(action);
        }
    }
}

impl InputInjector for NoopInjector {
    fn mouse_move(&mut self, x: i32, y: i32) -> Result<(), InjectError> {
        self.record(InjectedAction::MouseMove(x, y));
        Ok(())
    }

    fn mouse_move_smooth(&mut self, x: i32, y: i32, _duration: Duration) -> Result<(), InjectError> {
        self.record(InjectedAction::MouseMove(x, y));
        Ok(())
    }

    fn mouse_down(&mut self, x: i32, y: i32, button: MouseButton) -> Result<(), InjectError> {
        self.record(InjectedAction::MouseDown(x, y, button));
        Ok(())
    }

    fn mouse_up(&mut self, x: i32, y: i32, button: MouseButton) -> Result<(), InjectError> {
        self.record(InjectedAction::MouseUp(x, y, button));
        Ok(())
    }

    fn key_down(&mut self, key: &str) -> Result<(), InjectError> {
        self.record(InjectedAction::KeyDown(key.to_string()));
        Ok(())
    }

    fn key_up(&mut self, key: &str) -> Result<(), InjectError> {
        self.record(InjectedAction::KeyUp(key.to_string()));
        Ok(())
    }

    fn key_tap(&mut self, key: &str) -> Result<(), InjectError> {
        self.record(InjectedAction::KeyTap(key.to_string()));
        Ok(())
    }

    fn set_failsafe(&mut self, enabled: bool) {
        self.record(InjectedAction::Failsafe(enabled));
    }
}
