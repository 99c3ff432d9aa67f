//! Synthetic input and global listener boundary
//!
//! This module wraps the platform input capabilities: injecting mouse and
//! keyboard events (`enigo`) and observing them system-wide (`rdev`). The
//! engines only ever see the `InputInjector` trait and the hook's event
//! stream.

pub mod hook;
pub mod injector;
pub mod keys;

pub use hook::{InputEvent, InputHook};
pub use injector::{
    EnigoInjector, InjectError, InjectedAction, InjectorFactory, InputInjector, NoopInjector,
};
pub use keys::{rdev_key_name, to_enigo_key};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}
