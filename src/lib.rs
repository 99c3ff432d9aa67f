pub mod args;
pub mod capture;
pub mod detection;
pub mod hotkeys;
pub mod input;
pub mod macros;
pub mod tracker;

pub use capture::{ScreenGrabber, XcapGrabber};
