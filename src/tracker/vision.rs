//! Vision seam between the tracker loop and the detection pipeline
//!
//! The tracker talks to a small trait so tests can script sightings
//! without a display. `LiveVision` is the production implementation:
//! capture once per tick, extract screen features once, and match every
//! template against the shared features.

use crate::capture::ScreenGrabber;
use crate::detection::{CardDetector, DetectionResult, ScreenFeatures, TemplateStore};

pub trait Vision: Send {
    /// Capture a fresh frame for this tick. `false` skips the tick.
    fn refresh(&mut self) -> bool;

    /// Detect a named card on the current frame. `None` means the card has
    /// no usable template and is skipped.
    fn detect_target(&mut self, name: &str) -> Option<DetectionResult>;

    /// Detect the reset trigger. `None` means reset detection is disabled.
    fn detect_reset(&mut self) -> Option<DetectionResult>;

    /// Rebuild templates after the target list changed.
    fn reload_templates(&mut self, names: &[String]);
}

pub struct LiveVision {
    grabber: Box<dyn ScreenGrabber>,
    store: TemplateStore,
    detector: CardDetector,
    screen: Option<ScreenFeatures>,
}

impl LiveVision {
    pub fn new(grabber: Box<dyn ScreenGrabber>, store: TemplateStore, detector: CardDetector) -> Self {
        Self {
            grabber,
            store,
            detector,
            screen: None,
        }
    }
}

impl Vision for LiveVision {
    fn refresh(&mut self) -> bool {
        match self.grabber.grab() {
            Ok(frame) => {
                self.screen = Some(self.detector.extract_screen(&frame));
                true
            }
            Err(e) => {
                log::warn!("Screen capture failed, skipping tick: {e}");
                self.screen = None;
                false
            }
        }
    }

    fn detect_target(&mut self, name: &str) -> Option<DetectionResult> {
        let screen = self.screen.as_ref()?;
        let template = self.store.get(name)?;
        Some(self.detector.detect(template, screen))
    }

    fn detect_reset(&mut self) -> Option<DetectionResult> {
        let screen = self.screen.as_ref()?;
        let template = self.store.reset_template()?;
        Some(self.detector.detect(template, screen))
    }

    fn reload_templates(&mut self, names: &[String]) {
        self.store.reload(names);
    }
}
