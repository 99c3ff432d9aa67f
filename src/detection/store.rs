//! Template store for the card image directory
//!
//! Cards are loaded by file name from one directory; a fixed-name reset
//! image is loaded alongside them. Load failures leave the affected card
//! undetectable instead of aborting the tracker.

use super::config::DetectorConfig;
use super::detector::CardTemplate;
use image::GrayImage;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// File name of the designated reset-trigger image.
pub const RESET_IMAGE_NAME: &str = "restart.png";

pub struct TemplateStore {
    image_dir: PathBuf,
    config: DetectorConfig,
    templates: HashMap<String, CardTemplate>,
    reset: Option<CardTemplate>,
}

impl TemplateStore {
    pub fn new(image_dir: impl Into<PathBuf>, config: DetectorConfig) -> Self {
        Self {
            image_dir: image_dir.into(),
            config,
            templates: HashMap::new(),
            reset: None,
        }
    }

    pub fn image_dir(&self) -> &Path {
        &self.image_dir
    }

    /// Reload all card templates for the given names plus the reset image.
    ///
    /// Called whenever the tracked-target list changes. Unreadable images
    /// are logged and skipped; a missing reset image disables reset
    /// detection.
    pub fn reload(&mut self, names: &[String]) {
        self.templates.clear();
        for name in names {
            let path = self.image_dir.join(name);
            match load_gray(&path) {
                Ok(gray) => {
                    self.templates
                        .insert(name.clone(), CardTemplate::prepare(name, &gray, &self.config));
                }
                Err(e) => {
                    log::error!("Failed to load card image '{}': {}", path.display(), e);
                }
            }
        }

        let reset_path = self.image_dir.join(RESET_IMAGE_NAME);
        self.reset = match load_gray(&reset_path) {
            Ok(gray) => Some(CardTemplate::prepare(RESET_IMAGE_NAME, &gray, &self.config)),
            Err(e) => {
                log::warn!(
                    "Reset image '{}' unavailable, reset detection disabled: {}",
                    reset_path.display(),
                    e
                );
                None
            }
        };
    }

    /// Insert a card template from in-memory pixels (tests, previews).
    pub fn insert(&mut self, name: &str, gray: &GrayImage) {
        self.templates
            .insert(name.to_string(), CardTemplate::prepare(name, gray, &self.config));
    }

    pub fn get(&self, name: &str) -> Option<&CardTemplate> {
        self.templates.get(name)
    }

    pub fn reset_template(&self) -> Option<&CardTemplate> {
        self.reset.as_ref()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

fn load_gray(path: &Path) -> Result<GrayImage, String> {
    if !path.exists() {
        return Err(format!("file not found: {}", path.display()));
    }
    let img = image::open(path).map_err(|e| format!("unreadable image: {e}"))?;
    Ok(img.to_luma8())
}
