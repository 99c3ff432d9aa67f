//! Card presence detection
//!
//! Decides whether a prepared reference card is visible on a captured
//! screen: descriptor matching followed by homography verification, tried
//! across the template's scale levels with early exit on the first hit.

use super::config::DetectorConfig;
use super::features::{ImageFeatures, extract_features, match_descriptors};
use super::homography::find_homography;
use image::GrayImage;

/// Seed for RANSAC sampling; fixed so detection is reproducible.
const RANSAC_SEED: u64 = 0x51CA_7D5E;

/// Outcome of one template-vs-screen check.
///
/// `confidence` is a percentage in [0, 100] and carries no meaning when
/// `matched` is false.
#[derive(Debug, Clone, Copy)]
pub struct DetectionResult {
    pub matched: bool,
    pub confidence: f32,
}

impl DetectionResult {
    pub fn not_found() -> Self {
        Self {
            matched: false,
            confidence: 0.0,
        }
    }

    pub fn found(confidence: f32) -> Self {
        Self {
            matched: true,
            confidence,
        }
    }
}

/// One precomputed scale level of a reference card.
#[derive(Debug, Clone)]
pub struct ScaleLevel {
    pub scale: f32,
    pub features: ImageFeatures,
}

/// Reference card prepared for matching: keypoints and descriptors
/// precomputed per scale level at load time.
#[derive(Debug, Clone)]
pub struct CardTemplate {
    pub name: String,
    pub levels: Vec<ScaleLevel>,
}

impl CardTemplate {
    /// Prepare a card from its grayscale pixels.
    ///
    /// Scale levels run from 1.0 down to `config.min_scale`; scales that
    /// would shrink either dimension below `config.min_scaled_dim` are
    /// skipped.
    pub fn prepare(name: &str, gray: &GrayImage, config: &DetectorConfig) -> Self {
        let mut levels = Vec::new();
        for scale in scale_steps(config) {
            let scaled_w = (gray.width() as f32 * scale) as u32;
            let scaled_h = (gray.height() as f32 * scale) as u32;
            if scaled_w < config.min_scaled_dim || scaled_h < config.min_scaled_dim {
                continue;
            }

            let features = if (scale - 1.0).abs() < 0.01 {
                extract_features(gray, config)
            } else {
                let scaled = image::imageops::resize(
                    gray,
                    scaled_w,
                    scaled_h,
                    image::imageops::FilterType::Lanczos3,
                );
                extract_features(&scaled, config)
            };
            levels.push(ScaleLevel { scale, features });
        }
        Self {
            name: name.to_string(),
            levels,
        }
    }
}

fn scale_steps(config: &DetectorConfig) -> Vec<f32> {
    let steps = config.scale_steps.max(1);
    if steps == 1 {
        return vec![1.0];
    }
    let delta = (1.0 - config.min_scale) / (steps - 1) as f32;
    (0..steps).map(|i| 1.0 - delta * i as f32).collect()
}

/// Features extracted from one screen capture, shared across all templates
/// evaluated in the same poll tick.
#[derive(Debug, Clone)]
pub struct ScreenFeatures {
    pub features: ImageFeatures,
}

/// Feature-based card detector.
///
/// Pure function of (template features, screen features); no state is
/// retained between calls.
pub struct CardDetector {
    config: DetectorConfig,
}

impl CardDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Extract screen features once per captured frame.
    pub fn extract_screen(&self, screen: &GrayImage) -> ScreenFeatures {
        let features = extract_features(screen, &self.config);
        if self.config.debug_enabled {
            println!(
                "🔍 Screen {}x{}: {} keypoints",
                screen.width(),
                screen.height(),
                features.len()
            );
        }
        ScreenFeatures { features }
    }

    /// Check whether the card is present on the screen.
    ///
    /// Malformed or empty captures simply yield not-found; this never
    /// fails.
    pub fn detect(&self, template: &CardTemplate, screen: &ScreenFeatures) -> DetectionResult {
        let min = self.config.min_match_count;
        if screen.features.len() < min {
            return DetectionResult::not_found();
        }

        for level in &template.levels {
            if level.features.len() < min {
                continue;
            }

            let mut matches =
                match_descriptors(&level.features.descriptors, &screen.features.descriptors);
            matches.truncate(self.config.max_good_matches);
            if matches.len() < min {
                continue;
            }

            let src: Vec<(f64, f64)> = matches
                .iter()
                .map(|m| {
                    let kp = &level.features.keypoints[m.query_idx];
                    (kp.x as f64, kp.y as f64)
                })
                .collect();
            let dst: Vec<(f64, f64)> = matches
                .iter()
                .map(|m| {
                    let kp = &screen.features.keypoints[m.train_idx];
                    (kp.x as f64, kp.y as f64)
                })
                .collect();

            let Some(fit) = find_homography(
                &src,
                &dst,
                self.config.ransac_reproj_threshold,
                self.config.ransac_iterations,
                RANSAC_SEED,
            ) else {
                continue;
            };

            if fit.inlier_count >= min {
                let confidence = fit.inlier_count as f32 / matches.len() as f32 * 100.0;
                log::debug!(
                    "Card '{}' found at scale {:.1}: {}/{} inliers ({:.2}%)",
                    template.name,
                    level.scale,
                    fit.inlier_count,
                    matches.len(),
                    confidence
                );
                return DetectionResult::found(confidence);
            }
        }

        DetectionResult::not_found()
    }
}
