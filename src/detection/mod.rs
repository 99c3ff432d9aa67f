//! Card detection module
//!
//! Feature-based image matching: oriented binary descriptors extracted
//! from reference cards and screen captures, cross-checked Hamming
//! matching, and RANSAC homography verification.

pub mod config;
pub mod detector;
pub mod features;
pub mod homography;
pub mod store;

#[cfg(test)]
mod tests;

// Re-export main types and functions for easy access
pub use config::{DetectorConfig, create_single_scale_config};
pub use detector::{CardDetector, CardTemplate, DetectionResult, ScaleLevel, ScreenFeatures};
pub use features::{DescriptorMatch, ImageFeatures, Keypoint, extract_features, match_descriptors};
pub use homography::{Homography, HomographyFit, find_homography, project};
pub use store::{RESET_IMAGE_NAME, TemplateStore};
