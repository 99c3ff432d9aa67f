//! Configuration for the feature-based detection pipeline

#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// Minimum descriptor/match/inlier count below which a card is not-found
    pub min_match_count: usize,
    /// Keep at most this many best matches before homography fitting
    pub max_good_matches: usize,
    /// Cap on keypoints extracted per image (strongest first)
    pub max_features: usize,
    /// FAST-9 corner threshold
    pub fast_threshold: u8,
    /// RANSAC reprojection threshold in pixels
    pub ransac_reproj_threshold: f64,
    /// RANSAC sampling iterations
    pub ransac_iterations: usize,
    /// Number of template scale levels, from 1.0 down to `min_scale`
    pub scale_steps: usize,
    /// Smallest template scale factor tried
    pub min_scale: f32,
    /// Scales that shrink either template dimension below this are skipped
    pub min_scaled_dim: u32,
    /// Debug mode flag
    pub debug_enabled: bool,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            min_match_count: 10,
            max_good_matches: 50,
            max_features: 1500,
            fast_threshold: 25,
            ransac_reproj_threshold: 5.0,
            ransac_iterations: 1000,
            scale_steps: 5,
            min_scale: 0.2,
            min_scaled_dim: 20,
            debug_enabled: false,
        }
    }
}

/// Configuration preset for single-scale matching of screen-native assets
pub fn create_single_scale_config() -> DetectorConfig {
    DetectorConfig {
        scale_steps: 1,
        min_scale: 1.0,
        ..DetectorConfig::default()
    }
}
