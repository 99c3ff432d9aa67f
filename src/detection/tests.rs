//! Tests for the feature-based detection pipeline

use super::config::DetectorConfig;
use super::detector::{CardDetector, CardTemplate};
use super::features::{Descriptor, XorShift64, extract_features, match_descriptors};
use super::homography::find_homography;
use image::GrayImage;

/// Render a deterministic synthetic screen: random filled rectangles on a
/// mid-gray background, giving plenty of strong corners.
fn textured_screen(width: u32, height: u32, seed: u64) -> GrayImage {
    let mut img = GrayImage::from_pixel(width, height, image::Luma([128u8]));
    let mut rng = XorShift64::new(seed);
    for _ in 0..80 {
        let rw = 10 + rng.next_below(30) as u32;
        let rh = 10 + rng.next_below(30) as u32;
        let rx = rng.next_below(width.saturating_sub(rw) as usize) as u32;
        let ry = rng.next_below(height.saturating_sub(rh) as usize) as u32;
        let shade = (rng.next_below(256)) as u8;
        for y in ry..(ry + rh).min(height) {
            for x in rx..(rx + rw).min(width) {
                img.put_pixel(x, y, image::Luma([shade]));
            }
        }
    }
    img
}

fn fast_config() -> DetectorConfig {
    DetectorConfig {
        ransac_iterations: 300,
        ..DetectorConfig::default()
    }
}

#[test]
fn test_extract_features_deterministic() {
    let img = textured_screen(200, 200, 7);
    let config = DetectorConfig::default();

    let a = extract_features(&img, &config);
    let b = extract_features(&img, &config);

    assert!(!a.is_empty());
    assert_eq!(a.len(), b.len());
    for (da, db) in a.descriptors.iter().zip(b.descriptors.iter()) {
        assert_eq!(da.hamming_distance(db), 0);
    }
}

#[test]
fn test_extract_features_tiny_image_is_empty() {
    let img = GrayImage::from_pixel(10, 10, image::Luma([200u8]));
    let features = extract_features(&img, &DetectorConfig::default());
    assert!(features.is_empty());
}

#[test]
fn test_match_descriptors_cross_check() {
    let zeros = Descriptor::from_raw_bits([0; 4]);
    let near_zeros = Descriptor::from_raw_bits([1, 0, 0, 0]);
    let ones = Descriptor::from_raw_bits([u64::MAX; 4]);
    let near_ones = Descriptor::from_raw_bits([u64::MAX - 1, u64::MAX, u64::MAX, u64::MAX]);

    let matches = match_descriptors(&[zeros, ones], &[near_zeros, near_ones]);

    assert_eq!(matches.len(), 2);
    assert!(matches.iter().any(|m| m.query_idx == 0 && m.train_idx == 0));
    assert!(matches.iter().any(|m| m.query_idx == 1 && m.train_idx == 1));
    for m in &matches {
        assert_eq!(m.distance, 1);
    }
}

#[test]
fn test_match_descriptors_rejects_asymmetric_pairs() {
    let zeros = Descriptor::from_raw_bits([0; 4]);
    // Two identical queries compete for the same train descriptor; the
    // cross-check keeps only the one the train side points back to.
    let matches = match_descriptors(&[zeros, zeros], &[zeros]);
    assert_eq!(matches.len(), 1);
}

#[test]
fn test_homography_recovers_translation_with_outliers() {
    let mut src = Vec::new();
    let mut dst = Vec::new();
    for gy in 0..5 {
        for gx in 0..4 {
            let p = (gx as f64 * 37.0 + 11.0, gy as f64 * 29.0 + 5.0);
            src.push(p);
            dst.push((p.0 + 50.0, p.1 - 12.0));
        }
    }
    let clean = src.len();
    // Five gross outliers
    for i in 0..5 {
        src.push((10.0 + i as f64 * 13.0, 200.0));
        dst.push((900.0 - i as f64 * 57.0, 3.0 * i as f64));
    }

    let fit = find_homography(&src, &dst, 5.0, 500, 1).expect("homography should fit");

    assert!(fit.inlier_count >= clean);
    for (i, inlier) in fit.inliers.iter().enumerate().take(clean) {
        assert!(*inlier, "grid point {i} should be an inlier");
    }
}

#[test]
fn test_homography_rejects_collinear_points() {
    let src: Vec<(f64, f64)> = (0..10).map(|i| (i as f64 * 10.0, i as f64 * 10.0)).collect();
    let dst = src.clone();
    assert!(find_homography(&src, &dst, 5.0, 200, 1).is_none());
}

#[test]
fn test_homography_needs_four_points() {
    let pts = vec![(0.0, 0.0), (10.0, 0.0), (0.0, 10.0)];
    assert!(find_homography(&pts, &pts, 5.0, 100, 1).is_none());
}

#[test]
fn test_template_prepare_skips_too_small_scales() {
    let img = textured_screen(64, 64, 3);
    let template = CardTemplate::prepare("card.png", &img, &DetectorConfig::default());

    // 64 * 0.2 = 12 px falls below the 20 px floor
    assert_eq!(template.levels.len(), 4);
    assert!((template.levels[0].scale - 1.0).abs() < 0.01);
    for level in &template.levels {
        assert!(level.scale * 64.0 >= 20.0 - 0.5);
    }
}

#[test]
fn test_detector_finds_embedded_card() {
    let screen = textured_screen(400, 300, 42);
    let card = image::imageops::crop_imm(&screen, 80, 50, 200, 200).to_image();

    let detector = CardDetector::new(fast_config());
    let template = CardTemplate::prepare("card.png", &card, detector.config());
    let screen_features = detector.extract_screen(&screen);

    let result = detector.detect(&template, &screen_features);
    assert!(result.matched, "embedded card should be detected");
    assert!(result.confidence > 0.0);
    assert!(result.confidence <= 100.0);
}

#[test]
fn test_detector_blank_screen_not_found() {
    let card = textured_screen(200, 200, 42);
    let blank = GrayImage::from_pixel(400, 300, image::Luma([0u8]));

    let detector = CardDetector::new(fast_config());
    let template = CardTemplate::prepare("card.png", &card, detector.config());
    let screen_features = detector.extract_screen(&blank);

    let result = detector.detect(&template, &screen_features);
    assert!(!result.matched);
}

#[test]
fn test_detector_unrelated_texture_not_found() {
    let card = textured_screen(200, 200, 42);
    let other = textured_screen(400, 300, 1234);

    let detector = CardDetector::new(fast_config());
    let template = CardTemplate::prepare("card.png", &card, detector.config());
    let screen_features = detector.extract_screen(&other);

    let result = detector.detect(&template, &screen_features);
    assert!(!result.matched);
}
